use num_bigint::BigInt;
use num_complex::Complex64;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::cmp::max;
use std::fmt;
use tb_ast::build;
use tb_ast::Expr;

/// Degree bound used by [`Polynomial::from_expr`].
pub const DEFAULT_MAX_DEGREE: usize = 64;

/// Dense univariate polynomial over Q.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Polynomial {
    // coeffs[i] is the coefficient of var^i
    pub coeffs: Vec<BigRational>,
    pub var: String,
}

impl Polynomial {
    pub fn new(coeffs: Vec<BigRational>, var: &str) -> Self {
        let mut poly = Polynomial {
            coeffs,
            var: var.to_string(),
        };
        poly.trim();
        poly
    }

    pub fn from_integers(coeffs: &[i64], var: &str) -> Self {
        Polynomial::new(
            coeffs
                .iter()
                .map(|c| BigRational::from_integer(BigInt::from(*c)))
                .collect(),
            var,
        )
    }

    pub fn zero(var: &str) -> Self {
        Polynomial {
            coeffs: vec![],
            var: var.to_string(),
        }
    }

    pub fn one(var: &str) -> Self {
        Polynomial::constant(BigRational::one(), var)
    }

    pub fn constant(c: BigRational, var: &str) -> Self {
        Polynomial::new(vec![c], var)
    }

    /// `var` itself.
    pub fn identity(var: &str) -> Self {
        Polynomial::new(vec![BigRational::zero(), BigRational::one()], var)
    }

    fn trim(&mut self) {
        while let Some(c) = self.coeffs.last() {
            if c.is_zero() {
                self.coeffs.pop();
            } else {
                break;
            }
        }
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Degree, with the zero polynomial reported as 0.
    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    pub fn is_constant(&self) -> bool {
        self.coeffs.len() <= 1
    }

    pub fn leading_coeff(&self) -> BigRational {
        self.coeffs.last().cloned().unwrap_or_else(BigRational::zero)
    }

    pub fn coeff(&self, i: usize) -> BigRational {
        self.coeffs.get(i).cloned().unwrap_or_else(BigRational::zero)
    }

    /// Converts a canonical expression. Returns `None` if `expr` is not a
    /// polynomial in `var` with rational coefficients.
    pub fn from_expr(expr: &Expr, var: &str) -> Option<Self> {
        Polynomial::from_expr_bounded(expr, var, DEFAULT_MAX_DEGREE)
    }

    /// Like [`Polynomial::from_expr`], refusing anything above `max_degree`.
    pub fn from_expr_bounded(expr: &Expr, var: &str, max_degree: usize) -> Option<Self> {
        let poly = match expr {
            Expr::Number(n) => Polynomial::constant(n.clone(), var),
            Expr::Variable(v) if v == var => Polynomial::identity(var),
            Expr::Add(terms) => {
                let mut acc = Polynomial::zero(var);
                for t in terms {
                    acc = acc.add(&Polynomial::from_expr_bounded(t, var, max_degree)?);
                }
                acc
            }
            Expr::Mul(factors) => {
                let mut acc = Polynomial::one(var);
                for f in factors {
                    acc = acc.mul(&Polynomial::from_expr_bounded(f, var, max_degree)?);
                    if acc.degree() > max_degree {
                        return None;
                    }
                }
                acc
            }
            Expr::Pow(base, exp) => {
                let n = exp.as_i64().filter(|n| *n >= 0)?;
                let n = usize::try_from(n).ok()?;
                let base = Polynomial::from_expr_bounded(base, var, max_degree)?;
                if base.degree().saturating_mul(n) > max_degree {
                    return None;
                }
                base.pow(n as u32)
            }
            _ => return None,
        };
        if poly.degree() > max_degree {
            return None;
        }
        Some(poly)
    }

    pub fn to_expr(&self) -> Expr {
        let x = Expr::var(&self.var);
        build::add(
            self.coeffs
                .iter()
                .enumerate()
                .filter(|(_, c)| !c.is_zero())
                .map(|(i, c)| {
                    build::mul([
                        Expr::Number(c.clone()),
                        build::pow(x.clone(), Expr::int(i as i64)),
                    ])
                })
                .collect::<Vec<_>>(),
        )
    }

    pub fn add(&self, other: &Self) -> Self {
        let len = max(self.coeffs.len(), other.coeffs.len());
        let coeffs = (0..len).map(|i| self.coeff(i) + other.coeff(i)).collect();
        Polynomial::new(coeffs, &self.var)
    }

    pub fn sub(&self, other: &Self) -> Self {
        let len = max(self.coeffs.len(), other.coeffs.len());
        let coeffs = (0..len).map(|i| self.coeff(i) - other.coeff(i)).collect();
        Polynomial::new(coeffs, &self.var)
    }

    pub fn mul(&self, other: &Self) -> Self {
        if self.is_zero() || other.is_zero() {
            return Polynomial::zero(&self.var);
        }
        let mut coeffs = vec![BigRational::zero(); self.coeffs.len() + other.coeffs.len() - 1];
        for (i, c1) in self.coeffs.iter().enumerate() {
            for (j, c2) in other.coeffs.iter().enumerate() {
                coeffs[i + j] += c1 * c2;
            }
        }
        Polynomial::new(coeffs, &self.var)
    }

    pub fn neg(&self) -> Self {
        Polynomial::new(self.coeffs.iter().map(|c| -c).collect(), &self.var)
    }

    pub fn scale(&self, k: &BigRational) -> Self {
        Polynomial::new(self.coeffs.iter().map(|c| c * k).collect(), &self.var)
    }

    pub fn pow(&self, mut n: u32) -> Self {
        let mut result = Polynomial::one(&self.var);
        let mut base = self.clone();
        while n > 0 {
            if n & 1 == 1 {
                result = result.mul(&base);
            }
            n >>= 1;
            if n > 0 {
                base = base.mul(&base);
            }
        }
        result
    }

    /// Returns (quotient, remainder). Dividing by the zero polynomial leaves
    /// `self` as the remainder.
    pub fn div_rem(&self, divisor: &Self) -> (Self, Self) {
        if divisor.is_zero() || self.degree() < divisor.degree() || self.is_zero() {
            return (Polynomial::zero(&self.var), self.clone());
        }
        let divisor_deg = divisor.degree();
        let divisor_lc = divisor.leading_coeff();
        let mut remainder = self.coeffs.clone();
        let mut quotient = vec![BigRational::zero(); self.degree() - divisor_deg + 1];

        for shift in (0..quotient.len()).rev() {
            let lead = &remainder[shift + divisor_deg];
            if lead.is_zero() {
                continue;
            }
            let q = lead / &divisor_lc;
            for (j, d) in divisor.coeffs.iter().enumerate() {
                remainder[shift + j] -= &q * d;
            }
            quotient[shift] = q;
        }
        remainder.truncate(divisor_deg);
        (
            Polynomial::new(quotient, &self.var),
            Polynomial::new(remainder, &self.var),
        )
    }

    /// Quotient when `divisor` divides `self` exactly.
    pub fn exact_div(&self, divisor: &Self) -> Option<Self> {
        if divisor.is_zero() {
            return None;
        }
        let (q, r) = self.div_rem(divisor);
        r.is_zero().then_some(q)
    }

    /// Monic greatest common divisor.
    pub fn gcd(&self, other: &Self) -> Self {
        let mut a = self.clone();
        let mut b = other.clone();
        while !b.is_zero() {
            let (_, r) = a.div_rem(&b);
            a = b;
            b = r;
        }
        a.monic()
    }

    pub fn monic(&self) -> Self {
        if self.is_zero() {
            return self.clone();
        }
        self.scale(&(BigRational::one() / self.leading_coeff()))
    }

    pub fn derivative(&self) -> Self {
        let coeffs = self
            .coeffs
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, c)| c * BigRational::from_integer(BigInt::from(i)))
            .collect();
        Polynomial::new(coeffs, &self.var)
    }

    pub fn eval(&self, x: &BigRational) -> BigRational {
        self.coeffs
            .iter()
            .rev()
            .fold(BigRational::zero(), |acc, c| acc * x + c)
    }

    pub fn eval_complex(&self, z: Complex64) -> Complex64 {
        self.complex_coeffs()
            .iter()
            .rev()
            .fold(Complex64::new(0.0, 0.0), |acc, c| acc * z + c)
    }

    /// Coefficients as `f64` complex numbers, lowest degree first.
    pub fn complex_coeffs(&self) -> Vec<Complex64> {
        self.coeffs
            .iter()
            .map(|c| Complex64::new(c.to_f64().unwrap_or(f64::NAN), 0.0))
            .collect()
    }

    /// Splits into `(content, primitive)` where `primitive` has coprime
    /// integer coefficients and a positive leading coefficient.
    pub fn primitive(&self) -> (BigRational, Self) {
        if self.is_zero() {
            return (BigRational::zero(), self.clone());
        }
        let lcm = self
            .coeffs
            .iter()
            .fold(BigInt::one(), |acc, c| acc.lcm(c.denom()));
        let scaled: Vec<BigInt> = self
            .coeffs
            .iter()
            .map(|c| (c * BigRational::from_integer(lcm.clone())).to_integer())
            .collect();
        let mut g = scaled.iter().fold(BigInt::zero(), |acc, c| acc.gcd(c));
        if self.leading_coeff().is_negative() {
            g = -g;
        }
        let content = BigRational::new(g.clone(), lcm);
        let coeffs = scaled
            .into_iter()
            .map(|c| BigRational::from_integer(c / &g))
            .collect();
        (content, Polynomial::new(coeffs, &self.var))
    }

    /// Integer coefficients, if every coefficient is integral.
    pub fn integer_coeffs(&self) -> Option<Vec<BigInt>> {
        self.coeffs
            .iter()
            .map(|c| c.is_integer().then(|| c.to_integer()))
            .collect()
    }

    /// Yun's algorithm: monic square-free parts paired with multiplicities.
    pub fn square_free_decomposition(&self) -> Vec<(Polynomial, u32)> {
        let mut out = Vec::new();
        if self.is_constant() {
            return out;
        }
        let f = self.monic();
        let df = f.derivative();
        let a0 = f.gcd(&df);
        let mut b = f.div_rem(&a0).0;
        let mut c = df.div_rem(&a0).0;
        let mut d = c.sub(&b.derivative());
        let mut i = 1;
        while !b.is_constant() {
            let a = b.gcd(&d);
            if !a.is_constant() {
                out.push((a.clone(), i));
            }
            b = b.div_rem(&a).0;
            c = d.div_rem(&a).0;
            d = c.sub(&b.derivative());
            i += 1;
        }
        out
    }

    /// The product of the distinct irreducible factors, made monic.
    pub fn square_free_part(&self) -> Self {
        if self.is_constant() {
            return Polynomial::one(&self.var);
        }
        let g = self.gcd(&self.derivative());
        self.div_rem(&g).0.monic()
    }

    /// `f(x + s)`.
    pub fn shift(&self, s: &BigRational) -> Self {
        let linear = Polynomial::new(vec![s.clone(), BigRational::one()], &self.var);
        self.coeffs
            .iter()
            .rev()
            .fold(Polynomial::zero(&self.var), |acc, c| {
                acc.mul(&linear).add(&Polynomial::constant(c.clone(), &self.var))
            })
    }

    /// Writes `f(x) = g(x^k)` with the largest `k >= 2`, if any.
    pub fn power_decomposition(&self) -> Option<(usize, Polynomial)> {
        if self.degree() < 2 {
            return None;
        }
        let k = self
            .coeffs
            .iter()
            .enumerate()
            .filter(|(i, c)| *i > 0 && !c.is_zero())
            .fold(0usize, |acc, (i, _)| acc.gcd(&i));
        if k < 2 {
            return None;
        }
        let inner = self.coeffs.iter().step_by(k).cloned().collect();
        Some((k, Polynomial::new(inner, &self.var)))
    }

    /// For integral `f` with leading coefficient `a`, the monic integral
    /// `a^(n-1) f(y / a)`, whose roots are `a` times those of `f`.
    pub fn monic_integral(&self) -> Option<Self> {
        let ints = self.integer_coeffs()?;
        let n = self.degree();
        let a = ints.last()?.clone();
        let coeffs = ints
            .iter()
            .enumerate()
            .map(|(i, c)| {
                if i == n {
                    BigRational::one()
                } else {
                    BigRational::from_integer(c * num_traits::pow(a.clone(), n - 1 - i))
                }
            })
            .collect();
        Some(Polynomial::new(coeffs, &self.var))
    }

    /// `Res(f, g)` as the determinant of the Sylvester matrix.
    pub fn resultant(&self, other: &Self) -> BigRational {
        let m = self.degree();
        let n = other.degree();
        if self.is_zero() || other.is_zero() {
            return BigRational::zero();
        }
        let size = m + n;
        if size == 0 {
            return BigRational::one();
        }
        let mut matrix = vec![vec![BigRational::zero(); size]; size];
        for row in 0..n {
            for (j, c) in self.coeffs.iter().rev().enumerate() {
                matrix[row][row + j] = c.clone();
            }
        }
        for row in 0..m {
            for (j, c) in other.coeffs.iter().rev().enumerate() {
                matrix[n + row][row + j] = c.clone();
            }
        }
        determinant(matrix)
    }

    pub fn discriminant(&self) -> BigRational {
        let n = self.degree();
        if n < 1 {
            return BigRational::zero();
        }
        let res = self.resultant(&self.derivative());
        let sign = if (n * (n - 1) / 2) % 2 == 0 {
            BigRational::one()
        } else {
            -BigRational::one()
        };
        sign * res / self.leading_coeff()
    }
}

/// Determinant by fraction-exact Gaussian elimination.
fn determinant(mut m: Vec<Vec<BigRational>>) -> BigRational {
    let size = m.len();
    let mut det = BigRational::one();
    for col in 0..size {
        let Some(pivot) = (col..size).find(|&r| !m[r][col].is_zero()) else {
            return BigRational::zero();
        };
        if pivot != col {
            m.swap(pivot, col);
            det = -det;
        }
        let p = m[col][col].clone();
        det *= &p;
        for r in (col + 1)..size {
            if m[r][col].is_zero() {
                continue;
            }
            let factor = &m[r][col] / &p;
            for c in col..size {
                let delta = &factor * &m[col][c];
                m[r][c] -= delta;
            }
        }
    }
    det
}

/// True when `q` is the square of a rational.
pub fn is_rational_square(q: &BigRational) -> bool {
    if q.is_negative() {
        return false;
    }
    let n = q.numer();
    let d = q.denom();
    let rn = n.sqrt();
    let rd = d.sqrt();
    &(&rn * &rn) == n && &(&rd * &rd) == d
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_expr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tb_parser::parse;

    fn poly(s: &str) -> Polynomial {
        Polynomial::from_expr(&parse(s).unwrap(), "x").unwrap()
    }

    #[test]
    fn test_poly_ops() {
        let x = Polynomial::identity("x");
        let one = Polynomial::one("x");
        let prod = x.add(&one).mul(&x.sub(&one));
        assert_eq!(prod, Polynomial::from_integers(&[-1, 0, 1], "x"));
    }

    #[test]
    fn test_from_expr_rejects_non_polynomials() {
        assert!(Polynomial::from_expr(&parse("1/x").unwrap(), "x").is_none());
        assert!(Polynomial::from_expr(&parse("x*y").unwrap(), "x").is_none());
        assert!(Polynomial::from_expr(&parse("sqrt(x)").unwrap(), "x").is_none());
        assert!(Polynomial::from_expr_bounded(&parse("x^10").unwrap(), "x", 4).is_none());
        assert_eq!(poly("(x + 1)^2"), poly("x^2 + 2*x + 1"));
    }

    #[test]
    fn test_div_rem() {
        let (q, r) = poly("x^2 + 2*x + 1").div_rem(&poly("x + 1"));
        assert!(r.is_zero());
        assert_eq!(q.to_string(), "x + 1");

        let (q, r) = poly("x^3 + 2").div_rem(&poly("x - 1"));
        assert_eq!(q, poly("x^2 + x + 1"));
        assert_eq!(r, Polynomial::from_integers(&[3], "x"));
    }

    #[test]
    fn test_gcd() {
        let g = poly("x^2 - 1").gcd(&poly("x^2 + 2*x + 1"));
        assert_eq!(g, poly("x + 1"));
    }

    #[test]
    fn test_primitive() {
        let (content, prim) = poly("-x^2/2 + 3/4").primitive();
        assert_eq!(content, BigRational::new((-1).into(), 4.into()));
        assert_eq!(prim, Polynomial::from_integers(&[-3, 0, 2], "x"));
    }

    #[test]
    fn test_square_free_decomposition() {
        // (x - 1)^2 (x + 2)
        let parts = poly("(x - 1)^2*(x + 2)").square_free_decomposition();
        assert_eq!(parts, vec![(poly("x + 2"), 1), (poly("x - 1"), 2)]);
        assert_eq!(poly("(x - 1)^3").square_free_part(), poly("x - 1"));
    }

    #[test]
    fn test_shift_and_power_decomposition() {
        assert_eq!(poly("x^2").shift(&BigRational::one()), poly("x^2 + 2*x + 1"));
        let (k, inner) = poly("x^6 - 3*x^3 + 2").power_decomposition().unwrap();
        assert_eq!(k, 3);
        assert_eq!(inner, poly("x^2 - 3*x + 2"));
        assert!(poly("x^5 - x - 1").power_decomposition().is_none());
    }

    #[test]
    fn test_monic_integral() {
        let g = poly("2*x^2 + 3*x + 5").monic_integral().unwrap();
        assert_eq!(g, poly("x^2 + 3*x + 10"));
    }

    #[test]
    fn test_discriminant() {
        assert_eq!(
            poly("x^2 + x + 1").discriminant(),
            BigRational::from_integer((-3).into())
        );
        assert_eq!(
            poly("x^3 - x").discriminant(),
            BigRational::from_integer(4.into())
        );
        // x^5 - 5x + 12 has discriminant 2^12 * 5^6
        let d = poly("x^5 - 5*x + 12").discriminant();
        assert_eq!(d, BigRational::from_integer(BigInt::from(4096 * 15625)));
        assert!(is_rational_square(&d));
    }
}
