use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

/// Named constants. `Undefined` absorbs every operation it touches
/// (division by zero, `0^-1`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Constant {
    Pi,
    E,
    I,
    Undefined,
}

impl Constant {
    pub fn name(self) -> &'static str {
        match self {
            Constant::Pi => "pi",
            Constant::E => "E",
            Constant::I => "I",
            Constant::Undefined => "undefined",
        }
    }
}

/// Functions the engine knows how to evaluate. Any other applied name is an
/// undefined function application.
pub const BUILTIN_FUNCTIONS: &[&str] = &["sin", "cos", "tan", "log", "abs"];

pub fn is_builtin_function(name: &str) -> bool {
    BUILTIN_FUNCTIONS.contains(&name)
}

/// An n-ary expression tree kept in canonical form.
///
/// Values built through [`crate::build`] satisfy:
/// - `Add`/`Mul` are flat, have at least two arguments and are sorted;
/// - numbers are folded (at most one numeric term in a sum, one leading
///   coefficient in a product);
/// - like terms and like factors are combined.
///
/// The variant order matters: the derived `Ord` ranks numbers first, which
/// keeps the numeric coefficient at the head of a product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Expr {
    Number(BigRational),
    Constant(Constant),
    Variable(String),
    Function(String, Vec<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Mul(Vec<Expr>),
    Add(Vec<Expr>),
}

impl Expr {
    pub fn int(n: i64) -> Expr {
        Expr::Number(BigRational::from_integer(BigInt::from(n)))
    }

    pub fn rational(numer: i64, denom: i64) -> Expr {
        Expr::Number(BigRational::new(BigInt::from(numer), BigInt::from(denom)))
    }

    pub fn number(n: BigRational) -> Expr {
        Expr::Number(n)
    }

    pub fn var(name: &str) -> Expr {
        Expr::Variable(name.to_string())
    }

    pub fn zero() -> Expr {
        Expr::Number(BigRational::zero())
    }

    pub fn one() -> Expr {
        Expr::Number(BigRational::one())
    }

    pub fn imaginary_unit() -> Expr {
        Expr::Constant(Constant::I)
    }

    pub fn undefined() -> Expr {
        Expr::Constant(Constant::Undefined)
    }

    pub fn as_number(&self) -> Option<&BigRational> {
        match self {
            Expr::Number(n) => Some(n),
            _ => None,
        }
    }

    /// The value as a machine integer, when it is an integral number that fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Expr::Number(n) if n.is_integer() => n.to_integer().to_i64(),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Expr::Number(_))
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Number(n) if n.is_zero())
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Number(n) if n.is_one())
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Expr::Constant(Constant::Undefined))
    }

    /// True for a negative number or a product led by a negative coefficient.
    pub fn has_negative_sign(&self) -> bool {
        match self {
            Expr::Number(n) => n.is_negative(),
            Expr::Mul(factors) => matches!(factors.first(), Some(Expr::Number(n)) if n.is_negative()),
            _ => false,
        }
    }

    /// Immediate operands, in storage order.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Number(_) | Expr::Constant(_) | Expr::Variable(_) => Vec::new(),
            Expr::Function(_, args) => args.iter().collect(),
            Expr::Pow(b, e) => vec![b.as_ref(), e.as_ref()],
            Expr::Mul(items) | Expr::Add(items) => items.iter().collect(),
        }
    }
}

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        Expr::int(n)
    }
}

impl From<BigRational> for Expr {
    fn from(n: BigRational) -> Self {
        Expr::Number(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_helpers() {
        assert!(Expr::int(0).is_zero());
        assert!(Expr::int(1).is_one());
        assert_eq!(Expr::rational(6, 4), Expr::rational(3, 2));
        assert_eq!(Expr::int(-7).as_i64(), Some(-7));
        assert_eq!(Expr::rational(1, 2).as_i64(), None);
    }

    #[test]
    fn test_numbers_sort_first() {
        let mut items = vec![Expr::var("x"), Expr::imaginary_unit(), Expr::int(3)];
        items.sort();
        assert_eq!(items[0], Expr::int(3));
        assert_eq!(items[1], Expr::imaginary_unit());
    }

    #[test]
    fn test_negative_sign() {
        assert!(Expr::int(-2).has_negative_sign());
        assert!(Expr::Mul(vec![Expr::int(-1), Expr::var("x")]).has_negative_sign());
        assert!(!Expr::var("x").has_negative_sign());
    }
}
