use crate::build;
use crate::expression::Expr;
use crate::ordering::{compare_factors, compare_terms};
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use std::fmt;

// Binding strength, loosest first.
const PREC_ADD: u8 = 1;
const PREC_MUL: u8 = 2;
const PREC_POW: u8 = 3;
const PREC_ATOM: u8 = 4;

fn precedence(e: &Expr) -> u8 {
    match e {
        Expr::Number(n) if n.is_negative() => PREC_ADD,
        Expr::Number(n) if !n.is_integer() => PREC_MUL,
        Expr::Add(_) => PREC_ADD,
        Expr::Mul(_) => PREC_MUL,
        Expr::Pow(_, exp) if matches!(exp.as_ref(), Expr::Number(n) if n.is_negative()) => PREC_MUL,
        Expr::Pow(..) => PREC_POW,
        _ => PREC_ATOM,
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, e: &Expr, min_prec: u8) -> fmt::Result {
    if precedence(e) < min_prec {
        write!(f, "({})", e)
    } else {
        write!(f, "{}", e)
    }
}

fn write_number(f: &mut fmt::Formatter<'_>, n: &BigRational) -> fmt::Result {
    if n.is_integer() {
        write!(f, "{}", n.numer())
    } else {
        write!(f, "{}/{}", n.numer(), n.denom())
    }
}

fn write_pow(f: &mut fmt::Formatter<'_>, base: &Expr, exp: &Expr) -> fmt::Result {
    if let Expr::Number(n) = exp {
        if n.is_negative() {
            let flipped = -n;
            f.write_str("1/")?;
            return if flipped.is_one() {
                write_operand(f, base, PREC_ATOM)
            } else {
                write_positive_pow(f, base, &Expr::Number(flipped))
            };
        }
    }
    write_positive_pow(f, base, exp)
}

fn write_positive_pow(f: &mut fmt::Formatter<'_>, base: &Expr, exp: &Expr) -> fmt::Result {
    write_operand(f, base, PREC_ATOM)?;
    f.write_str("^")?;
    match exp {
        Expr::Number(n) if n.is_integer() && !n.is_negative() => write_number(f, n),
        Expr::Variable(_) | Expr::Constant(_) | Expr::Function(..) => write!(f, "{}", exp),
        _ => write!(f, "({})", exp),
    }
}

fn write_mul(f: &mut fmt::Formatter<'_>, factors: &[Expr]) -> fmt::Result {
    let (coeff, rest): (BigRational, Vec<&Expr>) = match factors.first() {
        Some(Expr::Number(c)) => (c.clone(), factors[1..].iter().collect()),
        _ => (BigRational::one(), factors.iter().collect()),
    };
    let mut rest = rest;
    rest.sort_by(|a, b| compare_factors(a, b));

    let mut numer: Vec<String> = Vec::new();
    let mut denom: Vec<String> = Vec::new();
    let magnitude = coeff.abs();
    if !magnitude.numer().is_one() {
        numer.push(magnitude.numer().to_string());
    }
    if !magnitude.denom().is_one() {
        denom.push(magnitude.denom().to_string());
    }

    for factor in rest {
        match factor {
            Expr::Pow(base, exp) if matches!(exp.as_ref(), Expr::Number(n) if n.is_negative()) => {
                let flipped = build::neg(exp.as_ref().clone());
                let shown = if flipped.is_one() {
                    base.as_ref().clone()
                } else {
                    Expr::Pow(base.clone(), Box::new(flipped))
                };
                denom.push(parenthesize(&shown, PREC_POW));
            }
            other => numer.push(parenthesize(other, PREC_MUL + 1)),
        }
    }

    if coeff.is_negative() {
        f.write_str("-")?;
    }
    if numer.is_empty() {
        f.write_str("1")?;
    } else {
        f.write_str(&numer.join("*"))?;
    }
    match denom.len() {
        0 => Ok(()),
        1 => write!(f, "/{}", denom[0]),
        _ => write!(f, "/({})", denom.join("*")),
    }
}

fn parenthesize(e: &Expr, min_prec: u8) -> String {
    if precedence(e) < min_prec {
        format!("({})", e)
    } else {
        e.to_string()
    }
}

fn write_add(f: &mut fmt::Formatter<'_>, terms: &[Expr]) -> fmt::Result {
    let mut ordered: Vec<&Expr> = terms.iter().collect();
    ordered.sort_by(|a, b| compare_terms(a, b));

    for (i, term) in ordered.into_iter().enumerate() {
        if i == 0 {
            write!(f, "{}", term)?;
        } else if term.has_negative_sign() {
            f.write_str(" - ")?;
            let flipped = build::neg(term.clone());
            write_operand(f, &flipped, PREC_MUL)?;
        } else {
            f.write_str(" + ")?;
            write!(f, "{}", term)?;
        }
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write_number(f, n),
            Expr::Constant(c) => f.write_str(c.name()),
            Expr::Variable(name) => f.write_str(name),
            Expr::Function(name, args) => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            Expr::Pow(base, exp) => write_pow(f, base, exp),
            Expr::Mul(factors) => write_mul(f, factors),
            Expr::Add(terms) => {
                if terms.is_empty() {
                    return write_number(f, &BigRational::zero());
                }
                write_add(f, terms)
            }
        }
    }
}
