//! Grammar, loosest binding first:
//!
//! ```text
//! sum      = product (("+" | "-") product)*
//! product  = signed (("*" | "/") signed)* juxtaposed*
//! signed   = ("-" | "+") signed | power
//! power    = postfix (("^" | "**") exponent)?      right associative
//! exponent = ("-" | "+") exponent | power
//! postfix  = atom superscript?
//! atom     = radical | number | call | constant | name | "(" sum ")" | "|" sum "|"
//! ```
//!
//! Numbers may carry a decimal exponent (`6.02e23`, `1e-3`); an `e` not
//! followed by digits is the constant or the start of a name.
//!
//! Implicit multiplication only follows a numeric coefficient written flush
//! against the next factor (`2x`, `3(x+1)`); `2 x` is an error, which keeps
//! prose such as "3 maybe" from parsing.

use crate::error::ParseError;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{digit0, digit1, multispace0, one_of},
    combinator::{map, opt, recognize},
    error::{Error as NomError, ErrorKind},
    multi::{fold_many0, separated_list1},
    sequence::{delimited, pair, preceded},
    IResult,
};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Num;
use tb_ast::{build, Constant, Equation, Expr};

#[derive(Debug, Clone, Copy)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone)]
enum Syntax {
    Num(BigRational),
    Const(Constant),
    Var(String),
    Binary(BinOp, Box<Syntax>, Box<Syntax>),
    Neg(Box<Syntax>),
    Call(String, Vec<Syntax>),
}

impl Syntax {
    fn binary(op: BinOp, l: Syntax, r: Syntax) -> Syntax {
        Syntax::Binary(op, Box::new(l), Box::new(r))
    }

    fn int(n: u64) -> Syntax {
        Syntax::Num(BigRational::from_integer(BigInt::from(n)))
    }

    fn into_expr(self) -> Expr {
        match self {
            Syntax::Num(n) => Expr::Number(n),
            Syntax::Const(c) => Expr::Constant(c),
            Syntax::Var(name) => Expr::Variable(name),
            Syntax::Neg(inner) => build::neg(inner.into_expr()),
            Syntax::Binary(op, l, r) => {
                let (l, r) = (l.into_expr(), r.into_expr());
                match op {
                    BinOp::Add => build::add2(l, r),
                    BinOp::Sub => build::sub(l, r),
                    BinOp::Mul => build::mul2(l, r),
                    BinOp::Div => build::div(l, r),
                    BinOp::Pow => build::pow(l, r),
                }
            }
            Syntax::Call(name, args) => {
                call_to_expr(&name, args.into_iter().map(Syntax::into_expr).collect())
            }
        }
    }
}

/// Radical and exponential spellings become powers; `ln` is `log`, and
/// `log(v, b)` is `log(v)/log(b)`. Anything else stays a named function.
fn call_to_expr(name: &str, args: Vec<Expr>) -> Expr {
    match (name, args.as_slice()) {
        ("sqrt", [x]) => build::sqrt(x.clone()),
        ("sqrt" | "root", [x, n]) => build::pow(x.clone(), build::div(Expr::one(), n.clone())),
        ("cbrt", [x]) => build::pow(x.clone(), Expr::rational(1, 3)),
        ("exp", [x]) => build::pow(Expr::Constant(Constant::E), x.clone()),
        ("ln" | "log", [_]) => build::function("log", args),
        ("log", [v, b]) => build::div(
            build::function("log", vec![v.clone()]),
            build::function("log", vec![b.clone()]),
        ),
        ("abs" | "Abs", [_]) => build::function("abs", args),
        _ => build::function(name, args),
    }
}

fn reject<T>(input: &str, kind: ErrorKind) -> IResult<&str, T> {
    Err(nom::Err::Error(NomError::new(input, kind)))
}

/// `token` after optional whitespace.
fn sym<'a>(token: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    preceded(multispace0, tag(token))
}

fn minus(input: &str) -> IResult<&str, &str> {
    alt((tag("-"), tag("−")))(input)
}

const SUPERSCRIPT_DIGITS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];

fn superscript(input: &str) -> Option<(u64, &str)> {
    let mut value = 0u64;
    let mut end = 0;
    for c in input.chars() {
        let Some(d) = SUPERSCRIPT_DIGITS.iter().position(|s| *s == c) else {
            break;
        };
        value = value.checked_mul(10)?.checked_add(d as u64)?;
        end += c.len_utf8();
    }
    (end > 0).then(|| (value, &input[end..]))
}

/// Largest `|k|` accepted in a `...e<k>` suffix.
const MAX_DECIMAL_EXPONENT: i64 = 1000;

/// `e7`, `E-3`, `e+12`
fn decimal_exponent(input: &str) -> IResult<&str, i64> {
    let (rest, (sign, digits)) =
        preceded(one_of("eE"), pair(opt(one_of("+-")), digit1))(input)?;
    match digits.parse::<i64>() {
        Ok(k) if k <= MAX_DECIMAL_EXPONENT => Ok((rest, if sign == Some('-') { -k } else { k })),
        _ => reject(input, ErrorKind::TooLarge),
    }
}

/// Decimal literal: `12`, `1.25`, `.5`, `3.`, `2.5e-3`
fn number(input: &str) -> IResult<&str, Syntax> {
    let (rest, text) = recognize(pair(digit0, opt(pair(tag("."), digit0))))(input)?;
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return reject(input, ErrorKind::Digit);
    }
    let (rest, exp) = match decimal_exponent(rest) {
        Ok((after, k)) => (after, k),
        Err(nom::Err::Error(e)) if e.code == ErrorKind::TooLarge => {
            return reject(input, ErrorKind::TooLarge)
        }
        Err(_) => (rest, 0),
    };
    let Ok(mantissa) = BigInt::from_str_radix(&digits, 10) else {
        return reject(input, ErrorKind::Digit);
    };
    let scale = text.find('.').map_or(0, |dot| text.len() - dot - 1) as i64;
    let shift = exp - scale;
    let ten_to = |k: i64| num_traits::pow(BigInt::from(10), k.unsigned_abs() as usize);
    let value = if shift >= 0 {
        BigRational::from_integer(mantissa * ten_to(shift))
    } else {
        BigRational::new(mantissa, ten_to(shift))
    };
    Ok((rest, Syntax::Num(value)))
}

fn name(input: &str) -> IResult<&str, &str> {
    let mut chars = input.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return reject(input, ErrorKind::Alpha),
    }
    let end = chars
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
        .map_or(input.len(), |(i, _)| i);
    Ok((&input[end..], &input[..end]))
}

/// `pi`, `e`/`E`, `i`/`I` as whole words only.
fn constant(input: &str) -> IResult<&str, Syntax> {
    let (rest, word) = name(input)?;
    let c = match word {
        "pi" => Constant::Pi,
        "e" | "E" => Constant::E,
        "i" | "I" => Constant::I,
        _ => return reject(input, ErrorKind::Tag),
    };
    Ok((rest, Syntax::Const(c)))
}

fn call(input: &str) -> IResult<&str, Syntax> {
    let (input, f) = name(input)?;
    let (input, args) = delimited(sym("("), separated_list1(sym(","), sum), sym(")"))(input)?;
    Ok((input, Syntax::Call(f.to_string(), args)))
}

fn group(input: &str) -> IResult<&str, Syntax> {
    delimited(sym("("), sum, sym(")"))(input)
}

fn bars(input: &str) -> IResult<&str, Syntax> {
    map(delimited(sym("|"), sum, sym("|")), |inner| {
        Syntax::Call("abs".to_string(), vec![inner])
    })(input)
}

/// `√x`, `∛8`, `∜16`, `⁵√32`
fn radical(input: &str) -> IResult<&str, Syntax> {
    let prefixed = if let Some(rest) = input.strip_prefix('√') {
        Some((2, rest))
    } else if let Some(rest) = input.strip_prefix('∛') {
        Some((3, rest))
    } else if let Some(rest) = input.strip_prefix('∜') {
        Some((4, rest))
    } else {
        superscript(input).and_then(|(n, rest)| rest.strip_prefix('√').map(|r| (n, r)))
    };
    let Some((index, rest)) = prefixed else {
        return reject(input, ErrorKind::Tag);
    };
    let (rest, radicand) = alt((group, postfix))(rest)?;
    Ok((
        rest,
        Syntax::Call("root".to_string(), vec![radicand, Syntax::int(index)]),
    ))
}

fn atom(input: &str) -> IResult<&str, Syntax> {
    preceded(
        multispace0,
        alt((
            radical,
            number,
            call,
            constant,
            map(name, |s: &str| Syntax::Var(s.to_string())),
            group,
            bars,
        )),
    )(input)
}

fn postfix(input: &str) -> IResult<&str, Syntax> {
    let (input, base) = atom(input)?;
    match superscript(input) {
        Some((k, rest)) => Ok((rest, Syntax::binary(BinOp::Pow, base, Syntax::int(k)))),
        None => Ok((input, base)),
    }
}

fn power(input: &str) -> IResult<&str, Syntax> {
    let (input, base) = postfix(input)?;
    match preceded(multispace0::<&str, NomError<&str>>, alt((tag("**"), tag("^"))))(input) {
        Ok((input, _)) => {
            let (input, exp) = exponent(input)?;
            Ok((input, Syntax::binary(BinOp::Pow, base, exp)))
        }
        Err(_) => Ok((input, base)),
    }
}

fn exponent(input: &str) -> IResult<&str, Syntax> {
    preceded(
        multispace0,
        alt((
            map(preceded(minus, exponent), |e| Syntax::Neg(Box::new(e))),
            preceded(tag("+"), exponent),
            power,
        )),
    )(input)
}

fn signed(input: &str) -> IResult<&str, Syntax> {
    alt((
        map(preceded(preceded(multispace0, minus), signed), |e| {
            Syntax::Neg(Box::new(e))
        }),
        preceded(sym("+"), signed),
        power,
    ))(input)
}

fn ends_in_coefficient(node: &Syntax) -> bool {
    match node {
        Syntax::Num(_) => true,
        Syntax::Binary(BinOp::Mul | BinOp::Div, _, r) => ends_in_coefficient(r),
        _ => false,
    }
}

/// `2x`, `3(x + 1)`, `2xy`: no whitespace allowed before the next factor.
fn juxtaposed(mut input: &str, mut acc: Syntax) -> IResult<&str, Syntax> {
    while ends_in_coefficient(&acc)
        && input
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '(')
    {
        let Ok((rest, factor)) = power(input) else {
            break;
        };
        acc = Syntax::binary(BinOp::Mul, acc, factor);
        input = rest;
    }
    Ok((input, acc))
}

fn product(input: &str) -> IResult<&str, Syntax> {
    let (input, first) = signed(input)?;
    let op = preceded(
        multispace0,
        alt((
            map(alt((tag("*"), tag("·"), tag("×"))), |_| BinOp::Mul),
            map(alt((tag("/"), tag("÷"))), |_| BinOp::Div),
        )),
    );
    let (input, acc) = fold_many0(
        pair(op, signed),
        move || first.clone(),
        |acc, (op, rhs)| Syntax::binary(op, acc, rhs),
    )(input)?;
    juxtaposed(input, acc)
}

fn sum(input: &str) -> IResult<&str, Syntax> {
    let (input, first) = product(input)?;
    let op = preceded(
        multispace0,
        alt((map(tag("+"), |_| BinOp::Add), map(minus, |_| BinOp::Sub))),
    );
    fold_many0(
        pair(op, product),
        move || first.clone(),
        |acc, (op, rhs)| Syntax::binary(op, acc, rhs),
    )(input)
}

/// Parses a single expression; the whole input must be consumed.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let (rest, tree) = sum(input).map_err(|e| ParseError::NomError(e.to_string()))?;
    let rest = rest.trim();
    if !rest.is_empty() {
        return Err(ParseError::UnconsumedInput(rest.to_string()));
    }
    Ok(tree.into_expr())
}

/// Parses `lhs = rhs`. A bare expression is read as `expr = 0`.
pub fn parse_equation(input: &str) -> Result<Equation, ParseError> {
    let mut sides = input.split('=');
    let (Some(lhs), rhs, None) = (sides.next(), sides.next(), sides.next()) else {
        return Err(ParseError::NotAnEquation(input.to_string()));
    };
    let lhs = parse(lhs)?;
    let rhs = match rhs {
        Some(text) => parse(text)?,
        None => Expr::zero(),
    };
    Ok(Equation::new(lhs, rhs))
}
