use crate::build;
use crate::expression::{is_builtin_function, Expr};
use std::collections::BTreeSet;

/// Names of all variables occurring in `e`.
pub fn free_variables(e: &Expr) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    collect_variables(e, &mut out);
    out
}

fn collect_variables(e: &Expr, out: &mut BTreeSet<String>) {
    if let Expr::Variable(name) = e {
        out.insert(name.clone());
    }
    for child in e.children() {
        collect_variables(child, out);
    }
}

pub fn contains_variable(e: &Expr, var: &str) -> bool {
    match e {
        Expr::Variable(name) => name == var,
        _ => e.children().into_iter().any(|c| contains_variable(c, var)),
    }
}

/// True if `e` applies a function the engine has no definition for.
pub fn has_undefined_function(e: &Expr) -> bool {
    match e {
        Expr::Function(name, args) => {
            !is_builtin_function(name) || args.iter().any(has_undefined_function)
        }
        _ => e.children().into_iter().any(has_undefined_function),
    }
}

pub fn node_count(e: &Expr) -> usize {
    1 + e.children().into_iter().map(node_count).sum::<usize>()
}

/// Rebuilds `e` bottom-up through the canonical constructors, giving `f` the
/// first chance to replace each node. A node replaced by `f` is not descended.
pub fn rewrite<F>(e: &Expr, f: &mut F) -> Expr
where
    F: FnMut(&Expr) -> Option<Expr>,
{
    if let Some(replaced) = f(e) {
        return replaced;
    }
    match e {
        Expr::Number(_) | Expr::Constant(_) | Expr::Variable(_) => e.clone(),
        Expr::Function(name, args) => {
            build::function(name, args.iter().map(|a| rewrite(a, f)).collect())
        }
        Expr::Pow(b, exp) => build::pow(rewrite(b, f), rewrite(exp, f)),
        Expr::Mul(factors) => build::mul(factors.iter().map(|x| rewrite(x, f)).collect::<Vec<_>>()),
        Expr::Add(terms) => build::add(terms.iter().map(|x| rewrite(x, f)).collect::<Vec<_>>()),
    }
}
