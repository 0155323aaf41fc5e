use proptest::prelude::*;
use tb_ast::build::{add, div, mul, neg, pow, sub};
use tb_ast::Expr;

fn arb_atom() -> impl Strategy<Value = Expr> {
    prop_oneof![
        (-9i64..=9).prop_map(Expr::int),
        (1i64..=9, 2i64..=5).prop_map(|(n, d)| Expr::rational(n, d)),
        prop::sample::select(vec!["x", "y", "u"]).prop_map(Expr::var),
        Just(Expr::imaginary_unit()),
    ]
}

fn arb_expr() -> impl Strategy<Value = Expr> {
    arb_atom().prop_recursive(3, 24, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 2..4).prop_map(add),
            prop::collection::vec(inner.clone(), 2..4).prop_map(mul),
            (inner, 0i64..=3).prop_map(|(b, k)| pow(b, Expr::int(k))),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn sum_is_order_independent(a in arb_expr(), b in arb_expr(), c in arb_expr()) {
        prop_assert_eq!(
            add([a.clone(), b.clone(), c.clone()]),
            add([c, add([b, a])])
        );
    }

    #[test]
    fn product_is_order_independent(a in arb_expr(), b in arb_expr()) {
        prop_assert_eq!(mul([a.clone(), b.clone()]), mul([b, a]));
    }

    #[test]
    fn self_difference_cancels(a in arb_expr()) {
        prop_assert!(sub(a.clone(), a.clone()).is_zero());
        prop_assert_eq!(neg(neg(a.clone())), a);
    }

    #[test]
    fn rebuilding_is_stable(a in arb_expr()) {
        let rebuilt = tb_ast::rewrite(&a, &mut |_| None);
        prop_assert_eq!(rebuilt, a);
    }

    #[test]
    fn nonzero_numbers_divide_out(a in arb_expr(), k in 1i64..=7) {
        prop_assert_eq!(div(mul([Expr::int(k), a.clone()]), Expr::int(k)), a);
    }
}
