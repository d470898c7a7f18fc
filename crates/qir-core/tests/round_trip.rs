//! §8 Round-trips: serializing QIR to the wire schema and parsing it back
//! yields a structurally equal expression.

use pretty_assertions::assert_eq;
use qir_core::{Expr, OperatorType, Scalar};

fn round_trip(expr: &Expr) -> Expr {
    let json = serde_json::to_string(expr).expect("serialize");
    serde_json::from_str(&json).expect("deserialize")
}

#[test]
fn scalar_literal_round_trips() {
    let expr = Expr::Value(Scalar::Number(42));
    assert_eq!(round_trip(&expr), expr);
}

#[test]
fn lambda_round_trips() {
    let expr = Expr::Lambda {
        param: "x".to_owned(),
        body: Box::new(Expr::Application(
            Box::new(Expr::Application(
                Box::new(Expr::Builtin {
                    module: "operator".to_owned(),
                    symbol: "mul".to_owned(),
                }),
                Box::new(Expr::Identifier("x".to_owned())),
            )),
            Box::new(Expr::Value(Scalar::Number(2))),
        )),
    };
    assert_eq!(round_trip(&expr), expr);
}

#[test]
fn operator_tree_round_trips() {
    let predicate = Expr::Lambda {
        param: "e".to_owned(),
        body: Box::new(Expr::Application(
            Box::new(Expr::Application(
                Box::new(Expr::Builtin {
                    module: "operator".to_owned(),
                    symbol: "lt".to_owned(),
                }),
                Box::new(Expr::Reference {
                    source: "e".to_owned(),
                    field: "salary".to_owned(),
                }),
            )),
            Box::new(Expr::Value(Scalar::Number(1000))),
        )),
    };
    let select = Expr::select(Expr::scan("employees"), predicate).unwrap();
    assert_eq!(round_trip(&select), select);
}

#[test]
fn empty_list_and_tuple_round_trip() {
    let expr = Expr::tuple_cons(
        Expr::Value(Scalar::Str("name".to_owned())),
        Expr::Reference {
            source: "e".to_owned(),
            field: "name".to_owned(),
        },
        Expr::nil_tuple(),
    );
    assert_eq!(round_trip(&expr), expr);
    assert_eq!(round_trip(&Expr::nil_list()), Expr::nil_list());
}

#[test]
fn string_with_quote_round_trips() {
    let expr = Expr::Value(Scalar::Str("she said \"hi\"".to_owned()));
    assert_eq!(round_trip(&expr), expr);
}

#[test]
fn join_operator_round_trips() {
    let predicate = Expr::Lambda {
        param: "l".to_owned(),
        body: Box::new(Expr::Lambda {
            param: "r".to_owned(),
            body: Box::new(Expr::Value(Scalar::Bool(true))),
        }),
    };
    let join = Expr::operator(
        OperatorType::Join,
        vec![Expr::scan("a"), Expr::scan("b"), predicate],
    )
    .unwrap();
    assert_eq!(round_trip(&join), join);
}
