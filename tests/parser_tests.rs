// tests/parser_tests.rs

use qualex::alias::AliasConflictError;
use qualex::ast::{BinOp, Expr, ExprKind, LikeOp, PathKind, UnOp};
use qualex::lexer::Lexer;
use qualex::parser::{ParseError, ParseOptions, Parser, parse, parse_with};
use qualex::value::Value;

fn path_string(expr: &Expr) -> String {
    match expr {
        Expr::Path(path) => path.path_string(),
        other => panic!("expected a path, got {:?}", other),
    }
}

// ============================================================================
// Simple tests
// ============================================================================

#[test]
fn test_comparison() {
    let mut parser = Parser::new(Lexer::new("estimatedPrice > 100")).unwrap();
    let expr = parser.parse().unwrap();

    match expr {
        Expr::BinaryOp {
            op: BinOp::GreaterThan,
            left,
            right,
        } => {
            assert_eq!(path_string(&left), "estimatedPrice");
            assert_eq!(*right, Expr::Scalar(Value::Integer(100)));
        }
        other => panic!("expected a comparison, got {:?}", other),
    }
}

#[test]
fn test_parentheses() {
    let expr = parse("(1 + 2) * 3 = 9").unwrap();

    // Should be: Equal(Multiply(Add(1, 2), 3), 9)
    let Expr::BinaryOp { op: BinOp::Equal, left, .. } = expr else {
        panic!("expected equality");
    };
    match *left {
        Expr::BinaryOp {
            op: BinOp::Multiply,
            left,
            right,
        } => {
            assert_eq!(left.kind(), ExprKind::Add);
            assert_eq!(*right, Expr::Scalar(Value::Integer(3)));
        }
        other => panic!("expected multiplication, got {:?}", other),
    }
}

#[test]
fn test_arithmetic() {
    let expr = parse("1 + 2 * 3").unwrap();

    // Should be: Add(1, Multiply(2, 3))
    match expr {
        Expr::BinaryOp {
            op: BinOp::Add,
            left,
            right,
        } => {
            assert_eq!(*left, Expr::Scalar(Value::Integer(1)));
            assert_eq!(right.kind(), ExprKind::Multiply);
        }
        other => panic!("expected addition, got {:?}", other),
    }
}

#[test]
fn test_negative_literal_is_folded() {
    assert_eq!(parse("-5").unwrap(), Expr::Scalar(Value::Integer(-5)));
    assert_eq!(parse("-a").unwrap().kind(), ExprKind::Negative);
    assert_eq!(parse("~a").unwrap().kind(), ExprKind::BitwiseNot);
}

// ============================================================================
// Conditions
// ============================================================================

#[test]
fn test_and_or_are_flat() {
    let expr = parse("a = 1 and b = 2 and c = 3 or d = 4").unwrap();

    let Expr::Or(children) = expr else {
        panic!("expected or");
    };
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].kind(), ExprKind::And);
    assert_eq!(children[0].operand_count(), 3);
    assert_eq!(children[1].kind(), ExprKind::EqualTo);
}

#[test]
fn test_not_binds_tighter_than_and() {
    let expr = parse("not a = 1 and b = 2").unwrap();

    let Expr::And(children) = expr else {
        panic!("expected and");
    };
    assert_eq!(children[0].kind(), ExprKind::Not);
    assert_eq!(children[1].kind(), ExprKind::EqualTo);
}

#[test]
fn test_bitwise_binds_tighter_than_relational() {
    let expr = parse("a & 4 = 4").unwrap();
    let Expr::BinaryOp { op, left, .. } = expr else {
        panic!("expected a comparison");
    };
    assert_eq!(op, BinOp::Equal);
    assert_eq!(left.kind(), ExprKind::BitwiseAnd);

    // Shift sits between additive and bitwise and
    let expr = parse("1 << 1 & 2").unwrap();
    let Expr::BinaryOp { op, left, .. } = expr else {
        panic!("expected a binary operator");
    };
    assert_eq!(op, BinOp::BitAnd);
    assert_eq!(left.kind(), ExprKind::BitwiseLeftShift);
}

#[test]
fn test_in_list() {
    let expr = parse("artistName in ('Picasso', 'Dali')").unwrap();
    match expr {
        Expr::BinaryOp {
            op: BinOp::In,
            right,
            ..
        } => assert_eq!(
            *right,
            Expr::List(vec![
                Expr::Scalar(Value::from("Picasso")),
                Expr::Scalar(Value::from("Dali")),
            ])
        ),
        other => panic!("expected in, got {:?}", other),
    }

    assert_eq!(parse("artistName not in ($names)").unwrap().kind(), ExprKind::NotIn);
    assert_eq!(parse("artistName in $names").unwrap().kind(), ExprKind::In);
}

#[test]
fn test_empty_in_list_folds() {
    assert_eq!(parse("artistName in ()").unwrap(), Expr::False);
}

#[test]
fn test_empty_not_in_list_folds() {
    assert_eq!(parse("artistName not in ()").unwrap(), Expr::True);
}

#[test]
fn test_like_with_escape() {
    let expr = parse(r"paintingTitle not like 'a!%%' escape '!'").unwrap();
    match expr {
        Expr::Like {
            op,
            pattern,
            escape,
            ..
        } => {
            assert_eq!(op, LikeOp::NotLike);
            assert_eq!(*pattern, Expr::Scalar(Value::from("a!%%")));
            assert_eq!(escape, Some('!'));
        }
        other => panic!("expected like, got {:?}", other),
    }
    assert_eq!(
        parse("a likeIgnoreCase 'x%'").unwrap().kind(),
        ExprKind::LikeIgnoreCase
    );
    assert_eq!(
        parse("a not likeIgnoreCase 'x%'").unwrap().kind(),
        ExprKind::NotLikeIgnoreCase
    );
}

#[test]
fn test_between() {
    let expr = parse("estimatedPrice not between 1 + 1 and 10 and b = 2").unwrap();
    let Expr::And(children) = expr else {
        panic!("expected and");
    };
    assert_eq!(children.len(), 2);
    match &children[0] {
        Expr::Between {
            negated,
            lower,
            upper,
            ..
        } => {
            assert!(*negated);
            assert_eq!(lower.kind(), ExprKind::Add);
            assert_eq!(**upper, Expr::Scalar(Value::Integer(10)));
        }
        other => panic!("expected between, got {:?}", other),
    }
}

#[test]
fn test_boolean_literals_in_condition_position() {
    assert_eq!(parse("true").unwrap(), Expr::True);
    assert_eq!(parse("a = 1 or false").unwrap(), Expr::Or(vec![parse("a = 1").unwrap(), Expr::False]));
    // Operands keep the scalar form
    let Expr::BinaryOp { right, .. } = parse("flag = true").unwrap() else {
        panic!("expected a comparison");
    };
    assert_eq!(*right, Expr::Scalar(Value::Boolean(true)));
}

#[test]
fn test_functions() {
    let expr = parse("substring(artistName, 1, 3) = 'Pic'").unwrap();
    let Expr::BinaryOp { left, .. } = expr else {
        panic!("expected a comparison");
    };
    match *left {
        Expr::Function { name, args } => {
            assert_eq!(name, "substring");
            assert_eq!(args.len(), 3);
        }
        other => panic!("expected a function call, got {:?}", other),
    }
}

#[test]
fn test_parameters_and_enums() {
    let expr = parse("a = $x and b = enum:org.example.Color.RED").unwrap();
    assert_eq!(expr.param_names(), vec!["x"]);
    let Expr::And(children) = expr else {
        panic!("expected and");
    };
    assert_eq!(children[1].operands()[1].kind(), ExprKind::Enum);
}

// ============================================================================
// Paths and aliases
// ============================================================================

#[test]
fn test_path_kinds() {
    for (text, kind) in [
        ("artistName = 1", PathKind::Object),
        ("db:ARTIST_NAME = 1", PathKind::Db),
        ("dbid:ARTIST_ID = 1", PathKind::DbId),
    ] {
        let Expr::BinaryOp { left, .. } = parse(text).unwrap() else {
            panic!("expected a comparison");
        };
        let Expr::Path(path) = *left else {
            panic!("expected a path");
        };
        assert_eq!(path.kind(), kind, "{}", text);
    }
}

#[test]
fn test_alias_is_shared_across_paths() {
    let expr = parse("paintingArray#p.estimatedPrice > 10 and p.paintingTitle = 'x'").unwrap();
    let Expr::And(children) = expr else {
        panic!("expected and");
    };
    let operands = children[1].operands();
    let Expr::Path(second) = operands[0] else {
        panic!("expected a path");
    };
    let first_segment = &second.segments()[0];
    assert_eq!(first_segment.name, "paintingArray");
    assert_eq!(first_segment.alias.as_deref(), Some("p"));
    assert_eq!(second.path_string(), "p.paintingTitle");
}

#[test]
fn test_conflicting_alias() {
    let err = parse("paintingArray#p.x = 1 and toGallery#p.y = 2").unwrap_err();
    assert!(matches!(
        err,
        ParseError::Alias(AliasConflictError::Rebound { ref alias, .. }) if alias == "p"
    ));
}

#[test]
fn test_outer_marker_on_segment() {
    let Expr::BinaryOp { left, .. } = parse("toGallery+.galleryName = null").unwrap() else {
        panic!("expected a comparison");
    };
    let Expr::Path(path) = *left else {
        panic!("expected a path");
    };
    assert!(path.segments()[0].outer);
    assert!(!path.segments()[1].outer);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_error_reports_remainder() {
    let err = parse("artistName = 'x' and or b = 1").unwrap_err();
    assert_eq!(err.remainder(), Some("or b = 1"));
    assert!(matches!(err, ParseError::Syntax { .. }));
}

#[test]
fn test_trailing_input_is_rejected() {
    let err = parse("a = 1 b = 2").unwrap_err();
    assert_eq!(err.remainder(), Some("b = 2"));
}

#[test]
fn test_not_requires_operator() {
    assert!(parse("a not = 1").is_err());
}

#[test]
fn test_unclosed_parenthesis() {
    let err = parse("(a = 1").unwrap_err();
    assert_eq!(err.remainder(), Some(""));
}

#[test]
fn test_error_position_spans_lines() {
    let err = parse("a = 1 and\n  b = 2 and\n  or c = 3").unwrap_err();
    let position = err.position().unwrap();
    assert_eq!((position.line, position.column), (3, 3));
    assert_eq!(err.remainder(), Some("or c = 3"));
}

#[test]
fn test_long_in_list() {
    let items: Vec<String> = (0..40_000).map(|i| i.to_string()).collect();
    let text = format!("a in ({})", items.join(", "));
    let Expr::BinaryOp { right, .. } = parse(&text).unwrap() else {
        panic!("expected in");
    };
    assert_eq!(right.operand_count(), 40_000);
}

#[test]
fn test_lex_error_is_wrapped() {
    let err = parse("a = 'open").unwrap_err();
    assert!(matches!(err, ParseError::Lex { .. }));
    assert_eq!(err.remainder(), Some("'open"));
}

#[test]
fn test_enum_without_type_is_rejected() {
    let err = parse("a = enum:RED").unwrap_err();
    assert!(matches!(err, ParseError::Lex { .. }));
    assert_eq!(err.remainder(), Some("RED"));

    let expr = parse("a = enum:Color.RED").unwrap();
    assert_eq!(parse(&expr.to_string()).unwrap(), expr);
}

#[test]
fn test_trailing_comma_is_rejected() {
    for text in ["a in (1, 2,)", "upper(a,) = 'A'", "a in (,)"] {
        assert!(matches!(parse(text), Err(ParseError::Syntax { .. })), "{}", text);
    }
    assert_eq!(parse("a in (1, 2,)").unwrap_err().remainder(), Some(")"));
}

#[test]
fn test_escape_must_be_single_character() {
    assert!(parse("a like 'x' escape '!!'").is_err());
}

#[test]
fn test_recursion_limit() {
    let text = format!("{}a = 1", "not ".repeat(20));
    assert!(matches!(
        parse_with(&text, ParseOptions { max_depth: 8 }),
        Err(ParseError::RecursionLimit { max_depth: 8, .. })
    ));
    assert_eq!(parse(&text).unwrap().kind(), ExprKind::Not);
}

#[test]
fn test_deep_parentheses_on_small_stack() {
    let nested = |levels: usize| format!("{}1{} = 1", "(".repeat(levels), ")".repeat(levels));
    let (deep, shallow) = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(move || (parse(&nested(250)), parse(&nested(60))))
        .unwrap()
        .join()
        .unwrap();

    assert!(matches!(deep, Err(ParseError::RecursionLimit { max_depth: 64, .. })));
    assert_eq!(shallow.unwrap().kind(), ExprKind::EqualTo);
}

#[test]
fn test_unary_on_not_keyword() {
    let expr = parse("!(a = 1)").unwrap();
    match expr {
        Expr::UnaryOp { op: UnOp::Not, operand } => assert_eq!(operand.kind(), ExprKind::EqualTo),
        other => panic!("expected not, got {:?}", other),
    }
}
