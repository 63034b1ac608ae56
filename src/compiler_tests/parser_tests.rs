use crate::compiler::parsers::ast_nodes::AstNode;
use crate::compiler::parsers::sexpr::parse;
use crate::compiler::parsers::tokenizer::{tokenize, TokenKind};

#[test]
fn tokenizes_numbers_symbols_and_strings() {
    let tokens = tokenize("[var x -5] (set y 3.25) \"hi\"").unwrap();

    assert!(tokens.contains(&TokenKind::Symbol("var".to_string())));
    assert!(tokens.contains(&TokenKind::Number(-5)));
    assert!(tokens.contains(&TokenKind::Fractional(3.25)));
    assert!(tokens.contains(&TokenKind::StringLiteral("hi".to_string())));
    assert_eq!(tokens.last(), Some(&TokenKind::Eof));
}

#[test]
fn lone_minus_is_a_symbol() {
    let tokens = tokenize("(- a 1)").unwrap();
    assert!(tokens.contains(&TokenKind::Symbol("-".to_string())));
}

#[test]
fn type_tags_tokenize_as_one_symbol() {
    let tokens = tokenize("!array<!int,3>").unwrap();
    assert!(tokens.contains(&TokenKind::Symbol("!array<!int,3>".to_string())));
}

#[test]
fn parses_nested_lists() {
    let ast = parse("[var x (+ 100 1)]").unwrap();

    let AstNode::List(items) = ast else {
        panic!("expected a list");
    };

    assert!(items[0].is_symbol("var"));
    assert!(items[1].is_symbol("x"));

    let AstNode::List(inner) = &items[2] else {
        panic!("expected a nested list");
    };
    assert!(inner[0].is_symbol("+"));
    assert_eq!(inner[1], AstNode::Number(100));
}

#[test]
fn bracket_shapes_are_interchangeable() {
    let square = parse("[fprint \"x\"]").unwrap();
    let round = parse("(fprint \"x\")").unwrap();
    assert_eq!(square, round);
}

#[test]
fn mismatched_brackets_are_rejected() {
    let result = parse("[fprint \"x\")");
    assert!(result.is_err());
    assert!(result.unwrap_err().msg.contains("Mismatched"));
}

#[test]
fn unclosed_list_is_rejected() {
    assert!(parse("[var x 1").is_err());
}

#[test]
fn unterminated_string_is_rejected() {
    assert!(parse("[fprint \"oops]").is_err());
}

#[test]
fn trailing_garbage_is_rejected() {
    assert!(parse("[var x 1] junk").is_err());
}

#[test]
fn rendering_round_trips_structure() {
    let source = "[var x (+ 100 1)]";
    let ast = parse(source).unwrap();
    let rendered = ast.to_string();

    // Re-parsing the rendering yields an equivalent tree
    assert_eq!(parse(&rendered).unwrap(), ast);
}

#[test]
fn long_forms_are_truncated_for_tracebacks() {
    let long_symbol = "x".repeat(300);
    let ast = parse(&format!("[var {long_symbol} 1]")).unwrap();

    let rendered = ast.render_truncated();
    assert!(rendered.len() <= 120);
    assert!(rendered.ends_with("..."));
}
