use tether_script_core::{
    parse_statement, CompiledFunction, EmptyScope, Interpreter, RewriteBinding, RewriteSignalHandler,
    ScriptCompiler,
};
use tether_api_core::Value;

fn rewrite(src: &str) -> String {
    RewriteBinding::new("binding").rewrite(src, 0).expect("rewrite")
}

#[test]
fn bare_expression_gets_return_and_wrapper() {
    assert_eq!(rewrite("x + 1"), "(function binding() { return x + 1 })");
    assert_eq!(rewrite("x + 1;"), "(function binding() { return x + 1; })");
}

#[test]
fn wrapper_hugs_the_statement_not_the_surrounding_whitespace() {
    assert_eq!(rewrite("  x + 1  "), "  (function binding() { return x + 1 })  ");
    let handler = RewriteSignalHandler::new("onTap", Vec::<String>::new());
    assert_eq!(handler.rewrite("\n  go()\n", 0).unwrap(), "\n  (function onTap() { go() })\n");
}

#[test]
fn deeply_nested_source_is_rejected_without_crashing() {
    let deep = format!("{}1{}", "(".repeat(20_000), ")".repeat(20_000));
    let err = RewriteBinding::new("b").rewrite(&deep, 0).unwrap_err();
    assert!(err.message.starts_with("not parseable"), "{err}");
    assert!(err.message.ends_with("nesting too deep"), "{err}");

    let negations = format!("{}x", "!".repeat(20_000));
    assert!(RewriteBinding::new("b").rewrite(&negations, 0).is_err());

    let shallow = format!("{}1{}", "(".repeat(40), ")".repeat(40));
    assert_eq!(rewrite(&shallow), format!("(function binding() {{ return {shallow} }})"));
}

#[test]
fn base_offset_does_not_change_output() {
    let at_zero = RewriteBinding::new("b").rewrite("width / 2", 0).unwrap();
    let at_base = RewriteBinding::new("b").rewrite("width / 2", 312).unwrap();
    assert_eq!(at_zero, at_base);
}

#[test]
fn block_rewrites_only_last_statement() {
    assert_eq!(
        rewrite("{ var a = 1; a + 2 }"),
        "(function binding() { { var a = 1; return a + 2 } })"
    );
}

#[test]
fn if_rewrites_both_branches() {
    assert_eq!(
        rewrite("if (c) a; else b"),
        "(function binding() { if (c) return a; else return b })"
    );
}

#[test]
fn loop_bodies_never_get_implicit_return() {
    assert_eq!(
        rewrite("for (var i = 0; i < 3; i++) x"),
        "(function binding() { for (var i = 0; i < 3; i++) x })"
    );
    assert_eq!(
        rewrite("while (a) { b }"),
        "(function binding() { while (a) { b } })"
    );
}

#[test]
fn switch_returns_before_break_and_in_final_clause() {
    assert_eq!(
        rewrite("switch (k) { case 1: a; break; case 2: b; c; default: d }"),
        "(function binding() { switch (k) { case 1: return a; break; case 2: b; c; default: return d } })"
    );
}

#[test]
fn raw_newline_in_string_is_escaped() {
    let out = rewrite("'first\nsecond' + x");
    assert_eq!(out, "(function binding() { return 'first\\nsecond' + x })");
    assert!(!out.contains('\n'));
    parse_statement(&out).expect("rewritten text parses as plain script");
}

#[test]
fn carriage_return_is_escaped_only_with_a_newline() {
    assert_eq!(
        rewrite("'a\r\nb'"),
        "(function binding() { return 'a\\r\\nb' })"
    );
    assert_eq!(rewrite("'a\rb'"), "(function binding() { return 'a\rb' })");
}

#[test]
fn unparseable_source_is_reported() {
    let err = RewriteBinding::new("b").rewrite("x +", 7).unwrap_err();
    assert!(err.message.starts_with("not parseable"), "{err}");
    assert_eq!(err.offset, 10);
}

#[test]
fn signal_handler_keeps_statements_and_takes_params() {
    let handler = RewriteSignalHandler::new("onClicked", ["mouse"]);
    assert_eq!(
        handler.rewrite("count = count + 1", 0).unwrap(),
        "(function onClicked(mouse) { count = count + 1 })"
    );
    assert_eq!(
        handler.rewrite("a(); b = 'x\ny'", 0).unwrap(),
        "(function onClicked(mouse) { a(); b = 'x\\ny' })"
    );
}

#[test]
fn rewritten_multiline_string_evaluates_to_original_text() {
    let src = rewrite("'line one\nline two'");
    let f = Interpreter::new().compile(&src).unwrap();
    let v = f.invoke(&Value::Undefined, &[], &mut EmptyScope).unwrap();
    assert_eq!(v, Value::from("line one\nline two"));
}
