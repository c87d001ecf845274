// Integration tests for panic-mode error recovery

use cfront::analyze;
use cfront::ast::AstNode;

fn declared_names(items: &[AstNode]) -> Vec<&str> {
    items
        .iter()
        .filter_map(|item| match item {
            AstNode::VariableDecl { name, .. } => Some(name.as_str()),
            AstNode::FunctionDecl { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_missing_semicolon_still_parses_next_declaration() {
    let result = analyze("int x = 5\nint y;");
    assert!(!result.syntax_diagnostics.is_empty());
    let program = result.ast.expect("recovery should salvage an AST");
    assert!(declared_names(&program.items).contains(&"y"));
}

#[test]
fn test_garbage_between_declarations() {
    let result = analyze("int a;\n) ) )\nint b;");
    assert!(!result.syntax_diagnostics.is_empty());
    let program = result.ast.unwrap();
    let names = declared_names(&program.items);
    assert!(names.contains(&"a"));
    assert!(names.contains(&"b"));
}

#[test]
fn test_broken_statement_inside_function_body() {
    let source = r#"
        int main() {
            int a = 1;
            b @@ c;
            int d = 2;
            return d;
        }
    "#;
    let result = analyze(source);
    assert!(!result.syntax_diagnostics.is_empty() || !result.lexical_diagnostics.is_empty());
    let program = result.ast.unwrap();
    let AstNode::FunctionDecl { body: Some(body), .. } = &program.items[0] else {
        panic!("expected a function");
    };
    let names = declared_names(body);
    assert!(names.contains(&"a"));
    assert!(names.contains(&"d"));
}

#[test]
fn test_unclosed_brace_at_end_of_input() {
    let result = analyze("int main() { int a = 1;");
    assert!(!result.syntax_diagnostics.is_empty());
    // The partial function body still made it into the AST.
    let program = result.ast.unwrap();
    assert!(declared_names(&program.items).contains(&"main"));
}

#[test]
fn test_repeated_failures_terminate() {
    // Nothing here is parseable; the driver must still reach end of input
    // instead of spinning on the same token.
    let result = analyze("= = = ; ) } ( {");
    assert!(!result.syntax_diagnostics.is_empty());
}

#[test]
fn test_error_tokens_surface_as_syntax_diagnostics() {
    let result = analyze("int x = $;");
    assert!(!result.lexical_diagnostics.is_empty());
    assert!(!result.syntax_diagnostics.is_empty());
}

#[test]
fn test_recovery_does_not_fabricate_semantic_errors() {
    // x's declaration is broken, so a later use of x may legitimately be
    // undeclared, but y's path must stay clean.
    let result = analyze("int x = 5\nint y;\ny = 2;");
    assert!(!result.syntax_diagnostics.is_empty());
    assert!(result
        .semantic_diagnostics
        .iter()
        .all(|d| !d.message.contains("'y'")));
}
