// Integration tests driving the full analyze() pipeline

use pretty_assertions::assert_eq;

use cfront::analyze;
use cfront::ast::{AssignOp, AstNode, BinaryOp, CaseClause, LiteralKind};
use cfront::diagnostics::Phase;

#[test]
fn test_valid_program_is_clean() {
    let source = r#"
        int add(int a, int b) {
            return a + b;
        }

        int main() {
            int result = add(3, 4);
            return result;
        }
    "#;

    let result = analyze(source);
    assert!(result.is_clean(), "unexpected: {:?}", result.diagnostics().collect::<Vec<_>>());
    assert!(result.ast.is_some());
}

#[test]
fn test_line_numbers_track_newlines() {
    let source = "int a;\nint b;\n\nint c;";
    let result = analyze(source);
    let lines: Vec<usize> = result
        .ast
        .unwrap()
        .items
        .iter()
        .map(|item| item.line())
        .collect();
    assert_eq!(lines, vec![1, 2, 4]);
}

#[test]
fn test_operator_precedence_tree_shape() {
    let result = analyze("int main() { int x; x = 1 + 2 * 3; return 0; }");
    assert!(result.is_clean());
    let program = result.ast.unwrap();
    let AstNode::FunctionDecl { body: Some(body), .. } = &program.items[0] else {
        panic!("expected a function");
    };
    let AstNode::ExpressionStmt { expression, .. } = &body[1] else {
        panic!("expected an expression statement");
    };
    let AstNode::Assignment { value, .. } = expression.as_ref() else {
        panic!("expected an assignment");
    };
    // 1 + (2 * 3), not (1 + 2) * 3
    let AstNode::Binary { op: BinaryOp::Add, left, right, .. } = value.as_ref() else {
        panic!("expected + at the root, got {:?}", value);
    };
    assert!(matches!(
        left.as_ref(),
        AstNode::Literal { value, kind: LiteralKind::Number, .. } if value == "1"
    ));
    assert!(matches!(
        right.as_ref(),
        AstNode::Binary { op: BinaryOp::Mul, .. }
    ));
}

#[test]
fn test_assignment_right_associativity() {
    let result = analyze("int main() { int a; int b; a = b = 3; return 0; }");
    assert!(result.is_clean());
    let program = result.ast.unwrap();
    let AstNode::FunctionDecl { body: Some(body), .. } = &program.items[0] else {
        panic!("expected a function");
    };
    let AstNode::ExpressionStmt { expression, .. } = &body[2] else {
        panic!("expected an expression statement");
    };
    // a = (b = 3)
    let AstNode::Assignment { target, op: AssignOp::Assign, value, .. } = expression.as_ref()
    else {
        panic!("expected an assignment");
    };
    assert!(matches!(
        target.as_ref(),
        AstNode::Identifier { name, .. } if name == "a"
    ));
    assert!(matches!(value.as_ref(), AstNode::Assignment { .. }));
}

#[test]
fn test_redeclaration_reports_the_second_line() {
    let result = analyze("int x;\nint x;");
    assert_eq!(result.semantic_diagnostics.len(), 1);
    assert_eq!(result.semantic_diagnostics[0].line, 2);
    assert_eq!(result.semantic_diagnostics[0].phase, Phase::Semantic);
}

#[test]
fn test_shadowing_is_legal() {
    let result = analyze("int x; { int x; }");
    assert!(result.semantic_diagnostics.is_empty());
}

#[test]
fn test_switch_fallthrough_is_structural() {
    let source = "int main() { int x; int a; x = 1; switch(x){case 1: a=1; case 2: a=2; break; default: a=0;} return 0; }";
    let result = analyze(source);
    assert!(result.is_clean(), "unexpected: {:?}", result.diagnostics().collect::<Vec<_>>());
    let program = result.ast.unwrap();
    let AstNode::FunctionDecl { body: Some(body), .. } = &program.items[0] else {
        panic!("expected a function");
    };
    let Some(AstNode::Switch { clauses, .. }) =
        body.iter().find(|s| matches!(s, AstNode::Switch { .. }))
    else {
        panic!("expected a switch statement");
    };
    assert_eq!(clauses.len(), 3);
    // case 1 holds only the one assignment before the next label: no
    // implicit break is inserted.
    let CaseClause::Case { statements, .. } = &clauses[0] else {
        panic!("expected a case clause");
    };
    assert_eq!(statements.len(), 1);
    let CaseClause::Case { statements, .. } = &clauses[1] else {
        panic!("expected a case clause");
    };
    assert_eq!(statements.len(), 2);
    assert!(matches!(statements[1], AstNode::Break { .. }));
    let CaseClause::Default { statements, .. } = &clauses[2] else {
        panic!("expected a default clause");
    };
    assert_eq!(statements.len(), 1);
}

#[test]
fn test_division_by_literal_zero_is_flagged() {
    let result = analyze("int r = 10 / 0;");
    assert_eq!(result.semantic_diagnostics.len(), 1);
    assert_eq!(result.semantic_diagnostics[0].message, "division by zero");
}

#[test]
fn test_division_by_variable_is_not_flagged() {
    let result = analyze("int x; int r = 10 / x;");
    assert!(result.semantic_diagnostics.is_empty());
}

#[test]
fn test_analysis_is_idempotent() {
    let source = r#"
        int main() {
            int x = 5
            int y;
            int r = 10 / 0;
            unknown();
            return 0;
        }
    "#;
    let first = analyze(source);
    let second = analyze(source);
    assert_eq!(first, second);
}

#[test]
fn test_lexical_errors_do_not_stop_the_pipeline() {
    let result = analyze("int x = 1 @ 2;\nint y;");
    assert!(!result.lexical_diagnostics.is_empty());
    assert_eq!(result.lexical_diagnostics[0].phase, Phase::Lexical);
    // y still parses after recovery
    let program = result.ast.unwrap();
    assert!(program
        .items
        .iter()
        .any(|item| matches!(item, AstNode::VariableDecl { name, .. } if name == "y")));
}

#[test]
fn test_struct_and_pointer_program() {
    let source = r#"
        struct Point {
            int x;
            int y;
        };

        int main() {
            struct Point p;
            struct Point *ptr;
            ptr = &p;
            ptr->x = 3;
            p.y = 4;
            return p.y;
        }
    "#;
    let result = analyze(source);
    assert!(result.is_clean(), "unexpected: {:?}", result.diagnostics().collect::<Vec<_>>());
}

#[test]
fn test_stdlib_calls_are_known() {
    let source = r#"
        int main() {
            char name[20] = "world";
            printf("hello %s\n", name);
            return 0;
        }
    "#;
    let result = analyze(source);
    assert!(result.is_clean(), "unexpected: {:?}", result.diagnostics().collect::<Vec<_>>());
}

#[test]
fn test_preprocessor_directives_tokenized_not_parsed() {
    let source = "#include <stdio.h>\n#define LIMIT 10\nint x;";
    let result = analyze(source);
    assert!(result.is_clean());
    assert_eq!(
        result
            .tokens
            .iter()
            .filter(|t| t.kind == cfront::lexer::TokenKind::PreprocessorDirective)
            .count(),
        2
    );
    assert_eq!(result.ast.unwrap().items.len(), 1);
}

#[test]
fn test_loops_and_control_flow() {
    let source = r#"
        int main() {
            int total = 0;
            for (int i = 0; i < 10; i++) {
                if (i % 2 == 0) {
                    continue;
                }
                total += i;
            }
            while (total > 100) {
                total = total - 1;
            }
            do {
                total++;
            } while (total < 5);
            return total;
        }
    "#;
    let result = analyze(source);
    assert!(result.is_clean(), "unexpected: {:?}", result.diagnostics().collect::<Vec<_>>());
}

#[test]
fn test_json_serialization_round_trip_shape() {
    let result = analyze("int x = 1;");
    let json = serde_json::to_value(&result).unwrap();
    assert!(json.get("tokens").is_some());
    assert!(json.get("ast").is_some());
    assert!(json.get("lexical_diagnostics").is_some());
    assert!(json.get("syntax_diagnostics").is_some());
    assert!(json.get("semantic_diagnostics").is_some());
}
