//! Scoped semantic analysis over the AST.
//!
//! A single depth-first walk checks declarations and uses against a stack of
//! scope frames. Every failed check appends a diagnostic and the walk keeps
//! going, so one pass yields the full diagnostic set for a program.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ast::{AstNode, BaseType, BinaryOp, CaseClause, LiteralKind, Program, TypeSpec, UnaryOp};
use crate::diagnostics::{Diagnostic, SemanticError};
use crate::lexer::STANDARD_LIBRARY;

/// Coarse type families used by the compatibility matrix. Finer distinctions
/// (signedness, widths, struct layout) are deliberately out of scope.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TypeFamily {
    Integer,
    Floating,
    Bool,
    Char,
    CharArray,
    Struct(String),
    Pointer,
    Void,
    /// Couldn't infer (call results, member reads). Compatible with anything
    /// so one unknown never cascades into spurious mismatches.
    Unknown,
}

impl TypeFamily {
    fn name(&self) -> String {
        match self {
            TypeFamily::Integer => "an integer".to_string(),
            TypeFamily::Floating => "a floating-point".to_string(),
            TypeFamily::Bool => "a boolean".to_string(),
            TypeFamily::Char => "a character".to_string(),
            TypeFamily::CharArray => "a string".to_string(),
            TypeFamily::Struct(name) => format!("a 'struct {}'", name),
            TypeFamily::Pointer => "a pointer".to_string(),
            TypeFamily::Void => "a void".to_string(),
            TypeFamily::Unknown => "an unknown".to_string(),
        }
    }

    /// Whether a value of family `found` may initialize or be assigned to a
    /// slot of family `self`. Deliberately permissive in the directions C
    /// converts implicitly.
    fn accepts(&self, found: &TypeFamily) -> bool {
        use TypeFamily::*;
        if matches!(self, Unknown) || matches!(found, Unknown) {
            return true;
        }
        match self {
            Integer => matches!(found, Integer | Bool | Char),
            Floating => matches!(found, Floating | Integer | Bool | Char),
            Bool => matches!(found, Bool | Integer | Char),
            Char => matches!(found, Char | Integer),
            CharArray => matches!(found, CharArray),
            Struct(name) => matches!(found, Struct(other) if other == name),
            Pointer => matches!(found, Pointer | CharArray | Integer),
            Void => false,
            Unknown => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SymbolKind {
    Variable,
    Function { has_body: bool },
}

#[derive(Debug, Clone)]
struct Symbol {
    family: TypeFamily,
    array_dims: Vec<Option<usize>>,
    kind: SymbolKind,
}

impl Symbol {
    fn variable(family: TypeFamily, array_dims: Vec<Option<usize>>) -> Self {
        Symbol {
            family,
            array_dims,
            kind: SymbolKind::Variable,
        }
    }

    /// The family an expression naming this symbol has. A char array reads
    /// as a string; other arrays keep their element family since indexing
    /// is where they are actually consumed.
    fn use_family(&self) -> TypeFamily {
        if !self.array_dims.is_empty() && self.family == TypeFamily::Char {
            TypeFamily::CharArray
        } else if !self.array_dims.is_empty() {
            TypeFamily::Pointer
        } else {
            self.family.clone()
        }
    }
}

/// Walk a parsed program and return every semantic diagnostic found.
pub fn check(program: &Program) -> Vec<Diagnostic> {
    let mut analyzer = Analyzer::new();
    analyzer.run(program);
    analyzer.diagnostics
}

struct Analyzer {
    /// Innermost frame last; lookups search back to front.
    scopes: Vec<FxHashMap<String, Symbol>>,
    /// Struct tags are tracked globally, not per scope.
    structs: FxHashSet<String>,
    diagnostics: Vec<Diagnostic>,
}

impl Analyzer {
    fn new() -> Self {
        Analyzer {
            scopes: vec![FxHashMap::default()],
            structs: FxHashSet::default(),
            diagnostics: Vec::new(),
        }
    }

    fn run(&mut self, program: &Program) {
        for item in &program.items {
            self.visit_statement(item);
        }
    }

    // ------------------------------------------------------------------
    // Scope plumbing
    // ------------------------------------------------------------------

    fn enter_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    fn leave_scope(&mut self) {
        self.scopes.pop();
    }

    fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|frame| frame.get(name))
    }

    fn declare(&mut self, name: &str, symbol: Symbol) {
        if let Some(frame) = self.scopes.last_mut() {
            frame.insert(name.to_string(), symbol);
        }
    }

    fn report(&mut self, error: SemanticError, line: usize) {
        self.diagnostics.push(error.at(line));
    }

    /// A non-pointer `struct X` reference must name a defined tag. Pointers
    /// to incomplete struct types stay legal, C-style.
    fn check_struct_reference(&mut self, ty: &TypeSpec, line: usize) {
        if let BaseType::Struct(tag) = &ty.base {
            if ty.pointer_depth == 0 && !tag.is_empty() && !self.structs.contains(tag.as_str()) {
                self.report(SemanticError::UndefinedStruct(tag.clone()), line);
            }
        }
    }

    fn family_of_type(&self, ty: &TypeSpec) -> TypeFamily {
        if ty.pointer_depth > 0 {
            return TypeFamily::Pointer;
        }
        match &ty.base {
            BaseType::Int | BaseType::Long | BaseType::Short => TypeFamily::Integer,
            BaseType::Float | BaseType::Double => TypeFamily::Floating,
            BaseType::Char => TypeFamily::Char,
            BaseType::Void => TypeFamily::Void,
            BaseType::Struct(name) => TypeFamily::Struct(name.clone()),
        }
    }

    // ------------------------------------------------------------------
    // Statements and declarations
    // ------------------------------------------------------------------

    fn visit_statement(&mut self, node: &AstNode) {
        match node {
            AstNode::VariableDecl {
                ty,
                name,
                array_dims,
                init,
                line,
            } => self.visit_variable_decl(ty, name, array_dims, init.as_deref(), *line),
            AstNode::FunctionDecl {
                return_type: _,
                name,
                params,
                body,
                line,
            } => {
                self.declare_function(name, body.is_some(), *line);
                if let Some(statements) = body {
                    self.enter_scope();
                    for param in params {
                        self.check_struct_reference(&param.ty, *line);
                        let family = self.family_of_type(&param.ty);
                        let dims = if param.is_array { vec![None] } else { Vec::new() };
                        self.declare(&param.name, Symbol::variable(family, dims));
                    }
                    for statement in statements {
                        self.visit_statement(statement);
                    }
                    self.leave_scope();
                }
            }
            AstNode::StructDecl { name, .. } => {
                if let Some(name) = name {
                    self.structs.insert(name.clone());
                }
            }
            AstNode::Block { statements, .. } => {
                self.enter_scope();
                for statement in statements {
                    self.visit_statement(statement);
                }
                self.leave_scope();
            }
            AstNode::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.visit_expression(condition);
                self.visit_statement(then_branch);
                if let Some(else_branch) = else_branch {
                    self.visit_statement(else_branch);
                }
            }
            AstNode::While {
                condition, body, ..
            } => {
                self.visit_expression(condition);
                self.visit_statement(body);
            }
            AstNode::DoWhile {
                body, condition, ..
            } => {
                self.visit_statement(body);
                self.visit_expression(condition);
            }
            AstNode::For {
                init,
                condition,
                update,
                body,
                ..
            } => {
                // Loop-header declarations live in their own frame that also
                // covers the body.
                self.enter_scope();
                for item in init {
                    self.visit_statement(item);
                }
                if let Some(condition) = condition {
                    self.visit_expression(condition);
                }
                if let Some(update) = update {
                    self.visit_expression(update);
                }
                self.visit_statement(body);
                self.leave_scope();
            }
            AstNode::Switch {
                scrutinee, clauses, ..
            } => {
                self.visit_expression(scrutinee);
                self.enter_scope();
                for clause in clauses {
                    match clause {
                        CaseClause::Case {
                            value, statements, ..
                        } => {
                            self.visit_expression(value);
                            for statement in statements {
                                self.visit_statement(statement);
                            }
                        }
                        CaseClause::Default { statements, .. } => {
                            for statement in statements {
                                self.visit_statement(statement);
                            }
                        }
                    }
                }
                self.leave_scope();
            }
            AstNode::Break { .. } | AstNode::Continue { .. } => {}
            AstNode::Return { value, .. } => {
                if let Some(value) = value {
                    self.visit_expression(value);
                }
            }
            AstNode::ExpressionStmt { expression, .. } => {
                self.visit_expression(expression);
            }
            // Bare expressions only appear under ExpressionStmt, but the
            // walk stays total.
            other => {
                self.visit_expression(other);
            }
        }
    }

    fn visit_variable_decl(
        &mut self,
        ty: &TypeSpec,
        name: &str,
        array_dims: &[Option<usize>],
        init: Option<&AstNode>,
        line: usize,
    ) {
        // Dimensionality is part of the recorded symbol: the same name
        // redeclared as a 1D and a 2D array gets the specific conflict
        // message rather than the generic one.
        let previous_dims = self
            .scopes
            .last()
            .and_then(|frame| frame.get(name))
            .map(|symbol| symbol.array_dims.len());
        if let Some(previous) = previous_dims {
            let conflict = (previous == 1 && array_dims.len() == 2)
                || (previous == 2 && array_dims.len() == 1);
            if conflict {
                self.report(SemanticError::ArrayDimensionConflict(name.to_string()), line);
            } else {
                self.report(SemanticError::Redeclaration(name.to_string()), line);
            }
        }
        let family = self.family_of_type(ty);
        self.check_struct_reference(ty, line);
        if let Some(init) = init {
            if array_dims.is_empty() {
                let found = self.visit_expression(init);
                if matches!(init, AstNode::InitializerList { .. }) {
                    self.report(SemanticError::UnexpectedBraces(name.to_string()), line);
                } else if !family.accepts(&found) {
                    self.report(
                        SemanticError::TypeMismatch {
                            name: name.to_string(),
                            expected: family.name(),
                            found: found.name(),
                        },
                        line,
                    );
                }
            } else {
                self.check_array_initializer(name, &family, array_dims, init, line);
            }
        }
        self.declare(name, Symbol::variable(family, array_dims.to_vec()));
    }

    /// A prototype may precede the definition; only a second body (or a name
    /// clash with a variable) counts as redeclaration.
    fn declare_function(&mut self, name: &str, has_body: bool, line: usize) {
        let clash = match self.lookup(name) {
            Some(Symbol {
                kind: SymbolKind::Function { has_body: had_body },
                ..
            }) => *had_body && has_body,
            Some(_) => true,
            None => false,
        };
        if clash {
            self.report(SemanticError::Redeclaration(name.to_string()), line);
        }
        self.declare(
            name,
            Symbol {
                family: TypeFamily::Unknown,
                array_dims: Vec::new(),
                kind: SymbolKind::Function { has_body },
            },
        );
    }

    // ------------------------------------------------------------------
    // Array initializers
    // ------------------------------------------------------------------

    fn check_array_initializer(
        &mut self,
        name: &str,
        element_family: &TypeFamily,
        dims: &[Option<usize>],
        init: &AstNode,
        line: usize,
    ) {
        // `char s[] = "text";` is the one non-brace form allowed.
        if *element_family == TypeFamily::Char {
            if let AstNode::Literal {
                kind: LiteralKind::String,
                value,
                ..
            } = init
            {
                if let Some(expected) = dims.first().copied().flatten() {
                    // The terminator needs a slot too.
                    let needed = value.chars().count() + 1;
                    if needed > expected {
                        self.report(
                            SemanticError::ArrayLengthMismatch {
                                name: name.to_string(),
                                expected,
                                found: needed,
                            },
                            line,
                        );
                    }
                }
                return;
            }
        }
        let AstNode::InitializerList { elements, .. } = init else {
            self.visit_expression(init);
            self.report(SemanticError::MissingBraces(name.to_string()), line);
            return;
        };
        match dims.len() {
            1 => self.check_row(name, element_family, dims[0], elements, line),
            2 => {
                if let Some(expected) = dims[0] {
                    if elements.len() != expected {
                        self.report(
                            SemanticError::ArrayLengthMismatch {
                                name: name.to_string(),
                                expected,
                                found: elements.len(),
                            },
                            line,
                        );
                    }
                }
                let mut row_lengths: Vec<usize> = Vec::new();
                for row in elements {
                    let AstNode::InitializerList {
                        elements: row_elements,
                        ..
                    } = row
                    else {
                        self.visit_expression(row);
                        self.report(SemanticError::MissingNestedBraces(name.to_string()), line);
                        continue;
                    };
                    row_lengths.push(row_elements.len());
                    self.check_row(name, element_family, dims[1], row_elements, line);
                }
                if row_lengths.windows(2).any(|pair| pair[0] != pair[1]) {
                    self.report(SemanticError::RaggedRows(name.to_string()), line);
                }
            }
            // Deeper nesting is walked for use errors but not shape-checked.
            _ => {
                for element in elements {
                    self.visit_expression(element);
                }
            }
        }
    }

    /// One flat row of scalar elements: count against the declared size,
    /// family against the element type, nested braces rejected.
    fn check_row(
        &mut self,
        name: &str,
        element_family: &TypeFamily,
        expected: Option<usize>,
        elements: &[AstNode],
        line: usize,
    ) {
        if let Some(expected) = expected {
            if elements.len() != expected {
                self.report(
                    SemanticError::ArrayLengthMismatch {
                        name: name.to_string(),
                        expected,
                        found: elements.len(),
                    },
                    line,
                );
            }
        }
        for element in elements {
            if matches!(element, AstNode::InitializerList { .. }) {
                self.report(
                    SemanticError::UnexpectedNestedBraces(name.to_string()),
                    line,
                );
                continue;
            }
            let found = self.visit_expression(element);
            if !element_family.accepts(&found) {
                self.report(
                    SemanticError::TypeMismatch {
                        name: name.to_string(),
                        expected: element_family.name(),
                        found: found.name(),
                    },
                    element.line(),
                );
            }
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// Check an expression for use errors and return its inferred family.
    fn visit_expression(&mut self, node: &AstNode) -> TypeFamily {
        match node {
            AstNode::Literal { value, kind, .. } => match kind {
                LiteralKind::Number => {
                    if value.contains('.') {
                        TypeFamily::Floating
                    } else {
                        TypeFamily::Integer
                    }
                }
                LiteralKind::String => TypeFamily::CharArray,
                LiteralKind::Char => TypeFamily::Char,
            },
            AstNode::Identifier { name, line } => {
                if name == "true" || name == "false" {
                    return TypeFamily::Bool;
                }
                if name == "NULL" {
                    return TypeFamily::Pointer;
                }
                let family = self.lookup(name).map(Symbol::use_family);
                match family {
                    Some(family) => family,
                    None => {
                        self.report(SemanticError::UndeclaredVariable(name.clone()), *line);
                        TypeFamily::Unknown
                    }
                }
            }
            AstNode::Binary {
                op,
                left,
                right,
                line,
            } => {
                let left_family = self.visit_expression(left);
                let right_family = self.visit_expression(right);
                if is_zero_literal(right) {
                    match op {
                        BinaryOp::Div => self.report(SemanticError::DivisionByZero, *line),
                        BinaryOp::Mod => self.report(SemanticError::ModuloByZero, *line),
                        _ => {}
                    }
                }
                match op {
                    BinaryOp::Eq
                    | BinaryOp::Ne
                    | BinaryOp::Lt
                    | BinaryOp::Le
                    | BinaryOp::Gt
                    | BinaryOp::Ge
                    | BinaryOp::And
                    | BinaryOp::Or => TypeFamily::Bool,
                    _ => {
                        if left_family == TypeFamily::Floating
                            || right_family == TypeFamily::Floating
                        {
                            TypeFamily::Floating
                        } else if left_family == TypeFamily::Unknown {
                            right_family
                        } else {
                            left_family
                        }
                    }
                }
            }
            AstNode::Unary { op, operand, .. } => {
                let operand_family = self.visit_expression(operand);
                match op {
                    UnaryOp::Not => TypeFamily::Bool,
                    UnaryOp::AddrOf => TypeFamily::Pointer,
                    UnaryOp::Deref => TypeFamily::Unknown,
                    _ => operand_family,
                }
            }
            AstNode::Assignment {
                target,
                value,
                line,
                ..
            } => {
                let target_family = self.visit_expression(target);
                let value_family = self.visit_expression(value);
                if !target_family.accepts(&value_family) {
                    let name = root_name(target).unwrap_or("expression").to_string();
                    self.report(
                        SemanticError::TypeMismatch {
                            name,
                            expected: target_family.name(),
                            found: value_family.name(),
                        },
                        *line,
                    );
                }
                target_family
            }
            AstNode::Call { callee, args, line } => {
                for arg in args {
                    self.visit_expression(arg);
                }
                if let AstNode::Identifier { name, .. } = callee.as_ref() {
                    if self.lookup(name).is_none() && !STANDARD_LIBRARY.contains(name.as_str()) {
                        self.report(SemanticError::UndeclaredFunction(name.clone()), *line);
                    }
                } else {
                    self.visit_expression(callee);
                }
                // Return-type inference is out of scope.
                TypeFamily::Unknown
            }
            AstNode::ArrayAccess { base, index, .. } => {
                let base_family = self.visit_expression(base);
                self.visit_expression(index);
                match base_family {
                    TypeFamily::CharArray => TypeFamily::Char,
                    TypeFamily::Pointer => TypeFamily::Unknown,
                    other => other,
                }
            }
            AstNode::MemberAccess { base, .. } => {
                self.visit_expression(base);
                // Field types are not tracked.
                TypeFamily::Unknown
            }
            AstNode::Conditional {
                condition,
                then_expr,
                else_expr,
                ..
            } => {
                self.visit_expression(condition);
                let family = self.visit_expression(then_expr);
                self.visit_expression(else_expr);
                family
            }
            AstNode::Sizeof { operand, .. } => {
                if let crate::ast::SizeofArg::Expression(expression) = operand {
                    self.visit_expression(expression);
                }
                TypeFamily::Integer
            }
            AstNode::Cast {
                target_type,
                operand,
                ..
            } => {
                self.visit_expression(operand);
                self.family_of_type(target_type)
            }
            AstNode::InitializerList { elements, .. } => {
                for element in elements {
                    self.visit_expression(element);
                }
                TypeFamily::Unknown
            }
            _ => TypeFamily::Unknown,
        }
    }
}

/// True when the node is a numeric literal whose value is exactly zero.
fn is_zero_literal(node: &AstNode) -> bool {
    match node {
        AstNode::Literal {
            value,
            kind: LiteralKind::Number,
            ..
        } => value.parse::<f64>().map(|n| n == 0.0).unwrap_or(false),
        _ => false,
    }
}

/// The identifier at the root of an lvalue chain, for diagnostics.
fn root_name(node: &AstNode) -> Option<&str> {
    match node {
        AstNode::Identifier { name, .. } => Some(name),
        AstNode::ArrayAccess { base, .. } | AstNode::MemberAccess { base, .. } => root_name(base),
        AstNode::Unary { operand, .. } => root_name(operand),
        _ => None,
    }
}
