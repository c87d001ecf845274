// AST definitions for the C-subset front end.

use serde::Serialize;
use std::fmt;

/// Base types appearing in type specifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BaseType {
    Int,
    Long,
    Short,
    Float,
    Double,
    Char,
    Void,
    Struct(String),
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseType::Int => write!(f, "int"),
            BaseType::Long => write!(f, "long"),
            BaseType::Short => write!(f, "short"),
            BaseType::Float => write!(f, "float"),
            BaseType::Double => write!(f, "double"),
            BaseType::Char => write!(f, "char"),
            BaseType::Void => write!(f, "void"),
            BaseType::Struct(name) => write!(f, "struct {}", name),
        }
    }
}

/// A type specifier: base type plus pointer depth. Array dimensions live on
/// the declaration, C-style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeSpec {
    pub base: BaseType,
    pub pointer_depth: usize,
}

impl TypeSpec {
    pub fn new(base: BaseType) -> Self {
        Self {
            base,
            pointer_depth: 0,
        }
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        for _ in 0..self.pointer_depth {
            write!(f, "*")?;
        }
        Ok(())
    }
}

/// Function parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub ty: TypeSpec,
    pub name: String,
    pub is_array: bool,
}

/// Struct field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub ty: TypeSpec,
    pub name: String,
    pub array_size: Option<usize>,
}

/// Binary operators. The set matches what the lexer's operator table can
/// produce for infix positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Unary operators; `is_prefix` on the node distinguishes `++x` from `x++`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    Inc,
    Dec,
    BitNot,
    AddrOf,
    Deref,
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
}

/// Literal classification, carried over from the token that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LiteralKind {
    Number,
    String,
    Char,
}

/// One `case`/`default` clause of a switch. Fallthrough is structural: a
/// clause's statements are exactly what appears before the next label, with
/// no implicit break.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CaseClause {
    Case {
        value: AstNode,
        statements: Vec<AstNode>,
        line: usize,
    },
    Default {
        statements: Vec<AstNode>,
        line: usize,
    },
}

/// The operand of `sizeof`: either a type name or an expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SizeofArg {
    Type(TypeSpec),
    Expression(Box<AstNode>),
}

/// AST nodes: declarations, statements, and expressions in one tagged enum.
/// Each node exclusively owns its children and carries its source line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AstNode {
    // Declarations
    VariableDecl {
        ty: TypeSpec,
        name: String,
        /// One entry per dimension; `None` for an unsized `[]`.
        array_dims: Vec<Option<usize>>,
        init: Option<Box<AstNode>>,
        line: usize,
    },
    FunctionDecl {
        return_type: TypeSpec,
        name: String,
        params: Vec<Param>,
        /// `None` for a prototype-only declaration.
        body: Option<Vec<AstNode>>,
        line: usize,
    },
    StructDecl {
        name: Option<String>,
        fields: Vec<Field>,
        line: usize,
    },

    // Statements
    Block {
        statements: Vec<AstNode>,
        line: usize,
    },
    If {
        condition: Box<AstNode>,
        then_branch: Box<AstNode>,
        else_branch: Option<Box<AstNode>>,
        line: usize,
    },
    While {
        condition: Box<AstNode>,
        body: Box<AstNode>,
        line: usize,
    },
    DoWhile {
        body: Box<AstNode>,
        condition: Box<AstNode>,
        line: usize,
    },
    For {
        /// Empty for a bare `;` init clause; may hold several nodes for a
        /// comma-chained declaration (`for (int i = 0, j = n; ...)`).
        init: Vec<AstNode>,
        condition: Option<Box<AstNode>>,
        update: Option<Box<AstNode>>,
        body: Box<AstNode>,
        line: usize,
    },
    Switch {
        scrutinee: Box<AstNode>,
        clauses: Vec<CaseClause>,
        line: usize,
    },
    Break {
        line: usize,
    },
    Continue {
        line: usize,
    },
    Return {
        value: Option<Box<AstNode>>,
        line: usize,
    },
    ExpressionStmt {
        expression: Box<AstNode>,
        line: usize,
    },

    // Expressions
    Literal {
        value: String,
        kind: LiteralKind,
        line: usize,
    },
    Identifier {
        name: String,
        line: usize,
    },
    Binary {
        op: BinaryOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
        line: usize,
    },
    Unary {
        op: UnaryOp,
        operand: Box<AstNode>,
        is_prefix: bool,
        line: usize,
    },
    Assignment {
        target: Box<AstNode>,
        op: AssignOp,
        value: Box<AstNode>,
        line: usize,
    },
    Call {
        callee: Box<AstNode>,
        args: Vec<AstNode>,
        line: usize,
    },
    ArrayAccess {
        base: Box<AstNode>,
        index: Box<AstNode>,
        line: usize,
    },
    MemberAccess {
        base: Box<AstNode>,
        field: String,
        is_pointer: bool,
        line: usize,
    },
    Conditional {
        condition: Box<AstNode>,
        then_expr: Box<AstNode>,
        else_expr: Box<AstNode>,
        line: usize,
    },
    Sizeof {
        operand: SizeofArg,
        line: usize,
    },
    Cast {
        target_type: TypeSpec,
        operand: Box<AstNode>,
        line: usize,
    },
    /// Brace initializer: `{1, 2, 3}` or `{{1, 2}, {3, 4}}`.
    InitializerList {
        elements: Vec<AstNode>,
        line: usize,
    },
}

impl AstNode {
    /// The source line this node originates from.
    pub fn line(&self) -> usize {
        match self {
            AstNode::VariableDecl { line, .. }
            | AstNode::FunctionDecl { line, .. }
            | AstNode::StructDecl { line, .. }
            | AstNode::Block { line, .. }
            | AstNode::If { line, .. }
            | AstNode::While { line, .. }
            | AstNode::DoWhile { line, .. }
            | AstNode::For { line, .. }
            | AstNode::Switch { line, .. }
            | AstNode::Break { line }
            | AstNode::Continue { line }
            | AstNode::Return { line, .. }
            | AstNode::ExpressionStmt { line, .. }
            | AstNode::Literal { line, .. }
            | AstNode::Identifier { line, .. }
            | AstNode::Binary { line, .. }
            | AstNode::Unary { line, .. }
            | AstNode::Assignment { line, .. }
            | AstNode::Call { line, .. }
            | AstNode::ArrayAccess { line, .. }
            | AstNode::MemberAccess { line, .. }
            | AstNode::Conditional { line, .. }
            | AstNode::Sizeof { line, .. }
            | AstNode::Cast { line, .. }
            | AstNode::InitializerList { line, .. } => *line,
        }
    }

    /// Whether this node is a legal assignment target.
    pub fn is_lvalue(&self) -> bool {
        match self {
            AstNode::Identifier { .. }
            | AstNode::ArrayAccess { .. }
            | AstNode::MemberAccess { .. } => true,
            AstNode::Unary {
                op: UnaryOp::Deref,
                is_prefix: true,
                ..
            } => true,
            _ => false,
        }
    }
}

/// Top-level program: the ordered list of declarations and statements.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Program {
    pub items: Vec<AstNode>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }
}
