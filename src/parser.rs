//! Recursive-descent parser with precedence climbing for expressions and
//! panic-mode recovery for statements.
//!
//! The parser never aborts on the first error: a failed production pushes a
//! diagnostic, unwinds to the nearest statement driver via [`Recovery`], and
//! the driver skips ahead to a synchronization token before trying the next
//! statement. Preprocessor directives are dropped from the token stream up
//! front since they carry no grammar.

use crate::ast::{
    AssignOp, AstNode, BaseType, BinaryOp, CaseClause, Field, LiteralKind, Param, Program,
    SizeofArg, TypeSpec, UnaryOp,
};
use crate::diagnostics::{Diagnostic, SyntaxError};
use crate::lexer::{Token, TokenKind};

/// Keywords that start a declaration's type specifier.
const TYPE_KEYWORDS: &[&str] = &["int", "long", "short", "float", "double", "char", "void"];

/// Tokens that make sense as the start of a fresh statement. Recovery stops
/// right before these so the next parse attempt lands on solid ground.
const SYNC_KEYWORDS: &[&str] = &[
    "if", "while", "for", "return", "break", "continue", "int", "long", "short", "float",
    "double", "char", "void", "struct",
];

/// Marker error unwound through `?` when a production fails. The diagnostic
/// itself has already been recorded by the time this propagates.
struct Recovery;

type Parse<T> = Result<T, Recovery>;

/// Parse a token stream into a program. Returns the AST (None when nothing
/// parsed at all) together with every syntax diagnostic collected along the
/// way. A non-empty diagnostic list still comes with whatever partial AST
/// recovery managed to salvage.
pub fn parse(tokens: Vec<Token>) -> (Option<Program>, Vec<Diagnostic>) {
    Parser::new(tokens).run()
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        let mut tokens: Vec<Token> = tokens
            .into_iter()
            .filter(|t| t.kind != TokenKind::PreprocessorDirective)
            .collect();
        // The lexer always terminates the stream, but guard against
        // hand-built token vectors.
        if !matches!(tokens.last(), Some(t) if t.kind == TokenKind::EndOfFile) {
            let line = tokens.last().map_or(1, |t| t.line);
            tokens.push(Token::new(TokenKind::EndOfFile, String::new(), line));
        }
        Parser {
            tokens,
            position: 0,
            diagnostics: Vec::new(),
        }
    }

    fn run(mut self) -> (Option<Program>, Vec<Diagnostic>) {
        let mut items = Vec::new();
        while !self.is_at_end() {
            let before = self.position;
            if self.parse_statement_into(&mut items).is_err() {
                self.recover(before);
            }
        }
        let program = if items.is_empty() {
            None
        } else {
            Some(Program { items })
        };
        (program, self.diagnostics)
    }

    // ------------------------------------------------------------------
    // Cursor helpers
    // ------------------------------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn peek_ahead(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.position + offset)
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::EndOfFile
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous()
    }

    fn check_symbol(&self, symbol: char) -> bool {
        let token = self.peek();
        token.kind == TokenKind::Symbol && token.lexeme.chars().next() == Some(symbol)
    }

    fn match_symbol(&mut self, symbol: char) -> bool {
        if self.check_symbol(symbol) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check_operator(&self, op: &str) -> bool {
        let token = self.peek();
        token.kind == TokenKind::Operator && token.lexeme == op
    }

    fn match_operator(&mut self, op: &str) -> bool {
        if self.check_operator(op) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check_keyword(&self, keyword: &str) -> bool {
        let token = self.peek();
        token.kind == TokenKind::Keyword && token.lexeme == keyword
    }

    fn check_control(&self, keyword: &str) -> bool {
        let token = self.peek();
        token.kind == TokenKind::ControlFlow && token.lexeme == keyword
    }

    fn check_identifier(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Identifier | TokenKind::StandardLibraryIdentifier
        )
    }

    // ------------------------------------------------------------------
    // Errors and recovery
    // ------------------------------------------------------------------

    fn error_expected(&mut self, expected: &str) -> Recovery {
        let token = self.peek();
        let diagnostic = if token.kind == TokenKind::EndOfFile {
            SyntaxError::UnexpectedEof {
                expected: expected.to_string(),
            }
            .at(token.line)
        } else {
            SyntaxError::UnexpectedToken {
                expected: expected.to_string(),
                found: token.describe(),
            }
            .at(token.line)
        };
        self.diagnostics.push(diagnostic);
        Recovery
    }

    fn expect_symbol(&mut self, symbol: char, expected: &str) -> Parse<()> {
        if self.match_symbol(symbol) {
            Ok(())
        } else {
            Err(self.error_expected(expected))
        }
    }

    fn expect_identifier(&mut self, expected: &str) -> Parse<(String, usize)> {
        if self.check_identifier() {
            let token = self.advance();
            Ok((token.lexeme.clone(), token.line))
        } else {
            Err(self.error_expected(expected))
        }
    }

    /// Skip tokens until a likely statement boundary. A `;` is consumed (the
    /// broken statement owned it); `{`, `}`, and statement-starting keywords
    /// are left for the next parse attempt.
    fn synchronize(&mut self) {
        while !self.is_at_end() {
            let token = self.peek();
            match token.kind {
                TokenKind::Symbol if token.lexeme == ";" => {
                    self.advance();
                    return;
                }
                TokenKind::Symbol if token.lexeme == "{" || token.lexeme == "}" => return,
                TokenKind::Keyword | TokenKind::ControlFlow
                    if SYNC_KEYWORDS.contains(&token.lexeme.as_str()) =>
                {
                    return
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Synchronize, then force one token of progress if the failed production
    /// consumed nothing, so driver loops can never spin in place.
    fn recover(&mut self, before: usize) {
        self.synchronize();
        if self.position == before {
            self.advance();
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// Parse one statement into `out`. Declarations go through the list form
    /// so comma-chained declarators land as sibling nodes.
    fn parse_statement_into(&mut self, out: &mut Vec<AstNode>) -> Parse<()> {
        if self.at_declaration_start() {
            out.extend(self.parse_declaration_list()?);
        } else {
            out.push(self.parse_statement()?);
        }
        Ok(())
    }

    fn at_declaration_start(&self) -> bool {
        self.check_keyword("struct")
            || (self.peek().kind == TokenKind::Keyword
                && TYPE_KEYWORDS.contains(&self.peek().lexeme.as_str()))
    }

    fn parse_statement(&mut self) -> Parse<AstNode> {
        if self.check_symbol('{') {
            return self.parse_block();
        }
        if self.check_control("if") {
            return self.parse_if();
        }
        if self.check_control("while") {
            return self.parse_while();
        }
        if self.check_control("do") {
            return self.parse_do_while();
        }
        if self.check_control("for") {
            return self.parse_for();
        }
        if self.check_control("switch") {
            return self.parse_switch();
        }
        if self.check_keyword("return") {
            return self.parse_return();
        }
        if self.check_keyword("break") {
            let line = self.advance().line;
            self.expect_symbol(';', "';' after 'break'")?;
            return Ok(AstNode::Break { line });
        }
        if self.check_keyword("continue") {
            let line = self.advance().line;
            self.expect_symbol(';', "';' after 'continue'")?;
            return Ok(AstNode::Continue { line });
        }
        if self.at_declaration_start() {
            // Unbraced single-statement bodies route here; a comma chain
            // still yields one node per declarator, wrapped when needed.
            let line = self.peek().line;
            let mut decls = self.parse_declaration_list()?;
            return Ok(if decls.len() == 1 {
                decls.remove(0)
            } else {
                AstNode::Block {
                    statements: decls,
                    line,
                }
            });
        }
        let line = self.peek().line;
        let expression = self.parse_expression()?;
        self.expect_symbol(';', "';' after expression")?;
        Ok(AstNode::ExpressionStmt {
            expression: Box::new(expression),
            line,
        })
    }

    /// Consume `{ statement* }` and return the statements, recovering inside
    /// the braces so one bad statement cannot sink the rest of the block.
    fn parse_brace_block(&mut self) -> Parse<(Vec<AstNode>, usize)> {
        let line = self.peek().line;
        self.expect_symbol('{', "'{'")?;
        let mut statements = Vec::new();
        while !self.check_symbol('}') && !self.is_at_end() {
            let before = self.position;
            if self.parse_statement_into(&mut statements).is_err() {
                self.recover(before);
            }
        }
        if !self.match_symbol('}') {
            // Input ran out; keep what was collected so the caller still
            // gets a partial body.
            let _ = self.error_expected("'}' to close block");
        }
        Ok((statements, line))
    }

    fn parse_block(&mut self) -> Parse<AstNode> {
        let (statements, line) = self.parse_brace_block()?;
        Ok(AstNode::Block { statements, line })
    }

    fn parse_if(&mut self) -> Parse<AstNode> {
        let line = self.advance().line;
        self.expect_symbol('(', "'(' after 'if'")?;
        let condition = self.parse_expression()?;
        self.expect_symbol(')', "')' after condition")?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.check_control("else") {
            self.advance();
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(AstNode::If {
            condition: Box::new(condition),
            then_branch,
            else_branch,
            line,
        })
    }

    fn parse_while(&mut self) -> Parse<AstNode> {
        let line = self.advance().line;
        self.expect_symbol('(', "'(' after 'while'")?;
        let condition = self.parse_expression()?;
        self.expect_symbol(')', "')' after condition")?;
        let body = Box::new(self.parse_statement()?);
        Ok(AstNode::While {
            condition: Box::new(condition),
            body,
            line,
        })
    }

    fn parse_do_while(&mut self) -> Parse<AstNode> {
        let line = self.advance().line;
        let body = Box::new(self.parse_statement()?);
        if !self.check_control("while") {
            return Err(self.error_expected("'while' after do body"));
        }
        self.advance();
        self.expect_symbol('(', "'(' after 'while'")?;
        let condition = self.parse_expression()?;
        self.expect_symbol(')', "')' after condition")?;
        self.expect_symbol(';', "';' after do-while")?;
        Ok(AstNode::DoWhile {
            body,
            condition: Box::new(condition),
            line,
        })
    }

    fn parse_for(&mut self) -> Parse<AstNode> {
        let line = self.advance().line;
        self.expect_symbol('(', "'(' after 'for'")?;
        let init = if self.match_symbol(';') {
            Vec::new()
        } else if self.at_declaration_start() {
            // parse_declaration_list consumes the trailing ';'.
            self.parse_declaration_list()?
        } else {
            let expr_line = self.peek().line;
            let expression = self.parse_expression()?;
            self.expect_symbol(';', "';' after for initializer")?;
            vec![AstNode::ExpressionStmt {
                expression: Box::new(expression),
                line: expr_line,
            }]
        };
        let condition = if self.check_symbol(';') {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect_symbol(';', "';' after for condition")?;
        let update = if self.check_symbol(')') {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect_symbol(')', "')' after for clauses")?;
        let body = Box::new(self.parse_statement()?);
        Ok(AstNode::For {
            init,
            condition,
            update,
            body,
            line,
        })
    }

    fn parse_switch(&mut self) -> Parse<AstNode> {
        let line = self.advance().line;
        self.expect_symbol('(', "'(' after 'switch'")?;
        let scrutinee = self.parse_expression()?;
        self.expect_symbol(')', "')' after switch value")?;
        self.expect_symbol('{', "'{' to open switch body")?;
        let mut clauses = Vec::new();
        while !self.check_symbol('}') && !self.is_at_end() {
            if self.check_control("case") {
                let clause_line = self.advance().line;
                let value = self.parse_expression()?;
                self.expect_symbol(':', "':' after case value")?;
                let statements = self.parse_clause_statements();
                clauses.push(CaseClause::Case {
                    value,
                    statements,
                    line: clause_line,
                });
            } else if self.check_keyword("default") {
                let clause_line = self.advance().line;
                self.expect_symbol(':', "':' after 'default'")?;
                let statements = self.parse_clause_statements();
                clauses.push(CaseClause::Default {
                    statements,
                    line: clause_line,
                });
            } else {
                return Err(self.error_expected("'case' or 'default' in switch body"));
            }
        }
        self.expect_symbol('}', "'}' to close switch body")?;
        Ok(AstNode::Switch {
            scrutinee: Box::new(scrutinee),
            clauses,
            line,
        })
    }

    /// Statements belonging to one case clause, up to the next clause label
    /// or the end of the switch body.
    fn parse_clause_statements(&mut self) -> Vec<AstNode> {
        let mut statements = Vec::new();
        while !self.check_control("case")
            && !self.check_keyword("default")
            && !self.check_symbol('}')
            && !self.is_at_end()
        {
            let before = self.position;
            if self.parse_statement_into(&mut statements).is_err() {
                self.recover(before);
            }
        }
        statements
    }

    fn parse_return(&mut self) -> Parse<AstNode> {
        let line = self.advance().line;
        let value = if self.check_symbol(';') {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect_symbol(';', "';' after return value")?;
        Ok(AstNode::Return { value, line })
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    /// One declaration statement, which may expand to several nodes: a comma
    /// chain produces one `VariableDecl` per declarator, and a struct
    /// definition with a trailing declarator produces the type plus the
    /// variable.
    fn parse_declaration_list(&mut self) -> Parse<Vec<AstNode>> {
        if self.at_struct_definition() {
            return self.parse_struct_definition();
        }
        let ty = self.parse_type()?;
        let (name, line) = self.expect_identifier("an identifier after type")?;
        if self.check_symbol('(') {
            Ok(vec![self.parse_function_tail(ty, name, line)?])
        } else {
            self.parse_variable_tail(ty, name, line)
        }
    }

    /// `struct` starts a definition only when a `{` follows the keyword or
    /// the tag name; otherwise it is a struct-typed declaration.
    fn at_struct_definition(&self) -> bool {
        if !self.check_keyword("struct") {
            return false;
        }
        match self.peek_ahead(1) {
            Some(t) if t.kind == TokenKind::Symbol && t.lexeme == "{" => true,
            Some(t)
                if matches!(
                    t.kind,
                    TokenKind::Identifier | TokenKind::StandardLibraryIdentifier
                ) =>
            {
                matches!(
                    self.peek_ahead(2),
                    Some(t2) if t2.kind == TokenKind::Symbol && t2.lexeme == "{"
                )
            }
            _ => false,
        }
    }

    fn parse_struct_definition(&mut self) -> Parse<Vec<AstNode>> {
        let line = self.advance().line;
        let name = if self.check_identifier() {
            Some(self.advance().lexeme.clone())
        } else {
            None
        };
        self.expect_symbol('{', "'{' to open struct body")?;
        let mut fields = Vec::new();
        while !self.check_symbol('}') && !self.is_at_end() {
            let ty = self.parse_type()?;
            let (field_name, _) = self.expect_identifier("a field name")?;
            let array_size = if self.match_symbol('[') {
                let size = self.parse_array_size()?;
                self.expect_symbol(']', "']' after array size")?;
                Some(size)
            } else {
                None
            };
            self.expect_symbol(';', "';' after struct field")?;
            fields.push(Field {
                ty,
                name: field_name,
                array_size,
            });
        }
        self.expect_symbol('}', "'}' to close struct body")?;
        let mut nodes = vec![AstNode::StructDecl {
            name: name.clone(),
            fields,
            line,
        }];
        if self.check_identifier() {
            let (var_name, var_line) = self.expect_identifier("a declarator")?;
            nodes.push(AstNode::VariableDecl {
                ty: TypeSpec::new(BaseType::Struct(name.unwrap_or_default())),
                name: var_name,
                array_dims: Vec::new(),
                init: None,
                line: var_line,
            });
        }
        self.expect_symbol(';', "';' after struct declaration")?;
        Ok(nodes)
    }

    fn parse_type(&mut self) -> Parse<TypeSpec> {
        let base = if self.check_keyword("struct") {
            self.advance();
            let (name, _) = self.expect_identifier("a struct name")?;
            BaseType::Struct(name)
        } else {
            if self.peek().kind != TokenKind::Keyword {
                return Err(self.error_expected("a type specifier"));
            }
            let lexeme = self.peek().lexeme.clone();
            let base = match lexeme.as_str() {
                "int" => BaseType::Int,
                "long" => BaseType::Long,
                "short" => BaseType::Short,
                "float" => BaseType::Float,
                "double" => BaseType::Double,
                "char" => BaseType::Char,
                "void" => BaseType::Void,
                _ => return Err(self.error_expected("a type specifier")),
            };
            self.advance();
            base
        };
        let mut ty = TypeSpec::new(base);
        while self.check_operator("*") {
            self.advance();
            ty.pointer_depth += 1;
        }
        Ok(ty)
    }

    fn parse_array_size(&mut self) -> Parse<usize> {
        if self.peek().kind == TokenKind::Number {
            let parsed = self.peek().lexeme.parse::<usize>();
            if let Ok(size) = parsed {
                self.advance();
                return Ok(size);
            }
        }
        Err(self.error_expected("a constant integer array size"))
    }

    fn parse_function_tail(
        &mut self,
        return_type: TypeSpec,
        name: String,
        line: usize,
    ) -> Parse<AstNode> {
        self.advance(); // '(' checked by the caller
        let params = self.parse_params()?;
        self.expect_symbol(')', "')' after parameters")?;
        let body = if self.check_symbol('{') {
            let (statements, _) = self.parse_brace_block()?;
            Some(statements)
        } else if self.match_symbol(';') {
            None
        } else {
            return Err(self.error_expected("'{' or ';' after function signature"));
        };
        Ok(AstNode::FunctionDecl {
            return_type,
            name,
            params,
            body,
            line,
        })
    }

    fn parse_params(&mut self) -> Parse<Vec<Param>> {
        let mut params = Vec::new();
        if self.check_symbol(')') {
            return Ok(params);
        }
        // `(void)` declares an empty parameter list.
        if self.check_keyword("void")
            && matches!(
                self.peek_ahead(1),
                Some(t) if t.kind == TokenKind::Symbol && t.lexeme == ")"
            )
        {
            self.advance();
            return Ok(params);
        }
        loop {
            let ty = self.parse_type()?;
            let (name, _) = self.expect_identifier("a parameter name")?;
            let mut is_array = false;
            if self.match_symbol('[') {
                self.expect_symbol(']', "']' in array parameter")?;
                is_array = true;
            }
            params.push(Param { ty, name, is_array });
            if !self.match_symbol(',') {
                break;
            }
        }
        Ok(params)
    }

    fn parse_variable_tail(
        &mut self,
        ty: TypeSpec,
        first_name: String,
        first_line: usize,
    ) -> Parse<Vec<AstNode>> {
        let mut decls = Vec::new();
        let mut name = first_name;
        let mut line = first_line;
        loop {
            let mut array_dims = Vec::new();
            while self.match_symbol('[') {
                if self.match_symbol(']') {
                    // Size left for the initializer to determine.
                    array_dims.push(None);
                } else {
                    let size = self.parse_array_size()?;
                    self.expect_symbol(']', "']' after array size")?;
                    array_dims.push(Some(size));
                }
            }
            let init = if self.match_operator("=") {
                Some(Box::new(self.parse_initializer()?))
            } else {
                None
            };
            decls.push(AstNode::VariableDecl {
                ty: ty.clone(),
                name,
                array_dims,
                init,
                line,
            });
            if self.match_symbol(',') {
                let (next_name, next_line) = self.expect_identifier("an identifier after ','")?;
                name = next_name;
                line = next_line;
            } else {
                break;
            }
        }
        self.expect_symbol(';', "';' after declaration")?;
        Ok(decls)
    }

    /// Brace initializer lists nest, so `{{1, 2}, {3, 4}}` comes out as a
    /// list of lists. A trailing comma before the closing brace is accepted.
    fn parse_initializer(&mut self) -> Parse<AstNode> {
        if self.check_symbol('{') {
            let line = self.advance().line;
            let mut elements = Vec::new();
            if !self.check_symbol('}') {
                loop {
                    elements.push(self.parse_initializer()?);
                    if !self.match_symbol(',') {
                        break;
                    }
                    if self.check_symbol('}') {
                        break;
                    }
                }
            }
            self.expect_symbol('}', "'}' to close initializer list")?;
            return Ok(AstNode::InitializerList { elements, line });
        }
        self.parse_expression()
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn parse_expression(&mut self) -> Parse<AstNode> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Parse<AstNode> {
        let expr = self.parse_conditional()?;
        if let Some(op) = self.peek_assign_op() {
            let line = self.peek().line;
            self.advance();
            // Right associative: a = b = c groups as a = (b = c).
            let value = self.parse_assignment()?;
            if !expr.is_lvalue() {
                self.diagnostics
                    .push(SyntaxError::InvalidAssignmentTarget.at(line));
                return Err(Recovery);
            }
            return Ok(AstNode::Assignment {
                target: Box::new(expr),
                op,
                value: Box::new(value),
                line,
            });
        }
        Ok(expr)
    }

    fn peek_assign_op(&self) -> Option<AssignOp> {
        if self.peek().kind != TokenKind::Operator {
            return None;
        }
        match self.peek().lexeme.as_str() {
            "=" => Some(AssignOp::Assign),
            "+=" => Some(AssignOp::AddAssign),
            "-=" => Some(AssignOp::SubAssign),
            "*=" => Some(AssignOp::MulAssign),
            "/=" => Some(AssignOp::DivAssign),
            "%=" => Some(AssignOp::ModAssign),
            _ => None,
        }
    }

    fn parse_conditional(&mut self) -> Parse<AstNode> {
        let condition = self.parse_binary(0)?;
        if self.check_operator("?") {
            let line = self.advance().line;
            let then_expr = self.parse_expression()?;
            self.expect_symbol(':', "':' in conditional expression")?;
            let else_expr = self.parse_conditional()?;
            return Ok(AstNode::Conditional {
                condition: Box::new(condition),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
                line,
            });
        }
        Ok(condition)
    }

    /// Precedence climbing over the binary operator ladder. Each level binds
    /// left associatively by recursing with `bp + 1` on the right operand.
    fn parse_binary(&mut self, min_bp: u8) -> Parse<AstNode> {
        let mut left = self.parse_unary()?;
        while let Some((op, bp)) = self.peek_binary_op() {
            if bp < min_bp {
                break;
            }
            let line = self.peek().line;
            self.advance();
            let right = self.parse_binary(bp + 1)?;
            left = AstNode::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                line,
            };
        }
        Ok(left)
    }

    fn peek_binary_op(&self) -> Option<(BinaryOp, u8)> {
        if self.peek().kind != TokenKind::Operator {
            return None;
        }
        match self.peek().lexeme.as_str() {
            "||" => Some((BinaryOp::Or, 2)),
            "&&" => Some((BinaryOp::And, 3)),
            "==" => Some((BinaryOp::Eq, 4)),
            "!=" => Some((BinaryOp::Ne, 4)),
            "<" => Some((BinaryOp::Lt, 5)),
            "<=" => Some((BinaryOp::Le, 5)),
            ">" => Some((BinaryOp::Gt, 5)),
            ">=" => Some((BinaryOp::Ge, 5)),
            "+" => Some((BinaryOp::Add, 6)),
            "-" => Some((BinaryOp::Sub, 6)),
            "*" => Some((BinaryOp::Mul, 7)),
            "/" => Some((BinaryOp::Div, 7)),
            "%" => Some((BinaryOp::Mod, 7)),
            _ => None,
        }
    }

    fn parse_unary(&mut self) -> Parse<AstNode> {
        if self.at_cast() {
            let line = self.advance().line; // '('
            let target_type = self.parse_type()?;
            self.expect_symbol(')', "')' after cast type")?;
            let operand = self.parse_unary()?;
            return Ok(AstNode::Cast {
                target_type,
                operand: Box::new(operand),
                line,
            });
        }
        if self.check_keyword("sizeof") {
            return self.parse_sizeof();
        }
        if let Some(op) = self.peek_prefix_op() {
            let line = self.advance().line;
            let operand = self.parse_unary()?;
            return Ok(AstNode::Unary {
                op,
                operand: Box::new(operand),
                is_prefix: true,
                line,
            });
        }
        self.parse_postfix()
    }

    /// A parenthesis opens a cast only when a type keyword follows it.
    fn at_cast(&self) -> bool {
        if !self.check_symbol('(') {
            return false;
        }
        matches!(
            self.peek_ahead(1),
            Some(t) if t.kind == TokenKind::Keyword
                && (TYPE_KEYWORDS.contains(&t.lexeme.as_str()) || t.lexeme == "struct")
        )
    }

    fn peek_prefix_op(&self) -> Option<UnaryOp> {
        if self.peek().kind != TokenKind::Operator {
            return None;
        }
        match self.peek().lexeme.as_str() {
            "!" => Some(UnaryOp::Not),
            "-" => Some(UnaryOp::Neg),
            "+" => Some(UnaryOp::Plus),
            "++" => Some(UnaryOp::Inc),
            "--" => Some(UnaryOp::Dec),
            "~" => Some(UnaryOp::BitNot),
            "&" => Some(UnaryOp::AddrOf),
            "*" => Some(UnaryOp::Deref),
            _ => None,
        }
    }

    fn parse_sizeof(&mut self) -> Parse<AstNode> {
        let line = self.advance().line;
        if self.check_symbol('(') {
            if matches!(
                self.peek_ahead(1),
                Some(t) if t.kind == TokenKind::Keyword
                    && (TYPE_KEYWORDS.contains(&t.lexeme.as_str()) || t.lexeme == "struct")
            ) {
                self.advance();
                let ty = self.parse_type()?;
                self.expect_symbol(')', "')' after sizeof type")?;
                return Ok(AstNode::Sizeof {
                    operand: SizeofArg::Type(ty),
                    line,
                });
            }
        }
        // `sizeof expr` and `sizeof(expr)` both land here; the parenthesized
        // form parses as a grouped primary.
        let operand = self.parse_unary()?;
        Ok(AstNode::Sizeof {
            operand: SizeofArg::Expression(Box::new(operand)),
            line,
        })
    }

    fn parse_postfix(&mut self) -> Parse<AstNode> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.check_operator("++") {
                let line = self.advance().line;
                expr = AstNode::Unary {
                    op: UnaryOp::Inc,
                    operand: Box::new(expr),
                    is_prefix: false,
                    line,
                };
            } else if self.check_operator("--") {
                let line = self.advance().line;
                expr = AstNode::Unary {
                    op: UnaryOp::Dec,
                    operand: Box::new(expr),
                    is_prefix: false,
                    line,
                };
            } else if self.check_symbol('[') {
                let line = self.advance().line;
                let index = self.parse_expression()?;
                self.expect_symbol(']', "']' after index")?;
                expr = AstNode::ArrayAccess {
                    base: Box::new(expr),
                    index: Box::new(index),
                    line,
                };
            } else if self.check_operator(".") {
                let line = self.advance().line;
                let (field, _) = self.expect_identifier("a field name after '.'")?;
                expr = AstNode::MemberAccess {
                    base: Box::new(expr),
                    field,
                    is_pointer: false,
                    line,
                };
            } else if self.check_operator("->") {
                let line = self.advance().line;
                let (field, _) = self.expect_identifier("a field name after '->'")?;
                expr = AstNode::MemberAccess {
                    base: Box::new(expr),
                    field,
                    is_pointer: true,
                    line,
                };
            } else if self.check_symbol('(') {
                let line = self.advance().line;
                let mut args = Vec::new();
                if !self.check_symbol(')') {
                    loop {
                        args.push(self.parse_expression()?);
                        if !self.match_symbol(',') {
                            break;
                        }
                    }
                }
                self.expect_symbol(')', "')' after arguments")?;
                expr = AstNode::Call {
                    callee: Box::new(expr),
                    args,
                    line,
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Parse<AstNode> {
        let kind = self.peek().kind;
        match kind {
            TokenKind::Number => {
                let token = self.advance();
                Ok(AstNode::Literal {
                    value: token.lexeme.clone(),
                    kind: LiteralKind::Number,
                    line: token.line,
                })
            }
            TokenKind::String => {
                let token = self.advance();
                Ok(AstNode::Literal {
                    value: token.lexeme.clone(),
                    kind: LiteralKind::String,
                    line: token.line,
                })
            }
            TokenKind::CharLiteral => {
                let token = self.advance();
                Ok(AstNode::Literal {
                    value: token.lexeme.clone(),
                    kind: LiteralKind::Char,
                    line: token.line,
                })
            }
            TokenKind::Identifier | TokenKind::StandardLibraryIdentifier => {
                let token = self.advance();
                Ok(AstNode::Identifier {
                    name: token.lexeme.clone(),
                    line: token.line,
                })
            }
            TokenKind::Symbol if self.check_symbol('(') => {
                self.advance();
                let expression = self.parse_expression()?;
                self.expect_symbol(')', "')' after expression")?;
                Ok(expression)
            }
            _ => Err(self.error_expected("an expression")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_source(source: &str) -> (Option<Program>, Vec<Diagnostic>) {
        let (tokens, _) = tokenize(source);
        parse(tokens)
    }

    fn parse_ok(source: &str) -> Program {
        let (program, diagnostics) = parse_source(source);
        assert!(diagnostics.is_empty(), "unexpected: {:?}", diagnostics);
        program.unwrap()
    }

    fn first_expression(program: &Program) -> &AstNode {
        match &program.items[0] {
            AstNode::ExpressionStmt { expression, .. } => expression,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let program = parse_ok("a + b * c;");
        match first_expression(&program) {
            AstNode::Binary {
                op: BinaryOp::Add,
                right,
                ..
            } => {
                assert!(matches!(
                    right.as_ref(),
                    AstNode::Binary {
                        op: BinaryOp::Mul,
                        ..
                    }
                ));
            }
            other => panic!("expected addition at the root, got {:?}", other),
        }
    }

    #[test]
    fn comparison_binds_tighter_than_logical_and() {
        let program = parse_ok("a < b && c;");
        match first_expression(&program) {
            AstNode::Binary {
                op: BinaryOp::And,
                left,
                ..
            } => {
                assert!(matches!(
                    left.as_ref(),
                    AstNode::Binary {
                        op: BinaryOp::Lt,
                        ..
                    }
                ));
            }
            other => panic!("expected && at the root, got {:?}", other),
        }
    }

    #[test]
    fn same_precedence_groups_left() {
        let program = parse_ok("a - b + c;");
        match first_expression(&program) {
            AstNode::Binary {
                op: BinaryOp::Add,
                left,
                ..
            } => {
                assert!(matches!(
                    left.as_ref(),
                    AstNode::Binary {
                        op: BinaryOp::Sub,
                        ..
                    }
                ));
            }
            other => panic!("expected + at the root, got {:?}", other),
        }
    }

    #[test]
    fn assignment_groups_right() {
        let program = parse_ok("a = b = c;");
        match first_expression(&program) {
            AstNode::Assignment { value, .. } => {
                assert!(matches!(value.as_ref(), AstNode::Assignment { .. }));
            }
            other => panic!("expected assignment at the root, got {:?}", other),
        }
    }

    #[test]
    fn assignment_to_non_lvalue_is_rejected() {
        let (_, diagnostics) = parse_source("1 = x;");
        assert!(diagnostics
            .iter()
            .any(|d| d.message.contains("assignment target")));
    }

    #[test]
    fn comma_chain_yields_one_node_per_declarator() {
        let program = parse_ok("int a = 1, b, c = 3;");
        assert_eq!(program.items.len(), 3);
        for item in &program.items {
            assert!(matches!(item, AstNode::VariableDecl { .. }));
        }
    }

    #[test]
    fn array_declaration_records_dimensions() {
        let program = parse_ok("int grid[2][3];");
        match &program.items[0] {
            AstNode::VariableDecl { array_dims, .. } => {
                assert_eq!(array_dims, &vec![Some(2), Some(3)]);
            }
            other => panic!("expected variable declaration, got {:?}", other),
        }
    }

    #[test]
    fn function_prototype_has_no_body() {
        let program = parse_ok("int add(int a, int b);");
        match &program.items[0] {
            AstNode::FunctionDecl { params, body, .. } => {
                assert_eq!(params.len(), 2);
                assert!(body.is_none());
            }
            other => panic!("expected function declaration, got {:?}", other),
        }
    }

    #[test]
    fn void_parameter_list_is_empty() {
        let program = parse_ok("int main(void) { return 0; }");
        match &program.items[0] {
            AstNode::FunctionDecl { params, body, .. } => {
                assert!(params.is_empty());
                assert!(body.is_some());
            }
            other => panic!("expected function declaration, got {:?}", other),
        }
    }

    #[test]
    fn struct_definition_with_declarator_yields_two_nodes() {
        let program = parse_ok("struct Point { int x; int y; } origin;");
        assert_eq!(program.items.len(), 2);
        assert!(matches!(
            &program.items[0],
            AstNode::StructDecl { fields, .. } if fields.len() == 2
        ));
        assert!(matches!(
            &program.items[1],
            AstNode::VariableDecl { name, .. } if name == "origin"
        ));
    }

    #[test]
    fn struct_typed_variable_is_not_a_definition() {
        let program = parse_ok("struct Point p;");
        match &program.items[0] {
            AstNode::VariableDecl { ty, .. } => {
                assert_eq!(ty.base, BaseType::Struct("Point".to_string()));
            }
            other => panic!("expected variable declaration, got {:?}", other),
        }
    }

    #[test]
    fn cast_and_sizeof_parse() {
        let program = parse_ok("x = (float) y + sizeof(int);");
        match first_expression(&program) {
            AstNode::Assignment { value, .. } => match value.as_ref() {
                AstNode::Binary { left, right, .. } => {
                    assert!(matches!(left.as_ref(), AstNode::Cast { .. }));
                    assert!(matches!(
                        right.as_ref(),
                        AstNode::Sizeof {
                            operand: SizeofArg::Type(_),
                            ..
                        }
                    ));
                }
                other => panic!("expected binary expression, got {:?}", other),
            },
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn postfix_chain_nests_leftward() {
        let program = parse_ok("p->next[0].value(1);");
        match first_expression(&program) {
            AstNode::Call { callee, args, .. } => {
                assert_eq!(args.len(), 1);
                assert!(matches!(
                    callee.as_ref(),
                    AstNode::MemberAccess {
                        is_pointer: false,
                        ..
                    }
                ));
            }
            other => panic!("expected call at the root, got {:?}", other),
        }
    }

    #[test]
    fn conditional_expression_parses() {
        let program = parse_ok("x = a > b ? a : b;");
        match first_expression(&program) {
            AstNode::Assignment { value, .. } => {
                assert!(matches!(value.as_ref(), AstNode::Conditional { .. }));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn for_loop_with_declared_counter() {
        let program = parse_ok("for (int i = 0; i < 10; i++) x = x + i;");
        match &program.items[0] {
            AstNode::For {
                init,
                condition,
                update,
                ..
            } => {
                assert_eq!(init.len(), 1);
                assert!(condition.is_some());
                assert!(update.is_some());
            }
            other => panic!("expected for loop, got {:?}", other),
        }
    }

    #[test]
    fn switch_collects_clauses() {
        let program = parse_ok(
            "switch (x) { case 1: y = 1; break; case 2: y = 2; break; default: y = 0; }",
        );
        match &program.items[0] {
            AstNode::Switch { clauses, .. } => {
                assert_eq!(clauses.len(), 3);
                assert!(matches!(clauses[2], CaseClause::Default { .. }));
            }
            other => panic!("expected switch, got {:?}", other),
        }
    }

    #[test]
    fn missing_semicolon_recovers_to_next_declaration() {
        let (program, diagnostics) = parse_source("int x = 5\nint y;");
        assert!(!diagnostics.is_empty());
        let program = program.unwrap();
        assert!(program
            .items
            .iter()
            .any(|item| matches!(item, AstNode::VariableDecl { name, .. } if name == "y")));
    }

    #[test]
    fn error_inside_block_does_not_lose_later_statements() {
        let (program, diagnostics) = parse_source("void f() { x = ; y = 1; }");
        assert!(!diagnostics.is_empty());
        let program = program.unwrap();
        match &program.items[0] {
            AstNode::FunctionDecl { body, .. } => {
                let body = body.as_ref().unwrap();
                assert!(body
                    .iter()
                    .any(|s| matches!(s, AstNode::ExpressionStmt { .. })));
            }
            other => panic!("expected function declaration, got {:?}", other),
        }
    }

    #[test]
    fn preprocessor_directives_are_ignored() {
        let program = parse_ok("#include <stdio.h>\nint x;");
        assert_eq!(program.items.len(), 1);
    }

    #[test]
    fn unterminated_construct_reports_eof() {
        let (_, diagnostics) = parse_source("int main() { if (x");
        assert!(diagnostics
            .iter()
            .any(|d| d.message.contains("end of input")));
    }

    #[test]
    fn do_while_requires_trailing_semicolon() {
        let program = parse_ok("void f() { do { x = x + 1; } while (x < 10); }");
        match &program.items[0] {
            AstNode::FunctionDecl { body, .. } => {
                assert!(matches!(
                    body.as_ref().unwrap()[0],
                    AstNode::DoWhile { .. }
                ));
            }
            other => panic!("expected function declaration, got {:?}", other),
        }
    }

    #[test]
    fn nested_initializer_lists() {
        let program = parse_ok("int grid[2][2] = {{1, 2}, {3, 4}};");
        match &program.items[0] {
            AstNode::VariableDecl { init, .. } => match init.as_deref() {
                Some(AstNode::InitializerList { elements, .. }) => {
                    assert_eq!(elements.len(), 2);
                    assert!(matches!(
                        elements[0],
                        AstNode::InitializerList { .. }
                    ));
                }
                other => panic!("expected initializer list, got {:?}", other),
            },
            other => panic!("expected variable declaration, got {:?}", other),
        }
    }
}
