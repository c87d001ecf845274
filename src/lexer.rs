//! Lexer (tokenizer) for C-subset source code.
//!
//! Converts raw source text into a flat [`Token`] stream plus a list of
//! lexical diagnostics. Scanning is total: unrecognized characters become
//! [`TokenKind::Error`] tokens and scanning continues, so the parser always
//! receives a complete stream ending in [`TokenKind::EndOfFile`].
//!
//! Preprocessor directives are tokenized as opaque [`TokenKind::PreprocessorDirective`]
//! lexemes rather than expanded, matching the no-preprocessor policy.

use crate::diagnostics::{Diagnostic, LexicalError};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

/// Token classification. Closed set; every lexeme the scanner produces maps
/// to exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    Keyword,
    ControlFlow,
    StandardLibraryIdentifier,
    Identifier,
    Number,
    String,
    CharLiteral,
    Operator,
    Symbol,
    PreprocessorDirective,
    Error,
    EndOfFile,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Keyword => write!(f, "keyword"),
            TokenKind::ControlFlow => write!(f, "control-flow keyword"),
            TokenKind::StandardLibraryIdentifier => write!(f, "standard library identifier"),
            TokenKind::Identifier => write!(f, "identifier"),
            TokenKind::Number => write!(f, "number"),
            TokenKind::String => write!(f, "string literal"),
            TokenKind::CharLiteral => write!(f, "char literal"),
            TokenKind::Operator => write!(f, "operator"),
            TokenKind::Symbol => write!(f, "symbol"),
            TokenKind::PreprocessorDirective => write!(f, "preprocessor directive"),
            TokenKind::Error => write!(f, "invalid token"),
            TokenKind::EndOfFile => write!(f, "end of file"),
        }
    }
}

/// A classified minimal unit of source text. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            line,
        }
    }

    /// Human-readable description for syntax diagnostics.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::EndOfFile => "end of file".to_string(),
            _ => format!("'{}'", self.lexeme),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<30} {:<28} {}", self.lexeme, self.kind.to_string(), self.line)
    }
}

/// The C keyword table.
pub static KEYWORDS: LazyLock<FxHashSet<&'static str>> = LazyLock::new(|| {
    [
        "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
        "enum", "extern", "float", "for", "goto", "if", "int", "long", "register", "return",
        "short", "signed", "sizeof", "static", "struct", "switch", "typedef", "union", "unsigned",
        "void", "volatile", "while",
    ]
    .into_iter()
    .collect()
});

/// Keywords that govern control structures; classified ahead of the general
/// keyword table.
pub static CONTROL_FLOW: LazyLock<FxHashSet<&'static str>> =
    LazyLock::new(|| ["if", "else", "switch", "case", "for", "while", "do"].into_iter().collect());

/// Well-known standard library function names.
pub static STANDARD_LIBRARY: LazyLock<FxHashSet<&'static str>> = LazyLock::new(|| {
    [
        "main", "printf", "scanf", "puts", "gets", "malloc", "calloc", "free", "exit", "strlen",
        "strcpy", "strncpy", "strcmp", "strcat", "fopen", "fclose", "fread", "fwrite", "fseek",
        "ftell", "rewind", "feof", "fgetc", "fputc", "fgets", "fputs", "getchar", "putchar",
        "perror", "atoi", "atof", "atol", "toupper", "tolower",
    ]
    .into_iter()
    .collect()
});

/// Two-character operators, tried before the one-character set (maximal munch).
const TWO_CHAR_OPERATORS: &[&str] = &[
    "++", "--", "+=", "-=", "*=", "/=", "%=", "==", "!=", "<=", ">=", "&&", "||", "->",
];

const ONE_CHAR_OPERATORS: &[char] = &['+', '-', '*', '/', '%', '=', '<', '>', '!', '~', '&', '.', '?'];

const SYMBOLS: &[char] = &[';', ',', '(', ')', '{', '}', '[', ']', ':'];

/// Tokenize the entire input. Returns the token stream (always terminated by
/// an [`TokenKind::EndOfFile`] token) and any lexical diagnostics.
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    Lexer::new(source).run()
}

/// Scanner with a single forward cursor and one-character lookahead.
struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    tokens: Vec<Token>,
    diagnostics: Vec<Diagnostic>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            input: source.chars().collect(),
            position: 0,
            line: 1,
            tokens: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn run(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
                continue;
            }

            if ch == '/' && self.peek_ahead(1) == Some('/') {
                self.skip_line_comment();
                continue;
            }

            // An unterminated block comment runs to end of input without a
            // diagnostic; lenient on purpose.
            if ch == '/' && self.peek_ahead(1) == Some('*') {
                self.skip_block_comment();
                continue;
            }

            if ch == '#' {
                self.preprocessor_directive();
                continue;
            }

            if ch.is_ascii_alphabetic() || ch == '_' {
                self.identifier_or_keyword();
                continue;
            }

            if ch.is_ascii_digit() {
                self.number();
                continue;
            }

            if ch == '"' {
                self.string_literal();
                continue;
            }

            if ch == '\'' {
                self.char_literal();
                continue;
            }

            self.operator_or_symbol(ch);
        }

        self.tokens.push(Token::new(TokenKind::EndOfFile, "", self.line));
        (self.tokens, self.diagnostics)
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) {
        self.advance(); // '/'
        self.advance(); // '*'
        while let Some(ch) = self.peek() {
            if ch == '*' && self.peek_ahead(1) == Some('/') {
                self.advance();
                self.advance();
                return;
            }
            self.advance();
        }
    }

    /// Consume `#...` to end of line, or to the point a comment begins on the
    /// same line.
    fn preprocessor_directive(&mut self) {
        let line = self.line;
        let mut lexeme = String::new();

        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            if ch == '/' && matches!(self.peek_ahead(1), Some('/') | Some('*')) {
                break;
            }
            lexeme.push(ch);
            self.advance();
        }

        let lexeme = lexeme.trim_end().to_string();
        self.tokens.push(Token::new(TokenKind::PreprocessorDirective, lexeme, line));
    }

    fn identifier_or_keyword(&mut self) {
        let line = self.line;
        let mut lexeme = String::new();

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                lexeme.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        // Control-flow first: those keywords get the more specific class.
        let kind = if CONTROL_FLOW.contains(lexeme.as_str()) {
            TokenKind::ControlFlow
        } else if KEYWORDS.contains(lexeme.as_str()) {
            TokenKind::Keyword
        } else if STANDARD_LIBRARY.contains(lexeme.as_str()) {
            TokenKind::StandardLibraryIdentifier
        } else {
            TokenKind::Identifier
        };

        self.tokens.push(Token::new(kind, lexeme, line));
    }

    /// Digits with at most one dot. A second dot terminates the number; the
    /// remainder starts a new token.
    fn number(&mut self) {
        let line = self.line;
        let mut lexeme = String::new();
        let mut seen_dot = false;

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                lexeme.push(ch);
                self.advance();
            } else if ch == '.' && !seen_dot {
                seen_dot = true;
                lexeme.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        self.tokens.push(Token::new(TokenKind::Number, lexeme, line));
    }

    /// Consume to the first unescaped `"`. Only `\"` unescapes; other
    /// backslash pairs are kept verbatim. An unterminated string yields an
    /// `Error` token and a diagnostic.
    fn string_literal(&mut self) {
        let line = self.line;
        let mut lexeme = String::new();
        self.advance(); // opening quote

        while let Some(ch) = self.peek() {
            if ch == '"' {
                self.advance();
                self.tokens.push(Token::new(TokenKind::String, lexeme, line));
                return;
            }
            if ch == '\\' && self.peek_ahead(1) == Some('"') {
                lexeme.push('"');
                self.advance();
                self.advance();
            } else {
                lexeme.push(ch);
                self.advance();
            }
        }

        self.diagnostics.push(LexicalError::UnterminatedString.at(line));
        self.tokens.push(Token::new(TokenKind::Error, lexeme, line));
    }

    /// `'c'` or `'\x'`; anything not closed by `'` right after the content
    /// yields an `Error` token and a diagnostic.
    fn char_literal(&mut self) {
        let line = self.line;
        let mut lexeme = String::new();
        self.advance(); // opening quote

        match self.peek() {
            Some('\\') => {
                lexeme.push('\\');
                self.advance();
                if let Some(ch) = self.peek() {
                    lexeme.push(ch);
                    self.advance();
                }
            }
            Some(ch) => {
                lexeme.push(ch);
                self.advance();
            }
            None => {}
        }

        if self.peek() == Some('\'') {
            self.advance();
            self.tokens.push(Token::new(TokenKind::CharLiteral, lexeme, line));
        } else {
            self.diagnostics
                .push(LexicalError::MalformedCharLiteral(lexeme.clone()).at(line));
            self.tokens.push(Token::new(TokenKind::Error, lexeme, line));
        }
    }

    fn operator_or_symbol(&mut self, ch: char) {
        let line = self.line;

        if let Some(next) = self.peek_ahead(1) {
            let combined: String = [ch, next].iter().collect();
            if TWO_CHAR_OPERATORS.contains(&combined.as_str()) {
                self.advance();
                self.advance();
                self.tokens.push(Token::new(TokenKind::Operator, combined, line));
                return;
            }
        }

        if ONE_CHAR_OPERATORS.contains(&ch) {
            self.advance();
            self.tokens.push(Token::new(TokenKind::Operator, ch, line));
            return;
        }

        if SYMBOLS.contains(&ch) {
            self.advance();
            self.tokens.push(Token::new(TokenKind::Symbol, ch, line));
            return;
        }

        self.advance();
        self.diagnostics.push(LexicalError::InvalidCharacter(ch).at(line));
        self.tokens.push(Token::new(TokenKind::Error, ch, line));
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.input.get(self.position).copied()?;
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }
}
