//! The full pipeline: source text in, tokens, AST, and diagnostics out.

use serde::Serialize;

use crate::ast::Program;
use crate::diagnostics::Diagnostic;
use crate::lexer::{self, Token};
use crate::parser;
use crate::semantic;

/// Everything the front end learned about one source text. Diagnostics are
/// kept per phase, in the order each phase found them; the AST is present
/// whenever the parser salvaged anything at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub tokens: Vec<Token>,
    pub lexical_diagnostics: Vec<Diagnostic>,
    pub ast: Option<Program>,
    pub syntax_diagnostics: Vec<Diagnostic>,
    pub semantic_diagnostics: Vec<Diagnostic>,
}

impl AnalysisResult {
    /// True when no phase reported anything.
    pub fn is_clean(&self) -> bool {
        self.lexical_diagnostics.is_empty()
            && self.syntax_diagnostics.is_empty()
            && self.semantic_diagnostics.is_empty()
    }

    /// All diagnostics in phase order: lexical, then syntax, then semantic.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.lexical_diagnostics
            .iter()
            .chain(&self.syntax_diagnostics)
            .chain(&self.semantic_diagnostics)
    }
}

/// Run tokenizer, parser, and semantic analyzer over `source` in sequence.
/// Each stage is total: a failure in one produces diagnostics and a partial
/// result, and the later stages still run on whatever survived. The semantic
/// pass is skipped only when there is no AST to walk.
pub fn analyze(source: &str) -> AnalysisResult {
    let (tokens, lexical_diagnostics) = lexer::tokenize(source);
    log::debug!(
        "tokenized {} tokens with {} lexical diagnostics",
        tokens.len(),
        lexical_diagnostics.len()
    );

    let (ast, syntax_diagnostics) = parser::parse(tokens.clone());
    log::debug!(
        "parsed {} top-level items with {} syntax diagnostics",
        ast.as_ref().map_or(0, |p| p.items.len()),
        syntax_diagnostics.len()
    );

    let semantic_diagnostics = match &ast {
        Some(program) => semantic::check(program),
        None => Vec::new(),
    };
    log::debug!("{} semantic diagnostics", semantic_diagnostics.len());

    AnalysisResult {
        tokens,
        lexical_diagnostics,
        ast,
        syntax_diagnostics,
        semantic_diagnostics,
    }
}
