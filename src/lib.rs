//! # Introduction
//!
//! cfront is a front end for a subset of C: it turns source text into a token
//! stream, a best-effort AST, and per-phase diagnostics that later stages
//! (interpretation, codegen, tooling) can build on.
//!
//! ## Analysis pipeline
//!
//! ```text
//! Source → Tokenizer → Parser → AST → Semantic Analyzer → AnalysisResult
//! ```
//!
//! 1. [`lexer`] — scans the source into classified [`lexer::Token`]s,
//!    reporting invalid characters and malformed literals without stopping.
//! 2. [`parser`] — recursive descent with precedence climbing; recovers from
//!    syntax errors in panic mode so one mistake never hides the rest of the
//!    program.
//! 3. [`semantic`] — single scoped walk over the AST catching
//!    redeclarations, undeclared uses, type mismatches, literal division by
//!    zero, and malformed array initializers.
//! 4. [`analysis`] — ties the three together behind [`analysis::analyze`],
//!    the one entry point callers need.
//!
//! Every stage is total: it always returns a result plus a diagnostic list,
//! never an early abort, so a broken program still yields tokens, a partial
//! AST, and the maximal set of findings in one pass.
//!
//! ## Supported C subset
//!
//! Types: `int`, `long`, `short`, `float`, `double`, `char`, `void`, structs,
//! pointers, fixed-size arrays.
//! Control flow: `if/else`, `while`, `do-while`, `for`, `switch/case`,
//! `break`, `continue`, `return`.
//! Preprocessor directives are tokenized but not expanded.

pub mod analysis;
pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod semantic;

pub use analysis::{analyze, AnalysisResult};
pub use diagnostics::{Diagnostic, Phase};
