//! `lexlr`: a regex compiler, a multi-context lexicon builder, a canonical
//! LR(1) syntax builder, a thread-forking parser driver, and an attributed
//! AST — plus a self-hosted textual grammar front-end over all of it.
//!
//! This crate is a thin facade: it re-exports the public surface of its five
//! component crates and adds a couple of convenience entry points for the
//! common case of going straight from grammar text to a ready-to-use
//! [`Parser`].

pub use lexlr_core::{
  ContextId, Document, Journal, Lex, LexError, LexiconBuilder, Point, Regex, RegexError, RegexNode, Report,
  ReportEntry, Severity, SymbolId, TermDef, Timing, DEFAULT_CONTEXT, EOF_TERMINAL, ERROR_TERMINAL,
};
pub use lexlr_grammar::{AlternativeDecl, BodySymbolDecl, Grammar, GrammarError, NonterminalDecl, TerminalDecl};
pub use lexlr_runtime::{Ast, NtrmNode, ParseError, Parser, ParserOptions, Root, RootNode, StoreOptions, TermNode};
pub use lexlr_skeleton::{AttributeMap, AttributeShape, NonterminalShape, Skeleton};
pub use lexlr_syntax::{BodySymbol, Formula, ParserState, SyntacticBuilder, Syntax, SyntaxError};

/// Everything that can go wrong compiling grammar text straight through to a
/// ready [`Parser`]: either the front-end rejected the text, or the
/// resulting declarations failed to assemble into a conflict-free syntax.
#[derive(Clone, Debug)]
pub enum CompileError {
  Grammar(GrammarError),
}

impl std::fmt::Display for CompileError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      CompileError::Grammar(inner) => write!(f, "{inner}"),
    }
  }
}

impl std::error::Error for CompileError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      CompileError::Grammar(inner) => Some(inner),
    }
  }
}

impl From<GrammarError> for CompileError {
  fn from(value: GrammarError) -> Self {
    CompileError::Grammar(value)
  }
}

/// Compiles textual grammar source straight into a built [`Syntax`]: parses
/// it through the self-hosted front-end, then drives [`LexiconBuilder`] /
/// [`SyntacticBuilder`] from the resulting declarations.
pub fn compile_grammar(source: impl Into<String>, journal: &mut Journal) -> Result<Syntax, CompileError> {
  let grammar = Grammar::from_source(Document::create(source.into(), None))?;
  Ok(grammar.compile(journal)?)
}

/// Compiles textual grammar source into a [`Syntax`] and wraps it in a
/// ready-to-use [`Parser`], for callers that don't need the intermediate
/// [`Grammar`] or [`Syntax`] values.
pub fn build_parser(source: impl Into<String>, journal: &mut Journal) -> Result<Parser, CompileError> {
  let syntax = compile_grammar(source, journal)?;
  Ok(Parser::new(std::sync::Arc::new(syntax)))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn build_parser_compiles_and_parses_in_one_step() {
    let source = "lang: \"demo\";\nNUM = /[0-9]+/;\nWS = /[ \\t\\n]+/;\nnum -> NUM@value;\n";
    let mut journal = Journal::new();
    let parser = build_parser(source, &mut journal).unwrap();
    let root = parser.parse(Document::create("42", None), &ParserOptions::new()).unwrap();
    assert_eq!(root.content().unwrap().text().as_deref(), Some("42"));
  }
}
