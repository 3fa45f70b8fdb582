//! The runtime stage: drives a built [`lexlr_syntax::Syntax`] over a
//! [`lexlr_core::Document`], producing an attributed [`Ast`] tree.

pub mod ast;
pub mod config;
pub mod error;
pub mod parser;

pub use ast::{Ast, NtrmNode, Root, RootNode, StoreOptions, TermNode};
pub use config::ParserOptions;
pub use error::ParseError;
pub use parser::Parser;

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use lexlr_core::{Journal, LexiconBuilder};
  use lexlr_syntax::SyntacticBuilder;

  use super::*;

  fn build_simple() -> Arc<lexlr_syntax::Syntax> {
    let mut ljournal = Journal::new();
    // Lexicon name doubles as the syntax's start symbol (`SyntacticBuilder::new`
    // augments from the lexicon's first context), so it must match the
    // top-level formula head below ("pair").
    let mut lex = LexiconBuilder::new("pair");
    lex.define("A", "a", &[]).unwrap();
    lex.define("B", "b", &[]).unwrap();
    lex.define("WS", "[ \\t\\n]+", &[]).unwrap();
    let lex = Arc::new(lex.build(&mut ljournal).unwrap());

    let mut builder = SyntacticBuilder::new(lex);
    builder.ignore("WS");
    builder.formula("pair", None).unwrap().symbol("A", Some("left")).symbol("B", Some("right")).commit();
    let mut journal = Journal::new();
    Arc::new(builder.build(&mut journal).unwrap())
  }

  #[test]
  fn parses_minimal_sentence_and_builds_attributes() {
    let syntax = build_simple();
    let parser = Parser::new(syntax.clone());
    let root = parser.parse(lexlr_core::Document::create("a b", None), &ParserOptions::new()).unwrap();

    let content = root.content().unwrap();
    assert_eq!(content.symbol(), syntax.nonterminal_id("pair"));
    assert!(content.attr("left").is_some());
    assert!(content.attr("right").is_some());
    assert_eq!(content.text().as_deref(), Some("a b"));
  }

  #[test]
  fn ignored_whitespace_is_reattached_rather_than_dropped() {
    let syntax = build_simple();
    let parser = Parser::new(syntax);
    let root = parser.parse(lexlr_core::Document::create("a   b", None), &ParserOptions::new()).unwrap();
    assert_eq!(root.content().unwrap().text().as_deref(), Some("a   b"));
  }

  #[test]
  fn unparsable_input_reports_unexpected_token() {
    let syntax = build_simple();
    let parser = Parser::new(syntax);
    let err = parser.parse(lexlr_core::Document::create("a a", None), &ParserOptions::new()).unwrap_err();
    assert!(matches!(err, ParseError::UnexpectedToken { .. }));
  }
}
