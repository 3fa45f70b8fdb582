//! A keyword that only exists in one lexical context collides, by text,
//! with an identifier that is legal everywhere. At a parser state whose
//! legal next terminals span both contexts, the driver scans under every
//! context in play and forks a thread per distinct result — never on
//! grammar ambiguity itself, only on this kind of scan disagreement.

use std::sync::Arc;

use lexlr_core::{Document, Journal, LexiconBuilder};
use lexlr_runtime::{Parser, ParserOptions};
use lexlr_syntax::SyntacticBuilder;

fn build_parser() -> Parser {
  let mut lex = LexiconBuilder::new("test");
  // Declared before IDENT so a tie inside the `control` context (where
  // both patterns are live) resolves to the keyword, per smallest-id wins.
  lex.define("KEYWORD_FOR", "for", &["control"]).unwrap();
  lex.define("IDENT", r"[a-zA-Z_][a-zA-Z0-9_]*", &[]).unwrap();
  lex.define("SEMI", ";", &[]).unwrap();
  lex.define("SPACE", r"[ \t\n]+", &[]).unwrap();

  let mut journal = Journal::new();
  let lex = Arc::new(lex.build(&mut journal).unwrap());
  let mut b = SyntacticBuilder::new(lex);
  b.ignore("SPACE");

  b.formula("test", None).unwrap().commit();
  b.formula("test", None).unwrap().symbol("test", Some("...")).symbol("stmt", Some("item")).commit();

  b.formula("stmt", Some("loop"))
    .unwrap()
    .symbol("KEYWORD_FOR", None)
    .symbol("IDENT", Some("var"))
    .symbol("SEMI", None)
    .commit();
  b.formula("stmt", Some("expr")).unwrap().symbol("IDENT", Some("name")).symbol("SEMI", None).commit();

  let syntax = b.build(&mut journal).unwrap();
  Parser::new(Arc::new(syntax))
}

#[test]
fn state_with_both_contexts_in_play_forks_on_the_literal_keyword() {
  let parser = build_parser();
  let root = parser.parse(Document::create("for i; x;", None), &ParserOptions::new()).unwrap();
  let content = root.content().unwrap();

  let stmts = content.attrs("item");
  assert_eq!(stmts.len(), 2);

  assert_eq!(stmts[0].attr("var").and_then(|v| v.text()).as_deref(), Some("i"));
  assert!(stmts[0].attr("name").is_none());

  assert_eq!(stmts[1].attr("name").and_then(|n| n.text()).as_deref(), Some("x"));
  assert!(stmts[1].attr("var").is_none());
}

#[test]
fn the_fork_point_really_does_have_both_contexts_in_scope() {
  let parser = build_parser();
  let syntax = parser.syntax();
  let lex = syntax.lex();
  let control = lex.context_id("control").unwrap();
  let default = lexlr_core::DEFAULT_CONTEXT;

  let state0 = syntax.state(0);
  assert!(state0.contexts.contains(&control));
  assert!(state0.contexts.contains(&default));
}

#[test]
fn an_identifier_that_is_not_the_keyword_text_never_forks() {
  // "x" only ever lexes as IDENT in both contexts, so no fork is needed —
  // only literal `for` triggers the scan disagreement.
  let parser = build_parser();
  let root = parser.parse(Document::create("x;", None), &ParserOptions::new()).unwrap();
  let content = root.content().unwrap();
  let stmts = content.attrs("item");
  assert_eq!(stmts.len(), 1);
  assert_eq!(stmts[0].attr("name").and_then(|n| n.text()).as_deref(), Some("x"));
}
