//! End-to-end parse of a tiny statement list grammar with an ignored
//! whitespace terminal, driven straight through `LexiconBuilder` /
//! `SyntacticBuilder` / `Parser` the way a library consumer would, with no
//! textual front-end involved.

use std::sync::Arc;

use lexlr_core::{Document, Journal, LexiconBuilder};
use lexlr_runtime::{Parser, ParserOptions};
use lexlr_syntax::SyntacticBuilder;

fn build_parser() -> Parser {
  let mut lex = LexiconBuilder::new("prog");
  lex.define("INT", "int", &[]).unwrap();
  lex.define("ID", r"[a-zA-Z_][a-zA-Z0-9_]*", &[]).unwrap();
  lex.define("SEMI", ";", &[]).unwrap();
  lex.define("EQ", "=", &[]).unwrap();
  lex.define("NUM", r"[0-9]+", &[]).unwrap();
  lex.define("SPACE", r"[ \t\n]+", &[]).unwrap();

  let mut journal = Journal::new();
  let lex = Arc::new(lex.build(&mut journal).unwrap());
  let mut b = SyntacticBuilder::new(lex);
  b.ignore("SPACE");

  // prog -> %empty | prog@... stmt@item
  b.formula("prog", None).unwrap().commit();
  b.formula("prog", None).unwrap().symbol("prog", Some("...")).symbol("stmt", Some("item")).commit();

  // stmt.decl      -> INT ID@name SEMI
  // stmt.decl_init -> INT ID@name EQ NUM@value SEMI
  b.formula("stmt", Some("decl")).unwrap().symbol("INT", None).symbol("ID", Some("name")).symbol("SEMI", None).commit();
  b.formula("stmt", Some("decl_init"))
    .unwrap()
    .symbol("INT", None)
    .symbol("ID", Some("name"))
    .symbol("EQ", None)
    .symbol("NUM", Some("value"))
    .symbol("SEMI", None)
    .commit();

  let syntax = b.build(&mut journal).unwrap();
  Parser::new(Arc::new(syntax))
}

#[test]
fn parses_two_statements_ignoring_surrounding_space() {
  let parser = build_parser();
  let root = parser.parse(Document::create("int x; int y = 1;", None), &ParserOptions::new()).unwrap();
  let content = root.content().unwrap();

  let stmts = content.attrs("item");
  assert_eq!(stmts.len(), 2);
  assert_eq!(stmts[0].attr("name").and_then(|n| n.text()).as_deref(), Some("x"));
  assert!(stmts[0].attr("value").is_none());
  assert_eq!(stmts[1].attr("name").and_then(|n| n.text()).as_deref(), Some("y"));
  assert_eq!(stmts[1].attr("value").and_then(|v| v.text()).as_deref(), Some("1"));
}

#[test]
fn empty_program_parses_to_no_statements() {
  let parser = build_parser();
  let root = parser.parse(Document::create("", None), &ParserOptions::new()).unwrap();
  let content = root.content().unwrap();
  assert!(content.attrs("item").is_empty());
}
