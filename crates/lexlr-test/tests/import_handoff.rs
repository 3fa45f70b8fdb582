//! Exercises `.import`/`ParserOptions::syntax`: a host grammar with a
//! cross-language import point, handed an external `Syntax` at parse time
//! rather than at build time.

use std::sync::Arc;

use lexlr_core::{Document, Journal, LexiconBuilder};
use lexlr_runtime::{Parser, ParserOptions};
use lexlr_syntax::{Syntax, SyntacticBuilder};

fn build_numbers_syntax() -> Syntax {
  // The lexicon's language name doubles as the syntax's start symbol name
  // (`SyntacticBuilder::new` augments from the lexicon's first context), so
  // this must match the top-level formula head below ("num"), not the
  // import binding name used by `.import("numbers", ..)` elsewhere.
  let mut lex = LexiconBuilder::new("num");
  lex.define("NUM", r"[0-9]+", &[]).unwrap();
  let mut journal = Journal::new();
  let lex = Arc::new(lex.build(&mut journal).unwrap());

  let mut b = SyntacticBuilder::new(lex);
  b.formula("num", None).unwrap().symbol("NUM", Some("value")).commit();
  b.build(&mut journal).unwrap()
}

fn build_host_parser() -> Parser {
  // No ignorable separator between `USE` and the import point: a state
  // with a pending `.import` hands its remaining input straight to the
  // external syntax without first running this syntax's own ignore
  // skipping, so the grammar is written to need none there.
  let mut lex = LexiconBuilder::new("doc");
  lex.define("USE", "use", &[]).unwrap();
  lex.define("SEMI", ";", &[]).unwrap();
  let mut journal = Journal::new();
  let lex = Arc::new(lex.build(&mut journal).unwrap());

  let mut b = SyntacticBuilder::new(lex);
  b.import("numbers", None).unwrap();

  // doc -> USE numbers@body SEMI
  b.formula("doc", None).unwrap().symbol("USE", None).symbol("numbers", Some("body")).symbol("SEMI", None).commit();

  let syntax = b.build(&mut journal).unwrap();
  Parser::new(Arc::new(syntax))
}

#[test]
fn import_point_hands_off_to_the_registered_external_syntax() {
  let parser = build_host_parser();
  let options = ParserOptions::new().syntax("numbers", Arc::new(build_numbers_syntax()));

  let root = parser.parse(Document::create("use42;", None), &options).unwrap();
  let content = root.content().unwrap();

  let body = content.attr("body").unwrap();
  assert_eq!(body.text().as_deref(), Some("42"));
  assert_eq!(body.attr("value").and_then(|v| v.text()).as_deref(), Some("42"));
}

#[test]
fn missing_external_syntax_is_reported_rather_than_a_generic_parse_failure() {
  let parser = build_host_parser();
  let err = parser.parse(Document::create("use42;", None), &ParserOptions::new()).unwrap_err();
  assert!(matches!(err, lexlr_runtime::ParseError::MissingImport { lang } if lang == "numbers"));
}
