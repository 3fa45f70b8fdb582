//! Confirms, at the public-API level, the pinned choice for the classic
//! dangling-else ambiguity: this implementation never special-cases it —
//! a grammar where `if EXPR stmt` and `if EXPR stmt else stmt` coexist is
//! rejected outright as a genuine shift/reduce conflict, and the grammar
//! author is expected to restructure it rather than rely on an implicit
//! shift-wins resolution.

use std::sync::Arc;

use lexlr_core::{Journal, LexiconBuilder};
use lexlr_syntax::{SyntacticBuilder, SyntaxError};

#[test]
fn dangling_else_is_rejected_as_a_shift_reduce_conflict() {
  let mut lex = LexiconBuilder::new("test");
  lex.define("IF", "if", &[]).unwrap();
  lex.define("ELSE", "else", &[]).unwrap();
  lex.define("EXPR", "e", &[]).unwrap();
  let mut journal = Journal::new();
  let lex = Arc::new(lex.build(&mut journal).unwrap());

  let mut b = SyntacticBuilder::new(lex);
  b.formula("test", None).unwrap().symbol("stmt", None).commit();
  b.formula("stmt", Some("plain")).unwrap().symbol("EXPR", None).commit();
  b.formula("stmt", Some("if")).unwrap().symbol("IF", None).symbol("EXPR", None).symbol("stmt", None).commit();
  b.formula("stmt", Some("if_else"))
    .unwrap()
    .symbol("IF", None)
    .symbol("EXPR", None)
    .symbol("stmt", None)
    .symbol("ELSE", None)
    .symbol("stmt", None)
    .commit();

  let err = b.build(&mut journal).unwrap_err();
  assert!(matches!(err, SyntaxError::ShiftReduceConflict { .. }));
}

#[test]
fn restructuring_the_grammar_to_bind_else_to_the_nearest_if_resolves_it() {
  // `stmt` after `if EXPR` is split into matched/unmatched forms so the
  // dangling `else` only ever attaches to the innermost open `if`.
  let mut lex = LexiconBuilder::new("test");
  lex.define("IF", "if", &[]).unwrap();
  lex.define("ELSE", "else", &[]).unwrap();
  lex.define("EXPR", "e", &[]).unwrap();
  let mut journal = Journal::new();
  let lex = Arc::new(lex.build(&mut journal).unwrap());

  let mut b = SyntacticBuilder::new(lex);
  b.formula("test", None).unwrap().symbol("stmt", None).commit();

  b.formula("stmt", None).unwrap().symbol("matched", None).commit();
  b.formula("stmt", None).unwrap().symbol("unmatched", None).commit();

  b.formula("matched", Some("plain")).unwrap().symbol("EXPR", None).commit();
  b.formula("matched", Some("if_else"))
    .unwrap()
    .symbol("IF", None)
    .symbol("EXPR", None)
    .symbol("matched", None)
    .symbol("ELSE", None)
    .symbol("matched", None)
    .commit();

  b.formula("unmatched", Some("if"))
    .unwrap()
    .symbol("IF", None)
    .symbol("EXPR", None)
    .symbol("stmt", None)
    .commit();
  b.formula("unmatched", Some("if_else"))
    .unwrap()
    .symbol("IF", None)
    .symbol("EXPR", None)
    .symbol("matched", None)
    .symbol("ELSE", None)
    .symbol("unmatched", None)
    .commit();

  assert!(b.build(&mut journal).is_ok());
}
