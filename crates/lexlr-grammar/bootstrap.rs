//! The grammar-of-grammar: the `Lex` and `Syntax` that recognize this
//! crate's own textual front-end. Assembled through the same
//! [`LexiconBuilder`] / [`SyntacticBuilder`] APIs a consumer of this crate
//! would use, rather than a hand-transcribed DFA/LALR table — the bootstrap
//! property is that this front-end is itself describable through the
//! builder surface it compiles user grammars into, not that its table was
//! typed in by hand.
//!
//! Left recursion plus an `unfold("...")` marker on the recursive symbol is
//! used throughout to accumulate lists (declarations, context names,
//! annotations, alternatives, body symbols) without a dedicated "repeat"
//! operator in the syntactic builder, the same pattern `lexlr_runtime`'s
//! `reduce` step already relies on for merging a child's attribute map into
//! its parent.

use std::sync::Arc;

use lexlr_core::{Journal, Lex, LexiconBuilder};
use lexlr_syntax::{Syntax, SyntacticBuilder};

use crate::error::GrammarError;

const WS: &str = r"[ \t\r\n]+";
const COMMENT: &str = r"#[^\n]*";
const IDENT: &str = r"[a-zA-Z_][a-zA-Z0-9_]*";
const REGEX_LIT: &str = r"/([^/\\\n]|\\.)*/";
const STRING_LIT: &str = r#""[^"\n]*""#;
const NUMBER: &str = r"[0-9]+";

/// Builds the grammar-of-grammar's lexicon: punctuation, keywords, and the
/// four literal classes (identifier, regex, string, number).
pub fn bootstrap_lex() -> Result<Lex, GrammarError> {
  let mut journal = Journal::new();
  // `SyntacticBuilder::new` seeds the augmented start production from the
  // lexicon's first (default) context name, so this must match the actual
  // top-level rule declared below ("document"), not just the language label.
  let mut lex = LexiconBuilder::new("document");

  lex.define("WS", WS, &[])?;
  lex.define("COMMENT", COMMENT, &[])?;

  lex.define("ARROW", "->", &[])?;
  lex.define("DOTS", r"\.\.\.", &[])?;
  lex.define("DOT", r"\.", &[])?;
  lex.define("QUESTION", r"\?", &[])?;
  lex.define("AT", "@", &[])?;
  lex.define("PIPE", r"\|", &[])?;
  lex.define("COLON", ":", &[])?;
  lex.define("SEMI", ";", &[])?;
  lex.define("COMMA", ",", &[])?;
  lex.define("LANGLE", "<", &[])?;
  lex.define("RANGLE", ">", &[])?;
  lex.define("LBRACE", r"\{", &[])?;
  lex.define("RBRACE", r"\}", &[])?;
  lex.define("LBRACKET", r"\[", &[])?;
  lex.define("RBRACKET", r"\]", &[])?;
  lex.define("EQUALS", "=", &[])?;
  lex.define("PERCENT_EMPTY", "%empty", &[])?;

  lex.define("TRUE", "true", &[])?;
  lex.define("FALSE", "false", &[])?;

  lex.define("NUMBER", NUMBER, &[])?;
  lex.define("STRING", STRING_LIT, &[])?;
  lex.define("REGEX", REGEX_LIT, &[])?;
  // IDENT declared last among overlapping patterns: keywords above share its
  // byte-prefix, but `lex.rs`'s smallest-terminal-id-wins tie-break means
  // every keyword must be defined, and thus assigned its id, before IDENT.
  lex.define("IDENT", IDENT, &[])?;

  lex.build(&mut journal).map_err(GrammarError::from)
}

/// Builds the grammar-of-grammar's syntax over [`bootstrap_lex`]'s
/// terminals. Attribute names mirror the field names `cst.rs` reads back
/// off the parsed tree.
pub fn bootstrap_syntax() -> Result<Syntax, GrammarError> {
  let lex = Arc::new(bootstrap_lex()?);
  let mut b = SyntacticBuilder::new(lex);

  b.ignore("WS");
  b.ignore("COMMENT");

  // document -> %empty | document@... decl@item
  b.formula("document", None)?.commit();
  b.formula("document", None)?.symbol("document", Some("...")).symbol("decl", Some("item")).commit();

  // decl -> option_decl@... | terminal_decl@... | nonterminal_decl@...
  b.formula("decl", Some("option"))?.symbol("option_decl", Some("...")).commit();
  b.formula("decl", Some("terminal"))?.symbol("terminal_decl", Some("...")).commit();
  b.formula("decl", Some("nonterminal"))?.symbol("nonterminal_decl", Some("...")).commit();

  // option_decl -> IDENT@key COLON json_value@value SEMI
  b.formula("option_decl", None)?
    .symbol("IDENT", Some("key"))
    .symbol("COLON", None)
    .symbol("json_value", Some("value"))
    .symbol("SEMI", None)
    .commit();

  // json_value -> STRING@string | NUMBER@number | TRUE@true_lit | FALSE@false_lit
  //
  // The form label and attribute name both need to be spellable as an IDENT
  // token in this grammar's own text (`.true_lit`, `@true_lit`); the literal
  // text `true`/`false` always lexes as the TRUE/FALSE keyword terminal
  // instead, never IDENT, so neither position can use the bare word.
  b.formula("json_value", Some("string"))?.symbol("STRING", Some("string")).commit();
  b.formula("json_value", Some("number"))?.symbol("NUMBER", Some("number")).commit();
  b.formula("json_value", Some("true_lit"))?.symbol("TRUE", Some("true_lit")).commit();
  b.formula("json_value", Some("false_lit"))?.symbol("FALSE", Some("false_lit")).commit();

  // terminal_decl -> IDENT@name context_list_opt@contexts question_opt@ignorable
  //                  EQUALS REGEX@pattern annotation_list_opt@annotations SEMI
  b.formula("terminal_decl", None)?
    .symbol("IDENT", Some("name"))
    .symbol("context_list_opt", Some("contexts"))
    .symbol("question_opt", Some("ignorable"))
    .symbol("EQUALS", None)
    .symbol("REGEX", Some("pattern"))
    .symbol("annotation_list_opt", Some("annotations"))
    .symbol("SEMI", None)
    .commit();

  // context_list_opt -> %empty | LANGLE context_name_list@items RANGLE
  b.formula("context_list_opt", Some("empty"))?.commit();
  b.formula("context_list_opt", Some("present"))?
    .symbol("LANGLE", None)
    .symbol("context_name_list", Some("items"))
    .symbol("RANGLE", None)
    .commit();

  // context_name_list -> IDENT@item | context_name_list@... COMMA IDENT@item
  b.formula("context_name_list", None)?.symbol("IDENT", Some("item")).commit();
  b.formula("context_name_list", None)?
    .symbol("context_name_list", Some("..."))
    .symbol("COMMA", None)
    .symbol("IDENT", Some("item"))
    .commit();

  // question_opt -> %empty | QUESTION
  b.formula("question_opt", Some("absent"))?.commit();
  b.formula("question_opt", Some("present"))?.symbol("QUESTION", None).commit();

  // annotation_list_opt -> %empty | LBRACE annotation_list@items RBRACE
  b.formula("annotation_list_opt", Some("empty"))?.commit();
  b.formula("annotation_list_opt", Some("present"))?
    .symbol("LBRACE", None)
    .symbol("annotation_list", Some("items"))
    .symbol("RBRACE", None)
    .commit();

  // annotation_list -> annotation@item | annotation_list@... COMMA annotation@item
  b.formula("annotation_list", None)?.symbol("annotation", Some("item")).commit();
  b.formula("annotation_list", None)?
    .symbol("annotation_list", Some("..."))
    .symbol("COMMA", None)
    .symbol("annotation", Some("item"))
    .commit();

  // annotation -> IDENT@key COLON json_value@value
  b.formula("annotation", None)?
    .symbol("IDENT", Some("key"))
    .symbol("COLON", None)
    .symbol("json_value", Some("value"))
    .commit();

  // nonterminal_decl -> IDENT@name form_opt@form ARROW alt_list@alts SEMI
  b.formula("nonterminal_decl", None)?
    .symbol("IDENT", Some("name"))
    .symbol("form_opt", Some("form"))
    .symbol("ARROW", None)
    .symbol("alt_list", Some("alts"))
    .symbol("SEMI", None)
    .commit();

  // form_opt -> %empty | DOT IDENT@name
  b.formula("form_opt", Some("absent"))?.commit();
  b.formula("form_opt", Some("present"))?.symbol("DOT", None).symbol("IDENT", Some("name")).commit();

  // alt_list -> alt@item | alt_list@... PIPE alt@item
  b.formula("alt_list", None)?.symbol("alt", Some("item")).commit();
  b.formula("alt_list", None)?.symbol("alt_list", Some("...")).symbol("PIPE", None).symbol("alt", Some("item")).commit();

  // alt -> PERCENT_EMPTY | body_symbol_list@body
  b.formula("alt", Some("empty"))?.symbol("PERCENT_EMPTY", None).commit();
  b.formula("alt", Some("body"))?.symbol("body_symbol_list", Some("body")).commit();

  // body_symbol_list -> body_symbol@item | body_symbol_list@... body_symbol@item
  b.formula("body_symbol_list", None)?.symbol("body_symbol", Some("item")).commit();
  b.formula("body_symbol_list", None)?
    .symbol("body_symbol_list", Some("..."))
    .symbol("body_symbol", Some("item"))
    .commit();

  // body_symbol -> DOTS IDENT@name
  //              | IDENT@name question_opt@optional at_attr_opt@attr
  b.formula("body_symbol", Some("unfold"))?.symbol("DOTS", None).symbol("IDENT", Some("name")).commit();
  b.formula("body_symbol", Some("plain"))?
    .symbol("IDENT", Some("name"))
    .symbol("question_opt", Some("optional"))
    .symbol("at_attr_opt", Some("attr"))
    .commit();

  // at_attr_opt -> %empty | AT IDENT@name
  b.formula("at_attr_opt", Some("absent"))?.commit();
  b.formula("at_attr_opt", Some("present"))?.symbol("AT", None).symbol("IDENT", Some("name")).commit();

  let mut journal = Journal::new();
  b.build(&mut journal).map_err(GrammarError::from)
}
