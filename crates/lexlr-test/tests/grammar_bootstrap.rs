//! The textual grammar language is itself parsed by a `Syntax` built
//! through `LexiconBuilder`/`SyntacticBuilder` — the same builder surface
//! it compiles user grammars into. This exercises a representative slice
//! of the front-end's own constructs (a context-restricted terminal, an
//! annotation, an ignorable terminal, an unfold marker, and an optional
//! body symbol) described *through that front-end's own textual syntax*
//! and compiled all the way to a working parser, to show the front-end's
//! machinery holds up when used on itself and not just on toy grammars.
//!
//! `self_hosting_round_trip` below goes further and literally re-derives
//! the grammar-of-grammar's own full production set as text, parses that
//! text through `bootstrap_syntax()`, and compiles the result back into a
//! `Syntax` that accepts the same sample input `bootstrap_syntax()` does.
//! Two of `json_value`'s form labels and attribute names would collide
//! with the `TRUE`/`FALSE` keyword terminals if spelled `true`/`false`
//! (neither position can ever lex as `IDENT` then); `bootstrap.rs` and
//! `cst.rs` spell them `true_lit`/`false_lit` instead, which is what makes
//! this round trip possible at all.

use std::sync::Arc;

use lexlr_core::{Document, Journal};
use lexlr_grammar::bootstrap::bootstrap_syntax;
use lexlr_grammar::Grammar;
use lexlr_runtime::{Parser, ParserOptions};
use serde_json::Value;

const SOURCE: &str = r#"
lang: "stmt";
NUM<num_ctx> = /[0-9]+/ {prec: 1};
PLUS = /\+/;
SEMI = /;/;
SPACE? = /[ \t\n]+/;
expr.add -> expr@lhs PLUS@operator term@rhs;
expr -> ...term;
term -> ...factor;
factor -> NUM@value;
stmt -> expr@value SEMI?;
"#;

#[test]
fn context_list_and_annotation_survive_the_front_end_into_the_compiled_lexicon() {
  let grammar = Grammar::from_source(Document::create(SOURCE, None)).unwrap();
  let mut journal = Journal::new();
  let syntax = grammar.compile(&mut journal).unwrap();

  let lex = syntax.lex();
  let num_id = lex.term_id("NUM").unwrap();
  let num_ctx = lex.context_id("num_ctx").unwrap();
  assert!(lex.term(num_id).unwrap().entries.contains(&num_ctx));
  assert_eq!(lex.term(num_id).unwrap().attrs.get("prec"), Some(&Value::Number(1.into())));

  let space_id = lex.term_id("SPACE").unwrap();
  assert!(syntax.is_ignored(space_id));
}

#[test]
fn optional_body_symbol_expands_to_both_subsets_through_the_front_end() {
  let grammar = Grammar::from_source(Document::create(SOURCE, None)).unwrap();
  let mut journal = Journal::new();
  let syntax = Arc::new(grammar.compile(&mut journal).unwrap());

  let with_semi = Parser::new(syntax.clone()).parse(Document::create("1 + 2;", None), &ParserOptions::new());
  let without_semi = Parser::new(syntax).parse(Document::create("1 + 2", None), &ParserOptions::new());
  assert!(with_semi.is_ok());
  assert!(without_semi.is_ok());
}

#[test]
fn unfold_markers_parsed_from_text_flatten_intermediate_nodes_the_same_way_hand_built_ones_do() {
  let grammar = Grammar::from_source(Document::create(SOURCE, None)).unwrap();
  let mut journal = Journal::new();
  let syntax = Arc::new(grammar.compile(&mut journal).unwrap());
  let parser = Parser::new(syntax);

  let root = parser.parse(Document::create("1 + 2;", None), &ParserOptions::new()).unwrap();
  let stmt = root.content().unwrap();
  let expr = stmt.attr("value").unwrap();

  assert_eq!(expr.attr("operator").and_then(|o| o.text()).as_deref(), Some("+"));
  assert_eq!(expr.attr("lhs").and_then(|l| l.attr("value")).and_then(|v| v.text()).as_deref(), Some("1"));
  assert_eq!(expr.attr("rhs").and_then(|r| r.attr("value")).and_then(|v| v.text()).as_deref(), Some("2"));
}

/// The grammar-of-grammar's own textual self-description, re-derived by
/// hand from `bootstrap.rs`/`bootstrap_syntax()`. Every terminal and every
/// non-terminal formula there has exactly one line (or, where a head's
/// alternatives carry distinct form labels, one line per alternative) here.
const SELF_DESCRIPTION: &str = r#"
lang: "document";

WS? = /[ \t\r\n]+/;
COMMENT? = /#[^\n]*/;
ARROW = /->/;
DOTS = /\.\.\./;
DOT = /\./;
QUESTION = /\?/;
AT = /@/;
PIPE = /\|/;
COLON = /:/;
SEMI = /;/;
COMMA = /,/;
LANGLE = /</;
RANGLE = />/;
LBRACE = /\{/;
RBRACE = /\}/;
LBRACKET = /\[/;
RBRACKET = /\]/;
EQUALS = /=/;
PERCENT_EMPTY = /%empty/;
TRUE = /true/;
FALSE = /false/;
NUMBER = /[0-9]+/;
STRING = /"[^"\n]*"/;
REGEX = /([^\/\\\n]|\\.)*/;
IDENT = /[a-zA-Z_][a-zA-Z0-9_]*/;

document -> %empty | ...document decl@item;

decl.option -> ...option_decl;
decl.terminal -> ...terminal_decl;
decl.nonterminal -> ...nonterminal_decl;

option_decl -> IDENT@key COLON json_value@value SEMI;

json_value.string -> STRING@string;
json_value.number -> NUMBER@number;
json_value.true_lit -> TRUE@true_lit;
json_value.false_lit -> FALSE@false_lit;

terminal_decl -> IDENT@name context_list_opt@contexts question_opt@ignorable EQUALS REGEX@pattern annotation_list_opt@annotations SEMI;

context_list_opt.empty -> %empty;
context_list_opt.present -> LANGLE context_name_list@items RANGLE;

context_name_list -> IDENT@item | ...context_name_list COMMA IDENT@item;

question_opt.absent -> %empty;
question_opt.present -> QUESTION;

annotation_list_opt.empty -> %empty;
annotation_list_opt.present -> LBRACE annotation_list@items RBRACE;

annotation_list -> annotation@item | ...annotation_list COMMA annotation@item;

annotation -> IDENT@key COLON json_value@value;

nonterminal_decl -> IDENT@name form_opt@form ARROW alt_list@alts SEMI;

form_opt.absent -> %empty;
form_opt.present -> DOT IDENT@name;

alt_list -> alt@item | ...alt_list PIPE alt@item;

alt.empty -> PERCENT_EMPTY;
alt.body -> body_symbol_list@body;

body_symbol_list -> body_symbol@item | ...body_symbol_list body_symbol@item;

body_symbol.unfold -> DOTS IDENT@name;
body_symbol.plain -> IDENT@name question_opt@optional at_attr_opt@attr;

at_attr_opt.absent -> %empty;
at_attr_opt.present -> AT IDENT@name;
"#;

/// Testable Property 7: the grammar-of-grammar's own textual form round-trips
/// through `Grammar::from_source` back to an equivalent `Syntax` — one built
/// from text, accepted by a `Syntax` that was itself built from text, that
/// still accepts the same sample grammar `bootstrap_syntax()` does and
/// drives it to an equivalent `Grammar` value.
#[test]
fn self_hosting_round_trip() {
  let original = Arc::new(bootstrap_syntax().unwrap());

  let self_description_root =
    Parser::new(original.clone()).parse(Document::create(SELF_DESCRIPTION, None), &ParserOptions::new()).unwrap();
  let rebuilt_grammar = Grammar::from_ast(&self_description_root).unwrap();

  let mut journal = Journal::new();
  let rebuilt = Arc::new(rebuilt_grammar.compile(&mut journal).unwrap());

  assert_eq!(rebuilt.lex().terms().len(), original.lex().terms().len());
  for name in ["document", "decl", "nonterminal_decl", "body_symbol", "json_value"] {
    assert!(rebuilt.nonterminal_id(name).is_some(), "rebuilt syntax is missing `{name}`");
  }

  let expected = Grammar::from_ast(&Parser::new(original).parse(Document::create(SOURCE, None), &ParserOptions::new()).unwrap()).unwrap();
  let actual = Grammar::from_ast(&Parser::new(rebuilt).parse(Document::create(SOURCE, None), &ParserOptions::new()).unwrap()).unwrap();

  assert_eq!(expected.terminals.len(), actual.terminals.len());
  assert_eq!(
    expected.terminals.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
    actual.terminals.iter().map(|t| t.name.as_str()).collect::<Vec<_>>()
  );
  assert_eq!(expected.nonterminals.len(), actual.nonterminals.len());
  assert_eq!(expected.lang(), actual.lang());
}
