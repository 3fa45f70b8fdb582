//! The in-memory `Grammar` value: the declarations a textual grammar
//! document parses into, and the `compile` step that drives
//! [`lexlr_core::LexiconBuilder`] / [`lexlr_syntax::SyntacticBuilder`] from
//! them exactly as a caller assembling a grammar by hand would.

use std::collections::BTreeMap;
use std::sync::Arc;

use lexlr_core::{Document, Journal, LexiconBuilder};
use lexlr_runtime::{Parser, ParserOptions, Root};
use lexlr_syntax::{Syntax, SyntacticBuilder};
use serde_json::Value;

use crate::bootstrap::bootstrap_syntax;
use crate::cst;
use crate::error::GrammarError;

/// One `NAME [<ctx…>] [?] = /regex/ [{attrs}]` declaration.
#[derive(Clone, Debug)]
pub struct TerminalDecl {
  pub name:      String,
  pub pattern:   String,
  pub contexts:  Vec<String>,
  pub ignorable: bool,
  pub attrs:     BTreeMap<String, Value>,
}

/// One body symbol of an alternative: `NAME`, `NAME?`, `NAME@attr`,
/// `NAME?@attr`, or (when `unfold` is set) `...NAME`.
#[derive(Clone, Debug)]
pub struct BodySymbolDecl {
  pub name:     String,
  pub optional: bool,
  pub unfold:   bool,
  pub attr:     Option<String>,
}

impl BodySymbolDecl {
  pub fn required(name: impl Into<String>) -> Self {
    Self { name: name.into(), optional: false, unfold: false, attr: None }
  }

  pub fn with_attr(name: impl Into<String>, attr: impl Into<String>) -> Self {
    Self { name: name.into(), optional: false, unfold: false, attr: Some(attr.into()) }
  }

  pub fn optional_with_attr(name: impl Into<String>, attr: impl Into<String>) -> Self {
    Self { name: name.into(), optional: true, unfold: false, attr: Some(attr.into()) }
  }

  pub fn unfolded(name: impl Into<String>) -> Self {
    Self { name: name.into(), optional: false, unfold: true, attr: Some("...".to_string()) }
  }
}

/// One `|`-separated alternative of a non-terminal. An empty `body` is
/// `%empty`.
#[derive(Clone, Debug, Default)]
pub struct AlternativeDecl {
  pub body: Vec<BodySymbolDecl>,
}

/// One `name[.form] -> alt1 | alt2 | … ;` declaration.
#[derive(Clone, Debug)]
pub struct NonterminalDecl {
  pub name:         String,
  pub form:         Option<String>,
  pub alternatives: Vec<AlternativeDecl>,
}

/// The whole parsed document: top-level `key: value` options plus every
/// terminal and non-terminal declaration, in source order.
#[derive(Clone, Debug, Default)]
pub struct Grammar {
  pub options:      BTreeMap<String, Value>,
  pub terminals:    Vec<TerminalDecl>,
  pub nonterminals: Vec<NonterminalDecl>,
}

impl Grammar {
  pub fn new() -> Self {
    Self::default()
  }

  /// Parses `document` as textual grammar source through the self-hosted
  /// front-end (the bootstrap syntax built in [`crate::bootstrap`]) and
  /// walks the resulting tree into a [`Grammar`].
  pub fn from_source(document: Document) -> Result<Grammar, GrammarError> {
    let syntax = Arc::new(bootstrap_syntax()?);
    let parser = Parser::new(syntax);
    let root = parser.parse(document, &ParserOptions::new()).map_err(|e| GrammarError::Parse(e.to_string()))?;
    Grammar::from_ast(&root)
  }

  /// Walks an already-parsed `document` tree (for instance one produced by a
  /// caller driving the bootstrap syntax directly) into a [`Grammar`].
  pub fn from_ast(root: &Root) -> Result<Grammar, GrammarError> {
    cst::walk(root)
  }

  /// The `lang: "<name>"` option, if set — names the lexicon's first
  /// (default) context and the augmented grammar's original start symbol.
  pub fn lang(&self) -> Option<&str> {
    self.options.get("lang").and_then(Value::as_str)
  }

  /// Drives [`LexiconBuilder`] and [`SyntacticBuilder`] from this value,
  /// exactly as §4.B/§4.D describe, and returns the built [`Syntax`].
  ///
  /// A body symbol marked `optional` expands its owning alternative into
  /// `2^k` productions — one per subset of the `k` optional symbols in
  /// that alternative present or absent — before any of them are handed to
  /// the syntactic builder, per §4.G.
  pub fn compile(&self, journal: &mut Journal) -> Result<Syntax, GrammarError> {
    let lang = self.lang().unwrap_or("grammar").to_string();
    let mut lex = LexiconBuilder::new(lang);

    for term in &self.terminals {
      let contexts: Vec<&str> = term.contexts.iter().map(String::as_str).collect();
      let id = lex.define(&term.name, &term.pattern, &contexts)?;
      for (key, value) in &term.attrs {
        lex.annotate(id, key, value.clone());
      }
    }

    let lex = Arc::new(lex.build(journal)?);
    let mut syn = SyntacticBuilder::new(lex);

    for term in &self.terminals {
      if term.ignorable {
        syn.ignore(&term.name);
      }
    }

    for decl in &self.nonterminals {
      for alt in &decl.alternatives {
        for expanded in expand_optional(&alt.body) {
          let mut fb = syn.formula(&decl.name, decl.form.as_deref())?;
          for bs in &expanded {
            fb = fb.symbol(&bs.name, bs.attr.as_deref());
          }
          fb.commit();
        }
      }
    }

    Ok(syn.build(journal)?)
  }
}

/// Expands `body`'s optional symbols into every subset (present/absent),
/// dropping the optional ones that are absent in a given expansion. A body
/// with `k` optional symbols yields `2^k` expansions; a body with none
/// yields exactly the original body unchanged.
fn expand_optional(body: &[BodySymbolDecl]) -> Vec<Vec<BodySymbolDecl>> {
  let optional_count = body.iter().filter(|bs| bs.optional).count();
  if optional_count == 0 {
    return vec![body.to_vec()];
  }

  let mut out = Vec::with_capacity(1 << optional_count);
  for mask in 0u32..(1 << optional_count) {
    let mut expansion = Vec::with_capacity(body.len());
    let mut bit = 0u32;
    for bs in body {
      if bs.optional {
        let present = (mask >> bit) & 1 == 1;
        bit += 1;
        if present {
          let mut kept = bs.clone();
          kept.optional = false;
          expansion.push(kept);
        }
      } else {
        expansion.push(bs.clone());
      }
    }
    out.push(expansion);
  }
  out
}
