//! Walks a parsed `Root` (produced by the bootstrap syntax over a textual
//! grammar document) into a [`Grammar`] value, reading back the exact
//! attribute names `bootstrap.rs` assigned to each body symbol.
//!
//! `lexlr_runtime::Parser::reduce` already flattens every `attr = "..."`
//! unfold as it builds the tree — a left-recursive list production's
//! outermost node carries the *whole* accumulated list under its item
//! attribute, not a chain this walker needs to follow itself. So
//! `document.attrs("item")` is already every declaration in source order,
//! and a `decl` node already carries whichever of `option_decl` /
//! `terminal_decl` / `nonterminal_decl`'s attributes it unfolded directly on
//! itself.

use serde_json::Value;

use lexlr_runtime::{Ast, Root};

use crate::error::GrammarError;
use crate::grammar::{AlternativeDecl, BodySymbolDecl, Grammar, NonterminalDecl, TerminalDecl};

fn malformed(detail: impl Into<String>) -> GrammarError {
  GrammarError::MalformedCst { detail: detail.into() }
}

/// Walks `root`'s accepted `document` node into a [`Grammar`].
pub fn walk(root: &Root) -> Result<Grammar, GrammarError> {
  let content = root.content().ok_or_else(|| malformed("no content reduced (empty input?)"))?;
  let mut grammar = Grammar::new();
  for decl in content.attrs("item") {
    walk_decl(&decl, &mut grammar)?;
  }
  Ok(grammar)
}

/// Each `decl@item` node already carries its unfolded child's attributes
/// directly (option/terminal/nonterminal); tell them apart by which
/// attribute names are present, since each is its own production shape.
fn walk_decl(node: &Ast, grammar: &mut Grammar) -> Result<(), GrammarError> {
  if node.attr("pattern").is_some() {
    grammar.terminals.push(walk_terminal_decl(node)?);
    Ok(())
  } else if node.attr("alts").is_some() {
    grammar.nonterminals.push(walk_nonterminal_decl(node)?);
    Ok(())
  } else if node.attr("key").is_some() && node.attr("value").is_some() {
    let (key, value) = walk_option_decl(node)?;
    grammar.options.insert(key, value);
    Ok(())
  } else {
    Err(malformed("unrecognized declaration shape"))
  }
}

fn walk_option_decl(node: &Ast) -> Result<(String, Value), GrammarError> {
  let key = node.attr("key").and_then(|k| k.text()).ok_or_else(|| malformed("option_decl missing key"))?;
  let value_node = node.attr("value").ok_or_else(|| malformed("option_decl missing value"))?;
  Ok((key, walk_json_value(&value_node)?))
}

fn walk_json_value(node: &Ast) -> Result<Value, GrammarError> {
  if let Some(s) = node.attr("string") {
    let text = s.text().ok_or_else(|| malformed("string literal has no text"))?;
    return Ok(Value::String(unquote(&text)));
  }
  if let Some(n) = node.attr("number") {
    let text = n.text().ok_or_else(|| malformed("number literal has no text"))?;
    let parsed: i64 = text.parse().map_err(|_| malformed(format!("malformed number `{text}`")))?;
    return Ok(Value::Number(parsed.into()));
  }
  if node.attr("true_lit").is_some() {
    return Ok(Value::Bool(true));
  }
  if node.attr("false_lit").is_some() {
    return Ok(Value::Bool(false));
  }
  Err(malformed("unrecognized json_value shape"))
}

fn unquote(literal: &str) -> String {
  literal.strip_prefix('"').and_then(|s| s.strip_suffix('"')).unwrap_or(literal).to_string()
}

fn walk_terminal_decl(node: &Ast) -> Result<TerminalDecl, GrammarError> {
  let name = node.attr("name").and_then(|n| n.text()).ok_or_else(|| malformed("terminal_decl missing name"))?;
  let pattern_literal =
    node.attr("pattern").and_then(|p| p.text()).ok_or_else(|| malformed("terminal_decl missing pattern"))?;
  let pattern = pattern_literal.strip_prefix('/').and_then(|s| s.strip_suffix('/')).unwrap_or(&pattern_literal).to_string();

  // `question_opt` assigns no attribute of its own in either form; "present"
  // vs "absent" is distinguished by whether it covers any source text at all.
  let ignorable = node.attr("ignorable").map(|q| q.text().is_some()).unwrap_or(false);

  let mut contexts = Vec::new();
  if let Some(list_opt) = node.attr("contexts") {
    if let Some(items) = list_opt.attr("items") {
      for n in items.attrs("item") {
        contexts.push(n.text().ok_or_else(|| malformed("context name has no text"))?);
      }
    }
  }

  let mut attrs = std::collections::BTreeMap::new();
  if let Some(list_opt) = node.attr("annotations") {
    if let Some(items) = list_opt.attr("items") {
      for annotation in items.attrs("item") {
        let key = annotation.attr("key").and_then(|k| k.text()).ok_or_else(|| malformed("annotation missing key"))?;
        let value = annotation.attr("value").ok_or_else(|| malformed("annotation missing value"))?;
        attrs.insert(key, walk_json_value(&value)?);
      }
    }
  }

  Ok(TerminalDecl { name, pattern, contexts, ignorable, attrs })
}

fn walk_nonterminal_decl(node: &Ast) -> Result<NonterminalDecl, GrammarError> {
  let name = node.attr("name").and_then(|n| n.text()).ok_or_else(|| malformed("nonterminal_decl missing name"))?;
  let form = node.attr("form").and_then(|f| f.attr("name")).and_then(|n| n.text());

  let alts_root = node.attr("alts").ok_or_else(|| malformed("nonterminal_decl missing alts"))?;
  let alt_nodes = alts_root.attrs("item");

  let mut alternatives = Vec::with_capacity(alt_nodes.len());
  for alt in alt_nodes {
    alternatives.push(walk_alt(&alt)?);
  }

  Ok(NonterminalDecl { name, form, alternatives })
}

fn walk_alt(node: &Ast) -> Result<AlternativeDecl, GrammarError> {
  let Some(body_root) = node.attr("body") else {
    return Ok(AlternativeDecl::default());
  };
  let body_nodes = body_root.attrs("item");

  let mut body = Vec::with_capacity(body_nodes.len());
  for bs in body_nodes {
    body.push(walk_body_symbol(&bs)?);
  }
  Ok(AlternativeDecl { body })
}

fn walk_body_symbol(node: &Ast) -> Result<BodySymbolDecl, GrammarError> {
  let name = node.attr("name").and_then(|n| n.text()).ok_or_else(|| malformed("body_symbol missing name"))?;

  if node.attr("optional").is_none() {
    // `...NAME` form: unconditionally unfolded, never optional.
    return Ok(BodySymbolDecl::unfolded(name));
  }

  let optional = node.attr("optional").map(|q| q.text().is_some()).unwrap_or(false);
  let attr = node.attr("attr").and_then(|a| a.attr("name")).and_then(|n| n.text());

  Ok(BodySymbolDecl { name, optional, unfold: false, attr })
}
