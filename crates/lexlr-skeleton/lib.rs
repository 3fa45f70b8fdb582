//! Per-non-terminal attribute shape analysis.
//!
//! Given a built [`Syntax`], derive the static "shape" of each non-terminal's
//! attribute map: which attribute names its productions can assign, which
//! symbols can show up under each name, whether a name is always present
//! and always singular. This is purely analytical — it never touches source
//! text or drives parsing — and exists so a downstream renderer (see
//! `lexlr_runtime::ast::Ast::store`) can decide whether to emit a scalar or
//! a list for an attribute that happens to have exactly one child in a
//! particular tree.

use std::collections::{BTreeMap, BTreeSet};

use lexlr_core::SymbolId;
use lexlr_syntax::Syntax;

/// The shape of a single attribute name within a non-terminal (or a single
/// named form of one): which symbols can be bound under this name, whether
/// every production assigns it exactly once, and whether some production
/// leaves it unset entirely.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributeShape {
  pub candidates:    BTreeSet<SymbolId>,
  pub single_valued: bool,
  pub optional:      bool,
}

impl AttributeShape {
  fn merge(&mut self, other: &AttributeShape) {
    self.candidates.extend(other.candidates.iter().copied());
    self.single_valued = self.single_valued && other.single_valued;
    self.optional = self.optional || other.optional;
  }
}

/// Map from attribute name to its shape, shared by the per-form and
/// aggregate (whole non-terminal) views.
pub type AttributeMap = BTreeMap<String, AttributeShape>;

/// The full shape of one non-terminal: its aggregate attribute map plus a
/// breakdown per named `form`.
#[derive(Clone, Debug, Default)]
pub struct NonterminalShape {
  pub attributes: AttributeMap,
  pub forms:      BTreeMap<String, AttributeMap>,
}

/// The result of analyzing a [`Syntax`]: per-non-terminal shapes, the
/// "common" shape shared across every named form, an unfold-projection
/// equivalence map, and the set of non-terminals stripped as unreachable
/// attribute intermediates.
#[derive(Clone, Debug, Default)]
pub struct Skeleton {
  shapes:       BTreeMap<SymbolId, NonterminalShape>,
  common:       BTreeMap<SymbolId, AttributeMap>,
  equivalence:  BTreeMap<SymbolId, SymbolId>,
  intermediate: BTreeSet<SymbolId>,
}

impl Skeleton {
  pub fn shape(&self, nonterminal: SymbolId) -> Option<&NonterminalShape> {
    self.shapes.get(&nonterminal)
  }

  pub fn common(&self, nonterminal: SymbolId) -> Option<&AttributeMap> {
    self.common.get(&nonterminal)
  }

  /// Is `attr` on `nonterminal` always exactly one child (never zero, never
  /// more than one) across every production that assigns it?
  pub fn is_single_valued(&self, nonterminal: SymbolId, attr: &str) -> bool {
    self
      .shapes
      .get(&nonterminal)
      .and_then(|s| s.attributes.get(attr))
      .map(|a| a.single_valued && !a.optional)
      .unwrap_or(false)
  }

  /// The non-terminal that `nonterminal` unfold-projects onto, if any.
  pub fn unfolds_to(&self, nonterminal: SymbolId) -> Option<SymbolId> {
    self.equivalence.get(&nonterminal).copied()
  }

  /// Every non-terminal that unfold-projects onto `child` — the
  /// equivalence class `child` anchors.
  pub fn equivalent_to(&self, child: SymbolId) -> Vec<SymbolId> {
    self.equivalence.iter().filter(|(_, v)| **v == child).map(|(k, _)| *k).collect()
  }

  pub fn is_intermediate(&self, nonterminal: SymbolId) -> bool {
    self.intermediate.contains(&nonterminal)
  }

  pub fn intermediates(&self) -> &BTreeSet<SymbolId> {
    &self.intermediate
  }

  /// Runs the full analysis described in the component design: per-head
  /// attribute collection, per-form grouping, unfold propagation,
  /// equivalence-class detection, common-shape intersection, and
  /// intermediate stripping.
  pub fn build(syntax: &Syntax) -> Skeleton {
    let mut shapes: BTreeMap<SymbolId, NonterminalShape> = BTreeMap::new();
    let mut unfold_target: BTreeMap<SymbolId, SymbolId> = BTreeMap::new();

    for (idx, formula) in syntax.productions().iter().enumerate() {
      let shape = shapes.entry(formula.head).or_default();

      let mut local: AttributeMap = BTreeMap::new();
      for bs in &formula.body {
        let Some(attr) = &bs.attr else { continue };
        if attr == "..." {
          unfold_target.entry(formula.head).or_insert(bs.symbol);
          continue;
        }
        let entry = local.entry(attr.clone()).or_insert_with(|| AttributeShape {
          candidates:    BTreeSet::new(),
          single_valued: true,
          optional:      false,
        });
        if !entry.candidates.is_empty() {
          // A second body symbol assigns the same name in this production:
          // never single-valued.
          entry.single_valued = false;
        }
        entry.candidates.insert(bs.symbol);
      }

      merge_attrs(&mut shape.attributes, &local, false);
      if let Some(form) = &formula.form {
        let form_map = shape.forms.entry(form.clone()).or_default();
        merge_attrs(form_map, &local, false);
      }

      let _ = idx;
    }

    // A name absent from a production of a head it otherwise appears under
    // is optional there. Do this after collecting every production so we
    // know the full set of names per head.
    mark_optional_across_productions(syntax, &mut shapes);

    // Unfold propagation: repeat until no head's shape grows, capped by the
    // number of non-terminals to guard against a malformed cyclic chain.
    let heads: Vec<SymbolId> = shapes.keys().copied().collect();
    for _ in 0..heads.len().max(1) {
      let mut changed = false;
      for head in &heads {
        let Some(&child) = unfold_target.get(head) else { continue };
        let Some(child_shape) = shapes.get(&child).cloned() else { continue };
        let shape = shapes.get_mut(head).unwrap();
        let before = shape.attributes.len();
        for (name, attr) in &child_shape.attributes {
          shape.attributes.entry(name.clone()).or_default().merge(attr);
        }
        if shape.attributes.len() != before {
          changed = true;
        }
      }
      if !changed {
        break;
      }
    }

    // Equivalence: heads that unfold-project onto the same child.
    let equivalence = unfold_target;

    // Common shape: intersection of every named form's attribute set. A
    // head with zero or one form has its aggregate as its common shape.
    let mut common: BTreeMap<SymbolId, AttributeMap> = BTreeMap::new();
    for (head, shape) in &shapes {
      if shape.forms.len() <= 1 {
        common.insert(*head, shape.attributes.clone());
        continue;
      }
      let mut iter = shape.forms.values();
      let mut acc: AttributeMap = iter.next().cloned().unwrap_or_default();
      for form_map in iter {
        acc.retain(|name, _| form_map.contains_key(name));
        for (name, attr) in form_map {
          if let Some(existing) = acc.get_mut(name) {
            existing.merge(attr);
          }
        }
      }
      common.insert(*head, acc);
    }

    let intermediate = compute_intermediate(syntax, &shapes);

    Skeleton { shapes, common, equivalence, intermediate }
  }
}

fn merge_attrs(dst: &mut AttributeMap, src: &AttributeMap, _form_scoped: bool) {
  for (name, attr) in src {
    dst.entry(name.clone()).or_default().merge(attr);
  }
}

/// For every head, any attribute name present in *some* but not *all* of its
/// productions is optional there.
fn mark_optional_across_productions(syntax: &Syntax, shapes: &mut BTreeMap<SymbolId, NonterminalShape>) {
  let mut productions_per_head: BTreeMap<SymbolId, usize> = BTreeMap::new();
  let mut presence: BTreeMap<(SymbolId, String), usize> = BTreeMap::new();

  for formula in syntax.productions() {
    *productions_per_head.entry(formula.head).or_default() += 1;
    let mut seen_in_this_production: BTreeSet<String> = BTreeSet::new();
    for bs in &formula.body {
      let Some(attr) = &bs.attr else { continue };
      if attr == "..." {
        continue;
      }
      if seen_in_this_production.insert(attr.clone()) {
        *presence.entry((formula.head, attr.clone())).or_default() += 1;
      }
    }
  }

  for (head, shape) in shapes.iter_mut() {
    let total = productions_per_head.get(head).copied().unwrap_or(0);
    for (name, attr) in shape.attributes.iter_mut() {
      let seen = presence.get(&(*head, name.clone())).copied().unwrap_or(0);
      if seen < total {
        attr.optional = true;
      }
    }
  }
}

/// BFS over attribute-candidate edges starting at the original start
/// symbol (the non-terminal right after the augmented `S'`). Any
/// non-terminal with a computed shape that is never reached this way is an
/// "intermediate" not worth exposing to downstream tooling.
fn compute_intermediate(syntax: &Syntax, shapes: &BTreeMap<SymbolId, NonterminalShape>) -> BTreeSet<SymbolId> {
  let start = syntax.augmented_start() + 1;
  let mut reachable: BTreeSet<SymbolId> = BTreeSet::new();
  let mut stack = vec![start];
  while let Some(nt) = stack.pop() {
    if !reachable.insert(nt) {
      continue;
    }
    if let Some(shape) = shapes.get(&nt) {
      for attr in shape.attributes.values() {
        for &candidate in &attr.candidates {
          if syntax.is_nonterminal(candidate) && !reachable.contains(&candidate) {
            stack.push(candidate);
          }
        }
      }
    }
  }
  shapes.keys().copied().filter(|nt| !reachable.contains(nt)).collect()
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use lexlr_core::{Journal, LexiconBuilder};
  use lexlr_syntax::SyntacticBuilder;

  use super::*;

  #[test]
  fn single_assignment_attribute_is_single_valued() {
    let mut ljournal = Journal::new();
    let mut lex = LexiconBuilder::new("test");
    lex.define("A", "a", &[]).unwrap();
    lex.define("B", "b", &[]).unwrap();
    let lex = Arc::new(lex.build(&mut ljournal).unwrap());

    let mut builder = SyntacticBuilder::new(lex);
    builder.formula("test", None).unwrap().symbol("A", Some("lhs")).symbol("B", Some("rhs")).commit();
    let mut journal = Journal::new();
    let syntax = builder.build(&mut journal).unwrap();

    let skeleton = Skeleton::build(&syntax);
    let test_id = syntax.nonterminal_id("test").unwrap();
    assert!(skeleton.is_single_valued(test_id, "lhs"));
    assert!(skeleton.is_single_valued(test_id, "rhs"));
  }

  #[test]
  fn repeated_attribute_name_in_one_production_is_not_single_valued() {
    let mut ljournal = Journal::new();
    // Lexicon name doubles as the syntax's start symbol, so it must match the
    // top-level formula head below ("list"), not just label the fixture.
    let mut lex = LexiconBuilder::new("list");
    lex.define("A", "a", &[]).unwrap();
    let lex = Arc::new(lex.build(&mut ljournal).unwrap());

    let mut builder = SyntacticBuilder::new(lex);
    builder.formula("list", None).unwrap().symbol("A", Some("item")).symbol("A", Some("item")).commit();
    let mut journal = Journal::new();
    let syntax = builder.build(&mut journal).unwrap();

    let skeleton = Skeleton::build(&syntax);
    let list_id = syntax.nonterminal_id("list").unwrap();
    assert!(!skeleton.is_single_valued(list_id, "item"));
  }

  #[test]
  fn unfolded_production_propagates_child_shape() {
    let mut ljournal = Journal::new();
    // Lexicon name doubles as the syntax's start symbol, so it must match the
    // actual root formula head below ("outer"), not the nested one ("inner").
    let mut lex = LexiconBuilder::new("outer");
    lex.define("A", "a", &[]).unwrap();
    let lex = Arc::new(lex.build(&mut ljournal).unwrap());

    let mut builder = SyntacticBuilder::new(lex);
    builder.formula("inner", None).unwrap().symbol("A", Some("value")).commit();
    builder.formula("outer", None).unwrap().symbol("inner", Some("...")).commit();
    let mut journal = Journal::new();
    let syntax = builder.build(&mut journal).unwrap();

    let skeleton = Skeleton::build(&syntax);
    let outer_id = syntax.nonterminal_id("outer").unwrap();
    assert!(skeleton.shape(outer_id).unwrap().attributes.contains_key("value"));
  }
}
