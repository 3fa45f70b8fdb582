//! Builds a [`Syntax`] from a sequence of production declarations: nullable
//! and FIRST fixed-point analysis, canonical LR(1) item-set/goto
//! construction, and table filling with conflict detection.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use lexlr_core::{ContextId, Journal, Lex, SymbolId, DEFAULT_CONTEXT, EOF_TERMINAL};

use crate::error::SyntaxError;
use crate::production::{BodySymbol, Formula};
use crate::state::ParserState;
use crate::syntax::Syntax;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Item {
  production: usize,
  dot:        usize,
  lookahead:  SymbolId,
}

type ItemSet = BTreeSet<Item>;

/// Fluent builder for a [`Syntax`]. Seeded with the augmented start
/// production `S' -> S <EOF>`, where `S` is named after the lexicon's first
/// (default) context.
pub struct SyntacticBuilder {
  lex:         Arc<Lex>,
  ntrm_names:  Vec<String>,
  ntrm_ids:    BTreeMap<String, SymbolId>,
  productions: Vec<Formula>,
  ignores:     BTreeSet<SymbolId>,
  imports:     BTreeMap<SymbolId, String>,
}

/// Borrowed, in-progress production under construction by
/// `.formula(..).symbol(..).symbol(..).commit()`.
pub struct FormulaBuilder<'b> {
  builder: &'b mut SyntacticBuilder,
  head:    SymbolId,
  form:    Option<String>,
  body:    Vec<BodySymbol>,
}

impl<'b> FormulaBuilder<'b> {
  /// Appends a body symbol. `name_or_id` auto-declares an unknown name as a
  /// non-terminal (a known terminal name resolves to its existing id).
  pub fn symbol(mut self, name_or_id: &str, attr: Option<&str>) -> Self {
    let id = self.builder.resolve_or_declare(name_or_id);
    self.body.push(BodySymbol { symbol: id, attr: attr.map(str::to_string) });
    self
  }

  pub fn commit(self) -> usize {
    let id = self.builder.productions.len();
    self.builder.productions.push(Formula {
      head:       self.head,
      body:       self.body,
      form:       self.form,
      lang:       None,
      attributes: BTreeMap::new(),
    });
    id
  }
}

impl SyntacticBuilder {
  pub fn new(lex: Arc<Lex>) -> Self {
    let start_context_name = lex.contexts().first().cloned().unwrap_or_else(|| "S".to_string());
    let mut builder = Self {
      lex,
      ntrm_names: Vec::new(),
      ntrm_ids: BTreeMap::new(),
      productions: Vec::new(),
      ignores: BTreeSet::new(),
      imports: BTreeMap::new(),
    };
    let augmented = builder.declare_nonterminal("S'");
    let original_start = builder.declare_nonterminal(&start_context_name);
    builder.productions.push(Formula {
      head:       augmented,
      body:       vec![BodySymbol::new(original_start), BodySymbol::new(EOF_TERMINAL)],
      form:       None,
      lang:       None,
      attributes: BTreeMap::new(),
    });
    builder
  }

  fn num_terminals(&self) -> usize {
    self.lex.terms().len()
  }

  fn is_terminal(&self, id: SymbolId) -> bool {
    (id as usize) < self.num_terminals()
  }

  fn declare_nonterminal(&mut self, name: &str) -> SymbolId {
    if let Some(id) = self.ntrm_ids.get(name) {
      return *id;
    }
    let id = (self.num_terminals() + self.ntrm_names.len()) as SymbolId;
    self.ntrm_names.push(name.to_string());
    self.ntrm_ids.insert(name.to_string(), id);
    id
  }

  fn resolve_or_declare(&mut self, name_or_id: &str) -> SymbolId {
    if let Some(id) = self.lex.term_id(name_or_id) {
      return id;
    }
    self.declare_nonterminal(name_or_id)
  }

  /// Starts a new production. Returns an error if `head` names an existing
  /// terminal or an already-declared import point.
  pub fn formula(&mut self, head: &str, form: Option<&str>) -> Result<FormulaBuilder<'_>, SyntaxError> {
    if self.lex.term_id(head).is_some() {
      return Err(SyntaxError::TerminalAsHead { name: head.to_string() });
    }
    let head_id = self.declare_nonterminal(head);
    if self.imports.contains_key(&head_id) {
      return Err(SyntaxError::ImportedAsHead { name: head.to_string() });
    }
    Ok(FormulaBuilder { builder: self, head: head_id, form: form.map(str::to_string), body: Vec::new() })
  }

  pub fn ignore(&mut self, term_name: &str) -> Option<SymbolId> {
    let id = self.lex.term_id(term_name)?;
    self.ignores.insert(id);
    Some(id)
  }

  pub fn import(&mut self, lang: &str, alias: Option<&str>) -> Result<SymbolId, SyntaxError> {
    if self.imports.values().any(|l| l == lang) {
      return Err(SyntaxError::DuplicateImport { lang: lang.to_string() });
    }
    let name = alias.unwrap_or(lang);
    let id = self.declare_nonterminal(name);
    self.imports.insert(id, lang.to_string());
    Ok(id)
  }

  fn is_nullable(&self, nullable: &BTreeSet<SymbolId>, body: &[BodySymbol]) -> bool {
    body.iter().all(|bs| nullable.contains(&bs.symbol))
  }

  fn compute_nullable(&self) -> BTreeSet<SymbolId> {
    let mut nullable = BTreeSet::new();
    let mut changed = true;
    while changed {
      changed = false;
      for p in &self.productions {
        if nullable.contains(&p.head) {
          continue;
        }
        if self.is_nullable(&nullable, &p.body) {
          nullable.insert(p.head);
          changed = true;
        }
      }
    }
    nullable
  }

  /// FIRST sets for every non-terminal, plus the prefix dependency graph
  /// used to distinguish a genuine cycle from a merely-unreachable symbol.
  fn compute_first(
    &self,
    nullable: &BTreeSet<SymbolId>,
  ) -> Result<BTreeMap<SymbolId, BTreeSet<SymbolId>>, SyntaxError> {
    let mut first: BTreeMap<SymbolId, BTreeSet<SymbolId>> = BTreeMap::new();
    for name in &self.ntrm_names {
      first.entry(self.ntrm_ids[name]).or_default();
    }

    let mut deps: BTreeMap<SymbolId, BTreeSet<SymbolId>> = BTreeMap::new();

    let mut changed = true;
    while changed {
      changed = false;
      for p in &self.productions {
        let mut addition = BTreeSet::new();
        for bs in &p.body {
          if self.is_terminal(bs.symbol) {
            addition.insert(bs.symbol);
            break;
          }
          deps.entry(p.head).or_default().insert(bs.symbol);
          addition.extend(first.get(&bs.symbol).cloned().unwrap_or_default());
          if !nullable.contains(&bs.symbol) {
            break;
          }
        }
        let entry = first.entry(p.head).or_default();
        let before = entry.len();
        entry.extend(addition);
        if entry.len() != before {
          changed = true;
        }
      }
    }

    for (ntrm, set) in &first {
      if set.is_empty() && !nullable.contains(ntrm) {
        if let Some(cycle) = find_cycle_through(*ntrm, &deps) {
          return Err(SyntaxError::CircularFirst {
            cycle: cycle.into_iter().map(|id| self.name_of_ntrm(id)).collect(),
          });
        }
        return Err(SyntaxError::EmptyFirst { nonterminal: self.name_of_ntrm(*ntrm) });
      }
    }

    Ok(first)
  }

  fn name_of_ntrm(&self, id: SymbolId) -> String {
    self.ntrm_names.get(id as usize - self.num_terminals()).cloned().unwrap_or_default()
  }

  fn name_of(&self, id: SymbolId) -> String {
    if self.is_terminal(id) {
      self.lex.term(id).map(|t| t.name.clone()).unwrap_or_default()
    } else {
      self.name_of_ntrm(id)
    }
  }

  /// FIRST of `symbols` followed by `trailing`, used at LR(1) closure time.
  fn first_of_sequence(
    &self,
    symbols: &[BodySymbol],
    first: &BTreeMap<SymbolId, BTreeSet<SymbolId>>,
    nullable: &BTreeSet<SymbolId>,
    trailing: SymbolId,
  ) -> BTreeSet<SymbolId> {
    let mut out = BTreeSet::new();
    for bs in symbols {
      if self.is_terminal(bs.symbol) {
        out.insert(bs.symbol);
        return out;
      }
      out.extend(first.get(&bs.symbol).cloned().unwrap_or_default());
      if !nullable.contains(&bs.symbol) {
        return out;
      }
    }
    out.insert(trailing);
    out
  }

  fn closure(
    &self,
    mut items: ItemSet,
    first: &BTreeMap<SymbolId, BTreeSet<SymbolId>>,
    nullable: &BTreeSet<SymbolId>,
  ) -> ItemSet {
    loop {
      let mut additions = Vec::new();
      for item in &items {
        let prod = &self.productions[item.production];
        let Some(bs) = prod.body.get(item.dot) else { continue };
        if self.is_terminal(bs.symbol) {
          continue;
        }
        let rest = &prod.body[item.dot + 1..];
        let lookaheads = self.first_of_sequence(rest, first, nullable, item.lookahead);
        for (idx, candidate) in self.productions.iter().enumerate() {
          if candidate.head != bs.symbol {
            continue;
          }
          for la in &lookaheads {
            let new_item = Item { production: idx, dot: 0, lookahead: *la };
            if !items.contains(&new_item) {
              additions.push(new_item);
            }
          }
        }
      }
      if additions.is_empty() {
        break;
      }
      items.extend(additions);
    }
    items
  }

  /// Runs the full construction, returning a built, conflict-free [`Syntax`].
  pub fn build(self, journal: &mut Journal) -> Result<Syntax, SyntaxError> {
    let _timing = journal.time("syntax-build");

    let nullable = {
      let _t = journal.time("nullable");
      self.compute_nullable()
    };
    let first = {
      let _t = journal.time("first");
      self.compute_first(&nullable)?
    };

    let start_item = Item { production: 0, dot: 0, lookahead: EOF_TERMINAL };
    let start_set = self.closure(BTreeSet::from([start_item]), &first, &nullable);

    let mut item_sets: Vec<ItemSet> = vec![start_set.clone()];
    let mut index: BTreeMap<ItemSet, usize> = BTreeMap::from([(start_set, 0)]);
    let mut pending = vec![0usize];
    let mut states: Vec<ParserState> = vec![ParserState::default()];

    {
      let _t = journal.time("states");
      while let Some(state_id) = pending.pop() {
        let items = item_sets[state_id].clone();

        let mut by_symbol: BTreeMap<SymbolId, ItemSet> = BTreeMap::new();
        for item in &items {
          let prod = &self.productions[item.production];
          match prod.body.get(item.dot) {
            Some(bs) => {
              by_symbol
                .entry(bs.symbol)
                .or_default()
                .insert(Item { production: item.production, dot: item.dot + 1, lookahead: item.lookahead });
            }
            None => {
              let existing = states[state_id].reduce.get(&item.lookahead).copied();
              match existing {
                Some(other) if other != item.production => {
                  return Err(SyntaxError::ReduceReduceConflict {
                    state:        state_id,
                    lookahead:    self.name_of(item.lookahead),
                    production_a: render_production(&self, other),
                    production_b: render_production(&self, item.production),
                  });
                }
                _ => {
                  states[state_id].reduce.insert(item.lookahead, item.production);
                }
              }
            }
          }
        }

        for (sym, next_items) in by_symbol {
          let goto_set = self.closure(next_items, &first, &nullable);
          let next_state = match index.get(&goto_set) {
            Some(id) => *id,
            None => {
              let id = item_sets.len();
              item_sets.push(goto_set.clone());
              states.push(ParserState::default());
              index.insert(goto_set, id);
              pending.push(id);
              id
            }
          };
          states[state_id].shift.insert(sym, next_state);

          if self.is_terminal(sym) && states[state_id].reduce.contains_key(&sym) {
            let reduce_prod = states[state_id].reduce[&sym];
            return Err(SyntaxError::ShiftReduceConflict {
              state:             state_id,
              terminal:          self.name_of(sym),
              reduce_production: render_production(&self, reduce_prod),
            });
          }
        }
      }
    }

    for state in &mut states {
      let mut contexts: BTreeSet<ContextId> = BTreeSet::new();
      let mut next_terminals: BTreeSet<SymbolId> = BTreeSet::new();
      next_terminals.extend(state.shift.keys().copied().filter(|s| self.is_terminal(*s)));
      next_terminals.extend(state.reduce.keys().copied());
      for term in next_terminals {
        match self.lex.term(term) {
          Some(def) if !def.entries.is_empty() => contexts.extend(def.entries.iter().copied()),
          _ => {
            contexts.insert(DEFAULT_CONTEXT);
          }
        }
      }
      state.contexts = contexts;
      for (sym, lang) in &self.imports {
        if state.shift.contains_key(sym) {
          state.externals.insert(*sym);
        }
        let _ = lang;
      }
    }

    Ok(Syntax {
      lex:         self.lex,
      ntrm_names:  self.ntrm_names,
      productions: self.productions,
      states,
      ignores:     self.ignores,
      imports:     self.imports,
    })
  }
}

fn render_production(builder: &SyntacticBuilder, id: usize) -> String {
  let p = &builder.productions[id];
  let body = p
    .body
    .iter()
    .map(|bs| match &bs.attr {
      Some(a) if a == "..." => format!("...{}", builder.name_of(bs.symbol)),
      Some(a) => format!("{}@{}", builder.name_of(bs.symbol), a),
      None => builder.name_of(bs.symbol),
    })
    .collect::<Vec<_>>()
    .join(" ");
  format!("{} -> {}", builder.name_of_ntrm(p.head), body)
}

/// DFS cycle search over the prefix-dependency graph, used only to enrich
/// an empty-FIRST diagnostic into a `CircularFirst` one when the symbol
/// genuinely participates in a cycle.
fn find_cycle_through(start: SymbolId, deps: &BTreeMap<SymbolId, BTreeSet<SymbolId>>) -> Option<Vec<SymbolId>> {
  let mut path = Vec::new();
  let mut on_stack = BTreeSet::new();
  fn visit(
    node: SymbolId,
    deps: &BTreeMap<SymbolId, BTreeSet<SymbolId>>,
    path: &mut Vec<SymbolId>,
    on_stack: &mut BTreeSet<SymbolId>,
    target: SymbolId,
  ) -> Option<Vec<SymbolId>> {
    path.push(node);
    on_stack.insert(node);
    if let Some(next) = deps.get(&node) {
      for &n in next {
        if n == target && !path.is_empty() {
          let mut cycle = path.clone();
          cycle.push(target);
          return Some(cycle);
        }
        if !on_stack.contains(&n) {
          if let Some(cycle) = visit(n, deps, path, on_stack, target) {
            return Some(cycle);
          }
        }
      }
    }
    path.pop();
    on_stack.remove(&node);
    None
  }
  visit(start, deps, &mut path, &mut on_stack, start)
}
