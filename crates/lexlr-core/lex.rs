//! The lexicon builder: collects named terminal patterns and compiles them
//! into one deterministic, multi-context scanning automaton.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{json, Value};

use crate::error::LexError;
use crate::journal::Journal;
use crate::regex::{self, NodeId, Regex};
use crate::{ContextId, SymbolId};

/// A single named terminal: its entry contexts and free-form attributes.
/// `pattern` is `None` only for the synthetic `<EOF>` terminal at id 0.
#[derive(Clone, Debug)]
pub struct TermDef {
  pub name:    String,
  pub pattern: Option<String>,
  /// Entry contexts. Empty means "legal in every context".
  pub entries: BTreeSet<ContextId>,
  pub attrs:   BTreeMap<String, Value>,
}

/// One DFA state. For state 0 (the pseudo-initial state) `transitions` is
/// keyed by [`ContextId`] and yields that context's real start state; for
/// every other state it is keyed by input byte.
#[derive(Clone, Debug, Default)]
pub struct DfaState {
  pub accepts:     Option<SymbolId>,
  pub transitions: BTreeMap<u8, usize>,
}

/// An immutable, built lexicon: terminal definitions, context names, and the
/// DFA that recognizes them. Cheap to share (`Arc<Lex>`) across parsers.
#[derive(Clone, Debug)]
pub struct Lex {
  terms:    Vec<TermDef>,
  contexts: Vec<String>,
  states:   Vec<DfaState>,
}

impl Lex {
  pub fn terms(&self) -> &[TermDef] {
    &self.terms
  }

  pub fn term_id(&self, name: &str) -> Option<SymbolId> {
    self.terms.iter().position(|t| t.name == name).map(|i| i as SymbolId)
  }

  pub fn term(&self, id: SymbolId) -> Option<&TermDef> {
    self.terms.get(id as usize)
  }

  pub fn contexts(&self) -> &[String] {
    &self.contexts
  }

  pub fn context_id(&self, name: &str) -> Option<ContextId> {
    self.contexts.iter().position(|c| c == name).map(|i| i as ContextId)
  }

  pub fn states(&self) -> &[DfaState] {
    &self.states
  }

  /// The real start state for `context`, reached via state 0's
  /// context-keyed transition.
  pub fn start_state(&self, context: ContextId) -> usize {
    self.states[0].transitions.get(&context).copied().unwrap_or(0)
  }

  /// Serializes to the JSON form described in the crate's external
  /// interface: `{ terms, contexts, states }`.
  pub fn to_json(&self) -> Value {
    json!({
      "contexts": self.contexts,
      "terms": self.terms.iter().map(|t| {
        let mut obj = json!({
          "name": t.name,
          "entries": t.entries.iter().map(|c| self.contexts[*c as usize].clone()).collect::<Vec<_>>(),
        });
        if let Some(pattern) = &t.pattern {
          obj["pattern"] = json!(pattern);
        }
        if !t.attrs.is_empty() {
          obj["attrs"] = json!(t.attrs);
        }
        obj
      }).collect::<Vec<_>>(),
      "states": self.states.iter().map(|s| {
        json!({
          "accepts": s.accepts,
          "transitions": s.transitions.iter().map(|(k, v)| (k.to_string(), *v)).collect::<BTreeMap<_, _>>(),
        })
      }).collect::<Vec<_>>(),
    })
  }

  pub fn from_json(value: &Value) -> Result<Lex, LexError> {
    let malformed = |detail: &str| LexError::Malformed { detail: detail.to_string() };

    let contexts: Vec<String> = value["contexts"]
      .as_array()
      .ok_or_else(|| malformed("missing `contexts` array"))?
      .iter()
      .map(|v| v.as_str().map(str::to_string).ok_or_else(|| malformed("context name must be a string")))
      .collect::<Result<_, _>>()?;

    let terms: Vec<TermDef> = value["terms"]
      .as_array()
      .ok_or_else(|| malformed("missing `terms` array"))?
      .iter()
      .map(|t| {
        let name = t["name"].as_str().ok_or_else(|| malformed("term missing `name`"))?.to_string();
        let pattern = t.get("pattern").and_then(|p| p.as_str()).map(str::to_string);
        let entries = t
          .get("entries")
          .and_then(|e| e.as_array())
          .map(|arr| {
            arr
              .iter()
              .map(|c| {
                let name = c.as_str().ok_or_else(|| malformed("entry must be a string"))?;
                contexts
                  .iter()
                  .position(|ctx| ctx == name)
                  .map(|i| i as ContextId)
                  .ok_or_else(|| malformed("entry references unknown context"))
              })
              .collect::<Result<BTreeSet<_>, _>>()
          })
          .transpose()?
          .unwrap_or_default();
        let attrs = t
          .get("attrs")
          .and_then(|a| a.as_object())
          .map(|o| o.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
          .unwrap_or_default();
        Ok(TermDef { name, pattern, entries, attrs })
      })
      .collect::<Result<_, LexError>>()?;

    let states: Vec<DfaState> = value["states"]
      .as_array()
      .ok_or_else(|| malformed("missing `states` array"))?
      .iter()
      .map(|s| {
        let accepts = s.get("accepts").and_then(|a| a.as_u64()).map(|v| v as SymbolId);
        let transitions = s
          .get("transitions")
          .and_then(|t| t.as_object())
          .map(|o| {
            o.iter()
              .map(|(k, v)| {
                let byte: u8 = k.parse().map_err(|_| malformed("transition key must be a byte"))?;
                let target = v.as_u64().ok_or_else(|| malformed("transition target must be an integer"))?;
                Ok((byte, target as usize))
              })
              .collect::<Result<BTreeMap<_, _>, LexError>>()
          })
          .transpose()?
          .unwrap_or_default();
        Ok(DfaState { accepts, transitions })
      })
      .collect::<Result<_, LexError>>()?;

    Ok(Lex { terms, contexts, states })
  }
}

/// Fluent builder for a [`Lex`]. The first context is the language name
/// itself; `.define(..)` adds terminals; `.build(..)` drives the subset
/// construction.
pub struct LexiconBuilder {
  terms:         Vec<TermDef>,
  contexts:      Vec<String>,
  combined:      Option<Regex>,
  /// Each defined term's firstpos set, rebased into `combined`'s arena at
  /// the moment it was merged in, so `build` can seed start states without
  /// re-deriving per-term positions from the fully merged tree.
  term_firstpos: Vec<(SymbolId, BTreeSet<NodeId>)>,
}

impl LexiconBuilder {
  pub fn new(language_name: impl Into<String>) -> Self {
    Self {
      terms:    vec![TermDef {
        name:    "<EOF>".to_string(),
        pattern: None,
        entries: BTreeSet::new(),
        attrs:   BTreeMap::new(),
      }],
      contexts: vec![language_name.into()],
      combined: None,
      term_firstpos: Vec::new(),
    }
  }

  pub fn context_id(&mut self, name: &str) -> Result<ContextId, LexError> {
    if let Some(pos) = self.contexts.iter().position(|c| c == name) {
      return Ok(pos as ContextId);
    }
    if self.contexts.len() >= 256 {
      return Err(LexError::TooManyContexts { requested: self.contexts.len() + 1 });
    }
    self.contexts.push(name.to_string());
    Ok((self.contexts.len() - 1) as ContextId)
  }

  /// Adds a terminal. `contexts` empty means "legal everywhere". Returns the
  /// newly assigned terminal id.
  pub fn define(
    &mut self,
    name: &str,
    pattern: &str,
    contexts: &[&str],
  ) -> Result<SymbolId, LexError> {
    if self.terms.iter().any(|t| t.name == name) {
      return Err(LexError::DuplicateTerminal { name: name.to_string() });
    }

    let mut entries = BTreeSet::new();
    for ctx in contexts {
      entries.insert(self.context_id(ctx)?);
    }

    let term_id = self.terms.len() as SymbolId;
    let mut regex = regex::compile(pattern)?;
    let local_firstpos = regex.firstpos(regex.root());
    regex.accept(term_id);

    let offset = match &mut self.combined {
      None => {
        self.combined = Some(regex);
        0
      }
      Some(combined) => combined.union_with(regex),
    };
    let firstpos: BTreeSet<NodeId> = local_firstpos.into_iter().map(|p| p + offset).collect();

    self.terms.push(TermDef {
      name: name.to_string(),
      pattern: Some(pattern.to_string()),
      entries,
      attrs: BTreeMap::new(),
    });
    self.term_firstpos.push((term_id, firstpos));

    Ok(term_id)
  }

  /// Attaches free-form metadata to a terminal, visible on Term AST nodes.
  pub fn annotate(&mut self, term: SymbolId, key: &str, value: Value) {
    if let Some(def) = self.terms.get_mut(term as usize) {
      def.attrs.insert(key.to_string(), value);
    }
  }

  pub fn build(mut self, journal: &mut Journal) -> Result<Lex, LexError> {
    let _timing = journal.time("lex-build");

    let mut combined = match self.combined.take() {
      Some(r) => r,
      None => return Ok(Lex { terms: self.terms, contexts: self.contexts, states: vec![DfaState::default()] }),
    };
    combined.calc_followpos();

    let mut states: Vec<DfaState> = vec![DfaState::default()];
    let mut state_pos: BTreeMap<usize, BTreeSet<NodeId>> = BTreeMap::new();
    let mut pending: Vec<usize> = Vec::new();

    for ctx in 0u16..(self.contexts.len() as u16) {
      let ctx = ctx as ContextId;
      let state_id = states.len();
      states.push(DfaState::default());
      states[0].transitions.insert(ctx, state_id);

      let mut pos = BTreeSet::new();
      for (term_id, firstpos) in &self.term_firstpos {
        let entries = &self.terms[*term_id as usize].entries;
        if !entries.is_empty() && !entries.contains(&ctx) {
          continue;
        }
        pos.extend(firstpos.iter().copied());
      }
      state_pos.insert(state_id, pos);
      pending.push(state_id);
    }

    while let Some(state_id) = pending.pop() {
      let current_pos = state_pos.get(&state_id).cloned().unwrap_or_default();

      let mut accept: Option<SymbolId> = None;
      for pos in &current_pos {
        if let regex::RegexNode::Accept(term) = combined.node(*pos) {
          accept = Some(match accept {
            Some(existing) => existing.min(*term),
            None => *term,
          });
        }
      }
      states[state_id].accepts = accept;

      for byte in 1u16..=255 {
        let byte = byte as u8;
        let mut next_pos = BTreeSet::new();
        for pos in &current_pos {
          if combined.matches(*pos, byte) {
            next_pos.extend(combined.followpos(*pos));
          }
        }
        if next_pos.is_empty() {
          continue;
        }

        let existing = state_pos.iter().find(|(_, p)| **p == next_pos).map(|(id, _)| *id);
        let next_id = match existing {
          Some(id) => id,
          None => {
            let id = states.len();
            states.push(DfaState::default());
            state_pos.insert(id, next_pos);
            pending.push(id);
            id
          }
        };
        states[state_id].transitions.insert(byte, next_id);
      }
    }

    Ok(Lex { terms: self.terms, contexts: self.contexts, states })
  }
}
