use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use lexlr_core::{Lex, LexError, SymbolId};
use serde_json::{json, Value};

use crate::error::SyntaxError;
use crate::production::{BodySymbol, Formula};
use crate::state::ParserState;

/// An immutable, built LALR(1) syntax: the owning lexicon, the non-terminal
/// name table, productions, states, ignored terminals, and cross-language
/// import points. Cheap to share (`Arc<Syntax>`) across parsers.
#[derive(Clone, Debug)]
pub struct Syntax {
  pub(crate) lex:         Arc<Lex>,
  pub(crate) ntrm_names:  Vec<String>,
  pub(crate) productions: Vec<Formula>,
  pub(crate) states:      Vec<ParserState>,
  pub(crate) ignores:     BTreeSet<SymbolId>,
  pub(crate) imports:     BTreeMap<SymbolId, String>,
}

impl Syntax {
  pub fn lex(&self) -> &Arc<Lex> {
    &self.lex
  }

  pub fn num_terminals(&self) -> usize {
    self.lex.terms().len()
  }

  pub fn is_terminal(&self, id: SymbolId) -> bool {
    (id as usize) < self.num_terminals()
  }

  pub fn is_nonterminal(&self, id: SymbolId) -> bool {
    !self.is_terminal(id)
  }

  pub fn nonterminal_id(&self, name: &str) -> Option<SymbolId> {
    self.ntrm_names.iter().position(|n| n == name).map(|i| (i + self.num_terminals()) as SymbolId)
  }

  /// The augmented start symbol `S'`, always the first non-terminal.
  pub fn augmented_start(&self) -> SymbolId {
    self.num_terminals() as SymbolId
  }

  pub fn name_of(&self, id: SymbolId) -> &str {
    if self.is_terminal(id) {
      self.lex.term(id).map(|t| t.name.as_str()).unwrap_or("<?>")
    } else {
      self.ntrm_names.get(id as usize - self.num_terminals()).map(String::as_str).unwrap_or("<?>")
    }
  }

  pub fn productions(&self) -> &[Formula] {
    &self.productions
  }

  pub fn production(&self, id: usize) -> &Formula {
    &self.productions[id]
  }

  pub fn states(&self) -> &[ParserState] {
    &self.states
  }

  pub fn state(&self, id: usize) -> &ParserState {
    &self.states[id]
  }

  pub fn is_ignored(&self, term: SymbolId) -> bool {
    self.ignores.contains(&term)
  }

  pub fn ignores(&self) -> &BTreeSet<SymbolId> {
    &self.ignores
  }

  pub fn imports(&self) -> &BTreeMap<SymbolId, String> {
    &self.imports
  }

  /// Renders a production as `head -> sym1 sym2 ...` using symbol names,
  /// for conflict diagnostics.
  pub fn render_production(&self, id: usize) -> String {
    let p = &self.productions[id];
    let body = p
      .body
      .iter()
      .map(|bs| self.render_body_symbol(bs))
      .collect::<Vec<_>>()
      .join(" ");
    let form = p.form.as_ref().map(|f| format!(".{f}")).unwrap_or_default();
    format!("{}{} -> {}", self.name_of(p.head), form, body)
  }

  fn render_body_symbol(&self, bs: &BodySymbol) -> String {
    match &bs.attr {
      Some(attr) if attr == "..." => format!("...{}", self.name_of(bs.symbol)),
      Some(attr) => format!("{}@{}", self.name_of(bs.symbol), attr),
      None => self.name_of(bs.symbol).to_string(),
    }
  }

  pub fn to_json(&self) -> Value {
    json!({
      "lex": self.lex.to_json(),
      "ntrms": self.ntrm_names,
      "formulas": self.productions.iter().map(|p| {
        let mut obj = json!({
          "head": p.head,
          "body": p.body.iter().map(|bs| {
            let mut o = json!({ "id": bs.symbol });
            if let Some(a) = &bs.attr { o["attr"] = json!(a); }
            o
          }).collect::<Vec<_>>(),
        });
        if let Some(form) = &p.form { obj["form"] = json!(form); }
        if !p.attributes.is_empty() { obj["attrs"] = json!(p.attributes); }
        obj
      }).collect::<Vec<_>>(),
      "states": self.states.iter().map(|s| json!({
        "shift": s.shift.iter().map(|(k,v)| (k.to_string(), *v)).collect::<BTreeMap<_,_>>(),
        "reduce": s.reduce.iter().map(|(k,v)| (k.to_string(), *v)).collect::<BTreeMap<_,_>>(),
        "contexts": s.contexts,
      })).collect::<Vec<_>>(),
      "ignores": self.ignores,
    })
  }

  pub fn from_json(value: &Value) -> Result<Syntax, SyntaxError> {
    let malformed = |detail: &str| SyntaxError::Malformed { detail: detail.to_string() };

    let lex = Lex::from_json(&value["lex"]).map_err(|e: LexError| malformed(&e.to_string()))?;
    let num_terminals = lex.terms().len();

    let ntrm_names: Vec<String> = value["ntrms"]
      .as_array()
      .ok_or_else(|| malformed("missing `ntrms`"))?
      .iter()
      .map(|v| v.as_str().map(str::to_string).ok_or_else(|| malformed("ntrm name must be a string")))
      .collect::<Result<_, _>>()?;

    let productions: Vec<Formula> = value["formulas"]
      .as_array()
      .ok_or_else(|| malformed("missing `formulas`"))?
      .iter()
      .map(|f| {
        let head = f["head"].as_u64().ok_or_else(|| malformed("formula missing `head`"))? as SymbolId;
        let form = f.get("form").and_then(|v| v.as_str()).map(str::to_string);
        let body = f["body"]
          .as_array()
          .ok_or_else(|| malformed("formula missing `body`"))?
          .iter()
          .map(|bs| {
            let id = bs["id"].as_u64().ok_or_else(|| malformed("body symbol missing `id`"))? as SymbolId;
            let attr = bs.get("attr").and_then(|a| a.as_str()).map(str::to_string);
            Ok(BodySymbol { symbol: id, attr })
          })
          .collect::<Result<Vec<_>, SyntaxError>>()?;
        let attributes = f
          .get("attrs")
          .and_then(|a| a.as_object())
          .map(|o| o.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
          .unwrap_or_default();
        Ok(Formula { head, body, form, lang: None, attributes })
      })
      .collect::<Result<_, SyntaxError>>()?;

    let states: Vec<ParserState> = value["states"]
      .as_array()
      .ok_or_else(|| malformed("missing `states`"))?
      .iter()
      .map(|s| {
        let parse_map = |key: &str| -> Result<BTreeMap<SymbolId, usize>, SyntaxError> {
          Ok(
            s.get(key)
              .and_then(|v| v.as_object())
              .map(|o| {
                o.iter()
                  .map(|(k, v)| {
                    let sym: SymbolId = k.parse().map_err(|_| malformed("bad symbol key"))?;
                    let target = v.as_u64().ok_or_else(|| malformed("bad target"))?;
                    Ok((sym, target as usize))
                  })
                  .collect::<Result<BTreeMap<_, _>, SyntaxError>>()
              })
              .transpose()?
              .unwrap_or_default(),
          )
        };
        let contexts = s
          .get("contexts")
          .and_then(|c| c.as_array())
          .map(|arr| arr.iter().filter_map(|v| v.as_u64()).map(|v| v as u8).collect())
          .unwrap_or_default();
        Ok(ParserState {
          shift: parse_map("shift")?,
          reduce: parse_map("reduce")?,
          contexts,
          externals: BTreeSet::new(),
        })
      })
      .collect::<Result<_, SyntaxError>>()?;

    let ignores: BTreeSet<SymbolId> = value["ignores"]
      .as_array()
      .map(|arr| arr.iter().filter_map(|v| v.as_u64()).map(|v| v as SymbolId).collect())
      .unwrap_or_default();

    let _ = num_terminals;
    Ok(Syntax { lex: Arc::new(lex), ntrm_names, productions, states, ignores, imports: BTreeMap::new() })
  }
}
