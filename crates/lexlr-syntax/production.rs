use std::collections::BTreeMap;

use lexlr_core::SymbolId;
use serde_json::Value;

/// A single symbol in a production's body. `attr = Some("...")` is the
/// *unfold* marker: at reduction, the referenced child's whole attribute
/// map is merged into the parent's. Any other `attr = Some(k)` stores the
/// reduced child under key `k` in the parent's attribute map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BodySymbol {
  pub symbol: SymbolId,
  pub attr:   Option<String>,
}

impl BodySymbol {
  pub fn new(symbol: SymbolId) -> Self {
    Self { symbol, attr: None }
  }

  pub fn with_attr(symbol: SymbolId, attr: impl Into<String>) -> Self {
    Self { symbol, attr: Some(attr.into()) }
  }

  pub fn is_unfold(&self) -> bool {
    self.attr.as_deref() == Some("...")
  }
}

/// A single rewrite rule `head -> body`. `form` groups alternative
/// productions of the same head under a user-supplied label; `lang` marks a
/// production created purely to represent a cross-language import point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Formula {
  pub head:       SymbolId,
  pub body:       Vec<BodySymbol>,
  pub form:       Option<String>,
  pub lang:       Option<String>,
  pub attributes: BTreeMap<String, Value>,
}

impl Formula {
  /// A production whose body is exactly one symbol marked for unfold.
  pub fn is_unfolded(&self) -> bool {
    self.body.len() == 1 && self.body[0].is_unfold()
  }
}
