use std::collections::{BTreeMap, BTreeSet};

use lexlr_core::{ContextId, SymbolId};

/// One state of the built LALR(1) automaton.
#[derive(Clone, Debug, Default)]
pub struct ParserState {
  /// Shift (terminal) and goto (non-terminal) targets, unified: both are
  /// "consume this symbol, move to this state".
  pub shift: BTreeMap<SymbolId, usize>,
  /// Lookahead terminal -> production id to reduce by.
  pub reduce: BTreeMap<SymbolId, usize>,
  /// Union of the entry-context sets of every terminal that could legally
  /// appear next from this state — drives multi-context scanning.
  pub contexts: BTreeSet<ContextId>,
  /// Imported non-terminals expected to be recognized here by an external
  /// grammar, rather than by this syntax's own productions.
  pub externals: BTreeSet<SymbolId>,
}
