use std::fmt;

/// Everything that can go wrong while building a [`crate::Syntax`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyntaxError {
  /// A terminal name was used in head position of a production.
  TerminalAsHead { name: String },
  /// A non-terminal marked as an import point was also used as a head.
  ImportedAsHead { name: String },
  /// The same language was imported twice.
  DuplicateImport { lang: String },
  /// A reachable non-terminal's FIRST set came out empty and it is not
  /// nullable — it can never start deriving anything.
  EmptyFirst { nonterminal: String },
  /// A set of mutually-recursive non-terminals whose FIRST sets can never
  /// resolve to a terminal (no base case breaks the prefix cycle).
  CircularFirst { cycle: Vec<String> },
  /// Two different productions both reduce in the same state on the same
  /// lookahead terminal.
  ReduceReduceConflict { state: usize, lookahead: String, production_a: String, production_b: String },
  /// A state can both shift and reduce on the same terminal.
  ShiftReduceConflict { state: usize, terminal: String, reduce_production: String },
  /// A serialized `Syntax` document was malformed.
  Malformed { detail: String },
}

impl fmt::Display for SyntaxError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SyntaxError::TerminalAsHead { name } => {
        write!(f, "terminal `{name}` cannot be used as a production head")
      }
      SyntaxError::ImportedAsHead { name } => {
        write!(f, "imported symbol `{name}` cannot be used as a production head")
      }
      SyntaxError::DuplicateImport { lang } => write!(f, "language `{lang}` imported more than once"),
      SyntaxError::EmptyFirst { nonterminal } => {
        write!(f, "non-terminal `{nonterminal}` has an empty FIRST set and is not nullable")
      }
      SyntaxError::CircularFirst { cycle } => {
        write!(f, "circular FIRST dependency among: {}", cycle.join(" -> "))
      }
      SyntaxError::ReduceReduceConflict { state, lookahead, production_a, production_b } => {
        write!(
          f,
          "reduce/reduce conflict in state {state} on lookahead `{lookahead}`: `{production_a}` vs `{production_b}`"
        )
      }
      SyntaxError::ShiftReduceConflict { state, terminal, reduce_production } => {
        write!(
          f,
          "shift/reduce conflict in state {state} on terminal `{terminal}`: shift vs reduce `{reduce_production}`"
        )
      }
      SyntaxError::Malformed { detail } => write!(f, "malformed syntax document: {detail}"),
    }
  }
}

impl std::error::Error for SyntaxError {}
