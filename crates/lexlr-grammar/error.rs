use std::fmt;

use lexlr_core::{LexError, RegexError};
use lexlr_syntax::SyntaxError;

/// Everything that can go wrong parsing or compiling a textual grammar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GrammarError {
  /// The bootstrap syntax rejected the input text (malformed grammar
  /// source: bad punctuation, unterminated declaration, and so on).
  Parse(String),
  /// A CST produced by some other front door (`Grammar::from_ast`) did
  /// not have the shape this walker expects.
  MalformedCst { detail: String },
  /// Two terminals declared with the same name.
  DuplicateTerminal { name: String },
  /// Two non-terminal forms declared with the same `form` label disagree
  /// on something the grammar requires to be consistent (currently
  /// unused by the walker but reserved for future form-merge checks).
  DuplicateForm { nonterminal: String, form: String },
  /// A terminal's pattern failed to compile.
  Regex(RegexError),
  /// The lexicon builder rejected a compiled pattern set.
  Lex(LexError),
  /// The syntactic builder found a conflict or symbol-table error.
  Syntax(SyntaxError),
}

impl fmt::Display for GrammarError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GrammarError::Parse(detail) => write!(f, "grammar text is malformed: {detail}"),
      GrammarError::MalformedCst { detail } => write!(f, "malformed grammar CST: {detail}"),
      GrammarError::DuplicateTerminal { name } => write!(f, "duplicate terminal name `{name}`"),
      GrammarError::DuplicateForm { nonterminal, form } => {
        write!(f, "duplicate form `{form}` of non-terminal `{nonterminal}`")
      }
      GrammarError::Regex(inner) => write!(f, "{inner}"),
      GrammarError::Lex(inner) => write!(f, "{inner}"),
      GrammarError::Syntax(inner) => write!(f, "{inner}"),
    }
  }
}

impl std::error::Error for GrammarError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      GrammarError::Regex(inner) => Some(inner),
      GrammarError::Lex(inner) => Some(inner),
      GrammarError::Syntax(inner) => Some(inner),
      _ => None,
    }
  }
}

impl From<RegexError> for GrammarError {
  fn from(value: RegexError) -> Self {
    GrammarError::Regex(value)
  }
}

impl From<LexError> for GrammarError {
  fn from(value: LexError) -> Self {
    GrammarError::Lex(value)
  }
}

impl From<SyntaxError> for GrammarError {
  fn from(value: SyntaxError) -> Self {
    GrammarError::Syntax(value)
  }
}
