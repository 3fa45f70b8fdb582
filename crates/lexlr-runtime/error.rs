use std::fmt;

use lexlr_core::{Point, SymbolId};

/// Everything that can go wrong while driving a [`crate::Parser`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
  /// Every thread failed at the same input position: no shift, reduce, or
  /// ignore action applied.
  UnexpectedToken {
    path:           Option<String>,
    at:             Point,
    found:          String,
    found_text:     String,
    last_reduced:   Option<String>,
    expected:       Vec<String>,
  },
  /// The candidates list held more than one distinct accepted tree.
  AmbiguousAccept { path: Option<String>, candidate_count: usize },
  /// Parsing finished with zero accepted candidates and no single failing
  /// thread to blame (e.g. every thread ran off the end of input while
  /// still expecting more).
  NoAccept { path: Option<String> },
  /// An `import` production needed an external grammar that wasn't
  /// supplied in `ParserOptions::syntaxes`.
  MissingImport { lang: String },
  /// `origin_formula`/`store` encountered a symbol id absent from the
  /// owning `Syntax` — indicates a tree built against a different syntax
  /// than the one passed for rendering.
  UnknownSymbol { symbol: SymbolId },
}

impl fmt::Display for ParseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ParseError::UnexpectedToken { path, at, found, found_text, last_reduced, expected } => {
        let path = path.as_deref().unwrap_or("<memory>");
        write!(f, "{path}:{}:{}: unexpected {found} `{found_text}`", at.line, at.column)?;
        if let Some(last) = last_reduced {
          write!(f, " (after reducing `{last}`)")?;
        }
        if !expected.is_empty() {
          write!(f, "; expected one of: {}", expected.join(", "))?;
        }
        Ok(())
      }
      ParseError::AmbiguousAccept { path, candidate_count } => {
        let path = path.as_deref().unwrap_or("<memory>");
        write!(f, "{path}: ambiguous parse: {candidate_count} distinct accepted trees")
      }
      ParseError::NoAccept { path } => {
        let path = path.as_deref().unwrap_or("<memory>");
        write!(f, "{path}: no accepted parse")
      }
      ParseError::MissingImport { lang } => write!(f, "no syntax supplied for imported language `{lang}`"),
      ParseError::UnknownSymbol { symbol } => write!(f, "symbol id {symbol} is not defined by this syntax"),
    }
  }
}

impl std::error::Error for ParseError {}
