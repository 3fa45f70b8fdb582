//! Fluent runtime configuration for a single [`crate::Parser`] invocation.
//! Mirrors the construction-time builders (`LexiconBuilder`,
//! `SyntacticBuilder`) in spirit but configures a different lifecycle: one
//! parse call rather than one build.

use std::collections::BTreeMap;
use std::sync::Arc;

use lexlr_syntax::Syntax;

/// Runtime options controlling a single [`crate::Parser::parse`] call.
#[derive(Clone, Debug, Default)]
pub struct ParserOptions {
  pub(crate) starting: usize,
  pub(crate) truncate: bool,
  pub(crate) lazy:     bool,
  pub(crate) syntaxes: BTreeMap<String, Arc<Syntax>>,
}

impl ParserOptions {
  pub fn new() -> Self {
    Self::default()
  }

  /// Byte offset to begin parsing at. Default 0.
  pub fn starting(mut self, offset: usize) -> Self {
    self.starting = offset;
    self
  }

  /// On error, retry once with a synthetic EOF substituted at the first
  /// failing token, for interactive/partial-input use.
  pub fn truncate(mut self, enable: bool) -> Self {
    self.truncate = enable;
    self
  }

  /// Reject immediately if the very first scanned token is an ignorable
  /// symbol.
  pub fn lazy(mut self, enable: bool) -> Self {
    self.lazy = enable;
    self
  }

  /// Registers an imported grammar under `lang`, resolving a
  /// `Syntactic::Builder::import` production point of the same name.
  pub fn syntax(mut self, lang: impl Into<String>, syntax: Arc<Syntax>) -> Self {
    self.syntaxes.insert(lang.into(), syntax);
    self
  }

  pub fn starting_offset(&self) -> usize {
    self.starting
  }

  pub fn truncate_on_error(&self) -> bool {
    self.truncate
  }

  pub fn is_lazy(&self) -> bool {
    self.lazy
  }

  pub fn imported_syntax(&self, lang: &str) -> Option<&Arc<Syntax>> {
    self.syntaxes.get(lang)
  }
}
