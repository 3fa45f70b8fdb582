//! Foundational types shared by every stage of the lexlr pipeline: the
//! in-memory source document, the regex compiler, the lexicon builder, and
//! the diagnostics journal that every downstream builder reports through.

pub mod document;
pub mod error;
pub mod journal;
pub mod lex;
pub mod regex;

pub use document::{Document, Point};
pub use error::{LexError, RegexError};
pub use journal::{Journal, Report, ReportEntry, Severity, Timing};
pub use lex::{DfaState, Lex, LexiconBuilder, TermDef};
pub use regex::{Regex, RegexNode};

/// Symbol IDs live in a single flat space: terminals occupy `[0, T)`, with
/// id 0 reserved for end-of-input and [`ERROR_TERMINAL`] reserved for the
/// scanner's dead-end sentinel. Non-terminals occupy `[T, T+N)` and are
/// assigned by `lexlr_syntax`.
pub type SymbolId = u32;

/// Reserved id for the end-of-input terminal.
pub const EOF_TERMINAL: SymbolId = 0;

/// Reserved id for the scanner's dead-end sentinel terminal. Lies just past
/// the last terminal a grammar can ever define in practice; builders assign
/// real terminal ids starting at 1 and reject a grammar that collides with
/// it via a dedicated `LexError`.
pub const ERROR_TERMINAL: SymbolId = SymbolId::MAX;

/// A small integer selecting which subset of terminals the scanner may
/// produce next. Fits in one byte: at most 256 contexts per lexicon.
pub type ContextId = u8;

/// Context 0 is always the default, language-named context.
pub const DEFAULT_CONTEXT: ContextId = 0;
