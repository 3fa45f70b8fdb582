//! The self-hosted textual grammar front-end: a `.lx` grammar document
//! compiles into a [`Grammar`] value, which in turn compiles into a
//! [`lexlr_syntax::Syntax`] through the exact [`lexlr_core::LexiconBuilder`]
//! / [`lexlr_syntax::SyntacticBuilder`] calls a library consumer assembling
//! a grammar by hand would make.
//!
//! The front-end parses its own source text using a `Syntax` built in
//! [`bootstrap`] through those same builder APIs — this crate's bootstrap
//! property is that the grammar language is describable through the very
//! surface it compiles user grammars into, not that its parse table was
//! typed in by hand.

pub mod bootstrap;
pub mod cst;
pub mod error;
pub mod grammar;

pub use error::GrammarError;
pub use grammar::{AlternativeDecl, BodySymbolDecl, Grammar, NonterminalDecl, TerminalDecl};
