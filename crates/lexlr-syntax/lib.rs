//! LALR(1) syntactic state-machine construction: productions, the
//! non-terminal symbol table, nullable/FIRST/FOLLOW analysis, canonical
//! LR(1) item-set/goto construction, and conflict detection.

pub mod builder;
pub mod error;
pub mod production;
pub mod state;
pub mod syntax;

pub use builder::SyntacticBuilder;
pub use error::SyntaxError;
pub use production::{BodySymbol, Formula};
pub use state::ParserState;
pub use syntax::Syntax;
