//! Grammar definition and LALR(1) table construction.
//!
//! Languages describe their syntax with the rule combinators in [`rule`] and
//! a [`GrammarBuilder`]; [`GrammarBuilder::build`] normalises the rules into
//! flat productions and compiles them into a [`GrammarTable`] the parser
//! drives.

mod builder;
mod error;
mod lalr;
mod normalize;
pub mod rule;
mod symbol;
mod table;
mod terminal_set;

pub use builder::{ConflictPolicy, GrammarBuilder};
pub use error::ConfigurationError;
pub use rule::Rule;
pub use symbol::{Assoc, NonterminalId, ProductionId, ProductionKind, Symbol};
pub use table::{Action, GrammarTable, LexicalGrammar, ProductionInfo};
pub use terminal_set::TerminalSet;
