//! Incremental LR parsing.
//!
//! A [`Parser`] drives the [`GrammarTable`](razen_grammar::GrammarTable) of
//! a [`Language`] over text, pulling tokens from its lexer one at a time.
//! Syntax errors never abort a parse; they are recovered from and kept in
//! the tree as `ERROR` nodes. After an edit, [`Parser::reparse`] builds the
//! new tree while sharing every subtree of the old one the edit cannot have
//! influenced.

mod edit;
mod language;
mod parser;
mod recovery;
mod reuse;
mod stack;

pub use edit::{EditError, InputEdit};
pub use language::Language;
pub use parser::{Parser, ParserOptions, ReparseError};
