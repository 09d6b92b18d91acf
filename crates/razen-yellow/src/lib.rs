//! Lossless, immutable syntax trees with structural sharing.
//!
//! The green layer stores kinds and lengths behind reference counts so that
//! subtrees can be shared between tree versions; the red layer adds absolute
//! offsets and parent links on demand.

mod green;
mod kind;
mod line_index;
pub mod rope;
mod syntax;
mod trivia;

/// Shared, position independent tree storage.
pub use green::{GreenChild, GreenElement, GreenNode, GreenToken, GreenTrivia, NodeInfo, NodeMeta};
/// Kind and field vocabularies.
pub use kind::{FieldId, KindId, KindInfo, KindTable, LexMode, StateId};
/// Row/column lookup.
pub use line_index::{LineIndex, Point};
/// Primary syntax tree API types.
pub use syntax::{
    Children, ChildrenWithTokens, LanguageId, NodeOrToken, Preorder, PreorderWithTokens,
    SyntaxElement, SyntaxNode, SyntaxToken, SyntaxTree, TokenAtOffset, WalkEvent,
    WalkEventWithTokens,
};
/// Re-exported for consumers that need to build or measure ranges.
pub use text_size::{TextRange, TextSize};
/// Trivia pieces attached to tokens.
pub use trivia::{TriviaPiece, TriviaPieceKind};
