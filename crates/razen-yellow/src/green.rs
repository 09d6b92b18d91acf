//! Position independent, shareable tree storage.
//!
//! Green elements only know their lengths, so a subtree that survives an edit
//! can be moved to a new offset and shared between tree versions by bumping a
//! reference count.

use std::fmt;

use text_size::TextSize;
use triomphe::{Arc, ThinArc};

use crate::{FieldId, KindId, LexMode, NodeOrToken, StateId, TriviaPiece};

pub type GreenElement = NodeOrToken<GreenNode, GreenToken>;

impl GreenElement {
    #[inline]
    pub fn kind(&self) -> KindId {
        match self {
            NodeOrToken::Node(node) => node.kind(),
            NodeOrToken::Token(token) => token.kind(),
        }
    }

    #[inline]
    pub fn text_len(&self) -> TextSize {
        match self {
            NodeOrToken::Node(node) => node.text_len(),
            NodeOrToken::Token(token) => token.text_len(),
        }
    }

    #[inline]
    pub fn lookahead_len(&self) -> u32 {
        match self {
            NodeOrToken::Node(node) => node.meta().lookahead_len,
            NodeOrToken::Token(token) => token.lookahead_len(),
        }
    }

    /// Lex mode of the first token inside this element.
    #[inline]
    pub fn first_lex_mode(&self) -> LexMode {
        match self {
            NodeOrToken::Node(node) => node.meta().first_lex_mode,
            NodeOrToken::Token(token) => token.lex_mode(),
        }
    }

    #[inline]
    pub fn has_error(&self) -> bool {
        match self {
            NodeOrToken::Node(node) => node.meta().has_error,
            NodeOrToken::Token(token) => token.kind() == KindId::ERROR,
        }
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NodeOrToken::Node(this), NodeOrToken::Node(other)) => this.ptr_eq(other),
            (NodeOrToken::Token(this), NodeOrToken::Token(other)) => this.ptr_eq(other),
            _ => false,
        }
    }

    /// The leftmost token of this element, if any.
    pub fn first_token(&self) -> Option<&GreenToken> {
        match self {
            NodeOrToken::Token(token) => Some(token),
            NodeOrToken::Node(node) => {
                node.children().iter().find_map(|child| child.element.first_token())
            }
        }
    }
}

#[derive(Clone, Eq, Hash, PartialEq)]
pub struct GreenTrivia {
    ptr: Option<ThinArc<TextSize, TriviaPiece>>,
}

impl fmt::Debug for GreenTrivia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreenTrivia")
            .field("pieces", &self.pieces())
            .field("total_len", &self.len())
            .finish()
    }
}

impl GreenTrivia {
    pub fn new(pieces: &[TriviaPiece]) -> Self {
        if pieces.is_empty() {
            return Self::empty();
        }
        let total_len = pieces.iter().map(|piece| piece.len).sum();
        Self { ptr: Some(ThinArc::from_header_and_slice(total_len, pieces)) }
    }

    pub const fn empty() -> Self {
        Self { ptr: None }
    }

    pub fn len(&self) -> TextSize {
        match self.ptr {
            None => TextSize::new(0),
            Some(ref ptr) => ptr.header.header,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == TextSize::new(0)
    }

    pub fn pieces(&self) -> &[TriviaPiece] {
        match &self.ptr {
            None => &[],
            Some(ptr) => &ptr.slice,
        }
    }
}

/// A leaf: its kind, its length including leading trivia, and how it was lexed.
#[derive(Clone, PartialEq, Eq)]
pub struct GreenToken {
    data: Arc<GreenTokenData>,
}

#[derive(PartialEq, Eq)]
struct GreenTokenData {
    kind: KindId,
    leading: GreenTrivia,
    text_len: TextSize,
    lex_mode: LexMode,
    lookahead_len: u32,
}

impl GreenToken {
    /// `text_len` includes the leading trivia. `lookahead_len` counts the
    /// bytes past the end of the token the lexer examined to produce it.
    pub fn new(
        kind: KindId,
        leading: GreenTrivia,
        text_len: TextSize,
        lex_mode: LexMode,
        lookahead_len: u32,
    ) -> Self {
        debug_assert!(leading.len() <= text_len);
        Self { data: Arc::new(GreenTokenData { kind, leading, text_len, lex_mode, lookahead_len }) }
    }

    #[inline]
    pub fn kind(&self) -> KindId {
        self.data.kind
    }

    #[inline]
    pub fn leading(&self) -> &GreenTrivia {
        &self.data.leading
    }

    #[inline]
    pub fn text_len(&self) -> TextSize {
        self.data.text_len
    }

    /// Length without the leading trivia.
    #[inline]
    pub fn trimmed_len(&self) -> TextSize {
        self.data.text_len - self.data.leading.len()
    }

    #[inline]
    pub fn lex_mode(&self) -> LexMode {
        self.data.lex_mode
    }

    #[inline]
    pub fn lookahead_len(&self) -> u32 {
        self.data.lookahead_len
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl fmt::Debug for GreenToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreenToken")
            .field("kind", &self.kind())
            .field("text_len", &self.text_len())
            .field("leading", self.leading())
            .finish()
    }
}

/// Everything the incremental parser needs to decide whether a subtree can be
/// reused. Lengths are relative, so the metadata survives a shift.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct NodeMeta {
    pub pre_state: StateId,
    pub first_lex_mode: LexMode,
    /// Mode the token after the node was lexed in.
    pub next_lex_mode: LexMode,
    /// Bytes past the end examined while producing the node and the decision
    /// that completed it.
    pub lookahead_len: u32,
    pub has_error: bool,
    /// Completed while an error node was pending above it.
    pub fragile: bool,
    /// Zero for regular nodes, otherwise the height of a repetition rope.
    pub rope_height: u16,
}

/// Parser-provided inputs from which a node's [`NodeMeta`] is derived.
#[derive(Clone, Copy, Debug, Default)]
pub struct NodeInfo {
    pub pre_state: StateId,
    /// Used when the node contains no tokens.
    pub lex_mode: LexMode,
    pub next_lex_mode: LexMode,
    /// End of the lookahead that completed the node, relative to its start.
    pub decision_end: TextSize,
    pub fragile: bool,
    pub rope_height: u16,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GreenChild {
    pub element: GreenElement,
    pub field: Option<FieldId>,
    offset: TextSize,
}

impl GreenChild {
    pub fn new(element: impl Into<GreenElement>, field: Option<FieldId>) -> Self {
        Self { element: element.into(), field, offset: TextSize::new(0) }
    }

    /// Offset relative to the start of the parent.
    #[inline]
    pub fn offset(&self) -> TextSize {
        self.offset
    }

    #[inline]
    pub fn end(&self) -> TextSize {
        self.offset + self.element.text_len()
    }
}

impl From<GreenNode> for GreenElement {
    fn from(node: GreenNode) -> Self {
        NodeOrToken::Node(node)
    }
}

impl From<GreenToken> for GreenElement {
    fn from(token: GreenToken) -> Self {
        NodeOrToken::Token(token)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct GreenNode {
    data: Arc<GreenNodeData>,
}

#[derive(PartialEq, Eq)]
struct GreenNodeData {
    kind: KindId,
    text_len: TextSize,
    meta: NodeMeta,
    children: Box<[GreenChild]>,
}

impl GreenNode {
    pub fn new(kind: KindId, mut children: Vec<GreenChild>, info: NodeInfo) -> Self {
        let mut text_len = TextSize::new(0);
        let mut lookahead_end = u32::from(info.decision_end);
        let mut has_error = kind == KindId::ERROR;
        let mut fragile = info.fragile;
        let mut first_lex_mode = None;

        for child in &mut children {
            child.offset = text_len;
            text_len += child.element.text_len();
            lookahead_end = lookahead_end.max(u32::from(text_len) + child.element.lookahead_len());
            has_error |= child.element.has_error();
            if let NodeOrToken::Node(node) = &child.element {
                fragile |= node.meta().fragile;
            }
            if first_lex_mode.is_none() && child.element.text_len() > TextSize::new(0) {
                first_lex_mode = Some(child.element.first_lex_mode());
            }
        }

        let meta = NodeMeta {
            pre_state: info.pre_state,
            first_lex_mode: first_lex_mode.unwrap_or(info.lex_mode),
            next_lex_mode: info.next_lex_mode,
            lookahead_len: lookahead_end.saturating_sub(text_len.into()),
            has_error,
            fragile,
            rope_height: info.rope_height,
        };

        Self {
            data: Arc::new(GreenNodeData {
                kind,
                text_len,
                meta,
                children: children.into_boxed_slice(),
            }),
        }
    }

    #[inline]
    pub fn kind(&self) -> KindId {
        self.data.kind
    }

    #[inline]
    pub fn text_len(&self) -> TextSize {
        self.data.text_len
    }

    #[inline]
    pub fn meta(&self) -> &NodeMeta {
        &self.data.meta
    }

    #[inline]
    pub fn children(&self) -> &[GreenChild] {
        &self.data.children
    }

    /// Hidden repetition ropes are flattened by the red layer.
    #[inline]
    pub fn is_rope(&self) -> bool {
        self.data.meta.rope_height > 0
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Index of the child containing `offset` (relative to this node).
    pub fn child_index_at(&self, offset: TextSize) -> Option<usize> {
        let children = self.children();
        let index = children.partition_point(|child| child.end() <= offset);
        (index < children.len()).then_some(index)
    }
}

impl fmt::Debug for GreenNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreenNode")
            .field("kind", &self.kind())
            .field("text_len", &self.text_len())
            .field("meta", self.meta())
            .field("children", &self.children().len())
            .finish()
    }
}
