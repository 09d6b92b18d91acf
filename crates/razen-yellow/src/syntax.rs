//! Navigable view over green trees.
//!
//! Red handles pair a green element with its absolute offset and its parent.
//! Repetition ropes are hidden: children iterators, sibling steps and offset
//! lookups walk through them as if their elements were direct children.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use text_size::{TextRange, TextSize};

use crate::green::{GreenChild, GreenNode, GreenToken};
use crate::{FieldId, KindId, KindTable, LineIndex, Point, TriviaPiece};

/// Identity of the language (and table version) a tree was built with.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct LanguageId {
    pub name: Arc<str>,
    pub version: u32,
    /// Hash of the grammar table contents.
    pub fingerprint: u64,
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} ({:016x})", self.name, self.version, self.fingerprint)
    }
}

fn slice(text: &[u8], range: TextRange) -> &[u8] {
    &text[std::ops::Range::<usize>::from(range)]
}

/// Immutable snapshot of a parsed text.
#[derive(Clone)]
pub struct SyntaxTree {
    root: GreenNode,
    text: Arc<[u8]>,
    kinds: Arc<KindTable>,
    language: LanguageId,
    line_index: OnceCell<LineIndex>,
}

impl SyntaxTree {
    pub fn new(
        root: GreenNode,
        text: Arc<[u8]>,
        kinds: Arc<KindTable>,
        language: LanguageId,
    ) -> Self {
        debug_assert_eq!(usize::from(root.text_len()), text.len());
        Self { root, text, kinds, language, line_index: OnceCell::new() }
    }

    /// Returns the root syntax node.
    #[inline]
    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode {
            tree: self,
            data: Rc::new(NodeData {
                green: &self.root,
                offset: TextSize::new(0),
                parent: None,
                slot: Slot::default(),
                field: None,
            }),
        }
    }

    #[inline]
    pub fn green(&self) -> &GreenNode {
        &self.root
    }

    /// Returns the full source text for this tree.
    #[inline]
    pub fn text(&self) -> &[u8] {
        &self.text
    }

    #[inline]
    pub fn source(&self) -> &Arc<[u8]> {
        &self.text
    }

    #[inline]
    pub fn kinds(&self) -> &Arc<KindTable> {
        &self.kinds
    }

    #[inline]
    pub fn language(&self) -> &LanguageId {
        &self.language
    }

    pub fn line_index(&self) -> &LineIndex {
        self.line_index.get_or_init(|| LineIndex::new(&self.text))
    }

    pub fn point(&self, offset: TextSize) -> Point {
        self.line_index().point(offset)
    }
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.root(), f)
    }
}

#[derive(Clone, Copy)]
struct Frame<'a> {
    node: &'a GreenNode,
    index: usize,
    offset: TextSize,
    field: Option<FieldId>,
}

/// Position of an element among the flattened children of its parent: the
/// bottom frame is the parent itself, the others are ropes on the way down.
#[derive(Clone, Default)]
struct Slot<'a> {
    frames: Vec<Frame<'a>>,
}

impl<'a> Slot<'a> {
    fn first(node: &'a GreenNode, offset: TextSize) -> Option<Self> {
        let mut slot = Self { frames: vec![Frame { node, index: 0, offset, field: None }] };
        slot.settle_forward().then_some(slot)
    }

    fn last(node: &'a GreenNode, offset: TextSize) -> Option<Self> {
        let index = node.children().len();
        let mut slot = Self { frames: vec![Frame { node, index, offset, field: None }] };
        slot.retreat().then_some(slot)
    }

    fn at_offset(node: &'a GreenNode, offset: TextSize, target: TextSize) -> Option<Self> {
        let mut frames = vec![Frame { node, index: 0, offset, field: None }];
        loop {
            let top = frames.last_mut()?;
            let frame = *top;
            top.index = frame.node.child_index_at(target.checked_sub(frame.offset)?)?;
            let child = &frame.node.children()[top.index];
            match &child.element {
                NodeOrToken::Node(rope) if rope.is_rope() => {
                    frames.push(Frame {
                        node: rope,
                        index: 0,
                        offset: frame.offset + child.offset(),
                        field: child.field.or(frame.field),
                    });
                }
                _ => return Some(Self { frames }),
            }
        }
    }

    fn current(&self) -> (&'a GreenChild, TextSize, Option<FieldId>) {
        let frame = *self.frames.last().expect("slot points at an element");
        let child = &frame.node.children()[frame.index];
        (child, frame.offset + child.offset(), child.field.or(frame.field))
    }

    fn advance(&mut self) -> bool {
        if let Some(top) = self.frames.last_mut() {
            top.index += 1;
        }
        self.settle_forward()
    }

    fn settle_forward(&mut self) -> bool {
        loop {
            let Some(&frame) = self.frames.last() else { return false };
            let Some(child) = frame.node.children().get(frame.index) else {
                self.frames.pop();
                match self.frames.last_mut() {
                    Some(parent) => parent.index += 1,
                    None => return false,
                }
                continue;
            };
            match &child.element {
                NodeOrToken::Node(rope) if rope.is_rope() => self.frames.push(Frame {
                    node: rope,
                    index: 0,
                    offset: frame.offset + child.offset(),
                    field: child.field.or(frame.field),
                }),
                _ => return true,
            }
        }
    }

    fn retreat(&mut self) -> bool {
        loop {
            let Some(top) = self.frames.last_mut() else { return false };
            if top.index == 0 {
                self.frames.pop();
                if self.frames.is_empty() {
                    return false;
                }
                continue;
            }
            top.index -= 1;
            let frame = *top;
            let child = &frame.node.children()[frame.index];
            match &child.element {
                NodeOrToken::Node(rope) if rope.is_rope() => self.frames.push(Frame {
                    node: rope,
                    index: rope.children().len(),
                    offset: frame.offset + child.offset(),
                    field: child.field.or(frame.field),
                }),
                _ => return true,
            }
        }
    }
}

struct NodeData<'a> {
    green: &'a GreenNode,
    offset: TextSize,
    parent: Option<SyntaxNode<'a>>,
    slot: Slot<'a>,
    field: Option<FieldId>,
}

/// Node handle tied to the lifetime of the tree.
#[derive(Clone)]
pub struct SyntaxNode<'a> {
    tree: &'a SyntaxTree,
    data: Rc<NodeData<'a>>,
}

/// Token handle tied to the lifetime of the tree.
#[derive(Clone)]
pub struct SyntaxToken<'a> {
    tree: &'a SyntaxTree,
    green: &'a GreenToken,
    offset: TextSize,
    parent: SyntaxNode<'a>,
    slot: Slot<'a>,
    field: Option<FieldId>,
}

/// Node or token element inside the tree.
pub type SyntaxElement<'a> = NodeOrToken<SyntaxNode<'a>, SyntaxToken<'a>>;

fn element_at<'a>(parent: &SyntaxNode<'a>, slot: Slot<'a>) -> SyntaxElement<'a> {
    let (child, offset, field) = slot.current();
    let tree = parent.tree;
    match &child.element {
        NodeOrToken::Node(green) => NodeOrToken::Node(SyntaxNode {
            tree,
            data: Rc::new(NodeData { green, offset, parent: Some(parent.clone()), slot, field }),
        }),
        NodeOrToken::Token(green) => {
            let parent = parent.clone();
            NodeOrToken::Token(SyntaxToken { tree, green, offset, parent, slot, field })
        }
    }
}

impl<'a> SyntaxNode<'a> {
    #[inline]
    pub fn kind(&self) -> KindId {
        self.data.green.kind()
    }

    #[inline]
    pub fn kind_name(&self) -> &'a str {
        self.tree.kinds.name(self.kind())
    }

    #[inline]
    pub fn is_named(&self) -> bool {
        self.tree.kinds.info(self.kind()).named
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.kind() == KindId::ERROR
    }

    /// Returns `true` if this node or any descendant is an error.
    #[inline]
    pub fn has_error(&self) -> bool {
        self.data.green.meta().has_error
    }

    /// The shared storage behind this node.
    #[inline]
    pub fn green(&self) -> &'a GreenNode {
        self.data.green
    }

    #[inline]
    pub fn tree(&self) -> &'a SyntaxTree {
        self.tree
    }

    /// Returns the range covered by this node, leading trivia included.
    #[inline]
    pub fn text_range(&self) -> TextRange {
        TextRange::at(self.data.offset, self.data.green.text_len())
    }

    /// Returns the range without the leading trivia and the trailing end token.
    pub fn trimmed_range(&self) -> TextRange {
        let range = self.text_range();
        let first = self.first_token().filter(|token| token.kind() != KindId::END);
        let mut last = self.last_token();
        if last.as_ref().is_some_and(|token| token.kind() == KindId::END) {
            last = last
                .and_then(|token| token.prev_token())
                .filter(|token| token.offset >= range.start());
        }
        match (first, last) {
            (Some(first), Some(last)) => {
                TextRange::new(first.trimmed_range().start(), last.text_range().end())
            }
            _ => TextRange::empty(range.start()),
        }
    }

    #[inline]
    pub fn text(&self) -> &'a [u8] {
        slice(&self.tree.text, self.text_range())
    }

    pub fn utf8_text(&self) -> Result<&'a str, std::str::Utf8Error> {
        std::str::from_utf8(self.text())
    }

    pub fn start_point(&self) -> Point {
        self.tree.point(self.trimmed_range().start())
    }

    pub fn end_point(&self) -> Point {
        self.tree.point(self.text_range().end())
    }

    /// Name of the field this node occupies in its parent.
    pub fn field_name(&self) -> Option<&'a str> {
        self.data.field.map(|field| self.tree.kinds.field_name(field))
    }

    /// Returns the parent node if any.
    #[inline]
    pub fn parent(&self) -> Option<Self> {
        self.data.parent.clone()
    }

    /// Returns an iterator of ancestors starting from this node.
    #[inline]
    pub fn ancestors(&self) -> impl Iterator<Item = SyntaxNode<'a>> + use<'a> {
        std::iter::successors(Some(self.clone()), |it| it.parent())
    }

    /// Iterates children including tokens.
    #[inline]
    pub fn children_with_tokens(&self) -> ChildrenWithTokens<'a> {
        ChildrenWithTokens {
            parent: self.clone(),
            slot: Slot::first(self.data.green, self.data.offset),
        }
    }

    /// Iterates child nodes, skipping tokens.
    #[inline]
    pub fn children(&self) -> Children<'a> {
        Children { inner: self.children_with_tokens() }
    }

    pub fn first_child_or_token(&self) -> Option<SyntaxElement<'a>> {
        Slot::first(self.data.green, self.data.offset).map(|slot| element_at(self, slot))
    }

    pub fn last_child_or_token(&self) -> Option<SyntaxElement<'a>> {
        Slot::last(self.data.green, self.data.offset).map(|slot| element_at(self, slot))
    }

    pub fn first_child(&self) -> Option<Self> {
        self.children().next()
    }

    pub fn last_child(&self) -> Option<Self> {
        let mut element = self.last_child_or_token();
        while let Some(current) = element {
            match current {
                NodeOrToken::Node(node) => return Some(node),
                NodeOrToken::Token(token) => element = token.prev_sibling_or_token(),
            }
        }
        None
    }

    pub fn next_sibling_or_token(&self) -> Option<SyntaxElement<'a>> {
        let parent = self.data.parent.as_ref()?;
        let mut slot = self.data.slot.clone();
        slot.advance().then(|| element_at(parent, slot))
    }

    pub fn prev_sibling_or_token(&self) -> Option<SyntaxElement<'a>> {
        let parent = self.data.parent.as_ref()?;
        let mut slot = self.data.slot.clone();
        slot.retreat().then(|| element_at(parent, slot))
    }

    pub fn next_sibling(&self) -> Option<Self> {
        let mut element = self.next_sibling_or_token();
        while let Some(current) = element {
            match current {
                NodeOrToken::Node(node) => return Some(node),
                NodeOrToken::Token(token) => element = token.next_sibling_or_token(),
            }
        }
        None
    }

    pub fn prev_sibling(&self) -> Option<Self> {
        let mut element = self.prev_sibling_or_token();
        while let Some(current) = element {
            match current {
                NodeOrToken::Node(node) => return Some(node),
                NodeOrToken::Token(token) => element = token.prev_sibling_or_token(),
            }
        }
        None
    }

    /// Returns the first child labelled with the field `name`.
    pub fn child_by_field(&self, name: &str) -> Option<SyntaxElement<'a>> {
        let field = self.tree.kinds.field_id(name)?;
        self.children_with_tokens().find(|child| child.field_id() == Some(field))
    }

    /// Returns every child labelled with the field `name`.
    pub fn children_by_field(
        &self,
        name: &str,
    ) -> impl Iterator<Item = SyntaxElement<'a>> + use<'a> {
        let field = self.tree.kinds.field_id(name);
        self.children_with_tokens()
            .filter(move |child| field.is_some() && child.field_id() == field)
    }

    /// Returns the first token spanned by this node.
    pub fn first_token(&self) -> Option<SyntaxToken<'a>> {
        self.preorder_with_tokens().find_map(|event| match event {
            WalkEventWithTokens::Token(token) => Some(token),
            _ => None,
        })
    }

    /// Returns the last token spanned by this node.
    pub fn last_token(&self) -> Option<SyntaxToken<'a>> {
        let mut element = self.last_child_or_token();
        while let Some(current) = element {
            match current {
                NodeOrToken::Token(token) => return Some(token),
                NodeOrToken::Node(node) => {
                    if let Some(token) = node.last_token() {
                        return Some(token);
                    }
                    element = node.prev_sibling_or_token();
                }
            }
        }
        None
    }

    /// Returns the token at the given offset, if any.
    pub fn token_at_offset(&self, offset: TextSize) -> TokenAtOffset<SyntaxToken<'a>> {
        let range = self.text_range();
        if offset < range.start() || offset >= range.end() {
            return TokenAtOffset::None;
        }

        let mut node = self.clone();
        let right = loop {
            let Some(slot) = Slot::at_offset(node.data.green, node.data.offset, offset) else {
                return TokenAtOffset::None;
            };
            match element_at(&node, slot) {
                NodeOrToken::Token(token) => break token,
                NodeOrToken::Node(child) => node = child,
            }
        };

        if right.offset == offset
            && offset > range.start()
            && let Some(left) = right.prev_token()
        {
            TokenAtOffset::Between(left, right)
        } else {
            TokenAtOffset::Single(right)
        }
    }

    /// Returns the smallest element that fully covers `range`.
    pub fn covering_element(&self, range: TextRange) -> SyntaxElement<'a> {
        let Some(token) = self.token_at_offset(range.start()).right_biased() else {
            return NodeOrToken::Node(self.clone());
        };
        if token.text_range().contains_range(range) {
            return NodeOrToken::Token(token);
        }
        let mut node = token.parent();
        loop {
            if node == *self || node.text_range().contains_range(range) {
                return NodeOrToken::Node(node);
            }
            match node.parent() {
                Some(parent) => node = parent,
                None => return NodeOrToken::Node(self.clone()),
            }
        }
    }

    /// Returns the deepest node containing `offset`.
    pub fn node_at_offset(&self, offset: TextSize) -> Option<Self> {
        Some(self.token_at_offset(offset).right_biased()?.parent())
    }

    /// Returns a preorder iterator over nodes.
    #[inline]
    pub fn preorder(&self) -> Preorder<'a> {
        Preorder::new(self.clone())
    }

    /// Returns a preorder iterator over nodes and tokens.
    #[inline]
    pub fn preorder_with_tokens(&self) -> PreorderWithTokens<'a> {
        PreorderWithTokens::new(self.clone())
    }

    /// Iterates this node and every descendant node in preorder.
    pub fn descendants(&self) -> impl Iterator<Item = SyntaxNode<'a>> + use<'a> {
        self.preorder().filter_map(|event| match event {
            WalkEvent::Enter(node) => Some(node),
            WalkEvent::Leave(_) => None,
        })
    }

    pub fn descendants_with_tokens(&self) -> impl Iterator<Item = SyntaxElement<'a>> + use<'a> {
        self.preorder_with_tokens().filter_map(|event| match event {
            WalkEventWithTokens::EnterNode(node) => Some(NodeOrToken::Node(node)),
            WalkEventWithTokens::Token(token) => Some(NodeOrToken::Token(token)),
            WalkEventWithTokens::LeaveNode(_) => None,
        })
    }

    pub fn descendants_of_kind(
        &self,
        kind: KindId,
    ) -> impl Iterator<Item = SyntaxNode<'a>> + use<'a> {
        self.descendants().filter(move |node| node.kind() == kind)
    }
}

impl PartialEq for SyntaxNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree)
            && self.data.offset == other.data.offset
            && self.data.green.ptr_eq(other.data.green)
    }
}

impl Eq for SyntaxNode<'_> {}

impl<'a> SyntaxToken<'a> {
    #[inline]
    pub fn kind(&self) -> KindId {
        self.green.kind()
    }

    #[inline]
    pub fn kind_name(&self) -> &'a str {
        self.tree.kinds.name(self.kind())
    }

    #[inline]
    pub fn is_named(&self) -> bool {
        self.tree.kinds.info(self.kind()).named
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.kind() == KindId::ERROR
    }

    #[inline]
    pub fn green(&self) -> &'a GreenToken {
        self.green
    }

    /// Returns the token text range including leading trivia.
    #[inline]
    pub fn text_range(&self) -> TextRange {
        TextRange::at(self.offset, self.green.text_len())
    }

    /// Returns the token text range excluding trivia.
    #[inline]
    pub fn trimmed_range(&self) -> TextRange {
        TextRange::new(self.offset + self.green.leading().len(), self.text_range().end())
    }

    /// Returns the token text including trivia.
    #[inline]
    pub fn text(&self) -> &'a [u8] {
        slice(&self.tree.text, self.text_range())
    }

    /// Returns the token text excluding trivia.
    #[inline]
    pub fn text_trimmed(&self) -> &'a [u8] {
        slice(&self.tree.text, self.trimmed_range())
    }

    pub fn utf8_text(&self) -> Result<&'a str, std::str::Utf8Error> {
        std::str::from_utf8(self.text_trimmed())
    }

    pub fn leading_trivia(&self) -> &'a [TriviaPiece] {
        self.green.leading().pieces()
    }

    pub fn start_point(&self) -> Point {
        self.tree.point(self.trimmed_range().start())
    }

    pub fn end_point(&self) -> Point {
        self.tree.point(self.text_range().end())
    }

    pub fn field_name(&self) -> Option<&'a str> {
        self.field.map(|field| self.tree.kinds.field_name(field))
    }

    /// Returns the parent node.
    #[inline]
    pub fn parent(&self) -> SyntaxNode<'a> {
        self.parent.clone()
    }

    /// Returns an iterator of parent nodes, starting from the immediate parent.
    #[inline]
    pub fn parent_ancestors(&self) -> impl Iterator<Item = SyntaxNode<'a>> + use<'a> {
        self.parent().ancestors()
    }

    pub fn next_sibling_or_token(&self) -> Option<SyntaxElement<'a>> {
        let mut slot = self.slot.clone();
        slot.advance().then(|| element_at(&self.parent, slot))
    }

    pub fn prev_sibling_or_token(&self) -> Option<SyntaxElement<'a>> {
        let mut slot = self.slot.clone();
        slot.retreat().then(|| element_at(&self.parent, slot))
    }

    /// Returns the next token in the whole tree, if any.
    pub fn next_token(&self) -> Option<Self> {
        let mut element = NodeOrToken::Token(self.clone());
        loop {
            let mut sibling = element.next_sibling_or_token();
            while let Some(current) = sibling {
                match current {
                    NodeOrToken::Token(token) => return Some(token),
                    NodeOrToken::Node(node) => {
                        if let Some(token) = node.first_token() {
                            return Some(token);
                        }
                        sibling = node.next_sibling_or_token();
                    }
                }
            }
            element = NodeOrToken::Node(element.parent()?);
        }
    }

    /// Returns the previous token in the whole tree, if any.
    pub fn prev_token(&self) -> Option<Self> {
        let mut element = NodeOrToken::Token(self.clone());
        loop {
            let mut sibling = element.prev_sibling_or_token();
            while let Some(current) = sibling {
                match current {
                    NodeOrToken::Token(token) => return Some(token),
                    NodeOrToken::Node(node) => {
                        if let Some(token) = node.last_token() {
                            return Some(token);
                        }
                        sibling = node.prev_sibling_or_token();
                    }
                }
            }
            element = NodeOrToken::Node(element.parent()?);
        }
    }
}

impl PartialEq for SyntaxToken<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree)
            && self.offset == other.offset
            && self.green.ptr_eq(other.green)
    }
}

impl Eq for SyntaxToken<'_> {}

impl<'a> SyntaxElement<'a> {
    pub fn kind(&self) -> KindId {
        match self {
            NodeOrToken::Node(node) => node.kind(),
            NodeOrToken::Token(token) => token.kind(),
        }
    }

    pub fn text_range(&self) -> TextRange {
        match self {
            NodeOrToken::Node(node) => node.text_range(),
            NodeOrToken::Token(token) => token.text_range(),
        }
    }

    pub fn parent(&self) -> Option<SyntaxNode<'a>> {
        match self {
            NodeOrToken::Node(node) => node.parent(),
            NodeOrToken::Token(token) => Some(token.parent()),
        }
    }

    pub fn next_sibling_or_token(&self) -> Option<Self> {
        match self {
            NodeOrToken::Node(node) => node.next_sibling_or_token(),
            NodeOrToken::Token(token) => token.next_sibling_or_token(),
        }
    }

    pub fn prev_sibling_or_token(&self) -> Option<Self> {
        match self {
            NodeOrToken::Node(node) => node.prev_sibling_or_token(),
            NodeOrToken::Token(token) => token.prev_sibling_or_token(),
        }
    }

    fn field_id(&self) -> Option<FieldId> {
        match self {
            NodeOrToken::Node(node) => node.data.field,
            NodeOrToken::Token(token) => token.field,
        }
    }
}

/// Iterator over children including tokens, flattening ropes.
#[derive(Clone)]
pub struct ChildrenWithTokens<'a> {
    parent: SyntaxNode<'a>,
    slot: Option<Slot<'a>>,
}

impl<'a> Iterator for ChildrenWithTokens<'a> {
    type Item = SyntaxElement<'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.slot.take()?;
        let mut next = slot.clone();
        if next.advance() {
            self.slot = Some(next);
        }
        Some(element_at(&self.parent, slot))
    }
}

/// Iterator over child nodes only.
#[derive(Clone)]
pub struct Children<'a> {
    inner: ChildrenWithTokens<'a>,
}

impl<'a> Iterator for Children<'a> {
    type Item = SyntaxNode<'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.find_map(NodeOrToken::into_node)
    }
}

/// Preorder traversal over nodes.
#[derive(Clone)]
pub struct Preorder<'a> {
    inner: PreorderWithTokens<'a>,
}

impl<'a> Preorder<'a> {
    #[inline]
    fn new(start: SyntaxNode<'a>) -> Self {
        Self { inner: PreorderWithTokens::new(start) }
    }

    /// Skips the current subtree during traversal.
    #[inline]
    pub fn skip_subtree(&mut self) {
        self.inner.skip_subtree();
    }

    /// Starts the traversal over from its first node.
    #[inline]
    pub fn restart(&mut self) {
        self.inner.restart();
    }
}

impl<'a> Iterator for Preorder<'a> {
    type Item = WalkEvent<'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.find_map(|item| match item {
            WalkEventWithTokens::EnterNode(it) => Some(WalkEvent::Enter(it)),
            WalkEventWithTokens::LeaveNode(it) => Some(WalkEvent::Leave(it)),
            WalkEventWithTokens::Token(_) => None,
        })
    }
}

/// Preorder walk event for nodes.
#[derive(Clone)]
pub enum WalkEvent<'a> {
    Enter(SyntaxNode<'a>),
    Leave(SyntaxNode<'a>),
}

/// Preorder traversal over nodes and tokens.
#[derive(Clone)]
pub struct PreorderWithTokens<'a> {
    stack: Vec<(SyntaxNode<'a>, ChildrenWithTokens<'a>)>,
    start: SyntaxNode<'a>,
    pending: bool,
}

impl<'a> PreorderWithTokens<'a> {
    #[inline]
    fn new(start: SyntaxNode<'a>) -> Self {
        Self { stack: Vec::with_capacity(32), start, pending: true }
    }

    /// Skips the current subtree during traversal.
    #[inline]
    pub fn skip_subtree(&mut self) {
        assert!(self.stack.pop().is_some(), "must have a subtree to skip");
    }

    /// Starts the traversal over from its first node.
    pub fn restart(&mut self) {
        self.stack.clear();
        self.pending = true;
    }
}

impl<'a> Iterator for PreorderWithTokens<'a> {
    type Item = WalkEventWithTokens<'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let Some((_, active_node)) = self.stack.last_mut() else {
            if !self.pending {
                return None;
            }
            self.pending = false;
            let root = self.start.clone();
            self.stack.push((root.clone(), root.children_with_tokens()));
            return Some(WalkEventWithTokens::EnterNode(root));
        };
        match active_node.next() {
            Some(NodeOrToken::Node(child)) => {
                self.stack.push((child.clone(), child.children_with_tokens()));
                Some(WalkEventWithTokens::EnterNode(child))
            }
            Some(NodeOrToken::Token(child)) => Some(WalkEventWithTokens::Token(child)),
            None => {
                let (exited_node, _) = self.stack.pop().expect("should have an exited-from node");
                Some(WalkEventWithTokens::LeaveNode(exited_node))
            }
        }
    }
}

/// Preorder walk event including tokens.
#[derive(Clone)]
pub enum WalkEventWithTokens<'a> {
    EnterNode(SyntaxNode<'a>),
    LeaveNode(SyntaxNode<'a>),
    Token(SyntaxToken<'a>),
}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut depth = 0;
        for event in self.preorder_with_tokens() {
            match event {
                WalkEventWithTokens::EnterNode(node) => {
                    write!(f, "{:indent$}", "", indent = depth * 2)?;
                    if let Some(field) = node.field_name() {
                        write!(f, "{field}: ")?;
                    }
                    writeln!(f, "{}@{:?}", node.kind_name(), node.text_range())?;
                    depth += 1;
                }
                WalkEventWithTokens::LeaveNode(_) => depth -= 1,
                WalkEventWithTokens::Token(token) => {
                    writeln!(f, "{:indent$}{token:?}", "", indent = depth * 2)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for SyntaxToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(field) = self.field_name() {
            write!(f, "{field}: ")?;
        }
        let range = self.trimmed_range();
        if self.is_named() {
            let text = String::from_utf8_lossy(self.text_trimmed());
            write!(f, "{}@{range:?} {text:?}", self.kind_name())
        } else {
            write!(f, "'{}'@{range:?}", self.kind_name())
        }
    }
}

/// Node-or-token wrapper used throughout the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeOrToken<N, T> {
    Node(N),
    Token(T),
}

impl<N, T> NodeOrToken<N, T> {
    /// Converts into the node variant, if any.
    pub fn into_node(self) -> Option<N> {
        match self {
            NodeOrToken::Node(node) => Some(node),
            NodeOrToken::Token(_) => None,
        }
    }

    /// Converts into the token variant, if any.
    pub fn into_token(self) -> Option<T> {
        match self {
            NodeOrToken::Node(_) => None,
            NodeOrToken::Token(token) => Some(token),
        }
    }

    /// Returns a shared reference to the node, if any.
    pub fn as_node(&self) -> Option<&N> {
        match self {
            NodeOrToken::Node(node) => Some(node),
            NodeOrToken::Token(_) => None,
        }
    }

    /// Returns a shared reference to the token, if any.
    pub fn as_token(&self) -> Option<&T> {
        match self {
            NodeOrToken::Node(_) => None,
            NodeOrToken::Token(token) => Some(token),
        }
    }
}

/// There might be zero, one or two tokens at a given offset.
#[derive(Clone, Debug)]
pub enum TokenAtOffset<T> {
    /// No tokens at offset.
    None,
    /// Only a single token at offset.
    Single(T),
    /// Offset is exactly between two tokens.
    Between(T, T),
}

impl<T> TokenAtOffset<T> {
    /// Maps tokens to a different type.
    pub fn map<F: Fn(T) -> U, U>(self, f: F) -> TokenAtOffset<U> {
        match self {
            TokenAtOffset::None => TokenAtOffset::None,
            TokenAtOffset::Single(it) => TokenAtOffset::Single(f(it)),
            TokenAtOffset::Between(l, r) => TokenAtOffset::Between(f(l), f(r)),
        }
    }

    /// Convert to option, preferring the right token in case of a tie.
    pub fn right_biased(self) -> Option<T> {
        match self {
            Self::None => None,
            Self::Single(node) => Some(node),
            Self::Between(_, right) => Some(right),
        }
    }

    /// Convert to option, preferring the left token in case of a tie.
    pub fn left_biased(self) -> Option<T> {
        match self {
            Self::None => None,
            Self::Single(node) => Some(node),
            Self::Between(left, _) => Some(left),
        }
    }
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::*;
    use crate::{GreenTrivia, KindInfo, LexMode, NodeInfo, TriviaPieceKind, rope};

    const NUMBER: KindId = KindId(2);
    const PLUS: KindId = KindId(3);
    const EXPR: KindId = KindId(4);
    const LIST: KindId = KindId(5);
    const ROOT: KindId = KindId(6);

    fn kinds() -> KindTable {
        let mut kinds = KindTable::new();
        for (name, named, visible, terminal) in [
            ("end", true, true, true),
            ("ERROR", true, true, true),
            ("number", true, true, true),
            ("+", false, true, true),
            ("expr", true, true, false),
            ("_list", true, false, false),
            ("root", true, true, false),
        ] {
            kinds.push(KindInfo { name: name.into(), named, visible, terminal });
        }
        for field in ["left", "right", "items"] {
            kinds.push_field(field);
        }
        kinds
    }

    fn token(kind: KindId, leading: u32, len: u32) -> GreenToken {
        let leading = if leading == 0 {
            GreenTrivia::empty()
        } else {
            GreenTrivia::new(&[TriviaPiece::new(TriviaPieceKind::Whitespace, leading.into())])
        };
        GreenToken::new(kind, leading, len.into(), LexMode(1), 0)
    }

    /// `1+ 22 3 4 ` as `root(expr(1 + 22) [3 4] end)`, the list stored as a rope.
    fn tree() -> SyntaxTree {
        let kinds = kinds();
        let field = |name| kinds.field_id(name);
        let expr = GreenNode::new(
            EXPR,
            vec![
                GreenChild::new(token(NUMBER, 0, 1), field("left")),
                GreenChild::new(token(PLUS, 0, 1), None),
                GreenChild::new(token(NUMBER, 1, 3), field("right")),
            ],
            NodeInfo::default(),
        );
        let number = || vec![GreenChild::new(token(NUMBER, 1, 2), None)];
        let three = rope::base(LIST, number(), NodeInfo::default());
        let four = rope::base(LIST, number(), NodeInfo::default());
        let list = rope::join(LIST, three, four);
        let root = GreenNode::new(
            ROOT,
            vec![
                GreenChild::new(expr, None),
                GreenChild::new(list, field("items")),
                GreenChild::new(token(KindId::END, 1, 1), None),
            ],
            NodeInfo::default(),
        );
        let language = LanguageId { name: "test".into(), version: 1, fingerprint: 0 };
        SyntaxTree::new(root, Arc::from(&b"1+ 22 3 4 "[..]), Arc::new(kinds), language)
    }

    #[test]
    fn debug_dump_flattens_ropes() {
        let tree = tree();
        expect![[r#"
            root@0..10
              expr@0..5
                left: number@0..1 "1"
                '+'@1..2
                right: number@3..5 "22"
              items: number@6..7 "3"
              items: number@8..9 "4"
              end@10..10 ""
        "#]]
        .assert_eq(&format!("{tree:?}"));
    }

    #[test]
    fn sibling_navigation_crosses_rope_boundaries() {
        let tree = tree();
        let root = tree.root();
        let kinds: Vec<_> = root.children_with_tokens().map(|child| child.kind()).collect();
        assert_eq!(kinds, [EXPR, NUMBER, NUMBER, KindId::END]);

        let expr = root.first_child().unwrap();
        assert_eq!(expr.next_sibling(), None);
        let three = expr.next_sibling_or_token().unwrap().into_token().unwrap();
        assert_eq!(three.utf8_text(), Ok("3"));
        let four = three.next_sibling_or_token().unwrap().into_token().unwrap();
        assert_eq!(four.utf8_text(), Ok("4"));
        assert_eq!(four.prev_sibling_or_token().unwrap().into_token(), Some(three.clone()));
        assert_eq!(three.prev_sibling_or_token().unwrap().into_node(), Some(expr.clone()));
        assert_eq!(root.last_child(), Some(expr));
        assert_eq!(four.parent(), root);
    }

    #[test]
    fn fields_are_inherited_from_ropes() {
        let tree = tree();
        let root = tree.root();
        let expr = root.first_child().unwrap();

        let right = expr.child_by_field("right").unwrap().into_token().unwrap();
        assert_eq!(right.text(), b" 22");
        assert_eq!(right.text_trimmed(), b"22");
        assert_eq!(expr.text(), b"1+ 22");
        assert_eq!(root.text(), tree.text());
        assert_eq!(root.children_by_field("items").count(), 2);
        assert!(root.child_by_field("condition").is_none());
    }

    #[test]
    fn offsets_resolve_to_tokens() {
        let tree = tree();
        let root = tree.root();

        match root.token_at_offset(5.into()) {
            TokenAtOffset::Between(left, right) => {
                assert_eq!(left.utf8_text(), Ok("22"));
                assert_eq!(right.utf8_text(), Ok("3"));
            }
            other => panic!("unexpected {other:?}"),
        }
        let token = root.token_at_offset(6.into()).right_biased().unwrap();
        assert_eq!(token.trimmed_range(), TextRange::new(6.into(), 7.into()));
        assert!(matches!(root.token_at_offset(0.into()), TokenAtOffset::Single(_)));
        assert!(matches!(root.token_at_offset(10.into()), TokenAtOffset::None));

        let covering = root.covering_element(TextRange::new(0.into(), 3.into()));
        assert_eq!(covering.kind(), EXPR);
        assert_eq!(root.node_at_offset(7.into()), Some(root.clone()));
        assert_eq!(root.node_at_offset(1.into()).map(|node| node.kind()), Some(EXPR));
    }

    #[test]
    fn tokens_are_linked_in_order() {
        let tree = tree();
        let root = tree.root();
        let first = root.first_token().unwrap();
        let texts: Vec<_> = std::iter::successors(Some(first), |token| token.next_token())
            .map(|token| String::from_utf8_lossy(token.text_trimmed()).into_owned())
            .collect();
        assert_eq!(texts, ["1", "+", "22", "3", "4", ""]);

        let last = root.last_token().unwrap();
        assert_eq!(last.kind(), KindId::END);
        assert_eq!(last.prev_token().unwrap().utf8_text(), Ok("4"));
        assert_eq!(root.trimmed_range(), TextRange::new(0.into(), 9.into()));
        assert_eq!(last.end_point(), Point::new(0, 10));
    }

    #[test]
    fn preorder_can_skip_and_restart() {
        let tree = tree();
        let root = tree.root();

        let mut preorder = root.preorder();
        let mut entered = Vec::new();
        while let Some(event) = preorder.next() {
            if let WalkEvent::Enter(node) = event {
                entered.push(node.kind());
                if node.kind() == EXPR {
                    preorder.skip_subtree();
                }
            }
        }
        assert_eq!(entered, [ROOT, EXPR]);

        preorder.restart();
        assert_eq!(preorder.count(), 4);
        assert_eq!(root.descendants_of_kind(EXPR).count(), 1);
        assert_eq!(root.descendants_with_tokens().count(), 8);
    }
}
