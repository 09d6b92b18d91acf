use razen_yellow::{GreenElement, GreenNode, KindId, NodeOrToken};
use text_size::TextSize;

use crate::edit::Change;

/// Cursor over the previous tree that offers subtrees for reuse.
///
/// Requests come at increasing offsets of the new text, so the cursor only
/// ever moves forward: finished nodes are popped, and a rejected node is
/// entered instead of skipped.
pub(crate) struct ReusableNode {
    frames: Vec<Frame>,
    change: Change,
}

struct Frame {
    node: GreenNode,
    /// Offset of `node` in the old text.
    start: TextSize,
    index: usize,
}

impl ReusableNode {
    pub(crate) fn new(root: &GreenNode, change: Change) -> Self {
        let frame = Frame { node: root.clone(), start: TextSize::new(0), index: 0 };
        Self { frames: vec![frame], change }
    }

    /// The largest reusable old element starting at `position` in the new
    /// text. The caller still checks that its first token lexes the same in
    /// the current mode.
    pub(crate) fn candidate(&mut self, position: TextSize) -> Option<GreenElement> {
        let target = self.change.to_old(position)?;
        loop {
            let (element, start) = self.seek(target)?;
            if self.is_reusable(&element, start) {
                return Some(element);
            }
            match element {
                NodeOrToken::Node(_) => self.descend(),
                NodeOrToken::Token(_) => return None,
            }
        }
    }

    /// Enters the element last returned by [`ReusableNode::candidate`].
    pub(crate) fn descend(&mut self) {
        let Some(frame) = self.frames.last() else { return };
        let Some(child) = frame.node.children().get(frame.index) else { return };
        if let NodeOrToken::Node(node) = &child.element {
            let start = frame.start + child.offset();
            self.frames.push(Frame { node: node.clone(), start, index: 0 });
        }
    }

    fn is_reusable(&self, element: &GreenElement, start: TextSize) -> bool {
        let kind = element.kind();
        let len = element.text_len();
        let fragile = match element {
            NodeOrToken::Node(node) => node.meta().fragile,
            NodeOrToken::Token(_) => false,
        };
        let lookahead_end = start + len + TextSize::new(element.lookahead_len());

        len > TextSize::new(0)
            && !element.has_error()
            && !fragile
            && kind != KindId::END
            && !self.change.affects(start, lookahead_end)
    }

    /// Moves to the element starting exactly at old offset `target`,
    /// entering nodes that contain it. Empty elements are never returned.
    fn seek(&mut self, target: TextSize) -> Option<(GreenElement, TextSize)> {
        loop {
            let frame = self.frames.last_mut()?;
            let Some(child) = frame.node.children().get(frame.index) else {
                self.frames.pop();
                if let Some(parent) = self.frames.last_mut() {
                    parent.index += 1;
                }
                continue;
            };

            let start = frame.start + child.offset();
            let end = start + child.element.text_len();
            if end <= target {
                frame.index += 1;
            } else if start > target {
                return None;
            } else if start == target {
                return Some((child.element.clone(), start));
            } else {
                match &child.element {
                    NodeOrToken::Node(node) => {
                        let node = node.clone();
                        self.frames.push(Frame { node, start, index: 0 });
                    }
                    NodeOrToken::Token(_) => return None,
                }
            }
        }
    }
}
