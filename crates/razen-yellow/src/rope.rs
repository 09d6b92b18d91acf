//! Balanced concatenation of repetition ropes.
//!
//! A rope is either a base node holding the children of one repetition or a
//! join node holding exactly two ropes of the same kind. Joins keep the AVL
//! height invariant, so long lists stay shallow and are reused in
//! logarithmic pieces. Every join allocates fresh nodes on the path it
//! rebuilds and shares the rest.

use crate::green::{GreenChild, GreenNode, NodeInfo};
use crate::{KindId, NodeOrToken};

/// Concatenates two ropes of kind `kind`.
pub fn join(kind: KindId, left: GreenNode, right: GreenNode) -> GreenNode {
    let (left_height, right_height) = (height(&left), height(&right));
    if left_height > right_height + 1 {
        join_right(kind, left, right)
    } else if right_height > left_height + 1 {
        join_left(kind, left, right)
    } else {
        pair(kind, left, right)
    }
}

/// Wraps the children of a single repetition into a base rope.
pub fn base(kind: KindId, children: Vec<GreenChild>, info: NodeInfo) -> GreenNode {
    GreenNode::new(kind, children, NodeInfo { rope_height: 1, ..info })
}

fn height(node: &GreenNode) -> u16 {
    node.meta().rope_height
}

fn halves(node: &GreenNode) -> (GreenNode, GreenNode) {
    match node.children() {
        [
            GreenChild { element: NodeOrToken::Node(left), .. },
            GreenChild { element: NodeOrToken::Node(right), .. },
        ] => (left.clone(), right.clone()),
        _ => unreachable!("rope of height {} is not a join", height(node)),
    }
}

fn pair(kind: KindId, left: GreenNode, right: GreenNode) -> GreenNode {
    let info = NodeInfo {
        pre_state: left.meta().pre_state,
        lex_mode: left.meta().first_lex_mode,
        next_lex_mode: right.meta().next_lex_mode,
        rope_height: height(&left).max(height(&right)) + 1,
        ..NodeInfo::default()
    };
    GreenNode::new(kind, vec![GreenChild::new(left, None), GreenChild::new(right, None)], info)
}

fn rotate_left(kind: KindId, node: &GreenNode) -> GreenNode {
    let (a, right) = halves(node);
    let (b, c) = halves(&right);
    pair(kind, pair(kind, a, b), c)
}

fn rotate_right(kind: KindId, node: &GreenNode) -> GreenNode {
    let (left, c) = halves(node);
    let (a, b) = halves(&left);
    pair(kind, a, pair(kind, b, c))
}

fn join_right(kind: KindId, left: GreenNode, right: GreenNode) -> GreenNode {
    let (a, b) = halves(&left);
    if height(&b) <= height(&right) + 1 {
        let joined = pair(kind, b, right);
        if height(&joined) <= height(&a) + 1 {
            pair(kind, a, joined)
        } else {
            rotate_left(kind, &pair(kind, a, rotate_right(kind, &joined)))
        }
    } else {
        let joined = join_right(kind, b, right);
        let fits = height(&joined) <= height(&a) + 1;
        let node = pair(kind, a, joined);
        if fits { node } else { rotate_left(kind, &node) }
    }
}

fn join_left(kind: KindId, left: GreenNode, right: GreenNode) -> GreenNode {
    let (a, b) = halves(&right);
    if height(&a) <= height(&left) + 1 {
        let joined = pair(kind, left, a);
        if height(&joined) <= height(&b) + 1 {
            pair(kind, joined, b)
        } else {
            rotate_right(kind, &pair(kind, rotate_left(kind, &joined), b))
        }
    } else {
        let joined = join_left(kind, left, a);
        let fits = height(&joined) <= height(&b) + 1;
        let node = pair(kind, joined, b);
        if fits { node } else { rotate_right(kind, &node) }
    }
}
