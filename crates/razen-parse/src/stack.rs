use razen_grammar::{GrammarTable, ProductionId, ProductionKind};
use razen_yellow::{
    FieldId, GreenChild, GreenElement, GreenNode, GreenToken, KindId, LexMode, NodeInfo,
    NodeOrToken, StateId, rope,
};
use text_size::TextSize;

#[derive(Clone, Debug)]
pub(crate) struct Entry {
    /// State reached after this entry. Extras repeat the state below them.
    pub(crate) state: StateId,
    pub(crate) element: GreenElement,
    /// Error nodes sit on the stack without taking part in the automaton.
    pub(crate) is_extra: bool,
    pub(crate) offset: TextSize,
}

impl Entry {
    fn end(&self) -> TextSize {
        self.offset + self.element.text_len()
    }
}

#[derive(Debug, Default)]
pub(crate) struct Stack {
    entries: Vec<Entry>,
}

impl Stack {
    pub(crate) fn state(&self) -> StateId {
        self.entries.last().map_or(GrammarTable::START_STATE, |entry| entry.state)
    }

    pub(crate) fn end(&self) -> TextSize {
        self.entries.last().map_or(TextSize::new(0), Entry::end)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub(crate) fn last(&self) -> Option<&Entry> {
        self.entries.last()
    }

    pub(crate) fn pop(&mut self) -> Option<Entry> {
        self.entries.pop()
    }

    /// Removes and returns the entries from `at` upwards.
    pub(crate) fn split_off(&mut self, at: usize) -> Vec<Entry> {
        self.entries.split_off(at)
    }

    pub(crate) fn push(&mut self, state: StateId, element: GreenElement) {
        let offset = self.end();
        self.entries.push(Entry { state, element, is_extra: false, offset });
    }

    pub(crate) fn push_extra(&mut self, element: GreenElement) {
        let (state, offset) = (self.state(), self.end());
        self.entries.push(Entry { state, element, is_extra: true, offset });
    }

    /// Non-extra states from the bottom, the start state first.
    pub(crate) fn states(&self) -> Vec<StateId> {
        let mut states = Vec::with_capacity(self.entries.len() + 1);
        states.push(GrammarTable::START_STATE);
        states.extend(self.entries.iter().filter(|entry| !entry.is_extra).map(|entry| entry.state));
        states
    }

    /// Replaces the entries matched by `production` with the node it builds.
    ///
    /// Extras between the popped entries become children; extras above the
    /// last one are put back on top of the new node, which is then marked
    /// fragile. `lookahead_mode` is the mode the lookahead was lexed in.
    pub(crate) fn reduce(
        &mut self,
        table: &GrammarTable,
        production: ProductionId,
        lookahead_end: TextSize,
        lookahead_mode: LexMode,
    ) {
        let production_id = production;
        let production = table.production(production_id);

        let trailing_start =
            self.entries.iter().rposition(|entry| !entry.is_extra).map_or(0, |i| i + 1);
        let trailing = self.entries.split_off(trailing_start);

        let mut split = self.entries.len();
        let mut remaining = production.len();
        while remaining > 0 {
            split -= 1;
            if !self.entries[split].is_extra {
                remaining -= 1;
            }
        }
        let popped = self.entries.split_off(split);

        let pre_state = self.state();
        let start = self.end();
        let Some(next) = table.goto(pre_state, production.lhs) else {
            unreachable!("no goto on {:?} from state {}", production_id, pre_state.index())
        };
        let info = NodeInfo {
            pre_state,
            lex_mode: table.lex_mode(pre_state),
            next_lex_mode: lookahead_mode,
            decision_end: lookahead_end.checked_sub(start).unwrap_or_default(),
            fragile: !trailing.is_empty(),
            rope_height: 0,
        };

        let node = build(table, production_id, popped, info);
        let element = node.into();
        self.entries.push(Entry { state: next, element, is_extra: false, offset: start });
        for extra in trailing {
            self.entries.push(Entry { state: next, ..extra });
        }
    }

    /// Root of an accepted parse: the start node's children surrounded by
    /// the extras left on the stack.
    pub(crate) fn into_root(self, table: &GrammarTable, end: Option<GreenToken>) -> GreenNode {
        let mut kind = KindId::ERROR;
        let mut children = Vec::new();
        for entry in self.entries {
            match entry.element {
                NodeOrToken::Node(node) if !entry.is_extra => {
                    kind = node.kind();
                    children.extend(node.children().iter().cloned());
                }
                element => children.push(GreenChild::new(element, None)),
            }
        }
        children.extend(end.map(|token| GreenChild::new(token, None)));
        GreenNode::new(kind, children, root_info(table))
    }

    /// Root for input that could not be recovered before its end.
    pub(crate) fn into_error_root(
        self,
        table: &GrammarTable,
        end: Option<GreenToken>,
    ) -> GreenNode {
        let mut children = Vec::new();
        for entry in self.entries {
            push_error_child(table, &mut children, entry.element);
        }
        children.extend(end.map(|token| GreenChild::new(token, None)));
        GreenNode::new(KindId::ERROR, children, root_info(table))
    }
}

fn root_info(table: &GrammarTable) -> NodeInfo {
    let mode = table.lex_mode(GrammarTable::START_STATE);
    NodeInfo {
        pre_state: GrammarTable::START_STATE,
        lex_mode: mode,
        next_lex_mode: mode,
        ..NodeInfo::default()
    }
}

fn build(
    table: &GrammarTable,
    production: ProductionId,
    popped: Vec<Entry>,
    info: NodeInfo,
) -> GreenNode {
    let production = table.production(production);
    let kind = production.lhs;

    if production.kind == ProductionKind::RepeatJoin
        && !info.fragile
        && let [left, right] = popped.as_slice()
        && let (NodeOrToken::Node(left), NodeOrToken::Node(right)) = (&left.element, &right.element)
        && left.is_rope()
        && right.is_rope()
    {
        return rope::join(kind, left.clone(), right.clone());
    }

    let mut children = Vec::with_capacity(popped.len());
    let mut fields = production.fields.iter();
    for entry in popped {
        let field = if entry.is_extra { None } else { fields.next().copied().flatten() };
        push_child(table, &mut children, entry.element, field);
    }

    match production.kind {
        ProductionKind::Plain => GreenNode::new(kind, children, info),
        ProductionKind::RepeatBase | ProductionKind::RepeatJoin => rope::base(kind, children, info),
    }
}

/// Pushes `element`, splicing the children of hidden nodes in its place.
/// Spliced children without a field of their own take `field`.
fn push_child(
    table: &GrammarTable,
    children: &mut Vec<GreenChild>,
    element: GreenElement,
    field: Option<FieldId>,
) {
    match element {
        NodeOrToken::Node(node) if !node.is_rope() && table.is_hidden(node.kind()) => {
            children.extend(
                node.children()
                    .iter()
                    .map(|child| GreenChild::new(child.element.clone(), child.field.or(field))),
            );
        }
        element => children.push(GreenChild::new(element, field)),
    }
}

/// Like [`push_child`], and also flattens nested error nodes.
fn push_error_child(table: &GrammarTable, children: &mut Vec<GreenChild>, element: GreenElement) {
    match element {
        NodeOrToken::Node(node) if node.kind() == KindId::ERROR => {
            children.extend(
                node.children().iter().map(|child| GreenChild::new(child.element.clone(), None)),
            );
        }
        element => push_child(table, children, element, None),
    }
}

/// Wraps `elements` into one error node.
pub(crate) fn error_node(
    table: &GrammarTable,
    elements: Vec<GreenElement>,
    pre_state: StateId,
    decision_end: TextSize,
) -> GreenNode {
    let mut children = Vec::with_capacity(elements.len());
    for element in elements {
        push_error_child(table, &mut children, element);
    }
    let mode = table.lex_mode(pre_state);
    let info = NodeInfo {
        pre_state,
        lex_mode: mode,
        next_lex_mode: mode,
        decision_end,
        ..NodeInfo::default()
    };
    GreenNode::new(KindId::ERROR, children, info)
}
