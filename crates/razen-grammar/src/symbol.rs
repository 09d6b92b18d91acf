use razen_yellow::{FieldId, KindId};

/// Index of a nonterminal, counted from the first nonterminal kind.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NonterminalId(pub u16);

impl NonterminalId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ProductionId(pub u16);

impl ProductionId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Symbol {
    Terminal(KindId),
    Nonterminal(NonterminalId),
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Assoc {
    #[default]
    None,
    Left,
    Right,
}

/// How the parser assembles the node of a production.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ProductionKind {
    Plain,
    /// `_rep -> elements`: the base rope of a repetition.
    RepeatBase,
    /// `_rep -> _rep _rep`: concatenation of two ropes.
    RepeatJoin,
}

#[derive(Clone, Debug)]
pub(crate) struct Step {
    pub(crate) symbol: Symbol,
    pub(crate) field: Option<FieldId>,
    pub(crate) precedence: i32,
}

#[derive(Clone, Debug)]
pub(crate) struct Production {
    pub(crate) lhs: NonterminalId,
    pub(crate) steps: Vec<Step>,
    /// Precedence in effect at the end of the production.
    pub(crate) precedence: i32,
    pub(crate) assoc: Assoc,
    pub(crate) kind: ProductionKind,
}
