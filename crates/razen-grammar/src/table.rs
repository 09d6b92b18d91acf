use std::sync::Arc;

use razen_yellow::{FieldId, KindId, KindTable, LexMode, StateId};

use crate::{NonterminalId, ProductionId, ProductionKind, Symbol, TerminalSet};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Action {
    Error,
    Shift(StateId),
    Reduce(ProductionId),
    Accept,
}

#[derive(Clone, Debug, Hash)]
pub struct ProductionInfo {
    pub lhs: KindId,
    pub symbols: Box<[Symbol]>,
    pub fields: Box<[Option<FieldId>]>,
    pub kind: ProductionKind,
}

impl ProductionInfo {
    #[inline]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Terminal vocabulary the lexer works with.
#[derive(Clone, Debug, Default)]
pub struct LexicalGrammar {
    /// Literal texts in order of first use.
    pub literals: Vec<(Box<str>, KindId)>,
    /// Tokens produced by the language scanner, in declaration order.
    pub tokens: Vec<KindId>,
    /// Immediate tokens produced by the external scanner, in declaration order.
    pub externals: Vec<KindId>,
    pub word: Option<KindId>,
}

/// Compiled LALR(1) automaton of a grammar.
///
/// Actions and gotos are dense rows indexed by state; lex modes group the
/// states that accept the same set of terminals.
#[derive(Debug)]
pub struct GrammarTable {
    pub(crate) name: Box<str>,
    pub(crate) version: u32,
    pub(crate) fingerprint: u64,
    pub(crate) kinds: Arc<KindTable>,
    pub(crate) terminal_count: usize,
    pub(crate) productions: Box<[ProductionInfo]>,
    pub(crate) actions: Box<[Action]>,
    pub(crate) gotos: Box<[u16]>,
    pub(crate) state_lex_modes: Box<[LexMode]>,
    pub(crate) lex_modes: Box<[TerminalSet]>,
    pub(crate) repeats: Box<[bool]>,
    pub(crate) lexical: LexicalGrammar,
    pub(crate) conflicts: usize,
}

pub(crate) const NO_GOTO: u16 = u16::MAX;

impl GrammarTable {
    pub const START_STATE: StateId = StateId(0);

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Stable hash of the automaton, used to tell tables apart.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn kinds(&self) -> &Arc<KindTable> {
        &self.kinds
    }

    pub fn terminal_count(&self) -> usize {
        self.terminal_count
    }

    pub fn nonterminal_count(&self) -> usize {
        self.kinds.len() - self.terminal_count
    }

    pub fn state_count(&self) -> usize {
        self.state_lex_modes.len()
    }

    /// Shift/reduce conflicts that were settled by the conflict policy.
    pub fn conflicts(&self) -> usize {
        self.conflicts
    }

    #[inline]
    pub fn is_terminal(&self, kind: KindId) -> bool {
        kind.index() < self.terminal_count
    }

    pub fn symbol(&self, kind: KindId) -> Symbol {
        if self.is_terminal(kind) {
            Symbol::Terminal(kind)
        } else {
            Symbol::Nonterminal(NonterminalId((kind.index() - self.terminal_count) as u16))
        }
    }

    pub fn symbol_kind(&self, symbol: Symbol) -> KindId {
        match symbol {
            Symbol::Terminal(kind) => kind,
            Symbol::Nonterminal(id) => KindId((self.terminal_count + id.index()) as u16),
        }
    }

    /// Hidden kinds never appear in the public tree.
    #[inline]
    pub fn is_hidden(&self, kind: KindId) -> bool {
        !self.kinds.info(kind).visible
    }

    /// Repetition helpers, stored as ropes.
    #[inline]
    pub fn is_repeat(&self, kind: KindId) -> bool {
        !self.is_terminal(kind) && self.repeats[kind.index() - self.terminal_count]
    }

    #[inline]
    pub fn action(&self, state: StateId, terminal: KindId) -> Action {
        debug_assert!(self.is_terminal(terminal));
        self.actions[state.index() * self.terminal_count + terminal.index()]
    }

    #[inline]
    pub fn goto(&self, state: StateId, nonterminal: KindId) -> Option<StateId> {
        let column = nonterminal.index().checked_sub(self.terminal_count)?;
        let target = self.gotos[state.index() * self.nonterminal_count() + column];
        (target != NO_GOTO).then_some(StateId(target))
    }

    /// State reached after pushing `kind` in `state`.
    pub fn successor(&self, state: StateId, kind: KindId) -> Option<StateId> {
        if self.is_terminal(kind) {
            match self.action(state, kind) {
                Action::Shift(next) => Some(next),
                _ => None,
            }
        } else {
            self.goto(state, kind)
        }
    }

    pub fn production(&self, id: ProductionId) -> &ProductionInfo {
        &self.productions[id.index()]
    }

    pub fn productions(&self) -> &[ProductionInfo] {
        &self.productions
    }

    #[inline]
    pub fn lex_mode(&self, state: StateId) -> LexMode {
        self.state_lex_modes[state.index()]
    }

    pub fn lex_mode_count(&self) -> usize {
        self.lex_modes.len()
    }

    /// Terminals valid in `mode`; [`LexMode::ERROR`] admits every
    /// non-immediate terminal.
    pub fn lex_mode_terminals(&self, mode: LexMode) -> &TerminalSet {
        &self.lex_modes[mode.index()]
    }

    /// Terminals with a non-error action in `state`.
    pub fn expected(&self, state: StateId) -> impl Iterator<Item = KindId> + '_ {
        self.lex_mode_terminals(self.lex_mode(state)).iter()
    }

    pub fn lexical(&self) -> &LexicalGrammar {
        &self.lexical
    }
}
