//! LALR(1) construction.
//!
//! The LR(0) automaton is built over kernel items, then lookaheads are
//! computed by spontaneous generation and propagation: each kernel item is
//! closed once with a marker lookahead, and wherever the marker survives the
//! item's own lookaheads flow to the successor kernel item.

use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;
use indexmap::map::Entry;
use razen_yellow::{KindId, LexMode, StateId};
use rustc_hash::{FxHashMap, FxHasher};

use crate::builder::ConflictPolicy;
use crate::normalize::{Grammar, START};
use crate::table::NO_GOTO;
use crate::{
    Action, Assoc, ConfigurationError, GrammarTable, ProductionId, ProductionInfo, ProductionKind,
    Symbol, TerminalSet,
};

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
struct Item {
    production: u32,
    dot: u32,
}

type Closure = Rc<[(Item, TerminalSet)]>;
type Kernel = Vec<Item>;
type Edges = Vec<(Symbol, u32)>;

struct Automaton<'g> {
    grammar: &'g Grammar,
    /// Right-hand sides; the augmented start production comes last.
    rhs: Vec<Vec<Symbol>>,
    by_lhs: Vec<Vec<u32>>,
    nullable: Vec<bool>,
    first: Vec<TerminalSet>,
    /// Placeholder lookahead used to detect propagation.
    marker: KindId,
    closures: FxHashMap<Item, Closure>,
}

enum Resolution {
    Shift,
    Reduce,
    Unresolved,
}

#[tracing::instrument(level = "debug", skip_all, fields(grammar = %grammar.name))]
pub(crate) fn build(grammar: &Grammar) -> Result<GrammarTable, ConfigurationError> {
    let mut automaton = Automaton::new(grammar);
    let (kernels, transitions) = automaton.lr0_states()?;
    let lookaheads = automaton.lookaheads(&kernels, &transitions);

    let terminal_count = grammar.terminal_count;
    let nonterminal_count = grammar.nonterminal_count();
    let mut actions = vec![Action::Error; kernels.len() * terminal_count];
    let mut gotos = vec![NO_GOTO; kernels.len() * nonterminal_count];
    let mut conflicts = 0;

    for (state, kernel) in kernels.iter().enumerate() {
        let row = &mut actions[state * terminal_count..(state + 1) * terminal_count];
        conflicts +=
            automaton.fill_actions(state, kernel, &lookaheads[state], &transitions[state], row)?;

        for &(symbol, target) in &transitions[state] {
            if let Symbol::Nonterminal(id) = symbol {
                gotos[state * nonterminal_count + id.index()] = target as u16;
            }
        }
    }

    let mut error_mode = TerminalSet::with_capacity(terminal_count);
    for index in 0..terminal_count {
        let kind = KindId(index as u16);
        if kind != KindId::ERROR && !grammar.lexical.externals.contains(&kind) {
            error_mode.insert(kind);
        }
    }
    let mut lex_modes = vec![error_mode];
    let mut mode_ids: FxHashMap<TerminalSet, LexMode> = FxHashMap::default();
    let mut state_lex_modes = Vec::with_capacity(kernels.len());
    for state in 0..kernels.len() {
        let row = &actions[state * terminal_count..(state + 1) * terminal_count];
        let valid: TerminalSet = {
            let mut set = TerminalSet::with_capacity(terminal_count);
            for (index, action) in row.iter().enumerate() {
                if *action != Action::Error {
                    set.insert(KindId(index as u16));
                }
            }
            set
        };
        let mode = *mode_ids.entry(valid).or_insert_with_key(|valid| {
            lex_modes.push(valid.clone());
            LexMode(lex_modes.len() as u16 - 1)
        });
        state_lex_modes.push(mode);
    }

    let productions: Box<[ProductionInfo]> = grammar
        .productions
        .iter()
        .map(|production| ProductionInfo {
            lhs: grammar.symbol_kind(Symbol::Nonterminal(production.lhs)),
            symbols: production.steps.iter().map(|step| step.symbol).collect(),
            fields: production.steps.iter().map(|step| step.field).collect(),
            kind: production.kind,
        })
        .collect();

    let mut hasher = FxHasher::default();
    grammar.name.hash(&mut hasher);
    grammar.version.hash(&mut hasher);
    for (_, info) in grammar.kinds.iter() {
        info.name.hash(&mut hasher);
        info.visible.hash(&mut hasher);
    }
    productions.hash(&mut hasher);
    actions.hash(&mut hasher);
    gotos.hash(&mut hasher);
    state_lex_modes.hash(&mut hasher);

    tracing::debug!(
        states = kernels.len(),
        lex_modes = lex_modes.len(),
        conflicts,
        "built parse table"
    );

    Ok(GrammarTable {
        name: grammar.name.as_str().into(),
        version: grammar.version,
        fingerprint: hasher.finish(),
        kinds: Arc::new(grammar.kinds.clone()),
        terminal_count,
        productions,
        actions: actions.into_boxed_slice(),
        gotos: gotos.into_boxed_slice(),
        state_lex_modes: state_lex_modes.into_boxed_slice(),
        lex_modes: lex_modes.into_boxed_slice(),
        repeats: grammar.repeats.clone().into_boxed_slice(),
        lexical: grammar.lexical.clone(),
        conflicts,
    })
}

impl<'g> Automaton<'g> {
    fn new(grammar: &'g Grammar) -> Self {
        let nonterminal_count = grammar.nonterminal_count();
        let mut rhs: Vec<Vec<Symbol>> = grammar
            .productions
            .iter()
            .map(|production| production.steps.iter().map(|step| step.symbol).collect())
            .collect();
        rhs.push(vec![Symbol::Nonterminal(START)]);

        let mut by_lhs = vec![Vec::new(); nonterminal_count];
        for (index, production) in grammar.productions.iter().enumerate() {
            by_lhs[production.lhs.index()].push(index as u32);
        }

        let marker = KindId(grammar.terminal_count as u16);
        let mut automaton = Self {
            grammar,
            rhs,
            by_lhs,
            nullable: vec![false; nonterminal_count],
            first: vec![TerminalSet::with_capacity(grammar.terminal_count + 1); nonterminal_count],
            marker,
            closures: FxHashMap::default(),
        };
        automaton.compute_first();
        automaton
    }

    fn augmented(&self) -> u32 {
        self.grammar.productions.len() as u32
    }

    fn compute_first(&mut self) {
        loop {
            let mut changed = false;
            for (index, production) in self.grammar.productions.iter().enumerate() {
                let lhs = production.lhs.index();
                let mut nullable = true;
                for &symbol in &self.rhs[index] {
                    match symbol {
                        Symbol::Terminal(kind) => {
                            changed |= self.first[lhs].insert(kind);
                            nullable = false;
                        }
                        Symbol::Nonterminal(id) => {
                            if id.index() != lhs {
                                let first = self.first[id.index()].clone();
                                changed |= self.first[lhs].union_with(&first);
                            }
                            nullable = self.nullable[id.index()];
                        }
                    }
                    if !nullable {
                        break;
                    }
                }
                if nullable && !self.nullable[lhs] {
                    self.nullable[lhs] = true;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }

    /// FIRST of `symbols`, followed by `tail` when they can all be empty.
    fn first_of(&self, symbols: &[Symbol], tail: &TerminalSet) -> TerminalSet {
        let mut set = TerminalSet::with_capacity(self.grammar.terminal_count + 1);
        for &symbol in symbols {
            match symbol {
                Symbol::Terminal(kind) => {
                    set.insert(kind);
                    return set;
                }
                Symbol::Nonterminal(id) => {
                    set.union_with(&self.first[id.index()]);
                    if !self.nullable[id.index()] {
                        return set;
                    }
                }
            }
        }
        set.union_with(tail);
        set
    }

    #[inline]
    fn next_symbol(&self, item: Item) -> Option<Symbol> {
        self.rhs[item.production as usize].get(item.dot as usize).copied()
    }

    fn closure0(&self, kernel: &[Item]) -> Vec<Item> {
        let mut items = kernel.to_vec();
        let mut expanded = vec![false; self.by_lhs.len()];
        let mut index = 0;
        while index < items.len() {
            let item = items[index];
            index += 1;
            if let Some(Symbol::Nonterminal(id)) = self.next_symbol(item)
                && !expanded[id.index()]
            {
                expanded[id.index()] = true;
                let starts = self.by_lhs[id.index()].iter();
                items.extend(starts.map(|&production| Item { production, dot: 0 }));
            }
        }
        items
    }

    fn lr0_states(&self) -> Result<(Vec<Kernel>, Vec<Edges>), ConfigurationError> {
        let start = vec![Item { production: self.augmented(), dot: 0 }];
        let mut index = FxHashMap::default();
        index.insert(start.clone(), 0u32);
        let mut kernels = vec![start];
        let mut transitions = Vec::new();

        let mut state = 0;
        while state < kernels.len() {
            let mut successors: IndexMap<Symbol, Vec<Item>> = IndexMap::new();
            for item in self.closure0(&kernels[state]) {
                if let Some(symbol) = self.next_symbol(item) {
                    successors.entry(symbol).or_default().push(Item { dot: item.dot + 1, ..item });
                }
            }

            let mut edges = Vec::with_capacity(successors.len());
            for (symbol, mut kernel) in successors {
                kernel.sort_unstable();
                kernel.dedup();
                let target = match index.get(&kernel) {
                    Some(&target) => target,
                    None => {
                        let target = kernels.len() as u32;
                        if kernels.len() >= NO_GOTO as usize {
                            return Err(ConfigurationError::TooMany {
                                what: "states",
                                limit: NO_GOTO as usize,
                            });
                        }
                        index.insert(kernel.clone(), target);
                        kernels.push(kernel);
                        target
                    }
                };
                edges.push((symbol, target));
            }
            transitions.push(edges);
            state += 1;
        }

        Ok((kernels, transitions))
    }

    /// LR(1) closure of `seed` with the marker as its only lookahead.
    fn closure1(&mut self, seed: Item) -> Closure {
        if let Some(closure) = self.closures.get(&seed) {
            return closure.clone();
        }

        let mut marker = TerminalSet::with_capacity(self.grammar.terminal_count + 1);
        marker.insert(self.marker);
        let mut items: IndexMap<Item, TerminalSet> = IndexMap::new();
        items.insert(seed, marker);
        let mut work = vec![seed];

        while let Some(item) = work.pop() {
            let Some(Symbol::Nonterminal(id)) = self.next_symbol(item) else { continue };
            let rest = &self.rhs[item.production as usize][item.dot as usize + 1..];
            let lookahead = self.first_of(rest, &items[&item]);
            for &production in &self.by_lhs[id.index()] {
                let target = Item { production, dot: 0 };
                match items.entry(target) {
                    Entry::Occupied(mut entry) => {
                        if entry.get_mut().union_with(&lookahead) {
                            work.push(target);
                        }
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(lookahead.clone());
                        work.push(target);
                    }
                }
            }
        }

        let closure: Closure = items.into_iter().collect();
        self.closures.insert(seed, closure.clone());
        closure
    }

    fn lookaheads(
        &mut self,
        kernels: &[Kernel],
        transitions: &[Edges],
    ) -> Vec<Vec<TerminalSet>> {
        let empty = TerminalSet::with_capacity(self.grammar.terminal_count + 1);
        let mut lookaheads: Vec<Vec<TerminalSet>> =
            kernels.iter().map(|kernel| vec![empty.clone(); kernel.len()]).collect();
        lookaheads[0][0].insert(KindId::END);

        let mut edges = Vec::new();
        for (state, kernel) in kernels.iter().enumerate() {
            for (slot, &item) in kernel.iter().enumerate() {
                for (closed, lookahead) in self.closure1(item).iter() {
                    let Some(symbol) = self.next_symbol(*closed) else { continue };
                    let target = successor(transitions, state, symbol);
                    let advanced = Item { dot: closed.dot + 1, ..*closed };
                    let Ok(target_slot) = kernels[target].binary_search(&advanced) else {
                        unreachable!("successor kernel lacks {advanced:?}");
                    };

                    let mut spontaneous = lookahead.clone();
                    spontaneous.remove(self.marker);
                    lookaheads[target][target_slot].union_with(&spontaneous);
                    if lookahead.contains(self.marker) {
                        edges.push(((state, slot), (target, target_slot)));
                    }
                }
            }
        }

        loop {
            let mut changed = false;
            for &((state, slot), (target, target_slot)) in &edges {
                if (state, slot) == (target, target_slot) {
                    continue;
                }
                let lookahead = lookaheads[state][slot].clone();
                changed |= lookaheads[target][target_slot].union_with(&lookahead);
            }
            if !changed {
                break;
            }
        }

        lookaheads
    }

    /// Fills the action row of `state`, returning how many conflicts the
    /// policy settled.
    fn fill_actions(
        &mut self,
        state: usize,
        kernel: &[Item],
        lookaheads: &[TerminalSet],
        transitions: &[(Symbol, u32)],
        row: &mut [Action],
    ) -> Result<usize, ConfigurationError> {
        let terminal_count = self.grammar.terminal_count;
        let mut shift_precedence: Vec<Option<(i32, i32)>> = vec![None; terminal_count];
        let mut reduces: Vec<Option<u32>> = vec![None; terminal_count];

        for (slot, &item) in kernel.iter().enumerate() {
            for (closed, lookahead) in self.closure1(item).iter() {
                match self.next_symbol(*closed) {
                    None => {
                        let mut lookahead = lookahead.clone();
                        if lookahead.contains(self.marker) {
                            lookahead.remove(self.marker);
                            lookahead.union_with(&lookaheads[slot]);
                        }
                        for terminal in lookahead.iter() {
                            let entry = &mut reduces[terminal.index()];
                            match *entry {
                                Some(existing) if existing == closed.production => {}
                                Some(existing) => {
                                    let kept = self.reduce_priority(existing, closed.production);
                                    let dropped =
                                        if kept == existing { closed.production } else { existing };
                                    tracing::debug!(
                                        state,
                                        terminal = self.grammar.kinds.name(terminal),
                                        kept = %self.describe(kept),
                                        dropped = %self.describe(dropped),
                                        "reduce/reduce conflict resolved by declaration order"
                                    );
                                    *entry = Some(kept);
                                }
                                None => *entry = Some(closed.production),
                            }
                        }
                    }
                    Some(Symbol::Terminal(terminal)) => {
                        let precedence = self.step_precedence(*closed);
                        let entry = &mut shift_precedence[terminal.index()];
                        *entry = Some(match *entry {
                            Some((low, high)) => (low.min(precedence), high.max(precedence)),
                            None => (precedence, precedence),
                        });
                    }
                    Some(Symbol::Nonterminal(_)) => {}
                }
            }
        }

        let mut conflicts = 0;
        for &(symbol, target) in transitions {
            if let Symbol::Terminal(terminal) = symbol {
                row[terminal.index()] = Action::Shift(StateId(target as u16));
            }
        }

        for (index, reduce) in reduces.into_iter().enumerate() {
            let Some(production) = reduce else { continue };
            let terminal = KindId(index as u16);
            let reduce_action = if production == self.augmented() {
                Action::Accept
            } else {
                Action::Reduce(ProductionId(production as u16))
            };

            let Some(shift) = shift_precedence[index] else {
                row[index] = reduce_action;
                continue;
            };
            if reduce_action == Action::Accept {
                continue;
            }
            match self.resolve(production, shift) {
                Resolution::Shift => {}
                Resolution::Reduce => row[index] = reduce_action,
                Resolution::Unresolved => {
                    let description = format!(
                        "shift `{}` or reduce `{}`",
                        self.grammar.kinds.name(terminal),
                        self.describe(production)
                    );
                    match self.grammar.policy {
                        ConflictPolicy::Strict => {
                            return Err(ConfigurationError::Conflict { state, description });
                        }
                        ConflictPolicy::PreferShift => {
                            tracing::warn!(state, "{description}: shifting");
                            conflicts += 1;
                        }
                    }
                }
            }
        }

        Ok(conflicts)
    }

    /// Among two reductions on the same lookahead, the one declared first.
    fn reduce_priority(&self, left: u32, right: u32) -> u32 {
        if left == self.augmented() || right == self.augmented() {
            self.augmented()
        } else {
            left.min(right)
        }
    }

    fn step_precedence(&self, item: Item) -> i32 {
        self.grammar
            .productions
            .get(item.production as usize)
            .map_or(0, |production| production.steps[item.dot as usize].precedence)
    }

    fn resolve(&self, production: u32, (low, high): (i32, i32)) -> Resolution {
        let production = &self.grammar.productions[production as usize];
        if production.kind == ProductionKind::RepeatJoin {
            return Resolution::Reduce;
        }
        let reduce = production.precedence;
        if low > reduce {
            Resolution::Shift
        } else if high < reduce {
            Resolution::Reduce
        } else if low == reduce && high == reduce {
            match production.assoc {
                Assoc::Left => Resolution::Reduce,
                Assoc::Right => Resolution::Shift,
                Assoc::None => Resolution::Unresolved,
            }
        } else {
            Resolution::Unresolved
        }
    }

    fn describe(&self, production: u32) -> String {
        if production == self.augmented() {
            return format!("<start> -> {}", self.grammar.symbol_name(Symbol::Nonterminal(START)));
        }
        let production = &self.grammar.productions[production as usize];
        let lhs = self.grammar.symbol_name(Symbol::Nonterminal(production.lhs));
        let mut text = format!("{lhs} ->");
        for step in &production.steps {
            text.push(' ');
            text.push_str(self.grammar.symbol_name(step.symbol));
        }
        text
    }
}

fn successor(transitions: &[Edges], state: usize, symbol: Symbol) -> usize {
    transitions[state]
        .iter()
        .find_map(|&(edge, target)| (edge == symbol).then_some(target as usize))
        .unwrap_or_else(|| unreachable!("state {state} has no transition"))
}
