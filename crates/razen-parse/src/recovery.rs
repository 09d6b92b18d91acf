//! Bounded panic-mode error recovery.
//!
//! A recovery candidate `(k, d)` skips `k` tokens and pops `d` stack
//! entries. Candidates are tried by increasing `k + d`, fewer pops first,
//! and the first one after which the automaton can make progress wins. What
//! it removes is wrapped into an `ERROR` node that stays on the stack as an
//! extra.

use razen_grammar::{Action, GrammarTable};
use razen_tokenizer::Token;
use razen_yellow::{GreenElement, GreenNode, KindId, LexMode, StateId};
use rustc_hash::FxHashMap;
use text_size::TextSize;

use crate::parser::Run;
use crate::stack;

pub(crate) enum Recovery {
    /// Continue with this lookahead.
    Resume(Token),
    /// The lookahead was wrapped on its own; lex a new one.
    Skipped,
    /// End of input was reached without a way to continue.
    Finished(GreenNode),
}

impl Run<'_> {
    pub(crate) fn recover(&mut self, lookahead: Token) -> Recovery {
        let states = self.stack.states();
        // Number of non-extra entries below each stack height.
        let mut below = Vec::with_capacity(self.stack.len() + 1);
        below.push(0);
        for entry in self.stack.entries() {
            below.push(below.last().copied().unwrap_or(0) + usize::from(!entry.is_extra));
        }

        let depth = self.stack.len();
        let max_skipped = self.options.max_skipped_tokens;
        let mut tokens = vec![lookahead];
        let mut resumes: FxHashMap<(usize, LexMode), Token> = FxHashMap::default();
        let mut chosen = None;

        'search: for cost in 1..=max_skipped + depth {
            for popped in 0..=cost.min(depth) {
                let skipped = cost - popped;
                if skipped > max_skipped || !self.skippable(&mut tokens, skipped) {
                    continue;
                }
                let base = &states[..=below[depth - popped]];
                let state = base[base.len() - 1];
                let mode = self.table.lex_mode(state);
                let position = match skipped {
                    0 => self.position,
                    _ => tokens[skipped - 1].range.end(),
                };
                let resume = match resumes.get(&(skipped, mode)) {
                    Some(token) => token.clone(),
                    None => {
                        let token = self.lex_at(position, mode);
                        resumes.insert((skipped, mode), token.clone());
                        token
                    }
                };
                if can_continue(self.table, base, resume.kind) {
                    chosen = Some((skipped, popped, resume));
                    break 'search;
                }
            }
        }

        let Some((skipped, popped, resume)) = chosen else {
            return self.wrap_lookahead(tokens.swap_remove(0));
        };

        tracing::debug!(
            position = u32::from(self.position),
            skipped,
            popped,
            "recovered from syntax error"
        );
        let mut elements: Vec<GreenElement> =
            self.stack.split_off(depth - popped).into_iter().map(|entry| entry.element).collect();
        elements.extend(tokens[..skipped].iter().map(|token| GreenElement::from(token.to_green())));
        if skipped > 0 {
            self.position = tokens[skipped - 1].range.end();
        }
        self.push_error(elements, resume.lookahead_end);
        Recovery::Resume(resume)
    }

    /// Whether the first `count` tokens can be skipped, lexing them in the
    /// error mode on demand. The end of input can never be skipped.
    fn skippable(&mut self, tokens: &mut Vec<Token>, count: usize) -> bool {
        while tokens.len() < count {
            let last = &tokens[tokens.len() - 1];
            if last.kind == KindId::END {
                return false;
            }
            let position = last.range.end();
            let token = self.lex_at(position, LexMode::ERROR);
            tokens.push(token);
        }
        tokens[..count].iter().all(|token| token.kind != KindId::END)
    }

    fn wrap_lookahead(&mut self, lookahead: Token) -> Recovery {
        if lookahead.kind == KindId::END {
            tracing::debug!(position = u32::from(self.position), "input ended inside an error");
            let end = (!lookahead.range.is_empty()).then(|| lookahead.to_green());
            let stack = std::mem::take(&mut self.stack);
            return Recovery::Finished(stack.into_error_root(self.table, end));
        }
        tracing::debug!(position = u32::from(self.position), "skipped unexpected token");
        self.position = lookahead.range.end();
        self.push_error(vec![lookahead.to_green().into()], lookahead.lookahead_end);
        Recovery::Skipped
    }

    /// Pushes an error node, merging it with an error node right below.
    fn push_error(&mut self, mut elements: Vec<GreenElement>, lookahead_end: TextSize) {
        if self.stack.last().is_some_and(|entry| entry.is_extra)
            && let Some(entry) = self.stack.pop()
        {
            elements.insert(0, entry.element);
        }
        let pre_state = self.stack.state();
        let decision_end = lookahead_end.checked_sub(self.stack.end()).unwrap_or_default();
        let node = stack::error_node(self.table, elements, pre_state, decision_end);
        self.stack.push_extra(node.into());
    }
}

/// Simulates the automaton on `states` with `terminal` as lookahead until it
/// shifts or accepts. Reductions only touch an overlay of the stack.
fn can_continue(table: &GrammarTable, states: &[StateId], terminal: KindId) -> bool {
    let mut base = states.len();
    let mut overlay: Vec<StateId> = Vec::new();
    let top =
        |base: usize, overlay: &[StateId]| overlay.last().copied().unwrap_or(states[base - 1]);

    loop {
        match table.action(top(base, &overlay), terminal) {
            Action::Shift(_) | Action::Accept => return true,
            Action::Error => return false,
            Action::Reduce(production) => {
                let production = table.production(production);
                let from_overlay = production.len().min(overlay.len());
                overlay.truncate(overlay.len() - from_overlay);
                let from_base = production.len() - from_overlay;
                if from_base >= base {
                    return false;
                }
                base -= from_base;
                match table.goto(top(base, &overlay), production.lhs) {
                    Some(next) => overlay.push(next),
                    None => return false,
                }
            }
        }
    }
}
