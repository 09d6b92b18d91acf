use std::sync::Arc;

use razen_grammar::{Action, ConfigurationError, GrammarTable};
use razen_tokenizer::{Lexer, Token};
use razen_yellow::{GreenElement, GreenNode, KindId, LexMode, NodeOrToken, SyntaxTree};
use text_size::TextSize;
use thiserror::Error;

use crate::edit::{Change, EditError, InputEdit};
use crate::language::Language;
use crate::recovery::Recovery;
use crate::reuse::ReusableNode;
use crate::stack::Stack;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ParserOptions {
    /// Upper bound on the tokens a single recovery may skip.
    pub max_skipped_tokens: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self { max_skipped_tokens: 16 }
    }
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ReparseError {
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// Table-driven LR parser for one [`Language`].
#[derive(Clone, Copy, Debug)]
pub struct Parser<'l> {
    language: &'l Language,
    options: ParserOptions,
}

impl<'l> Parser<'l> {
    pub fn new(language: &'l Language) -> Self {
        Self::with_options(language, ParserOptions::default())
    }

    pub fn with_options(language: &'l Language, options: ParserOptions) -> Self {
        Self { language, options }
    }

    pub fn language(&self) -> &'l Language {
        self.language
    }

    /// Parses `text` from scratch. Never fails: malformed input ends up in
    /// `ERROR` nodes.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(language = %self.language.name(), len = text.as_ref().len())
    )]
    pub fn parse(&self, text: impl AsRef<[u8]>) -> SyntaxTree {
        self.run(Arc::from(text.as_ref()), None)
    }

    /// Parses `text`, the result of applying `edit` to the text of `old`,
    /// sharing the subtrees of `old` the edit cannot have changed.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(language = %self.language.name(), len = text.as_ref().len())
    )]
    pub fn reparse(
        &self,
        old: &SyntaxTree,
        edit: &InputEdit,
        text: impl AsRef<[u8]>,
    ) -> Result<SyntaxTree, ReparseError> {
        self.language.check_compatible(old.language())?;
        let text = text.as_ref();
        edit.validate(len(old.text()), len(text))?;

        let change = Change::narrow(edit, old.text(), text);
        if change.is_empty() {
            tracing::debug!("edit changes no bytes");
            return Ok(old.clone());
        }
        let reuse = ReusableNode::new(old.green(), change);
        Ok(self.run(Arc::from(text), Some(reuse)))
    }

    fn run(&self, text: Arc<[u8]>, reuse: Option<ReusableNode>) -> SyntaxTree {
        let language = self.language;
        let root = Run::new(language.table(), language.lexer(), &text, reuse, self.options).parse();
        SyntaxTree::new(root, text, language.table().kinds().clone(), language.id().clone())
    }
}

fn len(text: &[u8]) -> TextSize {
    TextSize::new(text.len() as u32)
}

enum Lookahead {
    Lexed(Token),
    /// Element of the previous tree, offered by the reuse cursor. Its first
    /// token is the one the lexer produces in `mode`.
    Reused { element: GreenElement, mode: LexMode },
}

impl Lookahead {
    /// Kind the automaton decides on: for a reused node, its first token.
    fn kind(&self) -> KindId {
        match self {
            Self::Lexed(token) => token.kind,
            Self::Reused { element, .. } => {
                element.first_token().map_or(KindId::ERROR, |token| token.kind())
            }
        }
    }

    fn lex_mode(&self) -> LexMode {
        match self {
            Self::Lexed(token) => token.lex_mode,
            Self::Reused { mode, .. } => *mode,
        }
    }

    fn lookahead_end(&self, position: TextSize) -> TextSize {
        match self {
            Self::Lexed(token) => token.lookahead_end,
            Self::Reused { element, .. } => match element.first_token() {
                Some(token) => position + token.text_len() + TextSize::new(token.lookahead_len()),
                None => position,
            },
        }
    }
}

#[derive(Debug, Default)]
struct Stats {
    lexed: usize,
    reused_nodes: usize,
    reused_tokens: usize,
    reused_bytes: u32,
    recoveries: usize,
}

/// State of a single parse.
pub(crate) struct Run<'a> {
    pub(crate) table: &'a GrammarTable,
    pub(crate) lexer: &'a Lexer,
    pub(crate) text: &'a [u8],
    pub(crate) stack: Stack,
    /// End of the text consumed so far.
    pub(crate) position: TextSize,
    /// Lex mode of the token at `position`, fixed by the first request for
    /// it and kept across the reductions it triggers.
    mode: Option<LexMode>,
    pub(crate) options: ParserOptions,
    reuse: Option<ReusableNode>,
    stats: Stats,
}

impl<'a> Run<'a> {
    fn new(
        table: &'a GrammarTable,
        lexer: &'a Lexer,
        text: &'a [u8],
        reuse: Option<ReusableNode>,
        options: ParserOptions,
    ) -> Self {
        Self {
            table,
            lexer,
            text,
            stack: Stack::default(),
            position: TextSize::new(0),
            mode: None,
            options,
            reuse,
            stats: Stats::default(),
        }
    }

    fn parse(mut self) -> GreenNode {
        let mut pending = None;
        loop {
            let lookahead = match pending.take() {
                Some(lookahead) => lookahead,
                None => self.next_lookahead(),
            };
            let state = self.stack.state();

            match (self.table.action(state, lookahead.kind()), lookahead) {
                (Action::Reduce(production), lookahead) => {
                    let lookahead_end = lookahead.lookahead_end(self.position);
                    self.stack.reduce(self.table, production, lookahead_end, lookahead.lex_mode());
                    pending = Some(lookahead);
                }
                (Action::Shift(next), Lookahead::Lexed(token)) => {
                    self.position = token.range.end();
                    self.mode = None;
                    self.stack.push(next, token.to_green().into());
                }
                (
                    Action::Shift(next),
                    Lookahead::Reused { element: NodeOrToken::Token(token), .. },
                ) => {
                    self.stats.reused_tokens += 1;
                    self.stats.reused_bytes += u32::from(token.text_len());
                    self.position += token.text_len();
                    self.mode = None;
                    self.stack.push(next, token.into());
                }
                (Action::Shift(_), Lookahead::Reused { element: NodeOrToken::Node(node), .. }) => {
                    self.push_reused(node);
                }
                (Action::Accept, Lookahead::Lexed(token)) => {
                    let end = (!token.range.is_empty()).then(|| token.to_green());
                    self.finish_stats();
                    return self.stack.into_root(self.table, end);
                }
                (Action::Error, Lookahead::Lexed(token)) => {
                    self.stats.recoveries += 1;
                    match self.recover(token) {
                        Recovery::Resume(token) => {
                            self.mode = Some(token.lex_mode);
                            pending = Some(Lookahead::Lexed(token));
                        }
                        Recovery::Skipped => self.mode = None,
                        Recovery::Finished(root) => {
                            self.finish_stats();
                            return root;
                        }
                    }
                }
                (_, Lookahead::Reused { element: NodeOrToken::Node(_), .. }) => self.descend(),
                (_, Lookahead::Reused { element: NodeOrToken::Token(_), mode }) => {
                    pending = Some(Lookahead::Lexed(self.lex(mode)));
                }
            }
        }
    }

    /// Pushes a reused node if the automaton is in the state the node was
    /// started from, otherwise looks at its children instead.
    ///
    /// The token after the node is lexed in the mode it was lexed in before,
    /// which belongs to the state after the node's last token rather than to
    /// the goto state.
    fn push_reused(&mut self, node: GreenNode) {
        let state = self.stack.state();
        if node.meta().pre_state == state
            && let Some(next) = self.table.goto(state, node.kind())
        {
            self.stats.reused_nodes += 1;
            self.stats.reused_bytes += u32::from(node.text_len());
            self.position += node.text_len();
            self.mode = Some(node.meta().next_lex_mode);
            self.stack.push(next, node.into());
        } else {
            self.descend();
        }
    }

    fn descend(&mut self) {
        if let Some(reuse) = &mut self.reuse {
            reuse.descend();
        }
    }

    fn next_lookahead(&mut self) -> Lookahead {
        let mode = match self.mode {
            Some(mode) => mode,
            None => {
                let mode = self.table.lex_mode(self.stack.state());
                self.mode = Some(mode);
                mode
            }
        };
        let candidate = match &mut self.reuse {
            Some(reuse) => reuse.candidate(self.position),
            None => None,
        };
        let Some(element) = candidate else {
            return Lookahead::Lexed(self.lex(mode));
        };
        let Some(first) = element.first_token() else {
            return Lookahead::Lexed(self.lex(mode));
        };
        if first.lex_mode() == mode {
            return Lookahead::Reused { element, mode };
        }

        // Lexed in another mode: keep it only if this mode yields the same
        // token without looking further ahead.
        let token = self.lex(mode);
        let old_end = self.position + first.text_len() + TextSize::new(first.lookahead_len());
        if token.kind == first.kind()
            && token.range.len() == first.text_len()
            && token.lookahead_end <= old_end
        {
            Lookahead::Reused { element, mode }
        } else {
            Lookahead::Lexed(token)
        }
    }

    pub(crate) fn lex(&mut self, mode: LexMode) -> Token {
        self.lex_at(self.position, mode)
    }

    pub(crate) fn lex_at(&mut self, position: TextSize, mode: LexMode) -> Token {
        self.stats.lexed += 1;
        self.lexer.next_token(self.text, position, mode)
    }

    fn finish_stats(&self) {
        let Stats { lexed, reused_nodes, reused_tokens, reused_bytes, recoveries } = self.stats;
        tracing::debug!(
            lexed,
            reused_nodes,
            reused_tokens,
            reused_bytes,
            recoveries,
            "parse finished"
        );
    }
}
