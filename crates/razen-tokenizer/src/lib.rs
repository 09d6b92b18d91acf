//! Context-aware, pull-based lexing.
//!
//! The parser asks for one token at a time and passes the lex mode of its
//! current state, so the lexer only prefers tokens the grammar can accept
//! there. Languages plug in a hand-written [`TokenScanner`] for trivia,
//! identifiers, numbers and immediate tokens; literals come from the grammar.

mod cursor;

use std::sync::Arc;

pub use cursor::{Cursor, EOF_BYTE};
use razen_grammar::{ConfigurationError, GrammarTable};
use razen_yellow::{GreenToken, GreenTrivia, KindId, LexMode, TriviaPiece, TriviaPieceKind};
use rustc_hash::FxHashMap;
use text_size::{TextRange, TextSize};

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: KindId,
    pub leading: GreenTrivia,
    /// Leading trivia included.
    pub range: TextRange,
    /// End of the bytes examined to produce the token. One past the end of
    /// the text when the lexer looked for more input.
    pub lookahead_end: TextSize,
    pub lex_mode: LexMode,
}

impl Token {
    /// Range of the token text alone.
    pub fn text_range(&self) -> TextRange {
        TextRange::new(self.range.start() + self.leading.len(), self.range.end())
    }

    pub fn lookahead_len(&self) -> u32 {
        u32::from(self.lookahead_end.max(self.range.end()) - self.range.end())
    }

    pub fn to_green(&self) -> GreenToken {
        GreenToken::new(
            self.kind,
            self.leading.clone(),
            self.range.len(),
            self.lex_mode,
            self.lookahead_len(),
        )
    }
}

/// Hand-written part of a language's lexer.
pub trait TokenScanner: Send + Sync {
    /// Names of the tokens [`TokenScanner::scan`] produces, by index.
    fn tokens(&self) -> &'static [&'static str];

    /// Names of the immediate tokens [`TokenScanner::scan_external`]
    /// produces, by index.
    fn externals(&self) -> &'static [&'static str] {
        &[]
    }

    /// Consumes one piece of trivia.
    fn trivia(&self, cursor: &mut Cursor<'_>) -> Option<TriviaPieceKind>;

    /// Consumes one token, returning its index into [`TokenScanner::tokens`].
    fn scan(&self, cursor: &mut Cursor<'_>) -> Option<usize>;

    /// Consumes one immediate token at the raw position. `valid[i]` tells
    /// whether `externals()[i]` is acceptable.
    fn scan_external(&self, cursor: &mut Cursor<'_>, valid: &[bool]) -> Option<usize> {
        let _ = (cursor, valid);
        None
    }
}

/// A grammar's terminals combined with its scanner.
pub struct Lexer {
    table: Arc<GrammarTable>,
    scanner: Box<dyn TokenScanner>,
    tokens: Box<[KindId]>,
    externals: Box<[KindId]>,
    /// Non-keyword literals bucketed by first byte, longest first.
    literals: Box<[Vec<(Box<[u8]>, KindId)>]>,
    keywords: FxHashMap<Box<[u8]>, KindId>,
    /// Per lex mode: which externals are valid, or `None` if none is.
    external_modes: Box<[Option<Box<[bool]>>]>,
}

#[derive(Clone, Copy)]
struct Candidate {
    len: usize,
    kind: KindId,
    literal: bool,
}

impl Candidate {
    fn beats(self, other: Option<Self>) -> bool {
        match other {
            None => true,
            Some(other) => {
                self.len > other.len || (self.len == other.len && self.literal && !other.literal)
            }
        }
    }
}

impl Lexer {
    pub fn new(
        table: Arc<GrammarTable>,
        scanner: Box<dyn TokenScanner>,
    ) -> Result<Self, ConfigurationError> {
        let kinds = table.kinds();
        let lexical = table.lexical();
        let resolve = |names: &[&str], declared: &[KindId]| {
            names
                .iter()
                .map(|name| match kinds.kind_id(name) {
                    Some(kind) if declared.contains(&kind) => Ok(kind),
                    _ => Err(ConfigurationError::UndefinedSymbol {
                        rule: "<scanner>".to_owned(),
                        symbol: (*name).to_owned(),
                    }),
                })
                .collect::<Result<Box<[KindId]>, _>>()
        };
        let tokens = resolve(scanner.tokens(), &lexical.tokens)?;
        let externals = resolve(scanner.externals(), &lexical.externals)?;

        for &kind in lexical.tokens.iter().chain(&lexical.externals) {
            if !tokens.contains(&kind) && !externals.contains(&kind) {
                return Err(ConfigurationError::UnscannedToken(kinds.name(kind).to_owned()));
            }
        }

        let mut literals = vec![Vec::new(); 256].into_boxed_slice();
        let mut keywords = FxHashMap::default();
        for (text, kind) in &lexical.literals {
            let bytes: Box<[u8]> = text.as_bytes().into();
            let mut cursor = Cursor::new(&bytes, 0);
            let scanned = scanner.scan(&mut cursor).map(|index| tokens[index]);
            if lexical.word.is_some() && scanned == lexical.word && cursor.offset() == bytes.len() {
                keywords.insert(bytes, *kind);
            } else {
                literals[usize::from(bytes[0])].push((bytes, *kind));
            }
        }
        for bucket in literals.iter_mut() {
            bucket.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()));
        }

        let external_modes = (0..table.lex_mode_count())
            .map(|mode| {
                let valid = table.lex_mode_terminals(LexMode(mode as u16));
                let flags: Box<[bool]> =
                    externals.iter().map(|&kind| valid.contains(kind)).collect();
                flags.contains(&true).then_some(flags)
            })
            .collect();

        Ok(Self { table, scanner, tokens, externals, literals, keywords, external_modes })
    }

    pub fn table(&self) -> &Arc<GrammarTable> {
        &self.table
    }

    /// Lexes the token starting at `position`, leading trivia included.
    pub fn next_token(&self, text: &[u8], position: TextSize, mode: LexMode) -> Token {
        let start = usize::from(position).min(text.len());
        let mut cursor = Cursor::new(text, start);

        if let Some(Some(valid)) = self.external_modes.get(mode.index()) {
            if let Some(index) = self.scanner.scan_external(&mut cursor, valid)
                && cursor.offset() > start
            {
                let end = cursor.offset();
                let kind = self.externals[index];
                return self.token(kind, GreenTrivia::empty(), start, end, &cursor, mode);
            }
            cursor.rewind(start);
        }

        let mut pieces = Vec::new();
        loop {
            let before = cursor.offset();
            match self.scanner.trivia(&mut cursor) {
                Some(kind) if cursor.offset() > before => {
                    let len = TextSize::new((cursor.offset() - before) as u32);
                    pieces.push(TriviaPiece::new(kind, len));
                }
                _ => {
                    cursor.rewind(before);
                    break;
                }
            }
        }
        let leading = GreenTrivia::new(&pieces);
        let token_start = cursor.offset();

        if cursor.is_eof() {
            return self.token(KindId::END, leading, start, token_start, &cursor, mode);
        }

        let valid = self.table.lex_mode_terminals(mode);
        let mut best_valid = None;
        let mut best_any = None;
        let mut consider = |candidate: Candidate| {
            if valid.contains(candidate.kind) && candidate.beats(best_valid) {
                best_valid = Some(candidate);
            }
            if candidate.beats(best_any) {
                best_any = Some(candidate);
            }
        };

        for (bytes, kind) in &self.literals[usize::from(text[token_start])] {
            if cursor.eat_bytes(bytes) {
                consider(Candidate { len: bytes.len(), kind: *kind, literal: true });
                cursor.rewind(token_start);
            }
        }

        if let Some(index) = self.scanner.scan(&mut cursor)
            && cursor.offset() > token_start
        {
            let end = cursor.offset();
            let kind = self.tokens[index];
            let mut candidate = Candidate { len: end - token_start, kind, literal: false };
            if Some(candidate.kind) == self.table.lexical().word
                && let Some(&keyword) = self.keywords.get(&text[token_start..end])
                && (mode == LexMode::ERROR || valid.contains(keyword))
            {
                candidate = Candidate { kind: keyword, literal: true, ..candidate };
            }
            consider(candidate);
        }

        let (kind, len) = match best_valid.or(best_any) {
            Some(candidate) => (candidate.kind, candidate.len),
            None => (KindId::ERROR, 1),
        };
        self.token(kind, leading, start, token_start + len, &cursor, mode)
    }

    fn token(
        &self,
        kind: KindId,
        leading: GreenTrivia,
        start: usize,
        end: usize,
        cursor: &Cursor<'_>,
        lex_mode: LexMode,
    ) -> Token {
        let range = TextRange::new(TextSize::new(start as u32), TextSize::new(end as u32));
        let lookahead_end = TextSize::new(cursor.examined().max(end) as u32);
        Token { kind, leading, range, lookahead_end, lex_mode }
    }
}

impl std::fmt::Debug for Lexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("grammar", &self.table.name())
            .field("keywords", &self.keywords.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
