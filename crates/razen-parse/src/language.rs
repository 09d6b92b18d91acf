use std::fmt;
use std::sync::Arc;

use razen_grammar::{ConfigurationError, GrammarBuilder, GrammarTable};
use razen_tokenizer::{Lexer, TokenScanner};
use razen_yellow::{KindId, LanguageId};

/// A compiled grammar together with its lexer.
///
/// Building a language runs the table construction once; afterwards it is
/// immutable and can be shared between threads.
pub struct Language {
    id: LanguageId,
    table: Arc<GrammarTable>,
    lexer: Lexer,
}

impl Language {
    pub fn new(
        grammar: &GrammarBuilder,
        scanner: Box<dyn TokenScanner>,
    ) -> Result<Self, ConfigurationError> {
        let table = Arc::new(grammar.build()?);
        let lexer = Lexer::new(table.clone(), scanner)?;
        let id = LanguageId {
            name: table.name().into(),
            version: table.version(),
            fingerprint: table.fingerprint(),
        };
        tracing::debug!(
            language = %id,
            states = table.state_count(),
            lex_modes = table.lex_mode_count(),
            "language compiled"
        );
        Ok(Self { id, table, lexer })
    }

    pub fn id(&self) -> &LanguageId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.id.name
    }

    pub fn table(&self) -> &Arc<GrammarTable> {
        &self.table
    }

    pub fn lexer(&self) -> &Lexer {
        &self.lexer
    }

    pub fn kind_name(&self, kind: KindId) -> &str {
        self.table.kinds().name(kind)
    }

    pub fn kind_id(&self, name: &str) -> Option<KindId> {
        self.table.kinds().kind_id(name)
    }

    pub fn kind_count(&self) -> usize {
        self.table.kinds().len()
    }

    pub fn is_named(&self, kind: KindId) -> bool {
        self.table.kinds().info(kind).named
    }

    pub fn is_visible(&self, kind: KindId) -> bool {
        self.table.kinds().info(kind).visible
    }

    /// Fails unless `id` names this language at this table version.
    pub fn check_compatible(&self, id: &LanguageId) -> Result<(), ConfigurationError> {
        if *id == self.id {
            return Ok(());
        }
        Err(ConfigurationError::IncompatibleTree {
            expected: self.id.to_string(),
            found: id.to_string(),
        })
    }
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Language").field("id", &self.id).finish_non_exhaustive()
    }
}
