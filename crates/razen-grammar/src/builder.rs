use indexmap::IndexMap;

use crate::{ConfigurationError, GrammarTable, Rule, lalr, normalize};

/// What to do with a shift/reduce conflict precedence cannot decide.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ConflictPolicy {
    /// Fail the build.
    #[default]
    Strict,
    /// Shift, as yacc does, and log the conflict.
    PreferShift,
}

/// Collects the rules and tokens of a language.
///
/// The first rule added is the start rule. Names starting with `_` are
/// hidden: their children are spliced into the enclosing node.
#[derive(Clone, Debug)]
pub struct GrammarBuilder {
    pub(crate) name: String,
    pub(crate) version: u32,
    pub(crate) rules: IndexMap<String, Rule>,
    pub(crate) tokens: Vec<String>,
    pub(crate) externals: Vec<String>,
    pub(crate) word: Option<String>,
    pub(crate) conflict_policy: ConflictPolicy,
    pub(crate) duplicates: Vec<String>,
}

impl GrammarBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: 1,
            rules: IndexMap::new(),
            tokens: Vec::new(),
            externals: Vec::new(),
            word: None,
            conflict_policy: ConflictPolicy::default(),
            duplicates: Vec::new(),
        }
    }

    pub fn version(&mut self, version: u32) -> &mut Self {
        self.version = version;
        self
    }

    pub fn rule(&mut self, name: &str, rule: Rule) -> &mut Self {
        if self.rules.insert(name.to_owned(), rule).is_some() {
            self.duplicates.push(name.to_owned());
        }
        self
    }

    /// Declares a token produced by the language scanner.
    pub fn token(&mut self, name: &str) -> &mut Self {
        self.tokens.push(name.to_owned());
        self
    }

    /// Declares an immediate token: scanned at the raw position, before any
    /// trivia is skipped, and only where the grammar expects it.
    pub fn external(&mut self, name: &str) -> &mut Self {
        self.externals.push(name.to_owned());
        self
    }

    /// The identifier-like token whose text is matched against keywords.
    pub fn word(&mut self, name: &str) -> &mut Self {
        self.word = Some(name.to_owned());
        self
    }

    pub fn conflict_policy(&mut self, policy: ConflictPolicy) -> &mut Self {
        self.conflict_policy = policy;
        self
    }

    #[tracing::instrument(level = "debug", skip_all, fields(grammar = %self.name))]
    pub fn build(&self) -> Result<GrammarTable, ConfigurationError> {
        let grammar = normalize::normalize(self)?;
        lalr::build(&grammar)
    }
}
