//! Process-wide table of the languages [`crate::parse`] can look up by name.
//!
//! The registry is written once. Either the host calls [`install`] before
//! anything queries it, or the first query installs the built-in `razen`
//! language on its own.

use once_cell::sync::OnceCell;
use razen_grammar::ConfigurationError;
use razen_parse::Language;
use rustc_hash::FxHashMap;
use thiserror::Error;

static REGISTRY: OnceCell<Registry> = OnceCell::new();

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RegistryError {
    #[error("the language registry is already installed")]
    AlreadyInstalled,
    #[error("language `{0}` is registered twice")]
    Duplicate(String),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// Languages to install, in registration order.
#[derive(Default)]
pub struct RegistryBuilder {
    languages: Vec<Language>,
}

impl RegistryBuilder {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in `razen` language.
    pub fn with_builtin() -> Result<Self, ConfigurationError> {
        Ok(Self::new().language(crate::language()?))
    }

    pub fn language(mut self, language: Language) -> Self {
        self.languages.push(language);
        self
    }

    pub(crate) fn build(self) -> Result<Registry, RegistryError> {
        let mut index = FxHashMap::default();
        for (position, language) in self.languages.iter().enumerate() {
            if index.insert(language.name().to_owned(), position).is_some() {
                return Err(RegistryError::Duplicate(language.name().to_owned()));
            }
        }
        Ok(Registry { languages: self.languages, index })
    }
}

pub struct Registry {
    languages: Vec<Language>,
    index: FxHashMap<String, usize>,
}

impl Registry {
    pub fn get(&self, name: &str) -> Option<&Language> {
        self.index.get(name).map(|&position| &self.languages[position])
    }

    pub fn languages(&self) -> impl Iterator<Item = &Language> {
        self.languages.iter()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.languages.iter().map(Language::id)).finish()
    }
}

/// Installs the process-wide registry. Fails if it is already in place,
/// including when an earlier query installed the built-in one.
pub fn install(builder: RegistryBuilder) -> Result<&'static Registry, RegistryError> {
    let registry = builder.build()?;
    let mut installed = false;
    let registry = REGISTRY.get_or_init(|| {
        installed = true;
        registry
    });
    if !installed {
        return Err(RegistryError::AlreadyInstalled);
    }
    tracing::debug!(languages = registry.languages.len(), "language registry installed");
    Ok(registry)
}

/// The process-wide registry, installing the built-in one if nothing was
/// installed yet.
pub fn registry() -> Result<&'static Registry, RegistryError> {
    REGISTRY.get_or_try_init(|| {
        tracing::debug!("installing the built-in language registry");
        RegistryBuilder::with_builtin()?.build()
    })
}

/// Looks up a registered language by name.
pub fn lookup(name: &str) -> Result<&'static Language, RegistryError> {
    registry()?
        .get(name)
        .ok_or_else(|| ConfigurationError::UnknownLanguage(name.to_owned()).into())
}
