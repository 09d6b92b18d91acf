//! The Razen language on top of the incremental parsing engine.
//!
//! ```text
//! let tree = razen::parse("razen", "var x = 1;", None, None)?;
//! let edited = razen::parse("razen", "var x = 12;", Some(&tree), Some(&edit))?;
//! ```

mod grammar;
pub mod registry;
mod scanner;
#[cfg(test)]
mod tests;

pub use grammar::grammar;
use razen_grammar::ConfigurationError;
pub use razen_parse::{EditError, InputEdit, Language, Parser, ParserOptions, ReparseError};
pub use razen_yellow::SyntaxTree;
use razen_yellow::TextSize;
pub use registry::{Registry, RegistryBuilder, RegistryError};
use thiserror::Error;

/// Compiles the Razen grammar. [`registry::lookup`] hands out a shared copy.
pub fn language() -> Result<Language, ConfigurationError> {
    Language::new(&grammar(), Box::new(scanner::RazenScanner))
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ParseError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Registry(RegistryError),
}

impl From<RegistryError> for ParseError {
    fn from(error: RegistryError) -> Self {
        match error {
            RegistryError::Configuration(error) => Self::Configuration(error),
            error => Self::Registry(error),
        }
    }
}

impl From<ReparseError> for ParseError {
    fn from(error: ReparseError) -> Self {
        match error {
            ReparseError::Edit(error) => Self::Edit(error),
            ReparseError::Configuration(error) => Self::Configuration(error),
        }
    }
}

/// A language given by its registered name or directly.
#[derive(Clone, Copy, Debug)]
pub enum LanguageRef<'l> {
    Name(&'l str),
    Language(&'l Language),
}

impl<'l> From<&'l str> for LanguageRef<'l> {
    fn from(name: &'l str) -> Self {
        Self::Name(name)
    }
}

impl<'l> From<&'l Language> for LanguageRef<'l> {
    fn from(language: &'l Language) -> Self {
        Self::Language(language)
    }
}

/// Parses `source`.
///
/// With a `previous` tree the parse is incremental: `edit` describes how the
/// text of `previous` became `source`. Without an edit, the changed range is
/// found by comparing the two texts. An edit without a previous tree has
/// nothing to apply to and is ignored.
pub fn parse<'l>(
    language: impl Into<LanguageRef<'l>>,
    source: impl AsRef<[u8]>,
    previous: Option<&SyntaxTree>,
    edit: Option<&InputEdit>,
) -> Result<SyntaxTree, ParseError> {
    let language = match language.into() {
        LanguageRef::Name(name) => registry::lookup(name)?,
        LanguageRef::Language(language) => language,
    };
    let parser = Parser::new(language);
    let source = source.as_ref();

    let Some(previous) = previous else {
        if edit.is_some() {
            tracing::debug!("edit without a previous tree, parsing from scratch");
        }
        return Ok(parser.parse(source));
    };
    let edit = match edit {
        Some(edit) => *edit,
        None => InputEdit::new(TextSize::new(0), len(previous.text()), len(source)),
    };
    Ok(parser.reparse(previous, &edit, source)?)
}

fn len(text: &[u8]) -> TextSize {
    TextSize::new(text.len() as u32)
}
