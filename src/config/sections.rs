//! Section store: top-level keys of a configuration document mapped to raw section text

use crate::error::ConfigError;
use std::collections::HashMap;
use toml::{Table, Value};

/// Immutable mapping of section key to the re-serialized TOML text of that section.
///
/// # Example
/// ```
/// use wiring::Sections;
///
/// let sections = Sections::parse(r#"
///     [formal]
///     style = "sir"
/// "#).unwrap();
///
/// assert_eq!(sections.get("formal"), Some("style = \"sir\"\n"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections {
    sections: HashMap<String, String>
}

impl Sections {
    /// Splits a TOML document into sections.
    ///
    /// Every top-level key must hold a table. An empty document yields an empty store.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }

        let document: Table = input
            .parse()
            .map_err(ConfigError::Parse)?;

        let sections = document
            .into_iter()
            .map(|(key, value)| match value {
                Value::Table(section) => toml::to_string(&section)
                    .map(|text| (key.clone(), text))
                    .map_err(|source| ConfigError::Encode { section: key, source }),
                _ => Err(ConfigError::NotATable(key))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(Self { sections })
    }

    /// Returns the raw text of the section
    #[inline]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.sections
            .get(key)
            .map(String::as_str)
    }

    /// Returns the number of sections
    #[inline]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Checks whether the store has no sections
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Iterates over the section keys
    #[inline]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sections
            .keys()
            .map(String::as_str)
    }

    /// Looks up a section by its `primary` key, then by its `alternate` key.
    ///
    /// Returns the key that matched together with the section text.
    /// Having both sections present is a [`ConfigError::Collision`].
    pub fn lookup<'a>(
        &'a self,
        primary: &'a str,
        alternate: Option<&'a str>
    ) -> Result<Option<(&'a str, &'a str)>, ConfigError> {
        let found = self.get(primary).map(|section| (primary, section));
        let Some(alternate) = alternate.filter(|alt| *alt != primary) else {
            return Ok(found);
        };

        match (found, self.get(alternate)) {
            (Some(_), Some(_)) => Err(ConfigError::Collision {
                primary: primary.to_owned(),
                alternate: alternate.to_owned()
            }),
            (None, Some(section)) => Ok(Some((alternate, section))),
            (found, None) => Ok(found)
        }
    }
}
