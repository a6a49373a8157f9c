//! Per-component configuration holder and strict section binding

use crate::error::{BoxError, ConfigError};
use serde::de::DeserializeOwned;
use std::{
    any::type_name,
    ops::{Deref, DerefMut}
};

pub use self::sections::Sections;

pub mod sections;

/// A validation hook of a configuration type.
///
/// It runs after the section has been decoded, and also when no section was
/// found and the type keeps its default values.
///
/// # Example
/// ```
/// use wiring::{Validate, BoxError};
///
/// #[derive(Default)]
/// struct FooConfig {
///     name: String
/// }
///
/// impl Validate for FooConfig {
///     fn validate(&self) -> Result<(), BoxError> {
///         if self.name.is_empty() {
///             return Err("name is empty".into());
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Validate {
    /// Checks the decoded configuration
    #[inline]
    fn validate(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Types that can be bound from a configuration section
pub trait Settings: DeserializeOwned + Default + Validate + Send + Sync + 'static {}

impl<T> Settings for T
where
    T: DeserializeOwned + Default + Validate + Send + Sync + 'static
{}

/// A configuration holder that can be placed inside an implementation struct.
///
/// The runtime decodes the component's configuration section into `T`.
/// Fields of `T` absent from the section keep their default values,
/// keys of the section absent from `T` fail the construction.
#[derive(Debug, Default, Clone)]
pub struct Config<T> {
    config: T
}

impl<T> Config<T> {
    /// Returns the bound configuration
    #[inline]
    pub fn get(&self) -> &T {
        &self.config
    }
}

impl<T> Deref for Config<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.config
    }
}

impl<T> DerefMut for Config<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.config
    }
}

impl<T: Settings> Config<T> {
    /// Binds the section found under `primary` (or else `alternate`)
    /// and runs the [`Validate`] hook.
    pub(crate) fn bind(
        &mut self,
        sections: &Sections,
        primary: &str,
        alternate: Option<&str>
    ) -> Result<(), ConfigError> {
        if let Some((key, section)) = sections.lookup(primary, alternate)? {
            self.config = decode_section(key, section)?;
        }

        self.config
            .validate()
            .map_err(|source| ConfigError::Invalid {
                config: type_name::<T>(),
                source
            })
    }
}

/// Decodes `section` into `T`, rejecting keys that `T` does not declare.
///
/// Every key the deserializer of `T` skips is reported with its dotted path,
/// including keys of nested tables and of tables inside arrays
/// (e.g. `servers.0.port`).
pub fn decode_section<T: DeserializeOwned>(key: &str, section: &str) -> Result<T, ConfigError> {
    let mut unknown = Vec::new();
    let config: T = serde_ignored::deserialize(
        toml::Deserializer::new(section),
        |path| unknown.push(path.to_string())
    ).map_err(|source| ConfigError::Decode {
        section: key.to_owned(),
        source
    })?;

    if !unknown.is_empty() {
        return Err(ConfigError::UnknownKeys {
            section: key.to_owned(),
            keys: unknown
        });
    }

    Ok(config)
}
