//! Error types of registration, validation, resolution and construction

use std::{
    error::Error as StdError,
    fmt::{self, Display, Formatter}
};

/// Boxed error returned by lifecycle hooks and config validation
pub type BoxError = Box<
    dyn StdError
    + Send
    + Sync
>;

/// Generic error of the dependency runtime
#[derive(Debug)]
pub enum Error {
    /// A registration was rejected
    Registration(RegistrationError),
    /// The registration graph has dangling references
    Validation(ValidationError),
    /// The configuration document could not be split into sections
    Document(ConfigError),
    /// No registration exists for the implementation type
    ImplNotFound(&'static str),
    /// No registration exists for the interface, or none under the given name
    IntfNotFound {
        interface: &'static str,
        name: String
    },
    /// The interface has registrations, but none of them is anonymous
    NoAnonymous(&'static str),
    /// A reference cycle was reached; holds the ids along the cycle
    Cycle(Vec<String>),
    /// The resolved instance is not of the requested type
    TypeMismatch {
        dep: String,
        expected: &'static str
    },
    /// A reference field could not be wired
    Reference {
        owner: &'static str,
        field: &'static str,
        source: Box<Error>
    },
    /// Configuration binding of a dependency failed
    Config {
        dep: String,
        source: ConfigError
    },
    /// The initialization hook of a dependency failed
    Lifecycle {
        dep: String,
        source: BoxError
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::Registration(err) => write!(f, "registration error: {err}"),
            Error::Validation(err) => err.fmt(f),
            Error::Document(err) => write!(f, "configuration error: {err}"),
            Error::ImplNotFound(type_name) => write!(f, "the implementation {type_name} not found"),
            Error::IntfNotFound { interface, name } if name.is_empty() => write!(
                f,
                "dep {interface} not found; maybe you forgot to register it"
            ),
            Error::IntfNotFound { interface, name } => write!(
                f,
                "dep {interface} named {name:?} not found; maybe you forgot to register it"
            ),
            Error::NoAnonymous(interface) => write!(f, "no anonymous dep found for {interface}"),
            Error::Cycle(path) => write!(f, "dependency cycle detected: {}", path.join(" -> ")),
            Error::TypeMismatch { dep, expected } => write!(f, "dep {dep:?} is not an instance of {expected}"),
            Error::Reference { owner, field, source } => write!(f, "setting field {owner}.{field}: {source}"),
            Error::Config { dep, source } => write!(f, "dep {dep:?} configuration failed: {source}"),
            Error::Lifecycle { dep, source } => write!(f, "dep {dep:?} initialization failed: {source}")
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Registration(err) => Some(err),
            Error::Validation(err) => Some(err),
            Error::Document(err) => Some(err),
            Error::Reference { source, .. } => Some(source.as_ref()),
            Error::Config { source, .. } => Some(source),
            Error::Lifecycle { source, .. } => Some(source.as_ref()),
            _ => None
        }
    }
}

impl From<RegistrationError> for Error {
    #[inline]
    fn from(err: RegistrationError) -> Self {
        Self::Registration(err)
    }
}

impl From<ValidationError> for Error {
    #[inline]
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl Error {
    /// Checks whether the error is a per-call lookup failure
    /// that leaves the runtime usable with other parameters
    #[inline]
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            Error::ImplNotFound(_) | Error::IntfNotFound { .. } | Error::NoAnonymous(_) | Error::Cycle(_)
        )
    }

    /// Checks whether the error was raised while constructing a dependency.
    /// Such failures are never cached.
    #[inline]
    pub fn is_construction_error(&self) -> bool {
        match self {
            Error::Config { .. } | Error::Lifecycle { .. } => true,
            Error::Reference { source, .. } => source.is_construction_error() || source.is_resolution_error(),
            _ => false
        }
    }

    /// Returns the innermost error of a chain of reference wiring failures
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Reference { source, .. } => source.root_cause(),
            other => other
        }
    }
}

/// Describes why a registration was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The registration has an empty id
    MissingId,
    /// The registration has an empty name
    MissingName,
    /// The interface type is not a trait object
    NotInterface(&'static str),
    /// The implementation type is not a struct
    NotStruct(&'static str),
    /// Another registration already uses the id
    DuplicateId {
        id: String,
        existing: &'static str,
        implementation: &'static str
    },
    /// The interface already holds a singleton registration,
    /// or a singleton is registered for an interface that is already implemented
    DuplicateSingleton {
        name: String,
        implementation: &'static str
    },
    /// Two registrations of one interface share a name
    DuplicateName {
        interface: &'static str,
        name: String
    },
    /// The implementation type is registered more than once
    DuplicateImplementation(&'static str)
}

impl Display for RegistrationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationError::MissingId => f.write_str("missing id"),
            RegistrationError::MissingName => f.write_str("missing name"),
            RegistrationError::NotInterface(type_name) => write!(f, "{type_name} is not an interface type"),
            RegistrationError::NotStruct(type_name) => write!(f, "{type_name} is not a struct type"),
            RegistrationError::DuplicateId { id, existing, implementation } => write!(
                f,
                "dep {id} already registered for type {existing} when registering {implementation}"
            ),
            RegistrationError::DuplicateSingleton { name, implementation } => write!(
                f,
                "dep {name} already registered as singleton when registering {implementation}"
            ),
            RegistrationError::DuplicateName { interface, name } => write!(
                f,
                "multiple deps implementing {interface} found for {name}"
            ),
            RegistrationError::DuplicateImplementation(type_name) => write!(
                f,
                "multiple deps found for the same implementation {type_name}"
            )
        }
    }
}

impl StdError for RegistrationError {}

/// A reference field pointing at an interface nobody registered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingRef {
    /// Implementation type that declares the reference
    pub implementation: &'static str,
    /// Name of the reference field
    pub field: &'static str,
    /// Interface the reference points at
    pub interface: &'static str
}

impl Display for DanglingRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "the implementation struct {} has reference field {} to {}, but {} was not registered; maybe you forgot to register it",
            self.implementation,
            self.field,
            self.interface,
            self.interface
        )
    }
}

/// All dangling references of a registration graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    violations: Vec<DanglingRef>
}

impl ValidationError {
    #[inline]
    pub(crate) fn new(violations: Vec<DanglingRef>) -> Self {
        Self { violations }
    }

    /// Returns every dangling reference found
    #[inline]
    pub fn violations(&self) -> &[DanglingRef] {
        &self.violations
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            violation.fmt(f)?;
        }
        Ok(())
    }
}

impl StdError for ValidationError {}

/// Describes configuration document and section binding failures
#[derive(Debug)]
pub enum ConfigError {
    /// The document is not valid TOML
    Parse(toml::de::Error),
    /// A top-level entry of the document is not a table
    NotATable(String),
    /// A section could not be re-serialized
    Encode {
        section: String,
        source: toml::ser::Error
    },
    /// A section could not be decoded into the config type
    Decode {
        section: String,
        source: toml::de::Error
    },
    /// A section has keys the config type does not know
    UnknownKeys {
        section: String,
        keys: Vec<String>
    },
    /// Both the primary and the alternate section are present
    Collision {
        primary: String,
        alternate: String
    },
    /// The `Validate` hook of the config type rejected it
    Invalid {
        config: &'static str,
        source: BoxError
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(err) => write!(f, "invalid configuration document: {err}"),
            ConfigError::NotATable(key) => write!(f, "top-level key {key:?} is not a section"),
            ConfigError::Encode { section, source } => write!(f, "encoding section {section:?}: {source}"),
            ConfigError::Decode { section, source } => write!(f, "section {section:?}: {source}"),
            ConfigError::UnknownKeys { section, keys } => write!(
                f,
                "section {section:?} has unknown keys [{}]",
                keys.join(", ")
            ),
            ConfigError::Collision { primary, alternate } => write!(
                f,
                "conflicting sections {alternate:?} and {primary:?}"
            ),
            ConfigError::Invalid { config, source } => write!(f, "validate {config}: {source}")
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Parse(err) => Some(err),
            ConfigError::Encode { source, .. } => Some(source),
            ConfigError::Decode { source, .. } => Some(source),
            ConfigError::Invalid { source, .. } => Some(source.as_ref()),
            _ => None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_joins_validation_violations() {
        let err = ValidationError::new(vec![
            DanglingRef { implementation: "a::A", field: "b", interface: "a::B" },
            DanglingRef { implementation: "a::A", field: "c", interface: "a::C" },
        ]);

        let text = err.to_string();

        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("reference field b to a::B"));
        assert!(text.contains("reference field c to a::C"));
    }

    #[test]
    fn it_formats_unknown_keys() {
        let err = ConfigError::UnknownKeys {
            section: "formal".into(),
            keys: vec!["colour".into(), "nested.depth".into()]
        };

        assert_eq!(err.to_string(), "section \"formal\" has unknown keys [colour, nested.depth]");
    }

    #[test]
    fn it_finds_root_cause_of_reference_chain() {
        let err = Error::Reference {
            owner: "a::A",
            field: "b",
            source: Box::new(Error::Reference {
                owner: "a::B",
                field: "c",
                source: Box::new(Error::NoAnonymous("a::C"))
            })
        };

        assert!(matches!(err.root_cause(), Error::NoAnonymous("a::C")));
        assert!(err.is_construction_error());
        assert_eq!(
            err.to_string(),
            "setting field a::A.b: setting field a::B.c: no anonymous dep found for a::C"
        );
    }
}
