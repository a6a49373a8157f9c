//! Type identity and naming rules for registrations

use crate::error::RegistrationError;
use std::{
    any::{type_name, TypeId},
    collections::HashMap,
    fmt,
    hash::{BuildHasherDefault, Hash, Hasher}
};

/// Separates the interface name from the tag name in a dependency id
pub const ID_SEPARATOR: char = '$';

const DYN_PREFIX: &str = "dyn ";

/// Runtime descriptor of a Rust type: its [`TypeId`] and its full name
#[derive(Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str
}

impl TypeInfo {
    /// Describes the type `T`
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>()
        }
    }

    /// Returns the [`TypeId`] of the described type
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the full type name, e.g. `dyn app::Greeter`
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the fully-qualified path of the type.
    /// For trait objects the leading `dyn ` is removed.
    #[inline]
    pub fn qualified_name(&self) -> &'static str {
        self.name
            .strip_prefix(DYN_PREFIX)
            .unwrap_or(self.name)
    }

    /// Checks whether the type is a trait object
    #[inline]
    pub fn is_interface(&self) -> bool {
        self.name.starts_with(DYN_PREFIX)
    }

    /// Checks whether the type is a named, sized type declared by a path.
    /// Primitives, tuples, references, slices and pointers are rejected.
    pub fn is_struct(&self) -> bool {
        !self.is_interface()
            && self.name.contains("::")
            && !self.name.starts_with(['&', '(', '[', '*'])
    }
}

impl PartialEq for TypeInfo {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// The id and the display name of a registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Globally unique id
    pub id: String,
    /// Human-readable name, also the primary config section key
    pub name: String
}

impl Identity {
    /// Derives the identity of the `implementation` of `interface`.
    ///
    /// The name is the `tag` when given and non-empty, otherwise the interface's
    /// fully-qualified name (an anonymous dependency). The id is the interface's
    /// fully-qualified name, suffixed with [`ID_SEPARATOR`] and the name when
    /// the dependency is not anonymous.
    pub fn resolve(
        interface: TypeInfo,
        implementation: TypeInfo,
        tag: Option<&str>
    ) -> Result<Self, RegistrationError> {
        if !interface.is_interface() {
            return Err(RegistrationError::NotInterface(interface.name()));
        }
        if !implementation.is_struct() {
            return Err(RegistrationError::NotStruct(implementation.name()));
        }

        let full_name = interface.qualified_name();
        let name = match tag {
            Some(tag) if !tag.is_empty() => tag,
            _ => full_name
        };

        let id = if name == full_name {
            full_name.to_owned()
        } else {
            format!("{full_name}{ID_SEPARATOR}{name}")
        };

        Ok(Self { id, name: name.to_owned() })
    }

    /// Checks whether this is the implicit, unnamed registration of an interface
    #[inline]
    pub fn is_anonymous(&self) -> bool {
        self.id == self.name
    }
}

/// A [`HashMap`] keyed by [`TypeId`]
pub(crate) type TypeIdMap<V> = HashMap<
    TypeId,
    V,
    BuildHasherDefault<TypeIdHasher>
>;

/// Pass-through hasher for [`TypeId`] keys that are already hashes.
///
/// `TypeId` hashes itself with a single `write_u64`. Byte writes only happen
/// if that changes in `std`; they are folded into the state instead of
/// panicking, so the map stays usable at the cost of a weaker hash.
#[derive(Default)]
pub(crate) struct TypeIdHasher(u64);

impl Hasher for TypeIdHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }

    #[cold]
    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.0 = self.0.rotate_left(8) ^ u64::from(*byte);
        }
    }

    #[inline]
    fn write_u64(&mut self, id: u64) {
        self.0 ^= id;
    }
}
