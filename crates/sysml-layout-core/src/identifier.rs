//! Identifier management using string interning for efficient storage and comparison
//!
//! This module provides the [`Id`] type used for nodes and edges of a diagram
//! graph. Identifiers are interned when a graph is constructed; layout code only
//! compares, hashes and copies them.
//!
//! # Memory
//!
//! The interner is process-wide and append-only: a name stays interned after
//! every graph using it is dropped, so memory grows with the number of distinct
//! names ever seen, not with the graphs alive at one time. A long-running host
//! that lays out unrelated diagrams can watch [`Id::interned_count`] and recycle
//! the process once it passes a budget.

use std::{
    fmt,
    sync::{Mutex, MutexGuard, OnceLock},
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner for identifier storage.
///
/// # Thread Safety
///
/// This uses `Mutex` for thread-safe access to the string interner. The interner
/// is append-only, so concurrent layouts of independent graphs never observe each
/// other's identifiers changing. Symbols are never freed.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn interner() -> MutexGuard<'static, DefaultStringInterner> {
    INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .expect("Failed to acquire interner lock")
}

/// Efficient identifier type using string interning
///
/// # Examples
///
/// ```
/// use sysml_layout_core::identifier::Id;
///
/// let block = Id::new("Vehicle");
/// let port = Id::new("Vehicle.power");
///
/// assert_ne!(block, port);
/// assert_eq!(block, "Vehicle");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Creates an `Id` from &str.
    ///
    /// # Arguments
    ///
    /// * `name` - The string representation of the identifier
    pub fn new(name: &str) -> Self {
        Self(interner().get_or_intern(name))
    }

    /// Number of distinct names interned by this process so far.
    ///
    /// Never decreases; see the module docs on memory.
    pub fn interned_count() -> usize {
        interner().len()
    }

    /// Returns an owned copy of the identifier's string representation.
    pub fn as_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let interner = interner();
        let str_value = interner
            .resolve(self.0)
            .expect("Symbol should exist in interner");
        write!(f, "{str_value}")
    }
}

impl std::str::FromStr for Id {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Id {
    /// Creates an `Id` from a string slice
    ///
    /// # Examples
    ///
    /// ```
    /// use sysml_layout_core::identifier::Id;
    ///
    /// let id: Id = "Engine".into();
    /// assert_eq!(id, "Engine");
    /// ```
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        let interner = interner();
        interner
            .resolve(self.0)
            .is_some_and(|self_str| self_str == other)
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl Serialize for Id {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(Self::new(&name))
    }
}
