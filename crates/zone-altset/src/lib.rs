//! Alternating sets.
//!
//! An [`AltSet`] is either *normal*, storing its members, or *inverted*,
//! storing the elements it excludes and implicitly containing everything
//! else. This lets a setting say "every item except bedrock and TNT" without
//! enumerating an unbounded domain.
//!
//! # Set algebra
//!
//! `N(a)` is a normal set with members `a`, `I(a)` an inverted set excluding
//! `a`. All operations stay within the stored elements:
//!
//! ```text
//!            union            intersect        subtract (lhs \ rhs)
//! N(a) N(b)  N(a ∪ b)         N(a ∩ b)         N(a \ b)
//! N(a) I(b)  I(b \ a)         N(a \ b)         N(a ∩ b)
//! I(a) N(b)  I(a \ b)         N(b \ a)         I(a ∪ b)
//! I(a) I(b)  I(a ∩ b)         I(a ∪ b)         N(b \ a)
//! ```
//!
//! Equality compares representations: over a finite domain, `N(domain)` and
//! `I(∅)` hold the same members but are not equal.

use std::fmt;
use std::hash::Hash;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

/// A set that is either explicit or the complement of an explicit set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize + Eq + Hash",
    deserialize = "T: Deserialize<'de> + Eq + Hash"
))]
pub struct AltSet<T: Eq + Hash> {
    inverted: bool,
    elements: HashSet<T>,
}

impl<T: Eq + Hash> Default for AltSet<T> {
    fn default() -> Self {
        Self {
            inverted: false,
            elements: HashSet::new(),
        }
    }
}

impl<T: Eq + Hash + Clone> AltSet<T> {
    /// Empty normal set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set containing everything.
    #[must_use]
    pub fn full() -> Self {
        Self {
            inverted: true,
            elements: HashSet::new(),
        }
    }

    /// Everything except the given elements.
    pub fn all_except(excluded: impl IntoIterator<Item = T>) -> Self {
        Self {
            inverted: true,
            elements: excluded.into_iter().collect(),
        }
    }

    /// Become the set containing everything.
    pub fn fill(&mut self) {
        self.inverted = true;
        self.elements.clear();
    }

    /// Become the empty set.
    pub fn clear(&mut self) {
        self.inverted = false;
        self.elements.clear();
    }

    /// Replace the set with its complement.
    pub fn invert(&mut self) {
        self.inverted = !self.inverted;
    }

    /// The complement, leaving `self` untouched.
    #[must_use]
    pub fn inverted(&self) -> Self {
        Self {
            inverted: !self.inverted,
            elements: self.elements.clone(),
        }
    }

    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.elements.contains(value) != self.inverted
    }

    /// Adds a member. Returns whether membership changed.
    pub fn insert(&mut self, value: T) -> bool {
        if self.inverted {
            self.elements.remove(&value)
        } else {
            self.elements.insert(value)
        }
    }

    /// Removes a member. Returns whether membership changed.
    pub fn remove(&mut self, value: &T) -> bool {
        if self.inverted {
            self.elements.insert(value.clone())
        } else {
            self.elements.remove(value)
        }
    }

    #[must_use]
    pub const fn is_inverted(&self) -> bool {
        self.inverted
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.inverted && self.elements.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.inverted && self.elements.is_empty()
    }

    /// Stored elements: members when normal, exclusions when inverted.
    pub fn explicit(&self) -> impl Iterator<Item = &T> {
        self.elements.iter()
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        match (self.inverted, other.inverted) {
            (false, false) => Self::normal(self.elements.union(&other.elements)),
            (false, true) => Self::inverted_of(other.elements.difference(&self.elements)),
            (true, false) => Self::inverted_of(self.elements.difference(&other.elements)),
            (true, true) => Self::inverted_of(self.elements.intersection(&other.elements)),
        }
    }

    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        match (self.inverted, other.inverted) {
            (false, false) => Self::normal(self.elements.intersection(&other.elements)),
            (false, true) => Self::normal(self.elements.difference(&other.elements)),
            (true, false) => Self::normal(other.elements.difference(&self.elements)),
            (true, true) => Self::inverted_of(self.elements.union(&other.elements)),
        }
    }

    /// Members of `self` that are not members of `other`.
    #[must_use]
    pub fn subtract(&self, other: &Self) -> Self {
        match (self.inverted, other.inverted) {
            (false, false) => Self::normal(self.elements.difference(&other.elements)),
            (false, true) => Self::normal(self.elements.intersection(&other.elements)),
            (true, false) => Self::inverted_of(self.elements.union(&other.elements)),
            (true, true) => Self::normal(other.elements.difference(&self.elements)),
        }
    }

    fn normal<'a>(elements: impl Iterator<Item = &'a T>) -> Self
    where
        T: 'a,
    {
        Self {
            inverted: false,
            elements: elements.cloned().collect(),
        }
    }

    fn inverted_of<'a>(elements: impl Iterator<Item = &'a T>) -> Self
    where
        T: 'a,
    {
        Self {
            inverted: true,
            elements: elements.cloned().collect(),
        }
    }
}

impl<T: Eq + Hash + Clone> FromIterator<T> for AltSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            inverted: false,
            elements: iter.into_iter().collect(),
        }
    }
}

impl<T: Eq + Hash + Clone> Extend<T> for AltSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T: Eq + Hash + fmt::Display> fmt::Display for AltSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.elements.iter().map(ToString::to_string).collect();
        names.sort_unstable();
        match (self.inverted, names.is_empty()) {
            (false, _) => write!(f, "{{{}}}", names.join(", ")),
            (true, true) => write!(f, "*"),
            (true, false) => write!(f, "* except {{{}}}", names.join(", ")),
        }
    }
}
