//! Per-host setting storage.
//!
//! Every host owns a [`Settings`] map from setting name to a type-erased
//! [`SettingEntry`]. Access is typed through the [`Setting`] key, so a
//! value can only be read back as the type it was stored with, and a write
//! through a key of another type is refused.

use std::any::Any;
use std::fmt;

use hashbrown::HashMap;
use tracing::warn;

use crate::{HierarchyError, HierarchyResult, Setting, UserId};

/// Explicit values of one setting on one host.
#[derive(Clone, Debug, PartialEq)]
pub struct SettingEntry<V> {
    general: Option<V>,
    users: HashMap<UserId, V>,
}

impl<V> Default for SettingEntry<V> {
    fn default() -> Self {
        Self {
            general: None,
            users: HashMap::new(),
        }
    }
}

impl<V> SettingEntry<V> {
    /// The value that applies to everyone without a user-specific value.
    #[must_use]
    pub const fn general(&self) -> Option<&V> {
        self.general.as_ref()
    }

    #[must_use]
    pub fn for_user(&self, user: UserId) -> Option<&V> {
        self.users.get(&user)
    }

    /// User-specific value if one exists, otherwise the general value.
    #[must_use]
    pub fn resolve(&self, user: Option<UserId>) -> Option<&V> {
        user.and_then(|user| self.users.get(&user))
            .or(self.general.as_ref())
    }

    pub fn users(&self) -> impl Iterator<Item = (UserId, &V)> {
        self.users.iter().map(|(&user, value)| (user, value))
    }

    fn is_empty(&self) -> bool {
        self.general.is_none() && self.users.is_empty()
    }
}

/// Explicitly configured settings of a host.
#[derive(Default)]
pub struct Settings {
    entries: HashMap<&'static str, Box<dyn Any + Send + Sync>>,
}

impl Settings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Typed view of everything stored for `key`.
    #[must_use]
    pub fn entry<S: Setting + ?Sized>(&self, key: &S) -> Option<&SettingEntry<S::Value>> {
        self.entries
            .get(key.name())
            .and_then(|entry| entry.downcast_ref())
    }

    /// General value of `key`.
    #[must_use]
    pub fn get<S: Setting + ?Sized>(&self, key: &S) -> Option<&S::Value> {
        self.entry(key).and_then(SettingEntry::general)
    }

    /// Value of `key` stored specifically for `user`.
    #[must_use]
    pub fn get_for_user<S: Setting + ?Sized>(&self, key: &S, user: UserId) -> Option<&S::Value> {
        self.entry(key).and_then(|entry| entry.for_user(user))
    }

    /// Value of `key` that applies to `user` on this host.
    #[must_use]
    pub fn resolve<S: Setting + ?Sized>(&self, key: &S, user: Option<UserId>) -> Option<&S::Value> {
        self.entry(key).and_then(|entry| entry.resolve(user))
    }

    /// Whether any value (general or per user) is stored for `key`.
    #[must_use]
    pub fn is_set<S: Setting + ?Sized>(&self, key: &S) -> bool {
        self.entry(key).is_some()
    }

    /// Stores the general value, returning the previous one.
    pub fn set<S: Setting + ?Sized>(
        &mut self,
        key: &S,
        value: S::Value,
    ) -> HierarchyResult<Option<S::Value>> {
        self.update(key, |entry| entry.general.replace(value))
    }

    /// Stores a value for one user, returning the previous one.
    pub fn set_for_user<S: Setting + ?Sized>(
        &mut self,
        key: &S,
        user: UserId,
        value: S::Value,
    ) -> HierarchyResult<Option<S::Value>> {
        self.update(key, |entry| entry.users.insert(user, value))
    }

    /// Removes the general value. User-specific values stay.
    pub fn clear<S: Setting + ?Sized>(&mut self, key: &S) -> HierarchyResult<Option<S::Value>> {
        self.update(key, |entry| entry.general.take())
    }

    pub fn clear_for_user<S: Setting + ?Sized>(
        &mut self,
        key: &S,
        user: UserId,
    ) -> HierarchyResult<Option<S::Value>> {
        self.update(key, |entry| entry.users.remove(&user))
    }

    /// Removes every value stored for `key`.
    pub fn clear_all<S: Setting + ?Sized>(
        &mut self,
        key: &S,
    ) -> HierarchyResult<Option<SettingEntry<S::Value>>> {
        self.take(key)
    }

    /// Names of the settings with at least one stored value.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs `f` on the entry for `key`, dropping the entry once it is empty.
    fn update<S: Setting + ?Sized, R>(
        &mut self,
        key: &S,
        f: impl FnOnce(&mut SettingEntry<S::Value>) -> R,
    ) -> HierarchyResult<R> {
        let mut entry = self.take(key)?.unwrap_or_default();
        let result = f(&mut entry);
        if !entry.is_empty() {
            self.entries.insert(key.name(), Box::new(entry));
        }
        Ok(result)
    }

    /// Removes the entry for `key`. An entry of another value type stays.
    fn take<S: Setting + ?Sized>(
        &mut self,
        key: &S,
    ) -> HierarchyResult<Option<SettingEntry<S::Value>>> {
        let Some(stored) = self.entries.remove(key.name()) else {
            return Ok(None);
        };
        match stored.downcast::<SettingEntry<S::Value>>() {
            Ok(entry) => Ok(Some(*entry)),
            Err(stored) => {
                warn!(setting = key.name(), "refusing write through a key of another type");
                self.entries.insert(key.name(), stored);
                Err(HierarchyError::SettingType(key.name()))
            }
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.keys().collect();
        keys.sort_unstable();
        f.debug_struct("Settings").field("keys", &keys).finish()
    }
}
