//! Ordered host chains handed to setting extraction.

use crate::{HostId, Setting, Settings, UserId};

/// One host in a [`HostChain`].
#[derive(Clone, Copy, Debug)]
pub struct ChainLink<'a> {
    pub host: HostId,
    /// Zone priority; `None` for worlds and the universe.
    pub priority: Option<u32>,
    pub settings: &'a Settings,
}

/// Hosts that explicitly configure a setting at a location, most specific
/// first.
///
/// ```text
/// [ zones by priority desc | their ancestors | world | universe ]
///   most specific ───────────────────────────────▶ least specific
/// ```
#[derive(Clone, Debug, Default)]
pub struct HostChain<'a> {
    links: Vec<ChainLink<'a>>,
}

impl<'a> HostChain<'a> {
    pub(crate) const fn from_links(links: Vec<ChainLink<'a>>) -> Self {
        Self { links }
    }

    /// Links from most to least specific.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ChainLink<'a>> {
        self.links.iter()
    }

    /// Host ids from most to least specific.
    #[must_use]
    pub fn hosts(&self) -> Vec<HostId> {
        self.links.iter().map(|link| link.host).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// The first value for `key` applying to `user`, scanning from the most
    /// specific host.
    #[must_use]
    pub fn most_specific<S: Setting + ?Sized>(&self, key: &S, user: Option<UserId>) -> Option<&'a S::Value> {
        self.links
            .iter()
            .find_map(|link| link.settings.resolve(key, user))
    }
}
