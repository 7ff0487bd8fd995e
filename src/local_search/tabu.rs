//! Attribute-based tabu memory.

use std::collections::HashMap;

/// A solution attribute that a recent move destroyed.
///
/// Moves that would re-create a forbidden attribute are tabu until the
/// attribute expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TabuAttribute {
    /// Stop `stop` served by route `route`.
    StopInRoute {
        /// Stop arena index.
        stop: usize,
        /// Route (vehicle) index.
        route: usize,
    },
    /// Stop `stop` at position `pos` of route `route`.
    StopAtPosition {
        /// Stop arena index.
        stop: usize,
        /// Route (vehicle) index.
        route: usize,
        /// Position in the route.
        pos: usize,
    },
    /// A segment of `route` bounded by two stops, in either orientation.
    Reversal {
        /// Route (vehicle) index.
        route: usize,
        /// Smaller endpoint stop index.
        low: usize,
        /// Larger endpoint stop index.
        high: usize,
    },
}

impl TabuAttribute {
    /// Reversal attribute with endpoints in canonical order.
    pub fn reversal(route: usize, a: usize, b: usize) -> Self {
        Self::Reversal {
            route,
            low: a.min(b),
            high: a.max(b),
        }
    }
}

/// Tabu list keyed by attribute, storing the iteration at which each
/// entry expires.
///
/// # Examples
///
/// ```
/// use u_lastmile::local_search::{TabuAttribute, TabuList};
///
/// let mut tabu = TabuList::new(3);
/// let attr = TabuAttribute::StopInRoute { stop: 4, route: 0 };
/// tabu.forbid(attr, 10);
/// assert!(tabu.is_tabu(&attr, 12));
/// assert!(!tabu.is_tabu(&attr, 13));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TabuList {
    tenure: u64,
    expiry: HashMap<TabuAttribute, u64>,
}

impl TabuList {
    /// Creates an empty list. A tenure of 0 never forbids anything.
    pub fn new(tenure: usize) -> Self {
        Self {
            tenure: tenure as u64,
            expiry: HashMap::new(),
        }
    }

    /// Tenure in iterations.
    pub fn tenure(&self) -> usize {
        self.tenure as usize
    }

    /// Forbids `attr` for the next `tenure` iterations after `iteration`.
    pub fn forbid(&mut self, attr: TabuAttribute, iteration: u64) {
        if self.tenure == 0 {
            return;
        }
        self.expiry.insert(attr, iteration + self.tenure);
    }

    /// Whether `attr` is forbidden at `iteration`.
    pub fn is_tabu(&self, attr: &TabuAttribute, iteration: u64) -> bool {
        self.expiry.get(attr).is_some_and(|&until| until > iteration)
    }

    /// Whether any of the given attributes is forbidden.
    pub fn any_tabu(&self, attrs: &[Option<TabuAttribute>], iteration: u64) -> bool {
        attrs.iter().flatten().any(|a| self.is_tabu(a, iteration))
    }

    /// Drops expired entries.
    pub fn purge(&mut self, iteration: u64) {
        self.expiry.retain(|_, &mut until| until > iteration);
    }

    /// Number of stored entries, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.expiry.len()
    }

    /// Whether no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.expiry.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_tenure_never_forbids() {
        let mut tabu = TabuList::new(0);
        let attr = TabuAttribute::StopInRoute { stop: 1, route: 1 };
        tabu.forbid(attr, 0);
        assert!(!tabu.is_tabu(&attr, 0));
        assert!(tabu.is_empty());
    }

    #[test]
    fn test_expiry_and_purge() {
        let mut tabu = TabuList::new(2);
        let a = TabuAttribute::StopInRoute { stop: 1, route: 0 };
        let b = TabuAttribute::StopAtPosition {
            stop: 2,
            route: 1,
            pos: 3,
        };
        tabu.forbid(a, 0);
        tabu.forbid(b, 5);
        assert!(tabu.is_tabu(&a, 1));
        assert!(!tabu.is_tabu(&a, 2));
        assert!(tabu.any_tabu(&[None, Some(b)], 6));

        tabu.purge(3);
        assert_eq!(tabu.len(), 1);
        assert!(tabu.is_tabu(&b, 6));
    }

    #[test]
    fn test_reversal_is_orientation_free() {
        assert_eq!(
            TabuAttribute::reversal(0, 9, 2),
            TabuAttribute::reversal(0, 2, 9)
        );
    }

    #[test]
    fn test_reforbid_extends() {
        let mut tabu = TabuList::new(3);
        let a = TabuAttribute::StopInRoute { stop: 0, route: 0 };
        tabu.forbid(a, 0);
        tabu.forbid(a, 4);
        assert!(tabu.is_tabu(&a, 6));
    }
}
