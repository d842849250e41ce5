// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Membership snapshot and delta computation.

use std::collections::BTreeSet;

/// Numeric member identifier issued by the group service.
pub type MemberId = u64;

/// Ordered set of member identifiers. Ordering makes delta iteration ascending.
pub type MemberSet = BTreeSet<MemberId>;

/// Members known as of the last completed poll.
///
/// Replaced wholesale by [`Snapshot::replace`]; never edited in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    known: MemberSet,
}

impl Snapshot {
    pub fn new(known: MemberSet) -> Self {
        Self { known }
    }

    pub fn known(&self) -> &MemberSet {
        &self.known
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Members present in `current` but not in the snapshot, ascending.
    ///
    /// Departures are ignored.
    pub fn delta(&self, current: &MemberSet) -> Vec<MemberId> {
        current.difference(&self.known).copied().collect()
    }

    /// Adopt `current` as the new baseline, returning the previous one.
    pub fn replace(&mut self, current: MemberSet) -> MemberSet {
        std::mem::replace(&mut self.known, current)
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
