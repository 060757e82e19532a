//! This module contains the definition of a phase-versioned value container.
//! Every write is keyed by the analysis phase at which it happened, and reads
//! return the value "as of" a phase using a floor lookup.

use derivative::Derivative;

use crate::tree::Phase;

/// A history of values for a single attribute, keyed by analysis phase.
///
/// The entries are kept sorted in ascending order of phase, and at most one
/// entry exists for any given phase. The value of the attribute as of phase
/// `k` is the entry with the greatest phase less than or equal to `k`.
///
/// # Complexity
///
/// Lookups are `O(log n)` in the number of phases at which the attribute was
/// written. Writes at or beyond the newest phase are amortised `O(1)`, which is
/// the common case during replay as phases are ingested in order.
#[derive(Derivative)]
#[derivative(
    Clone(bound = "T: std::clone::Clone"),
    Debug(bound = "T: std::fmt::Debug"),
    Default(bound = ""),
    PartialEq(bound = "T: std::cmp::PartialEq")
)]
pub struct Timeline<T> {
    entries: Vec<(Phase, T)>,
}

impl<T> Timeline<T> {
    /// Creates a new, empty, timeline.
    #[must_use]
    pub fn new() -> Self {
        let entries = Vec::new();
        Self { entries }
    }

    /// Creates a timeline holding a single `value` written at `phase`.
    #[must_use]
    pub fn starting_at(phase: Phase, value: T) -> Self {
        let entries = vec![(phase, value)];
        Self { entries }
    }

    /// Gets the value as of `phase`, or [`None`] if nothing had been written
    /// at or before `phase`.
    #[must_use]
    pub fn floor(&self, phase: Phase) -> Option<&T> {
        match self.search(phase) {
            Ok(index) => Some(&self.entries[index].1),
            Err(0) => None,
            Err(index) => Some(&self.entries[index - 1].1),
        }
    }

    /// Gets the value written exactly at `phase`, if any.
    #[must_use]
    pub fn at(&self, phase: Phase) -> Option<&T> {
        self.search(phase).ok().map(|index| &self.entries[index].1)
    }

    /// Gets the value written exactly at `phase` for modification, if any.
    pub fn at_mut(&mut self, phase: Phase) -> Option<&mut T> {
        match self.search(phase) {
            Ok(index) => Some(&mut self.entries[index].1),
            Err(_) => None,
        }
    }

    /// Writes `value` at `phase`, replacing anything previously written at
    /// exactly that phase.
    pub fn set(&mut self, phase: Phase, value: T) {
        match self.search(phase) {
            Ok(index) => self.entries[index].1 = value,
            Err(index) => self.entries.insert(index, (phase, value)),
        }
    }

    /// Gets the most recently written value, regardless of phase.
    #[must_use]
    pub fn latest(&self) -> Option<&T> {
        self.entries.last().map(|(_, value)| value)
    }

    /// Gets the phases at which this timeline has entries, in ascending order.
    pub fn phases(&self) -> impl Iterator<Item = Phase> + '_ {
        self.entries.iter().map(|(phase, _)| *phase)
    }

    /// Gets the number of entries in the timeline.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks whether the timeline has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn search(&self, phase: Phase) -> Result<usize, usize> {
        // Fast path for the append-heavy access pattern of replay.
        match self.entries.last() {
            Some((last, _)) if *last < phase => Err(self.entries.len()),
            _ => self.entries.binary_search_by_key(&phase, |(p, _)| *p),
        }
    }
}

impl<T> Timeline<T>
where
    T: Clone,
{
    /// Gets a copy of the value as of `phase`, falling back to `default` when
    /// nothing had been written by then.
    #[must_use]
    pub fn floor_or(&self, phase: Phase, default: T) -> T {
        self.floor(phase).cloned().unwrap_or(default)
    }
}
