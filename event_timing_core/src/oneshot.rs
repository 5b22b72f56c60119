// Copyright 2026 the Event Timing Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-assignment completion slot.
//!
//! A [`Oneshot`] accepts exactly one value. Later [`fire`](Oneshot::fire)
//! calls are rejected silently, which is how the losers of a race are
//! discarded. The fired flag is kept separately from the value so that the
//! winner can [`take`](Oneshot::take) the value out without reopening the
//! slot.

/// A slot that can be completed once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Oneshot<T> {
    value: Option<T>,
    fired: bool,
}

impl<T> Default for Oneshot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Oneshot<T> {
    /// Creates an empty, unfired slot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            value: None,
            fired: false,
        }
    }

    /// Completes the slot with `value`.
    ///
    /// Returns `true` if this call won. If the slot already fired, `value` is
    /// dropped and `false` is returned.
    pub fn fire(&mut self, value: T) -> bool {
        if self.fired {
            return false;
        }
        self.fired = true;
        self.value = Some(value);
        true
    }

    /// Returns `true` once the slot has been completed.
    #[must_use]
    pub const fn is_fired(&self) -> bool {
        self.fired
    }

    /// Returns the stored value, if it has not been taken.
    #[must_use]
    pub const fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Takes the stored value. The slot stays fired.
    pub fn take(&mut self) -> Option<T> {
        self.value.take()
    }
}
