// Copyright 2026 the Event Timing Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame presentation delay.
//!
//! Every measure captured while a given frame is current goes into that
//! frame's bucket, keyed by the frame's start timestamp. The first measure of
//! a bucket arms one animation-frame callback for it; when that callback runs
//! the observer requests a tick, and the tick's reference timestamp is taken
//! as the point the frame's visual result settled. The delay from frame start
//! to settle is then shared by every measure in the bucket, and the bucket is
//! dropped.
//!
//! Measures captured with bitwise-identical frame starts share a bucket.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::time::{Duration, HostTime};

#[derive(Clone, Debug)]
struct FrameBucket<M> {
    members: Vec<M>,
    /// Frame index current when the bucket was opened.
    armed_frame: u64,
    /// The bucket's frame callback ran; a settle tick is in flight.
    settling: bool,
}

/// A bucket whose frame settled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameSettled<M> {
    /// Start of the frame the members were captured in.
    pub frame_start: HostTime,
    /// Reference timestamp the frame settled at.
    pub settle: HostTime,
    /// `settle - frame_start`.
    pub delay: Duration,
    /// Every member of the bucket, in capture order.
    pub members: Vec<M>,
}

/// Buckets measures by frame and resolves each bucket once.
#[derive(Clone, Debug)]
pub struct PresentationResolver<M> {
    buckets: BTreeMap<HostTime, FrameBucket<M>>,
}

impl<M> Default for PresentationResolver<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> PresentationResolver<M> {
    /// Creates a resolver with no open buckets.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buckets: BTreeMap::new(),
        }
    }

    /// Adds `member` to the bucket for `frame_start`.
    ///
    /// Returns `true` if this opened the bucket (and armed its frame
    /// callback).
    pub fn add(&mut self, frame_start: HostTime, member: M, frame_index: u64) -> bool {
        match self.buckets.get_mut(&frame_start) {
            Some(bucket) => {
                bucket.members.push(member);
                false
            }
            None => {
                self.buckets.insert(
                    frame_start,
                    FrameBucket {
                        members: alloc::vec![member],
                        armed_frame: frame_index,
                        settling: false,
                    },
                );
                true
            }
        }
    }

    /// Runs the frame callbacks due at `frame_index`.
    ///
    /// Returns the frame starts of buckets whose callback ran; the caller
    /// requests one settle tick for each.
    pub fn on_frame(&mut self, frame_index: u64) -> Vec<HostTime> {
        let mut due = Vec::new();
        for (&frame_start, bucket) in &mut self.buckets {
            if !bucket.settling && bucket.armed_frame < frame_index {
                bucket.settling = true;
                due.push(frame_start);
            }
        }
        due
    }

    /// Resolves the bucket for `frame_start` with its settle timestamp and
    /// removes it.
    pub fn settle(&mut self, frame_start: HostTime, settle: HostTime) -> Option<FrameSettled<M>> {
        let bucket = self.buckets.remove(&frame_start)?;
        Some(FrameSettled {
            frame_start,
            settle,
            delay: settle - frame_start,
            members: bucket.members,
        })
    }

    /// Returns the number of open buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Returns `true` when no bucket is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Drops every open bucket.
    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_member_opens_bucket() {
        let mut p = PresentationResolver::new();
        assert!(p.add(HostTime(0), 'a', 1));
        assert!(!p.add(HostTime(0), 'b', 1));
        assert!(p.add(HostTime(16_000), 'c', 2));
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn frame_callback_runs_once_on_a_later_frame() {
        let mut p = PresentationResolver::new();
        p.add(HostTime(0), 1_u8, 1);
        assert!(p.on_frame(1).is_empty(), "same frame");
        assert_eq!(p.on_frame(2), [HostTime(0)]);
        assert!(p.on_frame(3).is_empty(), "already settling");
    }

    #[test]
    fn settle_broadcasts_delay_to_members() {
        let mut p = PresentationResolver::new();
        p.add(HostTime(0), 1_u8, 1);
        p.add(HostTime(0), 2_u8, 1);
        let settled = p.settle(HostTime(0), HostTime(16_000)).unwrap();
        assert_eq!(settled.delay, Duration(16_000));
        assert_eq!(settled.members, [1, 2]);
        assert!(p.is_empty());
        assert_eq!(p.settle(HostTime(0), HostTime(20_000)), None);
    }
}
