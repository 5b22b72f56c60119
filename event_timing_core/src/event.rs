// Copyright 2026 the Event Timing Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The catalogue of tracked DOM events.
//!
//! [`EventKind`] names every event type the capturer listens for, and
//! classifies them: which ones open a new interaction, which ones can close
//! one, and which ones count towards the pointer and keyboard sequences in
//! [`INTERACTION_EVENTS`].

use core::fmt;

/// A tracked DOM event type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    /// `pointerdown`
    PointerDown,
    /// `mousedown`
    MouseDown,
    /// `pointerup`
    PointerUp,
    /// `mouseup`
    MouseUp,
    /// `click`
    Click,
    /// `auxclick`
    AuxClick,
    /// `contextmenu`
    ContextMenu,
    /// `pointercancel`
    PointerCancel,
    /// `keydown`
    KeyDown,
    /// `keypress`
    KeyPress,
    /// `keyup`
    KeyUp,
}

impl EventKind {
    /// Every tracked event, in listener registration order.
    pub const TRACKED: [Self; 11] = [
        Self::PointerDown,
        Self::MouseDown,
        Self::PointerUp,
        Self::MouseUp,
        Self::Click,
        Self::AuxClick,
        Self::ContextMenu,
        Self::PointerCancel,
        Self::KeyDown,
        Self::KeyPress,
        Self::KeyUp,
    ];

    /// Returns the DOM event name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PointerDown => "pointerdown",
            Self::MouseDown => "mousedown",
            Self::PointerUp => "pointerup",
            Self::MouseUp => "mouseup",
            Self::Click => "click",
            Self::AuxClick => "auxclick",
            Self::ContextMenu => "contextmenu",
            Self::PointerCancel => "pointercancel",
            Self::KeyDown => "keydown",
            Self::KeyPress => "keypress",
            Self::KeyUp => "keyup",
        }
    }

    /// Parses a DOM event name. Untracked names return `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::TRACKED.into_iter().find(|kind| kind.name() == name)
    }

    /// Returns `true` for events that begin a new logical interaction.
    #[must_use]
    pub const fn starts_interaction(self) -> bool {
        matches!(self, Self::PointerDown | Self::KeyDown)
    }

    /// Returns `true` for events that can end an interaction.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Click | Self::AuxClick | Self::KeyUp | Self::PointerCancel | Self::ContextMenu
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Event types that make up a complete pointer or keyboard interaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InteractionEvents {
    /// A full pointer press: down, up, click.
    pub pointer: &'static [EventKind],
    /// A full key press: down, up.
    pub keyboard: &'static [EventKind],
}

/// The pointer and keyboard sequences.
pub const INTERACTION_EVENTS: InteractionEvents = InteractionEvents {
    pointer: &[EventKind::PointerDown, EventKind::PointerUp, EventKind::Click],
    keyboard: &[EventKind::KeyDown, EventKind::KeyUp],
};

impl InteractionEvents {
    /// Returns `true` if `kind` appears in either sequence.
    #[must_use]
    pub fn contains(&self, kind: EventKind) -> bool {
        self.pointer.contains(&kind) || self.keyboard.contains(&kind)
    }

    /// Returns `true` if `kinds` covers every event of the pointer sequence
    /// or every event of the keyboard sequence.
    #[must_use]
    pub fn is_full_sequence(&self, kinds: impl Iterator<Item = EventKind> + Clone) -> bool {
        let covers = |seq: &[EventKind]| seq.iter().all(|k| kinds.clone().any(|c| c == *k));
        covers(self.pointer) || covers(self.keyboard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in EventKind::TRACKED {
            assert_eq!(EventKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(EventKind::from_name("mousemove"), None);
    }

    #[test]
    fn only_down_events_start_interactions() {
        let starters: alloc::vec::Vec<_> = EventKind::TRACKED
            .into_iter()
            .filter(|k| k.starts_interaction())
            .collect();
        assert_eq!(starters, [EventKind::PointerDown, EventKind::KeyDown]);
    }

    #[test]
    fn terminal_set() {
        assert!(EventKind::Click.is_terminal());
        assert!(EventKind::ContextMenu.is_terminal());
        assert!(EventKind::PointerCancel.is_terminal());
        assert!(!EventKind::PointerUp.is_terminal());
        assert!(!EventKind::KeyPress.is_terminal());
    }

    #[test]
    fn full_sequence_detection() {
        let pointer = [EventKind::PointerDown, EventKind::MouseDown, EventKind::PointerUp];
        assert!(!INTERACTION_EVENTS.is_full_sequence(pointer.iter().copied()));

        let pointer = [EventKind::PointerDown, EventKind::PointerUp, EventKind::Click];
        assert!(INTERACTION_EVENTS.is_full_sequence(pointer.iter().copied()));

        let keys = [EventKind::KeyDown, EventKind::KeyPress, EventKind::KeyUp];
        assert!(INTERACTION_EVENTS.is_full_sequence(keys.iter().copied()));
        assert!(INTERACTION_EVENTS.contains(EventKind::Click));
        assert!(!INTERACTION_EVENTS.contains(EventKind::ContextMenu));
    }
}
