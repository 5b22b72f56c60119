// Copyright 2026 the Event Timing Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversion of flushed measures into plain JS objects.
//!
//! Field names and units match what the entry-shaping layer consumes: all
//! times are milliseconds on the `performance.now()` timeline and `paintEnd`
//! is `0` until resolved.

use js_sys::{Array, Object, Reflect};
use wasm_bindgen::JsValue;

use event_timing_core::{InteractionEvents, InteractionGroup, InteractionMeasure};

/// Numeric fields of a measure, in milliseconds.
pub(crate) fn numeric_fields<T>(m: &InteractionMeasure<T>) -> [(&'static str, f64); 9] {
    [
        ("startTime", m.start_time.as_millis()),
        ("endTime", m.processing_end().as_millis()),
        ("duration", m.duration.as_millis()),
        ("inputDelay", m.input_delay.as_millis()),
        ("processingDuration", m.processing_duration.as_millis()),
        ("presentationDelay", m.presentation_delay.as_millis()),
        ("eventTime", m.event_time.as_millis()),
        ("interactionId", m.interaction_id.0 as f64),
        ("paintEnd", m.paint_end.map_or(0.0, |t| t.as_millis())),
    ]
}

fn set(object: &Object, key: &str, value: &JsValue) {
    if let Err(e) = Reflect::set(object, &JsValue::from_str(key), value) {
        log::warn!("failed to set {key}: {}", crate::host::describe(&e));
    }
}

/// Builds the JS object for one measure.
pub(crate) fn measure_to_js(m: &InteractionMeasure<JsValue>) -> Object {
    let object = Object::new();
    for (key, value) in numeric_fields(m) {
        set(&object, key, &JsValue::from_f64(value));
    }
    set(&object, "eventType", &JsValue::from_str(m.event_type.name()));
    set(&object, "target", &m.target);
    object
}

/// Builds the array handed to `onInteraction` callbacks.
pub(crate) fn group_to_js(group: &InteractionGroup<JsValue>) -> Array {
    group.measures.iter().map(measure_to_js).collect()
}

/// Builds `{ pointer: [...], keyboard: [...] }`.
pub(crate) fn interaction_events_to_js(events: &InteractionEvents) -> Object {
    let names = |kinds: &[event_timing_core::EventKind]| -> Array {
        kinds
            .iter()
            .map(|k| JsValue::from_str(k.name()))
            .collect()
    };
    let object = Object::new();
    set(&object, "pointer", &names(events.pointer));
    set(&object, "keyboard", &names(events.keyboard));
    object
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_timing_core::measure::{DurationFormula, DurationRounding};
    use event_timing_core::time::HostTime;
    use event_timing_core::{EventKind, InteractionId};

    fn field(fields: &[(&'static str, f64)], name: &str) -> f64 {
        fields
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| *v)
            .unwrap()
    }

    #[test]
    fn fields_are_milliseconds() {
        let mut m = InteractionMeasure::new(
            EventKind::KeyUp,
            InteractionId(4),
            HostTime(5_250),
            HostTime(5_000),
            (),
        );
        m.resolve_processing(HostTime(6_000));
        m.resolve_presentation(HostTime(0), HostTime(16_000));
        m.finalize(DurationFormula::Sum, DurationRounding::Exact);

        let fields = numeric_fields(&m);
        assert_eq!(field(&fields, "startTime"), 5.25);
        assert_eq!(field(&fields, "endTime"), 6.0);
        assert_eq!(field(&fields, "inputDelay"), 0.25);
        assert_eq!(field(&fields, "processingDuration"), 0.75);
        assert_eq!(field(&fields, "presentationDelay"), 16.0);
        assert_eq!(field(&fields, "duration"), 17.0);
        assert_eq!(field(&fields, "interactionId"), 4.0);
        assert_eq!(field(&fields, "paintEnd"), 16.0);
    }

    #[test]
    fn unresolved_paint_end_is_zero() {
        let m = InteractionMeasure::new(
            EventKind::Click,
            InteractionId(1),
            HostTime(1_000),
            HostTime(1_000),
            (),
        );
        assert_eq!(field(&numeric_fields(&m), "paintEnd"), 0.0);
    }
}
