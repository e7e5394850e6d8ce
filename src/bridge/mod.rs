//! Simulator message framing
//!
//! The simulator speaks socket.io event frames: a `42` prefix followed by a
//! JSON array `[event, payload]`. Telemetry arrives as
//! `42["telemetry",{...}]`, the planner answers with
//! `42["control",{"next_x":[...],"next_y":[...]}]`, or with
//! `42["manual",{}]` when a frame carries no payload.

pub mod telemetry;

pub use telemetry::TelemetryMessage;

use log::trace;
use serde_json::{json, Value};

use crate::common::{Path2D, PlannerResult, Telemetry};

/// Frame prefix of a socket.io event message
pub const EVENT_PREFIX: &str = "42";

/// Decoded inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A telemetry event with its payload
    Telemetry(Telemetry),
    /// An event without payload, answered with `manual`
    NoPayload,
    /// Not an event frame, or an event the planner does not handle
    Ignored,
}

/// Decode one frame
pub fn decode(frame: &str) -> PlannerResult<Inbound> {
    let body = match frame.trim().strip_prefix(EVENT_PREFIX) {
        Some(body) => body,
        None => return Ok(Inbound::Ignored),
    };
    if !body.starts_with('[') {
        return Ok(Inbound::Ignored);
    }

    let event: Value = serde_json::from_str(body)?;
    let items = match event.as_array() {
        Some(items) => items,
        None => return Ok(Inbound::Ignored),
    };

    match items.get(1) {
        None | Some(Value::Null) => return Ok(Inbound::NoPayload),
        Some(_) => {}
    }

    match items.get(0).and_then(Value::as_str) {
        Some("telemetry") => {
            let message: TelemetryMessage = serde_json::from_value(items[1].clone())?;
            trace!("Telemetry: {:?}", message);
            Ok(Inbound::Telemetry(message.into_telemetry()?))
        }
        _ => Ok(Inbound::Ignored),
    }
}

/// Encode a trajectory as a `control` event
pub fn encode_control(trajectory: &Path2D) -> String {
    let payload = json!({
        "next_x": trajectory.x_coords(),
        "next_y": trajectory.y_coords(),
    });
    format!("{}{}", EVENT_PREFIX, json!(["control", payload]))
}

/// The neutral answer to a frame without telemetry
pub fn encode_manual() -> String {
    format!("{}{}", EVENT_PREFIX, json!(["manual", {}]))
}
