//! Payload shapes carried by push events and request/response calls.
//!
//! Field names follow the service's JSON exactly. Missing and `null` fields
//! both fall back to their default so that a sparse payload still decodes,
//! and millisecond values are accepted as integers or floats.

use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch, as sent by the service.
pub type Timestamp = u64;

/// Envelope of every successful request/response call: `{ "data": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// The response body
    pub data: T,
}

/// Response body of `get_room`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomPayload {
    /// Room identifier
    #[serde(rename = "_id")]
    pub id: String,
    /// Human-readable room name
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub name: String,
    /// Whether the display is blacked out
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub blackout: bool,
    /// Focus message shown to presenters, if any
    #[serde(default)]
    pub focus_message: Option<String>,
}

/// Body of the `room` push event.
///
/// Only the display fields; the room's identity is never re-sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomChangePayload {
    /// Whether the display is blacked out
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub blackout: bool,
    /// Focus message shown to presenters, if any
    #[serde(default)]
    pub focus_message: Option<String>,
}

/// Body of `get_status` and of the `playback_status` push event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPayload {
    /// Currently loaded timer, if any
    #[serde(default)]
    pub timer_id: Option<String>,
    /// Whether the timer is running
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub running: bool,
    /// When the timer was (last) started
    #[serde(default, deserialize_with = "lenient::millis")]
    pub start: Option<Timestamp>,
    /// When the timer reaches zero
    #[serde(default, deserialize_with = "lenient::millis")]
    pub finish: Option<Timestamp>,
    /// When the timer was paused
    #[serde(default, deserialize_with = "lenient::millis")]
    pub pause: Option<Timestamp>,
}

/// Parameters of `get_timer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerRequest {
    /// The timer to fetch
    pub timer_id: String,
}

/// Response body of `get_timer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerPayload {
    /// Timer title
    #[serde(default)]
    pub name: Option<String>,
    /// Speaker the timer belongs to
    #[serde(default)]
    pub speaker: Option<String>,
    /// Free-form notes
    #[serde(default)]
    pub notes: Option<String>,
    /// Duration in milliseconds
    #[serde(default, deserialize_with = "lenient::millis_or_zero")]
    pub duration: u64,
    /// Remaining time (ms) at which the display turns yellow
    #[serde(default, deserialize_with = "lenient::millis")]
    pub wrap_up_yellow: Option<u64>,
    /// Remaining time (ms) at which the display turns red
    #[serde(default, deserialize_with = "lenient::millis")]
    pub wrap_up_red: Option<u64>,
}

/// Body of the `message` push event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    /// Whether the message is currently displayed
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub showing: bool,
    /// Message text
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub text: String,
    /// Display color (service-defined name or hex)
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub color: String,
    /// Bold text
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub bold: bool,
    /// Uppercase text
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub uppercase: bool,
}

/// Body of the `flash` push event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashPayload {
    /// How many times to flash
    pub count: u32,
}

mod lenient {
    use serde::{Deserialize, Deserializer};

    /// `null` decodes as the type's default.
    pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }

    /// Milliseconds sent as an integer or a float. `null`, negative and
    /// non-finite values decode as `None`.
    pub fn millis<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<f64>::deserialize(deserializer)?
            .filter(|ms| ms.is_finite() && *ms >= 0.0)
            .map(|ms| ms.round() as u64))
    }

    pub fn millis_or_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(millis(deserializer)?.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn room_payload_reads_underscore_id() {
        let room: RoomPayload = serde_json::from_value(json!({
            "_id": "r1",
            "name": "Main stage",
            "blackout": false,
            "focus_message": null,
        }))
        .unwrap();

        assert_eq!(room.id, "r1");
        assert_eq!(room.name, "Main stage");
        assert_eq!(room.focus_message, None);
    }

    #[test]
    fn status_payload_tolerates_nulls() {
        let status: StatusPayload = serde_json::from_value(json!({
            "timer_id": null,
            "running": false,
            "start": null,
            "finish": null,
            "pause": null,
        }))
        .unwrap();

        assert!(status.timer_id.is_none());
        assert!(!status.running);
    }

    #[test]
    fn status_payload_reads_timestamps() {
        let status: StatusPayload = serde_json::from_value(json!({
            "timer_id": "T1",
            "running": true,
            "start": 1_700_000_000_000u64,
            "finish": 1_700_000_300_000u64,
            "pause": null,
        }))
        .unwrap();

        assert_eq!(status.timer_id.as_deref(), Some("T1"));
        assert_eq!(status.finish, Some(1_700_000_300_000));
    }

    #[test]
    fn timer_payload_defaults_missing_fields() {
        let timer: TimerPayload = serde_json::from_value(json!({ "name": "Keynote" })).unwrap();
        assert_eq!(timer.name.as_deref(), Some("Keynote"));
        assert_eq!(timer.duration, 0);
        assert!(timer.wrap_up_red.is_none());
    }

    #[test]
    fn explicit_nulls_fall_back_to_defaults() {
        let status: StatusPayload = serde_json::from_value(json!({
            "timer_id": "T1",
            "running": null,
        }))
        .unwrap();
        assert_eq!(status.timer_id.as_deref(), Some("T1"));
        assert!(!status.running);

        let message: MessagePayload = serde_json::from_value(json!({
            "showing": true,
            "text": null,
            "color": null,
            "bold": null,
            "uppercase": false,
        }))
        .unwrap();
        assert!(message.showing);
        assert_eq!(message.text, "");
        assert!(!message.bold);

        let room: RoomPayload =
            serde_json::from_value(json!({ "_id": "r1", "name": null, "blackout": null }))
                .unwrap();
        assert_eq!(room.name, "");
        assert!(!room.blackout);

        let change: RoomChangePayload =
            serde_json::from_value(json!({ "blackout": null, "focus_message": "x" })).unwrap();
        assert!(!change.blackout);
    }

    #[test]
    fn timer_payload_tolerates_null_duration() {
        let timer: TimerPayload = serde_json::from_value(json!({
            "name": "Keynote",
            "duration": null,
            "wrap_up_yellow": 120000.0,
            "wrap_up_red": null,
        }))
        .unwrap();
        assert_eq!(timer.name.as_deref(), Some("Keynote"));
        assert_eq!(timer.duration, 0);
        assert_eq!(timer.wrap_up_yellow, Some(120_000));
        assert_eq!(timer.wrap_up_red, None);
    }

    #[test]
    fn fractional_timestamps_are_rounded() {
        let status: StatusPayload = serde_json::from_value(json!({
            "timer_id": "T1",
            "running": true,
            "start": 1_700_000_000_000.4,
            "finish": 1_700_000_300_000.6,
            "pause": -1,
        }))
        .unwrap();
        assert_eq!(status.start, Some(1_700_000_000_000));
        assert_eq!(status.finish, Some(1_700_000_300_001));
        assert_eq!(status.pause, None);
    }

    #[test]
    fn flash_requires_count() {
        assert!(serde_json::from_value::<FlashPayload>(json!({})).is_err());
        let flash: FlashPayload = serde_json::from_value(json!({ "count": 3 })).unwrap();
        assert_eq!(flash.count, 3);
    }

    #[test]
    fn api_response_unwraps_data() {
        let response: ApiResponse<RoomChangePayload> = serde_json::from_value(json!({
            "data": { "blackout": true, "focus_message": "x" }
        }))
        .unwrap();
        assert!(response.data.blackout);
        assert_eq!(response.data.focus_message.as_deref(), Some("x"));
    }

    #[test]
    fn timer_request_shape() {
        let params = serde_json::to_value(TimerRequest {
            timer_id: "T1".into(),
        })
        .unwrap();
        assert_eq!(params, json!({ "timer_id": "T1" }));
    }
}
