use crate::error::{DecodeError, DecodeErrorKind};
use broker::Topic;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The `type` tag of an [`Envelope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Debug,
    ReservationNotification,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Debug => "debug",
            EventKind::ReservationNotification => "reservation_notification",
        }
    }

    /// Broker topic that carries events of this kind.
    pub fn topic(&self) -> Topic {
        match self {
            EventKind::Debug => Topic::DebugChannel,
            EventKind::ReservationNotification => Topic::ReservationNotifications,
        }
    }

    pub fn from_topic(topic: Topic) -> EventKind {
        match topic {
            Topic::DebugChannel => EventKind::Debug,
            Topic::ReservationNotifications => EventKind::ReservationNotification,
        }
    }
}

/// Frame broadcast to every connected client: `{"type": ..., "content": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub content: String,
}

impl Envelope {
    pub fn new(kind: EventKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A decoded client frame, ready to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// Only the message text is forwarded.
    Debug { message: String },
    /// The whole client envelope is forwarded as an opaque JSON string.
    ReservationNotification { payload: String },
}

impl InboundFrame {
    /// Decodes one client frame.
    ///
    /// Debug frames carry their text in `content`, or in `message` for older
    /// clients. Reservation notification frames are re-serialized whole, so
    /// any extra fields the client sent survive the round trip.
    pub fn decode(text: &str) -> Result<InboundFrame, DecodeError> {
        let value: Value = serde_json::from_str(text)?;
        let Some(object) = value.as_object() else {
            return Err(DecodeError::new(DecodeErrorKind::Malformed));
        };

        let kind = match object.get("type") {
            Some(Value::String(kind)) => kind.as_str(),
            _ => return Err(DecodeError::new(DecodeErrorKind::MissingType)),
        };

        match kind {
            "debug" => ["content", "message"]
                .iter()
                .find_map(|field| object.get(*field).and_then(Value::as_str))
                .map(|message| InboundFrame::Debug {
                    message: message.to_string(),
                })
                .ok_or_else(|| DecodeError::new(DecodeErrorKind::MissingContent)),
            "reservation_notification" => Ok(InboundFrame::ReservationNotification {
                payload: value.to_string(),
            }),
            other => Err(DecodeError::new(DecodeErrorKind::UnknownType(
                other.to_string(),
            ))),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            InboundFrame::Debug { .. } => EventKind::Debug,
            InboundFrame::ReservationNotification { .. } => EventKind::ReservationNotification,
        }
    }

    pub fn topic(&self) -> Topic {
        self.kind().topic()
    }

    /// What gets published to [`InboundFrame::topic`].
    pub fn payload(&self) -> &str {
        match self {
            InboundFrame::Debug { message } => message,
            InboundFrame::ReservationNotification { payload } => payload,
        }
    }
}
