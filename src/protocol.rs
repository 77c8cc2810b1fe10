//! Message and event types exchanged across the client contract.
//!
//! The serialized shape is the one UI collaborators consume: events are
//! `{"type": "MESSAGE_NEW", "messages": [...]}`, services are `"iMessage"` /
//! `"SMS"`, and message content is either `{"text": ...}` or
//! `{"attachments": [...]}`.

use serde::{Deserialize, Deserializer, Serialize};

/// Delivery service a message travelled over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Service {
    #[default]
    #[serde(rename = "iMessage")]
    IMessage,
    #[serde(rename = "SMS")]
    Sms,
}

/// Direction of a message relative to the local user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Sent,
    Received,
}

/// Descriptor of an attachment. No payload is carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub id: u64,
    pub mimetype: String,
    pub size: u64,
}

/// Text or attachments, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text { text: String },
    Attachments { attachments: Vec<AttachmentRef> },
}

#[derive(Deserialize)]
struct RawContent {
    text: Option<String>,
    attachments: Option<Vec<AttachmentRef>>,
}

impl<'de> Deserialize<'de> for MessageContent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawContent::deserialize(deserializer)?;
        match (raw.text, raw.attachments) {
            (Some(text), None) => Ok(MessageContent::Text { text }),
            (None, Some(attachments)) => Ok(MessageContent::Attachments { attachments }),
            (Some(_), Some(_)) => Err(serde::de::Error::custom(
                "message content has both text and attachments",
            )),
            (None, None) => Err(serde::de::Error::custom(
                "message content has neither text nor attachments",
            )),
        }
    }
}

impl MessageContent {
    pub fn text(&self) -> Option<&str> {
        match self {
            MessageContent::Text { text } => Some(text),
            MessageContent::Attachments { .. } => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, MessageContent::Text { .. })
    }
}

/// One unit of conversation content.
///
/// `alias` and `handle` are a snapshot of the recipient when the message was
/// created. `id` and `timestamp` are Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub timestamp: i64,
    pub service: Service,
    pub status: MessageStatus,
    pub alias: String,
    pub handle: String,
    pub content: MessageContent,
}

/// Content of a locally composed message. Only `text` is sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingContent {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub handle: String,
    #[serde(default)]
    pub service: Option<Service>,
    pub content: OutgoingContent,
}

impl OutgoingMessage {
    pub fn text(handle: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            service: None,
            content: OutgoingContent {
                text: Some(text.into()),
                attachments: Vec::new(),
            },
        }
    }

    pub fn with_service(mut self, service: Service) -> Self {
        self.service = Some(service);
        self
    }
}

/// Events delivered to the registered event handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientEvent {
    /// Historical messages for one recipient, emitted while listening starts.
    MessagePreload { messages: Vec<Message> },
    /// A single message that just arrived or was just sent.
    MessageNew { messages: Vec<Message> },
}

impl ClientEvent {
    pub fn messages(&self) -> &[Message] {
        match self {
            ClientEvent::MessagePreload { messages } | ClientEvent::MessageNew { messages } => {
                messages
            }
        }
    }

    pub fn is_preload(&self) -> bool {
        matches!(self, ClientEvent::MessagePreload { .. })
    }
}
