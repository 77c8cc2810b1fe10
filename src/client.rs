//! The client contract shared by every messaging backend.
//!
//! UI collaborators talk to a backend only through [`MessagingClient`]: they
//! register one event handler and one error handler, send outgoing
//! messages, and ask for connectivity and attachment locations. The
//! simulated backend in [`crate::simulation`] and a network-backed client are
//! interchangeable behind this trait.

use std::rc::Rc;

use crate::protocol::{ClientEvent, OutgoingMessage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The outgoing message has an empty or blank handle.
    InvalidHandle(String),
    /// The outgoing message carries no text. Attachment sending is unsupported.
    MissingText,
    /// A message was sent before any handler was registered.
    NotListening,
    /// Handlers are already registered.
    AlreadyListening,
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::InvalidHandle(handle) => write!(f, "invalid handle: {handle:?}"),
            ClientError::MissingText => write!(f, "outgoing message has no text"),
            ClientError::NotListening => write!(f, "client has no registered listener"),
            ClientError::AlreadyListening => write!(f, "client is already listening"),
        }
    }
}

impl std::error::Error for ClientError {}

/// Receives events from a backend.
pub trait EventHandler {
    fn on_event(&self, event: ClientEvent);
}

impl<F> EventHandler for F
where
    F: Fn(ClientEvent),
{
    fn on_event(&self, event: ClientEvent) {
        self(event);
    }
}

/// Receives asynchronous backend failures.
pub trait ErrorHandler {
    fn on_error(&self, error: ClientError);
}

impl<F> ErrorHandler for F
where
    F: Fn(ClientError),
{
    fn on_error(&self, error: ClientError) {
        self(error);
    }
}

pub trait MessagingClient {
    /// Register the event and error handlers. Only one pair may be registered.
    fn listen(
        &self,
        on_event: Rc<dyn EventHandler>,
        on_error: Rc<dyn ErrorHandler>,
    ) -> Result<(), ClientError>;

    fn send_message(&self, message: OutgoingMessage) -> Result<(), ClientError>;

    fn is_online(&self) -> bool;

    /// Location from which the attachment with `attachment_id` can be loaded.
    fn attachment_url(&self, attachment_id: u64) -> String;
}
