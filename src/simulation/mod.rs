//! Simulated messaging backend.
//!
//! Leaf modules generate content ([`random`]), keep the recipient registry
//! ([`directory`]), shape message records ([`synthesis`]) and order deferred
//! work ([`timer`]). [`MockClient`] ties them together behind the
//! [`crate::client::MessagingClient`] contract.

pub mod client;
pub mod config;
pub mod directory;
pub mod random;
pub mod synthesis;
pub mod timer;

pub use client::MockClient;
pub use config::{ConfigError, MockClientConfig};
pub use directory::{generate_recipients, Recipient, RecipientDirectory};
pub use random::{
    chance, generate_alias, generate_handle, generate_handles, generate_message_content,
    generate_sentence, is_generated_handle, placeholder_attachment,
};
pub use synthesis::{backfill, now_millis, outgoing, synthesize, MessageIds, DAY_MS};
pub use timer::{RepeatingTask, TimerId, TimerQueue};
