//! Building message records for a recipient.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

use crate::protocol::{Message, MessageContent, MessageStatus, Service};

use super::directory::Recipient;
use super::random::{chance, generate_message_content};

pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;
pub const IMESSAGE_PROBABILITY: f64 = 0.95;
pub const TEXT_PROBABILITY: f64 = 0.95;
pub const SENT_PROBABILITY: f64 = 0.5;

/// Current Unix time in milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Time-derived message ids that never repeat.
///
/// An id is the creation millisecond unless that would not exceed the
/// previous id, in which case it is the previous id plus one.
#[derive(Debug, Clone, Default)]
pub struct MessageIds {
    last: Option<i64>,
}

impl MessageIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, now_ms: i64) -> i64 {
        let id = match self.last {
            Some(last) if now_ms <= last => last + 1,
            _ => now_ms,
        };
        self.last = Some(id);
        id
    }
}

fn build_message(
    recipient: &Recipient,
    id: i64,
    timestamp: i64,
    service: Service,
    status: MessageStatus,
    content: MessageContent,
) -> Message {
    Message {
        id,
        timestamp,
        service,
        status,
        alias: recipient.alias().to_string(),
        handle: recipient.primary_handle().to_string(),
        content,
    }
}

fn draw_message(rng: &mut impl Rng, recipient: &Recipient, id: i64, timestamp: i64) -> Message {
    let is_text = chance(rng, TEXT_PROBABILITY);
    let service = if chance(rng, IMESSAGE_PROBABILITY) {
        Service::IMessage
    } else {
        Service::Sms
    };
    let content = generate_message_content(rng, is_text);
    build_message(
        recipient,
        id,
        timestamp,
        service,
        MessageStatus::Received,
        content,
    )
}

/// `count` inbound messages for `recipient`, created at `now_ms`.
///
/// `timestamp` is always `now_ms`; `id` comes from `ids` and may run a few
/// milliseconds ahead of it when several messages share a millisecond.
pub fn synthesize(
    rng: &mut impl Rng,
    ids: &mut MessageIds,
    recipient: &Recipient,
    count: usize,
    now_ms: i64,
) -> Vec<Message> {
    (0..count)
        .map(|_| draw_message(rng, recipient, ids.next(now_ms), now_ms))
        .collect()
}

/// Historical conversation for `recipient`.
///
/// The whole batch is pushed back from `now_ms` by up to `max_days` whole
/// days, and each message by a further jitter of less than one day, so no
/// message is later than `now_ms`. `id` and `timestamp` are equal. Backfill
/// does not advance the live id sequence. Directions are split evenly
/// between sent and received.
pub fn backfill(
    rng: &mut impl Rng,
    recipient: &Recipient,
    count: usize,
    max_days: u32,
    now_ms: i64,
) -> Vec<Message> {
    let days_since_last = i64::from(rng.gen_range(0..=max_days));
    (0..count)
        .map(|_| {
            let timestamp = now_ms - days_since_last * DAY_MS - rng.gen_range(0..DAY_MS);
            let mut message = draw_message(rng, recipient, timestamp, timestamp);
            if chance(rng, SENT_PROBABILITY) {
                message.status = MessageStatus::Sent;
            }
            message
        })
        .collect()
}

/// The echo of a locally sent text message.
pub fn outgoing(
    ids: &mut MessageIds,
    recipient: &Recipient,
    service: Service,
    text: String,
    now_ms: i64,
) -> Message {
    build_message(
        recipient,
        ids.next(now_ms),
        now_ms,
        service,
        MessageStatus::Sent,
        MessageContent::Text { text },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    const NOW: i64 = 1_760_600_000_000;

    fn recipient() -> Recipient {
        Recipient::new("Juno Pearl", "+15550123")
    }

    #[test]
    fn test_message_ids_are_monotonic() {
        let mut ids = MessageIds::new();
        assert_eq!(ids.next(100), 100);
        assert_eq!(ids.next(100), 101);
        assert_eq!(ids.next(99), 102);
        assert_eq!(ids.next(500), 500);
    }

    #[test]
    fn test_synthesize_defaults() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut ids = MessageIds::new();
        let recipient = recipient();
        let messages = synthesize(&mut rng, &mut ids, &recipient, 50, NOW);
        assert_eq!(messages.len(), 50);
        let unique: HashSet<i64> = messages.iter().map(|message| message.id).collect();
        assert_eq!(unique.len(), 50);
        for message in &messages {
            assert_eq!(message.timestamp, NOW);
            assert!(message.id >= NOW);
            assert_eq!(message.status, MessageStatus::Received);
            assert_eq!(message.alias, "Juno Pearl");
            assert!(recipient.has_handle(&message.handle));
        }
    }

    #[test]
    fn test_synthesize_mostly_imessage_text() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut ids = MessageIds::new();
        let messages = synthesize(&mut rng, &mut ids, &recipient(), 2000, NOW);
        let imessage = messages
            .iter()
            .filter(|message| message.service == Service::IMessage)
            .count();
        let text = messages
            .iter()
            .filter(|message| message.content.is_text())
            .count();
        assert!(imessage > 1800 && imessage < 2000, "imessage count {imessage}");
        assert!(text > 1800 && text < 2000, "text count {text}");
    }

    #[test]
    fn test_backfill_is_in_the_past() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let messages = backfill(&mut rng, &recipient(), 50, 10, NOW);
        assert_eq!(messages.len(), 50);
        let floor = NOW - 11 * DAY_MS;
        for message in &messages {
            assert_eq!(message.id, message.timestamp);
            assert!(message.timestamp <= NOW);
            assert!(message.timestamp > floor);
        }
        assert!(messages
            .iter()
            .any(|message| message.status == MessageStatus::Sent));
        assert!(messages
            .iter()
            .any(|message| message.status == MessageStatus::Received));
    }

    #[test]
    fn test_backfill_with_zero_days_stays_within_a_day() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let messages = backfill(&mut rng, &recipient(), 20, 0, NOW);
        for message in &messages {
            assert!(message.timestamp > NOW - DAY_MS);
        }
    }

    #[test]
    fn test_large_backfill_never_reaches_past_now() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let messages = backfill(&mut rng, &recipient(), 5_000, 0, NOW);
        assert!(messages.iter().all(|message| message.timestamp <= NOW));
    }

    #[test]
    fn test_backfill_leaves_live_ids_untouched() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut ids = MessageIds::new();
        backfill(&mut rng, &recipient(), 500, 0, NOW);
        let live = synthesize(&mut rng, &mut ids, &recipient(), 1, NOW);
        assert_eq!(live[0].id, NOW);
        assert_eq!(live[0].timestamp, NOW);
    }

    #[test]
    fn test_burst_keeps_timestamps_at_creation_time() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut ids = MessageIds::new();
        let burst = synthesize(&mut rng, &mut ids, &recipient(), 100, NOW);
        let echo = outgoing(&mut ids, &recipient(), Service::IMessage, "hi".to_string(), NOW);
        assert!(burst.iter().all(|message| message.timestamp == NOW));
        assert_eq!(echo.timestamp, NOW);
        assert_eq!(echo.id, NOW + 100);
    }

    #[test]
    fn test_outgoing_echo() {
        let mut ids = MessageIds::new();
        let message = outgoing(&mut ids, &recipient(), Service::Sms, "hi".to_string(), NOW);
        assert_eq!(message.status, MessageStatus::Sent);
        assert_eq!(message.service, Service::Sms);
        assert_eq!(message.content.text(), Some("hi"));
        assert_eq!(message.handle, "+15550123");
    }
}
