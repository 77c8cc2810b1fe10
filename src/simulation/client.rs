//! A messaging backend that fabricates its own traffic.
//!
//! [`MockClient`] satisfies [`MessagingClient`] without any transport. It
//! owns a directory of generated recipients and, once a listener is
//! registered, backfills a transcript for each of them. Afterwards it keeps
//! the conversation going on its own: a periodic tick delivers an unsolicited
//! message from a random recipient, and every send is echoed immediately and
//! answered after a fixed delay.
//!
//! The client is single-threaded (`!Send`). Timers live in a
//! [`TimerQueue`] and fire only when [`MockClient::fire_due`] is called,
//! either directly (tests) or from the [`MockClient::run`] loop. Handlers are
//! always called with no internal borrow held, so a handler may call back
//! into the client.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::client::{ClientError, ErrorHandler, EventHandler, MessagingClient};
use crate::logging;
use crate::protocol::{ClientEvent, OutgoingMessage};

use super::config::{ConfigError, MockClientConfig};
use super::directory::{Recipient, RecipientDirectory};
use super::synthesis::{backfill, now_millis, outgoing, synthesize, MessageIds};
use super::timer::{RepeatingTask, TimerId, TimerQueue};

#[derive(Debug, Clone)]
enum Timer {
    Tick,
    Reply { recipient: Recipient },
}

struct Listeners {
    on_event: Rc<dyn EventHandler>,
    // Registered for contract parity; nothing in the simulation can fail
    // after a call has returned.
    #[allow(dead_code)]
    on_error: Rc<dyn ErrorHandler>,
}

struct MockState {
    directory: RecipientDirectory,
    listeners: Option<Listeners>,
    rng: ChaCha8Rng,
    ids: MessageIds,
    timers: TimerQueue<Timer>,
    ticker: Option<RepeatingTask>,
}

type Delivery = (Rc<dyn EventHandler>, ClientEvent);

impl MockState {
    fn event_handler(&self) -> Option<Rc<dyn EventHandler>> {
        self.listeners
            .as_ref()
            .map(|listeners| Rc::clone(&listeners.on_event))
    }

    /// One inbound message from a random recipient, if anyone is listening.
    fn incoming_from_random(&mut self) -> Option<Delivery> {
        let on_event = self.event_handler()?;
        let MockState {
            directory,
            rng,
            ids,
            ..
        } = self;
        let recipient = directory.pick_random(rng)?;
        let messages = synthesize(rng, ids, recipient, 1, now_millis());
        crate::tlog!(
            "tick: new message from {} ({})",
            logging::handle(recipient.primary_handle()),
            logging::msg_id(messages[0].id)
        );
        Some((on_event, ClientEvent::MessageNew { messages }))
    }

    fn reply_from(&mut self, recipient: &Recipient) -> Option<Delivery> {
        let on_event = self.event_handler()?;
        let messages = synthesize(&mut self.rng, &mut self.ids, recipient, 1, now_millis());
        crate::tlog!(
            "reply: {} answered ({})",
            logging::handle(recipient.primary_handle()),
            logging::msg_id(messages[0].id)
        );
        Some((on_event, ClientEvent::MessageNew { messages }))
    }

    fn fire(&mut self, id: TimerId, deadline: Instant, timer: Timer) -> Option<Delivery> {
        match timer {
            Timer::Tick => {
                let ticker = self.ticker.as_mut().filter(|ticker| ticker.owns(id))?;
                ticker.rearm(&mut self.timers, deadline, Timer::Tick);
                self.incoming_from_random()
            }
            Timer::Reply { recipient } => self.reply_from(&recipient),
        }
    }
}

pub struct MockClient {
    config: MockClientConfig,
    state: RefCell<MockState>,
    wake: Notify,
}

impl MockClient {
    /// Build a client with a freshly generated directory.
    ///
    /// When the config enables it, the periodic tick is armed immediately;
    /// it stays silent until a listener is registered.
    pub fn new(config: MockClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let directory = RecipientDirectory::generate(&mut rng, config.recipient_count);
        let mut timers = TimerQueue::new();
        let ticker = config
            .tick_interval()
            .map(|interval| RepeatingTask::start(&mut timers, interval, Instant::now(), Timer::Tick));
        crate::tlog!(
            "mock client: {} recipient(s), reply delay {}ms, tick {}",
            directory.len(),
            config.reply_delay_ms,
            match config.tick_interval() {
                Some(interval) => format!("every {}ms", interval.as_millis()),
                None => "off".to_string(),
            }
        );
        Ok(Self {
            config,
            state: RefCell::new(MockState {
                directory,
                listeners: None,
                rng,
                ids: MessageIds::new(),
                timers,
                ticker,
            }),
            wake: Notify::new(),
        })
    }

    pub fn config(&self) -> &MockClientConfig {
        &self.config
    }

    /// Snapshot of the directory in insertion order.
    pub fn recipients(&self) -> Vec<Recipient> {
        self.state.borrow().directory.iter().cloned().collect()
    }

    pub fn recipient_count(&self) -> usize {
        self.state.borrow().directory.len()
    }

    pub fn find_recipient(&self, handle: &str) -> Option<Recipient> {
        self.state.borrow().directory.find_by_handle(handle).cloned()
    }

    pub fn is_listening(&self) -> bool {
        self.state.borrow().listeners.is_some()
    }

    /// Deliver one unsolicited message right away, outside the tick
    /// schedule. Returns `false` if nobody is listening or the directory is
    /// empty.
    pub fn tick(&self) -> bool {
        let delivery = self.state.borrow_mut().incoming_from_random();
        match delivery {
            Some((on_event, event)) => {
                on_event.on_event(event);
                true
            }
            None => false,
        }
    }

    /// Arm the periodic tick. Returns `false` if it is already running or no
    /// interval is configured.
    pub fn start_ticking(&self) -> bool {
        if self.config.tick_interval_ms == 0 {
            return false;
        }
        let interval = Duration::from_millis(self.config.tick_interval_ms);
        {
            let mut state = self.state.borrow_mut();
            if state.ticker.as_ref().is_some_and(RepeatingTask::is_active) {
                return false;
            }
            let MockState { timers, ticker, .. } = &mut *state;
            *ticker = Some(RepeatingTask::start(
                timers,
                interval,
                Instant::now(),
                Timer::Tick,
            ));
        }
        self.wake.notify_one();
        true
    }

    /// Cancel the periodic tick. Pending replies are unaffected.
    pub fn stop_ticking(&self) {
        let mut state = self.state.borrow_mut();
        let MockState { timers, ticker, .. } = &mut *state;
        if let Some(ticker) = ticker.as_mut() {
            ticker.cancel(timers);
        }
    }

    pub fn is_ticking(&self) -> bool {
        self.state
            .borrow()
            .ticker
            .as_ref()
            .is_some_and(RepeatingTask::is_active)
    }

    /// Number of timers (tick and replies) waiting to fire.
    pub fn pending_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.state.borrow_mut().timers.next_deadline()
    }

    /// Fire every timer due at or before `now`, earliest first. Returns the
    /// number of events delivered.
    pub fn fire_due(&self, now: Instant) -> usize {
        let mut delivered = 0;
        loop {
            let delivery = {
                let mut state = self.state.borrow_mut();
                let Some((id, deadline, timer)) = state.timers.pop_due(now) else {
                    break;
                };
                state.fire(id, deadline, timer)
            };
            if let Some((on_event, event)) = delivery {
                on_event.on_event(event);
                delivered += 1;
            }
        }
        delivered
    }

    /// Fire timers as their deadlines pass. Never returns; drop the future to
    /// stop the simulation.
    pub async fn run(&self) {
        loop {
            match self.next_deadline() {
                Some(deadline) => {
                    tokio::select! {
                        _ = tokio::time::sleep_until(deadline) => {
                            self.fire_due(Instant::now());
                        }
                        _ = self.wake.notified() => {}
                    }
                }
                None => self.wake.notified().await,
            }
        }
    }
}

impl MessagingClient for MockClient {
    fn listen(
        &self,
        on_event: Rc<dyn EventHandler>,
        on_error: Rc<dyn ErrorHandler>,
    ) -> Result<(), ClientError> {
        let batches = {
            let mut state = self.state.borrow_mut();
            if state.listeners.is_some() {
                return Err(ClientError::AlreadyListening);
            }
            state.listeners = Some(Listeners {
                on_event: Rc::clone(&on_event),
                on_error,
            });
            let now = now_millis();
            let MockState { directory, rng, .. } = &mut *state;
            directory
                .iter()
                .map(|recipient| {
                    backfill(
                        rng,
                        recipient,
                        self.config.preload_messages_per_recipient,
                        self.config.max_backfill_days,
                        now,
                    )
                })
                .collect::<Vec<_>>()
        };
        let total: usize = batches.iter().map(Vec::len).sum();
        crate::tlog!(
            "listen: preloading {} message(s) for {} recipient(s)",
            total,
            batches.len()
        );
        for messages in batches.into_iter().filter(|batch| !batch.is_empty()) {
            on_event.on_event(ClientEvent::MessagePreload { messages });
        }
        Ok(())
    }

    fn send_message(&self, message: OutgoingMessage) -> Result<(), ClientError> {
        if message.handle.trim().is_empty() {
            return Err(ClientError::InvalidHandle(message.handle));
        }
        let text = message.content.text.ok_or(ClientError::MissingText)?;
        let service = message.service.unwrap_or_default();
        let (on_event, echo, created) = {
            let mut state = self.state.borrow_mut();
            let on_event = state.event_handler().ok_or(ClientError::NotListening)?;
            let MockState {
                directory,
                rng,
                ids,
                timers,
                ..
            } = &mut *state;
            let (recipient, created) = directory.resolve_or_create(rng, &message.handle);
            let echo = outgoing(ids, recipient, service, text, now_millis());
            timers.schedule(
                Instant::now() + self.config.reply_delay(),
                Timer::Reply {
                    recipient: recipient.clone(),
                },
            );
            (on_event, echo, created)
        };
        self.wake.notify_one();
        crate::tlog!(
            "send: {}{} echoed {}, reply in {}ms",
            logging::handle(&echo.handle),
            if created { " (new recipient)" } else { "" },
            logging::msg_id(echo.id),
            self.config.reply_delay_ms
        );
        on_event.on_event(ClientEvent::MessageNew {
            messages: vec![echo],
        });
        Ok(())
    }

    fn is_online(&self) -> bool {
        true
    }

    fn attachment_url(&self, _attachment_id: u64) -> String {
        self.config.attachment_url.clone()
    }
}
