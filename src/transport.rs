//! The device channel: a reconnecting duplex link with a small state
//! machine, a fixed-delay reconnect timer and a trailing debounce for
//! settings. The actual socket sits behind the [`Channel`]/[`Connector`]
//! traits so tests drive the link with [`FakeConnector`] and simulated
//! time.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::effects::ParamSet;
use crate::error::{GlowgridError, GlowgridResult};
use crate::grid::Frame;
use crate::protocol::{
    self, DeviceSettings, Telemetry, TextMessage, encode_frame, encode_settings,
};
use crate::sched::Deadline;
use crate::timeline::Animation;

/// Fixed reconnect delay. Not a backoff: the device is assumed local and
/// retrying at a constant rate keeps downtime short.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(1500);

/// Trailing debounce window for settings changes.
pub const SETTINGS_DEBOUNCE: Duration = Duration::from_millis(200);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// One live duplex channel. `poll_inbound` must not block: it returns
/// `Ok(None)` when nothing is pending and `Err` when the channel is dead.
pub trait Channel {
    fn send_binary(&mut self, payload: &[u8]) -> GlowgridResult<()>;
    fn send_text(&mut self, payload: &str) -> GlowgridResult<()>;
    fn poll_inbound(&mut self) -> GlowgridResult<Option<String>>;
    fn close(&mut self);
}

/// Opens channels. A connector is reused across reconnect attempts.
pub trait Connector {
    type Channel: Channel;

    fn connect(&mut self) -> GlowgridResult<Self::Channel>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum LinkEvent {
    StateChanged(ConnectionState),
    Telemetry(Telemetry),
}

/// The reconnecting device link. Single-threaded: everything happens in
/// [`DeviceLink::poll`] and the explicit send calls, all parameterized on
/// the caller's clock.
pub struct DeviceLink<C: Connector> {
    connector: C,
    state: ConnectionState,
    channel: Option<C::Channel>,
    reconnect: Deadline,
    debounce: Deadline,
    pending_settings: Option<DeviceSettings>,
    packets_sent: u64,
}

impl<C: Connector> DeviceLink<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            state: ConnectionState::Disconnected,
            channel: None,
            reconnect: Deadline::idle(),
            debounce: Deadline::idle(),
            pending_settings: None,
            packets_sent: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn packets_sent(&self) -> u64 {
        self.packets_sent
    }

    /// Request a connection. The attempt itself happens on the next
    /// [`DeviceLink::poll`]; calling this while already connected or
    /// already scheduled is a no-op.
    pub fn open(&mut self, now: Instant) {
        if self.state == ConnectionState::Disconnected {
            self.reconnect.arm_if_idle(now);
        }
    }

    /// Drop the channel and cancel any pending reconnect. The link stays
    /// down until [`DeviceLink::open`] is called again.
    pub fn close(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            channel.close();
        }
        self.reconnect.cancel();
        self.debounce.cancel();
        self.pending_settings = None;
        self.state = ConnectionState::Disconnected;
    }

    /// Drive the link: attempt a due reconnect, drain inbound telemetry,
    /// flush a due settings debounce. Returns the events produced.
    pub fn poll(&mut self, now: Instant) -> Vec<LinkEvent> {
        let mut events = Vec::new();

        if self.state == ConnectionState::Disconnected && self.reconnect.fire(now) {
            self.attempt_connect(now, &mut events);
        }

        self.drain_inbound(now, &mut events);

        if self.debounce.fire(now) {
            if let Some(settings) = self.pending_settings.take() {
                self.send_payload(&encode_settings(settings), now);
            }
        }

        events
    }

    /// Stream one frame. Silently dropped unless connected; frames are
    /// presentation state and are never retried.
    pub fn send_frame(&mut self, frame: &Frame, brightness: u8, now: Instant) {
        let payload = encode_frame(frame, brightness);
        if self.send_payload(&payload, now) {
            self.packets_sent += 1;
        }
    }

    /// Queue a settings update behind the trailing debounce. Repeated calls
    /// within the window coalesce to the most recent value.
    pub fn queue_settings(&mut self, settings: DeviceSettings, now: Instant) {
        self.pending_settings = Some(settings);
        self.debounce.arm(now + SETTINGS_DEBOUNCE);
    }

    /// Send the current configuration of a named effect.
    pub fn send_effect(&mut self, name: &str, params: &ParamSet, now: Instant) {
        self.send_message(&TextMessage::effect(name, params), now);
    }

    /// Bulk animation hand-off, distinct from per-frame streaming.
    pub fn send_animation(&mut self, anim: &Animation, now: Instant) {
        self.send_message(&TextMessage::animation(anim), now);
    }

    fn attempt_connect(&mut self, now: Instant, events: &mut Vec<LinkEvent>) {
        self.set_state(ConnectionState::Connecting, events);
        match self.connector.connect() {
            Ok(channel) => {
                self.channel = Some(channel);
                self.set_state(ConnectionState::Connected, events);
            }
            Err(err) => {
                warn!("device connect failed: {err}");
                self.set_state(ConnectionState::Disconnected, events);
                self.reconnect.arm(now + RECONNECT_DELAY);
            }
        }
    }

    fn drain_inbound(&mut self, now: Instant, events: &mut Vec<LinkEvent>) {
        loop {
            let Some(channel) = self.channel.as_mut() else {
                return;
            };
            match channel.poll_inbound() {
                Ok(Some(text)) => match protocol::parse_telemetry(&text) {
                    Some(telemetry) => events.push(LinkEvent::Telemetry(telemetry)),
                    None => debug!("discarding malformed telemetry payload"),
                },
                Ok(None) => break,
                Err(err) => {
                    warn!("device channel lost: {err}");
                    self.handle_channel_loss(now, events);
                    break;
                }
            }
        }
    }

    fn send_payload(&mut self, payload: &[u8], now: Instant) -> bool {
        if self.state != ConnectionState::Connected {
            debug!("dropping send while {:?}", self.state);
            return false;
        }
        let Some(channel) = self.channel.as_mut() else {
            return false;
        };
        match channel.send_binary(payload) {
            Ok(()) => true,
            Err(err) => {
                warn!("device send failed: {err}");
                let mut events = Vec::new();
                self.handle_channel_loss(now, &mut events);
                false
            }
        }
    }

    fn send_message(&mut self, message: &TextMessage, now: Instant) {
        if self.state != ConnectionState::Connected {
            debug!("dropping message while {:?}", self.state);
            return;
        }
        let json = match message.to_json() {
            Ok(json) => json,
            Err(err) => {
                warn!("skipping unencodable message: {err}");
                return;
            }
        };
        let Some(channel) = self.channel.as_mut() else {
            return;
        };
        if let Err(err) = channel.send_text(&json) {
            warn!("device send failed: {err}");
            let mut events = Vec::new();
            self.handle_channel_loss(now, &mut events);
        }
    }

    fn handle_channel_loss(&mut self, now: Instant, events: &mut Vec<LinkEvent>) {
        if let Some(mut channel) = self.channel.take() {
            channel.close();
        }
        self.set_state(ConnectionState::Disconnected, events);
        self.reconnect.arm(now + RECONNECT_DELAY);
    }

    fn set_state(&mut self, state: ConnectionState, events: &mut Vec<LinkEvent>) {
        if self.state != state {
            self.state = state;
            events.push(LinkEvent::StateChanged(state));
        }
    }
}

/// Scripted in-memory wire for tests: records outbound payloads, queues
/// inbound text, and can refuse connects or fail sends on demand.
#[derive(Debug, Default)]
pub struct FakeWire {
    pub sent_binary: Vec<Vec<u8>>,
    pub sent_text: Vec<String>,
    pub inbound: VecDeque<String>,
    pub connect_attempts: u32,
    pub refuse_connects: u32,
    pub fail_next_send: bool,
    pub closed: bool,
}

pub struct FakeConnector {
    wire: Rc<RefCell<FakeWire>>,
}

impl FakeConnector {
    pub fn new() -> (Self, Rc<RefCell<FakeWire>>) {
        let wire = Rc::new(RefCell::new(FakeWire::default()));
        (Self { wire: Rc::clone(&wire) }, wire)
    }
}

pub struct FakeChannel {
    wire: Rc<RefCell<FakeWire>>,
}

impl Connector for FakeConnector {
    type Channel = FakeChannel;

    fn connect(&mut self) -> GlowgridResult<FakeChannel> {
        let mut wire = self.wire.borrow_mut();
        wire.connect_attempts += 1;
        if wire.refuse_connects > 0 {
            wire.refuse_connects -= 1;
            return Err(GlowgridError::transport("connection refused"));
        }
        wire.closed = false;
        Ok(FakeChannel {
            wire: Rc::clone(&self.wire),
        })
    }
}

impl Channel for FakeChannel {
    fn send_binary(&mut self, payload: &[u8]) -> GlowgridResult<()> {
        let mut wire = self.wire.borrow_mut();
        if std::mem::take(&mut wire.fail_next_send) {
            return Err(GlowgridError::transport("send failed"));
        }
        wire.sent_binary.push(payload.to_vec());
        Ok(())
    }

    fn send_text(&mut self, payload: &str) -> GlowgridResult<()> {
        let mut wire = self.wire.borrow_mut();
        if std::mem::take(&mut wire.fail_next_send) {
            return Err(GlowgridError::transport("send failed"));
        }
        wire.sent_text.push(payload.to_string());
        Ok(())
    }

    fn poll_inbound(&mut self) -> GlowgridResult<Option<String>> {
        let mut wire = self.wire.borrow_mut();
        if wire.closed {
            return Err(GlowgridError::transport("closed by peer"));
        }
        Ok(wire.inbound.pop_front())
    }

    fn close(&mut self) {
        self.wire.borrow_mut().closed = true;
    }
}
