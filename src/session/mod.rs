//! Per-account IRC connection state.
//!
//! [`Session`] is sans-IO: it consumes decoded lines and timer ticks and
//! produces outbound lines and [`Event`]s. The tokio driver in
//! [`crate::network`] owns the socket and moves data between the two.
//!
//! ```text
//! Disconnected -> Connecting -> AwaitingLoginReplies -> Connected
//!      ^                                                    |
//!      +------------------- Disconnecting <-----------------+
//! ```

pub mod account;
mod commands;
pub mod conversations;
pub mod nick;
pub mod whois;

pub use account::Account;
pub use commands::Status;
pub use conversations::{Chat, ChatUser, Conversations};
pub use whois::WhoisInfo;

use std::collections::VecDeque;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use purple_plugin::{Flow, InterceptorChain};
use purple_proto::format::LineBuilder;
use purple_proto::sasl::SaslContext;
use purple_proto::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::buddies::BuddyTable;
use crate::config::{AccountConfig, StatusKind};
use crate::error::ConnectionError;
use crate::events::{Event, NotifyLevel};
use crate::handlers::Registry;

/// Interval of the buddy poll and keepalive timer.
pub const TICK_INTERVAL: Duration = Duration::from_secs(45);

/// Silence after which a keepalive PING is sent.
pub const PING_TIMEOUT: Duration = Duration::from_secs(60);

/// Default QUIT message.
pub const DEFAULT_QUIT: &str = "Leaving.";

/// Mode prefixes assumed until the server announces `PREFIX=`.
const DEFAULT_MODE_CHARS: &str = "@+";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    AwaitingLoginReplies,
    Connected,
    Disconnecting,
}

/// One logged-in IRC account.
pub struct Session {
    pub(crate) account: Account,
    state: ConnectionState,
    display_nick: String,
    /// Nick last asked for with NICK; cleared when a change is refused.
    pub(crate) reqnick: Option<String>,
    pub(crate) nickused: bool,
    pub(crate) fallbacks: u32,
    last_received: Instant,
    timer_armed: bool,
    tls: bool,
    pub(crate) quitting: bool,
    pub(crate) motd: Option<String>,
    pub(crate) mode_chars: String,
    pub(crate) sasl: Option<SaslContext>,
    pub(crate) roomlist: bool,
    pub(crate) whois: WhoisInfo,
    pub(crate) names: Option<String>,
    pub(crate) buddies: BuddyTable,
    pub(crate) conversations: Conversations,
    registry: Arc<Registry>,
    sending: InterceptorChain<String>,
    receiving: InterceptorChain<String>,
    outbox: VecDeque<String>,
    events: Vec<Event>,
    error: Option<ConnectionError>,
    cancel: CancellationToken,
}

impl Session {
    pub fn new(account: Account) -> Self {
        Self {
            display_nick: account.nick.clone(),
            account,
            state: ConnectionState::Disconnected,
            reqnick: None,
            nickused: false,
            fallbacks: 0,
            last_received: Instant::now(),
            timer_armed: false,
            tls: false,
            quitting: false,
            motd: None,
            mode_chars: DEFAULT_MODE_CHARS.to_string(),
            sasl: None,
            roomlist: false,
            whois: WhoisInfo::default(),
            names: None,
            buddies: BuddyTable::new(),
            conversations: Conversations::new(),
            registry: Arc::new(Registry::new()),
            sending: InterceptorChain::new(),
            receiving: InterceptorChain::new(),
            outbox: VecDeque::new(),
            events: Vec::new(),
            error: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Parse the account and build a session for it.
    pub fn login(config: &AccountConfig) -> Result<Self, ConnectionError> {
        Ok(Self::new(Account::parse(config)?))
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Our current nick.
    pub fn display_nick(&self) -> &str {
        &self.display_nick
    }

    pub fn reqnick(&self) -> Option<&str> {
        self.reqnick.as_deref()
    }

    pub fn nickused(&self) -> bool {
        self.nickused
    }

    pub fn mode_chars(&self) -> &str {
        &self.mode_chars
    }

    /// MOTD lines collected since the last `375`.
    pub fn motd(&self) -> Option<&str> {
        self.motd.as_deref()
    }

    pub fn whois(&self) -> &WhoisInfo {
        &self.whois
    }

    pub fn buddies(&self) -> &BuddyTable {
        &self.buddies
    }

    pub fn conversations(&self) -> &Conversations {
        &self.conversations
    }

    pub fn sasl_active(&self) -> bool {
        self.sasl.is_some()
    }

    pub fn is_tls(&self) -> bool {
        self.tls
    }

    pub fn timer_armed(&self) -> bool {
        self.timer_armed
    }

    /// The first connection-fatal error, if any.
    pub fn error(&self) -> Option<&ConnectionError> {
        self.error.as_ref()
    }

    /// Token cancelled when the session closes.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Interceptors run on every outbound line (`irc-sending-text`).
    pub fn sending_text(&mut self) -> &mut InterceptorChain<String> {
        &mut self.sending
    }

    /// Interceptors run on every inbound line (`irc-receiving-text`).
    pub fn receiving_text(&mut self) -> &mut InterceptorChain<String> {
        &mut self.receiving
    }

    /// Take the lines waiting to be written, in submission order.
    pub fn drain_outbound(&mut self) -> Vec<String> {
        self.outbox.drain(..).collect()
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    /// Queue a line through the sending interceptors. A veto drops it.
    pub fn send(&mut self, line: String) {
        match self.sending.run(line) {
            Flow::Proceed(line) => {
                trace!(line = %line.trim_end(), "queued");
                self.outbox.push_back(line);
            }
            Flow::Veto(reason) => debug!(%reason, "outbound line vetoed"),
        }
    }

    pub(crate) fn send_builder(&mut self, builder: LineBuilder<'_>) {
        self.send(builder.build());
    }

    pub(crate) fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub(crate) fn system_message(&mut self, target: &str, text: impl Into<String>) {
        self.emit(Event::SystemMessage {
            target: target.to_string(),
            text: text.into(),
        });
    }

    pub(crate) fn notify(
        &mut self,
        level: NotifyLevel,
        title: Option<&str>,
        primary: impl Into<String>,
        secondary: impl Into<String>,
    ) {
        self.emit(Event::Notify {
            level,
            title: title.map(str::to_string),
            primary: primary.into(),
            secondary: secondary.into(),
        });
    }

    pub(crate) fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, "connection state");
            self.state = state;
            self.emit(Event::StateChanged(state));
        }
    }

    pub(crate) fn set_display_nick(&mut self, nick: &str) {
        if self.display_nick != nick {
            self.display_nick = nick.to_string();
            self.emit(Event::DisplayName(nick.to_string()));
        }
    }

    /// Record a connection-fatal error. Only the first one is reported.
    pub(crate) fn fail(&mut self, err: ConnectionError) {
        if self.error.is_some() {
            debug!(error = %err, "ignoring error after connection failure");
            return;
        }
        warn!(code = err.error_code(), error = %err, "connection error");
        self.emit(Event::ConnectionError(err.clone()));
        self.error = Some(err);
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Mark the transport as being set up.
    pub fn connecting(&mut self) {
        self.set_state(ConnectionState::Connecting);
    }

    /// Send the registration burst once the transport is up.
    pub fn start(&mut self, tls: bool) {
        self.tls = tls;
        self.set_state(ConnectionState::AwaitingLoginReplies);

        if let Some(password) = self.account.password.clone() {
            if self.account.sasl {
                self.send_builder(LineBuilder::new("CAP").verbatim("REQ").trailing("sasl"));
            } else {
                self.send_builder(LineBuilder::new("PASS").trailing(&password));
            }
        }

        let server = self.account.user_server();
        let ident = self.account.ident.clone();
        let realname = self.account.realname.clone();
        self.send_builder(
            LineBuilder::new("USER")
                .verbatim(&ident)
                .verbatim("*")
                .verbatim(&server)
                .trailing(&realname),
        );

        let nick = self.display_nick.clone();
        self.send_builder(LineBuilder::new("NICK").nick(&nick));
        self.reqnick = Some(nick);
        self.nickused = false;
        self.fallbacks = 0;
        self.last_received = Instant::now();
    }

    /// Registration finished; `nick` is what the server calls us.
    pub(crate) fn connected(&mut self, nick: &str) {
        if self.is_connected() {
            return;
        }

        info!(server = %self.account.server, nick = %nick, "connected");
        self.set_display_nick(nick);
        self.set_state(ConnectionState::Connected);

        if self.account.status != StatusKind::Available {
            let message = self.account.away_message.clone();
            self.set_away(Some(&message));
        }

        for buddy in self.account.buddies.clone() {
            if !self.buddies.contains(&buddy) {
                self.buddies.add(&buddy);
            }
        }

        for entry in self.account.autojoin.clone() {
            let mut parts = entry.split_whitespace();
            if let Some(channel) = parts.next() {
                self.chat_join(channel, parts.next());
            }
        }

        self.poll_buddies();
        self.timer_armed = true;
    }

    /// Handle one decoded inbound line.
    pub fn handle_line(&mut self, raw: &str) {
        self.last_received = Instant::now();

        let Some(line) = self.receiving.run(raw.to_string()).proceeded() else {
            debug!("inbound line vetoed");
            return;
        };

        let msg = match Message::parse_line(&line) {
            Ok(msg) => msg,
            Err(err) => {
                warn!(error = %err, line = %line, "dropping unparsable line");
                return;
            }
        };

        let registry = Arc::clone(&self.registry);
        if let Err(err) = registry.dispatch(self, &msg, &line) {
            self.fail(err);
        }
    }

    /// Timer callback, see [`Session::tick_at`].
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// Keepalive and buddy poll.
    ///
    /// Sends a PING when nothing arrived for [`PING_TIMEOUT`], then starts
    /// an ISON poll unless one is still outstanding.
    pub fn tick_at(&mut self, now: Instant) {
        if self.is_connected()
            && now.saturating_duration_since(self.last_received) > PING_TIMEOUT
        {
            self.ping(None);
        }
        if self.timer_armed {
            self.poll_buddies();
        }
    }

    /// Start an ISON poll over every buddy.
    pub(crate) fn poll_buddies(&mut self) {
        if self.buddies.is_outstanding() {
            return;
        }
        self.buddies.queue_all();
        self.send_ison_batch();
    }

    pub(crate) fn send_ison_batch(&mut self) {
        if let Some(batch) = self.buddies.next_batch() {
            let builder = batch
                .split(' ')
                .fold(LineBuilder::new("ISON"), |builder, name| builder.verbatim(name));
            self.send_builder(builder);
        }
    }

    /// Tear the connection down: QUIT once, cancel the driver and forget
    /// per-connection state.
    pub fn close(&mut self) {
        if self.state == ConnectionState::Disconnected {
            return;
        }
        self.set_state(ConnectionState::Disconnecting);

        if self.error.is_none() {
            self.quit(None);
        }

        self.cancel.cancel();
        self.timer_armed = false;
        self.buddies.clear();
        self.motd = None;
        self.sasl = None;
        self.whois = WhoisInfo::default();
        self.names = None;
        self.roomlist = false;
        self.set_state(ConnectionState::Disconnected);
    }
}

/// Monotonic microseconds, used for PING stamps.
pub(crate) fn monotonic_micros() -> i64 {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    let epoch = EPOCH.get_or_init(Instant::now);
    i64::try_from(epoch.elapsed().as_micros()).unwrap_or(i64::MAX)
}
