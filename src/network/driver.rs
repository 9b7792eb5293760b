//! The connection task.
//!
//! ```text
//!             commands (mpsc)
//!                   |
//!   socket --> [ tokio::select! ] --> Session --> outbox --> socket
//!                |          |                  \
//!          45s interval  cancel token           events --> application
//! ```
//!
//! One task owns the socket and the [`Session`]. Every branch of the loop
//! feeds the session, then the outbox is written in order and queued
//! events are forwarded.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use purple_proto::LineCodec;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, warn};

use super::connector::Connector;
use crate::error::ConnectionError;
use crate::events::Event;
use crate::session::{ConnectionState, Session, Status, TICK_INTERVAL};
use crate::telemetry::spans;

/// Capacity of the command channel.
const COMMAND_QUEUE: usize = 64;

/// Requests from the application to a running connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SendIm { to: String, text: String },
    SendNotice { to: String, text: String },
    ChatJoin { channel: String, key: Option<String> },
    ChatLeave { channel: String, message: Option<String> },
    ChatSend { channel: String, text: String },
    ChatInvite { channel: String, nick: String },
    SetTopic { channel: String, topic: String },
    Action { target: String, text: String },
    RoomList,
    RoomListCancel,
    GetInfo(String),
    SetStatus(Status),
    AddBuddy(String),
    RemoveBuddy(String),
    ChangeNick(String),
    Ping(Option<String>),
    CtcpPing(String),
    Raw(String),
    /// Send QUIT and close the connection.
    Quit(Option<String>),
}

impl Command {
    fn apply(self, session: &mut Session) {
        match self {
            Self::SendIm { to, text } => session.send_im(&to, &text),
            Self::SendNotice { to, text } => session.send_notice(&to, &text),
            Self::ChatJoin { channel, key } => session.chat_join(&channel, key.as_deref()),
            Self::ChatLeave { channel, message } => {
                session.chat_leave(&channel, message.as_deref())
            }
            Self::ChatSend { channel, text } => {
                if !session.chat_send(&channel, &text) {
                    debug!(channel = %channel, "send to a channel we are not in");
                }
            }
            Self::ChatInvite { channel, nick } => session.chat_invite(&channel, &nick),
            Self::SetTopic { channel, topic } => session.set_topic(&channel, &topic),
            Self::Action { target, text } => session.action(&target, &text),
            Self::RoomList => session.roomlist_get(),
            Self::RoomListCancel => session.roomlist_cancel(),
            Self::GetInfo(nick) => session.get_info(&nick),
            Self::SetStatus(status) => session.set_status(status),
            Self::AddBuddy(name) => session.add_buddy(&name),
            Self::RemoveBuddy(name) => session.remove_buddy(&name),
            Self::ChangeNick(nick) => session.change_nick(&nick),
            Self::Ping(conversation) => session.ping(conversation.as_deref()),
            Self::CtcpPing(nick) => session.ctcp_ping(&nick),
            Self::Raw(line) => session.send_raw(&line),
            Self::Quit(message) => {
                session.quit(message.as_deref());
                session.close();
            }
        }
    }
}

/// Handle to a spawned connection.
pub struct DriverHandle {
    commands: mpsc::Sender<Command>,
    cancel: CancellationToken,
    task: JoinHandle<Result<(), ConnectionError>>,
}

impl DriverHandle {
    /// Queue a command. Returns false once the connection is gone.
    pub async fn send(&self, command: Command) -> bool {
        self.commands.send(command).await.is_ok()
    }

    /// Close the connection (QUIT, then disconnect).
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the connection task to end.
    pub async fn join(self) -> Result<(), ConnectionError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(ConnectionError::Other(format!("connection task failed: {e}"))),
        }
    }
}

/// Spawn the connection task for `session`.
///
/// Events are delivered on the returned receiver until the task ends.
pub fn spawn(
    session: Session,
    connector: Arc<dyn Connector>,
) -> (DriverHandle, mpsc::UnboundedReceiver<Event>) {
    let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE);
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let cancel = session.cancellation();

    let span = spans::connection(&session.account().server, &session.account().nick);
    let task = tokio::spawn(
        async move {
            let mut session = session;
            connect(&mut session, connector.as_ref(), command_rx, event_tx).await
        }
        .instrument(span),
    );

    (
        DriverHandle {
            commands: command_tx,
            cancel,
            task,
        },
        event_rx,
    )
}

/// Open the transport and run the session over it until it closes.
pub async fn connect(
    session: &mut Session,
    connector: &dyn Connector,
    commands: mpsc::Receiver<Command>,
    events: mpsc::UnboundedSender<Event>,
) -> Result<(), ConnectionError> {
    session.connecting();
    forward_events(session, &events);

    let account = session.account().clone();
    let stream = match connector
        .connect(&account.server, account.port, account.ssl)
        .await
    {
        Ok(stream) => stream,
        Err(err) => {
            session.fail(err.clone());
            session.close();
            forward_events(session, &events);
            return Err(err);
        }
    };

    session.start(account.ssl);
    run(session, stream, commands, events).await
}

/// Drive an already started session over `stream`.
pub async fn run<S>(
    session: &mut Session,
    stream: S,
    mut commands: mpsc::Receiver<Command>,
    events: mpsc::UnboundedSender<Event>,
) -> Result<(), ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let codec = match LineCodec::new(&session.account().encoding) {
        Ok(codec) => codec.autodetect_utf8(session.account().autodetect_utf8),
        Err(err) => {
            let err = ConnectionError::from(err);
            session.fail(err.clone());
            session.close();
            forward_events(session, &events);
            return Err(err);
        }
    };
    let mut framed = Framed::new(stream, codec);
    let cancel = session.cancellation();
    let mut ticker = tokio::time::interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if let Err(err) = flush(session, &mut framed).await {
            session.fail(err);
        }
        forward_events(session, &events);

        if let Some(err) = session.error().cloned() {
            session.close();
            forward_events(session, &events);
            return Err(err);
        }
        if session.state() == ConnectionState::Disconnected {
            info!("connection closed");
            return Ok(());
        }

        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("connection cancelled");
                session.close();
            }

            line = framed.next() => match line {
                Some(Ok(line)) => session.handle_line(&line),
                Some(Err(err)) => session.fail(err.into()),
                None => session.fail(ConnectionError::server_closed()),
            },

            _ = ticker.tick() => session.tick(),

            command = commands.recv() => match command {
                Some(command) => command.apply(session),
                None => {
                    debug!("command channel closed");
                    session.close();
                }
            },
        }
    }
}

/// Write every queued line, in order.
async fn flush<S>(
    session: &mut Session,
    framed: &mut Framed<S, LineCodec>,
) -> Result<(), ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let lines = session.drain_outbound();
    if lines.is_empty() {
        return Ok(());
    }
    for line in lines {
        framed
            .feed(line)
            .await
            .map_err(ConnectionError::write_failed)?;
    }
    framed.flush().await.map_err(ConnectionError::write_failed)
}

fn forward_events(session: &mut Session, events: &mpsc::UnboundedSender<Event>) {
    for event in session.drain_events() {
        if events.send(event).is_err() {
            warn!("event receiver dropped");
            break;
        }
    }
}
