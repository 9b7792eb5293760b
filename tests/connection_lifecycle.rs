//! Integration tests for the connection task: registration, commands,
//! teardown and transport failures.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{DuplexConnector, FakeServer};
use purple_irc::config::AccountConfig;
use purple_irc::{
    BuddyStatus, Command, ConnectionError, ConnectionErrorKind, ConnectionState, Event,
    network,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

/// Wait for the first event matching `predicate`, returning everything
/// received up to and including it.
async fn wait_for<F>(events: &mut UnboundedReceiver<Event>, mut predicate: F) -> Vec<Event>
where
    F: FnMut(&Event) -> bool,
{
    let mut seen = Vec::new();
    loop {
        let event = timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed");
        let done = predicate(&event);
        seen.push(event);
        if done {
            return seen;
        }
    }
}

async fn drain(events: &mut UnboundedReceiver<Event>) -> Vec<Event> {
    let mut seen = Vec::new();
    while let Ok(Some(event)) = timeout(Duration::from_secs(5), events.recv()).await {
        seen.push(event);
    }
    seen
}

fn start(config: AccountConfig) -> (network::DriverHandle, UnboundedReceiver<Event>, FakeServer, Arc<DuplexConnector>) {
    let (connector, server) = DuplexConnector::pair();
    let connector = Arc::new(connector);
    let session = common::session(&config);
    let (handle, events) = network::spawn(session, connector.clone());
    (handle, events, server, connector)
}

#[tokio::test]
async fn test_registration_and_quit() {
    let mut config = AccountConfig::new("purple@irc.test");
    config.buddies = vec!["alice".into(), "bob".into()];
    config.autojoin = vec!["#rust".into()];
    let (handle, mut events, mut server, connector) = start(config);

    let burst = server.accept_registration("purple").await.unwrap();
    assert_eq!(burst, vec!["USER purple * irc.test :purple", "NICK purple"]);
    assert_eq!(connector.target(), Some(("irc.test".into(), 6667, false)));

    let seen = wait_for(&mut events, |e| {
        *e == Event::StateChanged(ConnectionState::Connected)
    })
    .await;
    assert!(seen.contains(&Event::StateChanged(ConnectionState::Connecting)));
    assert!(seen.contains(&Event::StateChanged(ConnectionState::AwaitingLoginReplies)));

    assert_eq!(server.recv().await.unwrap(), "JOIN #rust");
    assert_eq!(server.recv().await.unwrap(), "ISON alice bob");
    server.send(":irc.test 303 purple :bob").await.unwrap();
    let seen = wait_for(&mut events, |e| matches!(e, Event::BuddyStatus { .. })).await;
    assert_eq!(
        seen.last(),
        Some(&Event::BuddyStatus {
            name: "bob".into(),
            status: BuddyStatus::Available,
        })
    );

    assert!(handle.send(Command::Quit(Some("bye".into()))).await);
    assert_eq!(server.recv_to_eof().await, vec!["QUIT :bye"]);
    assert!(handle.join().await.is_ok());
    let rest = drain(&mut events).await;
    assert_eq!(
        rest.last(),
        Some(&Event::StateChanged(ConnectionState::Disconnected))
    );
}

#[tokio::test]
async fn test_channel_message_reaches_application() {
    let (handle, mut events, mut server, _) = start(AccountConfig::new("purple@irc.test"));
    server.accept_registration("purple").await.unwrap();

    server.send(":purple!p@host JOIN #chan").await.unwrap();
    server.send(":nick!user@host PRIVMSG #chan :hello").await.unwrap();
    let seen = wait_for(&mut events, |e| matches!(e, Event::ChatMessage { .. })).await;
    assert_eq!(
        seen.iter()
            .filter(|e| matches!(e, Event::ChatMessage { .. }))
            .collect::<Vec<_>>(),
        vec![&Event::ChatMessage {
            channel: "#chan".into(),
            from: "nick".into(),
            text: "hello".into(),
        }]
    );
    assert_eq!(server.recv().await.unwrap(), "WHO #chan");

    handle.shutdown();
    assert_eq!(server.recv_to_eof().await, vec!["QUIT :Leaving."]);
    assert!(handle.join().await.is_ok());
}

#[tokio::test]
async fn test_long_channel_message_is_delivered() {
    let (handle, mut events, mut server, _) = start(AccountConfig::new("purple@irc.test"));
    server.accept_registration("purple").await.unwrap();

    let text = "y".repeat(600);
    server.send(":purple!p@host JOIN #chan").await.unwrap();
    server
        .send(&format!(":nick!user@host PRIVMSG #chan :{text}"))
        .await
        .unwrap();
    let seen = wait_for(&mut events, |e| matches!(e, Event::ChatMessage { .. })).await;
    assert_eq!(
        seen.last(),
        Some(&Event::ChatMessage {
            channel: "#chan".into(),
            from: "nick".into(),
            text,
        })
    );

    handle.shutdown();
    handle.join().await.unwrap();
}

#[tokio::test]
async fn test_commands_are_written_in_order() {
    let (handle, mut events, mut server, _) = start(AccountConfig::new("purple@irc.test"));
    server.accept_registration("purple").await.unwrap();
    wait_for(&mut events, |e| *e == Event::StateChanged(ConnectionState::Connected)).await;

    handle
        .send(Command::ChatJoin {
            channel: "#a".into(),
            key: Some("secret".into()),
        })
        .await;
    handle
        .send(Command::SendIm {
            to: "bob".into(),
            text: "one\ntwo".into(),
        })
        .await;
    handle.send(Command::GetInfo("bob".into())).await;

    assert_eq!(server.recv().await.unwrap(), "JOIN #a secret");
    assert_eq!(server.recv().await.unwrap(), "PRIVMSG bob :one");
    assert_eq!(server.recv().await.unwrap(), "PRIVMSG bob :two");
    assert_eq!(server.recv().await.unwrap(), "WHOIS bob");

    handle.send(Command::Quit(None)).await;
    assert_eq!(server.recv_to_eof().await, vec!["QUIT :Leaving."]);
    handle.join().await.unwrap();
}

#[tokio::test]
async fn test_server_ping_is_answered() {
    let (handle, _events, mut server, _) = start(AccountConfig::new("purple@irc.test"));
    server.accept_registration("purple").await.unwrap();

    server.send("PING :irc.test").await.unwrap();
    assert_eq!(server.recv().await.unwrap(), "PONG :irc.test");

    handle.shutdown();
    handle.join().await.unwrap();
}

#[tokio::test]
async fn test_server_hang_up() {
    let (handle, mut events, mut server, _) = start(AccountConfig::new("purple@irc.test"));
    server.accept_registration("purple").await.unwrap();
    wait_for(&mut events, |e| *e == Event::StateChanged(ConnectionState::Connected)).await;
    server.hang_up();

    let err = handle.join().await.unwrap_err();
    assert_eq!(err, ConnectionError::server_closed());
    assert_eq!(err.kind(), ConnectionErrorKind::NetworkError);

    let rest = drain(&mut events).await;
    assert!(rest.contains(&Event::ConnectionError(ConnectionError::server_closed())));
    assert_eq!(
        rest.last(),
        Some(&Event::StateChanged(ConnectionState::Disconnected))
    );
}

#[tokio::test]
async fn test_error_line_ends_connection_without_quit() {
    let (handle, _events, mut server, _) = start(AccountConfig::new("purple@irc.test"));
    server.accept_registration("purple").await.unwrap();

    server.send("ERROR :Closing Link: purple[host] (K-Lined)").await.unwrap();
    let err = handle.join().await.unwrap_err();
    assert_eq!(
        err,
        ConnectionError::Network("Closing Link: purple[host] (K-Lined)".into())
    );
    assert!(server.recv_to_eof().await.is_empty());
}

#[tokio::test]
async fn test_connect_failure_is_reported() {
    let connector = Arc::new(DuplexConnector::refusing());
    let session = common::session(&AccountConfig::new("purple@irc.test"));
    let (handle, mut events) = network::spawn(session, connector);

    let err = handle.join().await.unwrap_err();
    assert_eq!(err.kind(), ConnectionErrorKind::NetworkError);
    let seen = drain(&mut events).await;
    assert_eq!(
        seen,
        vec![
            Event::StateChanged(ConnectionState::Connecting),
            Event::ConnectionError(err),
            Event::StateChanged(ConnectionState::Disconnecting),
            Event::StateChanged(ConnectionState::Disconnected),
        ]
    );
}

#[tokio::test]
async fn test_ssl_uses_default_tls_port() {
    let mut config = AccountConfig::new("purple@irc.test");
    config.ssl = true;
    let (handle, _events, mut server, connector) = start(config);
    server.recv_until(|l| l.starts_with("NICK ")).await.unwrap();
    assert_eq!(connector.target(), Some(("irc.test".into(), 6697, true)));
    handle.shutdown();
    handle.join().await.unwrap();
}
