//! purple-irc - connect one IRC account from a config file.
//!
//! Events are logged; lines typed on stdin are turned into commands
//! (`/join #chan`, `/msg nick text`, `/quit`, anything else is sent raw).

use std::sync::Arc;

use anyhow::Context;
use purple_irc::config::{Config, validate};
use purple_irc::plugin::{self, IrcProtocol};
use purple_irc::{Command, Event, Session, Status, TcpConnector, network, telemetry};
use purple_plugin::{ManifestLoader, PluginManager};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "purple-irc.toml".to_string());

    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            telemetry::init("info");
            error!(path = %config_path, error = %e, code = e.error_code(), "Failed to load config");
            return Err(e.into());
        }
    };
    telemetry::init(&config.logging.level);

    if let Err(errors) = validate(&config) {
        for e in &errors {
            error!(error = %e, "invalid configuration");
        }
        anyhow::bail!("{} configuration error(s) in {}", errors.len(), config_path);
    }

    // Plugin manager: search paths, loaders, then the built-in protocol.
    let protocol = Arc::new(IrcProtocol::new());
    let mut manager = PluginManager::new();
    if config.plugins.add_default_paths {
        manager.add_default_paths();
    }
    manager.prepend_paths_from_environment(&config.plugins.env_var);
    for path in config.plugins.paths.iter().rev() {
        manager.prepend_path(path);
    }

    let manifests = Arc::new(ManifestLoader::new());
    plugin::bind_manifest(&manifests, protocol.clone());
    manager.register_loader(manifests)?;
    let builtin = plugin::register(&mut manager, protocol.clone())?;
    manager.refresh();

    let irc = manager
        .find_plugin_with_newest_version(plugin::PLUGIN_ID)
        .unwrap_or(builtin);
    manager
        .load_plugin(&irc)
        .with_context(|| format!("loading {}", plugin::PLUGIN_ID))?;
    info!(
        plugin = %irc.id(),
        file = %irc.filename().display(),
        paths = ?manager.paths(),
        "protocol plugin loaded"
    );

    let session = Session::login(&config.account)?;
    let (handle, mut events) = network::spawn(session, Arc::new(TcpConnector::new()));

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => log_event(&event),
                None => break,
            },
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if let Some(command) = parse_input(&line) {
                        if !handle.send(command).await {
                            warn!("connection is gone");
                        }
                    }
                }
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!(error = %e, "stdin read failed");
                    stdin_open = false;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, disconnecting");
                handle.shutdown();
            }
        }
    }

    let result = handle.join().await;
    manager.shutdown();

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            error!(kind = ?e.kind(), error = %e, "connection failed");
            Err(e.into())
        }
    }
}

fn log_event(event: &Event) {
    match event {
        Event::ConnectionError(e) => error!(kind = ?e.kind(), "{e}"),
        Event::ImReceived { from, text, .. } => info!(from = %from, "{text}"),
        Event::ChatMessage {
            channel,
            from,
            text,
        } => info!(channel = %channel, from = %from, "{text}"),
        Event::SystemMessage { target, text } => info!(target = %target, "{text}"),
        other => info!(event = ?other),
    }
}

/// Turn a line of user input into a command.
fn parse_input(line: &str) -> Option<Command> {
    let line = line.trim_end();
    let Some(rest) = line.strip_prefix('/') else {
        return (!line.is_empty()).then(|| Command::Raw(line.to_string()));
    };

    let (verb, args) = rest.split_once(' ').unwrap_or((rest, ""));
    let mut words = args.splitn(2, ' ');
    let first = words.next().filter(|w| !w.is_empty()).map(str::to_string);
    let tail = words.next().map(str::to_string);

    let command = match verb.to_ascii_lowercase().as_str() {
        "join" => Command::ChatJoin {
            channel: first?,
            key: tail,
        },
        "part" => Command::ChatLeave {
            channel: first?,
            message: tail,
        },
        "msg" => Command::SendIm {
            to: first?,
            text: tail?,
        },
        "notice" => Command::SendNotice {
            to: first?,
            text: tail?,
        },
        "me" => Command::Action {
            target: first?,
            text: tail?,
        },
        "topic" => Command::SetTopic {
            channel: first?,
            topic: tail.unwrap_or_default(),
        },
        "invite" => Command::ChatInvite {
            nick: first?,
            channel: tail?,
        },
        "nick" => Command::ChangeNick(first?),
        "whois" => Command::GetInfo(first?),
        "list" => Command::RoomList,
        "ping" => Command::Ping(first),
        "away" => Command::SetStatus(Status::Away(Some(args.to_string()).filter(|a| !a.is_empty()))),
        "back" => Command::SetStatus(Status::Available),
        "buddy" => Command::AddBuddy(first?),
        "unbuddy" => Command::RemoveBuddy(first?),
        "quit" => Command::Quit(Some(args.to_string()).filter(|a| !a.is_empty())),
        "quote" | "raw" => Command::Raw(args.to_string()),
        _ => {
            warn!(command = %verb, "unknown command");
            return None;
        }
    };
    Some(command)
}
