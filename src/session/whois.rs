//! WHOIS reply accumulator.

use chrono::DateTime;

/// Fields gathered between a WHOIS request and its end reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhoisInfo {
    /// Nick being queried; `None` when no WHOIS is pending.
    pub nick: Option<String>,
    pub away: Option<String>,
    pub ident: Option<String>,
    pub host: Option<String>,
    pub real: Option<String>,
    pub login: Option<String>,
    pub server: Option<String>,
    pub serverinfo: Option<String>,
    pub channels: Option<String>,
    pub ircop: bool,
    pub identified: bool,
    pub idle: u64,
    pub signon: i64,
}

impl WhoisInfo {
    /// Start collecting for `nick`, dropping anything pending.
    pub fn begin(&mut self, nick: &str) {
        *self = Self {
            nick: Some(nick.to_string()),
            ..Self::default()
        };
    }

    /// Whether replies for `nick` are expected.
    pub fn is_for(&self, nick: &str) -> bool {
        self.nick
            .as_deref()
            .is_some_and(|pending| purple_proto::irc_eq(pending, nick))
    }

    /// Label/value pairs for display, in a fixed order.
    pub fn fields(&self, nick: &str) -> Vec<(String, String)> {
        let mut fields = Vec::new();
        let mut shown = nick.to_string();
        if self.ircop {
            shown.push_str(" (ircop)");
        }
        if self.identified {
            shown.push_str(" (identified)");
        }
        fields.push(("Nick".to_string(), shown));

        let mut push = |label: &str, value: &Option<String>| {
            if let Some(value) = value {
                fields.push((label.to_string(), value.clone()));
            }
        };
        push("Away", &self.away);
        push("Real name", &self.real);
        push("Login name", &self.login);
        push("Ident name", &self.ident);
        push("Host name", &self.host);

        if let Some(server) = &self.server {
            let info = self.serverinfo.as_deref().unwrap_or("");
            fields.push(("Server".to_string(), format!("{server} ({info})")));
        }
        if let Some(channels) = &self.channels {
            fields.push(("Currently on".to_string(), channels.clone()));
        }
        if self.idle > 0 {
            fields.push(("Idle for".to_string(), seconds_to_string(self.idle)));
            let since = DateTime::from_timestamp(self.signon, 0)
                .map(|t| t.format("%c").to_string())
                .unwrap_or_default();
            fields.push(("Online since".to_string(), since));
        }
        fields
    }
}

/// Human readable duration: "1 day, 2 hours, 5 minutes".
pub fn seconds_to_string(secs: u64) -> String {
    if secs < 60 {
        return plural(secs, "second");
    }

    let days = secs / 86_400;
    let hours = secs % 86_400 / 3_600;
    let minutes = secs % 3_600 / 60;

    let parts: Vec<String> = [(days, "day"), (hours, "hour"), (minutes, "minute")]
        .into_iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| plural(n, unit))
        .collect();
    parts.join(", ")
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(seconds_to_string(1), "1 second");
        assert_eq!(seconds_to_string(59), "59 seconds");
        assert_eq!(seconds_to_string(3_660), "1 hour, 1 minute");
        assert_eq!(seconds_to_string(2 * 86_400 + 120), "2 days, 2 minutes");
    }

    #[test]
    fn field_order() {
        let mut whois = WhoisInfo::default();
        whois.begin("Bob");
        whois.ircop = true;
        whois.real = Some("Bob B".into());
        whois.server = Some("irc.example.net".into());
        whois.serverinfo = Some("Example".into());

        let fields = whois.fields("Bob");
        assert_eq!(fields[0], ("Nick".into(), "Bob (ircop)".into()));
        assert_eq!(fields[1], ("Real name".into(), "Bob B".into()));
        assert_eq!(fields[2], ("Server".into(), "irc.example.net (Example)".into()));
        assert!(whois.is_for("bob"));
    }
}
