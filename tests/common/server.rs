//! Scripted IRC server.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadHalf, WriteHalf};
use tokio::time::timeout;

/// Server end of a duplex connection.
pub struct FakeServer {
    reader: BufReader<ReadHalf<DuplexStream>>,
    writer: WriteHalf<DuplexStream>,
}

#[allow(dead_code)]
impl FakeServer {
    pub fn new(stream: DuplexStream) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        }
    }

    /// Send one line; CRLF is appended.
    pub async fn send(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\r\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Next line from the client without its terminator.
    pub async fn recv(&mut self) -> anyhow::Result<String> {
        self.recv_timeout(Duration::from_secs(5)).await
    }

    /// Next line, or an error after `dur` or on EOF.
    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<String> {
        let mut line = String::new();
        let n = timeout(dur, self.reader.read_line(&mut line)).await??;
        if n == 0 {
            anyhow::bail!("client closed the connection");
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Receive until a line satisfies `predicate`; returns every line read.
    pub async fn recv_until<F>(&mut self, mut predicate: F) -> anyhow::Result<Vec<String>>
    where
        F: FnMut(&str) -> bool,
    {
        let mut lines = Vec::new();
        loop {
            let line = self.recv().await?;
            let done = predicate(&line);
            lines.push(line);
            if done {
                return Ok(lines);
            }
        }
    }

    /// Read until the client closes; returns the remaining lines.
    pub async fn recv_to_eof(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = self.recv().await {
            lines.push(line);
        }
        lines
    }

    /// Collect registration (everything up to and including NICK) and
    /// welcome the client.
    pub async fn accept_registration(&mut self, nick: &str) -> anyhow::Result<Vec<String>> {
        let lines = self.recv_until(|l| l.starts_with("NICK ")).await?;
        self.send(&format!(":irc.test 001 {nick} :Welcome to the test network"))
            .await?;
        self.send(&format!(":irc.test 422 {nick} :MOTD File is missing"))
            .await?;
        Ok(lines)
    }

    /// Drop the connection.
    pub fn hang_up(self) {}
}
