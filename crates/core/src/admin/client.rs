use std::{net::SocketAddr, time::Duration};

use anyhow::{Context, Result};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time,
};

use super::protocol::Command;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends one admin command per connection.
#[derive(Debug, Clone)]
pub struct AdminClient {
    addr: SocketAddr,
    timeout: Duration,
}

impl AdminClient {
    /// Client for the admin service at `addr`.
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Limit how long a single exchange may take.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Address requests are sent to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Send a structured command.
    pub async fn execute(&self, command: &Command) -> Result<String> {
        self.send(&command.to_line()).await
    }

    /// Connect, write `line`, and read the full response until the server closes.
    pub async fn send(&self, line: &str) -> Result<String> {
        time::timeout(self.timeout, self.exchange(line))
            .await
            .with_context(|| format!("admin request to {} timed out", self.addr))?
    }

    async fn exchange(&self, line: &str) -> Result<String> {
        let mut stream = TcpStream::connect(self.addr)
            .await
            .with_context(|| format!("failed to connect to admin service at {}", self.addr))?;
        stream
            .write_all(format!("{}\n", line.trim_end()).as_bytes())
            .await
            .context("failed to send admin command")?;

        let mut response = String::new();
        stream
            .read_to_string(&mut response)
            .await
            .context("failed to read admin response")?;
        Ok(response.trim_end().to_string())
    }
}
