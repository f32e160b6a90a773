use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use tokio::{
    io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    sync::{mpsc, watch},
    time,
};
use tracing::{debug, error, info, warn};

use crate::{
    catalog::CatalogStore,
    document::{CatalogDocument, UpdateSource},
};

use super::protocol::{Command, Response};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Lifecycle of the admin listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Waiting for the next connection.
    Listening,
    /// Handling exactly one connection.
    Serving,
    /// Terminal; the socket is closed.
    Stopped,
}

/// Notifications for the storefront.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminEvent {
    /// A `U` command merged entries into the catalog.
    CatalogMerged {
        /// Entries merged.
        merged: usize,
    },
    /// The listener stopped accepting connections.
    Stopped,
}

/// Executes parsed commands against the catalog. Knows nothing about sockets.
#[derive(Clone)]
pub struct AdminService {
    store: CatalogStore,
    source: Arc<dyn UpdateSource>,
    events: Option<mpsc::Sender<AdminEvent>>,
}

impl AdminService {
    /// Execute commands against `store`, reading `U` updates from `source`.
    pub fn new(store: CatalogStore, source: Arc<dyn UpdateSource>) -> Self {
        Self {
            store,
            source,
            events: None,
        }
    }

    /// Forward catalog notifications to `sender`.
    pub fn with_events(mut self, sender: mpsc::Sender<AdminEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Run one command and build its response.
    pub async fn execute(&self, command: Command) -> Response {
        match command {
            Command::Update(inline) => self.update(inline).await,
            Command::Retrieve => match self.store.snapshot().into_document().to_json_string() {
                Ok(json) => Response::Dump(json),
                Err(err) => {
                    error!(?err, "Failed to serialize catalog");
                    Response::Error(format!("dump failed: {err}"))
                }
            },
            Command::Quit => Response::ShuttingDown,
            Command::Empty => Response::Error("empty command".to_string()),
            Command::Unknown(raw) => {
                warn!(command = %raw, "Unknown admin command");
                Response::Error(format!("unknown command: {raw}"))
            }
        }
    }

    async fn update(&self, inline: Option<String>) -> Response {
        let document = match inline {
            Some(text) => CatalogDocument::from_json_str(&text).map_err(anyhow::Error::from),
            None => {
                let source = Arc::clone(&self.source);
                match tokio::task::spawn_blocking(move || source.load()).await {
                    Ok(result) => result,
                    Err(err) => Err(anyhow::Error::from(err).context("update source task failed")),
                }
            }
        };

        match document {
            Ok(document) => {
                let merged = self.store.merge(document);
                self.notify(AdminEvent::CatalogMerged { merged });
                Response::Merged(merged)
            }
            Err(err) => {
                warn!(?err, "Admin update rejected");
                Response::Error(format!("update failed: {err:#}"))
            }
        }
    }

    fn notify(&self, event: AdminEvent) {
        if let Some(sender) = &self.events {
            if let Err(err) = sender.try_send(event) {
                debug!(%err, "Dropped admin event");
            }
        }
    }
}

/// Remote control for a running [`AdminServer`].
#[derive(Debug, Clone)]
pub struct AdminHandle {
    shutdown: Arc<watch::Sender<bool>>,
    state: watch::Receiver<ServerState>,
    local_addr: SocketAddr,
}

impl AdminHandle {
    /// Ask the accept loop to stop. Idempotent.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Current listener state.
    pub fn state(&self) -> ServerState {
        *self.state.borrow()
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait until the listener reaches [`ServerState::Stopped`].
    pub async fn stopped(&mut self) {
        while *self.state.borrow_and_update() != ServerState::Stopped {
            if self.state.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Single-worker TCP listener for admin commands.
///
/// Connections are served one at a time: read one line, dispatch, reply,
/// close. `Q` or [`AdminHandle::shutdown`] ends the accept loop and closes
/// the socket.
pub struct AdminServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    service: AdminService,
    read_timeout: Option<Duration>,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
    state_tx: watch::Sender<ServerState>,
    state_rx: watch::Receiver<ServerState>,
}

impl AdminServer {
    /// Bind the listener.
    pub async fn bind(addr: SocketAddr, service: AdminService) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind admin listener on {addr}"))?;
        let local_addr = listener
            .local_addr()
            .context("failed to read admin listener address")?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(ServerState::Listening);
        Ok(Self {
            listener,
            local_addr,
            service,
            read_timeout: None,
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
            state_tx,
            state_rx,
        })
    }

    /// Drop connections that send nothing within `timeout`.
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle for shutting down and observing the listener.
    pub fn handle(&self) -> AdminHandle {
        AdminHandle {
            shutdown: Arc::clone(&self.shutdown_tx),
            state: self.state_rx.clone(),
            local_addr: self.local_addr,
        }
    }

    /// Accept and serve connections until shut down.
    pub async fn run(self) -> Result<()> {
        let Self {
            listener,
            local_addr,
            service,
            read_timeout,
            shutdown_tx,
            mut shutdown_rx,
            state_tx,
            ..
        } = self;
        info!(addr = %local_addr, "Admin service listening");

        loop {
            if *shutdown_rx.borrow_and_update() {
                break;
            }

            let accepted = tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                accepted = listener.accept() => accepted,
            };

            let (stream, peer) = match accepted {
                Ok(pair) => pair,
                Err(err) => {
                    warn!(?err, "Failed to accept admin connection");
                    time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };

            state_tx.send_replace(ServerState::Serving);
            let served = tokio::select! {
                served = serve_connection(&service, stream, read_timeout) => served,
                _ = shutdown_rx.changed() => {
                    info!(%peer, "Shutdown dropped an in-flight admin connection");
                    continue;
                }
            };
            match served {
                Ok(Some(Response::ShuttingDown)) => {
                    info!(%peer, "Admin shutdown requested");
                    shutdown_tx.send_replace(true);
                }
                Ok(_) => {}
                Err(err) => warn!(%peer, ?err, "Admin connection failed"),
            }
            state_tx.send_replace(ServerState::Listening);
        }

        drop(listener);
        state_tx.send_replace(ServerState::Stopped);
        service.notify(AdminEvent::Stopped);
        info!(addr = %local_addr, "Admin service stopped");
        Ok(())
    }
}

async fn serve_connection(
    service: &AdminService,
    mut stream: TcpStream,
    io_timeout: Option<Duration>,
) -> Result<Option<Response>> {
    let (reader, mut writer) = stream.split();
    let mut reader = BufReader::new(reader);
    let mut request = Vec::new();

    let Some(read) = within(io_timeout, reader.read_until(b'\n', &mut request)).await else {
        warn!(timeout = ?io_timeout, "Admin client sent no command in time");
        write_reply(&mut writer, "ERR timed out", io_timeout).await?;
        return Ok(None);
    };
    if read.context("failed to read admin command")? == 0 {
        debug!("Admin client closed without a command");
        return Ok(None);
    }

    let response = match String::from_utf8(request) {
        Ok(line) => {
            let command = Command::parse(&line);
            debug!(?command, "Admin command received");
            service.execute(command).await
        }
        Err(_) => {
            warn!("Admin command is not valid UTF-8");
            Response::Error("command is not valid UTF-8".to_string())
        }
    };

    write_reply(&mut writer, &response.to_string(), io_timeout).await?;
    Ok(Some(response))
}

/// Write one response line and close the write half, bounded by `limit`.
async fn write_reply<W>(writer: &mut W, line: &str, limit: Option<Duration>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let send = async {
        writer.write_all(format!("{line}\n").as_bytes()).await?;
        writer.shutdown().await?;
        Ok::<_, std::io::Error>(())
    };
    match within(limit, send).await {
        Some(sent) => sent.context("failed to write admin response"),
        None => anyhow::bail!("admin client did not take the response in time"),
    }
}

async fn within<F: Future>(limit: Option<Duration>, future: F) -> Option<F::Output> {
    match limit {
        Some(limit) => time::timeout(limit, future).await.ok(),
        None => Some(future.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Item;

    struct FailingSource;

    impl UpdateSource for FailingSource {
        fn load(&self) -> Result<CatalogDocument> {
            anyhow::bail!("inventory file unavailable")
        }
    }

    struct StaticSource(CatalogDocument);

    impl UpdateSource for StaticSource {
        fn load(&self) -> Result<CatalogDocument> {
            Ok(self.0.clone())
        }
    }

    fn potion_source() -> Arc<dyn UpdateSource> {
        let potion = Item::new("Potion", "Restores health.", 5, 5).expect("valid item");
        Arc::new(StaticSource(CatalogDocument::from_items([potion])))
    }

    #[tokio::test]
    async fn update_merges_source_and_notifies() {
        let store = CatalogStore::new();
        let (tx, mut rx) = mpsc::channel(4);
        let service = AdminService::new(store.clone(), potion_source()).with_events(tx);

        assert_eq!(service.execute(Command::Update(None)).await, Response::Merged(1));
        assert_eq!(service.execute(Command::Update(None)).await, Response::Merged(1));
        assert_eq!(store.get("Potion").map(|item| item.quantity()), Some(10));
        assert_eq!(rx.recv().await, Some(AdminEvent::CatalogMerged { merged: 1 }));
    }

    #[tokio::test]
    async fn inline_update_bypasses_source() {
        let store = CatalogStore::new();
        let service = AdminService::new(store.clone(), Arc::new(FailingSource));
        let response = service
            .execute(Command::Update(Some(
                r#"{"Axe": {"price": 150, "quantity": 1}}"#.to_string(),
            )))
            .await;
        assert_eq!(response, Response::Merged(1));
        assert_eq!(store.get("Axe").map(|item| item.price()), Some(150));
    }

    #[tokio::test]
    async fn failed_update_leaves_catalog_untouched() {
        let store = CatalogStore::new();
        store.add(Item::new("Sword", "", 100, 2).expect("valid item"));
        let service = AdminService::new(store.clone(), Arc::new(FailingSource));

        let response = service.execute(Command::Update(None)).await;
        assert!(response.is_error());
        assert!(response.to_string().contains("inventory file unavailable"));

        let response = service
            .execute(Command::Update(Some(r#"{"Sword": {"quantity": -4}}"#.to_string())))
            .await;
        assert!(response.is_error());
        assert_eq!(store.get("Sword").map(|item| item.quantity()), Some(2));
    }

    #[tokio::test]
    async fn retrieve_dumps_snapshot() {
        let store = CatalogStore::new();
        store.add(Item::new("Sword", "", 100, 2).expect("valid item"));
        let service = AdminService::new(store, potion_source());
        match service.execute(Command::Retrieve).await {
            Response::Dump(json) => {
                let document = CatalogDocument::from_json_str(&json).expect("valid dump");
                assert_eq!(document.len(), 1);
            }
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_and_empty_commands_are_errors() {
        let service = AdminService::new(CatalogStore::new(), potion_source());
        assert_eq!(
            service.execute(Command::Unknown("X".to_string())).await,
            Response::Error("unknown command: X".to_string())
        );
        assert!(service.execute(Command::Empty).await.is_error());
        assert_eq!(service.execute(Command::Quit).await, Response::ShuttingDown);
    }

    #[tokio::test]
    async fn reply_to_a_client_that_never_reads_times_out() {
        let (_client, mut server_side) = tokio::io::duplex(8);
        let line = "x".repeat(1024);
        let written = write_reply(&mut server_side, &line, Some(Duration::from_millis(50))).await;
        assert!(written.is_err());
    }

    #[tokio::test]
    async fn reply_without_limit_is_written_in_full() -> Result<()> {
        let (mut client, mut server_side) = tokio::io::duplex(64);
        write_reply(&mut server_side, "OK merged 1 item(s)", None).await?;
        let mut reply = String::new();
        tokio::io::AsyncReadExt::read_to_string(&mut client, &mut reply).await?;
        assert_eq!(reply, "OK merged 1 item(s)\n");
        Ok(())
    }
}
