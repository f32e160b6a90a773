use std::{fs, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Result;
use armory_core::{
    AdminClient, AdminEvent, AdminHandle, AdminServer, AdminService, CatalogDocument,
    CatalogStore, FileUpdateSource, Item, ServerState,
};
use tempfile::TempDir;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    sync::mpsc,
    task::JoinHandle,
};

struct TestServer {
    store: CatalogStore,
    handle: AdminHandle,
    client: AdminClient,
    task: Option<JoinHandle<Result<()>>>,
    update_path: std::path::PathBuf,
    _dir: TempDir,
}

impl TestServer {
    async fn spawn(store: CatalogStore, read_timeout: Option<Duration>) -> Result<Self> {
        Self::spawn_with_events(store, read_timeout, None).await
    }

    async fn spawn_with_events(
        store: CatalogStore,
        read_timeout: Option<Duration>,
        events: Option<mpsc::Sender<AdminEvent>>,
    ) -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let update_path = dir.path().join("inventory.json");
        let mut service =
            AdminService::new(store.clone(), Arc::new(FileUpdateSource::new(&update_path)));
        if let Some(events) = events {
            service = service.with_events(events);
        }

        let addr: SocketAddr = "127.0.0.1:0".parse()?;
        let server = AdminServer::bind(addr, service)
            .await?
            .with_read_timeout(read_timeout);
        let handle = server.handle();
        let client = AdminClient::new(server.local_addr()).with_timeout(Duration::from_secs(5));
        let task = tokio::spawn(server.run());

        Ok(Self {
            store,
            handle,
            client,
            task: Some(task),
            update_path,
            _dir: dir,
        })
    }

    fn write_update(&self, json: &str) -> Result<()> {
        fs::write(&self.update_path, json)?;
        Ok(())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.shutdown();
    }
}

#[tokio::test]
async fn update_then_retrieve_shows_merged_item() -> Result<()> {
    let server = TestServer::spawn(CatalogStore::new(), None).await?;
    server.write_update(r#"{"Potion": {"name": "Potion", "description": "Heals.", "price": 5, "quantity": 5}}"#)?;

    let reply = server.client.send("U").await?;
    assert_eq!(reply, "OK merged 1 item(s)");

    let dump = server.client.send("R").await?;
    let document = CatalogDocument::from_json_str(&dump)?;
    assert_eq!(document.len(), 1);
    let potion = &document.items()[0];
    assert_eq!(potion.name(), "Potion");
    assert_eq!(potion.quantity(), 5);
    assert_eq!(server.store.get("Potion").map(|item| item.quantity()), Some(5));
    Ok(())
}

#[tokio::test]
async fn inline_update_and_dump_reload_doubles_quantities() -> Result<()> {
    let store = CatalogStore::new();
    store.add(Item::new("Sword", "A long blade.", 100, 2)?);
    store.add(Item::new("Boots", "Covers the shins.", 100, 5)?);
    let server = TestServer::spawn(store, None).await?;

    let dump = server.client.send("R").await?;
    let reply = server.client.send(&format!("U {dump}")).await?;
    assert_eq!(reply, "OK merged 2 item(s)");

    assert_eq!(server.store.get("Sword").map(|item| item.quantity()), Some(4));
    assert_eq!(server.store.get("Boots").map(|item| item.quantity()), Some(10));
    assert_eq!(server.store.get("Sword").map(|item| item.price()), Some(100));
    Ok(())
}

#[tokio::test]
async fn unknown_command_keeps_server_running() -> Result<()> {
    let server = TestServer::spawn(CatalogStore::new(), None).await?;

    assert_eq!(server.client.send("X").await?, "ERR unknown command: X");
    assert!(server.client.send("U").await?.starts_with("ERR update failed"));
    assert_eq!(server.client.send("R").await?, "{}");
    assert_ne!(server.handle.state(), ServerState::Stopped);
    Ok(())
}

#[tokio::test]
async fn quit_stops_listener() -> Result<()> {
    let (tx, mut rx) = mpsc::channel(8);
    let server = TestServer::spawn_with_events(CatalogStore::new(), None, Some(tx)).await?;
    let addr = server.client.addr();

    assert_eq!(server.client.send("Q").await?, "OK shutting down");

    let mut handle = server.handle.clone();
    tokio::time::timeout(Duration::from_secs(5), handle.stopped()).await?;
    assert_eq!(handle.state(), ServerState::Stopped);
    assert_eq!(rx.recv().await, Some(AdminEvent::Stopped));

    assert!(TcpStream::connect(addr).await.is_err());
    Ok(())
}

#[tokio::test]
async fn external_shutdown_ends_accept_loop() -> Result<()> {
    let mut server = TestServer::spawn(CatalogStore::new(), None).await?;
    server.handle.shutdown();

    let task = server.task.take().expect("server task");
    tokio::time::timeout(Duration::from_secs(5), task).await???;
    assert_eq!(server.handle.state(), ServerState::Stopped);
    Ok(())
}

#[tokio::test]
async fn silent_client_is_dropped_after_timeout() -> Result<()> {
    let server = TestServer::spawn(CatalogStore::new(), Some(Duration::from_millis(100))).await?;

    let mut silent = TcpStream::connect(server.client.addr()).await?;
    let mut reply = String::new();
    tokio::time::timeout(Duration::from_secs(5), silent.read_to_string(&mut reply)).await??;
    assert_eq!(reply.trim_end(), "ERR timed out");

    assert_eq!(server.client.send("R").await?, "{}");
    Ok(())
}

#[tokio::test]
async fn storefront_scenario_over_both_paths() -> Result<()> {
    use armory_core::{Cart, TransactionCoordinator};

    let store = CatalogStore::new();
    store.add(Item::new("Sword", "A long blade.", 100, 2)?);
    let server = TestServer::spawn(store.clone(), None).await?;
    let coordinator = TransactionCoordinator::new(store);

    let mut cart = Cart::new();
    coordinator.stage(&mut cart, "Sword", 2)?;
    coordinator.sale(&cart);
    assert_eq!(server.client.send("R").await?, "{}");

    coordinator.cancel(&cart);
    let document = CatalogDocument::from_json_str(&server.client.send("R").await?)?;
    assert_eq!(document.items()[0].name(), "Sword");
    assert_eq!(document.items()[0].quantity(), 2);
    assert_eq!(document.items()[0].price(), 0);
    Ok(())
}

#[tokio::test]
async fn shutdown_interrupts_connection_in_flight() -> Result<()> {
    let mut server = TestServer::spawn(CatalogStore::new(), None).await?;

    let mut silent = TcpStream::connect(server.client.addr()).await?;
    tokio::time::timeout(Duration::from_secs(5), async {
        while server.handle.state() != ServerState::Serving {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await?;

    server.handle.shutdown();
    let task = server.task.take().expect("server task");
    tokio::time::timeout(Duration::from_secs(3), task).await???;
    assert_eq!(server.handle.state(), ServerState::Stopped);

    let mut reply = String::new();
    let _ = tokio::time::timeout(Duration::from_secs(5), silent.read_to_string(&mut reply)).await;
    assert!(reply.is_empty());
    Ok(())
}

#[tokio::test]
async fn non_utf8_command_gets_error_reply() -> Result<()> {
    let server = TestServer::spawn(CatalogStore::new(), None).await?;

    let mut stream = TcpStream::connect(server.client.addr()).await?;
    stream.write_all(&[0xff, 0xfe, b'\n']).await?;
    let mut reply = String::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_string(&mut reply)).await??;
    assert_eq!(reply.trim_end(), "ERR command is not valid UTF-8");

    assert_eq!(server.client.send("R").await?, "{}");
    Ok(())
}
