use anyhow::Result;
use armory_core::{
    admin::{AdminClient, Command},
    config::{self, AppConfig},
};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

const MENU: &str = "\
Armory admin console
  U          merge the configured inventory file into the catalog
  U <json>   merge an inline catalog document
  R          print the current catalog as JSON
  Q          stop the admin service and exit
";

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    let addr = config.admin.socket_addr()?;
    let client = AdminClient::new(addr);

    let mut stdout = io::stdout();
    stdout.write_all(MENU.as_bytes()).await?;
    stdout
        .write_all(format!("Connected to {addr}\n").as_bytes())
        .await?;

    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            debug!("Console input closed");
            break;
        };
        let command = Command::parse(&line);
        if command == Command::Empty {
            continue;
        }

        let reply = match client.execute(&command).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(?err, "Admin request failed");
                format!("ERR {err:#}")
            }
        };
        stdout.write_all(format!("{reply}\n").as_bytes()).await?;

        if command == Command::Quit {
            break;
        }
    }

    Ok(())
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();
}
