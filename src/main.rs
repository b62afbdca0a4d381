//! # toolchat
//!
//! `toolchat serve` runs the chat server; `toolchat chat` is a line-oriented
//! terminal client for it.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use toolchat_client::{ChatClient, ClientError};
use toolchat_core::messages::{ChatMessage, MessageKind, Sender};
use toolchat_server::ServerConfig;
use toolchat_settings::{ChatSettings, load_settings_from_path, settings_path};
use toolchat_tools::ToolExecutor;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "toolchat", version, about = "Demo chatbot server and terminal client")]
struct Cli {
    /// Settings file (defaults to `~/.toolchat/settings.json`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the server until Ctrl-C.
    Serve {
        /// Host to bind (overrides settings).
        #[arg(long)]
        host: Option<String>,

        /// Port to bind, 0 for auto-assign (overrides settings).
        #[arg(long)]
        port: Option<u16>,
    },
    /// Chat with a running server.
    Chat {
        /// Server base URL (defaults to the configured host and port).
        #[arg(long)]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let path = cli.config.clone().unwrap_or_else(settings_path);
    let settings = load_settings_from_path(&path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;
    toolchat_logging::init_subscriber(&settings.logging.level, settings.logging.format);

    match cli.command {
        Command::Serve { host, port } => serve(settings, host, port).await,
        Command::Chat { url } => {
            let url = url.unwrap_or_else(|| {
                format!("http://{}:{}", settings.server.host, settings.server.port)
            });
            chat(url).await
        }
    }
}

async fn serve(settings: ChatSettings, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = ServerConfig::from_settings(&settings);
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    let tools = Arc::new(ToolExecutor::new(&settings.tools));
    let handle = toolchat_server::start(config, tools)
        .await
        .context("Failed to start server")?;
    info!(url = %handle.url(), "listening");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    handle.shutdown().await;
    Ok(())
}

async fn chat(url: String) -> Result<()> {
    let client = ChatClient::new(url);
    let mut updates = client.subscribe();

    client
        .connect()
        .await
        .with_context(|| format!("Failed to connect to {}", client.base_url()))?;
    println!("Connected to {}. Type /clear to clear, /quit to exit.", client.base_url());

    let printer = tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(message) if message.sender() != Sender::User => println!("{}", render(&message)),
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "" => {}
            "/quit" | "/exit" => break,
            "/clear" => {
                client.clear();
                println!("(transcript cleared)");
            }
            text => match client.send_message(text).await {
                Ok(_) | Err(ClientError::Busy | ClientError::NotConnected) => {}
                Err(e) => tracing::debug!(error = %e, "send failed"),
            },
        }
    }

    printer.abort();
    client.disconnect().await.context("Failed to disconnect cleanly")?;
    Ok(())
}

fn render(message: &ChatMessage) -> String {
    match message.kind() {
        MessageKind::Error => format!("! {}", message.content()),
        MessageKind::ToolResult => format!("= {}", message.content()),
        MessageKind::Text => message.content().to_owned(),
    }
}
