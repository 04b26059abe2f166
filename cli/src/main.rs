use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use wallet_monitor_core::display;
use wallet_monitor_core::{
    ClientConfig, MonitorService, RecordId, Severity, TxType, WalletDraft,
};

#[derive(Parser)]
#[command(name = "wallet-monitor", about = "Watch wallet activity on a monitoring backend", version)]
struct Cli {
    /// Backend base URL
    #[arg(long, env = "WALLET_MONITOR_API_URL", default_value = wallet_monitor_core::config::DEFAULT_BASE_URL)]
    api_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = wallet_monitor_core::config::DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// List tracked wallets
    Wallets,
    /// Track a new wallet
    Add {
        address: String,
        /// Display name (defaults to the address)
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value = "")]
        note: String,
    },
    /// Edit a tracked wallet
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
    /// Stop tracking a wallet
    Remove {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Import wallets from a `name,address,note` file, or `-` for stdin
    Import { source: String },
    /// Show one page of the transaction feed
    Feed {
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        size: Option<u32>,
    },
    /// Most recent buys or sells on the first feed page
    Recent {
        side: TxType,
        #[arg(long, default_value_t = wallet_monitor_core::aggregate::RECENT_LIMIT)]
        limit: usize,
    },
    /// Top tokens by most recent activity
    Tokens { side: TxType },
    /// Transactions for a single token
    Token { symbol: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let mut config = ClientConfig::default()
        .with_base_url(cli.api_url.as_str())
        .with_timeout_secs(cli.timeout);
    if let Cmd::Feed { size: Some(size), .. } = &cli.command {
        config.default_page_size = *size;
    }
    log::debug!("using backend {}", config.base_url);
    let service = MonitorService::connect(config)?;

    let result = run(&cli, &service).await;

    // Components post their own outcome; surface it before any bare error.
    if let Some(note) = service.dismiss_notification() {
        match note.kind {
            Severity::Success => eprintln!("{}", note.message),
            Severity::Warning => eprintln!("Warning: {}", note.message),
            Severity::Error => {
                eprintln!("Error: {}", note.message);
                std::process::exit(1);
            }
        }
    }
    result
}

async fn run(cli: &Cli, service: &MonitorService) -> Result<()> {
    match &cli.command {
        Cmd::Wallets => {
            let wallets = service.registry().list().await?;
            if cli.json {
                print_json(&serde_json::to_value(&wallets)?);
            } else {
                println!("{}", display::format_wallets(&wallets));
            }
        }
        Cmd::Add {
            address,
            name,
            note,
        } => {
            let name = name.clone().unwrap_or_else(|| address.clone());
            let wallet = service
                .registry()
                .create(&WalletDraft::new(name, address.as_str(), note.as_str()))
                .await?;
            if cli.json {
                print_json(&serde_json::to_value(&wallet)?);
            } else {
                println!("{}", display::format_wallets(std::slice::from_ref(&wallet)));
            }
        }
        Cmd::Edit {
            id,
            name,
            address,
            note,
        } => {
            let id = RecordId::from(id.as_str());
            service.registry().list().await?;
            let Some(current) = service.registry().get(&id) else {
                bail!("No wallet with id {id}");
            };
            let mut draft = WalletDraft::from(&current);
            if let Some(name) = name {
                draft.name = name.clone();
            }
            if let Some(address) = address {
                draft.address = address.clone();
            }
            if let Some(note) = note {
                draft.note = note.clone();
            }
            let wallet = service.registry().update(&id, &draft).await?;
            if cli.json {
                print_json(&serde_json::to_value(&wallet)?);
            }
        }
        Cmd::Remove { id, yes } => {
            let id = RecordId::from(id.as_str());
            service.registry().list().await?;
            let Some(wallet) = service.registry().get(&id) else {
                bail!("No wallet with id {id}");
            };
            let token = service.registry().request_delete(&id);
            let prompt = format!("Stop tracking {} ({})?", wallet.name, wallet.address);
            if !yes && !prompt_confirm(&prompt) {
                service.registry().cancel_delete(&token);
                println!("Cancelled.");
                return Ok(());
            }
            service.registry().confirm_delete(&token).await?;
        }
        Cmd::Import { source } => {
            let importer = service.importer();
            if source == "-" {
                let mut text = String::new();
                std::io::stdin()
                    .read_to_string(&mut text)
                    .context("Failed to read import data from stdin")?;
                importer.set_text(text);
            } else {
                importer.load_file(&PathBuf::from(source)).await?;
            }
            let summary = importer.submit().await?;
            if cli.json {
                print_json(&serde_json::to_value(summary.result)?);
            }
        }
        Cmd::Feed { page, .. } => {
            if *page == 0 {
                bail!("Pages are numbered from 1");
            }
            let feed = service.feed();
            if *page == 1 {
                feed.refresh().await?;
            } else {
                feed.set_page(page - 1).await?;
            }
            let state = feed.state();
            if cli.json {
                print_json(&display::page_json(&state));
            } else {
                println!("{}", display::format_page(&state));
            }
        }
        Cmd::Recent { side, limit } => {
            service.feed().refresh().await?;
            let recent = service.feed().recent(*side, *limit);
            if cli.json {
                print_json(&serde_json::to_value(&recent)?);
            } else if recent.is_empty() {
                println!("No recent {side}s.");
            } else {
                for tx in &recent {
                    println!("{}", display::format_transaction(tx));
                }
            }
        }
        Cmd::Tokens { side } => {
            service.feed().refresh().await?;
            let slots = service.feed().token_summary(*side);
            if cli.json {
                print_json(&display::token_summary_json(&slots));
            } else {
                let title = match side {
                    TxType::Buy => "Top tokens bought",
                    TxType::Sell => "Top tokens sold",
                };
                println!("{}", display::format_token_summary(title, &slots));
            }
        }
        Cmd::Token { symbol } => {
            service.feed().refresh().await?;
            let txs = service.feed().token_transactions(symbol);
            if cli.json {
                print_json(&serde_json::to_value(&txs)?);
            } else {
                println!("{}", display::format_token_transactions(symbol, &txs));
            }
        }
    }
    Ok(())
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to encode output: {e}"),
    }
}

fn prompt_confirm(prompt: &str) -> bool {
    print!("{prompt} [y/N]: ");
    std::io::stdout().flush().ok();
    let mut input = String::new();
    std::io::stdin().read_line(&mut input).is_ok() && input.trim().eq_ignore_ascii_case("y")
}
