//! keepsake command line: journal against the configured store, run the
//! recap relay, and request day recaps.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use keepsake_api::relay::{serve, RelayConfig};
use keepsake_config::config::AppConfig;
use keepsake_core::entry::{encode_data_url, today_key, EntryDraft, Mood};
use keepsake_core::journal::Journal;
use keepsake_core::recap::{RecapClient, RecapOutcome};
use keepsake_sync::error::StoreError;
use keepsake_sync::store::{entry_store, EntryStore};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "keepsake", version, about = "A gratitude journal that syncs")]
struct Cli {
    /// User key the entries belong to (the identity provider's uid).
    #[arg(long, global = true, default_value = "local")]
    user: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the recap relay server.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 8710)]
        port: u16,
    },
    /// Add an entry for today, or back-fill a past day.
    Add {
        /// Entry text. May be omitted when a photo is attached.
        content: Option<String>,
        #[arg(long, default_value = "grateful")]
        mood: String,
        /// Day key to file under, e.g. 3/1/2025. Defaults to today.
        #[arg(long)]
        date: Option<String>,
        /// Attach an image file as the entry photo.
        #[arg(long)]
        photo: Option<PathBuf>,
    },
    /// Show entries for a day.
    List {
        /// Day key, defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
    /// Delete an entry by id.
    Delete { id: u64 },
    /// Generate (or locally synthesize) a recap for a day.
    Recap {
        #[arg(long)]
        date: Option<String>,
    },
    /// Show which persistence mode is active.
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("failed to load configuration")?;

    match cli.command {
        Command::Serve { host, port } => {
            let relay = RelayConfig::from_env().with_host(host).with_port(port);
            serve(relay).await
        }
        Command::Add {
            content,
            mood,
            date,
            photo,
        } => add(&config, &cli.user, content, mood, date, photo).await,
        Command::List { date } => list(&config, &cli.user, date).await,
        Command::Delete { id } => delete(&config, &cli.user, id).await,
        Command::Recap { date } => recap(&config, &cli.user, date).await,
        Command::Status => {
            status(&config);
            Ok(())
        }
    }
}

async fn load_journal(
    config: &AppConfig,
    user: &str,
) -> Result<(std::sync::Arc<dyn EntryStore>, Journal)> {
    let store = entry_store(config);
    let entries = store
        .load(user)
        .await
        .context("failed to load entries")?;
    let mut journal = Journal::new();
    journal.replace_all(entries);
    Ok((store, journal))
}

async fn add(
    config: &AppConfig,
    user: &str,
    content: Option<String>,
    mood: String,
    date: Option<String>,
    photo: Option<PathBuf>,
) -> Result<()> {
    let (store, mut journal) = load_journal(config, user).await?;

    let target = date.unwrap_or_else(today_key);
    // The three-per-day cap is a UI-trigger rule: a full day routes to the
    // day view instead of accepting a new entry. Storage itself never
    // enforces it.
    if journal.day_is_full(&target) {
        println!("{target} already holds {} entries:", journal.day_count(&target));
        print_day(&journal, &target);
        return Ok(());
    }

    let mut draft = EntryDraft {
        content: content.unwrap_or_default(),
        mood: Mood::from(mood),
        ..EntryDraft::default()
    };
    if let Some(path) = photo {
        let bytes = std::fs::read(&path)
            .with_context(|| format!("could not read photo {}", path.display()))?;
        draft.photo = Some(encode_data_url(mime_for(&path), &bytes));
    }

    let entry = journal
        .create(draft, Some(&target))
        .context("entry was empty")?
        .clone();

    match store.save(user, journal.entries(), None).await {
        Ok(()) => println!("Added entry {} to {}.", entry.id, entry.date),
        Err(StoreError::QuotaExceeded { needed, limit }) => {
            anyhow::bail!(
                "local storage is full ({needed} bytes needed, {limit} allowed). \
                 Free up space by deleting entries or avoiding large media."
            );
        }
        Err(err) if err.is_remote_failure() => {
            // Non-blocking warning: the entry exists in memory, the write
            // will be retried on the next mutation.
            eprintln!("Warning: could not sync to the remote store ({err}). Check your connection.");
        }
        Err(err) => return Err(err).context("failed to save entries"),
    }
    Ok(())
}

async fn list(config: &AppConfig, user: &str, date: Option<String>) -> Result<()> {
    let (_, journal) = load_journal(config, user).await?;
    let target = date.unwrap_or_else(today_key);
    let count = journal.day_count(&target);
    println!("{target}: {count}/{} entries", keepsake_core::journal::DAY_CAPACITY);
    print_day(&journal, &target);
    Ok(())
}

async fn delete(config: &AppConfig, user: &str, id: u64) -> Result<()> {
    let (store, mut journal) = load_journal(config, user).await?;
    journal.delete(id);
    store
        .save(user, journal.entries(), None)
        .await
        .context("failed to save entries")?;
    println!("Deleted entry {id} (if it existed).");
    Ok(())
}

async fn recap(config: &AppConfig, user: &str, date: Option<String>) -> Result<()> {
    let (_, journal) = load_journal(config, user).await?;
    let target = date.unwrap_or_else(today_key);

    let client = RecapClient::new(config.recap.relay_url.clone())
        .with_model(config.recap.model.clone())
        .with_max_tokens(config.recap.max_tokens);

    match client.generate_day_recap(&target, journal.entries()).await {
        None => println!("No entries on {target}; nothing to recap."),
        Some(RecapOutcome::Generated(text)) => println!("{text}"),
        Some(RecapOutcome::Fallback { text, reason }) => {
            println!("{text}");
            println!("\n(AI recap unavailable: {reason})");
        }
    }
    Ok(())
}

fn status(config: &AppConfig) {
    if let Some(remote) = &config.remote {
        println!("Mode: remote + local mirror (project {})", remote.project_id);
    } else {
        println!("Mode: local only (no remote backend configured)");
    }
    println!("Data dir: {}", config.local.data_dir.display());
    println!("Local quota: {} bytes", config.local.quota_bytes);
}

fn print_day(journal: &Journal, date: &str) {
    for entry in journal.entries_for_day(date) {
        let mut markers = String::new();
        if entry.photo.is_some() {
            markers.push_str(" [photo]");
        }
        if entry.audio.is_some() {
            markers.push_str(" [audio]");
        }
        println!(
            "  {} {} ({}) {}{}",
            entry.id,
            entry.time,
            entry.mood.as_str(),
            entry.content,
            markers
        );
    }
}

fn mime_for(path: &PathBuf) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}
