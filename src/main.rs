use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use feedsift::feed::FeedRef;
use feedsift::search::SearchResult;
use feedsift::util::{excerpt, strip_control_chars, validate_feed_url};
use feedsift::{Config, Database, DatabaseError, Engine, SearchRequest, ValidationReport};

/// Get the config directory path (~/.config/feedsift/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let config_dir = PathBuf::from(home).join(".config").join("feedsift");
    Ok(config_dir)
}

#[derive(Parser, Debug)]
#[command(
    name = "feedsift",
    version,
    about = "Search RSS and Atom feeds by keyword"
)]
struct Args {
    /// Config file (default: ~/.config/feedsift/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Feed database (overrides database_path from the config file)
    #[arg(long, global = true, value_name = "FILE")]
    db: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch every registered feed and search the entries
    Search {
        /// Keywords separated by commas or newlines
        keywords: String,

        /// Fields to search: title, description or both
        #[arg(long, default_value = "both")]
        field: String,

        /// Keyword combination: any or all
        #[arg(long, default_value = "any")]
        mode: String,

        /// Maximum number of results (0 = unlimited)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        max_results: i64,
    },

    /// Check whether a URL serves a readable RSS or Atom feed
    Validate {
        url: String,
    },

    /// Manage registered feeds
    Feeds {
        #[command(subcommand)]
        action: FeedsAction,
    },
}

#[derive(Subcommand, Debug)]
enum FeedsAction {
    /// Register a feed URL
    Add {
        url: String,

        /// Store the URL without fetching it first
        #[arg(long)]
        skip_probe: bool,
    },
    /// List registered feeds
    List,
    /// Unregister a feed by id
    Remove {
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean for results
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let engine = Engine::from_config(&config).context("Failed to create HTTP client")?;

    match args.command {
        Command::Validate { ref url } => {
            let url = validate_feed_url(url, config.allow_private_networks)
                .with_context(|| format!("Invalid feed URL: {}", url))?;
            let report = engine.validate(&FeedRef::new(0, url.as_str())).await;
            print_report(&report, args.json)?;
            if !report.valid {
                std::process::exit(1);
            }
        }
        Command::Search {
            ref keywords,
            ref field,
            ref mode,
            max_results,
        } => {
            let request = SearchRequest {
                keywords: keywords.clone(),
                field: field.clone(),
                mode: mode.clone(),
                max_results,
            };
            let db = open_database(&args, &config, &config_dir).await?;
            let feeds: Vec<FeedRef> = db
                .list_feeds()
                .await
                .context("Failed to load feeds")?
                .into_iter()
                .map(FeedRef::from)
                .collect();
            if feeds.is_empty() {
                anyhow::bail!("No feeds configured. Add one with: feedsift feeds add <URL>");
            }

            let result = engine.search_request(&feeds, &request).await?;
            print_search(&result, config.excerpt_chars, args.json)?;
        }
        Command::Feeds { ref action } => {
            let db = open_database(&args, &config, &config_dir).await?;
            match action {
                FeedsAction::Add { url, skip_probe } => {
                    let url = validate_feed_url(url, config.allow_private_networks)
                        .with_context(|| format!("Invalid feed URL: {}", url))?;

                    if !skip_probe {
                        let report = engine.validate(&FeedRef::new(0, url.as_str())).await;
                        if let Some(failure) = &report.failure {
                            anyhow::bail!(
                                "{} is not a usable feed ({}): {}. Use --skip-probe to add it anyway.",
                                url,
                                failure.kind,
                                failure.message
                            );
                        }
                    }

                    let feed = match db.add_feed(url.as_str()).await {
                        Ok(feed) => feed,
                        Err(DatabaseError::Duplicate(url)) => {
                            anyhow::bail!("Feed is already registered: {}", url)
                        }
                        Err(e) => return Err(e).context("Failed to add feed"),
                    };

                    if args.json {
                        println!("{}", serde_json::to_string_pretty(&feed)?);
                    } else {
                        println!("Added feed {}: {}", feed.id, feed.url);
                    }
                }
                FeedsAction::List => {
                    let feeds = db.list_feeds().await.context("Failed to load feeds")?;
                    if args.json {
                        println!("{}", serde_json::to_string_pretty(&feeds)?);
                    } else if feeds.is_empty() {
                        println!("No feeds configured.");
                    } else {
                        for feed in &feeds {
                            println!("{:>4}  {}", feed.id, feed.url);
                        }
                    }
                }
                FeedsAction::Remove { id } => {
                    db.remove_feed(*id).await.context("Failed to remove feed")?;
                    if !args.json {
                        println!("Removed feed {}", id);
                    }
                }
            }
        }
    }

    Ok(())
}

/// Opens the feed store, creating ~/.config/feedsift/ when the default path is used.
async fn open_database(args: &Args, config: &Config, config_dir: &std::path::Path) -> Result<Database> {
    let db_path = match args.db.clone().or_else(|| config.database_path.clone()) {
        Some(path) => path,
        None => {
            if !config_dir.exists() {
                std::fs::create_dir_all(config_dir)
                    .context("Failed to create config directory")?;
            }

            // SEC-007: Set directory permissions on Unix (user-only access)
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let perms = std::fs::Permissions::from_mode(0o700);
                if let Err(e) = std::fs::set_permissions(config_dir, perms) {
                    tracing::warn!(
                        path = %config_dir.display(),
                        error = %e,
                        "Failed to set config directory permissions to 0700"
                    );
                }
            }

            config_dir.join("feeds.db")
        }
    };

    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;

    match Database::open(db_path_str).await {
        Ok(db) => Ok(db),
        Err(DatabaseError::InstanceLocked) => {
            eprintln!("Error: {}", DatabaseError::InstanceLocked);
            std::process::exit(1);
        }
        Err(e) => Err(anyhow::anyhow!("Failed to open database: {}", e)),
    }
}

fn print_search(result: &SearchResult, excerpt_chars: usize, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    for entry in &result.entries {
        let date = entry
            .published
            .map(|d| d.format("%b %d, %Y").to_string())
            .unwrap_or_default();
        let host = entry.source_host().unwrap_or_default();

        println!("{}", strip_control_chars(&entry.title));
        println!("  {}  {}", host, date);
        if !entry.link.is_empty() {
            println!("  {}", entry.link);
        }
        let summary = strip_control_chars(&entry.description);
        let summary = excerpt(&summary, excerpt_chars);
        if !summary.is_empty() {
            println!("  {}", summary);
        }
        println!();
    }

    println!(
        "{} of {} matches from {} feeds",
        result.entries.len(),
        result.total_matches,
        result.total_feeds
    );
    for failure in &result.failed_feeds {
        eprintln!(
            "Warning: {} failed ({}): {}",
            failure.feed.url, failure.kind, failure.message
        );
    }
    Ok(())
}

fn print_report(report: &ValidationReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    match (&report.failure, report.format) {
        (Some(failure), _) => {
            println!("{}: invalid ({})", report.feed.url, failure.kind);
            println!("  {}", failure.message);
        }
        (None, format) => {
            let format = format.map(|f| f.to_string()).unwrap_or_default();
            println!("{}: valid {} feed", report.feed.url, format);
            if let Some(title) = &report.feed_title {
                println!("  Title: {}", strip_control_chars(title));
            }
            if let Some(description) = &report.feed_description {
                println!("  Description: {}", strip_control_chars(description));
            }
            println!("  Entries: {}", report.entry_count);
            if let Some(first) = &report.first_entry_title {
                println!("  Latest: {}", strip_control_chars(first));
            }
        }
    }
    Ok(())
}
