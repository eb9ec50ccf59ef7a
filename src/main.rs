use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::info;

use rumour::config::Config;
use rumour::db::models::{CaseSubmission, EvidenceType, FlagReason};
use rumour::harvest::Harvester;
use rumour::output::terminal;
use rumour::sources::reddit::RedditSource;
use rumour::sources::twitter::TwitterSource;
use rumour::sources::SourceAdapter;

/// Rumour: collect posts about tracked accounts and file reports about them.
///
/// Harvests recent posts from Twitter (headless browser) and Reddit (API),
/// merges them into one newest-first feed, and stores reports for review.
#[derive(Parser)]
#[command(name = "rumour", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Harvest recent posts about one or more accounts or topics
    Harvest {
        /// Accounts or topics to search for (e.g. @nasa "moon landing")
        #[arg(required = true)]
        identities: Vec<String>,

        /// Result budget per identity, split evenly across sources
        #[arg(long, default_value = "100")]
        max_results: usize,

        /// Identities to process in parallel (default: 1)
        #[arg(long, default_value = "1")]
        concurrency: usize,

        /// Write the merged feed to this JSON file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Archive the harvested posts in the database
        #[arg(long)]
        save: bool,
    },

    /// File a report about suspicious content
    Report {
        /// Platform the content lives on (e.g. Twitter, Facebook)
        #[arg(long)]
        platform: String,

        /// URL of the content
        #[arg(long)]
        url: String,

        /// Type of evidence being submitted
        #[arg(long, value_enum)]
        evidence: EvidenceArg,

        /// Screenshot or image file (for --evidence screenshot)
        #[arg(long)]
        file: Option<PathBuf>,

        /// The suspicious post text (for --evidence post-text)
        #[arg(long)]
        text: Option<String>,

        /// URL of a matching image (for --evidence image-match)
        #[arg(long)]
        image_url: Option<String>,

        /// Primary reason for flagging
        #[arg(long, value_enum)]
        reason: ReasonArg,

        /// Any additional context for reviewers
        #[arg(long)]
        notes: Option<String>,
    },

    /// List recently submitted cases
    Cases {
        #[arg(long, default_value = "20")]
        limit: u32,
    },

    /// Show which sources are configured and database stats
    Status,
}

#[derive(Clone, Copy, ValueEnum)]
enum EvidenceArg {
    Screenshot,
    PostText,
    ImageMatch,
}

impl From<EvidenceArg> for EvidenceType {
    fn from(arg: EvidenceArg) -> Self {
        match arg {
            EvidenceArg::Screenshot => EvidenceType::Screenshot,
            EvidenceArg::PostText => EvidenceType::PostText,
            EvidenceArg::ImageMatch => EvidenceType::ImageMatch,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ReasonArg {
    FakeAccount,
    ImageMisuse,
    DataLeak,
    Misinformation,
    Spam,
    Other,
}

impl From<ReasonArg> for FlagReason {
    fn from(arg: ReasonArg) -> Self {
        match arg {
            ReasonArg::FakeAccount => FlagReason::FakeAccount,
            ReasonArg::ImageMisuse => FlagReason::ImageMisuse,
            ReasonArg::DataLeak => FlagReason::DataLeak,
            ReasonArg::Misinformation => FlagReason::Misinformation,
            ReasonArg::Spam => FlagReason::Spam,
            ReasonArg::Other => FlagReason::Other,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("rumour=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Init => {
            info!("Initializing Rumour database...");
            let db = rumour::db::initialize_store(&config.db_path)?;
            let table_count = db.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nNext step: set up your .env file (Reddit credentials, CHROME_PATH).");
            println!("Then run: cargo run -- harvest @someone");
        }

        Commands::Harvest {
            identities,
            max_results,
            concurrency,
            output,
            save,
        } => {
            let sources = build_sources(&config)?;
            let pb = ProgressBar::new(identities.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  Harvesting [{bar:30}] {pos}/{len} ({eta})")
                    .context("Invalid progress bar template")?,
            );

            let harvester = Harvester::new(sources)
                .with_concurrency(concurrency)
                .with_progress(pb.clone());

            println!(
                "Harvesting {} identities ({} per source)...",
                identities.len(),
                rumour::harvest::split_budget(max_results, harvester.source_count()),
            );
            let harvest = harvester.collect(&identities, max_results).await?;
            pb.finish_and_clear();

            terminal::display_feed(&harvest.posts);
            terminal::display_warnings(&harvest);

            if let Some(path) = output {
                rumour::feed::write_feed(&path, &harvest.posts)?;
                println!("\nFeed written to {}", path.display());
            }

            if save {
                let db = rumour::db::initialize_store(&config.db_path)?;
                let written = db.save_posts(&harvest.posts).await?;
                println!("Archived {written} posts in {}", config.db_path);
            }
        }

        Commands::Report {
            platform,
            url,
            evidence,
            file,
            text,
            image_url,
            reason,
            notes,
        } => {
            let file_bytes = match file {
                Some(path) => Some(read_evidence_file(&path)?),
                None => None,
            };

            let submission = CaseSubmission {
                platform,
                url,
                evidence_type: evidence.into(),
                file_bytes,
                post_text: text,
                image_match_url: image_url,
                reason: reason.into(),
                notes,
            };
            // Check before touching the database so bad input leaves no trace
            submission.validate()?;

            let db = rumour::db::initialize_store(&config.db_path)?;
            let id = db.submit_case(&submission).await?;
            let case = db
                .get_case(id)
                .await?
                .with_context(|| format!("Case #{id} vanished after insert"))?;
            terminal::display_case_receipt(&case);
            println!(
                "\n{}",
                "Reports are reviewed within 24-48 hours.".dimmed()
            );
        }

        Commands::Cases { limit } => {
            let db = rumour::db::open_store(&config.db_path)?;
            let cases = db.recent_cases(limit).await?;
            terminal::display_cases(&cases);
        }

        Commands::Status => {
            let db = if Path::new(&config.db_path).exists() {
                Some(rumour::db::open_store(&config.db_path)?)
            } else {
                None
            };
            rumour::status::show(&config, db.as_ref()).await?;
        }
    }

    Ok(())
}

/// Twitter first, then Reddit — the order each identity is fetched in.
fn build_sources(config: &Config) -> Result<Vec<Box<dyn SourceAdapter>>> {
    let twitter = TwitterSource::chromium(config.browser_options(), config.twitter_options());
    let reddit = RedditSource::new(config.reddit_credentials(), config.reddit_options())?;
    if !reddit.is_available() {
        println!(
            "  {} Reddit credentials not set, Reddit source disabled",
            "Warning:".yellow()
        );
    }
    Ok(vec![Box::new(twitter), Box::new(reddit)])
}

fn read_evidence_file(path: &Path) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read evidence file {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if !matches!(ext.as_str(), "png" | "jpg" | "jpeg") {
        anyhow::bail!("Evidence file must be a PNG or JPEG image");
    }
    Ok(bytes)
}
