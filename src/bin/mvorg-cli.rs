use clap::{Parser, Subcommand, ValueEnum};
use mvorg::{clean_filename, Config, Library, OrganizeOutcome};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mvorg-cli")]
#[command(about = "CLI for mvorg - music video library organizer", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, env = "MVORG_CONFIG")]
    config: Option<PathBuf>,

    /// Library root (overrides the config file)
    #[arg(long)]
    library: Option<PathBuf>,

    /// Downloads directory (overrides the config file)
    #[arg(long)]
    downloads: Option<PathBuf>,

    /// Database URL (overrides the config file)
    #[arg(long)]
    database: Option<String>,

    /// IMVDb application key (can also be set via IMVDB_APP_KEY env var)
    #[arg(long, env = "IMVDB_APP_KEY")]
    app_key: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the IMVDb catalog
    Search {
        /// Search query
        query: String,

        /// Type of content to search
        #[arg(short, long, value_enum, default_value_t = SearchType::Video)]
        r#type: SearchType,

        /// Limit results
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
    },
    /// Download a catalog video by IMVDb ID and file it into the library
    Import {
        /// IMVDb video ID
        id: String,
    },
    /// Download a video from a URL into the downloads directory
    Download {
        /// Media URL
        url: String,

        /// Artist name
        #[arg(short, long)]
        artist: String,

        /// Song title
        #[arg(short, long)]
        title: String,
    },
    /// Move downloaded videos into artist folders
    Organize {
        /// Show what would happen without moving anything
        #[arg(long)]
        dry_run: bool,

        /// Organize a single file instead of the whole downloads directory
        file: Option<PathBuf>,
    },
    /// Show library and backlog counts
    Status,
    /// Preview how file names would be cleaned
    Clean {
        /// File names to clean
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Manage the database schema
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum SearchType {
    Video,
    Artist,
}

#[derive(Subcommand)]
enum MigrateAction {
    /// List applied and pending migrations
    Status,
    /// Apply pending migrations
    Run,
    /// Roll back a version and everything applied after it
    Rollback {
        /// Version to roll back to (inclusive)
        version: String,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "mvorg=debug" } else { "mvorg=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = Config::load_or_default(cli.config.as_deref())?;
    if let Some(library) = &cli.library {
        config.library_dir = library.clone();
    }
    if let Some(downloads) = &cli.downloads {
        config.downloads_dir = downloads.clone();
    }
    if let Some(database) = &cli.database {
        config.database_url = database.clone();
    }
    if cli.app_key.is_some() {
        config.imvdb_app_key = cli.app_key.clone();
    }
    Ok(config)
}

fn print_outcome(outcome: &OrganizeOutcome, dry_run: bool) {
    let prefix = if dry_run { "[dry run] " } else { "" };
    match outcome {
        OrganizeOutcome::Moved { from, to, .. } => {
            println!("✅ {}{} -> {}", prefix, from.display(), to.display())
        }
        OrganizeOutcome::Duplicate {
            path,
            existing,
            removed,
        } => println!(
            "♻️  {}Duplicate of {}: {}{}",
            prefix,
            existing.display(),
            path.display(),
            if *removed { " (removed)" } else { "" }
        ),
        OrganizeOutcome::AlreadyOrganized { path } => {
            println!("✔️  Already organized: {}", path.display())
        }
        OrganizeOutcome::Unprocessed { path, reason } => {
            println!("⚠️  Left in place: {} ({})", path.display(), reason)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Cleaning names needs no configuration.
    if let Commands::Clean { names } = &cli.command {
        for name in names {
            match clean_filename(name) {
                Ok(cleaned) => {
                    println!("✅ {} -> {}", name, cleaned.file_name());
                    if let Some(year) = cleaned.year {
                        println!("   Year: {}", year);
                    }
                }
                Err(e) => println!("⚠️  {}: {}", name, e),
            }
        }
        return Ok(());
    }

    let config = load_config(&cli)?;
    let mut library = Library::new(config)?;

    match &cli.command {
        Commands::Search {
            query,
            r#type,
            limit,
        } => match r#type {
            SearchType::Video => {
                let videos = library.search_videos(query, *limit).await?;
                println!("Found {} videos:", videos.len());
                for video in videos {
                    println!(
                        "- {} - {} ({}) [ID: {}]",
                        video.artists_string(", "),
                        video.title,
                        video.year.map(|y| y.to_string()).unwrap_or_else(|| "?".into()),
                        video.imvdb_id().unwrap_or("?")
                    );
                }
            }
            SearchType::Artist => {
                let artists = library.search_artists(query, *limit).await?;
                println!("Found {} artists:", artists.len());
                for artist in artists {
                    println!(
                        "- {} ({} videos) [ID: {}]",
                        artist.name,
                        artist.video_count,
                        artist.imvdb_id().unwrap_or("?")
                    );
                }
            }
        },
        Commands::Import { id } => {
            println!("Importing video {}...", id);
            let result = library.import_video(id).await?;
            println!(
                "✅ Downloaded: {} ({} bytes)",
                result.download.path.display(),
                result.download.size
            );
            print_outcome(&result.outcome, false);
        }
        Commands::Download { url, artist, title } => {
            let result = library.download_url(url, artist, title).await?;
            println!("✅ Downloaded: {} - {}", result.artist, result.title);
            println!("   Path: {}", result.path.display());
        }
        Commands::Organize { dry_run, file } => {
            library.set_dry_run(*dry_run);
            match file {
                Some(file) => {
                    let outcome = library.organize_file(file)?;
                    print_outcome(&outcome, *dry_run);
                }
                None => {
                    let report = library.organize_all()?;
                    let prefix = if *dry_run { "[dry run] " } else { "" };
                    for (from, to) in &report.organized {
                        println!("✅ {}{} -> {}", prefix, from.display(), to.display());
                    }
                    println!(
                        "Organized: {}, duplicates: {}, unprocessed: {}, failed: {}",
                        report.organized.len(),
                        report.duplicates.len(),
                        report.unprocessed.len(),
                        report.failed.len()
                    );
                    for (path, reason) in report.unprocessed.iter().chain(report.failed.iter()) {
                        println!("   - {}: {}", path.display(), reason);
                    }
                }
            }
        }
        Commands::Status => {
            let status = library.organization_status()?;
            println!("Library:   {}", status.library_dir.display());
            println!("Downloads: {}", status.downloads_dir.display());
            println!("Artists:   {}", status.artist_folders);
            println!("Organized: {}", status.organized_videos);
            println!("Pending:   {}", status.pending_videos);
            for path in &status.pending {
                println!("   - {}", path.display());
            }
        }
        Commands::Migrate { action } => {
            let runner = library.migrations().await?;
            match action {
                MigrateAction::Status => {
                    let status = runner.status().await?;
                    println!(
                        "Current version: {}",
                        status.current_version.as_deref().unwrap_or("none")
                    );
                    for m in &status.applied {
                        println!(
                            "✅ {} {} (applied {} by {})",
                            m.version,
                            m.description,
                            m.applied_at.format("%Y-%m-%d %H:%M:%S"),
                            m.applied_by
                        );
                    }
                    for m in &status.pending {
                        println!("⏳ {} {}", m.version, m.description);
                    }
                }
                MigrateAction::Run => {
                    let applied = runner.run_pending().await?;
                    if applied.is_empty() {
                        println!("✅ Schema is up to date");
                    } else {
                        println!("✅ Applied: {}", applied.join(", "));
                    }
                }
                MigrateAction::Rollback { version } => {
                    let rolled = runner.rollback(version).await?;
                    println!("✅ Rolled back: {}", rolled.join(", "));
                }
            }
        }
        Commands::Clean { .. } => {}
    }

    Ok(())
}
