//! Drive Gateway CLI
//!
//! Exposes the Drive content gateway as tool calls, either one at a time
//! from the command line or as a JSON-lines server on stdio.

mod commands;
mod config;
mod dispatch;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use drive_adapters::GoogleDriveTransport;
use drive_core::{DriveTransport, Gateway, MemoryDrive};
use drive_types::RECENT_FILES_URI;
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::{Settings, SettingsManager};
use crate::dispatch::ToolDispatcher;

#[derive(Parser)]
#[command(name = "gdrive")]
#[command(author, version, about = "Drive content gateway - list, search, read and upload Drive files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (default: ~/.gdrive-gateway/config.toml)
    #[arg(short, long, global = true, env = "GDRIVE_CONFIG")]
    config: Option<PathBuf>,

    /// Use an empty in-memory store instead of the Drive API
    #[arg(long, global = true)]
    offline: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List files, one page at a time
    List {
        /// Maximum entries per page
        #[arg(short = 'n', long, default_value_t = 10)]
        page_size: i64,

        /// Cursor returned by a previous list
        #[arg(long)]
        cursor: Option<String>,

        /// Case-insensitive name filter
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Search file names and content
    Search {
        /// Search text
        query: String,

        /// Maximum entries per page
        #[arg(short = 'n', long, default_value_t = 10)]
        page_size: i64,

        /// Cursor returned by a previous search
        #[arg(long)]
        cursor: Option<String>,
    },

    /// Read a file's content
    Read {
        /// File ID
        file_id: String,
    },

    /// Upload a new file
    Upload {
        /// Name of the new file
        name: String,

        /// MIME type of the content
        #[arg(short, long, default_value = "text/plain")]
        mime_type: String,

        /// Inline content (base64 for binary types)
        #[arg(long)]
        content: Option<String>,

        /// Read content from a local file
        #[arg(long)]
        file: Option<PathBuf>,

        /// Destination folder ID
        #[arg(long)]
        folder: Option<String>,
    },

    /// Create a folder
    Mkdir {
        /// Folder name
        name: String,

        /// Parent folder ID
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Show the most recently modified files
    Recent {
        /// Number of files
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: i64,
    },

    /// Describe the callable tools
    Tools {
        /// Print definitions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Answer JSON tool calls on stdin, one per line
    Serve,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
}

fn init_logging(verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "gdrive=debug,drive_core=debug,drive_adapters=debug"
        } else {
            "gdrive=info,drive_core=info,drive_adapters=warn"
        })
    });

    // stdout carries tool responses, so logs go to stderr
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn build_dispatcher(settings: &Settings, offline: bool) -> Result<ToolDispatcher> {
    let transport: Arc<dyn DriveTransport> = if offline {
        info!("Using in-memory store");
        Arc::new(MemoryDrive::new())
    } else {
        let token = settings
            .access_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .context("No access token configured; set GDRIVE_ACCESS_TOKEN or access_token in the config file")?;
        Arc::new(GoogleDriveTransport::with_access_token(
            settings.drive_config(),
            token,
        )?)
    };

    let gateway = Gateway::with_config(transport, settings.gateway_config());
    Ok(ToolDispatcher::new(gateway))
}

async fn run(cli: Cli) -> Result<()> {
    let settings = SettingsManager::load(cli.config.as_deref())?;

    let (tool, arguments) = match cli.command {
        Commands::Tools { json } => return commands::tools::list(json),
        Commands::Config { action } => {
            return match action {
                ConfigAction::Show => commands::config::show(&settings, cli.config.as_deref()),
            }
        }
        Commands::Serve => {
            let dispatcher = build_dispatcher(&settings, cli.offline)?;
            return commands::serve::run(dispatcher).await;
        }
        Commands::List {
            page_size,
            cursor,
            filter,
        } => (
            dispatch::LIST_FILES,
            json!({ "page_size": page_size, "cursor": cursor, "query": filter }),
        ),
        Commands::Search {
            query,
            page_size,
            cursor,
        } => (
            dispatch::SEARCH_FILES,
            json!({ "query": query, "page_size": page_size, "cursor": cursor }),
        ),
        Commands::Read { file_id } => (dispatch::READ_FILE, json!({ "file_id": file_id })),
        Commands::Upload {
            name,
            mime_type,
            content,
            file,
            folder,
        } => (
            dispatch::UPLOAD_FILE,
            commands::files::upload_arguments(&name, &mime_type, content, file.as_deref(), folder)
                .await?,
        ),
        Commands::Mkdir { name, parent } => (
            dispatch::CREATE_DIRECTORY,
            json!({ "folder_name": name, "parent_id": parent }),
        ),
        Commands::Recent { limit } => (RECENT_FILES_URI, json!({ "limit": limit })),
    };

    let dispatcher = build_dispatcher(&settings, cli.offline)?;
    commands::files::execute(&dispatcher, tool, arguments).await
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let result = run(cli).await;

    if let Err(ref e) = result {
        error!("Command failed: {:#}", e);
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }

    result
}
