//! Command-line front end
//!
//! Client subcommands talk to a running link service; `serve` runs one.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::routes::links::DEFAULT_EXPIRATION_SECS;
use crate::types::PresignedLink;
use crate::upload::{SelectedFile, UploadDispatcher, UploadTarget};
use crate::utils::{format_epoch_millis, format_epoch_seconds, format_file_size};

#[derive(Debug, Parser)]
#[command(name = "bucket-links", version, about = "Presigned links and uploads for S3-compatible storage")]
pub struct Cli {
    /// Base URL of the link service API (overrides API_BASE)
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the link service
    Serve,

    /// Generate a time-limited download link
    DownloadUrl {
        file_name: String,
        /// Lifetime in seconds
        #[arg(short, long, default_value_t = DEFAULT_EXPIRATION_SECS)]
        expiration: i64,
    },

    /// Generate a time-limited upload link
    UploadUrl {
        file_name: String,
        #[arg(short, long, default_value_t = DEFAULT_EXPIRATION_SECS)]
        expiration: i64,
    },

    /// List objects in the bucket
    List,

    /// Upload a local file, directly if possible, through the server otherwise
    Upload {
        path: PathBuf,
        /// Object name in the bucket (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
        /// Use an existing upload link instead of generating one
        #[arg(long)]
        link: Option<String>,
        #[arg(short, long, default_value_t = DEFAULT_EXPIRATION_SECS)]
        expiration: i64,
    },

    /// Show the service's configuration and bucket access report
    CheckConfig,
}

impl Cli {
    pub fn is_serve(&self) -> bool {
        matches!(self.command, Command::Serve)
    }
}

fn print_link(kind: &str, link: &PresignedLink) {
    println!("{} URL generated", kind);
    println!("  File:       {}", link.file_name);
    println!("  Expires in: {} seconds", link.expiration_seconds);
    println!("  Expires at: {}", format_epoch_seconds(link.expires_at));
    println!("{}", link.url);
}

/// Run a client subcommand against the configured API.
pub async fn run_client(
    command: Command,
    api_base: Option<String>,
    config: &ClientConfig,
) -> Result<()> {
    let mut client_config = config.clone();
    if let Some(base) = api_base {
        client_config.api_base = base;
    }
    let client = ApiClient::from_config(&client_config)?;
    info!(api_base = %client.api_base(), "Using link service");

    match command {
        Command::Serve => bail!("`serve` is not a client command"),
        Command::DownloadUrl { file_name, expiration } => {
            let link = client.generate_download_url(&file_name, expiration).await?;
            print_link("Download", &link);
        }
        Command::UploadUrl { file_name, expiration } => {
            let link = client.generate_upload_url(&file_name, expiration).await?;
            print_link("Upload", &link);
        }
        Command::List => {
            let files = client.list_files().await?;
            if files.is_empty() {
                println!("No files found in the bucket");
            }
            for file in files {
                println!(
                    "{}\t{}\t{}",
                    file.name,
                    format_file_size(file.size),
                    format_epoch_millis(file.last_modified)
                );
            }
        }
        Command::Upload {
            path,
            name,
            link,
            expiration,
        } => upload(client, &path, name, link, expiration).await?,
        Command::CheckConfig => {
            let report = client.check_config().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

async fn upload(
    client: ApiClient,
    path: &Path,
    name: Option<String>,
    link: Option<String>,
    expiration: i64,
) -> Result<()> {
    let file = SelectedFile::from_path(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let object_name = name.unwrap_or_else(|| file.name.clone());

    let target = match link {
        Some(url) => UploadTarget {
            file_name: object_name,
            url,
        },
        None => UploadTarget::from(client.generate_upload_url(&object_name, expiration).await?),
    };

    let dispatcher = UploadDispatcher::new(client);
    let outcome = dispatcher.dispatch(Some(file), Some(&target)).await?;

    if !outcome.is_success() {
        bail!(outcome.message());
    }
    println!("{}", outcome.message());
    Ok(())
}
