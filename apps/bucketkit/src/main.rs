//! bucketkit - command-line client for S3-style object storage.
//!
//! # Usage
//!
//! ```text
//! ACCESS_KEY=AKID SECRET_KEY=secret bucketkit ls photos --prefix 2024/
//! bucketkit put ./cat.jpg photos/2024/cat.jpg --acl public-read
//! bucketkit clean photos --workers 8
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ACCESS_KEY` / `AWS_ACCESS_KEY_ID` | *(required)* | Access key |
//! | `SECRET_KEY` / `AWS_SECRET_ACCESS_KEY` | *(required)* | Secret key |
//! | `S3_ENDPOINT` | `s3.amazonaws.com` | Service endpoint |
//! | `S3_USE_SSL` | `true` | Use `https` |
//! | `S3_CLEAN_WORKERS` | `1` | Default bulk delete pool size |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use bucketkit_core::{
    Bucket, BucketFactory, CannedAcl, ClientConfig, ClientFactory, CopyOptions, CreateBucketOptions,
    ListFilter, Location, PutOptions,
};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "bucketkit", version, about = "Command-line client for S3-style object storage")]
struct Cli {
    /// Access key (falls back to `ACCESS_KEY` / `AWS_ACCESS_KEY_ID`)
    #[arg(long, global = true)]
    access_key: Option<String>,

    /// Secret key (falls back to `SECRET_KEY` / `AWS_SECRET_ACCESS_KEY`)
    #[arg(long, global = true)]
    secret_key: Option<String>,

    /// Service endpoint, overrides `S3_ENDPOINT`
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Talk plain HTTP instead of HTTPS
    #[arg(long, global = true)]
    insecure: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check that the service answers
    Ping,
    /// List buckets, or objects in a bucket
    Ls {
        /// Bucket name; lists buckets when omitted
        bucket: Option<String>,
        /// Only keys starting with this prefix
        #[arg(long)]
        prefix: Option<String>,
        /// Start listing after this key
        #[arg(long)]
        marker: Option<String>,
        /// Group keys by this delimiter
        #[arg(long)]
        delimiter: Option<String>,
        /// Fetch a single page of at most this many keys
        #[arg(long)]
        limit: Option<u64>,
    },
    /// Create a bucket
    Mb {
        /// Bucket name
        bucket: String,
        /// Canned ACL
        #[arg(long, default_value = "private")]
        acl: CannedAcl,
        /// Region constraint (e.g. `EU`, `us-west-2`)
        #[arg(long)]
        location: Option<Location>,
    },
    /// Delete an empty bucket
    Rb {
        /// Bucket name
        bucket: String,
    },
    /// Upload a local file
    Put {
        /// Local file
        local: PathBuf,
        /// Destination `bucket/key`
        remote: String,
        /// Canned ACL
        #[arg(long, default_value = "private")]
        acl: CannedAcl,
        /// `Cache-Control: max-age` in seconds
        #[arg(long)]
        cache: Option<u32>,
    },
    /// Download an object
    Get {
        /// Source `bucket/key`
        remote: String,
        /// Local destination
        local: PathBuf,
        /// Permission bits of the written file (octal)
        #[arg(long, value_parser = parse_mode)]
        mode: Option<u32>,
    },
    /// Delete an object
    Rm {
        /// Object `bucket/key`
        remote: String,
    },
    /// Show object metadata
    Stat {
        /// Object `bucket/key`
        remote: String,
    },
    /// Server-side copy
    Cp {
        /// Source `bucket/key`
        src: String,
        /// Destination `bucket/key`
        dest: String,
        /// Canned ACL of the copy
        #[arg(long, default_value = "private")]
        acl: CannedAcl,
        /// `Cache-Control: max-age` in seconds
        #[arg(long)]
        cache: Option<u32>,
    },
    /// Delete every object in a bucket
    Clean {
        /// Bucket name
        bucket: String,
        /// Worker pool size, overrides `S3_CLEAN_WORKERS`
        #[arg(long)]
        workers: Option<usize>,
    },
}

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn parse_mode(value: &str) -> Result<u32, String> {
    u32::from_str_radix(value.trim_start_matches("0o"), 8)
        .map_err(|e| format!("invalid octal mode '{value}': {e}"))
}

/// Resolve the credential pair from flags, then `ACCESS_KEY` / `SECRET_KEY`,
/// then the `AWS_*` variables.
fn credentials(cli: &Cli) -> Result<(String, String)> {
    let access_key = cli
        .access_key
        .clone()
        .or_else(|| std::env::var("ACCESS_KEY").ok())
        .or_else(|| std::env::var("AWS_ACCESS_KEY_ID").ok())
        .context("no access key: pass --access-key or set ACCESS_KEY")?;
    let secret_key = cli
        .secret_key
        .clone()
        .or_else(|| std::env::var("SECRET_KEY").ok())
        .or_else(|| std::env::var("AWS_SECRET_ACCESS_KEY").ok())
        .context("no secret key: pass --secret-key or set SECRET_KEY")?;
    Ok((access_key, secret_key))
}

fn format_time(epoch: i64) -> String {
    DateTime::<Utc>::from_timestamp(epoch, 0)
        .map_or_else(|| epoch.to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Resolve `bucket[/key]` through any [`BucketFactory`].
fn resolve(factory: &impl BucketFactory, path: &str) -> Result<Bucket> {
    factory
        .bucket(path)
        .with_context(|| format!("invalid bucket path '{path}'"))
}

async fn run(cli: Cli, config: ClientConfig) -> Result<()> {
    let (access_key, secret_key) = credentials(&cli)?;
    let clean_workers = config.clean_workers;
    let factory = ClientFactory::new(config).context("failed to build HTTP transport")?;
    let client = factory
        .client(&access_key, &secret_key)
        .context("invalid credentials")?;

    match cli.command {
        Commands::Ping => {
            if !client.test().await {
                bail!("{} did not answer 200", factory.config().endpoint);
            }
            println!("ok");
        }
        Commands::Ls { bucket: None, .. } => {
            let info = client.info().await.context("failed to list buckets")?;
            for bucket in info.buckets {
                println!("{}  {}", format_time(bucket.created), bucket.name);
            }
        }
        Commands::Ls {
            bucket: Some(bucket),
            prefix,
            marker,
            delimiter,
            limit,
        } => {
            let mut filter = ListFilter::new();
            if let Some(prefix) = prefix {
                filter = filter.prefix(prefix);
            }
            if let Some(marker) = marker {
                filter = filter.marker(marker);
            }
            if let Some(delimiter) = delimiter {
                filter = filter.delimiter(delimiter);
            }
            if let Some(limit) = limit {
                filter = filter.limit(limit);
            }
            let handle = resolve(&client, &bucket)?;
            let files = handle
                .files(&filter)
                .await
                .with_context(|| format!("failed to list {bucket}"))?;
            for file in files {
                println!(
                    "{}  {:>12}  {}  {}",
                    format_time(file.last_modified),
                    file.size,
                    file.checksum,
                    file.key
                );
            }
        }
        Commands::Mb {
            bucket,
            acl,
            location,
        } => {
            resolve(&client, &bucket)?
                .create(CreateBucketOptions { acl, location })
                .await
                .with_context(|| format!("failed to create bucket {bucket}"))?;
            info!(bucket = %bucket, "bucket created");
        }
        Commands::Rb { bucket } => {
            resolve(&client, &bucket)?
                .delete()
                .await
                .with_context(|| format!("failed to delete bucket {bucket}"))?;
            info!(bucket = %bucket, "bucket deleted");
        }
        Commands::Put {
            local,
            remote,
            acl,
            cache,
        } => {
            resolve(&client, &remote)?
                .put(
                    &local,
                    PutOptions {
                        acl,
                        cache_seconds: cache,
                    },
                )
                .await
                .with_context(|| format!("failed to upload {} to {remote}", local.display()))?;
            info!(remote = %remote, "uploaded");
        }
        Commands::Get {
            remote,
            local,
            mode,
        } => {
            resolve(&client, &remote)?
                .save(&local, mode)
                .await
                .with_context(|| format!("failed to download {remote}"))?;
            info!(remote = %remote, local = %local.display(), "downloaded");
        }
        Commands::Rm { remote } => {
            resolve(&client, &remote)?
                .delete_object()
                .await
                .with_context(|| format!("failed to delete {remote}"))?;
        }
        Commands::Stat { remote } => {
            let meta = resolve(&client, &remote)?
                .meta()
                .await
                .with_context(|| format!("failed to stat {remote}"))?;
            println!("size:          {}", meta.content_length);
            println!("last-modified: {}", format_time(meta.last_modified));
            println!("etag:          {}", meta.checksum);
            println!("content-type:  {}", meta.content_type);
        }
        Commands::Cp {
            src,
            dest,
            acl,
            cache,
        } => {
            resolve(&client, &src)?
                .copy_to(
                    &dest,
                    CopyOptions {
                        acl,
                        cache_seconds: cache,
                    },
                )
                .await
                .with_context(|| format!("failed to copy {src} to {dest}"))?;
        }
        Commands::Clean { bucket, workers } => {
            let errors = resolve(&client, &bucket)?
                .clean(workers.unwrap_or(clean_workers))
                .await;
            for error in &errors {
                warn!(%error, "delete failed");
            }
            if !errors.is_empty() {
                bail!("{} object(s) in {bucket} could not be deleted", errors.len());
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint.clone_from(endpoint);
    }
    if cli.insecure {
        config.use_ssl = false;
    }

    init_tracing(&config.log_level)?;
    info!(endpoint = %config.endpoint, ssl = config.use_ssl, "bucketkit starting");

    run(cli, config).await
}
