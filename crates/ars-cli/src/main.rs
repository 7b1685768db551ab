//! # ars CLI entry point
//!
//! Parses command-line arguments and dispatches to the release server client.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use ars_cli::ReleaseClient;
use ars_core::{Credentials, LatestFilter, ReleaseDetails};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Client for the app release server.
#[derive(Parser, Debug)]
#[command(name = "ars", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Base URL of the release server.
    #[arg(
        long,
        env = "ARS_SERVER_URL",
        default_value = "http://localhost:8080",
        global = true
    )]
    url: Url,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 300, global = true)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload a build artifact with its release metadata.
    Upload(UploadArgs),

    /// Print the latest release of an application as JSON.
    Latest(LatestArgs),
}

#[derive(Args, Debug)]
struct UploadArgs {
    /// Path to the file being uploaded.
    #[arg(long)]
    file: PathBuf,

    /// Application name.
    #[arg(long = "name", value_name = "NAME")]
    app_name: String,

    /// Application version.
    #[arg(long = "version", value_name = "VERSION")]
    app_version: String,

    /// Application build.
    #[arg(long = "build", value_name = "BUILD")]
    app_build: String,

    /// Git commit the artifact was built from.
    #[arg(long)]
    commit: Option<String>,

    /// Distribution target (operating system or platform).
    #[arg(long)]
    target: Option<String>,

    /// CPU architecture.
    #[arg(long)]
    arch: Option<String>,

    /// Basic-auth user name.
    #[arg(long, env = "ARS_BACKEND_USERNAME")]
    username: String,

    /// Basic-auth password.
    #[arg(long, env = "ARS_BACKEND_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug)]
struct LatestArgs {
    /// Application name.
    app_name: String,

    /// Only consider releases for this target.
    #[arg(long)]
    target: Option<String>,

    /// Only consider releases for this architecture.
    #[arg(long)]
    arch: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let client = ReleaseClient::new(cli.url, Duration::from_secs(cli.timeout))?;

    match cli.command {
        Commands::Upload(args) => run_upload(&client, args).await,
        Commands::Latest(args) => run_latest(&client, args).await,
    }
}

async fn run_upload(client: &ReleaseClient, args: UploadArgs) -> Result<()> {
    let details = ReleaseDetails {
        app_name: args.app_name,
        app_version: args.app_version,
        app_build: args.app_build,
        git_commit: args.commit,
        target: args.target,
        arch: args.arch,
    }
    .normalized();
    // Reject locally what the server would reject anyway.
    details.coordinates()?;

    let credentials = Credentials::new(args.username, args.password);

    tracing::info!(file = %args.file.display(), "uploading");
    let release = client
        .upload_file(&credentials, &details, &args.file)
        .await
        .context("upload failed")?;

    println!(
        "File uploaded successfully: {}/{}/{}/{}",
        release.app_name, release.app_version, release.app_build, release.main_file_name
    );
    Ok(())
}

async fn run_latest(client: &ReleaseClient, args: LatestArgs) -> Result<()> {
    let filter = LatestFilter {
        target: args.target,
        arch: args.arch,
    }
    .normalized();
    let latest = client.latest(&args.app_name, &filter).await?;
    println!("{}", serde_json::to_string_pretty(&latest)?);
    Ok(())
}
