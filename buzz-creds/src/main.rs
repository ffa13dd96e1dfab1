//! buzz-creds - Platform credential management for Buzzalicious
//!
//! Stores the access tokens buzz-send publishes with. Tokens are read from a
//! hidden prompt or from stdin, never from the command line.

use std::io::{self, Read, Write};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use libbuzz::scheduling::parse_schedule;
use libbuzz::service::BuzzService;
use libbuzz::{BuzzError, Credential, Platform};
use tracing::error;

#[derive(Parser)]
#[command(name = "buzz-creds")]
#[command(version)]
#[command(about = "Manage Buzzalicious platform credentials", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Email of the user whose credentials to manage
    #[arg(short, long, global = true, env = "BUZZ_USER")]
    user: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Store an access token for a platform
    Set {
        /// Platform name (twitter, linkedin)
        platform: String,

        /// Platform account id (required for LinkedIn: the member id)
        #[arg(long)]
        account_id: Option<String>,

        /// When the token expires (e.g., "60d", "2026-12-31T00:00:00Z")
        #[arg(long)]
        expires: Option<String>,

        /// Read the token from stdin (for automation/agents)
        #[arg(long)]
        stdin: bool,
    },

    /// List stored credentials (without showing tokens)
    List {
        /// Output format: text or json
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Remove the credential for a platform
    Remove {
        /// Platform name (twitter, linkedin)
        platform: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    libbuzz::logging::init_from_env("warn", cli.verbose);

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<BuzzError>()
            .map(BuzzError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let Some(email) = cli.user else {
        return Err(BuzzError::InvalidInput("--user <EMAIL> is required".to_string()).into());
    };

    let service = BuzzService::new().await?;

    match cli.command {
        Commands::Set {
            platform,
            account_id,
            expires,
            stdin,
        } => set_credential(&service, &email, &platform, account_id, expires.as_deref(), stdin).await,
        Commands::List { format } => list_credentials(&service, &email, format).await,
        Commands::Remove { platform, force } => {
            remove_credential(&service, &email, &platform, force).await
        }
    }
}

async fn set_credential(
    service: &BuzzService,
    email: &str,
    platform: &str,
    account_id: Option<String>,
    expires: Option<&str>,
    use_stdin: bool,
) -> Result<()> {
    let platform: Platform = platform.parse()?;

    if platform == Platform::LinkedIn && account_id.as_deref().map_or(true, |id| id.trim().is_empty()) {
        return Err(BuzzError::InvalidInput(
            "LinkedIn credentials need --account-id <MEMBER_ID> to build the author URN".to_string(),
        )
        .into());
    }

    let expires_at = expires
        .map(parse_schedule)
        .transpose()
        .context("invalid --expires value")?
        .map(|dt| dt.timestamp());

    let token = if use_stdin {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer.trim().to_string()
    } else {
        if !atty::is(atty::Stream::Stdin) {
            bail!("Not a TTY. Use --stdin to read the token from stdin for automation.");
        }
        rpassword::prompt_password(format!("Enter {} access token for {}: ", platform, email))?
            .trim()
            .to_string()
    };

    if token.is_empty() {
        return Err(BuzzError::InvalidInput("Access token cannot be empty".to_string()).into());
    }

    let user = service.database().ensure_user(email).await?;

    let mut credential = Credential::new(platform, token);
    if let Some(account_id) = account_id {
        credential = credential.with_account_id(account_id.trim());
    }
    if let Some(expires_at) = expires_at {
        credential = credential.with_expiry(expires_at);
    }

    service.database().upsert_credential(&user.id, &credential).await?;

    println!("✓ Stored {} credential for {}", platform, user.email);
    Ok(())
}

async fn list_credentials(service: &BuzzService, email: &str, format: OutputFormat) -> Result<()> {
    let summaries = match service.database().find_user_by_email(email).await? {
        Some(user) => service.database().list_credentials(&user.id).await?,
        None => Vec::new(),
    };

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        println!("No credentials stored for {}", email);
        return Ok(());
    }

    let now = Utc::now().timestamp();
    for summary in summaries {
        let expiry = match summary.expires_at {
            None => "no expiry".to_string(),
            Some(ts) if ts <= now => format!("EXPIRED {}", format_timestamp(ts)),
            Some(ts) => format!("expires {}", format_timestamp(ts)),
        };
        let account = summary
            .account_id
            .map(|id| format!(" ({})", id))
            .unwrap_or_default();
        println!("{}{}: {}", summary.platform, account, expiry);
    }

    Ok(())
}

async fn remove_credential(
    service: &BuzzService,
    email: &str,
    platform: &str,
    force: bool,
) -> Result<()> {
    let platform: Platform = platform.parse()?;

    let Some(user) = service.database().find_user_by_email(email).await? else {
        println!("No {} credential found for {}", platform, email);
        return Ok(());
    };

    // Confirm deletion unless --force is used
    if !force && atty::is(atty::Stream::Stdin) {
        print!("Remove {} credential for {}? [y/N]: ", platform, email);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled");
            return Ok(());
        }
    }

    if service.database().delete_credential(&user.id, platform).await? {
        println!("✓ Removed {} credential for {}", platform, email);
    } else {
        println!("No {} credential found for {}", platform, email);
    }

    Ok(())
}

fn format_timestamp(ts: i64) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ts.to_string())
}
