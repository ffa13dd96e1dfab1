//! buzz-queue - Manage scheduled posts
//!
//! Unix-style tool for adding posts to the queue and managing them until
//! buzz-send picks them up.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use libbuzz::scheduling::parse_schedule;
use libbuzz::service::schedule::ScheduleRequest;
use libbuzz::{BuzzError, BuzzService, PostStatus, Result, ScheduledPost, User};

#[derive(Parser, Debug)]
#[command(name = "buzz-queue")]
#[command(version)]
#[command(about = "Manage scheduled posts")]
#[command(long_about = "\
buzz-queue - Manage scheduled posts

DESCRIPTION:
    buzz-queue is a Unix-style tool for managing the Buzzalicious queue.
    Use it to schedule posts for Twitter and LinkedIn, then list, inspect,
    cancel or reschedule them until buzz-send publishes them.

COMMANDS:
    schedule    Add a post to the queue
    list        List your posts
    show        Show one post with its per-platform results
    cancel      Cancel a pending post
    reschedule  Move a pending post to a different time

USAGE EXAMPLES:
    # Schedule a post for both platforms
    buzz-queue --user me@example.com schedule --platform both --at \"tomorrow 9am\" \"We're live!\"

    # List pending posts in JSON format
    buzz-queue --user me@example.com list --status pending --format json

    # Cancel a specific post
    buzz-queue --user me@example.com cancel <POST_ID>

    # Reschedule a post
    buzz-queue --user me@example.com reschedule <POST_ID> 2h

TIME FORMATS:
    Durations (30m, 2h, 1d), natural language (tomorrow 3pm, next monday),
    or RFC 3339 (2026-11-20T15:00:00Z). The time must be in the future.

CONFIGURATION:
    Configuration file: ~/.config/buzzalicious/config.toml
    Database location: ~/.local/share/buzzalicious/buzz.db

    Override with environment variables:
        BUZZ_CONFIG    - Path to config file
        BUZZ_DB_PATH   - Path to database file
        BUZZ_USER      - Default for --user

EXIT CODES:
    0 - Success
    1 - Operation failed
    2 - Database or configuration error
    3 - Invalid input, unknown post, or post no longer pending
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Email of the user whose queue to manage
    #[arg(short, long, global = true, env = "BUZZ_USER")]
    user: Option<String>,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    #[arg(help = "Enable verbose logging to stderr (useful for debugging)")]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a post to the queue
    Schedule {
        /// Text to publish
        content: String,

        /// Target platform: twitter, linkedin or both
        #[arg(short, long, default_value = "both")]
        platform: String,

        /// When to publish (e.g., "30m", "tomorrow 3pm")
        #[arg(short, long)]
        at: String,

        /// Generation record this content came from
        #[arg(long)]
        generation_id: Option<String>,

        /// Output format: text or json
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List posts
    List {
        /// Only posts with this status
        #[arg(short, long)]
        status: Option<String>,

        /// Output format: text or json
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a post with its per-platform results
    Show {
        post_id: String,

        /// Output format: text or json
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Cancel a pending post
    Cancel {
        /// Post ID to cancel
        post_id: String,
    },

    /// Reschedule a pending post
    Reschedule {
        /// Post ID to reschedule
        post_id: String,

        /// New schedule time (e.g., "tomorrow 3pm", "2h")
        time: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    libbuzz::logging::init_from_env("error", cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let email = cli
        .user
        .ok_or_else(|| BuzzError::InvalidInput("--user <EMAIL> is required".to_string()))?;

    let service = BuzzService::new().await?;

    match cli.command {
        Commands::Schedule {
            content,
            platform,
            at,
            generation_id,
            format,
        } => {
            cmd_schedule(&service, &email, content, platform, &at, generation_id, format).await
        }
        Commands::List { status, format } => {
            cmd_list(&service, &email, status.as_deref(), format).await
        }
        Commands::Show { post_id, format } => cmd_show(&service, &email, &post_id, format).await,
        Commands::Cancel { post_id } => cmd_cancel(&service, &email, &post_id).await,
        Commands::Reschedule { post_id, time } => {
            cmd_reschedule(&service, &email, &post_id, &time).await
        }
    }
}

/// Schedule a new post
async fn cmd_schedule(
    service: &BuzzService,
    email: &str,
    content: String,
    platform: String,
    at: &str,
    generation_id: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let scheduled_for = parse_schedule(at)?;
    let user = service.database().ensure_user(email).await?;

    let post = service
        .schedule()
        .schedule(ScheduleRequest {
            owner: user.id,
            content,
            platform,
            scheduled_for: scheduled_for.timestamp(),
            generation_id,
        })
        .await?;

    match format {
        OutputFormat::Json => print_json(&post)?,
        OutputFormat::Text => println!("{}", post.id),
    }
    Ok(())
}

/// List the user's posts
async fn cmd_list(
    service: &BuzzService,
    email: &str,
    status: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let status = status.map(str::parse::<PostStatus>).transpose()?;

    // An unknown user simply has an empty queue
    let posts = match service.database().find_user_by_email(email).await? {
        Some(user) => service.schedule().list(&user.id, status).await?,
        None => Vec::new(),
    };

    match format {
        OutputFormat::Json => print_json(&posts)?,
        OutputFormat::Text => output_list_text(&posts),
    }
    Ok(())
}

async fn cmd_show(
    service: &BuzzService,
    email: &str,
    post_id: &str,
    format: OutputFormat,
) -> Result<()> {
    validate_post_id(post_id)?;
    let user = require_user(service, email).await?;
    let post = service.schedule().get(&user.id, post_id).await?;

    match format {
        OutputFormat::Json => print_json(&post)?,
        OutputFormat::Text => output_post_text(&post),
    }
    Ok(())
}

async fn cmd_cancel(service: &BuzzService, email: &str, post_id: &str) -> Result<()> {
    validate_post_id(post_id)?;
    let user = require_user(service, email).await?;
    let post = service.schedule().cancel(&user.id, post_id).await?;

    println!("Cancelled {}", post.id);
    Ok(())
}

async fn cmd_reschedule(
    service: &BuzzService,
    email: &str,
    post_id: &str,
    time: &str,
) -> Result<()> {
    validate_post_id(post_id)?;
    let scheduled_for = parse_schedule(time)?;
    let user = require_user(service, email).await?;
    let post = service
        .schedule()
        .reschedule(&user.id, post_id, scheduled_for.timestamp())
        .await?;

    println!("Rescheduled {} to {}", post.id, format_timestamp(post.scheduled_for));
    Ok(())
}

async fn require_user(service: &BuzzService, email: &str) -> Result<User> {
    service
        .database()
        .find_user_by_email(email)
        .await?
        .ok_or_else(|| BuzzError::NotFound(format!("No user with email {}", email)))
}

fn validate_post_id(post_id: &str) -> Result<()> {
    uuid::Uuid::parse_str(post_id)
        .map(|_| ())
        .map_err(|_| BuzzError::InvalidInput(format!("Invalid post ID format: {}", post_id)))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| BuzzError::InvalidState(format!("Could not serialize output: {}", e)))?;
    println!("{}", json);
    Ok(())
}

/// Output posts as human-readable text
fn output_list_text(posts: &[ScheduledPost]) {
    let now = Utc::now().timestamp();

    for post in posts {
        let when = if post.status == PostStatus::Pending {
            format_time_until(now, post.scheduled_for)
        } else {
            format_timestamp(post.scheduled_for)
        };

        println!(
            "{} | {} | {} | {} | {}",
            post.id,
            post.status,
            post.platform,
            truncate_content(&post.content, 50),
            when
        );
    }
}

fn output_post_text(post: &ScheduledPost) {
    println!("ID:        {}", post.id);
    println!("Status:    {}", post.status);
    println!("Platform:  {}", post.platform);
    println!("Scheduled: {}", format_timestamp(post.scheduled_for));
    if let Some(generation_id) = &post.generation_id {
        println!("Generated: {}", generation_id);
    }
    println!();
    println!("{}", post.content);

    for platform in post.platform.platforms() {
        let fields = post.fields(*platform);
        println!();
        match (&fields.post_id, &fields.error) {
            (Some(id), _) => println!(
                "{}: posted as {} at {}",
                platform,
                id,
                fields
                    .posted_at
                    .map(format_timestamp)
                    .unwrap_or_else(|| "unknown time".to_string())
            ),
            (None, Some(error)) => println!("{}: failed: {}", platform, error),
            (None, None) => println!("{}: not attempted yet", platform),
        }
    }
}

/// Truncate content to max characters with ellipsis
fn truncate_content(content: &str, max_chars: usize) -> String {
    let single_line = content.replace('\n', " ");
    if single_line.chars().count() <= max_chars {
        single_line
    } else {
        let truncated: String = single_line.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

fn format_timestamp(ts: i64) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ts.to_string())
}

/// Format time until scheduled time in human-readable format
fn format_time_until(now: i64, scheduled_for: i64) -> String {
    let diff = scheduled_for - now;

    if diff < 0 {
        return "overdue".to_string();
    }

    let minutes = diff / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("in {} day{}", days, if days == 1 { "" } else { "s" })
    } else if hours > 0 {
        format!("in {} hour{}", hours, if hours == 1 { "" } else { "s" })
    } else if minutes > 0 {
        format!("in {} minute{}", minutes, if minutes == 1 { "" } else { "s" })
    } else {
        "in <1 minute".to_string()
    }
}
