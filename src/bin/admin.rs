//! Operator CLI: API tokens, link statistics and database checks.
//!
//! Reads `DATABASE_URL` (and `TOKEN_SIGNING_SECRET` for `token create`) from
//! the environment or `.env`.

use shortlink::domain::repositories::{ApiToken, TokenRepository};
use shortlink::infrastructure::persistence::PgTokenRepository;
use shortlink::utils::token::{generate_token, hash_token};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};
use sqlx::PgPool;
use std::convert::Infallible;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "admin", author, version, about = "Administer a shortlink deployment")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage API tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
    /// Link, click and token totals
    Stats {
        /// How many of the most clicked links to show
        #[arg(long, default_value_t = 5)]
        top: i64,
    },
    /// Database diagnostics
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Issue a token that authenticates as a user
    Create {
        #[arg(short, long)]
        user: i64,
        /// Label shown in `token list`; prompted for when omitted
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short = 'y', long)]
        yes: bool,
    },
    List,
    /// Revoke by numeric id or exact name
    Revoke {
        token: TokenRef,
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum DbAction {
    Check,
    Info,
}

/// A token named on the command line: digits are an id, anything else a name.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenRef {
    Id(i64),
    Name(String),
}

impl FromStr for TokenRef {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse()
            .map(TokenRef::Id)
            .unwrap_or_else(|_| TokenRef::Name(s.to_string())))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Token { action } => {
            let tokens = PgTokenRepository::new(Arc::new(pool));
            match action {
                TokenAction::Create { user, name, yes } => {
                    let secret = std::env::var("TOKEN_SIGNING_SECRET")
                        .context("TOKEN_SIGNING_SECRET must be set to create tokens")?;
                    create_token(&tokens, &secret, user, name, yes).await
                }
                TokenAction::List => list_tokens(&tokens).await,
                TokenAction::Revoke { token, yes } => revoke_token(&tokens, token, yes).await,
            }
        }
        Commands::Stats { top } => show_stats(&pool, top).await,
        Commands::Db { action } => db_action(&pool, action).await,
    }
}

fn confirmed(prompt: &str, default: bool, skip: bool) -> Result<bool> {
    if skip {
        return Ok(true);
    }
    let answer = Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()?;
    if !answer {
        println!("{}", "Cancelled".red());
    }
    Ok(answer)
}

/// Only the HMAC of the token is stored; the raw value is printed once.
async fn create_token(
    tokens: &PgTokenRepository,
    signing_secret: &str,
    user_id: i64,
    name: Option<String>,
    yes: bool,
) -> Result<()> {
    let name = match name {
        Some(name) => name,
        None => Input::new().with_prompt("Token name").interact_text()?,
    };
    let raw = generate_token();

    println!("  Name:  {}", name.cyan());
    println!("  User:  {}", user_id.to_string().cyan());
    println!("  Token: {}", raw.bright_yellow().bold());
    println!("{}", "  Shown once. Store it before continuing.".red());

    if !confirmed("Create this token?", true, yes)? {
        return Ok(());
    }

    tokens
        .create_token(user_id, &name, &hash_token(signing_secret, &raw))
        .await
        .map_err(|e| anyhow!("Failed to create token: {}", e))?;

    println!("{}", "Token created.".green().bold());
    println!("  Authorization: Bearer {}", raw.bright_yellow());
    Ok(())
}

async fn list_tokens(tokens: &PgTokenRepository) -> Result<()> {
    let all = tokens
        .list_tokens()
        .await
        .map_err(|e| anyhow!("Failed to list tokens: {}", e))?;

    if all.is_empty() {
        println!("{}", "No tokens. Create one with `admin token create --user <id>`.".yellow());
        return Ok(());
    }

    println!(
        "  {:<5} {:<25} {:<8} {:<17} {:<17} {}",
        "ID", "Name", "User", "Created", "Last used", "Status"
    );
    for token in &all {
        println!("  {}", token_row(token));
    }
    println!("  {} token(s)", all.len());
    Ok(())
}

fn token_row(token: &ApiToken) -> String {
    let last_used = token
        .last_used_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "never".to_string());
    let status = if token.revoked_at.is_some() {
        "revoked".red()
    } else {
        "active".green()
    };

    format!(
        "{:<5} {:<25} {:<8} {:<17} {:<17} {}",
        token.id,
        token.name,
        token.user_id,
        token.created_at.format("%Y-%m-%d %H:%M").to_string(),
        last_used,
        status
    )
}

async fn revoke_token(tokens: &PgTokenRepository, target: TokenRef, yes: bool) -> Result<()> {
    let found = match &target {
        TokenRef::Id(id) => tokens.find_by_id(*id).await,
        TokenRef::Name(name) => tokens.find_by_name(name).await,
    }
    .map_err(|e| anyhow!("Database error: {}", e))?;
    let token = found.with_context(|| format!("Token {:?} not found", target))?;

    if token.revoked_at.is_some() {
        println!("{}", "Token is already revoked.".yellow());
        return Ok(());
    }

    println!("  {}", token_row(&token));
    if !confirmed("Revoke this token?", false, yes)? {
        return Ok(());
    }

    tokens
        .revoke_token(token.id)
        .await
        .map_err(|e| anyhow!("Failed to revoke token: {}", e))?;
    println!("{}", "Token revoked.".green().bold());
    Ok(())
}

async fn count(pool: &PgPool, sql: &str) -> Result<i64> {
    sqlx::query_scalar(sql)
        .fetch_one(pool)
        .await
        .with_context(|| format!("Query failed: {}", sql))
}

async fn show_stats(pool: &PgPool, top: i64) -> Result<()> {
    let links = count(pool, "SELECT COUNT(*) FROM short_links").await?;
    let resolvable = count(
        pool,
        "SELECT COUNT(*) FROM short_links \
         WHERE is_active AND (expires_at IS NULL OR expires_at > NOW())",
    )
    .await?;
    let clicks = count(pool, "SELECT COUNT(*) FROM clicks").await?;
    let clicks_today = count(
        pool,
        "SELECT COUNT(*) FROM clicks \
         WHERE clicked_at >= date_trunc('day', NOW() AT TIME ZONE 'UTC') AT TIME ZONE 'UTC'",
    )
    .await?;
    let tokens = count(pool, "SELECT COUNT(*) FROM api_tokens WHERE revoked_at IS NULL").await?;

    println!("  Links:         {} ({} resolvable)", links.to_string().bold(), resolvable);
    println!("  Clicks:        {} ({} today, UTC)", clicks.to_string().bold(), clicks_today);
    println!("  Active tokens: {}", tokens.to_string().bold());

    let leaders: Vec<(String, i64)> = sqlx::query_as(
        "SELECT short_code, click_count FROM short_links \
         ORDER BY click_count DESC, id LIMIT $1",
    )
    .bind(top.max(0))
    .fetch_all(pool)
    .await?;

    if !leaders.is_empty() {
        println!();
        println!("  Most clicked:");
        for (code, clicks) in leaders {
            println!("    {:<12} {}", code.cyan(), clicks);
        }
    }
    Ok(())
}

async fn db_action(pool: &PgPool, action: DbAction) -> Result<()> {
    match action {
        DbAction::Check => {
            sqlx::query("SELECT 1").execute(pool).await?;
            println!("{}", "Database connection OK".green().bold());
        }
        DbAction::Info => {
            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;
            // Missing table means migrations never ran.
            let migrations = count(pool, "SELECT COUNT(*) FROM _sqlx_migrations WHERE success")
                .await
                .unwrap_or(0);

            println!("  PostgreSQL: {}", version);
            println!("  Applied migrations: {}", migrations);
        }
    }
    Ok(())
}
