//!
//! manualbase command-line client
//! -------------------------------
//! Signs in with an existing access token and runs one command against the hosted
//! backend. Configuration comes from MANUALBASE_* environment variables; flags
//! override them.

use std::env;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tracing::info;
use uuid::Uuid;

use manualbase::config::{ClientConfig, ENV_ANON_KEY, ENV_URL};
use manualbase::identity::Identity;
use manualbase::notes::{NoteSort, NotesQuery, DEFAULT_PAGE_SIZE};
use manualbase::ManualClient;

const USAGE: &str = "manualbase CLI

USAGE:
  manualbase_cli [--url URL] [--anon-key KEY] [--role-ttl SECS] --user ID --token JWT <COMMAND>

COMMANDS:
  whoami              Print the signed-in identity and its resolved role
  is-admin            Print true/false (exit code 0 either way)
  manuals             List published manuals
  stats <manual_id>   Admin statistics for a manual (admin only)
  notes <manual_id>   Reader notes feed for a manual

OPTIONS:
  --url URL           Backend project URL (env: MANUALBASE_URL)
  --anon-key KEY      Public API key (env: MANUALBASE_ANON_KEY)
  --role-ttl SECS     Role cache TTL in seconds (env: MANUALBASE_ROLE_TTL_SECS, default 300)
  --user ID           Identity the token belongs to
  --token JWT         Access token of the signed-in user
  --sort ORDER        notes: newest (default), oldest or top
  --page N            notes: zero-based page (default 0)
  --page-size N       notes: notes per page, 1..=100 (default 20)
";

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
        i += 1;
    }
    None
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

/// Positional words after removing `--flag value` pairs.
fn positionals(args: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut i = 1;
    while i < args.len() {
        if args[i].starts_with("--") {
            i += 2;
            continue;
        }
        out.push(args[i].clone());
        i += 1;
    }
    out
}

fn parse_num<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> Result<T> {
    match arg_value(args, flag) {
        Some(raw) => raw.parse::<T>().map_err(|_| anyhow!("{} expects a number, got '{}'", flag, raw)),
        None => Ok(default),
    }
}

fn notes_query(args: &[String], manual_id: Uuid) -> Result<NotesQuery> {
    let sort = match arg_value(args, "--sort") {
        Some(raw) => NoteSort::parse(&raw).ok_or_else(|| anyhow!("unknown sort '{}'; use newest, oldest or top", raw))?,
        None => NoteSort::default(),
    };
    Ok(NotesQuery::for_manual(manual_id)
        .sort(sort)
        .page(parse_num(args, "--page", 0u32)?)
        .page_size(parse_num(args, "--page-size", DEFAULT_PAGE_SIZE)?))
}

fn load_config(args: &[String]) -> Result<ClientConfig> {
    let lookup = |k: &str| -> Option<String> {
        let flag = match k {
            ENV_URL => Some("--url"),
            ENV_ANON_KEY => Some("--anon-key"),
            _ => None,
        };
        flag.and_then(|f| arg_value(args, f)).or_else(|| env::var(k).ok())
    };
    let mut cfg = ClientConfig::from_lookup(lookup)?;
    if let Some(ttl) = arg_value(args, "--role-ttl") {
        let secs = ttl.parse::<u64>().with_context(|| format!("--role-ttl expects seconds, got '{}'", ttl))?;
        cfg.role_ttl = Duration::from_secs(secs);
    }
    Ok(cfg)
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))?;
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();

    let args: Vec<String> = env::args().collect();
    if has_flag(&args, "--help") || has_flag(&args, "-h") || args.len() < 2 {
        println!("{}", USAGE);
        return Ok(());
    }

    let cfg = load_config(&args)?;
    let user = arg_value(&args, "--user").ok_or_else(|| anyhow!("--user is required"))?;
    let token = arg_value(&args, "--token").ok_or_else(|| anyhow!("--token is required"))?;
    let words = positionals(&args);
    let Some(command) = words.first() else {
        return Err(anyhow!("missing command; see --help"));
    };

    info!(url = %cfg.base_url, ttl_secs = cfg.role_ttl.as_secs(), "manualbase_cli starting");
    let client = ManualClient::connect(&cfg).context("failed to set up backend client")?;
    client.sign_in(Identity::new(user), token);

    match command.as_str() {
        "whoami" => {
            let identity = client.session().current().map(|s| s.identity.to_string()).unwrap_or_default();
            let resolution = client.gate().resolve().await;
            println!("{} role={} ({:?})", identity, resolution.role(), resolution);
        }
        "is-admin" => {
            println!("{}", client.is_admin().await);
        }
        "manuals" => {
            for m in client.catalog().list_published_manuals().await? {
                println!("{}  v{}  {}", m.id, m.version, m.title);
            }
        }
        "stats" => {
            let raw = words.get(1).ok_or_else(|| anyhow!("stats requires a manual id"))?;
            let id = Uuid::parse_str(raw).with_context(|| format!("invalid manual id '{}'", raw))?;
            let s = client.admin().manual_admin_stats(id).await?;
            println!("{}", serde_json::to_string_pretty(&s)?);
        }
        "notes" => {
            let raw = words.get(1).ok_or_else(|| anyhow!("notes requires a manual id"))?;
            let id = Uuid::parse_str(raw).with_context(|| format!("invalid manual id '{}'", raw))?;
            let page = client.catalog().notes(&notes_query(&args, id)?).await?;
            for n in &page.items {
                println!("{}  {}  +{}  {}", n.created_at.format("%Y-%m-%d %H:%M"), n.user_id, n.likes, n.body);
            }
            if page.has_more {
                println!("(more: --page {})", page.page + 1);
            }
        }
        other => return Err(anyhow!("unknown command '{}'; see --help", other)),
    }
    client.sign_out();
    Ok(())
}
