//! CLI surface for the japa counter.
//!
//! Thin handlers over the library: the page server, the file-backed done set
//! and the counting session.

use std::ffi::OsString;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;

use clap::{ArgAction, Args, Parser, Subcommand, builder::BoolishValueParser};
use serde::Serialize;

use crate::Result;
use crate::api::ingest_snapshot;
use crate::client::{HttpPageFetcher, LocalPageFetcher, PageFetcher, RetryingFetcher};
use crate::config::Config;
use crate::core::{BeadId, DoneSet};
use crate::store::FileStore;

mod commands;
mod render;

// =============================================================================
// Entry + global options
// =============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "japa",
    version,
    about = "Japa bead counter",
    infer_subcommands = true,
    infer_long_args = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Machine-readable JSON output.
    #[arg(
        long,
        global = true,
        default_value_t = false,
        num_args = 0..=1,
        value_parser = BoolishValueParser::new()
    )]
    pub json: bool,

    /// Debug output (repeat for more).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve bead pages over HTTP until interrupted.
    Serve(ServeArgs),

    /// Mark beads done in the local store.
    #[command(alias = "done")]
    Mark(MarkArgs),

    /// Done count, malas and where counting resumes.
    Status,

    /// Fetch one page and show it against the done set.
    Page(PageArgs),

    /// Interactive counting session on stdin.
    Session(SessionArgs),

    /// Show or initialize configuration.
    Config(ConfigArgs),
}

impl Commands {
    /// Commands that keep running until interrupted.
    pub fn is_long_running(&self) -> bool {
        matches!(self, Commands::Serve(_) | Commands::Session(_))
    }
}

// =============================================================================
// Per-command args
// =============================================================================

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Listen address (default: server.listen_addr).
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<SocketAddr>,

    /// Artificial delay per page response, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,
}

#[derive(Args, Debug)]
pub struct MarkArgs {
    /// Bead ids (0..=1404).
    #[arg(required = true, value_name = "ID", value_parser = parse_bead_id)]
    pub ids: Vec<BeadId>,
}

#[derive(Args, Debug)]
pub struct PageArgs {
    /// Cursor of the page (default: 0).
    #[arg(long, default_value_t = 0)]
    pub cursor: u32,

    /// Generate the page in-process instead of asking the server.
    #[arg(long, default_value_t = false)]
    pub local: bool,
}

#[derive(Args, Debug)]
pub struct SessionArgs {
    /// Generate pages in-process instead of asking the server.
    #[arg(long, default_value_t = false)]
    pub local: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration.
    Show,
    /// Write a default user config.
    Init {
        /// Overwrite an existing config.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

// =============================================================================
// Public API
// =============================================================================

pub fn parse_from<I, T>(args: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::parse_from(args)
}

/// Run the CLI (used by bin).
pub fn run(cli: Cli, config: Config) -> Result<()> {
    let ctx = Ctx {
        config,
        json: cli.json,
    };

    match cli.command {
        Commands::Serve(args) => commands::serve::handle(&ctx, args),
        Commands::Mark(args) => commands::mark::handle(&ctx, args),
        Commands::Status => commands::status::handle(&ctx),
        Commands::Page(args) => commands::page::handle(&ctx, args),
        Commands::Session(args) => commands::session::handle(&ctx, args),
        Commands::Config(args) => commands::config::handle(&ctx, args),
    }
}

// =============================================================================
// Context + helpers
// =============================================================================

struct Ctx {
    config: Config,
    json: bool,
}

impl Ctx {
    fn store(&self) -> FileStore {
        FileStore::open(self.config.store.resolved_path())
    }

    /// Current done set as recorded in the store.
    fn load_done(&self, store: &FileStore) -> Result<(DoneSet, usize)> {
        let ingested = ingest_snapshot(&store.load()?);
        if ingested.rejected > 0 {
            tracing::warn!(
                rejected = ingested.rejected,
                path = %store.path().display(),
                "skipped malformed store entries"
            );
        }
        Ok((ingested.done, ingested.rejected))
    }

    fn fetcher(&self, local: bool) -> Arc<dyn PageFetcher> {
        if local {
            return Arc::new(LocalPageFetcher);
        }
        let client = &self.config.client;
        Arc::new(RetryingFetcher::new(
            HttpPageFetcher::new(client.base_url.clone(), client.timeout()),
            client.retry_policy(),
        ))
    }
}

fn parse_bead_id(raw: &str) -> std::result::Result<BeadId, String> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("not a bead number: {raw}"))?;
    BeadId::new(value).map_err(|e| e.to_string())
}

fn print_line(line: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = writeln!(stdout, "{line}")
        && e.kind() != std::io::ErrorKind::BrokenPipe
    {
        return Err(e.into());
    }
    Ok(())
}

/// Print `value` as JSON or through `human`.
fn print_output<T: Serialize>(ctx: &Ctx, value: &T, human: impl FnOnce(&T) -> String) -> Result<()> {
    let s = if ctx.json {
        serde_json::to_string_pretty(value)?
    } else {
        human(value)
    };
    print_line(&s)
}
