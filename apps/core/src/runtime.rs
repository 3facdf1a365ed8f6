use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use thiserror::Error;
use tracing::info;

use crate::config::{self, ConfigError, Settings};
use crate::contract::{QueryRequest, QueryResponse, SuggestionDto};
use crate::fuzzy::{sort_by_score_descending, FuzzyMatcher, SubsequenceMatcher};
use crate::handlers::RenderedRow;
use crate::host::{HostApp, VaultSnapshot};
use crate::logging::{self, LoggingError};
use crate::matching::search_with_fallback;
use crate::mode::Mode;
use crate::router::{Dispatch, ModeRouter};
use crate::suggestion::{Suggestion, SuggestionItem};
use crate::vault::{FsVault, VaultError};

#[derive(Parser, Debug)]
#[command(name = "quickswitch")]
#[command(about = "Run one quick-switcher query against a markdown vault")]
#[command(version)]
pub struct Cli {
    /// Input text as typed into the switcher
    pub query: String,

    /// Vault directory to scan
    #[arg(long)]
    pub vault: PathBuf,

    /// Vault-relative path of the file open in the active editor
    #[arg(long)]
    pub active: Option<String>,

    /// Settings file (TOML, or JSON/JSON5 by extension)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Maximum number of suggestions to print
    #[arg(long)]
    pub limit: Option<usize>,

    /// Open the switcher in this mode, prefixing its trigger to the query
    #[arg(long, value_parser = parse_mode)]
    pub mode: Option<Mode>,

    /// Write logs here instead of stderr
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("vault error: {0}")]
    Vault(#[from] VaultError),
    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),
    #[error("failed to start async runtime: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("active file not found in vault: {0}")]
    UnknownFile(String),
}

pub fn run(cli: Cli) -> Result<(), RuntimeError> {
    match &cli.log_dir {
        Some(dir) => {
            logging::init(dir, cli.verbose)?;
        }
        None => logging::init_stderr(cli.verbose)?,
    }

    let settings = config::load(cli.config.as_deref())?;
    let vault = FsVault::scan(&cli.vault)?;
    info!(
        vault = %cli.vault.display(),
        files = vault.files.len(),
        "vault ready"
    );

    let request = QueryRequest {
        query: cli.query,
        active_file: cli.active,
        limit: cli.limit,
        open_mode: cli.mode,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let response = runtime.block_on(execute(request, vault, settings))?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Runs one query through a fresh router, awaiting any deferred gather.
pub async fn execute(
    request: QueryRequest,
    mut vault: VaultSnapshot,
    settings: Settings,
) -> Result<QueryResponse, RuntimeError> {
    if let Some(path) = &request.active_file {
        let file = vault
            .file_by_path(path)
            .ok_or_else(|| RuntimeError::UnknownFile(path.clone()))?;
        let pane = vault.open_pane(&file, None);
        vault.active_pane = Some(pane);
    }

    let limit = request.limit.unwrap_or(settings.limit);
    let host: Arc<dyn HostApp> = Arc::new(vault);
    let matcher: Arc<dyn FuzzyMatcher> = Arc::new(SubsequenceMatcher);
    let mut router = ModeRouter::new(Arc::clone(&host), Arc::new(settings), Arc::clone(&matcher));

    let mut query = request.query.clone();
    if let Some(mode) = request.open_mode {
        router.open_in_mode(mode);
        if let Some(trigger) = router.take_session_open_mode() {
            query.insert_str(0, &trigger);
        }
    }

    let dispatch = router.update_suggestions(&query, None);
    let handled = dispatch.is_handled();
    let mut suggestions = match dispatch {
        Dispatch::NotHandled => standard_suggestions(host.as_ref(), matcher.as_ref(), &query),
        Dispatch::Ready(suggestions) => suggestions,
        Dispatch::Deferred(pending) => pending.resolve().await.unwrap_or_default(),
    };
    suggestions.truncate(limit);

    let (mode, filter, source) = match router.last_input() {
        Some(input) => (
            input.mode,
            input.filter_text().to_string(),
            input.source().map(|source| source.file.path.clone()),
        ),
        None => (Mode::Standard, query.clone(), None),
    };

    let suggestions = suggestions
        .iter()
        .map(|suggestion| {
            let mut row = RenderedRow::default();
            router.render_suggestion(suggestion, &mut row);
            SuggestionDto::from_rendered(suggestion, row)
        })
        .collect();

    Ok(QueryResponse {
        mode,
        filter,
        source,
        handled,
        suggestions,
    })
}

fn parse_mode(value: &str) -> Result<Mode, String> {
    match Mode::parse(value) {
        Some(Mode::Standard) | None => Err(format!("unknown switcher mode: {value}")),
        Some(mode) => Ok(mode),
    }
}

/// Plain file search used when no mode claims the input.
fn standard_suggestions(host: &dyn HostApp, matcher: &dyn FuzzyMatcher, query: &str) -> Vec<Suggestion> {
    let prepared = matcher.prepare_query(query);
    let mut suggestions: Vec<Suggestion> = host
        .files()
        .into_iter()
        .filter_map(|file| {
            if prepared.is_empty() {
                return Some(Suggestion::new(SuggestionItem::File { file }));
            }
            let found = search_with_fallback(matcher, &prepared, None, Some(&file));
            found.is_match().then(|| {
                Suggestion::new(SuggestionItem::File { file })
                    .with_match(found.match_type, found.search_match)
            })
        })
        .collect();
    sort_by_score_descending(&mut suggestions);
    suggestions
}
