use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;

use crate::command_parser::TriggerMatch;
use crate::config::Settings;
use crate::env::WorkspaceEnvList;
use crate::fuzzy::{sort_by_score_descending, FuzzyMatcher, SearchMatch};
use crate::host::{FileRef, HostApp, HostError, Modifiers, PaneInfo};
use crate::input::{InputInfo, Source, SourceState};
use crate::matching::{basename_start, split_at_basename};
use crate::mode::Mode;
use crate::ranking::RankingAdjuster;
use crate::suggestion::{MatchType, Suggestion, SuggestionItem};

mod command;
mod editor;
mod headings;
mod related;
mod starred;
mod symbol;
mod workspace;

pub use command::{CommandHandler, RecentCommands};
pub use editor::EditorHandler;
pub use headings::{HeadingsHandler, HEADINGS_DEBOUNCE};
pub use related::RelatedItemsHandler;
pub use starred::StarredHandler;
pub use symbol::SymbolHandler;
pub use workspace::WorkspaceHandler;

pub type SuggestionFuture = Pin<Box<dyn Future<Output = Vec<Suggestion>> + Send>>;

/// Collaborators every handler reads from.
#[derive(Clone)]
pub struct HandlerDeps {
    pub host: Arc<dyn HostApp>,
    pub settings: Arc<Settings>,
    pub matcher: Arc<dyn FuzzyMatcher>,
}

pub enum Gather {
    Ready(Vec<Suggestion>),
    /// Suspends before producing suggestions (file reads, debounce).
    Deferred(SuggestionFuture),
}

/// Display form of one suggestion. Highlight ranges are char offsets into
/// `text` and `note` respectively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedRow {
    pub text: String,
    pub highlights: Vec<(usize, usize)>,
    pub note: Option<String>,
    pub note_highlights: Vec<(usize, usize)>,
    pub indicator: Option<String>,
    pub classes: Vec<String>,
}

pub trait SuggestionHandler: Send {
    fn mode(&self) -> Mode;

    /// Claims the input for this handler's mode when its preconditions hold.
    fn validate_command(
        &mut self,
        info: &mut InputInfo,
        found: &TriggerMatch,
        active: Option<&Suggestion>,
    ) -> bool;

    fn gather(&mut self, info: &InputInfo) -> Gather;

    fn render(&self, suggestion: &Suggestion, row: &mut RenderedRow);

    fn choose(&mut self, suggestion: &Suggestion, modifiers: Modifiers) -> Result<(), HostError>;

    /// Called after each parse with the winning mode's info. Sourced handlers
    /// keep their anchor only while their mode stays active.
    fn remember(&mut self, _info: &InputInfo) {}

    /// Anchor of the sourced operation in progress, if any.
    fn active_source(&self) -> Option<&Source> {
        None
    }

    fn reset(&mut self) {}
}

/// Picks the anchor for a sourced mode, in priority order: the in-progress
/// source, the highlighted suggestion, then the active editor when the
/// trigger opens the input.
pub(crate) fn resolve_source(
    previous: Option<&Source>,
    found: &TriggerMatch,
    active: Option<&Suggestion>,
    active_pane: Option<&PaneInfo>,
    settings: &Settings,
) -> Option<Source> {
    if let Some(previous) = previous {
        return Some(previous.carried_over());
    }

    if let Some(suggestion) = active.filter(|suggestion| suggestion.can_be_source()) {
        if let Some(file) = suggestion.file() {
            let mut source = Source::new(file.clone(), SourceState::FromActiveSuggestion);
            if let SuggestionItem::Editor { pane } = &suggestion.item {
                source.pane = Some(pane.id);
                source.cursor = pane.cursor;
            }
            return Some(source);
        }
    }

    if found.index == 0 {
        let pane = active_pane.filter(|pane| !settings.exclude_view_types.contains(&pane.view_type))?;
        let file = pane.file.clone()?;
        let mut source = Source::new(file, SourceState::FromActiveEditor);
        source.pane = Some(pane.id);
        source.cursor = pane.cursor;
        return Some(source);
    }

    None
}

/// Tags, adjusts and (when searching) sorts a handler's raw results.
pub(crate) fn finalize(
    deps: &HandlerDeps,
    env: &WorkspaceEnvList,
    suggestions: Vec<Suggestion>,
    has_search_term: bool,
) -> Vec<Suggestion> {
    let host = Arc::clone(&deps.host);
    let is_ignored = move |path: &str| host.is_user_ignored(path);
    let adjuster = RankingAdjuster::new(&deps.settings.match_priority_adjustments, &is_ignored);

    let mut adjusted: Vec<Suggestion> = suggestions
        .into_iter()
        .map(|mut suggestion| {
            env.tag(&mut suggestion);
            adjuster.adjust(&suggestion)
        })
        .collect();

    if has_search_term {
        sort_by_score_descending(&mut adjusted);
    }
    adjusted
}

/// Renders a file-backed row. Path matches split their highlights between
/// the basename (text) and the folder prefix (note).
pub(crate) fn render_file_info(
    row: &mut RenderedRow,
    file: &FileRef,
    primary: Option<&str>,
    match_type: MatchType,
    search_match: Option<&SearchMatch>,
) {
    let offsets = || search_match.map(|found| found.offsets.clone()).unwrap_or_default();
    let display_path = file.display_path().to_string();

    match match_type {
        MatchType::Primary => {
            row.text = primary.unwrap_or_else(|| file.basename()).to_string();
            row.highlights = offsets();
            row.note = Some(display_path);
        }
        MatchType::Basename => {
            row.text = file.basename().to_string();
            row.highlights = offsets();
            row.note = Some(display_path);
        }
        MatchType::Path => {
            let boundary = basename_start(file);
            row.text = display_path.chars().skip(boundary).collect();
            row.note = Some(display_path.chars().take(boundary).collect());
            if let Some(found) = search_match {
                let split = split_at_basename(found, boundary);
                row.highlights = split.basename.map(|m| m.offsets).unwrap_or_default();
                row.note_highlights = split.path.map(|m| m.offsets).unwrap_or_default();
            }
        }
        MatchType::None => {
            row.text = primary.unwrap_or_else(|| file.basename()).to_string();
            row.note = Some(display_path);
        }
    }
}

/// Flair and classes shared by every file-backed row.
pub(crate) fn decorate(row: &mut RenderedRow, suggestion: &Suggestion) {
    let flags = suggestion.flags;
    if flags.is_open_in_editor {
        row.classes.push("qsp-open-editor".to_string());
    }
    if flags.is_starred {
        row.classes.push("qsp-starred".to_string());
    }
    if flags.is_recent {
        row.classes.push("qsp-recent".to_string());
    }
    if flags.downranked {
        row.classes.push("mod-downranked".to_string());
    }
}

/// Matches `text` against the query; with no search term everything passes
/// unscored.
pub(crate) fn match_text(
    deps: &HandlerDeps,
    info: &InputInfo,
    text: &str,
) -> Option<Option<SearchMatch>> {
    let query = info.search_query(deps.matcher.as_ref());
    if !query.has_search_term {
        return Some(None);
    }
    deps.matcher
        .fuzzy_match(&query.prepared, text)
        .map(Some)
}
