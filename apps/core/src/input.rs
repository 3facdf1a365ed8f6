use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::Serialize;

use crate::env::WorkspaceEnvList;
use crate::fuzzy::{FuzzyMatcher, PreparedQuery};
use crate::host::{FileRef, PaneId, Position};
use crate::mode::Mode;

/// How the anchor of a sourced operation was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceState {
    FromActiveSuggestion,
    FromActiveEditor,
    FromPriorOperation,
}

/// The file (and pane, when known) a sourced mode operates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Source {
    pub file: FileRef,
    pub pane: Option<PaneId>,
    pub cursor: Option<Position>,
    pub state: SourceState,
}

impl Source {
    pub fn new(file: FileRef, state: SourceState) -> Self {
        Self {
            file,
            pane: None,
            cursor: None,
            state,
        }
    }

    /// The same anchor, marked as carried over from an earlier keystroke.
    pub fn carried_over(&self) -> Self {
        Self {
            state: SourceState::FromPriorOperation,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedCommand {
    pub is_validated: bool,
    /// Char index of the trigger within the input.
    pub index: Option<usize>,
    pub parsed_input: String,
    pub source: Option<Source>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub prepared: PreparedQuery,
    pub has_search_term: bool,
}

/// Everything derived from one version of the input string.
#[derive(Debug)]
pub struct InputInfo {
    pub input_text: String,
    pub mode: Mode,
    pub env: WorkspaceEnvList,
    commands: BTreeMap<Mode, ParsedCommand>,
    search_query: OnceLock<SearchQuery>,
}

impl InputInfo {
    pub fn new(input_text: impl Into<String>, env: WorkspaceEnvList) -> Self {
        Self {
            input_text: input_text.into(),
            mode: Mode::Standard,
            env,
            commands: BTreeMap::new(),
            search_query: OnceLock::new(),
        }
    }

    pub fn parsed_command(&self, mode: Mode) -> Option<&ParsedCommand> {
        self.commands.get(&mode)
    }

    pub fn active_command(&self) -> Option<&ParsedCommand> {
        self.commands.get(&self.mode)
    }

    /// Records a validated command and makes its mode the active one.
    pub fn validate(&mut self, mode: Mode, command: ParsedCommand) {
        self.mode = mode;
        self.commands.insert(
            mode,
            ParsedCommand {
                is_validated: true,
                ..command
            },
        );
    }

    pub fn source(&self) -> Option<&Source> {
        self.active_command()
            .and_then(|command| command.source.as_ref())
    }

    /// The text fuzzy matching runs against: the residual filter for a
    /// validated command, the whole input in Standard mode.
    pub fn filter_text(&self) -> &str {
        match self.active_command() {
            Some(command) if command.is_validated => &command.parsed_input,
            _ => &self.input_text,
        }
    }

    pub fn search_query(&self, matcher: &dyn FuzzyMatcher) -> &SearchQuery {
        self.search_query.get_or_init(|| {
            let prepared = matcher.prepare_query(self.filter_text());
            SearchQuery {
                has_search_term: !prepared.is_empty(),
                prepared,
            }
        })
    }
}
