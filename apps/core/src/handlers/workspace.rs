use tracing::debug;

use crate::command_parser::TriggerMatch;
use crate::host::{HostAction, HostError, Modifiers};
use crate::input::{InputInfo, ParsedCommand};
use crate::mode::Mode;
use crate::suggestion::{MatchType, Suggestion, SuggestionItem};

use super::{finalize, match_text, Gather, HandlerDeps, RenderedRow, SuggestionHandler};

pub struct WorkspaceHandler {
    deps: HandlerDeps,
}

impl WorkspaceHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

impl SuggestionHandler for WorkspaceHandler {
    fn mode(&self) -> Mode {
        Mode::WorkspaceList
    }

    fn validate_command(
        &mut self,
        info: &mut InputInfo,
        found: &TriggerMatch,
        _active: Option<&Suggestion>,
    ) -> bool {
        if self.deps.host.workspaces().is_none() {
            debug!("workspaces provider disabled");
            return false;
        }
        info.validate(
            Mode::WorkspaceList,
            ParsedCommand {
                index: Some(found.index),
                parsed_input: found.filter_text.clone(),
                ..ParsedCommand::default()
            },
        );
        true
    }

    fn gather(&mut self, info: &InputInfo) -> Gather {
        let has_search_term = info.search_query(self.deps.matcher.as_ref()).has_search_term;
        let suggestions = self
            .deps
            .host
            .workspaces()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|id| {
                let found = match_text(&self.deps, info, &id)?;
                let match_type = if found.is_some() {
                    MatchType::Primary
                } else {
                    MatchType::None
                };
                Some(Suggestion::new(SuggestionItem::Workspace { id }).with_match(match_type, found))
            })
            .collect();
        Gather::Ready(finalize(&self.deps, &info.env, suggestions, has_search_term))
    }

    fn render(&self, suggestion: &Suggestion, row: &mut RenderedRow) {
        let SuggestionItem::Workspace { id } = &suggestion.item else {
            return;
        };
        row.text = id.clone();
        row.highlights = suggestion
            .search_match
            .as_ref()
            .map(|found| found.offsets.clone())
            .unwrap_or_default();
        row.classes.push("qsp-suggestion-workspace".to_string());
    }

    fn choose(&mut self, suggestion: &Suggestion, _modifiers: Modifiers) -> Result<(), HostError> {
        let SuggestionItem::Workspace { id } = &suggestion.item else {
            return Ok(());
        };
        self.deps
            .host
            .perform(HostAction::LoadWorkspace { id: id.clone() })
    }
}
