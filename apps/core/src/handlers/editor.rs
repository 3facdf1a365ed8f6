use crate::command_parser::TriggerMatch;
use crate::host::{HostAction, HostError, Modifiers, PaneInfo};
use crate::input::{InputInfo, ParsedCommand};
use crate::matching::search_with_fallback;
use crate::mode::Mode;
use crate::suggestion::{MatchType, Suggestion, SuggestionItem};

use super::{decorate, finalize, render_file_info, Gather, HandlerDeps, RenderedRow, SuggestionHandler};

pub struct EditorHandler {
    deps: HandlerDeps,
}

impl EditorHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }

    /// Main-area panes not excluded by view type, plus opted-in side panels.
    pub fn listable_panes(&self) -> Vec<PaneInfo> {
        let settings = &self.deps.settings;
        self.deps
            .host
            .open_panes()
            .into_iter()
            .filter(|pane| {
                if pane.in_main_area {
                    !settings.exclude_view_types.contains(&pane.view_type)
                } else {
                    settings.include_side_panel_view_types.contains(&pane.view_type)
                }
            })
            .collect()
    }
}

impl SuggestionHandler for EditorHandler {
    fn mode(&self) -> Mode {
        Mode::EditorList
    }

    fn validate_command(
        &mut self,
        info: &mut InputInfo,
        found: &TriggerMatch,
        _active: Option<&Suggestion>,
    ) -> bool {
        info.validate(
            Mode::EditorList,
            ParsedCommand {
                index: Some(found.index),
                parsed_input: found.filter_text.clone(),
                ..ParsedCommand::default()
            },
        );
        true
    }

    fn gather(&mut self, info: &InputInfo) -> Gather {
        let query = info.search_query(self.deps.matcher.as_ref());
        let mut suggestions = Vec::new();

        for pane in self.listable_panes() {
            let suggestion = if query.has_search_term {
                let found = search_with_fallback(
                    self.deps.matcher.as_ref(),
                    &query.prepared,
                    Some(&pane.display_text),
                    pane.file.as_ref(),
                );
                if !found.is_match() {
                    continue;
                }
                Suggestion::new(SuggestionItem::Editor { pane })
                    .with_match(found.match_type, found.search_match)
            } else {
                Suggestion::new(SuggestionItem::Editor { pane })
            };
            suggestions.push(suggestion);
        }

        Gather::Ready(finalize(
            &self.deps,
            &info.env,
            suggestions,
            query.has_search_term,
        ))
    }

    fn render(&self, suggestion: &Suggestion, row: &mut RenderedRow) {
        let SuggestionItem::Editor { pane } = &suggestion.item else {
            return;
        };
        match &pane.file {
            Some(file) => render_file_info(
                row,
                file,
                Some(&pane.display_text),
                suggestion.match_type,
                suggestion.search_match.as_ref(),
            ),
            None => {
                row.text = pane.display_text.clone();
                if suggestion.match_type == MatchType::Primary {
                    row.highlights = suggestion
                        .search_match
                        .as_ref()
                        .map(|found| found.offsets.clone())
                        .unwrap_or_default();
                }
            }
        }
        decorate(row, suggestion);
        row.classes.push("qsp-suggestion-editor".to_string());
    }

    fn choose(&mut self, suggestion: &Suggestion, _modifiers: Modifiers) -> Result<(), HostError> {
        let SuggestionItem::Editor { pane } = &suggestion.item else {
            return Ok(());
        };
        self.deps.host.perform(HostAction::ActivatePane {
            pane: pane.id,
            position: None,
        })
    }
}
