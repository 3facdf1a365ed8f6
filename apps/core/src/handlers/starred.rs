use tracing::debug;

use crate::command_parser::TriggerMatch;
use crate::host::{FileRef, HostAction, HostError, Modifiers, PaneTarget, StarredItem};
use crate::input::{InputInfo, ParsedCommand};
use crate::matching::search_with_fallback;
use crate::mode::Mode;
use crate::suggestion::{Suggestion, SuggestionItem};

use super::{decorate, finalize, render_file_info, Gather, HandlerDeps, RenderedRow, SuggestionHandler};

pub struct StarredHandler {
    deps: HandlerDeps,
}

impl StarredHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }

    /// Starred files that still exist, titled by their current basename.
    fn starred_files(&self) -> Vec<(StarredItem, FileRef)> {
        self.deps
            .host
            .starred_items()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| match item {
                StarredItem::File { path, .. } => {
                    let file = self.deps.host.file_by_path(&path)?;
                    let title = file.basename().to_string();
                    Some((StarredItem::File { title, path }, file))
                }
                StarredItem::Search { .. } => None,
            })
            .collect()
    }
}

impl SuggestionHandler for StarredHandler {
    fn mode(&self) -> Mode {
        Mode::StarredList
    }

    fn validate_command(
        &mut self,
        info: &mut InputInfo,
        found: &TriggerMatch,
        _active: Option<&Suggestion>,
    ) -> bool {
        if self.deps.host.starred_items().is_none() {
            debug!("starred provider disabled");
            return false;
        }
        info.validate(
            Mode::StarredList,
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

        for (item, file) in self.starred_files() {
            let title = match &item {
                StarredItem::File { title, .. } | StarredItem::Search { title, .. } => title.clone(),
            };
            let mut suggestion = Suggestion::new(SuggestionItem::Starred {
                item,
                file: Some(file.clone()),
            });
            if query.has_search_term {
                let found = search_with_fallback(
                    self.deps.matcher.as_ref(),
                    &query.prepared,
                    Some(&title),
                    Some(&file),
                );
                if !found.is_match() {
                    continue;
                }
                suggestion = suggestion.with_match(found.match_type, found.search_match);
            }
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
        let SuggestionItem::Starred {
            item: StarredItem::File { title, .. },
            file: Some(file),
        } = &suggestion.item
        else {
            return;
        };
        render_file_info(
            row,
            file,
            Some(title),
            suggestion.match_type,
            suggestion.search_match.as_ref(),
        );
        decorate(row, suggestion);
        row.classes.push("qsp-suggestion-starred".to_string());
    }

    fn choose(&mut self, suggestion: &Suggestion, modifiers: Modifiers) -> Result<(), HostError> {
        let Some(file) = suggestion.file() else {
            return Ok(());
        };
        self.deps.host.perform(HostAction::OpenFile {
            path: file.path.clone(),
            target: PaneTarget::from_modifiers(modifiers),
            position: None,
        })
    }
}
