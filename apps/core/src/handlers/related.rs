use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::command_parser::TriggerMatch;
use crate::config::compile_patterns;
use crate::env::WorkspaceEnvList;
use crate::host::{FileRef, HostAction, HostError, Modifiers, PaneTarget};
use crate::input::{InputInfo, ParsedCommand, Source};
use crate::matching::search_with_fallback;
use crate::mode::{Mode, RelationType};
use crate::suggestion::{Suggestion, SuggestionItem};

use super::headings::in_excluded_folder;
use super::{decorate, finalize, render_file_info, resolve_source, Gather, HandlerDeps, RenderedRow, SuggestionHandler};

pub struct RelatedItemsHandler {
    deps: HandlerDeps,
    active_source: Option<Source>,
}

impl RelatedItemsHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self {
            deps,
            active_source: None,
        }
    }

    /// Every enabled relation of `source`, minus excluded folders and
    /// (optionally) files already open.
    pub fn related_files(&self, source: &FileRef, env: &WorkspaceEnvList) -> Vec<(FileRef, RelationType)> {
        let settings = &self.deps.settings;
        let host = self.deps.host.as_ref();
        let excluded = compile_patterns(&settings.exclude_related_folders).unwrap_or_else(|error| {
            warn!(%error, "ignoring exclude_related_folders");
            Vec::new()
        });

        let mut related = Vec::new();
        for relation in &settings.enabled_related_items {
            let paths: BTreeSet<String> = match relation {
                RelationType::Backlink => host
                    .resolved_links()
                    .into_iter()
                    .filter(|(_, targets)| targets.contains(&source.path))
                    .map(|(origin, _)| origin)
                    .collect(),
                RelationType::OutgoingLink => host
                    .resolved_links()
                    .remove(&source.path)
                    .unwrap_or_default(),
                RelationType::DiskLocation => host
                    .files()
                    .into_iter()
                    .filter(|file| file.parent() == source.parent())
                    .map(|file| file.path)
                    .collect(),
            };

            related.extend(
                paths
                    .iter()
                    .filter(|path| *path != &source.path)
                    .filter_map(|path| host.file_by_path(path))
                    .filter(|file| !in_excluded_folder(file, &excluded))
                    .filter(|file| {
                        !(settings.exclude_open_related_files && env.open_files.contains(&file.path))
                    })
                    .map(|file| (file, *relation)),
            );
        }
        related
    }
}

impl SuggestionHandler for RelatedItemsHandler {
    fn mode(&self) -> Mode {
        Mode::RelatedItemsList
    }

    fn validate_command(
        &mut self,
        info: &mut InputInfo,
        found: &TriggerMatch,
        active: Option<&Suggestion>,
    ) -> bool {
        let source = resolve_source(
            self.active_source.as_ref(),
            found,
            active,
            info.env.active_pane.as_ref(),
            &self.deps.settings,
        );
        let Some(source) = source else {
            debug!(index = found.index, "related items trigger without a source");
            return false;
        };

        info.validate(
            Mode::RelatedItemsList,
            ParsedCommand {
                index: Some(found.index),
                parsed_input: found.filter_text.clone(),
                source: Some(source),
                ..ParsedCommand::default()
            },
        );
        true
    }

    fn gather(&mut self, info: &InputInfo) -> Gather {
        let Some(source) = info.source() else {
            return Gather::Ready(Vec::new());
        };
        let query = info.search_query(self.deps.matcher.as_ref());
        let mut suggestions = Vec::new();

        for (file, relation) in self.related_files(&source.file, &info.env) {
            let suggestion = Suggestion::new(SuggestionItem::RelatedItem {
                file: file.clone(),
                relation,
            });
            if query.has_search_term {
                let found =
                    search_with_fallback(self.deps.matcher.as_ref(), &query.prepared, None, Some(&file));
                if found.is_match() {
                    suggestions.push(suggestion.with_match(found.match_type, found.search_match));
                }
            } else {
                suggestions.push(suggestion);
            }
        }

        Gather::Ready(finalize(
            &self.deps,
            &info.env,
            suggestions,
            query.has_search_term,
        ))
    }

    fn render(&self, suggestion: &Suggestion, row: &mut RenderedRow) {
        let SuggestionItem::RelatedItem { file, relation } = &suggestion.item else {
            return;
        };
        render_file_info(
            row,
            file,
            None,
            suggestion.match_type,
            suggestion.search_match.as_ref(),
        );
        row.indicator = Some(
            match relation {
                RelationType::Backlink => "←",
                RelationType::OutgoingLink => "→",
                RelationType::DiskLocation => "⌂",
            }
            .to_string(),
        );
        decorate(row, suggestion);
        row.classes.push("qsp-suggestion-related".to_string());
    }

    fn choose(&mut self, suggestion: &Suggestion, modifiers: Modifiers) -> Result<(), HostError> {
        let SuggestionItem::RelatedItem { file, .. } = &suggestion.item else {
            return Ok(());
        };
        self.deps.host.perform(HostAction::OpenFile {
            path: file.path.clone(),
            target: PaneTarget::from_modifiers(modifiers),
            position: None,
        })
    }

    fn remember(&mut self, info: &InputInfo) {
        self.active_source = if info.mode == Mode::RelatedItemsList {
            info.source().cloned()
        } else {
            None
        };
    }

    fn active_source(&self) -> Option<&Source> {
        self.active_source.as_ref()
    }

    fn reset(&mut self) {
        self.active_source = None;
    }
}
