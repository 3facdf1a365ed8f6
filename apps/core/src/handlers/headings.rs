use std::collections::BTreeSet;
use std::time::Duration;

use regex::Regex;
use tracing::warn;

use crate::command_parser::TriggerMatch;
use crate::config::compile_patterns;
use crate::env::WorkspaceEnvList;
use crate::fuzzy::PreparedQuery;
use crate::host::{FileRef, HeadingCache, HostAction, HostError, Modifiers, PaneTarget};
use crate::input::{InputInfo, ParsedCommand};
use crate::matching::search_with_fallback;
use crate::mode::{heading_indicator, Mode};
use crate::suggestion::{MatchType, Suggestion, SuggestionItem};

use super::{decorate, finalize, render_file_info, Gather, HandlerDeps, RenderedRow, SuggestionHandler};

/// Quiet period before a free-text heading search runs.
pub const HEADINGS_DEBOUNCE: Duration = Duration::from_millis(400);

pub struct HeadingsHandler {
    deps: HandlerDeps,
}

impl HeadingsHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

impl SuggestionHandler for HeadingsHandler {
    fn mode(&self) -> Mode {
        Mode::HeadingsList
    }

    fn validate_command(
        &mut self,
        info: &mut InputInfo,
        found: &TriggerMatch,
        _active: Option<&Suggestion>,
    ) -> bool {
        info.validate(
            Mode::HeadingsList,
            ParsedCommand {
                index: Some(found.index),
                parsed_input: found.filter_text.clone(),
                ..ParsedCommand::default()
            },
        );
        true
    }

    fn gather(&mut self, info: &InputInfo) -> Gather {
        let query = info.search_query(self.deps.matcher.as_ref()).clone();
        if !query.has_search_term {
            let recent = recent_file_suggestions(&self.deps);
            return Gather::Ready(finalize(&self.deps, &info.env, recent, false));
        }

        let deps = self.deps.clone();
        let env = info.env.clone();
        Gather::Deferred(Box::pin(async move {
            tokio::time::sleep(HEADINGS_DEBOUNCE).await;
            search_vault(&deps, &env, &query.prepared)
        }))
    }

    fn render(&self, suggestion: &Suggestion, row: &mut RenderedRow) {
        let offsets = || {
            suggestion
                .search_match
                .as_ref()
                .map(|found| found.offsets.clone())
                .unwrap_or_default()
        };

        match &suggestion.item {
            SuggestionItem::Heading { heading, file } => {
                row.text = heading.heading.clone();
                row.highlights = offsets();
                row.indicator = Some(heading_indicator(heading.level).to_string());
                row.note = Some(file.display_path().to_string());
                row.classes.push("qsp-suggestion-headings".to_string());
            }
            SuggestionItem::File { file } => {
                render_file_info(
                    row,
                    file,
                    None,
                    suggestion.match_type,
                    suggestion.search_match.as_ref(),
                );
                row.classes.push("qsp-suggestion-file".to_string());
            }
            SuggestionItem::Alias { alias, file } => {
                row.text = alias.clone();
                row.highlights = offsets();
                row.note = Some(file.display_path().to_string());
                row.indicator = Some("↪".to_string());
                row.classes.push("qsp-suggestion-alias".to_string());
            }
            SuggestionItem::Unresolved { link_text } => {
                row.text = link_text.clone();
                row.highlights = offsets();
                row.classes.push("qsp-suggestion-unresolved".to_string());
            }
            _ => return,
        }
        decorate(row, suggestion);
    }

    fn choose(&mut self, suggestion: &Suggestion, modifiers: Modifiers) -> Result<(), HostError> {
        let target = PaneTarget::from_modifiers(modifiers);
        let action = match &suggestion.item {
            SuggestionItem::Heading { heading, file } => HostAction::OpenFile {
                path: file.path.clone(),
                target,
                position: Some(heading.position),
            },
            SuggestionItem::File { file } | SuggestionItem::Alias { file, .. } => {
                HostAction::OpenFile {
                    path: file.path.clone(),
                    target,
                    position: None,
                }
            }
            SuggestionItem::Unresolved { link_text } => HostAction::OpenLinkText {
                link_text: link_text.clone(),
                target,
            },
            _ => return Ok(()),
        };
        self.deps.host.perform(action)
    }
}

/// Whether any folder containing `file` matches one of `patterns`.
pub(crate) fn in_excluded_folder(file: &FileRef, patterns: &[Regex]) -> bool {
    if patterns.is_empty() {
        return false;
    }
    let parent = file.parent();
    let mut folder_end = parent.match_indices('/').map(|(index, _)| index).collect::<Vec<_>>();
    folder_end.push(parent.len());
    folder_end
        .into_iter()
        .filter(|end| *end > 0)
        .any(|end| patterns.iter().any(|pattern| pattern.is_match(&parent[..end])))
}

fn recent_file_suggestions(deps: &HandlerDeps) -> Vec<Suggestion> {
    let host = deps.host.as_ref();
    host.recent_file_paths()
        .iter()
        .filter_map(|path| host.file_by_path(path))
        .filter(|file| deps.settings.should_include_extension(file.extension()))
        .map(|file| {
            let h1 = host
                .metadata(&file)
                .and_then(|metadata| metadata.first_h1().cloned());
            match h1 {
                Some(heading) => Suggestion::new(SuggestionItem::Heading { heading, file }),
                None => Suggestion::new(SuggestionItem::File { file }),
            }
        })
        .collect()
}

/// Full vault scan for headings, with file, alias and unresolved-link
/// fallbacks unless strict mode is on.
fn search_vault(
    deps: &HandlerDeps,
    env: &WorkspaceEnvList,
    query: &PreparedQuery,
) -> Vec<Suggestion> {
    let settings = &deps.settings;
    let matcher = deps.matcher.as_ref();
    let excluded = compile_patterns(&settings.exclude_folders).unwrap_or_else(|error| {
        warn!(%error, "ignoring exclude_folders");
        Vec::new()
    });

    let mut suggestions = Vec::new();
    for file in deps.host.files() {
        if !settings.should_include_extension(file.extension()) || in_excluded_folder(&file, &excluded) {
            continue;
        }
        let metadata = deps.host.metadata(&file).unwrap_or_default();
        let h1 = metadata.first_h1().cloned();

        let headings: Vec<&HeadingCache> = if settings.search_all_headings {
            metadata.headings.iter().collect()
        } else {
            h1.iter().collect()
        };
        for heading in headings {
            if let Some(found) = matcher.fuzzy_match(query, &heading.heading) {
                suggestions.push(
                    Suggestion::new(SuggestionItem::Heading {
                        heading: heading.clone(),
                        file: file.clone(),
                    })
                    .with_match(MatchType::Primary, Some(found)),
                );
            }
        }

        if settings.strict_headings_only {
            continue;
        }
        if h1.is_none() {
            let found = search_with_fallback(matcher, query, None, Some(&file));
            if found.is_match() {
                suggestions.push(
                    Suggestion::new(SuggestionItem::File { file: file.clone() })
                        .with_match(found.match_type, found.search_match),
                );
            }
        }
        for alias in &metadata.aliases {
            if let Some(found) = matcher.fuzzy_match(query, alias) {
                suggestions.push(
                    Suggestion::new(SuggestionItem::Alias {
                        alias: alias.clone(),
                        file: file.clone(),
                    })
                    .with_match(MatchType::Primary, Some(found)),
                );
            }
        }
    }

    if !settings.strict_headings_only && !settings.show_existing_only {
        let distinct: BTreeSet<String> = deps
            .host
            .unresolved_links()
            .into_values()
            .flatten()
            .collect();
        for link_text in distinct {
            if let Some(found) = matcher.fuzzy_match(query, &link_text) {
                suggestions.push(
                    Suggestion::new(SuggestionItem::Unresolved { link_text })
                        .with_match(MatchType::Primary, Some(found)),
                );
            }
        }
    }

    let mut ranked = finalize(deps, env, suggestions, true);
    ranked.truncate(settings.limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::in_excluded_folder;
    use crate::config::compile_patterns;
    use crate::host::FileRef;

    #[test]
    fn exclusion_checks_every_ancestor_folder() {
        let patterns = compile_patterns(&["^archive$".to_string()]).unwrap();
        assert!(in_excluded_folder(&FileRef::new("archive/2020/old.md"), &patterns));
        assert!(!in_excluded_folder(&FileRef::new("notes/archive.md"), &patterns));
        assert!(!in_excluded_folder(&FileRef::new("root.md"), &patterns));
    }
}
