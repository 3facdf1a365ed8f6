use std::collections::{HashMap, VecDeque};

use crate::command_parser::TriggerMatch;
use crate::host::{CommandInfo, HostAction, HostError, Modifiers};
use crate::input::{InputInfo, ParsedCommand};
use crate::mode::Mode;
use crate::suggestion::{MatchType, Suggestion, SuggestionItem};

use super::{finalize, Gather, HandlerDeps, RenderedRow, SuggestionHandler};

/// Most-recently-used command ids, newest first, bounded by `capacity`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentCommands {
    capacity: usize,
    ids: VecDeque<String>,
}

impl RecentCommands {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ids: VecDeque::with_capacity(capacity),
        }
    }

    pub fn record(&mut self, id: &str) {
        if let Some(index) = self.ids.iter().position(|existing| existing == id) {
            self.ids.remove(index);
        }
        self.ids.push_front(id.to_string());
        self.ids.truncate(self.capacity);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

pub struct CommandHandler {
    deps: HandlerDeps,
    recent: RecentCommands,
}

impl CommandHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        let capacity = deps.settings.max_recent_commands;
        Self {
            deps,
            recent: RecentCommands::new(capacity),
        }
    }

    pub fn recent(&self) -> &RecentCommands {
        &self.recent
    }

    /// Recent commands in MRU order, then everything else by name.
    fn browse(&self, commands: Vec<CommandInfo>) -> Vec<Suggestion> {
        let mut by_id: HashMap<String, CommandInfo> = commands
            .into_iter()
            .map(|command| (command.id.clone(), command))
            .collect();

        let mut suggestions: Vec<Suggestion> = self
            .recent
            .iter()
            .filter_map(|id| by_id.remove(id))
            .map(|command| {
                Suggestion::new(SuggestionItem::Command {
                    command,
                    is_recent: true,
                })
            })
            .collect();

        let mut rest: Vec<CommandInfo> = by_id.into_values().collect();
        rest.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        suggestions.extend(rest.into_iter().map(|command| {
            Suggestion::new(SuggestionItem::Command {
                command,
                is_recent: false,
            })
        }));
        suggestions
    }
}

impl SuggestionHandler for CommandHandler {
    fn mode(&self) -> Mode {
        Mode::CommandList
    }

    fn validate_command(
        &mut self,
        info: &mut InputInfo,
        found: &TriggerMatch,
        _active: Option<&Suggestion>,
    ) -> bool {
        info.validate(
            Mode::CommandList,
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
        let commands = self.deps.host.commands();

        let suggestions = if query.has_search_term {
            commands
                .into_iter()
                .filter_map(|command| {
                    let found = self.deps.matcher.fuzzy_match(&query.prepared, &command.name)?;
                    let is_recent = self.recent.contains(&command.id);
                    Some(
                        Suggestion::new(SuggestionItem::Command { command, is_recent })
                            .with_match(MatchType::Primary, Some(found)),
                    )
                })
                .collect()
        } else {
            self.browse(commands)
        };

        Gather::Ready(finalize(
            &self.deps,
            &info.env,
            suggestions,
            query.has_search_term,
        ))
    }

    fn render(&self, suggestion: &Suggestion, row: &mut RenderedRow) {
        let SuggestionItem::Command { command, is_recent } = &suggestion.item else {
            return;
        };
        row.text = command.name.clone();
        row.highlights = suggestion
            .search_match
            .as_ref()
            .map(|found| found.offsets.clone())
            .unwrap_or_default();
        if *is_recent {
            row.indicator = Some("↺".to_string());
        }
        row.classes.push("qsp-suggestion-command".to_string());
    }

    fn choose(&mut self, suggestion: &Suggestion, _modifiers: Modifiers) -> Result<(), HostError> {
        let SuggestionItem::Command { command, .. } = &suggestion.item else {
            return Ok(());
        };
        self.deps.host.perform(HostAction::ExecuteCommand {
            id: command.id.clone(),
        })?;
        self.recent.record(&command.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::RecentCommands;

    #[test]
    fn recent_commands_are_bounded_and_deduplicated() {
        let mut recent = RecentCommands::new(2);
        recent.record("a");
        recent.record("b");
        recent.record("a");
        assert_eq!(recent.iter().collect::<Vec<_>>(), vec!["a", "b"]);
        recent.record("c");
        assert_eq!(recent.iter().collect::<Vec<_>>(), vec!["c", "a"]);
        assert_eq!(recent.len(), 2);
    }
}
