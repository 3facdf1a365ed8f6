use std::collections::HashSet;

use regex::Regex;
use tracing::{error, warn};

use crate::config::Settings;
use crate::mode::Mode;

/// A trigger found in the input, before any handler has validated it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerMatch {
    pub mode: Mode,
    /// Char index where the trigger starts.
    pub index: usize,
    pub filter_text: String,
}

#[derive(Debug)]
struct TriggerTable {
    regex: Regex,
    modes: Vec<Mode>,
}

impl TriggerTable {
    fn build(triggers: &[(Mode, String)], anchored: bool) -> Option<Self> {
        if triggers.is_empty() {
            return None;
        }

        let mut ordered: Vec<&(Mode, String)> = triggers.iter().collect();
        // longest first so a trigger that prefixes another never shadows it
        ordered.sort_by(|a, b| b.1.chars().count().cmp(&a.1.chars().count()));

        let alternation = ordered
            .iter()
            .map(|(mode, trigger)| format!("(?P<{}>{})", mode.as_str(), regex::escape(trigger)))
            .collect::<Vec<_>>()
            .join("|");
        let anchor = if anchored { "^" } else { "" };
        let pattern = format!("(?s){anchor}(?:{alternation})(?P<ft>.*)$");

        match Regex::new(&pattern) {
            Ok(regex) => Some(Self {
                regex,
                modes: ordered.iter().map(|(mode, _)| *mode).collect(),
            }),
            Err(error) => {
                error!(%error, pattern, "failed to build trigger regex");
                None
            }
        }
    }

    fn find(&self, input: &str) -> Option<TriggerMatch> {
        let captures = self.regex.captures(input)?;
        let (mode, start) = self.modes.iter().find_map(|mode| {
            captures
                .name(mode.as_str())
                .map(|group| (*mode, group.start()))
        })?;
        let filter_text = captures
            .name("ft")
            .map(|group| group.as_str().to_string())
            .unwrap_or_default();

        Some(TriggerMatch {
            mode,
            index: input[..start].chars().count(),
            filter_text,
        })
    }
}

/// Splits raw input into a mode trigger and the residual filter text.
///
/// Prefix modes only match at the start of the input. Sourced modes may match
/// anywhere, and only in contexts that allow an embedded command.
#[derive(Debug)]
pub struct CommandParser {
    prefix: Option<TriggerTable>,
    embedded: Option<TriggerTable>,
}

impl CommandParser {
    pub fn new(settings: &Settings) -> Self {
        let triggers = usable_triggers(settings);
        let split = |modes: &[Mode]| -> Vec<(Mode, String)> {
            triggers
                .iter()
                .filter(|(mode, _)| modes.contains(mode))
                .cloned()
                .collect()
        };

        Self {
            prefix: TriggerTable::build(&split(&Mode::PREFIX), true),
            embedded: TriggerTable::build(&split(&Mode::SOURCED), false),
        }
    }

    pub fn match_prefix(&self, input: &str) -> Option<TriggerMatch> {
        self.prefix.as_ref()?.find(input)
    }

    /// Leftmost sourced trigger, if `context` permits one.
    pub fn match_embedded(&self, input: &str, context: Mode) -> Option<TriggerMatch> {
        if !context.allows_embedded_command() {
            return None;
        }
        self.embedded.as_ref()?.find(input)
    }
}

/// Non-empty, distinct triggers in mode order. The first mode to claim a
/// trigger string keeps it.
fn usable_triggers(settings: &Settings) -> Vec<(Mode, String)> {
    let mut seen = HashSet::new();
    let mut triggers = Vec::new();

    for mode in Mode::ALL {
        let Some(trigger) = settings.trigger_for(mode) else {
            continue;
        };
        if trigger.is_empty() {
            warn!(mode = mode.as_str(), "ignoring empty trigger");
            continue;
        }
        if !seen.insert(trigger.to_string()) {
            warn!(mode = mode.as_str(), trigger, "ignoring duplicate trigger");
            continue;
        }
        triggers.push((mode, trigger.to_string()));
    }
    triggers
}

#[cfg(test)]
mod tests {
    use super::CommandParser;
    use crate::config::Settings;
    use crate::mode::Mode;

    #[test]
    fn prefix_trigger_must_start_input() {
        let parser = CommandParser::new(&Settings::default());
        let found = parser.match_prefix("edt notes").unwrap();
        assert_eq!(found.mode, Mode::EditorList);
        assert_eq!(found.index, 0);
        assert_eq!(found.filter_text, "notes");
        assert!(parser.match_prefix("x edt notes").is_none());
    }

    #[test]
    fn embedded_trigger_reports_char_index() {
        let parser = CommandParser::new(&Settings::default());
        let found = parser.match_embedded("héllo@foo", Mode::Standard).unwrap();
        assert_eq!(found.mode, Mode::SymbolList);
        assert_eq!(found.index, 5);
        assert_eq!(found.filter_text, "foo");
    }

    #[test]
    fn embedded_trigger_needs_permitting_context() {
        let parser = CommandParser::new(&Settings::default());
        assert!(parser.match_embedded("+ws@x", Mode::WorkspaceList).is_none());
        assert!(parser.match_embedded("#h@x", Mode::HeadingsList).is_some());
    }

    #[test]
    fn duplicate_trigger_keeps_first_mode() {
        let settings = Settings {
            headings_list_command: "+".to_string(),
            ..Settings::default()
        };
        let parser = CommandParser::new(&settings);
        assert_eq!(parser.match_prefix("+abc").unwrap().mode, Mode::WorkspaceList);
    }

    #[test]
    fn empty_trigger_never_matches() {
        let settings = Settings {
            editor_list_command: String::new(),
            ..Settings::default()
        };
        let parser = CommandParser::new(&settings);
        assert!(parser.match_prefix("anything").is_none());
        assert_eq!(parser.match_prefix("#h").unwrap().mode, Mode::HeadingsList);
    }
}
