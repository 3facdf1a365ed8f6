use std::collections::BTreeSet;

use thiserror::Error;
use tracing::warn;

use crate::config::{compile_patterns, Settings};
use crate::mode::Mode;
use crate::ranking::PriorityCategory;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("{0}")]
    InvalidPattern(String),
    #[error("{0}")]
    InvalidTrigger(String),
    #[error("{0}")]
    OutOfRange(String),
}

pub fn validate_patterns(patterns: &[String]) -> Result<Vec<String>, SettingsError> {
    let deduped = dedupe(patterns);
    compile_patterns(&deduped).map_err(SettingsError::InvalidPattern)?;
    Ok(deduped)
}

pub fn validate_trigger(mode: Mode, value: &str) -> Result<String, SettingsError> {
    if mode == Mode::Standard {
        return Err(SettingsError::InvalidTrigger(
            "Standard mode has no trigger.".to_string(),
        ));
    }
    if value.is_empty() {
        return Err(SettingsError::InvalidTrigger(format!(
            "Trigger for {} must not be empty.",
            mode.as_str()
        )));
    }
    if value.trim().is_empty() {
        return Err(SettingsError::InvalidTrigger(format!(
            "Trigger for {} must contain a visible character.",
            mode.as_str()
        )));
    }
    Ok(value.to_string())
}

pub fn validate_limit(value: usize) -> Result<(), SettingsError> {
    if (1..=500).contains(&value) {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange(
            "Limit must be between 1 and 500.".to_string(),
        ))
    }
}

pub fn validate_percent(value: f64) -> Result<(), SettingsError> {
    if value.is_finite() && (-100.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange(
            "Adjustment must be between -100 and 100 percent.".to_string(),
        ))
    }
}

/// Applies user edits to a settings value. A rejected edit leaves the prior
/// value in effect.
#[derive(Debug)]
pub struct SettingsEditor {
    settings: Settings,
}

impl SettingsEditor {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn into_settings(self) -> Settings {
        self.settings
    }

    pub fn set_exclude_folders(&mut self, patterns: &[String]) -> Result<(), SettingsError> {
        let patterns = logged(validate_patterns(patterns), "exclude_folders")?;
        self.settings.exclude_folders = patterns;
        Ok(())
    }

    pub fn set_exclude_related_folders(&mut self, patterns: &[String]) -> Result<(), SettingsError> {
        let patterns = logged(validate_patterns(patterns), "exclude_related_folders")?;
        self.settings.exclude_related_folders = patterns;
        Ok(())
    }

    pub fn set_include_side_panel_view_types(&mut self, view_types: &[String]) {
        self.settings.include_side_panel_view_types = dedupe(view_types);
    }

    /// An empty value restores the default trigger for `mode`.
    pub fn set_trigger(&mut self, mode: Mode, value: &str) -> Result<(), SettingsError> {
        let defaults = Settings::default();
        let value = if value.is_empty() {
            defaults.trigger_for(mode).unwrap_or_default()
        } else {
            value
        };
        let trigger = logged(validate_trigger(mode, value), "trigger")?;
        let slot = match mode {
            Mode::Standard => return Ok(()),
            Mode::EditorList => &mut self.settings.editor_list_command,
            Mode::SymbolList => &mut self.settings.symbol_list_command,
            Mode::WorkspaceList => &mut self.settings.workspace_list_command,
            Mode::HeadingsList => &mut self.settings.headings_list_command,
            Mode::StarredList => &mut self.settings.starred_list_command,
            Mode::CommandList => &mut self.settings.command_list_command,
            Mode::RelatedItemsList => &mut self.settings.related_items_list_command,
        };
        *slot = trigger;
        Ok(())
    }

    pub fn set_limit(&mut self, value: usize) -> Result<(), SettingsError> {
        logged(validate_limit(value), "limit")?;
        self.settings.limit = value;
        Ok(())
    }

    pub fn set_priority_adjustment(
        &mut self,
        category: PriorityCategory,
        percent: f64,
    ) -> Result<(), SettingsError> {
        logged(validate_percent(percent), "match_priority_adjustments")?;
        if percent == 0.0 {
            self.settings
                .match_priority_adjustments
                .adjustments
                .remove(&category);
        } else {
            self.settings
                .match_priority_adjustments
                .adjustments
                .insert(category, percent);
        }
        Ok(())
    }

    pub fn set_ribbon_commands(&mut self, modes: &[Mode]) {
        self.settings.enabled_ribbon_commands = modes
            .iter()
            .copied()
            .filter(|mode| *mode != Mode::Standard)
            .collect::<BTreeSet<_>>();
    }
}

fn logged<T>(result: Result<T, SettingsError>, field: &str) -> Result<T, SettingsError> {
    if let Err(error) = &result {
        warn!(field, %error, "rejected settings change, keeping previous value");
    }
    result
}

fn dedupe(values: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    values
        .iter()
        .filter(|value| seen.insert(value.as_str()))
        .cloned()
        .collect()
}
