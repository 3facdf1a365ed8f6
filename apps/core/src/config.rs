use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mode::{LinkKind, Mode, RelationType, SymbolKind};
use crate::ranking::RankingPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json config: {0}")]
    Json(#[from] json5::Error),
    #[error("invalid toml config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to encode toml config: {0}")]
    TomlEncode(#[from] toml::ser::Error),
    #[error("failed to encode json config: {0}")]
    JsonEncode(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub editor_list_command: String,
    pub symbol_list_command: String,
    pub workspace_list_command: String,
    pub headings_list_command: String,
    pub starred_list_command: String,
    pub command_list_command: String,
    pub related_items_list_command: String,

    pub limit: usize,

    pub symbols_in_line_order: bool,
    pub select_nearest_heading: bool,
    pub always_new_pane_for_symbols: bool,
    pub enabled_symbol_types: BTreeSet<SymbolKind>,
    pub exclude_link_sub_types: BTreeSet<LinkKind>,

    pub strict_headings_only: bool,
    pub search_all_headings: bool,
    pub show_existing_only: bool,
    pub show_attachments: bool,
    pub show_all_file_types: bool,
    pub exclude_folders: Vec<String>,

    pub exclude_view_types: Vec<String>,
    pub reference_views: Vec<String>,
    pub include_side_panel_view_types: Vec<String>,

    pub enabled_related_items: BTreeSet<RelationType>,
    pub exclude_related_folders: Vec<String>,
    pub exclude_open_related_files: bool,

    pub enabled_ribbon_commands: BTreeSet<Mode>,
    pub max_recent_commands: usize,

    pub match_priority_adjustments: RankingPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            editor_list_command: "edt ".to_string(),
            symbol_list_command: "@".to_string(),
            workspace_list_command: "+".to_string(),
            headings_list_command: "#".to_string(),
            starred_list_command: "'".to_string(),
            command_list_command: ">".to_string(),
            related_items_list_command: "~".to_string(),
            limit: 50,
            symbols_in_line_order: true,
            select_nearest_heading: true,
            always_new_pane_for_symbols: false,
            enabled_symbol_types: SymbolKind::ALL.into_iter().collect(),
            exclude_link_sub_types: BTreeSet::new(),
            strict_headings_only: false,
            search_all_headings: true,
            show_existing_only: false,
            show_attachments: false,
            show_all_file_types: false,
            exclude_folders: Vec::new(),
            exclude_view_types: vec!["empty".to_string()],
            reference_views: ["backlink", "localgraph", "outgoing-link", "outline"]
                .map(String::from)
                .to_vec(),
            include_side_panel_view_types: ["backlink", "image", "markdown", "pdf"]
                .map(String::from)
                .to_vec(),
            enabled_related_items: [
                RelationType::Backlink,
                RelationType::OutgoingLink,
                RelationType::DiskLocation,
            ]
            .into_iter()
            .collect(),
            exclude_related_folders: Vec::new(),
            exclude_open_related_files: false,
            enabled_ribbon_commands: [Mode::HeadingsList, Mode::SymbolList]
                .into_iter()
                .collect(),
            max_recent_commands: 25,
            match_priority_adjustments: RankingPolicy::default(),
        }
    }
}

impl Settings {
    /// Trigger string configured for `mode`; Standard has none.
    pub fn trigger_for(&self, mode: Mode) -> Option<&str> {
        let trigger = match mode {
            Mode::Standard => return None,
            Mode::EditorList => &self.editor_list_command,
            Mode::SymbolList => &self.symbol_list_command,
            Mode::WorkspaceList => &self.workspace_list_command,
            Mode::HeadingsList => &self.headings_list_command,
            Mode::StarredList => &self.starred_list_command,
            Mode::CommandList => &self.command_list_command,
            Mode::RelatedItemsList => &self.related_items_list_command,
        };
        Some(trigger.as_str())
    }

    pub fn is_symbol_type_enabled(&self, kind: SymbolKind) -> bool {
        self.enabled_symbol_types.contains(&kind)
    }

    /// Whether `extension` belongs in file-oriented result lists.
    pub fn should_include_extension(&self, extension: &str) -> bool {
        match extension {
            "md" => true,
            "canvas" | "pdf" | "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "mp3" | "mp4"
            | "webm" | "wav" => self.show_attachments,
            _ => self.show_all_file_types,
        }
    }
}

/// Compiles a user-supplied pattern list, failing on the first bad pattern.
pub fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>, String> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|error| format!("invalid pattern '{pattern}': {error}"))
        })
        .collect()
}

pub fn default_config_path() -> PathBuf {
    std::env::temp_dir().join("quickswitch").join("config.toml")
}

pub fn validate(settings: &Settings) -> Result<(), String> {
    if settings.limit == 0 || settings.limit > 500 {
        return Err("limit must be between 1 and 500".into());
    }
    if settings.max_recent_commands == 0 || settings.max_recent_commands > 100 {
        return Err("max_recent_commands must be between 1 and 100".into());
    }
    settings.match_priority_adjustments.validate()?;
    compile_patterns(&settings.exclude_folders)?;
    compile_patterns(&settings.exclude_related_folders)?;
    Ok(())
}

/// Loads settings from `path` (TOML, or JSON/JSON5 by extension). A missing
/// file yields defaults.
pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(Settings::default());
    }

    let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;

    let settings: Settings = if is_json_path(&path) {
        json5::from_str(&raw)?
    } else {
        toml::from_str(&raw)?
    };

    validate(&settings).map_err(ConfigError::Invalid)?;
    Ok(settings)
}

pub fn save(settings: &Settings, path: &Path) -> Result<(), ConfigError> {
    validate(settings).map_err(ConfigError::Invalid)?;

    let encoded = if is_json_path(path) {
        serde_json::to_string_pretty(settings)?
    } else {
        toml::to_string_pretty(settings)?
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, encoded).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn is_json_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("json") | Some("json5")
    )
}
