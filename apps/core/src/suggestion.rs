use serde::{Deserialize, Serialize};

use crate::fuzzy::{Scored, SearchMatch};
use crate::host::{CommandInfo, FileRef, HeadingCache, PaneInfo, StarredItem};
use crate::mode::{Mode, RelationType};
use crate::symbols::SymbolInfo;

/// Which field a successful match was found against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    #[default]
    None,
    Primary,
    Basename,
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    File,
    Alias,
    Unresolved,
    Editor,
    Heading,
    Symbol,
    Workspace,
    Starred,
    Command,
    RelatedItem,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SuggestionItem {
    File {
        file: FileRef,
    },
    Alias {
        alias: String,
        file: FileRef,
    },
    Unresolved {
        link_text: String,
    },
    Editor {
        pane: PaneInfo,
    },
    Heading {
        heading: HeadingCache,
        file: FileRef,
    },
    Symbol {
        symbol: SymbolInfo,
        file: FileRef,
    },
    Workspace {
        id: String,
    },
    Starred {
        item: StarredItem,
        file: Option<FileRef>,
    },
    Command {
        command: CommandInfo,
        is_recent: bool,
    },
    RelatedItem {
        file: FileRef,
        relation: RelationType,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionFlags {
    pub is_open_in_editor: bool,
    pub is_starred: bool,
    pub is_recent: bool,
    pub downranked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub item: SuggestionItem,
    pub match_type: MatchType,
    #[serde(rename = "match")]
    pub search_match: Option<SearchMatch>,
    pub flags: SuggestionFlags,
}

impl Suggestion {
    pub fn new(item: SuggestionItem) -> Self {
        Self {
            item,
            match_type: MatchType::None,
            search_match: None,
            flags: SuggestionFlags::default(),
        }
    }

    pub fn with_match(mut self, match_type: MatchType, search_match: Option<SearchMatch>) -> Self {
        self.match_type = match_type;
        self.search_match = search_match;
        self
    }

    pub fn kind(&self) -> SuggestionKind {
        match &self.item {
            SuggestionItem::File { .. } => SuggestionKind::File,
            SuggestionItem::Alias { .. } => SuggestionKind::Alias,
            SuggestionItem::Unresolved { .. } => SuggestionKind::Unresolved,
            SuggestionItem::Editor { .. } => SuggestionKind::Editor,
            SuggestionItem::Heading { .. } => SuggestionKind::Heading,
            SuggestionItem::Symbol { .. } => SuggestionKind::Symbol,
            SuggestionItem::Workspace { .. } => SuggestionKind::Workspace,
            SuggestionItem::Starred { .. } => SuggestionKind::Starred,
            SuggestionItem::Command { .. } => SuggestionKind::Command,
            SuggestionItem::RelatedItem { .. } => SuggestionKind::RelatedItem,
        }
    }

    /// The file this suggestion refers to, if any.
    pub fn file(&self) -> Option<&FileRef> {
        match &self.item {
            SuggestionItem::File { file }
            | SuggestionItem::Alias { file, .. }
            | SuggestionItem::Heading { file, .. }
            | SuggestionItem::Symbol { file, .. }
            | SuggestionItem::RelatedItem { file, .. } => Some(file),
            SuggestionItem::Editor { pane } => pane.file.as_ref(),
            SuggestionItem::Starred { file, .. } => file.as_ref(),
            SuggestionItem::Unresolved { .. }
            | SuggestionItem::Workspace { .. }
            | SuggestionItem::Command { .. } => None,
        }
    }

    /// The mode whose handler owns this suggestion. File, alias and
    /// unresolved suggestions are produced by the headings handler.
    pub fn owning_mode(&self) -> Mode {
        match self.kind() {
            SuggestionKind::Editor => Mode::EditorList,
            SuggestionKind::Symbol => Mode::SymbolList,
            SuggestionKind::Workspace => Mode::WorkspaceList,
            SuggestionKind::Heading
            | SuggestionKind::File
            | SuggestionKind::Alias
            | SuggestionKind::Unresolved => Mode::HeadingsList,
            SuggestionKind::Starred => Mode::StarredList,
            SuggestionKind::Command => Mode::CommandList,
            SuggestionKind::RelatedItem => Mode::RelatedItemsList,
        }
    }

    /// Whether this suggestion can anchor a sourced operation.
    pub fn can_be_source(&self) -> bool {
        !matches!(
            self.kind(),
            SuggestionKind::Symbol
                | SuggestionKind::Workspace
                | SuggestionKind::Unresolved
                | SuggestionKind::Command
        )
    }
}

impl Scored for Suggestion {
    fn score(&self) -> Option<f64> {
        self.search_match.as_ref().map(|found| found.score)
    }
}
