use serde::{Deserialize, Serialize};

/// The exclusive operating state of the switcher for one input string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Standard,
    EditorList,
    SymbolList,
    WorkspaceList,
    HeadingsList,
    StarredList,
    CommandList,
    RelatedItemsList,
}

impl Mode {
    pub const ALL: [Mode; 8] = [
        Mode::Standard,
        Mode::EditorList,
        Mode::SymbolList,
        Mode::WorkspaceList,
        Mode::HeadingsList,
        Mode::StarredList,
        Mode::CommandList,
        Mode::RelatedItemsList,
    ];

    /// Modes whose trigger must appear at the very start of the input.
    pub const PREFIX: [Mode; 5] = [
        Mode::EditorList,
        Mode::WorkspaceList,
        Mode::HeadingsList,
        Mode::StarredList,
        Mode::CommandList,
    ];

    /// Modes anchored to a source file; their trigger may follow other input.
    pub const SOURCED: [Mode; 2] = [Mode::SymbolList, Mode::RelatedItemsList];

    pub fn is_sourced(self) -> bool {
        Self::SOURCED.contains(&self)
    }

    /// Contexts in which an embedded (sourced) trigger is honoured.
    pub fn allows_embedded_command(self) -> bool {
        matches!(
            self,
            Mode::Standard | Mode::EditorList | Mode::HeadingsList | Mode::StarredList
        )
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "standard" => Some(Self::Standard),
            "editor" | "editors" | "editor_list" => Some(Self::EditorList),
            "symbol" | "symbols" | "symbol_list" => Some(Self::SymbolList),
            "workspace" | "workspaces" | "workspace_list" => Some(Self::WorkspaceList),
            "heading" | "headings" | "headings_list" => Some(Self::HeadingsList),
            "starred" | "starred_list" => Some(Self::StarredList),
            "command" | "commands" | "command_list" => Some(Self::CommandList),
            "related" | "related_items" | "related_items_list" => Some(Self::RelatedItemsList),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::EditorList => "editor_list",
            Self::SymbolList => "symbol_list",
            Self::WorkspaceList => "workspace_list",
            Self::HeadingsList => "headings_list",
            Self::StarredList => "starred_list",
            Self::CommandList => "command_list",
            Self::RelatedItemsList => "related_items_list",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Link,
    Embed,
    Tag,
    Heading,
    Callout,
}

impl SymbolKind {
    pub const ALL: [SymbolKind; 5] = [
        SymbolKind::Link,
        SymbolKind::Embed,
        SymbolKind::Tag,
        SymbolKind::Heading,
        SymbolKind::Callout,
    ];

    pub fn indicator(self) -> &'static str {
        match self {
            Self::Link => "🔗",
            Self::Embed => "!",
            Self::Tag => "#",
            Self::Heading => "H",
            Self::Callout => "C",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Normal,
    Heading,
    Block,
}

impl LinkKind {
    /// Classifies link text, ignoring any `|display` suffix.
    pub fn classify(link: &str) -> Self {
        let target = link.split('|').next().unwrap_or_default();
        if target.contains("#^") {
            Self::Block
        } else if target.contains('#') {
            Self::Heading
        } else {
            Self::Normal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    Backlink,
    OutgoingLink,
    DiskLocation,
}

pub fn heading_indicator(level: u8) -> &'static str {
    match level {
        1 => "H₁",
        2 => "H₂",
        3 => "H₃",
        4 => "H₄",
        5 => "H₅",
        _ => "H₆",
    }
}

#[cfg(test)]
mod tests {
    use super::{LinkKind, Mode};

    #[test]
    fn classifies_link_sub_types() {
        assert_eq!(LinkKind::classify("note"), LinkKind::Normal);
        assert_eq!(LinkKind::classify("note#Intro"), LinkKind::Heading);
        assert_eq!(LinkKind::classify("note#^abc123"), LinkKind::Block);
        assert_eq!(LinkKind::classify("note|see #1"), LinkKind::Normal);
    }

    #[test]
    fn sourced_modes_are_not_prefix_modes() {
        for mode in Mode::SOURCED {
            assert!(mode.is_sourced());
            assert!(!Mode::PREFIX.contains(&mode));
        }
        assert!(Mode::Standard.allows_embedded_command());
        assert!(!Mode::CommandList.allows_embedded_command());
    }

    #[test]
    fn parses_mode_names() {
        assert_eq!(Mode::parse("Symbols"), Some(Mode::SymbolList));
        assert_eq!(Mode::parse("related"), Some(Mode::RelatedItemsList));
        assert_eq!(Mode::parse("nope"), None);
        for mode in Mode::ALL {
            assert_eq!(Mode::parse(mode.as_str()), Some(mode));
        }
    }
}
