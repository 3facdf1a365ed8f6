use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("file not found: {0}")]
    FileNotFound(String),
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("host rejected action: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// A vault file, identified by its vault-relative `/`-separated path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileRef {
    pub path: String,
}

impl FileRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// File name including extension.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub fn extension(&self) -> &str {
        let name = self.name();
        match name.rfind('.') {
            Some(index) if index > 0 => &name[index + 1..],
            _ => "",
        }
    }

    /// File name without extension.
    pub fn basename(&self) -> &str {
        let name = self.name();
        match name.rfind('.') {
            Some(index) if index > 0 => &name[..index],
            _ => name,
        }
    }

    pub fn parent(&self) -> &str {
        match self.path.rfind('/') {
            Some(index) => &self.path[..index],
            None => "",
        }
    }

    /// Path with a trailing `.md` removed, the form shown to users.
    pub fn display_path(&self) -> &str {
        if self.extension() == "md" {
            &self.path[..self.path.len() - 3]
        } else {
            &self.path
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PaneId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaneInfo {
    pub id: PaneId,
    pub view_type: String,
    pub display_text: String,
    pub file: Option<FileRef>,
    pub cursor: Option<Position>,
    pub in_main_area: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingCache {
    pub heading: String,
    pub level: u8,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCache {
    pub tag: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCache {
    pub link: String,
    pub display_text: Option<String>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalloutSection {
    pub position: Position,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub headings: Vec<HeadingCache>,
    pub tags: Vec<TagCache>,
    pub links: Vec<LinkCache>,
    pub embeds: Vec<LinkCache>,
    pub callouts: Vec<CalloutSection>,
    pub aliases: Vec<String>,
}

impl FileMetadata {
    /// The first level-1 heading by line, if any.
    pub fn first_h1(&self) -> Option<&HeadingCache> {
        self.headings
            .iter()
            .filter(|heading| heading.level == 1)
            .min_by_key(|heading| heading.position.line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StarredItem {
    File { title: String, path: String },
    Search { title: String, query: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaneTarget {
    Reuse,
    NewTab,
    Split,
    NewWindow,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub mod_key: bool,
    pub alt: bool,
    pub shift: bool,
}

impl PaneTarget {
    pub fn from_modifiers(modifiers: Modifiers) -> Self {
        match (modifiers.mod_key, modifiers.alt, modifiers.shift) {
            (true, true, true) => Self::NewWindow,
            (true, true, false) => Self::Split,
            (true, _, _) => Self::NewTab,
            _ => Self::Reuse,
        }
    }
}

/// Navigation requested by a chosen suggestion; performed by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum HostAction {
    OpenFile {
        path: String,
        target: PaneTarget,
        position: Option<Position>,
    },
    ActivatePane {
        pane: PaneId,
        position: Option<Position>,
    },
    OpenLinkText {
        link_text: String,
        target: PaneTarget,
    },
    LoadWorkspace {
        id: String,
    },
    ExecuteCommand {
        id: String,
    },
}

/// Read-only views of host state plus the two side-effecting entry points.
#[async_trait]
pub trait HostApp: Send + Sync {
    fn files(&self) -> Vec<FileRef>;
    fn file_by_path(&self, path: &str) -> Option<FileRef>;
    fn metadata(&self, file: &FileRef) -> Option<FileMetadata>;
    /// source path -> distinct unresolved link texts
    fn unresolved_links(&self) -> BTreeMap<String, BTreeSet<String>>;
    /// source path -> resolved target paths
    fn resolved_links(&self) -> BTreeMap<String, BTreeSet<String>>;
    fn open_panes(&self) -> Vec<PaneInfo>;
    fn active_pane(&self) -> Option<PaneInfo>;
    /// `None` when the host starred provider is disabled.
    fn starred_items(&self) -> Option<Vec<StarredItem>>;
    /// `None` when the host workspaces provider is disabled.
    fn workspaces(&self) -> Option<Vec<String>>;
    fn commands(&self) -> Vec<CommandInfo>;
    fn recent_file_paths(&self) -> Vec<String>;
    fn is_user_ignored(&self, path: &str) -> bool;
    async fn read_file(&self, file: &FileRef) -> Result<String, HostError>;
    fn perform(&self, action: HostAction) -> Result<(), HostError>;
}

/// In-memory host state. File contents come from `contents`, else from disk
/// under `root` when set.
#[derive(Debug, Default)]
pub struct VaultSnapshot {
    pub root: Option<PathBuf>,
    pub files: Vec<FileRef>,
    pub metadata: HashMap<String, FileMetadata>,
    pub contents: HashMap<String, String>,
    pub unresolved: BTreeMap<String, BTreeSet<String>>,
    pub resolved: BTreeMap<String, BTreeSet<String>>,
    pub panes: Vec<PaneInfo>,
    pub active_pane: Option<PaneId>,
    pub starred: Option<Vec<StarredItem>>,
    pub workspaces: Option<Vec<String>>,
    pub commands: Vec<CommandInfo>,
    pub recent: Vec<String>,
    pub ignored_prefixes: Vec<String>,
    performed: Mutex<Vec<HostAction>>,
}

impl VaultSnapshot {
    pub fn add_file(&mut self, path: &str, metadata: FileMetadata) -> FileRef {
        let file = FileRef::new(path);
        if !self.files.contains(&file) {
            self.files.push(file.clone());
        }
        self.metadata.insert(path.to_string(), metadata);
        file
    }

    /// Opens `file` in a new main-area markdown pane and returns its id.
    pub fn open_pane(&mut self, file: &FileRef, cursor: Option<Position>) -> PaneId {
        let id = PaneId(self.panes.len() as u64 + 1);
        self.panes.push(PaneInfo {
            id,
            view_type: "markdown".to_string(),
            display_text: file.basename().to_string(),
            file: Some(file.clone()),
            cursor,
            in_main_area: true,
        });
        id
    }

    pub fn performed_actions(&self) -> Vec<HostAction> {
        self.performed
            .lock()
            .map(|actions| actions.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl HostApp for VaultSnapshot {
    fn files(&self) -> Vec<FileRef> {
        self.files.clone()
    }

    fn file_by_path(&self, path: &str) -> Option<FileRef> {
        self.files.iter().find(|file| file.path == path).cloned()
    }

    fn metadata(&self, file: &FileRef) -> Option<FileMetadata> {
        self.metadata.get(&file.path).cloned()
    }

    fn unresolved_links(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.unresolved.clone()
    }

    fn resolved_links(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.resolved.clone()
    }

    fn open_panes(&self) -> Vec<PaneInfo> {
        self.panes.clone()
    }

    fn active_pane(&self) -> Option<PaneInfo> {
        let id = self.active_pane?;
        self.panes.iter().find(|pane| pane.id == id).cloned()
    }

    fn starred_items(&self) -> Option<Vec<StarredItem>> {
        self.starred.clone()
    }

    fn workspaces(&self) -> Option<Vec<String>> {
        self.workspaces.clone()
    }

    fn commands(&self) -> Vec<CommandInfo> {
        self.commands.clone()
    }

    fn recent_file_paths(&self) -> Vec<String> {
        self.recent.clone()
    }

    fn is_user_ignored(&self, path: &str) -> bool {
        self.ignored_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    async fn read_file(&self, file: &FileRef) -> Result<String, HostError> {
        if let Some(content) = self.contents.get(&file.path) {
            return Ok(content.clone());
        }
        let Some(root) = &self.root else {
            return Err(HostError::FileNotFound(file.path.clone()));
        };
        tokio::fs::read_to_string(root.join(&file.path))
            .await
            .map_err(|source| HostError::Io {
                path: file.path.clone(),
                source,
            })
    }

    fn perform(&self, action: HostAction) -> Result<(), HostError> {
        let mut performed = self
            .performed
            .lock()
            .map_err(|_| HostError::Rejected("action log poisoned".to_string()))?;
        performed.push(action);
        Ok(())
    }
}
