use std::collections::HashSet;

use crate::host::{HostApp, PaneInfo, StarredItem};
use crate::suggestion::Suggestion;

/// Host state captured once per keystroke and shared read-only by every
/// handler during that pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkspaceEnvList {
    pub open_files: HashSet<String>,
    pub starred_files: HashSet<String>,
    pub recent_files: HashSet<String>,
    pub active_pane: Option<PaneInfo>,
}

impl WorkspaceEnvList {
    pub fn capture(host: &dyn HostApp) -> Self {
        let open_files = host
            .open_panes()
            .into_iter()
            .filter_map(|pane| pane.file.map(|file| file.path))
            .collect();

        let starred_files = host
            .starred_items()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| match item {
                StarredItem::File { path, .. } => Some(path),
                StarredItem::Search { .. } => None,
            })
            .collect();

        let recent_files = host.recent_file_paths().into_iter().collect();

        Self {
            open_files,
            starred_files,
            recent_files,
            active_pane: host.active_pane(),
        }
    }

    /// Sets the open/starred/recent flags from this snapshot.
    pub fn tag(&self, suggestion: &mut Suggestion) {
        let Some(path) = suggestion.file().map(|file| file.path.clone()) else {
            return;
        };
        suggestion.flags.is_open_in_editor = self.open_files.contains(&path);
        suggestion.flags.is_starred = self.starred_files.contains(&path);
        suggestion.flags.is_recent = self.recent_files.contains(&path);
    }
}
