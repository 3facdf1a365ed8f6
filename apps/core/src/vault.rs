use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::host::{
    CalloutSection, FileMetadata, FileRef, HeadingCache, LinkCache, Position, TagCache,
    VaultSnapshot,
};
use crate::symbols::parse_callout_header;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("vault root {} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("failed to walk vault: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid markdown pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Pulls headings, tags, wiki links, embeds, callouts and frontmatter
/// aliases out of markdown text.
#[derive(Debug, Clone)]
pub struct MarkdownExtractor {
    heading: Regex,
    tag: Regex,
    link: Regex,
}

impl MarkdownExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            heading: Regex::new(r"^(#{1,6})[ \t]+(.+?)(?:[ \t]+#+)?[ \t]*$")?,
            tag: Regex::new(r"(?:^|\s)(#[\p{L}\p{N}_/-]*[\p{L}_/-][\p{L}\p{N}_/-]*)")?,
            link: Regex::new(r"(!?)\[\[([^\]|]+)(?:\|([^\]]*))?\]\]")?,
        })
    }

    pub fn extract(&self, content: &str) -> FileMetadata {
        let mut metadata = FileMetadata::default();
        let lines: Vec<&str> = content.lines().collect();

        let body_start = match frontmatter_end(&lines) {
            Some(end) => {
                metadata.aliases = parse_aliases(&lines[1..end]);
                end + 1
            }
            None => 0,
        };

        let mut in_fence = false;
        for (line_no, line) in lines.iter().enumerate().skip(body_start) {
            let trimmed = line.trim_start();
            if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
                in_fence = !in_fence;
                continue;
            }
            if in_fence {
                continue;
            }

            if let Some(captures) = self.heading.captures(line) {
                let level = captures.get(1).map_or(1, |m| m.as_str().len()) as u8;
                let text = captures.get(2).map_or("", |m| m.as_str()).trim();
                metadata.headings.push(HeadingCache {
                    heading: text.to_string(),
                    level,
                    position: Position::new(line_no, 0),
                });
            }

            if parse_callout_header(line).is_some() {
                metadata.callouts.push(CalloutSection {
                    position: Position::new(line_no, 0),
                });
            }

            for captures in self.tag.captures_iter(line) {
                if let Some(tag) = captures.get(1) {
                    metadata.tags.push(TagCache {
                        tag: tag.as_str().to_string(),
                        position: Position::new(line_no, char_col(line, tag.start())),
                    });
                }
            }

            for captures in self.link.captures_iter(line) {
                let (Some(whole), Some(target)) = (captures.get(0), captures.get(2)) else {
                    continue;
                };
                let link = LinkCache {
                    link: target.as_str().trim().to_string(),
                    display_text: captures
                        .get(3)
                        .map(|display| display.as_str().trim().to_string())
                        .filter(|display| !display.is_empty()),
                    position: Position::new(line_no, char_col(line, whole.start())),
                };
                if captures.get(1).is_some_and(|bang| !bang.as_str().is_empty()) {
                    metadata.embeds.push(link);
                } else {
                    metadata.links.push(link);
                }
            }
        }
        metadata
    }
}

/// Builds an in-memory host from a vault directory on disk.
pub struct FsVault;

impl FsVault {
    pub fn scan(root: &Path) -> Result<VaultSnapshot, VaultError> {
        if !root.is_dir() {
            return Err(VaultError::NotADirectory(root.to_path_buf()));
        }
        let extractor = MarkdownExtractor::new()?;

        let mut paths: Vec<PathBuf> = Vec::new();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));
        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_file() {
                paths.push(entry.into_path());
            }
        }
        paths.sort();

        let mut snapshot = VaultSnapshot::default();
        snapshot.root = Some(root.to_path_buf());

        for path in &paths {
            let Some(relative) = vault_relative(root, path) else {
                warn!(path = %path.display(), "skipping path outside vault");
                continue;
            };
            let file = FileRef::new(relative);
            let metadata = if file.extension() == "md" {
                let content = std::fs::read_to_string(path).map_err(|source| VaultError::Read {
                    path: path.clone(),
                    source,
                })?;
                extractor.extract(&content)
            } else {
                FileMetadata::default()
            };
            snapshot.add_file(&file.path, metadata);
        }

        resolve_links(&mut snapshot);
        debug!(
            root = %root.display(),
            files = snapshot.files.len(),
            "scanned vault"
        );
        Ok(snapshot)
    }
}

/// Fills the resolved and unresolved link maps from each file's links and
/// embeds.
pub fn resolve_links(snapshot: &mut VaultSnapshot) {
    let files = snapshot.files.clone();
    for file in &files {
        let Some(metadata) = snapshot.metadata.get(&file.path) else {
            continue;
        };
        let mut resolved = BTreeSet::new();
        let mut unresolved = BTreeSet::new();

        for link in metadata.links.iter().chain(metadata.embeds.iter()) {
            let target = link_target(&link.link);
            if target.is_empty() {
                continue;
            }
            match resolve_target(&files, target) {
                Some(found) => {
                    resolved.insert(found.path.clone());
                }
                None => {
                    unresolved.insert(target.to_string());
                }
            }
        }

        if !resolved.is_empty() {
            snapshot.resolved.insert(file.path.clone(), resolved);
        }
        if !unresolved.is_empty() {
            snapshot.unresolved.insert(file.path.clone(), unresolved);
        }
    }
}

/// Link text without any `#heading` or `|display` suffix.
fn link_target(link: &str) -> &str {
    let end = link.find(['#', '|']).unwrap_or(link.len());
    link[..end].trim()
}

fn resolve_target<'a>(files: &'a [FileRef], target: &str) -> Option<&'a FileRef> {
    let wanted = target.to_lowercase();
    let with_md = format!("{wanted}.md");
    files
        .iter()
        .find(|file| {
            let path = file.path.to_lowercase();
            path == wanted || path == with_md
        })
        .or_else(|| {
            let name = wanted.rsplit('/').next().unwrap_or(&wanted);
            files.iter().find(|file| {
                file.basename().to_lowercase() == name || file.name().to_lowercase() == name
            })
        })
}

fn frontmatter_end(lines: &[&str]) -> Option<usize> {
    if lines.first().map(|line| line.trim_end()) != Some("---") {
        return None;
    }
    lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, line)| line.trim_end() == "---")
        .map(|(index, _)| index)
}

/// Reads `alias`/`aliases` as an inline value, a `[a, b]` list or a block
/// list of `- item` lines.
fn parse_aliases(frontmatter: &[&str]) -> Vec<String> {
    let mut aliases = Vec::new();
    let mut in_block = false;

    for line in frontmatter {
        if in_block {
            if let Some(item) = line.trim_start().strip_prefix("- ") {
                push_alias(&mut aliases, item);
                continue;
            }
            in_block = false;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if !matches!(key.trim(), "alias" | "aliases") {
            continue;
        }
        let value = value.trim();
        if value.is_empty() {
            in_block = true;
        } else if let Some(list) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
            list.split(',').for_each(|item| push_alias(&mut aliases, item));
        } else {
            value.split(',').for_each(|item| push_alias(&mut aliases, item));
        }
    }
    aliases
}

fn push_alias(aliases: &mut Vec<String>, raw: &str) {
    let alias = raw.trim().trim_matches(['"', '\'']).trim();
    if !alias.is_empty() && !aliases.iter().any(|existing| existing == alias) {
        aliases.push(alias.to_string());
    }
}

fn char_col(line: &str, byte_index: usize) -> usize {
    line[..byte_index].chars().count()
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|name| name.starts_with('.'))
}

fn vault_relative(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::{link_target, parse_aliases, MarkdownExtractor};

    const NOTE: &str = "---\naliases: [First, \"Second\"]\n---\n# Title\nSome #tag and [[Other#Part|shown]].\n\n```\n# not a heading\n```\n> [!note] Remember\n> body\n![[image.png]]\n## Sub ##\n";

    #[test]
    fn extracts_markdown_symbols() {
        let metadata = MarkdownExtractor::new().unwrap().extract(NOTE);
        assert_eq!(metadata.aliases, vec!["First".to_string(), "Second".to_string()]);

        let headings: Vec<(&str, u8, usize)> = metadata
            .headings
            .iter()
            .map(|h| (h.heading.as_str(), h.level, h.position.line))
            .collect();
        assert_eq!(headings, vec![("Title", 1, 3), ("Sub", 2, 12)]);

        assert_eq!(metadata.tags.len(), 1);
        assert_eq!(metadata.tags[0].tag, "#tag");
        assert_eq!(metadata.tags[0].position.col, 5);

        assert_eq!(metadata.links.len(), 1);
        assert_eq!(metadata.links[0].link, "Other#Part");
        assert_eq!(metadata.links[0].display_text.as_deref(), Some("shown"));

        assert_eq!(metadata.embeds.len(), 1);
        assert_eq!(metadata.embeds[0].link, "image.png");

        assert_eq!(metadata.callouts.len(), 1);
        assert_eq!(metadata.callouts[0].position.line, 9);
    }

    #[test]
    fn block_alias_lists() {
        let aliases = parse_aliases(&["aliases:", "  - one", "  - two", "tags: x"]);
        assert_eq!(aliases, vec!["one".to_string(), "two".to_string()]);
        assert_eq!(parse_aliases(&["alias: solo"]), vec!["solo".to_string()]);
    }

    #[test]
    fn link_target_strips_suffixes() {
        assert_eq!(link_target("note#Heading|text"), "note");
        assert_eq!(link_target("#local"), "");
    }
}
