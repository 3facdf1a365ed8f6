use serde::{Deserialize, Serialize};

use crate::host::{HeadingCache, LinkCache, Position, TagCache};
use crate::mode::SymbolKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Symbol {
    Heading(HeadingCache),
    Tag(TagCache),
    Link(LinkCache),
    Embed(LinkCache),
    Callout {
        callout_type: String,
        title: String,
        position: Position,
    },
}

impl Symbol {
    pub fn kind(&self) -> SymbolKind {
        match self {
            Self::Heading(_) => SymbolKind::Heading,
            Self::Tag(_) => SymbolKind::Tag,
            Self::Link(_) => SymbolKind::Link,
            Self::Embed(_) => SymbolKind::Embed,
            Self::Callout { .. } => SymbolKind::Callout,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            Self::Heading(heading) => heading.position,
            Self::Tag(tag) => tag.position,
            Self::Link(link) | Self::Embed(link) => link.position,
            Self::Callout { position, .. } => *position,
        }
    }

    pub fn heading_level(&self) -> Option<u8> {
        match self {
            Self::Heading(heading) => Some(heading.level),
            _ => None,
        }
    }

    /// Text searched and displayed for this symbol.
    pub fn text(&self) -> String {
        match self {
            Self::Heading(heading) => heading.heading.clone(),
            Self::Tag(tag) => tag.tag.trim_start_matches('#').to_string(),
            Self::Link(link) | Self::Embed(link) => match &link.display_text {
                Some(display) if display != &link.link => format!("{}|{display}", link.link),
                _ => link.link.clone(),
            },
            Self::Callout {
                callout_type,
                title,
                ..
            } => {
                if title.is_empty() {
                    callout_type.clone()
                } else {
                    title.clone()
                }
            }
        }
    }

    pub fn indicator(&self) -> &'static str {
        match self {
            Self::Heading(heading) => crate::mode::heading_indicator(heading.level),
            other => other.kind().indicator(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub symbol: Symbol,
    pub indent_level: usize,
    pub is_selected: bool,
}

impl SymbolInfo {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            indent_level: 0,
            is_selected: false,
        }
    }
}

/// Sorts by position and tags each symbol with its nesting under the most
/// recent heading: a heading of level `n` sits at `n - 1`, and everything
/// after it (until the next heading) inherits that indent.
pub fn order_by_position(mut symbols: Vec<SymbolInfo>) -> Vec<SymbolInfo> {
    symbols.sort_by_key(|info| info.symbol.position());

    let mut current_indent = 0;
    for info in &mut symbols {
        if let Some(level) = info.symbol.heading_level() {
            current_indent = usize::from(level.saturating_sub(1));
        }
        info.indent_level = current_indent;
    }
    symbols
}

/// Marks the heading closest above (or on) `cursor_line` as selected.
pub fn select_nearest_heading(symbols: &mut [SymbolInfo], cursor_line: usize) {
    let nearest = symbols
        .iter()
        .enumerate()
        .filter(|(_, info)| info.symbol.heading_level().is_some())
        .filter(|(_, info)| info.symbol.position().line <= cursor_line)
        .max_by_key(|(index, info)| (info.symbol.position().line, std::cmp::Reverse(*index)))
        .map(|(index, _)| index);

    if let Some(index) = nearest {
        symbols[index].is_selected = true;
    }
}

/// Parses the `> [!type] title` header line of a callout block.
pub fn parse_callout_header(line: &str) -> Option<(String, String)> {
    let rest = line.trim_start().strip_prefix('>')?.trim_start();
    let rest = rest.strip_prefix("[!")?;
    let close = rest.find(']')?;
    let callout_type = rest[..close].trim().to_lowercase();
    if callout_type.is_empty() {
        return None;
    }
    let title = rest[close + 1..]
        .trim_start_matches(['+', '-'])
        .trim()
        .to_string();
    Some((callout_type, title))
}

#[cfg(test)]
mod tests {
    use super::{order_by_position, parse_callout_header, select_nearest_heading, Symbol, SymbolInfo};
    use crate::host::{HeadingCache, LinkCache, Position, TagCache};

    fn heading(level: u8, line: usize) -> SymbolInfo {
        SymbolInfo::new(Symbol::Heading(HeadingCache {
            heading: format!("H{level} at {line}"),
            level,
            position: Position::new(line, 0),
        }))
    }

    fn tag(line: usize, col: usize) -> SymbolInfo {
        SymbolInfo::new(Symbol::Tag(TagCache {
            tag: format!("#t{line}"),
            position: Position::new(line, col),
        }))
    }

    #[test]
    fn indents_follow_enclosing_heading_levels() {
        let symbols = vec![
            tag(41, 0),
            heading(3, 40),
            tag(31, 0),
            heading(1, 30),
            tag(21, 0),
            heading(2, 20),
            tag(11, 0),
            heading(1, 10),
            tag(1, 0),
        ];
        let ordered = order_by_position(symbols);
        let lines: Vec<usize> = ordered.iter().map(|s| s.symbol.position().line).collect();
        assert_eq!(lines, vec![1, 10, 11, 20, 21, 30, 31, 40, 41]);
        let indents: Vec<usize> = ordered.iter().map(|s| s.indent_level).collect();
        assert_eq!(indents, vec![0, 0, 0, 1, 1, 0, 0, 2, 2]);
    }

    #[test]
    fn orders_same_line_by_column() {
        let ordered = order_by_position(vec![tag(3, 9), tag(3, 2)]);
        assert_eq!(ordered[0].symbol.position().col, 2);
        assert_eq!(ordered[1].symbol.position().col, 9);
    }

    #[test]
    fn selects_heading_nearest_above_cursor() {
        let mut symbols = order_by_position(vec![heading(1, 0), heading(2, 10), heading(2, 20)]);
        select_nearest_heading(&mut symbols, 15);
        let selected: Vec<bool> = symbols.iter().map(|s| s.is_selected).collect();
        assert_eq!(selected, vec![false, true, false]);
    }

    #[test]
    fn no_heading_selected_above_first_heading() {
        let mut symbols = order_by_position(vec![heading(1, 5)]);
        select_nearest_heading(&mut symbols, 2);
        assert!(!symbols[0].is_selected);
    }

    #[test]
    fn symbol_text_variants() {
        let link = Symbol::Link(LinkCache {
            link: "target".to_string(),
            display_text: Some("shown".to_string()),
            position: Position::new(0, 0),
        });
        assert_eq!(link.text(), "target|shown");
        let same = Symbol::Embed(LinkCache {
            link: "img.png".to_string(),
            display_text: Some("img.png".to_string()),
            position: Position::new(0, 0),
        });
        assert_eq!(same.text(), "img.png");
        let tag = Symbol::Tag(TagCache {
            tag: "#project".to_string(),
            position: Position::new(0, 0),
        });
        assert_eq!(tag.text(), "project");
    }

    #[test]
    fn parses_callout_headers() {
        assert_eq!(
            parse_callout_header("> [!NOTE]- Remember this"),
            Some(("note".to_string(), "Remember this".to_string()))
        );
        assert_eq!(
            parse_callout_header(">[!tip]"),
            Some(("tip".to_string(), String::new()))
        );
        assert_eq!(parse_callout_header("> plain quote"), None);
    }
}
