use tracing::{debug, error};

use crate::command_parser::TriggerMatch;
use crate::fuzzy::{PreparedQuery, SearchMatch};
use crate::host::{
    FileMetadata, FileRef, HostAction, HostError, Modifiers, PaneId, PaneTarget, Position,
};
use crate::input::{InputInfo, ParsedCommand, Source};
use crate::mode::{LinkKind, Mode, SymbolKind};
use crate::suggestion::{MatchType, Suggestion, SuggestionItem};
use crate::symbols::{order_by_position, parse_callout_header, select_nearest_heading, Symbol, SymbolInfo};

use super::{finalize, resolve_source, Gather, HandlerDeps, RenderedRow, SuggestionHandler};

pub struct SymbolHandler {
    deps: HandlerDeps,
    active_source: Option<Source>,
    indent_rows: bool,
}

impl SymbolHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self {
            deps,
            active_source: None,
            indent_rows: false,
        }
    }

    /// An editor already showing `file`, skipping reference views such as
    /// backlinks or the outline.
    fn find_open_editor(&self, file: &FileRef) -> Option<PaneId> {
        let reference_views = &self.deps.settings.reference_views;
        self.deps
            .host
            .open_panes()
            .into_iter()
            .find(|pane| {
                pane.file.as_ref() == Some(file) && !reference_views.contains(&pane.view_type)
            })
            .map(|pane| pane.id)
    }
}

impl SuggestionHandler for SymbolHandler {
    fn mode(&self) -> Mode {
        Mode::SymbolList
    }

    fn validate_command(
        &mut self,
        info: &mut InputInfo,
        found: &TriggerMatch,
        active: Option<&Suggestion>,
    ) -> bool {
        let source = resolve_source(
            self.active_source.as_ref(),
            found,
            active,
            info.env.active_pane.as_ref(),
            &self.deps.settings,
        );
        let Some(source) = source else {
            debug!(index = found.index, "symbol trigger without a source");
            return false;
        };

        info.validate(
            Mode::SymbolList,
            ParsedCommand {
                index: Some(found.index),
                parsed_input: found.filter_text.clone(),
                source: Some(source),
                ..ParsedCommand::default()
            },
        );
        true
    }

    fn gather(&mut self, info: &InputInfo) -> Gather {
        let Some(source) = info.source().cloned() else {
            return Gather::Ready(Vec::new());
        };
        let query = info.search_query(self.deps.matcher.as_ref()).clone();
        self.indent_rows = !query.has_search_term && self.deps.settings.symbols_in_line_order;

        let deps = self.deps.clone();
        let env = info.env.clone();
        Gather::Deferred(Box::pin(async move {
            let symbols = collect_symbols(&deps, &source).await;
            let file = source.file.clone();

            let suggestions = if query.has_search_term {
                filter_symbols(&deps, &query.prepared, symbols)
                    .into_iter()
                    .map(|(symbol, found)| {
                        Suggestion::new(SuggestionItem::Symbol {
                            symbol,
                            file: file.clone(),
                        })
                        .with_match(MatchType::Primary, Some(found))
                    })
                    .collect()
            } else {
                let mut symbols = if deps.settings.symbols_in_line_order {
                    order_by_position(symbols)
                } else {
                    symbols
                };
                if deps.settings.select_nearest_heading {
                    if let Some(cursor) = source.cursor {
                        select_nearest_heading(&mut symbols, cursor.line);
                    }
                }
                symbols
                    .into_iter()
                    .map(|symbol| {
                        Suggestion::new(SuggestionItem::Symbol {
                            symbol,
                            file: file.clone(),
                        })
                    })
                    .collect()
            };

            finalize(&deps, &env, suggestions, query.has_search_term)
        }))
    }

    fn render(&self, suggestion: &Suggestion, row: &mut RenderedRow) {
        let SuggestionItem::Symbol { symbol, .. } = &suggestion.item else {
            return;
        };
        row.text = symbol.symbol.text();
        row.highlights = suggestion
            .search_match
            .as_ref()
            .map(|found| found.offsets.clone())
            .unwrap_or_default();
        row.indicator = Some(symbol.symbol.indicator().to_string());
        if self.indent_rows {
            row.classes.push(format!("qsp-symbol-l{}", symbol.indent_level));
        }
        if symbol.is_selected {
            row.classes.push("is-selected".to_string());
        }
        row.classes.push("qsp-suggestion-symbol".to_string());
    }

    fn choose(&mut self, suggestion: &Suggestion, modifiers: Modifiers) -> Result<(), HostError> {
        let SuggestionItem::Symbol { symbol, file } = &suggestion.item else {
            return Ok(());
        };
        let position = Some(symbol.symbol.position());
        let target = if self.deps.settings.always_new_pane_for_symbols {
            PaneTarget::NewTab
        } else {
            PaneTarget::from_modifiers(modifiers)
        };

        let open_pane = self
            .active_source
            .as_ref()
            .filter(|source| &source.file == file)
            .and_then(|source| source.pane)
            .or_else(|| self.find_open_editor(file));

        let action = match (target, open_pane) {
            (PaneTarget::Reuse, Some(pane)) => HostAction::ActivatePane { pane, position },
            _ => HostAction::OpenFile {
                path: file.path.clone(),
                target,
                position,
            },
        };
        self.deps.host.perform(action)
    }

    fn remember(&mut self, info: &InputInfo) {
        self.active_source = if info.mode == Mode::SymbolList {
            info.source().cloned()
        } else {
            None
        };
    }

    fn active_source(&self) -> Option<&Source> {
        self.active_source.as_ref()
    }

    fn reset(&mut self) {
        self.active_source = None;
        self.indent_rows = false;
    }
}

/// Enabled symbols of the source file. Callout titles come from the file
/// text; if it cannot be read the callouts are dropped and the rest kept.
async fn collect_symbols(deps: &HandlerDeps, source: &Source) -> Vec<SymbolInfo> {
    let settings = &deps.settings;
    let metadata: FileMetadata = deps.host.metadata(&source.file).unwrap_or_default();
    let mut symbols = Vec::new();

    if settings.is_symbol_type_enabled(SymbolKind::Heading) {
        symbols.extend(metadata.headings.iter().cloned().map(Symbol::Heading));
    }
    if settings.is_symbol_type_enabled(SymbolKind::Tag) {
        symbols.extend(metadata.tags.iter().cloned().map(Symbol::Tag));
    }
    if settings.is_symbol_type_enabled(SymbolKind::Link) {
        symbols.extend(
            metadata
                .links
                .iter()
                .filter(|link| {
                    !settings
                        .exclude_link_sub_types
                        .contains(&LinkKind::classify(&link.link))
                })
                .cloned()
                .map(Symbol::Link),
        );
    }
    if settings.is_symbol_type_enabled(SymbolKind::Embed) {
        symbols.extend(metadata.embeds.iter().cloned().map(Symbol::Embed));
    }
    if settings.is_symbol_type_enabled(SymbolKind::Callout) && !metadata.callouts.is_empty() {
        match deps.host.read_file(&source.file).await {
            Ok(content) => {
                let lines: Vec<&str> = content.lines().collect();
                symbols.extend(metadata.callouts.iter().filter_map(|section| {
                    callout_symbol(lines.get(section.position.line)?, section.position)
                }));
            }
            Err(error) => {
                error!(path = %source.file.path, %error, "failed to read callouts");
            }
        }
    }

    symbols.into_iter().map(SymbolInfo::new).collect()
}

fn callout_symbol(line: &str, position: Position) -> Option<Symbol> {
    let (callout_type, title) = parse_callout_header(line)?;
    Some(Symbol::Callout {
        callout_type,
        title,
        position,
    })
}

fn filter_symbols(
    deps: &HandlerDeps,
    query: &PreparedQuery,
    symbols: Vec<SymbolInfo>,
) -> Vec<(SymbolInfo, SearchMatch)> {
    symbols
        .into_iter()
        .filter_map(|symbol| {
            let found = deps.matcher.fuzzy_match(query, &symbol.symbol.text())?;
            Some((symbol, found))
        })
        .collect()
}
