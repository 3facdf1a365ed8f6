use proptest::prelude::*;

use quickswitch_core::host::{HeadingCache, Position, TagCache};
use quickswitch_core::symbols::{order_by_position, Symbol, SymbolInfo};

fn heading(level: u8, line: usize) -> SymbolInfo {
    SymbolInfo::new(Symbol::Heading(HeadingCache {
        heading: format!("level {level}"),
        level,
        position: Position::new(line, 0),
    }))
}

fn tag(line: usize) -> SymbolInfo {
    SymbolInfo::new(Symbol::Tag(TagCache {
        tag: format!("#line{line}"),
        position: Position::new(line, 2),
    }))
}

#[test]
fn symbols_after_headings_take_their_indent() {
    let mut symbols = vec![tag(0)];
    for (index, level) in [1u8, 2, 1, 3].into_iter().enumerate() {
        let line = (index + 1) * 10;
        symbols.push(heading(level, line));
        symbols.push(tag(line + 1));
    }

    let indents: Vec<(usize, usize)> = order_by_position(symbols)
        .iter()
        .filter(|info| info.symbol.heading_level().is_none())
        .map(|info| (info.symbol.position().line, info.indent_level))
        .collect();
    assert_eq!(indents, vec![(0, 0), (11, 0), (21, 1), (31, 0), (41, 2)]);
}

proptest! {
    #[test]
    fn indent_matches_most_recent_heading(levels in prop::collection::vec(1u8..=6, 0..12)) {
        let mut symbols = vec![tag(0)];
        for (index, level) in levels.iter().enumerate() {
            let line = (index + 1) * 10;
            // shuffled in by pushing the tag before its heading
            symbols.push(tag(line + 1));
            symbols.push(heading(*level, line));
        }

        let ordered = order_by_position(symbols);
        let mut current = 0usize;
        for info in &ordered {
            if let Some(level) = info.symbol.heading_level() {
                current = usize::from(level - 1);
            }
            prop_assert_eq!(info.indent_level, current);
        }
        prop_assert_eq!(ordered[0].indent_level, 0);
    }
}
