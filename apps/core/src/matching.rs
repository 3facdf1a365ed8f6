use crate::fuzzy::{FuzzyMatcher, PreparedQuery, SearchMatch};
use crate::host::FileRef;
use crate::suggestion::MatchType;

/// Score deducted from a hit that only matched the full path.
pub const PATH_MATCH_PENALTY: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct FallbackMatch {
    pub match_type: MatchType,
    pub search_match: Option<SearchMatch>,
}

impl FallbackMatch {
    pub fn none() -> Self {
        Self {
            match_type: MatchType::None,
            search_match: None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.search_match.is_some()
    }
}

/// Searches `primary`, then the file's basename, then its display path.
pub fn search_with_fallback(
    matcher: &dyn FuzzyMatcher,
    query: &PreparedQuery,
    primary: Option<&str>,
    secondary: Option<&FileRef>,
) -> FallbackMatch {
    if let Some(text) = primary.filter(|text| !text.is_empty()) {
        if let Some(found) = matcher.fuzzy_match(query, text) {
            return FallbackMatch {
                match_type: MatchType::Primary,
                search_match: Some(found),
            };
        }
    }

    let Some(file) = secondary else {
        return FallbackMatch::none();
    };

    if let Some(found) = matcher.fuzzy_match(query, file.basename()) {
        return FallbackMatch {
            match_type: MatchType::Basename,
            search_match: Some(found),
        };
    }

    if let Some(mut found) = matcher.fuzzy_match(query, file.display_path()) {
        found.score -= PATH_MATCH_PENALTY;
        return FallbackMatch {
            match_type: MatchType::Path,
            search_match: Some(found),
        };
    }

    FallbackMatch::none()
}

/// Char index at which the basename starts within the file's display path.
pub fn basename_start(file: &FileRef) -> usize {
    match file.parent() {
        "" => 0,
        parent => parent.chars().count() + 1,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SplitMatch {
    pub path: Option<SearchMatch>,
    pub basename: Option<SearchMatch>,
}

/// Re-partitions a full-path match into the part before `boundary` and the
/// part after it, re-anchoring the latter to zero. Both halves keep the
/// original score.
pub fn split_at_basename(found: &SearchMatch, boundary: usize) -> SplitMatch {
    let offsets = &found.offsets;
    let with = |offsets: Vec<(usize, usize)>| SearchMatch::new(found.score, offsets);

    if offsets.iter().all(|&(start, _)| start >= boundary) {
        let anchored = offsets
            .iter()
            .map(|&(start, end)| (start - boundary, end - boundary))
            .collect();
        return SplitMatch {
            path: None,
            basename: Some(with(anchored)),
        };
    }

    if offsets.iter().all(|&(_, end)| end <= boundary) {
        return SplitMatch {
            path: Some(with(offsets.clone())),
            basename: None,
        };
    }

    // the last range lying wholly in the path segment marks the split
    let split = offsets
        .iter()
        .rposition(|&(_, end)| end <= boundary)
        .map_or(0, |index| index + 1);

    let mut path_side = offsets[..split].to_vec();
    let mut basename_side = Vec::with_capacity(offsets.len() - split);
    for &(start, end) in &offsets[split..] {
        if start < boundary {
            path_side.push((start, boundary));
        }
        basename_side.push((start.max(boundary) - boundary, end - boundary));
    }

    SplitMatch {
        path: Some(with(path_side)),
        basename: Some(with(basename_side)),
    }
}

#[cfg(test)]
mod tests {
    use super::{basename_start, search_with_fallback, split_at_basename, PATH_MATCH_PENALTY};
    use crate::fuzzy::{FuzzyMatcher, SearchMatch, SubsequenceMatcher};
    use crate::host::FileRef;
    use crate::suggestion::MatchType;

    #[test]
    fn primary_text_wins_when_it_matches() {
        let matcher = SubsequenceMatcher;
        let query = matcher.prepare_query("intro");
        let file = FileRef::new("docs/intro.md");
        let found = search_with_fallback(&matcher, &query, Some("Introduction"), Some(&file));
        assert_eq!(found.match_type, MatchType::Primary);
    }

    #[test]
    fn falls_back_to_basename_then_path() {
        let matcher = SubsequenceMatcher;
        let file = FileRef::new("projects/alpha/notes.md");

        let query = matcher.prepare_query("notes");
        let found = search_with_fallback(&matcher, &query, Some("Heading"), Some(&file));
        assert_eq!(found.match_type, MatchType::Basename);

        let query = matcher.prepare_query("alpha");
        let found = search_with_fallback(&matcher, &query, Some("Heading"), Some(&file));
        assert_eq!(found.match_type, MatchType::Path);
        let raw = matcher.fuzzy_match(&query, file.display_path()).unwrap();
        assert_eq!(found.search_match.unwrap().score, raw.score - PATH_MATCH_PENALTY);
    }

    #[test]
    fn no_match_anywhere_returns_none() {
        let matcher = SubsequenceMatcher;
        let query = matcher.prepare_query("zzz");
        let file = FileRef::new("a/b.md");
        let found = search_with_fallback(&matcher, &query, Some("c"), Some(&file));
        assert_eq!(found.match_type, MatchType::None);
        assert!(!found.is_match());
        let found = search_with_fallback(&matcher, &query, None, None);
        assert!(!found.is_match());
    }

    #[test]
    fn splits_straddling_match_at_basename() {
        let matcher = SubsequenceMatcher;
        let file = FileRef::new("projects/alpha/notes.md");
        let query = matcher.prepare_query("alpha/notes");
        let found = matcher.fuzzy_match(&query, file.display_path()).unwrap();
        let boundary = basename_start(&file);
        assert_eq!(boundary, 15);

        let split = split_at_basename(&found, boundary);
        let path = split.path.unwrap();
        let basename = split.basename.unwrap();
        assert_eq!(path.offsets, vec![(9, 15)]);
        assert_eq!(&file.display_path()[9..15], "alpha/");
        assert_eq!(basename.offsets, vec![(0, 5)]);
        assert_eq!(&file.basename()[0..5], "notes");
        assert_eq!(path.score, found.score);
        assert_eq!(basename.score, found.score);
    }

    #[test]
    fn basename_start_follows_the_last_separator() {
        assert_eq!(basename_start(&FileRef::new("img/photo.png")), 4);
        assert_eq!(basename_start(&FileRef::new("a/b/c.tar.gz")), 4);
        assert_eq!(basename_start(&FileRef::new("root.md")), 0);
        assert_eq!(basename_start(&FileRef::new("notes")), 0);
    }

    #[test]
    fn wholly_basename_match_is_reanchored() {
        let found = SearchMatch::new(-0.5, vec![(16, 18), (19, 20)]);
        let split = split_at_basename(&found, 15);
        assert!(split.path.is_none());
        assert_eq!(split.basename.unwrap().offsets, vec![(1, 3), (4, 5)]);
    }

    #[test]
    fn wholly_path_match_is_unchanged() {
        let found = SearchMatch::new(-0.5, vec![(0, 3), (9, 15)]);
        let split = split_at_basename(&found, 15);
        assert!(split.basename.is_none());
        assert_eq!(split.path.unwrap().offsets, vec![(0, 3), (9, 15)]);
    }

    #[test]
    fn split_keeps_ranges_on_either_side() {
        let found = SearchMatch::new(-2.0, vec![(0, 2), (5, 7), (12, 13)]);
        let split = split_at_basename(&found, 8);
        assert_eq!(split.path.unwrap().offsets, vec![(0, 2), (5, 7)]);
        assert_eq!(split.basename.unwrap().offsets, vec![(4, 5)]);
    }
}
