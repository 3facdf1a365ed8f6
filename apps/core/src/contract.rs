use serde::{Deserialize, Serialize};

use crate::handlers::RenderedRow;
use crate::mode::Mode;
use crate::suggestion::{MatchType, Suggestion, SuggestionKind};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryRequest {
    pub query: String,
    pub active_file: Option<String>,
    pub limit: Option<usize>,
    /// Opens the switcher in this mode first, pre-filling its trigger.
    #[serde(default)]
    pub open_mode: Option<Mode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuggestionDto {
    pub kind: SuggestionKind,
    pub path: Option<String>,
    pub text: String,
    pub note: Option<String>,
    pub highlights: Vec<(usize, usize)>,
    pub note_highlights: Vec<(usize, usize)>,
    pub indicator: Option<String>,
    pub classes: Vec<String>,
    pub match_type: MatchType,
    pub score: Option<f64>,
}

impl SuggestionDto {
    pub fn from_rendered(suggestion: &Suggestion, row: RenderedRow) -> Self {
        Self {
            kind: suggestion.kind(),
            path: suggestion.file().map(|file| file.path.clone()),
            text: row.text,
            note: row.note,
            highlights: row.highlights,
            note_highlights: row.note_highlights,
            indicator: row.indicator,
            classes: row.classes,
            match_type: suggestion.match_type,
            score: suggestion.search_match.as_ref().map(|found| found.score),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    pub mode: Mode,
    pub filter: String,
    /// Path of the sourced-mode anchor, when one is active.
    pub source: Option<String>,
    pub handled: bool,
    pub suggestions: Vec<SuggestionDto>,
}

#[cfg(test)]
mod tests {
    use super::{QueryResponse, SuggestionDto};
    use crate::fuzzy::SearchMatch;
    use crate::handlers::RenderedRow;
    use crate::host::FileRef;
    use crate::mode::Mode;
    use crate::suggestion::{MatchType, Suggestion, SuggestionItem};

    #[test]
    fn response_serializes_with_snake_case_tags() {
        let suggestion = Suggestion::new(SuggestionItem::File {
            file: FileRef::new("a/b.md"),
        })
        .with_match(MatchType::Basename, Some(SearchMatch::new(-0.5, vec![(0, 1)])));
        let row = RenderedRow {
            text: "b".to_string(),
            highlights: vec![(0, 1)],
            note: Some("a/b".to_string()),
            ..RenderedRow::default()
        };
        let response = QueryResponse {
            mode: Mode::HeadingsList,
            filter: "b".to_string(),
            source: None,
            handled: true,
            suggestions: vec![SuggestionDto::from_rendered(&suggestion, row)],
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["mode"], "headings_list");
        assert_eq!(json["suggestions"][0]["kind"], "file");
        assert_eq!(json["suggestions"][0]["match_type"], "basename");
        assert_eq!(json["suggestions"][0]["path"], "a/b.md");
    }
}
