use std::fs;
use std::path::Path;

use quickswitch_core::config::Settings;
use quickswitch_core::contract::{QueryRequest, QueryResponse};
use quickswitch_core::mode::Mode;
use quickswitch_core::runtime::{execute, RuntimeError};
use quickswitch_core::suggestion::{MatchType, SuggestionKind};
use quickswitch_core::vault::FsVault;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn sample_vault() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "daily/today.md",
        "# Today\nSee [[plan]].\n> [!tip] Hint\n",
    );
    write(
        dir.path(),
        "projects/plan.md",
        "---\naliases: [roadmap]\n---\n# Plan\n## Milestones\n#status/active\n",
    );
    dir
}

async fn query(dir: &tempfile::TempDir, text: &str, active: Option<&str>) -> Result<QueryResponse, RuntimeError> {
    let vault = FsVault::scan(dir.path()).unwrap();
    let request = QueryRequest {
        query: text.to_string(),
        active_file: active.map(str::to_string),
        limit: None,
        open_mode: None,
    };
    execute(request, vault, Settings::default()).await
}

#[test]
fn request_round_trips_through_json() {
    let request = QueryRequest {
        query: "@intro".to_string(),
        active_file: Some("note.md".to_string()),
        limit: Some(5),
        open_mode: Some(Mode::HeadingsList),
    };
    let encoded = serde_json::to_string(&request).unwrap();
    let decoded: QueryRequest = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, request);
}

#[tokio::test]
async fn symbol_query_reports_source_and_rows() {
    let dir = sample_vault();
    let response = query(&dir, "@mile", Some("projects/plan.md")).await.unwrap();

    assert_eq!(response.mode, Mode::SymbolList);
    assert_eq!(response.filter, "mile");
    assert_eq!(response.source.as_deref(), Some("projects/plan.md"));
    assert!(response.handled);
    assert_eq!(response.suggestions.len(), 1);

    let row = &response.suggestions[0];
    assert_eq!(row.kind, SuggestionKind::Symbol);
    assert_eq!(row.text, "Milestones");
    assert_eq!(row.highlights, vec![(0, 4)]);
    assert_eq!(row.indicator.as_deref(), Some("H₂"));
}

#[tokio::test]
async fn callout_titles_are_read_from_disk() {
    let dir = sample_vault();
    let response = query(&dir, "@hint", Some("daily/today.md")).await.unwrap();
    assert_eq!(response.suggestions.len(), 1);
    assert_eq!(response.suggestions[0].text, "Hint");
}

#[tokio::test]
async fn plain_text_falls_back_to_file_search() {
    let dir = sample_vault();
    let response = query(&dir, "plan", None).await.unwrap();

    assert_eq!(response.mode, Mode::Standard);
    assert!(!response.handled);
    assert_eq!(response.suggestions[0].path.as_deref(), Some("projects/plan.md"));
    assert_eq!(response.suggestions[0].match_type, MatchType::Basename);
}

#[tokio::test(start_paused = true)]
async fn heading_query_finds_aliases() {
    let dir = sample_vault();
    let response = query(&dir, "#roadm", None).await.unwrap();

    assert_eq!(response.mode, Mode::HeadingsList);
    assert_eq!(response.suggestions.len(), 1);
    let row = &response.suggestions[0];
    assert_eq!(row.kind, SuggestionKind::Alias);
    assert_eq!(row.text, "roadmap");
    assert_eq!(row.note.as_deref(), Some("projects/plan"));
}

#[tokio::test]
async fn related_query_lists_outgoing_links() {
    let dir = sample_vault();
    let response = query(&dir, "~", Some("daily/today.md")).await.unwrap();

    assert_eq!(response.mode, Mode::RelatedItemsList);
    assert_eq!(response.source.as_deref(), Some("daily/today.md"));
    let paths: Vec<&str> = response
        .suggestions
        .iter()
        .filter_map(|row| row.path.as_deref())
        .collect();
    assert_eq!(paths, vec!["projects/plan.md"]);
}

#[tokio::test]
async fn open_mode_prefixes_its_trigger() {
    let dir = sample_vault();
    let vault = FsVault::scan(dir.path()).unwrap();
    let request = QueryRequest {
        query: String::new(),
        active_file: Some("projects/plan.md".to_string()),
        limit: Some(1),
        open_mode: Some(Mode::SymbolList),
    };
    let response = execute(request, vault, Settings::default()).await.unwrap();

    assert_eq!(response.mode, Mode::SymbolList);
    assert_eq!(response.filter, "");
    assert_eq!(response.suggestions.len(), 1);
    assert_eq!(response.suggestions[0].text, "Plan");
}

#[tokio::test]
async fn unknown_active_file_is_an_error() {
    let dir = sample_vault();
    let result = query(&dir, "@", Some("missing.md")).await;
    assert!(matches!(result, Err(RuntimeError::UnknownFile(path)) if path == "missing.md"));
}

#[test]
fn response_serializes_for_cli_output() {
    let response = QueryResponse {
        mode: Mode::CommandList,
        filter: "x".to_string(),
        source: None,
        handled: true,
        suggestions: Vec::new(),
    };
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["mode"], "command_list");
    assert_eq!(json["handled"], true);
}
