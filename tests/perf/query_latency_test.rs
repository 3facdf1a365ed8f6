use std::time::Instant;

use crate::fuzzy::{sort_by_score_descending, FuzzyMatcher, SubsequenceMatcher};
use crate::host::FileRef;
use crate::matching::search_with_fallback;
use crate::suggestion::{Suggestion, SuggestionItem};

fn p95_ms(samples: &mut [f64]) -> f64 {
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let last = samples.len().saturating_sub(1);
    let idx = ((last as f64) * 0.95).round() as usize;
    samples[idx.min(last)]
}

fn search(files: &[FileRef], query: &str) -> Vec<Suggestion> {
    let matcher = SubsequenceMatcher;
    let prepared = matcher.prepare_query(query);
    let mut results: Vec<Suggestion> = files
        .iter()
        .filter_map(|file| {
            let found = search_with_fallback(&matcher, &prepared, None, Some(file));
            found.is_match().then(|| {
                Suggestion::new(SuggestionItem::File { file: file.clone() })
                    .with_match(found.match_type, found.search_match)
            })
        })
        .collect();
    sort_by_score_descending(&mut results);
    results.truncate(20);
    results
}

#[test]
fn warm_fallback_search_p95_under_budget() {
    let mut files: Vec<FileRef> = (0..10_000)
        .map(|i| FileRef::new(format!("notes/area_{:02}/Document_{i:05}.md", i % 40)))
        .collect();
    files.push(FileRef::new("reports/Q4_Report.md"));

    let warm = search(&files, "q4 reort");
    assert_eq!(warm[0].file().map(|file| file.path.as_str()), Some("reports/Q4_Report.md"));
    for _ in 0..10 {
        let _ = search(&files, "q4 reort");
    }

    let mut batch_p95 = Vec::with_capacity(5);
    for _ in 0..5 {
        let mut samples = Vec::with_capacity(30);
        for _ in 0..30 {
            let start = Instant::now();
            let _ = search(&files, "q4 reort");
            samples.push(start.elapsed().as_secs_f64() * 1000.0);
        }
        batch_p95.push(p95_ms(&mut samples));
    }

    batch_p95.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median_p95 = batch_p95[batch_p95.len() / 2];

    assert!(
        median_p95 <= 150.0,
        "median batch p95 too high: {median_p95:.3}ms (budget 150.0ms); batches={batch_p95:?}",
    );
}
