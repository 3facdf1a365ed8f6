use std::collections::BTreeMap;

use proptest::prelude::*;

use quickswitch_core::fuzzy::SearchMatch;
use quickswitch_core::host::FileRef;
use quickswitch_core::ranking::{adjusted_score, categories_for, PriorityCategory, RankingAdjuster, RankingPolicy};
use quickswitch_core::suggestion::{MatchType, Suggestion, SuggestionItem};

fn category() -> impl Strategy<Value = PriorityCategory> {
    prop_oneof![
        Just(PriorityCategory::IsOpenInEditor),
        Just(PriorityCategory::IsStarred),
        Just(PriorityCategory::IsRecent),
        Just(PriorityCategory::File),
        Just(PriorityCategory::Alias),
    ]
}

proptest! {
    #[test]
    fn adjustment_is_a_pure_function(
        score in -50.0f64..0.0,
        entries in prop::collection::vec((category(), -100.0f64..=100.0), 0..5),
        open in any::<bool>(),
        starred in any::<bool>(),
        recent in any::<bool>(),
        ignored in any::<bool>(),
    ) {
        let policy = RankingPolicy {
            enabled: true,
            adjustments: entries.into_iter().collect::<BTreeMap<_, _>>(),
        };
        let mut suggestion = Suggestion::new(SuggestionItem::File { file: FileRef::new("notes/a.md") })
            .with_match(MatchType::Basename, Some(SearchMatch::new(score, vec![(0, 1)])));
        suggestion.flags.is_open_in_editor = open;
        suggestion.flags.is_starred = starred;
        suggestion.flags.is_recent = recent;
        let snapshot = suggestion.clone();

        let is_ignored = move |_: &str| ignored;
        let adjuster = RankingAdjuster::new(&policy, &is_ignored);
        let once = adjuster.adjust(&suggestion);
        let again = adjuster.adjust(&suggestion);

        prop_assert_eq!(&once, &again);
        prop_assert_eq!(&suggestion, &snapshot);

        if !ignored {
            let expected = adjusted_score(score, &categories_for(&suggestion), &policy);
            prop_assert_eq!(once.search_match.map(|found| found.score), Some(expected));
        }
    }
}

#[test]
fn unscored_ignored_file_is_flagged_but_keeps_no_score() {
    let policy = RankingPolicy {
        enabled: true,
        adjustments: BTreeMap::from([(PriorityCategory::File, 50.0)]),
    };
    let is_ignored = |path: &str| path.starts_with("archive/");
    let adjuster = RankingAdjuster::new(&policy, &is_ignored);

    let ignored = Suggestion::new(SuggestionItem::File {
        file: FileRef::new("archive/a.md"),
    });
    let adjusted = adjuster.adjust(&ignored);
    assert!(adjusted.flags.downranked);
    assert!(adjusted.search_match.is_none());
    assert_eq!(adjusted.item, ignored.item);

    let kept = Suggestion::new(SuggestionItem::File {
        file: FileRef::new("notes/a.md"),
    });
    assert_eq!(adjuster.adjust(&kept), kept);
}

#[test]
fn open_file_category_comes_from_flags_only() {
    let mut suggestion = Suggestion::new(SuggestionItem::File {
        file: FileRef::new("a.md"),
    });
    assert_eq!(categories_for(&suggestion), vec![PriorityCategory::File]);
    suggestion.flags.is_open_in_editor = true;
    suggestion.flags.is_recent = true;
    assert_eq!(
        categories_for(&suggestion),
        vec![
            PriorityCategory::IsOpenInEditor,
            PriorityCategory::IsRecent,
            PriorityCategory::File,
        ]
    );
}
