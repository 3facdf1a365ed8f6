use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::suggestion::{Suggestion, SuggestionItem};

/// Fixed penalty for results inside host-excluded paths.
pub const IGNORED_PATH_PENALTY: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityCategory {
    IsOpenInEditor,
    IsStarred,
    IsRecent,
    File,
    Alias,
    Unresolved,
    Editor,
    Symbol,
    Workspace,
    Command,
    RelatedItem,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl PriorityCategory {
    pub fn for_heading_level(level: u8) -> Self {
        match level {
            1 => Self::H1,
            2 => Self::H2,
            3 => Self::H3,
            4 => Self::H4,
            5 => Self::H5,
            _ => Self::H6,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingPolicy {
    pub enabled: bool,
    /// Signed percent in `[-100, 100]` per category.
    pub adjustments: BTreeMap<PriorityCategory, f64>,
}

impl RankingPolicy {
    pub fn validate(&self) -> Result<(), String> {
        for (category, percent) in &self.adjustments {
            if !percent.is_finite() || !(-100.0..=100.0).contains(percent) {
                return Err(format!(
                    "adjustment for {category:?} must be between -100 and 100, got {percent}"
                ));
            }
        }
        Ok(())
    }
}

/// Every category that applies to `suggestion`. The open/starred/recent flags
/// are the only source of those categories; the by-type lookup never repeats
/// them.
pub fn categories_for(suggestion: &Suggestion) -> Vec<PriorityCategory> {
    let mut categories = Vec::new();
    if suggestion.flags.is_open_in_editor {
        categories.push(PriorityCategory::IsOpenInEditor);
    }
    if suggestion.flags.is_starred {
        categories.push(PriorityCategory::IsStarred);
    }
    if suggestion.flags.is_recent {
        categories.push(PriorityCategory::IsRecent);
    }

    let by_type = match &suggestion.item {
        SuggestionItem::File { .. } => Some(PriorityCategory::File),
        SuggestionItem::Alias { .. } => Some(PriorityCategory::Alias),
        SuggestionItem::Unresolved { .. } => Some(PriorityCategory::Unresolved),
        SuggestionItem::Editor { .. } => Some(PriorityCategory::Editor),
        SuggestionItem::Heading { heading, .. } => {
            Some(PriorityCategory::for_heading_level(heading.level))
        }
        SuggestionItem::Symbol { .. } => Some(PriorityCategory::Symbol),
        SuggestionItem::Workspace { .. } => Some(PriorityCategory::Workspace),
        SuggestionItem::Command { .. } => Some(PriorityCategory::Command),
        SuggestionItem::RelatedItem { .. } => Some(PriorityCategory::RelatedItem),
        SuggestionItem::Starred { .. } => None,
    };
    categories.extend(by_type);
    categories
}

/// Pure score arithmetic: `score + (|score| / 100) * (factor * 100)` where
/// `factor` is the summed percent of every applicable category over 100.
pub fn adjusted_score(score: f64, categories: &[PriorityCategory], policy: &RankingPolicy) -> f64 {
    let factor: f64 = categories
        .iter()
        .filter_map(|category| policy.adjustments.get(category))
        .sum::<f64>()
        / 100.0;

    if factor == 0.0 {
        return score;
    }
    score + (score.abs() / 100.0) * (factor * 100.0)
}

pub struct RankingAdjuster<'a> {
    policy: &'a RankingPolicy,
    is_ignored: &'a dyn Fn(&str) -> bool,
}

impl<'a> RankingAdjuster<'a> {
    pub fn new(policy: &'a RankingPolicy, is_ignored: &'a dyn Fn(&str) -> bool) -> Self {
        Self { policy, is_ignored }
    }

    /// Returns the adjusted copy; the input is left untouched.
    pub fn adjust(&self, suggestion: &Suggestion) -> Suggestion {
        let mut adjusted = suggestion.clone();
        let ignored = suggestion
            .file()
            .is_some_and(|file| (self.is_ignored)(&file.path));
        adjusted.flags.downranked = ignored;

        let Some(score) = suggestion.search_match.as_ref().map(|found| found.score) else {
            return adjusted;
        };

        let new_score = if ignored {
            score - IGNORED_PATH_PENALTY
        } else if self.policy.enabled {
            adjusted_score(score, &categories_for(suggestion), self.policy)
        } else {
            score
        };

        if let Some(found) = adjusted.search_match.as_mut() {
            found.score = new_score;
        }
        adjusted
    }
}
