//! Chapter leaderboard: filtering, ranking and per-row score breakdowns.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::model::{ChapterRecord, QuizSetScore, User};

/// Rows requested from the store for the leaderboard table.
pub const LEADERBOARD_LIMIT: i64 = 10;

/// A user with a positive score for the chapter, and their 1-based position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub rank: u32,
    pub user: User,
    pub record: ChapterRecord,
}

/// Keeps the pairs with a positive score and ranks them by score, highest first.
///
/// The sort is stable: equal scores keep the order the store returned them in.
pub fn rank_standings<I>(rows: I) -> Vec<Standing>
where
    I: IntoIterator<Item = (User, Option<ChapterRecord>)>,
{
    let mut kept: Vec<(User, ChapterRecord)> = rows
        .into_iter()
        .filter_map(|(user, record)| record.map(|r| (user, r)))
        .filter(|(_, record)| record.total_score > 0)
        .collect();
    kept.sort_by(|a, b| b.1.total_score.cmp(&a.1.total_score));

    kept.into_iter()
        .zip(1u32..)
        .map(|((user, record), rank)| Standing { rank, user, record })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    pub fn for_rank(rank: u32) -> Option<Medal> {
        match rank {
            1 => Some(Medal::Gold),
            2 => Some(Medal::Silver),
            3 => Some(Medal::Bronze),
            _ => None,
        }
    }

    pub fn icon_class(&self) -> &'static str {
        match self {
            Medal::Gold => "fa-solid fa-trophy",
            Medal::Silver | Medal::Bronze => "fa-solid fa-medal",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Medal::Gold => "#ffd700",
            Medal::Silver => "#c0c0c0",
            Medal::Bronze => "#cd7f32",
        }
    }
}

/// One line of the expandable score breakdown, e.g. "Set 3: 8/10".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownLine {
    pub label: String,
    pub score: u32,
    pub total_questions: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: String,
    pub display_name: String,
    pub score: u32,
    pub medal: Option<Medal>,
    pub breakdown: Vec<BreakdownLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaderboardView {
    Ranked(Vec<LeaderboardEntry>),
    /// Nothing to rank: no rows, or every score is zero or absent.
    NoEntries,
}

/// Ranks the rows and decorates them for display.
pub fn build_leaderboard<I>(rows: I) -> LeaderboardView
where
    I: IntoIterator<Item = (User, Option<ChapterRecord>)>,
{
    let entries: Vec<LeaderboardEntry> = rank_standings(rows)
        .into_iter()
        .map(|standing| LeaderboardEntry {
            rank: standing.rank,
            display_name: standing.user.name_or_unknown(),
            user_id: standing.user.id,
            score: standing.record.total_score,
            medal: Medal::for_rank(standing.rank),
            breakdown: breakdown(&standing.record),
        })
        .collect();

    if entries.is_empty() {
        LeaderboardView::NoEntries
    } else {
        LeaderboardView::Ranked(entries)
    }
}

/// Numeric suffix of a set identifier such as `Set_12`.
fn set_number(set_id: &str) -> Option<u64> {
    let prefix = set_id.trim_end_matches(|c: char| c.is_ascii_digit());
    set_id[prefix.len()..].parse().ok()
}

fn compare_set_ids(a: &str, b: &str) -> Ordering {
    match (set_number(a), set_number(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Quiz sets ordered by their number, labelled with the first underscore turned into a space.
pub fn breakdown(record: &ChapterRecord) -> Vec<BreakdownLine> {
    let mut sets: Vec<(&String, &QuizSetScore)> = record.quiz_sets.iter().collect();
    sets.sort_by(|a, b| compare_set_ids(a.0, b.0));
    sets.into_iter()
        .map(|(set_id, set)| BreakdownLine {
            label: set_id.replacen('_', " ", 1),
            score: set.score,
            total_questions: set.total_questions,
        })
        .collect()
}
