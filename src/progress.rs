use serde::{Deserialize, Serialize};

use crate::chart::PieSeries;
use crate::model::ChapterRecord;

/// Share of the chapter's quizzes completed, rounded half up and capped at 100.
pub fn completion_percentage(completed: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let (completed, total) = (u64::from(completed), u64::from(total));
    let rounded = (completed * 200 + total) / (total * 2);
    rounded.min(100) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AchievementId {
    FirstStep,
    Halfway,
    ChapterComplete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementBadge {
    pub id: AchievementId,
    pub title: String,
    pub icon: String,
    pub unlocked: bool,
    pub description: String,
}

/// Quizzes needed for the halfway badge.
pub fn halfway_threshold(total: u32) -> u32 {
    total.div_ceil(2)
}

/// Evaluates every badge on its own; badges are not gates for one another.
pub fn evaluate_achievements(completed: u32, total: u32) -> Vec<AchievementBadge> {
    let halfway = halfway_threshold(total);
    [
        (
            AchievementId::FirstStep,
            "প্রথম পদক্ষেপ",
            "fa-shoe-prints",
            completed >= 1,
            "এই অধ্যায়ের প্রথম কুইজ সম্পন্ন করেছেন!".to_string(),
        ),
        (
            AchievementId::Halfway,
            "কুইজ মাস্টার",
            "fa-brain",
            completed >= halfway,
            format!("এই অধ্যায়ের অর্ধেক ({}টি) কুইজ সম্পন্ন করেছেন!", halfway),
        ),
        (
            AchievementId::ChapterComplete,
            "অধ্যায় বিজয়ী",
            "fa-crown",
            completed >= total,
            "এই অধ্যায়ের সব কুইজ সম্পন্ন করেছেন!".to_string(),
        ),
    ]
    .into_iter()
    .map(|(id, title, icon, unlocked, description)| AchievementBadge {
        id,
        title: title.to_string(),
        icon: icon.to_string(),
        unlocked,
        description,
    })
    .collect()
}

/// Everything the dashboard region shows for one chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub completed: u32,
    pub total_quizzes: u32,
    pub percentage: u8,
    pub correct: u32,
    pub wrong: u32,
    pub answers: PieSeries,
    pub achievements: Vec<AchievementBadge>,
}

impl DashboardSummary {
    /// `record` is `None` for a user with no activity in the chapter yet.
    pub fn new(record: Option<&ChapterRecord>, total_quizzes: u32) -> Self {
        let record = record.cloned().unwrap_or_default();
        let completed = record.completed_quizzes_count;
        DashboardSummary {
            completed,
            total_quizzes,
            percentage: completion_percentage(completed, total_quizzes),
            correct: record.total_correct,
            wrong: record.total_wrong,
            answers: PieSeries::answers(record.total_correct, record.total_wrong),
            achievements: evaluate_achievements(completed, total_quizzes),
        }
    }

    pub fn progress_text(&self) -> String {
        format!(
            "{}% সম্পন্ন ({}/{}টি কুইজ)",
            self.percentage, self.completed, self.total_quizzes
        )
    }
}
