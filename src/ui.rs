//! Presentation state of the dashboard page that carries no quiz data.

use chrono::Datelike;
use serde::{Deserialize, Serialize};

pub const THEME_STORAGE_KEY: &str = "theme";
pub const BACK_TO_TOP_THRESHOLD: f64 = 300.0;
pub const DEFAULT_USER_NAME: &str = "ব্যবহারকারী";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    Day,
    Dark,
}

impl Theme {
    /// Reads the value kept in local storage. Anything but `"dark"` is day mode.
    pub fn from_storage(value: Option<&str>) -> Self {
        match value {
            Some("dark") => Theme::Dark,
            _ => Theme::Day,
        }
    }

    pub fn storage_value(&self) -> &'static str {
        match self {
            Theme::Day => "day",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Day => Theme::Dark,
            Theme::Dark => Theme::Day,
        }
    }

    pub fn body_class(&self) -> &'static str {
        match self {
            Theme::Day => "day-mode",
            Theme::Dark => "dark-mode",
        }
    }

    /// Icon of the toggle button: offers the other mode.
    pub fn toggle_icon(&self) -> &'static str {
        match self {
            Theme::Day => "fa-solid fa-moon",
            Theme::Dark => "fa-solid fa-sun",
        }
    }

    pub fn chart_border(&self) -> &'static str {
        match self {
            Theme::Day => "#ffffff",
            Theme::Dark => "#1e1e1e",
        }
    }
}

/// Which leaderboard row has its score breakdown open. At most one at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandedRow(Option<String>);

impl ExpandedRow {
    /// Opens `user_id`'s row, closing any other; toggling the open row closes it.
    pub fn toggle(&mut self, user_id: &str) {
        if self.is_expanded(user_id) {
            self.0 = None;
        } else {
            self.0 = Some(user_id.to_string());
        }
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    pub fn is_expanded(&self, user_id: &str) -> bool {
        self.0.as_deref() == Some(user_id)
    }

    pub fn current(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// Search filter over a page section: case-insensitive match on its title or text.
pub fn section_matches(query: &str, title: &str, content: &str) -> bool {
    let query = query.to_lowercase();
    title.to_lowercase().contains(&query) || content.to_lowercase().contains(&query)
}

pub fn show_back_to_top(scroll_y: f64) -> bool {
    scroll_y > BACK_TO_TOP_THRESHOLD
}

const DAILY_CHALLENGES: [&str; 4] = [
    "আজকে কমপক্ষে ২টি কুইজ সেট সমাধান করো।",
    "সূত্র তালিকাটি সম্পূর্ণ মুখস্থ করে ফেলো।",
    "যেকোনো একটি ক্লাস নোট সম্পূর্ণ রিভিশন দাও।",
    "একটি কঠিন প্রশ্নের ব্যাখ্যা ভালো করে বুঝে নাও।",
];

/// Challenge of the day. January 1st is day 1.
pub fn daily_challenge(date: impl Datelike) -> &'static str {
    DAILY_CHALLENGES[date.ordinal() as usize % DAILY_CHALLENGES.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_theme_storage() {
        assert_eq!(Theme::from_storage(None), Theme::Day);
        assert_eq!(Theme::from_storage(Some("day")), Theme::Day);
        assert_eq!(Theme::from_storage(Some("garbage")), Theme::Day);
        assert_eq!(Theme::from_storage(Some("dark")), Theme::Dark);
        for theme in [Theme::Day, Theme::Dark] {
            assert_eq!(Theme::from_storage(Some(theme.storage_value())), theme);
            assert_eq!(theme.toggled().toggled(), theme);
        }
        assert_eq!(Theme::Dark.body_class(), "dark-mode");
    }

    #[test]
    fn test_expanded_row() {
        let mut row = ExpandedRow::default();
        assert_eq!(row.current(), None);

        row.toggle("a");
        assert!(row.is_expanded("a"));

        // Opening another row closes the first.
        row.toggle("b");
        assert!(!row.is_expanded("a"));
        assert!(row.is_expanded("b"));

        row.toggle("b");
        assert_eq!(row.current(), None);

        row.toggle("a");
        row.clear();
        assert_eq!(row.current(), None);
    }

    #[test]
    fn test_section_matches() {
        assert!(section_matches("", "Leaderboard", ""));
        assert!(section_matches("LEADER", "Leaderboard", ""));
        assert!(section_matches("mitosis", "Notes", "Mitosis and meiosis"));
        assert!(!section_matches("optics", "Notes", "Mitosis"));
    }

    #[test]
    fn test_back_to_top() {
        assert!(!show_back_to_top(0.0));
        assert!(!show_back_to_top(300.0));
        assert!(show_back_to_top(300.5));
    }

    #[test]
    fn test_daily_challenge_rotates() {
        let jan1 = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let jan2 = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let jan5 = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        assert_eq!(daily_challenge(jan1), DAILY_CHALLENGES[1]);
        assert_eq!(daily_challenge(jan2), DAILY_CHALLENGES[2]);
        assert_eq!(daily_challenge(jan5), daily_challenge(jan1));
    }

    #[test]
    fn test_daily_challenge_uses_the_viewer_calendar_day() {
        use chrono::{FixedOffset, TimeZone, Utc};

        // 20:00 UTC on Jan 1 is already Jan 2 in Dhaka.
        let instant = Utc.with_ymd_and_hms(2025, 1, 1, 20, 0, 0).unwrap();
        let dhaka = FixedOffset::east_opt(6 * 3600).unwrap();
        assert_eq!(daily_challenge(instant), DAILY_CHALLENGES[1]);
        assert_eq!(daily_challenge(instant.with_timezone(&dhaka)), DAILY_CHALLENGES[2]);
    }
}
