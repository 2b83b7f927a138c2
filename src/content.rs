use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
#[cfg(feature = "ssr")]
use std::path::Path;

use crate::chapter::ChapterKey;
use crate::error::DashboardError;

/// Site-relative link to a chapter's dashboard. The page reads its chapter name from `name`.
pub fn chapter_path(display_name: &str) -> String {
    format!(
        "/chapter?name={}",
        utf8_percent_encode(display_name, NON_ALPHANUMERIC)
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizLink {
    pub title: String,
    pub href: String,
}

/// Content of one chapter page: its quiz sets and its formula sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterPage {
    pub display_name: String,
    #[serde(default)]
    pub quiz_sets: Vec<QuizLink>,
    #[serde(default)]
    pub formulas: Vec<String>,
}

impl ChapterPage {
    pub fn total_quizzes(&self) -> u32 {
        u32::try_from(self.quiz_sets.len()).unwrap_or(u32::MAX)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub chapters: Vec<ChapterPage>,
}

impl Catalog {
    pub fn from_json(json: &str) -> Result<Self, DashboardError> {
        serde_json::from_str(json).map_err(|e| DashboardError::Catalog(e.to_string()))
    }

    #[cfg(feature = "ssr")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DashboardError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| DashboardError::Catalog(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// The page whose display name normalizes to `key`.
    pub fn find(&self, key: &ChapterKey) -> Option<&ChapterPage> {
        self.chapters.iter().find(|page| {
            ChapterKey::from_display_name(&page.display_name).is_ok_and(|k| &k == key)
        })
    }

    /// Quiz count of the chapter; a chapter the catalog does not list has none.
    pub fn total_quizzes(&self, key: &ChapterKey) -> u32 {
        self.find(key).map_or(0, ChapterPage::total_quizzes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "chapters": [
            {
                "display_name": "Biology Cell Division",
                "quiz_sets": [
                    {"title": "Set 1", "href": "/quiz/cell/1"},
                    {"title": "Set 2", "href": "/quiz/cell/2"}
                ],
                "formulas": ["2n -> n"]
            },
            {"display_name": "Biology Genetics"}
        ]
    }"#;

    #[test]
    fn test_find_by_key() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        let key = ChapterKey::from_display_name("Biology  Cell Division").unwrap();
        let page = catalog.find(&key).unwrap();
        assert_eq!(page.display_name, "Biology Cell Division");
        assert_eq!(catalog.total_quizzes(&key), 2);

        let genetics = ChapterKey::from_display_name("Biology Genetics").unwrap();
        assert_eq!(catalog.total_quizzes(&genetics), 0);
        assert!(catalog.find(&genetics).unwrap().formulas.is_empty());
    }

    #[test]
    fn test_unknown_chapter_has_no_quizzes() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        let key = ChapterKey::from_display_name("Physics").unwrap();
        assert!(catalog.find(&key).is_none());
        assert_eq!(catalog.total_quizzes(&key), 0);
    }

    #[test]
    fn test_chapter_path() {
        assert_eq!(
            chapter_path("Biology Cell Division, Part 1"),
            "/chapter?name=Biology%20Cell%20Division%2C%20Part%201"
        );
    }

    #[test]
    fn test_malformed_catalog() {
        assert!(matches!(
            Catalog::from_json("{\"chapters\": 3}"),
            Err(DashboardError::Catalog(_))
        ));
    }
}
