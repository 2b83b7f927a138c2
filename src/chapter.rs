use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DashboardError;

/// Storage-safe chapter identifier. Reads and writes must agree on it, so it is only ever built
/// from a display name through [`ChapterKey::from_display_name`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChapterKey(String);

impl ChapterKey {
    /// Drops every whitespace character and every comma from `display_name`.
    pub fn from_display_name(display_name: &str) -> Result<Self, DashboardError> {
        let key: String = display_name
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ',')
            .collect();
        if key.is_empty() {
            return Err(DashboardError::MissingChapterName);
        }
        Ok(ChapterKey(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChapterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
