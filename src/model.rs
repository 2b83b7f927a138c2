#[cfg(feature = "ssr")]
use diesel::prelude::*;
#[cfg(feature = "ssr")]
use diesel::sqlite::Sqlite;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::chapter::ChapterKey;

/// Authenticated identity, as handed over by the identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}

impl User {
    /// Name to show on the leaderboard and the result card.
    pub fn name_or_unknown(&self) -> String {
        self.display_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "Unknown User".to_string())
    }
}

/// Raw `users` row. `chapters` holds the JSON chapter document keyed by chapter key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ssr", derive(Queryable, Selectable, QueryableByName, Insertable))]
#[cfg_attr(feature = "ssr", diesel(table_name = crate::schema::users))]
#[cfg_attr(feature = "ssr", diesel(check_for_backend(Sqlite)))]
pub struct UserRow {
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
    pub chapters: String,
}

#[cfg(feature = "ssr")]
#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::sessions)]
pub struct NewSession<'a> {
    pub user_id: &'a str,
    pub token: String,
    // created_at uses default
}

/// One quiz set inside a stored chapter document. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSetDoc {
    #[serde(default, deserialize_with = "lenient_number")]
    pub score: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_questions: Option<i64>,
}

/// A chapter entry exactly as the store holds it. Older writers used `quiz_sets`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterDoc {
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_score: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_correct: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_wrong: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub completed_quizzes_count: Option<i64>,
    #[serde(default, alias = "quiz_sets", deserialize_with = "lenient_quiz_sets")]
    pub quiz_sets: Option<BTreeMap<String, QuizSetDoc>>,
}

/// Integer view of a stored number. Fractions are truncated toward zero, the way the ranking
/// query casts them; a value that is not a number reads as absent.
fn number_value(value: &Value) -> Option<i64> {
    let Value::Number(n) = value else {
        return None;
    };
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64)
    })
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_value))
}

// Quiz sets that are not objects are dropped, the rest of the map is kept.
fn lenient_quiz_sets<'de, D>(
    deserializer: D,
) -> Result<Option<BTreeMap<String, QuizSetDoc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(Value::Object(sets)) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    Ok(Some(
        sets.into_iter()
            .filter(|(_, set)| set.is_object())
            .filter_map(|(set_id, set)| {
                serde_json::from_value::<QuizSetDoc>(set)
                    .ok()
                    .map(|set| (set_id, set))
            })
            .collect(),
    ))
}

/// Score of one quiz set after normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSetScore {
    pub score: u32,
    pub total_questions: u32,
}

/// A user's aggregated quiz performance for one chapter. Absent fields are zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRecord {
    pub total_score: u32,
    pub total_correct: u32,
    pub total_wrong: u32,
    pub completed_quizzes_count: u32,
    pub quiz_sets: BTreeMap<String, QuizSetScore>,
}

fn non_negative(value: Option<i64>) -> u32 {
    value
        .map(|v| u32::try_from(v.max(0)).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

impl From<ChapterDoc> for ChapterRecord {
    fn from(doc: ChapterDoc) -> Self {
        let quiz_sets = doc
            .quiz_sets
            .unwrap_or_default()
            .into_iter()
            .map(|(set_id, set)| {
                (
                    set_id,
                    QuizSetScore {
                        score: non_negative(set.score),
                        total_questions: non_negative(set.total_questions),
                    },
                )
            })
            .collect();

        ChapterRecord {
            total_score: non_negative(doc.total_score),
            total_correct: non_negative(doc.total_correct),
            total_wrong: non_negative(doc.total_wrong),
            completed_quizzes_count: non_negative(doc.completed_quizzes_count),
            quiz_sets,
        }
    }
}

fn parse_chapter(user_id: &str, key: String, value: Value) -> Option<(String, ChapterDoc)> {
    if !value.is_object() {
        leptos::logging::warn!("Ignoring chapter {} of user {}: not an object", key, user_id);
        return None;
    }
    match serde_json::from_value::<ChapterDoc>(value) {
        Ok(doc) => Some((key, doc)),
        Err(e) => {
            leptos::logging::warn!("Ignoring chapter {} of user {}: {}", key, user_id, e);
            None
        }
    }
}

/// A user document: identity plus its chapter map, parsed from a `UserRow`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserDocument {
    pub user: User,
    pub chapters: HashMap<String, ChapterDoc>,
}

impl UserDocument {
    /// Parses the row's chapter JSON one chapter at a time. A chapter entry that is not an
    /// object is logged and skipped; a column that is not a JSON object reads as empty.
    pub fn from_row(row: UserRow) -> Self {
        let chapters = match serde_json::from_str::<serde_json::Map<String, Value>>(&row.chapters)
        {
            Ok(entries) => entries
                .into_iter()
                .filter_map(|(key, value)| parse_chapter(&row.id, key, value))
                .collect(),
            Err(e) => {
                leptos::logging::warn!("Ignoring malformed chapters of user {}: {}", row.id, e);
                HashMap::new()
            }
        };
        UserDocument {
            user: User {
                id: row.id,
                display_name: row.display_name,
                email: row.email,
                photo_url: row.photo_url,
            },
            chapters,
        }
    }

    /// The normalized record for `key`, or `None` if the user never touched the chapter.
    pub fn chapter_record(&self, key: &ChapterKey) -> Option<ChapterRecord> {
        self.chapters
            .get(key.as_str())
            .cloned()
            .map(ChapterRecord::from)
    }

    /// Splits the document into the pair the ranker consumes.
    pub fn into_ranking_pair(self, key: &ChapterKey) -> (User, Option<ChapterRecord>) {
        let record = self.chapter_record(key);
        (self.user, record)
    }
}
