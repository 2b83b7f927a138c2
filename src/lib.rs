pub mod app;
pub mod chapter;
pub mod chart;
#[cfg(feature = "ssr")]
pub mod config;
pub mod content;
pub mod error;
pub mod leaderboard;
pub mod model;
pub mod progress;
pub mod result_card;
#[cfg(feature = "ssr")]
pub mod schema;
pub mod ui;

#[cfg(feature = "ssr")]
use diesel::connection::SimpleConnection;
#[cfg(feature = "ssr")]
use diesel::prelude::*;
#[cfg(feature = "ssr")]
use diesel::r2d2::CustomizeConnection;
#[cfg(feature = "ssr")]
use diesel::sql_types::{BigInt, Text};
#[cfg(feature = "ssr")]
use diesel::SqliteConnection;
#[cfg(feature = "ssr")]
use uuid::Uuid;

#[cfg(feature = "ssr")]
use crate::chapter::ChapterKey;
#[cfg(feature = "ssr")]
use crate::error::DashboardError;
#[cfg(feature = "ssr")]
use crate::leaderboard::{build_leaderboard, LeaderboardView, LEADERBOARD_LIMIT};
#[cfg(feature = "ssr")]
use crate::model::{ChapterDoc, NewSession, User, UserDocument, UserRow};
#[cfg(feature = "ssr")]
use crate::progress::DashboardSummary;
#[cfg(feature = "ssr")]
use crate::result_card::{build_result_card, ResultCardState};
#[cfg(feature = "ssr")]
use crate::schema::{sessions, users};

#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    use crate::app::*;
    console_error_panic_hook::set_once();
    leptos::mount::hydrate_body(App);
}

// WAL mode allows concurrent reads during writes, and the timeout retries locked operations.
#[cfg(feature = "ssr")]
const PRAGMAS: &str = "PRAGMA foreign_keys = ON; \
    PRAGMA journal_mode = WAL; \
    PRAGMA synchronous = NORMAL; \
    PRAGMA busy_timeout = 10000;";

#[cfg(feature = "ssr")]
const CREATE_SCHEMA: &str = include_str!("../migrations/2025-10-01-000000_create_users/up.sql");
#[cfg(feature = "ssr")]
const DROP_SCHEMA: &str = include_str!("../migrations/2025-10-01-000000_create_users/down.sql");

#[cfg(feature = "ssr")]
pub fn establish_connection(database_url: &str) -> Result<SqliteConnection, DashboardError> {
    let mut conn = SqliteConnection::establish(database_url)
        .map_err(|e| DashboardError::Store(format!("Error connecting to {}: {}", database_url, e)))?;
    conn.batch_execute(PRAGMAS)?;
    Ok(conn)
}

/// Applies the connection PRAGMAs to every pooled connection.
#[cfg(feature = "ssr")]
#[derive(Debug, Clone, Copy)]
pub struct SqlitePragmas;

#[cfg(feature = "ssr")]
impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(PRAGMAS)
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Creates the tables if they are missing.
#[cfg(feature = "ssr")]
pub fn init_schema(conn: &mut SqliteConnection) -> Result<(), diesel::result::Error> {
    conn.batch_execute(CREATE_SCHEMA)
}

/// Drops every table and recreates an empty schema.
#[cfg(feature = "ssr")]
pub fn reset_database(conn: &mut SqliteConnection) -> Result<(), diesel::result::Error> {
    conn.transaction(|conn| {
        conn.batch_execute(DROP_SCHEMA)?;
        init_schema(conn)
    })
}

/// Inserts the user, or refreshes their profile fields. Their chapter document is kept.
#[cfg(feature = "ssr")]
pub fn upsert_user(conn: &mut SqliteConnection, user: &User) -> Result<(), diesel::result::Error> {
    let row = UserRow {
        id: user.id.clone(),
        display_name: user.display_name.clone(),
        email: user.email.clone(),
        photo_url: user.photo_url.clone(),
        chapters: "{}".to_string(),
    };
    diesel::insert_into(users::table)
        .values(&row)
        .on_conflict(users::id)
        .do_update()
        .set((
            users::display_name.eq(&row.display_name),
            users::email.eq(&row.email),
            users::photo_url.eq(&row.photo_url),
        ))
        .execute(conn)?;
    Ok(())
}

/// Replaces one chapter entry in the user's document, leaving the other chapters alone.
#[cfg(feature = "ssr")]
pub fn set_chapter_document(
    conn: &mut SqliteConnection,
    user_id: &str,
    key: &ChapterKey,
    doc: &ChapterDoc,
) -> Result<(), diesel::result::Error> {
    conn.transaction(|conn| {
        let chapters: String = users::table
            .find(user_id)
            .select(users::chapters)
            .first(conn)?;
        let mut chapters: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(&chapters)
                .map_err(|e| diesel::result::Error::DeserializationError(Box::new(e)))?;
        let value = serde_json::to_value(doc)
            .map_err(|e| diesel::result::Error::SerializationError(Box::new(e)))?;
        chapters.insert(key.as_str().to_string(), value);

        diesel::update(users::table.find(user_id))
            .set(users::chapters.eq(serde_json::Value::Object(chapters).to_string()))
            .execute(conn)?;
        Ok(())
    })
}

/// Point lookup of one user document.
#[cfg(feature = "ssr")]
pub fn get_user_document(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Option<UserDocument>, diesel::result::Error> {
    let row = users::table
        .find(user_id)
        .select(UserRow::as_select())
        .first(conn)
        .optional()?;
    Ok(row.map(UserDocument::from_row))
}

/// User documents that have a score for the chapter, highest `totalScore` first, ties by user
/// id. `limit` of `None` returns every such user.
#[cfg(feature = "ssr")]
pub fn get_users_by_chapter_score(
    conn: &mut SqliteConnection,
    key: &ChapterKey,
    limit: Option<i64>,
) -> Result<Vec<UserDocument>, diesel::result::Error> {
    // Chapter entries are matched by key with json_each; the key never enters a JSON path.
    let rows: Vec<UserRow> = diesel::sql_query(
        "SELECT id, display_name, email, photo_url, chapters FROM ( \
            SELECT users.*, ( \
                SELECT json_extract(entry.value, '$.totalScore') \
                FROM json_each(CASE WHEN json_valid(users.chapters) \
                    THEN users.chapters ELSE '{}' END) AS entry \
                WHERE entry.key = ? AND entry.type = 'object' \
            ) AS chapter_score \
            FROM users \
        ) \
        WHERE chapter_score IS NOT NULL \
        ORDER BY CAST(chapter_score AS INTEGER) DESC, id ASC \
        LIMIT ?",
    )
    .bind::<Text, _>(key.as_str())
    .bind::<BigInt, _>(limit.unwrap_or(-1))
    .load(conn)?;

    Ok(rows.into_iter().map(UserDocument::from_row).collect())
}

/// Issues a new session token for the user.
#[cfg(feature = "ssr")]
pub fn create_session(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<String, diesel::result::Error> {
    let token = Uuid::new_v4().to_string();
    diesel::insert_into(sessions::table)
        .values(&NewSession {
            user_id,
            token: token.clone(),
        })
        .execute(conn)?;
    Ok(token)
}

#[cfg(feature = "ssr")]
pub fn delete_session(conn: &mut SqliteConnection, token: &str) -> Result<(), diesel::result::Error> {
    diesel::delete(sessions::table.filter(sessions::token.eq(token))).execute(conn)?;
    Ok(())
}

/// The signed-in user owning `token`.
#[cfg(feature = "ssr")]
pub fn get_user_by_token(
    conn: &mut SqliteConnection,
    token: &str,
) -> Result<User, diesel::result::Error> {
    // Validate token is a valid UUID.
    Uuid::parse_str(token).map_err(|_| diesel::result::Error::NotFound)?;

    let row: UserRow = sessions::table
        .inner_join(users::table)
        .filter(sessions::token.eq(token))
        .select(UserRow::as_select())
        .first(conn)?;
    Ok(UserDocument::from_row(row).user)
}

/// Top of the chapter leaderboard.
#[cfg(feature = "ssr")]
pub fn load_leaderboard(
    conn: &mut SqliteConnection,
    key: &ChapterKey,
) -> Result<LeaderboardView, DashboardError> {
    let docs = get_users_by_chapter_score(conn, key, Some(LEADERBOARD_LIMIT))?;
    Ok(build_leaderboard(
        docs.into_iter().map(|doc| doc.into_ranking_pair(key)),
    ))
}

/// Progress, answers and badges of one user in one chapter.
#[cfg(feature = "ssr")]
pub fn load_dashboard(
    conn: &mut SqliteConnection,
    user_id: &str,
    key: &ChapterKey,
    total_quizzes: u32,
) -> Result<DashboardSummary, DashboardError> {
    let record = get_user_document(conn, user_id)?.and_then(|doc| doc.chapter_record(key));
    Ok(DashboardSummary::new(record.as_ref(), total_quizzes))
}

/// The user's result card, ranked against every scorer of the chapter.
#[cfg(feature = "ssr")]
pub fn load_result_card(
    conn: &mut SqliteConnection,
    user: &User,
    chapter_display_name: &str,
    page_url: &str,
) -> Result<ResultCardState, DashboardError> {
    let key = ChapterKey::from_display_name(chapter_display_name)?;
    let docs = get_users_by_chapter_score(conn, &key, None)?;
    Ok(build_result_card(
        docs.into_iter().map(|doc| doc.into_ranking_pair(&key)),
        user,
        chapter_display_name,
        page_url,
    ))
}

#[cfg(all(test, feature = "ssr"))]
mod tests {
    use super::*;
    use crate::model::QuizSetDoc;
    use std::collections::BTreeMap;

    // Helper to run a test against a fresh in-memory database with the schema applied.
    fn run_test_in_memory<F>(test_fn: F)
    where
        F: FnOnce(&mut SqliteConnection) -> Result<(), DashboardError>,
    {
        let mut conn = SqliteConnection::establish(":memory:").expect("in-memory database");
        init_schema(&mut conn).expect("schema");
        test_fn(&mut conn).expect("test failed");
    }

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            display_name: Some(format!("Student {}", id)),
            email: Some(format!("{}@example.org", id)),
            photo_url: None,
        }
    }

    fn score(total_score: i64) -> ChapterDoc {
        ChapterDoc {
            total_score: Some(total_score),
            ..Default::default()
        }
    }

    fn seed(conn: &mut SqliteConnection, key: &ChapterKey, scores: &[(&str, i64)]) -> Result<(), DashboardError> {
        for &(id, total) in scores {
            upsert_user(conn, &user(id))?;
            set_chapter_document(conn, id, key, &score(total))?;
        }
        Ok(())
    }

    fn genetics() -> ChapterKey {
        ChapterKey::from_display_name("Biology Genetics").unwrap()
    }

    #[test]
    fn test_order_by_nested_score() {
        run_test_in_memory(|conn| {
            let key = genetics();
            seed(conn, &key, &[("d", 80), ("a", 50), ("c", 0), ("b", 80)])?;
            // A user without the chapter is not returned at all.
            upsert_user(conn, &user("e"))?;

            let ids: Vec<String> = get_users_by_chapter_score(conn, &key, None)?
                .into_iter()
                .map(|doc| doc.user.id)
                .collect();
            assert_eq!(ids, vec!["b", "d", "a", "c"]);

            let top: Vec<String> = get_users_by_chapter_score(conn, &key, Some(2))?
                .into_iter()
                .map(|doc| doc.user.id)
                .collect();
            assert_eq!(top, vec!["b", "d"]);
            Ok(())
        });
    }

    #[test]
    fn test_chapter_key_with_quote() {
        run_test_in_memory(|conn| {
            let key = ChapterKey::from_display_name("Biology \"Cell\" Division").unwrap();
            seed(conn, &key, &[("a", 4), ("b", 9)])?;

            let LeaderboardView::Ranked(entries) = load_leaderboard(conn, &key)? else {
                panic!("expected entries");
            };
            let ids: Vec<&str> = entries.iter().map(|e| e.user_id.as_str()).collect();
            assert_eq!(ids, vec!["b", "a"]);
            Ok(())
        });
    }

    #[test]
    fn test_fractional_score_elsewhere_keeps_user_ranked() {
        run_test_in_memory(|conn| {
            let key = genetics();
            seed(conn, &key, &[("a", 50), ("b", 80)])?;
            diesel::update(users::table.find("a"))
                .set(users::chapters.eq(
                    r#"{"BiologyGenetics": {"totalScore": 90}, "BiologyOptics": {"totalScore": 12.5}}"#,
                ))
                .execute(conn)?;

            let LeaderboardView::Ranked(entries) = load_leaderboard(conn, &key)? else {
                panic!("expected entries");
            };
            let ranked: Vec<(&str, u32)> = entries
                .iter()
                .map(|e| (e.user_id.as_str(), e.score))
                .collect();
            assert_eq!(ranked, vec![("a", 90), ("b", 80)]);

            let card = load_result_card(conn, &user("a"), "Biology Genetics", "https://x.org")?;
            assert!(matches!(card, ResultCardState::Card(ref c) if c.rank == 1));

            let summary = load_dashboard(conn, "a", &key, 4)?;
            assert_eq!(summary.answers.values, vec![1]);
            assert!(get_user_document(conn, "a")?
                .and_then(|doc| doc.chapter_record(&key))
                .is_some_and(|record| record.total_score == 90));
            Ok(())
        });
    }

    #[test]
    fn test_malformed_document_does_not_break_query() {
        run_test_in_memory(|conn| {
            let key = genetics();
            seed(conn, &key, &[("a", 10)])?;
            upsert_user(conn, &user("broken"))?;
            diesel::update(users::table.find("broken"))
                .set(users::chapters.eq("{not json"))
                .execute(conn)?;

            let docs = get_users_by_chapter_score(conn, &key, None)?;
            assert_eq!(docs.len(), 1);

            let doc = get_user_document(conn, "broken")?.unwrap();
            assert!(doc.chapters.is_empty());
            Ok(())
        });
    }

    #[test]
    fn test_set_chapter_document_keeps_other_chapters() {
        run_test_in_memory(|conn| {
            let genetics = genetics();
            let optics = ChapterKey::from_display_name("Physics Optics").unwrap();
            upsert_user(conn, &user("a"))?;
            set_chapter_document(conn, "a", &genetics, &score(5))?;
            set_chapter_document(conn, "a", &optics, &score(7))?;
            set_chapter_document(conn, "a", &genetics, &score(9))?;

            let doc = get_user_document(conn, "a")?.unwrap();
            assert_eq!(doc.chapter_record(&genetics).unwrap().total_score, 9);
            assert_eq!(doc.chapter_record(&optics).unwrap().total_score, 7);

            // Profile refresh leaves the chapters in place.
            let mut renamed = user("a");
            renamed.display_name = Some("Renamed".to_string());
            upsert_user(conn, &renamed)?;
            let doc = get_user_document(conn, "a")?.unwrap();
            assert_eq!(doc.user.display_name.as_deref(), Some("Renamed"));
            assert_eq!(doc.chapters.len(), 2);

            assert!(get_user_document(conn, "missing")?.is_none());
            Ok(())
        });
    }

    #[test]
    fn test_sessions() {
        run_test_in_memory(|conn| {
            upsert_user(conn, &user("a"))?;
            let token = create_session(conn, "a")?;
            assert!(Uuid::parse_str(&token).is_ok());
            assert_eq!(get_user_by_token(conn, &token)?.id, "a");

            let err = get_user_by_token(conn, "not-a-uuid").expect_err("Should fail");
            assert!(matches!(err, diesel::result::Error::NotFound));
            let err = get_user_by_token(conn, &Uuid::new_v4().to_string()).expect_err("Should fail");
            assert!(matches!(err, diesel::result::Error::NotFound));

            delete_session(conn, &token)?;
            assert!(get_user_by_token(conn, &token).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_leaderboard_capped_result_card_not() {
        run_test_in_memory(|conn| {
            let key = genetics();
            let scores: Vec<(String, i64)> =
                (0..12).map(|i| (format!("u{:02}", i), 100 - i)).collect();
            let scores: Vec<(&str, i64)> = scores.iter().map(|(id, s)| (id.as_str(), *s)).collect();
            seed(conn, &key, &scores)?;

            let LeaderboardView::Ranked(entries) = load_leaderboard(conn, &key)? else {
                panic!("expected entries");
            };
            assert_eq!(entries.len(), 10);
            assert_eq!(entries[0].user_id, "u00");

            let card = load_result_card(conn, &user("u11"), "Biology Genetics", "https://x.org")?;
            let ResultCardState::Card(card) = card else {
                panic!("expected a card");
            };
            assert_eq!(card.rank, 12);
            assert_eq!(card.score, 89);
            Ok(())
        });
    }

    #[test]
    fn test_load_dashboard() {
        run_test_in_memory(|conn| {
            let key = genetics();
            upsert_user(conn, &user("a"))?;
            let mut quiz_sets = BTreeMap::new();
            quiz_sets.insert(
                "Set_1".to_string(),
                QuizSetDoc {
                    score: Some(8),
                    total_questions: Some(10),
                },
            );
            set_chapter_document(
                conn,
                "a",
                &key,
                &ChapterDoc {
                    total_score: Some(8),
                    total_correct: Some(8),
                    total_wrong: Some(2),
                    completed_quizzes_count: Some(1),
                    quiz_sets: Some(quiz_sets),
                },
            )?;

            let summary = load_dashboard(conn, "a", &key, 4)?;
            assert_eq!(summary.percentage, 25);
            assert_eq!(summary.answers.values, vec![8, 2]);

            // No document at all is the zero-state.
            let summary = load_dashboard(conn, "nobody", &key, 4)?;
            assert_eq!(summary.completed, 0);
            assert_eq!(summary.answers.values, vec![1]);
            Ok(())
        });
    }

    #[test]
    fn test_empty_leaderboard() {
        run_test_in_memory(|conn| {
            let key = genetics();
            seed(conn, &key, &[("a", 0)])?;
            assert_eq!(load_leaderboard(conn, &key)?, LeaderboardView::NoEntries);
            Ok(())
        });
    }

    #[test]
    fn test_reset_database() {
        run_test_in_memory(|conn| {
            seed(conn, &genetics(), &[("a", 3)])?;
            reset_database(conn)?;
            let count: i64 = users::table.count().get_result(conn)?;
            assert_eq!(count, 0);
            Ok(())
        });
    }
}
