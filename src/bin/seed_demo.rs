#[cfg(feature = "ssr")]
use chapter_dashboard::{
    chapter::ChapterKey,
    config::AppConfig,
    content::Catalog,
    create_session, establish_connection, init_schema,
    model::{ChapterDoc, QuizSetDoc, User},
    set_chapter_document, upsert_user,
};

#[cfg(feature = "ssr")]
const DEMO_USERS: [(&str, &str); 5] = [
    ("demo-rahim", "Rahim"),
    ("demo-karim", "Karim"),
    ("demo-nusrat", "Nusrat"),
    ("demo-tania", "Tania"),
    ("demo-sakib", "Sakib"),
];

#[cfg(feature = "ssr")]
const QUESTIONS_PER_SET: i64 = 10;

// Random scores for a few of the chapter's quiz sets.
#[cfg(feature = "ssr")]
fn random_chapter_doc(rng: &mut impl rand::Rng, quiz_count: u32) -> ChapterDoc {
    let attempted = rng.random_range(0..=quiz_count.max(1));
    let mut doc = ChapterDoc {
        total_score: Some(0),
        total_correct: Some(0),
        total_wrong: Some(0),
        completed_quizzes_count: Some(i64::from(attempted)),
        quiz_sets: Some(Default::default()),
    };
    for set in 1..=attempted {
        let score = rng.random_range(0..=QUESTIONS_PER_SET);
        doc.total_score = doc.total_score.map(|s| s + score);
        doc.total_correct = doc.total_correct.map(|c| c + score);
        doc.total_wrong = doc.total_wrong.map(|w| w + QUESTIONS_PER_SET - score);
        if let Some(sets) = doc.quiz_sets.as_mut() {
            sets.insert(
                format!("Set_{}", set),
                QuizSetDoc {
                    score: Some(score),
                    total_questions: Some(QUESTIONS_PER_SET),
                },
            );
        }
    }
    doc
}

#[cfg(feature = "ssr")]
fn main() {
    let config = AppConfig::from_env().expect("DATABASE_URL must be set in .env.");
    let catalog = Catalog::load(&config.catalog_path).expect("Failed to load chapter catalog");
    let mut conn = establish_connection(&config.database_url).expect("Failed to connect");
    init_schema(&mut conn).expect("Failed to create the schema");

    let mut rng = rand::rng();
    for (id, name) in DEMO_USERS {
        let user = User {
            id: id.to_string(),
            display_name: Some(name.to_string()),
            email: Some(format!("{}@example.org", id)),
            photo_url: None,
        };
        upsert_user(&mut conn, &user).expect("Failed to insert user");

        for page in &catalog.chapters {
            let Ok(key) = ChapterKey::from_display_name(&page.display_name) else {
                continue;
            };
            let doc = random_chapter_doc(&mut rng, page.total_quizzes());
            set_chapter_document(&mut conn, id, &key, &doc)
                .expect("Failed to write chapter document");
        }

        let token = create_session(&mut conn, id).expect("Failed to create session");
        println!("{} ({}): {}", name, id, token);
    }
    println!("Seeded {} demo users.", DEMO_USERS.len());
}

#[cfg(not(feature = "ssr"))]
fn main() {
    println!("This binary requires the 'ssr' feature to be enabled.");
}
