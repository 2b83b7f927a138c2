use dotenvy::dotenv;
use std::env;

use crate::content::chapter_path;

/// Server settings, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub catalog_path: String,
    /// Public origin of the site, used to build the shared page links.
    pub site_url: String,
    /// Where signed-out visitors are sent.
    pub login_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv().ok();
        Ok(AppConfig {
            database_url: env::var("DATABASE_URL")?,
            catalog_path: env::var("CHAPTER_CATALOG").unwrap_or_else(|_| "chapters.json".to_string()),
            site_url: env::var("SITE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:3000".to_string())
                .trim_end_matches('/')
                .to_string(),
            login_url: env::var("LOGIN_URL").unwrap_or_else(|_| "/login".to_string()),
        })
    }

    /// Absolute URL of a chapter's dashboard page.
    pub fn chapter_page_url(&self, chapter_display_name: &str) -> String {
        format!("{}{}", self.site_url, chapter_path(chapter_display_name))
    }
}
