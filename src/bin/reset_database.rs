#[cfg(feature = "ssr")]
use chapter_dashboard::{config::AppConfig, establish_connection, reset_database};

#[cfg(feature = "ssr")]
fn main() {
    let config = AppConfig::from_env().expect("DATABASE_URL must be set in .env.");
    let mut conn = establish_connection(&config.database_url).expect("Failed to connect");
    reset_database(&mut conn).expect("Failed to reset database");
    println!("Database has been reset.");
}

#[cfg(not(feature = "ssr"))]
fn main() {
    println!("This binary requires the 'ssr' feature to be enabled.");
}
