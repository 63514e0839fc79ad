//! Career Coach Backend - Main Entry Point
//!
//! Starts the web API server for the Career Coach chatbot.

use career_coach::{api::run_server, CoachConfig};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = CoachConfig::from_env();
    log::info!(
        "Career Coach starting (db: {}, profile cache: {})",
        config.db_path,
        config.profile_cache
    );

    run_server(config).await
}
