//! Pluma Server — Application entry point.

mod config;

use pluma_auth::IdentityService;
use pluma_db::repository::{
    SurrealCommentRepository, SurrealPostRepository, SurrealUserRepository,
};
use pluma_db::DbManager;
use pluma_engine::{CatalogService, EngagementService, ModerationService, SocialService};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("pluma=info".parse().unwrap()))
        .json()
        .init();

    tracing::info!("Starting Pluma server...");

    let config = config::Config::load();

    let manager = match DbManager::connect(&config.db).await {
        Ok(manager) => manager,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to SurrealDB");
            std::process::exit(1);
        }
    };

    if let Err(e) = pluma_db::run_migrations(manager.client()).await {
        tracing::error!(error = %e, "Failed to run migrations");
        std::process::exit(1);
    }

    let db = manager.client().clone();
    let users = match config.auth.pepper.clone() {
        Some(pepper) => SurrealUserRepository::with_pepper(db.clone(), pepper),
        None => SurrealUserRepository::new(db.clone()),
    };
    let posts = SurrealPostRepository::new(db.clone());
    let comments = SurrealCommentRepository::new(db);

    let _identity = IdentityService::new(users.clone(), config.auth.clone());
    let _social = SocialService::new(users.clone(), posts.clone());
    let _engagement = EngagementService::new(users.clone(), posts.clone(), comments.clone());
    let _catalog = CatalogService::new(users.clone(), posts.clone());
    let moderation = ModerationService::new(users, posts, comments);

    match moderation.stats().await {
        Ok(stats) => tracing::info!(
            users = stats.users,
            posts = stats.posts,
            comments = stats.comments,
            "Core services ready"
        ),
        Err(e) => tracing::warn!(error = %e, "Core services ready, stats unavailable"),
    }

    // TODO: Mount the HTTP transport over these services.

    tracing::info!("Pluma server stopped.");
}
