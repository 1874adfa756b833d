mod authentication;
mod data_formats;
mod db_helpers;
mod errors;
mod handlers;
mod models;
mod notifications;

use anyhow::Context;
pub use anyhow::Result;
use axum::http::StatusCode;
use axum::{routing::*, Extension, Json, Router};
pub use data_formats::*;
use handlers::*;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::{
    net::{SocketAddr, TcpListener},
    sync::Arc,
};
use tracing::info;

pub type JsonResponse<T> = (StatusCode, Json<T>);

pub async fn run_app(app: Router, address: SocketAddr) -> Result<()> {
    let db = init_db().await?;
    let app = app.layer(Extension(Arc::new(db)));
    axum::Server::bind(&address)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

pub async fn init_db() -> Result<SqlitePool> {
    let db_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    init_db_from_url(&db_url).await
}

pub async fn init_db_from_url(db_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
        info!("Creating database {}", db_url);
        Sqlite::create_database(db_url)
            .await
            .context("Failed to create database")?;
    }
    let pool = SqlitePool::connect(db_url).await?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    info!("Migrations completed");
    Ok(pool)
}

pub fn get_random_free_port() -> (u16, SocketAddr) {
    let listener = TcpListener::bind("localhost:0").unwrap();
    match listener.local_addr() {
        Ok(addr) => (addr.port(), addr),
        Err(_) => panic!("Could not get a free port"),
    }
}

pub fn make_router() -> Router {
    Router::new()
        .route("/check_health", get(alive))
        .route("/users", post(register_user))
        .route("/users/login", post(login_user))
        .route("/user", get(get_current_user))
        .route("/auctions", get(list_auctions).post(create_auction))
        .route("/auctions/search", get(search_auctions))
        .route("/auctions/:auction_id", get(get_auction))
        .route("/auctions/:auction_id/bids", get(list_bids).post(place_bid))
        .route("/auctions/:auction_id/close", post(close_auction))
        .route("/auctions/:auction_id/watch", post(toggle_watch))
        .route(
            "/auctions/:auction_id/comments",
            get(list_comments).post(add_comment),
        )
        .route("/categories", get(list_categories))
        .route("/categories/:category_name", get(list_category_auctions))
        .route("/watchlist", get(get_watchlist))
        .route("/purchases", get(get_purchases))
        .fallback(not_found)
}
