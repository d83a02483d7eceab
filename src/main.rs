//! Mindcare Backend - mental health platform API
//! Mission: Bearer-token authentication core with accounts, catalog,
//! chat relay, and upload delegation around it

mod auth;
mod catalog;
mod chat;
mod config;
mod middleware;
mod storage;

use anyhow::{Context, Result};
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Json, Router,
};
use dotenv::dotenv;
use serde_json::{json, Value};
use std::{path::Path, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    auth::{
        api as auth_api, auth_middleware, optional_auth_middleware, AuthState, Mailer, TokenIssuer,
        TokenStore, TokenValidator, UserStore,
    },
    catalog::{api as catalog_api, CatalogStore},
    chat::{api as chat_api, ChatClient, MessageStore},
    config::Config,
    middleware::request_logging,
    storage::{api as storage_api, SasGenerator},
};

/// Application state shared by the content handlers.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogStore>,
    pub messages: Arc<MessageStore>,
    pub chat: Option<Arc<ChatClient>>,
    pub sas: Option<Arc<SasGenerator>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    info!("🚀 Mindcare backend starting");

    let config = Config::from_env();

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")?;

    // Authentication core: user store, token store, issuer, validator.
    let user_store = Arc::new(UserStore::new(&config.auth_db_path)?);
    let token_store = Arc::new(TokenStore::new(&config.auth_db_path)?);
    let issuer = Arc::new(
        TokenIssuer::new(config.jwt_secret.clone(), token_store.clone())
            .with_validity_hours(config.token_validity_hours),
    );
    let validator = Arc::new(TokenValidator::new(
        config.jwt_secret.clone(),
        token_store.clone(),
        user_store.clone(),
    ));

    info!("🔐 Authentication initialized at: {}", config.auth_db_path);

    let mailer = Arc::new(Mailer::new(
        http_client.clone(),
        config.mail_relay_url.clone(),
        config.mail_from_address.clone(),
    ));

    let catalog = Arc::new(CatalogStore::new(&config.content_db_path)?);
    let messages = Arc::new(MessageStore::new(&config.content_db_path)?);

    info!("📚 Content store initialized at: {}", config.content_db_path);

    let chat = match &config.openai_api_key {
        Some(key) => Some(Arc::new(ChatClient::new(
            http_client.clone(),
            key.clone(),
            config.openai_base_url.clone(),
            config.openai_model.clone(),
        ))),
        None => {
            warn!("⚠️  OPENAI_API_KEY not configured - chat relay disabled");
            None
        }
    };

    let sas = match (&config.azure_account_name, &config.azure_account_key) {
        (Some(account), Some(key)) => {
            Some(Arc::new(SasGenerator::new(account.clone(), key.clone())))
        }
        _ => {
            warn!("⚠️  Azure storage not configured - upload delegation disabled");
            None
        }
    };

    let auth_state = AuthState {
        user_store,
        token_store,
        issuer,
        mailer,
    };

    let app_state = AppState {
        catalog,
        messages,
        chat,
        sas,
    };

    // Public account routes (no credential required).
    let public_accounts = Router::new()
        .route("/api/accounts/signup", post(auth_api::signup))
        .route("/api/accounts/login", post(auth_api::login))
        .route(
            "/api/accounts/password/reset/request",
            post(auth_api::request_password_reset),
        )
        .route("/api/accounts/password/reset", post(auth_api::reset_password))
        .with_state(auth_state.clone());

    // Account routes that mandate authentication.
    let protected_accounts = Router::new()
        .route("/api/accounts/logout", post(auth_api::logout))
        .route("/api/accounts/dummy", get(auth_api::dummy))
        .route(
            "/api/accounts/profile",
            get(auth_api::get_profile).put(auth_api::update_profile),
        )
        .route(
            "/api/accounts/password/change",
            put(auth_api::change_password),
        )
        .route_layer(from_fn_with_state(validator.clone(), auth_middleware))
        .with_state(auth_state);

    // Catalog reads are public; a presented token is still validated.
    let public_api = Router::new()
        .route("/api/books", get(catalog_api::list_books))
        .route("/api/books/:id", get(catalog_api::get_book))
        .route("/api/videos", get(catalog_api::list_videos))
        .route(
            "/api/videos/categories",
            get(catalog_api::list_video_categories),
        )
        .route_layer(from_fn_with_state(
            validator.clone(),
            optional_auth_middleware,
        ))
        .with_state(app_state.clone());

    // Everything that writes or is per-user mandates authentication.
    let protected_api = Router::new()
        .route("/api/books", post(catalog_api::create_book))
        .route("/api/videos", post(catalog_api::create_video))
        .route(
            "/api/videos/categories",
            post(catalog_api::create_video_category),
        )
        .route("/api/chat", post(chat_api::send_message))
        .route("/api/chat/history", get(chat_api::chat_history))
        .route("/api/uploads/sas", post(storage_api::create_upload_url))
        .route_layer(from_fn_with_state(validator.clone(), auth_middleware))
        .with_state(app_state);

    let app = Router::new()
        .route("/health", get(health_check))
        .merge(public_accounts)
        .merge(protected_accounts)
        .merge(public_api)
        .merge(protected_api)
        .layer(from_fn(request_logging))
        .layer(CorsLayer::permissive());

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    info!("🎯 API server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Initialize tracing from RUST_LOG, with a sensible default filter.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mindcare=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // Also try the crate directory's .env (common when running with
    // --manifest-path from elsewhere).
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let candidate = manifest_dir.join(".env");
    if candidate.exists() {
        let _ = dotenv::from_path(&candidate);
    }
}
