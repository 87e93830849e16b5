mod auth;
mod cleanup;
mod db;
mod handlers;
mod models;
mod schema;

use axum::{
    routing::{get, post, put},
    Router,
};
use clap::Parser;
use oauth2::{basic::BasicClient, AuthUrl, ClientId, ClientSecret, RedirectUrl, TokenUrl};
use std::{env, sync::Arc};
use tower_cookies::{CookieManagerLayer, Key};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cleanup::CleanupConfig;
use crate::db::DbPool;

#[derive(Parser, Debug, Clone)]
#[command(name = "innerlog-backend")]
#[command(about = "Innerlog journaling backend server")]
struct Args {
    /// Enable development mode (bypasses OAuth, creates test user)
    #[arg(long)]
    dev_mode: bool,
}

pub struct AppState {
    pub dev_mode: bool,
    pub db_pool: DbPool,
    pub oauth_basic_client: Option<BasicClient>,
    pub cookie_key: Key,
    pub allowed_email_domain: Option<String>,
    pub allowed_emails: Option<Vec<String>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if args.dev_mode {
        tracing::warn!("🚧 DEV MODE ENABLED - OAuth is bypassed, test user will be used");
    }

    // Load environment variables
    dotenvy::dotenv().ok();

    // Create database pool and apply pending migrations
    let pool = db::create_pool()?;
    let applied = db::run_migrations(&pool)?;
    if !applied.is_empty() {
        tracing::info!("Applied {} migrations: {:?}", applied.len(), applied);
    }

    // Create OAuth client (skip in dev mode)
    let oauth_basic_client = if !args.dev_mode {
        let client_id =
            ClientId::new(env::var("GOOGLE_CLIENT_ID").expect("GOOGLE_CLIENT_ID must be set"));
        let client_secret = ClientSecret::new(
            env::var("GOOGLE_CLIENT_SECRET").expect("GOOGLE_CLIENT_SECRET must be set"),
        );
        let auth_url = AuthUrl::new("https://accounts.google.com/o/oauth2/v2/auth".to_string())?;
        let token_url = TokenUrl::new("https://oauth2.googleapis.com/token".to_string())?;
        let redirect_uri = RedirectUrl::new(
            env::var("GOOGLE_REDIRECT_URI").expect("GOOGLE_REDIRECT_URI must be set"),
        )?;

        Some(
            BasicClient::new(client_id, Some(client_secret), auth_url, Some(token_url))
                .set_redirect_uri(redirect_uri),
        )
    } else {
        None
    };

    // Signed cookie key: hex from env, or ephemeral (sessions die on restart)
    let cookie_key = match env::var("SESSION_COOKIE_KEY") {
        Ok(hex_key) => {
            let bytes = hex::decode(&hex_key)
                .map_err(|_| anyhow::anyhow!("SESSION_COOKIE_KEY must be hex"))?;
            Key::try_from(bytes.as_slice())
                .map_err(|_| anyhow::anyhow!("SESSION_COOKIE_KEY must be at least 64 bytes"))?
        }
        Err(_) => {
            tracing::warn!("SESSION_COOKIE_KEY not set, using an ephemeral key");
            Key::generate()
        }
    };

    // Email allowlist
    let allowed_email_domain = env::var("ALLOWED_EMAIL_DOMAIN").ok();
    let allowed_emails = env::var("ALLOWED_EMAILS").ok().map(|list| {
        list.split(',')
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect::<Vec<_>>()
    });

    // Create test user in dev mode
    if args.dev_mode {
        use diesel::prelude::*;
        use models::NewUser;
        use schema::users::dsl::*;

        let mut conn = pool.get()?;
        let test_user = users
            .filter(email.eq("testing@testing.local"))
            .first::<models::User>(&mut conn)
            .optional()?;

        if test_user.is_none() {
            let new_user = NewUser {
                id: models::new_row_id(),
                name: Some("Test User".to_string()),
                email: "testing@testing.local".to_string(),
                image: None,
            };

            diesel::insert_into(users)
                .values(&new_user)
                .execute(&mut conn)?;

            tracing::info!("✓ Created test user: testing@testing.local");
        }
    }

    // Periodic cleanup of expired sessions and verification tokens
    let cleanup_config = CleanupConfig::new(
        env::var("CLEANUP_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(CleanupConfig::default().interval_secs),
    );

    if cleanup_config.enabled() {
        let cleanup_pool = pool.clone();
        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(std::time::Duration::from_secs(cleanup_config.interval_secs));
            loop {
                ticker.tick().await;
                match cleanup_pool.get() {
                    Ok(mut conn) => {
                        cleanup::run_cleanup(&mut conn);
                    }
                    Err(e) => tracing::error!("Cleanup: failed to get db connection: {}", e),
                }
            }
        });
    }

    // Create app state
    let app_state = Arc::new(AppState {
        dev_mode: args.dev_mode,
        db_pool: pool.clone(),
        oauth_basic_client,
        cookie_key,
        allowed_email_domain,
        allowed_emails,
    });

    // Setup CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build our application with routes
    let app = Router::new()
        // Health check / root
        .route("/", get(|| async { "Innerlog Backend" }))
        // Auth routes
        .route("/auth/google", get(handlers::auth::login))
        .route("/auth/google/callback", get(handlers::auth::callback))
        .route(
            "/auth/me",
            get(handlers::auth::me).delete(handlers::auth::delete_me),
        )
        .route("/auth/logout", get(handlers::auth::logout))
        .route(
            "/auth/verify-email/request",
            post(handlers::auth::request_email_verification),
        )
        .route(
            "/auth/verify-email/confirm",
            post(handlers::auth::confirm_email_verification),
        )
        // Dev mode routes
        .route("/auth/dev-login", get(handlers::auth::dev_login))
        // Journal entry API routes
        .route(
            "/api/entries",
            get(handlers::entries::list_entries).post(handlers::entries::create_entry),
        )
        .route(
            "/api/entries/shared-with-me",
            get(handlers::entries::shared_with_me),
        )
        .route(
            "/api/entries/:id",
            get(handlers::entries::get_entry)
                .put(handlers::entries::update_entry)
                .delete(handlers::entries::delete_entry),
        )
        // Share management
        .route(
            "/api/entries/:id/shares",
            get(handlers::shares::list_shares).post(handlers::shares::share_entry),
        )
        .route(
            "/api/entries/:id/shares/:user_id",
            put(handlers::shares::update_share).delete(handlers::shares::remove_share),
        )
        // Analysis (1:1 per entry)
        .route(
            "/api/entries/:id/analysis",
            get(handlers::analysis::get_analysis)
                .put(handlers::analysis::upsert_analysis)
                .delete(handlers::analysis::delete_analysis),
        )
        // WebAuthn credential registry
        .route(
            "/api/authenticators",
            get(handlers::authenticators::list_authenticators)
                .post(handlers::authenticators::register_authenticator),
        )
        .route(
            "/api/authenticators/:credential_id",
            put(handlers::authenticators::update_counter)
                .delete(handlers::authenticators::delete_authenticator),
        )
        // Stats
        .route("/api/stats", get(handlers::stats::get_stats))
        // Add single unified state
        .with_state(app_state.clone())
        .layer(CookieManagerLayer::new())
        .layer(cors);

    // Run the server
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
