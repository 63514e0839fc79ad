//! Web API Module
//!
//! Exposes JSON endpoints for the Career Coach chat frontend.
//! All endpoints return the `ApiResponse` envelope and require no
//! authentication; a session id is the only handle a client holds.

use crate::agent::{
    CachedProfileStore, CareerCoach, CoachError, KnowledgeBase, KnowledgeBaseError, MemoryStore,
    MessageLog, ProfileStore, ReplyKind, Stage, StoreError,
};
use crate::config::CoachConfig;
use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

// ============================================================
// APPLICATION STATE
// ============================================================

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Failed to load career knowledge base: {0}")]
    KnowledgeBase(#[from] KnowledgeBaseError),

    #[error("Failed to open store: {0}")]
    Store(#[from] StoreError),
}

/// Shared application state
pub struct AppState {
    pub coach: CareerCoach,
}

impl AppState {
    pub fn new(coach: CareerCoach) -> Self {
        Self { coach }
    }

    /// Wire the knowledge base and the SQLite store described by `config`
    pub fn from_config(config: &CoachConfig) -> Result<Self, StartupError> {
        let kb = match &config.roles_path {
            Some(path) => {
                log::info!("Loading career paths from {}", path.display());
                KnowledgeBase::load(path)?
            }
            None => KnowledgeBase::builtin()?,
        };
        log::info!("Knowledge base ready with {} roles", kb.all_roles().len());

        let store = if config.uses_in_memory_db() {
            log::warn!("Using an in-memory database; sessions will not survive a restart");
            MemoryStore::in_memory()?
        } else {
            log::info!("Opening session database {}", config.db_path);
            MemoryStore::new(&config.db_path)?
        };
        let store = Arc::new(store);

        let profiles: Arc<dyn ProfileStore> =
            Arc::new(CachedProfileStore::new(store.clone(), config.profile_cache));
        let messages: Arc<dyn MessageLog> = store;

        Ok(Self::new(CareerCoach::new(Arc::new(kb), profiles, messages)))
    }
}

// ============================================================
// API REQUEST/RESPONSE TYPES
// ============================================================

#[derive(Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub stage: Stage,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub reply: String,
    #[serde(rename = "type")]
    pub kind: ReplyKind,
    pub quick_replies: Vec<String>,
    pub profile_update: ProfileUpdate,
}

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: &str) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.to_string()),
        }
    }
}

fn store_failure(e: CoachError) -> HttpResponse {
    log::error!("Request failed: {}", e);
    HttpResponse::InternalServerError().json(ApiResponse::<()>::error(&e.to_string()))
}

// ============================================================
// API HANDLERS
// ============================================================

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "Career Coach API",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Start a new conversation
async fn create_session(data: web::Data<Arc<AppState>>) -> impl Responder {
    match data.coach.start_session() {
        Ok(profile) => HttpResponse::Ok().json(ApiResponse::success(profile)),
        Err(e) => store_failure(e),
    }
}

/// Current profile; a default one for sessions never seen
async fn get_profile(data: web::Data<Arc<AppState>>, path: web::Path<String>) -> impl Responder {
    let session_id = path.into_inner();
    match data.coach.get_profile(&session_id) {
        Ok(profile) => HttpResponse::Ok().json(ApiResponse::success(profile)),
        Err(e) => store_failure(e),
    }
}

async fn get_history(data: web::Data<Arc<AppState>>, path: web::Path<String>) -> impl Responder {
    let session_id = path.into_inner();
    match data.coach.history(&session_id) {
        Ok(messages) => HttpResponse::Ok().json(ApiResponse::success(messages)),
        Err(e) => store_failure(e),
    }
}

/// One chat turn
async fn chat(data: web::Data<Arc<AppState>>, req: web::Json<ChatRequest>) -> impl Responder {
    if req.message.trim().is_empty() {
        return HttpResponse::BadRequest().json(ApiResponse::<()>::error("Message is empty"));
    }

    match data.coach.session_exists(&req.session_id) {
        Ok(true) => {}
        Ok(false) => {
            return HttpResponse::BadRequest().json(ApiResponse::<()>::error(
                "Unknown session. Start one with POST /api/session first.",
            ));
        }
        Err(e) => return store_failure(e),
    }

    match data.coach.turn(&req.session_id, &req.message) {
        Ok(turn) => HttpResponse::Ok().json(ApiResponse::success(ChatResponse {
            reply: turn.reply.text,
            kind: turn.reply.kind,
            quick_replies: turn.reply.quick_replies,
            profile_update: ProfileUpdate {
                name: turn.profile.name,
                stage: turn.profile.stage,
            },
        })),
        Err(e) => store_failure(e),
    }
}

/// Every career path the coach knows, in canonical order
async fn get_roles(data: web::Data<Arc<AppState>>) -> impl Responder {
    HttpResponse::Ok().json(ApiResponse::success(data.coach.knowledge().all_roles()))
}

// ============================================================
// SERVER CONFIGURATION
// ============================================================

/// Register every route. Shared by the server and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/api/session", web::post().to(create_session))
        .route("/api/session/{session_id}/profile", web::get().to(get_profile))
        .route("/api/session/{session_id}/history", web::get().to(get_history))
        .route("/api/chat", web::post().to(chat))
        .route("/api/roles", web::get().to(get_roles));
}

/// Configure and run the API server
pub async fn run_server(config: CoachConfig) -> std::io::Result<()> {
    let state = AppState::from_config(&config).map_err(|e| {
        log::error!("{}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;
    let state = Arc::new(state);

    log::info!("Career Coach API starting at http://{}:{}", config.host, config.port);
    log::info!("   POST /api/session               - Start a session");
    log::info!("   GET  /api/session/:id/profile   - Session profile");
    log::info!("   GET  /api/session/:id/history   - Chat history");
    log::info!("   POST /api/chat                  - Send a message");
    log::info!("   GET  /api/roles                 - Known career paths");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .app_data(web::Data::new(state.clone()))
            .configure(configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
