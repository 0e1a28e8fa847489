//! HTTP presentation layer.

mod error;
mod handlers;
mod pages;
mod session;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use dashmap::DashMap;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use penscore_core::pdf::REPORTS_URL_PREFIX;
use penscore_core::uploads::UPLOADS_URL_PREFIX;
use penscore_core::{Analyzer, Database, PenscoreConfig, ReportWriter, UploadDir};

pub use session::{Session, SessionUser};

use handlers::{account, analysis, reports, worksheets};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<PenscoreConfig>,
    pub uploads: UploadDir,
    pub reports: ReportWriter,
    pub analyzer: Arc<Analyzer>,
    pub sessions: Arc<DashMap<Uuid, Session>>,
}

impl AppState {
    /// Open the database and prepare the upload and report directories.
    pub fn open(config: PenscoreConfig) -> anyhow::Result<Self> {
        let db = Database::open(config.storage.database_path.clone())?;
        let uploads = UploadDir::new(config.storage.upload_dir.clone());
        uploads.ensure()?;
        std::fs::create_dir_all(&config.storage.report_dir)?;

        Ok(Self {
            db,
            uploads,
            reports: ReportWriter::new(config.storage.report_dir.clone()),
            analyzer: Arc::new(Analyzer::new()),
            sessions: Arc::new(DashMap::new()),
            config: Arc::new(config),
        })
    }
}

pub fn router(state: AppState) -> Router {
    let uploads = ServeDir::new(state.uploads.root());
    let reports_dir = ServeDir::new(&state.config.storage.report_dir);
    let body_limit = state.config.server.max_upload_bytes;

    Router::new()
        .route("/", get(account::home))
        .route("/register", get(account::register_page).post(account::register))
        .route("/login", get(account::login_page).post(account::login))
        .route("/logout", get(account::logout))
        .route("/upload", get(analysis::upload_page).post(analysis::upload))
        .route("/result/{filename}/{lang}", get(analysis::result))
        .route("/view_report/{id}", get(reports::view_report))
        .route("/reports", get(reports::list_reports))
        .route("/dashboard", get(reports::dashboard))
        .route("/download_report/{id}", get(reports::download_report))
        .route("/delete_report/{id}", post(reports::delete_report))
        .route("/practice", get(worksheets::practice_menu))
        .route(
            "/worksheet",
            get(worksheets::worksheet_page).post(worksheets::custom_worksheet),
        )
        .route("/worksheet/english/az", get(worksheets::english_az))
        .route("/worksheet/cursive", get(worksheets::cursive))
        .route("/worksheet/devanagari/matra", get(worksheets::devanagari_matra))
        .route("/worksheet/devanagari/shirorekha", get(worksheets::shirorekha))
        .route("/full_practice/{text}", get(worksheets::full_practice))
        .nest_service(UPLOADS_URL_PREFIX, uploads)
        .nest_service(REPORTS_URL_PREFIX, reports_dir)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
