use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::{AccessMode, Config};
use crate::downloader::{XLSX_CONTENT_TYPE, export_filename, to_xlsx};
use crate::error::{Result, RosterError};
use crate::loader;
use crate::login::{self, SessionStore};
use crate::pages::{self, PageGlobals, Pages};
use crate::roster::Roster;

pub struct AppState {
    pub config: Config,
    pub pages: Pages,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self {
            config,
            pages: Pages::new()?,
            sessions: SessionStore::default(),
        })
    }

    /// Read the roster workbook on the blocking pool.
    pub async fn load_roster(&self) -> Result<Roster> {
        let path = self.config.db_path.clone();
        blocking(move || loader::load_roster(path)).await
    }
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

/// Handler failure. Logged and turned into a bare 500.
#[derive(Debug)]
pub struct AppError(RosterError);

impl From<RosterError> for AppError {
    fn from(err: RosterError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "The roster is unavailable right now",
        )
            .into_response()
    }
}

#[derive(Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Build the router for `state`
///
/// The member export is only routed in members mode, and then only behind
/// the member session check.
pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/", get(serve_start))
        .route("/list", get(serve_list))
        .route("/detail/:hull", get(serve_detail))
        .route("/search", get(handle_search))
        .route(
            "/login",
            get(login::serve_login_page).post(login::handle_login),
        )
        .route("/logout", get(login::handle_logout))
        .route("/health", get(health));

    if state.config.access_mode == AccessMode::Members {
        app = app.route(
            "/download/members",
            get(download_member_file).route_layer(middleware::from_fn_with_state(
                state.clone(),
                login::require_member,
            )),
        );
    }

    app.nest_service("/static", ServeDir::new(&state.config.static_dir))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: Config) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let bind = config.bind;
    let access_mode = config.access_mode;
    let db_path = config.db_path.clone();

    let state = Arc::new(AppState::new(config)?);

    // Fail early on an unreadable roster rather than on the first request
    let roster = state.load_roster().await?;
    info!(db = %db_path.display(), boats = roster.len(), "roster loaded");

    let app = router(state);

    let listener = TcpListener::bind(bind).await?;
    info!(
        "Listening on http://{} ({} access)",
        bind,
        access_mode.as_str()
    );
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_start(
    State(state): State<Arc<AppState>>,
    globals: PageGlobals,
) -> std::result::Result<Html<String>, AppError> {
    let html = state.pages.render(pages::START, &globals, json!({}))?;
    Ok(Html(html))
}

async fn serve_list(
    State(state): State<Arc<AppState>>,
    globals: PageGlobals,
) -> std::result::Result<Html<String>, AppError> {
    let roster = state.load_roster().await?;
    let html = state.pages.render(
        pages::LIST,
        &globals,
        json!({
            "page_title": "List of All Known Seabreezes",
            "boats": roster.boats(),
            "count": roster.len(),
        }),
    )?;
    Ok(Html(html))
}

async fn serve_detail(
    State(state): State<Arc<AppState>>,
    globals: PageGlobals,
    Path(hull): Path<String>,
) -> std::result::Result<Response, AppError> {
    let roster = state.load_roster().await?;

    let Some(boat) = roster.get(&hull) else {
        let message = format!("Hull {} is not a known Seabreeze", hull);
        return error_page(&state, &globals, StatusCode::NOT_FOUND, &message);
    };

    let previous_owners: Vec<_> = boat.owners.iter().skip(1).collect();
    let html = state.pages.render(
        pages::DETAIL,
        &globals,
        json!({
            "page_title": format!("Hull #{}", boat.hull),
            "hull": hull,
            "boat": boat,
            "current_owner": boat.current_owner(),
            "previous_owners": previous_owners,
            "sale_link": pages::web_link(&boat.sale_link),
        }),
    )?;
    Ok(Html(html).into_response())
}

/// A number jumps straight to that hull; anything else is a text search.
async fn handle_search(
    State(state): State<Arc<AppState>>,
    globals: PageGlobals,
    Query(query): Query<SearchQuery>,
) -> std::result::Result<Response, AppError> {
    let q = match query.q {
        Some(q) if !q.is_empty() => q,
        _ => return Ok(Redirect::to(&format!("{}/list", globals.root)).into_response()),
    };

    if let Ok(hull) = q.trim().parse::<i64>() {
        return Ok(Redirect::to(&format!("{}/detail/{}", globals.root, hull)).into_response());
    }

    let roster = state.load_roster().await?;
    let boats = roster.search(&q);
    let html = state.pages.render(
        pages::LIST,
        &globals,
        json!({
            "page_title": "Search Results",
            "search_term": q,
            "count": boats.len(),
            "boats": boats,
        }),
    )?;
    Ok(Html(html).into_response())
}

/// Stream the member export as an attachment named after the roster's
/// last-modified date.
async fn download_member_file(
    State(state): State<Arc<AppState>>,
) -> std::result::Result<Response, AppError> {
    let path = state.config.db_path.clone();
    let (bytes, modified) = blocking(move || {
        let roster = loader::load_roster(&path)?;
        Ok((to_xlsx(&roster)?, loader::last_modified(&path)?))
    })
    .await?;

    let filename = export_filename(&modified);
    info!(file = %filename, bytes = bytes.len(), "member export downloaded");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn not_found(
    State(state): State<Arc<AppState>>,
    globals: PageGlobals,
) -> std::result::Result<Response, AppError> {
    error_page(&state, &globals, StatusCode::NOT_FOUND, "Page not found")
}

fn error_page(
    state: &AppState,
    globals: &PageGlobals,
    status: StatusCode,
    message: &str,
) -> std::result::Result<Response, AppError> {
    let html = state.pages.render(
        pages::ERROR,
        globals,
        json!({
            "page_title": status.canonical_reason().unwrap_or("Error"),
            "status": status.as_u16(),
            "message": message,
        }),
    )?;
    Ok((status, Html(html)).into_response())
}
