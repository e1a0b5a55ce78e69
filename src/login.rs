#![cfg(feature = "web")]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use axum::{
    Form,
    extract::{Query, Request, State},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::app::{AppError, AppState};
use crate::config::AccessMode;
use crate::pages::{self, PageGlobals, RequestUrl};
use crate::roster::MemberCredentials;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "session";

const SESSION_DURATION: Duration = Duration::from_secs(24 * 60 * 60); // 24 hours

/// A logged-in member, identified by the hull they logged in with.
#[derive(Debug, Clone)]
pub struct Session {
    pub hull: String,
    pub expires_at: SystemTime,
}

/// Active member sessions, held in memory only.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SESSION_DURATION)
    }
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Create a new session for `hull` and return its id.
    ///
    /// Expired sessions are swept out at the same time.
    pub fn create_session(&self, hull: &str) -> String {
        let session_id = Uuid::new_v4().to_string();
        let now = SystemTime::now();

        let mut sessions = self.sessions.write();
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(
            session_id.clone(),
            Session {
                hull: hull.to_string(),
                expires_at: now + self.ttl,
            },
        );

        session_id
    }

    /// The hull for a live session, or `None` when the id is unknown or
    /// expired.
    pub fn validate_session(&self, session_id: &str) -> Option<String> {
        let sessions = self.sessions.read();
        sessions
            .get(session_id)
            .filter(|s| s.expires_at > SystemTime::now())
            .map(|s| s.hull.clone())
    }

    pub fn end_session(&self, session_id: &str) {
        self.sessions.write().remove(session_id);
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Query string of the login page: a flash message and where to go next.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
    pub next: Option<String>,
}

/// Login form submission.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub hull: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    pub next: Option<String>,
}

impl LoginForm {
    fn credentials(&self) -> MemberCredentials {
        MemberCredentials {
            hull: self.hull.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Only same-site absolute paths are followed after login.
fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
}

fn login_redirect(root: &str, error: &str, next: &str) -> Response {
    Redirect::to(&format!(
        "{}/login?error={}&next={}",
        root,
        urlencoding::encode(error),
        urlencoding::encode(next)
    ))
    .into_response()
}

/// Serve the member login page
///
/// Shows the flash message from a failed attempt, if any.
pub async fn serve_login_page(
    State(state): State<Arc<AppState>>,
    globals: PageGlobals,
    Query(query): Query<LoginQuery>,
) -> Result<Html<String>, AppError> {
    let next = safe_next(query.next.as_deref()).unwrap_or("/");
    let html = state.pages.render(
        pages::LOGIN,
        &globals,
        json!({
            "page_title": "Member Login",
            "error": query.error,
            "next": next,
            "login_enabled": state.config.access_mode == AccessMode::Members,
        }),
    )?;
    Ok(Html(html))
}

/// Handle member login requests
///
/// Checks the three form fields against the current roster and starts a
/// session on a match.
///
/// # Returns
/// * `Response` - Redirect to `next` with a session cookie on success, or
///   back to the login page with a flash message
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    globals: PageGlobals,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let next = safe_next(form.next.as_deref()).unwrap_or("/").to_string();

    if state.config.access_mode != AccessMode::Members {
        return Ok(login_redirect(
            &globals.root,
            "Member login is not available on this site",
            &next,
        ));
    }

    let credentials = form.credentials();
    let roster = state.load_roster().await?;

    match roster.find_member(&credentials) {
        Some(boat) => {
            let session_id = state.sessions.create_session(&boat.hull);
            info!(hull = %boat.hull, "member logged in");

            let cookie = Cookie::build((SESSION_COOKIE, session_id))
                .path("/")
                .http_only(true);
            Ok((
                jar.add(cookie),
                Redirect::to(&format!("{}{}", globals.root, next)),
            )
                .into_response())
        }
        None => {
            warn!(hull = %credentials.hull.trim(), "member login rejected");
            Ok(login_redirect(
                &globals.root,
                "Those details do not match the roster",
                &next,
            ))
        }
    }
}

/// Handle member logout
///
/// Ends the server-side session, clears the cookie and returns to the start
/// page.
pub async fn handle_logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    globals: PageGlobals,
) -> (CookieJar, Redirect) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.end_session(cookie.value());
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to(&format!("{}/", globals.root)))
}

/// Member-only middleware
///
/// Passes the request through when it carries a live session, otherwise
/// redirects to the login page with the requested path as `next`.
pub async fn require_member(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    if let Some(session_cookie) = jar.get(SESSION_COOKIE) {
        if let Some(hull) = state.sessions.validate_session(session_cookie.value()) {
            debug!(hull = %hull, path = %request.uri().path(), "member request");
            return next.run(request).await;
        }
    }

    let url = RequestUrl::from_parts(request.headers(), request.uri(), state.config.behind_proxy);
    Redirect::to(&format!(
        "{}/login?next={}",
        url.prefix,
        urlencoding::encode(request.uri().path())
    ))
    .into_response()
}
