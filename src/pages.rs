//! Page rendering: the embedded Handlebars templates and the globals every
//! page gets (site URLs, roster datestamp, member flag).

use std::convert::Infallible;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, Uri, header};
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Utc};
use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext, html_escape,
};
use pulldown_cmark::{CowStr, Event, Parser, Tag, html};
use serde::Serialize;
use serde_json::{Value, json};

use crate::app::AppState;
use crate::config::{AccessMode, DEFAULT_CONTACT_EMAIL};
use crate::error::Result;
use crate::login::SESSION_COOKIE;

pub const START: &str = "start";
pub const LIST: &str = "list";
pub const DETAIL: &str = "detail";
pub const LOGIN: &str = "login";
pub const ERROR: &str = "error";

/// The compiled page templates.
pub struct Pages {
    registry: Handlebars<'static>,
}

impl Pages {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.register_helper("contact_asoa", Box::new(contact_asoa));
        registry.register_helper("markdown", Box::new(markdown));

        registry
            .register_partial("header", include_str!("../templates/header.hbs"))
            .map_err(Box::new)?;
        registry
            .register_partial("footer", include_str!("../templates/footer.hbs"))
            .map_err(Box::new)?;

        for (name, source) in [
            (START, include_str!("../templates/start.hbs")),
            (LIST, include_str!("../templates/list.hbs")),
            (DETAIL, include_str!("../templates/detail.hbs")),
            (LOGIN, include_str!("../templates/login.hbs")),
            (ERROR, include_str!("../templates/error.hbs")),
        ] {
            registry
                .register_template_string(name, source)
                .map_err(Box::new)?;
        }

        Ok(Self { registry })
    }

    /// Render `name` with the page globals plus page-specific data. Keys in
    /// `page` win over globals of the same name.
    pub fn render(&self, name: &str, globals: &PageGlobals, page: Value) -> Result<String> {
        let mut data = json!(globals);
        if let (Value::Object(data), Value::Object(page)) = (&mut data, page) {
            data.extend(page);
        }
        Ok(self.registry.render(name, &data)?)
    }
}

/// `{{{contact_asoa}}}` or `{{{contact_asoa "title"}}}`: a mailto link to
/// the association address.
fn contact_asoa(
    h: &Helper,
    _: &Handlebars,
    ctx: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let email = ctx
        .data()
        .get("asoa_email")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_CONTACT_EMAIL);
    let title = h
        .param(0)
        .and_then(|p| p.value().as_str())
        .filter(|t| !t.is_empty())
        .unwrap_or(email);

    out.write(&format!(
        "<a href=\"mailto:{}\">{}</a>",
        html_escape(email),
        html_escape(title)
    ))?;
    Ok(())
}

/// `{{{markdown text}}}`: render roster prose as Markdown. Raw HTML in the
/// source is shown as text and links other than web and mail links are
/// dropped to `#`.
fn markdown(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let text = h.param(0).and_then(|p| p.value().as_str()).unwrap_or("");
    out.write(&markdown_to_html(text))?;
    Ok(())
}

pub fn markdown_to_html(text: &str) -> String {
    let events = Parser::new(text).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) if web_link(&dest_url).is_none() && !dest_url.starts_with("mailto:") => {
            Event::Start(Tag::Link {
                link_type,
                dest_url: CowStr::Borrowed("#"),
                title,
                id,
            })
        }
        other => other,
    });

    let mut html_out = String::new();
    html::push_html(&mut html_out, events);
    html_out
}

/// `url` when it is an http or https link, the only kind the pages turn
/// into live hrefs.
pub fn web_link(url: &str) -> Option<&str> {
    let url = url.trim();
    let lower = url.to_ascii_lowercase();
    (lower.starts_with("http://") || lower.starts_with("https://")).then_some(url)
}

/// Where a request was addressed, as the visitor sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestUrl {
    pub scheme: String,
    pub host: String,
    /// Path the site is mounted under behind a proxy, no trailing slash.
    pub prefix: String,
    pub path_and_query: String,
}

impl RequestUrl {
    /// Reconstruct the visitor-facing URL. With `behind_proxy`, one hop of
    /// `X-Forwarded-Proto`, `X-Forwarded-Host` and `X-Forwarded-Prefix` is
    /// trusted.
    pub fn from_parts(headers: &HeaderMap, uri: &Uri, behind_proxy: bool) -> Self {
        let forwarded = |name: &str| {
            behind_proxy
                .then(|| headers.get(name))
                .flatten()
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = forwarded("x-forwarded-host")
            .or_else(|| {
                headers
                    .get(header::HOST)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            })
            .or_else(|| uri.authority().map(|a| a.to_string()))
            .unwrap_or_else(|| "localhost".to_string());
        let scheme = forwarded("x-forwarded-proto")
            .or_else(|| uri.scheme_str().map(str::to_string))
            .unwrap_or_else(|| "http".to_string());
        let prefix = forwarded("x-forwarded-prefix")
            .map(|p| p.trim_end_matches('/').to_string())
            .unwrap_or_default();
        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        Self {
            scheme,
            host,
            prefix,
            path_and_query,
        }
    }

    /// The page URL without its scheme.
    pub fn public_url(&self) -> String {
        format!("{}{}{}", self.host, self.prefix, self.path_and_query)
    }

    /// The same page on the members site. The public site lives at
    /// `asoadb.<domain>` and the member site at `members.<domain>`; on any
    /// other host the two are the same.
    pub fn private_url(&self) -> String {
        let public = self.public_url();
        match public.split_once('.') {
            Some(("asoadb", rest)) => format!("members.{}", rest),
            _ => public,
        }
    }
}

/// Values every template can use.
#[derive(Debug, Clone, Serialize)]
pub struct PageGlobals {
    pub access_mode: AccessMode,
    pub asoa_email: String,
    pub scheme: String,
    pub public_url: String,
    pub private_url: String,
    pub db_datestamp: String,
    pub db_update_form: String,
    /// A member session is active.
    pub member: bool,
    pub root: String,
}

pub fn format_datestamp(modified: &DateTime<Utc>) -> String {
    modified.format("%m/%d/%Y %I:%M%p UTC").to_string()
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for PageGlobals {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> std::result::Result<Self, Self::Rejection> {
        let config = &state.config;
        let url = RequestUrl::from_parts(&parts.headers, &parts.uri, config.behind_proxy);

        let jar = CookieJar::from_headers(&parts.headers);
        let member = config.access_mode == AccessMode::Members
            && jar
                .get(SESSION_COOKIE)
                .and_then(|cookie| state.sessions.validate_session(cookie.value()))
                .is_some();

        let db_datestamp = match tokio::fs::metadata(&config.db_path)
            .await
            .and_then(|meta| meta.modified())
        {
            Ok(modified) => format_datestamp(&DateTime::<Utc>::from(modified)),
            Err(_) => String::new(),
        };

        Ok(PageGlobals {
            access_mode: config.access_mode,
            asoa_email: config.contact_email.clone(),
            scheme: url.scheme.clone(),
            public_url: url.public_url(),
            private_url: url.private_url(),
            db_datestamp,
            db_update_form: config.update_form_url.clone(),
            member,
            root: url.prefix,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::TimeZone;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(*v));
        }
        map
    }

    fn globals() -> PageGlobals {
        PageGlobals {
            access_mode: AccessMode::Public,
            asoa_email: "crew@example.org".into(),
            scheme: "http".into(),
            public_url: "localhost/".into(),
            private_url: "localhost/".into(),
            db_datestamp: String::new(),
            db_update_form: String::new(),
            member: false,
            root: String::new(),
        }
    }

    #[test]
    fn test_private_url_swaps_asoadb_label() {
        let uri: Uri = "/detail/12?x=1".parse().unwrap();
        let url = RequestUrl::from_parts(&headers(&[("host", "asoadb.example.org")]), &uri, false);
        assert_eq!(url.public_url(), "asoadb.example.org/detail/12?x=1");
        assert_eq!(url.private_url(), "members.example.org/detail/12?x=1");
    }

    #[test]
    fn test_private_url_other_host() {
        let uri: Uri = "/list".parse().unwrap();
        let url = RequestUrl::from_parts(&headers(&[("host", "roster.local:3000")]), &uri, false);
        assert_eq!(url.private_url(), "roster.local:3000/list");
    }

    #[test]
    fn test_forwarded_headers_only_behind_proxy() {
        let uri: Uri = "/list".parse().unwrap();
        let map = headers(&[
            ("host", "127.0.0.1:3000"),
            ("x-forwarded-host", "asoadb.example.org"),
            ("x-forwarded-proto", "https"),
            ("x-forwarded-prefix", "/roster/"),
        ]);

        let direct = RequestUrl::from_parts(&map, &uri, false);
        assert_eq!(direct.public_url(), "127.0.0.1:3000/list");
        assert_eq!(direct.scheme, "http");

        let proxied = RequestUrl::from_parts(&map, &uri, true);
        assert_eq!(proxied.public_url(), "asoadb.example.org/roster/list");
        assert_eq!(proxied.scheme, "https");
        assert_eq!(proxied.prefix, "/roster");
    }

    #[test]
    fn test_datestamp_format() {
        let modified = Utc.with_ymd_and_hms(2023, 11, 4, 15, 7, 0).unwrap();
        assert_eq!(format_datestamp(&modified), "11/04/2023 03:07PM UTC");
    }

    #[test]
    fn test_contact_helper() {
        let pages = Pages::new().unwrap();
        let html = pages
            .render(ERROR, &globals(), json!({ "message": "Gone" }))
            .unwrap();
        assert!(html.contains("mailto:crew@example.org"));
        assert!(html.contains("Gone"));
    }

    #[test]
    fn test_page_data_is_escaped() {
        let pages = Pages::new().unwrap();
        let html = pages
            .render(ERROR, &globals(), json!({ "message": "<script>" }))
            .unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_markdown_renders_emphasis() {
        let html = markdown_to_html("Hauled out for **new bottom paint**.");
        assert!(html.contains("<strong>new bottom paint</strong>"));
        assert!(html.starts_with("<p>"));
    }

    #[test]
    fn test_markdown_escapes_raw_html() {
        let html = markdown_to_html("Sold <script>alert(1)</script> in *May*");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("<em>May</em>"));
    }

    #[test]
    fn test_markdown_drops_script_links() {
        let html = markdown_to_html("[photos](javascript:alert(1)) and [club](https://example.org)");
        assert!(!html.contains("javascript:"));
        assert!(html.contains("href=\"#\""));
        assert!(html.contains("href=\"https://example.org\""));
    }

    #[test]
    fn test_web_link() {
        assert_eq!(web_link(" https://boats.example.org/12 "), Some("https://boats.example.org/12"));
        assert_eq!(web_link("HTTP://example.org"), Some("HTTP://example.org"));
        assert_eq!(web_link("javascript:alert(1)"), None);
        assert_eq!(web_link(""), None);
    }

    #[test]
    fn test_detail_renders_markdown_and_guards_sale_link() {
        let pages = Pages::new().unwrap();
        let html = pages
            .render(
                DETAIL,
                &globals(),
                json!({
                    "boat": {
                        "hull": "12",
                        "status": "GOOD",
                        "latest_info": "Repowered with a **Beta 14**",
                        "epitaph": "Lost in _Sandy_",
                    },
                    "sale_link": null,
                }),
            )
            .unwrap();
        assert!(html.contains("<strong>Beta 14</strong>"));
        assert!(html.contains("<em>Sandy</em>"));
        assert!(!html.contains("For sale"));
    }
}
