// src/frontchannel.rs

use crate::error::NilaLogoutError;
use base64::engine::{general_purpose::STANDARD, Engine};
use http::header::{CACHE_CONTROL, CONTENT_SECURITY_POLICY, CONTENT_TYPE, PRAGMA};
use http::{Response, StatusCode};
use sha2::{Digest, Sha256};
use url::Url;

/// Inline style that hides the notification frames.
pub const FRAME_STYLE: &str = "iframe{display:none;width:0;height:0;}";

pub const NO_CACHE: &str = "no-store, no-cache, max-age=0";

/// Renders the page that notifies relying parties through hidden iframes.
pub struct FrontChannelHtmlRenderer;

impl FrontChannelHtmlRenderer {
    /// One iframe per URL, in the given order. An empty list still yields a
    /// complete document.
    pub fn render_html(urls: &[String]) -> String {
        let mut html = String::from("<!DOCTYPE html><html><style>");
        html.push_str(FRAME_STYLE);
        html.push_str("</style><body>\n");
        for url in urls {
            html.push_str("<iframe src='");
            html.push_str(&escape_attribute(url));
            html.push_str("'></iframe>\n");
        }
        html.push_str("</body></html>");
        html
    }

    /// The distinct origins of `urls` in first-seen order. URLs without a
    /// tuple origin cannot be framed and are left out.
    pub fn frame_sources(urls: &[String]) -> Vec<String> {
        let mut origins: Vec<String> = Vec::new();
        for url in urls {
            let Ok(parsed) = Url::parse(url) else {
                tracing::warn!(url = %url, "Front-channel logout URL is not absolute; omitting it from frame-src.");
                continue;
            };
            let origin = parsed.origin();
            if !origin.is_tuple() {
                continue;
            }
            let origin = origin.ascii_serialization();
            if !origins.contains(&origin) {
                origins.push(origin);
            }
        }
        origins
    }

    /// The `Content-Security-Policy` for the rendered page: nothing but the
    /// inline style and frames to the relying parties.
    pub fn content_security_policy(urls: &[String]) -> String {
        let style_hash = STANDARD.encode(Sha256::digest(FRAME_STYLE.as_bytes()));
        let mut csp = format!("default-src 'none'; style-src 'sha256-{}'", style_hash);
        let sources = Self::frame_sources(urls);
        if !sources.is_empty() {
            csp.push_str("; frame-src ");
            csp.push_str(&sources.join(" "));
        }
        csp
    }

    /// Builds the complete 200 response with no-cache headers.
    pub fn response(urls: &[String]) -> Result<Response<String>, NilaLogoutError> {
        let response = Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, "text/html; charset=UTF-8")
            .header(CACHE_CONTROL, NO_CACHE)
            .header(PRAGMA, "no-cache")
            .header(CONTENT_SECURITY_POLICY, Self::content_security_policy(urls))
            .body(Self::render_html(urls))?;
        Ok(response)
    }
}

/// Encodes a value for a single-quoted HTML attribute.
fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '\'' => escaped.push_str("&#39;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            c => escaped.push(c),
        }
    }
    escaped
}
