//! HTTP webpage loader.
//!
//! Fetches a URL and reduces the body to readable text. Extraction is a
//! simple tag stripper, not a full HTML parser.

use async_trait::async_trait;
use llmdesk_config::LoaderConfig;
use llmdesk_core::enrich::ContentLoader;
use llmdesk_core::error::EnrichmentError;
use std::time::Duration;
use tracing::debug;

pub struct HttpPageLoader {
    client: reqwest::Client,
    config: LoaderConfig,
}

impl HttpPageLoader {
    pub fn new(config: LoaderConfig) -> Result<Self, EnrichmentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| EnrichmentError::InvalidInput(format!("HTTP client: {e}")))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl ContentLoader for HttpPageLoader {
    async fn load(&self, url: &str) -> Result<String, EnrichmentError> {
        let fetch_err = |reason: String| EnrichmentError::Fetch {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .header("Accept", "text/html, text/plain;q=0.9, */*;q=0.5")
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_err(format!("HTTP {}", status.as_u16())));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_ascii_lowercase();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| fetch_err(format!("failed to read body: {e}")))?;

        let body = if bytes.len() > self.config.max_bytes {
            debug!(url, size = bytes.len(), max = self.config.max_bytes, "Truncating page body");
            &bytes[..self.config.max_bytes]
        } else {
            &bytes[..]
        };

        let text = if content_type.contains("html") {
            html_to_text(&String::from_utf8_lossy(body))
        } else if content_type.starts_with("text/") || content_type.contains("json") {
            String::from_utf8_lossy(body).trim().to_string()
        } else {
            return Err(EnrichmentError::Parse {
                url: url.to_string(),
                reason: format!("unsupported content type '{content_type}'"),
            });
        };

        debug!(url, chars = text.chars().count(), "Loaded page");
        Ok(text)
    }
}

/// Convert HTML to plain text.
///
/// Drops `<script>`, `<style>`, `<noscript>` and `<head>` content, turns
/// block-level closers into line breaks, strips remaining tags, decodes the
/// common entities and collapses runs of whitespace.
pub fn html_to_text(html: &str) -> String {
    let mut html = html.to_string();
    for tag in ["script", "style", "noscript", "head"] {
        html = remove_element(&html, tag);
    }

    let mut text = String::with_capacity(html.len());
    let mut rest = html.as_str();
    while let Some(open) = rest.find('<') {
        text.push_str(&rest[..open]);
        let Some(close) = rest[open..].find('>') else {
            rest = "";
            break;
        };
        let tag = rest[open + 1..open + close].trim().to_ascii_lowercase();
        if is_block_break(&tag) {
            text.push('\n');
        } else {
            text.push(' ');
        }
        rest = &rest[open + close + 1..];
    }
    text.push_str(rest);

    let decoded = decode_entities(&text);
    let mut lines: Vec<String> = Vec::new();
    for line in decoded.lines() {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            if lines.last().is_some_and(|l| !l.is_empty()) {
                lines.push(String::new());
            }
        } else {
            lines.push(collapsed);
        }
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

fn is_block_break(tag: &str) -> bool {
    let name = tag
        .trim_start_matches('/')
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or("");
    matches!(
        name,
        "br" | "p" | "div" | "li" | "tr" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
            | "section" | "article" | "header" | "footer" | "blockquote" | "pre" | "table"
    )
}

/// Remove every `<tag ...>...</tag>` element, matching the tag name
/// case-insensitively.
fn remove_element(html: &str, tag: &str) -> String {
    let lower = html.to_ascii_lowercase();
    let open = format!("<{tag}");
    let close = format!("</{tag}>");

    let mut result = String::with_capacity(html.len());
    let mut pos = 0;
    while let Some(idx) = lower[pos..].find(&open) {
        let start = pos + idx;
        // `<header` must not match `<head`
        let at_boundary = lower[start + open.len()..]
            .chars()
            .next()
            .is_none_or(|c| c == '>' || c == '/' || c.is_whitespace());
        if !at_boundary {
            result.push_str(&html[pos..start + open.len()]);
            pos = start + open.len();
            continue;
        }
        result.push_str(&html[pos..start]);
        result.push(' ');
        pos = match lower[start..].find(&close) {
            Some(end) => start + end + close.len(),
            None => html.len(),
        };
    }
    result.push_str(&html[pos..]);
    result
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
