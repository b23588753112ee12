//! Play-by-play extraction from the embedded `__NEXT_DATA__` payload.
//!
//! Game pages are server-rendered Next.js documents. Everything the page
//! needs is serialized as JSON into a single `<script id="__NEXT_DATA__">`
//! element; the actions array lives at
//! `props.pageProps.playByPlay.actions`.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::Page;

/// Element id of the embedded data script.
pub const NEXT_DATA_ID: &str = "__NEXT_DATA__";

/// Key path from the payload root to the actions array.
pub const ACTIONS_PATH: &[&str] = &["props", "pageProps", "playByPlay", "actions"];

static NEXT_DATA_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(&format!("[id=\"{}\"]", NEXT_DATA_ID)).expect("static selector is valid")
});

/// Longest markup excerpt included in diagnostics.
const EXCERPT_LEN: usize = 200;

/// Failure to obtain play-by-play data from a page.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unable to retrieve script with id='__NEXT_DATA__' from {url}")]
    MissingScript { url: String },
    #[error("Embedded data in {url} is not valid JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unable to retrieve play-by-play data from {url}: missing key '{key}'")]
    MissingPath { url: String, key: String },
    #[error("Unable to retrieve play-by-play data from {url}: '{path}' is not an array")]
    NotArray { url: String, path: String },
}

/// Ordered event records for one game. Records are kept as opaque JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ActionSequence(Vec<Value>);

impl ActionSequence {
    pub fn new(actions: Vec<Value>) -> Self {
        Self(actions)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<Value> {
        self.0
    }
}

/// Extract the actions array from a fetched page.
pub fn extract_actions(page: &Page) -> Result<ActionSequence, ExtractError> {
    let script = find_next_data(&page.html).ok_or_else(|| {
        debug!(
            "No element with id='{}' in {}; document starts: {}",
            NEXT_DATA_ID,
            page.url,
            excerpt(&page.html)
        );
        ExtractError::MissingScript {
            url: page.url.clone(),
        }
    })?;

    let data: Value = serde_json::from_str(&script).map_err(|source| {
        debug!("Embedded data for {} starts: {}", page.url, excerpt(&script));
        ExtractError::Decode {
            url: page.url.clone(),
            source,
        }
    })?;

    let actions = walk_path(&data, ACTIONS_PATH).map_err(|key| {
        ExtractError::MissingPath {
            url: page.url.clone(),
            key: key.to_string(),
        }
    })?;

    match actions {
        Value::Array(items) => Ok(ActionSequence(items.clone())),
        other => {
            debug!(
                "Expected array at {} in {}, found {}",
                ACTIONS_PATH.join("."),
                page.url,
                json_kind(other)
            );
            Err(ExtractError::NotArray {
                url: page.url.clone(),
                path: ACTIONS_PATH.join("."),
            })
        }
    }
}

/// Text content of the first `__NEXT_DATA__` element, if any.
fn find_next_data(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&NEXT_DATA_SELECTOR)
        .next()
        .map(|element| element.text().collect::<String>())
}

/// Walk object keys from `data`, returning the first missing key on failure.
pub fn walk_path<'a, 'k>(data: &'a Value, path: &[&'k str]) -> Result<&'a Value, &'k str> {
    let mut current = data;
    for &key in path {
        current = match current {
            Value::Object(map) => match map.get(key) {
                Some(next) => next,
                None => {
                    debug!(
                        "Key '{}' missing; available keys: {:?}",
                        key,
                        map.keys().collect::<Vec<_>>()
                    );
                    return Err(key);
                }
            },
            other => {
                debug!("Cannot look up '{}' in {}", key, json_kind(other));
                return Err(key);
            }
        };
    }
    Ok(current)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn excerpt(text: &str) -> String {
    let mut out: String = text.chars().take(EXCERPT_LEN).collect();
    if text.chars().nth(EXCERPT_LEN).is_some() {
        out.push('…');
    }
    out
}
