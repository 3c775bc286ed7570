//! Capability manifest served to the agent: OpenAPI document and tool descriptors.

use crate::config::Config;
use crate::http_server::AppState;
use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

pub const TOOL_NAME: &str = "trello";
pub const TOOL_DESCRIPTION: &str = "Interact with Trello boards, cards and lists";

const OPENAPI_TEMPLATE: &str = include_str!("openapi.yaml");
const SERVER_URL_PLACEHOLDER: &str = "{{SERVER_URL}}";

/// Pointer to the machine-readable schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenApiPointer {
    pub url: String,
}

/// Tool metadata returned by /tools/list and /tools/trello
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub openapi: OpenApiPointer,
}

impl ToolDescriptor {
    pub fn for_origin(origin: &str) -> Self {
        Self {
            name: TOOL_NAME.to_string(),
            description: TOOL_DESCRIPTION.to_string(),
            openapi: OpenApiPointer {
                url: format!("{}/openapi.yaml", origin),
            },
        }
    }
}

/// `scheme://host` the request was addressed to.
///
/// Host comes from `X-Forwarded-Host` or `Host`; scheme from `X-Forwarded-Proto`
/// or the configured base URL. Falls back to the base URL when no usable host
/// header is present.
pub fn request_origin(headers: &HeaderMap, config: &Config) -> String {
    let host = first_header_value(headers, "x-forwarded-host")
        .or_else(|| first_header_value(headers, header::HOST.as_str()))
        .filter(|h| is_plausible_host(h));

    let Some(host) = host else {
        return config.base_url.clone();
    };

    let scheme = first_header_value(headers, "x-forwarded-proto")
        .filter(|p| p == "http" || p == "https")
        .unwrap_or_else(|| config.base_scheme().to_string());

    format!("{}://{}", scheme, host)
}

fn first_header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let value = headers.get(name)?.to_str().ok()?;
    let first = value.split(',').next()?.trim();
    if first.is_empty() {
        None
    } else {
        Some(first.to_ascii_lowercase())
    }
}

fn is_plausible_host(host: &str) -> bool {
    host.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':' | '[' | ']'))
}

/// Handle GET /openapi.yaml
pub async fn openapi_document(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let origin = request_origin(&headers, &state.config);
    let document = OPENAPI_TEMPLATE.replace(SERVER_URL_PLACEHOLDER, &origin);

    ([(header::CONTENT_TYPE, "text/yaml; charset=utf-8")], document)
}

/// Handle GET /tools/list
pub async fn tools_list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<Vec<ToolDescriptor>> {
    let origin = request_origin(&headers, &state.config);
    Json(vec![ToolDescriptor::for_origin(&origin)])
}

/// Handle GET /tools/trello
pub async fn tool_trello(State(state): State<AppState>, headers: HeaderMap) -> Json<ToolDescriptor> {
    let origin = request_origin(&headers, &state.config);
    Json(ToolDescriptor::for_origin(&origin))
}
