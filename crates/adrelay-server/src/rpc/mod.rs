//! JSON-RPC 2.0 tool-call surface for AI-agent clients.
//!
//! Methods: `initialize`, `notifications/initialized`, `tools/list`,
//! `tools/call`, `ping`. Session correlation rides the `mcp-session-id`
//! header, generated when absent and echoed on every response.

pub mod session;
pub mod tools;

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::AppState;

/// Header carrying the protocol session id.
pub const SESSION_HEADER: &str = "mcp-session-id";

pub const CODE_METHOD_NOT_FOUND: i32 = -32601;
pub const CODE_INVALID_PARAMS: i32 = -32602;
pub const CODE_INTERNAL_ERROR: i32 = -32603;

#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    #[allow(dead_code)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

#[derive(Debug, Serialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcResponse {
    fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn err(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl RpcError {
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: CODE_METHOD_NOT_FOUND,
            message: format!("method not found: {method}"),
            data: None,
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: CODE_INVALID_PARAMS,
            message: message.into(),
            data: None,
        }
    }

    pub fn internal(message: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            code: CODE_INTERNAL_ERROR,
            message: message.into(),
            data: Some(Value::String(data.into())),
        }
    }
}

/// POST handler for the RPC endpoint.
///
/// The session id is taken from the request header or freshly generated,
/// and always echoed back so clients can correlate follow-up calls.
pub async fn handle_rpc(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RpcRequest>,
) -> Response {
    let session_id = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    let response = dispatch(&state, &session_id, request).await;

    let mut res = Json(response).into_response();
    if let Ok(val) = HeaderValue::from_str(&session_id) {
        res.headers_mut().insert(SESSION_HEADER, val);
    }
    res
}

async fn dispatch(state: &AppState, session_id: &str, request: RpcRequest) -> RpcResponse {
    let id = request.id;
    match request.method.as_str() {
        "initialize" => {
            state.sessions.mark_initialized(session_id);
            RpcResponse::ok(
                id,
                json!({
                    "protocolVersion": "2025-03-26",
                    "serverInfo": {
                        "name": "adrelay",
                        "version": env!("CARGO_PKG_VERSION"),
                    },
                    "capabilities": { "tools": {} },
                }),
            )
        }
        "notifications/initialized" => {
            state.sessions.mark_initialized(session_id);
            RpcResponse::ok(id, Value::Null)
        }
        "ping" => RpcResponse::ok(id, json!({})),
        "tools/list" => RpcResponse::ok(id, tools::tool_descriptors()),
        "tools/call" => {
            state.sessions.ensure(session_id);
            match tools::handle_tools_call(state, &request.params).await {
                Ok(result) => RpcResponse::ok(id, result),
                Err(error) => RpcResponse::err(id, error),
            }
        }
        other => RpcResponse::err(id, RpcError::method_not_found(other)),
    }
}
