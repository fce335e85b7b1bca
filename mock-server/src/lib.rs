//! Fake Check_MK site answering `webapi.py` from memory.
//!
//! Requests carry `_username`, `_secret` and `action` in the query string and
//! an optional `request=` form field. Answers are always HTTP 200 with either
//! the authentication error text or a `result`/`result_code` envelope.

mod store;

use std::sync::Arc;

use axum::{
    extract::{RawQuery, State},
    routing::get,
    Router,
};
use cmk_core::{Format, Params};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use url::form_urlencoded;

pub use store::Store;

pub const DEFAULT_USERNAME: &str = "automation";
pub const DEFAULT_SECRET: &str = "secret";

#[derive(Clone)]
struct AppState {
    store: Arc<RwLock<Store>>,
    username: Arc<str>,
    secret: Arc<str>,
}

pub fn app() -> Router {
    app_with_credentials(DEFAULT_USERNAME, DEFAULT_SECRET)
}

pub fn app_with_credentials(username: &str, secret: &str) -> Router {
    let state = AppState {
        store: Arc::new(RwLock::new(Store::default())),
        username: username.into(),
        secret: secret.into(),
    };
    Router::new()
        .route("/check_mk/webapi.py", get(webapi).post(webapi))
        .route("/{site}/check_mk/webapi.py", get(webapi).post(webapi))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn form_fields(encoded: &str) -> Params {
    form_urlencoded::parse(encoded.as_bytes())
        .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
        .collect()
}

fn selected_format(query: &Params, key: &str) -> Result<Format, String> {
    match query.get(key).and_then(Value::as_str) {
        Some(name) => name.parse(),
        None => Ok(Format::Json),
    }
}

fn decode_request(query: &Params, body: &str) -> Result<Params, String> {
    let format = selected_format(query, "request_format")?;
    let Some(Value::String(payload)) = form_fields(body).remove("request") else {
        return Ok(Params::new());
    };
    match format.codec().decode(&payload)? {
        Value::Object(request) => Ok(request),
        _ => Err("The request must be a dictionary".to_string()),
    }
}

async fn webapi(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    body: String,
) -> String {
    let query = form_fields(query.as_deref().unwrap_or_default());
    let username = query.get("_username").and_then(Value::as_str).unwrap_or_default();
    let secret = query.get("_secret").and_then(Value::as_str);
    if username != &*state.username || secret != Some(&*state.secret) {
        return format!("Authentication error: Invalid automation secret for user {username}");
    }

    let (output_format, result) = match selected_format(&query, "output_format") {
        Ok(format) => {
            let action = query.get("action").and_then(Value::as_str).unwrap_or_default();
            let result = match decode_request(&query, &body) {
                Ok(request) => state.store.write().await.dispatch(action, &query, &request),
                Err(message) => Err(message),
            };
            (format, result)
        }
        Err(message) => (Format::Json, Err(message)),
    };

    let envelope = match result {
        Ok(result) => json!({ "result": result, "result_code": 0 }),
        Err(message) => json!({ "result": message, "result_code": 1 }),
    };
    output_format
        .codec()
        .encode(&envelope)
        .unwrap_or_else(|message| format!("Internal error: {message}"))
}
