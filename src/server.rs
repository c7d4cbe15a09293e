//! Axum HTTP surface.
//!
//! Builds the router for the brightness API. Handlers never block the async
//! runtime: brightness reads and stepped writes run on the blocking pool.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use brightsync::{server, BrightnessController, Config, MemoryBackend};
//!
//! let controller = Arc::new(BrightnessController::new(
//!     Box::new(MemoryBackend::new(50)) as _,
//!     Config::default(),
//! ));
//! let app = server::router(controller);
//! ```

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;

use crate::auth::TOKEN_ENV_VAR;
use crate::request::{
    AutoResponse, BrightnessRequest, CurrentBrightnessResponse, ErrorResponse, HealthResponse,
    SetBrightnessResponse,
};
use crate::{BrightnessController, Config, Error, TokenAuth};

/// Shared controller handed to every handler.
pub type SharedController = Arc<BrightnessController>;

/// Error type returned by handlers.
#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            Error::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            other => {
                tracing::error!("Error processing request: {}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

/// Build the brightness API router.
pub fn router(controller: SharedController) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/brightness", get(get_brightness).post(set_brightness))
        .route("/auto", post(auto_brightness))
        .route("/config", get(get_config))
        .layer(middleware::from_fn(require_token))
        .with_state(controller)
}

/// Reject requests without the configured token.
///
/// A no-op unless `BRIGHTSYNC_TOKEN` is set. This is an opt-in addition for
/// untrusted networks: the Shortcuts payloads never carry a token, so an
/// automation talking to a protected server must add `?token=` to its URL.
async fn require_token(auth: TokenAuth, request: Request, next: Next) -> Response {
    match auth.validate_env(TOKEN_ENV_VAR) {
        Ok(()) => next.run(request).await,
        Err(e) => {
            tracing::warn!("Rejected {} {}: {}", request.method(), request.uri().path(), e);
            (StatusCode::UNAUTHORIZED, Json(ErrorResponse::new(e.message))).into_response()
        }
    }
}

/// Run a controller call on the blocking pool.
async fn blocking<T, F>(controller: &SharedController, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&BrightnessController) -> Result<T, Error> + Send + 'static,
{
    let controller = Arc::clone(controller);
    tokio::task::spawn_blocking(move || f(controller.as_ref()))
        .await
        .map_err(|e| ApiError(Error::Backend(format!("Brightness task failed: {}", e))))?
        .map_err(ApiError)
}

/// GET /health
async fn health(
    State(controller): State<SharedController>,
) -> Result<Json<HealthResponse>, ApiError> {
    let current = blocking(&controller, |c| Ok(c.current_brightness())).await?;
    Ok(Json(HealthResponse::ok(current)))
}

/// GET /brightness
///
/// An unreadable display reports 50% rather than failing.
async fn get_brightness(
    State(controller): State<SharedController>,
) -> Result<Json<CurrentBrightnessResponse>, ApiError> {
    let current = blocking(&controller, |c| Ok(c.current_brightness())).await?;
    Ok(Json(CurrentBrightnessResponse::new(current)))
}

/// POST /brightness
///
/// The body is parsed by hand: Shortcuts does not always send a JSON
/// content type, and an empty body gets the same error payload as `{}`.
async fn set_brightness(
    State(controller): State<SharedController>,
    body: Bytes,
) -> Result<Json<SetBrightnessResponse>, ApiError> {
    let body: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| Error::InvalidRequest(format!("Malformed JSON body: {}", e)))?
    };
    tracing::info!("Received data: {}", body);

    let request = BrightnessRequest::from_json(body)?;

    let (applied, previous) = blocking(&controller, move |c| {
        let target = c.resolve(&request.command);
        let previous = c.current_brightness();
        let applied = c.set_brightness(target, request.smooth)?;
        Ok((applied, previous))
    })
    .await?;

    Ok(Json(SetBrightnessResponse::new(applied, previous)))
}

/// POST /auto
async fn auto_brightness(
    State(controller): State<SharedController>,
) -> Result<Json<AutoResponse>, ApiError> {
    let applied = blocking(&controller, |c| c.apply_time_based()).await?;
    Ok(Json(AutoResponse::new(applied)))
}

/// GET /config
async fn get_config(State(controller): State<SharedController>) -> Json<Config> {
    Json(controller.config().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BrightnessBackend, MemoryBackend};

    #[test]
    fn test_api_error_status() {
        let response = ApiError(Error::InvalidRequest("bad".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError(Error::Backend("gone".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_blocking_propagates_errors() {
        let controller: SharedController = Arc::new(BrightnessController::new(
            Box::new(MemoryBackend::new(50).failing_writes()) as Box<dyn BrightnessBackend>,
            Config::default(),
        ));
        let result = blocking(&controller, |c| c.set_brightness(70, false)).await;
        assert!(result.is_err());
    }
}
