use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::warn;

use thermaguard_common::{
    StatusPayload, StatusPresenter, TargetsRequest, ValidationError, ZoneId,
};

use crate::controller::ThermostatController;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
    #[serde(rename = "zoneId", skip_serializing_if = "Option::is_none")]
    zone_id: Option<ZoneId>,
}

/// Transport-independent status and target operations for remote callers.
#[derive(Clone)]
pub struct ControlApi {
    controller: Arc<ThermostatController>,
    presenter: StatusPresenter,
}

impl ControlApi {
    pub fn new(controller: Arc<ThermostatController>) -> Self {
        let presenter = StatusPresenter::new(controller.bounds());
        Self {
            controller,
            presenter,
        }
    }

    pub async fn get_status(&self) -> StatusPayload {
        let snapshot = self.controller.snapshot().await;
        self.presenter.payload(&snapshot)
    }

    pub async fn status_page(&self) -> String {
        let snapshot = self.controller.snapshot().await;
        self.presenter.html(&snapshot, Utc::now())
    }

    /// Returns the accepted request unchanged on success.
    pub async fn set_targets(
        &self,
        request: TargetsRequest,
    ) -> Result<TargetsRequest, ValidationError> {
        self.controller.set_targets(&request.targets).await?;
        Ok(request)
    }
}

pub fn router(controller: Arc<ThermostatController>) -> Router {
    Router::new()
        .route("/", get(handle_get_index))
        .route("/status", get(handle_get_status))
        .route("/targets", post(handle_post_targets))
        .layer(TraceLayer::new_for_http())
        .with_state(ControlApi::new(controller))
}

async fn handle_get_index(State(api): State<ControlApi>) -> impl IntoResponse {
    Html(api.status_page().await)
}

async fn handle_get_status(State(api): State<ControlApi>) -> impl IntoResponse {
    Json(api.get_status().await)
}

async fn handle_post_targets(
    State(api): State<ControlApi>,
    payload: Result<Json<TargetsRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return validation_error(ValidationError::Malformed(rejection.body_text()));
        }
    };

    match api.set_targets(request).await {
        Ok(accepted) => Json(accepted).into_response(),
        Err(err) => validation_error(err),
    }
}

fn validation_error(err: ValidationError) -> Response {
    warn!("rejected target update: {err}");
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: err.to_string(),
            kind: err.kind(),
            zone_id: err.zone_id(),
        }),
    )
        .into_response()
}
