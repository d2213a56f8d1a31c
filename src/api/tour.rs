//! Tour status API endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};

use super::{success, ApiResult};
use crate::auth::{AdminPrincipal, ServiceRole};
use crate::errors::AppError;
use crate::models::{
    TourAction, TourPhase, TourStatus, TourStatusRequest, TourTransitionResponse,
};
use crate::AppState;

/// GET /api/tour-status - Current lifecycle record.
pub async fn get_tour_status(State(state): State<AppState>) -> ApiResult<TourStatus> {
    let status = state.tour.current_status().await?;
    success(status)
}

/// PUT /api/tour-status - Close or open a tour, or write the raw status.
pub async fn update_tour_status(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    payload: Result<Json<TourStatusRequest>, JsonRejection>,
) -> ApiResult<TourTransitionResponse> {
    let Json(request) = payload?;
    let (phase, action) = validate_request(&request)?;

    let role = ServiceRole::acquire(&principal);
    tracing::info!(
        invocation_id = %role.invocation_id(),
        admin = principal.label(),
        phase = phase.as_str(),
        action = ?action,
        "tour status update requested"
    );

    let response = match action {
        Some(TourAction::Close) => {
            let (status, summary) = state.tour.close(&role).await?;
            TourTransitionResponse::from_close(status, summary)
        }
        Some(TourAction::Open) => {
            let (status, summary) = state.tour.open(&role).await?;
            TourTransitionResponse::from_open(status, summary)
        }
        None => TourTransitionResponse::from_raw(state.tour.set_status(&role, phase).await?),
    };

    success(response)
}

fn validate_request(
    request: &TourStatusRequest,
) -> Result<(TourPhase, Option<TourAction>), AppError> {
    let phase = TourPhase::parse(&request.current_tour_status).ok_or_else(|| {
        AppError::Validation(format!(
            "current_tour_status must be `new` or `older`, got {:?}",
            request.current_tour_status
        ))
    })?;

    let action = match request.action.as_deref() {
        None => None,
        Some(raw) => Some(TourAction::parse(raw).ok_or_else(|| {
            AppError::Validation(format!("action must be `close` or `open`, got {:?}", raw))
        })?),
    };

    if let Some(action) = action {
        if action.target_phase() != phase {
            return Err(AppError::Validation(format!(
                "action {:?} leaves the tour `{}`, but current_tour_status is `{}`",
                action,
                action.target_phase().as_str(),
                phase.as_str()
            )));
        }
    }

    Ok((phase, action))
}
