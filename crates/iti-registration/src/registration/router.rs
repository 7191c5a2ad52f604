use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::SelectOption;
use super::gateway::SubmissionGateway;
use super::handlers::InputChange;
use super::notice::Notifier;
use super::sequencer::{StepTransition, SubmitOutcome};
use super::service::{RegistrationService, RegistrationServiceError, SessionId};

/// Body of a select change; `option: null` clears the field.
#[derive(Debug, Deserialize)]
pub struct SelectChangeRequest {
    pub field: String,
    #[serde(default)]
    pub option: Option<SelectOption>,
}

/// Body of a select blur.
#[derive(Debug, Deserialize)]
pub struct SelectBlurRequest {
    pub field: String,
}

/// Router builder exposing the registration session endpoints.
pub fn registration_router<G, N>(service: Arc<RegistrationService<G, N>>) -> Router
where
    G: SubmissionGateway + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/registration/options",
            get(options_handler::<G, N>),
        )
        .route("/api/v1/registrations", post(create_handler::<G, N>))
        .route(
            "/api/v1/registrations/:session_id",
            get(session_handler::<G, N>).delete(close_handler::<G, N>),
        )
        .route(
            "/api/v1/registrations/:session_id/input",
            post(input_handler::<G, N>),
        )
        .route(
            "/api/v1/registrations/:session_id/select",
            post(select_handler::<G, N>),
        )
        .route(
            "/api/v1/registrations/:session_id/blur",
            post(blur_handler::<G, N>),
        )
        .route(
            "/api/v1/registrations/:session_id/select-blur",
            post(select_blur_handler::<G, N>),
        )
        .route(
            "/api/v1/registrations/:session_id/next",
            post(next_handler::<G, N>),
        )
        .route(
            "/api/v1/registrations/:session_id/previous",
            post(previous_handler::<G, N>),
        )
        .route(
            "/api/v1/registrations/:session_id/submit",
            post(submit_handler::<G, N>),
        )
        .with_state(service)
}

pub(crate) async fn options_handler<G, N>(
    State(service): State<Arc<RegistrationService<G, N>>>,
) -> Response
where
    G: SubmissionGateway + 'static,
    N: Notifier + 'static,
{
    (StatusCode::OK, Json(service.options())).into_response()
}

pub(crate) async fn create_handler<G, N>(
    State(service): State<Arc<RegistrationService<G, N>>>,
) -> Response
where
    G: SubmissionGateway + 'static,
    N: Notifier + 'static,
{
    let view = service.create_session();
    (StatusCode::CREATED, Json(view)).into_response()
}

pub(crate) async fn session_handler<G, N>(
    State(service): State<Arc<RegistrationService<G, N>>>,
    Path(session_id): Path<String>,
) -> Response
where
    G: SubmissionGateway + 'static,
    N: Notifier + 'static,
{
    match service.get(&SessionId(session_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn close_handler<G, N>(
    State(service): State<Arc<RegistrationService<G, N>>>,
    Path(session_id): Path<String>,
) -> Response
where
    G: SubmissionGateway + 'static,
    N: Notifier + 'static,
{
    match service.close_session(&SessionId(session_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn input_handler<G, N>(
    State(service): State<Arc<RegistrationService<G, N>>>,
    Path(session_id): Path<String>,
    Json(change): Json<InputChange>,
) -> Response
where
    G: SubmissionGateway + 'static,
    N: Notifier + 'static,
{
    match service.apply_input(&SessionId(session_id), &change) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn select_handler<G, N>(
    State(service): State<Arc<RegistrationService<G, N>>>,
    Path(session_id): Path<String>,
    Json(request): Json<SelectChangeRequest>,
) -> Response
where
    G: SubmissionGateway + 'static,
    N: Notifier + 'static,
{
    match service.apply_select(
        &SessionId(session_id),
        &request.field,
        request.option.as_ref(),
    ) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn blur_handler<G, N>(
    State(service): State<Arc<RegistrationService<G, N>>>,
    Path(session_id): Path<String>,
    Json(change): Json<InputChange>,
) -> Response
where
    G: SubmissionGateway + 'static,
    N: Notifier + 'static,
{
    match service.blur_input(&SessionId(session_id), &change) {
        Ok((outcome, view)) => {
            let payload = json!({ "blur": outcome, "session": view });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn select_blur_handler<G, N>(
    State(service): State<Arc<RegistrationService<G, N>>>,
    Path(session_id): Path<String>,
    Json(request): Json<SelectBlurRequest>,
) -> Response
where
    G: SubmissionGateway + 'static,
    N: Notifier + 'static,
{
    match service.blur_select(&SessionId(session_id), &request.field) {
        Ok((outcome, view)) => {
            let payload = json!({ "blur": outcome, "session": view });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn next_handler<G, N>(
    State(service): State<Arc<RegistrationService<G, N>>>,
    Path(session_id): Path<String>,
) -> Response
where
    G: SubmissionGateway + 'static,
    N: Notifier + 'static,
{
    match service.next(&SessionId(session_id)) {
        Ok((transition, view)) => {
            let status = match transition {
                StepTransition::Blocked { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                StepTransition::Advanced { .. } | StepTransition::Stayed { .. } => StatusCode::OK,
            };
            let payload = json!({ "step": transition, "session": view });
            (status, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn previous_handler<G, N>(
    State(service): State<Arc<RegistrationService<G, N>>>,
    Path(session_id): Path<String>,
) -> Response
where
    G: SubmissionGateway + 'static,
    N: Notifier + 'static,
{
    match service.previous(&SessionId(session_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn submit_handler<G, N>(
    State(service): State<Arc<RegistrationService<G, N>>>,
    Path(session_id): Path<String>,
) -> Response
where
    G: SubmissionGateway + 'static,
    N: Notifier + 'static,
{
    let (outcome, view) = match service.submit(&SessionId(session_id)).await {
        Ok(result) => result,
        Err(err) => return error_response(err),
    };

    let (status, payload) = match outcome {
        SubmitOutcome::Submitted(receipt) => (
            StatusCode::OK,
            json!({ "status": "submitted", "receipt": receipt, "session": view }),
        ),
        SubmitOutcome::Failed(err) => (
            StatusCode::BAD_GATEWAY,
            json!({ "status": "failed", "error": err.to_string(), "session": view }),
        ),
        SubmitOutcome::Invalid => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "status": "invalid", "session": view }),
        ),
        SubmitOutcome::NotFinalStep => (
            StatusCode::CONFLICT,
            json!({ "status": "not_final_step", "session": view }),
        ),
        SubmitOutcome::AlreadySubmitting => (
            StatusCode::CONFLICT,
            json!({ "status": "already_submitting", "session": view }),
        ),
    };

    (status, Json(payload)).into_response()
}

fn error_response(err: RegistrationServiceError) -> Response {
    let status = match err {
        RegistrationServiceError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        RegistrationServiceError::SchemaLookup(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}
