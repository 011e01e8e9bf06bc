use axum::{
    extract::Extension, http::StatusCode, response::IntoResponse, response::Response, Json,
};
use serde::Deserialize;
use tracing::{error, instrument};
use utoipa::ToSchema;

use crate::konto::handlers::SharedAccountService;

#[derive(ToSchema, Deserialize, Debug)]
pub struct ActivateRequest {
    pincode: String,
}

#[utoipa::path(
    post,
    path= "/user/activate",
    request_body = ActivateRequest,
    responses (
        (status = 200, description = "Account activated", body = String),
        (status = 400, description = "No pending account matches the PIN", body = String),
    ),
    tag= "activate"
)]
#[instrument(skip(service, payload))]
pub async fn activate(
    service: Extension<SharedAccountService>,
    payload: Option<Json<ActivateRequest>>,
) -> Response {
    let request: ActivateRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match service.activate(&request.pincode).await {
        Ok(true) => (StatusCode::OK, "Account activated".to_string()).into_response(),
        Ok(false) => (StatusCode::BAD_REQUEST, "Invalid PIN".to_string()).into_response(),
        Err(err) => {
            error!("activation failed: {err:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Activation failed".to_string(),
            )
                .into_response()
        }
    }
}
