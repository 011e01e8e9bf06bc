use axum::{
    extract::Extension, http::StatusCode, response::IntoResponse, response::Response, Json,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, error, instrument};
use utoipa::ToSchema;

use crate::account::{AuthError, UserProfile};
use crate::konto::handlers::SharedAccountService;

#[derive(ToSchema, Deserialize, Debug)]
pub struct LoginRequest {
    username: String,
    #[schema(value_type = String)]
    password: SecretString,
}

#[utoipa::path(
    post,
    path= "/user/login",
    request_body = LoginRequest,
    responses (
        (status = 200, description = "Login successful", body = UserProfile, content_type = "application/json"),
        (status = 401, description = "Unauthorized", body = String),
        (status = 403, description = "Account pending activation", body = String),
    ),
    tag= "login"
)]
#[instrument(skip(service, payload))]
pub async fn login(
    service: Extension<SharedAccountService>,
    payload: Option<Json<LoginRequest>>,
) -> Response {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match service
        .authenticate(&request.username, request.password.expose_secret())
        .await
    {
        Ok(user) => {
            debug!(user_id = %user.id, "login successful");
            (StatusCode::OK, Json(UserProfile::from(&user))).into_response()
        }
        Err(AuthError::Validation) => (
            StatusCode::BAD_REQUEST,
            "Please enter your username and password".to_string(),
        )
            .into_response(),
        // Unknown user and wrong password are indistinguishable externally
        // to avoid username enumeration.
        Err(AuthError::UnknownUser | AuthError::BadPassword) => {
            (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()).into_response()
        }
        Err(AuthError::NotActivated) => (
            StatusCode::FORBIDDEN,
            "Account is not activated".to_string(),
        )
            .into_response(),
        Err(err) => {
            error!("login failed: {err:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication failed".to_string(),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_request_redacts_the_password_in_debug() {
        let request: LoginRequest = serde_json::from_value(serde_json::json!({
            "username": "alice",
            "password": "hunter2",
        }))
        .unwrap();

        let rendered = format!("{request:?}");
        assert!(!rendered.contains("hunter2"));
        assert_eq!(request.password.expose_secret(), "hunter2");
    }
}
