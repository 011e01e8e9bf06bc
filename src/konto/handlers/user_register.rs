use axum::{
    extract::Extension, http::StatusCode, response::IntoResponse, response::Response, Json,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};
use utoipa::ToSchema;

use crate::account::{AccountError, MailDelivery, NewAccount, UserProfile};
use crate::konto::handlers::SharedAccountService;

#[derive(ToSchema, Deserialize, Debug)]
pub struct RegisterRequest {
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    #[schema(value_type = String)]
    password: SecretString,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct RegisterResponse {
    user: UserProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

#[utoipa::path(
    post,
    path= "/user/register",
    request_body = RegisterRequest,
    responses (
        (status = 201, description = "Registration successful", body = RegisterResponse, content_type = "application/json"),
        (status = 400, description = "Invalid input", body = String),
        (status = 409, description = "User with the specified username or email already exists", body = String),
    ),
    tag= "register"
)]
#[instrument(skip(service, payload))]
pub async fn register(
    service: Extension<SharedAccountService>,
    payload: Option<Json<RegisterRequest>>,
) -> Response {
    let request: RegisterRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    debug!("register request: {:?}", request);

    let account = NewAccount {
        username: request.username,
        email: request.email,
        first_name: request.first_name,
        last_name: request.last_name,
    };

    match service
        .register(account, request.password.expose_secret())
        .await
    {
        Ok(registration) => {
            let warning = match registration.mail {
                MailDelivery::Sent => None,
                MailDelivery::Failed => {
                    Some("activation mail could not be delivered".to_string())
                }
            };
            let body = RegisterResponse {
                user: registration.profile,
                warning,
            };
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Err(AccountError::Validation(message)) => {
            (StatusCode::BAD_REQUEST, message.to_string()).into_response()
        }
        Err(AccountError::DuplicateUsername) => {
            (StatusCode::CONFLICT, "Username is already taken".to_string()).into_response()
        }
        Err(AccountError::DuplicateEmail) => {
            (StatusCode::CONFLICT, "Email is already taken".to_string()).into_response()
        }
        Err(err) => {
            error!("registration failed: {err:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Registration failed".to_string(),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_redacts_the_password_in_debug() {
        let request: RegisterRequest = serde_json::from_value(serde_json::json!({
            "username": "bob",
            "email": "bob@x.com",
            "first_name": "Bob",
            "last_name": "B",
            "password": "Secret123",
        }))
        .unwrap();

        let rendered = format!("{request:?}");
        assert!(!rendered.contains("Secret123"));
        assert_eq!(request.password.expose_secret(), "Secret123");
    }

    #[test]
    fn register_response_omits_absent_warning() {
        let body = RegisterResponse {
            user: UserProfile {
                id: uuid::Uuid::new_v4(),
                username: "bob".to_string(),
                email: "bob@x.com".to_string(),
                first_name: "Bob".to_string(),
                last_name: "B".to_string(),
                activated: false,
            },
            warning: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("warning").is_none());
    }
}
