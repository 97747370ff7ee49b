//! Account endpoints: registration, login, tokens, profile, password reset

use serde::Serialize;

use crate::error::ApiError;
use crate::models::{
    AuthTokens, ChangePasswordRequest, CreateUserRequest, LoginRequest, LoginResponse,
    ResetPasswordRequest, UpdateUserRequest, User,
};
use crate::network::client::ApiClient;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody<'a> {
    refresh_token: &'a str,
}

#[derive(Serialize)]
struct EmailBody<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct OtpBody<'a> {
    email: &'a str,
    otp: &'a str,
}

pub async fn create_user(client: &ApiClient, req: &CreateUserRequest) -> Result<User, ApiError> {
    client.post("/users", req).await
}

pub async fn login(client: &ApiClient, req: &LoginRequest) -> Result<LoginResponse, ApiError> {
    client.post("/users/login", req).await
}

pub async fn refresh_token(client: &ApiClient, refresh_token: &str) -> Result<AuthTokens, ApiError> {
    client
        .post("/users/refresh-token", &RefreshBody { refresh_token })
        .await
}

pub async fn current_user(client: &ApiClient) -> Result<User, ApiError> {
    if client.token().is_none() {
        return Err(ApiError::Unauthenticated);
    }
    client.get("/users/me", &[]).await
}

pub async fn update_user(
    client: &ApiClient,
    id: &str,
    req: &UpdateUserRequest,
) -> Result<User, ApiError> {
    client.put(&format!("/users/{}", id), req).await
}

pub async fn change_password(
    client: &ApiClient,
    req: &ChangePasswordRequest,
) -> Result<Option<String>, ApiError> {
    client.put_message("/users/change-password", req).await
}

/// Asks the server to email a one-time password
pub async fn forgot_password(client: &ApiClient, email: &str) -> Result<Option<String>, ApiError> {
    client
        .post_message("/users/forgot-password", &EmailBody { email })
        .await
}

pub async fn verify_otp(client: &ApiClient, email: &str, otp: &str) -> Result<Option<String>, ApiError> {
    client
        .post_message("/users/verify-otp", &OtpBody { email, otp })
        .await
}

pub async fn reset_password(
    client: &ApiClient,
    req: &ResetPasswordRequest,
) -> Result<Option<String>, ApiError> {
    client.post_message("/users/reset-password", req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&Config {
            api_base_url: server.base_url(),
            ..Config::default()
        })
    }

    #[tokio::test]
    async fn test_login_posts_credentials() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/users/login")
                .json_body(json!({"email": "linh@example.com", "password": "banhmi2024"}));
            then.status(200).json_body(json!({
                "status": 200,
                "data": {
                    "user": {"id": "u1", "username": "linh", "email": "linh@example.com"},
                    "accessToken": "a1",
                    "refreshToken": "r1"
                }
            }));
        });

        let resp = login(
            &client_for(&server),
            &LoginRequest {
                email: "linh@example.com".into(),
                password: "banhmi2024".into(),
            },
        )
        .await
        .unwrap();

        assert_eq!(resp.tokens.access_token, "a1");
        assert_eq!(resp.user.id, "u1");
        mock.assert();
    }

    #[tokio::test]
    async fn test_wrong_password_surfaces_server_message() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/users/login");
            then.status(401)
                .json_body(json!({"status": 401, "message": "Wrong email or password"}));
        });

        let err = login(
            &client_for(&server),
            &LoginRequest {
                email: "linh@example.com".into(),
                password: "nope".into(),
            },
        )
        .await
        .unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(err.user_message(), "Wrong email or password");
    }

    #[tokio::test]
    async fn test_current_user_requires_token() {
        let server = MockServer::start();
        let err = current_user(&client_for(&server)).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_refresh_sends_refresh_token() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/users/refresh-token")
                .json_body(json!({"refreshToken": "r1"}));
            then.status(200).json_body(json!({
                "status": "success",
                "data": {"accessToken": "a2", "refreshToken": "r2"}
            }));
        });

        let tokens = refresh_token(&client_for(&server), "r1").await.unwrap();
        assert_eq!(tokens.access_token, "a2");
        mock.assert();
    }

    #[tokio::test]
    async fn test_forgot_password_returns_message() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/users/forgot-password")
                .json_body(json!({"email": "linh@example.com"}));
            then.status(200)
                .json_body(json!({"status": 200, "message": "OTP sent"}));
        });

        let message = forgot_password(&client_for(&server), "linh@example.com")
            .await
            .unwrap();
        assert_eq!(message.as_deref(), Some("OTP sent"));
    }
}
