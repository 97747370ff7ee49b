use crate::error::ApiError;
use crate::models::{LoginRequest, LoginResponse};
use crate::network::client::ApiClient;

/// Login for snack-place owners; same payload as a user login
pub async fn login(client: &ApiClient, req: &LoginRequest) -> Result<LoginResponse, ApiError> {
    client.post("/merchants/login", req).await
}
