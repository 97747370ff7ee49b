//! Merchant storefront endpoints

use crate::error::ApiError;
use crate::models::{CreateSnackPlaceRequest, SnackPlace, UpdateSnackPlaceRequest};
use crate::network::client::ApiClient;
use crate::validation::{require, validate_email, validate_phone};

pub async fn create(client: &ApiClient, req: &CreateSnackPlaceRequest) -> Result<SnackPlace, ApiError> {
    validate_create(req)?;
    client.post("/snack-places", req).await
}

pub async fn update(
    client: &ApiClient,
    id: &str,
    req: &UpdateSnackPlaceRequest,
) -> Result<SnackPlace, ApiError> {
    if let Some(phone) = &req.phone {
        validate_phone(phone)?;
    }
    client.put(&format!("/snack-places/{}", id), req).await
}

pub async fn get(client: &ApiClient, id: &str) -> Result<SnackPlace, ApiError> {
    client.get(&format!("/snack-places/{}", id), &[]).await
}

/// The storefront owned by the signed-in merchant
pub async fn mine(client: &ApiClient) -> Result<SnackPlace, ApiError> {
    client.get("/snack-places/mine", &[]).await
}

fn validate_create(req: &CreateSnackPlaceRequest) -> Result<(), ApiError> {
    require("Place name", &req.place_name)?;
    require("Owner name", &req.owner_name)?;
    require("Address", &req.address)?;
    validate_email(&req.email)?;
    validate_phone(&req.phone)?;
    Ok(())
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

    fn request() -> CreateSnackPlaceRequest {
        CreateSnackPlaceRequest {
            place_name: "Banh Mi Co Ba".into(),
            owner_name: "Ba Nguyen".into(),
            email: "coba@example.com".into(),
            phone: "0901234567".into(),
            address: "12 Le Loi, District 1".into(),
            taste_ids: vec!["t1".into()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_invalid_form_never_hits_server() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/snack-places");
            then.status(200);
        });

        let mut req = request();
        req.phone = "123".into();
        let err = create(&client_for(&server), &req).await.unwrap_err();

        assert!(err.is_validation());
        mock.assert_calls(0);
    }

    #[tokio::test]
    async fn test_create_returns_place() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/snack-places")
                .body_includes("\"placeName\":\"Banh Mi Co Ba\"");
            then.status(201).json_body(json!({
                "status": 201,
                "message": "Created",
                "data": {
                    "id": "sp1", "userId": "u1", "placeName": "Banh Mi Co Ba",
                    "ownerName": "Ba Nguyen", "email": "coba@example.com",
                    "phone": "0901234567", "address": "12 Le Loi, District 1",
                    "tasteIds": ["t1"]
                }
            }));
        });

        let place = create(&client_for(&server), &request()).await.unwrap();
        assert_eq!(place.id, "sp1");
        assert!(place.is_active);
        assert_eq!(place.taste_ids, vec!["t1".to_string()]);
        mock.assert();
    }
}
