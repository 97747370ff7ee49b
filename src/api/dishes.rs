use crate::error::ApiError;
use crate::models::{CreateDishRequest, Dish, UpdateDishRequest};
use crate::network::client::ApiClient;
use crate::validation::{require, validate_price};

pub async fn create(client: &ApiClient, req: &CreateDishRequest) -> Result<Dish, ApiError> {
    require("Dish name", &req.name)?;
    require("Snack place", &req.snack_place_id)?;
    validate_price(req.price)?;
    client.post("/dishes", req).await
}

pub async fn update(client: &ApiClient, id: &str, req: &UpdateDishRequest) -> Result<Dish, ApiError> {
    if let Some(price) = req.price {
        validate_price(price)?;
    }
    client.put(&format!("/dishes/{}", id), req).await
}

pub async fn list(client: &ApiClient, snack_place_id: &str) -> Result<Vec<Dish>, ApiError> {
    client
        .get("/dishes", &[("snackPlaceId", snack_place_id.to_string())])
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_list_filters_by_place() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/dishes")
                .query_param("snackPlaceId", "sp1");
            then.status(200).json_body(json!({
                "status": 200,
                "data": [
                    {"id": "d1", "snackPlaceId": "sp1", "name": "Banh mi thit", "price": 25000},
                    {"id": "d2", "snackPlaceId": "sp1", "name": "Banh mi trung", "price": 20000,
                     "isActive": false}
                ]
            }));
        });

        let client = ApiClient::new(&Config {
            api_base_url: server.base_url(),
            ..Config::default()
        });
        let dishes = list(&client, "sp1").await.unwrap();

        assert_eq!(dishes.len(), 2);
        assert!(dishes[0].is_active);
        assert!(!dishes[1].is_active);
        mock.assert();
    }

    #[tokio::test]
    async fn test_zero_price_rejected() {
        let client = ApiClient::new(&Config::default());
        let err = create(
            &client,
            &CreateDishRequest {
                snack_place_id: "sp1".into(),
                name: "Free lunch".into(),
                description: None,
                price: 0.0,
                image: None,
            },
        )
        .await
        .unwrap_err();
        assert!(err.is_validation());
    }
}
