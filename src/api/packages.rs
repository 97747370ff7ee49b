use crate::error::ApiError;
use crate::models::{Paged, PremiumPackage, SearchQuery};
use crate::network::client::ApiClient;

pub async fn search(client: &ApiClient, query: &SearchQuery) -> Result<Paged<PremiumPackage>, ApiError> {
    client
        .get("/premium-packages/search", &query.to_params())
        .await
}

pub async fn get(client: &ApiClient, id: &str) -> Result<PremiumPackage, ApiError> {
    client.get(&format!("/premium-packages/{}", id), &[]).await
}
