use crate::error::ApiError;
use crate::models::{CreateReplyRequest, CreateReviewRequest, Reply, Review};
use crate::network::client::ApiClient;
use crate::validation::{require, validate_rating};

pub async fn list(client: &ApiClient, snack_place_id: &str) -> Result<Vec<Review>, ApiError> {
    client
        .get("/reviews", &[("snackPlaceId", snack_place_id.to_string())])
        .await
}

pub async fn create(client: &ApiClient, req: &CreateReviewRequest) -> Result<Review, ApiError> {
    validate_rating(req.rating)?;
    require("Comment", &req.comment)?;
    client.post("/reviews", req).await
}

pub async fn list_replies(client: &ApiClient, review_id: &str) -> Result<Vec<Reply>, ApiError> {
    client
        .get(&format!("/reviews/{}/replies", review_id), &[])
        .await
}

pub async fn create_reply(
    client: &ApiClient,
    review_id: &str,
    req: &CreateReplyRequest,
) -> Result<Reply, ApiError> {
    require("Reply", &req.comment)?;
    client
        .post(&format!("/reviews/{}/replies", review_id), req)
        .await
}
