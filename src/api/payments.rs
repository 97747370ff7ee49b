//! Premium-package payments: creation, status checks and history

use crate::error::ApiError;
use crate::models::{CreatePaymentRequest, Payment, PaymentStatus};
use crate::network::client::ApiClient;
use crate::validation::require;

pub async fn create(client: &ApiClient, package_id: &str) -> Result<Payment, ApiError> {
    require("Package", package_id)?;
    client
        .post(
            "/payments",
            &CreatePaymentRequest {
                package_id: package_id.to_string(),
            },
        )
        .await
}

pub async fn check_status(client: &ApiClient, payment_id: &str) -> Result<PaymentStatus, ApiError> {
    let mut status: PaymentStatus = client
        .get(&format!("/payments/{}/status", payment_id), &[])
        .await?;
    if status.id.is_none() {
        status.id = Some(payment_id.to_string());
    }
    Ok(status)
}

pub async fn history(client: &ApiClient) -> Result<Vec<Payment>, ApiError> {
    client.get("/payments/history", &[]).await
}
