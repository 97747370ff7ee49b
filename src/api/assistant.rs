//! Gemini-backed helpers proxied by the backend

use crate::error::ApiError;
use crate::models::{AskRequest, ChatAnswer, GeneratedLogo, LogoRequest};
use crate::network::client::ApiClient;
use crate::validation::require;

pub async fn ask(client: &ApiClient, question: &str) -> Result<ChatAnswer, ApiError> {
    require("Question", question)?;
    client
        .post(
            "/gemini/ask",
            &AskRequest {
                question: question.trim().to_string(),
            },
        )
        .await
}

pub async fn generate_logo(client: &ApiClient, req: &LogoRequest) -> Result<GeneratedLogo, ApiError> {
    require("Prompt", &req.prompt)?;
    client.post("/gemini/logo", req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_ask_trims_question() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/gemini/ask")
                .json_body(json!({"question": "What pairs with pho?"}));
            then.status(200)
                .json_body(json!({"status": 200, "data": {"answer": "Iced tea"}}));
        });

        let client = ApiClient::new(&Config {
            api_base_url: server.base_url(),
            ..Config::default()
        });
        let answer = ask(&client, "  What pairs with pho?\n").await.unwrap();
        assert_eq!(answer.answer, "Iced tea");
        mock.assert();
    }
}
