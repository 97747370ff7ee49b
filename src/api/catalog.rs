//! Lookup lists used by the onboarding form: business models, tastes, diets, food types

use crate::error::ApiError;
use crate::models::{CatalogItem, CatalogKind, OnboardingCatalog, Paged, SearchQuery};
use crate::network::client::ApiClient;

pub async fn search(
    client: &ApiClient,
    kind: CatalogKind,
    query: &SearchQuery,
) -> Result<Paged<CatalogItem>, ApiError> {
    client
        .get(&format!("/{}/search", kind.resource()), &query.to_params())
        .await
}

/// Loads the first page of all four lists concurrently
pub async fn load_onboarding(client: &ApiClient) -> Result<OnboardingCatalog, ApiError> {
    let query = SearchQuery::default();
    let (business_models, tastes, diets, food_types) = futures_util::try_join!(
        search(client, CatalogKind::BusinessModel, &query),
        search(client, CatalogKind::Taste, &query),
        search(client, CatalogKind::Diet, &query),
        search(client, CatalogKind::FoodType, &query),
    )?;

    Ok(OnboardingCatalog {
        business_models: business_models.items,
        tastes: tastes.items,
        diets: diets.items,
        food_types: food_types.items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use httpmock::prelude::*;
    use serde_json::json;

    fn page(names: &[&str]) -> serde_json::Value {
        let items: Vec<_> = names
            .iter()
            .enumerate()
            .map(|(i, n)| json!({"id": format!("id{}", i), "name": n}))
            .collect();
        json!({"status": 200, "data": {"items": items, "total": names.len()}})
    }

    #[tokio::test]
    async fn test_onboarding_loads_every_list() {
        let server = MockServer::start();
        for (resource, names) in [
            ("business-models", vec!["Street stall", "Cafe"]),
            ("tastes", vec!["Spicy"]),
            ("diets", vec!["Vegan", "Halal"]),
            ("food-types", vec!["Noodles"]),
        ] {
            let body = page(&names);
            server.mock(move |when, then| {
                when.method(GET).path(format!("/{}/search", resource));
                then.status(200).json_body(body);
            });
        }

        let client = ApiClient::new(&Config {
            api_base_url: server.base_url(),
            ..Config::default()
        });
        let catalog = load_onboarding(&client).await.unwrap();

        assert_eq!(catalog.business_models.len(), 2);
        assert_eq!(catalog.tastes[0].name, "Spicy");
        assert_eq!(catalog.diets.len(), 2);
        assert_eq!(catalog.food_types.len(), 1);
    }

    #[tokio::test]
    async fn test_search_passes_name_and_paging() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/tastes/search")
                .query_param("name", "sour")
                .query_param("page", "1")
                .query_param("pageSize", "20");
            then.status(200).json_body(page(&["Sour"]));
        });

        let client = ApiClient::new(&Config {
            api_base_url: server.base_url(),
            ..Config::default()
        });
        let result = search(&client, CatalogKind::Taste, &SearchQuery::named("sour"))
            .await
            .unwrap();

        assert_eq!(result.items.len(), 1);
        assert_eq!(result.page, 1);
        mock.assert();
    }
}
