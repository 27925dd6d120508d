use std::time::Duration;

use anyhow::{Context, Result};

use macromate_core::openfoodfacts::{FoodCandidate, SearchResponse, product_to_candidate};

const SEARCH_URL: &str = "https://world.openfoodfacts.org/cgi/search.pl";

pub struct OpenFoodFactsClient {
    client: reqwest::Client,
}

impl OpenFoodFactsClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "macromate-cli/{} (nutrition tracker)",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<FoodCandidate>> {
        let page_size = limit.clamp(1, 50).to_string();
        tracing::debug!(query, "searching OpenFoodFacts");
        let resp = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("search_terms", query),
                ("json", "1"),
                ("page_size", page_size.as_str()),
            ])
            .send()
            .await
            .context("Failed to reach OpenFoodFacts API")?;

        let data: SearchResponse = resp
            .json()
            .await
            .context("Failed to parse OpenFoodFacts search response")?;

        let foods: Vec<FoodCandidate> = data
            .products
            .into_iter()
            .filter_map(product_to_candidate)
            .take(limit)
            .collect();

        Ok(foods)
    }
}
