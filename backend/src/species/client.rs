use futures::future::join_all;
use reqwest::header::ACCEPT;
use reqwest::Client as HttpClient;
use serde_json::Value;
use shared::diagnosis::{NOT_SPECIFIED, UNKNOWN};
use shared::species::{Pagination, PlantRecord, SpeciesPage};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum SpeciesError {
    #[error("API configuration is missing")]
    MissingApiKey,
    #[error("{0}")]
    Upstream(String),
    #[error("Invalid API response format")]
    InvalidResponse,
    #[error("Invalid species URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("{0}")]
    Http(reqwest::Error),
}

impl From<reqwest::Error> for SpeciesError {
    // The request URL carries the API key.
    fn from(e: reqwest::Error) -> Self {
        SpeciesError::Http(e.without_url())
    }
}

/// Proxy for the Perenual plant catalogue.
#[derive(Clone)]
pub struct SpeciesClient {
    http_client: HttpClient,
    base_url: String,
    api_key: Option<String>,
}

impl SpeciesClient {
    pub fn new(http_client: HttpClient, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// One page of matches, each enriched with its detail record.
    pub async fn search(&self, query: &str, page: u32) -> Result<SpeciesPage, SpeciesError> {
        let key = self.api_key.as_deref().ok_or(SpeciesError::MissingApiKey)?;
        let page_param = page.to_string();
        let url = Url::parse_with_params(
            &format!("{}/species-list", self.base_url),
            &[("key", key), ("q", query), ("page", page_param.as_str())],
        )?;
        log::info!("Searching species for '{}' (page {})", query, page);

        let response = self
            .http_client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;
        let listing = serde_json::from_slice::<Value>(&body);

        if !status.is_success() {
            let message = listing
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| format!("API request failed with status: {}", status.as_u16()));
            log::error!("Species list request failed: {}", message);
            return Err(SpeciesError::Upstream(message));
        }

        let listing = listing.map_err(|e| SpeciesError::Upstream(e.to_string()))?;
        let items = match listing.get("data").and_then(Value::as_array) {
            Some(items) => items,
            None => {
                log::error!("Species list response has no data array");
                return Err(SpeciesError::InvalidResponse);
            }
        };

        let details = join_all(items.iter().map(|item| self.fetch_detail(key, item))).await;
        let plants: Vec<PlantRecord> = items
            .iter()
            .zip(details)
            .map(|(item, detail)| merge_plant(item, detail.as_ref()))
            .collect();

        let current_page = page_number(&listing, "current_page").unwrap_or(page);
        let total_pages = page_number(&listing, "last_page").unwrap_or(current_page);
        log::info!("Species search '{}' returned {} plants", query, plants.len());

        Ok(SpeciesPage {
            plants,
            pagination: Pagination::new(current_page, total_pages),
        })
    }

    /// `None` on any failure; the caller keeps the list entry alone.
    async fn fetch_detail(&self, key: &str, item: &Value) -> Option<Value> {
        let id = plant_id(item)?;
        let url = Url::parse_with_params(
            &format!("{}/species/details/{}", self.base_url, id),
            &[("key", key)],
        )
        .ok()?;

        match self.http_client.get(url).header(ACCEPT, "application/json").send().await {
            Ok(response) if response.status().is_success() => match response.json::<Value>().await {
                Ok(detail) => Some(detail),
                Err(e) => {
                    log::warn!("Unreadable details for plant {}: {}", id, e.without_url());
                    None
                }
            },
            Ok(response) => {
                log::warn!("Details for plant {} returned {}", id, response.status());
                None
            }
            Err(e) => {
                log::warn!("Failed to fetch details for plant {}: {}", id, e.without_url());
                None
            }
        }
    }
}

fn page_number(listing: &Value, key: &str) -> Option<u32> {
    listing
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
}

fn plant_id(item: &Value) -> Option<i64> {
    match item.get("id")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Strings as-is, string lists joined with ", ". Blank means absent.
fn text_of(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
        Value::Null => false,
    }
}

fn image_of(record: &Value) -> Option<String> {
    let image = record.get("default_image")?;
    ["regular_url", "original_url"]
        .iter()
        .find_map(|key| image.get(*key).and_then(text_of))
}

/// Combines a list entry with its (optional) detail record. Detail values win.
pub fn merge_plant(list: &Value, detail: Option<&Value>) -> PlantRecord {
    let sources: Vec<&Value> = detail.into_iter().chain(std::iter::once(list)).collect();
    let pick = |key: &str| sources.iter().find_map(|src| src.get(key).and_then(text_of));
    let pick_or = |key: &str, default: &str| pick(key).unwrap_or_else(|| default.to_string());

    PlantRecord {
        id: plant_id(list).or_else(|| detail.and_then(plant_id)).unwrap_or_default(),
        common_name: pick_or("common_name", UNKNOWN),
        scientific_name: pick_or("scientific_name", UNKNOWN),
        image_url: sources.iter().find_map(|src| image_of(src)),
        cycle: pick_or("cycle", NOT_SPECIFIED),
        watering: pick_or("watering", NOT_SPECIFIED),
        sunlight: pick_or("sunlight", NOT_SPECIFIED),
        growth_rate: pick_or("growth_rate", NOT_SPECIFIED),
        maintenance: pick_or("maintenance", NOT_SPECIFIED),
        poisonous: sources
            .iter()
            .any(|src| src.get("poisonous_to_humans").is_some_and(truthy)),
        description: pick("description"),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use actix_web::dev::ServerHandle;
    use actix_web::{web, App, HttpResponse, HttpServer};
    use serde_json::json;
    use std::collections::HashMap;
    use std::net::SocketAddr;

    async fn species_list(query: web::Query<HashMap<String, String>>) -> HttpResponse {
        if query.get("key").map(String::as_str) != Some("test-key") {
            return HttpResponse::Unauthorized().json(json!({ "message": "Invalid API key" }));
        }
        match query.get("q").map(String::as_str) {
            Some("broken") => HttpResponse::Ok().json(json!({ "data": "nope" })),
            Some("down") => HttpResponse::ServiceUnavailable().body("maintenance"),
            _ => HttpResponse::Ok().json(json!({
                "data": [
                    {
                        "id": 1,
                        "common_name": "European Silver Fir",
                        "scientific_name": ["Abies alba"],
                        "cycle": "Perennial",
                        "watering": "Frequent",
                        "sunlight": ["full sun"],
                        "default_image": { "regular_url": null, "original_url": "https://img/1.jpg" }
                    },
                    {
                        "id": 2,
                        "common_name": "Pyramidalis Silver Fir",
                        "scientific_name": ["Abies alba 'Pyramidalis'"],
                        "cycle": "Perennial",
                        "watering": "Average",
                        "sunlight": ["full sun", "part shade"],
                        "default_image": null
                    }
                ],
                "current_page": 2,
                "last_page": 3
            })),
        }
    }

    async fn species_details(path: web::Path<i64>) -> HttpResponse {
        match path.into_inner() {
            1 => HttpResponse::Ok().json(json!({
                "id": 1,
                "watering": "Average",
                "sunlight": ["full sun", "filtered shade"],
                "growth_rate": "High",
                "maintenance": "Low",
                "poisonous_to_humans": 1,
                "description": "A tall conifer."
            })),
            _ => HttpResponse::InternalServerError().finish(),
        }
    }

    /// Minimal stand-in for the Perenual API; details for id 2 always fail.
    pub fn spawn_fake_perenual() -> (SocketAddr, ServerHandle) {
        let server = HttpServer::new(|| {
            App::new()
                .route("/species-list", web::get().to(species_list))
                .route("/species/details/{id}", web::get().to(species_details))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);
        (addr, handle)
    }

    pub fn client_for(addr: SocketAddr) -> SpeciesClient {
        SpeciesClient::new(HttpClient::new(), format!("http://{}/", addr), Some("test-key".into()))
    }

    #[test]
    fn test_merge_prefers_detail_values() {
        let list = json!({
            "id": 7,
            "common_name": "Aloe",
            "scientific_name": ["Aloe vera"],
            "cycle": "Perennial",
            "watering": "Minimum",
            "sunlight": ["full sun"],
            "default_image": { "regular_url": "https://img/aloe.jpg" }
        });
        let detail = json!({
            "watering": "Average",
            "sunlight": ["part shade", "full sun"],
            "growth_rate": "Low",
            "poisonous_to_humans": true
        });

        let plant = merge_plant(&list, Some(&detail));
        assert_eq!(plant.id, 7);
        assert_eq!(plant.scientific_name, "Aloe vera");
        assert_eq!(plant.cycle, "Perennial");
        assert_eq!(plant.watering, "Average");
        assert_eq!(plant.sunlight, "part shade, full sun");
        assert_eq!(plant.growth_rate, "Low");
        assert_eq!(plant.maintenance, "Not specified");
        assert_eq!(plant.image_url.as_deref(), Some("https://img/aloe.jpg"));
        assert!(plant.poisonous);
        assert_eq!(plant.description, None);
    }

    #[test]
    fn test_merge_defaults_for_empty_entry() {
        let plant = merge_plant(&json!({}), None);
        assert_eq!(plant.id, 0);
        assert_eq!(plant.common_name, "Unknown");
        assert_eq!(plant.scientific_name, "Unknown");
        assert_eq!(plant.sunlight, "Not specified");
        assert_eq!(plant.cycle, shared::diagnosis::NOT_SPECIFIED);
        assert_eq!(plant.image_url, None);
        assert!(!plant.poisonous);
    }

    #[test]
    fn test_merge_treats_blank_and_zero_as_absent() {
        let list = json!({ "id": "12", "common_name": "  ", "poisonous_to_humans": 0, "sunlight": [] });
        let plant = merge_plant(&list, Some(&json!({ "description": "" })));
        assert_eq!(plant.id, 12);
        assert_eq!(plant.common_name, "Unknown");
        assert_eq!(plant.sunlight, "Not specified");
        assert!(!plant.poisonous);
        assert_eq!(plant.description, None);
    }

    #[actix_web::test]
    async fn test_search_merges_and_falls_back_on_failed_detail() {
        let (addr, handle) = spawn_fake_perenual();

        let page = client_for(addr).search("fir", 2).await.unwrap();
        assert_eq!(page.pagination, Pagination::new(2, 3));
        assert!(page.pagination.has_next && page.pagination.has_prev);
        assert_eq!(page.plants.len(), 2);

        let fir = &page.plants[0];
        assert_eq!(fir.watering, "Average");
        assert_eq!(fir.sunlight, "full sun, filtered shade");
        assert_eq!(fir.growth_rate, "High");
        assert_eq!(fir.image_url.as_deref(), Some("https://img/1.jpg"));
        assert!(fir.poisonous);
        assert_eq!(fir.description.as_deref(), Some("A tall conifer."));

        let fallback = &page.plants[1];
        assert_eq!(fallback.id, 2);
        assert_eq!(fallback.watering, "Average");
        assert_eq!(fallback.sunlight, "full sun, part shade");
        assert_eq!(fallback.growth_rate, "Not specified");
        assert_eq!(fallback.image_url, None);
        handle.stop(false).await;
    }

    #[actix_web::test]
    async fn test_search_error_paths() {
        let (addr, handle) = spawn_fake_perenual();

        let err = client_for(addr).search("broken", 1).await.unwrap_err();
        assert!(matches!(err, SpeciesError::InvalidResponse));

        let err = client_for(addr).search("down", 1).await.unwrap_err();
        assert_eq!(err.to_string(), "API request failed with status: 503");

        let wrong_key = SpeciesClient::new(HttpClient::new(), format!("http://{}", addr), Some("bad".into()));
        let err = wrong_key.search("fir", 1).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid API key");
        handle.stop(false).await;
    }

    #[actix_web::test]
    async fn test_missing_key_makes_no_request() {
        let client = SpeciesClient::new(HttpClient::new(), "http://127.0.0.1:9", None);
        assert!(matches!(client.search("fir", 1).await, Err(SpeciesError::MissingApiKey)));
    }
}
