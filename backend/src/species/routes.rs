use actix_web::{web, HttpResponse};
use serde::Deserialize;
use shared::ErrorBody;

use super::client::{SpeciesClient, SpeciesError};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    q: Option<String>,
    page: Option<String>,
}

impl SearchQuery {
    /// Anything that isn't a positive integer means the first page.
    fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p > 0)
            .unwrap_or(1)
    }
}

pub async fn search(query: web::Query<SearchQuery>, client: web::Data<SpeciesClient>) -> HttpResponse {
    let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) else {
        return HttpResponse::BadRequest().json(ErrorBody::new("Query parameter is required"));
    };

    match client.search(q, query.page()).await {
        Ok(page) => HttpResponse::Ok().json(page),
        Err(SpeciesError::MissingApiKey) => {
            log::error!("Perenual API key is missing");
            HttpResponse::InternalServerError().json(ErrorBody::new("API configuration is missing"))
        }
        Err(SpeciesError::InvalidResponse) => {
            HttpResponse::InternalServerError().json(ErrorBody::new("Invalid API response format"))
        }
        Err(e) => {
            log::error!("Failed to fetch from Perenual API: {}", e);
            HttpResponse::InternalServerError().json(ErrorBody {
                error: "Failed to fetch plant data".to_string(),
                message: Some(e.to_string()),
                ..ErrorBody::default()
            })
        }
    }
}
