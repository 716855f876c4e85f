mod auth;
mod config;
mod db;
mod diagnosis;
mod routes;
mod species;

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use auth::jwt::JwtService;
use auth::middleware::AuthMiddleware;
use config::AppConfig;
use db::user_repository::UserRepository;
use diagnosis::client::InferenceClient;
use diagnosis::store::DiagnosisStore;
use routes::configure_routes;
use species::client::SpeciesClient;
use std::io;

fn cors(origin: Option<&str>) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
        .max_age(3600);
    match origin {
        Some(origin) => cors.allowed_origin(origin).supports_credentials(),
        None => cors.allow_any_origin(),
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let users = UserRepository::connect(&config.database_url).await.map_err(|e| {
        log::error!("Failed to open user database {}: {:?}", config.database_url, e);
        io::Error::other(format!("Database unavailable: {}", e))
    })?;

    let http_client = reqwest::Client::new();
    let inference_client = InferenceClient::new(http_client.clone(), config.inference_url.clone());
    let species_client = SpeciesClient::new(
        http_client,
        config.perenual_base_url.clone(),
        config.perenual_api_key.clone(),
    );
    let jwt_service = JwtService::new(&config.jwt_secret);
    let auth_middleware = AuthMiddleware::new(jwt_service.clone());
    let store = DiagnosisStore::new();

    log::info!("Inference service: {}", inference_client.predict_url());
    if config.perenual_api_key.is_none() {
        log::warn!("PERENUAL_API_KEY is not set; species search will be unavailable");
    }
    log::info!("Serving frontend from {}", config.frontend_dir);

    let bind_address = (config.bind_address.clone(), config.port);
    log::info!("Starting server on {}:{}", bind_address.0, bind_address.1);

    let app_config = config.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(cors(app_config.cors_origin.as_deref()))
            .app_data(web::Data::new(app_config.clone()))
            .app_data(web::Data::new(users.clone()))
            .app_data(web::Data::new(jwt_service.clone()))
            .app_data(web::Data::new(inference_client.clone()))
            .app_data(web::Data::new(species_client.clone()))
            .app_data(web::Data::new(store.clone()))
            .configure(|cfg| {
                configure_routes(cfg, app_config.frontend_dir.clone(), auth_middleware.clone())
            })
    })
    .bind(bind_address)?
    .run()
    .await
}
