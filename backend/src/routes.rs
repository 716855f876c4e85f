use actix_files::Files;
use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::auth::middleware::AuthMiddleware;
use crate::auth::routes as auth_routes;
use crate::diagnosis::routes as diagnosis_routes;
use crate::species::routes as species_routes;

pub fn configure_routes(cfg: &mut web::ServiceConfig, frontend_dir: String, auth_middleware: AuthMiddleware) {
    configure_api(cfg, auth_middleware);
    cfg.service(Files::new("/", frontend_dir).index_file("index.html"));
}

/// Everything under `/api` plus the health probe.
pub fn configure_api(cfg: &mut web::ServiceConfig, auth_middleware: AuthMiddleware) {
    cfg.service(
        web::scope("/api/auth")
            .route("/signup", web::post().to(auth_routes::signup))
            .route("/login", web::post().to(auth_routes::login))
            .route("/logout", web::post().to(auth_routes::logout))
            .service(
                web::resource("/me")
                    .wrap(auth_middleware.clone())
                    .route(web::get().to(auth_routes::me)),
            ),
    )
    .service(
        web::scope("/api/diagnosis")
            .wrap(auth_middleware)
            .route("", web::post().to(diagnosis_routes::diagnose))
            .service(
                web::resource("/latest")
                    .route(web::get().to(diagnosis_routes::latest))
                    .route(web::delete().to(diagnosis_routes::clear_latest)),
            ),
    )
    .route("/api/species/search", web::get().to(species_routes::search))
    .route("/health", web::get().to(health));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}
