// API route configuration

use crate::api::handlers;
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Health check (no auth required)
        .route("/health", web::get().to(handlers::health_check))
        .route("/", web::get().to(handlers::health_check))
        .service(
            web::scope("/api/v1")
                // Catalog reads
                .route("/competitions", web::get().to(handlers::list_competitions))
                .route(
                    "/competitions/{id}",
                    web::get().to(handlers::get_competition),
                )
                .route("/venues/{id}", web::get().to(handlers::get_venue))
                .route("/sources", web::get().to(handlers::list_sources))
                .route("/scans", web::get().to(handlers::list_scans))
                // Writes (bearer-gated)
                .route("/scans", web::post().to(handlers::trigger_scan))
                .route(
                    "/settings/home-postcode",
                    web::put().to(handlers::update_home_postcode),
                ),
        );
}
