// Route exports
pub mod review;

use actix_web::web;

pub use review::AppState;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(review::configure),
    );
}
