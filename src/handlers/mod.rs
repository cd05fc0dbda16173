pub mod health;
pub mod search;

use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(health::config)
            .configure(search::config)
    );
}
