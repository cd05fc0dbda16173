use actix_web::{web, HttpResponse, Result};
use crate::models::{ApiResponse, HealthStatus};
use crate::state::AppState;

pub async fn health_check(state: web::Data<AppState>) -> Result<HttpResponse> {
    let session = state.session.lock().await;
    let status = HealthStatus {
        status: "healthy".to_string(),
        export_available: session.page().export_visible(),
        latest_seq: session.latest_seq(),
    };
    let response = ApiResponse::success_with_message(status, "Service is healthy");
    Ok(HttpResponse::Ok().json(response))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}
