use actix_web::{web, HttpResponse};
use log::info;

use crate::services::ServiceProbe;
use crate::state::AppState;

// Report for a single monitored service
pub async fn get_service_status(data: web::Data<AppState>, service: ServiceProbe) -> HttpResponse {
    info!("Request for /{} status", service.route);
    respond(&data, &service).await
}

/// Collect the report for `service` and render the JSON response.
///
/// Collection failures are part of the payload, so the route always
/// answers 200.
pub async fn respond(state: &AppState, service: &ServiceProbe) -> HttpResponse {
    HttpResponse::Ok().json(state.prober.report(service).await)
}
