use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::info;

use crate::services::StatusAggregator;
use crate::state::AppState;

// Availability overview of every monitored route
pub async fn get_status(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    info!("Request for agent status");
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let report = StatusAggregator::default()
        .aggregate(&data, authorization)
        .await;

    HttpResponse::Ok().json(report)
}
