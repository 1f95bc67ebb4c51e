// src/server/mod.rs

use serde::Serialize;
use std::{collections::HashMap, convert::Infallible};
use tracing::warn;
use warp::{
    http::StatusCode,
    multipart::FormData,
    reject::Rejection,
    reply::{Reply, Response},
    Filter,
};

use crate::analytics::AnalyticsEngine;
use crate::config::Config;
use crate::error::{AnalyticsError, Result};

pub mod upload;

/// Request defaults taken from [`Config`].
#[derive(Debug, Clone, Copy)]
pub struct Defaults {
    pub window: usize,
    pub forecast_periods: usize,
    pub max_upload_bytes: u64,
}

impl From<&Config> for Defaults {
    fn from(cfg: &Config) -> Self {
        Self {
            window: cfg.default_window,
            forecast_periods: cfg.default_forecast_periods,
            max_upload_bytes: cfg.max_upload_bytes,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

/// All service routes:
///
/// - `GET  /health`
/// - `POST /upload` (multipart, field `file`)
/// - `GET  /datasets`
/// - `GET  /analytics/{id}/total`
/// - `GET  /analytics/{id}/moving-average?series=..&window=..`
/// - `GET  /analytics/{id}/correlation`
/// - `GET  /analytics/{id}/forecast?series=..&months=..`
pub fn routes(
    engine: AnalyticsEngine,
    defaults: Defaults,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(health_check);

    let upload = warp::path("upload")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(defaults.max_upload_bytes))
        .and(warp::multipart::form().max_length(defaults.max_upload_bytes))
        .and(with_engine(engine.clone()))
        .then(upload_file);

    let datasets = warp::path("datasets")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_engine(engine.clone()))
        .then(list_datasets);

    let analytics = warp::path("analytics")
        .and(warp::get())
        .and(warp::path::param::<String>())
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_engine(engine))
        .and(warp::any().map(move || defaults))
        .then(analytics_request);

    health
        .or(upload)
        .unify()
        .or(datasets)
        .unify()
        .or(analytics)
        .unify()
        .recover(handle_rejection)
        .unify()
        .with(warp::trace::request())
}

fn with_engine(
    engine: AnalyticsEngine,
) -> impl Filter<Extract = (AnalyticsEngine,), Error = Infallible> + Clone {
    warp::any().map(move || engine.clone())
}

fn health_check() -> Response {
    warp::reply::json(&serde_json::json!({
        "status": "healthy",
        "service": "csvstats"
    }))
    .into_response()
}

async fn upload_file(form: FormData, engine: AnalyticsEngine) -> Response {
    respond(upload::ingest_form(form, engine.store()).await)
}

async fn list_datasets(engine: AnalyticsEngine) -> Response {
    respond(Ok(engine.store().list().await))
}

async fn analytics_request(
    id: String,
    view: String,
    query: HashMap<String, String>,
    engine: AnalyticsEngine,
    defaults: Defaults,
) -> Response {
    match view.as_str() {
        "total" => respond(engine.totals(&id).await),
        "correlation" => respond(engine.correlation(&id).await),
        "moving-average" => {
            let window = count_param(&query, &["window"], defaults.window);
            match required_param(&query, "series") {
                Ok(series) => respond(engine.moving_average(&id, series, window).await),
                Err(err) => error_reply(err),
            }
        }
        "forecast" => {
            let periods = count_param(
                &query,
                &["months", "monthsForecast"],
                defaults.forecast_periods,
            );
            match required_param(&query, "series") {
                Ok(series) => respond(engine.forecast(&id, series, periods).await),
                Err(err) => error_reply(err),
            }
        }
        _ => status_reply(StatusCode::NOT_FOUND, "not_found", format!("unknown view {view:?}")),
    }
}

fn required_param<'a>(query: &'a HashMap<String, String>, key: &str) -> Result<&'a str> {
    query
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AnalyticsError::MissingParameter(key.to_string()))
}

/// First of `keys` that parses as a count, else `default`.
fn count_param(query: &HashMap<String, String>, keys: &[&str], default: usize) -> usize {
    keys.iter()
        .find_map(|k| query.get(*k).and_then(|v| v.trim().parse().ok()))
        .unwrap_or(default)
}

fn respond<T: Serialize>(result: Result<T>) -> Response {
    match result {
        Ok(body) => warp::reply::json(&body).into_response(),
        Err(err) => error_reply(err),
    }
}

fn error_reply(err: AnalyticsError) -> Response {
    warn!(category = err.category(), "request failed: {}", err);
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    status_reply(status, err.category(), err.to_string())
}

fn status_reply(status: StatusCode, error: &'static str, message: String) -> Response {
    warp::reply::with_status(warp::reply::json(&ErrorResponse { error, message }), status)
        .into_response()
}

async fn handle_rejection(rej: Rejection) -> std::result::Result<Response, Infallible> {
    let reply = if rej.is_not_found() {
        status_reply(StatusCode::NOT_FOUND, "not_found", "no such route".to_string())
    } else if rej.find::<warp::reject::PayloadTooLarge>().is_some() {
        status_reply(
            StatusCode::PAYLOAD_TOO_LARGE,
            "payload_too_large",
            "upload exceeds the configured size limit".to_string(),
        )
    } else if rej.find::<warp::reject::LengthRequired>().is_some() {
        status_reply(
            StatusCode::LENGTH_REQUIRED,
            "length_required",
            "uploads need a content-length header".to_string(),
        )
    } else if rej.find::<warp::reject::MethodNotAllowed>().is_some() {
        status_reply(
            StatusCode::METHOD_NOT_ALLOWED,
            "method_not_allowed",
            "method not allowed".to_string(),
        )
    } else {
        warn!("rejected request: {:?}", rej);
        status_reply(StatusCode::BAD_REQUEST, "bad_request", format!("{rej:?}"))
    };
    Ok(reply)
}
