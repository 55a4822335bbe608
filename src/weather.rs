use axum::{Json, Router, debug_handler, routing::get, routing::post};
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::upstream::Upstream;
use crate::{ApiError, ApiResult, AppState, CityNameStore};

#[derive(Debug, Deserialize)]
struct CityQuery {
    city: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/city/", post(create_city))
        .route("/city/{city}", get(get_city).delete(delete_city))
        .route("/cities", get(get_cities))
}

fn normalize(city: &str) -> String {
    city.trim().to_lowercase()
}

#[debug_handler]
async fn create_city(
    State(store): State<CityNameStore>,
    Query(CityQuery { city }): Query<CityQuery>,
) -> ApiResult<Json<Value>> {
    let city = normalize(&city);
    if !store.lock().insert(city.clone()) {
        return Err(ApiError::Conflict("City already exists".to_owned()));
    }
    Ok(Json(json!({"message": "City added successfully", "city": city})))
}

#[debug_handler(state = AppState)]
async fn get_city(
    State(store): State<CityNameStore>,
    State(upstream): State<Upstream>,
    Path(city): Path<String>,
) -> ApiResult<Json<Value>> {
    let city = normalize(&city);
    if !store.lock().contains(&city) {
        return Err(ApiError::NotFound("City not found".to_owned()));
    }
    Ok(Json(fetch_city_data(&upstream, &city).await?))
}

#[debug_handler]
async fn delete_city(
    State(store): State<CityNameStore>,
    Path(city): Path<String>,
) -> ApiResult<Json<Value>> {
    let city = normalize(&city);
    if !store.lock().remove(&city) {
        return Err(ApiError::NotFound("City not found".to_owned()));
    }
    Ok(Json(json!({"message": "City deleted successfully"})))
}

#[debug_handler(state = AppState)]
async fn get_cities(
    State(store): State<CityNameStore>,
    State(upstream): State<Upstream>,
) -> ApiResult<Json<Value>> {
    // Snapshot first; the lock must not be held across the awaits below.
    let cities: Vec<String> = store.lock().iter().cloned().collect();
    if cities.is_empty() {
        return Ok(Json(json!({"message": "No cities available"})));
    }

    let mut results = Vec::with_capacity(cities.len());
    for city in &cities {
        results.push(fetch_city_data(&upstream, city).await?);
    }
    Ok(Json(Value::Array(results)))
}

/// Two chained upstream calls per city: the weather lookup yields the
/// timezone the time lookup needs. Either one failing aborts the whole
/// request; there are no partial results.
async fn fetch_city_data(upstream: &Upstream, city: &str) -> ApiResult<Value> {
    let weather = upstream.current_weather(city).await?;
    let timezone = weather
        .pointer("/location/timezone_id")
        .and_then(Value::as_str)
        .unwrap_or("Unknown")
        .to_owned();

    let time = upstream.current_time(&timezone).await?;
    let current_time = time
        .get("datetime")
        .and_then(Value::as_str)
        .unwrap_or("N/A")
        .to_owned();

    Ok(json!({
        "city": city,
        "timezone": timezone,
        "current_time": current_time,
        "weather": weather.get("current").cloned().unwrap_or_else(|| json!({})),
    }))
}
