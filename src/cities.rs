use axum::{Json, Router, debug_handler, routing::get};
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::upstream::Upstream;
use crate::{ApiError, ApiResult, AppState, CityStore, GetField};

/// A city keyed by its 1-based position in the store. Positions are not
/// stable: deleting a city shifts every later position down by one, and
/// nothing stops two entries from sharing a name.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub timezone: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cities/", get(get_cities).post(add_city))
        .route("/cities/{city_id}/", get(get_city).delete(delete_city))
}

#[debug_handler(state = AppState)]
async fn get_cities(
    State(store): State<CityStore>,
    State(upstream): State<Upstream>,
) -> ApiResult<Json<Vec<Value>>> {
    // Snapshot first; the lock must not be held across the awaits below.
    let cities = store.lock().clone();

    let mut results = Vec::with_capacity(cities.len());
    for city in cities {
        let time = upstream.current_time(&city.timezone).await?;
        results.push(json!({
            "name": city.name,
            "timezone": city.timezone,
            "current_time": time.get_str_field("datetime")?,
        }));
    }
    Ok(Json(results))
}

#[debug_handler]
async fn get_city(
    State(store): State<CityStore>,
    Path(city_id): Path<usize>,
) -> ApiResult<Json<City>> {
    let cities = store.lock();
    let city = city_id
        .checked_sub(1)
        .and_then(|index| cities.get(index))
        .ok_or_else(|| ApiError::NotFound("City not found".to_owned()))?;
    Ok(Json(city.clone()))
}

#[debug_handler]
async fn add_city(State(store): State<CityStore>, Json(city): Json<City>) -> Json<City> {
    store.lock().push(city.clone());
    Json(city)
}

#[debug_handler]
async fn delete_city(
    State(store): State<CityStore>,
    Path(city_id): Path<usize>,
) -> ApiResult<Json<Value>> {
    let mut cities = store.lock();
    let index = city_id
        .checked_sub(1)
        .filter(|index| *index < cities.len())
        .ok_or_else(|| ApiError::NotFound("City not found".to_owned()))?;
    cities.remove(index);
    Ok(Json(json!({})))
}
