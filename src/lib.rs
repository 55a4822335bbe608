pub mod cities;
pub mod error;
pub mod messages;
pub mod profiles;
pub mod upstream;
pub mod weather;

use std::collections::HashSet;
use std::sync::Arc;

use axum::{Json, Router, debug_handler, extract::FromRef, response::IntoResponse, routing::get};
use parking_lot::Mutex;
use serde_json::{Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub use error::{ApiError, ApiResult};
use upstream::Upstream;

// One mutex-guarded collection per service. These are the entire "database";
// everything is gone when the process exits.
pub type CityStore = Arc<Mutex<Vec<cities::City>>>;
pub type CityNameStore = Arc<Mutex<HashSet<String>>>;
pub type MessageStore = Arc<Mutex<Vec<messages::Message>>>;
pub type ProfileStore = Arc<Mutex<Vec<profiles::Profile>>>;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub cities: CityStore,
    pub city_names: CityNameStore,
    pub messages: MessageStore,
    pub profiles: ProfileStore,
    pub upstream: Upstream,
}

impl AppState {
    pub fn new(upstream: Upstream) -> Self {
        Self {
            cities: CityStore::default(),
            city_names: CityNameStore::default(),
            messages: MessageStore::default(),
            profiles: ProfileStore::default(),
            upstream,
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .merge(cities::router())
        .merge(weather::router())
        .merge(messages::router())
        .merge(profiles::router())
        .with_state(state)
}

#[debug_handler]
async fn index() -> impl IntoResponse {
    Json(json!({"message": "Welcome to the minirest API"}))
}

pub trait GetField {
    fn get_str_field(&self, field: &str) -> ApiResult<String>;
}

impl GetField for Value {
    fn get_str_field(&self, field: &str) -> ApiResult<String> {
        Ok(self
            .get(field)
            .ok_or_else(|| format!("expected {field} in {self}"))?
            .as_str()
            .ok_or_else(|| format!("expected {field} in {self} to be string"))?
            .to_owned())
    }
}

pub(crate) fn timestamp_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .expect("utc timestamps always format as rfc3339")
}
