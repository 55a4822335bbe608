use std::collections::BTreeMap;

use axum::{Json, Router, debug_handler, routing::get};
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{ApiError, ApiResult, AppState, ProfileStore, timestamp_now};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub bio: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub links: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ProfileCreate {
    username: String,
    email: String,
    full_name: String,
    bio: Option<String>,
}

// Absent fields keep their prior values; the username is immutable. An
// explicit `"bio": null` is distinct from an absent bio and clears the field.
#[derive(Debug, Default, Deserialize)]
struct ProfileUpdate {
    email: Option<String>,
    full_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    bio: Option<Option<String>>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profiles/", get(get_all_profiles).post(create_profile))
        .route(
            "/profiles/{profile_id}",
            get(get_profile).put(update_profile).delete(delete_profile),
        )
        .route("/profiles/username/{username}", get(get_profile_by_username))
}

fn not_found() -> ApiError {
    ApiError::NotFound("Profile not found".to_owned())
}

fn validate_email(email: &str) -> ApiResult<()> {
    if email.contains('@') {
        Ok(())
    } else {
        Err(ApiError::Validation("Invalid email format".to_owned()))
    }
}

#[debug_handler]
async fn get_all_profiles(State(store): State<ProfileStore>) -> Json<Vec<Profile>> {
    Json(store.lock().clone())
}

#[debug_handler]
async fn get_profile(
    State(store): State<ProfileStore>,
    Path(profile_id): Path<String>,
) -> ApiResult<Json<Profile>> {
    let profiles = store.lock();
    let profile = profiles
        .iter()
        .find(|profile| profile.id == profile_id)
        .ok_or_else(not_found)?;
    Ok(Json(profile.clone()))
}

#[debug_handler]
async fn get_profile_by_username(
    State(store): State<ProfileStore>,
    Path(username): Path<String>,
) -> ApiResult<Json<Profile>> {
    let username = username.to_lowercase();
    let profiles = store.lock();
    let profile = profiles
        .iter()
        .find(|profile| profile.username.to_lowercase() == username)
        .ok_or_else(not_found)?;
    Ok(Json(profile.clone()))
}

#[debug_handler]
async fn create_profile(
    State(store): State<ProfileStore>,
    Json(create): Json<ProfileCreate>,
) -> ApiResult<Json<Profile>> {
    validate_email(&create.email)?;

    let mut profiles = store.lock();
    let taken = profiles
        .iter()
        .any(|profile| profile.username.to_lowercase() == create.username.to_lowercase());
    if taken {
        return Err(ApiError::Conflict("Username already taken".to_owned()));
    }

    let now = timestamp_now();
    let profile = Profile {
        id: Uuid::new_v4().to_string(),
        links: BTreeMap::from([
            ("self".to_owned(), format!("/profiles/{}", create.username)),
            ("messages".to_owned(), format!("/messages/sender/{}", create.username)),
        ]),
        username: create.username,
        email: create.email,
        full_name: create.full_name,
        bio: create.bio,
        created_at: now.clone(),
        updated_at: now,
    };
    profiles.push(profile.clone());
    Ok(Json(profile))
}

#[debug_handler]
async fn update_profile(
    State(store): State<ProfileStore>,
    Path(profile_id): Path<String>,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<Profile>> {
    if let Some(email) = &update.email {
        validate_email(email)?;
    }

    let mut profiles = store.lock();
    let profile = profiles
        .iter_mut()
        .find(|profile| profile.id == profile_id)
        .ok_or_else(not_found)?;

    if let Some(email) = update.email {
        profile.email = email;
    }
    if let Some(full_name) = update.full_name {
        profile.full_name = full_name;
    }
    if let Some(bio) = update.bio {
        profile.bio = bio;
    }
    profile.updated_at = timestamp_now();
    Ok(Json(profile.clone()))
}

#[debug_handler]
async fn delete_profile(
    State(store): State<ProfileStore>,
    Path(profile_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let mut profiles = store.lock();
    let index = profiles
        .iter()
        .position(|profile| profile.id == profile_id)
        .ok_or_else(not_found)?;
    let deleted = profiles.remove(index);
    Ok(Json(json!({
        "message": format!("Profile '{}' deleted successfully", deleted.username)
    })))
}
