use axum::{Json, Router, debug_handler, routing::get};
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{ApiError, ApiResult, AppState, MessageStore, timestamp_now};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender: String,
    pub recipient: String,
    pub content: String,
    pub timestamp: String,
    pub is_read: bool,
}

#[derive(Debug, Deserialize)]
struct MessageCreate {
    sender: String,
    recipient: String,
    content: String,
}

// Absent fields keep their prior values.
#[derive(Debug, Default, Deserialize)]
struct MessageUpdate {
    content: Option<String>,
    is_read: Option<bool>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/messages/", get(get_all_messages).post(create_message))
        .route(
            "/messages/{message_id}",
            get(get_message).put(update_message).delete(delete_message),
        )
        .route("/messages/sender/{sender}", get(get_messages_by_sender))
        .route("/messages/recipient/{recipient}", get(get_messages_by_recipient))
}

fn not_found() -> ApiError {
    ApiError::NotFound("Message not found".to_owned())
}

#[debug_handler]
async fn get_all_messages(State(store): State<MessageStore>) -> Json<Vec<Message>> {
    Json(store.lock().clone())
}

#[debug_handler]
async fn get_message(
    State(store): State<MessageStore>,
    Path(message_id): Path<String>,
) -> ApiResult<Json<Message>> {
    let messages = store.lock();
    let message = messages
        .iter()
        .find(|message| message.id == message_id)
        .ok_or_else(not_found)?;
    Ok(Json(message.clone()))
}

#[debug_handler]
async fn create_message(
    State(store): State<MessageStore>,
    Json(create): Json<MessageCreate>,
) -> Json<Message> {
    let message = Message {
        id: Uuid::new_v4().to_string(),
        sender: create.sender,
        recipient: create.recipient,
        content: create.content,
        timestamp: timestamp_now(),
        is_read: false,
    };
    store.lock().push(message.clone());
    Json(message)
}

#[debug_handler]
async fn update_message(
    State(store): State<MessageStore>,
    Path(message_id): Path<String>,
    Json(update): Json<MessageUpdate>,
) -> ApiResult<Json<Message>> {
    let mut messages = store.lock();
    let message = messages
        .iter_mut()
        .find(|message| message.id == message_id)
        .ok_or_else(not_found)?;

    if let Some(content) = update.content {
        message.content = content;
    }
    if let Some(is_read) = update.is_read {
        message.is_read = is_read;
    }
    Ok(Json(message.clone()))
}

#[debug_handler]
async fn delete_message(
    State(store): State<MessageStore>,
    Path(message_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let mut messages = store.lock();
    let index = messages
        .iter()
        .position(|message| message.id == message_id)
        .ok_or_else(not_found)?;
    messages.remove(index);
    Ok(Json(json!({"message": "Message deleted successfully"})))
}

#[debug_handler]
async fn get_messages_by_sender(
    State(store): State<MessageStore>,
    Path(sender): Path<String>,
) -> Json<Vec<Message>> {
    let sender = sender.to_lowercase();
    let matches = store
        .lock()
        .iter()
        .filter(|message| message.sender.to_lowercase() == sender)
        .cloned()
        .collect();
    Json(matches)
}

#[debug_handler]
async fn get_messages_by_recipient(
    State(store): State<MessageStore>,
    Path(recipient): Path<String>,
) -> Json<Vec<Message>> {
    let recipient = recipient.to_lowercase();
    let matches = store
        .lock()
        .iter()
        .filter(|message| message.recipient.to_lowercase() == recipient)
        .cloned()
        .collect();
    Json(matches)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use axum::Router;
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::testing::{body_json, send, test_app};

    async fn create(app: &Router, sender: &str, recipient: &str, content: &str) -> Value {
        let body = json!({"sender": sender, "recipient": recipient, "content": content});
        let response = send(app, "POST", "/messages/", Some(body)).await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await
    }

    #[tokio::test]
    async fn created_messages_get_unique_ids_and_start_unread() {
        let app = test_app();

        let mut ids = HashSet::new();
        for n in 0..3 {
            let message = create(&app, "alice", "bob", &format!("hello {n}")).await;
            assert_eq!(message["is_read"], json!(false));
            assert!(ids.insert(message["id"].as_str().unwrap().to_owned()));
        }
        assert_eq!(ids.len(), 3);
    }

    #[tokio::test]
    async fn get_unknown_message_is_not_found() {
        let app = test_app();

        let response = send(&app, "GET", "/messages/no-such-id", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({"detail": "Message not found"}));
    }

    #[tokio::test]
    async fn delete_unknown_message_leaves_store_unchanged() {
        let app = test_app();
        create(&app, "alice", "bob", "hi").await;

        let response = send(&app, "DELETE", "/messages/no-such-id", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&app, "GET", "/messages/", None).await;
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn content_only_update_keeps_is_read() {
        let app = test_app();
        let message = create(&app, "alice", "bob", "hi").await;
        let id = message["id"].as_str().unwrap();

        let response = send(
            &app,
            "PUT",
            &format!("/messages/{id}"),
            Some(json!({"is_read": true})),
        )
        .await;
        assert_eq!(body_json(response).await["is_read"], json!(true));

        let response = send(
            &app,
            "PUT",
            &format!("/messages/{id}"),
            Some(json!({"content": "hi again"})),
        )
        .await;
        let updated = body_json(response).await;
        assert_eq!(updated["content"], "hi again");
        assert_eq!(updated["is_read"], json!(true));
    }

    #[tokio::test]
    async fn delete_removes_the_message() {
        let app = test_app();
        let message = create(&app, "alice", "bob", "hi").await;
        let id = message["id"].as_str().unwrap();

        let response = send(&app, "DELETE", &format!("/messages/{id}"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"message": "Message deleted successfully"})
        );

        let response = send(&app, "GET", &format!("/messages/{id}"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn sender_and_recipient_filters_match_case_insensitively() {
        let app = test_app();
        create(&app, "Alice", "Bob", "one").await;
        create(&app, "carol", "alice", "two").await;

        let response = send(&app, "GET", "/messages/sender/ALICE", None).await;
        let matches = body_json(response).await;
        assert_eq!(matches.as_array().unwrap().len(), 1);
        assert_eq!(matches[0]["content"], "one");

        let response = send(&app, "GET", "/messages/recipient/aLiCe", None).await;
        let matches = body_json(response).await;
        assert_eq!(matches.as_array().unwrap().len(), 1);
        assert_eq!(matches[0]["content"], "two");
    }
}
