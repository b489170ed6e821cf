use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tracing::Instrument;
use uuid::Uuid;

use crate::chat::QueryRequest;
use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn chat_query(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<QueryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("chat_query", %request_id);

    async move {
        let outcome = state.chat.answer(payload).await?;
        Ok(Json(json!({
            "success": true,
            "answer": outcome.answer,
            "sources": outcome.sources,
        })))
    }
    .instrument(span)
    .await
}
