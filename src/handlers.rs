use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use futures::future::abortable;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::error::{ApiError, ApiResult, TranslationError};
use crate::history::{NewTranslation, TranslationRecord};
use crate::languages::{LanguageCode, LANGUAGES};
use crate::state::AppState;
use crate::translate::TranslationPair;

fn default_source() -> LanguageCode {
    LanguageCode::DEFAULT_SOURCE
}

fn default_target() -> LanguageCode {
    LanguageCode::DEFAULT_TARGET
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateBody {
    pub text: String,
    #[serde(default = "default_source")]
    pub source_language: LanguageCode,
    #[serde(default = "default_target")]
    pub target_language: LanguageCode,
    pub client_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateResponse {
    pub translated_text: String,
    /// `None` when the translation could not be saved to history
    pub record: Option<TranslationRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub version: u64,
    pub translations: Vec<TranslationRecord>,
}

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "history_entries": state.history.snapshot().await.len(),
        "history_capacity": state.config.history_config.max_entries,
        "pending_translations": state.pending_translations.len(),
    }))
}

pub async fn list_languages() -> Json<Value> {
    Json(json!({
        "languages": LANGUAGES,
        "defaultSource": LanguageCode::DEFAULT_SOURCE,
        "defaultTarget": LanguageCode::DEFAULT_TARGET,
    }))
}

/// Translate and record the result in history
pub async fn translate(
    State(state): State<AppState>,
    Json(body): Json<TranslateBody>,
) -> ApiResult<Json<TranslateResponse>> {
    if body.text.is_empty() {
        return Err(TranslationError::EmptyInput.into());
    }

    let (task, handle) = abortable(state.translator.translate(
        &body.text,
        body.source_language,
        body.target_language,
    ));
    let _guard = body
        .client_id
        .as_deref()
        .map(|client_id| state.pending_translations.register(client_id, handle));

    let translated_text = match task.await {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            error!("Translation error: {}", e);
            return Err(e.into());
        }
        Err(_) => {
            info!("Translation aborted before completion");
            return Err(TranslationError::Cancelled.into());
        }
    };

    let record = match state
        .history
        .append(NewTranslation {
            source_language: body.source_language,
            target_language: body.target_language,
            original_text: body.text,
            translated_text: translated_text.clone(),
        })
        .await
    {
        Ok(record) => Some(record),
        Err(e) => {
            warn!("Translation not saved to history: {}", e);
            None
        }
    };

    Ok(Json(TranslateResponse {
        translated_text,
        record,
    }))
}

pub async fn cancel_translation(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> Json<Value> {
    let cancelled = state.pending_translations.cancel(&client_id);
    Json(json!({ "cancelled": cancelled }))
}

pub async fn swap_languages(Json(pair): Json<TranslationPair>) -> Json<TranslationPair> {
    Json(pair.swapped())
}

pub async fn share_translation(Json(pair): Json<TranslationPair>) -> ApiResult<Json<Value>> {
    let message = pair
        .share_message()
        .ok_or_else(|| ApiError::BadRequest("No translation to share".to_string()))?;
    Ok(Json(json!({ "message": message })))
}

/// Reload history from storage; a failed reload falls back to what is in memory
pub async fn get_history(State(state): State<AppState>) -> Json<HistoryResponse> {
    let translations = match state.history.load_all().await {
        Ok(records) => records,
        Err(e) => {
            error!("Error loading translations: {}", e);
            state.history.snapshot().await
        }
    };

    Json(HistoryResponse {
        version: state.history.version().await,
        translations,
    })
}

pub async fn delete_translation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.history.remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear_history(State(state): State<AppState>) -> ApiResult<StatusCode> {
    state.history.clear().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn share_history_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let record = state
        .history
        .get(&id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("No translation with id {}", id)))?;
    Ok(Json(json!({ "message": record.share_message() })))
}
