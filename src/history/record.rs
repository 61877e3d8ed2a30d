use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::languages::LanguageCode;
use crate::translate::interface::share_message;

/// One stored translation. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRecord {
    pub id: String,
    pub timestamp: String,
    pub source_language: LanguageCode,
    pub target_language: LanguageCode,
    pub original_text: String,
    pub translated_text: String,
}

/// A translation waiting to be appended to history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTranslation {
    pub source_language: LanguageCode,
    pub target_language: LanguageCode,
    pub original_text: String,
    pub translated_text: String,
}

impl TranslationRecord {
    pub fn new(id: String, created_at: DateTime<Utc>, translation: NewTranslation) -> Self {
        Self {
            id,
            timestamp: created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            source_language: translation.source_language,
            target_language: translation.target_language,
            original_text: translation.original_text,
            translated_text: translation.translated_text,
        }
    }

    pub fn share_message(&self) -> String {
        share_message(
            self.source_language.as_str(),
            self.target_language.as_str(),
            &self.original_text,
            &self.translated_text,
        )
    }
}
