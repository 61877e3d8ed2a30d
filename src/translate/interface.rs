use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TranslationError;
use crate::languages::{language_name, LanguageCode};

/// Remote translation backend
#[async_trait]
pub trait TranslatorInterface: Send + Sync {
    /// Translate `text` from `source` to `target`.
    ///
    /// Performs a single request with no retries and never touches history.
    async fn translate(
        &self,
        text: &str,
        source: LanguageCode,
        target: LanguageCode,
    ) -> Result<String, TranslationError>;
}

/// The text pair currently shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationPair {
    pub source_language: LanguageCode,
    pub target_language: LanguageCode,
    #[serde(default)]
    pub original_text: String,
    #[serde(default)]
    pub translated_text: String,
}

impl TranslationPair {
    /// Swap languages and texts so the translation becomes the new input
    pub fn swapped(self) -> Self {
        Self {
            source_language: self.target_language,
            target_language: self.source_language,
            original_text: self.translated_text,
            translated_text: self.original_text,
        }
    }

    /// Text offered to the platform share sheet, `None` when nothing was translated
    pub fn share_message(&self) -> Option<String> {
        if self.translated_text.is_empty() {
            return None;
        }
        Some(share_message(
            self.source_language.as_str(),
            self.target_language.as_str(),
            &self.original_text,
            &self.translated_text,
        ))
    }
}

pub fn share_message(source: &str, target: &str, original: &str, translated: &str) -> String {
    format!(
        "Source ({}): {}\nTranslation ({}): {}",
        language_name(source),
        original,
        language_name(target),
        translated
    )
}
