use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported language, serialized as its two-letter code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    En,
    Es,
    Fr,
    De,
    It,
    Pt,
    Ru,
    Ja,
    Ar,
    He,
}

/// Entry of the language picker table
#[derive(Debug, Clone, Serialize)]
pub struct Language {
    pub code: LanguageCode,
    pub name: &'static str,
}

/// The one table of supported languages, in picker order
pub const LANGUAGES: [Language; 10] = [
    Language { code: LanguageCode::En, name: "English" },
    Language { code: LanguageCode::Es, name: "Spanish" },
    Language { code: LanguageCode::Fr, name: "French" },
    Language { code: LanguageCode::De, name: "German" },
    Language { code: LanguageCode::It, name: "Italian" },
    Language { code: LanguageCode::Pt, name: "Portuguese" },
    Language { code: LanguageCode::Ru, name: "Russian" },
    Language { code: LanguageCode::Ja, name: "Japanese" },
    Language { code: LanguageCode::Ar, name: "Arabic" },
    Language { code: LanguageCode::He, name: "Hebrew" },
];

impl LanguageCode {
    pub const DEFAULT_SOURCE: LanguageCode = LanguageCode::En;
    pub const DEFAULT_TARGET: LanguageCode = LanguageCode::Es;

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageCode::En => "en",
            LanguageCode::Es => "es",
            LanguageCode::Fr => "fr",
            LanguageCode::De => "de",
            LanguageCode::It => "it",
            LanguageCode::Pt => "pt",
            LanguageCode::Ru => "ru",
            LanguageCode::Ja => "ja",
            LanguageCode::Ar => "ar",
            LanguageCode::He => "he",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        LANGUAGES
            .iter()
            .find(|lang| lang.code.as_str() == code)
            .map(|lang| lang.code)
    }

    pub fn display_name(&self) -> &'static str {
        LANGUAGES
            .iter()
            .find(|lang| lang.code == *self)
            .map(|lang| lang.name)
            .unwrap_or_else(|| self.as_str())
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display name for a raw code, or the code itself when it is not supported
pub fn language_name(code: &str) -> &str {
    match LanguageCode::from_code(code) {
        Some(lang) => lang.display_name(),
        None => code,
    }
}
