//! User-facing messages in the two supported languages.

use serde::Serialize;

pub const DEFAULT_LANGUAGE: &str = "pt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Pt,
    En,
}

impl Language {
    /// Any tag starting with `pt` is Portuguese; everything else falls back to English.
    pub fn from_tag(tag: &str) -> Self {
        if tag.trim().to_ascii_lowercase().starts_with("pt") {
            Language::Pt
        } else {
            Language::En
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::Pt => "pt",
            Language::En => "en",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::from_tag(DEFAULT_LANGUAGE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    MealAnalysisUnavailable,
    ExerciseAnalysisUnavailable,
    ScoringUnavailable,
    RateLimitExceeded,
    JournalReadOnly,
}

pub fn t(message: Message, language: Language) -> &'static str {
    use Language::*;
    use Message::*;

    match (message, language) {
        (MealAnalysisUnavailable, Pt) => {
            "Não foi possível analisar sua refeição agora. Tente novamente em alguns minutos."
        }
        (MealAnalysisUnavailable, En) => {
            "We couldn't analyze your meal right now. Please try again in a few minutes."
        }
        (ExerciseAnalysisUnavailable, Pt) => {
            "Não foi possível analisar seu exercício agora. Tente novamente em alguns minutos."
        }
        (ExerciseAnalysisUnavailable, En) => {
            "We couldn't analyze your exercise right now. Please try again in a few minutes."
        }
        (ScoringUnavailable, Pt) => {
            "Dia fechado, mas a pontuação não está disponível no momento."
        }
        (ScoringUnavailable, En) => "Day closed, but scoring is unavailable right now.",
        (RateLimitExceeded, Pt) => {
            "Você excedeu seu limite de uso de IA. Tente novamente mais tarde."
        }
        (RateLimitExceeded, En) => "You have exceeded your AI usage limit. Please try again later.",
        (JournalReadOnly, Pt) => "Este diário não pode mais ser editado.",
        (JournalReadOnly, En) => "This journal can no longer be edited.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_fallback() {
        assert_eq!(Language::from_tag("pt-BR"), Language::Pt);
        assert_eq!(Language::from_tag("PT"), Language::Pt);
        assert_eq!(Language::from_tag("en"), Language::En);
        assert_eq!(Language::from_tag("es"), Language::En);
        assert_eq!(Language::default(), Language::Pt);
    }

    #[test]
    fn test_messages_are_localized() {
        assert!(t(Message::RateLimitExceeded, Language::Pt).contains("limite de uso de IA"));
        assert!(t(Message::RateLimitExceeded, Language::En).contains("AI usage limit"));
    }
}
