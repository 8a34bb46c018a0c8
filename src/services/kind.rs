use crate::i18n::Message;

/// What an LLM call is for. Everything that differs between the three
/// flows hangs off this enum; the completion client and retry loop never
/// look at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisKind {
    Meal,
    Exercise,
    DailyScore,
}

impl AnalysisKind {
    pub fn label(self) -> &'static str {
        match self {
            AnalysisKind::Meal => "Meal analysis",
            AnalysisKind::Exercise => "Exercise analysis",
            AnalysisKind::DailyScore => "Daily scoring",
        }
    }

    /// Structured extraction runs colder than the subjective scoring task.
    pub fn temperature(self) -> f32 {
        match self {
            AnalysisKind::Meal | AnalysisKind::Exercise => 0.2,
            AnalysisKind::DailyScore => 0.3,
        }
    }

    pub fn required_keys(self) -> &'static [&'static str] {
        match self {
            AnalysisKind::Meal => &["p", "c", "f", "cal", "gw", "cmt", "feel"],
            AnalysisKind::Exercise => &["d", "cal", "n", "sd"],
            AnalysisKind::DailyScore => &["s", "fp", "fi"],
        }
    }

    /// Name of the identifier field used in log lines.
    pub fn record_field(self) -> &'static str {
        match self {
            AnalysisKind::Meal => "meal_id",
            AnalysisKind::Exercise => "exercise_id",
            AnalysisKind::DailyScore => "journal_id",
        }
    }

    pub fn unavailable_message(self) -> Message {
        match self {
            AnalysisKind::Meal => Message::MealAnalysisUnavailable,
            AnalysisKind::Exercise => Message::ExerciseAnalysisUnavailable,
            AnalysisKind::DailyScore => Message::ScoringUnavailable,
        }
    }
}
