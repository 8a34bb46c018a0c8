//! Coerces and range-checks the JSON the model returned.
//!
//! Acceptance is all-or-nothing: one missing key or one value outside its
//! range rejects the whole payload.

use serde_json::Value;
use std::ops::RangeInclusive;

use crate::services::kind::AnalysisKind;

const MAX_STRUCTURED_DESCRIPTION_CHARS: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealAnalysis {
    pub proteins: i32,
    pub carbs: i32,
    pub fats: i32,
    pub calories: i32,
    pub gram_weight: i32,
    pub comment: String,
    /// 1 when the meal is nutritionally balanced, 0 otherwise.
    pub feeling: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseAnalysis {
    pub duration: i32,
    pub calories: i32,
    pub neat: i32,
    pub structured_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyScore {
    pub score: i32,
    pub feedback_positive: String,
    pub feedback_improvement: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisResult {
    Meal(MealAnalysis),
    Exercise(ExerciseAnalysis),
    DailyScore(DailyScore),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("missing keys: {}", .0.join(","))]
    MissingKeys(Vec<&'static str>),
    #[error("value out of range: {0}")]
    OutOfRange(&'static str),
}

pub fn normalize(kind: AnalysisKind, raw: &Value) -> Result<AnalysisResult, NormalizeError> {
    let missing: Vec<&'static str> = kind
        .required_keys()
        .iter()
        .copied()
        .filter(|key| raw.get(key).is_none())
        .collect();

    if !missing.is_empty() {
        return Err(NormalizeError::MissingKeys(missing));
    }

    let payload = Payload(raw);

    match kind {
        AnalysisKind::Meal => Ok(AnalysisResult::Meal(MealAnalysis {
            proteins: payload.int_in("p", 0..=10_000)?,
            carbs: payload.int_in("c", 0..=10_000)?,
            fats: payload.int_in("f", 0..=10_000)?,
            calories: payload.int_in("cal", 1..=49_999)?,
            gram_weight: payload.int_in("gw", 1..=99_999)?,
            comment: payload.text("cmt", usize::MAX)?,
            feeling: payload.int_in("feel", 0..=1)?,
        })),
        AnalysisKind::Exercise => Ok(AnalysisResult::Exercise(ExerciseAnalysis {
            duration: payload.int_in("d", 1..=1_439)?,
            calories: payload.int_in("cal", 0..=9_999)?,
            neat: payload.int_in("n", 0..=4_999)?,
            structured_description: payload.text("sd", MAX_STRUCTURED_DESCRIPTION_CHARS)?,
        })),
        AnalysisKind::DailyScore => Ok(AnalysisResult::DailyScore(DailyScore {
            score: payload.int_in("s", 1..=5)?,
            feedback_positive: payload.text("fp", usize::MAX)?,
            feedback_improvement: payload.text("fi", usize::MAX)?,
        })),
    }
}

struct Payload<'a>(&'a Value);

impl Payload<'_> {
    fn int_in(&self, key: &'static str, range: RangeInclusive<i64>) -> Result<i32, NormalizeError> {
        let value = coerce_int(&self.0[key]);
        if range.contains(&value) {
            i32::try_from(value).map_err(|_| NormalizeError::OutOfRange(key))
        } else {
            Err(NormalizeError::OutOfRange(key))
        }
    }

    /// Non-blank after trimming, at most `max_chars` characters.
    fn text(&self, key: &'static str, max_chars: usize) -> Result<String, NormalizeError> {
        let value = coerce_text(&self.0[key]);
        if value.is_empty() || value.chars().count() > max_chars {
            Err(NormalizeError::OutOfRange(key))
        } else {
            Ok(value)
        }
    }
}

/// Integer coercion: floats truncate toward zero, strings use their leading
/// integer ("35g" is 35), anything else is 0.
pub fn coerce_int(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => leading_int(s.trim()),
        _ => 0,
    }
}

fn leading_int(s: &str) -> i64 {
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };

    let numeric: String = digits.chars().take_while(|c| c.is_ascii_digit()).collect();
    numeric.parse::<i64>().map(|n| sign * n).unwrap_or(0)
}

pub fn coerce_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}
