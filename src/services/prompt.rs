//! Builds the chat-completion request for each analysis kind.
//!
//! Pure: the same input and language always produce the same request.

use std::fmt::Write as _;

use crate::i18n::Language;
use crate::models::meal::MealType;
use crate::services::completion::{ChatMessage, ChatRequest};
use crate::services::kind::AnalysisKind;
use crate::services::weekly::ScoringContext;

/// Rubric embedded verbatim in every scoring prompt.
pub const SCORING_CRITERIA: &str = "\
Balance caloric deficit with nutritional adequacy, exercise appropriateness, and sustainable habits.

Scoring criteria:
SCORE 5
- Caloric balance: Within -200 and +100 kcal of daily goal (considering BMR + exercise)
- Protein: Within adequate range for patient profile
- 2 meals with fruit
- 2 meals with vegetable servings
- Exercise: Present today with appropriate intensity for patient profile
- Meal quality: All meals nutritionally balanced (evaluate from descriptions and macros)
- Sleep: Excellent quality (from user input)
- Hydration: Excellent (from user input, meeting daily goal)
- Steps: Meeting daily goal (from user input)
- No candy

SCORE 4
- Caloric balance: Within -300 and +150 of goal
- 1 meal with fruit
- 2 meals with vegetable servings
- Exercise present but may be slightly below target intensity/duration
- Occasional processed foods detectable
- Sleep: Good quality
- Hydration: Good (close to daily goal)
- Steps: Close to daily goal
- No candy

SCORE 3
- Caloric balance: Within -500 and +300 kcal of goal
- 1 meal with fruit
- 1 meal with vegetable servings
- Exercise missing or intensity/duration inappropriate for patient profile
- Multiple processed food meals detectable
- Sleep: Poor quality
- Hydration: Poor (significantly below daily goal)
- Steps: Below daily goal
- Little candy allowed

SCORE 2
- Caloric balance: >500 kcal deficit OR >300 kcal surplus
- Severe macro imbalances (e.g., protein too low, excessive carbs/fats)
- <60% of fruit/vegetable servings
- No exercise OR excessive exercise intensity
- Excessive processed foods
- Sleep: Poor quality
- Hydration: Poor (well below daily goal)
- Steps: Well below daily goal

SCORE 1
- Severe caloric restriction (<1200 kcal for women, <1500 for men) OR large surplus (>800 kcal)
- Critical macro deficiencies
- Minimal to no fruits/vegetables
- No exercise OR dangerous exercise intensity
- Sleep: Poor quality
- Hydration: Very poor (minimal water intake)
- Steps: Minimal or no steps

EXERCISE INTENSITY GUARDRAILS:
- Obese patients (BMI >30): Prefer light-moderate intensity. High intensity exercises should reduce score.
- Normal/overweight: Moderate to high intensity acceptable based on fitness level.
- If exercise intensity too high for patient profile -> reduce score by 1 point, warn in feedback.

QUALITY OF LIFE PRIORITIES:
1. Prevent extreme caloric restriction that may cause muscle loss, fatigue, or metabolic issues
2. Ensure adequate protein to preserve muscle during weight loss
3. Maintain variety and micronutrient intake (fruits/vegetables)
4. Promote sustainable exercise habits appropriate to patient condition
5. Avoid over-restriction that leads to binge eating or unsustainable patterns
6. Encourage quality sleep and adequate hydration
7. Promote daily movement (steps) appropriate to patient condition

Note: Weekly context variables (alcohol, red meat, processed foods, etc.) should be considered as
supporting information but not primary scoring factors. Evaluate daily performance primarily from
today's data.";

/// What gets analyzed.
#[derive(Debug, Clone)]
pub enum AnalysisInput {
    Meal {
        description: String,
        meal_type: MealType,
    },
    Exercise {
        description: String,
    },
    DailyScore(Box<ScoringContext>),
}

impl AnalysisInput {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            AnalysisInput::Meal { .. } => AnalysisKind::Meal,
            AnalysisInput::Exercise { .. } => AnalysisKind::Exercise,
            AnalysisInput::DailyScore(_) => AnalysisKind::DailyScore,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PromptComposer {
    model: String,
}

impl PromptComposer {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }

    pub fn build(&self, input: &AnalysisInput, language: Language) -> ChatRequest {
        let kind = input.kind();

        let user = match input {
            AnalysisInput::Meal {
                description,
                meal_type,
            } => meal_prompt(description, *meal_type, language),
            AnalysisInput::Exercise { description } => exercise_prompt(description, language),
            AnalysisInput::DailyScore(ctx) => scoring_prompt(ctx, language),
        };

        ChatRequest {
            model: self.model.clone(),
            temperature: kind.temperature(),
            messages: vec![
                ChatMessage::system(system_prompt(kind, language)),
                ChatMessage::user(user),
            ],
        }
    }
}

fn system_prompt(kind: AnalysisKind, language: Language) -> &'static str {
    match (kind, language) {
        (AnalysisKind::Meal, Language::Pt) => {
            "Você é um nutricionista. Responda apenas com JSON válido, sem markdown."
        }
        (AnalysisKind::Meal, Language::En) => {
            "You are a nutrition assistant. Return only valid JSON, without markdown."
        }
        (AnalysisKind::Exercise, Language::Pt) => {
            "Você é um assistente de exercícios. Responda apenas com JSON válido, sem markdown."
        }
        (AnalysisKind::Exercise, Language::En) => {
            "You are an exercise assistant. Return only valid JSON, without markdown."
        }
        (AnalysisKind::DailyScore, Language::Pt) => {
            "Você é um nutricionista assistente. Avalie o diário e retorne apenas JSON válido, sem markdown."
        }
        (AnalysisKind::DailyScore, Language::En) => {
            "You are a nutrition assistant. Evaluate the daily journal and return only valid JSON, without markdown."
        }
    }
}

fn meal_prompt(description: &str, meal_type: MealType, language: Language) -> String {
    let lang = language.code();
    format!(
        r#"Analyze meal description and return nutrition data.

Lang: {lang}
Type: {meal_type}
Description: "{description}"

Return JSON:
- p: proteins (g)
- c: carbs (g)
- f: fats (g)
- cal: calories (kcal)
- gw: weight (g)
- cmt: brief comment ({lang}, 2-3 sentences)
- feel: 1 if nutritionally good/balanced, 0 if not ideal
"#,
        meal_type = meal_type.as_str(),
    )
}

fn exercise_prompt(description: &str, language: Language) -> String {
    let lang = language.code();
    format!(
        r#"Analyze exercise description and return metrics.

Lang: {lang}
Description: "{description}"

Return JSON:
- d: duration (minutes)
- cal: calories burned (kcal)
- n: NEAT (kcal, 0 if not applicable)
- sd: structured description ({lang}, concise)
"#
    )
}

fn or_unknown<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "?".to_string())
}

fn scoring_prompt(ctx: &ScoringContext, language: Language) -> String {
    let lang = language.code();
    let patient = &ctx.patient;
    let totals = &ctx.totals;
    let check_in = &ctx.check_in;
    let week = &ctx.week;
    let n = week.days;

    let mut meals = String::new();
    for m in &ctx.meals {
        let _ = writeln!(
            meals,
            "{}|{}|{}|{}|{}|{}",
            m.meal_type.as_str(),
            or_unknown(m.calories),
            or_unknown(m.proteins),
            or_unknown(m.carbs),
            or_unknown(m.fats),
            m.description
        );
    }
    let mut exercises = String::new();
    for e in &ctx.exercises {
        let _ = writeln!(
            exercises,
            "{}|{}|{}",
            or_unknown(e.duration),
            or_unknown(e.calories),
            e.display_description()
        );
    }
    let meals = if meals.is_empty() { "(none)\n".to_string() } else { meals };
    let exercises = if exercises.is_empty() { "(none)\n".to_string() } else { exercises };

    format!(
        r#"Evaluate daily journal and calculate score (1-5).

Lang: {lang}
Date: {date}

Patient: goal={goal}kcal, BMR={bmr}kcal
Daily: consumed={consumed}kcal, burned={burned}kcal (BMR {bmr}+ex {exercise}), balance={balance}kcal
Metrics: feeling={feeling}, sleep={sleep}, hydration={hydration} (goal {hydration_goal}ml), steps={steps} (goal {steps_goal})
Note: {note}

Meals ({meal_count}):
{meals}
Exercises ({exercise_count}):
{exercises}
Week (last {n} days, {entries} days with entries):
- Alcohol: {alcohol}/{n}, Red meat: {red_meat}/{n}, Candy: {candy}/{n}, Soda: {soda}/{n}
- Protein goal: {protein}/{n}, Exercise: {exercise_days}/{n}, Steps goal: {steps_days}/{n}
- Score <=3: {score_low}/{n}, Processed: {processed}/{n}
- Quality sleep: {sleep_days}/{n}, Hydration: {hydration_days}/{n}, Feeling bad: {feeling_bad}/{n}

Criteria:
{criteria}

Calculate score. Consider balance, macros, meal quality, exercise appropriateness, quality of life.

Return JSON:
{{
  "s": <1-5>,
  "fp": "<what went well, 2-3 sentences, {lang}>",
  "fi": "<what to improve, 2-3 sentences, {lang}>"
}}
"#,
        date = ctx.date,
        goal = or_unknown(patient.daily_calorie_goal),
        bmr = or_unknown(patient.bmr),
        consumed = totals.calories_consumed,
        burned = totals.calories_burned,
        exercise = totals.exercise_calories,
        balance = totals.balance(),
        feeling = or_unknown(check_in.feeling_today.map(|f| f.as_str())),
        sleep = or_unknown(check_in.sleep_quality.map(|q| q.as_str())),
        hydration = or_unknown(check_in.hydration_quality.map(|q| q.as_str())),
        hydration_goal = or_unknown(patient.hydration_goal),
        steps = or_unknown(check_in.steps_count),
        steps_goal = or_unknown(patient.steps_goal),
        note = check_in.daily_note.as_deref().unwrap_or(""),
        meal_count = ctx.meals.len(),
        exercise_count = ctx.exercises.len(),
        entries = week.days_with_entries,
        alcohol = week.days_with_alcohol,
        red_meat = week.days_with_red_meat,
        candy = week.days_with_candy,
        soda = week.days_with_soda,
        protein = week.days_meeting_protein,
        exercise_days = week.days_with_exercise,
        steps_days = week.days_meeting_steps,
        score_low = week.days_score_low,
        processed = week.days_with_processed,
        sleep_days = week.days_quality_sleep,
        hydration_days = week.days_adequate_hydration,
        feeling_bad = week.days_feeling_bad,
        criteria = SCORING_CRITERIA,
    )
}
