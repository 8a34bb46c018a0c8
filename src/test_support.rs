//! Test doubles shared by the unit and router tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::config::Config;
use crate::db::memory::MemoryJournalStore;
use crate::i18n::Language;
use crate::models::journal::{DailyCheckIn, DayTotals};
use crate::models::patient::Patient;
use crate::services::analyzer::Analyzer;
use crate::services::completion::{ChatRequest, ChatTransport, RawResponse, TransportError};
use crate::services::journals::JournalService;
use crate::services::rate_limit::MemoryCounterStore;
use crate::services::retry::{RetryPolicy, MAX_RETRIES};
use crate::services::weekly::{ScoringContext, WeeklyContext};

/// Replays canned responses in order and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Result<RawResponse, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Every call answers 200 with `payload` as the completion content.
    pub fn always(payload: Value, times: usize) -> Arc<Self> {
        Self::new(
            (0..times)
                .map(|_| {
                    Ok(RawResponse {
                        status: 200,
                        body: completion_body(&payload),
                    })
                })
                .collect(),
        )
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn post(&self, _api_key: &str, request: &ChatRequest) -> Result<RawResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("no scripted response left".into())))
    }
}

/// Wraps `content` the way the chat-completion endpoint does.
pub fn completion_body(content: &Value) -> String {
    json!({
        "choices": [{
            "message": {"role": "assistant", "content": content.to_string()}
        }]
    })
    .to_string()
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: MAX_RETRIES,
        base_delay: Duration::from_millis(1),
    }
}

pub fn scoring_context() -> ScoringContext {
    let mut patient = Patient::new(Uuid::new_v4());
    patient.bmr = Some(1800);

    ScoringContext {
        date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
        patient,
        totals: DayTotals {
            calories_consumed: 1500,
            calories_burned: 2100,
            exercise_calories: 300,
        },
        check_in: DailyCheckIn::default(),
        meals: vec![],
        exercises: vec![],
        week: WeeklyContext::default(),
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/nutrilog_test".into(),
        host: "127.0.0.1".into(),
        port: 0,
        frontend_url: "http://localhost:3000".into(),
        jwt_secret: "test-secret".into(),
        app_env: "test".into(),
        llm_provider: "openai".into(),
        openai_api_key: "sk-test".into(),
        openai_model: "gpt-4.1-mini".into(),
        openai_api_url: "http://localhost:9".into(),
        llm_timeout_secs: 1,
        disable_llm_rate_limit: false,
    }
}

/// A patient with a Portuguese-speaking user, an in-memory store and an
/// analyzer wired to `transport`.
pub struct Fixture {
    pub config: Arc<Config>,
    pub store: Arc<MemoryJournalStore>,
    pub service: JournalService,
    pub user: AuthUser,
    pub patient: Patient,
}

impl Fixture {
    pub fn new(transport: Arc<ScriptedTransport>) -> Self {
        Self::with_bmr(transport, Some(1800))
    }

    pub fn with_bmr(transport: Arc<ScriptedTransport>, bmr: Option<i32>) -> Self {
        let config = Arc::new(test_config());
        let store = Arc::new(MemoryJournalStore::new());

        let user = AuthUser {
            id: Uuid::new_v4(),
            language: Language::Pt,
        };
        let mut patient = Patient::new(user.id);
        patient.bmr = bmr;
        patient.daily_calorie_goal = Some(2000);
        patient.steps_goal = Some(8000);
        store.add_patient(patient.clone());

        let analyzer = Analyzer::from_config(&config, Arc::new(MemoryCounterStore::new()), transport)
            .with_retry_policy(fast_retry());
        let service = JournalService::new(store.clone(), Arc::new(analyzer));

        Self {
            config,
            store,
            service,
            user,
            patient,
        }
    }
}
