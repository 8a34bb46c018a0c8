//! One LLM-backed analysis, end to end.
//!
//! quota check -> prompt -> completion (with retry) -> normalize. Every
//! failure ends as an [`AnalysisError`] carrying a message that can be shown
//! to the user as-is; the detail goes to the log.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::i18n::{t, Language, Message};
use crate::services::completion::{ChatTransport, CompletionClient, CompletionError};
use crate::services::kind::AnalysisKind;
use crate::services::normalize::{normalize, AnalysisResult, NormalizeError};
use crate::services::prompt::{AnalysisInput, PromptComposer};
use crate::services::rate_limit::{CounterStore, LlmRateLimiter};
use crate::services::retry::{retry_transient, RetryPolicy};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("{message}")]
    RateLimited { message: String },
    #[error("{message}")]
    Unavailable { message: String },
}

impl AnalysisError {
    pub fn message(&self) -> &str {
        match self {
            AnalysisError::RateLimited { message } | AnalysisError::Unavailable { message } => {
                message
            }
        }
    }
}

/// Who asked, about which record, in which language.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisContext {
    pub user_id: Uuid,
    pub record_id: Uuid,
    pub language: Language,
}

pub struct Analyzer {
    limiter: LlmRateLimiter,
    client: CompletionClient,
    composer: PromptComposer,
    retry: RetryPolicy,
}

impl Analyzer {
    pub fn new(limiter: LlmRateLimiter, client: CompletionClient, composer: PromptComposer) -> Self {
        Self {
            limiter,
            client,
            composer,
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_config(
        config: &Config,
        counters: Arc<dyn CounterStore>,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self::new(
            LlmRateLimiter::new(counters, config.disable_llm_rate_limit),
            CompletionClient::from_config(config, transport),
            PromptComposer::new(config.openai_model.clone()),
        )
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn run(
        &self,
        input: &AnalysisInput,
        ctx: &AnalysisContext,
    ) -> Result<AnalysisResult, AnalysisError> {
        let kind = input.kind();
        let label = kind.label();

        if let Err(exceeded) = self.limiter.check(ctx.user_id, Utc::now()).await {
            tracing::warn!(
                limit = exceeded.window.as_str(),
                key = %exceeded.key,
                user_id = %ctx.user_id,
                record = kind.record_field(),
                record_id = %ctx.record_id,
                "{} rate limit exceeded",
                label
            );
            return Err(AnalysisError::RateLimited {
                message: t(Message::RateLimitExceeded, ctx.language).to_string(),
            });
        }

        let request = self.composer.build(input, ctx.language);

        let raw = match retry_transient(self.retry, label, || self.client.complete(&request)).await {
            Ok(raw) => raw,
            Err(err) => {
                let signature = match err {
                    CompletionError::Transient(_) => "transient failure",
                    CompletionError::Permanent(_) => "failure",
                };
                tracing::error!(
                    user_id = %ctx.user_id,
                    record = kind.record_field(),
                    record_id = %ctx.record_id,
                    error = %err,
                    "{} {}",
                    label,
                    signature
                );
                return Err(unavailable(kind, ctx.language));
            }
        };

        normalize(kind, &raw).map_err(|err| {
            match &err {
                NormalizeError::MissingKeys(keys) => tracing::warn!(
                    missing_keys = %keys.join(","),
                    user_id = %ctx.user_id,
                    record = kind.record_field(),
                    record_id = %ctx.record_id,
                    "{} invalid response",
                    label
                ),
                NormalizeError::OutOfRange(field) => tracing::warn!(
                    field = *field,
                    user_id = %ctx.user_id,
                    record = kind.record_field(),
                    record_id = %ctx.record_id,
                    "{} invalid response",
                    label
                ),
            }
            unavailable(kind, ctx.language)
        })
    }
}

fn unavailable(kind: AnalysisKind, language: Language) -> AnalysisError {
    AnalysisError::Unavailable {
        message: t(kind.unavailable_message(), language).to_string(),
    }
}
