//! Plan generation driver
//!
//! The orchestrator runs a bounded loop of attempts. Each attempt streams a
//! response, previews it with streaming-mode parses, then runs a final parse
//! and completeness check. Transport errors end the generation immediately;
//! parse failures and shortfalls are retried until the budget runs out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures::StreamExt;
use tracing::{debug, info, warn};

use super::cache::{CacheKey, ResultCache};
use super::handler::{GenerationAttempt, GenerationHandler, GenerationPhase};
use super::transport::{GenerationOptions, TextGenerator};
use super::validation::{validate, Validation};
use crate::config::GenerationSettings;
use crate::plan::{ParseMode, ParseResult, Plan, PlanParser};
use crate::prompt::{build_request, MAX_DURATION_DAYS};
use crate::rate_limit::RateLimiter;
use crate::{Error, Result};

/// Longest goal accepted, in characters
pub const MAX_GOAL_CHARS: usize = 4000;

/// A request for a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRequest {
    /// Goal text
    pub goal: String,
    /// Plan length; the configured default applies when absent
    pub duration_days: Option<u32>,
    /// Rate-limit key for the caller
    pub requester: Option<String>,
}

impl PlanRequest {
    /// Create a request, rejecting empty or oversized goals and durations
    pub fn new(goal: impl Into<String>, duration_days: Option<u32>) -> Result<Self> {
        let goal = goal.into().trim().to_string();
        if goal.is_empty() {
            return Err(Error::InvalidGoal("goal must not be empty".to_string()));
        }
        let chars = goal.chars().count();
        if chars > MAX_GOAL_CHARS {
            return Err(Error::InvalidGoal(format!(
                "goal is {} characters, the limit is {}",
                chars, MAX_GOAL_CHARS
            )));
        }
        match duration_days {
            Some(0) => {
                return Err(Error::InvalidGoal("duration must be at least one day".to_string()));
            }
            Some(days) if days > MAX_DURATION_DAYS => {
                return Err(Error::InvalidGoal(format!(
                    "duration is {} days, the limit is {}",
                    days, MAX_DURATION_DAYS
                )));
            }
            _ => {}
        }
        Ok(Self {
            goal,
            duration_days,
            requester: None,
        })
    }

    /// Set the rate-limit key
    pub fn with_requester(mut self, requester: impl Into<String>) -> Self {
        self.requester = Some(requester.into());
        self
    }
}

/// Clears the in-flight flag when a generation ends
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::GenerationInProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives plan generation for one session
pub struct Orchestrator {
    generator: Arc<dyn TextGenerator>,
    cache: Arc<ResultCache>,
    settings: GenerationSettings,
    options: GenerationOptions,
    parser: PlanParser,
    streaming: bool,
    rate_limiter: Option<Arc<RateLimiter>>,
    in_flight: AtomicBool,
    phase: Mutex<GenerationPhase>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("generator", &self.generator.name())
            .field("settings", &self.settings)
            .field("streaming", &self.streaming)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Create an orchestrator with its own cache
    pub fn new(generator: Arc<dyn TextGenerator>, settings: GenerationSettings) -> Self {
        let cache = Arc::new(ResultCache::new(settings.cache_capacity));
        Self {
            generator,
            cache,
            settings,
            options: GenerationOptions::default(),
            parser: PlanParser::new().with_dedup_threshold(settings.dedup_threshold),
            streaming: true,
            rate_limiter: None,
            in_flight: AtomicBool::new(false),
            phase: Mutex::new(GenerationPhase::Idle),
        }
    }

    /// Share a process-wide cache
    pub fn with_cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Set the sampling options sent with every request
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Limit requests per requester
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Use single-shot completion instead of streaming
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// The cache this orchestrator writes to
    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Current phase
    pub fn phase(&self) -> GenerationPhase {
        *self.phase.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn set_phase<H: GenerationHandler>(&self, phase: GenerationPhase, handler: &mut H) {
        *self.phase.lock().unwrap_or_else(|p| p.into_inner()) = phase;
        debug!(phase = %phase, "Generation phase changed");
        handler.on_phase(phase);
    }

    /// Generate a validated plan
    ///
    /// Fails with `GenerationInProgress` if another generation on this
    /// orchestrator has not finished.
    pub async fn generate<H: GenerationHandler>(
        &self,
        request: &PlanRequest,
        handler: &mut H,
    ) -> Result<Plan> {
        let _guard = InFlightGuard::acquire(&self.in_flight)?;

        if let (Some(limiter), Some(key)) = (&self.rate_limiter, &request.requester) {
            limiter
                .check_and_record(key)
                .map_err(|retry_after| Error::RateLimited {
                    key: key.clone(),
                    retry_after,
                })?;
        }

        let result = self.run_attempts(request, handler).await;
        match &result {
            Ok(_) => self.set_phase(GenerationPhase::Done, handler),
            Err(e) => {
                warn!(goal = %request.goal, error = %e, "Plan generation failed");
                self.set_phase(GenerationPhase::Failed, handler);
            }
        }
        self.set_phase(GenerationPhase::Idle, handler);
        result
    }

    async fn run_attempts<H: GenerationHandler>(
        &self,
        request: &PlanRequest,
        handler: &mut H,
    ) -> Result<Plan> {
        let duration_days = request
            .duration_days
            .unwrap_or(self.settings.default_duration_days)
            .clamp(1, MAX_DURATION_DAYS);
        let expected = duration_days as usize;
        let max_attempts = self.settings.max_retries.saturating_add(1);
        let mut last_found = 0;

        for attempt_number in 1..=max_attempts {
            let attempt = GenerationAttempt {
                goal: request.goal.clone(),
                duration_days,
                attempt_number,
                expected_task_count: expected,
            };
            info!(
                goal = %attempt.goal,
                duration_days,
                attempt = attempt_number,
                max_attempts,
                "Starting generation attempt"
            );
            handler.on_attempt_start(&attempt);
            self.set_phase(GenerationPhase::Streaming { attempt: attempt_number }, handler);

            let text = self.receive(&attempt, handler).await?;

            self.set_phase(GenerationPhase::Validating { attempt: attempt_number }, handler);
            let key = CacheKey::new(&text, &attempt.goal, Some(duration_days), ParseMode::Final);
            let parsed = match self.cache.get(&key) {
                Some(plan) => {
                    debug!("Final parse served from cache");
                    ParseResult::Complete(plan)
                }
                None => self
                    .parser
                    .parse(&text, &attempt.goal, Some(duration_days), ParseMode::Final),
            };

            let verdict = validate(parsed, expected, self.settings.acceptance_ratio);
            if let Validation::Accepted { plan, found } = verdict {
                info!(
                    found,
                    expected,
                    attempt = attempt_number,
                    months = plan.months.len(),
                    "Plan accepted"
                );
                self.cache.insert(key, plan.clone());
                handler.on_complete(&plan, attempt_number);
                return Ok(plan);
            }

            last_found = verdict.found();
            if let Some(reason) = verdict.to_error() {
                if !reason.is_retryable() {
                    return Err(reason);
                }
                warn!(
                    attempt = attempt_number,
                    max_attempts,
                    reason = %reason,
                    "Generation attempt rejected"
                );
            }
            handler.on_shortfall(&attempt, last_found);
            if attempt_number < max_attempts {
                self.set_phase(GenerationPhase::Shortfall { attempt: attempt_number }, handler);
            }
        }

        Err(Error::RetriesExhausted {
            attempts: max_attempts,
            found: last_found,
            expected,
        })
    }

    /// Collect one full response, previewing it as it arrives
    async fn receive<H: GenerationHandler>(
        &self,
        attempt: &GenerationAttempt,
        handler: &mut H,
    ) -> Result<String> {
        let request = build_request(&attempt.goal, Some(attempt.duration_days), self.options);

        if !self.streaming {
            let text = self.generator.complete(&request).await?;
            handler.on_chunk(&text);
            return Ok(text);
        }

        let mut stream = self.generator.open_stream(&request).await?;
        let mut accumulated = String::new();
        let mut chunks = 0usize;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            chunks += 1;
            accumulated.push_str(&chunk);
            handler.on_chunk(&chunk);

            let preview = self.parser.parse(
                &accumulated,
                &attempt.goal,
                Some(attempt.duration_days),
                ParseMode::Streaming,
            );
            if let Some(plan) = preview.plan() {
                handler.on_partial(plan);
            }
        }

        debug!(
            generator = self.generator.name(),
            chunks,
            bytes = accumulated.len(),
            "Stream finished"
        );
        Ok(accumulated)
    }
}
