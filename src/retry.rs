// ABOUTME: Retry plan for one logical generation request, expressed as a state machine
// ABOUTME: transition() is pure: (attempt, model, response) -> next state

use crate::backoff;
use crate::errors::DeckError;
use crate::gemini::candidate_text;
use crate::models::{sanitize, Capability, ModelName};
use crate::transport::UpstreamResponse;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

/// Returned by the API when the selected model cannot produce structured output.
static JSON_MODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)JSON mode is not enabled").expect("static regex"));

/// Upstream bodies quoted in errors are cut to this many characters.
const MAX_ERROR_BODY_CHARS: usize = 800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Rate limited or unavailable; retry the next plan entry after a delay.
    Transient,
    /// The model cannot do JSON mode; retry immediately on the primary text model.
    Structural,
    Terminal,
}

pub fn classify(status: u16, body: &str) -> FailureClass {
    match status {
        429 | 503 => FailureClass::Transient,
        400 if JSON_MODE_REGEX.is_match(body) => FailureClass::Structural,
        _ => FailureClass::Terminal,
    }
}

#[derive(Debug)]
pub enum PlanState {
    /// Attempt `attempt` is ready to be issued against `model`.
    Pending { attempt: usize, model: ModelName },
    /// Wait `delay`, then issue attempt `attempt` against `model`.
    FailedTransient {
        attempt: usize,
        model: ModelName,
        delay: Duration,
    },
    Succeeded(String),
    FailedTerminal(DeckError),
}

/// The ordered models one generation request may try.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPlan {
    models: Vec<ModelName>,
}

impl RetryPlan {
    /// Requested model twice, then the fixed fallback.
    pub fn new(requested: Option<&str>) -> Self {
        let model = sanitize(requested, Capability::Text);
        Self {
            models: vec![model.clone(), model, ModelName::fallback_text()],
        }
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn models(&self) -> &[ModelName] {
        &self.models
    }

    pub fn start(&self) -> PlanState {
        match self.models.first() {
            Some(model) => PlanState::Pending {
                attempt: 0,
                model: model.clone(),
            },
            None => PlanState::FailedTerminal(DeckError::ConfigError(
                "retry plan has no models".to_string(),
            )),
        }
    }

    /// Decide what happens after attempt `attempt` on `model` returned `response`.
    pub fn transition(
        &self,
        attempt: usize,
        model: &ModelName,
        response: &UpstreamResponse,
    ) -> PlanState {
        if response.is_success() {
            return match candidate_text(&response.body) {
                Some(text) => PlanState::Succeeded(text),
                None => PlanState::FailedTerminal(DeckError::generation(
                    response.status,
                    model.as_str(),
                    "no structured output",
                )),
            };
        }

        let body = response.text();
        let class = classify(response.status, &body);
        let next = attempt + 1;
        let failure = DeckError::generation(response.status, model.as_str(), truncate(&body));

        match (class, self.models.get(next)) {
            (FailureClass::Structural, Some(_)) => PlanState::Pending {
                attempt: next,
                model: ModelName::primary(Capability::Text),
            },
            (FailureClass::Transient, Some(planned)) => PlanState::FailedTransient {
                attempt: next,
                model: planned.clone(),
                delay: backoff::retry_delay(attempt as u32, &body),
            },
            _ => PlanState::FailedTerminal(failure),
        }
    }
}

fn truncate(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        return body.to_string();
    }
    let mut cut: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    cut.push('…');
    cut
}
