//! Submission-time request validation.
//!
//! Pure function over the request: no storage, no clock side effects (the
//! reference instant is passed in). Errors block queueing; warnings ride
//! along as a confidence discount and never block.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{ScenarioKind, SimulationRequest};

/// Stable issue codes surfaced to callers.
pub mod codes {
    pub const REQUIRED_FIELD_MISSING: &str = "REQUIRED_FIELD_MISSING";
    pub const INVALID_DATE_RANGE: &str = "INVALID_DATE_RANGE";
    pub const TIMEFRAME_TOO_SHORT: &str = "TIMEFRAME_TOO_SHORT";
    pub const TIMEFRAME_TOO_LONG: &str = "TIMEFRAME_TOO_LONG";
    pub const TIMEFRAME_IN_PAST: &str = "TIMEFRAME_IN_PAST";
    pub const TOO_MANY_METRICS: &str = "TOO_MANY_METRICS";
    pub const WEIGHT_OUT_OF_RANGE: &str = "WEIGHT_OUT_OF_RANGE";
    pub const WEIGHTS_NOT_NORMALIZED: &str = "WEIGHTS_NOT_NORMALIZED";
    pub const INVALID_PERCENTILE: &str = "INVALID_PERCENTILE";
}

/// Shortest timeframe the models produce anything useful for.
const MIN_TIMEFRAME_DAYS: i64 = 5;
/// Beyond this, accuracy degrades; warn but do not reject.
const MAX_RECOMMENDED_TIMEFRAME_DAYS: i64 = 90;
const MAX_RECOMMENDED_METRICS: usize = 10;
const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

const ERROR_SCORE_PENALTY: f64 = 0.3;
const WARNING_SCORE_PENALTY: f64 = 0.1;

/// One problem found in a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub code: String,
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(code: &str, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Outcome of validating a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    /// `max(0, 1 - 0.3*errors - 0.1*warnings)`.
    pub score: f64,
}

impl ValidationReport {
    fn from_issues(errors: Vec<ValidationIssue>, warnings: Vec<ValidationIssue>) -> Self {
        let score = (1.0
            - ERROR_SCORE_PENALTY * errors.len() as f64
            - WARNING_SCORE_PENALTY * warnings.len() as f64)
            .max(0.0);
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
            score,
        }
    }
}

/// Validate a simulation request before any processing cost is paid.
pub fn validate_request(request: &SimulationRequest, now: DateTime<Utc>) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if request.campaign_id.is_none() {
        errors.push(ValidationIssue::new(
            codes::REQUIRED_FIELD_MISSING,
            "campaign_id",
            "a campaign must be selected",
        ));
    }

    match &request.timeframe {
        None => errors.push(ValidationIssue::new(
            codes::REQUIRED_FIELD_MISSING,
            "timeframe",
            "a simulation timeframe is required",
        )),
        Some(tf) => {
            if tf.end <= tf.start {
                errors.push(ValidationIssue::new(
                    codes::INVALID_DATE_RANGE,
                    "timeframe",
                    "end date must be after start date",
                ));
            } else {
                let days = tf.duration_days();
                if days < MIN_TIMEFRAME_DAYS {
                    errors.push(ValidationIssue::new(
                        codes::TIMEFRAME_TOO_SHORT,
                        "timeframe",
                        format!("timeframe must cover at least {MIN_TIMEFRAME_DAYS} days"),
                    ));
                }
                if days > MAX_RECOMMENDED_TIMEFRAME_DAYS {
                    warnings.push(ValidationIssue::new(
                        codes::TIMEFRAME_TOO_LONG,
                        "timeframe",
                        format!(
                            "forecasts beyond {MAX_RECOMMENDED_TIMEFRAME_DAYS} days lose accuracy"
                        ),
                    ));
                }
            }
            if tf.start < now {
                warnings.push(ValidationIssue::new(
                    codes::TIMEFRAME_IN_PAST,
                    "timeframe",
                    "start date is in the past",
                ));
            }
        }
    }

    if request.metrics.is_empty() {
        errors.push(ValidationIssue::new(
            codes::REQUIRED_FIELD_MISSING,
            "metrics",
            "at least one metric is required",
        ));
    } else {
        if request.metrics.len() > MAX_RECOMMENDED_METRICS {
            warnings.push(ValidationIssue::new(
                codes::TOO_MANY_METRICS,
                "metrics",
                format!("more than {MAX_RECOMMENDED_METRICS} metrics dilutes the forecast"),
            ));
        }

        for (i, metric) in request.metrics.iter().enumerate() {
            if !(0.0..=1.0).contains(&metric.weight) || !metric.weight.is_finite() {
                errors.push(ValidationIssue::new(
                    codes::WEIGHT_OUT_OF_RANGE,
                    format!("metrics[{i}].weight"),
                    "metric weight must be within [0, 1]",
                ));
            }
        }

        let weight_sum: f64 = request.metrics.iter().map(|m| m.weight).sum();
        if (weight_sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            warnings.push(ValidationIssue::new(
                codes::WEIGHTS_NOT_NORMALIZED,
                "metrics",
                format!("metric weights sum to {weight_sum:.3}, expected 1.0"),
            ));
        }
    }

    for (i, scenario) in request.scenarios.iter().enumerate() {
        if let Some(p) = scenario.percentile {
            if !(0.0..=100.0).contains(&p) || !p.is_finite() {
                errors.push(ValidationIssue::new(
                    codes::INVALID_PERCENTILE,
                    format!("scenarios[{i}].percentile"),
                    "scenario percentile must be within [0, 100]",
                ));
            }
        } else if scenario.kind == ScenarioKind::Custom {
            warnings.push(ValidationIssue::new(
                codes::REQUIRED_FIELD_MISSING,
                format!("scenarios[{i}].percentile"),
                "custom scenarios usually carry a target percentile",
            ));
        }
    }

    ValidationReport::from_issues(errors, warnings)
}
