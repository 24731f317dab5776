//! Field-level rules for contract proposals submitted from the marketplace UI.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::clock::{Clock, SystemClock};
use crate::error::ErrorCode;
use crate::validation::{RuleCollector, ValidationResult};

/// Minimum title length, in characters.
pub const MIN_TITLE_CHARS: usize = 3;

/// Kind of work a proposal requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    /// The provider produces the work from scratch
    Realizacion,
    /// The provider reviews work the client already has
    Revision,
}

impl ServiceType {
    /// Returns the wire token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Realizacion => "realizacion",
            Self::Revision => "revision",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = ErrorCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "realizacion" => Ok(Self::Realizacion),
            "revision" => Ok(Self::Revision),
            _ => Err(ErrorCode::TipoServicioInvalid),
        }
    }
}

/// The proposal payload as submitted by the form.
///
/// Field names on the wire follow the form (`titulo`, `descripcion`,
/// `fechaLimite`, `tipoServicio`, `presupuestoSugerido`). Missing text fields
/// deserialize as empty strings and a missing budget as zero, so an absent
/// field fails its rule instead of failing deserialization.
///
/// `fechaLimite` is read leniently: RFC 3339 timestamps keep their instant,
/// a bare `YYYY-MM-DD` (what a date input sends) means midnight UTC, and a
/// zone-less `YYYY-MM-DDTHH:MM[:SS]` is taken as UTC. Anything else, the
/// empty string and non-string values included, becomes `None` and so fails
/// the deadline rule.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProposalFields {
    /// Short title of the requested work
    #[serde(rename = "titulo", default)]
    pub title: String,
    /// Free-text description
    #[serde(rename = "descripcion", default)]
    pub description: String,
    /// Deadline for delivery
    #[serde(
        rename = "fechaLimite",
        default,
        deserialize_with = "deserialize_deadline"
    )]
    pub deadline: Option<DateTime<Utc>>,
    /// Raw service type token; checked against [`ServiceType`]
    #[serde(rename = "tipoServicio", default)]
    pub service_type: String,
    /// Budget the client suggests
    #[serde(rename = "presupuestoSugerido", default)]
    pub suggested_budget: f64,
}

fn deserialize_deadline<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(text)) => parse_deadline(&text),
        _ => None,
    })
}

/// Parses a deadline as the form submits it. Returns `None` when unparseable.
pub(crate) fn parse_deadline(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

/// Validates [`ProposalFields`] against the proposal rule set.
///
/// All five rules run on every call, and each failure adds one code in this
/// order: title, description, deadline, service type, budget.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use marketplace_policy::{ErrorCode, FixedClock, ProposalFields, ProposalValidator};
///
/// let now = Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap();
/// let validator = ProposalValidator::new(FixedClock::new(now));
///
/// let fields = ProposalFields {
///     title: "ab".to_string(),
///     description: "Landing page copy".to_string(),
///     deadline: Some(now + Duration::days(7)),
///     service_type: "revision".to_string(),
///     suggested_budget: 80.0,
/// };
///
/// let result = validator.validate(&fields);
/// assert_eq!(result.errors(), &[ErrorCode::TituloTooShort]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProposalValidator<C = SystemClock> {
    clock: C,
}

impl<C: Clock> ProposalValidator<C> {
    /// Creates a validator reading "now" from `clock`.
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    /// Validates `fields` against the clock's current instant.
    pub fn validate(&self, fields: &ProposalFields) -> ValidationResult {
        Self::validate_at(fields, self.clock.now())
    }

    /// Validates `fields` with an explicit evaluation instant.
    pub fn validate_at(fields: &ProposalFields, now: DateTime<Utc>) -> ValidationResult {
        let mut rules = RuleCollector::new();
        rules
            .check(
                fields.title.chars().count() >= MIN_TITLE_CHARS,
                ErrorCode::TituloTooShort,
            )
            .check(
                !fields.description.trim().is_empty(),
                ErrorCode::DescripcionEmpty,
            )
            .check(
                fields.deadline.is_some_and(|deadline| deadline > now),
                ErrorCode::FechaLimitePast,
            )
            .check(
                fields.service_type.parse::<ServiceType>().is_ok(),
                ErrorCode::TipoServicioInvalid,
            )
            .check(
                fields.suggested_budget > 0.0,
                ErrorCode::PresupuestoNegative,
            );
        let result = rules.finish();

        if !result.is_valid() {
            tracing::debug!(errors = ?result.errors(), "proposal rejected");
        }
        result
    }
}

/// Validates `fields` against the wall clock.
pub fn validate_proposal(fields: &ProposalFields) -> ValidationResult {
    ProposalValidator::new(SystemClock).validate(fields)
}
