//! Case document model.
//!
//! A case moves through a fixed set of investigation phases (D1_D2 through
//! D8). The identity, metadata and phase headers are typed; phase payloads
//! keep the fields the indexer reads as raw JSON values, because the editing
//! UI stores free-form content there (strings, lists, numbers, nulls).
//! Fields the indexer does not know about are preserved in `extra` maps so a
//! load/store round trip is lossless.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::dates;
use crate::errors::ModelError;

/// Deserialize `null` as the type's default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn default_version() -> i64 {
    1
}

/// The investigation phases, in workflow order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseKey {
    #[serde(rename = "D1_D2")]
    D1D2,
    D3,
    D4,
    D5,
    D6,
    D7,
    D8,
}

impl PhaseKey {
    /// All phases in workflow order.
    pub const ALL: [PhaseKey; 7] = [
        PhaseKey::D1D2,
        PhaseKey::D3,
        PhaseKey::D4,
        PhaseKey::D5,
        PhaseKey::D6,
        PhaseKey::D7,
        PhaseKey::D8,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseKey::D1D2 => "D1_D2",
            PhaseKey::D3 => "D3",
            PhaseKey::D4 => "D4",
            PhaseKey::D5 => "D5",
            PhaseKey::D6 => "D6",
            PhaseKey::D7 => "D7",
            PhaseKey::D8 => "D8",
        }
    }

    /// Discipline tags covered by the phase when its header declares none.
    pub fn disciplines(&self) -> &'static [&'static str] {
        match self {
            PhaseKey::D1D2 => &["D1", "D2"],
            PhaseKey::D3 => &["D3"],
            PhaseKey::D4 => &["D4"],
            PhaseKey::D5 => &["D5"],
            PhaseKey::D6 => &["D6"],
            PhaseKey::D7 => &["D7"],
            PhaseKey::D8 => &["D8"],
        }
    }
}

/// Lifecycle status of a case. Only `closed` cases are indexed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    #[default]
    Open,
    Closed,
    #[serde(other)]
    Unknown,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Open => "open",
            CaseStatus::Closed => "closed",
            CaseStatus::Unknown => "unknown",
        }
    }
}

/// Identity section (`case` in the stored JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseHeader {
    pub case_number: String,
    pub opening_date: String,
    #[serde(default)]
    pub closure_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: CaseStatus,
}

/// Header shared by every phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseHeader {
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed: bool,
    /// Declared discipline tag(s): a string, a list of strings, or absent.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub discipline: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One phase: header plus phase-specific payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize",
    deserialize = "T: Deserialize<'de> + Default"
))]
pub struct Phase<T> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub header: PhaseHeader,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: T,
}

/// Organization owning the incident (D1_D2).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    #[serde(default)]
    pub country: Value,
    #[serde(default)]
    pub site: Value,
    #[serde(default)]
    pub department: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// D1_D2: team and problem statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamAndProblem {
    #[serde(default)]
    pub problem_description: Value,
    #[serde(default)]
    pub team_members: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub organization: Organization,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// D3: incident narrative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncidentNarrative {
    #[serde(default)]
    pub what_happened: Value,
    #[serde(default)]
    pub why_problem: Value,
    #[serde(default)]
    pub when: Value,
    #[serde(default, rename = "where")]
    pub where_: Value,
    #[serde(default)]
    pub who: Value,
    #[serde(default)]
    pub how_identified: Value,
    #[serde(default)]
    pub impact: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// D4 (containment) and D6 (permanent) action plans.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    /// Records with at least an `action` label.
    #[serde(default)]
    pub actions: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// D5: root cause investigation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RootCauseAnalysis {
    /// Records with at least a `task` label.
    #[serde(default)]
    pub investigation_tasks: Value,
    /// Records with at least a `factor` label.
    #[serde(default)]
    pub factors: Value,
    /// Category name to list of causes.
    #[serde(default)]
    pub fishbone: Value,
    /// Chain name to ordered list of "why" answers.
    #[serde(default)]
    pub five_whys: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// D8: closure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Closure {
    #[serde(default)]
    pub closure_date: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The fixed set of phases of a case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Phases {
    #[serde(rename = "D1_D2", default, deserialize_with = "null_as_default")]
    pub d1_d2: Phase<TeamAndProblem>,
    #[serde(rename = "D3", default, deserialize_with = "null_as_default")]
    pub d3: Phase<IncidentNarrative>,
    #[serde(rename = "D4", default, deserialize_with = "null_as_default")]
    pub d4: Phase<ActionPlan>,
    #[serde(rename = "D5", default, deserialize_with = "null_as_default")]
    pub d5: Phase<RootCauseAnalysis>,
    #[serde(rename = "D6", default, deserialize_with = "null_as_default")]
    pub d6: Phase<ActionPlan>,
    #[serde(rename = "D7", default, deserialize_with = "null_as_default")]
    pub d7: Phase<Map<String, Value>>,
    #[serde(rename = "D8", default, deserialize_with = "null_as_default")]
    pub d8: Phase<Closure>,
}

impl Phases {
    /// Header of a phase.
    pub fn header(&self, key: PhaseKey) -> &PhaseHeader {
        match key {
            PhaseKey::D1D2 => &self.d1_d2.header,
            PhaseKey::D3 => &self.d3.header,
            PhaseKey::D4 => &self.d4.header,
            PhaseKey::D5 => &self.d5.header,
            PhaseKey::D6 => &self.d6.header,
            PhaseKey::D7 => &self.d7.header,
            PhaseKey::D8 => &self.d8.header,
        }
    }

    /// Headers of all phases in workflow order.
    pub fn headers(&self) -> impl Iterator<Item = (PhaseKey, &PhaseHeader)> {
        PhaseKey::ALL.into_iter().map(move |key| (key, self.header(key)))
    }
}

/// Attachment descriptor. Entries are free-form; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    #[serde(default)]
    pub filename: Value,
    #[serde(default)]
    pub description: Value,
    #[serde(default)]
    pub tags: Value,
    #[serde(default)]
    pub content_type: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Derived AI analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseAi {
    #[serde(default)]
    pub last_run: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub identified_root_causes: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommended_actions: Vec<Value>,
}

/// Document metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseMeta {
    #[serde(default = "default_version")]
    pub version: i64,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// A complete case document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseDocument {
    #[serde(rename = "case", alias = "identity")]
    pub identity: CaseHeader,
    #[serde(default, deserialize_with = "null_as_default")]
    pub evidence: Vec<EvidenceItem>,
    pub phases: Phases,
    #[serde(default)]
    pub ai: Option<CaseAi>,
    pub meta: CaseMeta,
}

impl CaseDocument {
    /// A fresh open case with all phases present and incomplete.
    pub fn new_open(
        case_number: impl Into<String>,
        opening_date: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let now = dates::to_rfc3339(&now);
        Self {
            identity: CaseHeader {
                case_number: case_number.into(),
                opening_date: opening_date.unwrap_or_else(|| now.clone()),
                closure_date: None,
                status: CaseStatus::Open,
            },
            evidence: Vec::new(),
            phases: Phases::default(),
            ai: Some(CaseAi::default()),
            meta: CaseMeta {
                version: 1,
                created_at: now,
                updated_at: None,
            },
        }
    }

    /// Parse and validate a stored case document.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        let doc: CaseDocument = serde_json::from_slice(bytes)?;
        doc.validate()?;
        Ok(doc)
    }

    /// Structural checks beyond what deserialization enforces.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.identity.case_number.trim().is_empty() {
            return Err(ModelError::missing_field("case.case_number"));
        }
        if self.meta.version < 1 {
            return Err(ModelError::malformed(format!(
                "meta.version must be >= 1, got {}",
                self.meta.version
            )));
        }

        dates::parse_utc("case.opening_date", &self.identity.opening_date)?;
        dates::normalize("case.closure_date", self.identity.closure_date.as_deref())?;
        dates::parse_utc("meta.created_at", &self.meta.created_at)?;
        dates::normalize("meta.updated_at", self.meta.updated_at.as_deref())?;
        if let Value::String(closure) = &self.phases.d8.data.closure_date {
            dates::normalize("phases.D8.data.closure_date", Some(closure))?;
        }

        Ok(())
    }

    pub fn case_id(&self) -> &str {
        &self.identity.case_number
    }

    pub fn status(&self) -> CaseStatus {
        self.identity.status
    }

    pub fn is_closed(&self) -> bool {
        self.identity.status == CaseStatus::Closed
    }

    /// Closure date from the identity section, falling back to D8.
    pub fn closure_date(&self) -> Option<&str> {
        self.identity
            .closure_date
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .or_else(|| match &self.phases.d8.data.closure_date {
                Value::String(s) if !s.trim().is_empty() => Some(s.as_str()),
                _ => None,
            })
    }
}
