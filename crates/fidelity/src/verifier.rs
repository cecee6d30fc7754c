//! The fidelity verifier.
//!
//! Compares a `before` and `after` context pack and renders a [`Verdict`]:
//! the compressed pack must be meaningfully smaller, and it must still carry
//! every active constraint, pending todo and evidence reference of the
//! original. Checks are structural (trimmed identifier / string equality),
//! never semantic.
//!
//! # Determinism
//!
//! Verification is a pure function of its inputs: no clocks, no randomness,
//! no I/O. Identical inputs always produce identical verdicts, so it is safe
//! to call from retry loops and from many threads at once.

use crate::measure;
use contextgate_core::{ContextSnapshot, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

pub use contextgate_config::DEFAULT_REQUIRED_SAVING_RATIO;

// ── Types ─────────────────────────────────────────────────────────────────

/// Stable machine-readable reason a pack failed the gate.
///
/// Variants are declared in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    ConstraintsLost,
    PendingTodosLost,
    EvidenceRefsLost,
    SavingBelowThreshold,
}

impl ReasonCode {
    /// All codes, in reporting order.
    pub const ALL: [ReasonCode; 4] = [
        ReasonCode::ConstraintsLost,
        ReasonCode::PendingTodosLost,
        ReasonCode::EvidenceRefsLost,
        ReasonCode::SavingBelowThreshold,
    ];

    /// The wire token for this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConstraintsLost => "constraints_lost",
            Self::PendingTodosLost => "pending_todos_lost",
            Self::EvidenceRefsLost => "evidence_refs_lost",
            Self::SavingBelowThreshold => "saving_below_threshold",
        }
    }

    /// Instruction a compressor can feed back into its next attempt.
    pub fn retry_hint(&self) -> &'static str {
        match self {
            Self::ConstraintsLost => "Keep every active constraint verbatim.",
            Self::PendingTodosLost => "Keep every pending todo by its memory id.",
            Self::EvidenceRefsLost => "Keep every execution evidence span id.",
            Self::SavingBelowThreshold => {
                "Shorten the summary and notes further; the pack is not small enough."
            }
        }
    }

    /// Whether this code means required state was dropped (as opposed to
    /// the pack merely not shrinking enough).
    pub fn is_loss(&self) -> bool {
        !matches!(self, Self::SavingBelowThreshold)
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReasonCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|code| code.as_str() == s.trim())
            .ok_or_else(|| Error::invalid_input(format!("unknown reason code '{s}'")))
    }
}

/// Identifiers present in `before` but absent from `after`, in `before` order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LostItems {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pending_todos: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence_refs: Vec<String>,
}

impl LostItems {
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty() && self.pending_todos.is_empty() && self.evidence_refs.is_empty()
    }
}

/// The outcome of one fidelity check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether `after` may replace `before`.
    pub pass: bool,
    /// `(before_len - after_len) / before_len`; `0.0` for an empty `before`.
    pub saving_ratio: f64,
    pub missing_constraints: bool,
    pub missing_pending_todos: bool,
    pub missing_evidence_refs: bool,
    /// Failure reasons in fixed order. Empty when `pass` is true.
    pub reason_codes: Vec<ReasonCode>,
    /// The threshold actually applied, after defaulting.
    pub required_saving_ratio: f64,
    /// Rendered length of `before`, in code points.
    pub before_len: usize,
    /// Rendered length of `after`, in code points.
    pub after_len: usize,
    #[serde(default)]
    pub lost: LostItems,
}

impl Verdict {
    /// Reason tokens joined with `,` (empty string on pass).
    pub fn reasons(&self) -> String {
        self.reason_codes
            .iter()
            .map(ReasonCode::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Whether any required state was dropped.
    pub fn lost_state(&self) -> bool {
        self.missing_constraints || self.missing_pending_todos || self.missing_evidence_refs
    }

    /// Retry hints for each failure reason, in reason order.
    pub fn retry_hints(&self) -> Vec<&'static str> {
        self.reason_codes.iter().map(ReasonCode::retry_hint).collect()
    }
}

// ── Verification ──────────────────────────────────────────────────────────

/// The threshold the gate applies for a caller-supplied ratio.
///
/// Anything not strictly positive (including NaN) becomes
/// [`DEFAULT_REQUIRED_SAVING_RATIO`]. Values above `1.0` are kept as given
/// and can only be met by a pack that shrinks to nothing.
pub fn effective_saving_ratio(requested: f64) -> f64 {
    if requested > 0.0 {
        requested
    } else {
        DEFAULT_REQUIRED_SAVING_RATIO
    }
}

/// Verify that `after` is a faithful, smaller replacement for `before`.
///
/// # Algorithm
///
/// 1. Render both packs and count code points
/// 2. Saving ratio = `(before - after) / before`, `0.0` when `before` is empty
/// 3. Check constraints, todo ids and evidence span ids of `before` are all
///    present in `after` (trimmed, empties ignored, extras in `after` allowed)
/// 4. Pass only if nothing was lost and the ratio meets the threshold
///
/// All four conditions are always evaluated so every flag is reported.
pub fn verify<B, A>(before: &B, after: &A, required_saving_ratio: f64) -> Verdict
where
    B: ContextSnapshot + ?Sized,
    A: ContextSnapshot + ?Sized,
{
    let required = effective_saving_ratio(required_saving_ratio);

    let before_len = measure::rune_len(&before.approximate_text());
    let after_len = measure::rune_len(&after.approximate_text());
    let saving_ratio = measure::saving_ratio(before_len, after_len);

    let lost = LostItems {
        constraints: lost_keys(
            before.active_constraints().iter().map(String::as_str),
            after.active_constraints().iter().map(String::as_str),
        ),
        pending_todos: lost_keys(
            before.pending_todos().iter().map(|t| t.memory_id.as_str()),
            after.pending_todos().iter().map(|t| t.memory_id.as_str()),
        ),
        evidence_refs: lost_keys(
            before.execution_evidence().iter().map(|e| e.span_id.as_str()),
            after.execution_evidence().iter().map(|e| e.span_id.as_str()),
        ),
    };

    let missing_constraints = !lost.constraints.is_empty();
    let missing_pending_todos = !lost.pending_todos.is_empty();
    let missing_evidence_refs = !lost.evidence_refs.is_empty();
    let saving_met = saving_ratio >= required;

    let mut reason_codes = Vec::new();
    if missing_constraints {
        reason_codes.push(ReasonCode::ConstraintsLost);
    }
    if missing_pending_todos {
        reason_codes.push(ReasonCode::PendingTodosLost);
    }
    if missing_evidence_refs {
        reason_codes.push(ReasonCode::EvidenceRefsLost);
    }
    if !saving_met {
        reason_codes.push(ReasonCode::SavingBelowThreshold);
    }

    let pass = reason_codes.is_empty();

    debug!(
        before_len,
        after_len,
        saving_ratio,
        required,
        missing_constraints,
        missing_pending_todos,
        missing_evidence_refs,
        pass,
        "Fidelity check complete"
    );

    Verdict {
        pass,
        saving_ratio,
        missing_constraints,
        missing_pending_todos,
        missing_evidence_refs,
        reason_codes,
        required_saving_ratio: required,
        before_len,
        after_len,
        lost,
    }
}

/// Like [`verify`], but for callers whose packs may be absent.
///
/// An absent pack is a caller contract violation and yields
/// [`Error::InvalidInput`] rather than a verdict.
pub fn try_verify<B, A>(
    before: Option<&B>,
    after: Option<&A>,
    required_saving_ratio: f64,
) -> Result<Verdict>
where
    B: ContextSnapshot + ?Sized,
    A: ContextSnapshot + ?Sized,
{
    match (before, after) {
        (Some(before), Some(after)) => Ok(verify(before, after, required_saving_ratio)),
        (None, Some(_)) => Err(Error::invalid_input("`before` pack is absent")),
        (Some(_), None) => Err(Error::invalid_input("`after` pack is absent")),
        (None, None) => Err(Error::invalid_input("`before` and `after` packs are absent")),
    }
}

/// Trimmed, non-empty keys of `before` that do not appear in `after`.
///
/// Duplicates collapse: each lost key is reported once, in `before` order.
fn lost_keys<'a>(
    before: impl Iterator<Item = &'a str>,
    after: impl Iterator<Item = &'a str>,
) -> Vec<String> {
    let kept: HashSet<&str> = after.map(str::trim).filter(|k| !k.is_empty()).collect();
    let mut reported = HashSet::new();
    before
        .map(str::trim)
        .filter(|k| !k.is_empty() && !kept.contains(k) && reported.insert(*k))
        .map(str::to_string)
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────
