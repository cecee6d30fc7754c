//! Caller-side compaction gate.
//!
//! The verifier only judges. The gate applies the judgement: a compressed
//! pack that fails is rejected and the original is kept, and the compressor
//! may be asked again with the previous attempt's reason codes as feedback.

use crate::verifier::{self, ReasonCode, Verdict};
use contextgate_config::FidelityConfig;
use contextgate_core::ContextSnapshot;
use tracing::{debug, info, warn};

/// The outcome of reviewing one compressed pack.
#[derive(Debug, Clone)]
pub enum GateDecision<P> {
    /// `after` passed and replaces `before`.
    Accepted { pack: P, verdict: Verdict },
    /// `after` failed; `before` is kept.
    Rejected { kept: P, verdict: Verdict },
}

impl<P> GateDecision<P> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    pub fn verdict(&self) -> &Verdict {
        match self {
            Self::Accepted { verdict, .. } | Self::Rejected { verdict, .. } => verdict,
        }
    }

    /// The pack the caller should carry forward.
    pub fn into_pack(self) -> P {
        match self {
            Self::Accepted { pack, .. } => pack,
            Self::Rejected { kept, .. } => kept,
        }
    }
}

/// Result of a full compaction cycle with retries.
#[derive(Debug, Clone)]
pub struct CompactionOutcome<P> {
    /// The pack to carry forward: the accepted candidate, or the original.
    pub pack: P,
    pub accepted: bool,
    /// Number of times the compressor was invoked.
    pub attempts: u32,
    /// Verdict of the last candidate checked, if any was produced.
    pub last_verdict: Option<Verdict>,
}

/// Applies fidelity verdicts on behalf of the agent loop.
#[derive(Debug, Clone)]
pub struct CompactionGate {
    required_saving_ratio: f64,
    max_attempts: u32,
}

impl CompactionGate {
    /// Create a gate with the given threshold and a single attempt per cycle.
    pub fn new(required_saving_ratio: f64) -> Self {
        Self {
            required_saving_ratio: verifier::effective_saving_ratio(required_saving_ratio),
            max_attempts: 1,
        }
    }

    pub fn from_config(config: &FidelityConfig) -> Self {
        Self::new(config.required_saving_ratio).with_max_attempts(config.max_compression_attempts)
    }

    /// Set the maximum compressor invocations per cycle (at least 1).
    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max.max(1);
        self
    }

    pub fn required_saving_ratio(&self) -> f64 {
        self.required_saving_ratio
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decide whether `after` replaces `before`.
    pub fn review<P: ContextSnapshot>(&self, before: P, after: P) -> GateDecision<P> {
        let verdict = verifier::verify(&before, &after, self.required_saving_ratio);
        if verdict.pass {
            info!(
                saving_ratio = verdict.saving_ratio,
                "Compressed pack accepted"
            );
            GateDecision::Accepted {
                pack: after,
                verdict,
            }
        } else {
            warn!(
                saving_ratio = verdict.saving_ratio,
                reasons = %verdict.reasons(),
                "Compressed pack rejected, keeping original"
            );
            GateDecision::Rejected {
                kept: before,
                verdict,
            }
        }
    }

    /// Run a compaction cycle, retrying with feedback until a candidate
    /// passes or the attempt limit is reached.
    ///
    /// `compress` receives the original pack and the reason codes of the
    /// previous failed attempt (empty on the first call). Returning `None`
    /// abandons the cycle.
    pub fn compact_with_retry<P, F>(&self, before: P, mut compress: F) -> CompactionOutcome<P>
    where
        P: ContextSnapshot,
        F: FnMut(&P, &[ReasonCode]) -> Option<P>,
    {
        let mut feedback: Vec<ReasonCode> = Vec::new();
        let mut last_verdict = None;
        let mut attempts = 0;

        while attempts < self.max_attempts {
            attempts += 1;

            let Some(candidate) = compress(&before, feedback.as_slice()) else {
                debug!(attempt = attempts, "Compressor abandoned compaction cycle");
                break;
            };

            let verdict = verifier::verify(&before, &candidate, self.required_saving_ratio);
            if verdict.pass {
                info!(
                    attempt = attempts,
                    saving_ratio = verdict.saving_ratio,
                    "Compressed pack accepted"
                );
                return CompactionOutcome {
                    pack: candidate,
                    accepted: true,
                    attempts,
                    last_verdict: Some(verdict),
                };
            }

            warn!(
                attempt = attempts,
                max_attempts = self.max_attempts,
                reasons = %verdict.reasons(),
                "Compressed pack rejected"
            );
            feedback.clone_from(&verdict.reason_codes);
            last_verdict = Some(verdict);
        }

        CompactionOutcome {
            pack: before,
            accepted: false,
            attempts,
            last_verdict,
        }
    }
}

impl Default for CompactionGate {
    fn default() -> Self {
        Self::from_config(&FidelityConfig::default())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
