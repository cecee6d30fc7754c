//! Fidelity gate for compressed agent context.
//!
//! An agent periodically rewrites its working context into a smaller pack.
//! Before the smaller pack replaces the original it must pass this gate:
//!
//! 1. **Shrink** — the rendered text must be at least the required fraction
//!    shorter (code points, default 35%)
//! 2. **Keep constraints** — every active constraint survives verbatim
//! 3. **Keep todos** — every pending todo survives by memory id
//! 4. **Keep evidence** — every execution evidence span id survives
//!
//! [`verify`] is the pure check. [`CompactionGate`] applies its verdict
//! the way the agent loop does: keep the original on failure and optionally
//! retry the compressor with the reason codes as feedback.

pub mod gate;
pub mod measure;
pub mod verifier;

pub use gate::{CompactionGate, CompactionOutcome, GateDecision};
pub use verifier::{
    DEFAULT_REQUIRED_SAVING_RATIO, LostItems, ReasonCode, Verdict, effective_saving_ratio,
    try_verify, verify,
};
