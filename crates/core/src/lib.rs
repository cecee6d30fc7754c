//! # ContextGate Core
//!
//! Domain types and error definitions for ContextGate, the fidelity gate
//! that decides whether a compressed agent context may replace the original.
//! This crate has **zero framework dependencies** — it defines the domain
//! model that the verifier, config and CLI crates build on.
//!
//! ## Design Philosophy
//!
//! The verifier reads packs through the [`ContextSnapshot`] trait. The stock
//! [`ContextPack`] lives here, but any caller-owned snapshot type works.

pub mod error;
pub mod pack;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use pack::{ContextPack, ContextSnapshot, ExecutionEvidenceRef, MemoryItem};
