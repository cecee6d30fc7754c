//! Context packs — snapshots of an agent's working state.
//!
//! A pack is what the agent carries between reasoning steps. The compressor
//! periodically rewrites it into a smaller pack, and the fidelity verifier
//! compares the two before the smaller one is adopted. Packs are:
//!
//! - **Immutable per check**: the verifier only ever borrows them
//! - **Serializable**: exchanged as JSON between agent and control plane
//! - **Renderable**: `approximate_text()` yields the text used to measure size

use serde::{Deserialize, Serialize};

// ── Snapshot trait ────────────────────────────────────────────────────────

/// The read-only view the fidelity verifier needs from a pack.
///
/// [`ContextPack`] is the stock implementation. Callers with their own
/// snapshot representation implement this directly instead of converting.
pub trait ContextSnapshot {
    /// Deterministic plain-text rendering used only for size measurement.
    ///
    /// Not round-trippable. A larger pack must render to longer text.
    fn approximate_text(&self) -> String;

    /// Free-text constraints currently binding on the agent.
    fn active_constraints(&self) -> &[String];

    /// Outstanding work items, identified by `memory_id`.
    fn pending_todos(&self) -> &[MemoryItem];

    /// References to evidence already captured elsewhere, identified by `span_id`.
    fn execution_evidence(&self) -> &[ExecutionEvidenceRef];
}

// ── Data Structures ───────────────────────────────────────────────────────

/// A pending work item. Identity is its `memory_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryItem {
    pub memory_id: String,

    #[serde(default)]
    pub content: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// A pointer to captured execution evidence. Identity is its `span_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionEvidenceRef {
    pub span_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    #[serde(default)]
    pub summary: String,
}

/// A snapshot of agent working state at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextPack {
    /// What the agent is currently trying to achieve.
    #[serde(default)]
    pub goal: String,

    /// Condensed narrative of the work so far.
    #[serde(default)]
    pub summary: String,

    #[serde(default)]
    pub active_constraints: Vec<String>,

    #[serde(default)]
    pub pending_todos: Vec<MemoryItem>,

    #[serde(default)]
    pub execution_evidence: Vec<ExecutionEvidenceRef>,

    /// Free-form scratch notes.
    #[serde(default)]
    pub notes: Vec<String>,
}

// ── Implementation ────────────────────────────────────────────────────────

impl MemoryItem {
    pub fn new(memory_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            memory_id: memory_id.into(),
            content: content.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

impl ExecutionEvidenceRef {
    pub fn new(span_id: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            span_id: span_id.into(),
            tool_name: None,
            summary: summary.into(),
        }
    }

    pub fn with_tool(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = Some(tool_name.into());
        self
    }
}

impl ContextPack {
    /// Create an empty pack for the given goal.
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            ..Self::default()
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.active_constraints.push(constraint.into());
        self
    }

    pub fn with_todo(mut self, item: MemoryItem) -> Self {
        self.pending_todos.push(item);
        self
    }

    pub fn with_evidence(mut self, evidence: ExecutionEvidenceRef) -> Self {
        self.execution_evidence.push(evidence);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Check if the pack carries nothing at all.
    pub fn is_empty(&self) -> bool {
        self.goal.is_empty()
            && self.summary.is_empty()
            && self.active_constraints.is_empty()
            && self.pending_todos.is_empty()
            && self.execution_evidence.is_empty()
            && self.notes.is_empty()
    }

    /// Parse a pack from JSON.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render the pack as a human-readable text document.
    ///
    /// Sections are emitted in a fixed order and only when non-empty, so
    /// identical packs always render to identical text.
    pub fn render(&self) -> String {
        let mut out = String::new();

        if !self.goal.is_empty() {
            out.push_str(&format!("## Goal\n{}\n\n", self.goal));
        }

        if !self.summary.is_empty() {
            out.push_str(&format!("## Summary\n{}\n\n", self.summary));
        }

        if !self.active_constraints.is_empty() {
            out.push_str("## Constraints\n");
            for constraint in &self.active_constraints {
                out.push_str(&format!("- {}\n", constraint));
            }
            out.push('\n');
        }

        if !self.pending_todos.is_empty() {
            out.push_str("## Pending\n");
            for item in &self.pending_todos {
                out.push_str(&format!("- [{}] {}", item.memory_id, item.content));
                if !item.tags.is_empty() {
                    out.push_str(&format!(" ({})", item.tags.join(", ")));
                }
                out.push('\n');
            }
            out.push('\n');
        }

        if !self.execution_evidence.is_empty() {
            out.push_str("## Evidence\n");
            for evidence in &self.execution_evidence {
                match &evidence.tool_name {
                    Some(tool) => out.push_str(&format!(
                        "- {} {}: {}\n",
                        evidence.span_id, tool, evidence.summary
                    )),
                    None => out.push_str(&format!(
                        "- {}: {}\n",
                        evidence.span_id, evidence.summary
                    )),
                }
            }
            out.push('\n');
        }

        if !self.notes.is_empty() {
            out.push_str("## Notes\n");
            for note in &self.notes {
                out.push_str(&format!("- {}\n", note));
            }
            out.push('\n');
        }

        out
    }
}

impl ContextSnapshot for ContextPack {
    fn approximate_text(&self) -> String {
        self.render()
    }

    fn active_constraints(&self) -> &[String] {
        &self.active_constraints
    }

    fn pending_todos(&self) -> &[MemoryItem] {
        &self.pending_todos
    }

    fn execution_evidence(&self) -> &[ExecutionEvidenceRef] {
        &self.execution_evidence
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
