//! Behavioural tests for the fidelity verifier.
//!
//! Uses a hand-rolled snapshot with an exact rendered length so ratios can
//! be pinned precisely.

use contextgate_core::{ContextPack, ContextSnapshot, ExecutionEvidenceRef, MemoryItem};
use contextgate_fidelity::{ReasonCode, Verdict, try_verify, verify};

/// A snapshot whose rendered text is `len` copies of a single character.
#[derive(Clone, Default)]
struct FixedPack {
    ch: char,
    len: usize,
    constraints: Vec<String>,
    todos: Vec<MemoryItem>,
    evidence: Vec<ExecutionEvidenceRef>,
}

impl FixedPack {
    fn sized(len: usize) -> Self {
        Self {
            ch: 'x',
            len,
            ..Self::default()
        }
    }

    fn constraint(mut self, c: &str) -> Self {
        self.constraints.push(c.into());
        self
    }

    fn todo(mut self, id: &str) -> Self {
        self.todos.push(MemoryItem::new(id, ""));
        self
    }

    fn evidence(mut self, id: &str) -> Self {
        self.evidence.push(ExecutionEvidenceRef::new(id, ""));
        self
    }
}

impl ContextSnapshot for FixedPack {
    fn approximate_text(&self) -> String {
        std::iter::repeat_n(self.ch, self.len).collect()
    }

    fn active_constraints(&self) -> &[String] {
        &self.constraints
    }

    fn pending_todos(&self) -> &[MemoryItem] {
        &self.todos
    }

    fn execution_evidence(&self) -> &[ExecutionEvidenceRef] {
        &self.evidence
    }
}

fn full(len: usize) -> FixedPack {
    FixedPack::sized(len)
        .constraint("must not delete files")
        .todo("t1")
        .todo("t2")
        .evidence("e1")
}

// ── Scenario ──────────────────────────────────────────────────────────────

#[test]
fn dropped_todo_fails_despite_sufficient_saving() {
    let before = FixedPack::sized(1000)
        .constraint("must not delete files")
        .todo("t1")
        .evidence("e1");
    let after = FixedPack::sized(600)
        .constraint("must not delete files")
        .evidence("e1");

    let verdict = verify(&before, &after, 0.35);

    assert_eq!(verdict.saving_ratio, 0.4);
    assert!(!verdict.missing_constraints);
    assert!(verdict.missing_pending_todos);
    assert!(!verdict.missing_evidence_refs);
    assert!(!verdict.pass);
    assert_eq!(verdict.reason_codes, vec![ReasonCode::PendingTodosLost]);
    assert_eq!(verdict.lost.pending_todos, vec!["t1".to_string()]);
}

// ── Properties ────────────────────────────────────────────────────────────

#[test]
fn verification_is_pure() {
    let before = full(1000);
    let after = FixedPack::sized(300).todo("t2");

    let first = verify(&before, &after, 0.5);
    let second = verify(&before, &after, 0.5);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn identical_packs_lose_nothing() {
    let pack = full(800);
    let verdict = verify(&pack, &pack, 0.0);
    assert_eq!(verdict.saving_ratio, 0.0);
    assert!(!verdict.lost_state());
    // The default threshold still applies, so an unchanged pack fails on size.
    assert_eq!(verdict.reason_codes, vec![ReasonCode::SavingBelowThreshold]);

    let real_pack = ContextPack::new("goal")
        .with_constraint("c")
        .with_todo(MemoryItem::new("t", ""))
        .with_evidence(ExecutionEvidenceRef::new("e", ""));
    let verdict = verify(&real_pack, &real_pack, -1.0);
    assert_eq!(verdict.saving_ratio, 0.0);
    assert!(!verdict.lost_state());
}

#[test]
fn empty_before_collections_never_report_loss() {
    let before = FixedPack::sized(500);
    for after in [
        FixedPack::sized(100),
        full(100),
        FixedPack::sized(900).constraint("new rule"),
    ] {
        let verdict = verify(&before, &after, 0.35);
        assert!(!verdict.missing_constraints);
        assert!(!verdict.missing_pending_todos);
        assert!(!verdict.missing_evidence_refs);
    }
}

#[test]
fn empty_before_text_yields_zero_ratio() {
    let before = FixedPack::sized(0);
    let verdict = verify(&before, &FixedPack::sized(0), 0.35);
    assert_eq!(verdict.saving_ratio, 0.0);
    assert!(!verdict.pass);

    let verdict = verify(&before, &FixedPack::sized(42), 0.35);
    assert_eq!(verdict.saving_ratio, 0.0);
    assert!(!verdict.saving_ratio.is_nan());
    assert_eq!(verdict.reason_codes, vec![ReasonCode::SavingBelowThreshold]);
}

#[test]
fn removing_one_todo_flips_only_the_todo_flag() {
    let before = full(1000);
    let intact = full(500);
    let baseline = verify(&before, &intact, 0.35);
    assert!(baseline.pass);

    let mut missing_one = full(500);
    missing_one.todos.retain(|t| t.memory_id != "t2");
    let verdict = verify(&before, &missing_one, 0.35);

    assert!(verdict.missing_pending_todos);
    assert_eq!(verdict.missing_constraints, baseline.missing_constraints);
    assert_eq!(verdict.missing_evidence_refs, baseline.missing_evidence_refs);
    assert_eq!(verdict.reason_codes, vec![ReasonCode::PendingTodosLost]);
}

#[test]
fn threshold_is_inclusive() {
    let before = full(1000);

    let at = verify(&before, &full(650), 0.35);
    assert_eq!(at.saving_ratio, 0.35);
    assert!(at.pass);

    let above = verify(&before, &full(650), 0.35 - 1e-9);
    assert!(above.pass);

    let below = verify(&before, &full(651), 0.35);
    assert!(!below.pass);
    assert_eq!(below.reason_codes, vec![ReasonCode::SavingBelowThreshold]);
}

#[test]
fn growth_gives_negative_ratio() {
    let verdict = verify(&full(100), &full(150), 0.35);
    assert_eq!(verdict.saving_ratio, -0.5);
    assert!(!verdict.pass);
}

#[test]
fn length_is_measured_in_code_points() {
    let before = FixedPack {
        ch: '語',
        ..full(1000)
    };
    let after = full(600);
    let verdict: Verdict = verify(&before, &after, 0.35);
    assert_eq!(verdict.before_len, 1000);
    assert_eq!(verdict.after_len, 600);
    assert_eq!(verdict.saving_ratio, 0.4);
}

#[test]
fn absent_pack_is_invalid_input() {
    let before = full(10);
    let err = try_verify::<FixedPack, FixedPack>(Some(&before), None, 0.35).unwrap_err();
    assert!(err.is_invalid_input());
}

#[test]
fn concurrent_callers_need_no_coordination() {
    let before = full(1000);
    let after = FixedPack::sized(400).constraint("must not delete files");
    let expected = verify(&before, &after, 0.35);

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| verify(&before, &after, 0.35)))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn json_packs_can_be_verified() {
    let before: ContextPack = serde_json::from_value(serde_json::json!({
        "goal": "Index the repository",
        "summary": "Walked every crate, collected symbols, wrote an index draft. ".repeat(10),
        "active_constraints": ["read-only filesystem"],
        "pending_todos": [{"memory_id": "t1", "content": "dedupe symbols"}],
        "execution_evidence": [{"span_id": "s-17", "tool_name": "shell", "summary": "ls"}]
    }))
    .unwrap();
    let after: ContextPack = serde_json::from_value(serde_json::json!({
        "goal": "Index the repository",
        "summary": "Index drafted.",
        "active_constraints": ["read-only filesystem"],
        "pending_todos": [{"memory_id": "t1"}],
        "execution_evidence": [{"span_id": "s-17"}]
    }))
    .unwrap();

    let verdict = verify(&before, &after, 0.35);
    assert!(verdict.pass, "unexpected reasons: {}", verdict.reasons());
}
