//! `contextgate verify` — Check a compressed pack against its original.

use contextgate_config::AppConfig;
use contextgate_core::ContextPack;
use contextgate_fidelity::{Verdict, measure, try_verify};
use std::path::Path;
use tracing::debug;

/// Verify `after` against `before`. Returns whether the verdict passed.
pub async fn run(
    before: &Path,
    after: &Path,
    ratio: Option<f64>,
    json: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let ratio = match ratio {
        Some(r) => r,
        None => AppConfig::load()?.fidelity.required_saving_ratio,
    };

    let verdict = verify_files(before, after, ratio).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else {
        print!("{}", render_report(&verdict));
    }

    Ok(verdict.pass)
}

/// Load both pack files and verify them.
pub async fn verify_files(
    before: &Path,
    after: &Path,
    ratio: f64,
) -> contextgate_core::Result<Verdict> {
    let before_pack = load_pack(before).await?;
    let after_pack = load_pack(after).await?;
    debug!(
        before = %before.display(),
        after = %after.display(),
        ratio,
        "Verifying pack files"
    );
    try_verify(before_pack.as_ref(), after_pack.as_ref(), ratio)
}

/// Read a pack from a JSON file. A JSON `null` is an absent pack.
async fn load_pack(path: &Path) -> contextgate_core::Result<Option<ContextPack>> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

/// Human-readable verdict summary.
pub fn render_report(verdict: &Verdict) -> String {
    let mut out = String::new();

    let status = if verdict.pass { "✅ PASS" } else { "❌ FAIL" };
    out.push_str(&format!("{status}\n\n"));
    out.push_str(&format!(
        "   Size:      {} → {} chars (~{} → ~{} tokens)\n",
        verdict.before_len,
        verdict.after_len,
        measure::tokens_for_len(verdict.before_len),
        measure::tokens_for_len(verdict.after_len),
    ));
    out.push_str(&format!(
        "   Saving:    {:.1}% (required {:.1}%)\n",
        verdict.saving_ratio * 100.0,
        verdict.required_saving_ratio * 100.0
    ));

    let mark = |missing: bool| if missing { "lost" } else { "kept" };
    out.push_str(&format!(
        "   Constraints: {}\n   Todos:       {}\n   Evidence:    {}\n",
        mark(verdict.missing_constraints),
        mark(verdict.missing_pending_todos),
        mark(verdict.missing_evidence_refs),
    ));

    if !verdict.pass {
        out.push_str(&format!("\n   Reasons:   {}\n", verdict.reasons()));
        for id in &verdict.lost.constraints {
            out.push_str(&format!("   - constraint: {id}\n"));
        }
        for id in &verdict.lost.pending_todos {
            out.push_str(&format!("   - todo: {id}\n"));
        }
        for id in &verdict.lost.evidence_refs {
            out.push_str(&format!("   - evidence: {id}\n"));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_json(value: serde_json::Value) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{value}").unwrap();
        file
    }

    fn before_json() -> serde_json::Value {
        serde_json::json!({
            "goal": "Fix the flaky test",
            "summary": "Ran the suite many times, narrowed it to a timing issue. ".repeat(10),
            "active_constraints": ["do not touch CI config"],
            "pending_todos": [{"memory_id": "t1", "content": "add retry"}],
            "execution_evidence": [{"span_id": "run-3", "summary": "failed at 2.1s"}]
        })
    }

    #[tokio::test]
    async fn verify_files_passes_faithful_compression() {
        let before = write_json(before_json());
        let after = write_json(serde_json::json!({
            "goal": "Fix the flaky test",
            "summary": "Timing issue.",
            "active_constraints": ["do not touch CI config"],
            "pending_todos": [{"memory_id": "t1"}],
            "execution_evidence": [{"span_id": "run-3"}]
        }));

        let verdict = verify_files(before.path(), after.path(), 0.35).await.unwrap();
        assert!(verdict.pass);
    }

    #[tokio::test]
    async fn verify_files_reports_lost_evidence() {
        let before = write_json(before_json());
        let after = write_json(serde_json::json!({
            "goal": "Fix the flaky test",
            "active_constraints": ["do not touch CI config"],
            "pending_todos": [{"memory_id": "t1"}]
        }));

        let verdict = verify_files(before.path(), after.path(), 0.35).await.unwrap();
        assert!(!verdict.pass);
        assert_eq!(verdict.reasons(), "evidence_refs_lost");

        let report = render_report(&verdict);
        assert!(report.contains("FAIL"));
        assert!(report.contains("evidence: run-3"));
    }

    #[tokio::test]
    async fn null_pack_is_invalid_input() {
        let before = write_json(before_json());
        let after = write_json(serde_json::Value::Null);

        let err = verify_files(before.path(), after.path(), 0.35).await.unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let before = write_json(before_json());
        let err = verify_files(before.path(), Path::new("/nonexistent/after.json"), 0.35)
            .await
            .unwrap_err();
        assert!(matches!(err, contextgate_core::Error::Io(_)));
    }

    #[test]
    fn report_for_pass_has_no_reasons() {
        let pack = ContextPack::new("g").with_summary("s".repeat(100));
        let small = ContextPack::new("g");
        let verdict = contextgate_fidelity::verify(&pack, &small, 0.35);
        let report = render_report(&verdict);
        assert!(report.contains("PASS"));
        assert!(!report.contains("Reasons"));
    }
}
