use super::error::DigestError;
use super::summarize::{ChunkOutcome, ChunkResult};

/// Exactly one blank line between chunk bodies.
pub const CHUNK_SEPARATOR: &str = "\n\n";

/// Order results by batch index, keep non-empty successes and join them.
/// Fails when nothing survives rather than returning an empty body.
pub fn assemble_body(mut results: Vec<ChunkResult>) -> Result<String, DigestError> {
    results.sort_by_key(|r| r.index);

    let parts: Vec<&str> = results
        .iter()
        .filter(|r| r.has_text())
        .filter_map(|r| match &r.outcome {
            ChunkOutcome::Success(text) => Some(text.trim_matches(|c| c == '\n' || c == '\r')),
            ChunkOutcome::Failure(_) => None,
        })
        .collect();

    if parts.is_empty() {
        let failed = results.iter().filter(|r| !r.has_text()).count();
        return Err(DigestError::NoUsableOutput { chunks: results.len(), failed });
    }
    Ok(parts.join(CHUNK_SEPARATOR))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(index: usize, text: &str) -> ChunkResult {
        ChunkResult { index, outcome: ChunkOutcome::Success(text.into()) }
    }

    fn failed(index: usize) -> ChunkResult {
        ChunkResult { index, outcome: ChunkOutcome::Failure("boom".into()) }
    }

    #[test]
    fn single_chunk_body_is_that_text() {
        let body = assemble_body(vec![ok(0, "### Only\n- **source**: HN")]).unwrap();
        assert_eq!(body, "### Only\n- **source**: HN");
    }

    #[test]
    fn restores_batch_order_regardless_of_arrival() {
        let body = assemble_body(vec![ok(2, "C"), ok(0, "A"), ok(1, "B")]).unwrap();
        assert_eq!(body, "A\n\nB\n\nC");
    }

    #[test]
    fn middle_failure_keeps_survivors_with_one_blank_line() {
        let body = assemble_body(vec![ok(0, "one"), failed(1), ok(2, "three")]).unwrap();
        assert_eq!(body, "one\n\nthree");
    }

    #[test]
    fn trailing_newlines_do_not_widen_the_gap() {
        let body = assemble_body(vec![ok(0, "one\n\n"), ok(1, "\ntwo\n")]).unwrap();
        assert_eq!(body, "one\n\ntwo");
    }

    #[test]
    fn empty_successes_are_dropped() {
        let body = assemble_body(vec![ok(0, "  \n"), ok(1, "kept")]).unwrap();
        assert_eq!(body, "kept");
    }

    #[test]
    fn all_failed_is_terminal() {
        let err = assemble_body(vec![failed(1), failed(0)]).unwrap_err();
        assert!(matches!(err, DigestError::NoUsableOutput { chunks: 2, failed: 2 }));
        assert!(err.to_string().contains("could not produce a report"));

        let err = assemble_body(vec![ok(0, ""), failed(1)]).unwrap_err();
        assert!(matches!(err, DigestError::NoUsableOutput { chunks: 2, failed: 2 }));

        assert!(assemble_body(Vec::new()).is_err());
    }
}
