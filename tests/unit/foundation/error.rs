use super::*;

#[test]
fn constructor_helpers_build_matching_variants() {
    assert!(matches!(StageError::validation("x"), StageError::Validation(_)));
    assert!(matches!(StageError::missing_target("x"), StageError::MissingTarget(_)));
    assert!(matches!(StageError::network("x"), StageError::PlaybackNetwork(_)));
    assert!(matches!(StageError::media("x"), StageError::PlaybackMedia(_)));
    assert!(matches!(
        StageError::unrecoverable("x"),
        StageError::PlaybackUnrecoverable(_)
    ));
}

#[test]
fn display_includes_message() {
    let err = StageError::validation("radius must be > 0");
    assert_eq!(err.to_string(), "validation error: radius must be > 0");

    let err = StageError::network("manifest fetch timed out");
    assert!(err.to_string().contains("manifest fetch timed out"));
}

#[test]
fn anyhow_errors_wrap_transparently() {
    let inner = anyhow::anyhow!("backend exploded");
    let err: StageError = inner.into();
    assert!(matches!(err, StageError::Other(_)));
    assert_eq!(err.to_string(), "backend exploded");
}

#[test]
fn stage_result_round_trips_through_question_mark() {
    fn fails() -> StageResult<()> {
        Err(StageError::validation("nope"))
    }
    fn caller() -> StageResult<u32> {
        fails()?;
        Ok(1)
    }
    assert!(caller().is_err());
}
