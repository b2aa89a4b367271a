use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        PresenterError::permission_denied("mic")
            .to_string()
            .contains("permission denied:")
    );
    assert!(
        PresenterError::unavailable("tts")
            .to_string()
            .contains("capability unavailable:")
    );
    assert!(
        PresenterError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        PresenterError::capture("x")
            .to_string()
            .contains("capture error:")
    );
    assert_eq!(
        PresenterError::ReentrantStart.to_string(),
        "session already running"
    );
}

#[test]
fn only_permission_and_capability_errors_degrade() {
    assert!(PresenterError::permission_denied("x").is_degradable());
    assert!(PresenterError::unavailable("x").is_degradable());
    assert!(!PresenterError::ReentrantStart.is_degradable());
    assert!(!PresenterError::render("x").is_degradable());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = PresenterError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
