use super::*;

#[test]
fn modes_use_snake_case_on_the_wire() {
    let m = SessionMode::new(CaptureTarget::Tab, NarrationMode::DeviceSpeech);
    let s = serde_json::to_string(&m).unwrap();
    assert_eq!(s, r#"{"capture":"tab","narration":"device_speech"}"#);
    assert!(m.include_audio());
    assert!(!SessionMode::default().include_audio());
}

#[test]
fn defaults_are_canvas_with_device_speech() {
    let m: SessionMode =
        serde_json::from_str(r#"{"capture":"canvas","narration":"microphone"}"#).unwrap();
    assert_eq!(m, SessionMode::new(CaptureTarget::Canvas, NarrationMode::Microphone));
    assert_eq!(
        SessionMode::default(),
        SessionMode::new(CaptureTarget::Canvas, NarrationMode::DeviceSpeech)
    );
}
