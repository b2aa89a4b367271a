use super::*;

#[test]
fn empty_object_yields_defaults() {
    let cfg = PresenterConfig::from_reader("{}".as_bytes()).unwrap();
    assert_eq!(cfg, PresenterConfig::default());
    assert_eq!(cfg.lang, "de-DE");
    assert_eq!(cfg.mime_type, "video/webm;codecs=vp9");
    assert_eq!(cfg.download_name, "smartwelcome.webm");
    assert_eq!((cfg.canvas.width, cfg.canvas.height), (1280, 720));
    assert_eq!(cfg.fps.num, 30);
    assert!((cfg.pitch - 1.05).abs() < 1e-6);
}

#[test]
fn modes_and_overrides_parse() {
    let json = r#"{
        "script": "Hallo Welt",
        "capture": "tab",
        "narration": "microphone",
        "canvas": { "width": 320, "height": 180 },
        "mic_pcm": { "path": "mic.f32", "sample_rate": 48000, "channels": 1 }
    }"#;
    let cfg = PresenterConfig::from_reader(json.as_bytes()).unwrap();
    assert_eq!(cfg.script, "Hallo Welt");
    assert_eq!(
        cfg.session_mode(),
        SessionMode::new(CaptureTarget::Tab, NarrationMode::Microphone)
    );
    assert_eq!(cfg.canvas.width, 320);
    assert_eq!(cfg.mic_pcm.as_ref().map(|p| p.channels), Some(1));
}

#[test]
fn unknown_fields_and_bad_values_are_rejected() {
    assert!(PresenterConfig::from_reader(r#"{"bogus": 1}"#.as_bytes()).is_err());
    assert!(
        PresenterConfig::from_reader(r#"{"canvas": {"width": 0, "height": 10}}"#.as_bytes())
            .is_err()
    );
    assert!(PresenterConfig::from_reader(r#"{"rate": 0.0}"#.as_bytes()).is_err());
    assert!(PresenterConfig::from_reader(r#"{"download_name": "a/b.webm"}"#.as_bytes()).is_err());
}

#[test]
fn default_script_is_german_welcome() {
    assert!(DEFAULT_SCRIPT.starts_with("Willkommen bei SmartWelcome.de!"));
    assert!(DEFAULT_SCRIPT.contains('\n'));
}

#[test]
fn missing_font_is_none() {
    let cfg = PresenterConfig::default();
    assert!(cfg.load_font().unwrap().is_none());
}
