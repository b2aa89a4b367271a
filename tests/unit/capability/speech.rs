use super::*;

#[tokio::test]
async fn no_speech_is_unavailable() {
    let s = NoSpeech;
    assert!(!s.is_available());
    assert!(s.list_voices().await.unwrap().is_empty());
    let err = s
        .speak(Utterance {
            text: "Hallo".into(),
            lang: "de-DE".into(),
            voice: None,
            rate: 1.0,
            pitch: 1.05,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, PresenterError::CapabilityUnavailable(_)));
}

#[test]
fn voice_table_parses_espeak_listing() {
    let table = "Pty Language       Age/Gender VoiceName          File                 Other Languages\n \
                 5  de              --/M      German             gmw/de\n \
                 5  en-gb           --/M      English_(Great_Britain) gmw/en\n";
    let voices = parse_voice_table(table);
    assert_eq!(
        voices,
        vec![
            Voice::new("German", "de"),
            Voice::new("English_(Great_Britain)", "en-gb"),
        ]
    );
}

#[test]
fn utterance_maps_to_espeak_arguments() {
    let args = ProcessSpeech::args_for(&Utterance {
        text: "Hallo Welt".into(),
        lang: "de-DE".into(),
        voice: None,
        rate: 1.0,
        pitch: 1.2,
    });
    assert_eq!(args, vec!["-v", "de-de", "-s", "175", "-p", "60", "--", "Hallo Welt"]);
}

#[tokio::test]
async fn missing_program_is_unavailable() {
    let s = ProcessSpeech::detect("smartwelcome-no-such-speech-program");
    assert!(!s.is_available());
    assert!(s.list_voices().await.unwrap_err().is_degradable());
}
