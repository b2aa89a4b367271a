use super::*;

fn v(name: &str, lang: &str) -> Voice {
    Voice::new(name, lang)
}

#[test]
fn prefers_female_german_voice() {
    let voices = vec![
        v("Daniel", "en-GB"),
        v("Markus", "de-DE"),
        v("Google Deutsch", "de-DE"),
        v("Anna (Female)", "de-AT"),
    ];
    assert_eq!(preferred_voice(&voices).unwrap().name, "Google Deutsch");
}

#[test]
fn name_hint_is_case_insensitive() {
    let voices = vec![v("Markus", "de-DE"), v("Petra FRAU", "de-DE")];
    assert_eq!(preferred_voice(&voices).unwrap().name, "Petra FRAU");
}

#[test]
fn falls_back_to_any_german_then_first() {
    let voices = vec![v("Samantha female", "en-US"), v("Markus", "de-DE")];
    assert_eq!(preferred_voice(&voices).unwrap().name, "Markus");

    let voices = vec![v("Samantha", "en-US"), v("Thomas", "fr-FR")];
    assert_eq!(preferred_voice(&voices).unwrap().name, "Samantha");

    assert!(preferred_voice(&[]).is_none());
}

#[test]
fn explicit_name_wins_when_present() {
    let voices = vec![v("Markus", "de-DE"), v("Thomas", "fr-FR")];
    assert_eq!(select_voice(&voices, Some("Thomas")).unwrap().name, "Thomas");
    assert_eq!(select_voice(&voices, Some("Nope")).unwrap().name, "Markus");
    assert_eq!(select_voice(&voices, Some("")).unwrap().name, "Markus");
    assert_eq!(select_voice(&voices, None).unwrap().name, "Markus");
}
