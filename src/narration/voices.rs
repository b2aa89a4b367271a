use crate::capability::speech::Voice;

const PREFERRED_NAME_HINTS: [&str; 3] = ["female", "frau", "google deutsch"];

fn is_german(v: &Voice) -> bool {
    v.lang.to_ascii_lowercase().starts_with("de")
}

/// Pick the default voice.
///
/// Prefers a German voice whose name suggests a female speaker, then any German voice, then
/// whatever comes first.
pub fn preferred_voice(voices: &[Voice]) -> Option<&Voice> {
    voices
        .iter()
        .find(|v| {
            let name = v.name.to_lowercase();
            is_german(v) && PREFERRED_NAME_HINTS.iter().any(|h| name.contains(h))
        })
        .or_else(|| voices.iter().find(|v| is_german(v)))
        .or_else(|| voices.first())
}

/// Resolve an explicitly requested voice name, falling back to [`preferred_voice`].
pub fn select_voice<'a>(voices: &'a [Voice], requested: Option<&str>) -> Option<&'a Voice> {
    match requested.filter(|n| !n.is_empty()) {
        Some(name) => voices
            .iter()
            .find(|v| v.name == name)
            .or_else(|| {
                tracing::warn!(voice = name, "requested voice not found, using preferred voice");
                preferred_voice(voices)
            }),
        None => preferred_voice(voices),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/narration/voices.rs"]
mod tests;
