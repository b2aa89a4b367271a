use crate::foundation::error::{PresenterError, PresenterResult};

/// Baseline speaking rate.
pub const BASELINE_WPM: f64 = 150.0;
/// Word length (in characters) that takes exactly one baseline word slot.
pub const REFERENCE_WORD_CHARS: f64 = 6.0;
/// Shortest duration assigned to a single word.
pub const MIN_WORD_MS: f64 = 350.0;
/// Longest duration assigned to a single word.
pub const MAX_WORD_MS: f64 = 1200.0;
/// Silence inserted after every word.
pub const INTER_WORD_PAUSE_MS: f64 = 60.0;
/// Narration length assumed for an empty script.
pub const EMPTY_SCRIPT_MS: f64 = 10_000.0;
/// Trailing pad added to timed (non-speech-engine) narration.
pub const NARRATION_PAD_MS: f64 = 800.0;
/// Trailing pad used when reporting progress.
pub const PROGRESS_PAD_MS: f64 = 500.0;

/// One word and the interval during which it is (estimated to be) spoken.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordTiming {
    /// The word as written in the script, punctuation included.
    pub word: String,
    /// Interval start, milliseconds since narration start.
    pub start_ms: f64,
    /// Interval end, always `> start_ms`.
    pub end_ms: f64,
}

impl WordTiming {
    /// Interval length.
    pub fn duration_ms(&self) -> f64 {
        self.end_ms - self.start_ms
    }

    /// Inclusive containment test.
    pub fn contains(&self, t_ms: f64) -> bool {
        t_ms >= self.start_ms && t_ms <= self.end_ms
    }

    /// Triangular mouth envelope: rises linearly over the first half, falls over the second.
    pub fn envelope_at(&self, t_ms: f64) -> f32 {
        let rel = ((t_ms - self.start_ms) / self.duration_ms()).clamp(0.0, 1.0);
        let env = if rel < 0.5 { rel * 2.0 } else { (1.0 - rel) * 2.0 };
        env as f32
    }
}

/// Ordered, script-order sequence of [`WordTiming`]s.
///
/// A timeline is a pure function of the script: recomputing it for new text replaces it wholesale.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Timeline {
    words: Vec<WordTiming>,
}

impl Timeline {
    /// Estimate word timings for `script`.
    ///
    /// Words are split on any whitespace (newlines included). Each word gets a duration proportional
    /// to its character count relative to [`REFERENCE_WORD_CHARS`] at [`BASELINE_WPM`], clamped to
    /// `[MIN_WORD_MS, MAX_WORD_MS]`, followed by [`INTER_WORD_PAUSE_MS`] of silence. Durations are
    /// whole milliseconds so interval bounds stay exact under accumulation.
    pub fn estimate(script: &str) -> Self {
        let ms_per_word = 60_000.0 / BASELINE_WPM;
        let mut t = 0.0;
        let words = script
            .split_whitespace()
            .map(|w| {
                let chars = w.chars().count() as f64;
                let dur = (ms_per_word * chars / REFERENCE_WORD_CHARS)
                    .round()
                    .clamp(MIN_WORD_MS, MAX_WORD_MS);
                let entry = WordTiming {
                    word: w.to_string(),
                    start_ms: t,
                    end_ms: t + dur,
                };
                t += dur + INTER_WORD_PAUSE_MS;
                entry
            })
            .collect();
        Self { words }
    }

    /// Build a timeline from explicit entries, checking ordering invariants.
    pub fn from_words(words: Vec<WordTiming>) -> PresenterResult<Self> {
        let mut prev_end = f64::NEG_INFINITY;
        for w in &words {
            if !(w.start_ms.is_finite() && w.end_ms.is_finite()) {
                return Err(PresenterError::validation("word timing must be finite"));
            }
            if w.end_ms <= w.start_ms {
                return Err(PresenterError::validation(format!(
                    "word '{}' must end after it starts",
                    w.word
                )));
            }
            if w.start_ms < prev_end {
                return Err(PresenterError::validation(format!(
                    "word '{}' overlaps the previous word",
                    w.word
                )));
            }
            prev_end = w.end_ms;
        }
        Ok(Self { words })
    }

    /// Entries in script order.
    pub fn words(&self) -> &[WordTiming] {
        &self.words
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// `true` for empty or whitespace-only scripts.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// End of the last word, if any.
    pub fn end_ms(&self) -> Option<f64> {
        self.words.last().map(|w| w.end_ms)
    }

    /// The first word whose interval contains `t_ms`.
    pub fn active_at(&self, t_ms: f64) -> Option<&WordTiming> {
        // Entries are sorted and non-overlapping, so the only candidate is the last one that
        // starts at or before `t_ms`.
        let idx = self.words.partition_point(|w| w.start_ms <= t_ms);
        let w = self.words.get(idx.checked_sub(1)?)?;
        w.contains(t_ms).then_some(w)
    }

    /// How long timed narration waits: last word end (or a default for empty scripts) plus pad.
    pub fn narration_duration_ms(&self) -> f64 {
        self.end_ms().unwrap_or(EMPTY_SCRIPT_MS) + NARRATION_PAD_MS
    }

    /// Denominator used for progress reporting.
    pub fn progress_total_ms(&self) -> f64 {
        self.end_ms().unwrap_or(0.0) + PROGRESS_PAD_MS
    }

    /// Fraction of the narration elapsed, in `[0, 1]`.
    pub fn progress(&self, elapsed_ms: f64) -> f64 {
        let total = self.progress_total_ms();
        if total <= 0.0 {
            return 0.0;
        }
        (elapsed_ms / total).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timing/estimator.rs"]
mod tests;
