//! Core type definitions for detection inputs and outcomes

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Facial expression classes recognized by the expression model.
///
/// Declaration order is canonical: it mirrors the class order of the
/// expression net's output layer and doubles as the tie-break priority
/// when two labels score equally (the ranking sort is stable, so the
/// earlier label stays in front).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mood {
    Neutral,
    Happy,
    Sad,
    Angry,
    Fearful,
    Disgusted,
    Surprised,
}

impl Mood {
    /// Every label in canonical order.
    pub const ALL: [Mood; 7] = [
        Mood::Neutral,
        Mood::Happy,
        Mood::Sad,
        Mood::Angry,
        Mood::Fearful,
        Mood::Disgusted,
        Mood::Surprised,
    ];

    /// Lowercase label as the catalog backend tags tracks.
    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Neutral => "neutral",
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Angry => "angry",
            Mood::Fearful => "fearful",
            Mood::Disgusted => "disgusted",
            Mood::Surprised => "surprised",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A string that names no known mood label.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown mood label: {0}")]
pub struct ParseMoodError(String);

impl FromStr for Mood {
    type Err = ParseMoodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mood::ALL
            .into_iter()
            .find(|mood| mood.as_str() == s)
            .ok_or_else(|| ParseMoodError(s.to_owned()))
    }
}

/// Per-label confidence scores for one detected face.
///
/// Scores are sanitized on insertion: non-finite values collapse to 0.0
/// and everything is clamped to `[0, 1]`, so downstream ranking never
/// sees NaN.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExpressionScores {
    scores: [f32; Mood::ALL.len()],
}

impl ExpressionScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion, mostly useful when assembling scores by
    /// hand.
    pub fn with(mut self, mood: Mood, score: f32) -> Self {
        self.set(mood, score);
        self
    }

    pub fn set(&mut self, mood: Mood, score: f32) {
        let score = if score.is_finite() { score } else { 0.0 };
        self.scores[mood.index()] = score.clamp(0.0, 1.0);
    }

    pub fn get(&self, mood: Mood) -> f32 {
        self.scores[mood.index()]
    }

    /// All labels ordered best-first.
    ///
    /// The sort is stable over canonical order, so equal scores resolve
    /// to the earlier canonical label. Because insertion sanitizes, the
    /// comparison never meets a NaN.
    pub fn ranking(&self) -> Vec<(Mood, f32)> {
        let mut ranked: Vec<(Mood, f32)> = Mood::ALL
            .iter()
            .map(|&mood| (mood, self.get(mood)))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }
}

/// What the expression model saw in one frame.
#[derive(Clone, Debug)]
pub enum FaceScan {
    /// No face found.
    NoFace,
    /// Exactly one face, with its expression scores.
    Single(ExpressionScores),
    /// More than one candidate face; downstream this folds into a
    /// no-detection outcome rather than guessing which face to score.
    Ambiguous { faces: usize },
}

/// Outcome of one detection pass.
#[derive(Clone, Debug, PartialEq)]
pub enum MoodResult {
    /// One face was scored; `label` is the top-ranked expression and
    /// `ranking` holds every label best-first.
    Detected { label: Mood, ranking: Vec<(Mood, f32)> },
    /// Zero faces, too many faces, or a failed scan.
    NotDetected,
}

impl MoodResult {
    /// Rank `scores` and take the winner.
    pub fn from_scores(scores: &ExpressionScores) -> Self {
        let ranking = scores.ranking();
        let label = ranking[0].0;
        MoodResult::Detected { label, ranking }
    }

    pub fn label(&self) -> Option<Mood> {
        match self {
            MoodResult::Detected { label, .. } => Some(*label),
            MoodResult::NotDetected => None,
        }
    }

    pub fn is_detected(&self) -> bool {
        matches!(self, MoodResult::Detected { .. })
    }
}

/// A single decoded RGBA8 sample from the camera stream.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data,
            captured_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_maximum_wins() {
        let scores = ExpressionScores::new()
            .with(Mood::Happy, 0.81)
            .with(Mood::Neutral, 0.12)
            .with(Mood::Sad, 0.05);
        assert_eq!(MoodResult::from_scores(&scores).label(), Some(Mood::Happy));
    }

    #[test]
    fn equal_scores_resolve_to_canonical_order() {
        // neutral precedes happy in the canonical order, so a perfect tie
        // lands on neutral
        let scores = ExpressionScores::new()
            .with(Mood::Happy, 0.5)
            .with(Mood::Neutral, 0.5);
        assert_eq!(
            MoodResult::from_scores(&scores).label(),
            Some(Mood::Neutral)
        );
    }

    #[test]
    fn ranking_orders_every_label_best_first() {
        let scores = ExpressionScores::new()
            .with(Mood::Surprised, 0.7)
            .with(Mood::Angry, 0.2)
            .with(Mood::Happy, 0.1);
        let ranking = scores.ranking();
        assert_eq!(ranking.len(), Mood::ALL.len());
        assert_eq!(ranking[0], (Mood::Surprised, 0.7));
        assert_eq!(ranking[1], (Mood::Angry, 0.2));
        assert_eq!(ranking[2], (Mood::Happy, 0.1));
        // the zero-scored rest keeps canonical order
        assert_eq!(ranking[3].0, Mood::Neutral);
    }

    #[test]
    fn insertion_sanitizes_scores() {
        let scores = ExpressionScores::new()
            .with(Mood::Happy, f32::NAN)
            .with(Mood::Sad, f32::INFINITY)
            .with(Mood::Angry, -0.4)
            .with(Mood::Fearful, 1.7);
        assert_eq!(scores.get(Mood::Happy), 0.0);
        assert_eq!(scores.get(Mood::Sad), 1.0);
        assert_eq!(scores.get(Mood::Angry), 0.0);
        assert_eq!(scores.get(Mood::Fearful), 1.0);
    }

    #[test]
    fn all_zero_scores_still_detect_the_first_canonical_label() {
        let result = MoodResult::from_scores(&ExpressionScores::new());
        assert_eq!(result.label(), Some(Mood::Neutral));
    }

    #[test]
    fn labels_render_lowercase() {
        assert_eq!(Mood::Happy.to_string(), "happy");
        assert_eq!(Mood::Disgusted.as_str(), "disgusted");
    }

    #[test]
    fn every_label_parses_back_from_its_string_form() {
        for mood in Mood::ALL {
            assert_eq!(mood.as_str().parse(), Ok(mood));
        }
    }

    #[test]
    fn unknown_labels_fail_to_parse_with_the_offending_input() {
        let err = "joyful".parse::<Mood>().unwrap_err();
        assert_eq!(err.to_string(), "unknown mood label: joyful");
    }
}
