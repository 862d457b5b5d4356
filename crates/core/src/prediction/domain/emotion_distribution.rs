use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::emotion_label::EmotionLabel;

/// Label → score map produced by a prediction backend.
///
/// Labels are whatever vocabulary the backend speaks. The local classifier
/// always fills the seven canonical labels with probabilities; an external
/// analyzer may use its own labels and scale.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmotionDistribution(BTreeMap<String, f64>);

impl EmotionDistribution {
    pub fn new(scores: BTreeMap<String, f64>) -> Self {
        Self(scores)
    }

    /// Map classifier outputs onto the canonical labels by position.
    ///
    /// Returns `None` unless there is exactly one score per label.
    pub fn from_scores(scores: &[f32]) -> Option<Self> {
        if scores.len() != EmotionLabel::ALL.len() {
            return None;
        }
        let map = EmotionLabel::ALL
            .iter()
            .zip(scores)
            .map(|(label, &score)| (label.as_str().to_string(), score as f64))
            .collect();
        Some(Self(map))
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.0.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

}

/// Index of the highest score; the earliest index wins a tie.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }
    best.map(|(i, _)| i)
}
