use std::fmt;

/// The seven expression classes of the local classifier, in its output
/// order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EmotionLabel {
    Angry,
    Disgust,
    Fear,
    Happy,
    Neutral,
    Sad,
    Surprise,
}

impl EmotionLabel {
    /// Classifier output order.
    pub const ALL: [EmotionLabel; 7] = [
        EmotionLabel::Angry,
        EmotionLabel::Disgust,
        EmotionLabel::Fear,
        EmotionLabel::Happy,
        EmotionLabel::Neutral,
        EmotionLabel::Sad,
        EmotionLabel::Surprise,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionLabel::Angry => "angry",
            EmotionLabel::Disgust => "disgust",
            EmotionLabel::Fear => "fear",
            EmotionLabel::Happy => "happy",
            EmotionLabel::Neutral => "neutral",
            EmotionLabel::Sad => "sad",
            EmotionLabel::Surprise => "surprise",
        }
    }

    pub fn from_index(index: usize) -> Option<EmotionLabel> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_order() {
        let names: Vec<&str> = EmotionLabel::ALL.iter().map(|l| l.as_str()).collect();
        assert_eq!(
            names,
            ["angry", "disgust", "fear", "happy", "neutral", "sad", "surprise"]
        );
    }

    #[test]
    fn test_from_index() {
        assert_eq!(EmotionLabel::from_index(3), Some(EmotionLabel::Happy));
        assert_eq!(EmotionLabel::from_index(6), Some(EmotionLabel::Surprise));
        assert_eq!(EmotionLabel::from_index(7), None);
    }

    #[test]
    fn test_display_matches_as_str() {
        assert_eq!(EmotionLabel::Neutral.to_string(), "neutral");
    }
}
