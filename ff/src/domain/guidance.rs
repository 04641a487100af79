//! Coach response types
//!
//! What comes back from one generation request. Only the task list feeds the
//! garden; the rest is presentation.

use serde::{Deserialize, Deserializer, Serialize};

use super::task::{Difficulty, Task};

/// User's self-reported energy, sent to the model as context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyLevel {
    #[default]
    High,
    Low,
}

impl std::fmt::Display for EnergyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Low => write!(f, "low"),
        }
    }
}

impl std::str::FromStr for EnergyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" | "h" => Ok(Self::High),
            "low" | "l" => Ok(Self::Low),
            other => Err(format!("unknown energy level '{}' (expected high or low)", other)),
        }
    }
}

/// Emotional state the model read from the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Anxious,
    Motivated,
    Exhausted,
    #[default]
    Neutral,
}

impl Emotion {
    /// Map free text onto the known set; anything else reads as neutral
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "anxious" | "panic" | "stressed" => Self::Anxious,
            "motivated" | "excited" => Self::Motivated,
            "exhausted" | "tired" => Self::Exhausted,
            _ => Self::Neutral,
        }
    }
}

impl<'de> Deserialize<'de> for Emotion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse_lenient(&s))
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anxious => write!(f, "anxious"),
            Self::Motivated => write!(f, "motivated"),
            Self::Exhausted => write!(f, "exhausted"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

/// Parsed generation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guidance {
    pub tasks: Vec<Task>,

    /// Encouraging message shown above the tasks
    pub message: String,

    #[serde(default)]
    pub tone: String,

    /// Conversational variant of `message`, meant for text-to-speech
    #[serde(default)]
    pub spoken_response: String,

    #[serde(default)]
    pub detected_emotion: Option<Emotion>,
}

impl Guidance {
    /// Canned response used whenever generation fails
    pub fn fallback() -> Self {
        let mut breathe = Task::new("fallback", "Breathe & Reset", "2 mins")
            .with_reward(10)
            .with_difficulty(Difficulty::Easy);
        breathe.reasoning = Some("System fallback".to_string());

        Self {
            tasks: vec![breathe],
            message: "I heard you, but I'm having trouble processing the details. Let's start with a simple breath."
                .to_string(),
            tone: "neutral".to_string(),
            spoken_response: "I'm having a little trouble connecting. Just breathe for a moment.".to_string(),
            detected_emotion: Some(Emotion::Neutral),
        }
    }

    pub fn emotion(&self) -> Emotion {
        self.detected_emotion.unwrap_or_default()
    }
}
