use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioItemState {
    Received,
    Transcribing,
    Classifying,
    Recorded,
    Skipped,
}

impl AudioItemState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioItemState::Received => "RECEIVED",
            AudioItemState::Transcribing => "TRANSCRIBING",
            AudioItemState::Classifying => "CLASSIFYING",
            AudioItemState::Recorded => "RECORDED",
            AudioItemState::Skipped => "SKIPPED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AudioItemState::Recorded | AudioItemState::Skipped)
    }

    pub fn can_transition_to(&self, next: AudioItemState) -> bool {
        use AudioItemState::*;
        matches!(
            (*self, next),
            (Received, Transcribing)
                | (Received, Skipped)
                | (Transcribing, Classifying)
                | (Transcribing, Skipped)
                | (Classifying, Recorded)
        )
    }
}

impl FromStr for AudioItemState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RECEIVED" => Ok(AudioItemState::Received),
            "TRANSCRIBING" => Ok(AudioItemState::Transcribing),
            "CLASSIFYING" => Ok(AudioItemState::Classifying),
            "RECORDED" => Ok(AudioItemState::Recorded),
            "SKIPPED" => Ok(AudioItemState::Skipped),
            _ => Err(format!("Invalid audio item state: {}", s)),
        }
    }
}

impl fmt::Display for AudioItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
