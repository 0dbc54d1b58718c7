use serde::{Deserialize, Serialize};

use crate::video_id::VideoId;

/// One caption unit as returned by the transcript source, times in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptFragment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub video_id: VideoId,
    pub language_code: String,
    pub fragments: Vec<TranscriptFragment>,
}

impl Transcript {
    /// Fragment texts in source order, separated by single spaces
    pub fn joined_text(&self) -> String {
        self.fragments
            .iter()
            .map(|f| f.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn duration_seconds(&self) -> f64 {
        self.fragments
            .last()
            .map(|f| f.start + f.duration)
            .unwrap_or(0.0)
    }
}

/// A user action: summarize `video_link` and translate the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotesRequest {
    pub video_link: String,
    /// Language code or display name from the catalog
    pub target_language: String,
}

impl NotesRequest {
    pub fn new(video_link: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            video_link: video_link.into(),
            target_language: target_language.into(),
        }
    }
}

/// Output of a successful pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedNotes {
    pub video_id: VideoId,
    pub language_code: String,
    pub language_name: String,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(text: &str, start: f64) -> TranscriptFragment {
        TranscriptFragment {
            text: text.to_string(),
            start,
            duration: 2.0,
        }
    }

    #[test]
    fn test_joined_text_preserves_order() {
        let transcript = Transcript {
            video_id: VideoId::parse("abc123").unwrap(),
            language_code: "en".to_string(),
            fragments: vec![
                fragment("second comes", 0.0),
                fragment(" first ", 2.0),
                fragment("", 4.0),
                fragment("last", 6.0),
            ],
        };
        assert_eq!(transcript.joined_text(), "second comes first last");
        assert_eq!(transcript.duration_seconds(), 8.0);
    }

    #[test]
    fn test_empty_transcript() {
        let transcript = Transcript {
            video_id: VideoId::parse("abc123").unwrap(),
            language_code: "en".to_string(),
            fragments: vec![],
        };
        assert_eq!(transcript.joined_text(), "");
        assert_eq!(transcript.duration_seconds(), 0.0);
    }
}
