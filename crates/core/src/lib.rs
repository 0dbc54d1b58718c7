//! Video notes: fetch a YouTube transcript, summarize it with a hosted
//! model and translate the summary into a chosen language.

pub mod cache;
pub mod config;
pub mod error;
pub mod format;
pub mod languages;
pub mod pipeline;
pub mod provider;
pub mod summarizer;
pub mod transcript;
pub mod translator;
pub mod types;
pub mod video_id;

pub use cache::{CacheStats, StageCache, cache_key};
pub use config::{AppConfig, DEFAULT_PROMPT};
pub use error::{Result, VidnotesError};
pub use format::{format_notes_readable, format_timestamp, format_transcript_with_timestamps};
pub use languages::{LANGUAGES, Language};
pub use pipeline::{Pipeline, PipelineCacheStats, PipelineState, Stage, StageFailure};
pub use provider::{Provider, ProviderConfig};
pub use summarizer::{ChatCompletionsModel, GenerativeModel};
pub use transcript::{TranscriptSource, YouTubeTranscripts};
pub use translator::{GoogleTranslate, Translator};
pub use types::{DetailedNotes, NotesRequest, Transcript, TranscriptFragment};
pub use video_id::VideoId;
