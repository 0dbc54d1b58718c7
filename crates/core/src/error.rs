use thiserror::Error;

#[derive(Error, Debug)]
pub enum VidnotesError {
    #[error("Invalid video reference: {reference}")]
    InvalidVideoReference { reference: String },

    #[error("Video {video_id} is unavailable")]
    VideoUnavailable { video_id: String },

    #[error("Video {video_id} is unplayable: {reason}")]
    VideoUnplayable { video_id: String, reason: String },

    #[error("Video {video_id} is age restricted")]
    AgeRestricted { video_id: String },

    #[error("Requests for video {video_id} are being blocked by YouTube")]
    RequestBlocked { video_id: String },

    #[error("Transcripts are disabled for video {video_id}")]
    TranscriptsDisabled { video_id: String },

    #[error("No transcript found for video {video_id} in languages {languages:?}")]
    NoTranscriptFound {
        video_id: String,
        languages: Vec<String>,
    },

    #[error("Could not parse YouTube page data for video {video_id}")]
    YouTubeDataUnparsable { video_id: String },

    #[error("HTTP {status} from {service}")]
    HttpStatus { service: &'static str, status: u16 },

    #[error("Invalid API response: {reason}")]
    InvalidApiResponse { reason: String },

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },

    #[error("Unsupported language: {language}")]
    UnsupportedLanguage { language: String },

    #[error("Nothing to {action}: input text is empty")]
    EmptyInput { action: &'static str },

    #[error("{service} returned an empty response")]
    EmptyOutput { service: &'static str },

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, VidnotesError>;
