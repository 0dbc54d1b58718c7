use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    cache::{CacheStats, StageCache},
    config::AppConfig,
    error::Result,
    languages,
    summarizer::{self, ChatCompletionsModel, GenerativeModel},
    transcript::{TranscriptSource, YouTubeTranscripts},
    translator::{self, GoogleTranslate, Translator},
    types::{DetailedNotes, NotesRequest, Transcript},
    video_id::VideoId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Extracting,
    Summarizing,
    Translating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Extracting,
    Summarizing,
    Translating,
    Done,
    Failed(Stage),
}

/// User-facing failure of one pipeline stage
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageFailure {
    #[error("Error retrieving transcript: {0}")]
    TranscriptUnavailable(String),

    #[error("Error generating content: {0}")]
    GenerationFailure(String),

    #[error("Error translating content: {0}")]
    TranslationFailure(String),
}

impl StageFailure {
    pub fn stage(&self) -> Stage {
        match self {
            StageFailure::TranscriptUnavailable(_) => Stage::Extracting,
            StageFailure::GenerationFailure(_) => Stage::Summarizing,
            StageFailure::TranslationFailure(_) => Stage::Translating,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineCacheStats {
    pub transcripts: CacheStats,
    pub summaries: CacheStats,
    pub translations: CacheStats,
}

type StageResult<T> = std::result::Result<T, StageFailure>;

/// Runs extract → summarize → translate for one request at a time.
///
/// Each stage is memoized by its exact inputs for the lifetime of the
/// pipeline, failures included, until [`Pipeline::clear_caches`] is called.
pub struct Pipeline {
    source: Box<dyn TranscriptSource>,
    model: Box<dyn GenerativeModel>,
    translator: Box<dyn Translator>,
    prompt_template: String,
    state: PipelineState,
    transcripts: StageCache<VideoId, StageResult<Transcript>>,
    summaries: StageCache<(String, String), StageResult<String>>,
    translations: StageCache<(String, String), StageResult<String>>,
}

impl Pipeline {
    pub fn new(
        source: Box<dyn TranscriptSource>,
        model: Box<dyn GenerativeModel>,
        translator: Box<dyn Translator>,
        prompt_template: impl Into<String>,
    ) -> Self {
        Self {
            source,
            model,
            translator,
            prompt_template: prompt_template.into(),
            state: PipelineState::Idle,
            transcripts: StageCache::new(),
            summaries: StageCache::new(),
            translations: StageCache::new(),
        }
    }

    /// Wire the YouTube, chat-completions and Google Translate clients.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(
            Box::new(YouTubeTranscripts::new(config)?),
            Box::new(ChatCompletionsModel::new(config)?),
            Box::new(GoogleTranslate::new(config)?),
            config.prompt_template.clone(),
        ))
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn cache_stats(&self) -> PipelineCacheStats {
        PipelineCacheStats {
            transcripts: self.transcripts.stats(),
            summaries: self.summaries.stats(),
            translations: self.translations.stats(),
        }
    }

    pub fn clear_caches(&mut self) {
        self.transcripts.clear();
        self.summaries.clear();
        self.translations.clear();
    }

    pub async fn run(&mut self, request: &NotesRequest) -> StageResult<DetailedNotes> {
        self.run_with(request, |_| {}).await
    }

    /// Run the pipeline, reporting every state change to `observer`.
    pub async fn run_with<F>(
        &mut self,
        request: &NotesRequest,
        mut observer: F,
    ) -> StageResult<DetailedNotes>
    where
        F: FnMut(&PipelineState),
    {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "pipeline_run",
            %run_id,
            link = %request.video_link,
            target = %request.target_language
        );

        let result = self.execute(request, &mut observer).instrument(span).await;
        self.transition(PipelineState::Idle, &mut observer);
        result
    }

    async fn execute(
        &mut self,
        request: &NotesRequest,
        observer: &mut dyn FnMut(&PipelineState),
    ) -> StageResult<DetailedNotes> {
        self.transition(PipelineState::Extracting, observer);
        let transcript = match self.extract(&request.video_link).await {
            Ok(transcript) => transcript,
            Err(failure) => return Err(self.fail(failure, observer)),
        };

        self.transition(PipelineState::Summarizing, observer);
        let summary = match self.summarize(&transcript.joined_text()).await {
            Ok(summary) => summary,
            Err(failure) => return Err(self.fail(failure, observer)),
        };

        self.transition(PipelineState::Translating, observer);
        let (language, text) = match self.translate(&summary, &request.target_language).await {
            Ok(translated) => translated,
            Err(failure) => return Err(self.fail(failure, observer)),
        };

        self.transition(PipelineState::Done, observer);
        tracing::info!(language = language.code, chars = text.len(), "notes ready");

        Ok(DetailedNotes {
            video_id: transcript.video_id,
            language_code: language.code.to_string(),
            language_name: language.name.to_string(),
            text,
        })
    }

    /// Resolve the link and fetch its transcript.
    pub async fn extract(&mut self, video_link: &str) -> StageResult<Transcript> {
        let video_id = VideoId::parse(video_link)
            .map_err(|e| StageFailure::TranscriptUnavailable(e.to_string()))?;

        let source = self.source.as_ref();
        let lookup = video_id.clone();
        self.transcripts
            .get_or_compute(video_id, move || fetch_transcript(source, lookup))
            .await
    }

    /// Summarize transcript text with the configured instruction prompt.
    pub async fn summarize(&mut self, transcript_text: &str) -> StageResult<String> {
        let key = (transcript_text.to_string(), self.prompt_template.clone());
        let (text, prompt) = key.clone();

        let model = self.model.as_ref();
        self.summaries
            .get_or_compute(key, move || generate_summary(model, text, prompt))
            .await
    }

    /// Translate `text` into the catalog language named by `target`.
    pub async fn translate(
        &mut self,
        text: &str,
        target: &str,
    ) -> StageResult<(languages::Language, String)> {
        let language = languages::resolve(target)
            .map_err(|e| StageFailure::TranslationFailure(e.to_string()))?;

        let key = (text.to_string(), language.code.to_string());
        let lookup = text.to_string();

        let service = self.translator.as_ref();
        let translated = self
            .translations
            .get_or_compute(key, move || translate_text(service, lookup, language))
            .await?;
        Ok((language, translated))
    }

    fn transition(&mut self, state: PipelineState, observer: &mut dyn FnMut(&PipelineState)) {
        tracing::debug!(from = ?self.state, to = ?state, "pipeline transition");
        self.state = state;
        observer(&self.state);
    }

    fn fail(
        &mut self,
        failure: StageFailure,
        observer: &mut dyn FnMut(&PipelineState),
    ) -> StageFailure {
        tracing::warn!(stage = ?failure.stage(), error = %failure, "pipeline halted");
        self.transition(PipelineState::Failed(failure.stage()), observer);
        failure
    }
}

async fn fetch_transcript(
    source: &dyn TranscriptSource,
    video_id: VideoId,
) -> StageResult<Transcript> {
    let transcript = source
        .fetch(&video_id)
        .await
        .map_err(|e| StageFailure::TranscriptUnavailable(e.to_string()))?;

    if transcript.joined_text().is_empty() {
        return Err(StageFailure::TranscriptUnavailable(format!(
            "video {} has no caption text",
            video_id
        )));
    }

    tracing::info!(
        %video_id,
        fragments = transcript.fragments.len(),
        duration_secs = transcript.duration_seconds(),
        language = %transcript.language_code,
        "transcript extracted"
    );
    Ok(transcript)
}

async fn generate_summary(
    model: &dyn GenerativeModel,
    transcript: String,
    prompt: String,
) -> StageResult<String> {
    summarizer::summarize(model, &transcript, &prompt)
        .await
        .map_err(|e| StageFailure::GenerationFailure(e.to_string()))
}

async fn translate_text(
    service: &dyn Translator,
    text: String,
    language: languages::Language,
) -> StageResult<String> {
    translator::translate(service, &text, language.code)
        .await
        .map(|(_, translated)| translated)
        .map_err(|e| StageFailure::TranslationFailure(e.to_string()))
}
