use std::{
    io::Write,
    time::{Duration, Instant},
};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use vidnotes_core::{
    AppConfig, DetailedNotes, LANGUAGES, NotesRequest, Pipeline, PipelineState, Provider,
    StageFailure, VideoId, format_notes_readable, format_transcript_with_timestamps,
};

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Default, ValueEnum)]
enum CliProvider {
    #[default]
    Gemini,
    Openai,
    Grok,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Gemini => Provider::Gemini,
            CliProvider::Openai => Provider::Openai,
            CliProvider::Grok => Provider::Grok,
        }
    }
}

#[derive(Parser)]
#[command(name = "vidnotes")]
#[command(about = "Summarize YouTube videos from their transcripts and translate the notes")]
struct Cli {
    /// Video URL or id
    #[arg(required_unless_present_any = ["interactive", "list_languages"])]
    url: Option<String>,

    /// Notes language, as a code or a name (e.g., "fr", "german")
    #[arg(short, long, default_value = "en")]
    lang: String,

    /// AI provider for summarization
    #[arg(short, long, default_value = "gemini")]
    provider: CliProvider,

    /// Override the provider's default model
    #[arg(short, long)]
    model: Option<String>,

    /// Per-request timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Print the timestamped transcript before the notes
    #[arg(long)]
    show_transcript: bool,

    /// Read `URL [LANG]` lines from stdin, keeping results between lines
    #[arg(short, long)]
    interactive: bool,

    /// Print supported notes languages and exit
    #[arg(long)]
    list_languages: bool,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Drives one spinner per pipeline stage from state transitions.
struct StageProgress {
    provider: Provider,
    active: Option<(ProgressBar, &'static str, Instant)>,
}

impl StageProgress {
    fn new(provider: Provider) -> Self {
        Self {
            provider,
            active: None,
        }
    }

    fn observe(&mut self, state: &PipelineState) {
        match state {
            PipelineState::Extracting => {
                self.start("Extracting transcript...".to_string(), "Transcript extracted")
            }
            PipelineState::Summarizing => {
                self.succeed();
                self.start(
                    format!("Summarizing with {}...", self.provider.name()),
                    "Summary generated",
                );
            }
            PipelineState::Translating => {
                self.succeed();
                self.start("Translating notes...".to_string(), "Notes translated");
            }
            PipelineState::Done => self.succeed(),
            PipelineState::Failed(stage) => {
                if let Some((pb, _, _)) = self.active.take() {
                    pb.finish_with_message(format!(
                        "{} {:?} failed",
                        style("✗").red().bold(),
                        stage
                    ));
                }
            }
            PipelineState::Idle => {}
        }
    }

    fn start(&mut self, msg: String, done: &'static str) {
        self.active = Some((create_spinner(&msg), done, Instant::now()));
    }

    fn succeed(&mut self) {
        if let Some((pb, done, started)) = self.active.take() {
            pb.finish_with_message(format!(
                "{} {} {}",
                style("✓").green().bold(),
                done,
                style(format!("[{}]", format_duration(started.elapsed()))).dim()
            ));
        }
    }
}

async fn run_once(
    pipeline: &mut Pipeline,
    provider: Provider,
    request: &NotesRequest,
    show_transcript: bool,
) -> std::result::Result<DetailedNotes, StageFailure> {
    let total_start = Instant::now();
    let mut progress = StageProgress::new(provider);

    if let Ok(video_id) = VideoId::parse(&request.video_link) {
        println!("{} {}", style("Video:").dim(), style(video_id.watch_url()).cyan());
    }

    let result = pipeline
        .run_with(request, |state| progress.observe(state))
        .await;

    match &result {
        Ok(notes) => {
            println!(
                "\n{} {}\n",
                style("Total time:").dim(),
                style(format_duration(total_start.elapsed())).cyan().bold()
            );
            println!("{}", style("─".repeat(60)).dim());

            if show_transcript {
                // served from the pipeline's transcript cache
                if let Ok(transcript) = pipeline.extract(&request.video_link).await {
                    println!("{}\n", format_transcript_with_timestamps(&transcript));
                    println!("{}", style("─".repeat(60)).dim());
                }
            }

            println!("{}", format_notes_readable(notes));
        }
        Err(failure) => {
            eprintln!("\n{} {}", style("Error:").red().bold(), failure);
        }
    }

    result
}

async fn interactive(
    pipeline: &mut Pipeline,
    provider: Provider,
    default_lang: &str,
    show_transcript: bool,
) -> Result<()> {
    println!(
        "{}",
        style("Enter `URL [LANG]`, `:clear` to forget previous results, `:quit` to exit.").dim()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", style(">").cyan().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        match line {
            "" => continue,
            ":quit" | ":q" => break,
            ":clear" => {
                pipeline.clear_caches();
                println!("{} Cleared cached results", style("✓").green().bold());
                continue;
            }
            _ => {}
        }

        let (link, lang) = match line.split_once(char::is_whitespace) {
            Some((link, lang)) => (link, lang.trim()),
            None => (line, default_lang),
        };

        let request = NotesRequest::new(link, lang);
        if run_once(pipeline, provider, &request, show_transcript)
            .await
            .is_err()
        {
            // already reported; the session carries on
            continue;
        }
    }

    Ok(())
}

fn print_languages() {
    for (code, name) in LANGUAGES {
        println!("{:<8} {}", style(code).cyan(), name);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.list_languages {
        print_languages();
        return Ok(());
    }

    let provider: Provider = cli.provider.into();
    let mut config = AppConfig::from_env(provider);
    if let Some(model) = cli.model {
        config.model = Some(model);
    }
    if let Some(secs) = cli.timeout.filter(|secs| *secs > 0) {
        config.request_timeout = Some(Duration::from_secs(secs));
    }

    // summaries will fail, extraction still works
    if config.credential.is_none() {
        eprintln!(
            "{} {} is not set; summarization will fail",
            style("Warning:").yellow().bold(),
            provider.config().env_var
        );
    }

    println!(
        "\n{}  {}\n",
        style("vidnotes").cyan().bold(),
        style(format!("Video Notes ({}, {})", provider.name(), config.model())).dim()
    );

    let mut pipeline = Pipeline::from_config(&config)?;

    if cli.interactive {
        return interactive(&mut pipeline, provider, &cli.lang, cli.show_transcript).await;
    }

    let Some(url) = cli.url else {
        return Ok(());
    };

    let request = NotesRequest::new(url, cli.lang);
    if run_once(&mut pipeline, provider, &request, cli.show_transcript)
        .await
        .is_err()
    {
        std::process::exit(1);
    }

    Ok(())
}
