use async_trait::async_trait;

use crate::{
    config::AppConfig,
    error::{Result, VidnotesError},
    languages::{self, Language},
};

const TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";
/// Longest text accepted by a single translation request
pub const MAX_CHUNK_CHARS: usize = 5000;

/// Translates text into a target language, detecting the source language.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_code: &str) -> Result<String>;
}

/// Google Translate web endpoint with automatic source detection
pub struct GoogleTranslate {
    client: reqwest::Client,
}

impl GoogleTranslate {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            client: config.http_client()?,
        })
    }

    async fn translate_chunk(&self, chunk: &str, target_code: &str) -> Result<String> {
        let response = self
            .client
            .post(TRANSLATE_URL)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target_code),
                ("dt", "t"),
            ])
            .form(&[("q", chunk)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(VidnotesError::HttpStatus {
                service: "Google Translate",
                status: status.as_u16(),
            });
        }

        let body = response.json::<serde_json::Value>().await?;
        extract_translation(&body)
    }
}

#[async_trait]
impl Translator for GoogleTranslate {
    async fn translate(&self, text: &str, target_code: &str) -> Result<String> {
        let chunks = split_into_chunks(text, MAX_CHUNK_CHARS);
        tracing::debug!(chunks = chunks.len(), target = target_code, "translating");

        let mut translated = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            translated.push(self.translate_chunk(&chunk.text, target_code).await?);
        }
        Ok(reassemble(&chunks, translated))
    }
}

/// Join the translated sentences of a `translate_a/single` response
pub fn extract_translation(response: &serde_json::Value) -> Result<String> {
    let sentences = response[0]
        .as_array()
        .ok_or_else(|| VidnotesError::InvalidApiResponse {
            reason: format!("no sentences in {}", response),
        })?;

    Ok(sentences
        .iter()
        .filter_map(|s| s[0].as_str())
        .collect::<String>())
}

/// A piece of text small enough for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    /// Separator that preceded this chunk in the source text
    pub separator: &'static str,
}

/// Split on line boundaries, then on whitespace, so every chunk fits `max_chars`.
///
/// Chunks never consist of whitespace alone.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<Chunk> {
    let mut pieces: Vec<(&'static str, String)> = Vec::new();
    for line in text.lines() {
        if line.chars().count() <= max_chars {
            pieces.push(("\n", line.to_string()));
        } else {
            for (i, part) in split_words(line, max_chars).into_iter().enumerate() {
                pieces.push((if i == 0 { "\n" } else { " " }, part));
            }
        }
    }

    let mut chunks: Vec<Chunk> = Vec::new();
    let mut current: Option<Chunk> = None;
    for (separator, piece) in pieces {
        if let Some(chunk) = current.as_mut() {
            let needed = chunk.text.chars().count() + separator.len() + piece.chars().count();
            if needed <= max_chars {
                chunk.text.push_str(separator);
                chunk.text.push_str(&piece);
                continue;
            }
        }

        if let Some(chunk) = current.take().filter(|c| !c.text.trim().is_empty()) {
            chunks.push(chunk);
        }
        if !piece.trim().is_empty() {
            current = Some(Chunk {
                text: piece,
                separator,
            });
        }
    }
    if let Some(chunk) = current.filter(|c| !c.text.trim().is_empty()) {
        chunks.push(chunk);
    }
    chunks
}

fn split_words(line: &str, max_chars: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for part in chars.chunks(max_chars) {
            let part: String = part.iter().collect();
            let needed = current.chars().count() + 1 + part.chars().count();
            if !current.is_empty() && needed > max_chars {
                out.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&part);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Join per-chunk results with the separators the chunks were cut at.
pub fn reassemble(chunks: &[Chunk], translated: Vec<String>) -> String {
    let mut out = String::new();
    for (i, (chunk, text)) in chunks.iter().zip(translated).enumerate() {
        if i > 0 {
            out.push_str(chunk.separator);
        }
        out.push_str(&text);
    }
    out
}

/// Translate `text` into the catalog language named by `target`.
///
/// The language is resolved before any request is made, so unsupported
/// selections never reach the service.
pub async fn translate(
    translator: &dyn Translator,
    text: &str,
    target: &str,
) -> Result<(Language, String)> {
    let language = languages::resolve(target)?;
    if text.trim().is_empty() {
        return Err(VidnotesError::EmptyInput {
            action: "translate",
        });
    }

    let translated = translator.translate(text, language.code).await?;
    if translated.trim().is_empty() {
        return Err(VidnotesError::EmptyOutput {
            service: "translation service",
        });
    }
    Ok((language, translated))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_translate_resolves_display_names() {
        let mut translator = MockTranslator::new();
        translator
            .expect_translate()
            .withf(|text: &str, code: &str| text == "Hello" && code == "fr")
            .times(1)
            .returning(|_, _| Ok("Bonjour".to_string()));

        let (language, text) = translate(&translator, "Hello", "French").await.unwrap();
        assert_eq!(language.code, "fr");
        assert_eq!(text, "Bonjour");
    }

    #[tokio::test]
    async fn test_unsupported_language_never_reaches_service() {
        let mut translator = MockTranslator::new();
        translator.expect_translate().times(0);

        let err = translate(&translator, "Hello", "xx-klingon").await.unwrap_err();
        assert!(matches!(err, VidnotesError::UnsupportedLanguage { .. }));
    }

    #[tokio::test]
    async fn test_blank_input_and_output() {
        let mut translator = MockTranslator::new();
        translator
            .expect_translate()
            .times(1)
            .returning(|_, _| Ok(String::new()));

        let err = translate(&translator, " ", "fr").await.unwrap_err();
        assert!(matches!(err, VidnotesError::EmptyInput { .. }));

        let err = translate(&translator, "Hello", "fr").await.unwrap_err();
        assert!(matches!(err, VidnotesError::EmptyOutput { .. }));
    }

    #[test]
    fn test_extract_translation() {
        let response = json!([
            [
                ["Bonjour le monde. ", "Hello world. ", null, null, 10],
                ["Au revoir.", "Goodbye.", null, null, 10]
            ],
            null,
            "en"
        ]);
        assert_eq!(
            extract_translation(&response).unwrap(),
            "Bonjour le monde. Au revoir."
        );
        assert!(extract_translation(&json!({"error": 400})).is_err());
    }

    fn texts(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks = split_into_chunks("line one\nline two", 5000);
        assert_eq!(texts(&chunks), vec!["line one\nline two"]);
    }

    #[test]
    fn test_chunks_respect_limit_and_order() {
        let text = "aaaa bbbb\ncccc\ndddd eeee ffff";
        let chunks = split_into_chunks(text, 10);
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 10), "{chunks:?}");
        assert_eq!(texts(&chunks), vec!["aaaa bbbb", "cccc", "dddd eeee", "ffff"]);
    }

    #[test]
    fn test_oversized_word_is_split() {
        let chunks = split_into_chunks("abcdefghijkl", 5);
        assert_eq!(texts(&chunks), vec!["abcde", "fghij", "kl"]);
    }

    #[test]
    fn test_blank_line_at_boundary_is_not_a_chunk() {
        let text = format!("{}\n   \n{}", "a".repeat(4999), "b".repeat(4999));
        let chunks = split_into_chunks(&text, MAX_CHUNK_CHARS);

        assert_eq!(chunks.len(), 2, "{:?}", texts(&chunks));
        assert!(chunks.iter().all(|c| !c.text.trim().is_empty()));
        assert_eq!(chunks[0].text, "a".repeat(4999));
        assert_eq!(chunks[1].text, "b".repeat(4999));
    }

    #[test]
    fn test_long_line_rejoins_with_spaces() {
        let line = vec!["word"; 1500].join(" ");
        let chunks = split_into_chunks(&line, MAX_CHUNK_CHARS);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].separator, " ");

        let translated = chunks.iter().map(|c| c.text.clone()).collect();
        let rejoined = reassemble(&chunks, translated);
        assert_eq!(rejoined, line);
        assert!(!rejoined.contains('\n'));
    }

    #[test]
    fn test_line_boundaries_rejoin_with_newlines() {
        let text = "aaaa bbbb\ncccc";
        let chunks = split_into_chunks(text, 9);
        assert_eq!(texts(&chunks), vec!["aaaa bbbb", "cccc"]);

        let translated = chunks.iter().map(|c| c.text.to_uppercase()).collect();
        assert_eq!(reassemble(&chunks, translated), "AAAA BBBB\nCCCC");
    }
}
