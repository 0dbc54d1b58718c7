use async_trait::async_trait;

use crate::{
    config::AppConfig,
    error::{Result, VidnotesError},
    provider::Provider,
};

/// A hosted large-language model that turns a prompt into text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Any OpenAI-compatible chat-completions endpoint
pub struct ChatCompletionsModel {
    client: reqwest::Client,
    provider: Provider,
    model: String,
    credential: Option<String>,
}

impl ChatCompletionsModel {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            client: config.http_client()?,
            provider: config.provider,
            model: config.model().to_string(),
            credential: config.credential.clone(),
        })
    }
}

#[async_trait]
impl GenerativeModel for ChatCompletionsModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let config = self.provider.config();
        let api_key = self
            .credential
            .as_deref()
            .ok_or_else(|| VidnotesError::MissingApiKey {
                env_var: config.env_var.to_string(),
            })?;

        let response = self
            .client
            .post(config.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&serde_json::json!({
                "model": self.model,
                "messages": [
                    {
                        "role": "user",
                        "content": prompt,
                    },
                ],
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(provider = self.provider.name(), %status, "generation request rejected");
            return Err(VidnotesError::HttpStatus {
                service: self.provider.name(),
                status: status.as_u16(),
            });
        }

        let body = response.json::<serde_json::Value>().await?;
        extract_content(&body)
    }
}

/// Pull the first choice's message text out of a chat-completions response
pub fn extract_content(response: &serde_json::Value) -> Result<String> {
    response["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| VidnotesError::InvalidApiResponse {
            reason: format!("no message content in {}", response),
        })
}

/// Instruction followed by the transcript, sent as one message
pub fn build_prompt(instruction: &str, transcript: &str) -> String {
    format!("{}\n\n{}", instruction.trim_end(), transcript)
}

/// Summarize `transcript` following `instruction`; the model's text is returned verbatim.
pub async fn summarize(
    model: &dyn GenerativeModel,
    transcript: &str,
    instruction: &str,
) -> Result<String> {
    if transcript.trim().is_empty() {
        return Err(VidnotesError::EmptyInput {
            action: "summarize",
        });
    }

    let summary = model.generate(&build_prompt(instruction, transcript)).await?;
    if summary.trim().is_empty() {
        return Err(VidnotesError::EmptyOutput {
            service: "generative service",
        });
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_summarize_sends_instruction_then_transcript() {
        let mut model = MockGenerativeModel::new();
        model
            .expect_generate()
            .withf(|prompt: &str| prompt == "Summarize:\n\nhello world")
            .times(1)
            .returning(|_| Ok("A greeting.".to_string()));

        let summary = summarize(&model, "hello world", "Summarize:").await.unwrap();
        assert_eq!(summary, "A greeting.");
    }

    #[tokio::test]
    async fn test_blank_transcript_never_reaches_model() {
        let mut model = MockGenerativeModel::new();
        model.expect_generate().times(0);

        for transcript in ["", "  \n\t "] {
            let err = summarize(&model, transcript, "Summarize:").await.unwrap_err();
            assert!(matches!(err, VidnotesError::EmptyInput { .. }));
        }
    }

    #[tokio::test]
    async fn test_blank_model_output_is_an_error() {
        let mut model = MockGenerativeModel::new();
        model
            .expect_generate()
            .returning(|_| Ok("   ".to_string()));

        let err = summarize(&model, "hello", "Summarize:").await.unwrap_err();
        assert!(matches!(err, VidnotesError::EmptyOutput { .. }));
    }

    #[tokio::test]
    async fn test_missing_credential_fails_without_request() {
        let config = AppConfig::new(Provider::Gemini);
        let model = ChatCompletionsModel::new(&config).unwrap();

        let err = model.generate("anything").await.unwrap_err();
        match err {
            VidnotesError::MissingApiKey { env_var } => assert_eq!(env_var, "GOOGLE_API_KEY"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_extract_content() {
        let response = json!({
            "choices": [{"message": {"role": "assistant", "content": "The video explains..."}}]
        });
        assert_eq!(extract_content(&response).unwrap(), "The video explains...");

        let error = json!({"error": {"message": "quota exceeded"}});
        assert!(matches!(
            extract_content(&error),
            Err(VidnotesError::InvalidApiResponse { .. })
        ));
    }
}
