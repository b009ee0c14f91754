//! Comment-suggestion client for an OpenAI-style chat-completions API.

use async_trait::async_trait;

use crate::error::AiError;
use crate::prompt::{response_format, SYSTEM_PROMPT};
use crate::types::{
    ChatMessage, ChatRequest, ChatResponse, CommentSuggestions, ContentPart, ImageUrl,
    MessageContent, RawSuggestions,
};

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// Upper bound the API enforces on suggestions per post.
const MAX_SUGGESTIONS: usize = 4;

/// Generative service the enrichment orchestrator consumes.
///
/// Failures never propagate: a `None` means "no enrichment available" and
/// the pipeline carries on without it.
#[async_trait]
pub trait CommentComposer: Send + Sync {
    async fn suggest_comments(
        &self,
        handle: &str,
        caption: Option<&str>,
        image_urls: &[String],
        extra_context: Option<&str>,
    ) -> Option<CommentSuggestions>;
}

/// Chat-completions implementation with image inputs and a strict JSON
/// response schema.
pub struct OpenAiComposer {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_images: usize,
}

impl OpenAiComposer {
    #[must_use]
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.to_string(),
            base_url: OPENAI_API_URL.to_string(),
            model: model.to_string(),
            max_images: 4,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_max_images(mut self, max_images: usize) -> Self {
        self.max_images = max_images;
        self
    }

    async fn request(
        &self,
        handle: &str,
        caption: Option<&str>,
        image_urls: &[String],
        extra_context: Option<&str>,
    ) -> Result<CommentSuggestions, AiError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut user_text = format!(
            "Profile: @{handle}\nCaption: {}",
            caption.unwrap_or("(none)")
        );
        if let Some(extra) = extra_context {
            user_text.push('\n');
            user_text.push_str(extra);
        }

        let mut parts = vec![ContentPart::Text { text: user_text }];
        parts.extend(image_urls.iter().take(self.max_images).map(|u| {
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: u.clone(),
                    detail: "high",
                },
            }
        }));

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(SYSTEM_PROMPT.to_string()),
                },
                ChatMessage {
                    role: "user",
                    content: MessageContent::Parts(parts),
                },
            ],
            max_tokens: 500,
            response_format: response_format(),
        };

        tracing::debug!(model = %self.model, handle, "comment suggestion request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Api { status, body });
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(AiError::EmptyResponse)?;

        let raw: RawSuggestions = serde_json::from_str(&content)?;

        // Defensive cleanup: the schema is strict, the model is not.
        let comments: Vec<String> = raw
            .comments
            .into_iter()
            .filter_map(|c| {
                let trimmed = c.trim().to_owned();
                (!trimmed.is_empty()).then_some(trimmed)
            })
            .take(MAX_SUGGESTIONS)
            .collect();

        Ok(CommentSuggestions {
            comments,
            score: raw.score.min(10),
        })
    }
}

#[async_trait]
impl CommentComposer for OpenAiComposer {
    async fn suggest_comments(
        &self,
        handle: &str,
        caption: Option<&str>,
        image_urls: &[String],
        extra_context: Option<&str>,
    ) -> Option<CommentSuggestions> {
        if image_urls.is_empty() {
            tracing::warn!(handle, "no image URLs for post; skipping suggestion request");
            return None;
        }
        match self
            .request(handle, caption, image_urls, extra_context)
            .await
        {
            Ok(suggestions) => Some(suggestions),
            Err(e) => {
                tracing::warn!(handle, error = %e, "comment suggestion request failed");
                None
            }
        }
    }
}
