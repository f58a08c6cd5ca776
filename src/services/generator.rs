//! Message generation contract and prompts.

use crate::models::SalesTag;
use async_trait::async_trait;

/// Placeholder suggestion shown when the model can't produce one.
pub const FALLBACK_NICHE_SUGGESTION: &str =
    "Ex: Venda de cursos de marketing digital para afiliados iniciantes.";

/// Upstream generation failures. Never shown to end users verbatim.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Rate limited by provider")]
    RateLimited,

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Model returned no text (finish reason: {0})")]
    EmptyResponse(String),
}

/// External text-generation service.
#[async_trait]
pub trait MessageGenerator: Send + Sync {
    /// Write a ready-to-send WhatsApp sales message.
    async fn generate(
        &self,
        sales_tag: SalesTag,
        niche_details: &str,
    ) -> Result<String, GenerationError>;

    /// Suggest niche details the user could describe for this kind of message.
    async fn suggest_niche_details(&self, sales_tag: SalesTag) -> Result<String, GenerationError>;
}

pub fn message_prompt(sales_tag: SalesTag, niche_details: &str) -> String {
    format!(
        "You are an AI assistant specialized in generating WhatsApp sales messages.\n\
         \n\
         Based on the provided sales tag and niche details, create a compelling and \
         ready-to-use WhatsApp message. Reply with the message text only.\n\
         \n\
         Sales Tag: {}\n\
         Niche Details: {}\n\
         \n\
         Message:",
        sales_tag.prompt_name(),
        niche_details.trim()
    )
}

pub fn suggestion_prompt(sales_tag: SalesTag) -> String {
    format!(
        "You are a sales expert. Based on the selected sales tag, suggest relevant niche \
         details that the user can use to create a more effective sales message. \
         Reply with one short example only.\n\
         \n\
         Sales Tag: {}\n\
         \n\
         Suggested Niche Details:",
        sales_tag.prompt_name()
    )
}
