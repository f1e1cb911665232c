//! LLM structured-extraction client.
//!
//! Speaks the OpenAI-style chat-completions protocol: one system message
//! fixing the extraction persona, one user message carrying the prompt and
//! a bounded excerpt of the contract text. The model is asked for exactly
//! the `ContractMetadata` field set; the response payload is recovered from
//! a fenced block or a bare JSON object and post-processed before use.

use std::time::Duration;

use pactum_core::ContractMetadata;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::AnalyzeError;

/// Characters of contract text included in the prompt.
const PROMPT_TEXT_LIMIT: usize = 5000;

/// Per-call cap; a hung completion counts as a transient failure.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const MAX_ATTEMPTS: usize = 4;
const BASE_DELAY_MS: u64 = 750;
const MAX_DELAY_MS: f64 = 5000.0;

pub const DEFAULT_MODEL: &str = "gpt-4";

const SYSTEM_MESSAGE: &str = "Você é um especialista em análise de contratos de \
negócios reais. Extraia informações estruturadas em JSON válido com alta \
precisão. Foque em identificar o supplier (empresa fornecedora) e datas de \
início/fim.";

/// Chat-completions client for contract metadata extraction.
pub struct LlmClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

impl LlmClient {
    /// Create a client for the given API base URL.
    ///
    /// `base_url` should be like `https://api.openai.com` (no trailing slash).
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Extract structured metadata from contract text.
    ///
    /// Transient failures (rate limits, 5xx, timeouts) are retried with
    /// exponential backoff; anything else surfaces immediately so the
    /// caller can fall back to the pattern analyzer.
    pub async fn analyze(
        &self,
        text: &str,
        filename: &str,
    ) -> Result<ContractMetadata, AnalyzeError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_MESSAGE },
                { "role": "user", "content": build_prompt(text) }
            ],
            "temperature": 0.1,
            "max_tokens": 2000
        });
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut attempt = 0usize;
        let mut delay_ms = BASE_DELAY_MS;

        loop {
            attempt += 1;
            info!(filename, attempt, "requesting contract analysis");
            match self.send(&url, &body).await {
                Ok(content) => {
                    let payload =
                        recover_json(&content).ok_or(AnalyzeError::MissingPayload)?;
                    let data: Value = serde_json::from_str(payload)?;
                    let mut metadata = ContractMetadata::from_payload(&data);
                    post_process(&mut metadata);
                    info!(
                        filename,
                        confidence = metadata.confidence,
                        "contract analysis complete"
                    );
                    return Ok(metadata);
                }
                Err(error) if attempt < MAX_ATTEMPTS && error.is_transient() => {
                    warn!(filename, attempt, %error, "analysis attempt failed, backing off");
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    delay_ms = (delay_ms as f64 * 1.75).min(MAX_DELAY_MS) as u64;
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn send(&self, url: &str, body: &Value) -> Result<String, AnalyzeError> {
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AnalyzeError::Server {
                status: status.as_u16(),
                body,
            });
        }
        let parsed: ChatResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(AnalyzeError::MissingPayload)
    }
}

fn build_prompt(text: &str) -> String {
    format!(
        "Analise o seguinte contrato real e extraia informações estruturadas em JSON.\n\
         \n\
         Procure por:\n\
         1. Contract ID (identificador único, número de contrato)\n\
         2. Contract Name/Title (nome/título do contrato)\n\
         3. Contract type (tipo de contrato: SoW, MSA, NDA, etc.)\n\
         4. Supplier (empresa fornecedora)\n\
         5. Start date (data de início)\n\
         6. End date (data de fim)\n\
         7. Parties involved (partes envolvidas)\n\
         8. Business area (área de negócio)\n\
         9. Project scope (escopo do projeto)\n\
         10. Confidence score (confiança na extração)\n\
         \n\
         IMPORTANTE:\n\
         - Supplier deve ser a empresa fornecedora, não a empresa contratante\n\
         - Se não conseguir identificar end date, use \"2999\" como placeholder\n\
         - Contract ID deve ser extraído do próprio documento\n\
         \n\
         Retorne APENAS JSON válido com esta estrutura:\n\
         {{\n\
             \"contract_id\": \"string ou null\",\n\
             \"contract_name\": \"string ou null\",\n\
             \"contract_type\": \"string ou null\",\n\
             \"supplier\": \"string ou null\",\n\
             \"start_date\": \"string ou null\",\n\
             \"end_date\": \"string ou null\",\n\
             \"parties\": [\"lista de nomes das partes\"],\n\
             \"business_area\": \"string ou null\",\n\
             \"project_scope\": \"string ou null\",\n\
             \"confidence\": 0.95\n\
         }}\n\
         \n\
         Texto do contrato:\n\
         {}",
        excerpt(text, PROMPT_TEXT_LIMIT)
    )
}

/// Truncate to at most `limit` bytes without splitting a character.
fn excerpt(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Pull the JSON object out of a chat response: a fenced ```json block when
/// present, else the span from the first `{` to the last `}`.
fn recover_json(content: &str) -> Option<&str> {
    if let Some(fence) = content.find("```json") {
        let start = fence + 7;
        if let Some(rel_end) = content[start..].find("```") {
            return Some(content[start..start + rel_end].trim());
        }
    }
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end < start {
        return None;
    }
    Some(content[start..=end].trim())
}

/// Tidy model output: identifiers lose stray dots and whitespace, names are
/// capped at 200 characters.
fn post_process(metadata: &mut ContractMetadata) {
    metadata.contract_id = metadata
        .contract_id
        .trim()
        .trim_matches('.')
        .trim()
        .to_string();

    metadata.contract_name = metadata.contract_name.trim().to_string();
    if metadata.contract_name.chars().count() > 200 {
        let truncated: String = metadata.contract_name.chars().take(200).collect();
        metadata.contract_name = format!("{truncated}...");
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
