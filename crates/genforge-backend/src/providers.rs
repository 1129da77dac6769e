//! HTTP adapters for each backend protocol.
//!
//! Ollama and OpenAI-compatible servers return text; Stable Diffusion returns
//! base64 PNG data. Envelope parsing is split out so it can be tested without
//! a server.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use genforge_core::{BackendDescriptor, BackendProtocol};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::client::GenerativeBackend;
use crate::types::{CallError, RawPayload};

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Extra time an abandoned call may keep its connection open past its deadline.
const ABANDON_GRACE: Duration = Duration::from_secs(30);

const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: usize = 2000;
const SD_STEPS: u32 = 20;
const SD_SIZE: u32 = 512;
const SD_NEGATIVE_PROMPT: &str = "blurry, ugly, distorted, poorly drawn";

/// Build the adapter matching a descriptor's protocol.
pub fn build_backend(descriptor: BackendDescriptor, client: Client) -> Arc<dyn GenerativeBackend> {
    match descriptor.protocol {
        BackendProtocol::Ollama => Arc::new(OllamaBackend { descriptor, client }),
        BackendProtocol::OpenAi => Arc::new(ChatCompletionsBackend { descriptor, client }),
        BackendProtocol::StableDiffusion => Arc::new(StableDiffusionBackend { descriptor, client }),
    }
}

// ---------------------------------------------------------------
// Shared request plumbing
// ---------------------------------------------------------------

async fn post_json(
    client: &Client,
    descriptor: &BackendDescriptor,
    url: &str,
    body: &Value,
) -> Result<Value, CallError> {
    let mut request = client
        .post(url)
        .timeout(descriptor.default_deadline() + ABANDON_GRACE)
        .header("Content-Type", "application/json")
        .json(body);
    if let Some(key) = &descriptor.api_key {
        request = request.header("Authorization", format!("Bearer {}", key));
    }

    let response = request
        .send()
        .await
        .map_err(|e| CallError::Transport(format!("Request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(CallError::Transport(format!(
            "API error {}: {}",
            status,
            truncate(&body, 200)
        )));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| CallError::Transport(format!("Malformed envelope: {}", e)))
}

async fn probe_get(client: &Client, descriptor: &BackendDescriptor, url: &str) -> bool {
    let mut request = client.get(url).timeout(PROBE_TIMEOUT);
    if let Some(key) = &descriptor.api_key {
        request = request.header("Authorization", format!("Bearer {}", key));
    }
    match request.send().await {
        Ok(r) => r.status().is_success(),
        Err(e) => {
            debug!("Probe of {} failed: {}", descriptor.id, e);
            false
        }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ---------------------------------------------------------------
// Ollama
// ---------------------------------------------------------------

/// Local language model served by Ollama.
pub struct OllamaBackend {
    descriptor: BackendDescriptor,
    client: Client,
}

#[async_trait]
impl GenerativeBackend for OllamaBackend {
    fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    async fn generate(&self, prompt: &str) -> Result<RawPayload, CallError> {
        let url = format!("{}/api/generate", self.descriptor.base_url());
        let body = json!({
            "model": self.descriptor.model.as_deref().unwrap_or("llama3"),
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": TEMPERATURE,
                "num_predict": MAX_TOKENS,
            },
        });
        debug!("Generating via Ollama at {}", url);
        let envelope = post_json(&self.client, &self.descriptor, &url, &body).await?;
        parse_ollama(&envelope).map(RawPayload::Text)
    }

    async fn probe(&self) -> bool {
        let url = format!("{}/api/tags", self.descriptor.base_url());
        probe_get(&self.client, &self.descriptor, &url).await
    }
}

/// `{"response": "..."}` → text.
pub fn parse_ollama(envelope: &Value) -> Result<String, CallError> {
    if let Some(err) = envelope["error"].as_str() {
        return Err(CallError::Transport(format!("Ollama error: {}", err)));
    }
    envelope["response"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| CallError::Transport("Malformed envelope: missing `response`".into()))
}

// ---------------------------------------------------------------
// OpenAI-compatible chat completions
// ---------------------------------------------------------------

/// OpenAI-compatible `/v1/chat/completions` server (llama.cpp, DeepSeek, cloud APIs).
pub struct ChatCompletionsBackend {
    descriptor: BackendDescriptor,
    client: Client,
}

#[async_trait]
impl GenerativeBackend for ChatCompletionsBackend {
    fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    async fn generate(&self, prompt: &str) -> Result<RawPayload, CallError> {
        let url = format!("{}/v1/chat/completions", self.descriptor.base_url());
        let mut body = json!({
            "messages": [{"role": "user", "content": prompt}],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
            "stream": false,
        });
        if let Some(model) = &self.descriptor.model {
            body["model"] = json!(model);
        }
        debug!("Generating via chat completions at {}", url);
        let envelope = post_json(&self.client, &self.descriptor, &url, &body).await?;
        parse_chat_completion(&envelope).map(RawPayload::Text)
    }

    async fn probe(&self) -> bool {
        let url = format!("{}/v1/models", self.descriptor.base_url());
        probe_get(&self.client, &self.descriptor, &url).await
    }
}

/// `{"choices": [{"message": {"content": "..."}}]}` → text.
pub fn parse_chat_completion(envelope: &Value) -> Result<String, CallError> {
    if let Some(msg) = envelope["error"]["message"].as_str() {
        return Err(CallError::Transport(format!("API error: {}", msg)));
    }
    envelope["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| {
            CallError::Transport("Malformed envelope: missing `choices[0].message.content`".into())
        })
}

// ---------------------------------------------------------------
// Stable Diffusion (Automatic1111)
// ---------------------------------------------------------------

/// Image synthesis through the Automatic1111 web UI API.
pub struct StableDiffusionBackend {
    descriptor: BackendDescriptor,
    client: Client,
}

#[async_trait]
impl GenerativeBackend for StableDiffusionBackend {
    fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    async fn generate(&self, prompt: &str) -> Result<RawPayload, CallError> {
        let url = format!("{}/sdapi/v1/txt2img", self.descriptor.base_url());
        let body = json!({
            "prompt": prompt,
            "steps": SD_STEPS,
            "width": SD_SIZE,
            "height": SD_SIZE,
            "negative_prompt": SD_NEGATIVE_PROMPT,
        });
        debug!("Generating image via Stable Diffusion at {}", url);
        let envelope = post_json(&self.client, &self.descriptor, &url, &body).await?;
        parse_txt2img(&envelope).map(RawPayload::Binary)
    }

    async fn probe(&self) -> bool {
        let url = format!("{}/sdapi/v1/sd-models", self.descriptor.base_url());
        probe_get(&self.client, &self.descriptor, &url).await
    }
}

/// `{"images": ["<base64>"]}` → decoded bytes.
pub fn parse_txt2img(envelope: &Value) -> Result<Vec<u8>, CallError> {
    let encoded = envelope["images"][0]
        .as_str()
        .ok_or_else(|| CallError::Transport("Malformed envelope: missing `images[0]`".into()))?;
    // Some builds prefix a data URL header.
    let encoded = encoded
        .split_once("base64,")
        .map(|(_, data)| data)
        .unwrap_or(encoded);
    base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| CallError::Unusable(format!("image is not valid base64: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use genforge_core::BackendKind;

    #[test]
    fn test_parse_ollama() {
        let env = json!({"model": "llama3", "response": "```js\nx\n```", "done": true});
        assert_eq!(parse_ollama(&env).unwrap(), "```js\nx\n```");

        let err = parse_ollama(&json!({"error": "model not found"})).unwrap_err();
        assert!(matches!(err, CallError::Transport(ref d) if d.contains("model not found")));

        assert!(parse_ollama(&json!({"done": true})).is_err());
    }

    #[test]
    fn test_parse_chat_completion() {
        let env = json!({"choices": [{"message": {"role": "assistant", "content": "hello"}}]});
        assert_eq!(parse_chat_completion(&env).unwrap(), "hello");

        let env = json!({"error": {"message": "invalid api key"}});
        assert!(parse_chat_completion(&env).is_err());
        assert!(parse_chat_completion(&json!({"choices": []})).is_err());
    }

    #[test]
    fn test_parse_txt2img() {
        let env = json!({"images": ["iVBORw0KGgo="], "info": "{}"});
        let bytes = parse_txt2img(&env).unwrap();
        assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);

        let env = json!({"images": ["data:image/png;base64,iVBORw0KGgo="]});
        assert_eq!(parse_txt2img(&env).unwrap().len(), 8);

        let err = parse_txt2img(&json!({"images": ["%%%"]})).unwrap_err();
        assert!(matches!(err, CallError::Unusable(_)));
        assert!(matches!(
            parse_txt2img(&json!({})).unwrap_err(),
            CallError::Transport(_)
        ));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("hi", 10), "hi");
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let descriptor = BackendDescriptor {
            id: "nowhere".into(),
            endpoint: "http://127.0.0.1:1".into(),
            kind: BackendKind::Text,
            protocol: BackendProtocol::Ollama,
            model: None,
            deadline_ms: 2_000,
            enabled: true,
            api_key: None,
        };
        let backend = build_backend(descriptor, Client::new());
        let err = backend.generate("hello").await.unwrap_err();
        assert!(matches!(err, CallError::Transport(_)));
        assert!(!backend.probe().await);
    }
}
