//! OpenAI-compatible adapter.
//!
//! Works with OpenAI, Ollama, vLLM, LM Studio, and any other endpoint
//! that follows the OpenAI chat completions contract.

use serde_json::Value;

use loom_domain::config::LlmConfig;
use loom_domain::error::{Error, Result};

use crate::traits::{AgentRole, StoryProvider};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct OpenAiCompatProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a provider from the deserialized LLM config.
    ///
    /// The API key is read from the env var named by `api_key_env`;
    /// a missing key fails construction rather than the first request.
    pub fn from_config(cfg: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var(&cfg.api_key_env).map_err(|_| Error::Provider {
            provider: "openai".into(),
            message: format!("{} is not set", cfg.api_key_env),
        })?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    // ── Internal: prompt shaping per role ─────────────────────────

    fn system_prompt(role: AgentRole) -> &'static str {
        match role {
            AgentRole::WorldLock => {
                "Summarize the world/chapter setup into compact structured narrative memory."
            }
            AgentRole::Delta => {
                "Summarize the prompt chunk into a concise structured memory delta \
                 with only new information."
            }
            AgentRole::Narrative => {
                "Write a cohesive chapter draft using structured memory as canon \
                 and the transcript as detail."
            }
            AgentRole::Character => {
                "You are a character roleplay agent. Follow your character identity \
                 exactly, including gender and voice. Never contradict structured \
                 memory. Use recent context to stay scene-accurate. Respond only as \
                 your character and do not narrate other characters' internal \
                 thoughts as facts."
            }
        }
    }

    /// Render the structured payload into the user message.
    ///
    /// Summarizer and narrative roles get the raw JSON; the character role
    /// gets a sectioned prompt with recent turns rendered as dialogue lines.
    fn user_prompt(role: AgentRole, payload: &Value) -> String {
        if role != AgentRole::Character {
            return payload.to_string();
        }

        let mut recent_lines = Vec::new();
        if let Some(events) = payload["recent_context"].as_array() {
            for ev in events {
                let text = ev["text"].as_str().unwrap_or_default();
                match ev["role"].as_str() {
                    Some("user") => {
                        recent_lines.push(format!("{}) {text}", ev["prompt_index"]));
                    }
                    Some("agent") => {
                        let name = ev["agent_name"]
                            .as_str()
                            .map(str::to_owned)
                            .unwrap_or_else(|| format!("Agent {}", ev["agent_slot"]));
                        recent_lines.push(format!("{name}: {text}"));
                    }
                    _ => recent_lines.push(format!("system: {text}")),
                }
            }
        }

        format!(
            "[Agent Identity]\n{}\n\n[Structured Memory]\n{}\n\n\
             [Current Context: recent user prompts and agent replies]\n{}\n\n\
             [User Prompt]\n{}",
            payload["agent_identity"],
            payload["structured_memory"],
            recent_lines.join("\n"),
            payload["user_prompt"].as_str().unwrap_or_default(),
        )
    }
}

#[async_trait::async_trait]
impl StoryProvider for OpenAiCompatProvider {
    async fn generate(&self, role: AgentRole, model: &str, payload: &Value) -> Result<String> {
        let body = serde_json::json!({
            "model": model,
            "messages": [
                {"role": "system", "content": Self::system_prompt(role)},
                {"role": "user", "content": Self::user_prompt(role, payload)},
            ],
            "temperature": 0.4,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::Provider {
                provider: "openai".into(),
                message: format!("authorization rejected ({status})"),
            });
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Provider {
                provider: "openai".into(),
                message: format!("HTTP {status}: {detail}"),
            });
        }

        let data: Value = response.json().await.map_err(from_reqwest)?;
        let content = data["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| Error::Provider {
                provider: "openai".into(),
                message: "response missing choices[0].message.content".into(),
            })?;
        Ok(content.trim().to_owned())
    }

    fn provider_id(&self) -> &str {
        "openai"
    }
}

/// Map a reqwest error to our provider error, flagging timeouts.
fn from_reqwest(e: reqwest::Error) -> Error {
    let message = if e.is_timeout() {
        format!("request timed out: {e}")
    } else {
        e.to_string()
    };
    Error::Provider {
        provider: "openai".into(),
        message,
    }
}
