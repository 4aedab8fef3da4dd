//! Deterministic provider stand-in.
//!
//! Output is derived solely from the role and the structurally relevant
//! payload fields (no network, no clock, no randomness) so lifecycle
//! tests are fully reproducible.

use serde_json::Value;

use loom_domain::error::Result;

use crate::traits::{AgentRole, StoryProvider};

pub struct MockProvider;

impl MockProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl StoryProvider for MockProvider {
    async fn generate(&self, role: AgentRole, _model: &str, payload: &Value) -> Result<String> {
        Ok(match role {
            AgentRole::WorldLock => {
                let slots = payload["selected_agent_slots"]
                    .as_array()
                    .cloned()
                    .unwrap_or_default();
                let names = &payload["agent_names"];
                let roster: Vec<String> = slots
                    .iter()
                    .filter_map(Value::as_u64)
                    .map(|slot| {
                        let name = names[slot.to_string()]
                            .as_str()
                            .map(str::to_owned)
                            .unwrap_or_else(|| format!("Agent {slot}"));
                        format!("{slot}:{name}")
                    })
                    .collect();
                format!("World/Chapter lock created. Agents: {}.", roster.join(", "))
            }
            AgentRole::Delta => {
                format!(
                    "Turn delta summary for prompts {}-{}",
                    payload["from_prompt_index"], payload["to_prompt_index"]
                )
            }
            AgentRole::Character => {
                let slot = &payload["agent_identity"]["slot"];
                let prompt_index = &payload["meta"]["prompt_index"];
                let user_prompt = payload["user_prompt"].as_str().unwrap_or_default();
                let head: String = user_prompt.chars().take(120).collect();
                format!("Agent {slot} response to prompt {prompt_index}: {head}")
            }
            AgentRole::Narrative => {
                "Narrative draft (MVP mock) generated from structured memory and transcript."
                    .to_owned()
            }
        })
    }

    fn provider_id(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn world_lock_lists_roster() {
        let provider = MockProvider::new();
        let payload = json!({
            "selected_agent_slots": [1, 3],
            "agent_names": {"1": "Agent Red", "3": "Agent Yellow"},
        });
        let out = provider
            .generate(AgentRole::WorldLock, "m", &payload)
            .await
            .unwrap();
        assert_eq!(
            out,
            "World/Chapter lock created. Agents: 1:Agent Red, 3:Agent Yellow."
        );
    }

    #[tokio::test]
    async fn delta_echoes_range() {
        let provider = MockProvider::new();
        let payload = json!({"from_prompt_index": 1, "to_prompt_index": 7, "events": []});
        let out = provider
            .generate(AgentRole::Delta, "m", &payload)
            .await
            .unwrap();
        assert_eq!(out, "Turn delta summary for prompts 1-7");
    }

    #[tokio::test]
    async fn narrative_wording_is_fixed() {
        let provider = MockProvider::new();
        let out = provider
            .generate(AgentRole::Narrative, "m", &json!({}))
            .await
            .unwrap();
        assert_eq!(
            out,
            "Narrative draft (MVP mock) generated from structured memory and transcript."
        );
    }

    #[tokio::test]
    async fn character_output_is_deterministic() {
        let provider = MockProvider::new();
        let payload = json!({
            "agent_identity": {"slot": 2},
            "meta": {"prompt_index": 5},
            "user_prompt": "open the gate",
        });
        let a = provider
            .generate(AgentRole::Character, "m", &payload)
            .await
            .unwrap();
        let b = provider
            .generate(AgentRole::Character, "m", &payload)
            .await
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "Agent 2 response to prompt 5: open the gate");
    }
}
