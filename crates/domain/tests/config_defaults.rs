use loom_domain::config::{Config, ProviderKind};

#[test]
fn default_chunk_size_is_seven() {
    let config = Config::default();
    assert_eq!(config.compaction.chunk_size, 7);
}

#[test]
fn default_provider_is_mock() {
    let config = Config::default();
    assert_eq!(config.llm.provider, ProviderKind::Mock);
}

#[test]
fn default_limits() {
    let config = Config::default();
    assert_eq!(config.limits.text_cap, 5000);
    assert_eq!(config.limits.name_cap, 120);
}

#[test]
fn default_models_per_role() {
    let config = Config::default();
    assert_eq!(config.llm.model_character, "gpt-4o-mini");
    assert_eq!(config.llm.model_summary, "gpt-4o-mini");
    assert_eq!(config.llm.model_narrative, "gpt-4o");
}

#[test]
fn explicit_chunk_size_parses() {
    let toml_str = r#"
[compaction]
chunk_size = 3
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.compaction.chunk_size, 3);
}

#[test]
fn openai_provider_parses() {
    let toml_str = r#"
[llm]
provider = "openai"
base_url = "http://localhost:11434/v1"
model_narrative = "llama3"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.llm.provider, ProviderKind::Openai);
    assert_eq!(config.llm.base_url, "http://localhost:11434/v1");
    assert_eq!(config.llm.model_narrative, "llama3");
    // Untouched sections keep their defaults.
    assert_eq!(config.llm.model_character, "gpt-4o-mini");
}

#[test]
fn state_path_defaults_to_none() {
    let config = Config::default();
    assert!(config.state.path.is_none());
}
