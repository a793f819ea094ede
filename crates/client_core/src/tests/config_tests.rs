use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

#[test]
fn default_points_at_local_api() {
    let config = ClientConfig::default();
    assert_eq!(
        config.endpoint("/api/opportunities"),
        "http://localhost:5000/api/opportunities"
    );
}

#[test]
fn endpoint_joins_base_and_relative_path() {
    let config = ClientConfig::new("https://crm.example.com/").expect("config");
    assert_eq!(
        config.endpoint("/api/opportunities/new"),
        "https://crm.example.com/api/opportunities/new"
    );
    assert_eq!(
        config.endpoint("api/opportunities"),
        "https://crm.example.com/api/opportunities"
    );
}

#[test]
fn endpoint_keeps_base_path_prefix() {
    let config = ClientConfig::new("http://10.0.0.5:8080/crm").expect("config");
    assert_eq!(
        config.endpoint("/api/opportunities/stagenames"),
        "http://10.0.0.5:8080/crm/api/opportunities/stagenames"
    );
}

#[test]
fn rejects_non_http_base_url() {
    assert!(ClientConfig::new("ftp://crm.example.com").is_err());
    assert!(ClientConfig::new("not a url").is_err());
}

#[test]
fn reads_base_url_from_toml() {
    let parsed = base_url_from_toml("api_base_url = \"http://127.0.0.1:7000\"\n").expect("toml");
    assert_eq!(parsed.as_deref(), Some("http://127.0.0.1:7000"));
    assert_eq!(base_url_from_toml("").expect("empty toml"), None);
}

#[test]
fn prefixed_env_var_wins_over_plain_one() {
    let vars = HashMap::from([
        ("API_BASE_URL", "http://plain:1".to_string()),
        ("APP__API_BASE_URL", "http://prefixed:2".to_string()),
    ]);
    let value = env_base_url(|key| vars.get(key).cloned());
    assert_eq!(value.as_deref(), Some("http://prefixed:2"));

    let value = env_base_url(|key| (key == "API_BASE_URL").then(|| "http://plain:1".to_string()));
    assert_eq!(value.as_deref(), Some("http://plain:1"));

    assert_eq!(env_base_url(|_| Some("  ".to_string())), None);

    let value = env_base_url(|key| match key {
        "API_BASE_URL" => Some("http://plain:1".to_string()),
        _ => Some(String::new()),
    });
    assert_eq!(value.as_deref(), Some("http://plain:1"));
}

#[test]
fn missing_file_and_empty_env_fall_back_to_default() {
    let path = env::temp_dir().join("opportunity_client_config_absent.toml");
    let config = load_config_with(Some(&path), |_| None).expect("load");
    assert_eq!(config, ClientConfig::default());
}

#[test]
fn load_config_reads_file_when_present() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("opportunity_client_config_{suffix}.toml"));
    std::fs::write(&path, "api_base_url = \"http://file-host:9000\"\n").expect("write config");

    let from_file = load_config_with(Some(&path), |_| None).expect("load");
    assert_eq!(from_file.base_url().as_str(), "http://file-host:9000/");

    let from_env = load_config_with(Some(&path), |key| {
        (key == "API_BASE_URL").then(|| "http://env-host:9100".to_string())
    })
    .expect("load");
    assert_eq!(from_env.base_url().as_str(), "http://env-host:9100/");

    std::fs::remove_file(path).expect("cleanup");
}
