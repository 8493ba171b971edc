use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_allow_custom_servers() {
    let config = ClientConfig::default();
    assert!(config.allow_custom_servers);
    assert!(config.is_server_allowed("anything.example"));
    assert_eq!(config.default_homeserver.as_str(), "https://matrix.org/");
}

#[test]
fn allow_list_is_enforced_when_custom_servers_are_disabled() {
    let config = ClientConfig {
        allow_custom_servers: false,
        server_allow_list: vec!["Example.org".to_string()],
        ..ClientConfig::default()
    };

    assert!(config.is_server_allowed("example.org"));
    assert!(!config.is_server_allowed("evil.example"));
}

#[test]
fn file_values_are_applied() {
    let mut config = ClientConfig::default();
    apply_file_config(
        &mut config,
        r#"
default_homeserver = "https://chat.example.org"
allow_custom_servers = false
server_allow_list = ["example.org", "example.net"]
device_display_name = "Work laptop"
request_timeout_secs = 5
"#,
    )
    .expect("apply file config");

    assert_eq!(
        config.default_homeserver.as_str(),
        "https://chat.example.org/"
    );
    assert!(!config.allow_custom_servers);
    assert_eq!(config.server_allow_list, vec!["example.org", "example.net"]);
    assert_eq!(config.device_display_name, "Work laptop");
    assert_eq!(config.request_timeout_secs, 5);
}

#[test]
fn env_overrides_take_precedence_over_file_values() {
    let mut config = ClientConfig::default();
    apply_file_config(
        &mut config,
        "default_homeserver = \"https://file.example\"\nallow_custom_servers = true\n",
    )
    .expect("apply file config");

    apply_env_overrides(
        &mut config,
        vars(&[
            ("APP__DEFAULT_HOMESERVER", "https://env.example"),
            ("APP__ALLOW_CUSTOM_SERVERS", "false"),
            ("APP__SERVER_ALLOW_LIST", " a.example , ,b.example"),
            ("APP__REQUEST_TIMEOUT_SECS", "12"),
        ]),
    )
    .expect("apply env");

    assert_eq!(config.default_homeserver.as_str(), "https://env.example/");
    assert!(!config.allow_custom_servers);
    assert_eq!(config.server_allow_list, vec!["a.example", "b.example"]);
    assert_eq!(config.request_timeout_secs, 12);
}

#[test]
fn rejects_non_http_homeserver() {
    let mut config = ClientConfig::default();
    let err = apply_env_overrides(
        &mut config,
        vars(&[("CLIENT_DEFAULT_HOMESERVER", "ftp://example.org")]),
    )
    .expect_err("must reject");

    assert!(matches!(
        err,
        ConfigError::Invalid {
            key: "CLIENT_DEFAULT_HOMESERVER",
            ..
        }
    ));
}

#[test]
fn rejects_garbage_boolean() {
    let mut config = ClientConfig::default();
    let err = apply_env_overrides(&mut config, vars(&[("APP__ALLOW_CUSTOM_SERVERS", "maybe")]))
        .expect_err("must reject");
    assert!(err.to_string().contains("maybe"));
}

#[test]
fn rejects_unusable_request_timeouts() {
    for raw in ["not-a-number", "0", "-5"] {
        let mut config = ClientConfig::default();
        let err = apply_env_overrides(&mut config, vars(&[("APP__REQUEST_TIMEOUT_SECS", raw)]))
            .expect_err("must reject");
        assert!(
            matches!(
                err,
                ConfigError::Invalid {
                    key: "APP__REQUEST_TIMEOUT_SECS",
                    ..
                }
            ),
            "{raw}: {err}"
        );
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    let mut config = ClientConfig::default();
    let err = apply_file_config(&mut config, "request_timeout_secs = 0\n")
        .expect_err("must reject");
    assert!(matches!(
        err,
        ConfigError::Invalid {
            key: "request_timeout_secs",
            ..
        }
    ));
}

#[test]
fn homeserver_override_must_be_http() {
    assert_eq!(
        parse_homeserver("--homeserver", "http://localhost:8008")
            .expect("http accepted")
            .as_str(),
        "http://localhost:8008/"
    );

    let err = parse_homeserver("--homeserver", "ftp://x").expect_err("must reject");
    assert!(matches!(
        err,
        ConfigError::Invalid {
            key: "--homeserver",
            ..
        }
    ));
    assert!(parse_homeserver("--homeserver", "not a url").is_err());
}

#[test]
fn parse_errors_name_the_file() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("client_core_config_test_{suffix}.toml"));
    fs::write(&path, "allow_custom_servers = \"sometimes\"").expect("write config");

    let err = load_config(Some(&path)).expect_err("must fail");
    match err {
        ConfigError::Parse { path: reported, .. } => {
            assert_eq!(reported, path.display().to_string())
        }
        other => panic!("unexpected error: {other}"),
    }

    fs::remove_file(path).expect("cleanup");
}
