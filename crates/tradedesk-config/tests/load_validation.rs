//! Config load validation tests for tradedesk-config.
// crates/tradedesk-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding, env).
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tempfile::TempDir;
use tradedesk_config::ConfigError;
use tradedesk_config::OutputFormat;
use tradedesk_config::TradedeskConfig;

type TestResult = Result<(), String>;

fn no_env(_key: &str) -> Option<String> {
    None
}

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
    let map: BTreeMap<String, String> =
        pairs.iter().map(|(key, value)| ((*key).to_string(), (*value).to_string())).collect();
    move |key: &str| map.get(key).cloned()
}

fn write_config(contents: &str) -> Result<NamedTempFile, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(contents.as_bytes()).map_err(|err| err.to_string())?;
    Ok(file)
}

fn assert_invalid(result: Result<TradedeskConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    let path = Path::new(&long_path);
    assert_invalid(TradedeskConfig::load_with_env(Some(path), no_env), "config path exceeds max length")
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    let path = Path::new(&long_component);
    assert_invalid(
        TradedeskConfig::load_with_env(Some(path), no_env),
        "config path component too long",
    )
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    let payload = vec![b'#'; 1_048_577];
    file.write_all(&payload).map_err(|err| err.to_string())?;
    assert_invalid(
        TradedeskConfig::load_with_env(Some(file.path()), no_env),
        "config file exceeds size limit",
    )
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF]).map_err(|err| err.to_string())?;
    assert_invalid(TradedeskConfig::load_with_env(Some(file.path()), no_env), "config file must be utf-8")
}

#[test]
fn load_rejects_missing_explicit_file() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = dir.path().join("absent.toml");
    assert_invalid(TradedeskConfig::load_with_env(Some(&path), no_env), "config io error")
}

#[test]
fn load_rejects_missing_file_named_by_env() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = dir.path().join("absent.toml");
    let path_text = path.display().to_string();
    let pairs = [("TRADEDESK_CONFIG", path_text.as_str())];
    let env = env_from(&pairs);
    assert_invalid(TradedeskConfig::load_with_env(None, env), "config io error")
}

#[test]
fn load_reads_file_named_by_env() -> TestResult {
    let file = write_config("[wait]\ntimeout_ms = 9000\n")?;
    let path_text = file.path().display().to_string();
    let pairs = [("TRADEDESK_CONFIG", path_text.as_str())];
    let env = env_from(&pairs);
    let config = TradedeskConfig::load_with_env(None, env).map_err(|err| err.to_string())?;
    if config.wait.timeout_ms != 9_000 {
        return Err(format!("unexpected wait config: {:?}", config.wait));
    }
    Ok(())
}

#[test]
fn load_rejects_unknown_fields() -> TestResult {
    let file = write_config("[gateway]\nurl = \"http://localhost:1969\"\nbogus = 1\n")?;
    assert_invalid(TradedeskConfig::load_with_env(Some(file.path()), no_env), "config parse error")?;
    let file = write_config("[unknown]\nvalue = 1\n")?;
    assert_invalid(TradedeskConfig::load_with_env(Some(file.path()), no_env), "config parse error")
}

#[test]
fn load_rejects_password_in_file() -> TestResult {
    let file = write_config("[gateway]\nusername = \"trader\"\npassword = \"hunter2\"\n")?;
    assert_invalid(TradedeskConfig::load_with_env(Some(file.path()), no_env), "config parse error")
}

#[test]
fn load_parses_every_section() -> TestResult {
    let file = write_config(
        r#"
[gateway]
url = "https://houston.example.com:1969"
username = "trader"
request_timeout_ms = 15000

[wait]
poll_interval_ms = 250
timeout_ms = 60000

[output]
format = "json"

[audit]
enabled = true
"#,
    )?;
    let config =
        TradedeskConfig::load_with_env(Some(file.path()), no_env).map_err(|err| err.to_string())?;
    let url = config.gateway.base_url().map_err(|err| err.to_string())?;
    if url.map(|url| url.to_string()) != Some("https://houston.example.com:1969/".to_string()) {
        return Err("gateway url not parsed".to_string());
    }
    if config.gateway.request_timeout().as_millis() != 15_000 {
        return Err("request timeout not parsed".to_string());
    }
    if config.wait.poll_interval().as_millis() != 250 || config.wait.timeout().as_secs() != 60 {
        return Err(format!("unexpected wait config: {:?}", config.wait));
    }
    if config.output.format != OutputFormat::Json || !config.audit.enabled {
        return Err("output or audit section not parsed".to_string());
    }
    Ok(())
}

#[test]
fn env_overrides_file_values() -> TestResult {
    let file = write_config("[gateway]\nurl = \"http://file.example:1969\"\n")?;
    let env = env_from(&[
        ("TRADEDESK_GATEWAY_URL", "http://env.example:1969"),
        ("TRADEDESK_GATEWAY_USERNAME", "ops"),
        ("TRADEDESK_GATEWAY_PASSWORD", "secret"),
        ("TRADEDESK_CLI_OUTPUT_FORMAT", "JSON"),
    ]);
    let config = TradedeskConfig::load_with_env(Some(file.path()), env).map_err(|err| err.to_string())?;
    if config.gateway.url.as_deref() != Some("http://env.example:1969") {
        return Err("url override not applied".to_string());
    }
    if config.gateway.username.as_deref() != Some("ops")
        || config.gateway.password.as_deref() != Some("secret")
    {
        return Err("credential overrides not applied".to_string());
    }
    if config.output.format != OutputFormat::Json {
        return Err("output override not applied".to_string());
    }
    if format!("{:?}", config.gateway).contains("secret") {
        return Err("password leaked through Debug".to_string());
    }
    Ok(())
}

#[test]
fn empty_env_values_are_ignored() -> TestResult {
    let file = write_config("[gateway]\nurl = \"http://file.example:1969\"\n")?;
    let env = env_from(&[("TRADEDESK_GATEWAY_URL", "  "), ("TRADEDESK_CLI_OUTPUT_FORMAT", "")]);
    let config = TradedeskConfig::load_with_env(Some(file.path()), env).map_err(|err| err.to_string())?;
    if config.gateway.url.as_deref() != Some("http://file.example:1969") {
        return Err("empty env value replaced the file value".to_string());
    }
    Ok(())
}

#[test]
fn env_rejects_unknown_output_format() -> TestResult {
    let file = write_config("")?;
    let env = env_from(&[("TRADEDESK_CLI_OUTPUT_FORMAT", "xml")]);
    assert_invalid(
        TradedeskConfig::load_with_env(Some(file.path()), env),
        "output format must be yaml or json",
    )
}

#[test]
fn env_password_without_username_is_rejected() -> TestResult {
    let file = write_config("")?;
    let env = env_from(&[("TRADEDESK_GATEWAY_PASSWORD", "secret")]);
    assert_invalid(
        TradedeskConfig::load_with_env(Some(file.path()), env),
        "gateway password requires a username",
    )
}
