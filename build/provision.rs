use serde::Deserialize;

use crate::parity::SymbolDiff;
use crate::schema::{Config, Key};

pub const TEMPLATE: &str = "cfg.example.toml";
pub const PROVISIONED: &str = "cfg.toml";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    pub wifi_ssid: String,
    pub wifi_password: String,
    pub mqtt_broker: String,
    pub mqtt_port: u16,
    pub mqtt_username: String,
    pub mqtt_password: String,
    pub device_id: String,
    pub mqtt_telemetry_topic: String,
    pub publish_interval_ms: u32,
}

impl RawConfig {
    pub fn as_config(&self) -> Config<'_> {
        Config {
            wifi_ssid: &self.wifi_ssid,
            wifi_password: &self.wifi_password,
            mqtt_broker: &self.mqtt_broker,
            mqtt_port: self.mqtt_port,
            mqtt_username: &self.mqtt_username,
            mqtt_password: &self.mqtt_password,
            device_id: &self.device_id,
            mqtt_telemetry_topic: &self.mqtt_telemetry_topic,
            publish_interval_ms: self.publish_interval_ms,
        }
    }
}

/// Checked provisioning record plus the warnings to surface to the user.
#[derive(Debug)]
pub struct Provisioned {
    pub raw: RawConfig,
    pub warnings: Vec<String>,
}

/// Checks the template and the provisioned file, `real` is `None` when
/// `cfg.toml` does not exist.
///
/// Error messages never echo file contents, so secrets stay out of the
/// build log.
pub fn validate(template: &str, real: Option<&str>) -> Result<Provisioned, String> {
    let contract = Key::ALL.map(Key::toml_key);

    // The template must declare exactly the contract keys, with their types
    let template_table = parse(TEMPLATE, template)?;
    let template_keys: Vec<&str> = template_table.keys().map(String::as_str).collect();
    let diff = SymbolDiff::new(&contract, &template_keys);
    if !diff.is_symmetric() {
        return Err(format!(
            "{} does not match the config keys: {}",
            TEMPLATE,
            drift(&diff)
        ));
    }
    check_types(TEMPLATE, &template_table)?;

    let Some(real) = real else {
        return Err(format!(
            "{} not found: copy {} to {} and fill in the site values",
            PROVISIONED, TEMPLATE, PROVISIONED
        ));
    };

    let real_table = parse(PROVISIONED, real)?;
    let real_keys: Vec<&str> = real_table.keys().map(String::as_str).collect();
    let diff = SymbolDiff::new(&template_keys, &real_keys);
    if !diff.is_symmetric() {
        return Err(format!(
            "{} drifted from {}: {}",
            PROVISIONED,
            TEMPLATE,
            drift(&diff)
        ));
    }
    check_types(PROVISIONED, &real_table)?;

    let raw: RawConfig = real_table
        .try_into()
        .map_err(|e| format!("{}: {}", PROVISIONED, e.message()))?;

    let findings = raw.as_config().check();
    if findings.has_errors() {
        let errors: Vec<String> = findings.errors().map(ToString::to_string).collect();
        return Err(format!("{} is invalid: {}", PROVISIONED, errors.join("; ")));
    }
    let warnings = findings.warnings().map(ToString::to_string).collect();

    Ok(Provisioned { raw, warnings })
}

fn parse(path: &str, text: &str) -> Result<toml::Table, String> {
    text.parse::<toml::Table>().map_err(|e| {
        let line = e
            .span()
            .map(|span| text[..span.start].matches('\n').count() + 1)
            .unwrap_or(0);
        format!("{}:{}: {}", path, line, e.message())
    })
}

// Type of every contract key, reported by name only
fn check_types(path: &str, table: &toml::Table) -> Result<(), String> {
    for key in Key::ALL {
        let Some(value) = table.get(key.toml_key()) else {
            continue;
        };
        let ok = match key {
            Key::MqttPort => value
                .as_integer()
                .is_some_and(|n| u16::try_from(n).is_ok()),
            Key::PublishIntervalMs => value
                .as_integer()
                .is_some_and(|n| u32::try_from(n).is_ok()),
            _ => value.is_str(),
        };
        if !ok {
            let expected = match key {
                Key::MqttPort => "an integer between 0 and 65535",
                Key::PublishIntervalMs => "an integer between 0 and 4294967295",
                _ => "a string",
            };
            return Err(format!("{}: {} must be {}", path, key.toml_key(), expected));
        }
    }
    Ok(())
}

fn drift(diff: &SymbolDiff<'_>) -> String {
    let missing: Vec<_> = diff.missing_from_real().collect();
    let extra: Vec<_> = diff.extra_in_real().collect();
    format!(
        "missing [{}], unexpected [{}]",
        missing.join(", "),
        extra.join(", ")
    )
}
