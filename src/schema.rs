use core::{fmt, time::Duration};

use heapless::Vec;

use crate::topic::{validate_topic_name, TelemetryTopic, TopicError};

/// Marker left in template values that must be replaced at provisioning time
pub const PLACEHOLDER_MARKER: &str = "CHANGE_ME";

/// Conventional MQTT port without TLS
pub const PLAINTEXT_PORT: u16 = 1883;
/// Conventional MQTT port with TLS
pub const TLS_PORT: u16 = 8883;

/// Names of the provisioning values shared by the template and the real file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    WifiSsid,
    WifiPassword,
    MqttBroker,
    MqttPort,
    MqttUsername,
    MqttPassword,
    DeviceId,
    MqttTelemetryTopic,
    PublishIntervalMs,
}

impl Key {
    pub const COUNT: usize = 9;

    pub const ALL: [Key; Key::COUNT] = [
        Key::WifiSsid,
        Key::WifiPassword,
        Key::MqttBroker,
        Key::MqttPort,
        Key::MqttUsername,
        Key::MqttPassword,
        Key::DeviceId,
        Key::MqttTelemetryTopic,
        Key::PublishIntervalMs,
    ];

    /// Name of the generated Rust constant
    pub const fn symbol(self) -> &'static str {
        match self {
            Key::WifiSsid => "WIFI_SSID",
            Key::WifiPassword => "WIFI_PASSWORD",
            Key::MqttBroker => "MQTT_BROKER",
            Key::MqttPort => "MQTT_PORT",
            Key::MqttUsername => "MQTT_USERNAME",
            Key::MqttPassword => "MQTT_PASSWORD",
            Key::DeviceId => "DEVICE_ID",
            Key::MqttTelemetryTopic => "MQTT_TELEMETRY_TOPIC",
            Key::PublishIntervalMs => "PUBLISH_INTERVAL_MS",
        }
    }

    /// Name used in `cfg.toml` and `cfg.example.toml`
    pub const fn toml_key(self) -> &'static str {
        match self {
            Key::WifiSsid => "wifi_ssid",
            Key::WifiPassword => "wifi_password",
            Key::MqttBroker => "mqtt_broker",
            Key::MqttPort => "mqtt_port",
            Key::MqttUsername => "mqtt_username",
            Key::MqttPassword => "mqtt_password",
            Key::DeviceId => "device_id",
            Key::MqttTelemetryTopic => "mqtt_telemetry_topic",
            Key::PublishIntervalMs => "publish_interval_ms",
        }
    }

    pub fn from_toml_key(name: &str) -> Option<Key> {
        Key::ALL.into_iter().find(|key| key.toml_key() == name)
    }

    pub const fn is_secret(self) -> bool {
        matches!(self, Key::WifiPassword | Key::MqttPassword)
    }

    /// Optional values may be left empty
    pub const fn is_optional(self) -> bool {
        matches!(self, Key::MqttUsername | Key::MqttPassword)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Provisioning record of one sensor node.
///
/// The firmware sees a single `'static` instance generated at build time
/// (see [`crate::config::CONFIG`]). The lifetime lets the build script and
/// provisioning tools check records they parsed themselves.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Config<'a> {
    // Wi-Fi SSID at the deployment site
    pub wifi_ssid: &'a str,

    // Wi-Fi password
    pub wifi_password: &'a str,

    // MQTT broker hostname or IP address
    pub mqtt_broker: &'a str,

    // MQTT port (1883 plaintext, 8883 TLS)
    pub mqtt_port: u16,

    // MQTT username, empty when the broker does not require auth
    pub mqtt_username: &'a str,

    // MQTT password, empty when the broker does not require auth
    pub mqtt_password: &'a str,

    // Unique logical identifier of this node
    pub device_id: &'a str,

    // Topic the node publishes telemetry to
    pub mqtt_telemetry_topic: &'a str,

    // Milliseconds between telemetry publishes
    pub publish_interval_ms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Plain,
    Tls,
    Other(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Value of a single key, secrets wrapped so they never print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value<'a> {
    Text(&'a str),
    Secret(&'a str),
    Number(u32),
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) => write!(f, "{:?}", text),
            Value::Secret(secret) => write!(f, "{}", Redacted(secret)),
            Value::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Prints `"***"` for a set secret and `""` for an empty one.
pub struct Redacted<'a>(pub &'a str);

impl fmt::Display for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("\"\"")
        } else {
            f.write_str("\"***\"")
        }
    }
}

impl fmt::Debug for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl<'a> Config<'a> {
    pub fn value(&self, key: Key) -> Value<'a> {
        let text = match key {
            Key::MqttPort => return Value::Number(self.mqtt_port.into()),
            Key::PublishIntervalMs => return Value::Number(self.publish_interval_ms),
            Key::WifiSsid => self.wifi_ssid,
            Key::WifiPassword => self.wifi_password,
            Key::MqttBroker => self.mqtt_broker,
            Key::MqttUsername => self.mqtt_username,
            Key::MqttPassword => self.mqtt_password,
            Key::DeviceId => self.device_id,
            Key::MqttTelemetryTopic => self.mqtt_telemetry_topic,
        };
        if key.is_secret() {
            Value::Secret(text)
        } else {
            Value::Text(text)
        }
    }

    /// Text value of `key`, `None` for the numeric keys.
    pub fn text(&self, key: Key) -> Option<&'a str> {
        match self.value(key) {
            Value::Text(text) | Value::Secret(text) => Some(text),
            Value::Number(_) => None,
        }
    }

    pub fn publish_interval(&self) -> Duration {
        Duration::from_millis(self.publish_interval_ms.into())
    }

    pub fn transport(&self) -> Transport {
        match self.mqtt_port {
            PLAINTEXT_PORT => Transport::Plain,
            TLS_PORT => Transport::Tls,
            other => Transport::Other(other),
        }
    }

    /// Broker login, `None` when the username is left empty.
    pub fn credentials(&self) -> Option<Credentials<'a>> {
        if self.mqtt_username.is_empty() {
            return None;
        }
        Some(Credentials {
            username: self.mqtt_username,
            password: self.mqtt_password,
        })
    }

    pub fn topic(&self) -> Result<TelemetryTopic<'a>, TopicError> {
        TelemetryTopic::parse(self.mqtt_telemetry_topic)
    }

    /// Structural checks, at most one finding per key.
    pub fn check(&self) -> Findings {
        let mut findings = Findings::default();
        for key in Key::ALL {
            if let Some(issue) = self.check_key(key) {
                findings.push(Finding { key, issue });
            }
        }
        findings
    }

    fn check_key(&self, key: Key) -> Option<Issue> {
        match key {
            Key::MqttPort => match self.mqtt_port {
                0 => Some(Issue::ZeroPort),
                PLAINTEXT_PORT | TLS_PORT => None,
                port => Some(Issue::UnconventionalPort(port)),
            },
            Key::PublishIntervalMs => (self.publish_interval_ms == 0).then_some(Issue::ZeroInterval),
            Key::MqttTelemetryTopic => self.check_topic(),
            _ => {
                let text = self.text(key)?;
                if text.is_empty() && !key.is_optional() {
                    Some(Issue::Empty)
                } else if text.contains(PLACEHOLDER_MARKER) {
                    Some(Issue::Placeholder)
                } else if key == Key::MqttPassword
                    && !text.is_empty()
                    && self.mqtt_username.is_empty()
                {
                    Some(Issue::PasswordWithoutUsername)
                } else {
                    None
                }
            }
        }
    }

    fn check_topic(&self) -> Option<Issue> {
        let topic = self.mqtt_telemetry_topic;
        match validate_topic_name(topic) {
            Err(TopicError::Empty) => return Some(Issue::Empty),
            Err(e) => return Some(Issue::InvalidTopic(e)),
            Ok(()) => {}
        }
        if topic.contains(PLACEHOLDER_MARKER) {
            return Some(Issue::Placeholder);
        }
        match self.topic() {
            Err(_) => Some(Issue::UnrecognizedTopic),
            Ok(parsed) => match parsed.device() {
                Some(device) if device != self.device_id => Some(Issue::ForeignDevice),
                _ => None,
            },
        }
    }

    /// Key whose value two device records must not share, if they do.
    pub fn collides_with(&self, other: &Config<'_>) -> Option<Key> {
        if self.device_id == other.device_id {
            Some(Key::DeviceId)
        } else if self.mqtt_telemetry_topic == other.mqtt_telemetry_topic {
            Some(Key::MqttTelemetryTopic)
        } else {
            None
        }
    }
}

impl fmt::Debug for Config<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("wifi_ssid", &self.wifi_ssid)
            .field("wifi_password", &Redacted(self.wifi_password))
            .field("mqtt_broker", &self.mqtt_broker)
            .field("mqtt_port", &self.mqtt_port)
            .field("mqtt_username", &self.mqtt_username)
            .field("mqtt_password", &Redacted(self.mqtt_password))
            .field("device_id", &self.device_id)
            .field("mqtt_telemetry_topic", &self.mqtt_telemetry_topic)
            .field("publish_interval_ms", &self.publish_interval_ms)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Issue {
    Empty,
    Placeholder,
    ZeroPort,
    UnconventionalPort(u16),
    ZeroInterval,
    InvalidTopic(TopicError),
    UnrecognizedTopic,
    ForeignDevice,
    PasswordWithoutUsername,
}

impl Issue {
    pub fn severity(&self) -> Severity {
        match self {
            Issue::Placeholder
            | Issue::UnconventionalPort(_)
            | Issue::UnrecognizedTopic
            | Issue::ForeignDevice
            | Issue::PasswordWithoutUsername => Severity::Warning,
            Issue::Empty | Issue::ZeroPort | Issue::ZeroInterval | Issue::InvalidTopic(_) => {
                Severity::Error
            }
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::Empty => f.write_str("must not be empty"),
            Issue::Placeholder => write!(f, "still holds a {} placeholder", PLACEHOLDER_MARKER),
            Issue::ZeroPort => f.write_str("port 0 is not a valid broker port"),
            Issue::UnconventionalPort(port) => write!(
                f,
                "port {} is neither {} (plaintext) nor {} (TLS)",
                port, PLAINTEXT_PORT, TLS_PORT
            ),
            Issue::ZeroInterval => f.write_str("publish interval must be positive"),
            Issue::InvalidTopic(e) => write!(f, "invalid topic: {}", e),
            Issue::UnrecognizedTopic => f.write_str(
                "does not follow ironlink/env/<site>/esp32/<sensor> \
                 or ironlink/{tenant}/{site}/{device}/telemetry",
            ),
            Issue::ForeignDevice => f.write_str("names a different device than DEVICE_ID"),
            Issue::PasswordWithoutUsername => {
                f.write_str("is set but MQTT_USERNAME is empty, so no login is sent")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finding {
    pub key: Key,
    pub issue: Issue,
}

impl Finding {
    pub fn severity(&self) -> Severity {
        self.issue.severity()
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.issue)
    }
}

/// Result of [`Config::check`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Findings(Vec<Finding, { Key::COUNT }>);

impl Findings {
    fn push(&mut self, finding: Finding) {
        // one finding per key, so capacity is never exceeded
        let _ = self.0.push(finding);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Finding> {
        self.0.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.iter().filter(|f| f.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.iter().filter(|f| f.severity() == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn get(&self, key: Key) -> Option<&Issue> {
        self.iter().find(|f| f.key == key).map(|f| &f.issue)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<'f> IntoIterator for &'f Findings {
    type Item = &'f Finding;
    type IntoIter = core::slice::Iter<'f, Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE_A: Config<'static> = Config {
        wifi_ssid: "SITE_WIFI_NAME",
        wifi_password: "SITE_WIFI_PASSWORD",
        mqtt_broker: "192.168.0.50",
        mqtt_port: 1883,
        mqtt_username: "",
        mqtt_password: "",
        device_id: "SITE-A-ENV-01",
        mqtt_telemetry_topic: "ironlink/env/HOME/esp32/dht11",
        publish_interval_ms: 5000,
    };

    #[test]
    fn key_names_round_trip() {
        for key in Key::ALL {
            assert_eq!(Key::from_toml_key(key.toml_key()), Some(key));
            assert_eq!(key.symbol().to_ascii_lowercase(), key.toml_key());
        }
        assert_eq!(Key::from_toml_key("WIFI_SSID"), None);
        assert_eq!(Key::from_toml_key("tls_ca"), None);
    }

    #[test]
    fn only_passwords_are_secret() {
        let secret: std::vec::Vec<_> = Key::ALL.into_iter().filter(|k| k.is_secret()).collect();
        assert_eq!(secret, [Key::WifiPassword, Key::MqttPassword]);
    }

    #[test]
    fn provisioned_record_is_clean() {
        let findings = SITE_A.check();
        assert!(findings.is_empty(), "{:?}", findings);
    }

    #[test]
    fn template_values_are_flagged_as_placeholders() {
        let template = Config {
            wifi_ssid: "CHANGE_ME_WIFI_SSID",
            wifi_password: "CHANGE_ME_WIFI_PASSWORD",
            ..SITE_A
        };
        let findings = template.check();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings.get(Key::WifiSsid), Some(&Issue::Placeholder));
        assert!(!findings.has_errors());
        assert_eq!(findings.warnings().count(), 2);
    }

    #[test]
    fn empty_required_values_are_errors() {
        let config = Config {
            wifi_ssid: "",
            device_id: "",
            mqtt_telemetry_topic: "",
            ..SITE_A
        };
        let findings = config.check();
        assert!(findings.has_errors());
        assert_eq!(findings.get(Key::WifiSsid), Some(&Issue::Empty));
        assert_eq!(findings.get(Key::DeviceId), Some(&Issue::Empty));
        assert_eq!(findings.get(Key::MqttTelemetryTopic), Some(&Issue::Empty));
    }

    #[test]
    fn empty_broker_credentials_are_allowed() {
        assert_eq!(SITE_A.credentials(), None);
        assert_eq!(SITE_A.check().get(Key::MqttUsername), None);

        let with_login = Config {
            mqtt_username: "node",
            mqtt_password: "hunter2",
            ..SITE_A
        };
        assert_eq!(
            with_login.credentials(),
            Some(Credentials {
                username: "node",
                password: "hunter2"
            })
        );
    }

    #[test]
    fn password_without_username_is_flagged() {
        let config = Config {
            mqtt_password: "hunter2",
            ..SITE_A
        };
        assert_eq!(config.credentials(), None);

        let findings = config.check();
        assert_eq!(
            findings.get(Key::MqttPassword),
            Some(&Issue::PasswordWithoutUsername)
        );
        assert!(!findings.has_errors());
        assert_eq!(
            findings.iter().next().copied().unwrap().to_string(),
            "MQTT_PASSWORD: is set but MQTT_USERNAME is empty, so no login is sent"
        );

        let with_login = Config {
            mqtt_username: "node",
            ..config
        };
        assert!(with_login.check().is_empty());
    }

    #[test]
    fn port_convention_is_a_warning() {
        let config = Config {
            mqtt_port: 1884,
            ..SITE_A
        };
        let findings = config.check();
        assert_eq!(
            findings.get(Key::MqttPort),
            Some(&Issue::UnconventionalPort(1884))
        );
        assert!(!findings.has_errors());
        assert_eq!(config.transport(), Transport::Other(1884));

        let zero = Config {
            mqtt_port: 0,
            ..SITE_A
        };
        assert!(zero.check().has_errors());
    }

    #[test]
    fn transport_follows_port() {
        assert_eq!(SITE_A.transport(), Transport::Plain);
        let tls = Config {
            mqtt_port: 8883,
            ..SITE_A
        };
        assert_eq!(tls.transport(), Transport::Tls);
    }

    #[test]
    fn publish_interval_must_be_positive() {
        assert_eq!(SITE_A.publish_interval(), Duration::from_secs(5));
        let config = Config {
            publish_interval_ms: 0,
            ..SITE_A
        };
        assert_eq!(
            config.check().get(Key::PublishIntervalMs),
            Some(&Issue::ZeroInterval)
        );
    }

    #[test]
    fn topic_checks() {
        let wildcard = Config {
            mqtt_telemetry_topic: "ironlink/env/+/esp32/dht11",
            ..SITE_A
        };
        assert_eq!(
            wildcard.check().get(Key::MqttTelemetryTopic),
            Some(&Issue::InvalidTopic(TopicError::Wildcard))
        );

        let foreign = Config {
            mqtt_telemetry_topic: "sensors/kitchen",
            ..SITE_A
        };
        assert_eq!(
            foreign.check().get(Key::MqttTelemetryTopic),
            Some(&Issue::UnrecognizedTopic)
        );

        let other_device = Config {
            mqtt_telemetry_topic: "ironlink/clientA/siteA/SITE-A-ENV-02/telemetry",
            ..SITE_A
        };
        assert_eq!(
            other_device.check().get(Key::MqttTelemetryTopic),
            Some(&Issue::ForeignDevice)
        );

        let own_device = Config {
            mqtt_telemetry_topic: "ironlink/clientA/siteA/SITE-A-ENV-01/telemetry",
            ..SITE_A
        };
        assert!(own_device.check().is_empty());
    }

    #[test]
    fn collisions_between_devices() {
        let second = Config {
            device_id: "SITE-A-ENV-02",
            mqtt_telemetry_topic: "ironlink/env/HOME/esp32/dht11-b",
            ..SITE_A
        };
        assert_eq!(SITE_A.collides_with(&second), None);

        let same_topic = Config {
            device_id: "SITE-A-ENV-02",
            ..SITE_A
        };
        assert_eq!(
            SITE_A.collides_with(&same_topic),
            Some(Key::MqttTelemetryTopic)
        );
        assert_eq!(SITE_A.collides_with(&SITE_A), Some(Key::DeviceId));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = Config {
            mqtt_password: "hunter2",
            ..SITE_A
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("SITE_WIFI_PASSWORD"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("wifi_password: \"***\""));
        assert!(debug.contains("mqtt_username: \"\""));

        assert_eq!(config.value(Key::MqttPassword).to_string(), "\"***\"");
        assert_eq!(config.value(Key::MqttPort).to_string(), "1883");
        assert_eq!(config.text(Key::DeviceId), Some("SITE-A-ENV-01"));
        assert_eq!(config.text(Key::PublishIntervalMs), None);
    }

    #[test]
    fn findings_render_with_symbol_names() {
        let config = Config {
            mqtt_port: 1884,
            ..SITE_A
        };
        let finding = config.check().iter().next().copied().unwrap();
        assert_eq!(
            finding.to_string(),
            "MQTT_PORT: port 1884 is neither 1883 (plaintext) nor 8883 (TLS)"
        );
    }
}
