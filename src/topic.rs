use core::fmt::{self, Write};

use heapless::String;

/// Root level shared by every Ironlink topic
pub const ROOT: &str = "ironlink";

/// Maximum length of an MQTT topic name in bytes
pub const MAX_TOPIC_LENGTH: usize = 65535;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicError {
    Empty,
    TooLong,
    Wildcard,
    NulByte,
    Reserved,
    EmptyLevel,
    UnknownScheme,
    BufferOverflow,
}

impl fmt::Display for TopicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            TopicError::Empty => "topic is empty",
            TopicError::TooLong => "topic exceeds 65535 bytes",
            TopicError::Wildcard => "topic contains a wildcard ('+' or '#')",
            TopicError::NulByte => "topic contains a null byte",
            TopicError::Reserved => "topic starts with the broker-reserved '$'",
            TopicError::EmptyLevel => "topic has an empty level",
            TopicError::UnknownScheme => "topic does not follow an ironlink telemetry scheme",
            TopicError::BufferOverflow => "topic does not fit the output buffer",
        };
        f.write_str(msg)
    }
}

/// Checks the MQTT rules for a topic a client may publish to.
pub fn validate_topic_name(topic: &str) -> Result<(), TopicError> {
    if topic.is_empty() {
        return Err(TopicError::Empty);
    }
    if topic.len() > MAX_TOPIC_LENGTH {
        return Err(TopicError::TooLong);
    }
    if topic.starts_with('$') {
        return Err(TopicError::Reserved);
    }
    for c in topic.chars() {
        match c {
            '+' | '#' => return Err(TopicError::Wildcard),
            '\0' => return Err(TopicError::NulByte),
            _ => {}
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// `ironlink/env/<site>/esp32/<sensor>`
    Env,
    /// `ironlink/{tenant}/{site}/{device}/telemetry`
    Tenant,
}

/// Telemetry topic split into its Ironlink levels.
///
/// Two layouts are in use. Single-site deployments publish to
/// `ironlink/env/<site>/esp32/<sensor>`. Multi-tenant deployments move to
/// `ironlink/{tenant}/{site}/{device}/telemetry`, which carries the device ID
/// and so stays unique per device without extra bookkeeping.
///
/// A topic matching both shapes parses as [`TelemetryTopic::Env`], which
/// makes `env` unusable as a tenant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryTopic<'a> {
    Env {
        site: &'a str,
        sensor: &'a str,
    },
    Tenant {
        tenant: &'a str,
        site: &'a str,
        device: &'a str,
    },
}

impl<'a> TelemetryTopic<'a> {
    pub fn parse(topic: &'a str) -> Result<Self, TopicError> {
        validate_topic_name(topic)?;

        let mut levels = topic.split('/');
        let mut next = || levels.next();
        let parts = [next(), next(), next(), next(), next()];
        if next().is_some() {
            return Err(TopicError::UnknownScheme);
        }

        let [Some(root), Some(a), Some(b), Some(c), Some(d)] = parts else {
            return Err(TopicError::UnknownScheme);
        };
        if root != ROOT {
            return Err(TopicError::UnknownScheme);
        }
        if [a, b, c, d].iter().any(|level| level.is_empty()) {
            return Err(TopicError::EmptyLevel);
        }

        if a == "env" && c == "esp32" {
            Ok(TelemetryTopic::Env { site: b, sensor: d })
        } else if d == "telemetry" {
            Ok(TelemetryTopic::Tenant {
                tenant: a,
                site: b,
                device: c,
            })
        } else {
            Err(TopicError::UnknownScheme)
        }
    }

    /// Builds a topic in the planned multi-tenant layout.
    pub fn tenant(tenant: &'a str, site: &'a str, device: &'a str) -> Result<Self, TopicError> {
        for level in [tenant, site, device] {
            check_level(level)?;
        }
        Ok(TelemetryTopic::Tenant {
            tenant,
            site,
            device,
        })
    }

    /// Builds a topic in the current single-site layout.
    pub fn env(site: &'a str, sensor: &'a str) -> Result<Self, TopicError> {
        for level in [site, sensor] {
            check_level(level)?;
        }
        Ok(TelemetryTopic::Env { site, sensor })
    }

    pub fn scheme(&self) -> Scheme {
        match self {
            TelemetryTopic::Env { .. } => Scheme::Env,
            TelemetryTopic::Tenant { .. } => Scheme::Tenant,
        }
    }

    pub fn site(&self) -> &'a str {
        match self {
            TelemetryTopic::Env { site, .. } | TelemetryTopic::Tenant { site, .. } => site,
        }
    }

    /// Device level, only carried by the multi-tenant layout.
    pub fn device(&self) -> Option<&'a str> {
        match self {
            TelemetryTopic::Env { .. } => None,
            TelemetryTopic::Tenant { device, .. } => Some(device),
        }
    }

    pub fn format<const N: usize>(&self) -> Result<String<N>, TopicError> {
        let mut topic: String<N> = String::new();
        write!(topic, "{}", self).map_err(|_| TopicError::BufferOverflow)?;
        Ok(topic)
    }
}

impl fmt::Display for TelemetryTopic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryTopic::Env { site, sensor } => {
                write!(f, "{}/env/{}/esp32/{}", ROOT, site, sensor)
            }
            TelemetryTopic::Tenant {
                tenant,
                site,
                device,
            } => write!(f, "{}/{}/{}/{}/telemetry", ROOT, tenant, site, device),
        }
    }
}

// Levels sit after the root, so the leading '$' rule does not apply
fn check_level(level: &str) -> Result<(), TopicError> {
    if level.is_empty() {
        return Err(TopicError::EmptyLevel);
    }
    for c in level.chars() {
        match c {
            '/' => return Err(TopicError::UnknownScheme),
            '+' | '#' => return Err(TopicError::Wildcard),
            '\0' => return Err(TopicError::NulByte),
            _ => {}
        }
    }
    Ok(())
}
