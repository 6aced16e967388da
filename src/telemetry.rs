use core::fmt::{self, Write};

use heapless::String;

use crate::schema::Config;

/// Size of the payload buffer used by the firmware
pub const PAYLOAD_BUFFER_SIZE: usize = 256;

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    BufferOverflow,
    NonFinite,
}

impl From<fmt::Error> for Error {
    fn from(_: fmt::Error) -> Self {
        Error::BufferOverflow
    }
}

/// One DHT11 sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Degrees Celsius
    pub temperature: f32,
    /// Relative humidity in percent
    pub humidity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    Json,
    Influx,
}

#[cfg(not(any(feature = "json", feature = "influx")))]
compile_error!("enable the `json` or `influx` feature to pick a payload format");

impl PayloadFormat {
    #[cfg(feature = "json")]
    pub const DEFAULT: PayloadFormat = PayloadFormat::Json;
    #[cfg(all(feature = "influx", not(feature = "json")))]
    pub const DEFAULT: PayloadFormat = PayloadFormat::Influx;
}

// JSON string contents: quotes, backslashes and control characters escaped
struct JsonStr<'a>(&'a str);

impl fmt::Display for JsonStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                '"' => f.write_str("\\\"")?,
                '\\' => f.write_str("\\\\")?,
                '\n' => f.write_str("\\n")?,
                '\r' => f.write_str("\\r")?,
                '\t' => f.write_str("\\t")?,
                c if c.is_control() => write!(f, "\\u{:04x}", c as u32)?,
                c => f.write_char(c)?,
            }
        }
        Ok(())
    }
}

// Influx line protocol tag value: space, comma and equals sign escaped
struct InfluxTag<'a>(&'a str);

impl fmt::Display for InfluxTag<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            if matches!(c, ' ' | ',' | '=') {
                f.write_char('\\')?;
            }
            f.write_char(c)?;
        }
        Ok(())
    }
}

impl Default for PayloadFormat {
    fn default() -> Self {
        PayloadFormat::DEFAULT
    }
}

pub fn format_payload<const N: usize>(
    config: &Config<'_>,
    reading: &Reading,
    format: PayloadFormat,
) -> Result<String<N>, Error> {
    if !reading.temperature.is_finite() || !reading.humidity.is_finite() {
        return Err(Error::NonFinite);
    }

    let mut payload: String<N> = String::new();

    match format {
        PayloadFormat::Json => {
            write!(
                payload,
                "{{\"device_id\": \"{}\", \"temperature\": {:.2}, \"humidity\": {:.2}}}",
                JsonStr(config.device_id),
                reading.temperature,
                reading.humidity
            )?;
        }
        PayloadFormat::Influx => {
            write!(
                payload,
                "environment,device_id={} temperature={:.2},humidity={:.2}",
                InfluxTag(config.device_id),
                reading.temperature,
                reading.humidity
            )?;
        }
    }

    Ok(payload)
}
