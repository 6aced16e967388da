use std::{env, error::Error, fs, path::Path};

#[allow(dead_code)]
#[path = "src/parity.rs"]
mod parity;
#[allow(dead_code)]
#[path = "build/provision.rs"]
mod provision;
#[allow(dead_code)]
#[path = "src/schema.rs"]
mod schema;
#[allow(dead_code)]
#[path = "src/topic.rs"]
mod topic;

use provision::{PROVISIONED, TEMPLATE};

fn read_optional(path: &str) -> Result<Option<String>, Box<dyn Error>> {
    if !Path::new(path).exists() {
        return Ok(None);
    }
    Ok(Some(fs::read_to_string(path)?))
}

fn main() -> Result<(), Box<dyn Error>> {
    // Tell Cargo to rerun if either variant changes
    println!("cargo:rerun-if-changed={}", TEMPLATE);
    println!("cargo:rerun-if-changed={}", PROVISIONED);
    for source in ["build/provision.rs", "src/parity.rs", "src/schema.rs", "src/topic.rs"] {
        println!("cargo:rerun-if-changed={}", source);
    }

    let template = fs::read_to_string(TEMPLATE)?;
    let real = read_optional(PROVISIONED)?;

    let provisioned = provision::validate(&template, real.as_deref())?;
    for warning in &provisioned.warnings {
        println!("cargo:warning={}: {}", PROVISIONED, warning);
    }
    let raw = provisioned.raw;

    // Generate Rust code
    let out_dir = env::var("OUT_DIR")?;
    let dest_path = Path::new(&out_dir).join("config.rs");
    let code = format!(
        r#"
        pub const WIFI_SSID: &str = {ssid:?};
        pub const WIFI_PASSWORD: &str = {psk:?};
        pub const MQTT_BROKER: &str = {mb:?};
        pub const MQTT_PORT: u16 = {mp};
        pub const MQTT_USERNAME: &str = {mu:?};
        pub const MQTT_PASSWORD: &str = {mpw:?};
        pub const DEVICE_ID: &str = {id:?};
        pub const MQTT_TELEMETRY_TOPIC: &str = {mt:?};
        pub const PUBLISH_INTERVAL_MS: u32 = {intv};

        pub const CONFIG: Config<'static> = Config {{
            wifi_ssid: WIFI_SSID,
            wifi_password: WIFI_PASSWORD,
            mqtt_broker: MQTT_BROKER,
            mqtt_port: MQTT_PORT,
            mqtt_username: MQTT_USERNAME,
            mqtt_password: MQTT_PASSWORD,
            device_id: DEVICE_ID,
            mqtt_telemetry_topic: MQTT_TELEMETRY_TOPIC,
            publish_interval_ms: PUBLISH_INTERVAL_MS,
        }};
    "#,
        ssid = raw.wifi_ssid,
        psk = raw.wifi_password,
        mb = raw.mqtt_broker,
        mp = raw.mqtt_port,
        mu = raw.mqtt_username,
        mpw = raw.mqtt_password,
        id = raw.device_id,
        mt = raw.mqtt_telemetry_topic,
        intv = raw.publish_interval_ms
    );

    fs::write(dest_path, code)?;
    Ok(())
}
