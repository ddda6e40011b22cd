//! Reading - Reading Source output
//!
//! One timestamped temperature/humidity sample from the device.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unit label carried with every temperature value
pub const UNIT_TEMPERATURE: &str = "°C";

/// Unit label carried with every humidity value
pub const UNIT_HUMIDITY: &str = "%";

/// Sensor reading
///
/// Immutable once produced; handed from stage to stage by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Device identifier
    #[serde(rename = "deviceId")]
    pub device_id: String,

    /// Temperature (°C)
    pub temperature: f64,

    /// Relative humidity (%)
    pub humidity: f64,

    /// Sample instant
    #[serde(with = "crate::timestamp::iso_millis")]
    pub timestamp: DateTime<Utc>,

    #[serde(default = "default_unit_temp")]
    pub unit_temp: String,

    #[serde(default = "default_unit_humidity")]
    pub unit_humidity: String,
}

fn default_unit_temp() -> String {
    UNIT_TEMPERATURE.to_string()
}

fn default_unit_humidity() -> String {
    UNIT_HUMIDITY.to_string()
}

impl Reading {
    /// Create a reading with the standard unit labels
    pub fn new(
        device_id: impl Into<String>,
        temperature: f64,
        humidity: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            temperature,
            humidity,
            timestamp,
            unit_temp: default_unit_temp(),
            unit_humidity: default_unit_humidity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_reading_wire_shape() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let reading = Reading::new("IOT-abc123xyz", 23.45, 51.2, ts);
        let value = serde_json::to_value(&reading).unwrap();

        assert_eq!(value["deviceId"], "IOT-abc123xyz");
        assert_eq!(value["temperature"], 23.45);
        assert_eq!(value["humidity"], 51.2);
        assert_eq!(value["timestamp"], "2024-01-02T03:04:05.000Z");
        assert_eq!(value["unit_temp"], "°C");
        assert_eq!(value["unit_humidity"], "%");
    }

    #[test]
    fn test_reading_parses_without_units() {
        let json = r#"{"deviceId":"d","temperature":21.0,"humidity":40.5,"timestamp":"2024-01-02T03:04:05.250Z"}"#;
        let reading: Reading = serde_json::from_str(json).unwrap();
        assert_eq!(reading.unit_temp, UNIT_TEMPERATURE);
        assert_eq!(reading.timestamp.timestamp_subsec_millis(), 250);
    }
}
