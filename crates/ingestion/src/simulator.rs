//! Simulated temperature / humidity device

use chrono::Utc;
use contracts::{DeviceConfig, Reading, ReadingSource};
use rand::Rng;

const DEVICE_ID_PREFIX: &str = "IOT-";
const DEVICE_ID_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Random device id: `IOT-` followed by 9 base36 characters
pub fn generate_device_id() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..DEVICE_ID_LEN)
        .map(|_| char::from(BASE36[rng.random_range(0..BASE36.len())]))
        .collect();
    format!("{DEVICE_ID_PREFIX}{suffix}")
}

/// Device producing uniformly distributed readings within fixed ranges
#[derive(Debug, Clone)]
pub struct DeviceSimulator {
    device_id: String,
    temperature_range: [f64; 2],
    humidity_range: [f64; 2],
}

impl DeviceSimulator {
    pub fn new(
        device_id: impl Into<String>,
        temperature_range: [f64; 2],
        humidity_range: [f64; 2],
    ) -> Self {
        Self {
            device_id: device_id.into(),
            temperature_range,
            humidity_range,
        }
    }

    /// Build from the `[device]` section, generating an id when none is set
    pub fn from_config(config: &DeviceConfig) -> Self {
        let device_id = config
            .device_id
            .clone()
            .unwrap_or_else(generate_device_id);
        Self::new(device_id, config.temperature_range, config.humidity_range)
    }
}

fn sample(rng: &mut impl Rng, [min, max]: [f64; 2]) -> f64 {
    round2(rng.random_range(min..max))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl ReadingSource for DeviceSimulator {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn next_reading(&self) -> Reading {
        let mut rng = rand::rng();
        Reading::new(
            self.device_id.clone(),
            sample(&mut rng, self.temperature_range),
            sample(&mut rng, self.humidity_range),
            Utc::now(),
        )
    }
}
