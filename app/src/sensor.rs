use serde_json::{Value, json};

use crate::core::time::DateTime;
use crate::core::unit::{DegreeCelsius, MetersPerSecond, MillimetersPerHour, Percent, Watt, WattHours};
use crate::forecast::{Condition, Estimate};
use crate::t;

pub const MANUFACTURER: &str = "PVNode";
pub const MODEL: &str = "Solar production forecast";
pub const CONFIGURATION_URL: &str = "https://pvnode.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Energy,
    Power,
    Timestamp,
    Temperature,
    Humidity,
    PrecipitationIntensity,
    WindSpeed,
}

impl DeviceClass {
    fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Energy => "energy",
            DeviceClass::Power => "power",
            DeviceClass::Timestamp => "timestamp",
            DeviceClass::Temperature => "temperature",
            DeviceClass::Humidity => "humidity",
            DeviceClass::PrecipitationIntensity => "precipitation_intensity",
            DeviceClass::WindSpeed => "wind_speed",
        }
    }
}

#[derive(Debug, Clone)]
pub enum SensorValue {
    Energy(WattHours),
    Power(Watt),
    Timestamp(Option<DateTime>),
    Temperature(Option<DegreeCelsius>),
    Humidity(Option<Percent>),
    Precipitation(Option<MillimetersPerHour>),
    WindSpeed(Option<MetersPerSecond>),
    Condition(Option<Condition>),
}

impl SensorValue {
    fn to_json(&self, precision: Option<u32>) -> Value {
        match self {
            SensorValue::Energy(v) => number(v.0, precision),
            SensorValue::Power(v) => number(v.0, precision),
            SensorValue::Timestamp(v) => v.map(|dt| json!(dt.to_iso_string())).unwrap_or(Value::Null),
            SensorValue::Temperature(v) => v.map(|x| number(x.0, precision)).unwrap_or(Value::Null),
            SensorValue::Humidity(v) => v.map(|x| number(x.0, precision)).unwrap_or(Value::Null),
            SensorValue::Precipitation(v) => v.map(|x| number(x.0, precision)).unwrap_or(Value::Null),
            SensorValue::WindSpeed(v) => v.map(|x| number(x.0, precision)).unwrap_or(Value::Null),
            SensorValue::Condition(v) => v.map(|c| json!(c.as_str())).unwrap_or(Value::Null),
        }
    }
}

fn number(value: f64, precision: Option<u32>) -> Value {
    match precision {
        Some(p) => {
            let factor = 10f64.powi(p as i32);
            json!((value * factor).round() / factor)
        }
        None => json!(value),
    }
}

/// One row of the sensor table: how a forecast query shows up as a sensor.
pub struct SensorDescription {
    pub key: &'static str,
    pub device_class: Option<DeviceClass>,
    pub unit: Option<&'static str>,
    pub precision: Option<u32>,
    pub state: fn(&Estimate) -> SensorValue,
}

impl SensorDescription {
    pub fn render(&self, estimate: &Estimate) -> Value {
        json!({
            "key": self.key,
            "device_class": self.device_class.map(|c| c.as_str()),
            "unit": self.unit,
            "state": (self.state)(estimate).to_json(self.precision),
        })
    }
}

pub fn sensor_descriptions(weather_enabled: bool) -> Vec<SensorDescription> {
    let mut sensors = energy_sensors();

    if weather_enabled {
        sensors.extend(weather_sensors());
    }

    sensors
}

fn energy_sensors() -> Vec<SensorDescription> {
    vec![
        SensorDescription {
            key: "energy_production_today",
            device_class: Some(DeviceClass::Energy),
            unit: Some("Wh"),
            precision: Some(1),
            state: |estimate| SensorValue::Energy(estimate.energy_today()),
        },
        SensorDescription {
            key: "energy_production_today_remaining",
            device_class: Some(DeviceClass::Energy),
            unit: Some("Wh"),
            precision: Some(1),
            state: |estimate| SensorValue::Energy(estimate.energy_today_remaining()),
        },
        SensorDescription {
            key: "energy_production_tomorrow",
            device_class: Some(DeviceClass::Energy),
            unit: Some("Wh"),
            precision: Some(1),
            state: |estimate| SensorValue::Energy(estimate.energy_tomorrow()),
        },
        SensorDescription {
            key: "power_highest_peak_time_today",
            device_class: Some(DeviceClass::Timestamp),
            unit: None,
            precision: None,
            state: |estimate| SensorValue::Timestamp(estimate.peak_time_today().ok()),
        },
        SensorDescription {
            key: "power_highest_peak_time_tomorrow",
            device_class: Some(DeviceClass::Timestamp),
            unit: None,
            precision: None,
            state: |estimate| SensorValue::Timestamp(estimate.peak_time_tomorrow().ok()),
        },
        SensorDescription {
            key: "power_production_now",
            device_class: Some(DeviceClass::Power),
            unit: Some("W"),
            precision: Some(0),
            state: |estimate| SensorValue::Power(estimate.power_now()),
        },
        SensorDescription {
            key: "power_production_next_hour",
            device_class: Some(DeviceClass::Power),
            unit: Some("W"),
            precision: Some(0),
            state: |estimate| SensorValue::Power(estimate.power_at(t!(in 1 hours))),
        },
        SensorDescription {
            key: "power_production_next_12hours",
            device_class: Some(DeviceClass::Power),
            unit: Some("W"),
            precision: Some(0),
            state: |estimate| SensorValue::Power(estimate.power_at(t!(in 12 hours))),
        },
        SensorDescription {
            key: "power_production_next_24hours",
            device_class: Some(DeviceClass::Power),
            unit: Some("W"),
            precision: Some(0),
            state: |estimate| SensorValue::Power(estimate.power_at(t!(in 24 hours))),
        },
        SensorDescription {
            key: "energy_current_hour",
            device_class: Some(DeviceClass::Energy),
            unit: Some("Wh"),
            precision: Some(1),
            state: |estimate| SensorValue::Energy(estimate.energy_current_hour()),
        },
        SensorDescription {
            key: "energy_next_hour",
            device_class: Some(DeviceClass::Energy),
            unit: Some("Wh"),
            precision: Some(1),
            state: |estimate| SensorValue::Energy(estimate.energy_next_hours(1)),
        },
        SensorDescription {
            key: "last_update",
            device_class: Some(DeviceClass::Timestamp),
            unit: None,
            precision: None,
            state: |estimate| SensorValue::Timestamp(Some(estimate.last_update())),
        },
    ]
}

fn weather_sensors() -> Vec<SensorDescription> {
    vec![
        SensorDescription {
            key: "weather_temperature_now",
            device_class: Some(DeviceClass::Temperature),
            unit: Some("°C"),
            precision: Some(1),
            state: |estimate| SensorValue::Temperature(estimate.temperature_now()),
        },
        SensorDescription {
            key: "weather_precipitation_now",
            device_class: Some(DeviceClass::PrecipitationIntensity),
            unit: Some("mm/h"),
            precision: Some(1),
            state: |estimate| SensorValue::Precipitation(estimate.precipitation_now()),
        },
        SensorDescription {
            key: "weather_humidity_now",
            device_class: Some(DeviceClass::Humidity),
            unit: Some("%"),
            precision: Some(0),
            state: |estimate| SensorValue::Humidity(estimate.humidity_now()),
        },
        SensorDescription {
            key: "weather_wind_speed_now",
            device_class: Some(DeviceClass::WindSpeed),
            unit: Some("m/s"),
            precision: Some(1),
            state: |estimate| SensorValue::WindSpeed(estimate.wind_speed_now()),
        },
        SensorDescription {
            key: "weather_condition_now",
            device_class: None,
            unit: None,
            precision: None,
            state: |estimate| SensorValue::Condition(estimate.condition_now()),
        },
    ]
}
