use std::fmt::Display;

use derive_more::derive::AsRef;

#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, AsRef)]
pub struct MetersPerSecond(pub f64);

impl Display for MetersPerSecond {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} m/s", self.0)
    }
}

impl From<&MetersPerSecond> for f64 {
    fn from(value: &MetersPerSecond) -> Self {
        value.0
    }
}

impl From<f64> for MetersPerSecond {
    fn from(value: f64) -> Self {
        Self(value)
    }
}
