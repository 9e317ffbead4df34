use std::fmt::Display;

use derive_more::derive::AsRef;

#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, AsRef)]
pub struct MillimetersPerHour(pub f64);

impl Display for MillimetersPerHour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} mm/h", self.0)
    }
}

impl From<&MillimetersPerHour> for f64 {
    fn from(value: &MillimetersPerHour) -> Self {
        value.0
    }
}

impl From<f64> for MillimetersPerHour {
    fn from(value: f64) -> Self {
        Self(value)
    }
}
