use std::fmt::Display;

use derive_more::derive::AsRef;
use serde::{Deserialize, Serialize};

/// Installed panel capacity. Scale factor between the provider's relative
/// power fractions and absolute power/energy values.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsRef, Serialize, Deserialize)]
pub struct KiloWattPeak(pub f64);

impl Display for KiloWattPeak {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} kWp", self.0)
    }
}

impl From<&KiloWattPeak> for f64 {
    fn from(value: &KiloWattPeak) -> Self {
        value.0
    }
}

impl From<f64> for KiloWattPeak {
    fn from(value: f64) -> Self {
        Self(value)
    }
}
