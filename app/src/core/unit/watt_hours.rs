use std::{fmt::Display, ops::Add};

use derive_more::derive::AsRef;

#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, AsRef)]
pub struct WattHours(pub f64);

impl Display for WattHours {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} Wh", self.0)
    }
}

impl From<&WattHours> for f64 {
    fn from(value: &WattHours) -> Self {
        value.0
    }
}

impl From<f64> for WattHours {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl Add for WattHours {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        WattHours(self.0 + rhs.0)
    }
}
