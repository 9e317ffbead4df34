mod degree_celsius;
mod kilowatt_peak;
mod percent;
mod precipitation;
mod speed;
mod watt;
mod watt_hours;

pub use degree_celsius::DegreeCelsius;
pub use kilowatt_peak::KiloWattPeak;
pub use percent::Percent;
pub use precipitation::MillimetersPerHour;
pub use speed::MetersPerSecond;
pub use watt::Watt;
pub use watt_hours::WattHours;
