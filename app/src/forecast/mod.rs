mod condition;
mod estimate;

pub use condition::Condition;
pub use estimate::{Estimate, ForecastResponse, WeatherSample};
