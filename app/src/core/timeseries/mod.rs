pub mod dataframe;
pub mod datapoint;

pub use dataframe::DataFrame;
pub use datapoint::DataPoint;
