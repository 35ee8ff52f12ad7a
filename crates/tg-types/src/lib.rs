pub mod errors;
pub mod estimator;
pub mod params;
pub mod table;

pub use errors::*;
pub use estimator::*;
pub use params::*;
pub use table::*;
