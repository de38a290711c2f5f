// FOC (Field Oriented Control) math
// Coordinate transforms, space-vector modulation and unit conversions

pub mod svpwm;
pub mod transforms;
pub mod units;

// Re-export main functions for easier access
pub use svpwm::svpwm;
pub use transforms::{clarke, inverse_park, normalize_angle};
pub use units::ConversionError;
