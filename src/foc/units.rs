// Unit conversions used by the control math
//
// Every function is pure. Preconditions are reported through
// `ConversionError` instead of asserting, so the behavior does not depend
// on the build profile.

use core::f32::consts::PI;
use core::fmt;

use crate::math::{Scalar, SQRT_3};

/// Shared by the flux linkage ↔ KV pair, which makes them exact inverses
const KV_FLUX_LINKAGE_PRODUCT: Scalar = 20.0 * SQRT_3 / PI;

/// Rejected conversion input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConversionError {
    /// A quantity that must be strictly positive was zero, negative or NaN
    NonPositiveInput,
    /// Pole count is odd or less than 2
    InvalidPoleCount,
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveInput => f.write_str("input must be strictly positive"),
            Self::InvalidPoleCount => f.write_str("pole count must be even and at least 2"),
        }
    }
}

fn check_pole_count(num_poles: u32) -> Result<Scalar, ConversionError> {
    if num_poles >= 2 && num_poles % 2 == 0 {
        Ok(num_poles as Scalar)
    } else {
        Err(ConversionError::InvalidPoleCount)
    }
}

fn check_positive(value: Scalar) -> Result<Scalar, ConversionError> {
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ConversionError::NonPositiveInput)
    }
}

/// Flux linkage [Wb] → velocity constant KV [mechanical RPM/V]
///
/// # Arguments
/// * `flux_linkage` - Positive, in Weber
/// * `num_poles` - Number of rotor poles; even, at least 2
pub fn convert_flux_linkage_to_kv(
    flux_linkage: Scalar,
    num_poles: u32,
) -> Result<Scalar, ConversionError> {
    let poles = check_pole_count(num_poles)?;
    let flux_linkage = check_positive(flux_linkage)?;
    Ok(KV_FLUX_LINKAGE_PRODUCT / (flux_linkage * poles))
}

/// Velocity constant KV [mechanical RPM/V] → flux linkage [Wb]
///
/// # Arguments
/// * `kv` - Positive, in mechanical RPM per volt
/// * `num_poles` - Number of rotor poles; even, at least 2
pub fn convert_kv_to_flux_linkage(kv: Scalar, num_poles: u32) -> Result<Scalar, ConversionError> {
    let poles = check_pole_count(num_poles)?;
    let kv = check_positive(kv)?;
    Ok(KV_FLUX_LINKAGE_PRODUCT / (kv * poles))
}

/// Angular velocity [rad/s] → RPM
///
/// Applies equally to electrical and mechanical angular velocity.
pub fn convert_angular_velocity_to_rpm(radian_per_sec: Scalar) -> Scalar {
    radian_per_sec * 60.0 / (2.0 * PI)
}

/// RPM → angular velocity [rad/s]
pub fn convert_rpm_to_angular_velocity(rpm: Scalar) -> Scalar {
    rpm * 2.0 * PI / 60.0
}

/// Electrical → mechanical rotation rate
///
/// Works for any rate unit (rad/s, RPM, Hz); the result keeps the unit.
pub fn convert_rotation_rate_electrical_to_mechanical(
    rate: Scalar,
    num_poles: u32,
) -> Result<Scalar, ConversionError> {
    let poles = check_pole_count(num_poles)?;
    Ok(rate / (poles / 2.0))
}

/// Mechanical → electrical rotation rate
pub fn convert_rotation_rate_mechanical_to_electrical(
    rate: Scalar,
    num_poles: u32,
) -> Result<Scalar, ConversionError> {
    let poles = check_pole_count(num_poles)?;
    Ok(rate * (poles / 2.0))
}
