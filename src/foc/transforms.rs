// Coordinate transformations for FOC (Field Oriented Control)
// Includes forward Clarke and inverse Park transforms

use crate::math::{Scalar, Vector, SQRT_3};

/// Clarke transformation (ab → αβ)
///
/// Only two phase currents are measured; the third is implied by
/// `i_a + i_b + i_c = 0`.
///
/// # Arguments
/// * `phase_ab` - Measured currents of phases A and B
///
/// # Returns
/// `[i_alpha, i_beta]` in the stationary frame
pub fn clarke(phase_ab: Vector<2>) -> Vector<2> {
    let [i_a, i_b] = phase_ab;
    [i_a, (i_a + 2.0 * i_b) / SQRT_3]
}

/// Inverse Park transformation (dq → αβ)
///
/// Transforms from the rotating dq reference frame to the stationary αβ frame
///
/// # Arguments
/// * `vd` - d-axis voltage (aligned with rotor flux)
/// * `vq` - q-axis voltage (perpendicular to rotor flux, produces torque)
/// * `theta` - Electrical angle in radians, [0, 2π)
///
/// # Returns
/// `[v_alpha, v_beta]` in the stationary frame
///
/// # Implementation
/// Uses idsp::cossin() for fast fixed-point trigonometry (~40 cycles on Cortex-M)
/// instead of libm::cosf/sinf (~100-200 cycles). The fast path has a hard
/// deadline, so the fixed-point version is the only one provided.
pub fn inverse_park(vd: Scalar, vq: Scalar, theta: Scalar) -> Vector<2> {
    use core::f32::consts::{PI, TAU};

    // idsp maps i32::MIN..=i32::MAX onto -π..π
    let normalized_theta = if theta > PI { theta - TAU } else { theta };

    const SCALE: Scalar = 2_147_483_648.0 / PI; // 2^31 / π
    let phase: i32 = (normalized_theta * SCALE) as i32;

    let (cos_i32, sin_i32) = idsp::cossin(phase);

    const I32_TO_F32: Scalar = 1.0 / 2_147_483_648.0; // 1 / 2^31
    let cos_theta = cos_i32 as Scalar * I32_TO_F32;
    let sin_theta = sin_i32 as Scalar * I32_TO_F32;

    [
        vd * cos_theta - vq * sin_theta,
        vd * sin_theta + vq * cos_theta,
    ]
}

/// Normalize angle to range [0, 2π)
pub fn normalize_angle(angle: Scalar) -> Scalar {
    use core::f32::consts::TAU;

    let mut normalized = libm::fmodf(angle, TAU);
    if normalized < 0.0 {
        normalized += TAU;
    }
    // tiny negative inputs round up to exactly TAU
    if normalized >= TAU {
        normalized = 0.0;
    }
    normalized
}
