// Space Vector PWM (SVPWM) modulation
//
// This implementation is based on the calebfletcher/foc crate approach:
// https://github.com/calebfletcher/foc
//
// It uses a fast x/y/z coordinate transformation and sign-based sector
// detection instead of trigonometric functions.

use crate::math::{Scalar, Vector, SQRT_3};

/// Modulation vector that produces zero line-to-line voltage
pub const MIDPOINT: Vector<3> = [0.5, 0.5, 0.5];

/// Calculate the space-vector modulation vector
///
/// # Arguments
/// * `v_alpha` - Alpha-axis voltage command (volts)
/// * `v_beta` - Beta-axis voltage command (volts)
/// * `v_dc` - Measured inverter (DC bus) voltage (volts)
///
/// # Returns
/// Per-phase modulation `[a, b, c]`, each in [0, 1].
/// Returns [`MIDPOINT`] when `v_dc` is not positive.
///
/// # Algorithm
/// 1. Normalize alpha/beta voltages by DC bus voltage
/// 2. Convert normalized alpha/beta to x/y/z coordinates
/// 3. Determine sector (1-6) based on signs of x/y/z
/// 4. Calculate phase values in [-1, 1] directly from x/y/z
/// 5. Shift into [0, 1]
pub fn svpwm(v_alpha: Scalar, v_beta: Scalar, v_dc: Scalar) -> Vector<3> {
    if !(v_dc > 0.0) {
        return MIDPOINT;
    }

    let v_alpha_norm = v_alpha / v_dc;
    let v_beta_norm = v_beta / v_dc;

    let sqrt_3_alpha = SQRT_3 * v_alpha_norm;
    let x = v_beta_norm;
    let y = (v_beta_norm + sqrt_3_alpha) / 2.0;
    let z = (v_beta_norm - sqrt_3_alpha) / 2.0;

    let sector: u8 = match (x >= 0.0, y >= 0.0, z >= 0.0) {
        (true, true, false) => 1,
        (_, true, true) => 2,
        (true, false, true) => 3,
        (false, false, true) => 4,
        (_, false, false) => 5,
        (false, true, false) => 6,
    };

    let (ta, tb, tc) = match sector {
        1 | 4 => (x - z, x + z, -x + z),
        2 | 5 => (y - z, y + z, -y - z),
        _ => (y - x, -y + x, -y - x),
    };

    [
        ((ta + 1.0) / 2.0).clamp(0.0, 1.0),
        ((tb + 1.0) / 2.0).clamp(0.0, 1.0),
        ((tc + 1.0) / 2.0).clamp(0.0, 1.0),
    ]
}
