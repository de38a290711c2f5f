// Scalar and vector primitives shared by the control math

/// Scalar type used throughout the control loop
pub type Scalar = f32;

/// Fixed-size vector; phase quantities are `Vector<2>` (a, b) or `Vector<3>` (a, b, c)
pub type Vector<const N: usize> = [Scalar; N];

pub const SQRT_3: Scalar = 1.732_050_8;

/// Closed interval used to clamp externally supplied parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: Scalar,
    pub max: Scalar,
}

impl Range {
    pub const fn new(min: Scalar, max: Scalar) -> Self {
        Self { min, max }
    }

    /// Clamp `value` into the range
    ///
    /// NaN maps to `min`, so the result is always a finite value inside the range.
    pub fn constrain(&self, value: Scalar) -> Scalar {
        if !(value >= self.min) {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }

    pub fn contains(&self, value: Scalar) -> bool {
        value >= self.min && value <= self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constrain() {
        let range = Range::new(100.0, 15000.0);
        assert_eq!(range.constrain(50.0), 100.0);
        assert_eq!(range.constrain(1000.0), 1000.0);
        assert_eq!(range.constrain(20000.0), 15000.0);
        assert_eq!(range.constrain(Scalar::INFINITY), 15000.0);
        assert_eq!(range.constrain(Scalar::NEG_INFINITY), 100.0);
    }

    #[test]
    fn test_constrain_nan() {
        let range = Range::new(0.0, 3.0);
        assert_eq!(range.constrain(Scalar::NAN), 0.0);
    }

    #[test]
    fn test_contains() {
        let range = Range::new(0.0, 1.0);
        assert!(range.contains(0.0));
        assert!(range.contains(1.0));
        assert!(!range.contains(1.5));
        assert!(!range.contains(Scalar::NAN));
    }
}
