//! 相電流検出
//!
//! シャント抵抗の電圧をOPAMP(PGA)で増幅し、ADCで読み取ります。
//! 増幅器出力は電流ゼロで中点電圧になるよう
//! バイアスされているため、オフセットを差し引いて符号付き電流に戻します。

use crate::math::{Scalar, Vector};

/// 電流検出パラメータ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentSenseConfig {
    /// 増幅器ゲイン（PGA x4）
    pub gain: f32,
    /// シャント抵抗 [Ω]
    pub shunt_resistance: f32,
    /// ADC基準電圧 [V]
    pub vref: f32,
    /// ADCフルスケール
    pub adc_max: u16,
}

impl CurrentSenseConfig {
    pub const fn default() -> Self {
        Self {
            gain: 4.0,
            shunt_resistance: 0.02,
            vref: 3.3,
            adc_max: 4096,
        }
    }

    /// ADC 1カウントあたりの電流 [A]
    pub fn amps_per_count(&self) -> Scalar {
        self.vref / self.adc_max as Scalar / (self.gain * self.shunt_resistance)
    }
}

impl Default for CurrentSenseConfig {
    fn default() -> Self {
        Self::default()
    }
}

/// 電流検出エラー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CurrentSenseError {
    /// 電流ゼロ時の出力が中点から離れすぎている
    OffsetOutOfRange,
}

/// 2相分の電流検出
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentSense {
    config: CurrentSenseConfig,
    amps_per_count: Scalar,
    /// 電流ゼロ時のADC値（A相, B相）
    offset: [Scalar; 2],
}

impl CurrentSense {
    /// 中点からの許容オフセット（フルスケール比）
    pub const MAX_OFFSET_DEVIATION: Scalar = 0.1;

    pub fn new(config: CurrentSenseConfig) -> Self {
        let mid_rail = config.adc_max as Scalar / 2.0;
        Self {
            config,
            amps_per_count: config.amps_per_count(),
            offset: [mid_rail; 2],
        }
    }

    /// ドライバ停止中のサンプルからオフセットを較正
    ///
    /// サンプルが空の場合は中点のまま。平均が中点から
    /// [`MAX_OFFSET_DEVIATION`](Self::MAX_OFFSET_DEVIATION) 以上ずれていれば
    /// 増幅器の異常とみなし、オフセットは変更しない。
    pub fn calibrate_offset(&mut self, samples: &[[u16; 2]]) -> Result<(), CurrentSenseError> {
        if samples.is_empty() {
            return Ok(());
        }
        let mut sum = [0u32; 2];
        for sample in samples {
            sum[0] += sample[0] as u32;
            sum[1] += sample[1] as u32;
        }
        let n = samples.len() as Scalar;
        let offset = [sum[0] as Scalar / n, sum[1] as Scalar / n];

        let mid_rail = self.config.adc_max as Scalar / 2.0;
        let limit = self.config.adc_max as Scalar * Self::MAX_OFFSET_DEVIATION;
        if offset.iter().any(|o| (o - mid_rail).abs() > limit) {
            warn!("current offset out of range: {} {}", offset[0], offset[1]);
            return Err(CurrentSenseError::OffsetOutOfRange);
        }

        self.offset = offset;
        debug!("current offset calibrated: {} {}", self.offset[0], self.offset[1]);
        Ok(())
    }

    /// ADC生値 → A相・B相電流 [A]
    #[inline]
    pub fn phase_currents(&self, raw: [u16; 2]) -> Vector<2> {
        [
            (raw[0] as Scalar - self.offset[0]) * self.amps_per_count,
            (raw[1] as Scalar - self.offset[1]) * self.amps_per_count,
        ]
    }

    pub fn offset(&self) -> [Scalar; 2] {
        self.offset
    }

    pub fn config(&self) -> &CurrentSenseConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_mid_rail_is_zero_current() {
        let sense = CurrentSense::new(CurrentSenseConfig::default());
        assert_eq!(sense.phase_currents([2048, 2048]), [0.0, 0.0]);
    }

    #[test]
    fn test_current_scaling() {
        let sense = CurrentSense::new(CurrentSenseConfig::default());
        // 3.3V / 4096 / (4 × 0.02Ω) ≈ 10.07 mA/count
        let per_count = 3.3 / 4096.0 / 0.08;
        let [ia, ib] = sense.phase_currents([2048 + 100, 2048 - 100]);
        assert!(approx_eq(ia, 100.0 * per_count));
        assert!(approx_eq(ib, -100.0 * per_count));
    }

    #[test]
    fn test_offset_calibration() {
        let mut sense = CurrentSense::new(CurrentSenseConfig::default());
        assert_eq!(
            sense.calibrate_offset(&[[2000, 2100], [2002, 2102], [2004, 2104]]),
            Ok(())
        );
        assert_eq!(sense.offset(), [2002.0, 2102.0]);
        assert_eq!(sense.phase_currents([2002, 2102]), [0.0, 0.0]);

        assert_eq!(sense.calibrate_offset(&[]), Ok(()));
        assert_eq!(sense.offset(), [2002.0, 2102.0]);
    }

    #[test]
    fn test_offset_far_from_mid_rail_rejected() {
        let mut sense = CurrentSense::new(CurrentSenseConfig::default());
        // 増幅器が無電源ならADCは0付近に張り付く
        assert_eq!(
            sense.calibrate_offset(&[[2048, 12], [2048, 10]]),
            Err(CurrentSenseError::OffsetOutOfRange)
        );
        assert_eq!(sense.offset(), [2048.0, 2048.0]);
    }
}
