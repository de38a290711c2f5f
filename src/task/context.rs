//! タスクコンテキスト
//!
//! タスク生成時に一度だけ作成され、タスクの寿命の間は変更されない。

use crate::board::HardwareVersion;
use crate::config::{ConfigError, ConfigSnapshot, PwmParams};
use crate::math::Scalar;

/// 実際にハードウェアへ設定されたPWMタイミング
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmTiming {
    /// PWM周期 [s]
    pub period: Scalar,
    /// デッドタイム [s]
    pub dead_time: Scalar,
}

impl PwmTiming {
    pub fn from_params(params: &PwmParams) -> Self {
        Self {
            period: params.period(),
            dead_time: params.dead_time,
        }
    }
}

/// ボード固有の能力
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoardContext {
    pub pwm: PwmTiming,
    pub hardware_version: HardwareVersion,
}

/// メイン周期ごとのボード状態
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HardwareStatus {
    /// 電源電圧が正常範囲内
    pub power_ok: bool,
    /// フィルタ済みバス電圧 [V]
    pub bus_voltage: Scalar,
}

/// タスクに渡される読み取り専用の参照束
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskContext {
    config: ConfigSnapshot,
    board: BoardContext,
}

impl TaskContext {
    /// 検証済みの設定からコンテキストを作成
    ///
    /// 無効な設定ではタスクを開始できないため、ここで拒否する。
    pub fn new(config: ConfigSnapshot, board: BoardContext) -> Result<Self, ConfigError> {
        config.validate()?;
        if !(board.pwm.period > 0.0) {
            return Err(ConfigError::Pwm);
        }
        Ok(Self { config, board })
    }

    pub fn config(&self) -> &ConfigSnapshot {
        &self.config
    }

    pub fn board(&self) -> &BoardContext {
        &self.board
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_context_rejects_invalid_config() {
        let mut config = ConfigSnapshot::default();
        config.motor.num_poles = 1;
        assert_eq!(
            TaskContext::new(config, board_with_period(50.0e-6)),
            Err(ConfigError::Motor)
        );
    }

    #[test]
    fn test_context_rejects_zero_pwm_period() {
        assert_eq!(
            TaskContext::new(ConfigSnapshot::default(), board_with_period(0.0)),
            Err(ConfigError::Pwm)
        );
    }

    #[test]
    fn test_context_keeps_snapshot() {
        let context = context_with_period(50.0e-6);
        assert_eq!(*context.config(), ConfigSnapshot::default());
        assert_eq!(context.board().pwm.period, 50.0e-6);
    }
}
