//! 設定スナップショット
//!
//! タスク実行中は不変。設定の更新は次のタスク生成時にのみ反映されます。

use core::fmt;

use super::params;
use crate::foc::units::{self, ConversionError};
use crate::math::Scalar;

/// 無効なパラメータグループ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    Controller,
    Motor,
    Observer,
    Pwm,
}

impl ConfigError {
    /// ログ・致命停止用の数値コード
    pub const fn code(self) -> i32 {
        match self {
            Self::Controller => -1,
            Self::Motor => -2,
            Self::Observer => -3,
            Self::Pwm => -4,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let group = match self {
            Self::Controller => "controller",
            Self::Motor => "motor",
            Self::Observer => "observer",
            Self::Pwm => "pwm",
        };
        write!(f, "invalid {} parameters", group)
    }
}

fn positive(value: Scalar) -> bool {
    value > 0.0 && value.is_finite()
}

/// コントローラパラメータ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerParams {
    /// 速度PI制御の比例ゲイン
    pub speed_kp: f32,
    /// 速度PI制御の積分ゲイン
    pub speed_ki: f32,
    /// 最大出力電圧 [V]
    pub max_voltage: f32,
    /// 始動時のq軸電圧 [V]
    pub spinup_voltage: f32,
    /// 始動加速度 [機械RPM/s]
    pub spinup_acceleration_rpm_per_s: f32,
    /// 始動完了回転数 [機械RPM]
    pub spinup_target_rpm: f32,
    /// 始動タイムアウト [s]
    pub spinup_timeout: f32,
}

impl ControllerParams {
    pub const fn default() -> Self {
        Self {
            speed_kp: params::controller::DEFAULT_SPEED_KP,
            speed_ki: params::controller::DEFAULT_SPEED_KI,
            max_voltage: params::controller::DEFAULT_MAX_VOLTAGE,
            spinup_voltage: params::controller::DEFAULT_SPINUP_VOLTAGE,
            spinup_acceleration_rpm_per_s: params::controller::DEFAULT_SPINUP_ACCELERATION_RPM_PER_S,
            spinup_target_rpm: params::controller::DEFAULT_SPINUP_TARGET_RPM,
            spinup_timeout: params::controller::DEFAULT_SPINUP_TIMEOUT,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.speed_kp >= 0.0
            && self.speed_kp.is_finite()
            && self.speed_ki >= 0.0
            && self.speed_ki.is_finite()
            && positive(self.max_voltage)
            && positive(self.spinup_voltage)
            && self.spinup_voltage <= self.max_voltage
            && positive(self.spinup_acceleration_rpm_per_s)
            && positive(self.spinup_target_rpm)
            && positive(self.spinup_timeout)
    }
}

/// モーターパラメータ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorParams {
    /// 磁極数（偶数、2以上）
    pub num_poles: u32,
    /// 相抵抗 [Ω]
    pub phase_resistance: f32,
    /// 相インダクタンス [H]
    pub phase_inductance: f32,
    /// 鎖交磁束 [Wb]
    pub field_flux: f32,
    /// 最大相電流 [A]
    pub max_current: f32,
}

impl MotorParams {
    pub const fn default() -> Self {
        Self {
            num_poles: params::motor::DEFAULT_NUM_POLES,
            phase_resistance: params::motor::DEFAULT_PHASE_RESISTANCE,
            phase_inductance: params::motor::DEFAULT_PHASE_INDUCTANCE,
            field_flux: params::motor::DEFAULT_FIELD_FLUX,
            max_current: params::motor::DEFAULT_MAX_CURRENT,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.num_poles >= 2
            && self.num_poles % 2 == 0
            && positive(self.phase_resistance)
            && positive(self.phase_inductance)
            && positive(self.field_flux)
            && positive(self.max_current)
    }

    /// 鎖交磁束から求めたKV [機械RPM/V]
    pub fn kv(&self) -> Result<Scalar, ConversionError> {
        units::convert_flux_linkage_to_kv(self.field_flux, self.num_poles)
    }
}

/// オブザーバパラメータ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverParams {
    /// プロセスノイズ共分散（電流d, 電流q, 角速度）
    pub process_noise: [f32; 3],
    /// 観測ノイズ共分散（電流α, 電流β）
    pub measurement_noise: [f32; 2],
    /// 交差結合補償係数 (0.0-1.0)
    pub cross_coupling_compensation: f32,
}

impl ObserverParams {
    pub const fn default() -> Self {
        Self {
            process_noise: params::observer::DEFAULT_PROCESS_NOISE,
            measurement_noise: params::observer::DEFAULT_MEASUREMENT_NOISE,
            cross_coupling_compensation: params::observer::DEFAULT_CROSS_COUPLING_COMPENSATION,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.process_noise.iter().all(|&q| positive(q))
            && self.measurement_noise.iter().all(|&r| positive(r))
            && (0.0..=1.0).contains(&self.cross_coupling_compensation)
    }
}

/// PWMパラメータ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PwmParams {
    /// PWM周波数 [Hz]
    pub frequency: u32,
    /// デッドタイム [s]
    pub dead_time: f32,
}

impl PwmParams {
    pub const fn default() -> Self {
        Self {
            frequency: params::pwm::DEFAULT_FREQUENCY,
            dead_time: params::pwm::DEFAULT_DEAD_TIME,
        }
    }

    /// PWM周期 [s]
    pub fn period(&self) -> Scalar {
        1.0 / self.frequency as Scalar
    }

    pub fn is_valid(&self) -> bool {
        (params::pwm::MIN_FREQUENCY..=params::pwm::MAX_FREQUENCY).contains(&self.frequency)
            && self.dead_time >= 0.0
            && self.dead_time < self.period() / 10.0
    }
}

/// タスク間で共有される不変の設定スナップショット
///
/// タスク実行中は変更されない。設定の更新は次のタスク生成時にのみ反映される。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfigSnapshot {
    pub controller: ControllerParams,
    pub motor: MotorParams,
    pub observer: ObserverParams,
    pub pwm: PwmParams,
}

impl ConfigSnapshot {
    /// デフォルト設定を生成（params.rsの値を使用）
    pub const fn default() -> Self {
        Self {
            controller: ControllerParams::default(),
            motor: MotorParams::default(),
            observer: ObserverParams::default(),
            pwm: PwmParams::default(),
        }
    }

    /// 全グループを検証し、最初に無効だったグループを返す
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.controller.is_valid() {
            return Err(ConfigError::Controller);
        }
        if !self.motor.is_valid() {
            return Err(ConfigError::Motor);
        }
        if !self.observer.is_valid() {
            return Err(ConfigError::Observer);
        }
        if !self.pwm.is_valid() {
            return Err(ConfigError::Pwm);
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}
