//! DCバス電圧監視
//!
//! 分圧回路経由のADC値からバス電圧を求め、過電圧/低電圧を判定します。
//! 判定結果はメイン周期ごとに [`HardwareStatus`] としてタスクへ渡されます。

use crate::config::params;
use crate::math::Scalar;
use crate::task::HardwareStatus;

/// 電圧監視パラメータ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoltageMonitorConfig {
    /// 分圧抵抗の上側 [Ω]
    pub r_upper: f32,
    /// 分圧抵抗の下側 [Ω]
    pub r_lower: f32,
    /// ADCフルスケール（12ビット = 4096）
    pub adc_max: u16,
    /// ADC基準電圧 [V]
    pub vref: f32,
    /// ローパスフィルタ係数（0.0-1.0、大きいほど応答速度が速い）
    pub filter_alpha: f32,
    /// 過電圧しきい値 [V]
    pub overvoltage_threshold: f32,
    /// 低電圧しきい値 [V]
    pub undervoltage_threshold: f32,
}

impl VoltageMonitorConfig {
    pub const fn default() -> Self {
        Self {
            // 分圧回路: 33.3kΩ + 3.3kΩ
            // V_bus = V_adc * (33.3k + 3.3k) / 3.3k = V_adc * 11.09
            // 最大入力電圧: 3.3V * 11.09 ≈ 36.6V
            r_upper: 33_300.0,
            r_lower: 3_300.0,
            adc_max: 4096,
            vref: 3.3,
            filter_alpha: 0.1,
            overvoltage_threshold: params::voltage::DEFAULT_OVERVOLTAGE_THRESHOLD,
            undervoltage_threshold: params::voltage::DEFAULT_UNDERVOLTAGE_THRESHOLD,
        }
    }
}

impl VoltageMonitorConfig {
    /// ADC生値から実電圧を計算 [V]（フィルタなしの瞬時値）
    #[inline]
    pub fn adc_to_voltage(&self, adc_raw: u16) -> Scalar {
        let v_adc = (adc_raw as f32 / self.adc_max as f32) * self.vref;

        // V_bus = V_adc * (R_upper + R_lower) / R_lower
        let divider_ratio = (self.r_upper + self.r_lower) / self.r_lower;
        v_adc * divider_ratio
    }
}

impl Default for VoltageMonitorConfig {
    fn default() -> Self {
        Self::default()
    }
}

/// 電圧監視状態
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VoltageMonitorState {
    /// 現在の電圧 [V]（フィルタ済み）
    pub voltage: f32,
    /// 過電圧フラグ
    pub overvoltage: bool,
    /// 低電圧フラグ
    pub undervoltage: bool,
}

impl VoltageMonitorState {
    /// 初回測定前（0V、低電圧扱い）
    pub const fn new() -> Self {
        Self {
            voltage: 0.0,
            overvoltage: false,
            undervoltage: true,
        }
    }

    /// 電圧が正常範囲内かチェック
    pub fn is_voltage_ok(&self) -> bool {
        !self.overvoltage && !self.undervoltage
    }

    /// タスクに渡すボード状態
    pub fn hardware_status(&self) -> HardwareStatus {
        HardwareStatus {
            power_ok: self.is_voltage_ok(),
            bus_voltage: self.voltage,
        }
    }
}

impl Default for VoltageMonitorState {
    fn default() -> Self {
        Self::new()
    }
}

/// 電圧監視コントローラ
#[derive(Debug, Clone)]
pub struct VoltageMonitor {
    config: VoltageMonitorConfig,
    state: VoltageMonitorState,
}

impl VoltageMonitor {
    pub fn new(config: VoltageMonitorConfig) -> Self {
        Self {
            config,
            state: VoltageMonitorState::new(),
        }
    }

    /// ADC生値から実電圧を計算 [V]
    pub fn adc_to_voltage(&self, adc_raw: u16) -> Scalar {
        self.config.adc_to_voltage(adc_raw)
    }

    fn check_thresholds(&mut self) {
        let was_ok = self.state.is_voltage_ok();

        self.state.overvoltage = self.state.voltage > self.config.overvoltage_threshold;
        self.state.undervoltage = self.state.voltage < self.config.undervoltage_threshold;

        // 状態が変化したときだけログ
        match (was_ok, self.state.is_voltage_ok()) {
            (true, false) => error!(
                "Bus voltage fault: {}V (OV: {}, UV: {})",
                self.state.voltage, self.state.overvoltage, self.state.undervoltage
            ),
            (false, true) => info!("Bus voltage recovered: {}V", self.state.voltage),
            _ => {}
        }
    }

    /// 電圧を更新し、過電圧/低電圧をチェック
    ///
    /// # 引数
    /// * `adc_raw` - ADC生値（0-4095）
    pub fn update(&mut self, adc_raw: u16) -> VoltageMonitorState {
        let voltage_raw = self.adc_to_voltage(adc_raw);

        // filtered = alpha * raw + (1 - alpha) * filtered_prev
        self.state.voltage = self.config.filter_alpha * voltage_raw
            + (1.0 - self.config.filter_alpha) * self.state.voltage;

        self.check_thresholds();
        self.state
    }

    /// フィルタを初期電圧で初期化（起動時の誤検出防止用）
    pub fn initialize_with_adc(&mut self, adc_raw: u16) -> VoltageMonitorState {
        self.state.voltage = self.adc_to_voltage(adc_raw);
        self.check_thresholds();
        self.state
    }

    pub fn state(&self) -> VoltageMonitorState {
        self.state
    }

    pub fn config(&self) -> &VoltageMonitorConfig {
        &self.config
    }
}
