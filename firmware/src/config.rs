//! ファームウェア設定
//!
//! 制御パラメータ本体は `g4_foc::config` にあり、ここではボードの
//! タイミング定数と、起動時の設定初期化を扱います。

use g4_foc::{ConfigError, ConfigSnapshot};
use g4_foc::voltage_monitor::VoltageMonitorConfig;

/// タイマークロック [Hz]（SYSCLK = 170MHz）
pub const TIMER_CLOCK_HZ: u32 = 170_000_000;

/// ウォッチドッグタイムアウト [ms]
pub const WATCHDOG_TIMEOUT_MS: u32 = 500;

/// 周期タスクの設定
pub mod timing {
    /// メイン周期チェック [ms]
    pub const MAIN_CHECK_PERIOD_MS: u64 = 1;

    /// 電圧監視周期 [ms]
    pub const VOLTAGE_MONITOR_PERIOD_MS: u64 = 10;

    /// インジケータ更新周期 [ms]
    pub const LED_PERIOD_MS: u64 = 50;

    /// ステータスログ間隔（メイン周期の回数、1秒ごと）
    pub const STATUS_LOG_DECIMATION: u32 = 1000;
}

/// 起動シーケンス
pub mod boot {
    use g4_foc::task::BootSequence;

    /// 起動ビープ（1kHz, 0.3s）の後にアイドル。
    /// `spinup` フィーチャ有効時はビープ成功後にオープンループ始動を行う。
    pub const SEQUENCE: BootSequence = BootSequence {
        beep_frequency: 1000.0,
        beep_duration: 0.3,
        spinup_after_beep: cfg!(feature = "spinup"),
    };
}

// PWM周期はタイマーティックで正確に表せること
const _: () = core::assert!(
    embassy_time::TICK_HZ % g4_foc::config::params::pwm::DEFAULT_FREQUENCY as u64 == 0
);
// ウォッチドッグはメイン周期より十分長いこと
const _: () = core::assert!(WATCHDOG_TIMEOUT_MS as u64 >= 10 * timing::MAIN_CHECK_PERIOD_MS);
const _: () = core::assert!(timing::VOLTAGE_MONITOR_PERIOD_MS >= timing::MAIN_CHECK_PERIOD_MS);
// ステータスログのデバッグ変数は7個
const _: () = core::assert!(g4_foc::task::NUM_DEBUG_VARIABLES == 7);

/// バス電圧の分圧回路（高速パスと電圧監視タスクで共用）
pub const BUS_VOLTAGE_DIVIDER: VoltageMonitorConfig = VoltageMonitorConfig::default();

/// 設定サブシステムを初期化
///
/// 永続化層は持たないため、デフォルト値を検証して返す。
pub fn init() -> Result<ConfigSnapshot, ConfigError> {
    let snapshot = ConfigSnapshot::default();
    snapshot.validate()?;

    info!(
        "Config: PWM {}Hz, dead time {}s, poles {}, max {}V",
        snapshot.pwm.frequency,
        snapshot.pwm.dead_time,
        snapshot.motor.num_poles,
        snapshot.controller.max_voltage
    );
    Ok(snapshot)
}

/// デッドタイム [s] → タイマーティック
pub fn dead_time_ticks(dead_time: f32) -> u16 {
    let ticks = libm::roundf(dead_time * TIMER_CLOCK_HZ as f32);
    ticks.clamp(0.0, u16::MAX as f32) as u16
}
