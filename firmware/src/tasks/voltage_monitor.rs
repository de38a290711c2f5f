//! 電圧監視タスク
//!
//! 高速パスが取得したバス電圧ADC値をフィルタし、過電圧/低電圧を判定します。

use embassy_time::{Duration, Ticker};
use g4_foc::voltage_monitor::VoltageMonitor;

use crate::config::timing::VOLTAGE_MONITOR_PERIOD_MS;
use crate::state::{BUS_VOLTAGE_RAW, VOLTAGE_STATE};

/// 電圧監視タスク
///
/// `monitor` は起動時の測定値で初期化済みであること。
#[embassy_executor::task]
pub async fn voltage_monitor_task(mut monitor: VoltageMonitor) {
    info!(
        "Voltage monitor task started: OV={}V, UV={}V",
        monitor.config().overvoltage_threshold,
        monitor.config().undervoltage_threshold
    );

    let mut ticker = Ticker::every(Duration::from_millis(VOLTAGE_MONITOR_PERIOD_MS));

    // デバッグログ用カウンタ（1秒ごとにログ）
    let mut log_counter = 0u32;

    loop {
        ticker.next().await;

        let adc_raw = BUS_VOLTAGE_RAW.lock(|raw| raw.get());
        let state = monitor.update(adc_raw);
        VOLTAGE_STATE.lock(|s| s.set(state));

        log_counter += 1;
        if log_counter >= (1000 / VOLTAGE_MONITOR_PERIOD_MS) as u32 {
            log_counter = 0;
            debug!(
                "[Voltage Monitor] Bus: {}V (ADC: {}), OV: {}, UV: {}",
                state.voltage, adc_raw, state.overvoltage, state.undervoltage
            );
        }
    }
}
