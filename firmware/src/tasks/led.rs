//! LED制御タスク
//!
//! RGBインジケータでボード状態を表示します。

use embassy_time::{Duration, Ticker};
use g4_foc::board::Rgb;

use crate::board;
use crate::config::timing::LED_PERIOD_MS;
use crate::state;

/// 現在の状態に対応する色
fn status_color() -> Rgb {
    if !state::voltage_state().is_voltage_ok() {
        Rgb::VOLTAGE_FAULT
    } else if state::with_runner(|runner| runner.is_idle()) {
        Rgb::IDLE
    } else {
        Rgb::RUNNING
    }
}

/// LED制御タスク
#[embassy_executor::task]
pub async fn led_task() {
    info!("LED task started");

    let mut ticker = Ticker::every(Duration::from_millis(LED_PERIOD_MS));

    loop {
        ticker.next().await;

        let color = status_color();
        if color != board::indicator_rgb() {
            board::set_indicator_rgb(color);
        }
    }
}
