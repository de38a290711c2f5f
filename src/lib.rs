//! FOCモーター制御コア
//!
//! PWM周期ごとに3相出力を計算するリアルタイムタスク群と、
//! それを支える設定・単位変換・信号処理を提供します。
//! ヒープ割り当ては一切行いません。

#![cfg_attr(not(test), no_std)]

mod fmt;

pub mod board;
pub mod config;
pub mod critical;
pub mod current_sense;
pub mod foc;
pub mod math;
pub mod task;
pub mod voltage_monitor;

pub use config::{ConfigError, ConfigSnapshot};
pub use math::{Range, Scalar, Vector};
pub use task::{
    ControlTask, EventCounter, HardwareStatus, PwmOutput, Task, TaskContext, TaskResult,
    TaskRunner,
};
