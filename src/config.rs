//! Configuration module
//!
//! このモジュールはモーター制御パラメータのデフォルト値と、
//! タスクに渡される不変の設定スナップショットを提供します。

pub mod params;
pub mod snapshot;

// snapshot.rsから構造体を再エクスポート
pub use snapshot::{
    ConfigError, ConfigSnapshot, ControllerParams, MotorParams, ObserverParams, PwmParams,
};
