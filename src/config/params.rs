//! モーター制御とハードウェアの設定パラメータ（デフォルト値）

/// コントローラパラメータ
pub mod controller {
    /// 速度PI制御の比例ゲイン（デフォルト値）
    pub const DEFAULT_SPEED_KP: f32 = 0.8;

    /// 速度PI制御の積分ゲイン（デフォルト値）
    pub const DEFAULT_SPEED_KI: f32 = 0.1;

    /// 最大出力電圧 [V]（デフォルト値）
    pub const DEFAULT_MAX_VOLTAGE: f32 = 24.0;

    /// 始動時のq軸電圧 [V]（デフォルト値）
    pub const DEFAULT_SPINUP_VOLTAGE: f32 = 2.0;

    /// 始動加速度 [機械RPM/s]（デフォルト値）
    pub const DEFAULT_SPINUP_ACCELERATION_RPM_PER_S: f32 = 500.0;

    /// 始動完了と見なす回転数 [機械RPM]（デフォルト値）
    pub const DEFAULT_SPINUP_TARGET_RPM: f32 = 500.0;

    /// 始動タイムアウト [s]（デフォルト値）
    pub const DEFAULT_SPINUP_TIMEOUT: f32 = 5.0;
}

/// モーターパラメータ
pub mod motor {
    /// 磁極数（極対数6 × 2）（デフォルト値）
    pub const DEFAULT_NUM_POLES: u32 = 12;

    /// 相抵抗 [Ω]（デフォルト値）
    pub const DEFAULT_PHASE_RESISTANCE: f32 = 0.1;

    /// 相インダクタンス [H]（デフォルト値）
    pub const DEFAULT_PHASE_INDUCTANCE: f32 = 50.0e-6;

    /// 鎖交磁束 [Wb]（デフォルト値）
    pub const DEFAULT_FIELD_FLUX: f32 = 4.0e-3;

    /// 最大相電流 [A]（デフォルト値）
    pub const DEFAULT_MAX_CURRENT: f32 = 10.0;
}

/// オブザーバパラメータ
pub mod observer {
    /// プロセスノイズ共分散（電流d, 電流q, 角速度）（デフォルト値）
    pub const DEFAULT_PROCESS_NOISE: [f32; 3] = [3.0e4, 3.0e4, 1.0e6];

    /// 観測ノイズ共分散（電流α, 電流β）（デフォルト値）
    pub const DEFAULT_MEASUREMENT_NOISE: [f32; 2] = [2.0, 2.0];

    /// 交差結合補償係数 (0.0-1.0)（デフォルト値）
    pub const DEFAULT_CROSS_COUPLING_COMPENSATION: f32 = 1.0;
}

/// PWM設定
pub mod pwm {
    /// PWM周波数 [Hz]（20kHz）（デフォルト値）
    pub const DEFAULT_FREQUENCY: u32 = 20_000;

    /// デッドタイム [s]（デフォルト値）
    pub const DEFAULT_DEAD_TIME: f32 = 500.0e-9;

    /// 許容周波数範囲 [Hz]
    pub const MIN_FREQUENCY: u32 = 1_000;
    pub const MAX_FREQUENCY: u32 = 100_000;
}

/// 電圧監視設定
pub mod voltage {
    /// 過電圧しきい値 [V]
    pub const DEFAULT_OVERVOLTAGE_THRESHOLD: f32 = 30.0;

    /// 低電圧しきい値 [V]
    pub const DEFAULT_UNDERVOLTAGE_THRESHOLD: f32 = 10.0;
}
