use std::path::PathBuf;

/// Signs applied to `(alpha, beta, yaw)` corrections for one motor.
pub type MotorSigns = [f32; 3];

/// Which way each motor's thrust responds to the tilt and yaw corrections.
/// Index `k` is motor `k`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorLayout(pub [MotorSigns; 4]);

impl MotorLayout {
    /// X configuration used by the stock quadcopter model.
    pub const X: MotorLayout = MotorLayout([
        [-1.0, 1.0, 1.0],
        [-1.0, -1.0, -1.0],
        [1.0, -1.0, 1.0],
        [1.0, 1.0, -1.0],
    ]);

    pub fn signs(&self, motor: usize) -> MotorSigns {
        self.0[motor]
    }
}

impl Default for MotorLayout {
    fn default() -> Self {
        Self::X
    }
}

/// Controller gains. The defaults are the hand-tuned values for the stock
/// model and assume one control step per simulation tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gains {
    /// Thrust that holds the model level at constant altitude.
    pub hover_thrust: f32,
    pub p: f32,
    pub i: f32,
    pub d: f32,
    /// Vertical velocity damping.
    pub v: f32,
    pub tilt_p: f32,
    pub tilt_d: f32,
    pub offset_p: f32,
    pub offset_d: f32,
    pub yaw_p: f32,
    pub yaw_d: f32,
    pub layout: MotorLayout,
}

impl Default for Gains {
    fn default() -> Self {
        Self {
            hover_thrust: 5.335,
            p: 1.0,
            i: 0.0,
            d: 0.0,
            v: -2.0,
            tilt_p: 0.25,
            tilt_d: 2.1,
            offset_p: 0.005,
            offset_d: 1.0,
            yaw_p: 0.1,
            yaw_d: 2.0,
            layout: MotorLayout::X,
        }
    }
}

/// Down-camera PPM snapshots for debugging.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotConfig {
    pub enabled: bool,
    pub dir: PathBuf,
    /// Minimum simulated seconds between two snapshots.
    pub interval_s: f32,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: PathBuf::from("."),
            interval_s: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub gains: Gains,
    pub snapshot: SnapshotConfig,
}

impl Config {
    /// Defaults overridden by `QUADCOPTER_*` environment variables.
    ///
    /// - `QUADCOPTER_SNAPSHOTS` (bool)
    /// - `QUADCOPTER_SNAPSHOT_DIR`
    /// - `QUADCOPTER_SNAPSHOT_INTERVAL` (seconds)
    /// - `QUADCOPTER_HOVER_THRUST`
    pub fn from_env() -> Config {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Config {
        let defaults = Config::default();
        let gains = Gains {
            hover_thrust: read_f32(&lookup, "QUADCOPTER_HOVER_THRUST", defaults.gains.hover_thrust),
            ..defaults.gains
        };
        let snapshot = SnapshotConfig {
            enabled: read_bool(&lookup, "QUADCOPTER_SNAPSHOTS", defaults.snapshot.enabled),
            dir: read_string(&lookup, "QUADCOPTER_SNAPSHOT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.snapshot.dir),
            interval_s: read_f32(
                &lookup,
                "QUADCOPTER_SNAPSHOT_INTERVAL",
                defaults.snapshot.interval_s,
            ),
        };
        Config { gains, snapshot }
    }
}

fn read_bool(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: bool) -> bool {
    lookup(name)
        .and_then(|v| {
            let v = v.trim().to_ascii_lowercase();
            match v.as_str() {
                "1" | "true" | "yes" | "on" => Some(true),
                "0" | "false" | "no" | "off" => Some(false),
                _ => None,
            }
        })
        .unwrap_or(default)
}

fn read_f32(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: f32) -> f32 {
    lookup(name)
        .and_then(|v| v.trim().parse::<f32>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

fn read_string(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
