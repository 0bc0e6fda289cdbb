//! Current terminal status.
//!
//! [`DishStatus`] mirrors the `dishGetStatus` response. [`status_data`]
//! flattens it into three field sets: general status, per-wedge obstruction
//! detail, and individual alert flags. The general set also carries `alerts`,
//! a bit field with bit `i` set when alert `i` of [`ALERT_FIELDS`] is active,
//! for consumers that want a fixed set of fields even as alerts are added.

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::value::{FieldSet, FieldValue};
use crate::wire;

/// Number of 30-degree obstruction wedges, starting at North.
pub const WEDGE_COUNT: usize = 12;

/// Alert field names, in bit order.
pub const ALERT_FIELDS: &[&str] = &[
    "alert_motors_stuck",
    "alert_thermal_throttle",
    "alert_thermal_shutdown",
    "alert_unexpected_location",
];

/// State reported when the terminal cannot be reached at all.
pub const STATE_UNREACHABLE: &str = "DISH_UNREACHABLE";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceInfo {
    pub id: String,
    pub hardware_version: String,
    pub software_version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceState {
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub uptime_s: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DishAlerts {
    pub motors_stuck: bool,
    pub thermal_throttle: bool,
    pub thermal_shutdown: bool,
    pub unexpected_location: bool,
}

impl DishAlerts {
    /// Flags in [`ALERT_FIELDS`] order.
    pub fn flags(&self) -> [bool; 4] {
        [
            self.motors_stuck,
            self.thermal_throttle,
            self.thermal_shutdown,
            self.unexpected_location,
        ]
    }

    pub fn bits(&self) -> u64 {
        self.flags()
            .iter()
            .enumerate()
            .fold(0, |acc, (i, &on)| acc | (u64::from(on) << i))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObstructionStats {
    #[serde(deserialize_with = "wire::f64_lenient")]
    pub fraction_obstructed: f64,
    pub currently_obstructed: bool,
    #[serde(rename = "last24hObstructedS", deserialize_with = "wire::u64_lenient")]
    pub last_24h_obstructed_s: u64,
    #[serde(deserialize_with = "wire::f64_seq")]
    pub wedge_abs_fraction_obstructed: Vec<f64>,
}

/// The terminal's `dishGetStatus` message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DishStatus {
    pub device_info: DeviceInfo,
    pub device_state: DeviceState,
    /// Connectivity state name, e.g. `CONNECTED`, `SEARCHING`, `BOOTING`.
    pub state: String,
    pub alerts: DishAlerts,
    #[serde(deserialize_with = "wire::f64_lenient")]
    pub snr: f64,
    #[serde(deserialize_with = "wire::f64_lenient")]
    pub seconds_to_first_nonempty_slot: f64,
    #[serde(deserialize_with = "wire::f64_lenient")]
    pub pop_ping_drop_rate: f64,
    #[serde(deserialize_with = "wire::f64_lenient")]
    pub downlink_throughput_bps: f64,
    #[serde(deserialize_with = "wire::f64_lenient")]
    pub uplink_throughput_bps: f64,
    #[serde(deserialize_with = "wire::f64_lenient")]
    pub pop_ping_latency_ms: f64,
    pub obstruction_stats: ObstructionStats,
}

impl Default for DishStatus {
    fn default() -> Self {
        Self {
            device_info: DeviceInfo::default(),
            device_state: DeviceState::default(),
            // proto3 omits the zero enum value.
            state: "UNKNOWN".to_string(),
            alerts: DishAlerts::default(),
            snr: 0.0,
            seconds_to_first_nonempty_slot: 0.0,
            pop_ping_drop_rate: 0.0,
            downlink_throughput_bps: 0.0,
            uplink_throughput_bps: 0.0,
            pop_ping_latency_ms: 0.0,
            obstruction_stats: ObstructionStats::default(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    dish_get_status: Option<DishStatus>,
}

impl DishStatus {
    /// Parse a `{"dishGetStatus": {...}}` response.
    pub fn from_json(text: &str) -> Result<Self> {
        let response: StatusResponse = serde_json::from_str(text)?;
        response
            .dish_get_status
            .ok_or(Error::MissingResponse("dishGetStatus"))
    }

    pub fn id(&self) -> &str {
        &self.device_info.id
    }
}

/// Status flattened into field sets.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusData {
    pub general: FieldSet,
    pub obstruction: FieldSet,
    pub alerts: FieldSet,
}

pub fn status_data(status: &DishStatus) -> StatusData {
    let obs = &status.obstruction_stats;
    let general = FieldSet::new()
        .with("id", status.device_info.id.as_str())
        .with("hardware_version", status.device_info.hardware_version.as_str())
        .with("software_version", status.device_info.software_version.as_str())
        .with("state", status.state.as_str())
        .with("uptime", status.device_state.uptime_s)
        .with("snr", status.snr)
        .with(
            "seconds_to_first_nonempty_slot",
            status.seconds_to_first_nonempty_slot,
        )
        .with("pop_ping_drop_rate", status.pop_ping_drop_rate)
        .with("downlink_throughput_bps", status.downlink_throughput_bps)
        .with("uplink_throughput_bps", status.uplink_throughput_bps)
        .with("pop_ping_latency_ms", status.pop_ping_latency_ms)
        .with("alerts", status.alerts.bits())
        .with("fraction_obstructed", obs.fraction_obstructed)
        .with("currently_obstructed", obs.currently_obstructed)
        .with("seconds_obstructed", obs.last_24h_obstructed_s);

    // Pad or trim so the column count always matches the header.
    let wedges: Vec<FieldValue> = (0..WEDGE_COUNT)
        .map(|i| obs.wedge_abs_fraction_obstructed.get(i).copied().into())
        .collect();
    let obstruction = FieldSet::new().with("wedges_fraction_obstructed", FieldValue::Seq(wedges));

    let mut alerts = FieldSet::new();
    for (&name, on) in ALERT_FIELDS.iter().zip(status.alerts.flags()) {
        alerts.insert(name, on);
    }

    StatusData {
        general,
        obstruction,
        alerts,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
