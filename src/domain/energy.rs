use serde::{Deserialize, Serialize};

use crate::domain::errors::InputError;

/// Tag for wind-fed storage, first in the default drain order.
pub const SOURCE_WIND: &str = "wind";

/// Tag for solar-fed storage.
pub const SOURCE_SOLAR: &str = "solar";

/// One hour of observed household energy data.
///
/// All figures are energy over the hour (kWh-equivalent). Field names follow
/// the source dataset columns (`P_wind`, `P_solar`, `house_consumption`) so
/// serialized records stay byte-compatible with existing consumers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    #[serde(rename = "P_wind")]
    pub p_wind: f64,
    #[serde(rename = "P_solar")]
    pub p_solar: f64,
    pub house_consumption: f64,
}

impl ObservationRecord {
    pub fn new(p_wind: f64, p_solar: f64, house_consumption: f64) -> Self {
        Self {
            p_wind,
            p_solar,
            house_consumption,
        }
    }

    /// Validating constructor for boundary inputs (dataset rows, API payloads).
    pub fn checked(
        p_wind: f64,
        p_solar: f64,
        house_consumption: f64,
    ) -> Result<Self, InputError> {
        for (field, value) in [
            ("P_wind", p_wind),
            ("P_solar", p_solar),
            ("house_consumption", house_consumption),
        ] {
            if !value.is_finite() {
                return Err(InputError::NonFinite { field, value });
            }
            if value < 0.0 {
                return Err(InputError::Negative { field, value });
            }
        }
        Ok(Self::new(p_wind, p_solar, house_consumption))
    }

    /// Generation split by source, in drain-priority naming.
    pub fn generation_pairs(&self) -> [(&'static str, f64); 2] {
        [(SOURCE_WIND, self.p_wind), (SOURCE_SOLAR, self.p_solar)]
    }

    pub fn total_generation(&self) -> f64 {
        self.p_wind + self.p_solar
    }

    /// Net change to stored energy this hour, before capacity clamping.
    pub fn net_delta(&self) -> f64 {
        self.total_generation() - self.house_consumption
    }
}

/// One projected hour, same shape as an observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    #[serde(rename = "P_wind")]
    pub p_wind: f64,
    #[serde(rename = "P_solar")]
    pub p_solar: f64,
    pub house_consumption: f64,
}

impl ForecastPoint {
    pub fn new(p_wind: f64, p_solar: f64, house_consumption: f64) -> Self {
        Self {
            p_wind,
            p_solar,
            house_consumption,
        }
    }

    pub fn total_generation(&self) -> f64 {
        self.p_wind + self.p_solar
    }

    pub fn net_delta(&self) -> f64 {
        self.total_generation() - self.house_consumption
    }

    pub fn is_finite(&self) -> bool {
        self.p_wind.is_finite() && self.p_solar.is_finite() && self.house_consumption.is_finite()
    }

    /// Reinterpret as an observation when a prediction is fed back into the
    /// conditioning window.
    pub fn as_observation(&self) -> ObservationRecord {
        ObservationRecord::new(self.p_wind, self.p_solar, self.house_consumption)
    }
}

impl From<ObservationRecord> for ForecastPoint {
    fn from(record: ObservationRecord) -> Self {
        Self::new(record.p_wind, record.p_solar, record.house_consumption)
    }
}
