//! Carbon cost attached to cached responses.

// Author: kelexine (https://github.com/kelexine)

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// Estimated cost of producing one response.
///
/// Stored alongside each cache entry so that a later hit can report the
/// emissions it avoided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CarbonCost {
    /// CO2-equivalent mass in kilograms.
    #[serde(default)]
    pub emissions_kg: f64,
    /// Energy consumed in kilowatt-hours.
    #[serde(default)]
    pub energy_kwh: f64,
}

impl CarbonCost {
    pub const ZERO: CarbonCost = CarbonCost {
        emissions_kg: 0.0,
        energy_kwh: 0.0,
    };

    pub fn new(emissions_kg: f64, energy_kwh: f64) -> Self {
        Self {
            emissions_kg,
            energy_kwh,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.emissions_kg == 0.0 && self.energy_kwh == 0.0
    }
}

impl Add for CarbonCost {
    type Output = CarbonCost;

    fn add(self, rhs: CarbonCost) -> CarbonCost {
        CarbonCost {
            emissions_kg: self.emissions_kg + rhs.emissions_kg,
            energy_kwh: self.energy_kwh + rhs.energy_kwh,
        }
    }
}

impl AddAssign for CarbonCost {
    fn add_assign(&mut self, rhs: CarbonCost) {
        *self = *self + rhs;
    }
}
