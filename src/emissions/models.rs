//! Emissions log records and the report shapes built from them.

// Author: kelexine (https://github.com/kelexine)

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// One row of an emissions log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionsRecord {
    /// When the measured call finished; `None` if the log value did not parse.
    pub timestamp: Option<NaiveDateTime>,
    pub emissions_kg: f64,
    pub energy_kwh: f64,
    /// File name the row was read from.
    pub source_file: String,
}

/// Aggregate statistics over every logged call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionsSummary {
    pub total_emissions_kg: f64,
    pub total_energy_kwh: f64,
    pub call_count: usize,
    pub average_emissions_per_call_kg: f64,
    /// `%Y-%m-%d %H:%M:%S` of the newest record, `"No Data"` or `"Unknown"`.
    pub last_updated: String,
}

/// One point of the emissions and energy charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    /// `None` when the log value did not parse.
    pub timestamp: Option<NaiveDateTime>,
    pub emissions_kg: f64,
    pub energy_kwh: f64,
}

impl EmissionsSummary {
    pub fn empty() -> Self {
        Self {
            total_emissions_kg: 0.0,
            total_energy_kwh: 0.0,
            call_count: 0,
            average_emissions_per_call_kg: 0.0,
            last_updated: "No Data".to_string(),
        }
    }

    /// Dashboard text: totals, some everyday context, and suggestions.
    pub fn render_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "## Carbon Emissions Dashboard\n");
        let _ = writeln!(out, "**Last Updated:** {}\n", self.last_updated);
        let _ = writeln!(out, "### Emissions Summary");
        let _ = writeln!(out, "- **Total CO2 Emissions:** {:.8} kg CO2eq", self.total_emissions_kg);
        let _ = writeln!(out, "- **Total Energy Consumed:** {:.8} kWh", self.total_energy_kwh);
        let _ = writeln!(out, "- **Number of API Calls:** {}", self.call_count);
        let _ = writeln!(
            out,
            "- **Average Emissions per Call:** {:.8} kg CO2eq\n",
            self.average_emissions_per_call_kg
        );
        let _ = writeln!(out, "### Environmental Impact Context");
        let _ = writeln!(out, "To put these numbers in perspective:");
        let _ = writeln!(out, "- The average car emits about 0.2 kg CO2eq per kilometer");
        let _ = writeln!(out, "- A tree absorbs about 22 kg of CO2 per year\n");
        let _ = writeln!(out, "### Improvement Suggestions");
        let _ = writeln!(out, "- Keep using the cache system to avoid regenerating responses");
        let _ = writeln!(out, "- Consider batching multiple queries together when possible");
        let _ = writeln!(out, "- Run the model on more energy-efficient hardware when available");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_markdown() {
        let summary = EmissionsSummary {
            total_emissions_kg: 0.004,
            total_energy_kwh: 0.02,
            call_count: 2,
            average_emissions_per_call_kg: 0.002,
            last_updated: "2024-05-01 12:00:00".to_string(),
        };
        let text = summary.render_markdown();
        assert!(text.contains("**Total CO2 Emissions:** 0.00400000 kg CO2eq"));
        assert!(text.contains("**Number of API Calls:** 2"));
        assert!(text.contains("**Last Updated:** 2024-05-01 12:00:00"));
    }
}
