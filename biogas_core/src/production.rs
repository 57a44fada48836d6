//! Biogas production estimates for bag digesters.
//!
//! The model is a modified Gompertz curve whose maximum rate is derived from a
//! Monod term over the volatile-solids concentration, corrected for temperature
//! with a Q10 factor. Everything here is pure arithmetic so the same numbers can
//! be produced offline and compared against the backend's calculator.

use std::{f64::consts::E, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EstimateError {
    #[error("volatile solids must be a positive number of kg/day, got {0}")]
    InvalidVolatileSolids(f64),
    #[error("target fraction must be within (0, 1], got {0}")]
    InvalidTargetFraction(f64),
    #[error("hydraulic retention time must be positive, got {0} days")]
    InvalidRetentionTime(f64),
    #[error("temperature must be a finite number, got {0}")]
    InvalidTemperature(f64),
    #[error("unknown material type '{0}' (expected bovino, porcino or vegetal)")]
    UnknownMaterial(String),
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MaterialType {
    #[serde(rename = "bovino")]
    Bovine,
    #[serde(rename = "porcino")]
    Porcine,
    #[serde(rename = "vegetal")]
    Vegetable,
}

impl MaterialType {
    pub fn as_str(self) -> &'static str {
        match self {
            MaterialType::Bovine => "bovino",
            MaterialType::Porcine => "porcino",
            MaterialType::Vegetable => "vegetal",
        }
    }
}

impl fmt::Display for MaterialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaterialType {
    type Err = EstimateError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "bovino" | "bovine" => Ok(MaterialType::Bovine),
            "porcino" | "porcine" => Ok(MaterialType::Porcine),
            "vegetal" | "vegetable" => Ok(MaterialType::Vegetable),
            _ => Err(EstimateError::UnknownMaterial(raw.to_owned())),
        }
    }
}

/// Kinetic and yield parameters of the digester model.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct ModelParams {
    /// Maximum specific growth rate at `reference_temp_c`, 1/day.
    pub mu_max_ref: f64,
    pub reference_temp_c: f64,
    pub q10: f64,
    /// Half-saturation constant, kg VS/m³.
    pub half_saturation: f64,
    /// Hydrolysis constant, 1/day.
    pub hydrolysis: f64,
    /// m³ CH4 per kg of degraded VS.
    pub methane_yield: f64,
    pub methane_fraction: f64,
    pub lag_days: f64,
    pub retention_days: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            mu_max_ref: 0.35,
            reference_temp_c: 35.0,
            q10: 1.07,
            half_saturation: 2.0,
            hydrolysis: 0.1,
            methane_yield: 0.35,
            methane_fraction: 0.60,
            lag_days: 2.0,
            retention_days: 30.0,
        }
    }
}

impl ModelParams {
    pub fn for_material(material: MaterialType) -> Self {
        let (methane_yield, methane_fraction, lag_days, mu_max_ref) = match material {
            MaterialType::Bovine => (0.25, 0.60, 2.5, 0.25),
            MaterialType::Porcine => (0.28, 0.62, 2.0, 0.30),
            MaterialType::Vegetable => (0.20, 0.55, 3.0, 0.20),
        };

        Self {
            methane_yield,
            methane_fraction,
            lag_days,
            mu_max_ref,
            ..Self::default()
        }
    }

    /// Q10 temperature correction of the maximum growth rate.
    pub fn mu_max_at(&self, temperature_c: f64) -> f64 {
        self.mu_max_ref * self.q10.powf((temperature_c - self.reference_temp_c) / 10.0)
    }

    /// Biogas potential (m³) of `vs_kg_per_day` of volatile solids.
    pub fn biogas_potential(&self, vs_kg_per_day: f64) -> f64 {
        let methane_potential = self.methane_yield * vs_kg_per_day;
        if self.methane_fraction > 0.0 {
            methane_potential / self.methane_fraction
        } else {
            methane_potential
        }
    }
}

pub fn monod_rate(mu_max: f64, substrate: f64, half_saturation: f64) -> f64 {
    let denominator = half_saturation + substrate;
    if denominator > 0.0 {
        mu_max * substrate / denominator
    } else {
        0.0
    }
}

/// Cumulative production G(t) in m³.
pub fn gompertz_cumulative(t: f64, potential: f64, max_rate: f64, lag: f64) -> f64 {
    potential * (-((max_rate * E / potential) * (lag - t) + 1.0).exp()).exp()
}

/// Daily production G'(t) in m³/day.
pub fn gompertz_rate(t: f64, potential: f64, max_rate: f64, lag: f64) -> f64 {
    let slope = max_rate * E / potential;
    let inner = (slope * (lag - t) + 1.0).exp();
    potential * (-inner).exp() * inner * slope
}

#[derive(Clone, Debug, PartialEq)]
pub struct EstimateInput {
    pub material: Option<MaterialType>,
    pub vs_kg_per_day: f64,
    pub reactor_volume_m3: Option<f64>,
    pub temperature_c: f64,
    pub retention_days: Option<f64>,
    pub target_fraction: f64,
    pub max_days: u32,
}

impl EstimateInput {
    pub fn new(vs_kg_per_day: f64, temperature_c: f64) -> Self {
        Self {
            material: None,
            vs_kg_per_day,
            reactor_volume_m3: None,
            temperature_c,
            retention_days: None,
            target_fraction: 0.95,
            max_days: 120,
        }
    }

    pub fn with_material(mut self, material: MaterialType) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_reactor_volume(mut self, reactor_volume_m3: f64) -> Self {
        self.reactor_volume_m3 = Some(reactor_volume_m3);
        self
    }

    pub fn with_retention_days(mut self, retention_days: f64) -> Self {
        self.retention_days = Some(retention_days);
        self
    }

    pub fn params(&self) -> ModelParams {
        self.material
            .map(ModelParams::for_material)
            .unwrap_or_default()
    }

    fn validate(&self) -> Result<(), EstimateError> {
        if !self.vs_kg_per_day.is_finite() || self.vs_kg_per_day <= 0.0 {
            return Err(EstimateError::InvalidVolatileSolids(self.vs_kg_per_day));
        }
        if !self.temperature_c.is_finite() {
            return Err(EstimateError::InvalidTemperature(self.temperature_c));
        }
        if !(self.target_fraction > 0.0 && self.target_fraction <= 1.0) {
            return Err(EstimateError::InvalidTargetFraction(self.target_fraction));
        }
        if let Some(days) = self.retention_days
            && !(days.is_finite() && days > 0.0)
        {
            return Err(EstimateError::InvalidRetentionTime(days));
        }
        Ok(())
    }
}

/// Derived kinetic quantities shared by the series and horizon estimates.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Kinetics {
    params: ModelParams,
    retention_days: f64,
    reactor_volume_m3: f64,
    substrate: f64,
    mu_max: f64,
    mu_eff: f64,
    potential: f64,
    max_rate: f64,
}

impl Kinetics {
    fn derive(input: &EstimateInput) -> Result<Self, EstimateError> {
        input.validate()?;
        let params = input.params();
        let retention_days = input.retention_days.unwrap_or(params.retention_days);

        let reactor_volume_m3 = match input.reactor_volume_m3 {
            Some(volume) if volume > 0.0 => volume,
            _ => {
                let assumed = retention_days * input.vs_kg_per_day / 1000.0;
                if assumed > 0.0 { assumed } else { 1.0 }
            }
        };
        let substrate = input.vs_kg_per_day / reactor_volume_m3;

        let mu_max = params.mu_max_at(input.temperature_c);
        let mu_eff = monod_rate(mu_max, substrate, params.half_saturation);
        let potential = params.biogas_potential(input.vs_kg_per_day);

        Ok(Self {
            params,
            retention_days,
            reactor_volume_m3,
            substrate,
            mu_max,
            mu_eff,
            potential,
            max_rate: mu_eff * potential,
        })
    }

    fn cumulative(&self, t: f64) -> f64 {
        gompertz_cumulative(t, self.potential, self.max_rate, self.params.lag_days)
    }

    fn rate(&self, t: f64) -> f64 {
        gompertz_rate(t, self.potential, self.max_rate, self.params.lag_days)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProductionSeries {
    pub days: Vec<f64>,
    pub daily_biogas_m3: Vec<f64>,
    pub cumulative_biogas_m3: Vec<f64>,
    pub potential_biogas_m3: f64,
    pub params: ModelParams,
}

/// Day-by-day production until the target share of the potential is reached
/// or `max_days` is exceeded.
pub fn estimate_series(input: &EstimateInput) -> Result<ProductionSeries, EstimateError> {
    let kinetics = Kinetics::derive(input)?;
    let target = kinetics.potential * input.target_fraction;

    let mut series = ProductionSeries {
        days: Vec::new(),
        daily_biogas_m3: Vec::new(),
        cumulative_biogas_m3: Vec::new(),
        potential_biogas_m3: kinetics.potential,
        params: kinetics.params,
    };

    let mut cumulative = 0.0;
    let mut day = 0_u32;
    while day <= input.max_days && cumulative < target {
        let t = f64::from(day);
        cumulative = kinetics.cumulative(t).max(0.0);
        series.days.push(t);
        series.daily_biogas_m3.push(kinetics.rate(t).max(0.0));
        series.cumulative_biogas_m3.push(cumulative);
        day += 1;
    }

    Ok(series)
}

/// Unit costs used to price a day of operation. All default to zero.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OperatingCosts {
    pub vs_cost_per_kg: f64,
    pub water_cost_per_m3: f64,
    pub water_m3_per_day: f64,
    pub additives_cost_per_day: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProductionEstimate {
    pub reactor_volume_m3: f64,
    pub substrate_kg_per_m3: f64,
    pub mu_max_per_day: f64,
    pub mu_eff_per_day: f64,
    pub potential_biogas_m3: f64,
    pub cumulative_biogas_m3_at_retention: f64,
    pub biogas_m3_per_day: f64,
    pub methane_m3_per_day: f64,
    pub vs_degraded_kg_per_day: f64,
    pub vs_out_kg_per_day: f64,
    pub effluent_m3_per_day: f64,
    pub cost_vs_per_day: f64,
    pub cost_water_per_day: f64,
    pub cost_additives_per_day: f64,
    pub total_cost_per_day: f64,
    pub efficiency: Efficiency,
    pub params: ModelParams,
}

/// Production values at the end of one retention period.
pub fn estimate_at_horizon(
    input: &EstimateInput,
    costs: OperatingCosts,
) -> Result<ProductionEstimate, EstimateError> {
    let kinetics = Kinetics::derive(input)?;
    let params = kinetics.params;
    let horizon = kinetics.retention_days;

    let biogas_per_day = kinetics.rate(horizon);
    let methane_per_day = biogas_per_day * params.methane_fraction;
    let vs_degraded = if params.methane_yield > 0.0 {
        methane_per_day / params.methane_yield
    } else {
        0.0
    };

    let cost_vs = input.vs_kg_per_day * costs.vs_cost_per_kg;
    let cost_water = costs.water_m3_per_day * costs.water_cost_per_m3;

    Ok(ProductionEstimate {
        reactor_volume_m3: kinetics.reactor_volume_m3,
        substrate_kg_per_m3: kinetics.substrate,
        mu_max_per_day: kinetics.mu_max,
        mu_eff_per_day: kinetics.mu_eff,
        potential_biogas_m3: kinetics.potential,
        cumulative_biogas_m3_at_retention: kinetics.cumulative(horizon),
        biogas_m3_per_day: biogas_per_day,
        methane_m3_per_day: methane_per_day,
        vs_degraded_kg_per_day: vs_degraded,
        vs_out_kg_per_day: (input.vs_kg_per_day - vs_degraded).max(0.0),
        effluent_m3_per_day: kinetics.reactor_volume_m3 / horizon,
        cost_vs_per_day: cost_vs,
        cost_water_per_day: cost_water,
        cost_additives_per_day: costs.additives_cost_per_day,
        total_cost_per_day: cost_vs + cost_water + costs.additives_cost_per_day,
        efficiency: Efficiency::from_temperature(input.temperature_c),
        params,
    })
}

/// Qualitative digester efficiency for an operating temperature.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Efficiency {
    High,
    Medium,
    Low,
}

impl Efficiency {
    pub fn from_temperature(temperature_c: f64) -> Self {
        if (35.0..=40.0).contains(&temperature_c) {
            Efficiency::High
        } else if (30.0..35.0).contains(&temperature_c) {
            Efficiency::Medium
        } else {
            Efficiency::Low
        }
    }
}

impl fmt::Display for Efficiency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Efficiency::High => "high",
            Efficiency::Medium => "medium",
            Efficiency::Low => "low",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::E;

    use super::{
        Efficiency, ModelParams, gompertz_cumulative, gompertz_rate, monod_rate,
    };

    #[test]
    fn cumulative_at_lag_is_fixed_share_of_potential() {
        let value = gompertz_cumulative(2.5, 10.0, 3.0, 2.5);
        assert!((value - 10.0 * (-E).exp()).abs() < 1e-12);
    }

    #[test]
    fn rate_matches_numerical_derivative() {
        let (potential, max_rate, lag) = (41.0, 4.2, 2.5);
        for t in [0.0, 2.0, 5.0, 12.0, 30.0] {
            let h = 1e-5;
            let numeric = (gompertz_cumulative(t + h, potential, max_rate, lag)
                - gompertz_cumulative(t - h, potential, max_rate, lag))
                / (2.0 * h);
            let analytic = gompertz_rate(t, potential, max_rate, lag);
            assert!(
                (numeric - analytic).abs() < 1e-4,
                "t={t}: numeric {numeric} vs analytic {analytic}"
            );
        }
    }

    #[test]
    fn temperature_correction_is_identity_at_reference() {
        let params = ModelParams::default();
        assert!((params.mu_max_at(35.0) - 0.35).abs() < 1e-12);
        assert!(params.mu_max_at(45.0) > params.mu_max_at(35.0));
        assert!((params.mu_max_at(45.0) - 0.35 * 1.07).abs() < 1e-12);
    }

    #[test]
    fn monod_handles_degenerate_denominator() {
        assert_eq!(monod_rate(0.3, 0.0, 0.0), 0.0);
        assert!((monod_rate(0.3, 2.0, 2.0) - 0.15).abs() < 1e-12);
    }

    #[test]
    fn efficiency_bands() {
        assert_eq!(Efficiency::from_temperature(37.0), Efficiency::High);
        assert_eq!(Efficiency::from_temperature(40.0), Efficiency::High);
        assert_eq!(Efficiency::from_temperature(30.0), Efficiency::Medium);
        assert_eq!(Efficiency::from_temperature(34.9), Efficiency::Medium);
        assert_eq!(Efficiency::from_temperature(41.0), Efficiency::Low);
        assert_eq!(Efficiency::from_temperature(20.0), Efficiency::Low);
    }
}
