use biogas_client::api::CalculatorRequest;
use biogas_core::{
    EstimateInput, MaterialType, OperatingCosts, estimate_at_horizon, estimate_series,
};
use clap::Args;

use crate::cli::common::ConnectionArgs;

#[derive(Debug, Args)]
pub(crate) struct EstimateCommand {
    /// bovino, porcino or vegetal. Generic parameters when omitted.
    #[arg(long)]
    material: Option<MaterialType>,

    /// Volatile solids fed per day, kg.
    #[arg(long)]
    vs: f64,

    /// Digester temperature, °C.
    #[arg(long, default_value_t = 35.0)]
    temperature: f64,

    /// Reactor volume, m³. Derived from the retention time when omitted.
    #[arg(long)]
    volume: Option<f64>,

    /// Hydraulic retention time, days.
    #[arg(long)]
    hrt: Option<f64>,

    /// Print the day-by-day production curve.
    #[arg(long)]
    series: bool,

    /// Ask the backend's calculator instead of computing locally.
    #[arg(long)]
    remote: bool,
}

impl EstimateCommand {
    pub(crate) async fn run(&self, conn: &ConnectionArgs) -> anyhow::Result<()> {
        if self.remote {
            return self.run_remote(conn).await;
        }

        let mut input = EstimateInput::new(self.vs, self.temperature);
        if let Some(material) = self.material {
            input = input.with_material(material);
        }
        if let Some(volume) = self.volume {
            input = input.with_reactor_volume(volume);
        }
        if let Some(hrt) = self.hrt {
            input = input.with_retention_days(hrt);
        }

        let estimate = estimate_at_horizon(&input, OperatingCosts::default())?;
        println!("Reactor volume:        {:.2} m³", estimate.reactor_volume_m3);
        println!("Biogas potential:      {:.2} m³", estimate.potential_biogas_m3);
        println!("Biogas at HRT:         {:.3} m³/day", estimate.biogas_m3_per_day);
        println!("Methane at HRT:        {:.3} m³/day", estimate.methane_m3_per_day);
        println!(
            "Cumulative at HRT:     {:.2} m³",
            estimate.cumulative_biogas_m3_at_retention
        );
        println!("VS degraded:           {:.3} kg/day", estimate.vs_degraded_kg_per_day);
        println!("Effluent:              {:.3} m³/day", estimate.effluent_m3_per_day);
        println!("Efficiency:            {}", estimate.efficiency);

        if self.series {
            let series = estimate_series(&input)?;
            print_series(
                &series.days,
                &series.daily_biogas_m3,
                &series.cumulative_biogas_m3,
            );
        }
        Ok(())
    }

    async fn run_remote(&self, conn: &ConnectionArgs) -> anyhow::Result<()> {
        let material = self
            .material
            .ok_or_else(|| anyhow::anyhow!("--material is required with --remote"))?;
        let client = conn.client()?;
        let response = client
            .estimate_remote(&CalculatorRequest {
                material_type: material,
                vs_per_day: self.vs,
                reactor_volume: self.volume,
                temperature: self.temperature,
                hrt: self.hrt,
                target_fraction: None,
            })
            .await?;

        println!("Biogas potential:      {:.2} m³", response.potential_m3);
        if self.series {
            print_series(
                &response.series.days,
                &response.series.daily_biogas_m3,
                &response.series.cumulative_biogas_m3,
            );
        } else if let Some(total) = response.series.cumulative_biogas_m3.last() {
            println!("Cumulative at target:  {total:.2} m³");
        }
        Ok(())
    }
}

fn print_series(days: &[f64], daily: &[f64], cumulative: &[f64]) {
    println!("{:>5}  {:>10}  {:>12}", "day", "m³/day", "cumulative");
    for ((day, rate), total) in days.iter().zip(daily).zip(cumulative) {
        println!("{day:>5.0}  {rate:>10.3}  {total:>12.2}");
    }
}
