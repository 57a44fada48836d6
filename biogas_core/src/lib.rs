pub mod ids;
pub mod production;
pub mod time;
pub mod user;

pub use ids::{AlertId, ReportId, ResourceId, SensorId, UserId};
pub use production::{
    Efficiency, EstimateError, EstimateInput, MaterialType, ModelParams, OperatingCosts,
    ProductionEstimate, ProductionSeries, estimate_at_horizon, estimate_series,
};
pub use time::Timestamp;
pub use user::{Permission, Profile, Role, UserProfile};
