//! `adsim-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod metric;
pub mod timeframe;

pub use error::{DomainError, DomainResult};
pub use id::{CampaignId, OrganizationId, SimulationJobId, UserId};
pub use metric::{Channel, MetricKind, SubscriptionTier};
pub use timeframe::{Granularity, Timeframe};
