//! territory-planner core
//!
//! Territory classification, ZIP aggregation and rebalancing of pool
//! accounts across technician routes.

pub mod traits;
pub mod model;
pub mod boundary;
pub mod territory;
pub mod zip;
pub mod haversine;
pub mod centroid;
pub mod worker;
pub mod balancer;
pub mod reroute;
pub mod roster;
pub mod geocode;
pub mod snapshot;
