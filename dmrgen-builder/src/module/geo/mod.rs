//! Geographic engine: distance primitive, clustering, banding and sorting

pub mod banding;
pub mod cluster;
pub mod distance;
pub mod sort;

pub use banding::{BandAssignment, DistanceBand, assign_bands};
pub use cluster::{ClusterOptions, cluster_by_distance};
pub use distance::{EARTH_RADIUS_KM, centroid, haversine_km, maidenhead};
pub use sort::{MissingPlacement, sort_channels_by_distance, sort_zones_by_distance};
