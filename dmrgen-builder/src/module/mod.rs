//! Codeplug assembly building blocks
//!
//! ## Stages
//! - Producers: contacts, APRS, digital and analog channels
//! - Combinators: aggregator, filter chain
//! - Resolvers: zones, roaming, scan lists, receive group lists
//! - Geographic engine: distance, clustering, banding, sorting

// ============ Composition ============
pub mod generator;
pub mod geo;

// ============ Data Sources ============
pub mod datasource;

// ============ Producers ============
pub mod aprs;
pub mod channels;
pub mod contacts;

// ============ Resolvers ============
pub mod grouplists;
pub mod roaming;
pub mod scanlists;
pub mod zones;
