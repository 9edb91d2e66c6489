//! Shared codeplug entity model
//!
//! Typed records for every entity kind that ends up on the radio, the
//! per-kind identifier allocator and the hardware capacity ceilings.

pub mod capacity;
pub mod sequence;
pub mod types;

pub use capacity::truncate_to_capacity;
pub use sequence::Sequence;
pub use types::*;
