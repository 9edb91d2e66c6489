//! Hardware capacity ceilings
//!
//! Derived collections that exceed a ceiling keep their first N entries
//! (in the order the generator produced them) and log a warning.

/// Contacts per receive group list
pub const MAX_GROUPLIST_CONTACTS: usize = 64;
/// Channels per zone
pub const MAX_ZONE_CHANNELS: usize = 250;
/// Channels per scan list
pub const MAX_SCANLIST_CHANNELS: usize = 250;
/// Zones per codeplug
pub const MAX_ZONES: usize = 250;
/// Roaming channels per roaming zone
pub const MAX_ROAMING_ZONE_CHANNELS: usize = 250;

/// Truncate `items` to `limit`, warning when anything is dropped.
///
/// Returns `true` if entries were dropped.
pub fn truncate_to_capacity<T>(items: &mut Vec<T>, limit: usize, what: &str, name: &str) -> bool {
    if items.len() <= limit {
        return false;
    }

    tracing::warn!(
        "{} '{}' has {} entries, truncating to hardware limit of {}",
        what,
        name,
        items.len(),
        limit
    );
    items.truncate(limit);
    true
}
