/*!
 * Lantern - router device identity and bandwidth history decoding
 *
 * A synchronous decode core for ASUS/Tomato-class routers:
 * - custom_clientlist parsing (MAC -> friendly name)
 * - notification-event identity extraction (MAC -> name, MAC -> IP),
 *   tolerant of corrupt rows and a known IP-octet corruption
 * - deterministic multi-source identity reconciliation
 * - gzip-compressed RStats bandwidth history decoding (daily and monthly
 *   counters with packed dates)
 *
 * Every decode is a one-shot transform over a bounded input; results are
 * immutable snapshots safe to share by reference. Querying event stores,
 * reading traffic tables and writing to time-series storage all belong to
 * the caller.
 */

pub mod error;
pub mod identity;
pub mod rstats;

// Re-export commonly used types
pub use error::{LanternError, Result};
pub use identity::{reconcile, ClientList, EventIdentities, IdentityMap};
pub use rstats::{BandwidthHistory, FormatVersion, Sample, NO_DATA_RANGE};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
