/*!
 * Multi-source identity reconciliation
 */

use super::IdentityMap;

/// Merge identity mappings under strict source precedence.
///
/// Sources are given highest priority first. A key present in any
/// higher-priority source is never overwritten by a lower-priority one; a
/// key absent from all higher-priority sources takes its value from the
/// first lower-priority source that defines it. Pure and deterministic.
pub fn reconcile(sources: &[&IdentityMap]) -> IdentityMap {
    let mut merged = IdentityMap::new();
    for source in sources {
        for (mac, value) in source.iter() {
            merged.entry(mac.clone()).or_insert_with(|| value.clone());
        }
    }
    merged
}
