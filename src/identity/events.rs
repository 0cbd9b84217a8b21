/*!
 * Identity extraction from router notification-event messages
 *
 * The router's notification center keeps event rows whose payload is a JSON
 * object; some event kinds carry `cname`, `macaddr` and `ip` fields
 * describing a client device. The caller supplies the rows oldest to newest,
 * so plainly overwriting on each hit always leaves the most recent value for
 * a MAC.
 *
 * Rows that are not JSON, or that lack the interesting fields, are normal
 * noise in this store and are skipped rather than treated as failures.
 */

use serde::Deserialize;
use tracing::debug;

use super::{is_mac, IdentityMap};

/// Event payload fields relevant to identity extraction. Everything is
/// optional: most event kinds carry none of them.
#[derive(Debug, Default, Deserialize)]
struct EventRecord {
    #[serde(default)]
    cname: Option<String>,
    #[serde(default)]
    macaddr: Option<String>,
    #[serde(default)]
    ip: Option<String>,
}

/// MAC -> name and MAC -> IP mappings accumulated from an event sequence
#[derive(Debug, Default, Clone)]
pub struct EventIdentities {
    names: IdentityMap,
    ips: IdentityMap,
    skipped: usize,
}

impl EventIdentities {
    /// Extract identity mappings from ordered event messages, oldest first.
    /// The ordering is the caller's guarantee; nothing is sorted here.
    pub fn from_messages<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = Self::default();
        for message in messages {
            match serde_json::from_str::<EventRecord>(message.as_ref()) {
                Ok(record) => out.absorb(&record),
                Err(_) => out.skipped += 1,
            }
        }
        if out.skipped > 0 {
            debug!("dropped {} unparseable event rows", out.skipped);
        }
        out
    }

    /// Take whatever identity facts a single event carries. The name and IP
    /// paths are independent: a row missing one still contributes the other.
    fn absorb(&mut self, record: &EventRecord) {
        let mac = match record.macaddr.as_deref() {
            Some(mac) if is_mac(mac) => mac,
            _ => return,
        };
        if let Some(cname) = record.cname.as_deref() {
            if !cname.is_empty() {
                self.names.insert(mac.to_string(), cname.to_string());
            }
        }
        if let Some(ip) = record.ip.as_deref() {
            if !ip.is_empty() {
                if let Some(repaired) = repair_ip(ip) {
                    self.ips.insert(mac.to_string(), repaired);
                }
            }
        }
    }

    /// MAC -> most recent known name
    pub fn names(&self) -> &IdentityMap {
        &self.names
    }

    /// MAC -> most recent known IP address
    pub fn ips(&self) -> &IdentityMap {
        &self.ips
    }

    /// Number of rows dropped as unparseable
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

/// Repair the known octet-corruption pattern: a stray digit from an adjacent
/// wider field can bleed into an octet, pushing it past 255. Truncating the
/// octet text to its first two characters restores the real value. An octet
/// that is not numeric at all disqualifies the address.
fn repair_ip(raw: &str) -> Option<String> {
    let mut octets: Vec<&str> = Vec::new();
    for octet in raw.split('.') {
        let value: u32 = octet.parse().ok()?;
        if value > 255 {
            octets.push(&octet[..2]);
        } else {
            octets.push(octet);
        }
    }
    Some(octets.join("."))
}
