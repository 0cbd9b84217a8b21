/*!
 * Parser for the ASUS custom_clientlist format
 *
 * Routers running asuswrt-merlin keep user-assigned device names in
 * /jffs/nvram/custom_clientlist, stored as a repetition of
 * `<Name>MacAddress>Int1>Int2` records terminated by `>>` (the angle
 * brackets are literal, not placeholders). The trailing integer fields are
 * undocumented and ignored here.
 */

use std::fs;
use std::path::Path;

use tracing::debug;

use super::{is_mac, IdentityMap};
use crate::error::{LanternError, Result};

const RECORD_DELIMITER: &str = ">>";
const FIELD_DELIMITER: char = '>';
const NAME_MARKER: char = '<';

/// MAC -> friendly-name mappings decoded from a custom_clientlist blob
#[derive(Debug, Clone)]
pub struct ClientList {
    names: IdentityMap,
}

impl ClientList {
    /// Parse a raw clientlist string into MAC -> name mappings.
    ///
    /// The whole blob is rejected on the first malformed record: the format
    /// offers no safe way to resynchronize past a bad one. Among duplicate
    /// MACs the last record wins.
    pub fn parse(raw: &str) -> Result<Self> {
        let records: Vec<&str> = raw.split(RECORD_DELIMITER).collect();
        if records.len() < 2 {
            return Err(LanternError::Format(
                "no record delimiter found, not custom_clientlist data".to_string(),
            ));
        }

        let mut names = IdentityMap::new();
        for record in records {
            if record.is_empty() {
                continue;
            }
            let fields: Vec<&str> = record.split(FIELD_DELIMITER).collect();
            if fields.len() < 2 {
                return Err(LanternError::Format(format!(
                    "invalid record in custom_clientlist data: {}",
                    record
                )));
            }
            let name = fields[0].strip_prefix(NAME_MARKER).ok_or_else(|| {
                LanternError::Validation(format!(
                    "invalid NAME field in record {} ({})",
                    record, fields[0]
                ))
            })?;
            if !is_mac(fields[1]) {
                return Err(LanternError::Validation(format!(
                    "invalid MAC field in record {} ({})",
                    record, fields[1]
                )));
            }
            names.insert(fields[1].to_string(), name.to_string());
        }

        debug!("parsed clientlist: {} entries", names.len());
        Ok(Self { names })
    }

    /// Read and parse a clientlist file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    /// MAC -> name mappings
    pub fn names(&self) -> &IdentityMap {
        &self.names
    }

    /// Consume the list, yielding the mapping
    pub fn into_names(self) -> IdentityMap {
        self.names
    }
}
