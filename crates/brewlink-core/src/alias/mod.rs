//! Bidirectional alias tables for commands and properties.
//!
//! A device map names its commands and properties with human-facing aliases
//! (`"espresso"`, `"water_temp"`) that differ from the raw protocol keys the
//! appliance understands.  [`AliasResolver`] translates between the two.
//!
//! # Lookup rules
//!
//! The two directions deliberately behave differently:
//!
//! - **Commands** are matched case-insensitively after trimming surrounding
//!   whitespace, so `" Latte "`, `"latte"` and `"LATTE"` are the same alias.
//!   An unknown command alias resolves to `None`.
//! - **Properties** are matched exactly.  An unknown property alias resolves
//!   to *itself*, because many protocols use the same name at both layers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Raw command entry from a device map.
///
/// The device map spells the field `command`; `raw` is accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    /// Hex string of the command bytes, without the timestamp suffix.
    #[serde(rename = "command", alias = "raw")]
    pub raw: String,
}

impl CommandDescriptor {
    /// Creates a descriptor from a hex command string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }
}

/// Immutable alias tables for one device model.
///
/// Built once from a device map and then shared read-only; every method takes
/// `&self` and has no side effects beyond debug logging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasResolver {
    commands: BTreeMap<String, CommandDescriptor>,
    properties: BTreeMap<String, String>,
}

impl AliasResolver {
    /// Builds the resolver from command and property entries.
    ///
    /// Command aliases are stored in their normalised form (trimmed,
    /// lower-case).  If two entries normalise to the same alias the later one
    /// wins and a warning is logged.  Property aliases are stored verbatim.
    pub fn new<C, P>(commands: C, properties: P) -> Self
    where
        C: IntoIterator<Item = (String, CommandDescriptor)>,
        P: IntoIterator<Item = (String, String)>,
    {
        let mut command_table = BTreeMap::new();
        for (alias, descriptor) in commands {
            let key = normalize_command_alias(&alias);
            if command_table.insert(key.clone(), descriptor).is_some() {
                warn!("command alias '{alias}' collides with an earlier entry for '{key}'");
            }
        }

        Self {
            commands: command_table,
            properties: properties.into_iter().collect(),
        }
    }

    /// Looks up a command alias.
    ///
    /// Returns `None` when the alias is not in the command map; there is no
    /// fallback guess.
    pub fn resolve_command(&self, alias: &str) -> Option<&CommandDescriptor> {
        self.commands.get(&normalize_command_alias(alias))
    }

    /// Maps a property alias to its raw protocol key.
    ///
    /// Unknown aliases are returned unchanged.
    pub fn resolve_property<'a>(&'a self, alias: &'a str) -> &'a str {
        match self.properties.get(alias) {
            Some(raw) => raw.as_str(),
            None => {
                debug!("property alias '{alias}' not mapped; using it as the raw key");
                alias
            }
        }
    }

    /// Reverse lookup: returns the first alias mapped to `raw_key`, if any.
    pub fn property_alias_for(&self, raw_key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(_, raw)| raw.as_str() == raw_key)
            .map(|(alias, _)| alias.as_str())
    }

    /// All command aliases in their normalised form, sorted.
    pub fn list_command_aliases(&self) -> Vec<&str> {
        self.commands.keys().map(String::as_str).collect()
    }

    /// All property aliases, sorted.
    pub fn list_property_aliases(&self) -> Vec<&str> {
        self.properties.keys().map(String::as_str).collect()
    }

    /// The normalised command table, as handed to transports that accept it.
    pub fn command_map(&self) -> &BTreeMap<String, CommandDescriptor> {
        &self.commands
    }

    /// The property table, as handed to transports that accept it.
    pub fn property_map(&self) -> &BTreeMap<String, String> {
        &self.properties
    }
}

fn normalize_command_alias(alias: &str) -> String {
    alias.trim().to_lowercase()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
