//! Parsed representation of the per-group block policy table.
//!
//! The backing resource is a git-config style text file where every group
//! gets its own subsection under the `block` section:
//!
//! ```text
//! [block "sockpuppets"]
//!     blocks = true
//! [block "trusted"]
//!     blocks = false
//! ```

use std::collections::BTreeMap;

pub mod parser;

pub use parser::ParseError;

/// Top level section name holding the per-group subsections.
pub const BLOCK_SECTION: &str = "block";

/// Category of block rule a row represents.
///
/// A closed set for now, kept iterable through [`PolicyType::ALL`] so that
/// new categories only need a new variant and a new key.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum PolicyType {
    Blocks,
}

impl PolicyType {
    pub const ALL: &'static [PolicyType] = &[PolicyType::Blocks];

    /// Key used for this policy inside a group subsection.
    pub fn as_key(self) -> &'static str {
        match self {
            Self::Blocks => "blocks",
        }
    }

    pub fn from_key(input: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|policy| policy.as_key().eq_ignore_ascii_case(input))
    }
}

impl std::fmt::Display for PolicyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_key())
    }
}

/// One configured row: membership in the group carrying it decides the
/// block state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockRule {
    pub policy: PolicyType,
    pub blocked: bool,
}

/// Immutable snapshot of the configured rows, keyed by policy and group
/// name.
///
/// Group names are the raw subsection identifiers, case sensitive and never
/// normalized. Rows for one policy iterate sorted by group name, which is
/// the order first-match resolution runs in. When the same group appears
/// twice under one policy the last row wins.
#[derive(Debug, Default)]
pub struct BlockTable {
    rules: BTreeMap<PolicyType, BTreeMap<String, BlockRule>>,
}

impl BlockTable {
    /// Parse a configuration resource into a table.
    ///
    /// A value that is not a `true` or `false` literal (case insensitive,
    /// surrounding whitespace ignored) does not produce a row: it is
    /// reported and treated as absent, so that a typo cannot shadow a later
    /// group in resolution order. A resource without any `block` section
    /// yields an empty table, which is a valid state.
    pub fn from_text(input: &str) -> Result<Self, ParseError> {
        let mut rules: BTreeMap<PolicyType, BTreeMap<String, BlockRule>> = BTreeMap::new();
        for section in parser::parse_document(input)? {
            if section.name != BLOCK_SECTION {
                continue;
            }
            let Some(group) = section.subsection else {
                tracing::warn!("ignoring {BLOCK_SECTION} section without a group name");
                continue;
            };
            for (key, value) in section.entries {
                let Some(policy) = PolicyType::from_key(&key) else {
                    continue;
                };
                let Some(value) = value else {
                    tracing::warn!("ignoring {policy} entry without value for group {group:?}");
                    continue;
                };
                match parse_bool(&value) {
                    Some(blocked) => {
                        rules
                            .entry(policy)
                            .or_default()
                            .insert(group.clone(), BlockRule { policy, blocked });
                    }
                    None => tracing::warn!(
                        "ignoring non-boolean {policy} value {value:?} for group {group:?}"
                    ),
                }
            }
        }
        Ok(Self { rules })
    }

    /// All configured rows for a policy, sorted by group name, or `None`
    /// when the policy has no rows.
    pub fn rules(&self, policy: PolicyType) -> Option<&BTreeMap<String, BlockRule>> {
        self.rules.get(&policy).filter(|rows| !rows.is_empty())
    }

    /// Single row lookup for one group.
    pub fn rule(&self, policy: PolicyType, group: &str) -> Option<BlockRule> {
        self.rules
            .get(&policy)
            .and_then(|rows| rows.get(group))
            .copied()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.values().all(BTreeMap::is_empty)
    }
}

fn parse_bool(input: &str) -> Option<bool> {
    let value = input.trim();
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
