// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Struct selection policy.

use std::collections::BTreeSet;

/// Which structs of a schema get compiled.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// Every struct in the schema.
    #[default]
    All,
    /// Only the named structs. Names absent from the schema are reported.
    Only(BTreeSet<String>),
}

impl Selection {
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(names.into_iter().map(Into::into).collect())
    }

    /// Build from a comma-separated list; `all` (or an empty list) selects everything.
    pub fn from_list(list: &str) -> Self {
        let names: BTreeSet<String> = list
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from)
            .collect();
        if names.is_empty() || names.contains("all") {
            Self::All
        } else {
            Self::Only(names)
        }
    }

    pub fn accepts(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(names) => names.contains(name),
        }
    }

    /// Requested names not present in `available`, sorted.
    pub fn missing<'a, I>(&self, available: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        match self {
            Self::All => Vec::new(),
            Self::Only(names) => {
                let found: BTreeSet<&str> = available.into_iter().collect();
                names
                    .iter()
                    .filter(|n| !found.contains(n.as_str()))
                    .cloned()
                    .collect()
            }
        }
    }
}
