// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Size planning: which fields share one read.
//!
//! Consecutive fixed-size fields are merged into a single `Fixed` group so a
//! decoder issues one read for the whole run. A runtime-sized field always
//! gets its own `Variable` group: its byte length is unknown until its length
//! expression has been evaluated against fields read before it.

use crate::schema::{InputStruct, StructField};
use std::ops::Range;

/// Size tag of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// Total bytes of the run, known at generation time.
    Fixed(usize),
    /// Single runtime-sized field.
    Variable,
}

/// Contiguous run of fields handled by one I/O call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeGroup {
    /// Index of the first field.
    pub start: usize,
    /// Number of fields.
    pub len: usize,
    pub kind: GroupKind,
}

impl SizeGroup {
    pub fn fields(&self) -> Range<usize> {
        self.start..self.start + self.len
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self.kind, GroupKind::Fixed(_))
    }

    /// Byte size for fixed groups.
    pub fn fixed_size(&self) -> Option<usize> {
        match self.kind {
            GroupKind::Fixed(n) => Some(n),
            GroupKind::Variable => None,
        }
    }
}

/// Ordered partition of a struct's fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Plan {
    groups: Vec<SizeGroup>,
}

impl Plan {
    pub fn for_struct(s: &InputStruct) -> Self {
        plan_fields(s.fields())
    }

    pub fn groups(&self) -> &[SizeGroup] {
        &self.groups
    }

    /// Sum of all fixed groups.
    pub fn fixed_size(&self) -> usize {
        self.groups.iter().filter_map(SizeGroup::fixed_size).sum()
    }

    /// Largest fixed group; sizes the initial decode buffer.
    pub fn max_fixed(&self) -> usize {
        self.groups
            .iter()
            .filter_map(SizeGroup::fixed_size)
            .max()
            .unwrap_or(0)
    }

    /// Group containing field `idx`.
    pub fn group_of(&self, idx: usize) -> Option<&SizeGroup> {
        self.groups.iter().find(|g| g.fields().contains(&idx))
    }
}

/// Partition `fields` into size groups.
pub fn plan_fields(fields: &[StructField]) -> Plan {
    let mut groups = Vec::new();
    let mut run_start = 0;
    let mut run_bytes = 0usize;

    for (idx, field) in fields.iter().enumerate() {
        match field.ty().size() {
            Some(size) => run_bytes = run_bytes.saturating_add(size),
            None => {
                if idx > run_start {
                    groups.push(SizeGroup {
                        start: run_start,
                        len: idx - run_start,
                        kind: GroupKind::Fixed(run_bytes),
                    });
                }
                groups.push(SizeGroup {
                    start: idx,
                    len: 1,
                    kind: GroupKind::Variable,
                });
                run_start = idx + 1;
                run_bytes = 0;
            }
        }
    }
    if fields.len() > run_start {
        groups.push(SizeGroup {
            start: run_start,
            len: fields.len() - run_start,
            kind: GroupKind::Fixed(run_bytes),
        });
    }

    log::trace!("planned {} fields into {} groups", fields.len(), groups.len());
    Plan { groups }
}
