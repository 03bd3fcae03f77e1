//! Stable diagnostic identifiers and the hand-authored tables that select
//! them.
//!
//! A validation rule is named by a VUID, a stable string such as
//! `VUID-VkImageCreateInfo-extent-00944`. Call sites do not hard-code these:
//! they describe where they are with a [`Location`] chain and ask a lookup
//! table for the identifier. Tables are authored as slices of
//! ([`VuidKey`], id) rows, where a key may leave components unset to act as
//! wildcards, so one row can cover every call path that reaches the same
//! rule.
//!
//! Coverage is expected to lag behind the full cross-product of call sites,
//! so a failed lookup is an authoring gap, not an error: callers fall back to
//! [`VUID_UNDEFINED`] and the diagnostic still goes out.

use crate::{
    location::Location,
    vocab::{Field, Func, Struct},
};
use foldhash::HashMap;
use std::hash::{BuildHasher, Hash};

/// Placeholder identifier reported when no table row covers a location.
pub const VUID_UNDEFINED: &str = "VUID_Undefined";

/// One row of a diagnostic-id table.
pub type VuidEntry = (VuidKey, &'static str);

/// A fuzzy query key for diagnostic-id tables.
///
/// `Empty` components are wildcards: an empty `function` or `structure`
/// matches any location, and an empty `field` matches whatever field the
/// location carries. A named `field` normally has to equal the location's own
/// field; with `recurse_field` set it may instead equal the field of any
/// ancestor, which lets one row cover a rule that fires somewhere inside a
/// larger structure.
///
/// The ordering is lexicographic over (function, structure, field,
/// recurse_field) so keys can also serve as sorted-container keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VuidKey {
    pub function: Func,
    pub structure: Struct,
    pub field: Field,
    pub recurse_field: bool,
}

impl VuidKey {
    /// Returns whether this key covers `location`.
    ///
    /// The location's function is alias-resolved first, since tables are
    /// authored under the extension spelling a rule originally shipped with.
    pub fn matches(&self, location: &Location<'_>) -> bool {
        if self.function != Func::Empty && self.function != location.function.resolve_alias() {
            return false;
        }

        if self.structure != Struct::Empty && self.structure != location.structure {
            return false;
        }

        if self.field == Field::Empty || self.field == location.field {
            return true;
        }

        if self.recurse_field {
            let mut ancestor = location.parent();

            while let Some(node) = ancestor {
                if node.field == self.field {
                    return true;
                }

                ancestor = node.parent();
            }
        }

        false
    }
}

impl From<Func> for VuidKey {
    #[inline]
    fn from(function: Func) -> Self {
        VuidKey {
            function,
            ..Default::default()
        }
    }
}

impl From<Struct> for VuidKey {
    #[inline]
    fn from(structure: Struct) -> Self {
        VuidKey {
            structure,
            ..Default::default()
        }
    }
}

impl From<Field> for VuidKey {
    #[inline]
    fn from(field: Field) -> Self {
        VuidKey {
            field,
            ..Default::default()
        }
    }
}

/// Scans `table` for the row covering `location`.
///
/// Tables are hand-authored and must be unambiguous; a debug assertion fires
/// if more than one row matches.
pub fn find_vuid(table: &[VuidEntry], location: &Location<'_>) -> Option<&'static str> {
    let mut rows = table.iter().filter(|(key, _)| key.matches(location));
    let found = rows.next();

    debug_assert!(
        rows.next().is_none(),
        "more than one diagnostic id matches {}",
        location,
    );

    found.map(|(_, vuid)| *vuid)
}

/// Looks up the nested table stored under `outer`, then scans it for the row
/// covering `location`. A missing outer key is an ordinary not-found.
pub fn find_vuid_keyed<K>(
    tables: &HashMap<K, &'static [VuidEntry]>,
    outer: &K,
    location: &Location<'_>,
) -> Option<&'static str>
where
    K: Eq + Hash,
{
    tables
        .get(outer)
        .and_then(|table| find_vuid(table, location))
}

/// Like [`find_vuid`], falling back to [`VUID_UNDEFINED`] when no row
/// matches. The fallback fires a debug assertion to surface the authoring
/// gap, but release builds carry on with the placeholder.
pub fn vuid_or_undefined(table: &[VuidEntry], location: &Location<'_>) -> &'static str {
    match find_vuid(table, location) {
        Some(vuid) => vuid,
        None => {
            debug_assert!(false, "no diagnostic id authored for {}", location);

            VUID_UNDEFINED
        }
    }
}

/// Hashes an identifier string to the 32-bit code used for duplicate
/// tracking, hash filtering and the legacy callback's message code.
///
/// The seed is fixed, so the value is stable across runs of the same build
/// and can be quoted in filter configuration.
#[inline]
pub fn vuid_hash(vuid: &str) -> u32 {
    foldhash::fast::FixedState::default().hash_one(vuid) as u32
}
