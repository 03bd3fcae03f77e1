//! Paths through the arguments of an API call.
//!
//! A [`Location`] names one segment of such a path: the entry point itself, or
//! a parameter, structure member, array element or extension-chain hop nested
//! below it. Validation code builds a chain of locations on the stack as it
//! descends into call arguments, each child borrowing its parent, and hands the
//! leaf to the reporting entry point when something is wrong. Rendering a leaf
//! walks the chain parent-first and produces text like
//! `vkCreateDevice(): pCreateInfo->pQueueCreateInfos[3]`.
//!
//! A chain only lives as long as the stack frames that built it. The one
//! sanctioned way to keep a path alive longer, for example to attach it to a
//! diagnostic that is processed after the call returns, is [`LocationCapture`],
//! which deep-copies the chain into owned storage.

use crate::{
    aliasable_box::AliasableBox,
    vocab::{Field, Func, Struct},
};
use std::{fmt, mem};

/// One segment of a path through an API call's arguments, borrowing the
/// segment it was derived from.
///
/// Roots are built with [`new`](Self::new) or
/// [`with_structure`](Self::with_structure); nested segments are derived from
/// an existing location with the `dot`/`element`/`pnext` methods, and borrow
/// their parent. The borrow makes a chain cheap to build and impossible to
/// outlive its stack frames.
#[derive(Clone, Copy, Debug)]
pub struct Location<'a> {
    /// The entry point this path starts at. Never `Empty` for a root.
    pub function: Func,
    /// The structure the current segment lives in, or `Empty` at top level.
    pub structure: Struct,
    /// The parameter or member the current segment names, or `Empty` for a
    /// root that points at the call itself.
    pub field: Field,
    /// The array element this segment denotes, or [`NO_INDEX`](Self::NO_INDEX).
    pub index: u32,
    /// Whether this segment was reached through an extension (`pNext`) chain
    /// rather than direct structure nesting.
    pub is_pnext: bool,
    prev: Option<&'a Location<'a>>,
    debug_region: Option<&'a str>,
}

impl Location<'static> {
    /// Returns a root location for a call to `function`.
    #[inline]
    pub const fn new(function: Func) -> Self {
        Location::with_structure(function, Struct::Empty)
    }

    /// Returns a root location for a call to `function`, with the structure
    /// tag already selected.
    #[inline]
    pub const fn with_structure(function: Func, structure: Struct) -> Self {
        Location {
            function,
            structure,
            field: Field::Empty,
            index: Location::NO_INDEX,
            is_pnext: false,
            prev: None,
            debug_region: None,
        }
    }
}

impl<'a> Location<'a> {
    /// Sentinel index of a segment that does not denote an array element.
    pub const NO_INDEX: u32 = u32::MAX;

    /// Returns the segment this one was derived from.
    #[inline]
    pub fn parent(&self) -> Option<&'a Location<'a>> {
        self.prev
    }

    /// Returns the debug region stamped onto this segment, if any.
    #[inline]
    pub fn debug_region(&self) -> Option<&'a str> {
        self.debug_region
    }

    /// Returns a copy of this location with a debug region name attached.
    ///
    /// The region is advisory annotation, not part of the path: it is stamped
    /// on at the moment a diagnostic is emitted, because the region may open
    /// and close between building a location and using it. The name is
    /// borrowed, so the caller keeps it alive until the diagnostic is
    /// rendered.
    #[inline]
    pub fn with_debug_region(&self, debug_region: &'a str) -> Location<'a> {
        Location {
            debug_region: Some(debug_region),
            ..*self
        }
    }

    fn derive(&self, structure: Struct, field: Field, index: u32, is_pnext: bool) -> Location<'_> {
        Location {
            function: self.function,
            structure,
            field,
            index,
            is_pnext,
            prev: Some(self),
            debug_region: None,
        }
    }

    /// Derives the segment for a member of the current structure.
    #[inline]
    pub fn dot(&self, field: Field) -> Location<'_> {
        self.derive(self.structure, field, Self::NO_INDEX, false)
    }

    /// Derives the segment for one element of an array member of the current
    /// structure.
    #[inline]
    pub fn dot_index(&self, field: Field, index: u32) -> Location<'_> {
        self.derive(self.structure, field, index, false)
    }

    /// Derives the segment for a member that is itself a structure of a new
    /// type.
    #[inline]
    pub fn dot_struct(&self, structure: Struct, field: Field) -> Location<'_> {
        self.derive(structure, field, Self::NO_INDEX, false)
    }

    /// Derives the segment for one element of an array member holding
    /// structures of a new type.
    #[inline]
    pub fn dot_struct_index(&self, structure: Struct, field: Field, index: u32) -> Location<'_> {
        self.derive(structure, field, index, false)
    }

    /// Derives the segment for one element of the array this location already
    /// selects.
    ///
    /// Re-deriving the element a location already denotes collapses to a
    /// single rendered segment instead of repeating it.
    #[inline]
    pub fn element(&self, index: u32) -> Location<'_> {
        self.derive(self.structure, self.field, index, false)
    }

    /// Derives the segment for a structure found in the current structure's
    /// extension chain.
    #[inline]
    pub fn pnext(&self, structure: Struct) -> Location<'_> {
        self.derive(structure, Field::Empty, Self::NO_INDEX, true)
    }

    /// Derives the segment for a member of a structure found in the current
    /// structure's extension chain.
    #[inline]
    pub fn pnext_field(&self, structure: Struct, field: Field) -> Location<'_> {
        self.derive(structure, field, Self::NO_INDEX, true)
    }

    fn fmt_fields(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(parent) = self.prev {
            // An array-element segment derived with `element` repeats its
            // parent's structure, field and index; rendering both would emit
            // the segment twice, so the parent is skipped in favor of the
            // grandparent.
            let rendered = match parent.prev {
                Some(grandparent)
                    if parent.structure == self.structure
                        && parent.field == self.field
                        && parent.index == self.index =>
                {
                    grandparent
                }
                _ => parent,
            };

            rendered.fmt_fields(f)?;

            if rendered.structure != Struct::Empty || rendered.field != Field::Empty {
                if rendered.index == Self::NO_INDEX && rendered.field.is_pointer() {
                    f.write_str("->")?;
                } else {
                    f.write_str(".")?;
                }
            }
        }

        if self.is_pnext && self.structure != Struct::Empty {
            write!(f, "pNext<{}>", self.structure)?;

            if self.field != Field::Empty {
                f.write_str(".")?;
            } else {
                // Historical formatting, doubled bracket included; message
                // consumers pattern-match on the exact text.
                f.write_str(">")?;
            }
        }

        if self.field != Field::Empty {
            write!(f, "{}", self.field)?;

            if self.index != Self::NO_INDEX {
                write!(f, "[{}]", self.index)?;
            }
        }

        Ok(())
    }

    /// Renders the dotted path below the function, without the function name.
    pub fn fields(&self) -> String {
        struct Fields<'l, 'a>(&'l Location<'a>);

        impl fmt::Display for Fields<'_, '_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt_fields(f)
            }
        }

        Fields(self).to_string()
    }

    /// Renders the full `[region] function(): path` message for this
    /// location. Equivalent to the `Display` output.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Location<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(region) = self.debug_region {
            if !region.is_empty() {
                write!(f, "[{}] ", region)?;
            }
        }

        let fields = self.fields();

        if fields.is_empty() {
            write!(f, "{}():", self.function)
        } else {
            write!(f, "{}(): {}", self.function, fields)
        }
    }
}

#[derive(Clone, Debug)]
struct CapturedNode {
    location: Location<'static>,
    debug_region: Option<Box<str>>,
}

/// An owned deep copy of a [`Location`] chain.
///
/// The copied nodes live parent-first in a single heap allocation, and each
/// node's parent reference points at the preceding slot of that same
/// allocation, never at the transient chain the capture was made from or at
/// any other capture's storage. The allocation's address is stable, so a
/// capture can be moved and sent across threads freely; cloning re-links the
/// copied nodes against the clone's own storage. Any debug region name is
/// copied into owned storage as well, since a capture by definition outlives
/// the frame that supplied the name.
#[derive(Debug)]
pub struct LocationCapture {
    chain: AliasableBox<[CapturedNode]>,
}

impl LocationCapture {
    /// Deep-copies the chain ending at `location`.
    pub fn new(location: &Location<'_>) -> Self {
        let mut depth = 0;
        let mut node = Some(location);

        while let Some(current) = node {
            depth += 1;
            node = current.parent();
        }

        let mut nodes = Vec::with_capacity(depth);
        Self::push_parent_first(location, &mut nodes);

        let mut chain = AliasableBox::from(nodes.into_boxed_slice());
        Self::relink(&mut chain);

        LocationCapture { chain }
    }

    fn push_parent_first(location: &Location<'_>, nodes: &mut Vec<CapturedNode>) {
        if let Some(parent) = location.parent() {
            Self::push_parent_first(parent, nodes);
        }

        nodes.push(CapturedNode {
            location: Location {
                function: location.function,
                structure: location.structure,
                field: location.field,
                index: location.index,
                is_pnext: location.is_pnext,
                prev: None,
                debug_region: None,
            },
            debug_region: location.debug_region().map(Box::from),
        });
    }

    /// Points every node's parent reference at the preceding slot of this
    /// chain's storage, and its debug-region reference at the owned copy
    /// stored alongside it.
    ///
    /// The `'static` lifetimes produced here are a lie. They never escape:
    /// [`get`](Self::get) re-binds them to the borrow of `self`.
    fn relink(chain: &mut [CapturedNode]) {
        for index in 0..chain.len() {
            let (head, tail) = chain.split_at_mut(index);
            let node = &mut tail[0];

            node.location.prev = head.last().map(|prev| {
                // SAFETY: The target lies inside this capture's own
                // heap-allocated storage, which outlives every borrow handed
                // out by `get` and does not move while the capture is alive.
                unsafe {
                    mem::transmute::<&Location<'_>, &'static Location<'static>>(&prev.location)
                }
            });

            node.location.debug_region = node.debug_region.as_deref().map(|region| {
                // SAFETY: Same as above; the owned string sits in the same
                // slot as the node referencing it and is dropped with it.
                unsafe { mem::transmute::<&str, &'static str>(region) }
            });
        }
    }

    /// Returns the captured leaf. Its parent chain is borrowed from `self`.
    #[inline]
    pub fn get(&self) -> &Location<'_> {
        // A capture always contains at least the node it was created from.
        let leaf = self.chain.len() - 1;

        &self.chain[leaf].location
    }
}

impl Clone for LocationCapture {
    fn clone(&self) -> Self {
        let nodes: Box<[CapturedNode]> = self.chain.iter().cloned().collect();

        let mut chain = AliasableBox::from(nodes);
        Self::relink(&mut chain);

        LocationCapture { chain }
    }
}

#[cfg(test)]
mod tests {
    use super::{Location, LocationCapture};
    use crate::vocab::{Field, Func, Struct};

    #[test]
    fn dotted_path() {
        let root = Location::new(Func::vkCreateImageView);
        let create_info = root.dot(Field::subresourceRange);
        let leaf = create_info.dot(Field::baseMipLevel);

        assert_eq!(leaf.fields(), "subresourceRange.baseMipLevel");
        assert_eq!(
            leaf.message(),
            "vkCreateImageView(): subresourceRange.baseMipLevel",
        );

        // An index on the leaf rides along without changing the connector.
        let indexed = create_info.dot_index(Field::baseMipLevel, 3);
        assert_eq!(indexed.fields(), "subresourceRange.baseMipLevel[3]");
    }

    #[test]
    fn pointer_parent_renders_arrow() {
        let root = Location::new(Func::vkCreateDevice);
        let create_info = root.dot(Field::pCreateInfo);
        let leaf = create_info.dot_index(Field::pQueueCreateInfos, 3);

        assert_eq!(leaf.fields(), "pCreateInfo->pQueueCreateInfos[3]");
    }

    #[test]
    fn indexed_parent_renders_dot() {
        // A pointer-typed segment that carries an index joins with '.'.
        let root = Location::new(Func::vkQueueSubmit);
        let submit = root.dot_index(Field::pSubmits, 2);
        let leaf = submit.dot(Field::pCommandBuffers);

        assert_eq!(leaf.fields(), "pSubmits[2].pCommandBuffers");
    }

    #[test]
    fn reindexing_an_element_collapses() {
        let root = Location::new(Func::vkBindBufferMemory2KHR);
        let bind_info = root.dot_index(Field::pBindInfos, 1);
        let element = bind_info.element(1);

        assert_eq!(element.fields(), "pBindInfos[1]");
    }

    #[test]
    fn pnext_with_field() {
        let root = Location::new(Func::vkCreateBuffer);
        let create_info = root.dot(Field::pCreateInfo);
        let leaf = create_info.pnext_field(Struct::VkExternalMemoryBufferCreateInfo, Field::flags);

        assert_eq!(
            leaf.fields(),
            "pCreateInfo->pNext<VkExternalMemoryBufferCreateInfo>.flags",
        );
    }

    #[test]
    fn pnext_without_field() {
        let root = Location::new(Func::vkCreateBuffer);
        let create_info = root.dot(Field::pCreateInfo);
        let leaf = create_info.pnext(Struct::VkExternalMemoryBufferCreateInfo);

        assert_eq!(
            leaf.fields(),
            "pCreateInfo->pNext<VkExternalMemoryBufferCreateInfo>>",
        );
    }

    #[test]
    fn empty_root_message_has_no_trailing_space() {
        let root = Location::new(Func::vkCmdDraw);

        assert_eq!(root.fields(), "");
        assert_eq!(root.message(), "vkCmdDraw():");
    }

    #[test]
    fn debug_region_prefix() {
        let root = Location::new(Func::vkCmdDraw);
        let stamped = root.with_debug_region("shadow pass");

        assert_eq!(stamped.message(), "[shadow pass] vkCmdDraw():");

        let root = Location::new(Func::vkCmdPipelineBarrier2);
        let leaf = root.dot(Field::pDependencyInfo);
        let stamped = leaf.with_debug_region("shadow pass");

        assert_eq!(
            stamped.message(),
            "[shadow pass] vkCmdPipelineBarrier2(): pDependencyInfo",
        );
    }

    fn deep_chain_message() -> (&'static str, LocationCapture) {
        let root = Location::new(Func::vkQueueSubmit2);
        let submit = root.dot_index(Field::pSubmits, 0);
        let info =
            submit.dot_struct_index(Struct::VkCommandBufferSubmitInfo, Field::pCommandBufferInfos, 4);
        let leaf = info.dot(Field::commandBuffer);

        (
            "vkQueueSubmit2(): pSubmits[0].pCommandBufferInfos[4].commandBuffer",
            LocationCapture::new(&leaf),
        )
    }

    #[test]
    fn capture_renders_identically() {
        let (expected, capture) = deep_chain_message();

        assert_eq!(capture.get().message(), expected);
    }

    #[test]
    fn capture_clone_relinks_into_own_storage() {
        let (expected, capture) = deep_chain_message();
        let clone = capture.clone();

        let addresses = |capture: &LocationCapture| {
            let mut out = Vec::new();
            let mut node = Some(capture.get());

            while let Some(current) = node {
                out.push(current as *const Location<'_> as usize);
                node = current.parent();
            }

            out
        };

        let original_addresses = addresses(&capture);
        let clone_addresses = addresses(&clone);

        // Both chains terminate at the same depth...
        assert_eq!(original_addresses.len(), 4);
        assert_eq!(clone_addresses.len(), 4);

        // ...and neither walks into the other's storage.
        for address in &clone_addresses {
            assert!(!original_addresses.contains(address));
        }

        assert_eq!(capture.get().message(), expected);
        assert_eq!(clone.get().message(), expected);
    }

    #[test]
    fn capture_survives_moves() {
        let (expected, capture) = deep_chain_message();

        let moved = vec![capture];
        let capture = moved.into_iter().next().unwrap();

        assert_eq!(capture.get().message(), expected);
    }

    #[test]
    fn capture_owns_debug_region() {
        let capture = {
            let region = String::from("gbuffer pass");
            let root = Location::new(Func::vkCmdDrawIndexed);
            let stamped = root.with_debug_region(&region);

            LocationCapture::new(&stamped)
        };

        assert_eq!(capture.get().message(), "[gbuffer pass] vkCmdDrawIndexed():");
    }

    #[test]
    fn capture_matches_original_at_arbitrary_depths() {
        use rand::{rngs::StdRng, Rng, SeedableRng};

        fn extend(
            rng: &mut StdRng,
            remaining: u32,
            location: &Location<'_>,
            check: &mut dyn FnMut(&Location<'_>),
        ) {
            if remaining == 0 {
                check(location);
                return;
            }

            const FIELDS: [Field; 4] = [
                Field::pCreateInfo,
                Field::pSubmits,
                Field::subresourceRange,
                Field::mipLevels,
            ];
            let field = FIELDS[rng.gen_range(0..FIELDS.len())];

            let next = if rng.gen_bool(0.5) {
                location.dot(field)
            } else {
                location.dot_index(field, rng.gen_range(0..16))
            };

            extend(rng, remaining - 1, &next, check);
        }

        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..32 {
            let depth = rng.gen_range(1..10);
            let root = Location::new(Func::vkQueueSubmit);

            extend(&mut rng, depth, &root, &mut |leaf| {
                let capture = LocationCapture::new(leaf);

                assert_eq!(capture.get().message(), leaf.message());
                assert_eq!(capture.clone().get().message(), leaf.message());
            });
        }
    }

    #[test]
    fn capture_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}

        assert_send_sync::<LocationCapture>();
    }
}
