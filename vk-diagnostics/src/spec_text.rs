//! Specification excerpts attached to stable identifiers.
//!
//! When a reported identifier names a rule from the Vulkan specification,
//! the rendered message is enriched with the rule's normative text and a link
//! into the published document. The table below is an excerpt of data
//! generated offline from the specification sources; lookups scan it linearly
//! and the first matching row wins, which is the documented tie-break for
//! identifiers that are intentionally listed more than once.

/// Substring marking an identifier as a stable specification identifier.
///
/// Identifiers without it, such as [`VUID_UNDEFINED`](crate::VUID_UNDEFINED)
/// or layer-internal `UNASSIGNED-` codes, are never enriched.
pub const VUID_MARKER: &str = "VUID-";

/// Base of constructed specification links. Overridable at build time so
/// SDK packaging can point at a matching spec snapshot.
pub const SPEC_URL_BASE: &str = match option_env!("VK_DIAGNOSTICS_SPEC_URL_BASE") {
    Some(base) => base,
    None => "https://registry.khronos.org/vulkan/specs/",
};

/// One row of the generated identifier table.
#[derive(Clone, Copy, Debug)]
pub struct SpecTextEntry {
    /// The stable identifier the row describes.
    pub vuid: &'static str,
    /// The normative text of the rule.
    pub text: &'static str,
    /// Document path under [`SPEC_URL_BASE`] where the identifier's anchor
    /// lives.
    pub url_fragment: &'static str,
}

impl SpecTextEntry {
    /// Returns the full link to this rule's anchor in the published
    /// specification.
    pub fn url(&self) -> String {
        format!("{}{}#{}", SPEC_URL_BASE, self.url_fragment, self.vuid)
    }
}

const CORE_SPEC: &str = "latest/html/vkspec.html";
const EXT_SPEC: &str = "1.3-extensions/html/vkspec.html";

static SPEC_TEXT: &[SpecTextEntry] = &[
    SpecTextEntry {
        vuid: "VUID-VkImageCreateInfo-extent-00944",
        text: "extent.width must be greater than 0",
        url_fragment: CORE_SPEC,
    },
    SpecTextEntry {
        vuid: "VUID-VkImageCreateInfo-extent-00945",
        text: "extent.height must be greater than 0",
        url_fragment: CORE_SPEC,
    },
    SpecTextEntry {
        vuid: "VUID-VkImageCreateInfo-mipLevels-00947",
        text: "mipLevels must be greater than 0",
        url_fragment: CORE_SPEC,
    },
    SpecTextEntry {
        vuid: "VUID-VkBufferCreateInfo-size-00912",
        text: "size must be greater than 0",
        url_fragment: CORE_SPEC,
    },
    SpecTextEntry {
        vuid: "VUID-vkCmdDraw-None-02700",
        text: "A valid pipeline must be bound to the pipeline bind point used by this command",
        url_fragment: CORE_SPEC,
    },
    SpecTextEntry {
        vuid: "VUID-vkQueueSubmit-fence-00063",
        text: "If fence is not VK_NULL_HANDLE, fence must be unsignaled",
        url_fragment: CORE_SPEC,
    },
    SpecTextEntry {
        vuid: "VUID-vkBeginCommandBuffer-commandBuffer-00049",
        text: "commandBuffer must not be in the recording or pending state",
        url_fragment: CORE_SPEC,
    },
    SpecTextEntry {
        vuid: "VUID-vkBindBufferMemory-memoryOffset-01031",
        text: "memoryOffset must be less than the size of memory",
        url_fragment: CORE_SPEC,
    },
    SpecTextEntry {
        vuid: "VUID-vkDestroyBuffer-buffer-00922",
        text: "All submitted commands that refer to buffer, either directly or via a VkBufferView, \
            must have completed execution",
        url_fragment: CORE_SPEC,
    },
    SpecTextEntry {
        vuid: "VUID-VkImageViewCreateInfo-subresourceRange-01478",
        text: "subresourceRange.baseMipLevel must be less than the mipLevels specified in \
            VkImageCreateInfo when image was created",
        url_fragment: CORE_SPEC,
    },
    SpecTextEntry {
        vuid: "VUID-VkDebugUtilsMessengerCreateInfoEXT-messageSeverity-requiredbitmask",
        text: "messageSeverity must not be 0",
        url_fragment: EXT_SPEC,
    },
    // Listed a second time under the extension document; the scan's
    // first-match rule keeps the core row authoritative.
    SpecTextEntry {
        vuid: "VUID-vkCmdDraw-None-02700",
        text: "A valid pipeline must be bound to the pipeline bind point used by this command",
        url_fragment: EXT_SPEC,
    },
];

/// Finds the table row for an identifier, if the generated excerpt covers
/// it.
pub fn find_spec_text(vuid: &str) -> Option<&'static SpecTextEntry> {
    SPEC_TEXT.iter().find(|entry| entry.vuid == vuid)
}

#[cfg(test)]
mod tests {
    use super::{find_spec_text, SPEC_URL_BASE, VUID_MARKER};

    #[test]
    fn lookup_hits_and_misses() {
        let entry = find_spec_text("VUID-VkImageCreateInfo-extent-00944")
            .expect("generated table covers this identifier");
        assert_eq!(entry.text, "extent.width must be greater than 0");

        assert!(find_spec_text("VUID-VkImageCreateInfo-extent-99999").is_none());
        assert!(find_spec_text("UNASSIGNED-CoreValidation-DrawState").is_none());
    }

    #[test]
    fn first_listed_row_wins() {
        let entry = find_spec_text("VUID-vkCmdDraw-None-02700").unwrap();

        assert_eq!(entry.url_fragment, super::CORE_SPEC);
    }

    #[test]
    fn url_is_base_fragment_and_anchor() {
        let entry = find_spec_text("VUID-vkQueueSubmit-fence-00063").unwrap();
        let url = entry.url();

        assert!(url.starts_with(SPEC_URL_BASE));
        assert!(url.ends_with("vkspec.html#VUID-vkQueueSubmit-fence-00063"));
    }

    #[test]
    fn marker_distinguishes_spec_identifiers() {
        assert!("VUID-vkCmdDraw-None-02700".contains(VUID_MARKER));
        assert!(!"UNASSIGNED-CoreValidation-DrawState".contains(VUID_MARKER));
    }
}
