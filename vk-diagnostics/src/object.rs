//! Object identity, display names and label stacks.
//!
//! Diagnostics name the objects they are about. An application can attach
//! friendly names to raw handles through either naming protocol, and can
//! bracket spans of queue or command-buffer work with colored labels; both
//! kinds of annotation are attached to messages at dispatch time.
//!
//! The directories in this module do no locking of their own. They live
//! inside the dispatch set's single lock, and every method assumes that lock
//! is held; see [`DebugReport`](crate::DebugReport) for the entry points that
//! take it.

use crate::message::DebugUtilsLabel;
use ash::vk::Handle;
use foldhash::HashMap;
use smallvec::SmallVec;
use std::fmt::Write as _;

/// A raw handle paired with its object type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypedHandle {
    pub object_type: ash::vk::ObjectType,
    pub handle: u64,
}

impl TypedHandle {
    /// Wraps a typed handle, deriving the object type from `H`.
    #[inline]
    pub fn new<H: Handle>(handle: H) -> Self {
        TypedHandle {
            object_type: H::TYPE,
            handle: handle.as_raw(),
        }
    }
}

/// The objects one diagnostic is about, in the order they should be listed.
#[derive(Clone, Debug, Default)]
pub struct LogObjectList {
    objects: SmallVec<[TypedHandle; 4]>,
}

impl LogObjectList {
    /// Returns an empty list.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a typed handle.
    #[inline]
    pub fn add<H: Handle>(&mut self, handle: H) {
        self.objects.push(TypedHandle::new(handle));
    }

    /// Appends an already-erased handle, for callers that only have the raw
    /// type and value.
    #[inline]
    pub fn add_typed(&mut self, object: TypedHandle) {
        self.objects.push(object);
    }

    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &TypedHandle> {
        self.objects.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Returns the API name of an object type, or `"Unknown"` for types the
/// reporting core does not recognize.
pub fn object_type_name(object_type: ash::vk::ObjectType) -> &'static str {
    match object_type {
        ash::vk::ObjectType::INSTANCE => "VkInstance",
        ash::vk::ObjectType::PHYSICAL_DEVICE => "VkPhysicalDevice",
        ash::vk::ObjectType::DEVICE => "VkDevice",
        ash::vk::ObjectType::QUEUE => "VkQueue",
        ash::vk::ObjectType::SEMAPHORE => "VkSemaphore",
        ash::vk::ObjectType::COMMAND_BUFFER => "VkCommandBuffer",
        ash::vk::ObjectType::FENCE => "VkFence",
        ash::vk::ObjectType::DEVICE_MEMORY => "VkDeviceMemory",
        ash::vk::ObjectType::BUFFER => "VkBuffer",
        ash::vk::ObjectType::IMAGE => "VkImage",
        ash::vk::ObjectType::EVENT => "VkEvent",
        ash::vk::ObjectType::QUERY_POOL => "VkQueryPool",
        ash::vk::ObjectType::BUFFER_VIEW => "VkBufferView",
        ash::vk::ObjectType::IMAGE_VIEW => "VkImageView",
        ash::vk::ObjectType::SHADER_MODULE => "VkShaderModule",
        ash::vk::ObjectType::PIPELINE_CACHE => "VkPipelineCache",
        ash::vk::ObjectType::PIPELINE_LAYOUT => "VkPipelineLayout",
        ash::vk::ObjectType::RENDER_PASS => "VkRenderPass",
        ash::vk::ObjectType::PIPELINE => "VkPipeline",
        ash::vk::ObjectType::DESCRIPTOR_SET_LAYOUT => "VkDescriptorSetLayout",
        ash::vk::ObjectType::SAMPLER => "VkSampler",
        ash::vk::ObjectType::DESCRIPTOR_POOL => "VkDescriptorPool",
        ash::vk::ObjectType::DESCRIPTOR_SET => "VkDescriptorSet",
        ash::vk::ObjectType::FRAMEBUFFER => "VkFramebuffer",
        ash::vk::ObjectType::COMMAND_POOL => "VkCommandPool",
        ash::vk::ObjectType::SAMPLER_YCBCR_CONVERSION => "VkSamplerYcbcrConversion",
        ash::vk::ObjectType::DESCRIPTOR_UPDATE_TEMPLATE => "VkDescriptorUpdateTemplate",
        ash::vk::ObjectType::SURFACE_KHR => "VkSurfaceKHR",
        ash::vk::ObjectType::SWAPCHAIN_KHR => "VkSwapchainKHR",
        ash::vk::ObjectType::DISPLAY_KHR => "VkDisplayKHR",
        ash::vk::ObjectType::DISPLAY_MODE_KHR => "VkDisplayModeKHR",
        ash::vk::ObjectType::DEBUG_REPORT_CALLBACK_EXT => "VkDebugReportCallbackEXT",
        ash::vk::ObjectType::DEBUG_UTILS_MESSENGER_EXT => "VkDebugUtilsMessengerEXT",
        ash::vk::ObjectType::VIDEO_SESSION_KHR => "VkVideoSessionKHR",
        ash::vk::ObjectType::ACCELERATION_STRUCTURE_KHR => "VkAccelerationStructureKHR",
        _ => "Unknown",
    }
}

/// Returns whether handles of this type are dispatchable, meaning their raw
/// value is a pointer that varies from run to run.
pub(crate) fn is_dispatchable(object_type: ash::vk::ObjectType) -> bool {
    matches!(
        object_type,
        ash::vk::ObjectType::INSTANCE
            | ash::vk::ObjectType::PHYSICAL_DEVICE
            | ash::vk::ObjectType::DEVICE
            | ash::vk::ObjectType::QUEUE
            | ash::vk::ObjectType::COMMAND_BUFFER,
    )
}

/// Renders one handle as `VkType 0x1234[name]`.
///
/// With `stable_output` set, the hex value of a dispatchable handle is left
/// out, since it is a pointer and would make otherwise identical output
/// differ between runs. The type name and any resolved display name are kept.
pub fn format_handle(
    object_type: ash::vk::ObjectType,
    handle: u64,
    name: Option<&str>,
    stable_output: bool,
) -> String {
    let mut out = String::from(object_type_name(object_type));

    if !(stable_output && is_dispatchable(object_type)) {
        let _ = write!(out, " {:#x}", handle);
    }

    match name {
        Some(name) if !name.is_empty() => {
            let _ = write!(out, "[{}]", name);
        }
        _ => {}
    }

    out
}

/// Display names attached to raw handles, one map per naming protocol.
///
/// Setting an empty name removes the entry, mirroring how both protocols let
/// an application clear a name.
#[derive(Debug, Default)]
pub struct ObjectNameDirectory {
    utils_names: HashMap<u64, String>,
    marker_names: HashMap<u64, String>,
}

impl ObjectNameDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets or clears the debug-utils name of a handle.
    pub fn set_utils_name(&mut self, handle: u64, name: &str) {
        if name.is_empty() {
            self.utils_names.remove(&handle);
        } else {
            self.utils_names.insert(handle, name.to_owned());
        }
    }

    /// Sets or clears the legacy debug-marker name of a handle.
    pub fn set_marker_name(&mut self, handle: u64, name: &str) {
        if name.is_empty() {
            self.marker_names.remove(&handle);
        } else {
            self.marker_names.insert(handle, name.to_owned());
        }
    }

    /// Returns the name to display for a handle, preferring the debug-utils
    /// name over the legacy one.
    pub fn display_name(&self, handle: u64) -> Option<&str> {
        self.utils_names
            .get(&handle)
            .or_else(|| self.marker_names.get(&handle))
            .map(String::as_str)
    }
}

#[derive(Debug, Default)]
struct LabelStack {
    stack: Vec<DebugUtilsLabel>,
    inserted: Option<DebugUtilsLabel>,
}

/// The open label spans of every queue or command buffer, keyed by raw
/// handle. Entries are created on first use.
///
/// A begin/end pair brackets a span, so `begin` pushes and `end` pops. An
/// inserted label marks a single point instead and only survives until the
/// bracketing around it changes, so `begin` and `end` clear it and a second
/// `insert` overwrites it.
#[derive(Debug, Default)]
pub struct LabelStackDirectory {
    entries: HashMap<u64, LabelStack>,
}

impl LabelStackDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a label span.
    pub fn begin_label(&mut self, context: u64, label: DebugUtilsLabel) {
        let entry = self.entries.entry(context).or_default();
        entry.stack.push(label);
        entry.inserted = None;
    }

    /// Closes the innermost open span. Without one this is a no-op.
    pub fn end_label(&mut self, context: u64) {
        let entry = self.entries.entry(context).or_default();
        entry.stack.pop();
        entry.inserted = None;
    }

    /// Marks a single point, replacing any previous mark.
    pub fn insert_label(&mut self, context: u64, label: DebugUtilsLabel) {
        let entry = self.entries.entry(context).or_default();
        entry.inserted = Some(label);
    }

    /// Clears a context's spans and mark, keeping the entry itself. Used when
    /// the underlying object is reset rather than destroyed.
    pub fn reset(&mut self, context: u64) {
        if let Some(entry) = self.entries.get_mut(&context) {
            entry.stack.clear();
            entry.inserted = None;
        }
    }

    /// Removes a context entirely. Used when the underlying object is
    /// destroyed.
    pub fn erase(&mut self, context: u64) {
        self.entries.remove(&context);
    }

    /// Returns the labels currently open on a context, outermost first, with
    /// any inserted mark last.
    pub fn labels(&self, context: u64) -> impl Iterator<Item = &DebugUtilsLabel> {
        self.entries
            .get(&context)
            .into_iter()
            .flat_map(|entry| entry.stack.iter().chain(entry.inserted.iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::{format_handle, LabelStackDirectory, LogObjectList, ObjectNameDirectory};
    use crate::message::DebugUtilsLabel;
    use ash::vk::Handle;

    fn label(name: &str) -> DebugUtilsLabel {
        DebugUtilsLabel {
            label_name: name.to_owned(),
            ..Default::default()
        }
    }

    fn label_names(directory: &LabelStackDirectory, context: u64) -> Vec<String> {
        directory
            .labels(context)
            .map(|label| label.label_name.clone())
            .collect()
    }

    #[test]
    fn utils_name_shadows_marker_name() {
        let mut directory = ObjectNameDirectory::new();
        directory.set_marker_name(0x10, "marker");

        assert_eq!(directory.display_name(0x10), Some("marker"));

        directory.set_utils_name(0x10, "utils");
        assert_eq!(directory.display_name(0x10), Some("utils"));

        directory.set_utils_name(0x10, "");
        assert_eq!(directory.display_name(0x10), Some("marker"));

        directory.set_marker_name(0x10, "");
        assert_eq!(directory.display_name(0x10), None);
    }

    #[test]
    fn label_begin_end_and_insert() {
        let mut directory = LabelStackDirectory::new();

        directory.begin_label(1, label("frame"));
        directory.begin_label(1, label("shadow pass"));
        directory.insert_label(1, label("draw 17"));

        assert_eq!(label_names(&directory, 1), ["frame", "shadow pass", "draw 17"]);

        // A new mark replaces the old one.
        directory.insert_label(1, label("draw 18"));
        assert_eq!(label_names(&directory, 1), ["frame", "shadow pass", "draw 18"]);

        // Closing a span also drops the mark inside it.
        directory.end_label(1);
        assert_eq!(label_names(&directory, 1), ["frame"]);

        // Opening a new span drops a stale mark as well.
        directory.insert_label(1, label("draw 19"));
        directory.begin_label(1, label("resolve pass"));
        assert_eq!(label_names(&directory, 1), ["frame", "resolve pass"]);
    }

    #[test]
    fn label_end_without_begin_is_a_no_op() {
        let mut directory = LabelStackDirectory::new();
        directory.end_label(1);

        assert_eq!(label_names(&directory, 1), Vec::<String>::new());
    }

    #[test]
    fn label_reset_and_erase() {
        let mut directory = LabelStackDirectory::new();

        directory.begin_label(1, label("frame"));
        directory.begin_label(2, label("upload"));

        directory.reset(1);
        assert!(label_names(&directory, 1).is_empty());
        assert_eq!(label_names(&directory, 2), ["upload"]);

        directory.erase(2);
        assert!(label_names(&directory, 2).is_empty());
    }

    #[test]
    fn handle_formatting() {
        assert_eq!(
            format_handle(ash::vk::ObjectType::BUFFER, 0x3a, Some("staging"), false),
            "VkBuffer 0x3a[staging]",
        );
        assert_eq!(
            format_handle(ash::vk::ObjectType::BUFFER, 0x3a, None, false),
            "VkBuffer 0x3a",
        );

        // Stable output keeps non-dispatchable hex values...
        assert_eq!(
            format_handle(ash::vk::ObjectType::BUFFER, 0x3a, None, true),
            "VkBuffer 0x3a",
        );

        // ...but hides dispatchable ones, which are pointers.
        assert_eq!(
            format_handle(
                ash::vk::ObjectType::COMMAND_BUFFER,
                0x7f32_0000_1000,
                Some("upload cb"),
                true,
            ),
            "VkCommandBuffer[upload cb]",
        );
    }

    #[test]
    fn object_list_collects_typed_handles() {
        let mut objects = LogObjectList::new();
        assert!(objects.is_empty());

        objects.add(ash::vk::Buffer::from_raw(0x10));
        objects.add(ash::vk::Image::from_raw(0x20));

        assert_eq!(objects.len(), 2);

        let types: Vec<_> = objects.iter().map(|object| object.object_type).collect();
        assert_eq!(
            types,
            [ash::vk::ObjectType::BUFFER, ash::vk::ObjectType::IMAGE],
        );
    }
}
