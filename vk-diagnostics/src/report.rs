//! The diagnostics context.
//!
//! A [`DebugReport`] owns every piece of reporting state: the sink registry,
//! duplicate-message accounting, object display names and open debug labels.
//! One mutex guards all of it, so a report observes the sinks and both naming
//! directories as a single consistent snapshot, and sinks are invoked with
//! the lock held.

use crate::{
    format::{render_message, FormatOptions, ResolvedObject},
    location::Location,
    macros::impl_id_counter,
    message::{
        messenger_trampoline, report_trampoline, DebugReportCallback,
        DebugReportCallbackCreateInfo, DebugReportFlags, DebugUtilsLabel,
        DebugUtilsMessageSeverity, DebugUtilsMessageType, DebugUtilsMessengerCallback,
        DebugUtilsMessengerCreateInfo,
    },
    object::{LabelStackDirectory, LogObjectList, ObjectNameDirectory},
    vuid::vuid_hash,
};
use ash::vk::Handle;
use foldhash::{HashMap, HashSet};
use parking_lot::Mutex;
use smallvec::SmallVec;
use std::{
    ffi::{c_void, CString},
    fmt,
    num::NonZero,
};

/// The diagnostics context of a layer instance.
///
/// All reporting goes through one of these. Sinks of both protocols live in
/// a single registry and fire in registration order; default sinks stand in
/// only while no user sink of their protocol is registered.
///
/// # Examples
///
/// ```
/// use vk_diagnostics::{
///     DebugReport, DebugReportCreateInfo, DebugReportFlags, Func, Location, LogObjectList,
/// };
///
/// let diagnostics = DebugReport::new(DebugReportCreateInfo::default());
///
/// let objects = LogObjectList::new();
/// let location = Location::new(Func::vkCreateBuffer);
/// let aborted = diagnostics.report(
///     DebugReportFlags::ERROR,
///     "VUID-vkCreateBuffer-flags-00915",
///     &objects,
///     &location,
///     "flags contains an unsupported bit",
/// );
/// assert!(!aborted);
/// ```
pub struct DebugReport {
    json: bool,
    verbose: bool,
    display_application_name: bool,
    application_name: String,
    duplicate_message_limit: u32,
    stable_output: bool,
    filtered_vuid_hashes: HashSet<u32>,
    state: Mutex<State>,
}

struct State {
    sinks: Vec<Sink>,
    scope_sink_ids: Vec<NonZero<u64>>,
    suppressor: DuplicateSuppressor,
    object_names: ObjectNameDirectory,
    queue_labels: LabelStackDirectory,
    cmd_buf_labels: LabelStackDirectory,
    device_count: u32,
    sole_device: u64,
}

/// Counts reports per identifier hash and mutes them past the ceiling.
struct DuplicateSuppressor {
    counts: HashMap<u32, u32>,
}

impl DuplicateSuppressor {
    fn should_report(&mut self, hash: u32, limit: u32) -> bool {
        if limit == 0 {
            return true;
        }

        let count = self.counts.entry(hash).or_insert(0);

        if *count >= limit {
            return false;
        }

        *count += 1;
        true
    }
}

/// One registered sink of either protocol.
struct Sink {
    id: NonZero<u64>,
    is_default: bool,
    kind: SinkKind,
}

enum SinkKind {
    Messenger {
        message_severity: DebugUtilsMessageSeverity,
        message_type: DebugUtilsMessageType,
        pfn: ash::vk::PFN_vkDebugUtilsMessengerCallbackEXT,
        user_data: *mut c_void,
        _closure: Option<Box<DebugUtilsMessengerCallback>>,
    },
    Report {
        flags: DebugReportFlags,
        pfn: ash::vk::PFN_vkDebugReportCallbackEXT,
        user_data: *mut c_void,
        _closure: Option<Box<DebugReportCallback>>,
    },
}

// The raw pointers either point into the sink's own boxed closure wrapper,
// which is `Send + Sync`, or were supplied through an unsafe registration
// whose contract includes being called from any thread.
unsafe impl Send for Sink {}

impl_id_counter!(Sink);

impl Sink {
    fn from_messenger_callback(
        message_severity: DebugUtilsMessageSeverity,
        message_type: DebugUtilsMessageType,
        user_callback: DebugUtilsMessengerCallback,
        is_default: bool,
    ) -> Self {
        // The wrapper is boxed, because a pointer to the closure itself would
        // be fat; the box's address is thin and stays valid while the sink
        // moves around inside the registry.
        let closure = Box::new(user_callback);
        let user_data =
            &*closure as *const DebugUtilsMessengerCallback as *const c_void as *mut c_void;

        Self {
            id: Self::next_id(),
            is_default,
            kind: SinkKind::Messenger {
                message_severity,
                message_type,
                pfn: Some(messenger_trampoline),
                user_data,
                _closure: Some(closure),
            },
        }
    }

    fn from_report_callback(
        flags: DebugReportFlags,
        user_callback: DebugReportCallback,
        is_default: bool,
    ) -> Self {
        let closure = Box::new(user_callback);
        let user_data = &*closure as *const DebugReportCallback as *const c_void as *mut c_void;

        Self {
            id: Self::next_id(),
            is_default,
            kind: SinkKind::Report {
                flags,
                pfn: Some(report_trampoline),
                user_data,
                _closure: Some(closure),
            },
        }
    }

    fn from_raw_messenger(create_info: &ash::vk::DebugUtilsMessengerCreateInfoEXT<'_>) -> Self {
        Self {
            id: Self::next_id(),
            is_default: false,
            kind: SinkKind::Messenger {
                message_severity: create_info.message_severity.into(),
                message_type: create_info.message_type.into(),
                pfn: create_info.pfn_user_callback,
                user_data: create_info.p_user_data,
                _closure: None,
            },
        }
    }

    fn from_raw_report(create_info: &ash::vk::DebugReportCallbackCreateInfoEXT<'_>) -> Self {
        Self {
            id: Self::next_id(),
            is_default: false,
            kind: SinkKind::Report {
                flags: create_info.flags.into(),
                pfn: create_info.pfn_callback,
                user_data: create_info.p_user_data,
                _closure: None,
            },
        }
    }

    /// The rich-protocol masks the sink listens on.
    fn masks(&self) -> (DebugUtilsMessageSeverity, DebugUtilsMessageType) {
        match &self.kind {
            SinkKind::Messenger {
                message_severity,
                message_type,
                ..
            } => (*message_severity, *message_type),
            SinkKind::Report { flags, .. } => flags.to_severity_and_type(),
        }
    }
}

impl DebugReport {
    /// Creates a context from `create_info`.
    pub fn new(create_info: DebugReportCreateInfo) -> Self {
        let DebugReportCreateInfo {
            json,
            verbose,
            display_application_name,
            application_name,
            duplicate_message_limit,
            stable_output,
            filtered_vuid_hashes,
            default_sink,
            default_severity,
            default_message_type,
            default_callback,
            _ne: _,
        } = create_info;

        let mut sinks = Vec::new();

        if default_sink {
            let user_callback = default_callback.unwrap_or_else(|| {
                DebugUtilsMessengerCallback::new(|message| {
                    if message.severity.intersects(
                        DebugUtilsMessageSeverity::ERROR | DebugUtilsMessageSeverity::WARNING,
                    ) {
                        eprintln!("{}", message.description);
                    } else {
                        println!("{}", message.description);
                    }

                    false
                })
            });

            sinks.push(Sink::from_messenger_callback(
                default_severity,
                default_message_type,
                user_callback,
                true,
            ));
        }

        Self {
            json,
            verbose,
            display_application_name,
            application_name,
            duplicate_message_limit,
            stable_output,
            filtered_vuid_hashes,
            state: Mutex::new(State {
                sinks,
                scope_sink_ids: Vec::new(),
                suppressor: DuplicateSuppressor {
                    counts: HashMap::default(),
                },
                object_names: ObjectNameDirectory::new(),
                queue_labels: LabelStackDirectory::new(),
                cmd_buf_labels: LabelStackDirectory::new(),
                device_count: 0,
                sole_device: 0,
            }),
        }
    }

    /// Reports one diagnostic.
    ///
    /// The message is rendered once and fanned out to every registered sink
    /// whose mask matches, in registration order. Returns whether any sink
    /// asked for the reported call to be aborted.
    pub fn report(
        &self,
        flags: DebugReportFlags,
        vuid: &str,
        objects: &LogObjectList,
        location: &Location<'_>,
        message: &str,
    ) -> bool {
        let (severity, ty) = flags.to_severity_and_type();
        let hash = vuid_hash(vuid);

        if self.filtered_vuid_hashes.contains(&hash) {
            return false;
        }

        let mut state = self.state.lock();
        let state = &mut *state;

        // Reject before any rendering work if no sink listens on these masks.
        let mut active_severity = DebugUtilsMessageSeverity::empty();
        let mut active_type = DebugUtilsMessageType::empty();

        for sink in &state.sinks {
            let (sink_severity, sink_type) = sink.masks();
            active_severity |= sink_severity;
            active_type |= sink_type;
        }

        if !active_severity.intersects(severity) || !active_type.intersects(ty) {
            return false;
        }

        if !state
            .suppressor
            .should_report(hash, self.duplicate_message_limit)
        {
            return false;
        }

        let mut resolved: SmallVec<[ResolvedObject; 4]> = SmallVec::with_capacity(objects.len());
        let mut queue_span_labels: Option<SmallVec<[DebugUtilsLabel; 4]>> = None;
        let mut cmd_buf_span_labels: Option<SmallVec<[DebugUtilsLabel; 4]>> = None;

        for object in objects.iter() {
            if object.object_type == ash::vk::ObjectType::UNKNOWN || object.handle == 0 {
                continue;
            }

            // While only one device has ever been created, its handle adds
            // nothing and is left out.
            if object.object_type == ash::vk::ObjectType::DEVICE
                && state.device_count == 1
                && object.handle == state.sole_device
            {
                continue;
            }

            if object.object_type == ash::vk::ObjectType::QUEUE && queue_span_labels.is_none() {
                queue_span_labels =
                    Some(state.queue_labels.labels(object.handle).cloned().collect());
            }

            if object.object_type == ash::vk::ObjectType::COMMAND_BUFFER
                && cmd_buf_span_labels.is_none()
            {
                cmd_buf_span_labels =
                    Some(state.cmd_buf_labels.labels(object.handle).cloned().collect());
            }

            resolved.push(ResolvedObject {
                object_type: object.object_type,
                handle: object.handle,
                name: state
                    .object_names
                    .display_name(object.handle)
                    .map(str::to_owned),
            });
        }

        let description = render_message(
            &FormatOptions {
                json: self.json,
                verbose: self.verbose,
                application_name: self
                    .display_application_name
                    .then_some(self.application_name.as_str()),
                stable_output: self.stable_output,
            },
            severity,
            vuid,
            &resolved,
            location,
            message,
        );

        let use_default_messengers = !state
            .sinks
            .iter()
            .any(|sink| !sink.is_default && matches!(sink.kind, SinkKind::Messenger { .. }));
        let use_default_reports = !state
            .sinks
            .iter()
            .any(|sink| !sink.is_default && matches!(sink.kind, SinkKind::Report { .. }));

        // The raw payload is built once and shared by every sink.
        let vuid_c = c_string(vuid);
        let description_c = c_string(&description);
        let layer_prefix_c = c_string("Validation");

        let object_names_c: SmallVec<[Option<CString>; 4]> = resolved
            .iter()
            .map(|object| object.name.as_deref().map(c_string))
            .collect();
        let objects_vk: SmallVec<[ash::vk::DebugUtilsObjectNameInfoEXT<'_>; 4]> = resolved
            .iter()
            .zip(&object_names_c)
            .map(|(object, name)| {
                let mut info = ash::vk::DebugUtilsObjectNameInfoEXT {
                    object_type: object.object_type,
                    object_handle: object.handle,
                    ..Default::default()
                };

                if let Some(name) = name {
                    info.p_object_name = name.as_ptr();
                }

                info
            })
            .collect();

        let queue_span_labels = queue_span_labels.unwrap_or_default();
        let cmd_buf_span_labels = cmd_buf_span_labels.unwrap_or_default();
        let queue_label_names_c: SmallVec<[CString; 4]> = queue_span_labels
            .iter()
            .map(|label| c_string(&label.label_name))
            .collect();
        let cmd_buf_label_names_c: SmallVec<[CString; 4]> = cmd_buf_span_labels
            .iter()
            .map(|label| c_string(&label.label_name))
            .collect();
        let queue_labels_vk: SmallVec<[ash::vk::DebugUtilsLabelEXT<'_>; 4]> = queue_span_labels
            .iter()
            .zip(&queue_label_names_c)
            .map(|(label, name)| ash::vk::DebugUtilsLabelEXT {
                p_label_name: name.as_ptr(),
                color: label.color,
                ..Default::default()
            })
            .collect();
        let cmd_buf_labels_vk: SmallVec<[ash::vk::DebugUtilsLabelEXT<'_>; 4]> = cmd_buf_span_labels
            .iter()
            .zip(&cmd_buf_label_names_c)
            .map(|(label, name)| ash::vk::DebugUtilsLabelEXT {
                p_label_name: name.as_ptr(),
                color: label.color,
                ..Default::default()
            })
            .collect();

        let callback_data = ash::vk::DebugUtilsMessengerCallbackDataEXT::default()
            .message_id_name(&vuid_c)
            .message_id_number(hash as i32)
            .message(&description_c)
            .objects(&objects_vk)
            .queue_labels(&queue_labels_vk)
            .cmd_buf_labels(&cmd_buf_labels_vk);

        // Legacy sinks take a single object; an empty list becomes the
        // unknown placeholder.
        let (legacy_object_type, legacy_object) = resolved
            .first()
            .map(|object| (debug_report_object_type(object.object_type), object.handle))
            .unwrap_or((ash::vk::DebugReportObjectTypeEXT::UNKNOWN, 0));

        let severity_vk: ash::vk::DebugUtilsMessageSeverityFlagsEXT = severity.into();
        let type_vk: ash::vk::DebugUtilsMessageTypeFlagsEXT = ty.into();
        let flags_vk: ash::vk::DebugReportFlagsEXT = flags.into();

        let mut abort = false;

        for sink in &state.sinks {
            match &sink.kind {
                SinkKind::Messenger {
                    message_severity,
                    message_type,
                    pfn,
                    user_data,
                    ..
                } => {
                    if sink.is_default && !use_default_messengers {
                        continue;
                    }

                    if !message_severity.intersects(severity) || !message_type.intersects(ty) {
                        continue;
                    }

                    if let Some(callback) = pfn {
                        // SAFETY: registration promised the callback and its
                        // user data stay valid while the sink is registered.
                        let result =
                            unsafe { callback(severity_vk, type_vk, &callback_data, *user_data) };
                        abort |= result == ash::vk::TRUE;
                    }
                }
                SinkKind::Report {
                    flags: sink_flags,
                    pfn,
                    user_data,
                    ..
                } => {
                    if sink.is_default && !use_default_reports {
                        continue;
                    }

                    if !sink_flags.intersects(flags) {
                        continue;
                    }

                    if let Some(callback) = pfn {
                        // SAFETY: same contract as above.
                        let result = unsafe {
                            callback(
                                flags_vk,
                                legacy_object_type,
                                legacy_object,
                                0,
                                hash as i32,
                                layer_prefix_c.as_ptr(),
                                description_c.as_ptr(),
                                *user_data,
                            )
                        };
                        abort |= result == ash::vk::TRUE;
                    }
                }
            }
        }

        abort
    }

    /// Reports one diagnostic with a formatted body.
    pub fn report_formatted(
        &self,
        flags: DebugReportFlags,
        vuid: &str,
        objects: &LogObjectList,
        location: &Location<'_>,
        args: fmt::Arguments<'_>,
    ) -> bool {
        self.report(flags, vuid, objects, location, &args.to_string())
    }

    /// Registers a debug-utils sink backed by a closure.
    ///
    /// The returned handle removes it again with
    /// [`unregister_messenger`](Self::unregister_messenger).
    pub fn register_messenger(
        &self,
        create_info: DebugUtilsMessengerCreateInfo,
    ) -> ash::vk::DebugUtilsMessengerEXT {
        let DebugUtilsMessengerCreateInfo {
            message_severity,
            message_type,
            user_callback,
            _ne: _,
        } = create_info;

        let sink =
            Sink::from_messenger_callback(message_severity, message_type, user_callback, false);
        let handle = ash::vk::DebugUtilsMessengerEXT::from_raw(sink.id().get());
        self.state.lock().sinks.push(sink);

        handle
    }

    /// Registers a debug-utils sink from the raw create info.
    ///
    /// # Safety
    ///
    /// - `create_info.pfn_user_callback` and `create_info.p_user_data` must
    ///   stay valid, and callable from any thread, until the sink is
    ///   unregistered.
    pub unsafe fn register_messenger_raw(
        &self,
        create_info: &ash::vk::DebugUtilsMessengerCreateInfoEXT<'_>,
    ) -> ash::vk::DebugUtilsMessengerEXT {
        let sink = Sink::from_raw_messenger(create_info);
        let handle = ash::vk::DebugUtilsMessengerEXT::from_raw(sink.id().get());
        self.state.lock().sinks.push(sink);

        handle
    }

    /// Removes a previously registered debug-utils sink.
    ///
    /// Unknown handles are ignored.
    pub fn unregister_messenger(&self, handle: ash::vk::DebugUtilsMessengerEXT) {
        self.state.lock().sinks.retain(|sink| {
            !(matches!(sink.kind, SinkKind::Messenger { .. })
                && sink.id().get() == handle.as_raw())
        });
    }

    /// Registers a legacy debug-report sink backed by a closure.
    pub fn register_report_callback(
        &self,
        create_info: DebugReportCallbackCreateInfo,
    ) -> ash::vk::DebugReportCallbackEXT {
        let DebugReportCallbackCreateInfo {
            flags,
            user_callback,
            _ne: _,
        } = create_info;

        let sink = Sink::from_report_callback(flags, user_callback, false);
        let handle = ash::vk::DebugReportCallbackEXT::from_raw(sink.id().get());
        self.state.lock().sinks.push(sink);

        handle
    }

    /// Registers a legacy debug-report sink from the raw create info.
    ///
    /// # Safety
    ///
    /// - `create_info.pfn_callback` and `create_info.p_user_data` must stay
    ///   valid, and callable from any thread, until the sink is unregistered.
    pub unsafe fn register_report_callback_raw(
        &self,
        create_info: &ash::vk::DebugReportCallbackCreateInfoEXT<'_>,
    ) -> ash::vk::DebugReportCallbackEXT {
        let sink = Sink::from_raw_report(create_info);
        let handle = ash::vk::DebugReportCallbackEXT::from_raw(sink.id().get());
        self.state.lock().sinks.push(sink);

        handle
    }

    /// Removes a previously registered legacy debug-report sink.
    ///
    /// Unknown handles are ignored.
    pub fn unregister_report_callback(&self, handle: ash::vk::DebugReportCallbackEXT) {
        self.state.lock().sinks.retain(|sink| {
            !(matches!(sink.kind, SinkKind::Report { .. }) && sink.id().get() == handle.as_raw())
        });
    }

    /// Registers every sink carried on an instance create info's extension
    /// chain, keeping them until
    /// [`deactivate_scope_sinks`](Self::deactivate_scope_sinks) is called.
    ///
    /// # Safety
    ///
    /// - Every callback on the chain, and its user data, must stay valid and
    ///   callable from any thread until the scope sinks are deactivated.
    pub unsafe fn activate_scope_sinks(&self, create_info: &ash::vk::InstanceCreateInfo<'_>) {
        let mut state = self.state.lock();

        let mut chain = create_info.p_next.cast::<ash::vk::BaseInStructure<'_>>();

        while !chain.is_null() {
            // SAFETY: the chain is a valid extension chain per the caller's
            // contract, so every link starts with a structure header.
            let header = unsafe { &*chain };

            match header.s_type {
                ash::vk::StructureType::DEBUG_UTILS_MESSENGER_CREATE_INFO_EXT => {
                    // SAFETY: the header identified the full structure type.
                    let info = unsafe {
                        &*chain.cast::<ash::vk::DebugUtilsMessengerCreateInfoEXT<'_>>()
                    };
                    let sink = Sink::from_raw_messenger(info);
                    state.scope_sink_ids.push(sink.id());
                    state.sinks.push(sink);
                }
                ash::vk::StructureType::DEBUG_REPORT_CALLBACK_CREATE_INFO_EXT => {
                    // SAFETY: the header identified the full structure type.
                    let info = unsafe {
                        &*chain.cast::<ash::vk::DebugReportCallbackCreateInfoEXT<'_>>()
                    };
                    let sink = Sink::from_raw_report(info);
                    state.scope_sink_ids.push(sink.id());
                    state.sinks.push(sink);
                }
                _ => (),
            }

            chain = header.p_next;
        }
    }

    /// Removes every sink registered by
    /// [`activate_scope_sinks`](Self::activate_scope_sinks).
    pub fn deactivate_scope_sinks(&self) {
        let mut state = self.state.lock();
        let State {
            sinks,
            scope_sink_ids,
            ..
        } = &mut *state;

        sinks.retain(|sink| !scope_sink_ids.contains(&sink.id()));
        scope_sink_ids.clear();
    }

    /// Records the debug-utils name for an object.
    ///
    /// An empty name clears the entry.
    pub fn set_utils_object_name(&self, handle: u64, name: &str) {
        self.state.lock().object_names.set_utils_name(handle, name);
    }

    /// Records the debug-marker name for an object.
    ///
    /// An empty name clears the entry.
    pub fn set_marker_object_name(&self, handle: u64, name: &str) {
        self.state.lock().object_names.set_marker_name(handle, name);
    }

    /// Returns the display name recorded for `handle`, preferring the
    /// debug-utils name over the debug-marker one.
    pub fn object_display_name(&self, handle: u64) -> Option<String> {
        self.state
            .lock()
            .object_names
            .display_name(handle)
            .map(str::to_owned)
    }

    /// Formats a handle the way rendered messages do, including its recorded
    /// display name.
    pub fn format_handle(&self, object_type: ash::vk::ObjectType, handle: u64) -> String {
        let state = self.state.lock();

        crate::object::format_handle(
            object_type,
            handle,
            state.object_names.display_name(handle),
            self.stable_output,
        )
    }

    /// Same, deriving the type from a strongly typed handle.
    pub fn format_handle_typed<H: Handle>(&self, handle: H) -> String {
        self.format_handle(H::TYPE, handle.as_raw())
    }

    /// Opens a label span on a queue.
    pub fn begin_queue_label(&self, queue: ash::vk::Queue, label: DebugUtilsLabel) {
        self.state.lock().queue_labels.begin_label(queue.as_raw(), label);
    }

    /// Closes the innermost open label span on a queue.
    pub fn end_queue_label(&self, queue: ash::vk::Queue) {
        self.state.lock().queue_labels.end_label(queue.as_raw());
    }

    /// Places a single label on a queue, replacing any previously inserted
    /// one.
    pub fn insert_queue_label(&self, queue: ash::vk::Queue, label: DebugUtilsLabel) {
        self.state.lock().queue_labels.insert_label(queue.as_raw(), label);
    }

    /// Forgets all label state of a queue.
    pub fn erase_queue_labels(&self, queue: ash::vk::Queue) {
        self.state.lock().queue_labels.erase(queue.as_raw());
    }

    /// Opens a label span in a command buffer.
    pub fn begin_cmd_buf_label(
        &self,
        command_buffer: ash::vk::CommandBuffer,
        label: DebugUtilsLabel,
    ) {
        self.state
            .lock()
            .cmd_buf_labels
            .begin_label(command_buffer.as_raw(), label);
    }

    /// Closes the innermost open label span in a command buffer.
    pub fn end_cmd_buf_label(&self, command_buffer: ash::vk::CommandBuffer) {
        self.state.lock().cmd_buf_labels.end_label(command_buffer.as_raw());
    }

    /// Places a single label in a command buffer, replacing any previously
    /// inserted one.
    pub fn insert_cmd_buf_label(
        &self,
        command_buffer: ash::vk::CommandBuffer,
        label: DebugUtilsLabel,
    ) {
        self.state
            .lock()
            .cmd_buf_labels
            .insert_label(command_buffer.as_raw(), label);
    }

    /// Clears the open labels of a command buffer, for when it is reset.
    pub fn reset_cmd_buf_labels(&self, command_buffer: ash::vk::CommandBuffer) {
        self.state.lock().cmd_buf_labels.reset(command_buffer.as_raw());
    }

    /// Forgets all label state of a command buffer, for when it is freed.
    pub fn erase_cmd_buf_labels(&self, command_buffer: ash::vk::CommandBuffer) {
        self.state.lock().cmd_buf_labels.erase(command_buffer.as_raw());
    }

    /// Notes that a device was created.
    ///
    /// While exactly one device has ever been created, reports leave that
    /// device's handle out of rendered object lists.
    pub fn note_device_created(&self, device: ash::vk::Device) {
        let mut state = self.state.lock();
        state.device_count = state.device_count.saturating_add(1);

        if state.device_count == 1 {
            state.sole_device = device.as_raw();
        }
    }
}

impl fmt::Debug for DebugReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugReport")
            .field("json", &self.json)
            .field("verbose", &self.verbose)
            .field("display_application_name", &self.display_application_name)
            .field("application_name", &self.application_name)
            .field("duplicate_message_limit", &self.duplicate_message_limit)
            .field("stable_output", &self.stable_output)
            .field("filtered_vuid_hashes", &self.filtered_vuid_hashes)
            .finish_non_exhaustive()
    }
}

/// Parameters to create a [`DebugReport`] context.
#[derive(Clone)]
pub struct DebugReportCreateInfo {
    /// Whether messages are rendered as JSON objects instead of plain text.
    ///
    /// The default value is `false`.
    pub json: bool,

    /// Whether messages carry the build prefix, severity, object dump and
    /// message id, and link the specification where an excerpt is available.
    ///
    /// The default value is `false`.
    pub verbose: bool,

    /// Whether messages are prefixed with [`application_name`].
    ///
    /// [`application_name`]: Self::application_name
    ///
    /// The default value is `false`.
    pub display_application_name: bool,

    /// The application name used for the prefix.
    ///
    /// The default value is empty.
    pub application_name: String,

    /// How many times one identifier may be reported before further reports
    /// of it are muted. Zero disables the limit.
    ///
    /// The default value is `0`.
    pub duplicate_message_limit: u32,

    /// Whether values that vary between runs, such as dispatchable handles
    /// and the build prefix, are left out so output can be compared across
    /// runs and machines.
    ///
    /// The default value is `false`.
    pub stable_output: bool,

    /// Identifier hashes that are never reported.
    ///
    /// The default value is empty.
    pub filtered_vuid_hashes: HashSet<u32>,

    /// Whether a built-in sink is registered at creation. It stays active
    /// until a user sink of the same protocol is registered.
    ///
    /// The default value is `true`.
    pub default_sink: bool,

    /// The severities the built-in sink listens on.
    ///
    /// The default value is `ERROR | WARNING`.
    pub default_severity: DebugUtilsMessageSeverity,

    /// The message types the built-in sink listens on.
    ///
    /// The default value is [`DebugUtilsMessageType::all`].
    pub default_message_type: DebugUtilsMessageType,

    /// The closure backing the built-in sink, or `None` to print errors and
    /// warnings to standard error and everything else to standard output.
    ///
    /// The default value is `None`.
    pub default_callback: Option<DebugUtilsMessengerCallback>,

    pub _ne: crate::NonExhaustive,
}

impl Default for DebugReportCreateInfo {
    #[inline]
    fn default() -> Self {
        Self {
            json: false,
            verbose: false,
            display_application_name: false,
            application_name: String::new(),
            duplicate_message_limit: 0,
            stable_output: false,
            filtered_vuid_hashes: HashSet::default(),
            default_sink: true,
            default_severity: DebugUtilsMessageSeverity::ERROR
                .union(DebugUtilsMessageSeverity::WARNING),
            default_message_type: DebugUtilsMessageType::all(),
            default_callback: None,
            _ne: crate::NonExhaustive(()),
        }
    }
}

impl fmt::Debug for DebugReportCreateInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            json,
            verbose,
            display_application_name,
            application_name,
            duplicate_message_limit,
            stable_output,
            filtered_vuid_hashes,
            default_sink,
            default_severity,
            default_message_type,
            default_callback: _,
            _ne: _,
        } = self;

        f.debug_struct("DebugReportCreateInfo")
            .field("json", json)
            .field("verbose", verbose)
            .field("display_application_name", display_application_name)
            .field("application_name", application_name)
            .field("duplicate_message_limit", duplicate_message_limit)
            .field("stable_output", stable_output)
            .field("filtered_vuid_hashes", filtered_vuid_hashes)
            .field("default_sink", default_sink)
            .field("default_severity", default_severity)
            .field("default_message_type", default_message_type)
            .finish_non_exhaustive()
    }
}

fn c_string(text: &str) -> CString {
    // Interior NULs cannot cross the C boundary; drop them.
    match CString::new(text) {
        Ok(text) => text,
        Err(_) => CString::new(text.replace('\0', "")).unwrap_or_default(),
    }
}

fn debug_report_object_type(
    object_type: ash::vk::ObjectType,
) -> ash::vk::DebugReportObjectTypeEXT {
    use ash::vk::{DebugReportObjectTypeEXT as R, ObjectType as O};

    match object_type {
        O::INSTANCE => R::INSTANCE,
        O::PHYSICAL_DEVICE => R::PHYSICAL_DEVICE,
        O::DEVICE => R::DEVICE,
        O::QUEUE => R::QUEUE,
        O::SEMAPHORE => R::SEMAPHORE,
        O::COMMAND_BUFFER => R::COMMAND_BUFFER,
        O::FENCE => R::FENCE,
        O::DEVICE_MEMORY => R::DEVICE_MEMORY,
        O::BUFFER => R::BUFFER,
        O::IMAGE => R::IMAGE,
        O::EVENT => R::EVENT,
        O::QUERY_POOL => R::QUERY_POOL,
        O::BUFFER_VIEW => R::BUFFER_VIEW,
        O::IMAGE_VIEW => R::IMAGE_VIEW,
        O::SHADER_MODULE => R::SHADER_MODULE,
        O::PIPELINE_CACHE => R::PIPELINE_CACHE,
        O::PIPELINE_LAYOUT => R::PIPELINE_LAYOUT,
        O::RENDER_PASS => R::RENDER_PASS,
        O::PIPELINE => R::PIPELINE,
        O::DESCRIPTOR_SET_LAYOUT => R::DESCRIPTOR_SET_LAYOUT,
        O::SAMPLER => R::SAMPLER,
        O::DESCRIPTOR_POOL => R::DESCRIPTOR_POOL,
        O::DESCRIPTOR_SET => R::DESCRIPTOR_SET,
        O::FRAMEBUFFER => R::FRAMEBUFFER,
        O::COMMAND_POOL => R::COMMAND_POOL,
        O::SURFACE_KHR => R::SURFACE_KHR,
        O::SWAPCHAIN_KHR => R::SWAPCHAIN_KHR,
        O::DISPLAY_KHR => R::DISPLAY_KHR,
        O::DISPLAY_MODE_KHR => R::DISPLAY_MODE_KHR,
        O::SAMPLER_YCBCR_CONVERSION => R::SAMPLER_YCBCR_CONVERSION,
        O::DESCRIPTOR_UPDATE_TEMPLATE => R::DESCRIPTOR_UPDATE_TEMPLATE,
        O::ACCELERATION_STRUCTURE_KHR => R::ACCELERATION_STRUCTURE_KHR,
        O::ACCELERATION_STRUCTURE_NV => R::ACCELERATION_STRUCTURE_NV,
        _ => R::UNKNOWN,
    }
}
