//! Message sinks and the two callback protocols they speak.
//!
//! Diagnostics leave the layer through caller-registered sinks. A sink speaks
//! either the debug-utils protocol, which receives severity and type masks
//! plus a structured payload (identifier, rendered text, named objects,
//! active labels), or the older debug-report protocol, which receives a
//! single flag mask and a flat string. Both stay supported at the same time;
//! one reported message may fan out to any mix of the two.
//!
//! Sinks can be raw C function pointers handed to the layer by an
//! application, or Rust closures wrapped in [`DebugUtilsMessengerCallback`] /
//! [`DebugReportCallback`]. Closures are invoked through the same trampoline
//! machinery as raw pointers, so the dispatch path does not distinguish them.

use crate::macros::vulkan_bitflags;
use std::{
    ffi::{c_char, c_void, CStr},
    fmt,
    panic::{catch_unwind, AssertUnwindSafe, RefUnwindSafe},
    slice,
    sync::Arc,
};

vulkan_bitflags! {
    /// The severity of a diagnostic message.
    DebugUtilsMessageSeverity
    = DebugUtilsMessageSeverityFlagsEXT(u32);

    /// Trace-level output useful when debugging the layer itself.
    VERBOSE = VERBOSE,

    /// An informational message such as resource details.
    INFO = INFO,

    /// Behavior that is not necessarily illegal but probably unintended.
    WARNING = WARNING,

    /// Behavior that violates the API specification and may cause undefined
    /// results.
    ERROR = ERROR,
}

vulkan_bitflags! {
    /// The category of event a diagnostic message describes.
    DebugUtilsMessageType
    = DebugUtilsMessageTypeFlagsEXT(u32);

    /// An event unrelated to any particular rule, such as layer startup.
    GENERAL = GENERAL,

    /// A violation of a rule covering valid API usage.
    VALIDATION = VALIDATION,

    /// A potentially non-optimal use of the API.
    PERFORMANCE = PERFORMANCE,
}

vulkan_bitflags! {
    /// The flag vocabulary of the legacy debug-report protocol.
    DebugReportFlags
    = DebugReportFlagsEXT(u32);

    /// An informational message.
    INFORMATION = INFORMATION,

    /// A use that is probably unintended.
    WARNING = WARNING,

    /// A potentially non-optimal use of the API.
    PERFORMANCE_WARNING = PERFORMANCE_WARNING,

    /// A violation of the API specification.
    ERROR = ERROR,

    /// Trace-level output from the layer.
    DEBUG = DEBUG,
}

impl DebugReportFlags {
    /// Translates a legacy flag mask to the equivalent severity and type
    /// masks.
    pub fn to_severity_and_type(self) -> (DebugUtilsMessageSeverity, DebugUtilsMessageType) {
        let mut severity = DebugUtilsMessageSeverity::empty();
        let mut ty = DebugUtilsMessageType::empty();

        if self.intersects(Self::DEBUG) {
            severity |= DebugUtilsMessageSeverity::VERBOSE;
            ty |= DebugUtilsMessageType::GENERAL;
        }

        if self.intersects(Self::INFORMATION) {
            severity |= DebugUtilsMessageSeverity::INFO;
            ty |= DebugUtilsMessageType::GENERAL;
        }

        if self.intersects(Self::WARNING) {
            severity |= DebugUtilsMessageSeverity::WARNING;
            ty |= DebugUtilsMessageType::VALIDATION;
        }

        if self.intersects(Self::PERFORMANCE_WARNING) {
            severity |= DebugUtilsMessageSeverity::WARNING;
            ty |= DebugUtilsMessageType::PERFORMANCE;
        }

        if self.intersects(Self::ERROR) {
            severity |= DebugUtilsMessageSeverity::ERROR;
            ty |= DebugUtilsMessageType::VALIDATION;
        }

        (severity, ty)
    }

    /// Translates severity and type masks to the closest legacy flag mask.
    ///
    /// A warning about a performance category message becomes
    /// `PERFORMANCE_WARNING` rather than plain `WARNING`.
    pub fn from_severity_and_type(
        severity: DebugUtilsMessageSeverity,
        ty: DebugUtilsMessageType,
    ) -> Self {
        let mut flags = Self::empty();

        if severity.intersects(DebugUtilsMessageSeverity::VERBOSE) {
            flags |= Self::DEBUG;
        }

        if severity.intersects(DebugUtilsMessageSeverity::INFO) {
            flags |= Self::INFORMATION;
        }

        if severity.intersects(DebugUtilsMessageSeverity::WARNING) {
            flags |= if ty.intersects(DebugUtilsMessageType::PERFORMANCE) {
                Self::PERFORMANCE_WARNING
            } else {
                Self::WARNING
            };
        }

        if severity.intersects(DebugUtilsMessageSeverity::ERROR) {
            flags |= Self::ERROR;
        }

        flags
    }
}

/// A message delivered to a debug-utils sink.
pub struct Message<'a> {
    /// Severity of the message.
    pub severity: DebugUtilsMessageSeverity,
    /// Category of the message.
    pub ty: DebugUtilsMessageType,
    /// The stable identifier of the rule that fired, or `None` if the
    /// producer did not set one.
    pub message_id_name: Option<&'a str>,
    /// The 32-bit code derived from the identifier.
    pub message_id_number: i32,
    /// The fully rendered message text.
    pub description: &'a str,
    /// The objects the message is about, in the form they are handed to raw
    /// sinks.
    pub objects: &'a [ash::vk::DebugUtilsObjectNameInfoEXT<'a>],
    /// Labels currently open on the queue the message relates to.
    pub queue_labels: &'a [ash::vk::DebugUtilsLabelEXT<'a>],
    /// Labels currently open in the command buffer the message relates to.
    pub cmd_buf_labels: &'a [ash::vk::DebugUtilsLabelEXT<'a>],
}

/// A message delivered to a legacy debug-report sink.
pub struct DebugReportMessage<'a> {
    /// Legacy flag mask of the message.
    pub flags: DebugReportFlags,
    /// The type of `object`.
    pub object_type: ash::vk::DebugReportObjectTypeEXT,
    /// The raw handle of the first reported object, or zero.
    pub object: u64,
    /// The 32-bit code derived from the stable identifier.
    pub message_code: i32,
    /// The prefix identifying the reporting component.
    pub layer_prefix: &'a str,
    /// The fully rendered message text.
    pub description: &'a str,
}

type MessengerCallbackFn = dyn Fn(&Message<'_>) -> bool + RefUnwindSafe + Send + Sync;

/// A closure acting as a debug-utils sink.
///
/// The closure returns whether the reported call should be aborted; return
/// `false` unless you are debugging the layer itself. It runs under the
/// owning context's lock, so calling back into that context deadlocks. If it
/// panics, the panic is caught and the message dropped.
#[derive(Clone)]
pub struct DebugUtilsMessengerCallback(Arc<MessengerCallbackFn>);

impl DebugUtilsMessengerCallback {
    /// Wraps a closure.
    pub fn new(
        func: impl Fn(&Message<'_>) -> bool + RefUnwindSafe + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(func))
    }
}

type ReportCallbackFn = dyn Fn(&DebugReportMessage<'_>) -> bool + RefUnwindSafe + Send + Sync;

/// A closure acting as a legacy debug-report sink.
///
/// Same contract as [`DebugUtilsMessengerCallback`].
#[derive(Clone)]
pub struct DebugReportCallback(Arc<ReportCallbackFn>);

impl DebugReportCallback {
    /// Wraps a closure.
    pub fn new(
        func: impl Fn(&DebugReportMessage<'_>) -> bool + RefUnwindSafe + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(func))
    }
}

/// Adapts a boxed [`DebugUtilsMessengerCallback`] to the raw callback ABI.
///
/// `user_data` is the address of the box's contents; the caller keeps the box
/// alive for as long as the sink is registered.
pub(crate) unsafe extern "system" fn messenger_trampoline(
    message_severity: ash::vk::DebugUtilsMessageSeverityFlagsEXT,
    message_types: ash::vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const ash::vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    user_data: *mut c_void,
) -> ash::vk::Bool32 {
    // The box erases the closure's unwind safety; never unwind across the
    // callback ABI.
    let abort = catch_unwind(AssertUnwindSafe(move || {
        let user_callback = &*(user_data as *const DebugUtilsMessengerCallback);
        let data = &*callback_data;

        let message_id_name = data.p_message_id_name.as_ref().map(|name| {
            CStr::from_ptr(name)
                .to_str()
                .expect("debug callback message id not utf-8")
        });

        let description = CStr::from_ptr(data.p_message)
            .to_str()
            .expect("debug callback message not utf-8");

        let message = Message {
            severity: message_severity.into(),
            ty: message_types.into(),
            message_id_name,
            message_id_number: data.message_id_number,
            description,
            objects: raw_slice(data.p_objects, data.object_count),
            queue_labels: raw_slice(data.p_queue_labels, data.queue_label_count),
            cmd_buf_labels: raw_slice(data.p_cmd_buf_labels, data.cmd_buf_label_count),
        };

        (user_callback.0)(&message)
    }));

    match abort {
        Ok(true) => ash::vk::TRUE,
        _ => ash::vk::FALSE,
    }
}

/// Adapts a boxed [`DebugReportCallback`] to the raw legacy callback ABI.
pub(crate) unsafe extern "system" fn report_trampoline(
    flags: ash::vk::DebugReportFlagsEXT,
    object_type: ash::vk::DebugReportObjectTypeEXT,
    object: u64,
    _location: usize,
    message_code: i32,
    p_layer_prefix: *const c_char,
    p_message: *const c_char,
    user_data: *mut c_void,
) -> ash::vk::Bool32 {
    let abort = catch_unwind(AssertUnwindSafe(move || {
        let user_callback = &*(user_data as *const DebugReportCallback);

        let layer_prefix = CStr::from_ptr(p_layer_prefix)
            .to_str()
            .expect("debug callback layer prefix not utf-8");

        let description = CStr::from_ptr(p_message)
            .to_str()
            .expect("debug callback message not utf-8");

        let message = DebugReportMessage {
            flags: flags.into(),
            object_type,
            object,
            message_code,
            layer_prefix,
            description,
        };

        (user_callback.0)(&message)
    }));

    match abort {
        Ok(true) => ash::vk::TRUE,
        _ => ash::vk::FALSE,
    }
}

unsafe fn raw_slice<'a, T>(data: *const T, len: u32) -> &'a [T] {
    if data.is_null() || len == 0 {
        &[]
    } else {
        slice::from_raw_parts(data, len as usize)
    }
}

/// Parameters to register a debug-utils sink backed by a closure.
#[derive(Clone)]
pub struct DebugUtilsMessengerCreateInfo {
    /// The message severities the sink should be called for.
    ///
    /// The default value is `ERROR | WARNING`.
    pub message_severity: DebugUtilsMessageSeverity,

    /// The message types the sink should be called for.
    ///
    /// The default value is [`DebugUtilsMessageType::all`].
    pub message_type: DebugUtilsMessageType,

    /// The closure that should be called.
    pub user_callback: DebugUtilsMessengerCallback,

    pub _ne: crate::NonExhaustive,
}

impl DebugUtilsMessengerCreateInfo {
    /// Returns a `DebugUtilsMessengerCreateInfo` with the specified
    /// `user_callback`.
    #[inline]
    pub fn user_callback(user_callback: DebugUtilsMessengerCallback) -> Self {
        Self {
            message_severity: DebugUtilsMessageSeverity::ERROR
                .union(DebugUtilsMessageSeverity::WARNING),
            message_type: DebugUtilsMessageType::all(),
            user_callback,
            _ne: crate::NonExhaustive(()),
        }
    }
}

impl fmt::Debug for DebugUtilsMessengerCreateInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            message_severity,
            message_type,
            user_callback: _,
            _ne: _,
        } = self;

        f.debug_struct("DebugUtilsMessengerCreateInfo")
            .field("message_severity", message_severity)
            .field("message_type", message_type)
            .finish_non_exhaustive()
    }
}

/// Parameters to register a legacy debug-report sink backed by a closure.
#[derive(Clone)]
pub struct DebugReportCallbackCreateInfo {
    /// The legacy flags the sink should be called for.
    ///
    /// The default value is `ERROR | WARNING | PERFORMANCE_WARNING`.
    pub flags: DebugReportFlags,

    /// The closure that should be called.
    pub user_callback: DebugReportCallback,

    pub _ne: crate::NonExhaustive,
}

impl DebugReportCallbackCreateInfo {
    /// Returns a `DebugReportCallbackCreateInfo` with the specified
    /// `user_callback`.
    #[inline]
    pub fn user_callback(user_callback: DebugReportCallback) -> Self {
        Self {
            flags: DebugReportFlags::ERROR
                .union(DebugReportFlags::WARNING)
                .union(DebugReportFlags::PERFORMANCE_WARNING),
            user_callback,
            _ne: crate::NonExhaustive(()),
        }
    }
}

impl fmt::Debug for DebugReportCallbackCreateInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            flags,
            user_callback: _,
            _ne: _,
        } = self;

        f.debug_struct("DebugReportCallbackCreateInfo")
            .field("flags", flags)
            .finish_non_exhaustive()
    }
}

/// A label bounding a span of work on a queue or in a command buffer.
///
/// Labels are pushed and popped around work as it is recorded or submitted,
/// and open labels are attached to any diagnostic reported inside the span.
#[derive(Clone, Debug)]
pub struct DebugUtilsLabel {
    /// The name of the label.
    ///
    /// The default value is empty.
    pub label_name: String,

    /// An RGBA color associated with the label, with values in `0.0..=1.0`.
    ///
    /// If set to `[0.0; 4]`, the value is ignored.
    ///
    /// The default value is `[0.0; 4]`.
    pub color: [f32; 4],

    pub _ne: crate::NonExhaustive,
}

impl Default for DebugUtilsLabel {
    #[inline]
    fn default() -> Self {
        Self {
            label_name: String::new(),
            color: [0.0; 4],
            _ne: crate::NonExhaustive(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        messenger_trampoline, DebugReportFlags, DebugUtilsMessageSeverity, DebugUtilsMessageType,
        DebugUtilsMessengerCallback,
    };
    use std::{
        ffi::{c_void, CString},
        sync::atomic::{AtomicU32, Ordering},
    };

    #[test]
    fn legacy_flags_to_severity_and_type() {
        let (severity, ty) = DebugReportFlags::ERROR.to_severity_and_type();
        assert_eq!(severity, DebugUtilsMessageSeverity::ERROR);
        assert_eq!(ty, DebugUtilsMessageType::VALIDATION);

        let (severity, ty) = DebugReportFlags::PERFORMANCE_WARNING.to_severity_and_type();
        assert_eq!(severity, DebugUtilsMessageSeverity::WARNING);
        assert_eq!(ty, DebugUtilsMessageType::PERFORMANCE);

        let (severity, ty) = (DebugReportFlags::DEBUG | DebugReportFlags::INFORMATION)
            .to_severity_and_type();
        assert_eq!(
            severity,
            DebugUtilsMessageSeverity::VERBOSE | DebugUtilsMessageSeverity::INFO,
        );
        assert_eq!(ty, DebugUtilsMessageType::GENERAL);
    }

    #[test]
    fn severity_and_type_to_legacy_flags() {
        assert_eq!(
            DebugReportFlags::from_severity_and_type(
                DebugUtilsMessageSeverity::ERROR,
                DebugUtilsMessageType::VALIDATION,
            ),
            DebugReportFlags::ERROR,
        );

        // A performance category message downgrades WARNING to the dedicated
        // legacy flag.
        assert_eq!(
            DebugReportFlags::from_severity_and_type(
                DebugUtilsMessageSeverity::WARNING,
                DebugUtilsMessageType::PERFORMANCE,
            ),
            DebugReportFlags::PERFORMANCE_WARNING,
        );

        assert_eq!(
            DebugReportFlags::from_severity_and_type(
                DebugUtilsMessageSeverity::WARNING,
                DebugUtilsMessageType::VALIDATION,
            ),
            DebugReportFlags::WARNING,
        );
    }

    #[test]
    fn trampoline_unpacks_callback_data() {
        static SEEN: AtomicU32 = AtomicU32::new(0);

        let callback = Box::new(DebugUtilsMessengerCallback::new(|message| {
            assert_eq!(message.severity, DebugUtilsMessageSeverity::ERROR);
            assert_eq!(message.ty, DebugUtilsMessageType::VALIDATION);
            assert_eq!(message.message_id_name, Some("VUID-vkCmdDraw-None-02700"));
            assert_eq!(message.message_id_number, 0x1234);
            assert_eq!(message.description, "something went wrong");
            assert_eq!(message.objects.len(), 1);
            assert!(message.queue_labels.is_empty());

            SEEN.fetch_add(1, Ordering::Relaxed);

            true
        }));

        let message_id_name = CString::new("VUID-vkCmdDraw-None-02700").unwrap();
        let message = CString::new("something went wrong").unwrap();
        let objects = [ash::vk::DebugUtilsObjectNameInfoEXT {
            object_type: ash::vk::ObjectType::COMMAND_BUFFER,
            object_handle: 0x5678,
            ..Default::default()
        }];

        let data = ash::vk::DebugUtilsMessengerCallbackDataEXT::default()
            .message_id_name(&message_id_name)
            .message_id_number(0x1234)
            .message(&message)
            .objects(&objects);

        let returned = unsafe {
            messenger_trampoline(
                ash::vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
                ash::vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION,
                &data,
                &*callback as *const DebugUtilsMessengerCallback as *mut c_void,
            )
        };

        assert_eq!(SEEN.load(Ordering::Relaxed), 1);
        assert_eq!(returned, ash::vk::TRUE);
    }
}
