//! Diagnostics plumbing for a Vulkan validation layer.
//!
//! This crate carries everything a layer needs to turn a failed check into a
//! message delivered to the right callbacks:
//!
//! - A [`Location`] names the function, structure fields and `pNext` chain
//!   entries a check was looking at when it fired, building on its parent
//!   location without allocating. [`LocationCapture`] preserves one past its
//!   borrows, for diagnostics that outlive the call that produced them.
//!
//! - [`VuidKey`](vuid::VuidKey) tables map locations to the stable `VUID-`
//!   identifiers of the Vulkan specification, and [`spec_text`] holds the
//!   quoted rule text behind those identifiers.
//!
//! - A [`DebugReport`] context owns the registered sinks of both debug
//!   protocols, the object naming directories and the open debug label
//!   spans, and fans each finished report out to every matching sink in
//!   registration order.
//!
//! The crate performs no Vulkan calls of its own; it only produces the
//! payloads handed to `VK_EXT_debug_utils` and `VK_EXT_debug_report`
//! callbacks, in [`ash`] form.

pub use ash::vk::Handle;

mod aliasable_box;
mod format;
pub mod location;
mod macros;
pub mod message;
pub mod object;
pub mod report;
pub mod spec_text;
pub mod vocab;
pub mod vuid;

pub use location::{Location, LocationCapture};
pub use message::{
    DebugReportCallback, DebugReportCallbackCreateInfo, DebugReportFlags, DebugReportMessage,
    DebugUtilsLabel, DebugUtilsMessageSeverity, DebugUtilsMessageType,
    DebugUtilsMessengerCallback, DebugUtilsMessengerCreateInfo, Message,
};
pub use object::{LogObjectList, TypedHandle};
pub use report::{DebugReport, DebugReportCreateInfo};
pub use vocab::{Field, Func, Struct};
pub use vuid::VUID_UNDEFINED;

/// A helper type for non-exhaustive structs.
///
/// This type cannot be constructed outside this crate. Structures with a field of this type can
/// only be constructed by calling a constructor function or `Default::default()`. The effect is
/// similar to the standard Rust `#[non_exhaustive]` attribute, except that it does not prevent
/// update syntax from being used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)] // add traits as needed
pub struct NonExhaustive(pub(crate) ());
