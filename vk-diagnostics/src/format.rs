//! Rendering of diagnostic messages.
//!
//! One rendering call produces the final text handed to sinks, in either
//! human-readable form or as a flat JSON object. Both forms pull from the
//! same inputs and apply the same stable-output rule to handle values, so
//! switching encodings never changes which information is available.

use crate::{
    location::Location,
    message::DebugUtilsMessageSeverity,
    object::format_handle,
    spec_text::{find_spec_text, VUID_MARKER},
    vuid::vuid_hash,
};
use serde_json::{json, Value};
use std::fmt::Write as _;

/// The configuration slice the renderers read.
pub(crate) struct FormatOptions<'a> {
    pub json: bool,
    pub verbose: bool,
    /// Set when message prefixing with the application's name is enabled.
    pub application_name: Option<&'a str>,
    pub stable_output: bool,
}

/// One reported object after name resolution.
pub(crate) struct ResolvedObject {
    pub object_type: ash::vk::ObjectType,
    pub handle: u64,
    pub name: Option<String>,
}

/// Renders the complete message for one diagnostic.
pub(crate) fn render_message(
    options: &FormatOptions<'_>,
    severity: DebugUtilsMessageSeverity,
    vuid: &str,
    objects: &[ResolvedObject],
    location: &Location<'_>,
    body: &str,
) -> String {
    if options.json {
        render_json(options, severity, vuid, objects, location, body)
    } else {
        render_text(options, severity, vuid, objects, location, body)
    }
}

fn severity_word(severity: DebugUtilsMessageSeverity) -> &'static str {
    if severity.intersects(DebugUtilsMessageSeverity::ERROR) {
        "Error"
    } else if severity.intersects(DebugUtilsMessageSeverity::WARNING) {
        "Warning"
    } else if severity.intersects(DebugUtilsMessageSeverity::INFO) {
        "Info"
    } else {
        "Verbose"
    }
}

fn render_text(
    options: &FormatOptions<'_>,
    severity: DebugUtilsMessageSeverity,
    vuid: &str,
    objects: &[ResolvedObject],
    location: &Location<'_>,
    body: &str,
) -> String {
    let mut out = String::new();

    // The build prefix varies between builds, so stable output drops it.
    if options.verbose && !options.stable_output {
        let _ = write!(out, "{} {}: ", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    }

    if let Some(application_name) = options.application_name {
        let _ = write!(out, "[{}] ", application_name);
    }

    if options.verbose {
        out.push_str(severity_word(severity));
        out.push_str(": ");
    }

    let _ = write!(out, "[ {} ]", vuid);

    if options.verbose {
        if !objects.is_empty() {
            out.push(' ');

            for (index, object) in objects.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }

                out.push_str(&format_handle(
                    object.object_type,
                    object.handle,
                    object.name.as_deref(),
                    options.stable_output,
                ));
            }
        }

        let _ = write!(out, " | MessageID = {:#x} |", vuid_hash(vuid));
    }

    out.push(if options.verbose { '\n' } else { ' ' });
    out.push_str(&location.message());
    out.push(' ');
    out.push_str(body);

    if vuid.contains(VUID_MARKER) {
        if let Some(entry) = find_spec_text(vuid) {
            if !out.ends_with('.') {
                out.push('.');
            }
            out.push('\n');

            let _ = write!(out, "The Vulkan spec states: {}", entry.text);

            if options.verbose {
                let _ = write!(out, " ({})", entry.url());
            }
        }
    }

    out
}

fn render_json(
    options: &FormatOptions<'_>,
    severity: DebugUtilsMessageSeverity,
    vuid: &str,
    objects: &[ResolvedObject],
    location: &Location<'_>,
    body: &str,
) -> String {
    // Consumers rely on the key order; the map preserves insertion order.
    let mut map = serde_json::Map::new();

    if let Some(application_name) = options.application_name {
        map.insert("AppName".into(), json!(application_name));
    }

    map.insert("Severity".into(), json!(severity_word(severity)));
    map.insert("VUID".into(), json!(vuid));

    let objects: Vec<Value> = objects
        .iter()
        .map(|object| {
            let handle = if options.stable_output && crate::object::is_dispatchable(object.object_type)
            {
                String::new()
            } else {
                format!("{:#x}", object.handle)
            };

            json!({
                "Type": crate::object::object_type_name(object.object_type),
                "Handle": handle,
                "Name": object.name.as_deref().unwrap_or(""),
            })
        })
        .collect();
    map.insert("Objects".into(), Value::Array(objects));

    map.insert("MessageID".into(), json!(format!("{:#x}", vuid_hash(vuid))));
    map.insert("Function".into(), json!(location.function.as_str()));
    map.insert("Location".into(), json!(location.fields()));
    map.insert("MainMessage".into(), json!(body));
    map.insert(
        "DebugRegion".into(),
        json!(location.debug_region().unwrap_or("")),
    );

    let (spec_text, spec_url) = match find_spec_text(vuid) {
        Some(entry) if vuid.contains(VUID_MARKER) => {
            let url = if options.verbose {
                entry.url()
            } else {
                String::new()
            };

            (entry.text.to_owned(), url)
        }
        _ => (String::new(), String::new()),
    };
    map.insert("SpecText".into(), json!(spec_text));
    map.insert("SpecUrl".into(), json!(spec_url));

    let value = Value::Object(map);

    // Logcat timestamps every line, so the embedded platform gets the
    // one-line form.
    if cfg!(target_os = "android") {
        value.to_string()
    } else {
        match serde_json::to_string_pretty(&value) {
            Ok(pretty) => pretty,
            Err(_) => value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{render_message, FormatOptions, ResolvedObject};
    use crate::{
        location::Location,
        message::DebugUtilsMessageSeverity,
        vocab::{Field, Func},
        vuid::vuid_hash,
    };

    fn options() -> FormatOptions<'static> {
        FormatOptions {
            json: false,
            verbose: false,
            application_name: None,
            stable_output: false,
        }
    }

    fn command_buffer_object() -> ResolvedObject {
        ResolvedObject {
            object_type: ash::vk::ObjectType::COMMAND_BUFFER,
            handle: 0x7f32_0000_1000,
            name: Some("upload cb".to_owned()),
        }
    }

    #[test]
    fn terse_text_layout() {
        let root = Location::new(Func::vkCmdDraw);

        let rendered = render_message(
            &options(),
            DebugUtilsMessageSeverity::ERROR,
            "UNASSIGNED-CoreValidation-DrawState",
            &[command_buffer_object()],
            &root,
            "draw state is wrong",
        );

        assert_eq!(
            rendered,
            "[ UNASSIGNED-CoreValidation-DrawState ] vkCmdDraw(): draw state is wrong",
        );
    }

    #[test]
    fn verbose_text_layout() {
        let root = Location::new(Func::vkCmdDraw);
        let vuid = "UNASSIGNED-CoreValidation-DrawState";

        let rendered = render_message(
            &FormatOptions {
                verbose: true,
                ..options()
            },
            DebugUtilsMessageSeverity::ERROR,
            vuid,
            &[command_buffer_object()],
            &root,
            "draw state is wrong",
        );

        let expected = format!(
            "{} {}: Error: [ {} ] VkCommandBuffer {:#x}[upload cb] | MessageID = {:#x} |\n\
             vkCmdDraw(): draw state is wrong",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            vuid,
            0x7f32_0000_1000u64,
            vuid_hash(vuid),
        );
        assert_eq!(rendered, expected);
    }

    #[test]
    fn application_name_prefix() {
        let root = Location::new(Func::vkCmdDraw);

        let rendered = render_message(
            &FormatOptions {
                application_name: Some("triangle-demo"),
                ..options()
            },
            DebugUtilsMessageSeverity::WARNING,
            "UNASSIGNED-CoreValidation-DrawState",
            &[],
            &root,
            "draw state is wrong",
        );

        assert!(rendered.starts_with("[triangle-demo] [ UNASSIGNED-"));
    }

    #[test]
    fn spec_text_enrichment() {
        let root = Location::new(Func::vkCmdDraw);

        let rendered = render_message(
            &options(),
            DebugUtilsMessageSeverity::ERROR,
            "VUID-vkCmdDraw-None-02700",
            &[],
            &root,
            "no pipeline is bound",
        );

        // The body gets a closing period and the excerpt follows on its own
        // line; the terse form leaves the link out.
        assert_eq!(
            rendered,
            "[ VUID-vkCmdDraw-None-02700 ] vkCmdDraw(): no pipeline is bound.\n\
             The Vulkan spec states: A valid pipeline must be bound to the pipeline bind point \
             used by this command",
        );

        let verbose = render_message(
            &FormatOptions {
                verbose: true,
                ..options()
            },
            DebugUtilsMessageSeverity::ERROR,
            "VUID-vkCmdDraw-None-02700",
            &[],
            &root,
            "no pipeline is bound",
        );

        assert!(verbose.contains("The Vulkan spec states: "));
        assert!(verbose.contains("vkspec.html#VUID-vkCmdDraw-None-02700)"));
    }

    #[test]
    fn unassigned_identifiers_are_not_enriched() {
        let root = Location::new(Func::vkCmdDraw);

        let rendered = render_message(
            &options(),
            DebugUtilsMessageSeverity::ERROR,
            "UNASSIGNED-CoreValidation-DrawState",
            &[],
            &root,
            "draw state is wrong",
        );

        assert!(!rendered.contains("The Vulkan spec states"));
    }

    #[test]
    fn stable_output_suppresses_volatile_values() {
        let root = Location::new(Func::vkCmdDraw);

        let rendered = render_message(
            &FormatOptions {
                verbose: true,
                stable_output: true,
                ..options()
            },
            DebugUtilsMessageSeverity::ERROR,
            "UNASSIGNED-CoreValidation-DrawState",
            &[command_buffer_object()],
            &root,
            "draw state is wrong",
        );

        assert!(!rendered.starts_with(env!("CARGO_PKG_NAME")));
        assert!(rendered.contains("VkCommandBuffer[upload cb]"));
        assert!(!rendered.contains("0x7f32"));
    }

    #[test]
    fn json_key_order_is_fixed() {
        let root = Location::new(Func::vkQueueSubmit);
        let leaf = root.dot_index(Field::pSubmits, 0);

        let rendered = render_message(
            &FormatOptions {
                json: true,
                application_name: Some("triangle-demo"),
                ..options()
            },
            DebugUtilsMessageSeverity::ERROR,
            "VUID-vkQueueSubmit-fence-00063",
            &[command_buffer_object()],
            &leaf,
            "fence is already signaled",
        );

        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().collect();

        assert_eq!(
            keys,
            [
                "AppName",
                "Severity",
                "VUID",
                "Objects",
                "MessageID",
                "Function",
                "Location",
                "MainMessage",
                "DebugRegion",
                "SpecText",
                "SpecUrl",
            ],
        );

        assert_eq!(value["Severity"], "Error");
        assert_eq!(value["Function"], "vkQueueSubmit");
        assert_eq!(value["Location"], "pSubmits[0]");
        assert_eq!(value["MainMessage"], "fence is already signaled");
        assert_eq!(value["DebugRegion"], "");
        assert_eq!(
            value["SpecText"],
            "If fence is not VK_NULL_HANDLE, fence must be unsignaled",
        );
        assert_eq!(value["SpecUrl"], "");
        assert_eq!(value["Objects"][0]["Type"], "VkCommandBuffer");
        assert_eq!(value["Objects"][0]["Name"], "upload cb");
    }

    #[test]
    fn json_omits_app_name_when_disabled() {
        let root = Location::new(Func::vkCmdDraw);

        let rendered = render_message(
            &FormatOptions {
                json: true,
                ..options()
            },
            DebugUtilsMessageSeverity::ERROR,
            "UNASSIGNED-CoreValidation-DrawState",
            &[],
            &root,
            "draw state is wrong",
        );

        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        let object = value.as_object().unwrap();

        assert!(!object.contains_key("AppName"));
        assert_eq!(
            object.keys().next().map(String::as_str),
            Some("Severity"),
        );
    }

    #[test]
    fn json_escapes_embedded_newlines() {
        let root = Location::new(Func::vkCmdDraw);
        let body = "draw state is wrong:\nno pipeline is bound";

        let rendered = render_message(
            &FormatOptions {
                json: true,
                ..options()
            },
            DebugUtilsMessageSeverity::ERROR,
            "UNASSIGNED-CoreValidation-DrawState",
            &[],
            &root,
            body,
        );

        // The newline survives as the two-character escape; a raw newline
        // inside the string literal would split the record.
        assert!(rendered.contains(r"draw state is wrong:\nno pipeline is bound"));
        assert!(!rendered.contains(body));

        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["MainMessage"], body);
    }

    #[test]
    fn rendering_is_deterministic() {
        let root = Location::new(Func::vkCmdDraw);

        let render = || {
            render_message(
                &FormatOptions {
                    verbose: true,
                    ..options()
                },
                DebugUtilsMessageSeverity::ERROR,
                "VUID-vkCmdDraw-None-02700",
                &[command_buffer_object()],
                &root,
                "no pipeline is bound",
            )
        };

        assert_eq!(render(), render());
    }
}
