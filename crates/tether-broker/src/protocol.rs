//! Inspector debugger/runtime domain message types.
//!
//! Implements the wire structures the broker exchanges with the target,
//! with serde Serialize/Deserialize support. Lines and columns on the
//! wire are 0-based.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Shared value types
// ---------------------------------------------------------------------------

/// A position within a script, as the target reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireLocation {
    /// The script this location belongs to.
    pub script_id: String,
    /// 0-based line.
    pub line_number: u32,
    /// 0-based column; absent means column 0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_number: Option<u32>,
}

/// A value mirrored from the target's heap.
///
/// The `object_id`, when present, is an opaque handle valid only while
/// the paused snapshot that produced it is current.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    /// Value type: "object", "function", "undefined", "string", ….
    #[serde(rename = "type", default)]
    pub object_type: String,
    /// Object subtype, e.g. "null", "array", "error".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    /// Class name for objects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    /// Primitive value, when representable as JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    /// Textual form of values JSON cannot carry (`NaN`, `-0`, `123n`, …).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unserializable_value: Option<String>,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Opaque handle into the target's heap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
}

/// The argument form accepted by `Debugger.setVariableValue` and calls.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallArgument {
    /// Primitive value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    /// Unserializable primitive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unserializable_value: Option<String>,
    /// Heap object handle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
}

impl CallArgument {
    /// Build the argument that passes an evaluated [`RemoteObject`]
    /// back to the target: by handle when it has one, otherwise by
    /// unserializable form, otherwise by value.
    pub fn from_remote_object(object: &RemoteObject) -> Self {
        if let Some(object_id) = &object.object_id {
            return Self {
                object_id: Some(object_id.clone()),
                ..Self::default()
            };
        }
        if let Some(unserializable) = &object.unserializable_value {
            return Self {
                unserializable_value: Some(unserializable.clone()),
                ..Self::default()
            };
        }
        Self {
            value: Some(object.value.clone().unwrap_or(serde_json::Value::Null)),
            ..Self::default()
        }
    }
}

/// One entry of a call frame's scope chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    /// Scope kind: "global", "local", "closure", "block", ….
    #[serde(rename = "type")]
    pub scope_type: String,
    /// The object holding the scope's bindings.
    pub object: RemoteObject,
    /// Scope name, when the target provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A call frame within a paused snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCallFrame {
    /// Opaque frame handle, valid only for the current pause.
    pub call_frame_id: String,
    /// Name of the executing function; empty for top-level code.
    #[serde(default)]
    pub function_name: String,
    /// Generated position of the execution point.
    pub location: WireLocation,
    /// Scope chain, innermost first.
    #[serde(default)]
    pub scope_chain: Vec<Scope>,
    /// The frame's `this` binding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub this: Option<RemoteObject>,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Parameters of `Debugger.paused`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PausedEvent {
    /// Call frames, innermost first.
    #[serde(default)]
    pub call_frames: Vec<WireCallFrame>,
    /// Why execution stopped: "breakpoint", "exception", "other", ….
    #[serde(default)]
    pub reason: String,
    /// Ids of breakpoints that were hit, when any.
    #[serde(default)]
    pub hit_breakpoints: Option<Vec<String>>,
    /// Asynchronous stack trace, when tracked.
    #[serde(default)]
    pub async_stack_trace: Option<serde_json::Value>,
}

/// Parameters of `Debugger.scriptParsed`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptParsedEvent {
    /// Target-issued script id.
    pub script_id: String,
    /// Script URL; may be empty for eval'd code.
    #[serde(default)]
    pub url: String,
    /// 0-based start line of the script in its resource.
    #[serde(default)]
    pub start_line: u32,
    /// 0-based start column.
    #[serde(default)]
    pub start_column: u32,
    /// 0-based end line.
    #[serde(default)]
    pub end_line: u32,
    /// 0-based end column.
    #[serde(default)]
    pub end_column: u32,
    /// Content hash.
    #[serde(default)]
    pub hash: Option<String>,
    /// Whether the script is an ES module.
    #[serde(default)]
    pub is_module: Option<bool>,
    /// Source-map reference, when the script declares one.
    #[serde(default, rename = "sourceMapURL")]
    pub source_map_url: Option<String>,
}

/// Parameters of `Debugger.breakpointResolved`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakpointResolvedEvent {
    /// The breakpoint that resolved.
    pub breakpoint_id: String,
    /// Where it landed.
    pub location: WireLocation,
}

// ---------------------------------------------------------------------------
// Command results
// ---------------------------------------------------------------------------

/// Result of `Debugger.setBreakpointByUrl`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointByUrlResult {
    /// Target-issued breakpoint id.
    pub breakpoint_id: String,
    /// Locations resolved immediately; more may arrive via events.
    #[serde(default)]
    pub locations: Vec<WireLocation>,
}

/// Exception information attached to an evaluation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
    /// Exception text.
    #[serde(default)]
    pub text: String,
    /// 0-based line of the throw site.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    /// 0-based column of the throw site.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_number: Option<u32>,
    /// The thrown value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<RemoteObject>,
}

/// Result of `Runtime.evaluate` / `Debugger.evaluateOnCallFrame`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResult {
    /// The evaluation result.
    pub result: RemoteObject,
    /// Present when evaluation threw; not an error by itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception_details: Option<ExceptionDetails>,
}

/// One property from `Runtime.getProperties`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    /// Property name.
    pub name: String,
    /// Property value; accessors may carry none.
    #[serde(default)]
    pub value: Option<RemoteObject>,
}

/// Result of `Runtime.getProperties`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPropertiesResult {
    /// Own properties of the queried object.
    #[serde(default)]
    pub result: Vec<PropertyDescriptor>,
}

/// Result of `Debugger.getScriptSource`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetScriptSourceResult {
    /// The script's generated source text.
    pub script_source: String,
}

/// The pause-on-exceptions mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PauseOnExceptionsState {
    /// Never pause on throw.
    None,
    /// Pause on uncaught exceptions only.
    Uncaught,
    /// Pause on every throw.
    All,
}

impl PauseOnExceptionsState {
    /// The wire string for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Uncaught => "uncaught",
            Self::All => "all",
        }
    }
}

impl std::fmt::Display for PauseOnExceptionsState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_location_deserializes_without_column() {
        let loc: WireLocation =
            serde_json::from_value(serde_json::json!({"scriptId": "s-1", "lineNumber": 10}))
                .unwrap();
        assert_eq!(loc.script_id, "s-1");
        assert_eq!(loc.line_number, 10);
        assert!(loc.column_number.is_none());
    }

    #[test]
    fn call_argument_prefers_object_id() {
        let obj = RemoteObject {
            object_type: "object".into(),
            object_id: Some("obj-1".into()),
            unserializable_value: Some("NaN".into()),
            value: Some(serde_json::json!(1)),
            ..Default::default()
        };
        let arg = CallArgument::from_remote_object(&obj);
        assert_eq!(arg.object_id.as_deref(), Some("obj-1"));
        assert!(arg.unserializable_value.is_none());
        assert!(arg.value.is_none());
    }

    #[test]
    fn call_argument_falls_back_to_unserializable() {
        let obj = RemoteObject {
            object_type: "number".into(),
            unserializable_value: Some("NaN".into()),
            ..Default::default()
        };
        let arg = CallArgument::from_remote_object(&obj);
        assert_eq!(arg.unserializable_value.as_deref(), Some("NaN"));
        assert!(arg.object_id.is_none());
    }

    #[test]
    fn call_argument_plain_value() {
        let obj = RemoteObject {
            object_type: "number".into(),
            value: Some(serde_json::json!(42)),
            ..Default::default()
        };
        let arg = CallArgument::from_remote_object(&obj);
        assert_eq!(arg.value, Some(serde_json::json!(42)));
    }

    #[test]
    fn call_argument_undefined_serializes_to_null_value() {
        let obj = RemoteObject {
            object_type: "undefined".into(),
            ..Default::default()
        };
        let arg = CallArgument::from_remote_object(&obj);
        let json = serde_json::to_value(&arg).unwrap();
        assert_eq!(json, serde_json::json!({"value": null}));
    }

    #[test]
    fn paused_event_parses_minimal_frame() {
        let params = serde_json::json!({
            "reason": "breakpoint",
            "hitBreakpoints": ["bp-1"],
            "callFrames": [{
                "callFrameId": "frame-0",
                "functionName": "main",
                "location": {"scriptId": "s-1", "lineNumber": 10, "columnNumber": 0},
                "scopeChain": [
                    {"type": "local", "object": {"type": "object", "objectId": "scope-0"}}
                ],
                "this": {"type": "undefined"}
            }],
        });
        let event: PausedEvent = serde_json::from_value(params).unwrap();
        assert_eq!(event.reason, "breakpoint");
        assert_eq!(event.call_frames.len(), 1);
        let frame = &event.call_frames[0];
        assert_eq!(frame.call_frame_id, "frame-0");
        assert_eq!(frame.scope_chain[0].scope_type, "local");
        assert_eq!(
            frame.scope_chain[0].object.object_id.as_deref(),
            Some("scope-0")
        );
        assert_eq!(event.hit_breakpoints.as_deref(), Some(&["bp-1".to_string()][..]));
    }

    #[test]
    fn script_parsed_event_parses_with_source_map() {
        let params = serde_json::json!({
            "scriptId": "s-1",
            "url": "file:///d/b.js",
            "startLine": 0,
            "startColumn": 0,
            "endLine": 120,
            "endColumn": 0,
            "hash": "abc123",
            "isModule": true,
            "sourceMapURL": "b.js.map",
        });
        let event: ScriptParsedEvent = serde_json::from_value(params).unwrap();
        assert_eq!(event.script_id, "s-1");
        assert_eq!(event.source_map_url.as_deref(), Some("b.js.map"));
        assert_eq!(event.is_module, Some(true));
    }

    #[test]
    fn set_breakpoint_result_parses() {
        let result: SetBreakpointByUrlResult = serde_json::from_value(serde_json::json!({
            "breakpointId": "bp-1",
            "locations": [{"scriptId": "s-1", "lineNumber": 10, "columnNumber": 0}],
        }))
        .unwrap();
        assert_eq!(result.breakpoint_id, "bp-1");
        assert_eq!(result.locations.len(), 1);
    }

    #[test]
    fn evaluate_result_surfaces_exception_details() {
        let result: EvaluateResult = serde_json::from_value(serde_json::json!({
            "result": {"type": "undefined"},
            "exceptionDetails": {"text": "ReferenceError", "lineNumber": 1, "columnNumber": 0},
        }))
        .unwrap();
        let details = result.exception_details.unwrap();
        assert_eq!(details.text, "ReferenceError");
        assert_eq!(details.line_number, Some(1));
    }

    #[test]
    fn get_properties_skippable_values() {
        let result: GetPropertiesResult = serde_json::from_value(serde_json::json!({
            "result": [
                {"name": "x", "value": {"type": "number", "value": 1}},
                {"name": "accessor"},
            ],
        }))
        .unwrap();
        assert_eq!(result.result.len(), 2);
        assert!(result.result[0].value.is_some());
        assert!(result.result[1].value.is_none());
    }

    #[test]
    fn pause_on_exceptions_wire_strings() {
        assert_eq!(
            serde_json::to_value(PauseOnExceptionsState::Uncaught).unwrap(),
            serde_json::json!("uncaught")
        );
        assert_eq!(PauseOnExceptionsState::All.as_str(), "all");
        assert_eq!(PauseOnExceptionsState::None.to_string(), "none");
        let parsed: PauseOnExceptionsState = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(parsed, PauseOnExceptionsState::All);
    }
}
