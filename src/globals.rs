//! Well-known host globals
//!
//! Names every JavaScript host provides. Editors usually do not want these
//! highlighted as undeclared.

use std::collections::HashSet;

pub const KNOWN_GLOBALS: &[&str] = &[
    // ECMAScript built-ins
    "Array", "ArrayBuffer", "AggregateError", "Atomics", "BigInt", "BigInt64Array",
    "BigUint64Array", "Boolean", "DataView", "Date", "Error", "EvalError",
    "FinalizationRegistry", "Float32Array", "Float64Array", "Function", "Infinity",
    "Int16Array", "Int32Array", "Int8Array", "Intl", "JSON", "Map", "Math", "NaN",
    "Number", "Object", "Promise", "Proxy", "RangeError", "ReferenceError", "Reflect",
    "RegExp", "Set", "SharedArrayBuffer", "String", "Symbol", "SyntaxError", "TypeError",
    "URIError", "Uint16Array", "Uint32Array", "Uint8Array", "Uint8ClampedArray",
    "WeakMap", "WeakRef", "WeakSet", "arguments", "decodeURI", "decodeURIComponent",
    "encodeURI", "encodeURIComponent", "escape", "eval", "globalThis", "isFinite",
    "isNaN", "parseFloat", "parseInt", "undefined", "unescape",
    // Browser and Node hosts
    "Blob", "CustomEvent", "Event", "EventTarget", "FormData", "Headers", "Image",
    "URL", "URLSearchParams", "WebSocket", "Worker", "XMLHttpRequest", "alert",
    "atob", "btoa", "cancelAnimationFrame", "clearInterval", "clearTimeout", "console",
    "document", "fetch", "history", "localStorage", "location", "navigator",
    "performance", "queueMicrotask", "requestAnimationFrame", "sessionStorage",
    "setInterval", "setTimeout", "structuredClone", "window", "Buffer", "global",
    "module", "exports", "process", "require", "__dirname", "__filename",
];

/// Set of names treated as always declared
#[derive(Debug, Clone)]
pub struct KnownGlobals {
    names: HashSet<String>,
}

impl Default for KnownGlobals {
    fn default() -> Self {
        Self::from_names(KNOWN_GLOBALS.iter().copied())
    }
}

impl KnownGlobals {
    /// No known globals at all
    pub fn empty() -> Self {
        Self {
            names: HashSet::new(),
        }
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Built-ins plus additional names (e.g. from configuration)
    pub fn with_extra<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(extra.into_iter().map(Into::into));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_globals() {
        let known = KnownGlobals::default();
        assert!(known.contains("Object"));
        assert!(known.contains("console"));
        assert!(!known.contains("foo"));

        let known = known.with_extra(["foo"]);
        assert!(known.contains("foo"));
        assert!(KnownGlobals::empty().is_empty());
    }
}
