//! # Live Preview Build Pipeline
//!
//! Turns a small in-memory project (markup, styles, scripts, JSX/TSX
//! components) into one self-contained document that runs inside a sandboxed
//! frame and reports back over a message bridge.
//!
//! ## Pass Invariants
//!
//! 1. **Best-Effort Resolution**: an import that matches no file is dropped,
//!    never an error.
//! 2. **Dependency Order**: scripts and components are emitted after
//!    everything they import; the entry component goes last unless something
//!    imports it.
//! 3. **Line Retention**: compiled components keep the line layout of their
//!    source, so sandbox line numbers map back to project files.
//! 4. **Failure Isolation**: a component that fails to compile or throws is
//!    reported once and does not affect its neighbours. Only a missing entry
//!    page fails a whole pass.
//! 5. **Sandbox Boundary**: the document talks to the host only through
//!    tagged messages; it cannot navigate the host window.

#[cfg(feature = "napi")]
use napi_derive::napi;

pub mod bridge;
pub mod cache;
pub mod config;
pub mod controller;
pub mod document;
pub mod error;
pub mod files;
pub mod graph;
pub mod jsx_lowerer;
pub mod lint;
pub mod markup;
pub mod pipeline;
pub mod registry;
pub mod resolve;
pub mod runtime;
pub mod snapshot;
pub mod transpile;

#[cfg(test)]
mod lowering_tests;
#[cfg(test)]
mod test_support;

pub use bridge::{BridgeChannel, ConsoleLevel, ErrorDetails, HostMessage, SandboxCommand};
pub use config::{PreviewConfig, RetentionPolicy};
pub use controller::{
    BuildPhase, ConsoleLogEntry, PageEntry, PreviewController, PreviewState, RuntimeErrorEntry,
};
pub use document::{SandboxDocument, SandboxDocumentBuilder};
pub use error::{BridgeError, ConfigError, PreviewError, Result, SnapshotError, TranspileError};
pub use files::{File, FileId, FileKind};
pub use graph::DependencyGraph;
pub use lint::{check_syntax, Severity, SyntaxIssue};
pub use pipeline::{build_document, BuildOutput, BuildReport};
pub use registry::ModuleRegistry;
pub use resolve::PathIndex;
pub use snapshot::Snapshot;

/// Build the document for a snapshot given as JSON
/// (`{version, files, currentPage}`), with an optional JSON config.
#[cfg(feature = "napi")]
#[napi]
pub fn build_preview_native(
    snapshot_json: String,
    config_json: Option<String>,
) -> napi::Result<serde_json::Value> {
    let config = match config_json {
        Some(json) => {
            PreviewConfig::from_json(&json).map_err(|e| napi::Error::from_reason(e.to_string()))?
        }
        None => PreviewConfig::default(),
    };
    let snapshot =
        Snapshot::from_json(&snapshot_json).map_err(|e| napi::Error::from_reason(e.to_string()))?;
    let (files, page) = snapshot.into_files();
    let page = if page.is_empty() {
        config.default_page.clone()
    } else {
        page
    };

    let mut cache = cache::TranspileCache::new();
    let output = build_document(&files, &page, &config, &mut cache)
        .map_err(|e| napi::Error::from_reason(e.to_string()))?;
    Ok(serde_json::json!({
        "html": output.document.html,
        "page": output.page,
        "lineMap": output.document.line_map,
        "report": output.report,
    }))
}

#[cfg(feature = "napi")]
#[napi]
pub fn check_syntax_native(name: String, content: String) -> napi::Result<serde_json::Value> {
    serde_json::to_value(check_syntax(&name, &content))
        .map_err(|e| napi::Error::from_reason(e.to_string()))
}
