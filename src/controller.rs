//! # Preview Controller
//!
//! Host-side state machine that decides when to rebuild and keeps the
//! console and runtime-error streams.
//!
//! ## Key Invariants
//!
//! 1. **Phases**: every pass goes `Building → Ready | BuildFailed`; only a
//!    missing entry page fails a pass.
//! 2. **Retention**: a file that leaves the active set is retained (once per
//!    id) and keeps taking part in builds until evicted by policy.
//! 3. **One Schedule**: while auto-refresh is enabled exactly one deadline is
//!    pending; `tick` consumes it and schedules the next.
//! 4. **Fresh Streams**: console and runtime errors are cleared when a pass
//!    starts, so they always describe the current document.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::bridge::{BridgeChannel, ConsoleLevel, ErrorDetails, HostMessage, SandboxCommand};
use crate::cache::TranspileCache;
use crate::config::{PreviewConfig, RetentionPolicy};
use crate::document::SandboxDocument;
use crate::error::{BridgeError, ConfigError, PreviewError};
use crate::files::{merge_with_retained, File, FileKind};
use crate::lint::{self, SyntaxIssue};
use crate::pipeline::{build_document, BuildOutput, BuildReport};
use crate::snapshot::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BuildPhase {
    #[default]
    Idle,
    Building,
    Ready,
    BuildFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewState {
    pub current_page: String,
    pub auto_refresh: bool,
    pub full_screen: bool,
    pub phase: BuildPhase,
    pub last_error: Option<String>,
    pub spa_mode: bool,
    pub spa_path: String,
    pub bridge_attached: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleLogEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub level: ConsoleLevel,
    pub message: String,
}

/// Project file and line a document line maps back to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub path: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeErrorEntry {
    pub message: String,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub stack: Option<String>,
    pub source: Option<SourceLocation>,
}

/// Entry of the page selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEntry {
    pub name: String,
    /// Deleted from the project but still previewable.
    pub retained: bool,
}

pub struct PreviewController {
    config: PreviewConfig,
    active: Vec<File>,
    retained: Vec<File>,
    state: PreviewState,
    document: Option<SandboxDocument>,
    report: Option<BuildReport>,
    console: Vec<ConsoleLogEntry>,
    runtime_errors: Vec<RuntimeErrorEntry>,
    cache: TranspileCache,
    next_refresh: Option<DateTime<Utc>>,
    outbox: BridgeChannel<SandboxCommand>,
}

impl PreviewController {
    pub fn new(config: PreviewConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = PreviewState {
            current_page: config.default_page.clone(),
            auto_refresh: false,
            full_screen: false,
            phase: BuildPhase::Idle,
            last_error: None,
            spa_mode: false,
            spa_path: "/".to_string(),
            bridge_attached: true,
        };
        Ok(Self {
            config,
            active: Vec::new(),
            retained: Vec::new(),
            state,
            document: None,
            report: None,
            console: Vec::new(),
            runtime_errors: Vec::new(),
            cache: TranspileCache::new(),
            next_refresh: None,
            outbox: BridgeChannel::new(),
        })
    }

    // ───────────────────────────────────────────────────────────────────────
    // Accessors
    // ───────────────────────────────────────────────────────────────────────

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    pub fn state(&self) -> &PreviewState {
        &self.state
    }

    pub fn document(&self) -> Option<&SandboxDocument> {
        self.document.as_ref()
    }

    pub fn report(&self) -> Option<&BuildReport> {
        self.report.as_ref()
    }

    pub fn console(&self) -> &[ConsoleLogEntry] {
        &self.console
    }

    pub fn runtime_errors(&self) -> &[RuntimeErrorEntry] {
        &self.runtime_errors
    }

    pub fn files(&self) -> &[File] {
        &self.active
    }

    pub fn retained(&self) -> &[File] {
        &self.retained
    }

    pub fn next_refresh(&self) -> Option<DateTime<Utc>> {
        self.next_refresh
    }

    // ───────────────────────────────────────────────────────────────────────
    // Triggers
    // ───────────────────────────────────────────────────────────────────────

    /// Replace the active file set and rebuild.
    pub fn set_files(&mut self, files: Vec<File>) -> Result<(), PreviewError> {
        let removed: Vec<File> = self
            .active
            .iter()
            .filter(|old| !files.iter().any(|f| f.id == old.id))
            .cloned()
            .collect();
        for file in removed {
            tracing::debug!(file = %file.display_path(), "retaining removed file");
            match self.retained.iter_mut().find(|r| r.id == file.id) {
                Some(existing) => *existing = file,
                None => self.retained.push(file),
            }
        }
        self.active = files;
        self.ensure_current_page();
        self.rebuild()
    }

    pub fn set_current_page(&mut self, page: &str) -> Result<(), PreviewError> {
        self.state.current_page = page.to_string();
        self.rebuild()
    }

    pub fn refresh(&mut self) -> Result<(), PreviewError> {
        self.rebuild()
    }

    /// Enable or disable the auto-refresh timer. Enabling schedules the first
    /// refresh one interval after `now`.
    pub fn set_auto_refresh(&mut self, enabled: bool, now: DateTime<Utc>) {
        self.state.auto_refresh = enabled;
        self.next_refresh = enabled.then(|| now + self.interval());
    }

    /// Poll the auto-refresh timer. Returns true when a refresh ran.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        match self.next_refresh {
            Some(deadline) if self.state.auto_refresh && now >= deadline => {
                self.next_refresh = Some(now + self.interval());
                if let Err(e) = self.rebuild() {
                    tracing::debug!(error = %e, "auto-refresh failed");
                }
                true
            }
            _ => false,
        }
    }

    fn interval(&self) -> Duration {
        Duration::milliseconds(self.config.auto_refresh_interval_ms as i64)
    }

    pub fn toggle_full_screen(&mut self) -> bool {
        self.state.full_screen = !self.state.full_screen;
        self.state.full_screen
    }

    /// Run one build pass over active and retained files.
    pub fn rebuild(&mut self) -> Result<(), PreviewError> {
        self.state.phase = BuildPhase::Building;
        self.console.clear();
        self.runtime_errors.clear();

        let files = merge_with_retained(&self.active, &self.retained);
        let result = build_document(&files, &self.state.current_page, &self.config, &mut self.cache);
        match result {
            Ok(output) => {
                self.finish_build(output);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "build pass failed");
                self.state.phase = BuildPhase::BuildFailed;
                self.state.last_error = Some(err.to_string());
                self.document = None;
                self.report = None;
                if matches!(err, PreviewError::EntryNotFound { .. }) {
                    self.log(ConsoleLevel::Error, "No HTML file found for preview");
                } else {
                    self.log(ConsoleLevel::Error, &err.to_string());
                }
                Err(err)
            }
        }
    }

    fn finish_build(&mut self, output: BuildOutput) {
        if !output.page.is_empty() {
            self.state.current_page = output.page.clone();
        }
        for warning in &output.report.warnings {
            self.log(ConsoleLevel::Warning, warning);
        }
        if !self.state.auto_refresh && !output.page.is_empty() {
            self.log(ConsoleLevel::Success, &format!("Preview updated: {}", output.page));
        }
        if self.config.retention == RetentionPolicy::EvictUnreferenced {
            self.evict_unreferenced(&output);
        }
        self.state.phase = BuildPhase::Ready;
        self.state.last_error = None;
        self.document = Some(output.document);
        self.report = Some(output.report);
    }

    /// Drop retained files that are neither the current page nor reachable
    /// from an active file.
    fn evict_unreferenced(&mut self, output: &BuildOutput) {
        let mut reachable = BTreeSet::new();
        for file in &self.active {
            reachable.extend(output.graph.transitive_dependencies(&file.canonical_path()));
        }
        let current = &self.state.current_page;
        let before = self.retained.len();
        self.retained.retain(|file| {
            let active_shadow = self.active.iter().any(|a| a.id == file.id);
            !active_shadow && (&file.name == current || reachable.contains(&file.canonical_path()))
        });
        if self.retained.len() != before {
            tracing::debug!(evicted = before - self.retained.len(), "evicted retained files");
        }
    }

    /// Switch to the first markup file when the current page is gone from
    /// both the active and the retained set.
    fn ensure_current_page(&mut self) {
        let exists = self
            .active
            .iter()
            .chain(self.retained.iter())
            .any(|f| f.kind() == FileKind::Markup && f.name == self.state.current_page);
        if exists {
            return;
        }
        if let Some(first) = self
            .active
            .iter()
            .chain(self.retained.iter())
            .find(|f| f.kind() == FileKind::Markup)
        {
            self.state.current_page = first.name.clone();
        }
    }

    // ───────────────────────────────────────────────────────────────────────
    // Bridge
    // ───────────────────────────────────────────────────────────────────────

    /// Handle a message posted by the sandbox. Returns false when it was
    /// ignored (bridge detached or unrecognized envelope).
    pub fn handle_message(&mut self, message: &Value) -> bool {
        if !self.state.bridge_attached {
            return false;
        }
        let message = match HostMessage::decode(message) {
            Ok(message) => message,
            Err(BridgeError::Unrecognized { source_tag }) => {
                tracing::debug!(source_tag = %source_tag, "ignoring unrecognized message");
                return false;
            }
            Err(e) => {
                tracing::debug!(error = %e, "ignoring malformed message");
                return false;
            }
        };

        match message {
            HostMessage::Console {
                level: ConsoleLevel::Clear,
                ..
            } => self.console.clear(),
            HostMessage::Console {
                level,
                text,
                details,
            } => match details {
                Some(details) => self.record_runtime_error(level, &text, details),
                None => self.log(level, &text),
            },
            HostMessage::NavigatePage { page } => {
                self.state.spa_mode = false;
                self.state.spa_path = "/".to_string();
                self.state.current_page = page.clone();
                if let Err(e) = self.rebuild() {
                    tracing::debug!(error = %e, "navigation rebuild failed");
                }
                self.log(ConsoleLevel::Info, &format!("Navigating to: {}", page));
            }
            HostMessage::NavigatePath { path } => {
                self.state.spa_mode = true;
                self.log(ConsoleLevel::Info, &format!("SPA navigation to: {}", path));
                self.state.spa_path = path;
            }
        }
        true
    }

    fn record_runtime_error(&mut self, level: ConsoleLevel, text: &str, details: ErrorDetails) {
        let message = match (&details.filename, details.lineno, details.colno) {
            (Some(file), Some(line), Some(col)) => format!("{} ({}:{}:{})", text, file, line, col),
            _ => text.to_string(),
        };
        self.log(level, &message);

        let source = details.lineno.and_then(|line| {
            self.document
                .as_ref()
                .and_then(|doc| doc.locate(line as usize))
                .map(|(path, line)| SourceLocation {
                    path: path.to_string(),
                    line,
                })
        });
        self.runtime_errors.push(RuntimeErrorEntry {
            message: details.message,
            file: details.filename,
            line: details.lineno,
            column: details.colno,
            stack: details.stack,
            source,
        });
    }

    /// Queue a navigation command for the sandbox.
    pub fn navigate_sandbox(&mut self, command: SandboxCommand) -> bool {
        self.outbox.send(command)
    }

    /// Commands waiting to be posted into the sandbox, oldest first.
    pub fn take_outbox(&mut self) -> Vec<SandboxCommand> {
        self.outbox.drain()
    }

    pub fn attach_bridge(&mut self) {
        self.state.bridge_attached = true;
        self.outbox.reopen();
    }

    /// Stop the timer and detach the bridge.
    pub fn teardown(&mut self) {
        self.state.auto_refresh = false;
        self.next_refresh = None;
        self.state.bridge_attached = false;
        self.outbox.close();
    }

    // ───────────────────────────────────────────────────────────────────────
    // Console
    // ───────────────────────────────────────────────────────────────────────

    fn log(&mut self, level: ConsoleLevel, message: &str) {
        self.console.push(ConsoleLogEntry {
            timestamp: Utc::now(),
            level,
            message: message.to_string(),
        });
    }

    pub fn clear_console(&mut self) {
        self.console.clear();
        self.runtime_errors.clear();
    }

    // ───────────────────────────────────────────────────────────────────────
    // Pages, problems, sharing
    // ───────────────────────────────────────────────────────────────────────

    /// Markup pages for the page selector: active ones first, then retained
    /// ones that no active page shadows.
    pub fn page_list(&self) -> Vec<PageEntry> {
        let mut pages: Vec<PageEntry> = self
            .active
            .iter()
            .filter(|f| f.kind() == FileKind::Markup)
            .map(|f| PageEntry {
                name: f.name.clone(),
                retained: false,
            })
            .collect();
        for file in self.retained.iter().filter(|f| f.kind() == FileKind::Markup) {
            if !pages.iter().any(|p| p.name == file.name) {
                pages.push(PageEntry {
                    name: file.name.clone(),
                    retained: true,
                });
            }
        }
        pages
    }

    /// Syntax issues across the active files.
    pub fn problems(&self) -> Vec<SyntaxIssue> {
        self.active.iter().flat_map(lint::check_file).collect()
    }

    pub fn share_url(&self, origin: &str) -> Result<String, PreviewError> {
        let files = merge_with_retained(&self.active, &self.retained);
        let snapshot = Snapshot::capture(&files, &self.state.current_page);
        Ok(snapshot.share_url(origin, &self.config.share_path)?)
    }

    /// Replace the project with a decoded snapshot and build it.
    pub fn load_snapshot(&mut self, snapshot: Snapshot) -> Result<(), PreviewError> {
        let (files, page) = snapshot.into_files();
        self.active = files;
        self.retained.clear();
        if !page.is_empty() {
            self.state.current_page = page;
        }
        self.ensure_current_page();
        self.rebuild()
    }

    pub fn load_share_url(&mut self, url: &str) -> Result<(), PreviewError> {
        let snapshot = Snapshot::from_share_url(url, &self.config.share_path)?;
        self.load_snapshot(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::init_tracing;
    use serde_json::json;

    fn project() -> Vec<File> {
        vec![
            File::new("1", "index.html", "/", "<div id=\"app\"></div>"),
            File::new("2", "about.html", "/", "<h1>About</h1>"),
            File::new(
                "3",
                "App.jsx",
                "/",
                "export default function App() { return <h1>Hello</h1>; }",
            ),
        ]
    }

    fn controller() -> PreviewController {
        init_tracing();
        let mut c = PreviewController::new(PreviewConfig::default()).unwrap();
        c.set_files(project()).unwrap();
        c
    }

    fn messages(c: &PreviewController) -> Vec<String> {
        c.console().iter().map(|e| e.message.clone()).collect()
    }

    #[test]
    fn test_initial_build() {
        let c = controller();
        assert_eq!(c.state().phase, BuildPhase::Ready);
        assert_eq!(c.state().current_page, "index.html");
        assert!(messages(&c).contains(&"Preview updated: index.html".to_string()));
        assert!(c.document().unwrap().html.contains("Hello"));
    }

    #[test]
    fn test_removed_files_are_retained_once() {
        let mut c = controller();
        let without_about: Vec<File> = project().into_iter().filter(|f| f.id.0 != "2").collect();
        c.set_files(without_about.clone()).unwrap();
        c.set_files(without_about).unwrap();
        assert_eq!(c.retained().len(), 1);
        assert_eq!(
            c.page_list(),
            vec![
                PageEntry { name: "index.html".to_string(), retained: false },
                PageEntry { name: "about.html".to_string(), retained: true },
            ]
        );
    }

    #[test]
    fn test_removed_current_page_still_builds() {
        let mut c = controller();
        c.set_current_page("about.html").unwrap();
        let without_about: Vec<File> = project().into_iter().filter(|f| f.id.0 != "2").collect();
        c.set_files(without_about).unwrap();
        assert_eq!(c.state().current_page, "about.html");
        assert_eq!(c.document().unwrap().page, "about.html");
        assert!(c.document().unwrap().html.contains("<h1>About</h1>"));
    }

    #[test]
    fn test_entry_not_found() {
        let mut c = PreviewController::new(PreviewConfig::default()).unwrap();
        let err = c
            .set_files(vec![File::new("1", "App.jsx", "/", "export default 1;")])
            .unwrap_err();
        assert!(matches!(err, PreviewError::EntryNotFound { .. }));
        assert_eq!(c.state().phase, BuildPhase::BuildFailed);
        assert!(c.document().is_none());
        assert_eq!(messages(&c), vec!["No HTML file found for preview"]);
        assert_eq!(c.console()[0].level, ConsoleLevel::Error);
    }

    #[test]
    fn test_auto_refresh_schedule() {
        let mut c = controller();
        let t0 = Utc::now();
        assert!(!c.tick(t0 + Duration::seconds(10)));

        c.set_auto_refresh(true, t0);
        assert_eq!(c.next_refresh(), Some(t0 + Duration::milliseconds(3000)));
        assert!(!c.tick(t0 + Duration::milliseconds(2999)));
        assert!(c.tick(t0 + Duration::milliseconds(3000)));
        assert!(!c.tick(t0 + Duration::milliseconds(3001)));
        assert_eq!(c.next_refresh(), Some(t0 + Duration::milliseconds(6000)));
        assert!(!messages(&c).iter().any(|m| m.starts_with("Preview updated")));

        c.set_auto_refresh(false, t0);
        assert_eq!(c.next_refresh(), None);
        assert!(!c.tick(t0 + Duration::seconds(60)));
    }

    #[test]
    fn test_console_and_runtime_errors() {
        let mut c = controller();
        assert!(c.handle_message(&json!({
            "source": "preview-console", "type": "log", "args": "hi there"
        })));
        assert!(messages(&c).contains(&"hi there".to_string()));

        assert!(c.handle_message(&json!({
            "source": "preview-console",
            "type": "error",
            "args": "x is not defined",
            "errorDetails": {"message": "x is not defined", "filename": "about:srcdoc", "lineno": 3, "colno": 9}
        })));
        assert!(messages(&c).contains(&"x is not defined (about:srcdoc:3:9)".to_string()));
        assert_eq!(c.runtime_errors().len(), 1);
        assert_eq!(c.runtime_errors()[0].line, Some(3));

        assert!(c.handle_message(&json!({"source": "preview-console", "type": "clear"})));
        assert!(c.console().is_empty());

        assert!(!c.handle_message(&json!({"source": "react-devtools", "hello": 1})));
    }

    #[test]
    fn test_runtime_error_maps_to_source() {
        let mut c = controller();
        let span = c
            .document()
            .unwrap()
            .line_map
            .iter()
            .find(|s| s.path == "App.jsx")
            .unwrap()
            .clone();
        c.handle_message(&json!({
            "source": "preview-console",
            "type": "error",
            "args": "boom",
            "errorDetails": {"message": "boom", "lineno": span.first_line, "colno": 1}
        }));
        assert_eq!(
            c.runtime_errors()[0].source,
            Some(SourceLocation { path: "App.jsx".to_string(), line: 1 })
        );
    }

    #[test]
    fn test_throwing_component_reports_one_located_error() {
        let mut c = PreviewController::new(PreviewConfig::default()).unwrap();
        c.set_files(vec![
            File::new("1", "index.html", "/", "<div id=\"app\"></div>"),
            File::new(
                "2",
                "Thrower.jsx",
                "/",
                "export default function Thrower() { return null; }\nconst broken = undefinedThing.value;\n",
            ),
            File::new("3", "App.jsx", "/", "export default function App() { return <p>ok</p>; }"),
        ])
        .unwrap();
        let span = c
            .document()
            .unwrap()
            .line_map
            .iter()
            .find(|s| s.path == "Thrower.jsx")
            .unwrap()
            .clone();
        let before = c.console().len();

        assert!(c.handle_message(&json!({
            "source": "preview-console",
            "type": "error",
            "args": "Error in Thrower.jsx: ReferenceError: undefinedThing is not defined",
            "errorDetails": {
                "message": "undefinedThing is not defined",
                "filename": "about:srcdoc",
                "lineno": span.first_line + 1,
                "colno": 16
            }
        })));

        assert_eq!(c.console().len(), before + 1);
        assert_eq!(
            messages(&c)
                .iter()
                .filter(|m| m.starts_with("Error in Thrower.jsx"))
                .count(),
            1
        );
        assert_eq!(c.runtime_errors().len(), 1);
        assert_eq!(
            c.runtime_errors()[0].source,
            Some(SourceLocation { path: "Thrower.jsx".to_string(), line: 2 })
        );
        assert_eq!(c.state().phase, BuildPhase::Ready);
    }

    #[test]
    fn test_navigation() {
        let mut c = controller();
        c.handle_message(&json!({"source": "preview-navigation", "action": "navigate", "path": "/users"}));
        assert!(c.state().spa_mode);
        assert_eq!(c.state().spa_path, "/users");
        assert!(messages(&c).contains(&"SPA navigation to: /users".to_string()));

        c.handle_message(&json!({"source": "preview-navigation", "action": "navigate", "page": "about.html"}));
        assert!(!c.state().spa_mode);
        assert_eq!(c.state().current_page, "about.html");
        assert_eq!(c.document().unwrap().page, "about.html");
        assert!(messages(&c).contains(&"Navigating to: about.html".to_string()));
    }

    #[test]
    fn test_teardown_detaches() {
        let mut c = controller();
        c.set_auto_refresh(true, Utc::now());
        assert!(c.navigate_sandbox(SandboxCommand::NavigatePath("/a".to_string())));
        assert_eq!(c.take_outbox(), vec![SandboxCommand::NavigatePath("/a".to_string())]);

        c.teardown();
        assert_eq!(c.next_refresh(), None);
        assert!(!c.state().bridge_attached);
        assert!(!c.navigate_sandbox(SandboxCommand::NavigatePath("/b".to_string())));
        assert!(!c.handle_message(&json!({"source": "preview-console", "type": "log", "args": "late"})));
    }

    #[test]
    fn test_eviction_policy() {
        let config = PreviewConfig {
            retention: RetentionPolicy::EvictUnreferenced,
            ..PreviewConfig::default()
        };
        let mut c = PreviewController::new(config).unwrap();
        let mut files = project();
        files.push(File::new("4", "Card.jsx", "/", "export default () => <div/>;"));
        files.push(File::new("5", "old.css", "/", "p {}"));
        files[2].content =
            "import Card from './Card';\nexport default function App() { return <Card />; }".to_string();
        c.set_files(files.clone()).unwrap();

        let kept: Vec<File> = files
            .into_iter()
            .filter(|f| f.id.0 != "4" && f.id.0 != "5")
            .collect();
        c.set_files(kept).unwrap();
        let retained: Vec<&str> = c.retained().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(retained, vec!["Card.jsx"]);
    }

    #[test]
    fn test_share_and_load() {
        let c = controller();
        let url = c.share_url("https://play.example.com").unwrap();
        let mut other = PreviewController::new(PreviewConfig::default()).unwrap();
        other.load_share_url(&url).unwrap();
        assert_eq!(other.files().len(), 3);
        assert_eq!(other.state().current_page, "index.html");
        assert_eq!(other.state().phase, BuildPhase::Ready);
    }

    #[test]
    fn test_problems_and_full_screen() {
        let mut c = controller();
        assert!(c.problems().is_empty());
        let mut files = project();
        files.push(File::new("9", "broken.css", "/", "a {"));
        c.set_files(files).unwrap();
        assert_eq!(c.problems().len(), 1);
        assert!(c.toggle_full_screen());
        assert!(!c.toggle_full_screen());
    }
}
