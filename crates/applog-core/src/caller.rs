//! Call-site attribution by stack walking
//!
//! Records emitted on behalf of the database layer cannot use
//! `#[track_caller]`: the statement is reported from deep inside the access
//! layer. Instead the stack is walked outwards from here and the first frame
//! that belongs to neither this crate, the access layer, the SQLite driver,
//! the logging engine nor the standard library is taken as the call site.

use crate::encoder::short_caller;

/// Frames inspected before giving up
pub const MAX_FRAMES: usize = 64;

/// Dependencies whose frames are never a call site
///
/// Matched against a path component of the form `<name>-<version>`, which is
/// how Cargo unpacks registry sources.
const INTERNAL_CRATES: &[&str] = &[
    "rusqlite",
    "libsqlite3-sys",
    "tracing",
    "tracing-core",
    "tracing-subscriber",
    "tracing-log",
    "tracing-attributes",
    "backtrace",
];

/// Prefixes of standard library sources, remapped and from `rust-src`
const RUNTIME_PREFIXES: &[&str] = &["/rustc/"];
const RUNTIME_MARKERS: &[&str] = &["/rustlib/src/rust/library/"];

/// Source location of a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub file: String,
    pub line: u32,
}

impl CallSite {
    /// `dir/file.rs:line`
    pub fn short(&self) -> String {
        short_caller(&self.file, self.line)
    }
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

fn is_crate_dir(component: &str, name: &str) -> bool {
    component
        .strip_prefix(name)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|version| version.starts_with(|c: char| c.is_ascii_digit()))
}

fn is_dependency(file: &str) -> bool {
    file.split('/')
        .any(|component| INTERNAL_CRATES.iter().any(|name| is_crate_dir(component, name)))
}

fn is_runtime(file: &str) -> bool {
    RUNTIME_PREFIXES.iter().any(|p| file.starts_with(p))
        || RUNTIME_MARKERS.iter().any(|m| file.contains(m))
}

// Absolute as recorded in debug info, plus the workspace-relative form for
// binaries built with remapped paths.
fn own_source_dirs() -> Vec<String> {
    vec![
        normalize(concat!(env!("CARGO_MANIFEST_DIR"), "/src/")),
        concat!("/", env!("CARGO_PKG_NAME"), "/src/").to_string(),
    ]
}

/// Decides which frames are internal to the logging path
#[derive(Debug, Clone)]
pub struct FrameFilter {
    own_dirs: Vec<String>,
    internal: Vec<String>,
}

impl Default for FrameFilter {
    fn default() -> Self {
        Self {
            own_dirs: own_source_dirs(),
            internal: vec![
                normalize(applog_db::source_dir()),
                "/applog-db/src/".to_string(),
            ],
        }
    }
}

impl FrameFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also treat frames whose path contains `marker` as internal
    pub fn skip_path(mut self, marker: impl Into<String>) -> Self {
        self.internal.push(normalize(&marker.into()));
        self
    }

    /// Frame belongs to this crate
    pub fn is_own(&self, file: &str) -> bool {
        let file = normalize(file);
        self.own_dirs.iter().any(|d| file.contains(d.as_str()))
    }

    /// Frame belongs to this crate or any other internal component
    pub fn is_internal(&self, file: &str) -> bool {
        if self.is_own(file) {
            return true;
        }
        let file = normalize(file);
        is_runtime(&file)
            || is_dependency(&file)
            || self.internal.iter().any(|m| file.contains(m.as_str()))
    }
}

/// Walk the current stack and return the first external frame
///
/// Frames are skipped until one inside this crate has been seen, so the
/// walker's own machinery never qualifies. Inlined frames are considered in
/// innermost-first order. Returns `None` when no qualifying frame exists within
/// `MAX_FRAMES` frames or the binary carries no debug info.
pub fn find_call_site(filter: &FrameFilter) -> Option<CallSite> {
    let mut entered = false;
    let mut visited = 0usize;
    let mut found: Option<CallSite> = None;

    backtrace::trace(|frame| {
        visited += 1;
        backtrace::resolve_frame(frame, |symbol| {
            if found.is_some() {
                return;
            }
            let (Some(path), Some(line)) = (symbol.filename(), symbol.lineno()) else {
                return;
            };
            let file = normalize(&path.to_string_lossy());
            if filter.is_own(&file) {
                entered = true;
            } else if entered && !filter.is_internal(&file) {
                found = Some(CallSite { file, line });
            }
        });
        found.is_none() && visited < MAX_FRAMES
    });

    found
}

struct StackRow {
    name: String,
    file: Option<String>,
    line: Option<u32>,
}

impl StackRow {
    fn render(&self) -> String {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => format!("{}\n\t{}:{}", self.name, file, line),
            (Some(file), None) => format!("{}\n\t{}", self.name, file),
            _ => self.name.clone(),
        }
    }
}

/// Render the current stack for a record, outermost caller last
///
/// The walker and the leading frames of this crate (with the runtime frames
/// interleaved with them) are dropped, so the trace starts where the logging
/// call was made. Without resolvable frames of this crate the whole stack is
/// rendered.
pub fn capture_stack(filter: &FrameFilter) -> String {
    let mut rows = Vec::new();
    backtrace::trace(|frame| {
        backtrace::resolve_frame(frame, |symbol| {
            rows.push(StackRow {
                name: symbol
                    .name()
                    .map_or_else(|| "<unknown>".to_string(), |name| format!("{:#}", name)),
                file: symbol.filename().map(|p| normalize(&p.to_string_lossy())),
                line: symbol.lineno(),
            });
        });
        true
    });
    render_stack(filter, &rows)
}

fn render_stack(filter: &FrameFilter, rows: &[StackRow]) -> String {
    let leading = |row: &StackRow| {
        row.file
            .as_deref()
            .is_some_and(|file| filter.is_own(file) || is_runtime(file))
    };
    let own = |row: &StackRow| row.file.as_deref().is_some_and(|file| filter.is_own(file));

    let start = match rows.iter().position(own) {
        Some(first) => rows[first..]
            .iter()
            .position(|row| !leading(row))
            .map_or(first, |n| first + n),
        None => 0,
    };
    rows[start..]
        .iter()
        .map(StackRow::render)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_own_sources_are_internal() {
        let filter = FrameFilter::new();
        let file = concat!(env!("CARGO_MANIFEST_DIR"), "/src/logger.rs");
        assert!(filter.is_own(file));
        assert!(filter.is_internal(file));
    }

    #[test]
    fn test_own_tests_are_external() {
        let filter = FrameFilter::new();
        let file = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/logger_tests.rs");
        assert!(!filter.is_own(file));
        assert!(!filter.is_internal(file));
    }

    #[test]
    fn test_access_layer_is_internal() {
        let filter = FrameFilter::new();
        let file = format!("{}db.rs", applog_db::source_dir());
        assert!(filter.is_internal(&file));
        assert!(!filter.is_own(&file));
    }

    #[test]
    fn test_driver_and_std_are_internal() {
        let filter = FrameFilter::new();
        assert!(filter.is_internal(
            "/home/u/.cargo/registry/src/index.crates.io-6f17d22bba15001f/rusqlite-0.29.0/src/lib.rs"
        ));
        assert!(filter.is_internal(
            "/home/u/.cargo/registry/src/index.crates.io-6f17d22bba15001f/tracing-core-0.1.32/src/dispatcher.rs"
        ));
        assert!(filter.is_internal("/rustc/90b35a6/library/std/src/thread/mod.rs"));
        assert!(!filter.is_internal("/srv/app/src/handlers/orders.rs"));
    }

    #[test]
    fn test_projects_named_like_dependencies_are_external() {
        let filter = FrameFilter::new();
        assert!(!filter.is_internal("/home/dev/tracing-demo/src/handlers/orders.rs"));
        assert!(!filter.is_internal("/srv/backtrace-viewer/src/main.rs"));
        assert!(!filter.is_internal("/srv/rusqlite-tools/src/lib.rs"));
        assert!(!filter.is_internal("/home/rustc/app/src/main.rs"));
        assert!(filter.is_internal(
            "/home/u/.cargo/registry/src/index.crates.io-6f17d22bba15001f/backtrace-0.3.69/src/lib.rs"
        ));
    }

    #[test]
    fn test_crate_dir_needs_version_suffix() {
        assert!(is_crate_dir("tracing-0.1.40", "tracing"));
        assert!(is_crate_dir("tracing-subscriber-0.3.18", "tracing-subscriber"));
        assert!(!is_crate_dir("tracing-subscriber-0.3.18", "tracing"));
        assert!(!is_crate_dir("tracing-demo", "tracing"));
        assert!(!is_crate_dir("tracing", "tracing"));
    }

    #[test]
    fn test_skip_path_extends_markers() {
        let filter = FrameFilter::new().skip_path("src/repository/");
        assert!(filter.is_internal("/srv/app/src/repository/orders.rs"));
        assert!(!filter.is_internal("/srv/app/src/handlers/orders.rs"));
    }

    #[test]
    fn test_windows_separators_are_normalized() {
        let filter = FrameFilter::new().skip_path("src\\repository\\");
        assert!(filter.is_internal("C:\\srv\\app\\src\\repository\\orders.rs"));
    }

    #[test]
    fn test_call_site_short_form() {
        let site = CallSite {
            file: "/srv/app/src/handlers/orders.rs".to_string(),
            line: 12,
        };
        assert_eq!(site.short(), "handlers/orders.rs:12");
    }

    fn row(name: &str, file: &str) -> StackRow {
        StackRow {
            name: name.to_string(),
            file: Some(file.to_string()),
            line: Some(7),
        }
    }

    #[test]
    fn test_stack_starts_past_own_frames() {
        let own = concat!(env!("CARGO_MANIFEST_DIR"), "/src/logger.rs");
        let rows = vec![
            row(
                "backtrace::trace",
                "/home/u/.cargo/registry/src/index.crates.io-6f17d22bba15001f/backtrace-0.3.69/src/lib.rs",
            ),
            row("applog_core::caller::capture_stack", own),
            row("applog_core::logger::Logger::emit::{{closure}}", own),
            row("core::bool::<impl bool>::then", "/rustc/90b35a6/library/core/src/bool.rs"),
            row("applog_core::logger::Logger::emit", own),
            row("app::handlers::create_order", "/srv/app/src/handlers/orders.rs"),
            row("app::main", "/srv/app/src/main.rs"),
        ];

        let rendered = render_stack(&FrameFilter::new(), &rows);
        assert!(rendered.starts_with("app::handlers::create_order\n\t/srv/app/src/handlers/orders.rs:7"));
        assert!(!rendered.contains("applog_core"));
        assert!(rendered.ends_with("/srv/app/src/main.rs:7"));
    }

    #[test]
    fn test_stack_without_own_frames_is_kept_whole() {
        let rows = vec![
            row("app::handlers::create_order", "/srv/app/src/handlers/orders.rs"),
            StackRow {
                name: "start".to_string(),
                file: None,
                line: None,
            },
        ];
        assert_eq!(
            render_stack(&FrameFilter::new(), &rows),
            "app::handlers::create_order\n\t/srv/app/src/handlers/orders.rs:7\nstart"
        );
    }
}
