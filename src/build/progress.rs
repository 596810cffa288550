//! Pipeline progress reporting.
//!
//! The runner emits [`ProgressEvent`]s as it walks a pipeline. Reporters
//! render them for people (console, with optional colors) or machines
//! (one JSON object per line).

use serde_json::json;
use std::io::Write;
use std::sync::Mutex;

/// Status of a step in progress events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    /// Step succeeded
    Success,
    /// Step failed with diagnostics
    Failed(String),
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepStatus::Success => write!(f, "success"),
            StepStatus::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}

/// Events reported while a pipeline runs.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Pipeline run started
    PipelineStarted {
        /// Pipeline name or ad-hoc label
        pipeline: String,
        /// Number of steps after alias expansion
        total_steps: usize,
    },
    /// A step started
    StepStarted {
        /// `task:target` identifier
        task_id: String,
        /// 1-based position in the pipeline
        index: usize,
    },
    /// A step completed
    StepCompleted {
        /// `task:target` identifier
        task_id: String,
        /// Step status
        status: StepStatus,
        /// Duration in milliseconds
        duration_ms: u64,
    },
    /// Pipeline run completed
    PipelineCompleted {
        /// Pipeline name or ad-hoc label
        pipeline: String,
        /// Whether every step succeeded
        success: bool,
        /// Number of steps that ran
        completed: usize,
        /// Total duration in milliseconds
        duration_ms: u64,
    },
    /// A warning was generated
    Warning {
        /// Step that generated the warning (if applicable)
        task_id: Option<String>,
        /// Warning message
        message: String,
    },
}

/// Trait for progress reporters.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event.
    fn report(&self, event: ProgressEvent);

    /// Check if this reporter wants verbose output.
    fn is_verbose(&self) -> bool {
        false
    }
}

/// A progress reporter that discards all events.
#[derive(Debug, Default)]
pub struct NullProgress;

impl NullProgress {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for NullProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Console progress reporter with optional colors.
pub struct ConsoleProgress {
    use_colors: bool,
    verbose: bool,
    total: Mutex<usize>,
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for ConsoleProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleProgress")
            .field("use_colors", &self.use_colors)
            .field("verbose", &self.verbose)
            .finish()
    }
}

impl ConsoleProgress {
    /// Create a console reporter writing to stderr.
    pub fn new() -> Self {
        Self {
            use_colors: true,
            verbose: false,
            total: Mutex::new(0),
            output: Mutex::new(Box::new(std::io::stderr())),
        }
    }

    /// Create a console reporter that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self {
            use_colors: false,
            verbose: false,
            total: Mutex::new(0),
            output: Mutex::new(Box::new(output)),
        }
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn color(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{}{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.color(text, "\x1b[32m")
    }

    fn yellow(&self, text: &str) -> String {
        self.color(text, "\x1b[33m")
    }

    fn red(&self, text: &str) -> String {
        self.color(text, "\x1b[31m")
    }

    fn cyan(&self, text: &str) -> String {
        self.color(text, "\x1b[36m")
    }

    fn writeln(&self, line: &str) {
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", line);
        }
    }

    fn total(&self) -> usize {
        self.total.lock().map(|t| *t).unwrap_or(0)
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::PipelineStarted { pipeline, total_steps } => {
                if let Ok(mut total) = self.total.lock() {
                    *total = total_steps;
                }
                self.writeln(&format!(
                    "{} Running '{}' ({} task{})",
                    self.cyan("[run]"),
                    pipeline,
                    total_steps,
                    if total_steps == 1 { "" } else { "s" }
                ));
            }
            ProgressEvent::StepStarted { task_id, index } => {
                if self.verbose {
                    self.writeln(&format!(
                        "{} [{}/{}] {}...",
                        self.cyan("[run]"),
                        index,
                        self.total(),
                        task_id
                    ));
                }
            }
            ProgressEvent::StepCompleted { task_id, status, duration_ms } => {
                let status_str = match &status {
                    StepStatus::Success => self.green("ok"),
                    StepStatus::Failed(_) => self.red("FAILED"),
                };
                self.writeln(&format!(
                    "{} {} {} ({})",
                    self.cyan("[run]"),
                    status_str,
                    task_id,
                    format_duration(duration_ms)
                ));

                if let StepStatus::Failed(diagnostics) = status {
                    for line in diagnostics.lines() {
                        self.writeln(&format!("      {}", self.red(line)));
                    }
                }
            }
            ProgressEvent::PipelineCompleted { pipeline, success, completed, duration_ms } => {
                if success {
                    self.writeln(&format!(
                        "\n{} '{}' finished {} task{} in {}",
                        self.green("[done]"),
                        pipeline,
                        completed,
                        if completed == 1 { "" } else { "s" },
                        format_duration(duration_ms)
                    ));
                } else {
                    self.writeln(&format!(
                        "\n{} '{}' aborted after {} of {} tasks in {}",
                        self.red("[error]"),
                        pipeline,
                        completed,
                        self.total(),
                        format_duration(duration_ms)
                    ));
                }
            }
            ProgressEvent::Warning { task_id, message } => {
                let prefix = task_id.map(|id| format!("{}: ", id)).unwrap_or_default();
                self.writeln(&format!("{} {}{}", self.yellow("[warn]"), prefix, message));
            }
        }
    }

    fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// JSON lines progress reporter for machine-readable output.
pub struct JsonProgress {
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for JsonProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonProgress").finish()
    }
}

impl JsonProgress {
    /// Create a JSON reporter writing to stderr.
    pub fn new() -> Self {
        Self { output: Mutex::new(Box::new(std::io::stderr())) }
    }

    /// Create a JSON reporter that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self { output: Mutex::new(Box::new(output)) }
    }

    fn write_json(&self, value: serde_json::Value) {
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", value);
        }
    }
}

impl Default for JsonProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        let value = match event {
            ProgressEvent::PipelineStarted { pipeline, total_steps } => json!({
                "event": "pipeline_started",
                "pipeline": pipeline,
                "total_steps": total_steps,
            }),
            ProgressEvent::StepStarted { task_id, index } => json!({
                "event": "step_started",
                "task": task_id,
                "index": index,
            }),
            ProgressEvent::StepCompleted { task_id, status, duration_ms } => match status {
                StepStatus::Success => json!({
                    "event": "step_completed",
                    "task": task_id,
                    "status": "success",
                    "duration_ms": duration_ms,
                }),
                StepStatus::Failed(diagnostics) => json!({
                    "event": "step_completed",
                    "task": task_id,
                    "status": "failed",
                    "duration_ms": duration_ms,
                    "diagnostics": diagnostics,
                }),
            },
            ProgressEvent::PipelineCompleted { pipeline, success, completed, duration_ms } => json!({
                "event": "pipeline_completed",
                "pipeline": pipeline,
                "success": success,
                "completed": completed,
                "duration_ms": duration_ms,
            }),
            ProgressEvent::Warning { task_id, message } => json!({
                "event": "warning",
                "task": task_id,
                "message": message,
            }),
        };
        self.write_json(value);
    }
}

/// Format a duration in milliseconds to a human-readable string.
fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        let minutes = ms / 60_000;
        let seconds = (ms % 60_000) / 1000;
        format!("{}m {}s", minutes, seconds)
    }
}
