//! [`ImageProcessor`] backed by an external command.
//!
//! The command receives `<input_path> <output_dir>` after its configured
//! arguments and prints a JSON object mapping output names to file names on
//! stdout. Anything it logs must go to stderr, or precede the final line.

use std::path::Path;
use std::process::{Command, Output};

use meshgate_config::{CommandSpec, ProcessorConfig};
use meshgate_core::{ImageProcessor, OutputFileSet, ProcessorError};
use tracing::{debug, info};

const STDERR_TAIL_LINES: usize = 20;

/// Runs the configured inference command once per request.
#[derive(Debug, Clone)]
pub struct CommandProcessor {
    process: CommandSpec,
    init: Option<CommandSpec>,
}

impl CommandProcessor {
    /// Build a processor from configuration.
    #[must_use]
    pub fn new(config: &ProcessorConfig) -> Self {
        Self {
            process: config.process_command.clone(),
            init: config.init_command.clone(),
        }
    }
}

impl ImageProcessor for CommandProcessor {
    fn initialize(&self) -> Result<(), ProcessorError> {
        let Some(init) = &self.init else {
            debug!("no init command configured");
            return Ok(());
        };
        let output = run(Command::new(&init.program).args(&init.args), &init.program)?;
        ensure_success(&output, &init.program)?;
        info!(program = %init.program, "init command completed");
        Ok(())
    }

    fn process(
        &self,
        input_path: &Path,
        output_dir: &Path,
    ) -> Result<OutputFileSet, ProcessorError> {
        let program = &self.process.program;
        let output = run(
            Command::new(program)
                .args(&self.process.args)
                .arg(input_path)
                .arg(output_dir),
            program,
        )?;
        ensure_success(&output, program)?;
        parse_outputs(&output.stdout)
    }
}

fn run(command: &mut Command, program: &str) -> Result<Output, ProcessorError> {
    debug!(program, "spawning processor command");
    command
        .output()
        .map_err(|err| ProcessorError::with_source(format!("failed to launch {program}"), err))
}

fn ensure_success(output: &Output, program: &str) -> Result<(), ProcessorError> {
    if output.status.success() {
        return Ok(());
    }
    let tail = stderr_tail(&output.stderr);
    let message = if tail.is_empty() {
        format!("{program} exited with {}", output.status)
    } else {
        tail
    };
    Err(ProcessorError::new(message))
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Parse the whole of stdout, falling back to its last non-empty line.
fn parse_outputs(stdout: &[u8]) -> Result<OutputFileSet, ProcessorError> {
    let text = String::from_utf8_lossy(stdout);
    let whole = serde_json::from_str::<OutputFileSet>(text.trim());
    match whole {
        Ok(outputs) => Ok(outputs),
        Err(err) => text
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .and_then(|line| serde_json::from_str::<OutputFileSet>(line.trim()).ok())
            .ok_or_else(|| {
                ProcessorError::with_source("processor returned malformed output", err)
            }),
    }
}
