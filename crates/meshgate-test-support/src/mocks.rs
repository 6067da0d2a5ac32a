//! Scripted [`ImageProcessor`] implementation for lifecycle tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use meshgate_core::{ImageProcessor, OutputFileSet, ProcessorError};

/// Observation recorded for every `process` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorCall {
    /// Input path handed to the processor.
    pub input_path: PathBuf,
    /// Output directory handed to the processor.
    pub output_dir: PathBuf,
    /// Contents of the input at call time, or `None` if it could not be read.
    pub input_bytes: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
enum Behaviour {
    Produce,
    ClaimOnly,
    Fail(String),
    Panic(String),
}

/// Processor whose outcome is fixed at construction time.
#[derive(Debug)]
pub struct ScriptedProcessor {
    outputs: Vec<(String, String)>,
    behaviour: Behaviour,
    init_failure: Option<String>,
    delay: Option<Duration>,
    pin_input: bool,
    calls: Mutex<Vec<ProcessorCall>>,
    init_calls: AtomicUsize,
}

impl ScriptedProcessor {
    fn scripted(outputs: &[(&str, &str)], behaviour: Behaviour) -> Self {
        Self {
            outputs: outputs
                .iter()
                .map(|(name, file)| ((*name).to_string(), (*file).to_string()))
                .collect(),
            behaviour,
            init_failure: None,
            delay: None,
            pin_input: false,
            calls: Mutex::new(Vec::new()),
            init_calls: AtomicUsize::new(0),
        }
    }

    /// Writes each named file into the output directory and reports them.
    #[must_use]
    pub fn producing(outputs: &[(&str, &str)]) -> Self {
        Self::scripted(outputs, Behaviour::Produce)
    }

    /// Reports the named files without writing them.
    #[must_use]
    pub fn claiming(outputs: &[(&str, &str)]) -> Self {
        Self::scripted(outputs, Behaviour::ClaimOnly)
    }

    /// Fails every call with `message`.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self::scripted(&[], Behaviour::Fail(message.to_string()))
    }

    /// Panics inside every call with `message`.
    #[must_use]
    pub fn panicking(message: &str) -> Self {
        Self::scripted(&[], Behaviour::Panic(message.to_string()))
    }

    /// Make `initialize` fail with `message`.
    #[must_use]
    pub fn with_init_failure(mut self, message: &str) -> Self {
        self.init_failure = Some(message.to_string());
        self
    }

    /// Sleep for `delay` before doing anything in `process`.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Swap the input file for a directory of the same name during `process`,
    /// so that finalization cannot remove it with a plain file delete.
    #[must_use]
    pub const fn with_input_replaced_by_directory(mut self) -> Self {
        self.pin_input = true;
        self
    }

    /// Every `process` call observed so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ProcessorCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of `initialize` calls observed so far.
    #[must_use]
    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    fn output_set(&self) -> OutputFileSet {
        self.outputs
            .iter()
            .map(|(name, file)| (name.clone(), file.clone()))
            .collect()
    }
}

impl ImageProcessor for ScriptedProcessor {
    fn initialize(&self) -> Result<(), ProcessorError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        self.init_failure
            .as_ref()
            .map_or(Ok(()), |message| Err(ProcessorError::new(message.clone())))
    }

    fn process(
        &self,
        input_path: &Path,
        output_dir: &Path,
    ) -> Result<OutputFileSet, ProcessorError> {
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ProcessorCall {
                input_path: input_path.to_path_buf(),
                output_dir: output_dir.to_path_buf(),
                input_bytes: fs::read(input_path).ok(),
            });
        if self.pin_input {
            fs::remove_file(input_path)
                .and_then(|()| fs::create_dir(input_path))
                .map_err(|err| ProcessorError::with_source("failed to replace input", err))?;
        }

        match &self.behaviour {
            Behaviour::Produce => {
                for (name, file) in &self.outputs {
                    let path = output_dir.join(file);
                    fs::write(&path, format!("{name}:{file}")).map_err(|err| {
                        ProcessorError::with_source(format!("failed to write {file}"), err)
                    })?;
                }
                Ok(self.output_set())
            }
            Behaviour::ClaimOnly => Ok(self.output_set()),
            Behaviour::Fail(message) => Err(ProcessorError::new(message.clone())),
            Behaviour::Panic(message) => panic!("{message}"),
        }
    }
}
