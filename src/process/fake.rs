//! Scripted [`ProcessRunner`] for tests
//!
//! Simulates the default toolchain by writing the files each tool would
//! produce, records every invocation, and fails whichever invocations the
//! test selects.

use std::fs;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{Invocation, ProcessResult, ProcessRunner};

type Predicate = Box<dyn Fn(&Invocation) -> bool + Send + Sync>;

pub(crate) struct FakeRunner {
    calls: Mutex<Vec<Invocation>>,
    fail_when: Predicate,
    silent_when: Predicate,
}

impl FakeRunner {
    /// Every invocation succeeds and produces its output files
    pub(crate) fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_when: Box::new(|_| false),
            silent_when: Box::new(|_| false),
        }
    }

    /// Matching invocations exit with status 1 and write nothing
    pub(crate) fn failing(mut self, pred: impl Fn(&Invocation) -> bool + Send + Sync + 'static) -> Self {
        self.fail_when = Box::new(pred);
        self
    }

    /// Matching invocations exit with status 0 but write nothing
    pub(crate) fn silent(mut self, pred: impl Fn(&Invocation) -> bool + Send + Sync + 'static) -> Self {
        self.silent_when = Box::new(pred);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn calls_to(&self, program: &str) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|inv| program_name(inv) == program)
            .collect()
    }

    fn respond(&self, invocation: &Invocation) -> ProcessResult {
        self.calls.lock().unwrap().push(invocation.clone());

        if (self.fail_when)(invocation) {
            return ProcessResult::exited(1);
        }
        if !(self.silent_when)(invocation) {
            simulate_outputs(invocation);
        }
        ProcessResult::success()
    }
}

#[async_trait]
impl ProcessRunner for FakeRunner {
    async fn run(&self, invocation: &Invocation) -> ProcessResult {
        self.respond(invocation)
    }

    fn run_blocking(&self, invocation: &Invocation) -> ProcessResult {
        self.respond(invocation)
    }
}

/// File name of the invoked program, so local-bin paths match bare names
pub(crate) fn program_name(invocation: &Invocation) -> &str {
    Path::new(&invocation.program)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(&invocation.program)
}

/// Whether any argument ends with `suffix`
pub(crate) fn mentions(invocation: &Invocation, suffix: &str) -> bool {
    invocation.args.iter().any(|a| a.ends_with(suffix))
}

fn simulate_outputs(invocation: &Invocation) {
    let base = invocation.cwd.clone().unwrap_or_default();

    let mut wrote = false;
    for flag in ["-o", "-out", "-keyout"] {
        if let Some(pos) = invocation.args.iter().position(|a| a == flag) {
            if let Some(target) = invocation.args.get(pos + 1) {
                write(&base.join(target));
                wrote = true;
            }
        }
    }

    match program_name(invocation) {
        "transcrypt" if !wrote => {
            // Batch mode writes next to the entry file
            if let Some(entry) = invocation.args.iter().find(|a| a.ends_with(".py")) {
                let stem = Path::new(entry).file_stem().unwrap_or_default();
                let out = base.join("__target__").join(stem).with_extension("js");
                write(&out);
            }
        }
        "js-to-ts" => {
            if let Some(out) = invocation.args.get(1) {
                write(&base.join(out));
            }
        }
        _ => {}
    }
}

fn write(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, "// generated by fake tool\n").unwrap();
}
