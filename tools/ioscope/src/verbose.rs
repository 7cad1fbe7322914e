//! Leveled console output for ioscope.
//!
//! - **Quiet** (`-q`, or `--format json`): nothing on stdout but the JSON document
//! - **Default**: summary tables, comparison tallies and the closing line
//! - **Verbose** (`-v`): also the resolved config, each written artifact and step timings
//!
//! Warnings bypass the level and always reach stderr.

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};

/// How much ioscope prints to stdout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Verbosity {
    /// Warnings and errors only.
    Quiet,
    /// Reports and the final summary.
    Default,
    /// Everything, including artifact paths and timings.
    Verbose,
}

impl Verbosity {
    /// Level selected by the `-q`/`-v` flags; quiet wins.
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, true) => Self::Verbose,
            (false, false) => Self::Default,
        }
    }

    /// Whether output tagged `needed` is shown at this level.
    pub fn allows(self, needed: Verbosity) -> bool {
        self >= needed
    }

    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Quiet,
            2 => Self::Verbose,
            _ => Self::Default,
        }
    }
}

static LEVEL: AtomicU8 = AtomicU8::new(Verbosity::Default as u8);

/// Install the process-wide level once flags are parsed.
pub fn init(quiet: bool, verbose: bool) {
    LEVEL.store(Verbosity::from_flags(quiet, verbose) as u8, Ordering::Relaxed);
}

/// Whether the installed level shows output tagged `needed`.
pub fn enabled(needed: Verbosity) -> bool {
    Verbosity::from_raw(LEVEL.load(Ordering::Relaxed)).allows(needed)
}

/// `println!` in verbose mode only.
macro_rules! vprintln {
    ($($arg:tt)*) => {
        if $crate::verbose::enabled($crate::verbose::Verbosity::Verbose) {
            println!($($arg)*);
        }
    };
}

pub(crate) use vprintln;

/// `println!` unless quiet.
macro_rules! dprintln {
    ($($arg:tt)*) => {
        if $crate::verbose::enabled($crate::verbose::Verbosity::Default) {
            println!($($arg)*);
        }
    };
}

pub(crate) use dprintln;

/// `eprintln!` with a `warning:` prefix, at every level.
macro_rules! wprintln {
    ($($arg:tt)*) => {
        eprintln!("warning: {}", format_args!($($arg)*))
    };
}

pub(crate) use wprintln;

/// Times one pipeline step and reports it in verbose mode when dropped.
///
/// ```ignore
/// let _step = StepTimer::start("baseline analysis");
/// ```
pub struct StepTimer {
    step: &'static str,
    began: Instant,
}

impl StepTimer {
    /// Start timing `step`.
    pub fn start(step: &'static str) -> Self {
        Self {
            step,
            began: Instant::now(),
        }
    }

    fn elapsed(&self) -> Duration {
        self.began.elapsed()
    }
}

impl Drop for StepTimer {
    fn drop(&mut self) {
        vprintln!("  [{}] {:.1?}", self.step, self.elapsed());
    }
}
