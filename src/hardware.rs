//! Hardware facade: error sink, halt latch, and interrupt dispatch.
//!
//! The processor and kernel never talk to the host environment directly;
//! everything goes through an injected [`Hardware`] implementation. A halted
//! facade is the authoritative failure signal for the whole machine.

use crate::errors::Component;
use crate::{error, warn};

/// Services the processor requires from the surrounding machine.
pub trait Hardware {
    /// Records a diagnostic `(component, code)` pair.
    fn error(&mut self, component: Component, code: i32);

    /// Requests a machine stop with the given exit code. The first request
    /// wins; halting is terminal and irreversible.
    fn halt(&mut self, exit_code: i32);

    /// Dispatches an interrupt and returns its result bytes.
    fn interrupt(&mut self, code: u8) -> Vec<u8>;

    /// Returns the latched exit code once a halt has been requested.
    fn halted(&self) -> Option<i32>;
}

/// Interrupt that does nothing and yields no bytes.
pub const INT_NOP: u8 = 0;
/// Interrupt requesting a clean machine halt.
pub const INT_HALT: u8 = 1;
/// Interrupt echoing its own code back as the result byte.
pub const INT_ECHO: u8 = 2;

/// Console-backed hardware used by the CLI.
///
/// Diagnostics go to the process log; unknown interrupt codes are reported
/// and ignored.
#[derive(Debug, Default)]
pub struct Console {
    halted: Option<i32>,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Hardware for Console {
    fn error(&mut self, component: Component, code: i32) {
        error!("{} error {}", component, code);
    }

    fn halt(&mut self, exit_code: i32) {
        if self.halted.is_none() {
            self.halted = Some(exit_code);
        }
    }

    fn interrupt(&mut self, code: u8) -> Vec<u8> {
        match code {
            INT_NOP => Vec::new(),
            INT_HALT => {
                self.halt(0);
                Vec::new()
            }
            INT_ECHO => vec![code],
            other => {
                warn!("unhandled interrupt {}", other);
                Vec::new()
            }
        }
    }

    fn halted(&self) -> Option<i32> {
        self.halted
    }
}
