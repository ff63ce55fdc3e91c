//! Cooperative interruption.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::warn;

use crate::error::Error;

/// Shared shutdown flag.
///
/// Setting it stops the source reader. Batches already read are still
/// processed and written, so that the run ends on a consistent checkpoint.
#[derive(Debug, Clone, Default)]
pub struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown on SIGINT/SIGTERM.
    ///
    /// A second signal exits the process immediately.
    /// Can only be called once per process.
    pub fn install(&self) -> Result<(), Error> {
        let flag = self.0.clone();
        ctrlc::set_handler(move || {
            if flag.swap(true, Ordering::SeqCst) {
                warn!("second interrupt: exiting now, output may be incomplete");
                std::process::exit(130);
            }
            warn!("interrupt received: finishing pending batches (interrupt again to force)");
        })?;
        Ok(())
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
