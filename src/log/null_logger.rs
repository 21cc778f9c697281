//! Fallback for builds without the `logging` feature. Nothing is written; the global level is still
//! tracked so the `log` macros short-circuit.

use crate::log::LogConfiguration;

impl LogConfiguration {
    pub(in crate::log) fn set_config(&mut self) {
        log::set_max_level(self.global_log_level);
    }
}
