// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use dd_aws_trace::log::Level;
use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq)]
#[error("Cannot {} from {}, {}", operation, propagator_name, message)]
pub struct Error {
    pub message: &'static str,
    // which propagator this error comes from
    propagator_name: &'static str,
    // what operation was attempted
    operation: &'static str,
    // error log level
    pub log_level: Level,
}

impl Error {
    /// Error when extracting a value from a carrier
    ///
    /// Malformed headers are expected traffic, so these are only worth a debug line.
    #[must_use]
    pub fn extract(message: &'static str, propagator_name: &'static str) -> Self {
        Self {
            message,
            propagator_name,
            operation: "extract",
            log_level: Level::Debug,
        }
    }

    /// Error when injecting a value into a carrier
    #[must_use]
    pub fn inject(message: &'static str, propagator_name: &'static str) -> Self {
        Self {
            message,
            propagator_name,
            operation: "inject",
            log_level: Level::Debug,
        }
    }

    #[must_use]
    pub fn with_level(mut self, log_level: Level) -> Self {
        self.log_level = log_level;
        self
    }

    /// Logs the error at its own level
    pub fn log(&self) {
        match self.log_level {
            Level::Error => dd_aws_trace::aws_error!("{self}"),
            Level::Warn => dd_aws_trace::aws_warn!("{self}"),
            Level::Info => dd_aws_trace::aws_info!("{self}"),
            Level::Debug => dd_aws_trace::aws_debug!("{self}"),
        }
    }
}
