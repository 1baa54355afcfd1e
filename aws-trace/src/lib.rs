// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Configuration and logging shared by the AWS trace propagation crates.

pub mod configuration;
pub mod constants;
pub use configuration::Config;

pub mod log;

#[doc(hidden)]
pub mod __private {
    pub use tracing;
}
