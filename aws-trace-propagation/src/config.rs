// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use dd_aws_trace::{
    configuration::{ConfigBuilder, TracePropagationStyle},
    Config,
};
use serde::Deserialize;

use crate::trace_propagation_style::deserialize_trace_propagation_style;

/// Propagation settings as found in a JSON document, e.g. an extension or
/// function configuration file.
///
/// ```json
/// { "style": "xray", "style_inject": "none", "lambda_extract_fallback": true }
/// ```
#[derive(Debug, PartialEq, Deserialize, Clone, Default)]
#[serde(default)]
pub struct PropagationConfig {
    #[serde(deserialize_with = "deserialize_trace_propagation_style")]
    pub style: Option<Vec<TracePropagationStyle>>,
    #[serde(deserialize_with = "deserialize_trace_propagation_style")]
    pub style_extract: Option<Vec<TracePropagationStyle>>,
    #[serde(deserialize_with = "deserialize_trace_propagation_style")]
    pub style_inject: Option<Vec<TracePropagationStyle>>,
    pub extract_first: Option<bool>,
    pub lambda_extract_fallback: Option<bool>,
}

impl PropagationConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Overrides the builder with every setting present in `self`.
    pub fn apply<'a>(&self, builder: &'a mut ConfigBuilder) -> &'a mut ConfigBuilder {
        if let Some(style) = &self.style {
            builder.set_trace_propagation_style(style.clone());
        }
        if let Some(style) = &self.style_extract {
            builder.set_trace_propagation_style_extract(style.clone());
        }
        if let Some(style) = &self.style_inject {
            builder.set_trace_propagation_style_inject(style.clone());
        }
        if let Some(first) = self.extract_first {
            builder.set_trace_propagation_extract_first(first);
        }
        if let Some(enabled) = self.lambda_extract_fallback {
            builder.set_lambda_extract_fallback(enabled);
        }
        builder
    }
}

impl From<&Config> for PropagationConfig {
    fn from(config: &Config) -> Self {
        PropagationConfig {
            style: config
                .trace_propagation_style()
                .map(<[TracePropagationStyle]>::to_vec),
            style_extract: config
                .trace_propagation_style_extract()
                .map(<[TracePropagationStyle]>::to_vec),
            style_inject: config
                .trace_propagation_style_inject()
                .map(<[TracePropagationStyle]>::to_vec),
            extract_first: Some(config.trace_propagation_extract_first()),
            lambda_extract_fallback: Some(config.lambda_extract_fallback()),
        }
    }
}
