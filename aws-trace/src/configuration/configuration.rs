// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::{fmt::Display, str::FromStr};

use crate::{aws_warn, log::LevelFilter};

use super::sources::{CompositeConfigSourceResult, CompositeSource};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TracePropagationStyle {
    /// The `x-amzn-trace-id` header used by AWS X-Ray, ALB and Lambda
    AwsXray,
    None,
}

impl TracePropagationStyle {
    fn from_list(list: &str) -> Option<Vec<TracePropagationStyle>> {
        let styles: Vec<TracePropagationStyle> = list
            .split(',')
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .filter_map(|value| match TracePropagationStyle::from_str(value) {
                Ok(style) => Some(style),
                Err(err) => {
                    aws_warn!("Error parsing: {err}");
                    None
                }
            })
            .collect();

        if styles.is_empty() {
            None
        } else {
            Some(styles)
        }
    }
}

impl FromStr for TracePropagationStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "xray" | "awsxray" | "aws" => Ok(TracePropagationStyle::AwsXray),
            "none" => Ok(TracePropagationStyle::None),
            _ => Err(format!("Unknown trace propagation style: '{s}'")),
        }
    }
}

impl Display for TracePropagationStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let style = match self {
            TracePropagationStyle::AwsXray => "xray",
            TracePropagationStyle::None => "none",
        };
        write!(f, "{style}")
    }
}

/// Comma separated list of propagation styles, as found in `DD_TRACE_PROPAGATION_STYLE*`
struct PropagationStyles(Vec<TracePropagationStyle>);

impl FromStr for PropagationStyles {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TracePropagationStyle::from_list(s)
            .map(PropagationStyles)
            .ok_or("no valid propagation style in list")
    }
}

const DEFAULT_PROPAGATION_STYLES: &[TracePropagationStyle] = &[TracePropagationStyle::AwsXray];

#[derive(Debug, Clone)]
#[non_exhaustive]
/// Configuration for AWS trace propagation
///
/// # Usage
/// ```
/// use dd_aws_trace::Config;
///
/// // This pulls configuration from the environment
/// let mut builder = Config::builder();
///
/// // Manual overrides
/// builder.set_lambda_extract_fallback(true);
///
/// // Finalize the configuration
/// let config = builder.build();
/// assert!(config.lambda_extract_fallback());
/// ```
pub struct Config {
    /// The log level for the library
    log_level: LevelFilter,

    // # Propagation
    trace_propagation_style: Option<Vec<TracePropagationStyle>>,
    trace_propagation_style_extract: Option<Vec<TracePropagationStyle>>,
    trace_propagation_style_inject: Option<Vec<TracePropagationStyle>>,
    /// Stop after the first configured extractor
    trace_propagation_extract_first: bool,
    /// Read `_X_AMZN_TRACE_ID` when the carrier has no trace header
    lambda_extract_fallback: bool,
}

impl Config {
    fn from_sources(sources: &CompositeSource) -> Self {
        let default = Config::default();

        /// Helper function to convert a CompositeConfigSourceResult<T> into an Option<T>
        /// Parse errors are logged and the value falls back to the next source or the default.
        fn to_val<T>(res: CompositeConfigSourceResult<T>) -> Option<T> {
            for error in &res.errors {
                aws_warn!(
                    "Ignoring invalid value for {}: {:?} ({})",
                    res.name,
                    error.value,
                    error.error
                );
            }
            res.value.map(|c| c.value)
        }

        fn styles(sources: &CompositeSource, name: &'static str) -> Option<Vec<TracePropagationStyle>> {
            to_val(sources.get_parse::<PropagationStyles>(name)).map(|PropagationStyles(s)| s)
        }

        Self {
            log_level: to_val(sources.get_parse("DD_LOG_LEVEL")).unwrap_or(default.log_level),
            trace_propagation_style: styles(sources, "DD_TRACE_PROPAGATION_STYLE")
                .or(default.trace_propagation_style),
            trace_propagation_style_extract: styles(sources, "DD_TRACE_PROPAGATION_STYLE_EXTRACT")
                .or(default.trace_propagation_style_extract),
            trace_propagation_style_inject: styles(sources, "DD_TRACE_PROPAGATION_STYLE_INJECT")
                .or(default.trace_propagation_style_inject),
            trace_propagation_extract_first: to_val(
                sources.get_parse("DD_TRACE_PROPAGATION_EXTRACT_FIRST"),
            )
            .unwrap_or(default.trace_propagation_extract_first),
            lambda_extract_fallback: to_val(
                sources.get_parse("DD_TRACE_AWS_LAMBDA_EXTRACT_FALLBACK"),
            )
            .unwrap_or(default.lambda_extract_fallback),
        }
    }

    pub fn builder_with_sources(sources: &CompositeSource) -> ConfigBuilder {
        ConfigBuilder {
            config: Config::from_sources(sources),
        }
    }

    /// Creates a new builder to set overrides detected configuration
    pub fn builder() -> ConfigBuilder {
        Self::builder_with_sources(&CompositeSource::default_sources())
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn trace_propagation_style(&self) -> Option<&[TracePropagationStyle]> {
        self.trace_propagation_style.as_deref()
    }

    pub fn trace_propagation_style_extract(&self) -> Option<&[TracePropagationStyle]> {
        self.trace_propagation_style_extract.as_deref()
    }

    pub fn trace_propagation_style_inject(&self) -> Option<&[TracePropagationStyle]> {
        self.trace_propagation_style_inject.as_deref()
    }

    pub fn trace_propagation_extract_first(&self) -> bool {
        self.trace_propagation_extract_first
    }

    pub fn lambda_extract_fallback(&self) -> bool {
        self.lambda_extract_fallback
    }

    /// Styles used on extraction: the extract specific list, then the shared list, then the
    /// default.
    pub fn extractors(&self) -> &[TracePropagationStyle] {
        self.trace_propagation_style_extract()
            .or(self.trace_propagation_style())
            .unwrap_or(DEFAULT_PROPAGATION_STYLES)
    }

    /// Styles used on injection, resolved like [`Config::extractors`]
    pub fn injectors(&self) -> &[TracePropagationStyle] {
        self.trace_propagation_style_inject()
            .or(self.trace_propagation_style())
            .unwrap_or(DEFAULT_PROPAGATION_STYLES)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: LevelFilter::default(),
            trace_propagation_style: None,
            trace_propagation_style_extract: None,
            trace_propagation_style_inject: None,
            trace_propagation_extract_first: false,
            lambda_extract_fallback: false,
        }
    }
}

pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Finalizes the builder and returns the configuration
    pub fn build(&self) -> Config {
        crate::log::set_max_level(self.config.log_level);
        self.config.clone()
    }

    pub fn set_log_level(&mut self, log_level: LevelFilter) -> &mut Self {
        self.config.log_level = log_level;
        self
    }

    pub fn set_trace_propagation_style(&mut self, styles: Vec<TracePropagationStyle>) -> &mut Self {
        self.config.trace_propagation_style = Some(styles);
        self
    }

    pub fn set_trace_propagation_style_extract(
        &mut self,
        styles: Vec<TracePropagationStyle>,
    ) -> &mut Self {
        self.config.trace_propagation_style_extract = Some(styles);
        self
    }

    pub fn set_trace_propagation_style_inject(
        &mut self,
        styles: Vec<TracePropagationStyle>,
    ) -> &mut Self {
        self.config.trace_propagation_style_inject = Some(styles);
        self
    }

    pub fn set_trace_propagation_extract_first(&mut self, first: bool) -> &mut Self {
        self.config.trace_propagation_extract_first = first;
        self
    }

    pub fn set_lambda_extract_fallback(&mut self, enabled: bool) -> &mut Self {
        self.config.lambda_extract_fallback = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{Config, TracePropagationStyle};
    use crate::{
        configuration::sources::{CompositeSource, ConfigSourceOrigin, HashMapSource},
        log::LevelFilter,
    };

    fn sources<const N: usize>(values: [(&str, &str); N]) -> CompositeSource {
        let mut sources = CompositeSource::new();
        sources.add_source(HashMapSource::from_iter(values, ConfigSourceOrigin::EnvVar));
        sources
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::builder_with_sources(&CompositeSource::new()).build();

        assert_eq!(config.log_level(), LevelFilter::Error);
        assert_eq!(config.trace_propagation_style(), None);
        assert_eq!(config.extractors(), &[TracePropagationStyle::AwsXray]);
        assert_eq!(config.injectors(), &[TracePropagationStyle::AwsXray]);
        assert!(!config.trace_propagation_extract_first());
        assert!(!config.lambda_extract_fallback());
    }

    #[test]
    fn test_config_from_source() {
        let config = Config::builder_with_sources(&sources([
            ("DD_LOG_LEVEL", "ERROR"),
            ("DD_TRACE_PROPAGATION_STYLE", "xray"),
            ("DD_TRACE_PROPAGATION_STYLE_INJECT", "none"),
            ("DD_TRACE_PROPAGATION_EXTRACT_FIRST", "true"),
            ("DD_TRACE_AWS_LAMBDA_EXTRACT_FALLBACK", "true"),
        ]))
        .build();

        assert_eq!(config.log_level(), LevelFilter::Error);
        assert_eq!(config.extractors(), &[TracePropagationStyle::AwsXray]);
        assert_eq!(config.injectors(), &[TracePropagationStyle::None]);
        assert!(config.trace_propagation_extract_first());
        assert!(config.lambda_extract_fallback());
    }

    #[test]
    fn test_config_invalid_styles_fall_back_to_default() {
        let config = Config::builder_with_sources(&sources([
            ("DD_TRACE_PROPAGATION_STYLE", "b3, zipkin"),
            ("DD_TRACE_PROPAGATION_STYLE_EXTRACT", "b3, XRay"),
            ("DD_TRACE_AWS_LAMBDA_EXTRACT_FALLBACK", "yes"),
        ]))
        .build();

        assert_eq!(config.trace_propagation_style(), None);
        assert_eq!(config.extractors(), &[TracePropagationStyle::AwsXray]);
        assert!(!config.lambda_extract_fallback());
    }

    #[test]
    fn test_config_from_source_manual_override() {
        let mut builder = Config::builder_with_sources(&sources([
            ("DD_TRACE_PROPAGATION_STYLE", "none"),
            ("DD_TRACE_AWS_LAMBDA_EXTRACT_FALLBACK", "false"),
        ]));
        builder
            .set_trace_propagation_style_extract(vec![TracePropagationStyle::AwsXray])
            .set_lambda_extract_fallback(true);

        let config = builder.build();

        assert_eq!(config.extractors(), &[TracePropagationStyle::AwsXray]);
        assert_eq!(config.injectors(), &[TracePropagationStyle::None]);
        assert!(config.lambda_extract_fallback());
    }

    #[test]
    fn test_propagation_style_display_round_trip() {
        for style in [TracePropagationStyle::AwsXray, TracePropagationStyle::None] {
            assert_eq!(style.to_string().parse::<TracePropagationStyle>(), Ok(style));
        }
        assert!("b3multi".parse::<TracePropagationStyle>().is_err());
    }
}
