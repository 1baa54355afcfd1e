// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Propagation of trace context through the AWS X-Ray `x-amzn-trace-id` header.
//!
//! ```
//! use std::{collections::HashMap, sync::Arc};
//!
//! use dd_aws_trace::Config;
//! use dd_aws_trace_propagation::{AwsPropagator, Propagator};
//!
//! let propagator = AwsPropagator::new(Arc::new(Config::builder().build()));
//!
//! let headers = HashMap::from([(
//!     "x-amzn-trace-id".to_string(),
//!     "Root=1-67891233-abcdef012345678912345678;Parent=463ac35c9f6413ad;Sampled=1".to_string(),
//! )]);
//! let context = propagator
//!     .extract(&headers)
//!     .and_then(|extracted| extracted.into_context())
//!     .unwrap();
//!
//! let mut outgoing: HashMap<String, String> = HashMap::new();
//! propagator.inject(&context, &mut outgoing);
//! assert_eq!(outgoing["x-amzn-trace-id"], headers["x-amzn-trace-id"]);
//! ```

use std::{fmt, sync::Arc};

use dd_aws_trace::{
    configuration::{
        sources::{ConfigurationSource, EnvSource},
        TracePropagationStyle,
    },
    Config,
};

use carrier::{Extractor, Injector};
use context::{Extracted, SpanContext};

pub mod carrier;
pub mod config;
pub mod context;
pub mod current;
pub mod error;
mod hex;
pub mod lambda;
pub mod text_map_propagator;
pub mod trace_propagation_style;
pub mod xray;

pub use current::{current_trace_id, CurrentTraceContext};
pub use lambda::extract_lambda;
pub use text_map_propagator::XrayTextMapPropagator;

pub trait Propagator {
    fn extract(&self, carrier: &dyn Extractor) -> Option<Extracted>;
    fn inject(&self, context: &SpanContext, carrier: &mut dyn Injector);
    fn keys(&self) -> &[String];
}

/// Extracts and injects with the styles selected in [`Config`].
pub struct AwsPropagator {
    config: Arc<Config>,
    extractors: Vec<TracePropagationStyle>,
    injectors: Vec<TracePropagationStyle>,
    keys: Vec<String>,
    lambda_source: Arc<dyn ConfigurationSource + Send + Sync>,
}

impl fmt::Debug for AwsPropagator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsPropagator")
            .field("extractors", &self.extractors)
            .field("injectors", &self.injectors)
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

impl AwsPropagator {
    #[must_use]
    pub fn new(config: Arc<Config>) -> Self {
        let num_extractors = if config.trace_propagation_extract_first() {
            1
        } else {
            config.extractors().len()
        };

        let extractors: Vec<TracePropagationStyle> = config
            .extractors()
            .iter()
            .take(num_extractors)
            .filter(|style| **style != TracePropagationStyle::None)
            .copied()
            .collect();

        let injectors: Vec<TracePropagationStyle> = config
            .injectors()
            .iter()
            .filter(|style| **style != TracePropagationStyle::None)
            .copied()
            .collect();

        let mut keys: Vec<String> = Vec::new();
        for key in extractors
            .iter()
            .chain(injectors.iter())
            .flat_map(|style| style.keys())
        {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }

        Self {
            config,
            extractors,
            injectors,
            keys,
            lambda_source: Arc::new(EnvSource),
        }
    }

    /// Replaces the process environment as the source of `_X_AMZN_TRACE_ID`.
    #[must_use]
    pub fn with_lambda_source<S>(mut self, source: S) -> Self
    where
        S: ConfigurationSource + Send + Sync + 'static,
    {
        self.lambda_source = Arc::new(source);
        self
    }

    /// Trace context of the current Lambda invocation.
    pub fn extract_lambda(&self) -> Extracted {
        lambda::extract_lambda_from(self.lambda_source.as_ref())
    }
}

impl Propagator for AwsPropagator {
    /// `None` when extraction is disabled. An absent header yields
    /// [`Extracted::Empty`], unless the Lambda fallback finds a context.
    fn extract(&self, carrier: &dyn Extractor) -> Option<Extracted> {
        let mut empty = None;

        for style in &self.extractors {
            match style.extract(carrier) {
                Some(extracted) if !extracted.is_empty() => return Some(extracted),
                Some(extracted) => {
                    empty.get_or_insert(extracted);
                }
                None => {}
            }
        }

        if empty.is_some() && self.config.lambda_extract_fallback() {
            let extracted = self.extract_lambda();
            if !extracted.is_empty() {
                return Some(extracted);
            }
        }

        empty
    }

    fn inject(&self, context: &SpanContext, carrier: &mut dyn Injector) {
        for style in &self.injectors {
            style.inject(context, carrier);
        }
    }

    fn keys(&self) -> &[String] {
        &self.keys
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use dd_aws_trace::{
        configuration::sources::{CompositeSource, ConfigSourceOrigin, HashMapSource},
        constants::LAMBDA_TRACE_ID_ENV_VAR,
    };
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::context::AmznTraceId;

    const LAMBDA_HEADER: &str =
        "Root=1-5759e988-bd862e3fe1be46a994272793;Parent=53995c3f42cd8ad8;Sampled=1";

    fn config(values: &[(&str, &str)]) -> Arc<Config> {
        let mut sources = CompositeSource::new();
        sources.add_source(HashMapSource::from_iter(
            values.iter().copied(),
            ConfigSourceOrigin::EnvVar,
        ));
        Arc::new(Config::builder_with_sources(&sources).build())
    }

    fn headers(value: &str) -> HashMap<String, String> {
        HashMap::from([("x-amzn-trace-id".to_string(), value.to_string())])
    }

    macro_rules! test_propagation_extract {
        ($($name:ident: $value:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let (config_values, carrier, expected): (&[(&str, &str)], HashMap<String, String>, Option<Extracted>) = $value;
                    let propagator = AwsPropagator::new(config(config_values))
                        .with_lambda_source(HashMapSource::from_iter(
                            [(LAMBDA_TRACE_ID_ENV_VAR, LAMBDA_HEADER)],
                            ConfigSourceOrigin::EnvVar,
                        ));

                    assert_eq!(propagator.extract(&carrier), expected);
                }
            )*
        }
    }

    test_propagation_extract! {
        valid_xray_default: (
            &[],
            headers("Root=1-67891233-abcdef012345678912345678;Parent=463ac35c9f6413ad;Sampled=1"),
            Some(Extracted::Full(SpanContext {
                trace_id_high: 0x6789_1233_abcd_ef01,
                trace_id: 0x2345_6789_1234_5678,
                span_id: 0x463a_c35c_9f64_13ad,
                sampled: Some(true),
                amzn_trace_id: Some(AmznTraceId::default()),
                propagation_fields: HashMap::new(),
                is_remote: true,
            })),
        ),
        sampling_only_header: (
            &[],
            headers("Sampled=0"),
            Some(Extracted::SamplingOnly {
                sampled: Some(false),
                amzn_trace_id: AmznTraceId::default(),
            }),
        ),
        absent_header: (
            &[],
            HashMap::new(),
            Some(Extracted::Empty { amzn_trace_id: AmznTraceId::default() }),
        ),
        extraction_disabled: (
            &[("DD_TRACE_PROPAGATION_STYLE_EXTRACT", "none")],
            headers("Root=1-67891233-abcdef012345678912345678;Parent=463ac35c9f6413ad;Sampled=1"),
            None,
        ),
        lambda_fallback_on_absent_header: (
            &[("DD_TRACE_AWS_LAMBDA_EXTRACT_FALLBACK", "true")],
            HashMap::new(),
            Some(Extracted::Full(SpanContext {
                trace_id_high: 0x5759_e988_bd86_2e3f,
                trace_id: 0xe1be_46a9_9427_2793,
                span_id: 0x5399_5c3f_42cd_8ad8,
                sampled: Some(true),
                amzn_trace_id: Some(AmznTraceId::default()),
                propagation_fields: HashMap::new(),
                is_remote: true,
            })),
        ),
        lambda_fallback_ignored_when_header_present: (
            &[("DD_TRACE_AWS_LAMBDA_EXTRACT_FALLBACK", "true")],
            headers("Sampled=0"),
            Some(Extracted::SamplingOnly {
                sampled: Some(false),
                amzn_trace_id: AmznTraceId::default(),
            }),
        ),
        lambda_fallback_disabled_by_default: (
            &[],
            HashMap::new(),
            Some(Extracted::Empty { amzn_trace_id: AmznTraceId::default() }),
        ),
        lambda_fallback_needs_extraction: (
            &[
                ("DD_TRACE_AWS_LAMBDA_EXTRACT_FALLBACK", "true"),
                ("DD_TRACE_PROPAGATION_STYLE", "none"),
            ],
            HashMap::new(),
            None,
        ),
    }

    #[test]
    fn test_inject() {
        let propagator = AwsPropagator::new(config(&[]));
        let context = SpanContext {
            trace_id_high: 0x6789_1233_abcd_ef01,
            trace_id: 0x2345_6789_1234_5678,
            span_id: 0x463a_c35c_9f64_13ad,
            sampled: Some(false),
            ..Default::default()
        };

        let mut carrier = http::HeaderMap::new();
        propagator.inject(&context, &mut carrier);

        assert_eq!(
            carrier["x-amzn-trace-id"],
            "Root=1-67891233-abcdef012345678912345678;Parent=463ac35c9f6413ad;Sampled=0"
        );
    }

    #[test]
    fn test_inject_disabled() {
        let propagator =
            AwsPropagator::new(config(&[("DD_TRACE_PROPAGATION_STYLE_INJECT", "none")]));
        let context = SpanContext {
            trace_id_high: 1,
            trace_id: 2,
            span_id: 3,
            ..Default::default()
        };

        let mut carrier: HashMap<String, String> = HashMap::new();
        propagator.inject(&context, &mut carrier);

        assert!(carrier.is_empty());
        assert_eq!(propagator.keys(), &["x-amzn-trace-id".to_string()]);
    }

    #[test]
    fn test_keys() {
        let propagator = AwsPropagator::new(config(&[("DD_TRACE_PROPAGATION_STYLE", "none")]));
        assert!(propagator.keys().is_empty());

        let propagator = AwsPropagator::new(config(&[("DD_TRACE_PROPAGATION_STYLE", "xray,aws")]));
        assert_eq!(propagator.keys(), &["x-amzn-trace-id".to_string()]);
    }

    #[test]
    fn test_extract_lambda_reads_source_each_call() {
        let propagator = AwsPropagator::new(config(&[])).with_lambda_source(
            HashMapSource::from_iter([("OTHER", "value")], ConfigSourceOrigin::EnvVar),
        );
        assert!(propagator.extract_lambda().is_empty());

        let propagator = propagator.with_lambda_source(HashMapSource::from_iter(
            [(LAMBDA_TRACE_ID_ENV_VAR, "Sampled=1")],
            ConfigSourceOrigin::EnvVar,
        ));
        assert_eq!(propagator.extract_lambda().sampled(), Some(true));
    }
}
