// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use dd_aws_trace::{aws_warn, configuration::TracePropagationStyle};
use serde::{Deserialize, Deserializer};

use crate::{
    carrier::{Extractor, Injector},
    context::{Extracted, SpanContext},
    xray, Propagator,
};

const NONE_KEYS: [String; 0] = [];

impl Propagator for TracePropagationStyle {
    fn extract(&self, carrier: &dyn Extractor) -> Option<Extracted> {
        match self {
            Self::AwsXray => Some(xray::extract(carrier)),
            Self::None => None,
        }
    }

    fn inject(&self, context: &SpanContext, carrier: &mut dyn Injector) {
        match self {
            Self::AwsXray => xray::inject(context, carrier),
            Self::None => {}
        }
    }

    fn keys(&self) -> &[String] {
        match self {
            Self::AwsXray => xray::keys(),
            Self::None => &NONE_KEYS,
        }
    }
}

/// Reads a comma separated list of styles. Unknown styles are skipped, an empty
/// string means "not set".
#[allow(clippy::module_name_repetitions)]
pub fn deserialize_trace_propagation_style<'de, D>(
    deserializer: D,
) -> Result<Option<Vec<TracePropagationStyle>>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;

    let Some(s) = s.filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };

    let styles = s
        .split(',')
        .filter_map(|style| match style.trim().parse::<TracePropagationStyle>() {
            Ok(style) => Some(style),
            Err(e) => {
                aws_warn!("Failed to deserialize propagation style: {e}");
                None
            }
        })
        .collect();

    Ok(Some(styles))
}
