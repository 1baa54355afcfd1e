// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! AWS Lambda hands the invocation's trace header to the function through the
//! `_X_AMZN_TRACE_ID` environment variable rather than a request header.

use dd_aws_trace::{
    aws_debug,
    configuration::sources::{ConfigurationSource, EnvSource},
    constants::LAMBDA_TRACE_ID_ENV_VAR,
};

use crate::{carrier::SingleValue, context::Extracted, xray};

/// Extracts the trace context of the current Lambda invocation.
///
/// The variable changes between invocations, so it is read on every call.
pub fn extract_lambda() -> Extracted {
    extract_lambda_from(&EnvSource)
}

pub fn extract_lambda_from(source: &dyn ConfigurationSource) -> Extracted {
    let value = source.get(LAMBDA_TRACE_ID_ENV_VAR).unwrap_or_default();
    if value.is_empty() {
        aws_debug!("Propagator (xray): {LAMBDA_TRACE_ID_ENV_VAR} is not set");
    }
    xray::extract(&SingleValue(&value))
}

#[cfg(test)]
mod test {
    use dd_aws_trace::configuration::sources::{ConfigSourceOrigin, HashMapSource};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_extract_lambda_from_source() {
        let source = HashMapSource::from_iter(
            [(
                LAMBDA_TRACE_ID_ENV_VAR,
                "Root=1-5759e988-bd862e3fe1be46a994272793;Parent=53995c3f42cd8ad8;Sampled=1;Lineage=a87bd80c:1",
            )],
            ConfigSourceOrigin::EnvVar,
        );

        let context = extract_lambda_from(&source).into_context().unwrap();
        assert_eq!(context.trace_id_high, 0x5759_e988_bd86_2e3f);
        assert_eq!(context.trace_id, 0xe1be_46a9_9427_2793);
        assert_eq!(context.span_id, 0x5399_5c3f_42cd_8ad8);
        assert_eq!(context.sampled, Some(true));
        assert_eq!(
            context.amzn_trace_id.unwrap().fields(),
            ";Lineage=a87bd80c:1"
        );
    }

    #[test]
    fn test_extract_lambda_missing_variable() {
        let source = HashMapSource::from_iter([("OTHER", "value")], ConfigSourceOrigin::EnvVar);
        assert!(extract_lambda_from(&source).is_empty());
    }
}
