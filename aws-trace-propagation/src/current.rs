// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::{
    context::SpanContext,
    xray::{self, AMZN_TRACE_ID_KEY},
};

/// Handle on whatever the embedding tracer considers the active span.
pub trait CurrentTraceContext {
    fn current_span_context(&self) -> Option<SpanContext>;
}

impl CurrentTraceContext for SpanContext {
    fn current_span_context(&self) -> Option<SpanContext> {
        Some(self.clone())
    }
}

impl<T: CurrentTraceContext> CurrentTraceContext for Option<T> {
    fn current_span_context(&self) -> Option<SpanContext> {
        self.as_ref().and_then(T::current_span_context)
    }
}

/// The X-Ray trace id of the active span, as `1-XXXXXXXX-XXXXXXXXXXXXXXXXXXXXXXXX`.
///
/// `None` when there is no active span, or when it was neither read with the
/// X-Ray format nor carries a valid `x-amzn-trace-id` propagation field.
pub fn current_trace_id(current: &dyn CurrentTraceContext) -> Option<String> {
    trace_id(&current.current_span_context()?)
}

pub fn trace_id(context: &SpanContext) -> Option<String> {
    if context.amzn_trace_id.is_some() {
        return Some(xray::trace_id_string(context));
    }

    context
        .propagation_fields
        .get(AMZN_TRACE_ID_KEY)
        .and_then(|header| root_from_header(header))
}

/// The `Root` value of a raw header, rendered in lowercase.
fn root_from_header(header: &str) -> Option<String> {
    let header = xray::parse_header(header);
    if !header.has_trace_id() {
        return None;
    }

    Some(xray::trace_id_string(&SpanContext {
        trace_id_high: header.trace_id_high,
        trace_id: header.trace_id_low,
        ..Default::default()
    }))
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::context::AmznTraceId;

    fn context_with_field(header: &str) -> SpanContext {
        SpanContext {
            trace_id_high: 1,
            trace_id: 2,
            span_id: 3,
            propagation_fields: HashMap::from([(
                AMZN_TRACE_ID_KEY.to_string(),
                header.to_string(),
            )]),
            ..Default::default()
        }
    }

    #[test]
    fn test_no_current_span() {
        let current: Option<SpanContext> = None;
        assert_eq!(current_trace_id(&current), None);
    }

    #[test]
    fn test_marked_context() {
        let context = SpanContext {
            trace_id_high: 0x6789_1233_abcd_ef01,
            trace_id: 0x2345_6789_1234_5678,
            span_id: 1,
            amzn_trace_id: Some(AmznTraceId::default()),
            ..Default::default()
        };

        assert_eq!(
            current_trace_id(&context).as_deref(),
            Some("1-67891233-abcdef012345678912345678")
        );
    }

    #[test]
    fn test_unmarked_context_without_field() {
        let context = SpanContext {
            trace_id_high: 0x6789_1233_abcd_ef01,
            trace_id: 0x2345_6789_1234_5678,
            span_id: 1,
            ..Default::default()
        };

        assert_eq!(current_trace_id(&context), None);
    }

    #[test]
    fn test_propagation_field() {
        let context = context_with_field(
            "Root=1-5759e988-bd862e3fe1be46a994272793;Parent=53995c3f42cd8ad8;Sampled=1",
        );
        assert_eq!(
            current_trace_id(&Some(context)).as_deref(),
            Some("1-5759e988-bd862e3fe1be46a994272793")
        );

        let context = context_with_field("Sampled=1;Root=1-5759e988-bd862e3fe1be46a994272793");
        assert_eq!(
            trace_id(&context).as_deref(),
            Some("1-5759e988-bd862e3fe1be46a994272793")
        );
    }

    #[test]
    fn test_malformed_propagation_field() {
        for header in [
            "Sampled=1",
            "Root=1-5759e988-bd862e3fe1be46a99427279",
            "Root=2-5759e988-bd862e3fe1be46a994272793",
            "Root=1-5759e988-bd862e3fe1be46a99427279x",
            "Root=1-5759e988bd862e3fe1be46a9942727930",
            "Root=1-5759e988-bd862e3fe1be46a99427279é",
        ] {
            assert_eq!(trace_id(&context_with_field(header)), None, "{header}");
        }
    }

    #[test]
    fn test_propagation_field_root_inside_extra_value() {
        let context = context_with_field("Foo=Root=1-5759e988-bd862e3fe1be46a994272793");
        assert_eq!(trace_id(&context), None);
    }

    #[test]
    fn test_propagation_field_matches_like_extract() {
        let context = context_with_field("Rootage=1-5759E988-BD862E3FE1BE46A994272793");
        assert_eq!(
            trace_id(&context).as_deref(),
            Some("1-5759e988-bd862e3fe1be46a994272793")
        );

        let context = context_with_field(" Root = 1-5759e988-bd862e3fe1be46a994272793 ;Sampled=1");
        assert_eq!(
            trace_id(&context).as_deref(),
            Some("1-5759e988-bd862e3fe1be46a994272793")
        );
    }
}
