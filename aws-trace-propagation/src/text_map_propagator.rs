// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::{collections::HashMap, sync::Arc};

use dd_aws_trace::Config;
use opentelemetry::{
    baggage::BaggageExt,
    propagation::{text_map_propagator::FieldIter, TextMapPropagator},
    trace::{TraceContextExt, TraceFlags, TraceState},
};

use crate::{
    context::{AmznTraceId, Extracted, SpanContext},
    current::CurrentTraceContext,
    xray::AMZN_TRACE_ID_KEY,
    AwsPropagator, Propagator,
};

const TRACE_FLAG_DEFERRED: TraceFlags = TraceFlags::new(0x02);

/// Sampling decision of a header without usable `Root`, kept in the
/// [`opentelemetry::Context`] since it cannot be expressed as a span context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XraySampling(pub Option<bool>);

/// [`TextMapPropagator`] reading and writing `x-amzn-trace-id`.
#[derive(Debug)]
pub struct XrayTextMapPropagator {
    inner: AwsPropagator,
}

impl XrayTextMapPropagator {
    pub fn new(config: &Config) -> Self {
        XrayTextMapPropagator {
            inner: AwsPropagator::new(Arc::new(config.clone())),
        }
    }
}

impl TextMapPropagator for XrayTextMapPropagator {
    fn inject_context(
        &self,
        cx: &opentelemetry::Context,
        injector: &mut dyn opentelemetry::propagation::Injector,
    ) {
        if let Some(span_context) = cx.current_span_context() {
            let mut injector = injector;
            self.inner.inject(&span_context, &mut injector);
        }
    }

    fn extract_with_context(
        &self,
        cx: &opentelemetry::Context,
        extractor: &dyn opentelemetry::propagation::Extractor,
    ) -> opentelemetry::Context {
        match self.inner.extract(&extractor) {
            Some(Extracted::Full(span_context)) => {
                let otel_span_context = opentelemetry::trace::SpanContext::new(
                    opentelemetry::TraceId::from(span_context.trace_id_128()),
                    opentelemetry::SpanId::from(span_context.span_id),
                    trace_flags(span_context.sampled),
                    span_context.is_remote,
                    TraceState::default(),
                );

                cx.with_remote_span_context(otel_span_context)
                    .with_value(span_context.amzn_trace_id.unwrap_or_default())
            }
            Some(Extracted::Empty { amzn_trace_id }) => cx.with_value(amzn_trace_id),
            Some(extracted) => cx
                .with_value(XraySampling(extracted.sampled()))
                .with_value(extracted.amzn_trace_id().clone()),
            None => cx.clone(),
        }
    }

    fn fields(&self) -> FieldIter<'_> {
        FieldIter::new(self.inner.keys())
    }
}

fn trace_flags(sampled: Option<bool>) -> TraceFlags {
    match sampled {
        Some(true) => TraceFlags::SAMPLED,
        Some(false) => TraceFlags::default(),
        None => TRACE_FLAG_DEFERRED,
    }
}

fn sampled(flags: TraceFlags) -> Option<bool> {
    if flags.is_sampled() {
        Some(true)
    } else if flags.to_u8() & TRACE_FLAG_DEFERRED.to_u8() != 0 {
        None
    } else {
        Some(false)
    }
}

impl CurrentTraceContext for opentelemetry::Context {
    fn current_span_context(&self) -> Option<SpanContext> {
        let span = self.span();
        let otel_span_context = span.span_context();
        if !otel_span_context.is_valid() {
            return None;
        }

        let trace_id = u128::from_be_bytes(otel_span_context.trace_id().to_bytes());

        let mut propagation_fields = HashMap::new();
        if let Some(header) = self.baggage().get(AMZN_TRACE_ID_KEY) {
            propagation_fields.insert(AMZN_TRACE_ID_KEY.to_owned(), header.to_string());
        }

        Some(SpanContext {
            trace_id_high: (trace_id >> 64) as u64,
            trace_id: trace_id as u64,
            span_id: u64::from_be_bytes(otel_span_context.span_id().to_bytes()),
            sampled: sampled(otel_span_context.trace_flags()),
            amzn_trace_id: self.get::<AmznTraceId>().cloned(),
            propagation_fields,
            is_remote: otel_span_context.is_remote(),
        })
    }
}
