// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Trace context types exchanged with the X-Ray codec.
//!
//! [`TraceHeader`] is the wire level model of one `x-amzn-trace-id` value.
//! [`SpanContext`] is the tracer's view of a span, and [`Extracted`] is what
//! extraction hands back to the tracer.

use std::collections::HashMap;

/// Parsed form of an `x-amzn-trace-id` header.
///
/// `Root=1-{epoch}-{random};Parent={parent_id};Sampled={sampled}{extra_fields}`
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct TraceHeader {
    /// Epoch seconds in the top 32 bits, first 8 hex digits of the random part below.
    /// Zero means no `Root` was found.
    pub trace_id_high: u64,
    /// Last 16 hex digits of the random part.
    pub trace_id_low: u64,
    pub parent_id: Option<u64>,
    /// `None` is the undecided `?` state.
    pub sampled: Option<bool>,
    /// Unrecognized fields, each with its leading `;`, in header order.
    pub extra_fields: String,
}

impl TraceHeader {
    pub fn has_trace_id(&self) -> bool {
        self.trace_id_high != 0
    }
}

/// Marker attached to contexts that were read with, or should be written with,
/// the X-Ray format. Holds the header fields this codec does not interpret.
#[derive(Clone, Default, Debug, PartialEq, Eq, Hash)]
pub struct AmznTraceId {
    fields: String,
}

impl AmznTraceId {
    pub fn new(fields: impl Into<String>) -> Self {
        Self {
            fields: fields.into(),
        }
    }

    /// Unrecognized fields, possibly empty, each starting with `;`
    pub fn fields(&self) -> &str {
        &self.fields
    }
}

/// Context of a span as modelled by the tracer.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct SpanContext {
    /// Upper 64 bits of the 128-bit trace id.
    pub trace_id_high: u64,
    /// Lower 64 bits of the 128-bit trace id.
    pub trace_id: u64,
    /// For an extracted context this is the upstream `Parent` segment.
    pub span_id: u64,
    pub sampled: Option<bool>,
    /// Present when the context went through the X-Ray codec.
    pub amzn_trace_id: Option<AmznTraceId>,
    /// Fields propagated as-is by other propagators, keyed by lower-case field name.
    pub propagation_fields: HashMap<String, String>,
    /// Whether this context was received from a remote service.
    pub is_remote: bool,
}

impl SpanContext {
    /// Full 128-bit trace id
    pub fn trace_id_128(&self) -> u128 {
        (u128::from(self.trace_id_high) << 64) | u128::from(self.trace_id)
    }
}

/// Outcome of reading a carrier with the X-Ray propagator.
#[derive(Clone, Debug, PartialEq)]
pub enum Extracted {
    /// No trace header was found.
    Empty { amzn_trace_id: AmznTraceId },
    /// The header had no usable `Root`: only the sampling decision survives.
    SamplingOnly {
        sampled: Option<bool>,
        amzn_trace_id: AmznTraceId,
    },
    /// A `Root` without `Parent`. The caller mints the span id.
    TraceIdOnly {
        trace_id_high: u64,
        trace_id: u64,
        sampled: Option<bool>,
        amzn_trace_id: AmznTraceId,
    },
    /// `Root` and `Parent` were both found.
    Full(SpanContext),
}

impl Extracted {
    pub(crate) fn from_header(header: TraceHeader) -> Self {
        let amzn_trace_id = AmznTraceId::new(header.extra_fields);

        if header.trace_id_high == 0 {
            return Extracted::SamplingOnly {
                sampled: header.sampled,
                amzn_trace_id,
            };
        }

        match header.parent_id {
            Some(parent_id) => Extracted::Full(SpanContext {
                trace_id_high: header.trace_id_high,
                trace_id: header.trace_id_low,
                span_id: parent_id,
                sampled: header.sampled,
                amzn_trace_id: Some(amzn_trace_id),
                propagation_fields: HashMap::new(),
                is_remote: true,
            }),
            None => Extracted::TraceIdOnly {
                trace_id_high: header.trace_id_high,
                trace_id: header.trace_id_low,
                sampled: header.sampled,
                amzn_trace_id,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Extracted::Empty { .. })
    }

    /// The span context, only for [`Extracted::Full`]
    pub fn context(&self) -> Option<&SpanContext> {
        match self {
            Extracted::Full(context) => Some(context),
            _ => None,
        }
    }

    pub fn into_context(self) -> Option<SpanContext> {
        match self {
            Extracted::Full(context) => Some(context),
            _ => None,
        }
    }

    pub fn sampled(&self) -> Option<bool> {
        match self {
            Extracted::Empty { .. } => None,
            Extracted::SamplingOnly { sampled, .. } | Extracted::TraceIdOnly { sampled, .. } => {
                *sampled
            }
            Extracted::Full(context) => context.sampled,
        }
    }

    /// `(trace_id_high, trace_id)` when a `Root` was extracted
    pub fn trace_id(&self) -> Option<(u64, u64)> {
        match self {
            Extracted::TraceIdOnly {
                trace_id_high,
                trace_id,
                ..
            } => Some((*trace_id_high, *trace_id)),
            Extracted::Full(context) => Some((context.trace_id_high, context.trace_id)),
            _ => None,
        }
    }

    /// Uninterpreted header fields, possibly empty
    pub fn extra(&self) -> &str {
        self.amzn_trace_id().fields()
    }

    pub fn amzn_trace_id(&self) -> &AmznTraceId {
        match self {
            Extracted::Empty { amzn_trace_id }
            | Extracted::SamplingOnly { amzn_trace_id, .. }
            | Extracted::TraceIdOnly { amzn_trace_id, .. } => amzn_trace_id,
            // Full contexts are always built with the marker
            Extracted::Full(context) => context
                .amzn_trace_id
                .as_ref()
                .unwrap_or(&EMPTY_AMZN_TRACE_ID),
        }
    }
}

static EMPTY_AMZN_TRACE_ID: AmznTraceId = AmznTraceId {
    fields: String::new(),
};
