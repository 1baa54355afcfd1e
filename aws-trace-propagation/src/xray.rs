// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! `x-amzn-trace-id` codec.
//!
//! ```text
//! Root=1-67891233-abcdef012345678912345678;Parent=463ac35c9f6413ad;Sampled=1;Foo=bar
//!      | |        |                        |                              |
//!      | epoch    random (96 bits)         parent segment id              extra field
//!      version
//! ```

use std::sync::LazyLock;

use dd_aws_trace::{aws_debug, constants::AMZN_TRACE_ID_HEADER};

use crate::{
    carrier::{Extractor, Injector},
    context::{AmznTraceId, Extracted, SpanContext, TraceHeader},
    error::Error,
    hex::{hex_value, write_hex_u64, write_hex_u8},
};

pub const AMZN_TRACE_ID_KEY: &str = AMZN_TRACE_ID_HEADER;

const PROPAGATOR_NAME: &str = "xray";

const ROOT_FIELD: &str = "Root";
const PARENT_FIELD: &str = "Parent";
const SAMPLED_FIELD: &str = "Sampled";
const SELF_FIELD: &str = "Self";

const ROOT_PREFIX: &[u8] = b"Root=";
const PARENT_PREFIX: &[u8] = b";Parent=";
const SAMPLED_PREFIX: &[u8] = b";Sampled=";

/// `1-XXXXXXXX-XXXXXXXXXXXXXXXXXXXXXXXX`
pub const ROOT_LENGTH: usize = 35;
const PARENT_OFFSET: usize = ROOT_PREFIX.len() + ROOT_LENGTH;
const SAMPLED_OFFSET: usize = PARENT_OFFSET + PARENT_PREFIX.len() + 16;
/// Length of a rendered header without extra fields
pub const HEADER_LENGTH: usize = SAMPLED_OFFSET + SAMPLED_PREFIX.len() + 1;

static XRAY_HEADER_KEYS: LazyLock<[String; 1]> =
    LazyLock::new(|| [AMZN_TRACE_ID_KEY.to_owned()]);

pub fn keys() -> &'static [String] {
    XRAY_HEADER_KEYS.as_slice()
}

pub fn extract(carrier: &dyn Extractor) -> Extracted {
    match carrier.get(AMZN_TRACE_ID_KEY) {
        Some(value) if !value.trim().is_empty() => {
            let header = parse_header(value);
            aws_debug!("Propagator (xray): extracted {header:?}");
            Extracted::from_header(header)
        }
        _ => {
            aws_debug!("Propagator (xray): no trace header found");
            Extracted::Empty {
                amzn_trace_id: AmznTraceId::default(),
            }
        }
    }
}

pub fn inject(context: &SpanContext, carrier: &mut dyn Injector) {
    // a zero epoch half reads back as a header without trace
    if context.trace_id_high == 0 {
        Error::inject("trace id has no upper 64 bits", PROPAGATOR_NAME).log();
        return;
    }
    if context.span_id == 0 {
        Error::inject("span id is zero", PROPAGATOR_NAME).log();
        return;
    }

    let extra_fields = context
        .amzn_trace_id
        .as_ref()
        .map(AmznTraceId::fields)
        .unwrap_or_default();

    let header = render(
        context.trace_id_high,
        context.trace_id,
        context.span_id,
        context.sampled,
        extra_fields,
    );

    aws_debug!("Propagator (xray): injecting {header}");

    carrier.set(AMZN_TRACE_ID_KEY, header);
}

/// Renders `header` in the layout AWS expects. A missing parent is written as zeros.
pub fn render_header(header: &TraceHeader) -> String {
    render(
        header.trace_id_high,
        header.trace_id_low,
        header.parent_id.unwrap_or(0),
        header.sampled,
        &header.extra_fields,
    )
}

fn render(
    trace_id_high: u64,
    trace_id_low: u64,
    parent_id: u64,
    sampled: Option<bool>,
    extra_fields: &str,
) -> String {
    let mut buf = [0u8; HEADER_LENGTH];

    buf[..ROOT_PREFIX.len()].copy_from_slice(ROOT_PREFIX);
    write_root(&mut buf, ROOT_PREFIX.len(), trace_id_high, trace_id_low);

    buf[PARENT_OFFSET..PARENT_OFFSET + PARENT_PREFIX.len()].copy_from_slice(PARENT_PREFIX);
    write_hex_u64(&mut buf, PARENT_OFFSET + PARENT_PREFIX.len(), parent_id);

    buf[SAMPLED_OFFSET..SAMPLED_OFFSET + SAMPLED_PREFIX.len()].copy_from_slice(SAMPLED_PREFIX);
    buf[HEADER_LENGTH - 1] = match sampled {
        Some(true) => b'1',
        Some(false) => b'0',
        None => b'?',
    };

    let mut header = String::with_capacity(HEADER_LENGTH + extra_fields.len());
    header.extend(buf.iter().copied().map(char::from));
    header.push_str(extra_fields);
    header
}

/// Writes the 35 characters of the `Root` value at `dest[offset..]`.
fn write_root(dest: &mut [u8], offset: usize, trace_id_high: u64, trace_id_low: u64) {
    let high = trace_id_high.to_be_bytes();

    dest[offset] = b'1';
    dest[offset + 1] = b'-';
    // epoch seconds
    for (i, b) in high[..4].iter().enumerate() {
        write_hex_u8(dest, offset + 2 + i * 2, *b);
    }
    dest[offset + 10] = b'-';
    // first 32 bits of the random part
    for (i, b) in high[4..].iter().enumerate() {
        write_hex_u8(dest, offset + 11 + i * 2, *b);
    }
    write_hex_u64(dest, offset + 19, trace_id_low);
}

/// The `Root` value of the context's trace id: `1-XXXXXXXX-XXXXXXXXXXXXXXXXXXXXXXXX`
pub fn trace_id_string(context: &SpanContext) -> String {
    let mut buf = [0u8; ROOT_LENGTH];
    write_root(&mut buf, 0, context.trace_id_high, context.trace_id);
    buf.iter().copied().map(char::from).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Root,
    Parent,
    Sampled,
    SelfField,
    Extra,
}

impl Field {
    /// AWS matches field names by prefix: `Rootage` is still a `Root`.
    fn classify(name: &str) -> Self {
        if name.starts_with(ROOT_FIELD) {
            Field::Root
        } else if name.starts_with(PARENT_FIELD) {
            Field::Parent
        } else if name.starts_with(SAMPLED_FIELD) {
            Field::Sampled
        } else if name.starts_with(SELF_FIELD) {
            Field::SelfField
        } else {
            Field::Extra
        }
    }
}

/// Parses an `x-amzn-trace-id` value.
///
/// Never fails: a malformed `Root` or `Parent` stops the scan and everything
/// read before that point is returned.
pub fn parse_header(value: &str) -> TraceHeader {
    let mut header = TraceHeader::default();

    if let Err(e) = Scanner::new(value).scan(&mut header) {
        e.log();
    }

    // A parent is meaningless without the trace it belongs to
    if header.trace_id_high == 0 {
        header.parent_id = None;
    }

    header
}

struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Scanner { input, pos: 0 }
    }

    fn scan(&mut self, header: &mut TraceHeader) -> Result<(), Error> {
        let mut name = String::new();

        while let Some(c) = self.peek() {
            self.pos += c.len_utf8();
            match c {
                ' ' => {}
                // a name without value is dropped
                ';' => name.clear(),
                '=' => {
                    match Field::classify(&name) {
                        Field::Root => {
                            let (high, low) = self.read_root()?;
                            header.trace_id_high = high;
                            header.trace_id_low = low;
                            self.skip_value();
                        }
                        Field::Parent => {
                            self.skip_spaces();
                            header.parent_id =
                                Some(self.read_hex(16, "non hex character in `Parent`")?);
                            self.skip_value();
                        }
                        Field::Sampled => {
                            self.skip_spaces();
                            header.sampled = match self.peek() {
                                Some('1') => Some(true),
                                Some('0') => Some(false),
                                _ => None,
                            };
                            self.skip_value();
                        }
                        Field::SelfField => self.skip_value(),
                        Field::Extra => {
                            header.extra_fields.push(';');
                            header.extra_fields.push_str(&name);
                            header.extra_fields.push('=');
                            self.copy_value(&mut header.extra_fields);
                        }
                    }
                    name.clear();
                }
                c => name.push(c),
            }
        }

        Ok(())
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn skip_spaces(&mut self) {
        while self.input.as_bytes().get(self.pos) == Some(&b' ') {
            self.pos += 1;
        }
    }

    /// Moves to the next `;` without consuming it.
    fn skip_value(&mut self) {
        self.pos = self.input[self.pos..]
            .find(';')
            .map_or(self.input.len(), |i| self.pos + i);
    }

    /// Appends the value up to the next `;`, minus spaces.
    fn copy_value(&mut self, out: &mut String) {
        while let Some(c) = self.peek() {
            if c == ';' {
                break;
            }
            self.pos += c.len_utf8();
            if c != ' ' {
                out.push(c);
            }
        }
    }

    fn expect_byte(&mut self, expected: u8, message: &'static str) -> Result<(), Error> {
        match self.input.as_bytes().get(self.pos) {
            Some(c) if *c == expected => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(Error::extract(message, PROPAGATOR_NAME)),
        }
    }

    /// Reads exactly `width` hex digits, big endian.
    fn read_hex(&mut self, width: usize, message: &'static str) -> Result<u64, Error> {
        let window = self
            .input
            .as_bytes()
            .get(self.pos..self.pos + width)
            .ok_or(Error::extract("truncated trace header", PROPAGATOR_NAME))?;

        let mut value = 0u64;
        for c in window {
            let digit = hex_value(*c).ok_or(Error::extract(message, PROPAGATOR_NAME))?;
            value = (value << 4) | u64::from(digit);
        }

        self.pos += width;
        Ok(value)
    }

    /// `1-{8 hex epoch}-{24 hex random}`, returned as `(high, low)`
    fn read_root(&mut self) -> Result<(u64, u64), Error> {
        self.skip_spaces();
        self.expect_byte(b'1', "unsupported `Root` version")?;
        self.expect_byte(b'-', "missing `-` after `Root` version")?;
        let epoch = self.read_hex(8, "non hex character in `Root` epoch")?;
        self.expect_byte(b'-', "missing `-` after `Root` epoch")?;
        let random_high = self.read_hex(8, "non hex character in `Root`")?;
        let random_low = self.read_hex(16, "non hex character in `Root`")?;

        Ok(((epoch << 32) | random_high, random_low))
    }
}
