// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Fixed width lowercase hex encoding into pre-sized buffers.
//!
//! The caller guarantees `offset + 2` (resp. `offset + 16`) is within `dest`.

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Writes the 2 hex characters of `b` at `dest[offset..offset + 2]`.
#[inline]
pub(crate) fn write_hex_u8(dest: &mut [u8], offset: usize, b: u8) {
    dest[offset] = HEX_DIGITS[(b >> 4) as usize];
    dest[offset + 1] = HEX_DIGITS[(b & 0xf) as usize];
}

/// Writes the 16 hex characters of `v`, most significant nibble first.
#[inline]
pub(crate) fn write_hex_u64(dest: &mut [u8], offset: usize, v: u64) {
    for (i, b) in v.to_be_bytes().into_iter().enumerate() {
        write_hex_u8(dest, offset + i * 2, b);
    }
}

/// Value of an ASCII hex digit, in either case.
#[inline]
pub(crate) fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}
