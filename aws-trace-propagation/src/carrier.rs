// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Code inspired, and copied, by OpenTelemetry Rust project.
/// <https://github.com/open-telemetry/opentelemetry-rust/blob/main/opentelemetry/src/propagation/mod.rs>
use std::collections::HashMap;

use http::{HeaderMap, HeaderName, HeaderValue};

use crate::error::Error;

/// Injector provides an interface for a carrier to be used
/// with a Propagator to inject a Context into the carrier.
pub trait Injector {
    /// Set a value in the carrier.
    fn set(&mut self, key: &str, value: String);
}

pub trait Extractor {
    /// Get a value from the carrier.
    fn get(&self, key: &str) -> Option<&str>;

    /// Get all keys from the carrier.
    fn keys(&self) -> Vec<&str>;
}

impl<S: std::hash::BuildHasher> Injector for HashMap<String, String, S> {
    /// Set a key and value in the `HashMap`.
    fn set(&mut self, key: &str, value: String) {
        self.insert(key.to_lowercase(), value);
    }
}

impl<S: std::hash::BuildHasher> Extractor for HashMap<String, String, S> {
    /// Get a value for a key from the `HashMap`.
    fn get(&self, key: &str) -> Option<&str> {
        self.get(&key.to_lowercase()).map(String::as_str)
    }

    /// Collect all the keys from the `HashMap`.
    fn keys(&self) -> Vec<&str> {
        self.keys().map(String::as_str).collect::<Vec<_>>()
    }
}

impl Injector for HeaderMap {
    fn set(&mut self, key: &str, value: String) {
        match (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                self.insert(name, value);
            }
            _ => Error::inject("invalid http header", "http").log(),
        }
    }
}

impl Extractor for HeaderMap {
    /// Header names are case insensitive. Values that are not valid UTF-8 are ignored.
    fn get(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|value| std::str::from_utf8(value.as_bytes()).ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.keys().map(HeaderName::as_str).collect::<Vec<_>>()
    }
}

/// A bare header value, such as the one found in `_X_AMZN_TRACE_ID`.
///
/// Every key resolves to the wrapped value.
#[derive(Debug, Clone, Copy)]
pub struct SingleValue<'a>(pub &'a str);

impl Extractor for SingleValue<'_> {
    fn get(&self, _key: &str) -> Option<&str> {
        Some(self.0)
    }

    fn keys(&self) -> Vec<&str> {
        Vec::new()
    }
}

/// Receives an injected header value, whatever its key.
#[derive(Debug)]
pub struct SingleValueMut<'a>(pub &'a mut String);

impl Injector for SingleValueMut<'_> {
    fn set(&mut self, _key: &str, value: String) {
        *self.0 = value;
    }
}

impl Extractor for &dyn opentelemetry::propagation::Extractor {
    fn get(&self, key: &str) -> Option<&str> {
        opentelemetry::propagation::Extractor::get(*self, key)
    }

    fn keys(&self) -> Vec<&str> {
        opentelemetry::propagation::Extractor::keys(*self)
    }
}

impl Injector for &mut dyn opentelemetry::propagation::Injector {
    fn set(&mut self, key: &str, value: String) {
        opentelemetry::propagation::Injector::set(*self, key, value);
    }
}

#[cfg(feature = "sqs")]
pub use sqs::{SqsMessageAttributes, SqsMessageAttributesMut};

#[cfg(feature = "sqs")]
mod sqs {
    use std::collections::HashMap;

    use aws_sdk_sqs::types::MessageAttributeValue;

    use super::{Extractor, Injector};
    use crate::error::Error;

    /// SQS rejects messages with more attributes.
    const SQS_MAX_ATTRIBUTES: usize = 10;

    /// Message attributes of a received SQS message.
    pub struct SqsMessageAttributes<'a>(pub &'a HashMap<String, MessageAttributeValue>);

    impl Extractor for SqsMessageAttributes<'_> {
        /// Attribute names are case sensitive, an exact match is preferred.
        fn get(&self, key: &str) -> Option<&str> {
            self.0
                .get(key)
                .or_else(|| {
                    self.0
                        .iter()
                        .find(|(name, _)| name.eq_ignore_ascii_case(key))
                        .map(|(_, value)| value)
                })
                .and_then(MessageAttributeValue::string_value)
        }

        fn keys(&self) -> Vec<&str> {
            self.0.keys().map(String::as_str).collect()
        }
    }

    /// Message attributes of an outgoing SQS message.
    pub struct SqsMessageAttributesMut<'a>(pub &'a mut HashMap<String, MessageAttributeValue>);

    impl Injector for SqsMessageAttributesMut<'_> {
        fn set(&mut self, key: &str, value: String) {
            if !self.0.contains_key(key) && self.0.len() >= SQS_MAX_ATTRIBUTES {
                Error::inject("too many message attributes", "sqs").log();
                return;
            }

            match MessageAttributeValue::builder()
                .data_type("String")
                .string_value(value)
                .build()
            {
                Ok(attribute) => {
                    self.0.insert(key.to_owned(), attribute);
                }
                Err(_) => Error::inject("invalid message attribute", "sqs").log(),
            }
        }
    }

}
