// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Header carrying the X-Ray trace context on HTTP requests and messages.
pub const AMZN_TRACE_ID_HEADER: &str = "x-amzn-trace-id";

/// Environment variable the Lambda runtime sets to the invocation's trace header.
pub const LAMBDA_TRACE_ID_ENV_VAR: &str = "_X_AMZN_TRACE_ID";
