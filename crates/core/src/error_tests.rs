// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    bad_request = { 400, ErrorClass::Permanent },
    unauthorized = { 401, ErrorClass::Permanent },
    forbidden = { 403, ErrorClass::Permanent },
    not_found = { 404, ErrorClass::Permanent },
    teapot = { 418, ErrorClass::Permanent },
    request_timeout = { 408, ErrorClass::Timeout },
    gateway_timeout = { 504, ErrorClass::Timeout },
    rate_limited = { 429, ErrorClass::Resource },
    server_error = { 500, ErrorClass::Transient },
    bad_gateway = { 502, ErrorClass::Transient },
    unavailable = { 503, ErrorClass::Transient },
)]
fn status_classification(status: u16, expected: ErrorClass) {
    assert_eq!(ErrorClass::from_status(status), expected);
}

#[parameterized(
    enoent = { "ENOENT: no such file", ErrorClass::Permanent },
    enotfound = { "getaddrinfo ENOTFOUND api.example.com", ErrorClass::Permanent },
    auth = { "AuthenticationError: bad key", ErrorClass::Permanent },
    bad_request = { "BadRequestError: malformed", ErrorClass::Permanent },
    conn_reset = { "read ECONNRESET", ErrorClass::Transient },
    conn_refused = { "connect ECONNREFUSED 127.0.0.1", ErrorClass::Transient },
    api_connection = { "APIConnectionError: socket hang up", ErrorClass::Transient },
    abort = { "AbortError: the operation was aborted", ErrorClass::Timeout },
    timeout_word = { "request timeout after 30s", ErrorClass::Timeout },
    timed_out = { "operation timed out", ErrorClass::Timeout },
    enomem = { "ENOMEM: cannot allocate", ErrorClass::Resource },
    enospc = { "ENOSPC: no space left on device", ErrorClass::Resource },
    oom = { "worker killed: out of memory", ErrorClass::Resource },
    rate_limit = { "RateLimitError: slow down", ErrorClass::Resource },
    overloaded = { "OverloadedError: try later", ErrorClass::Resource },
    mystery = { "something odd happened", ErrorClass::Unknown },
)]
fn message_classification(message: &str, expected: ErrorClass) {
    assert_eq!(ErrorClass::from_message(message), expected);
}

#[test]
fn status_wins_over_message() {
    // 401 with a timeout-sounding message is still permanent
    assert_eq!(ErrorClass::classify(Some(401), "request timeout"), ErrorClass::Permanent);
}

#[test]
fn unknown_status_falls_back_to_message() {
    assert_eq!(ErrorClass::classify(Some(302), "ECONNRESET"), ErrorClass::Transient);
}

#[test]
fn retry_and_breaker_treatment() {
    assert!(!ErrorClass::Permanent.is_retryable());
    assert!(!ErrorClass::Permanent.counts_toward_breaker());

    for class in [ErrorClass::Transient, ErrorClass::Timeout, ErrorClass::Resource] {
        assert!(class.is_retryable());
        assert!(class.counts_toward_breaker());
    }

    // Unknown retries but never trips a breaker
    assert!(ErrorClass::Unknown.is_retryable());
    assert!(!ErrorClass::Unknown.counts_toward_breaker());
}

#[test]
fn task_error_constructors_classify() {
    assert_eq!(TaskError::from_message("ECONNRESET").class, ErrorClass::Transient);
    assert_eq!(TaskError::from_status(429, "slow down").class, ErrorClass::Resource);
    assert_eq!(TaskError::permanent("nope").class, ErrorClass::Permanent);
}
