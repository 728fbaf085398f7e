//! Read/write operation classification for billing counters.

use axum::http::{HeaderMap, Method};

/// Billing category for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationCategory {
    Read,
    Write,
    Other,
}

// Ordered rule lists: read patterns are checked before write patterns, so
// e.g. "GetObjectTagging" stays a read even though it contains no write
// pattern and a hypothetical overlap resolves toward Read.
const READ_PATTERNS: &[&str] = &["get", "head"];
const WRITE_PATTERNS: &[&str] = &[
    "put", "post", "delete", "copy", "create", "complete", "abort", "uploadpart", "list",
    "multipart",
];

/// Headers that make a request conditional, including the S3 copy-source
/// variants carried by CopyObject/UploadPartCopy.
const CONDITIONAL_HEADERS: &[&str] = &[
    "if-match",
    "if-none-match",
    "if-modified-since",
    "if-unmodified-since",
    "x-amz-copy-source-if-match",
    "x-amz-copy-source-if-none-match",
    "x-amz-copy-source-if-modified-since",
    "x-amz-copy-source-if-unmodified-since",
];

/// Classify an action name into a billing category.
///
/// Case-insensitive substring match on the action name first; when the name
/// matches neither rule list, fall back to the HTTP method.
pub fn classify(action: &str, method: &Method) -> OperationCategory {
    let action = action.to_ascii_lowercase();

    if READ_PATTERNS.iter().any(|p| action.contains(p)) {
        return OperationCategory::Read;
    }
    if WRITE_PATTERNS.iter().any(|p| action.contains(p)) {
        return OperationCategory::Write;
    }

    if method == Method::GET || method == Method::HEAD {
        OperationCategory::Read
    } else if method == Method::PUT || method == Method::POST || method == Method::DELETE {
        OperationCategory::Write
    } else {
        OperationCategory::Other
    }
}

/// True when the request carries any standard or copy-source conditional
/// header with a non-empty value.
pub fn is_conditional(headers: &HeaderMap) -> bool {
    CONDITIONAL_HEADERS.iter().any(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| !v.is_empty())
    })
}
