//! Object API handlers.
//!
//! These are the wrapped collaborators of the accounting layer: each one
//! performs its storage operation and reports body traffic through the
//! [`TrafficRecorder`] mid-flight. Status codes matter here; S3 XML response
//! fidelity does not.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::request::extract_bucket_and_object;
use crate::http::server::GatewayState;
use crate::storage::StoreError;

fn store_error_response(err: StoreError) -> Response {
    let status = match err {
        StoreError::NoSuchBucket(_) | StoreError::NoSuchKey(_) => StatusCode::NOT_FOUND,
        StoreError::BucketExists(_) | StoreError::BucketNotEmpty(_) => StatusCode::CONFLICT,
    };
    (status, err.to_string()).into_response()
}

pub async fn list_buckets(state: Arc<GatewayState>, _req: Request<Body>) -> Response {
    let names = state.store.list_buckets();
    (StatusCode::OK, names.join("\n")).into_response()
}

pub async fn create_bucket(state: Arc<GatewayState>, req: Request<Body>) -> Response {
    let (bucket, _) = extract_bucket_and_object(req.uri().path());
    match state.store.create_bucket(&bucket) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => store_error_response(e),
    }
}

pub async fn delete_bucket(state: Arc<GatewayState>, req: Request<Body>) -> Response {
    let (bucket, _) = extract_bucket_and_object(req.uri().path());
    match state.store.delete_bucket(&bucket) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => store_error_response(e),
    }
}

pub async fn list_objects(state: Arc<GatewayState>, req: Request<Body>) -> Response {
    let (bucket, _) = extract_bucket_and_object(req.uri().path());
    match state.store.list_objects(&bucket) {
        Ok(keys) => (StatusCode::OK, keys.join("\n")).into_response(),
        Err(e) => store_error_response(e),
    }
}

pub async fn put_object(state: Arc<GatewayState>, req: Request<Body>) -> Response {
    let (parts, body) = req.into_parts();
    let (bucket, key) = extract_bucket_and_object(parts.uri.path());

    let data = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(data) => data,
        Err(_) => {
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };
    state.traffic.bytes_received(data.len() as u64, &parts);

    match state.store.put_object(&bucket, &key, data) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => store_error_response(e),
    }
}

/// PUT with an `x-amz-copy-source` header: server-side copy, no body traffic.
pub async fn copy_object(state: Arc<GatewayState>, req: Request<Body>) -> Response {
    let (dst_bucket, dst_key) = extract_bucket_and_object(req.uri().path());
    let source = req
        .headers()
        .get("x-amz-copy-source")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let (src_bucket, src_key) = extract_bucket_and_object(source);

    let data = match state.store.get_object(&src_bucket, &src_key) {
        Ok(data) => data,
        Err(e) => return store_error_response(e),
    };
    match state.store.put_object(&dst_bucket, &dst_key, data) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => store_error_response(e),
    }
}

pub async fn get_object(state: Arc<GatewayState>, req: Request<Body>) -> Response {
    let start = Instant::now();
    let (parts, _body) = req.into_parts();
    let (bucket, key) = extract_bucket_and_object(parts.uri.path());

    match state.store.get_object(&bucket, &key) {
        Ok(data) => {
            state.traffic.time_to_first_byte("GetObject", start, &parts);
            state.traffic.bytes_sent(data.len() as u64, &parts);
            (StatusCode::OK, data).into_response()
        }
        Err(e) => store_error_response(e),
    }
}

pub async fn head_object(state: Arc<GatewayState>, req: Request<Body>) -> Response {
    let (bucket, key) = extract_bucket_and_object(req.uri().path());
    match state.store.head_object(&bucket, &key) {
        Ok(len) => (
            StatusCode::OK,
            [(header::CONTENT_LENGTH, len.to_string())],
            Body::empty(),
        )
            .into_response(),
        Err(e) => store_error_response(e),
    }
}

pub async fn delete_object(state: Arc<GatewayState>, req: Request<Body>) -> Response {
    let (bucket, key) = extract_bucket_and_object(req.uri().path());
    match state.store.delete_object(&bucket, &key) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => store_error_response(e),
    }
}
