//! Response construction.
//!
//! # Responsibilities
//! - Wrap a relay body in a streaming 200 response
//! - Map relay errors raised before the response is committed to 500

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::relay::{ChannelBody, RelayError};

/// Body sent when the source cannot be opened.
pub const FILE_NOT_FOUND: &str = "File not found.";

/// Streaming response for a piped source of `len` bytes.
pub fn stream_response(body: ChannelBody, len: u64) -> Response {
    let mut response = Response::new(Body::from_stream(body));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    response
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match self {
            RelayError::SourceUnavailable { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, FILE_NOT_FOUND).into_response()
            }
            // Once streaming has begun the status is already on the wire.
            RelayError::SourceReadFailure { .. } | RelayError::SinkWriteFailure { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::{ChannelSink, Sink};
    use bytes::Bytes;
    use std::io;
    use std::path::PathBuf;

    #[tokio::test]
    async fn unavailable_source_is_500_with_message() {
        let err = RelayError::SourceUnavailable {
            path: PathBuf::from("test-file.txt"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], FILE_NOT_FOUND.as_bytes());
    }

    #[tokio::test]
    async fn streams_body_with_length() {
        let (mut sink, body) = ChannelSink::new(4);
        sink.ready().await.unwrap();
        sink.write(Bytes::from_static(b"hello")).unwrap();
        sink.finish();

        let response = stream_response(body, 5);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "5");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"hello");
    }

    #[tokio::test]
    async fn aborted_relay_errors_the_body() {
        let (mut sink, body) = ChannelSink::new(4);
        sink.ready().await.unwrap();
        sink.write(Bytes::from_static(b"part")).unwrap();
        let reason = RelayError::SourceReadFailure {
            bytes_delivered: 4,
            source: io::Error::other("disk gone"),
        };
        sink.abort(&reason).await;

        let response = stream_response(body, 100);
        assert!(axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .is_err());
    }
}
