//! Payload stream type and helpers.

use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};

/// Type alias for response bodies streamed from a backend.
///
/// Dropping the stream closes the underlying response body.
pub type PayloadStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Creates a [`PayloadStream`] yielding the given contents in chunks of at most `chunk_size`.
pub fn make_stream(contents: Bytes, chunk_size: usize) -> PayloadStream {
    let chunk_size = chunk_size.max(1);
    let chunks: Vec<_> = (0..contents.len())
        .step_by(chunk_size)
        .map(|start| {
            let end = (start + chunk_size).min(contents.len());
            Ok(contents.slice(start..end))
        })
        .collect();

    futures_util::stream::iter(chunks).boxed()
}

/// Collects a [`PayloadStream`] into a `Vec<u8>`.
pub async fn read_to_vec(mut stream: PayloadStream) -> std::io::Result<Vec<u8>> {
    let mut payload = Vec::new();
    while let Some(chunk) = stream.try_next().await? {
        payload.extend(&chunk);
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn chunks_cover_the_whole_payload() {
        let stream = make_stream(Bytes::from_static(b"hello world"), 4);
        let chunks: Vec<_> = stream.try_collect().await.unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2], Bytes::from_static(b"rld"));
    }

    #[tokio::test]
    async fn empty_payload_yields_no_chunks() {
        let stream = make_stream(Bytes::new(), 4);
        assert!(read_to_vec(stream).await.unwrap().is_empty());
    }
}
