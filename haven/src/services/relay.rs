use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};

use crate::cache::{self, KvCache};
use crate::llm::TextStream;

/// Text fragments forwarded to the client. Upstream errors never reach the
/// client through this stream; they end it instead.
pub type RelayStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Forwards model fragments as they arrive and caches the full answer once
/// the model finishes.
///
/// Empty fragments are skipped. A mid-stream error is logged and closes the
/// stream without caching. Dropping the returned stream (client disconnect)
/// stops the relay and nothing is cached either.
pub fn relay(
    mut upstream: TextStream,
    cache: Arc<dyn KvCache>,
    key: String,
    ttl: Duration,
) -> RelayStream {
    Box::pin(async_stream::stream! {
        let mut full = String::new();
        let mut clean = true;

        while let Some(item) = upstream.next().await {
            match item {
                Ok(fragment) if fragment.is_empty() => {}
                Ok(fragment) => {
                    full.push_str(&fragment);
                    yield fragment;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Stream error");
                    clean = false;
                    break;
                }
            }
        }

        if clean && !full.is_empty() {
            // The client already has every byte; the write must not delay
            // the end of the body.
            tokio::spawn(async move {
                cache::store(cache.as_ref(), &key, &full, ttl).await;
                tracing::info!(bytes = full.len(), "Response cached");
            });
        }
    })
}
