//! Tower integration: governs a service by resource-level throttling.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use sentinel_core::{SentinelError, TokenResult};
use tower::{Layer, Service};

use crate::checker::ThrottlingChecker;

/// A [`tower::Layer`] that wraps a service with a [`ThrottlingChecker`].
///
/// `ShouldWait` decisions are realized as an internal `tokio::time::sleep`
/// before the inner service is polled; `Block` decisions short-circuit with
/// `SentinelError::Block` and never call the inner service.
#[derive(Clone)]
pub struct ThrottlingLayer {
    checker: Arc<ThrottlingChecker>,
}

impl ThrottlingLayer {
    pub fn new(checker: Arc<ThrottlingChecker>) -> Self {
        Self { checker }
    }
}

impl<S> Layer<S> for ThrottlingLayer {
    type Service = ThrottlingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ThrottlingService {
            inner,
            checker: Arc::clone(&self.checker),
        }
    }
}

/// The [`tower::Service`] produced by [`ThrottlingLayer`].
#[derive(Clone)]
pub struct ThrottlingService<S> {
    inner: S,
    checker: Arc<ThrottlingChecker>,
}

impl<S, Req> Service<Req> for ThrottlingService<S>
where
    S: Service<Req> + Clone + Send + 'static,
    S::Future: Send + 'static,
    Req: Send + 'static,
{
    type Response = S::Response;
    type Error = SentinelError<S::Error>;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(SentinelError::Application)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let result = self.checker.check_one();
        let mut inner = self.inner.clone();
        std::mem::swap(&mut self.inner, &mut inner);

        Box::pin(async move {
            match result {
                TokenResult::Pass => inner.call(req).await.map_err(SentinelError::Application),
                TokenResult::ShouldWait(duration) => {
                    tokio::time::sleep(duration).await;
                    inner.call(req).await.map_err(SentinelError::Application)
                }
                TokenResult::Blocked(block_error) => Err(SentinelError::Block(block_error)),
            }
        })
    }
}
