//! Tower integration for the whole composed engine: a single [`SentinelLayer`]
//! runs a request through throttling, hotspot, gray routing, and the circuit
//! breaker's completion bridge, in one `Service::call`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use sentinel_core::{RequestInput, ResourceKind, SentinelError, TrafficDirection};
use tower::{Layer, Service};

use crate::engine::{EntryDecision, SentinelEngine};

/// Builds the [`RequestInput`] the engine's slots (the hotspot argument
/// extractor, in particular) read for a given `tower::Service` request type.
/// The default `()`-returning closure is enough for services that don't key
/// any hotspot rule off request contents.
pub type RequestInputFn<Req> = Arc<dyn Fn(&Req) -> RequestInput + Send + Sync>;

/// A [`tower::Layer`] that governs a service with a whole [`SentinelEngine`]
/// chain for one fixed resource.
///
/// `ShouldWait` decisions are realized as an internal `tokio::time::sleep`
/// before the inner service is polled; `Block` decisions short-circuit with
/// `SentinelError::Block` and never call the inner service. On completion
/// the inner service's `Result` is reported back to the chain (notably the
/// bound circuit breaker, if any) via `Exit()`.
#[derive(Clone)]
pub struct SentinelLayer<Req> {
    engine: Arc<SentinelEngine>,
    resource: String,
    traffic_direction: TrafficDirection,
    resource_kind: ResourceKind,
    request_input: RequestInputFn<Req>,
}

impl<Req> SentinelLayer<Req> {
    /// Governs `resource` as an inbound, common-kind call, with no request
    /// data exposed to the hotspot extractor.
    pub fn new(engine: Arc<SentinelEngine>, resource: impl Into<String>) -> Self {
        Self {
            engine,
            resource: resource.into(),
            traffic_direction: TrafficDirection::Inbound,
            resource_kind: ResourceKind::Common,
            request_input: Arc::new(|_req: &Req| RequestInput::default()),
        }
    }

    pub fn traffic_direction(mut self, traffic_direction: TrafficDirection) -> Self {
        self.traffic_direction = traffic_direction;
        self
    }

    pub fn resource_kind(mut self, resource_kind: ResourceKind) -> Self {
        self.resource_kind = resource_kind;
        self
    }

    /// Supplies a closure that turns an inbound request into the
    /// [`RequestInput`] hotspot rules extract arguments from.
    pub fn with_request_input<F>(mut self, f: F) -> Self
    where
        F: Fn(&Req) -> RequestInput + Send + Sync + 'static,
    {
        self.request_input = Arc::new(f);
        self
    }
}

impl<S, Req> Layer<S> for SentinelLayer<Req> {
    type Service = SentinelService<S, Req>;

    fn layer(&self, inner: S) -> Self::Service {
        SentinelService {
            inner,
            engine: Arc::clone(&self.engine),
            resource: self.resource.clone(),
            traffic_direction: self.traffic_direction,
            resource_kind: self.resource_kind,
            request_input: Arc::clone(&self.request_input),
        }
    }
}

/// The [`tower::Service`] produced by [`SentinelLayer`].
#[derive(Clone)]
pub struct SentinelService<S, Req> {
    inner: S,
    engine: Arc<SentinelEngine>,
    resource: String,
    traffic_direction: TrafficDirection,
    resource_kind: ResourceKind,
    request_input: RequestInputFn<Req>,
}

impl<S, Req> Service<Req> for SentinelService<S, Req>
where
    S: Service<Req> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: std::fmt::Display,
    Req: Send + 'static,
{
    type Response = S::Response;
    type Error = SentinelError<S::Error>;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(SentinelError::Application)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let input = (self.request_input)(&req);
        let decision = self.engine.entry(
            self.resource.clone(),
            self.traffic_direction,
            self.resource_kind,
            input,
        );

        let mut inner = self.inner.clone();
        std::mem::swap(&mut self.inner, &mut inner);

        Box::pin(async move {
            let (handle, wait) = match decision {
                Ok(EntryDecision::Pass(handle)) => (handle, None),
                Ok(EntryDecision::Wait(handle, duration)) => (handle, Some(duration)),
                Err(block_error) => return Err(SentinelError::Block(block_error)),
            };
            if let Some(duration) = wait {
                tokio::time::sleep(duration).await;
            }

            match inner.call(req).await {
                Ok(response) => {
                    handle.exit(None);
                    Ok(response)
                }
                Err(err) => {
                    let message = err.to_string();
                    handle.exit(Some(message));
                    Err(SentinelError::Application(err))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_breaker::{Circuit, CircuitBreakerConfig};
    use sentinel_core::clock::MockClock;
    use tower::service_fn;
    use tower::ServiceExt;

    #[tokio::test]
    async fn blocked_request_never_reaches_inner_service() {
        let clock: sentinel_core::SharedClock = Arc::new(MockClock::new());
        let engine = Arc::new(SentinelEngine::with_clock(Arc::clone(&clock)));
        let rule = sentinel_flow::ThrottlingRule::builder("svc.ep").threshold(1.0).build().unwrap();
        engine.throttling().install(rule, Arc::clone(&clock));

        let layer = SentinelLayer::new(Arc::clone(&engine), "svc.ep");
        let mut svc = layer.layer(service_fn(|_: ()| async { Ok::<_, std::convert::Infallible>(()) }));

        assert!(svc.ready().await.unwrap().call(()).await.is_ok());
        let err = svc.ready().await.unwrap().call(()).await.unwrap_err();
        assert!(err.is_blocked());
    }

    #[tokio::test]
    async fn inner_failure_is_reported_to_a_bound_breaker() {
        let clock: sentinel_core::SharedClock = Arc::new(MockClock::new());
        let engine = Arc::new(SentinelEngine::with_clock(Arc::clone(&clock)));
        let breaker = Arc::new(Circuit::new(CircuitBreakerConfig::builder("svc.ep").build(), Arc::clone(&clock)));
        engine.breaker().bind("svc.ep", Arc::clone(&breaker));

        let layer = SentinelLayer::new(Arc::clone(&engine), "svc.ep");
        let mut svc = layer.layer(service_fn(|_: ()| async { Err::<(), _>("boom") }));

        assert!(svc.ready().await.unwrap().call(()).await.is_err());
        assert_eq!(breaker.metrics().failure_count, 1);
    }
}
