use chrono::Utc;
use http::{Request, Response};
use stasher_core::config::EventConfig;
use stasher_core::extract::{RequestSnapshot, ResponseSnapshot, Timing, build_event};
use stasher_sink::{EventSink, emit};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::debug;

/// Wrap every request in an [`EventLogger`] writing to `sink`.
pub fn logger<K: EventSink + 'static>(sink: K) -> EventLoggerLayer {
    EventLoggerLayer::new(Arc::new(sink))
}

/// Layer producing [`EventLogger`] services.
///
/// Cloning is cheap: the sink and configuration are shared, nothing else
/// is kept between requests.
#[derive(Clone)]
pub struct EventLoggerLayer {
    sink: Arc<dyn EventSink>,
    config: Arc<EventConfig>,
}

impl EventLoggerLayer {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            sink,
            config: Arc::new(EventConfig::default()),
        }
    }

    pub fn with_config(mut self, config: EventConfig) -> Self {
        self.config = Arc::new(config);
        self
    }
}

impl<S> Layer<S> for EventLoggerLayer {
    type Service = EventLogger<S>;

    fn layer(&self, inner: S) -> Self::Service {
        EventLogger {
            inner,
            sink: Arc::clone(&self.sink),
            config: Arc::clone(&self.config),
        }
    }
}

/// Middleware service: times the inner service and emits one event per
/// completed request.
#[derive(Clone)]
pub struct EventLogger<S> {
    inner: S,
    sink: Arc<dyn EventSink>,
    config: Arc<EventConfig>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for EventLogger<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        // The inner service takes the request by value.
        let snapshot = RequestSnapshot::from_request(&request);
        let sink = Arc::clone(&self.sink);
        let config = Arc::clone(&self.config);

        let started_at = Utc::now();
        let start = Instant::now();
        let downstream = self.inner.call(request);

        Box::pin(async move {
            let result = downstream.await;
            let elapsed = start.elapsed();

            match &result {
                Ok(response) => {
                    let response = ResponseSnapshot::from_response(response);
                    let timing = Timing {
                        started_at,
                        finished_at: Utc::now(),
                        elapsed,
                    };
                    let event = build_event(&snapshot, &response, &timing, &config);
                    emit(sink.as_ref(), &event);
                }
                Err(_) => {
                    debug!(path = %snapshot.path, "Inner service failed, no event emitted");
                }
            }

            result
        })
    }
}
