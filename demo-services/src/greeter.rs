//! # Greeter Service
//!
//! String formatting over the four call shapes. All four methods take the
//! same [`Greeting`] payload; per-method request wrappers would carry no
//! extra information.

use async_trait::async_trait;
use futures_util::Stream;
use std::sync::Arc;
use streambed_core::{
    Call, CallError, CallKind, ConnectError, Message, Receiver, Sender, ServiceRegistry,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeting {
    pub first_name: String,
    pub second_name: String,
}

impl Greeting {
    pub fn new(first_name: impl Into<String>, second_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            second_name: second_name.into(),
        }
    }

    fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.second_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreetResponse {
    pub result: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreetManyTimesResponse {
    pub result: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongGreetResponse {
    pub result: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreetEveryoneResponse {
    pub result: String,
}

#[async_trait]
pub trait GreeterService: Send + Sync + 'static {
    /// Unary: one greeting in, one formatted greeting out.
    async fn greet(&self, request: Message<Greeting>) -> Result<GreetResponse, CallError>;

    /// Server-streaming: ten numbered greetings for one request.
    async fn greet_many_times(
        &self,
        request: Message<Greeting>,
        stream: Sender<GreetManyTimesResponse>,
    ) -> Result<(), CallError>;

    /// Client-streaming: collects every greeting, then yields one response
    /// naming them all in submission order.
    async fn long_greet(
        &self,
        requests: Receiver<Greeting>,
    ) -> Result<LongGreetResponse, CallError>;

    /// Bidirectional: exactly one response per inbound greeting, FIFO.
    async fn greet_everyone(
        &self,
        requests: Receiver<Greeting>,
        stream: Sender<GreetEveryoneResponse>,
    ) -> Result<(), CallError>;
}

/// Stateless reference implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Greeter;

#[async_trait]
impl GreeterService for Greeter {
    async fn greet(&self, request: Message<Greeting>) -> Result<GreetResponse, CallError> {
        let greeting = request.into_inner();
        Ok(GreetResponse {
            result: format!("Hello, {}", greeting.full_name()),
        })
    }

    async fn greet_many_times(
        &self,
        request: Message<Greeting>,
        mut stream: Sender<GreetManyTimesResponse>,
    ) -> Result<(), CallError> {
        let greeting = request.into_inner();
        for i in 0..10 {
            stream.send(GreetManyTimesResponse {
                result: format!("Hello {}, {}", i, greeting.full_name()),
            })?;
        }
        Ok(())
    }

    async fn long_greet(
        &self,
        mut requests: Receiver<Greeting>,
    ) -> Result<LongGreetResponse, CallError> {
        let mut names = Vec::new();
        while let Some(request) = requests.message().await? {
            names.push(request.into_inner().full_name());
        }
        Ok(LongGreetResponse {
            result: format!("Hello to all of you, {}", names.join(", ")),
        })
    }

    async fn greet_everyone(
        &self,
        mut requests: Receiver<Greeting>,
        mut stream: Sender<GreetEveryoneResponse>,
    ) -> Result<(), CallError> {
        while let Some(request) = requests.message().await? {
            stream.send(GreetEveryoneResponse {
                result: format!("Hello, {}", request.into_inner().full_name()),
            })?;
        }
        Ok(())
    }
}

/// Drives the greeter service through the call harness.
#[derive(Clone)]
pub struct GreeterClient {
    inner: Arc<dyn GreeterService>,
}

impl GreeterClient {
    pub fn new(service: Arc<dyn GreeterService>) -> Self {
        Self { inner: service }
    }

    /// Connects to the greeter endpoint bound under `name`.
    pub fn connect(registry: &ServiceRegistry, name: &str) -> Result<Self, ConnectError> {
        registry
            .connect::<Arc<dyn GreeterService>>(name)
            .map(Self::new)
    }

    pub async fn greet(&self, request: Greeting) -> Result<GreetResponse, CallError> {
        let (call, _handle) = Call::new(CallKind::Unary);
        let service = self.inner.clone();
        call.unary(move |request| async move { service.greet(request).await }, request)
            .await
            .map(Message::into_inner)
    }

    pub fn greet_many_times(&self, request: Greeting) -> Receiver<GreetManyTimesResponse> {
        let (call, _handle) = Call::new(CallKind::ServerStreaming);
        let service = self.inner.clone();
        call.server_streaming(
            move |request, stream| async move { service.greet_many_times(request, stream).await },
            request,
        )
    }

    pub async fn long_greet(
        &self,
        requests: impl Stream<Item = Greeting>,
    ) -> Result<LongGreetResponse, CallError> {
        let (call, _handle) = Call::new(CallKind::ClientStreaming);
        let service = self.inner.clone();
        call.client_streaming(
            move |requests| async move { service.long_greet(requests).await },
            requests,
        )
        .await
        .map(Message::into_inner)
    }

    pub fn greet_everyone(
        &self,
        requests: impl Stream<Item = Greeting> + Send + 'static,
    ) -> Receiver<GreetEveryoneResponse> {
        let (call, _handle) = Call::new(CallKind::BidiStreaming);
        let service = self.inner.clone();
        call.bidi_streaming(
            move |requests, stream| async move { service.greet_everyone(requests, stream).await },
            requests,
        )
    }
}
