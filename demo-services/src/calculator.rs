//! # Calculator Service
//!
//! Arithmetic over the four call shapes: a unary four-function calculator,
//! server-streamed prime factorization, a client-streamed running average
//! and a duplex running maximum.

use async_trait::async_trait;
use futures_util::Stream;
use std::sync::Arc;
use streambed_core::{
    Call, CallError, CallKind, ConnectError, Message, Receiver, Sender, ServiceRegistry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Sum,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperationRequest {
    pub opcode: Opcode,
    pub value1: f32,
    pub value2: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperationResponse {
    pub result: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimeDecompositionRequest {
    pub number: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimeDecompositionResponse {
    pub prime: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputeAverageRequest {
    pub number: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputeAverageResponse {
    pub average: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindMaximumRequest {
    pub number: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindMaximumResponse {
    pub maximum: i32,
}

#[async_trait]
pub trait CalculatorService: Send + Sync + 'static {
    /// Unary: applies the requested operation to the two operands.
    async fn calculate(
        &self,
        request: Message<OperationRequest>,
    ) -> Result<OperationResponse, CallError>;

    /// Server-streaming: emits the prime factors of the requested number in
    /// non-decreasing order.
    async fn prime_number_decomposition(
        &self,
        request: Message<PrimeDecompositionRequest>,
        stream: Sender<PrimeDecompositionResponse>,
    ) -> Result<(), CallError>;

    /// Client-streaming: consumes numbers until end-of-stream, then yields
    /// their arithmetic mean.
    async fn compute_average(
        &self,
        requests: Receiver<ComputeAverageRequest>,
    ) -> Result<ComputeAverageResponse, CallError>;

    /// Bidirectional: emits the running maximum of the inbound numbers,
    /// once per strict increase.
    async fn find_maximum(
        &self,
        requests: Receiver<FindMaximumRequest>,
        stream: Sender<FindMaximumResponse>,
    ) -> Result<(), CallError>;
}

/// Stateless reference implementation. All per-call state (counters,
/// accumulators) lives in the method bodies, so nothing leaks across calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct Calculator;

#[async_trait]
impl CalculatorService for Calculator {
    async fn calculate(
        &self,
        request: Message<OperationRequest>,
    ) -> Result<OperationResponse, CallError> {
        let OperationRequest {
            opcode,
            value1,
            value2,
        } = request.into_inner();

        let result = match opcode {
            Opcode::Sum => value1 + value2,
            Opcode::Sub => value1 - value2,
            Opcode::Mul => value1 * value2,
            Opcode::Div => {
                // Fail loudly instead of returning an IEEE infinity/NaN.
                if value2 == 0.0 {
                    return Err(CallError::handler("division by zero"));
                }
                value1 / value2
            }
        };

        Ok(OperationResponse { result })
    }

    async fn prime_number_decomposition(
        &self,
        request: Message<PrimeDecompositionRequest>,
        mut stream: Sender<PrimeDecompositionResponse>,
    ) -> Result<(), CallError> {
        let mut number = request.into_inner().number;
        let mut prime = 2u32;

        while number > 1 {
            if number % prime == 0 {
                stream.send(PrimeDecompositionResponse { prime })?;
                number /= prime;
            } else {
                prime += 1;
            }
        }

        Ok(())
    }

    async fn compute_average(
        &self,
        mut requests: Receiver<ComputeAverageRequest>,
    ) -> Result<ComputeAverageResponse, CallError> {
        let mut count = 0u32;
        let mut average = 0f64;

        while let Some(request) = requests.message().await? {
            let next = f64::from(request.into_inner().number);
            count += 1;
            // Incremental mean; summing then dividing drifts on long streams.
            average += (next - average) / f64::from(count);
        }

        Ok(ComputeAverageResponse { average })
    }

    async fn find_maximum(
        &self,
        mut requests: Receiver<FindMaximumRequest>,
        mut stream: Sender<FindMaximumResponse>,
    ) -> Result<(), CallError> {
        let mut maximum: Option<i32> = None;

        while let Some(request) = requests.message().await? {
            let number = request.into_inner().number;
            if maximum.is_none_or(|max| number > max) {
                maximum = Some(number);
                stream.send(FindMaximumResponse { maximum: number })?;
            }
        }

        Ok(())
    }
}

/// Drives the calculator service through the call harness, one call per
/// request, the way a generated client would.
#[derive(Clone)]
pub struct CalculatorClient {
    inner: Arc<dyn CalculatorService>,
}

impl CalculatorClient {
    pub fn new(service: Arc<dyn CalculatorService>) -> Self {
        Self { inner: service }
    }

    /// Connects to the calculator endpoint bound under `name`.
    pub fn connect(registry: &ServiceRegistry, name: &str) -> Result<Self, ConnectError> {
        registry
            .connect::<Arc<dyn CalculatorService>>(name)
            .map(Self::new)
    }

    pub async fn calculate(
        &self,
        request: OperationRequest,
    ) -> Result<OperationResponse, CallError> {
        let (call, _handle) = Call::new(CallKind::Unary);
        let service = self.inner.clone();
        call.unary(move |request| async move { service.calculate(request).await }, request)
            .await
            .map(Message::into_inner)
    }

    pub fn prime_number_decomposition(
        &self,
        request: PrimeDecompositionRequest,
    ) -> Receiver<PrimeDecompositionResponse> {
        let (call, _handle) = Call::new(CallKind::ServerStreaming);
        let service = self.inner.clone();
        call.server_streaming(
            move |request, stream| async move {
                service.prime_number_decomposition(request, stream).await
            },
            request,
        )
    }

    pub async fn compute_average(
        &self,
        requests: impl Stream<Item = ComputeAverageRequest>,
    ) -> Result<ComputeAverageResponse, CallError> {
        let (call, _handle) = Call::new(CallKind::ClientStreaming);
        let service = self.inner.clone();
        call.client_streaming(
            move |requests| async move { service.compute_average(requests).await },
            requests,
        )
        .await
        .map(Message::into_inner)
    }

    pub fn find_maximum(
        &self,
        requests: impl Stream<Item = FindMaximumRequest> + Send + 'static,
    ) -> Receiver<FindMaximumResponse> {
        let (call, _handle) = Call::new(CallKind::BidiStreaming);
        let service = self.inner.clone();
        call.bidi_streaming(
            move |requests, stream| async move { service.find_maximum(requests, stream).await },
            requests,
        )
    }
}
