//! Calculator demo: runs a fixed request sequence against an in-process
//! calculator service, one example per call shape, and exits non-zero on the
//! first failure.

use demo_services::calculator::{
    Calculator, CalculatorClient, CalculatorService, ComputeAverageRequest, FindMaximumRequest,
    Opcode, OperationRequest, PrimeDecompositionRequest,
};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use streambed_core::{CallError, ServiceRegistry};
use tokio_stream::StreamExt;

#[tokio::main]
async fn main() {
    let mut registry = ServiceRegistry::new();
    registry.bind(
        "calculator",
        Arc::new(Calculator) as Arc<dyn CalculatorService>,
    );

    let client = match CalculatorClient::connect(&registry, "calculator") {
        Ok(client) => client,
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    };

    if let Err(err) = run(&client).await {
        eprintln!("calculator demo failed: {err}");
        process::exit(1);
    }
}

async fn run(client: &CalculatorClient) -> Result<(), CallError> {
    do_operation(client, Opcode::Sum, 23.0, 54.0).await?;
    do_prime_decomposition(client, 120).await?;
    do_prime_decomposition(client, 1).await?;
    do_compute_average(client, (1..=10).collect()).await?;
    do_find_maximum(client, vec![1, 5, 3, 6, 2, 20]).await?;
    Ok(())
}

async fn do_operation(
    client: &CalculatorClient,
    opcode: Opcode,
    value1: f32,
    value2: f32,
) -> Result<(), CallError> {
    println!("Executing {opcode:?} on {value1} and {value2}");
    let response = client
        .calculate(OperationRequest {
            opcode,
            value1,
            value2,
        })
        .await?;
    println!("Result: {}", response.result);
    Ok(())
}

async fn do_prime_decomposition(client: &CalculatorClient, number: u32) -> Result<(), CallError> {
    println!("Calculating prime factors of {number}");
    let mut stream = client.prime_number_decomposition(PrimeDecompositionRequest { number });

    let mut primes = Vec::new();
    while let Some(response) = stream.message().await? {
        primes.push(response.into_inner().prime);
    }
    println!("Prime factors of {number}: {primes:?}");
    Ok(())
}

async fn do_compute_average(client: &CalculatorClient, numbers: Vec<i32>) -> Result<(), CallError> {
    println!("Calculating the average of {numbers:?}");
    let requests = tokio_stream::iter(numbers.clone())
        .map(|number| ComputeAverageRequest { number })
        .throttle(Duration::from_millis(100));

    let response = client.compute_average(requests).await?;
    println!("Average of {numbers:?}: {}", response.average);
    Ok(())
}

async fn do_find_maximum(client: &CalculatorClient, numbers: Vec<i32>) -> Result<(), CallError> {
    println!("Tracking the running maximum of {numbers:?}");
    let requests = tokio_stream::iter(numbers)
        .map(|number| FindMaximumRequest { number })
        .throttle(Duration::from_millis(200));

    let mut stream = client.find_maximum(requests);
    while let Some(response) = stream.message().await? {
        println!("Received new maximum: {}", response.into_inner().maximum);
    }
    Ok(())
}
