//! Greeter demo: runs a fixed request sequence against an in-process
//! greeter service, one example per call shape, and exits non-zero on the
//! first failure.

use demo_services::greeter::{Greeter, GreeterClient, GreeterService, Greeting};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use streambed_core::{CallError, ServiceRegistry};
use tokio_stream::StreamExt;

#[tokio::main]
async fn main() {
    let mut registry = ServiceRegistry::new();
    registry.bind("greeter", Arc::new(Greeter) as Arc<dyn GreeterService>);

    let client = match GreeterClient::connect(&registry, "greeter") {
        Ok(client) => client,
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    };

    if let Err(err) = run(&client).await {
        eprintln!("greeter demo failed: {err}");
        process::exit(1);
    }
}

fn guests() -> Vec<Greeting> {
    vec![
        Greeting::new("Alan", "Kevin"),
        Greeting::new("Dani", "Elías"),
        Greeting::new("Esteban", "Damián"),
    ]
}

async fn run(client: &GreeterClient) -> Result<(), CallError> {
    do_greet(client).await?;
    do_greet_many_times(client).await?;
    do_long_greet(client).await?;
    do_greet_everyone(client).await?;
    Ok(())
}

async fn do_greet(client: &GreeterClient) -> Result<(), CallError> {
    println!("Starting the unary greeting");
    let response = client.greet(Greeting::new("Alan", "Kevin")).await?;
    println!("Greet response: {}", response.result);
    Ok(())
}

async fn do_greet_many_times(client: &GreeterClient) -> Result<(), CallError> {
    println!("Starting the server-streamed greeting");
    let mut stream = client.greet_many_times(Greeting::new("Alan", "Kevin"));
    while let Some(response) = stream.message().await? {
        println!("GreetManyTimes response: {}", response.into_inner().result);
    }
    Ok(())
}

async fn do_long_greet(client: &GreeterClient) -> Result<(), CallError> {
    println!("Starting the client-streamed greeting");
    let requests = tokio_stream::iter(guests()).throttle(Duration::from_millis(200));

    let response = client.long_greet(requests).await?;
    println!("LongGreet response: {}", response.result);
    Ok(())
}

async fn do_greet_everyone(client: &GreeterClient) -> Result<(), CallError> {
    println!("Starting the duplex greeting");
    let requests = tokio_stream::iter(guests()).throttle(Duration::from_millis(200));

    let mut stream = client.greet_everyone(requests);
    while let Some(response) = stream.message().await? {
        println!("Greeting received: {}", response.into_inner().result);
    }
    Ok(())
}
