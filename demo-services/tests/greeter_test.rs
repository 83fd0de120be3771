use demo_services::greeter::{Greeter, GreeterClient, GreeterService, Greeting};
use futures_util::stream;
use std::sync::Arc;
use streambed_core::ServiceRegistry;

fn client() -> GreeterClient {
    GreeterClient::new(Arc::new(Greeter))
}

fn guests() -> Vec<Greeting> {
    vec![
        Greeting::new("Alan", "Kevin"),
        Greeting::new("Dani", "Elías"),
        Greeting::new("Esteban", "Damián"),
    ]
}

#[tokio::test]
async fn greet_formats_the_full_name() {
    let response = client().greet(Greeting::new("Alan", "Kevin")).await.unwrap();
    assert_eq!(response.result, "Hello, Alan Kevin");
}

#[tokio::test]
async fn greet_many_times_sends_ten_numbered_greetings() {
    let greetings = client()
        .greet_many_times(Greeting::new("Alan", "Kevin"))
        .collect()
        .await
        .unwrap();

    assert_eq!(greetings.len(), 10);
    assert_eq!(greetings[0].result, "Hello 0, Alan Kevin");
    assert_eq!(greetings[9].result, "Hello 9, Alan Kevin");
}

#[tokio::test]
async fn long_greet_joins_all_names_in_submission_order() {
    let response = client().long_greet(stream::iter(guests())).await.unwrap();

    assert_eq!(
        response.result,
        "Hello to all of you, Alan Kevin, Dani Elías, Esteban Damián"
    );
}

#[tokio::test]
async fn greet_everyone_answers_each_request_in_order() {
    let mut responses = client().greet_everyone(stream::iter(guests()));

    let expected = [
        "Hello, Alan Kevin",
        "Hello, Dani Elías",
        "Hello, Esteban Damián",
    ];
    for (seq, expected) in expected.iter().enumerate() {
        let response = responses.message().await.unwrap().unwrap();
        assert_eq!(response.seq(), seq as u64);
        assert_eq!(response.get_ref().result, *expected);
    }
    assert_eq!(responses.message().await.unwrap(), None);
}

#[tokio::test]
async fn client_connects_through_the_registry() {
    let mut registry = ServiceRegistry::new();
    registry.bind("greeter", Arc::new(Greeter) as Arc<dyn GreeterService>);

    let client = GreeterClient::connect(&registry, "greeter").unwrap();
    let response = client.greet(Greeting::new("Ada", "Lovelace")).await.unwrap();
    assert_eq!(response.result, "Hello, Ada Lovelace");
}
