use futures_util::{future, stream};
use streambed_core::{Call, CallError, CallKind, CallStatus, Receiver, Sender};
use tokio::sync::oneshot;

#[tokio::test]
async fn unary_echo() {
    let (call, handle) = Call::new(CallKind::Unary);
    assert_eq!(handle.status(), CallStatus::Pending);

    let response = call
        .unary(
            |request| async move { Ok(format!("echo: {}", request.into_inner())) },
            "hello".to_string(),
        )
        .await
        .unwrap();

    assert_eq!(response.into_inner(), "echo: hello");
    assert_eq!(handle.status(), CallStatus::Completed);
}

#[tokio::test]
async fn unary_handler_failure_marks_the_call_failed() {
    let (call, handle) = Call::new(CallKind::Unary);

    let result = call
        .unary(
            |_request: streambed_core::Message<String>| async move {
                Err::<String, _>(CallError::handler("boom"))
            },
            "hello".to_string(),
        )
        .await;

    assert_eq!(result.unwrap_err(), CallError::handler("boom"));
    assert_eq!(handle.status(), CallStatus::Failed);
}

#[tokio::test]
async fn unary_observes_cancellation() {
    let (call, handle) = Call::new(CallKind::Unary);
    handle.cancel();

    let result = call
        .unary(
            |_request| future::pending::<Result<String, CallError>>(),
            "hello".to_string(),
        )
        .await;

    assert_eq!(result.unwrap_err(), CallError::Cancelled);
    assert_eq!(handle.status(), CallStatus::Failed);
}

#[tokio::test]
async fn server_streaming_echo() {
    let (call, handle) = Call::new(CallKind::ServerStreaming);

    let rx = call.server_streaming(
        |request, mut stream: Sender<String>| async move {
            let message = request.into_inner();
            for i in 0..3 {
                stream.send(format!("{message} - seq {i}"))?;
            }
            Ok(())
        },
        "stream".to_string(),
    );

    let results = rx.collect().await.unwrap();
    assert_eq!(
        results,
        vec!["stream - seq 0", "stream - seq 1", "stream - seq 2"]
    );
    assert_eq!(handle.status(), CallStatus::Completed);
}

#[tokio::test]
async fn server_streaming_failure_preserves_partial_output() {
    let (call, handle) = Call::new(CallKind::ServerStreaming);

    let mut rx = call.server_streaming(
        |_request, mut stream: Sender<u32>| async move {
            stream.send(1)?;
            stream.send(2)?;
            Err(CallError::handler("boom"))
        },
        (),
    );

    assert_eq!(rx.message().await.unwrap().unwrap().into_inner(), 1);
    assert_eq!(rx.message().await.unwrap().unwrap().into_inner(), 2);
    assert_eq!(rx.message().await.unwrap_err(), CallError::handler("boom"));
    // The failure is sticky.
    assert_eq!(rx.message().await.unwrap_err(), CallError::handler("boom"));
    assert_eq!(handle.status(), CallStatus::Failed);
}

#[tokio::test]
async fn client_streaming_concatenates_all_requests() {
    let (call, handle) = Call::new(CallKind::ClientStreaming);

    let requests = stream::iter(vec!["A".to_string(), "B".to_string(), "C".to_string()]);
    let response = call
        .client_streaming(
            |mut requests: Receiver<String>| async move {
                let mut joined = String::new();
                while let Some(request) = requests.message().await? {
                    joined.push_str(request.get_ref());
                }
                Ok(joined)
            },
            requests,
        )
        .await
        .unwrap();

    assert_eq!(response.into_inner(), "ABC");
    assert_eq!(handle.status(), CallStatus::Completed);
}

#[tokio::test]
async fn client_streaming_with_no_requests_still_yields_a_response() {
    let (call, _handle) = Call::new(CallKind::ClientStreaming);

    let response = call
        .client_streaming(
            |mut requests: Receiver<u32>| async move {
                let mut count = 0;
                while requests.message().await?.is_some() {
                    count += 1;
                }
                Ok(count)
            },
            stream::iter(Vec::<u32>::new()),
        )
        .await
        .unwrap();

    assert_eq!(response.into_inner(), 0);
}

#[tokio::test]
async fn bidi_echo_preserves_request_order() {
    let (call, handle) = Call::new(CallKind::BidiStreaming);

    let requests = stream::iter(vec!["Ping".to_string(), "Pong".to_string()]);
    let mut rx = call.bidi_streaming(
        |mut requests: Receiver<String>, mut stream: Sender<String>| async move {
            while let Some(request) = requests.message().await? {
                stream.send(format!("echo: {}", request.into_inner()))?;
            }
            Ok(())
        },
        requests,
    );

    let first = rx.message().await.unwrap().unwrap();
    assert_eq!(first.seq(), 0);
    assert_eq!(first.into_inner(), "echo: Ping");

    let second = rx.message().await.unwrap().unwrap();
    assert_eq!(second.seq(), 1);
    assert_eq!(second.into_inner(), "echo: Pong");

    assert_eq!(rx.message().await.unwrap(), None);
    assert_eq!(handle.status(), CallStatus::Completed);
}

#[tokio::test]
async fn bidi_handler_can_write_before_reading() {
    let (call, _handle) = Call::new(CallKind::BidiStreaming);

    let requests = stream::iter(vec![1u32, 2, 3]);
    let rx = call.bidi_streaming(
        |mut requests: Receiver<u32>, mut stream: Sender<String>| async move {
            stream.send("ready".to_string())?;
            let mut count = 0;
            while requests.message().await?.is_some() {
                count += 1;
            }
            stream.send(format!("done {count}"))?;
            Ok(())
        },
        requests,
    );

    assert_eq!(rx.collect().await.unwrap(), vec!["ready", "done 3"]);
}

#[tokio::test]
async fn bidi_observes_cancellation_on_both_sides() {
    let (call, handle) = Call::new(CallKind::BidiStreaming);

    // Neither side ever produces anything; only cancellation unblocks them.
    let mut rx = call.bidi_streaming(
        |mut requests: Receiver<u32>, mut stream: Sender<u32>| async move {
            while let Some(request) = requests.message().await? {
                stream.send(request.into_inner())?;
            }
            Ok(())
        },
        stream::pending::<u32>(),
    );

    handle.cancel();

    assert_eq!(rx.message().await.unwrap_err(), CallError::Cancelled);
    assert_eq!(handle.status(), CallStatus::Failed);
}

#[tokio::test]
async fn end_of_stream_is_sticky_across_late_cancellation() {
    let (call, handle) = Call::new(CallKind::ServerStreaming);

    let mut rx = call.server_streaming(
        |_request, mut stream: Sender<u32>| async move {
            stream.send(1)?;
            Ok(())
        },
        (),
    );

    assert_eq!(rx.message().await.unwrap().unwrap().into_inner(), 1);
    assert_eq!(rx.message().await.unwrap(), None);

    // Cancelling after the stream has ended does not demote it to an error.
    handle.cancel();
    assert_eq!(rx.message().await.unwrap(), None);
}

#[tokio::test]
async fn bidi_sender_observes_cancellation_on_the_server_side() {
    let (call, handle) = Call::new(CallKind::BidiStreaming);

    let (gate_tx, gate_rx) = oneshot::channel();
    let (send_result_tx, send_result_rx) = oneshot::channel();
    let mut rx = call.bidi_streaming(
        move |_requests: Receiver<u32>, mut stream: Sender<u32>| async move {
            stream.send(1)?;
            let _ = gate_rx.await;
            let _ = send_result_tx.send(stream.send(2));
            Ok(())
        },
        stream::pending::<u32>(),
    );

    assert_eq!(rx.message().await.unwrap().unwrap().into_inner(), 1);

    handle.cancel();
    gate_tx.send(()).unwrap();

    // The handler's own send fails once the call is cancelled.
    assert_eq!(send_result_rx.await.unwrap(), Err(CallError::Cancelled));
    assert_eq!(rx.message().await.unwrap_err(), CallError::Cancelled);
    assert_eq!(handle.status(), CallStatus::Failed);
}

#[tokio::test]
async fn client_streaming_observes_cancellation() {
    let (call, handle) = Call::new(CallKind::ClientStreaming);

    let canceller = handle.clone();
    tokio::spawn(async move {
        canceller.cancel();
    });

    // The request stream never ends, so only cancellation unblocks the call.
    let result = call
        .client_streaming(
            |mut requests: Receiver<u32>| async move {
                let mut count = 0;
                while requests.message().await?.is_some() {
                    count += 1;
                }
                Ok(count)
            },
            stream::pending::<u32>(),
        )
        .await;

    assert_eq!(result.unwrap_err(), CallError::Cancelled);
    assert_eq!(handle.status(), CallStatus::Failed);
}

#[tokio::test]
async fn status_never_moves_backwards() {
    let (call, handle) = Call::new(CallKind::Unary);

    call.unary(|request| async move { Ok::<_, CallError>(request.into_inner()) }, 7u32)
        .await
        .unwrap();
    assert_eq!(handle.status(), CallStatus::Completed);

    // Cancelling a finished call does not demote it to Failed.
    handle.cancel();
    assert_eq!(handle.status(), CallStatus::Completed);
}
