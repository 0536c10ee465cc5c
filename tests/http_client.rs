use std::{net::SocketAddr, thread, time::Duration};

use axum::{Json, Router, routing::get};
use numgen::{ClientConfig, HttpClient, NumberSource, NumgenError, http_server, problem};
use serde_json::json;

fn config() -> ClientConfig {
    ClientConfig {
        timeout: Duration::from_millis(500),
        retries: 0,
    }
}

/// Serve `app` on a background runtime and return its address.
fn spawn(app: Router) -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });
    addr
}

#[test]
fn fetches_pairs_over_http() {
    let addr = spawn(http_server::router());
    let client = HttpClient::new(&addr.to_string(), config());

    for _ in 0..10 {
        let pair = client.fetch("hard").unwrap();
        assert!((100..=999).contains(&pair.number1));
        assert!((100..=999).contains(&pair.number2));
    }
    let easy = client.fetch("easy").unwrap();
    assert!(easy.number1 <= 9 && easy.number2 <= 9);
    client.close();
}

#[test]
fn problem_over_http() {
    let addr = spawn(http_server::router());
    let client = HttpClient::new(&format!("http://{addr}"), config());
    let problem = problem::solve(&client, None).unwrap();
    assert_eq!(problem.difficulty, "easy");
    assert!(problem.math_problem.contains(" + "));
}

#[test]
fn server_side_rejection_is_reported() {
    // a service that rejects every label
    let app = Router::new().route(
        http_server::GENERATE_PATH,
        get(|| async {
            (
                axum::http::StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid request" })),
            )
        }),
    );
    let addr = spawn(app);
    let client = HttpClient::new(&addr.to_string(), config());
    assert!(matches!(
        client.fetch("easy"),
        Err(NumgenError::ServiceError(_))
    ));
}

#[test]
fn server_failure_is_an_http_error() {
    let app = Router::new().route(
        http_server::GENERATE_PATH,
        get(|| async { axum::http::StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let addr = spawn(app);
    let client = HttpClient::new(&addr.to_string(), config());
    assert!(matches!(client.fetch("easy"), Err(NumgenError::HttpError(_))));
}

#[test]
fn malformed_body_is_reported() {
    let app = Router::new().route(
        http_server::GENERATE_PATH,
        get(|| async { Json(json!({ "num1": 1, "num2": 2 })) }),
    );
    let addr = spawn(app);
    let client = HttpClient::new(&addr.to_string(), config());
    assert!(matches!(
        client.fetch("easy"),
        Err(NumgenError::MalformedResponse(_))
    ));
}

#[test]
fn slow_service_fails_instead_of_hanging() {
    let app = Router::new().route(
        http_server::GENERATE_PATH,
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "number1": 1, "number2": 2 }))
        }),
    );
    let addr = spawn(app);
    let client = HttpClient::new(&addr.to_string(), config());
    assert!(client.fetch("easy").is_err());
}
