//! Exchange and probe tests against an in-process RADIUS responder
//!
//! The responder binds 127.0.0.1:0, counts every datagram it receives, and
//! answers with whatever the test's reply function returns.

use radius_exporter::{
    probe, Config, Exchange, ModuleDefaults, ProbeConfig, ProbeError, RequestBuilder, RetryPolicy,
};
use radius_proto::auth::{calculate_response_authenticator, decrypt_user_password};
use radius_proto::{
    sign_response, Attribute, AttributeType, Code, Packet, ValidationError, ValidationMode,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

const SECRET: &[u8] = b"testing123";

struct Responder {
    addr: SocketAddr,
    received: Arc<AtomicU32>,
    handle: JoinHandle<()>,
}

impl Responder {
    fn received(&self) -> u32 {
        self.received.load(Ordering::SeqCst)
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Start a responder; `reply` gets the decoded request and the 1-based count
/// of datagrams received so far, and returns the datagrams to send back.
async fn spawn_responder<F>(reply: F) -> Responder
where
    F: Fn(&Packet, u32) -> Vec<Vec<u8>> + Send + 'static,
{
    let socket = UdpSocket::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind responder");
    let addr = socket.local_addr().expect("Failed to read responder address");
    let received = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&received);

    let handle = tokio::spawn(async move {
        let mut buf = [0u8; 4096];
        loop {
            let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
                return;
            };
            let count = counter.fetch_add(1, Ordering::SeqCst) + 1;
            let Ok(request) = Packet::decode(&buf[..len]) else {
                continue;
            };
            for datagram in reply(&request, count) {
                let _ = socket.send_to(&datagram, peer).await;
            }
        }
    });

    Responder {
        addr,
        received,
        handle,
    }
}

fn response_packet(request: &Packet, code: Code) -> Packet {
    let mut response = Packet::new(code, request.identifier, [0u8; 16]);
    response.add_attribute(
        Attribute::string(AttributeType::ReplyMessage as u8, "hello")
            .expect("Failed to create Reply-Message"),
    );
    response
}

/// A correctly signed response carrying a Message-Authenticator
fn signed_response(request: &Packet, code: Code) -> Vec<u8> {
    let mut response = response_packet(request, code);
    sign_response(&mut response, &request.authenticator, SECRET).expect("Failed to sign response")
}

/// A response with a valid Response Authenticator and no Message-Authenticator
fn unsigned_response(request: &Packet, code: Code) -> Vec<u8> {
    let mut response = response_packet(request, code);
    response.authenticator =
        calculate_response_authenticator(&response, &request.authenticator, SECRET)
            .expect("Failed to compute authenticator");
    response.encode().expect("Failed to encode response")
}

/// Accept when the hidden password matches, reject otherwise
fn check_password(request: &Packet, expected: &[u8]) -> Code {
    let password = request
        .find_attribute(AttributeType::UserPassword as u8)
        .and_then(|attr| decrypt_user_password(&attr.value, SECRET, &request.authenticator).ok());
    match password {
        Some(password) if password == expected => Code::AccessAccept,
        _ => Code::AccessReject,
    }
}

fn config(module_json: &str) -> Config {
    let contents = format!(r#"{{ "modules": {{ "test": {} }} }}"#, module_json);
    Config::from_str_with_defaults(&contents, &ModuleDefaults::default())
        .expect("Failed to parse config")
}

fn probe_config(target: SocketAddr, module_json: &str) -> ProbeConfig {
    let module = config(module_json).module("test").expect("module missing");
    ProbeConfig::new(target.to_string(), module).expect("invalid probe config")
}

#[tokio::test]
async fn test_silent_server_gets_every_retry_then_times_out() {
    let responder = spawn_responder(|_, _| Vec::new()).await;
    let config = probe_config(
        responder.addr,
        r#"{ "username": "probe", "password": "pw", "secret": "testing123",
             "timeout": 1, "retries": 2 }"#,
    );
    let module = &config.module;
    let request = RequestBuilder::new(module).build().unwrap();

    let started = Instant::now();
    let result = Exchange::new(
        &request,
        &module.secret,
        responder.addr,
        module.policy,
        module.validation_mode,
    )
    .run()
    .await;
    let elapsed = started.elapsed();

    assert!(matches!(result, Err(ProbeError::Timeout { attempts: 3 })));
    assert_eq!(responder.received(), 3);
    assert!(elapsed >= Duration::from_millis(900));
    assert!(elapsed < Duration::from_millis(1500));
}

#[tokio::test]
async fn test_retransmissions_are_identical() {
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let responder = spawn_responder(move |request, _| {
        log.lock().unwrap().push(request.clone());
        Vec::new()
    })
    .await;
    let config = probe_config(
        responder.addr,
        r#"{ "username": "probe", "password": "pw", "secret": "testing123",
             "timeout": 1, "retries": 1 }"#,
    );
    let module = &config.module;
    let request = RequestBuilder::new(module).build().unwrap();

    let _ = Exchange::new(&request, &module.secret, responder.addr, module.policy, module.validation_mode)
        .run()
        .await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0], seen[1]);
    assert_eq!(seen[0], request.packet);
}

#[tokio::test]
async fn test_mismatched_identifier_is_discarded() {
    let responder = spawn_responder(|request, _| {
        let mut stray = request.clone();
        stray.identifier = request.identifier.wrapping_add(1);
        vec![
            signed_response(&stray, Code::AccessAccept),
            signed_response(request, Code::AccessAccept),
        ]
    })
    .await;
    let config = probe_config(
        responder.addr,
        r#"{ "username": "probe", "password": "pw", "secret": "testing123",
             "timeout": 2, "max_packet_errors": 1 }"#,
    );
    let module = &config.module;
    let request = RequestBuilder::new(module).build().unwrap();

    let result = Exchange::new(&request, &module.secret, responder.addr, module.policy, module.validation_mode)
        .run()
        .await
        .unwrap();

    assert_eq!(result.code, Code::AccessAccept);
    assert_eq!(result.discarded, 1);
    assert_eq!(result.transmissions, 1);
    assert_eq!(responder.received(), 1);
}

#[tokio::test]
async fn test_malformed_tolerance_exceeded() {
    let responder = spawn_responder(|request, _| {
        (0..3)
            .map(|_| {
                let mut bytes = signed_response(request, Code::AccessAccept);
                bytes[4] ^= 0x01;
                bytes
            })
            .collect()
    })
    .await;
    let config = probe_config(
        responder.addr,
        r#"{ "username": "probe", "password": "pw", "secret": "testing123",
             "timeout": 2, "retries": 2, "max_packet_errors": 2 }"#,
    );
    let module = &config.module;
    let request = RequestBuilder::new(module).build().unwrap();

    let result = Exchange::new(&request, &module.secret, responder.addr, module.policy, module.validation_mode)
        .run()
        .await;

    match result {
        Err(ProbeError::TooManyMalformedResponses { count, last }) => {
            assert_eq!(count, 3);
            assert_eq!(last, ValidationError::BadAuthenticator);
        }
        other => panic!("expected TooManyMalformedResponses, got {:?}", other),
    }
    assert_eq!(responder.received(), 1);
}

#[tokio::test]
async fn test_garbage_datagram_then_valid_reply() {
    let responder = spawn_responder(|request, _| {
        vec![vec![0xffu8; 7], signed_response(request, Code::AccessAccept)]
    })
    .await;
    let config = probe_config(
        responder.addr,
        r#"{ "username": "probe", "password": "pw", "secret": "testing123",
             "timeout": 2, "max_packet_errors": 1 }"#,
    );

    let outcome = probe(&config).await;
    assert!(outcome.success);
    assert_eq!(outcome.response_code, Some(Code::AccessAccept));
}

#[tokio::test]
async fn test_probe_accept() {
    let responder =
        spawn_responder(|request, _| vec![signed_response(request, check_password(request, b"right"))])
            .await;
    let config = probe_config(
        responder.addr,
        r#"{ "username": "probe", "password": "right", "secret": "testing123",
             "timeout": 2, "nas_id": "exporter", "nas_ip": "192.0.2.1" }"#,
    );

    let outcome = probe(&config).await;
    assert!(outcome.success);
    assert_eq!(outcome.response_code, Some(Code::AccessAccept));
    assert!(outcome.error.is_none());
}

#[tokio::test]
async fn test_probe_reject_is_a_successful_probe() {
    let responder =
        spawn_responder(|request, _| vec![signed_response(request, check_password(request, b"right"))])
            .await;
    let config = probe_config(
        responder.addr,
        r#"{ "username": "probe", "password": "wrong", "secret": "testing123", "timeout": 2 }"#,
    );

    let outcome = probe(&config).await;
    assert!(outcome.success);
    assert_eq!(outcome.response_code, Some(Code::AccessReject));
    assert_eq!(outcome.response_code_value(), 3);
}

#[tokio::test]
async fn test_tampered_message_authenticator_never_succeeds() {
    let responder = spawn_responder(|request, _| {
        let signed = signed_response(request, Code::AccessAccept);
        let mut response = Packet::decode(&signed).expect("decode own response");
        if let Some(attr) = response.find_attribute_mut(AttributeType::MessageAuthenticator as u8) {
            attr.value[0] ^= 0x80;
        }
        // Keep the Response Authenticator valid so only the HMAC is wrong
        response.authenticator =
            calculate_response_authenticator(&response, &request.authenticator, SECRET)
                .expect("authenticator");
        vec![response.encode().expect("encode")]
    })
    .await;
    let config = probe_config(
        responder.addr,
        r#"{ "username": "probe", "password": "pw", "secret": "testing123", "timeout": 1 }"#,
    );

    let outcome = probe(&config).await;
    assert!(!outcome.success);
    assert_eq!(outcome.response_code, None);
    assert!(matches!(
        outcome.error,
        Some(ProbeError::TooManyMalformedResponses {
            last: ValidationError::MessageAuthenticatorInvalid(_),
            ..
        })
    ));
}

#[tokio::test]
async fn test_wrong_secret_is_rejected() {
    let responder = spawn_responder(|request, _| {
        let mut response = response_packet(request, Code::AccessAccept);
        vec![sign_response(&mut response, &request.authenticator, b"other").expect("sign")]
    })
    .await;
    let config = probe_config(
        responder.addr,
        r#"{ "username": "probe", "password": "pw", "secret": "testing123", "timeout": 1 }"#,
    );

    let outcome = probe(&config).await;
    assert!(!outcome.success);
    assert!(matches!(
        outcome.error,
        Some(ProbeError::TooManyMalformedResponses {
            last: ValidationError::BadAuthenticator,
            ..
        })
    ));
}

#[tokio::test]
async fn test_missing_message_authenticator_by_mode() {
    let responder =
        spawn_responder(|request, _| vec![unsigned_response(request, Code::AccessAccept)]).await;

    let strict = probe_config(
        responder.addr,
        r#"{ "username": "probe", "password": "pw", "secret": "testing123", "timeout": 1 }"#,
    );
    assert_eq!(strict.module.validation_mode, ValidationMode::Strict);
    let outcome = probe(&strict).await;
    assert!(!outcome.success);

    let lenient = probe_config(
        responder.addr,
        r#"{ "username": "probe", "password": "pw", "secret": "testing123", "timeout": 1,
             "require_message_authenticator": false }"#,
    );
    assert_eq!(lenient.module.validation_mode, ValidationMode::Lenient);
    let outcome = probe(&lenient).await;
    assert!(outcome.success);
    assert_eq!(outcome.response_code, Some(Code::AccessAccept));
}

#[tokio::test]
async fn test_late_reply_after_retransmission() {
    // Ignore the first transmission, answer the retransmission
    let responder = spawn_responder(|request, count| {
        if count < 2 {
            Vec::new()
        } else {
            vec![signed_response(request, Code::AccessAccept)]
        }
    })
    .await;
    let config = probe_config(
        responder.addr,
        r#"{ "username": "probe", "password": "pw", "secret": "testing123",
             "timeout": 2, "retries": 1, "attempt_timeout_ms": 200 }"#,
    );
    let module = &config.module;
    let request = RequestBuilder::new(module).build().unwrap();
    assert_eq!(
        module.policy,
        RetryPolicy::new(Duration::from_secs(2), 1, 0).with_attempt_timeout(Duration::from_millis(200))
    );

    let result = Exchange::new(&request, &module.secret, responder.addr, module.policy, module.validation_mode)
        .run()
        .await
        .unwrap();

    assert_eq!(result.transmissions, 2);
    assert_eq!(result.discarded, 0);
    assert!(result.latency >= Duration::from_millis(200));
}

#[tokio::test]
async fn test_dropped_probe_stops_promptly() {
    let responder = spawn_responder(|_, _| Vec::new()).await;
    let config = probe_config(
        responder.addr,
        r#"{ "username": "probe", "password": "pw", "secret": "testing123", "timeout": 10 }"#,
    );

    let started = Instant::now();
    let cancelled = tokio::time::timeout(Duration::from_millis(100), probe(&config)).await;
    assert!(cancelled.is_err());
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(responder.received(), 1);
}

#[tokio::test]
async fn test_huge_timeout_yields_an_outcome() {
    let responder = spawn_responder(|_, _| Vec::new()).await;
    let checked = probe_config(
        responder.addr,
        r#"{ "username": "probe", "password": "pw", "secret": "testing123" }"#,
    );
    let mut module = (*checked.module).clone();
    module.policy = RetryPolicy::new(Duration::MAX, 0, 0);
    let config = ProbeConfig {
        target: checked.target.clone(),
        module: Arc::new(module),
    };

    let outcome = probe(&config).await;
    assert!(!outcome.success);
    assert!(matches!(outcome.error, Some(ProbeError::Configuration(_))));
}
