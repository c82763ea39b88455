//! End-to-end tests of the control server over loopback HTTP.

use button_pusher_esp32::server::control_routes;
use button_pusher_esp32::{ControlServer, Servo, ServoConfig, SimulatedServo};
use std::io::{Read, Write};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

struct HttpReply {
    status: u16,
    content_type: Option<String>,
    body: String,
}

fn start() -> (SimulatedServo, ControlServer) {
    let sim = SimulatedServo::new();
    let servo = Arc::new(Servo::new(sim.clone()));
    let config = ServoConfig {
        press_duration: Duration::from_millis(20),
        ..ServoConfig::default()
    };
    let server = ControlServer::start(
        Some(IpAddr::V4(Ipv4Addr::LOCALHOST)),
        0,
        control_routes(servo, config),
    )
    .expect("server starts");
    (sim, server)
}

fn request(addr: SocketAddr, method: &str, target: &str) -> HttpReply {
    let mut stream = TcpStream::connect(addr).expect("connect");
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("read timeout");
    write!(
        stream,
        "{} {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        method, target
    )
    .expect("write request");

    let mut raw = String::new();
    stream.read_to_string(&mut raw).expect("read response");

    let (head, body) = raw.split_once("\r\n\r\n").expect("header terminator");
    let mut lines = head.lines();
    let status = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
        .expect("status line");
    let content_type = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
        .map(|(_, value)| value.trim().to_string());

    HttpReply {
        status,
        content_type,
        body: body.to_string(),
    }
}

#[test]
fn test_press_over_http() {
    let (sim, server) = start();
    let start = Instant::now();

    let reply = request(server.local_addr(), "GET", "/press");

    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, "SUCCESS");
    assert!(reply
        .content_type
        .is_some_and(|value| value.starts_with("text/plain")));
    // Response is only sent once the hold has elapsed and the servo is back
    assert!(start.elapsed() >= Duration::from_millis(20));
    assert_eq!(sim.history(), vec![90, 0]);
}

#[test]
fn test_alive_over_http() {
    let (sim, server) = start();
    let reply = request(server.local_addr(), "GET", "/areyoualive");
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, "OK");
    assert!(sim.history().is_empty());
}

#[test]
fn test_test_route_over_http() {
    let (sim, server) = start();
    let addr = server.local_addr();

    let reply = request(addr, "GET", "/test?angle=135&duration=10");
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, "Servo moved successfully");

    let reply = request(addr, "GET", "/test?angle=200&duration=500");
    assert_eq!(reply.status, 400);
    assert_eq!(reply.body, "Invalid angle. Must be between 0 and 180.");

    let reply = request(addr, "GET", "/test?duration=500");
    assert_eq!(reply.status, 400);
    assert_eq!(reply.body, "Missing angle or duration parameter.");

    assert_eq!(sim.history(), vec![135, 0]);
}

#[test]
fn test_encoded_query_over_http() {
    let (sim, server) = start();
    let reply = request(server.local_addr(), "GET", "/test?angle=%34%35&duration=%31%30");
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, "Servo moved successfully");
    assert_eq!(sim.history(), vec![45, 0]);
}

#[test]
fn test_non_get_rejected() {
    let (sim, server) = start();
    let reply = request(server.local_addr(), "POST", "/press");
    assert_eq!(reply.status, 405);
    assert!(sim.history().is_empty());
}

#[test]
fn test_unknown_route() {
    let (_, server) = start();
    let reply = request(server.local_addr(), "GET", "/reboot");
    assert_eq!(reply.status, 404);
}

#[test]
fn test_overlapping_presses_serialize() {
    let (sim, server) = start();
    let addr = server.local_addr();

    let clients: Vec<_> = ["/press", "/test?angle=45&duration=20", "/press"]
        .into_iter()
        .map(|target| thread::spawn(move || request(addr, "GET", target).status))
        .collect();
    for client in clients {
        assert_eq!(client.join().unwrap(), 200);
    }

    let history = sim.history();
    assert_eq!(history.len(), 6);
    for pair in history.chunks(2) {
        assert_ne!(pair[0], 0);
        assert_eq!(pair[1], 0);
    }
}
