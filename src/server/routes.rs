//! Route table for the control server.
//!
//! Handlers are plain closures registered on a [`Router`]; they receive the
//! parsed query string and return a [`Reply`]. Nothing here touches sockets,
//! so the full request contract is tested without a network.
//!
//! | Route          | Query               | Reply                                   |
//! |----------------|---------------------|-----------------------------------------|
//! | `/press`       | ignored             | `200 SUCCESS`                           |
//! | `/areyoualive` | ignored             | `200 OK`                                |
//! | `/test`        | `angle`, `duration` | `200 Servo moved successfully` or `400` |
//!
//! Query keys and values are percent-decoded (`+` is a space) before lookup.
//! `/test` parses both values strictly as decimal integers. On top of the
//! missing-parameter and invalid-angle replies, a `duration` that is not an
//! integer in `0..=`[`MAX_TEST_DURATION_MS`] gets its own `400` with
//! [`TEST_INVALID_DURATION`]; `duration=5ms` is rejected rather than read as `5`.

use crate::config::ServoConfig;
use crate::servo::{Angle, Servo};
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;

pub const PRESS_OK: &str = "SUCCESS";
pub const ALIVE_OK: &str = "OK";
pub const TEST_OK: &str = "Servo moved successfully";
pub const TEST_MISSING_PARAM: &str = "Missing angle or duration parameter.";
pub const TEST_INVALID_ANGLE: &str = "Invalid angle. Must be between 0 and 180.";
pub const TEST_INVALID_DURATION: &str =
    "Invalid duration. Must be a non-negative number of milliseconds.";
/// Longest hold `/test` accepts, the range of a signed 32-bit millisecond count.
pub const MAX_TEST_DURATION_MS: u64 = i32::MAX as u64;

pub const SERVO_FAULT: &str = "Servo error.";
pub const NOT_FOUND: &str = "Not Found";

/// Plain-text HTTP reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl Reply {
    /// `200` with `body`.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// `400` with `body`.
    pub fn bad_request(body: impl Into<String>) -> Self {
        Self {
            status: 400,
            body: body.into(),
        }
    }

    /// `404`.
    pub fn not_found() -> Self {
        Self {
            status: 404,
            body: NOT_FOUND.to_string(),
        }
    }

    /// `500` with `body`.
    pub fn internal_error(body: impl Into<String>) -> Self {
        Self {
            status: 500,
            body: body.into(),
        }
    }
}

/// Query string parameters, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    /// Parse the part after `?`. Keys without `=` get an empty value.
    ///
    /// Keys and values are percent-decoded; `+` decodes to a space.
    pub fn parse(raw: &str) -> Self {
        let pairs = raw
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) => (percent_decode(key), percent_decode(value)),
                None => (percent_decode(pair), String::new()),
            })
            .collect();
        Self { pairs }
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Decode `%XX` escapes and `+` in a query component.
///
/// Malformed escapes are kept as literal text. Decoded bytes that are not
/// valid UTF-8 are replaced with U+FFFD.
fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => {
                let escaped = bytes
                    .get(i + 1..i + 3)
                    .filter(|hex| hex.iter().all(u8::is_ascii_hexdigit))
                    .and_then(|hex| std::str::from_utf8(hex).ok())
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok());
                match escaped {
                    Some(byte) => {
                        out.push(byte);
                        i += 2;
                    }
                    None => out.push(b'%'),
                }
            }
            byte => out.push(byte),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Split a request target into path and query.
pub fn split_target(url: &str) -> (&str, Query) {
    match url.split_once('?') {
        Some((path, query)) => (path, Query::parse(query)),
        None => (url, Query::default()),
    }
}

type Handler = Box<dyn Fn(&Query) -> Reply + Send + Sync>;

/// Exact-path GET router.
#[derive(Default)]
pub struct Router {
    routes: Vec<(&'static str, Handler)>,
}

impl Router {
    /// Create an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `path`. A later registration for the same path
    /// never matches.
    pub fn route<F>(mut self, path: &'static str, handler: F) -> Self
    where
        F: Fn(&Query) -> Reply + Send + Sync + 'static,
    {
        self.routes.push((path, Box::new(handler)));
        self
    }

    /// Registered paths, in registration order.
    pub fn paths(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.routes.iter().map(|(path, _)| *path)
    }

    /// Dispatch a request target such as `/test?angle=90&duration=500`.
    pub fn dispatch(&self, url: &str) -> Reply {
        let (path, query) = split_target(url);
        match self.routes.iter().find(|(p, _)| *p == path) {
            Some((_, handler)) => handler(&query),
            None => Reply::not_found(),
        }
    }
}

/// Build the device's routes.
pub fn control_routes(servo: Arc<Servo>, config: ServoConfig) -> Router {
    let press_servo = servo.clone();
    let test_servo = servo;

    Router::new()
        .route("/press", move |_query| press(&press_servo, &config))
        .route("/areyoualive", |_query| {
            info!("Are you alive request received");
            Reply::ok(ALIVE_OK)
        })
        .route("/test", move |query| test(&test_servo, query))
}

fn press(servo: &Servo, config: &ServoConfig) -> Reply {
    info!("Button press request received");
    match servo.press(config.press_angle, config.press_duration) {
        Ok(()) => Reply::ok(PRESS_OK),
        Err(e) => {
            warn!("Press failed: {}", e);
            Reply::internal_error(SERVO_FAULT)
        }
    }
}

fn test(servo: &Servo, query: &Query) -> Reply {
    let (Some(angle), Some(duration)) = (query.get("angle"), query.get("duration")) else {
        return Reply::bad_request(TEST_MISSING_PARAM);
    };

    let Some(angle) = angle.trim().parse().ok().and_then(|deg| Angle::new(deg).ok()) else {
        return Reply::bad_request(TEST_INVALID_ANGLE);
    };

    let Some(millis) = duration
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|ms| *ms <= MAX_TEST_DURATION_MS)
    else {
        return Reply::bad_request(TEST_INVALID_DURATION);
    };

    info!("Moving servo to {} degrees for {} ms", angle, millis);
    match servo.press(angle, Duration::from_millis(millis)) {
        Ok(()) => Reply::ok(TEST_OK),
        Err(e) => {
            warn!("Test move failed: {}", e);
            Reply::internal_error(SERVO_FAULT)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::servo::SimulatedServo;

    fn setup() -> (SimulatedServo, Router) {
        let sim = SimulatedServo::new();
        let servo = Arc::new(Servo::new(sim.clone()));
        let config = ServoConfig {
            press_duration: Duration::from_millis(5),
            ..ServoConfig::default()
        };
        (sim, control_routes(servo, config))
    }

    #[test]
    fn test_query_parse() {
        let query = Query::parse("angle=45&duration=100&flag&angle=90");
        assert_eq!(query.get("angle"), Some("45"));
        assert_eq!(query.get("duration"), Some("100"));
        assert_eq!(query.get("flag"), Some(""));
        assert_eq!(query.get("missing"), None);
    }

    #[test]
    fn test_query_percent_decoding() {
        let query = Query::parse("angle=%39%30&note=two+words&dur%61tion=5&bad=%zz%+5%4");
        assert_eq!(query.get("angle"), Some("90"));
        assert_eq!(query.get("note"), Some("two words"));
        assert_eq!(query.get("duration"), Some("5"));
        assert_eq!(query.get("bad"), Some("%zz% 5%4"));
    }

    #[test]
    fn test_split_target() {
        let (path, query) = split_target("/test?angle=1");
        assert_eq!(path, "/test");
        assert_eq!(query.get("angle"), Some("1"));

        let (path, query) = split_target("/press");
        assert_eq!(path, "/press");
        assert_eq!(query, Query::default());
    }

    #[test]
    fn test_router_registration_order() {
        let (_, router) = setup();
        let paths: Vec<_> = router.paths().collect();
        assert_eq!(paths, vec!["/press", "/areyoualive", "/test"]);
    }

    #[test]
    fn test_press_uses_configured_angle() {
        let (sim, router) = setup();
        assert_eq!(router.dispatch("/press"), Reply::ok("SUCCESS"));
        assert_eq!(sim.history(), vec![90, 0]);
    }

    #[test]
    fn test_press_ignores_query() {
        let (sim, router) = setup();
        let reply = router.dispatch("/press?angle=10&duration=9999");
        assert_eq!(reply, Reply::ok("SUCCESS"));
        assert_eq!(sim.history(), vec![90, 0]);
    }

    #[test]
    fn test_alive_has_no_side_effects() {
        let (sim, router) = setup();
        assert_eq!(router.dispatch("/areyoualive"), Reply::ok("OK"));
        assert_eq!(router.dispatch("/areyoualive?x=1"), Reply::ok("OK"));
        assert!(sim.history().is_empty());
    }

    #[test]
    fn test_valid_test_request() {
        let (sim, router) = setup();
        let reply = router.dispatch("/test?angle=45&duration=5");
        assert_eq!(reply, Reply::ok("Servo moved successfully"));
        assert_eq!(sim.history(), vec![45, 0]);
    }

    #[test]
    fn test_encoded_test_request() {
        let (sim, router) = setup();
        let reply = router.dispatch("/test?angle=%39%30&duration=%35");
        assert_eq!(reply, Reply::ok("Servo moved successfully"));
        assert_eq!(sim.history(), vec![90, 0]);
    }

    #[test]
    fn test_boundary_angles_accepted() {
        let (sim, router) = setup();
        assert_eq!(router.dispatch("/test?angle=0&duration=0").status, 200);
        assert_eq!(router.dispatch("/test?duration=0&angle=180").status, 200);
        assert_eq!(sim.history(), vec![0, 0, 180, 0]);
    }

    #[test]
    fn test_out_of_range_angle_rejected() {
        let (sim, router) = setup();
        for url in ["/test?angle=200&duration=500", "/test?angle=-1&duration=500"] {
            assert_eq!(
                router.dispatch(url),
                Reply::bad_request("Invalid angle. Must be between 0 and 180.")
            );
        }
        assert!(sim.history().is_empty());
    }

    #[test]
    fn test_non_numeric_angle_rejected() {
        let (sim, router) = setup();
        let reply = router.dispatch("/test?angle=up&duration=500");
        assert_eq!(reply.body, TEST_INVALID_ANGLE);
        assert!(sim.history().is_empty());
    }

    #[test]
    fn test_missing_parameters_rejected() {
        let (sim, router) = setup();
        for url in ["/test", "/test?angle=90", "/test?duration=500", "/test?angle=999"] {
            assert_eq!(
                router.dispatch(url),
                Reply::bad_request("Missing angle or duration parameter.")
            );
        }
        assert!(sim.history().is_empty());
    }

    #[test]
    fn test_invalid_duration_rejected() {
        let (sim, router) = setup();
        for url in [
            "/test?angle=90&duration=-5",
            "/test?angle=90&duration=soon",
            "/test?angle=90&duration=5ms",
        ] {
            assert_eq!(router.dispatch(url), Reply::bad_request(TEST_INVALID_DURATION));
        }
        assert!(sim.history().is_empty());
    }

    #[test]
    fn test_oversized_duration_rejected() {
        let (sim, router) = setup();
        for url in [
            "/test?angle=90&duration=18446744073709551615",
            "/test?angle=90&duration=2147483648",
        ] {
            assert_eq!(router.dispatch(url), Reply::bad_request(TEST_INVALID_DURATION));
        }
        assert!(sim.history().is_empty());
    }

    #[test]
    fn test_servo_fault_reported() {
        let (sim, router) = setup();
        sim.fail_next();
        let reply = router.dispatch("/press");
        assert_eq!(reply.status, 500);
        // Return-to-rest still issued
        assert_eq!(sim.history(), vec![0]);
    }

    #[test]
    fn test_unknown_path() {
        let (_, router) = setup();
        assert_eq!(router.dispatch("/nope"), Reply::not_found());
        assert_eq!(router.dispatch("/press/"), Reply::not_found());
    }
}
