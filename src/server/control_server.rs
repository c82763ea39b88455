//! HTTP control server.
//!
//! Serves a [`Router`] over plain HTTP from a single background thread.
//! Uses `tiny_http`, which works on both host and ESP32 (via std::net).
//!
//! Requests are handled one at a time in arrival order: a press blocks the
//! thread for its hold time and later requests wait in the accept queue.

use super::routes::Router;
use log::{error, info, warn};
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Method, Response, Server};

/// How often the server loop checks the shutdown flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Stack for the server thread; handlers only format short strings.
const SERVER_STACK_SIZE: usize = 8 * 1024;

/// Running control server. Drop it to stop the server.
pub struct ControlServer {
    /// Server thread handle.
    handle: Option<thread::JoinHandle<()>>,
    /// Flag to signal shutdown.
    shutdown: Arc<AtomicBool>,
    /// Address actually bound (resolves port `0`).
    local_addr: SocketAddr,
}

impl ControlServer {
    /// Start the control server.
    ///
    /// # Arguments
    ///
    /// * `bind_addr` - IP address to bind to (use `None` for 0.0.0.0)
    /// * `port` - Port to listen on (`0` picks a free port)
    /// * `router` - Routes to serve
    pub fn start(bind_addr: Option<IpAddr>, port: u16, router: Router) -> io::Result<Self> {
        let addr = SocketAddr::new(
            bind_addr.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            port,
        );

        let server = Server::http(addr)
            .map_err(|e| io::Error::new(io::ErrorKind::AddrInUse, e.to_string()))?;
        let local_addr = server.server_addr().to_ip().unwrap_or(addr);

        info!("Control server listening on http://{}", local_addr);

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let handle = thread::Builder::new()
            .name("http".into())
            .stack_size(SERVER_STACK_SIZE)
            .spawn(move || Self::run_server(server, router, shutdown_clone))?;

        Ok(Self {
            handle: Some(handle),
            shutdown,
            local_addr,
        })
    }

    /// Address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    fn run_server(server: Server, router: Router, shutdown: Arc<AtomicBool>) {
        let text_plain = Header::from_bytes(&b"Content-Type"[..], &b"text/plain"[..])
            .expect("static header");
        let allow_get = Header::from_bytes(&b"Allow"[..], &b"GET"[..]).expect("static header");

        loop {
            // Acquire pairs with the Release store in stop()
            if shutdown.load(Ordering::Acquire) {
                info!("Control server shutting down");
                break;
            }

            match server.recv_timeout(SHUTDOWN_POLL) {
                Ok(Some(request)) => {
                    if request.method() != &Method::Get {
                        let response = Response::from_string("Method Not Allowed")
                            .with_status_code(405)
                            .with_header(allow_get.clone())
                            .with_header(text_plain.clone());
                        if let Err(e) = request.respond(response) {
                            warn!("Failed to send 405: {}", e);
                        }
                        continue;
                    }

                    let reply = router.dispatch(request.url());
                    if reply.status == 404 {
                        warn!("No route for {}", request.url());
                    }

                    let response = Response::from_string(reply.body)
                        .with_status_code(reply.status)
                        .with_header(text_plain.clone());
                    if let Err(e) = request.respond(response) {
                        warn!("Failed to send response: {}", e);
                    }
                }
                Ok(None) => {
                    // Timeout, check shutdown flag and continue
                }
                Err(e) => {
                    error!("Control server error: {}", e);
                    break;
                }
            }
        }
    }

    /// Stop the server.
    ///
    /// May take up to 100ms due to the polling interval.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ControlServer {
    fn drop(&mut self) {
        self.stop();
    }
}
