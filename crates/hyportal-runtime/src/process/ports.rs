//! Port availability probing.

use std::net::TcpListener;
use tracing::debug;

/// Check if a port is available by attempting to bind to it on all interfaces.
///
/// The listener is dropped immediately, which releases the port. Another
/// process may still grab the port before the server binds it.
pub fn is_port_available(port: u16) -> bool {
    match TcpListener::bind(("0.0.0.0", port)) {
        Ok(listener) => listener.local_addr().is_ok(),
        Err(e) => {
            debug!(port = %port, error = %e, "Port unavailable");
            false
        }
    }
}
