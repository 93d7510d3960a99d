// Listener setup module
// Creates the TCP listener the accept loop runs on

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;

/// Create a `TcpListener` bound to `addr`.
///
/// The socket is built explicitly so `SO_REUSEADDR` can be enabled,
/// allowing a quick restart while the previous socket sits in `TIME_WAIT`.
///
/// # Arguments
///
/// * `addr` - The socket address to bind to
///
/// # Returns
///
/// * `Ok(TcpListener)` - Successfully created and bound listener
/// * `Err(std::io::Error)` - Failed to create or bind socket
pub fn bind(addr: std::net::SocketAddr) -> std::io::Result<TcpListener> {
    // Create socket with appropriate domain (IPv4 or IPv6)
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    // Enable SO_REUSEADDR: allows binding to a port in TIME_WAIT state
    socket.set_reuse_address(true)?;

    // Set non-blocking mode for async compatibility
    socket.set_nonblocking(true)?;

    // Bind to the specified address
    socket.bind(&addr.into())?;

    // Start listening with a backlog queue size of 128
    socket.listen(128)?;

    // Convert socket2::Socket to std::net::TcpListener, then to tokio::net::TcpListener
    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let listener = bind("127.0.0.1:0".parse().expect("valid addr")).expect("bind succeeds");
        let addr = listener.local_addr().expect("local addr");
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_bind_conflict_fails() {
        let first = bind("127.0.0.1:0".parse().expect("valid addr")).expect("bind succeeds");
        let addr = first.local_addr().expect("local addr");
        // A second listener on the same port must report an error, not panic
        // (SO_REUSEADDR alone does not permit two active listeners)
        assert!(bind(addr).is_err());
    }
}
