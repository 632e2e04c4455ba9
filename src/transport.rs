//! TLS transport establishment.
//!
//! Produces the encrypted duplex stream the session runs on. ALPN is
//! restricted to `h2`; certificate chains are checked against the system
//! trust store but hostname verification is disabled so the target can be
//! given as a bare IP address.

use log::warn;
use tokio::net::TcpStream;
use tokio_native_tls::TlsStream;

use crate::Error;

/// Establishes a TLS session to `host:port`, negotiating HTTP/2 via ALPN.
pub async fn connect(host: &str, port: u16) -> Result<TlsStream<TcpStream>, Error> {
    let connector = native_tls::TlsConnector::builder()
        .request_alpns(&["h2"])
        // Allows you to use an IP address for the hostname
        .danger_accept_invalid_hostnames(true)
        .build()?;
    let connector = tokio_native_tls::TlsConnector::from(connector);

    let tcp = TcpStream::connect((host, port)).await?;
    tcp.set_nodelay(true)?;

    let stream = connector.connect(host, tcp).await?;

    match stream.get_ref().negotiated_alpn() {
        Ok(Some(proto)) if proto == b"h2" => {}
        Ok(other) => warn!(
            "server did not negotiate h2 via ALPN (got {:?}); proceeding anyway",
            other.as_deref().map(String::from_utf8_lossy)
        ),
        Err(e) => warn!("could not query negotiated ALPN protocol: {}", e),
    }

    Ok(stream)
}
