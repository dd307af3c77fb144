// Plug TCP client
//
// Owns one framed TCP connection to a plug and performs strictly
// sequential request/response exchanges over it. Endpoint modules
// (system, time, emeter) are implemented as inherent methods in
// separate files to keep this module focused on transport mechanics.

use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, info, trace};

use crate::command::{Command, Request};
use crate::error::Error;
use crate::frame::FrameCodec;
use crate::models::Response;
use crate::transport::{TransportConfig, millis};

/// Raw client for a single plug connection.
///
/// Every call writes exactly one frame and reads exactly one frame. The
/// `&mut self` receivers make a second in-flight request impossible, so
/// replies can never be attributed to the wrong request.
pub struct KasaClient {
    framed: Framed<TcpStream, FrameCodec>,
    peer: SocketAddr,
    timeout: Duration,
}

impl KasaClient {
    /// Open a TCP connection to `host:port`.
    ///
    /// The handshake is bounded by `transport.connect_timeout`; a refused
    /// or unreachable address becomes `Error::Connect`.
    pub async fn connect(
        host: &str,
        port: u16,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let addr = format!("{host}:{port}");
        debug!(%addr, "connecting to plug");

        let stream = tokio::time::timeout(transport.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| Error::ConnectTimeout {
                addr: addr.clone(),
                timeout_ms: millis(transport.connect_timeout),
            })?
            .map_err(|source| Error::Connect {
                addr: addr.clone(),
                source,
            })?;

        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        info!(%peer, "connected to plug");

        Ok(Self {
            framed: Framed::new(stream, transport.codec()),
            peer,
            timeout: transport.timeout,
        })
    }

    /// Address of the connected plug.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Send a request and parse the reply into the typed response schema.
    ///
    /// No `err_code` check is applied; see [`KasaClient::execute`].
    pub async fn send(&mut self, request: &Request) -> Result<Response, Error> {
        let body = self.exchange(request).await?;
        Response::from_slice(&body)
    }

    /// Send an arbitrary request and return the reply as loosely-typed JSON.
    ///
    /// A non-zero `err_code` in `reply[target][command]` is still surfaced
    /// as `Error::Device`.
    pub async fn send_raw(&mut self, request: &Request) -> Result<serde_json::Value, Error> {
        let body = self.exchange(request).await?;
        let value: serde_json::Value =
            serde_json::from_slice(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: String::from_utf8_lossy(&body).into_owned(),
            })?;

        // Unsupported namespaces report at the namespace level instead.
        let namespace = &value[request.target()];
        let status = match namespace.get(request.command()) {
            Some(result) => result,
            None => namespace,
        };
        let code = status["err_code"].as_i64().unwrap_or(0);
        if code != 0 {
            return Err(Error::Device {
                target: request.target().into(),
                command: request.command().into(),
                code,
                message: status["err_msg"].as_str().map(String::from),
            });
        }
        Ok(value)
    }

    /// Send a typed command and check its authoritative `err_code`.
    pub async fn execute(&mut self, command: Command) -> Result<Response, Error> {
        let response = self.send(&command.request()).await?;
        response.check(command)?;
        Ok(response)
    }

    /// Flush and shut down the connection.
    pub async fn close(mut self) -> Result<(), Error> {
        debug!(peer = %self.peer, "closing plug connection");
        SinkExt::<&[u8]>::close(&mut self.framed).await
    }

    // ── Internal helpers ─────────────────────────────────────────────

    /// Write one frame and read one frame, each under the I/O deadline.
    async fn exchange(&mut self, request: &Request) -> Result<Bytes, Error> {
        let body = request.to_json()?;
        debug!(
            target_ns = request.target(),
            command = request.command(),
            "sending request"
        );
        trace!(body = %String::from_utf8_lossy(&body), "request body");

        let timeout = self.timeout;
        tokio::time::timeout(timeout, self.framed.send(body.as_slice()))
            .await
            .map_err(|_| timed_out(timeout))??;

        let reply = tokio::time::timeout(timeout, self.framed.next())
            .await
            .map_err(|_| timed_out(timeout))?
            .ok_or(Error::ConnectionClosed)??;

        trace!(len = reply.len(), body = %String::from_utf8_lossy(&reply), "response body");
        Ok(reply)
    }
}

fn timed_out(timeout: Duration) -> Error {
    Error::Timeout {
        timeout_ms: millis(timeout),
    }
}
