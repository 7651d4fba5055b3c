use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

use crate::http::parser::{ParseError, parse_http_request};
use crate::http::request::Request;
use crate::http::writer::ResponseWriter;
use crate::serve::handler::StaticHandler;

/// Upper bound on one buffered request (request line, headers, and any
/// declared body). Anything larger is dropped before the read timeout can
/// let it keep allocating.
const MAX_REQUEST_BYTES: usize = 16 * 1024;

pub struct Connection {
    stream: TcpStream,
    buffer: BytesMut,
    state: ConnectionState,
    handler: Arc<StaticHandler>,
    read_timeout: Duration,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter, bool), // bool = keep_alive?
    Closed,
}

impl Connection {
    pub fn new(stream: TcpStream, handler: Arc<StaticHandler>, read_timeout: Duration) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(4096),
            state: ConnectionState::Reading,
            handler,
            read_timeout,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match &mut self.state {
                ConnectionState::Reading => {
                    match tokio::time::timeout(self.read_timeout, Self::read_request(&mut self.stream, &mut self.buffer)).await {
                        Ok(Ok(Some(req))) => {
                            self.state = ConnectionState::Processing(req);
                        }
                        Ok(Ok(None)) => {
                            // Client closed the connection between requests.
                            self.state = ConnectionState::Closed;
                        }
                        Ok(Err(e)) => {
                            self.state = ConnectionState::Closed;
                            return Err(e);
                        }
                        Err(_) => {
                            tracing::debug!("closing connection: no complete request within timeout");
                            self.state = ConnectionState::Closed;
                        }
                    }
                }

                ConnectionState::Processing(req) => {
                    let keep_alive = req.keep_alive();
                    let response = self.handler.handle(req).await;

                    let writer = ResponseWriter::new(&response);
                    self.state = ConnectionState::Writing(writer, keep_alive);
                }

                ConnectionState::Writing(writer, keep_alive) => {
                    if let Err(e) = writer.write_to_stream(&mut self.stream).await {
                        // The client went away mid-response. Abandon the
                        // connection; other connections are unaffected.
                        tracing::debug!("client disconnected during response: {e}");
                        self.state = ConnectionState::Closed;
                        continue;
                    }

                    if *keep_alive {
                        self.state = ConnectionState::Reading; // go back for next request
                    } else {
                        self.state = ConnectionState::Closed;
                    }
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    async fn read_request(
        stream: &mut TcpStream,
        buffer: &mut BytesMut,
    ) -> anyhow::Result<Option<Request>> {
        loop {
            // Try parsing whatever we already have
            match parse_http_request(buffer) {
                Ok((request, consumed)) => {
                    let _ = buffer.split_to(consumed);
                    return Ok(Some(request));
                }

                Err(ParseError::Incomplete) => {
                    if buffer.len() > MAX_REQUEST_BYTES {
                        anyhow::bail!(
                            "request exceeded {MAX_REQUEST_BYTES} bytes without completing"
                        );
                    }
                    // Need more data → fall through to read
                }

                Err(e) => {
                    return Err(anyhow::anyhow!("HTTP parse error: {:?}", e));
                }
            }

            let n = stream.read_buf(buffer).await?;

            if n == 0 {
                return Ok(None);
            }
        }
    }
}
