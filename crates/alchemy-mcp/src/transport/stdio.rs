//! stdio transport for MCP
//!
//! Messages are newline-delimited JSON. Stdout carries nothing but protocol
//! frames; logs go to stderr.

use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::trace;

use crate::protocol::JsonRpcResponse;

/// Line-framed transport over any async reader/writer pair
pub struct AsyncStdioTransport<R = BufReader<tokio::io::Stdin>, W = tokio::io::Stdout> {
    reader: R,
    writer: W,
}

impl AsyncStdioTransport {
    pub fn new() -> Self {
        Self::from_parts(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl Default for AsyncStdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, W> AsyncStdioTransport<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn from_parts(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Read the next non-blank line. `None` means end of input.
    pub async fn read_message(&mut self) -> io::Result<Option<String>> {
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line).await? == 0 {
                return Ok(None);
            }

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            trace!("Received: {}", line);
            return Ok(Some(line.to_string()));
        }
    }

    pub async fn write_message(&mut self, message: &str) -> io::Result<()> {
        trace!("Sending: {}", message);
        self.writer.write_all(message.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    pub async fn write_response(&mut self, response: &JsonRpcResponse) -> io::Result<()> {
        let json = serde_json::to_string(response)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.write_message(&json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RequestId;
    use serde_json::json;

    #[tokio::test]
    async fn test_read_skips_blank_lines() {
        let input: &[u8] = b"\n   \n{\"a\":1}\n\n";
        let mut transport = AsyncStdioTransport::from_parts(input, Vec::new());

        assert_eq!(
            transport.read_message().await.unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        assert_eq!(transport.read_message().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_response_is_one_line() {
        let mut transport = AsyncStdioTransport::from_parts(&b""[..], Vec::new());
        let response = JsonRpcResponse::success(RequestId::Number(1), json!({}));
        transport.write_response(&response).await.unwrap();

        let written = String::from_utf8(transport.writer).unwrap();
        assert!(written.ends_with('\n'));
        assert_eq!(written.matches('\n').count(), 1);
    }
}
