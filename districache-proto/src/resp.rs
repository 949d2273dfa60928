//! # Async RESP2-style Encoding and Parsing
//!
//! A Redis-compatible wire grammar (`+`/`-`/`:`/`$`/`*` prefixes) over
//! `tokio::io::AsyncRead`/`AsyncWrite` so the worker and router can hold
//! many RPCs in flight without a thread per connection.
//!
//! ## Design Principles
//! 1. **Binary-Safe**: bulk strings are raw bytes, never assumed UTF-8 here.
//! 2. **Buffer Reuse**: callers provide the line buffer so a pooled
//!    connection does not reallocate per call.
//! 3. **Fail Fast**: malformed framing surfaces as `Error::Transport`
//!    immediately rather than attempting resynchronization.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use districache_common::{Error, Result};

/// One RESP value, spanning both directions of the protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// `+...` simple status strings, e.g. a bare `OK`.
    Simple(Vec<u8>),
    /// `-...` server-side error text.
    Error(Vec<u8>),
    /// `:...` signed integers.
    Integer(i64),
    /// `$...` bulk strings; `None` encodes as `$-1`.
    Bulk(Option<Vec<u8>>),
    /// `*...` arrays, used for commands and composite replies.
    Array(Vec<RespValue>),
}

impl RespValue {
    pub fn bulk_from(bytes: impl Into<Vec<u8>>) -> Self {
        RespValue::Bulk(Some(bytes.into()))
    }
}

/// Encodes a command as a RESP array of bulk strings into `out`.
pub fn encode_command(args: &[&[u8]], out: &mut Vec<u8>) {
    out.push(b'*');
    push_usize(out, args.len());
    out.extend_from_slice(b"\r\n");
    for arg in args {
        out.push(b'$');
        push_usize(out, arg.len());
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(arg);
        out.extend_from_slice(b"\r\n");
    }
}

/// Encodes an arbitrary [`RespValue`] into `out`, recursing for arrays.
pub fn encode_value(value: &RespValue, out: &mut Vec<u8>) {
    match value {
        RespValue::Simple(text) => {
            out.push(b'+');
            out.extend_from_slice(text);
            out.extend_from_slice(b"\r\n");
        }
        RespValue::Error(text) => {
            out.push(b'-');
            out.extend_from_slice(text);
            out.extend_from_slice(b"\r\n");
        }
        RespValue::Integer(value) => {
            out.push(b':');
            push_i64(out, *value);
            out.extend_from_slice(b"\r\n");
        }
        RespValue::Bulk(None) => out.extend_from_slice(b"$-1\r\n"),
        RespValue::Bulk(Some(data)) => {
            out.push(b'$');
            push_usize(out, data.len());
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(data);
            out.extend_from_slice(b"\r\n");
        }
        RespValue::Array(items) => {
            out.push(b'*');
            push_usize(out, items.len());
            out.extend_from_slice(b"\r\n");
            for item in items {
                encode_value(item, out);
            }
        }
    }
}

/// Writes `out` to `writer` and flushes it.
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, out: &[u8]) -> Result<()> {
    writer
        .write_all(out)
        .await
        .map_err(|e| Error::Transport(e.to_string()))?;
    writer.flush().await.map_err(|e| Error::Transport(e.to_string()))
}

/// Reads one [`RespValue`] from `reader`.
pub async fn read_value<R: AsyncRead + Unpin>(reader: &mut R, line_buf: &mut Vec<u8>) -> Result<RespValue> {
    read_line(reader, line_buf).await?;
    if line_buf.is_empty() {
        return Err(Error::Transport("empty RESP line".into()));
    }

    let prefix = line_buf[0];
    let rest = line_buf[1..].to_vec();
    match prefix {
        b'+' => Ok(RespValue::Simple(rest)),
        b'-' => Ok(RespValue::Error(rest)),
        b':' => Ok(RespValue::Integer(parse_i64(&rest)?)),
        b'$' => {
            let len = parse_i64(&rest)?;
            read_bulk(reader, len).await
        }
        b'*' => {
            let len = parse_i64(&rest)?;
            read_array(reader, len, line_buf).await
        }
        other => Err(Error::Transport(format!("unknown RESP prefix: {other}"))),
    }
}

async fn read_bulk<R: AsyncRead + Unpin>(reader: &mut R, len: i64) -> Result<RespValue> {
    if len < 0 {
        return Ok(RespValue::Bulk(None));
    }
    let mut data = vec![0u8; len as usize];
    reader.read_exact(&mut data).await.map_err(|e| Error::Transport(e.to_string()))?;

    let mut crlf = [0u8; 2];
    reader.read_exact(&mut crlf).await.map_err(|e| Error::Transport(e.to_string()))?;
    if crlf != [b'\r', b'\n'] {
        return Err(Error::Transport("malformed bulk terminator".into()));
    }
    Ok(RespValue::Bulk(Some(data)))
}

async fn read_array<R: AsyncRead + Unpin>(
    reader: &mut R,
    len: i64,
    line_buf: &mut Vec<u8>,
) -> Result<RespValue> {
    if len <= 0 {
        return Ok(RespValue::Array(Vec::new()));
    }
    let mut items = Vec::with_capacity(len as usize);
    for _ in 0..len {
        items.push(Box::pin(read_value(reader, line_buf)).await?);
    }
    Ok(RespValue::Array(items))
}

async fn read_line<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut Vec<u8>) -> Result<()> {
    buf.clear();
    let mut byte = [0u8; 1];
    loop {
        let n = reader.read(&mut byte).await.map_err(|e| Error::Transport(e.to_string()))?;
        if n == 0 {
            if buf.is_empty() {
                return Err(Error::Transport("connection closed".into()));
            }
            return Err(Error::Transport("connection closed mid-line".into()));
        }
        if byte[0] == b'\n' {
            break;
        }
        buf.push(byte[0]);
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    Ok(())
}

fn parse_i64(data: &[u8]) -> Result<i64> {
    let text = std::str::from_utf8(data).map_err(|_| Error::Transport("non-utf8 integer".into()))?;
    text.parse::<i64>().map_err(|_| Error::Transport(format!("bad integer literal: {text}")))
}

fn push_usize(out: &mut Vec<u8>, value: usize) {
    out.extend_from_slice(value.to_string().as_bytes());
}

fn push_i64(out: &mut Vec<u8>, value: i64) {
    out.extend_from_slice(value.to_string().as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn round_trips_simple_and_bulk() {
        let mut out = Vec::new();
        encode_value(&RespValue::Simple(b"OK".to_vec()), &mut out);
        encode_value(&RespValue::bulk_from(b"hello".to_vec()), &mut out);
        encode_value(&RespValue::Bulk(None), &mut out);
        encode_value(&RespValue::Integer(-7), &mut out);

        let mut reader = Cursor::new(out);
        let mut line = Vec::new();
        assert_eq!(read_value(&mut reader, &mut line).await.unwrap(), RespValue::Simple(b"OK".to_vec()));
        assert_eq!(
            read_value(&mut reader, &mut line).await.unwrap(),
            RespValue::Bulk(Some(b"hello".to_vec()))
        );
        assert_eq!(read_value(&mut reader, &mut line).await.unwrap(), RespValue::Bulk(None));
        assert_eq!(read_value(&mut reader, &mut line).await.unwrap(), RespValue::Integer(-7));
    }

    #[tokio::test]
    async fn round_trips_nested_array() {
        let mut out = Vec::new();
        let value = RespValue::Array(vec![
            RespValue::bulk_from(b"key".to_vec()),
            RespValue::bulk_from(b"value".to_vec()),
            RespValue::Bulk(None),
        ]);
        encode_value(&value, &mut out);

        let mut reader = Cursor::new(out);
        let mut line = Vec::new();
        assert_eq!(read_value(&mut reader, &mut line).await.unwrap(), value);
    }

    #[test]
    fn encode_command_matches_resp_array_of_bulk() {
        let mut out = Vec::new();
        encode_command(&[b"GET", b"key"], &mut out);
        assert_eq!(&out, b"*2\r\n$3\r\nGET\r\n$3\r\nkey\r\n");
    }
}
