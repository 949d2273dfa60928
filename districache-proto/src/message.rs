//! Typed request/response pairs exchanged between the router and a worker,
//! layered over the RESP primitives in [`crate::resp`].
//!
//! Commands mirror spec §4.1's `LRUCache` operations one-to-one, plus a
//! `Health` probe used by `AddNode`'s reachability check.

use districache_common::{CacheStats, Error, KeyWithTtl, Result};

use crate::resp::RespValue;

/// A request issued by the router to a worker.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Health,
    Get { key: String },
    Put { key: String, value: String, ttl_secs: Option<u64> },
    Delete { key: String },
    Stats,
    Clear,
    ListWithTtl,
    CleanupExpired,
}

/// A worker's reply to a [`Request`].
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Liveness reply, carrying the worker's current size and capacity
    /// (spec §6 `Health`).
    Health { current_size: usize, capacity: usize },
    Ok,
    Value(Option<String>),
    Deleted(bool),
    Stats(CacheStats),
    Keys(Vec<KeyWithTtl>),
    Count(usize),
    Error(String),
}

fn bulk(text: impl Into<Vec<u8>>) -> RespValue {
    RespValue::bulk_from(text)
}

fn as_string(value: RespValue) -> Result<String> {
    match value {
        RespValue::Bulk(Some(bytes)) => {
            String::from_utf8(bytes).map_err(|_| Error::Transport("non-utf8 bulk string".into()))
        }
        other => Err(Error::Transport(format!("expected bulk string, got {other:?}"))),
    }
}

fn as_optional_string(value: RespValue) -> Result<Option<String>> {
    match value {
        RespValue::Bulk(None) => Ok(None),
        RespValue::Bulk(Some(bytes)) => {
            String::from_utf8(bytes).map(Some).map_err(|_| Error::Transport("non-utf8 bulk string".into()))
        }
        other => Err(Error::Transport(format!("expected bulk string, got {other:?}"))),
    }
}

pub fn encode_request(req: &Request) -> RespValue {
    let items = match req {
        Request::Health => vec![bulk("HEALTH")],
        Request::Get { key } => vec![bulk("GET"), bulk(key.clone())],
        Request::Put { key, value, ttl_secs } => {
            let mut items = vec![bulk("PUT"), bulk(key.clone()), bulk(value.clone())];
            if let Some(ttl) = ttl_secs {
                items.push(bulk("EX"));
                items.push(bulk(ttl.to_string()));
            }
            items
        }
        Request::Delete { key } => vec![bulk("DEL"), bulk(key.clone())],
        Request::Stats => vec![bulk("STATS")],
        Request::Clear => vec![bulk("CLEAR")],
        Request::ListWithTtl => vec![bulk("LISTTTL")],
        Request::CleanupExpired => vec![bulk("CLEANUP")],
    };
    RespValue::Array(items)
}

pub fn decode_request(value: RespValue) -> Result<Request> {
    let items = match value {
        RespValue::Array(items) => items,
        other => return Err(Error::Transport(format!("expected command array, got {other:?}"))),
    };
    let mut items = items.into_iter();
    let command = as_string(items.next().ok_or_else(|| Error::Transport("empty command".into()))?)?;

    match command.as_str() {
        "HEALTH" => Ok(Request::Health),
        "GET" => Ok(Request::Get { key: as_string(next(&mut items)?)? }),
        "PUT" => {
            let key = as_string(next(&mut items)?)?;
            let value = as_string(next(&mut items)?)?;
            let ttl_secs = match items.next() {
                Some(flag) => {
                    let flag = as_string(flag)?;
                    if flag != "EX" {
                        return Err(Error::Transport(format!("unexpected PUT flag: {flag}")));
                    }
                    let ttl = as_string(next(&mut items)?)?;
                    Some(ttl.parse::<u64>().map_err(|_| Error::Transport("bad TTL literal".into()))?)
                }
                None => None,
            };
            Ok(Request::Put { key, value, ttl_secs })
        }
        "DEL" => Ok(Request::Delete { key: as_string(next(&mut items)?)? }),
        "STATS" => Ok(Request::Stats),
        "CLEAR" => Ok(Request::Clear),
        "LISTTTL" => Ok(Request::ListWithTtl),
        "CLEANUP" => Ok(Request::CleanupExpired),
        other => Err(Error::Transport(format!("unknown command: {other}"))),
    }
}

fn next(items: &mut impl Iterator<Item = RespValue>) -> Result<RespValue> {
    items.next().ok_or_else(|| Error::Transport("missing command argument".into()))
}

pub fn encode_response(resp: &Response) -> RespValue {
    match resp {
        Response::Health { current_size, capacity } => RespValue::Array(vec![
            RespValue::Integer(*current_size as i64),
            RespValue::Integer(*capacity as i64),
        ]),
        Response::Ok => RespValue::Simple(b"OK".to_vec()),
        Response::Value(None) => RespValue::Bulk(None),
        Response::Value(Some(value)) => bulk(value.clone()),
        Response::Deleted(existed) => RespValue::Integer(if *existed { 1 } else { 0 }),
        Response::Count(count) => RespValue::Integer(*count as i64),
        Response::Error(message) => RespValue::Error(message.clone().into_bytes()),
        Response::Stats(stats) => RespValue::Array(vec![
            RespValue::Integer(stats.hits as i64),
            RespValue::Integer(stats.misses as i64),
            bulk(format!("{:.2}", stats.hit_rate)),
            RespValue::Integer(stats.current_size as i64),
            RespValue::Integer(stats.capacity as i64),
        ]),
        Response::Keys(entries) => RespValue::Array(
            entries
                .iter()
                .map(|entry| {
                    RespValue::Array(vec![
                        bulk(entry.key.clone()),
                        bulk(entry.value.clone()),
                        match entry.ttl_remaining {
                            Some(ttl) => bulk(format!("{ttl:.1}")),
                            None => RespValue::Bulk(None),
                        },
                    ])
                })
                .collect(),
        ),
    }
}

pub fn decode_response(value: RespValue, req: &Request) -> Result<Response> {
    if let RespValue::Error(message) = &value {
        return Ok(Response::Error(String::from_utf8_lossy(message).into_owned()));
    }

    match req {
        Request::Health => {
            let items = match value {
                RespValue::Array(items) if items.len() == 2 => items,
                other => return Err(Error::Transport(format!("malformed health reply: {other:?}"))),
            };
            let mut items = items.into_iter();
            let current_size = expect_integer(next(&mut items)?)? as usize;
            let capacity = expect_integer(next(&mut items)?)? as usize;
            Ok(Response::Health { current_size, capacity })
        }
        Request::Get { .. } => Ok(Response::Value(as_optional_string(value)?)),
        Request::Put { .. } | Request::Clear => Ok(Response::Ok),
        Request::Delete { .. } => match value {
            RespValue::Integer(n) => Ok(Response::Deleted(n != 0)),
            other => Err(Error::Transport(format!("expected integer, got {other:?}"))),
        },
        Request::CleanupExpired => match value {
            RespValue::Integer(n) => Ok(Response::Count(n as usize)),
            other => Err(Error::Transport(format!("expected integer, got {other:?}"))),
        },
        Request::Stats => {
            let items = match value {
                RespValue::Array(items) if items.len() == 5 => items,
                other => return Err(Error::Transport(format!("malformed stats reply: {other:?}"))),
            };
            let mut items = items.into_iter();
            let hits = expect_integer(next(&mut items)?)? as u64;
            let misses = expect_integer(next(&mut items)?)? as u64;
            let hit_rate: f64 = as_string(next(&mut items)?)?
                .parse()
                .map_err(|_| Error::Transport("malformed hit_rate".into()))?;
            let current_size = expect_integer(next(&mut items)?)? as usize;
            let capacity = expect_integer(next(&mut items)?)? as usize;
            Ok(Response::Stats(CacheStats { hits, misses, hit_rate, current_size, capacity }))
        }
        Request::ListWithTtl => {
            let items = match value {
                RespValue::Array(items) => items,
                other => return Err(Error::Transport(format!("malformed listttl reply: {other:?}"))),
            };
            let entries = items
                .into_iter()
                .map(|item| {
                    let mut fields = match item {
                        RespValue::Array(fields) if fields.len() == 3 => fields.into_iter(),
                        other => return Err(Error::Transport(format!("malformed entry: {other:?}"))),
                    };
                    let key = as_string(next(&mut fields)?)?;
                    let value = as_string(next(&mut fields)?)?;
                    let ttl_remaining = match next(&mut fields)? {
                        RespValue::Bulk(None) => None,
                        RespValue::Bulk(Some(bytes)) => Some(
                            String::from_utf8_lossy(&bytes)
                                .parse::<f64>()
                                .map_err(|_| Error::Transport("malformed ttl_remaining".into()))?,
                        ),
                        other => return Err(Error::Transport(format!("malformed ttl field: {other:?}"))),
                    };
                    Ok(KeyWithTtl { key, value, ttl_remaining })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Response::Keys(entries))
        }
    }
}

fn expect_integer(value: RespValue) -> Result<i64> {
    match value {
        RespValue::Integer(n) => Ok(n),
        other => Err(Error::Transport(format!("expected integer, got {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_get_request() {
        let req = Request::Get { key: "k".into() };
        let encoded = encode_request(&req);
        assert_eq!(decode_request(encoded).unwrap(), req);
    }

    #[test]
    fn round_trips_put_with_ttl() {
        let req = Request::Put { key: "k".into(), value: "v".into(), ttl_secs: Some(30) };
        let encoded = encode_request(&req);
        assert_eq!(decode_request(encoded).unwrap(), req);
    }

    #[test]
    fn round_trips_put_without_ttl() {
        let req = Request::Put { key: "k".into(), value: "v".into(), ttl_secs: None };
        let encoded = encode_request(&req);
        assert_eq!(decode_request(encoded).unwrap(), req);
    }

    #[test]
    fn decodes_stats_response() {
        let stats = CacheStats { hits: 3, misses: 1, hit_rate: 75.0, current_size: 2, capacity: 10 };
        let encoded = encode_response(&Response::Stats(stats));
        let decoded = decode_response(encoded, &Request::Stats).unwrap();
        assert_eq!(decoded, Response::Stats(stats));
    }

    #[test]
    fn decodes_error_response_regardless_of_request() {
        let encoded = encode_response(&Response::Error("boom".into()));
        let decoded = decode_response(encoded, &Request::Get { key: "k".into() }).unwrap();
        assert_eq!(decoded, Response::Error("boom".into()));
    }
}
