//! Decoding of RESP2 replies into the shapes set commands return.

use crate::error::{Error, Result};
use redis_protocol::resp2::types::OwnedFrame as Frame;

fn unexpected(what: &str, frame: &Frame) -> Error {
    Error::Protocol(format!("expected {}, got {:?}", what, frame))
}

pub fn integer(frame: Frame, key: &str) -> Result<i64> {
    match frame {
        Frame::Integer(n) => Ok(n),
        Frame::Error(message) => Err(Error::from_reply(&message, key)),
        other => Err(unexpected("integer", &other)),
    }
}

pub fn boolean(frame: Frame, key: &str) -> Result<bool> {
    integer(frame, key).map(|n| n != 0)
}

pub fn members(frame: Frame, key: &str) -> Result<Vec<Vec<u8>>> {
    match frame {
        Frame::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Frame::BulkString(bytes) | Frame::SimpleString(bytes) => Ok(bytes),
                other => Err(unexpected("bulk string member", &other)),
            })
            .collect(),
        Frame::Null => Ok(Vec::new()),
        Frame::Error(message) => Err(Error::from_reply(&message, key)),
        other => Err(unexpected("array", &other)),
    }
}

pub fn optional_bulk(frame: Frame, key: &str) -> Result<Option<Vec<u8>>> {
    match frame {
        Frame::BulkString(bytes) => Ok(Some(bytes)),
        Frame::Null => Ok(None),
        Frame::Error(message) => Err(Error::from_reply(&message, key)),
        other => Err(unexpected("bulk string", &other)),
    }
}

pub fn status(frame: Frame, key: &str) -> Result<String> {
    match frame {
        Frame::SimpleString(bytes) | Frame::BulkString(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Frame::Error(message) => Err(Error::from_reply(&message, key)),
        other => Err(unexpected("status", &other)),
    }
}
