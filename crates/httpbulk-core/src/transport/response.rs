//! Response returned by an [`HttpClient`](super::HttpClient).

use std::fmt;
use std::io::{self, Cursor, Read};

use super::Headers;

/// Response body reader.
pub struct Body(Box<dyn Read + Send>);

impl Body {
    pub fn empty() -> Self {
        Self::from_bytes(Vec::new())
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Box::new(Cursor::new(bytes.into())))
    }

    pub fn from_reader(reader: impl Read + Send + 'static) -> Self {
        Self(Box::new(reader))
    }

    /// Read the whole remaining body.
    pub fn read_to_vec(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.0.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Read and discard the remaining body; returns the number of bytes skipped.
    pub fn drain(&mut self) -> io::Result<u64> {
        io::copy(&mut self.0, &mut io::sink())
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Body { .. }")
    }
}

#[derive(Debug)]
pub struct Response {
    status: u32,
    headers: Headers,
    body: Body,
}

impl Response {
    pub fn new(status: u32, headers: Headers, body: Body) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> u32 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    pub fn into_body(self) -> Body {
        self.body
    }
}
