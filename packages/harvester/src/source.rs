//! Character sources the scanner pulls chunks from.
//!
//! The scanner only needs one operation from its input: "give me up to N
//! characters, or an empty string at end of stream". [`Utf8Source`] provides
//! that over any [`BufRead`], counting characters rather than bytes and never
//! splitting a multi-byte code point across two reads.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Sequential character stream.
pub trait CharSource {
    /// Read up to `max_chars` characters.
    ///
    /// Returns an empty string at end of stream. Decoding failures surface as
    /// `io::ErrorKind::InvalidData`.
    fn read_chars(&mut self, max_chars: usize) -> io::Result<String>;
}

impl<S: CharSource + ?Sized> CharSource for &mut S {
    fn read_chars(&mut self, max_chars: usize) -> io::Result<String> {
        (**self).read_chars(max_chars)
    }
}

impl<S: CharSource + ?Sized> CharSource for Box<S> {
    fn read_chars(&mut self, max_chars: usize) -> io::Result<String> {
        (**self).read_chars(max_chars)
    }
}

/// UTF-8 decoding adapter over a buffered byte reader.
#[derive(Debug)]
pub struct Utf8Source<R> {
    inner: R,
}

impl Utf8Source<BufReader<File>> {
    /// Open a file for UTF-8 character reads.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> Utf8Source<R> {
    /// Wrap a buffered reader.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Give back the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Bytes of the form `10xxxxxx` continue a multi-byte sequence.
fn is_continuation(byte: u8) -> bool {
    byte & 0b1100_0000 == 0b1000_0000
}

impl<R: BufRead> CharSource for Utf8Source<R> {
    fn read_chars(&mut self, max_chars: usize) -> io::Result<String> {
        let mut bytes = Vec::new();
        let mut chars = 0usize;

        loop {
            let (consumed, limit_reached) = {
                let available = match self.inner.fill_buf() {
                    Ok(buf) => buf,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                };
                if available.is_empty() {
                    break;
                }

                let mut consumed = 0;
                let mut limit_reached = false;
                for &byte in available {
                    if !is_continuation(byte) {
                        if chars == max_chars {
                            limit_reached = true;
                            break;
                        }
                        chars += 1;
                    }
                    consumed += 1;
                }
                bytes.extend_from_slice(&available[..consumed]);
                (consumed, limit_reached)
            };
            self.inner.consume(consumed);

            if limit_reached {
                break;
            }
        }

        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}
