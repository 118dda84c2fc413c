//! Chunked tag scanner.
//!
//! Pulls fixed-size chunks from a [`CharSource`] into a buffer, isolates
//! complete `<tag ...>...</tag>` fragments and parses each one into an
//! [`Element`]. The whole document is never held in memory: the buffer only
//! holds the unconsumed tail of what has been read so far.
//!
//! Fragments that fail to parse are skipped. End of stream ends the
//! sequence. Read and decoding failures are yielded once as an error, after
//! which the scanner is exhausted.

use std::fs::File;
use std::io::BufReader;
use std::iter::FusedIterator;
use std::path::Path;

use memchr::{memchr, memchr3};
use memchr::memmem::Finder;

use crate::config::{
    closing_marker, opening_marker, validate_chunk_size, validate_tag, DEFAULT_CHUNK_SIZE,
};
use crate::error::{HarvesterError, Result};
use crate::source::{CharSource, Utf8Source};
use crate::xml::Element;

/// How the end of an element is located once its opening marker is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// End at the first `</tag>` after the opening marker.
    ///
    /// An element nested inside another element of the same name cuts the
    /// outer one short; the truncated fragment then fails to parse and is
    /// skipped.
    #[default]
    FirstClose,

    /// Count same-name start and end tags and end when the depth returns to
    /// zero. Self-closing `<tag/>` forms do not change the depth. Quoted
    /// attribute values are skipped when looking for the end of a start tag.
    Balanced,
}

/// Scanner settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Characters requested from the source per read.
    pub chunk_size: usize,

    /// End-of-element strategy.
    pub mode: MatchMode,

    /// Report an opening marker without a closing marker at end of stream
    /// as [`HarvesterError::TruncatedElement`] instead of dropping it.
    pub strict: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            mode: MatchMode::default(),
            strict: false,
        }
    }
}

impl ScanOptions {
    /// Set the chunk size.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the match mode.
    #[must_use]
    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enable or disable strict end-of-stream handling.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Counters for one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Elements parsed and yielded.
    pub elements: u64,
    /// Fragments dropped because they were not well-formed.
    pub skipped: u64,
    /// Non-empty reads from the source.
    pub chunks_read: u64,
    /// UTF-8 bytes read from the source.
    pub bytes_read: u64,
}

/// Streaming extractor of complete `tag` elements.
///
/// The scanner owns its source; dropping the scanner closes it. The
/// scanner is its own iterator and cannot be restarted.
///
/// # Examples
/// ```
/// use std::io::Cursor;
/// use cv_harvester::scanner::{ChunkedTagScanner, ScanOptions};
/// use cv_harvester::source::Utf8Source;
/// use cv_harvester::xml::find_by_path;
///
/// let input = r#"<cv id="1"><x>a</x></cv>junk<cv id="2"><x>b</x></cv>"#;
/// let source = Utf8Source::new(Cursor::new(input));
/// let scanner =
///     ChunkedTagScanner::with_options(source, "cv", ScanOptions::default().with_chunk_size(5))
///         .unwrap();
///
/// let texts: Vec<String> = scanner
///     .map(|el| {
///         let el = el.unwrap();
///         find_by_path(el.root(), "x").and_then(|x| x.text()).unwrap_or("").to_string()
///     })
///     .collect();
/// assert_eq!(texts, vec!["a", "b"]);
/// ```
#[derive(Debug)]
pub struct ChunkedTagScanner<S> {
    source: S,
    tag: String,
    open: String,
    close: String,
    open_finder: Finder<'static>,
    close_finder: Finder<'static>,
    options: ScanOptions,
    buf: String,
    /// Byte offset of `buf[0]` in the input.
    offset: u64,
    stats: ScanStats,
    done: bool,
}

impl ChunkedTagScanner<Utf8Source<BufReader<File>>> {
    /// Open a UTF-8 file and scan it with default options.
    pub fn open(path: impl AsRef<Path>, tag: &str) -> Result<Self> {
        Self::open_with_options(path, tag, ScanOptions::default())
    }

    /// Open a UTF-8 file and scan it with the given options.
    pub fn open_with_options(
        path: impl AsRef<Path>,
        tag: &str,
        options: ScanOptions,
    ) -> Result<Self> {
        validate_tag(tag)?;
        validate_chunk_size(options.chunk_size)?;
        let source = Utf8Source::open(path)?;
        Self::with_options(source, tag, options)
    }
}

impl<S: CharSource> ChunkedTagScanner<S> {
    /// Scan `source` for `tag` elements with default options.
    pub fn new(source: S, tag: &str) -> Result<Self> {
        Self::with_options(source, tag, ScanOptions::default())
    }

    /// Scan `source` for `tag` elements.
    pub fn with_options(source: S, tag: &str, options: ScanOptions) -> Result<Self> {
        validate_tag(tag)?;
        validate_chunk_size(options.chunk_size)?;

        let open = opening_marker(tag);
        let close = closing_marker(tag);
        let open_finder = Finder::new(open.as_bytes()).into_owned();
        let close_finder = Finder::new(close.as_bytes()).into_owned();

        Ok(Self {
            source,
            tag: tag.to_string(),
            open,
            close,
            open_finder,
            close_finder,
            options,
            buf: String::new(),
            offset: 0,
            stats: ScanStats::default(),
            done: false,
        })
    }

    /// Target tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Counters so far.
    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    /// Text read from the source but not consumed yet.
    pub fn buffered(&self) -> &str {
        &self.buf
    }

    /// Stop scanning and hand the source back.
    pub fn into_inner(self) -> S {
        self.source
    }

    fn read_chunk(&mut self) -> Result<Option<String>> {
        let chunk = self.source.read_chars(self.options.chunk_size)?;
        if chunk.is_empty() {
            return Ok(None);
        }
        self.stats.chunks_read += 1;
        self.stats.bytes_read += chunk.len() as u64;
        tracing::trace!(
            chunk = self.stats.chunks_read,
            len = chunk.len(),
            buffered = self.buf.len(),
            "Read chunk"
        );
        Ok(Some(chunk))
    }

    /// Drop the first `n` bytes of the buffer.
    fn discard(&mut self, n: usize) {
        if n > 0 {
            self.buf.drain(..n);
            self.offset += n as u64;
        }
    }

    /// Locate the opening marker, reading more input as needed.
    ///
    /// A marker split across the old buffer and a new chunk is reported at
    /// position 0, with everything before it dropped. While nothing is
    /// found only the last `len(marker) - 1` bytes are kept, since any later
    /// match has to start there or in data not read yet.
    fn find_opening(&mut self) -> Result<Option<usize>> {
        loop {
            if let Some(pos) = self.open_finder.find(self.buf.as_bytes()) {
                return Ok(Some(pos));
            }

            let Some(chunk) = self.read_chunk()? else {
                return Ok(None);
            };

            if let Some(split) = straddle_split(&self.buf, &chunk, &self.open) {
                self.discard(self.buf.len() - split);
                self.buf.push_str(&chunk);
                return Ok(Some(0));
            }

            let keep_from = floor_char_boundary(
                &self.buf,
                self.buf.len().saturating_sub(self.open.len() - 1),
            );
            self.discard(keep_from);
            self.buf.push_str(&chunk);
        }
    }

    /// Locate the closing marker at or after `from`, reading more input as needed.
    fn find_closing(&mut self, from: usize) -> Result<Option<usize>> {
        let mut search_from = from;
        loop {
            if let Some(pos) = self.close_finder.find(&self.buf.as_bytes()[search_from..]) {
                return Ok(Some(search_from + pos));
            }
            // Only the tail can start a match that the next chunk completes.
            search_from = self
                .buf
                .len()
                .saturating_sub(self.close.len() - 1)
                .max(from);

            let Some(chunk) = self.read_chunk()? else {
                return Ok(None);
            };
            self.buf.push_str(&chunk);
        }
    }

    /// Locate `byte` at or after `from`, reading more input as needed.
    fn find_byte(&mut self, byte: u8, from: usize) -> Result<Option<usize>> {
        let mut search_from = from;
        loop {
            if let Some(pos) = memchr(byte, &self.buf.as_bytes()[search_from..]) {
                return Ok(Some(search_from + pos));
            }
            search_from = self.buf.len();

            let Some(chunk) = self.read_chunk()? else {
                return Ok(None);
            };
            self.buf.push_str(&chunk);
        }
    }

    /// Locate the `>` closing the start tag that begins at `from`, skipping
    /// quoted attribute values, reading more input as needed.
    fn find_tag_end(&mut self, from: usize) -> Result<Option<usize>> {
        let mut cursor = from;
        let mut quote: Option<u8> = None;
        loop {
            let bytes = &self.buf.as_bytes()[cursor..];
            let hit = match quote {
                Some(q) => memchr(q, bytes),
                None => memchr3(b'>', b'"', b'\'', bytes),
            };

            let Some(i) = hit else {
                cursor = self.buf.len();
                let Some(chunk) = self.read_chunk()? else {
                    return Ok(None);
                };
                self.buf.push_str(&chunk);
                continue;
            };

            let pos = cursor + i;
            cursor = pos + 1;
            match (quote, self.buf.as_bytes()[pos]) {
                (Some(_), _) => quote = None,
                (None, b'>') => return Ok(Some(pos)),
                (None, q) => quote = Some(q),
            }
        }
    }

    /// Read until the buffer holds at least `len` bytes or the source ends.
    fn fill_to(&mut self, len: usize) -> Result<()> {
        while self.buf.len() < len {
            match self.read_chunk()? {
                Some(chunk) => self.buf.push_str(&chunk),
                None => break,
            }
        }
        Ok(())
    }

    /// End (exclusive) of the element starting at buffer position 0, tracking
    /// same-name nesting depth.
    fn find_balanced_end(&mut self) -> Result<Option<usize>> {
        let mut depth = 0usize;
        let mut cursor = 0usize;

        loop {
            let Some(lt) = self.find_byte(b'<', cursor)? else {
                return Ok(None);
            };
            self.fill_to(lt + self.close.len())?;
            let rest = &self.buf.as_bytes()[lt..];

            if rest.starts_with(self.close.as_bytes()) {
                depth = depth.saturating_sub(1);
                let end = lt + self.close.len();
                if depth == 0 {
                    return Ok(Some(end));
                }
                cursor = end;
            } else if is_start_tag(rest, &self.tag) {
                let Some(gt) = self.find_tag_end(lt)? else {
                    return Ok(None);
                };
                if self.buf.as_bytes()[gt - 1] == b'/' {
                    if depth == 0 {
                        return Ok(Some(gt + 1));
                    }
                } else {
                    depth += 1;
                }
                cursor = gt + 1;
            } else {
                cursor = lt + 1;
            }
        }
    }

    /// Opening marker found but no end before end of stream.
    fn dangling(&mut self) -> Result<Option<Element>> {
        tracing::debug!(
            tag = %self.tag,
            offset = self.offset,
            buffered = self.buf.len(),
            "Stream ended inside an element"
        );
        if self.options.strict {
            return Err(HarvesterError::TruncatedElement {
                tag: self.tag.clone(),
                offset: self.offset,
            });
        }
        Ok(None)
    }

    /// One production step: the next well-formed element, or `None` at end of stream.
    fn next_element(&mut self) -> Result<Option<Element>> {
        loop {
            let Some(pos) = self.find_opening()? else {
                return Ok(None);
            };
            self.discard(pos);

            let end = match self.options.mode {
                MatchMode::FirstClose => self
                    .find_closing(0)?
                    .map(|pos| pos + self.close.len()),
                MatchMode::Balanced => self.find_balanced_end()?,
            };
            let Some(end) = end else {
                return self.dangling();
            };

            // Elements own a fragment-sized copy, never the read buffer.
            let fragment = self.buf[..end].to_owned();
            let fragment_offset = self.offset;
            self.discard(end);

            match Element::parse(fragment) {
                Ok(element) => {
                    self.stats.elements += 1;
                    return Ok(Some(element));
                }
                Err(e) => {
                    self.stats.skipped += 1;
                    tracing::debug!(
                        tag = %self.tag,
                        offset = fragment_offset,
                        error = %e,
                        "Skipping malformed fragment"
                    );
                }
            }
        }
    }
}

impl<S: CharSource> Iterator for ChunkedTagScanner<S> {
    type Item = Result<Element>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_element() {
            Ok(Some(element)) => Some(Ok(element)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<S: CharSource> FusedIterator for ChunkedTagScanner<S> {}

/// Number of trailing `buf` bytes that, followed by the head of `chunk`,
/// spell out `marker`. The earliest such split wins.
fn straddle_split(buf: &str, chunk: &str, marker: &str) -> Option<usize> {
    let (b, c, m) = (buf.as_bytes(), chunk.as_bytes(), marker.as_bytes());
    (1..m.len()).rev().find(|&i| {
        i <= b.len()
            && m.len() - i <= c.len()
            && b[b.len() - i..] == m[..i]
            && c[..m.len() - i] == m[i..]
    })
}

/// `<tag` followed by whitespace, `>` or `/`.
fn is_start_tag(rest: &[u8], tag: &str) -> bool {
    rest.first() == Some(&b'<')
        && rest[1..].starts_with(tag.as_bytes())
        && matches!(
            rest.get(tag.len() + 1),
            Some(b' ' | b'\t' | b'\n' | b'\r' | b'>' | b'/')
        )
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::{find_by_path, get_text};
    use pretty_assertions::assert_eq;
    use std::io::{self, Cursor};

    type TestScanner = ChunkedTagScanner<Utf8Source<Cursor<Vec<u8>>>>;

    fn scanner(input: &str, tag: &str, options: ScanOptions) -> TestScanner {
        let source = Utf8Source::new(Cursor::new(input.as_bytes().to_vec()));
        ChunkedTagScanner::with_options(source, tag, options).unwrap()
    }

    fn scan(input: &str, tag: &str, chunk_size: usize) -> Vec<Element> {
        scanner(input, tag, ScanOptions::default().with_chunk_size(chunk_size))
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    fn field(element: &Element, path: &str) -> String {
        find_by_path(element.root(), path)
            .map(get_text)
            .unwrap_or_default()
    }

    fn chunk_sizes(input: &str) -> [usize; 4] {
        [1, 7, 1024, input.chars().count().max(1)]
    }

    #[test]
    fn test_example_with_chunk_size_five() {
        let input = r#"<cv id="1"><x>a</x></cv>junk<cv id="2"><x>b</x></cv>"#;
        let elements = scan(input, "cv", 5);

        assert_eq!(elements.len(), 2);
        assert_eq!(field(&elements[0], "x"), "a");
        assert_eq!(field(&elements[1], "x"), "b");
    }

    #[test]
    fn test_chunk_size_invariance() {
        let mut input = String::from("<?xml version=\"1.0\"?>\n<cvs>\n");
        for i in 0..25 {
            input.push_str(&format!(
                "  <cv id=\"{i}\">\n    <name>Кандидат {i}</name>\n  </cv>\n  <other>noise</other>\n"
            ));
        }
        input.push_str("</cvs>\n");

        for chunk_size in chunk_sizes(&input) {
            let elements = scan(&input, "cv", chunk_size);
            let ids: Vec<String> = elements
                .iter()
                .map(|e| e.root().attribute("id").unwrap_or_default().to_string())
                .collect();
            let expected: Vec<String> = (0..25).map(|i| i.to_string()).collect();
            assert_eq!(ids, expected, "chunk size {chunk_size}");
            assert_eq!(field(&elements[7], "name"), "Кандидат 7");
        }
    }

    #[test]
    fn test_opening_marker_straddling_every_offset() {
        let prefix = "noise";
        let input = format!("{prefix}<cv id=\"1\"><x>a</x></cv>");
        for split in 1.."<cv ".len() {
            let chunk_size = prefix.len() + split;
            let elements = scan(&input, "cv", chunk_size);
            assert_eq!(elements.len(), 1, "split at {split}");
            assert_eq!(field(&elements[0], "x"), "a");
        }
    }

    #[test]
    fn test_straddle_split() {
        assert_eq!(straddle_split("abc<c", "v id", "<cv "), Some(2));
        assert_eq!(straddle_split("abc<", "cv x", "<cv "), Some(1));
        assert_eq!(straddle_split("abc<cv", " x", "<cv "), Some(3));
        assert_eq!(straddle_split("abc", "<cv ", "<cv "), None);
        assert_eq!(straddle_split("", "<cv ", "<cv "), None);
        // Chunk too short to complete the marker.
        assert_eq!(straddle_split("abc<c", "v", "<cv "), None);
    }

    #[test]
    fn test_malformed_fragment_is_skipped() {
        let input = concat!(
            r#"<cv id="1"><x>a < b</x></cv>"#,
            r#"<cv id="2"><x>ok</x></cv>"#,
        );
        for chunk_size in chunk_sizes(input) {
            let mut scanner = scanner(
                input,
                "cv",
                ScanOptions::default().with_chunk_size(chunk_size),
            );
            let elements: Vec<Element> = scanner.by_ref().map(|e| e.unwrap()).collect();

            assert_eq!(elements.len(), 1);
            assert_eq!(elements[0].root().attribute("id"), Some("2"));
            assert_eq!(scanner.stats().skipped, 1);
            assert_eq!(scanner.stats().elements, 1);
        }
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(scan("", "cv", 4).is_empty());
    }

    #[test]
    fn test_no_matching_tag_yields_nothing() {
        let input = "<root><cvx id=\"1\"/><cv>no space</cv><item a=\"b\">x</item></root>";
        for chunk_size in chunk_sizes(input) {
            assert!(scan(input, "cv", chunk_size).is_empty());
        }
    }

    #[test]
    fn test_noise_buffer_stays_bounded() {
        let noise = "x".repeat(10_000);
        let mut scanner = scanner(&noise, "cv", ScanOptions::default().with_chunk_size(100));
        assert!(scanner.next().is_none());
        assert!(scanner.buffered().len() < 100 + "<cv ".len());
    }

    #[test]
    fn test_dangling_fragment_is_dropped() {
        let input = r#"<cv id="1"><x>a</x></cv><cv id="2"><x>b"#;
        for chunk_size in chunk_sizes(input) {
            let elements = scan(input, "cv", chunk_size);
            assert_eq!(elements.len(), 1);
            assert_eq!(field(&elements[0], "x"), "a");
        }
    }

    #[test]
    fn test_strict_mode_reports_dangling_fragment() {
        let input = r#"<cv id="1"><x>a</x></cv><cv id="2"><x>b"#;
        let mut scanner = scanner(
            input,
            "cv",
            ScanOptions::default().with_chunk_size(7).with_strict(true),
        );

        assert!(scanner.next().unwrap().is_ok());
        match scanner.next() {
            Some(Err(HarvesterError::TruncatedElement { tag, offset })) => {
                assert_eq!(tag, "cv");
                assert_eq!(offset, 24);
            }
            other => panic!("expected truncated element, got {other:?}"),
        }
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_first_close_mode_skips_nested_same_name() {
        let input = concat!(
            r#"<cv id="outer"><cv id="inner"><x>i</x></cv><x>o</x></cv>"#,
            r#"<cv id="next"><x>n</x></cv>"#,
        );
        let elements = scan(input, "cv", 8);
        let ids: Vec<&str> = elements
            .iter()
            .filter_map(|e| e.root().attribute("id"))
            .collect();
        assert_eq!(ids, vec!["next"]);
    }

    #[test]
    fn test_balanced_mode_keeps_nested_same_name() {
        let input = concat!(
            r#"<cv id="outer"><cv id="inner"><x>i</x></cv><cv id="empty"/><x>o</x></cv>"#,
            "junk",
            r#"<cv id="next"><x>n</x></cv>"#,
        );
        for chunk_size in chunk_sizes(input) {
            let elements: Vec<Element> = scanner(
                input,
                "cv",
                ScanOptions::default()
                    .with_chunk_size(chunk_size)
                    .with_mode(MatchMode::Balanced),
            )
            .map(|e| e.unwrap())
            .collect();

            assert_eq!(elements.len(), 2, "chunk size {chunk_size}");
            let outer = elements[0].root();
            assert_eq!(outer.attribute("id"), Some("outer"));
            assert_eq!(outer.children().len(), 3);
            assert_eq!(field(&elements[0], "x"), "o");
            assert_eq!(field(&elements[0], "cv/x"), "i");
            assert_eq!(elements[1].root().attribute("id"), Some("next"));
        }
    }

    #[test]
    fn test_balanced_mode_self_closing_top_level() {
        let input = r#"<cv id="1"/><cv id="2"><x>b</x></cv>"#;
        let elements: Vec<Element> = scanner(
            input,
            "cv",
            ScanOptions::default()
                .with_chunk_size(3)
                .with_mode(MatchMode::Balanced),
        )
        .map(|e| e.unwrap())
        .collect();

        let ids: Vec<&str> = elements
            .iter()
            .filter_map(|e| e.root().attribute("id"))
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_balanced_mode_skips_quoted_attribute_values() {
        let input = concat!(
            r#"<cv id="a" note="x/>y"><x>1</x></cv>"#,
            r#"<cv id="b" rule='p>q'><cv id="c" path="/"/><x>2</x></cv>"#,
        );
        for chunk_size in chunk_sizes(input) {
            let elements: Vec<Element> = scanner(
                input,
                "cv",
                ScanOptions::default()
                    .with_chunk_size(chunk_size)
                    .with_mode(MatchMode::Balanced),
            )
            .map(|e| e.unwrap())
            .collect();

            let ids: Vec<&str> = elements
                .iter()
                .filter_map(|e| e.root().attribute("id"))
                .collect();
            assert_eq!(ids, vec!["a", "b"], "chunk size {chunk_size}");
            assert_eq!(elements[0].root().attribute("note"), Some("x/>y"));
            assert_eq!(elements[1].root().children().len(), 2);
        }
    }

    #[test]
    fn test_multibyte_text_across_chunks() {
        let input = r#"<cv id="1"><jobTitle>Ведущий инженер-конструктор</jobTitle></cv>"#;
        for chunk_size in chunk_sizes(input) {
            let elements = scan(input, "cv", chunk_size);
            assert_eq!(field(&elements[0], "jobTitle"), "Ведущий инженер-конструктор");
        }
    }

    #[test]
    fn test_buffer_advances_past_fragment() {
        let input = r#"<cv id="1"><x>a</x></cv>tail"#;
        let mut scanner = scanner(input, "cv", ScanOptions::default());
        let element = scanner.next().unwrap().unwrap();

        assert_eq!(element.source(), r#"<cv id="1"><x>a</x></cv>"#);
        assert_eq!(scanner.buffered(), "tail");
    }

    #[test]
    fn test_elements_do_not_retain_read_buffer() {
        let mut input = String::from("<cvs>");
        for i in 0..200 {
            input.push_str(&format!("<cv id=\"{i}\"><x>{i}</x></cv>"));
        }
        input.push_str("</cvs>");

        let elements: Vec<Element> = scanner(&input, "cv", ScanOptions::default())
            .map(|e| e.unwrap())
            .collect();
        assert_eq!(elements.len(), 200);

        let fragment_bytes: usize = elements.iter().map(|e| e.source().len()).sum();
        let retained: usize = elements
            .into_iter()
            .map(|e| e.into_source().capacity())
            .sum();
        assert!(
            retained < 2 * fragment_bytes,
            "retained {retained} bytes for {fragment_bytes} bytes of elements"
        );
    }

    #[test]
    fn test_reparsing_fragment_gives_same_tree() {
        let input = r#"<cv id="1"><x>a</x><y k="v">b</y></cv><cv id="2"><x>c</x></cv>"#;
        let elements = scan(input, "cv", 7);
        let first = elements[0].clone();
        let reparsed = Element::parse(first.source()).unwrap();

        assert_eq!(reparsed, elements[0]);
        assert_eq!(first, elements[0]);
    }

    #[test]
    fn test_invalid_tag_and_chunk_size() {
        let source = Utf8Source::new(Cursor::new(Vec::new()));
        assert!(matches!(
            ChunkedTagScanner::new(source, "c v"),
            Err(HarvesterError::InvalidTag(_))
        ));

        let source = Utf8Source::new(Cursor::new(Vec::new()));
        assert!(matches!(
            ChunkedTagScanner::with_options(
                source,
                "cv",
                ScanOptions::default().with_chunk_size(0)
            ),
            Err(HarvesterError::InvalidChunkSize(0))
        ));
    }

    /// Yields its chunks, then fails.
    struct FailingSource {
        chunks: Vec<String>,
    }

    impl CharSource for FailingSource {
        fn read_chars(&mut self, _max_chars: usize) -> io::Result<String> {
            if self.chunks.is_empty() {
                Err(io::Error::new(io::ErrorKind::InvalidData, "bad byte"))
            } else {
                Ok(self.chunks.remove(0))
            }
        }
    }

    #[test]
    fn test_read_failure_ends_the_sequence() {
        let source = FailingSource {
            chunks: vec![r#"<cv id="1"><x>a</x></cv><cv id="2">"#.to_string()],
        };
        let mut scanner = ChunkedTagScanner::new(source, "cv").unwrap();

        assert!(scanner.next().unwrap().is_ok());
        assert!(matches!(scanner.next(), Some(Err(HarvesterError::Io(_)))));
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cvs.xml");
        std::fs::write(&path, r#"<cvs><cv id="1"><x>a</x></cv></cvs>"#).unwrap();

        let elements: Vec<Element> = ChunkedTagScanner::open(&path, "cv")
            .unwrap()
            .map(|e| e.unwrap())
            .collect();
        assert_eq!(elements.len(), 1);

        assert!(matches!(
            ChunkedTagScanner::open(dir.path().join("missing.xml"), "cv"),
            Err(HarvesterError::Io(_))
        ));
    }
}
