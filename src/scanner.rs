//! Line Scanner: lazily yields the matching lines of one file.
//!
//! Reading stops at the first I/O or decoding failure, which is turned into a
//! single [`FileErrorEvent`]. Matches found before the failure stay valid.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::event::{FileErrorEvent, MatchEvent, SearchEvent};
use crate::handle::CancelToken;

/// Case-insensitive keyword test.
///
/// Uses Unicode default case folding from `str::to_lowercase`, which does not
/// depend on the process locale.
#[derive(Debug, Clone)]
pub(crate) struct KeywordMatcher {
    needle: String,
}

impl KeywordMatcher {
    pub(crate) fn new(keyword: &str) -> Self {
        Self {
            needle: keyword.to_lowercase(),
        }
    }

    pub(crate) fn is_match(&self, line: &str) -> bool {
        line.to_lowercase().contains(&self.needle)
    }
}

/// Splits a reader into UTF-8 lines.
///
/// A line ends at `\n`, `\r\n` or a lone `\r`. The terminator is not part
/// of the line, and a final line without one is still yielded.
struct TextLines<R> {
    reader:  R,
    skip_lf: bool,
    done:    bool,
}

impl<R: BufRead> TextLines<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            skip_lf: false,
            done: false,
        }
    }

    fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut buf = Vec::new();
        loop {
            let available = match self.reader.fill_buf() {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                return Ok(if buf.is_empty() { None } else { Some(buf) });
            }

            // Second half of a `\r\n` split across two reads.
            if self.skip_lf {
                self.skip_lf = false;
                if available[0] == b'\n' {
                    self.reader.consume(1);
                    continue;
                }
            }

            match available.iter().position(|&b| b == b'\n' || b == b'\r') {
                Some(i) => {
                    buf.extend_from_slice(&available[..i]);
                    self.skip_lf = available[i] == b'\r';
                    self.reader.consume(i + 1);
                    return Ok(Some(buf));
                }
                None => {
                    let n = available.len();
                    buf.extend_from_slice(available);
                    self.reader.consume(n);
                }
            }
        }
    }
}

impl<R: BufRead> Iterator for TextLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<io::Result<String>> {
        if self.done {
            return None;
        }
        let line = match self.read_line() {
            Ok(Some(bytes)) => String::from_utf8(bytes)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            Ok(None) => {
                self.done = true;
                return None;
            }
            Err(e) => Err(e),
        };
        if line.is_err() {
            self.done = true;
        }
        Some(line)
    }
}

/// Iterator over the match/error events of one file.
///
/// Created with [`scan_file`] for files on disk or [`LineScanner::new`] for
/// any buffered reader.
pub struct LineScanner<R> {
    path: PathBuf,
    matcher: KeywordMatcher,
    lines: Option<TextLines<R>>,
    open_error: Option<String>,
    line_number: usize,
    cancel: Option<CancelToken>,
}

impl<R: BufRead> LineScanner<R> {
    /// Scan `reader`, reporting events against `path`.
    pub fn new(path: impl Into<PathBuf>, reader: R, keyword: &str) -> Self {
        Self {
            path: path.into(),
            matcher: KeywordMatcher::new(keyword),
            lines: Some(TextLines::new(reader)),
            open_error: None,
            line_number: 0,
            cancel: None,
        }
    }

    /// Stop yielding once `token` is cancelled. Checked before every line.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Number of lines read so far.
    pub fn lines_read(&self) -> usize {
        self.line_number
    }

    fn fail(&mut self, message: String) -> SearchEvent {
        self.lines = None;
        SearchEvent::FileError(FileErrorEvent {
            path: self.path.clone(),
            message,
        })
    }
}

/// Open `path` and scan it for `keyword`.
///
/// Never fails up front: an open error is the first and only event.
pub fn scan_file(path: &Path, keyword: &str) -> LineScanner<BufReader<File>> {
    match File::open(path) {
        Ok(file) => LineScanner::new(path, BufReader::new(file), keyword),
        Err(e) => LineScanner {
            path: path.to_path_buf(),
            matcher: KeywordMatcher::new(keyword),
            lines: None,
            open_error: Some(e.to_string()),
            line_number: 0,
            cancel: None,
        },
    }
}

impl<R: BufRead> Iterator for LineScanner<R> {
    type Item = SearchEvent;

    fn next(&mut self) -> Option<SearchEvent> {
        if let Some(message) = self.open_error.take() {
            return Some(self.fail(message));
        }

        loop {
            if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                self.lines = None;
                return None;
            }

            let line = match self.lines.as_mut()?.next()? {
                Ok(line) => line,
                Err(e) => return Some(self.fail(e.to_string())),
            };
            self.line_number += 1;

            if self.matcher.is_match(&line) {
                return Some(SearchEvent::Match(MatchEvent {
                    path: self.path.clone(),
                    line_number: self.line_number,
                    line_text: line.trim().to_string(),
                }));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor, Read};

    fn scan(text: &str, keyword: &str) -> Vec<SearchEvent> {
        LineScanner::new("mem.txt", Cursor::new(text.to_string()), keyword).collect()
    }

    fn matched(events: &[SearchEvent]) -> Vec<(usize, &str)> {
        events
            .iter()
            .filter_map(SearchEvent::as_match)
            .map(|m| (m.line_number, m.line_text.as_str()))
            .collect()
    }

    /// Yields `ok` bytes, then fails every read.
    struct FailAfter {
        ok: Cursor<Vec<u8>>,
    }

    impl Read for FailAfter {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.ok.read(buf)?;
            if n == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "device went away"));
            }
            Ok(n)
        }
    }

    #[test]
    fn matches_case_insensitively() {
        let events = scan("hello\nHello World\nbye\n", "hello");
        assert_eq!(matched(&events), vec![(1, "hello"), (2, "Hello World")]);
    }

    #[test]
    fn keyword_case_does_not_matter() {
        let events = scan("an error occurred\n", "Error");
        assert_eq!(matched(&events), vec![(1, "an error occurred")]);
    }

    #[test]
    fn trims_and_counts_crlf_lines() {
        let events = scan("  first\r\n\tneedle here  \r\nlast", "NEEDLE");
        assert_eq!(matched(&events), vec![(2, "needle here")]);
    }

    #[test]
    fn lone_carriage_returns_end_lines() {
        let events = scan("one\rtwo hello\rthree", "hello");
        assert_eq!(matched(&events), vec![(2, "two hello")]);
    }

    #[test]
    fn mixed_terminators_count_every_line() {
        let events = scan("a\r\nb\rc\n\r\nhit\n", "HIT");
        assert_eq!(matched(&events), vec![(5, "hit")]);
    }

    #[test]
    fn crlf_split_across_buffer_refills() {
        // A one-byte buffer forces `\r` and `\n` into separate reads.
        let reader = BufReader::with_capacity(1, Cursor::new("x\r\nhit\r\n"));
        let events: Vec<_> = LineScanner::new("tiny.txt", reader, "hit").collect();
        assert_eq!(matched(&events), vec![(2, "hit")]);
    }

    #[test]
    fn non_ascii_case_folding() {
        let events = scan("STRASSE\nÜBER alles\n", "über");
        assert_eq!(matched(&events), vec![(2, "ÜBER alles")]);
    }

    #[test]
    fn read_failure_ends_with_one_error() {
        let reader = BufReader::new(FailAfter {
            ok: Cursor::new(b"key 1\nnope\nkey 3\n".to_vec()),
        });
        let events: Vec<_> = LineScanner::new("flaky.log", reader, "key").collect();

        assert_eq!(matched(&events), vec![(1, "key 1"), (3, "key 3")]);
        let errors: Vec<_> = events.iter().filter_map(SearchEvent::as_file_error).collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "device went away");
        assert!(events.last().unwrap().as_file_error().is_some());
    }

    #[test]
    fn invalid_utf8_is_a_file_error() {
        let bytes = b"needle\n\xff\xfe\nneedle\n".to_vec();
        let events: Vec<_> = LineScanner::new("bad.txt", Cursor::new(bytes), "needle").collect();
        assert_eq!(matched(&events), vec![(1, "needle")]);
        assert_eq!(events.iter().filter(|e| e.as_file_error().is_some()).count(), 1);
    }

    #[test]
    fn missing_file_reports_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.txt");
        let events: Vec<_> = scan_file(&path, "x").collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].path(), &path);
        assert!(events[0].as_file_error().is_some());
    }

    #[test]
    fn cancelled_scanner_stops() {
        let token = CancelToken::new();
        let mut scanner =
            LineScanner::new("big.txt", Cursor::new("hit\nhit\nhit\n"), "hit").with_cancel(token.clone());
        assert!(scanner.next().is_some());
        token.cancel();
        assert!(scanner.next().is_none());
        assert_eq!(scanner.lines_read(), 1);
    }
}
