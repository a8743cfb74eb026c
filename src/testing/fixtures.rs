//! Title datasets for tests and benchmarks.

use crate::record::Title;

/// Header line of a title-basics file.
pub const HEADER: &str =
    "tconst\ttitleType\tprimaryTitle\toriginalTitle\tisAdult\tstartYear\tendYear\truntimeMinutes\tgenres";

const TYPES: [&str; 4] = ["movie", "short", "tvSeries", "tvEpisode"];
const GENRES: [&str; 5] = ["Drama", "Comedy", "Documentary,Short", "Action,Thriller", "\\N"];

/// The `i`th synthetic data row, without a terminator.
///
/// `tconst` encodes `i`, so output order can be checked by id.
#[must_use]
pub fn title_row(i: usize) -> String {
    let kind = TYPES[i % TYPES.len()];
    let genres = GENRES[i % GENRES.len()];
    let end_year = if kind == "tvSeries" { (1950 + i % 70).to_string() } else { "\\N".into() };
    format!(
        "tt{i:07}\t{kind}\tTitle {i}\tOriginal {i}\t{adult}\t{start}\t{end_year}\t{runtime}\t{genres}",
        adult = u8::from(i % 97 == 0),
        start = 1894 + i % 130,
        runtime = 1 + i % 240,
    )
}

/// The record [`title_row`] parses into.
#[must_use]
pub fn expected_title(i: usize) -> Title {
    let row = title_row(i);
    let mut cols = row.split('\t').map(str::to_owned);
    let mut next = || cols.next().unwrap_or_default();
    Title {
        tconst: next(),
        title_type: next(),
        primary_title: next(),
        original_title: next(),
        is_adult: next(),
        start_year: next(),
        end_year: next(),
        runtime_minutes: next(),
        genres: next(),
    }
}

/// Complete input: header plus `rows` synthetic rows, newline terminated.
#[must_use]
pub fn titles_tsv(rows: usize) -> Vec<u8> {
    TsvBuilder::new().rows(0..rows).build()
}

/// Fluent builder for hand-shaped inputs.
///
/// ```
/// use ironrow::testing::TsvBuilder;
///
/// let input = TsvBuilder::new()
///     .rows(0..3)
///     .raw("only\tthree\tcolumns")
///     .rows(3..5)
///     .build();
/// assert_eq!(input.iter().filter(|&&b| b == b'\n').count(), 7);
/// ```
#[derive(Debug, Clone)]
pub struct TsvBuilder {
    lines: Vec<String>,
    terminator: &'static str,
    trailer: String,
}

impl Default for TsvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TsvBuilder {
    /// Start with the standard header.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: vec![HEADER.to_owned()],
            terminator: "\n",
            trailer: String::new(),
        }
    }

    /// Start without any header line.
    #[must_use]
    pub fn headless() -> Self {
        Self {
            lines: Vec::new(),
            ..Self::new()
        }
    }

    #[must_use]
    pub fn rows(mut self, ids: std::ops::Range<usize>) -> Self {
        self.lines.extend(ids.map(title_row));
        self
    }

    /// Append a line verbatim.
    #[must_use]
    pub fn raw(mut self, line: &str) -> Self {
        self.lines.push(line.to_owned());
        self
    }

    /// Terminate lines with `\r\n` instead of `\n`.
    #[must_use]
    pub fn crlf(mut self) -> Self {
        self.terminator = "\r\n";
        self
    }

    /// Extra bytes after the last terminator, e.g. trailing blank lines.
    #[must_use]
    pub fn trailer(mut self, trailer: &str) -> Self {
        self.trailer = trailer.to_owned();
        self
    }

    /// Input line number the next appended line will get (header is line 1).
    #[must_use]
    pub fn next_line(&self) -> usize {
        self.lines.len() + 1
    }

    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push_str(self.terminator);
        }
        out.push_str(&self.trailer);
        out.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TsvRecord;

    #[test]
    fn rows_match_expected_records() {
        for i in [0, 1, 96, 97, 1234] {
            assert_eq!(Title::from_line(&title_row(i)), Ok(expected_title(i)));
        }
    }

    #[test]
    fn builder_tracks_line_numbers() {
        let b = TsvBuilder::new().rows(0..4);
        assert_eq!(b.next_line(), 6);
        assert_eq!(TsvBuilder::headless().next_line(), 1);
    }
}
