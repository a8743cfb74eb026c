//! Record model: the [`TsvRecord`] trait and the nine-column [`Title`] record.
//!
//! A record is built from exactly one line. The line is split on the tab
//! delimiter and the columns are assigned positionally; a line with any other
//! column count is rejected rather than truncated or padded.

use crate::intern;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Column delimiter for every record kind.
pub const DELIMITER: char = '\t';

/// A fixed-arity record constructible from one tab-separated line.
pub trait TsvRecord: Default + Send + 'static {
    /// Exact number of columns a line must split into.
    const COLUMNS: usize;

    /// Build a record from `line` (without its terminator).
    ///
    /// # Errors
    /// Returns the number of columns actually found when it differs from
    /// [`Self::COLUMNS`].
    fn from_line(line: &str) -> Result<Self, usize>;
}

/// Split `line` into exactly `N` tab-separated columns.
///
/// Stops scanning as soon as an `N + 1`th column shows up, so overlong lines
/// cost no more than well-formed ones, but still counts the rest for the error.
///
/// # Errors
/// Returns the column count found when it is not `N`.
pub fn split_columns<const N: usize>(line: &str) -> Result<[&str; N], usize> {
    let mut out = [""; N];
    let mut parts = line.split(DELIMITER);
    for (i, slot) in out.iter_mut().enumerate() {
        match parts.next() {
            Some(col) => *slot = col,
            None => return Err(i),
        }
    }
    let extra = parts.count();
    if extra > 0 {
        return Err(N + extra);
    }
    Ok(out)
}

/// One row of a title-basics dataset.
///
/// All fields are kept as the raw column text; `\N` markers and numeric
/// columns are not interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Title {
    pub tconst: String,
    pub title_type: String,
    pub primary_title: String,
    pub original_title: String,
    pub is_adult: String,
    pub start_year: String,
    pub end_year: String,
    pub runtime_minutes: String,
    pub genres: String,
}

impl TsvRecord for Title {
    const COLUMNS: usize = 9;

    fn from_line(line: &str) -> Result<Self, usize> {
        let [
            tconst,
            title_type,
            primary_title,
            original_title,
            is_adult,
            start_year,
            end_year,
            runtime_minutes,
            genres,
        ] = split_columns::<9>(line)?;
        Ok(Title {
            tconst: tconst.to_owned(),
            title_type: title_type.to_owned(),
            primary_title: primary_title.to_owned(),
            original_title: original_title.to_owned(),
            is_adult: is_adult.to_owned(),
            start_year: start_year.to_owned(),
            end_year: end_year.to_owned(),
            runtime_minutes: runtime_minutes.to_owned(),
            genres: genres.to_owned(),
        })
    }
}

/// A [`Title`] that shares storage for its repetitive columns.
///
/// Identifiers and titles are unique per row and kept as boxed strings; the
/// other columns go through the [shared interner](crate::intern::shared), so a
/// million rows of `movie` or `\N` cost one allocation each.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CompactTitle {
    pub tconst: Box<str>,
    pub title_type: Arc<str>,
    pub primary_title: Box<str>,
    pub original_title: Box<str>,
    pub is_adult: Arc<str>,
    pub start_year: Arc<str>,
    pub end_year: Arc<str>,
    pub runtime_minutes: Arc<str>,
    pub genres: Arc<str>,
}

impl TsvRecord for CompactTitle {
    const COLUMNS: usize = 9;

    fn from_line(line: &str) -> Result<Self, usize> {
        let [
            tconst,
            title_type,
            primary_title,
            original_title,
            is_adult,
            start_year,
            end_year,
            runtime_minutes,
            genres,
        ] = split_columns::<9>(line)?;
        let pool = intern::shared();
        Ok(CompactTitle {
            tconst: tconst.into(),
            title_type: pool.intern(title_type),
            primary_title: primary_title.into(),
            original_title: original_title.into(),
            is_adult: pool.intern(is_adult),
            start_year: pool.intern(start_year),
            end_year: pool.intern(end_year),
            runtime_minutes: pool.intern(runtime_minutes),
            genres: pool.intern(genres),
        })
    }
}

impl From<&CompactTitle> for Title {
    fn from(c: &CompactTitle) -> Self {
        Title {
            tconst: c.tconst.to_string(),
            title_type: c.title_type.to_string(),
            primary_title: c.primary_title.to_string(),
            original_title: c.original_title.to_string(),
            is_adult: c.is_adult.to_string(),
            start_year: c.start_year.to_string(),
            end_year: c.end_year.to_string(),
            runtime_minutes: c.runtime_minutes.to_string(),
            genres: c.genres.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_exact() {
        assert_eq!(split_columns::<3>("a\tb\tc"), Ok(["a", "b", "c"]));
    }

    #[test]
    fn split_short_and_long() {
        assert_eq!(split_columns::<3>("a\tb"), Err(2));
        assert_eq!(split_columns::<3>("a\tb\tc\td\te"), Err(5));
        // an empty line is still one (empty) column
        assert_eq!(split_columns::<3>(""), Err(1));
    }

    #[test]
    fn empty_columns_are_kept() {
        assert_eq!(split_columns::<3>("\t\t"), Ok(["", "", ""]));
    }

    #[test]
    fn title_from_line() {
        let t = Title::from_line("tt0000001\tshort\tCarmencita\tCarmencita\t0\t1894\t\\N\t1\tDocumentary,Short")
            .unwrap();
        assert_eq!(t.tconst, "tt0000001");
        assert_eq!(t.end_year, "\\N");
        assert_eq!(t.genres, "Documentary,Short");
        assert_eq!(Title::from_line("a\tb\tc\td\te\tf\tg\th"), Err(8));
    }

    #[test]
    fn compact_title_shares_repeated_columns() {
        let a = CompactTitle::from_line("tt1\tmovie\tA\tA\t0\t1999\t\\N\t90\tDrama").unwrap();
        let b = CompactTitle::from_line("tt2\tmovie\tB\tB\t0\t2004\t\\N\t90\tDrama").unwrap();
        assert!(Arc::ptr_eq(&a.title_type, &b.title_type));
        assert!(Arc::ptr_eq(&a.end_year, &b.end_year));
        assert!(Arc::ptr_eq(&a.genres, &b.genres));
        assert!(!Arc::ptr_eq(&a.start_year, &b.start_year));
        assert_eq!(Title::from(&a).primary_title, "A");
        assert_eq!(CompactTitle::from_line("tt3\tmovie"), Err(2));
    }
}
