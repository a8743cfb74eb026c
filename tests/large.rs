//! Million-line runs. Records keep only their id to hold memory down.

use anyhow::Result;
use ironrow::testing::titles_tsv;
use ironrow::*;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct TitleId(u32);

impl TsvRecord for TitleId {
    const COLUMNS: usize = 9;

    fn from_line(line: &str) -> std::result::Result<Self, usize> {
        let [tconst, ..] = split_columns::<9>(line)?;
        Ok(TitleId(tconst.trim_start_matches("tt").parse().unwrap_or(u32::MAX)))
    }
}

const ROWS: usize = 1_000_000;

fn assert_ids_in_order(ids: &[TitleId]) {
    assert_eq!(ids.len(), ROWS);
    for (i, id) in ids.iter().enumerate() {
        assert_eq!(id.0 as usize, i, "out of order at position {i}");
    }
}

#[test]
fn million_lines_static_eight_workers() -> Result<()> {
    let input = titles_tsv(ROWS);
    let parser: Parser<TitleId> = Parser::new(ParserConfig::default().with_workers(8))?;
    let Parsed { records, stats } = parser.run(&input, &CancelToken::new())?;
    assert_ids_in_order(&records);
    assert_eq!(stats.batches, 8);
    Ok(())
}

#[test]
fn million_lines_streaming_in_order() -> Result<()> {
    let input = titles_tsv(ROWS);
    let cfg = ParserConfig::default()
        .with_workers(8)
        .with_strategy(Strategy::Streaming)
        .with_batch_size(10_000)
        .with_queue_capacity(4)
        .with_preserve_order(true);
    let parser: Parser<TitleId> = Parser::new(cfg)?;
    let Parsed { records, stats } = parser.run(&input, &CancelToken::new())?;
    assert_ids_in_order(&records);
    assert_eq!(stats.batches, 100);
    // storage is recycled rather than allocated per batch
    assert!(stats.line_pool.created < 20, "{:?}", stats.line_pool);
    assert!(stats.line_pool.reused >= 80);
    Ok(())
}
