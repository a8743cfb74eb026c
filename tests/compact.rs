use anyhow::Result;
use ironrow::testing::*;
use ironrow::*;
use std::sync::Arc;

#[test]
fn compact_titles_match_plain_titles() -> Result<()> {
    let input = titles_tsv(5_000);
    for strategy in [Strategy::StaticRanges, Strategy::ByteChunks, Strategy::Streaming] {
        let cfg = ParserConfig::default()
            .with_workers(4)
            .with_strategy(strategy)
            .with_batch_size(500)
            .with_preserve_order(true);
        let compact: Parser<CompactTitle> = Parser::new(cfg)?;
        let titles: Vec<Title> = compact.parse(&input)?.iter().map(Title::from).collect();
        assert_titles_in_order(&titles, 0..5_000);
    }
    Ok(())
}

#[test]
fn repeated_columns_share_one_copy_across_workers() -> Result<()> {
    let input = titles_tsv(2_000);
    let parser: Parser<CompactTitle> = Parser::new(ParserConfig::default().with_workers(8))?;
    let records = parser.parse(&input)?;

    // rows i and i + 4 * 5 agree on title type and genres, and land in different ranges
    let (a, b) = (&records[3], &records[1_983]);
    assert_eq!(a.title_type, b.title_type);
    assert!(Arc::ptr_eq(&a.title_type, &b.title_type));
    assert!(Arc::ptr_eq(&a.genres, &b.genres));

    let distinct_types: std::collections::HashSet<*const u8> =
        records.iter().map(|r| r.title_type.as_ptr()).collect();
    assert_eq!(distinct_types.len(), 4);
    Ok(())
}

#[test]
fn compact_title_violations_report_lines() -> Result<()> {
    let builder = TsvBuilder::new().rows(0..30);
    let bad = builder.next_line();
    let input = builder.raw("tt9\tmovie").rows(30..40).build();
    let parser: Parser<CompactTitle> = Parser::new(ParserConfig::default().with_workers(3))?;
    assert_violation_at(parser.parse(&input), bad, 2);
    Ok(())
}
