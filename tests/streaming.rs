use anyhow::Result;
use ironrow::testing::*;
use ironrow::*;
use std::fs::File;
use std::io::{self, BufReader, Write};

fn streaming(workers: usize, batch_size: usize, queue_capacity: usize) -> Result<Parser<Title>> {
    let cfg = ParserConfig::default()
        .with_strategy(Strategy::Streaming)
        .with_workers(workers)
        .with_batch_size(batch_size)
        .with_queue_capacity(queue_capacity);
    Ok(Parser::new(cfg)?)
}

#[test]
fn reads_from_file() -> Result<()> {
    let mut tmp = tempfile::NamedTempFile::new()?;
    tmp.write_all(&titles_tsv(1_234))?;
    tmp.flush()?;

    let parser = streaming(4, 100, 4)?;
    let reader = BufReader::new(File::open(tmp.path())?);
    let titles = parser.parse_reader(reader, &CancelToken::new())?;

    let expected = parse_sequential::<Title>(&std::fs::read(tmp.path())?)?;
    assert_same_records(&titles, &expected);
    Ok(())
}

#[test]
fn batch_count_follows_batch_size() -> Result<()> {
    let input = titles_tsv(1_005);
    let parser = streaming(3, 100, 2)?;
    let Parsed { records, stats } = parser.run_reader(input.as_slice(), &CancelToken::new())?;
    assert_eq!(records.len(), 1_005);
    // ten full batches and a short tail of five
    assert_eq!(stats.batches, 11);
    assert_eq!(stats.strategy, Strategy::Streaming);
    Ok(())
}

#[test]
fn pools_stay_bounded_and_are_reused() -> Result<()> {
    let (workers, queue_capacity) = (4, 2);
    let input = titles_tsv(20_000);
    let parser = streaming(workers, 100, queue_capacity)?;
    let Parsed { records, stats } = parser.run_reader(input.as_slice(), &CancelToken::new())?;
    assert_eq!(records.len(), 20_000);
    assert_eq!(stats.batches, 200);

    let lines = stats.line_pool;
    // one batch filling, a full queue, one per worker
    assert!(lines.created as usize <= queue_capacity + workers + 2, "{lines:?}");
    assert!(lines.reused > 0);
    assert_eq!(lines.outstanding, 0);

    let out = stats.record_pool;
    // one per worker plus every output queue full, plus one at the collector
    assert!(out.peak_outstanding <= workers * (queue_capacity + 1) + 1, "{out:?}");
    assert!(out.reused > 0);
    assert_eq!(out.outstanding, 0);
    Ok(())
}

#[test]
fn violation_line_numbers_span_batches() -> Result<()> {
    let builder = TsvBuilder::new().rows(0..250);
    let bad = builder.next_line();
    let input = builder.raw("x\ty").rows(250..300).build();
    let parser = streaming(2, 64, 2)?;
    assert_violation_at(parser.parse_reader(input.as_slice(), &CancelToken::new()), bad, 2);
    Ok(())
}

#[test]
fn read_failure_surfaces_as_io() -> Result<()> {
    let parser = streaming(2, 10, 2)?;
    let reader = FailingReader::new(titles_tsv(50), io::ErrorKind::BrokenPipe);
    let err = parser.parse_reader(reader, &CancelToken::new()).unwrap_err();
    assert!(matches!(err, ParseError::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe), "{err}");
    Ok(())
}

#[test]
fn invalid_utf8_mid_stream_is_malformed() -> Result<()> {
    let mut input = titles_tsv(10);
    input.extend_from_slice(b"tt\xff\tmovie\n");
    let parser = streaming(2, 4, 2)?;
    let err = parser.parse_reader(input.as_slice(), &CancelToken::new()).unwrap_err();
    assert!(matches!(err, ParseError::MalformedInput(ref m) if m.contains("line 12")), "{err}");
    Ok(())
}

#[test]
fn cancelled_endless_source_with_ordering() -> Result<()> {
    let parser: Parser<Title> = Parser::new(
        ParserConfig::default()
            .with_strategy(Strategy::Streaming)
            .with_workers(3)
            .with_batch_size(50)
            .with_queue_capacity(1)
            .with_preserve_order(true),
    )?;
    let cancel = CancelToken::new();
    let remote = cancel.clone();
    let result = std::thread::scope(|s| {
        s.spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(30));
            remote.cancel();
        });
        parser.parse_reader(EndlessTitles::new(), &cancel)
    });
    assert!(matches!(result, Err(ParseError::Cancelled)));
    Ok(())
}
