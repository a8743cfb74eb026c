use anyhow::Result;
use ironrow::testing::*;
use ironrow::*;
use std::thread;
use std::time::{Duration, Instant};

const ALL: [Strategy; 4] = [
    Strategy::Sequential,
    Strategy::StaticRanges,
    Strategy::ByteChunks,
    Strategy::Streaming,
];

fn parser(strategy: Strategy, workers: usize) -> Result<Parser<Title>> {
    let cfg = ParserConfig::default()
        .with_workers(workers)
        .with_strategy(strategy)
        .with_batch_size(16)
        .with_preserve_order(true);
    Ok(Parser::new(cfg)?)
}

#[test]
fn single_record() -> Result<()> {
    let input = b"h1\th2\th3\th4\th5\th6\th7\th8\th9\nA\tB\tC\tD\tE\tF\tG\tH\tI\n";
    let expected = Title {
        tconst: "A".into(),
        title_type: "B".into(),
        primary_title: "C".into(),
        original_title: "D".into(),
        is_adult: "E".into(),
        start_year: "F".into(),
        end_year: "G".into(),
        runtime_minutes: "H".into(),
        genres: "I".into(),
    };
    for strategy in ALL {
        let titles = parser(strategy, 8)?.parse(input)?;
        assert_eq!(titles, vec![expected.clone()], "{strategy:?}");
    }
    Ok(())
}

#[test]
fn trailing_whitespace_is_trimmed_from_last_row() -> Result<()> {
    let input = b"h1\th2\th3\th4\th5\th6\th7\th8\th9\nA\tB\tC\tD\tE\tF\tG\tH\tI  \n \t\n";
    for strategy in ALL {
        let titles = parser(strategy, 8)?.parse(input)?;
        assert_eq!(titles.len(), 1, "{strategy:?}");
        assert_eq!(titles[0].genres, "I", "{strategy:?}");
    }
    let titles = parser(Strategy::Streaming, 2)?.parse_reader(&input[..], &CancelToken::new())?;
    assert_eq!(titles[0].genres, "I");
    Ok(())
}

#[test]
fn short_row_fails_whole_parse() -> Result<()> {
    let builder = TsvBuilder::new().rows(0..40);
    let bad_line = builder.next_line();
    let input = builder
        .raw("a\tb\tc\td\te\tf\tg\th")
        .rows(40..100)
        .build();
    for strategy in ALL {
        assert_violation_at(parser(strategy, 4)?.parse(&input), bad_line, 8);
    }
    Ok(())
}

#[test]
fn header_only_yields_nothing() -> Result<()> {
    for input in [TsvBuilder::new().build(), TsvBuilder::new().trailer("\n\n").build()] {
        for strategy in ALL {
            let titles = parser(strategy, 8)?.parse(&input)?;
            assert!(titles.is_empty(), "{strategy:?}");
        }
    }
    let titles = parser(Strategy::Streaming, 2)?.parse_reader(HEADER.as_bytes(), &CancelToken::new())?;
    assert!(titles.is_empty());
    Ok(())
}

#[test]
fn empty_input_is_malformed() -> Result<()> {
    for strategy in ALL {
        let parser = parser(strategy, 2)?;
        assert!(matches!(parser.parse(b""), Err(ParseError::MalformedInput(_))));
        assert!(matches!(parser.parse(b"\n\n"), Err(ParseError::MalformedInput(_))));
        assert!(matches!(parser.parse(&[0xc3, 0x28, b'\n']), Err(ParseError::MalformedInput(_))));
        assert!(matches!(parser.parse(b"  \t \n"), Err(ParseError::MalformedInput(_))), "{strategy:?}");
        assert!(matches!(parser.parse(b"\t\n \r\n\n"), Err(ParseError::MalformedInput(_))), "{strategy:?}");
    }
    Ok(())
}

#[test]
fn cancel_mid_stream_returns_promptly() -> Result<()> {
    let parser = parser(Strategy::Streaming, 4)?;
    let cancel = CancelToken::new();
    let remote = cancel.clone();
    let started = Instant::now();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        remote.cancel();
    });

    // The source never ends; only the token can stop this parse.
    let mut source = EndlessTitles::new();
    let result = parser.parse_reader(&mut source, &cancel);
    canceller.join().map_err(|_| anyhow::anyhow!("canceller panicked"))?;

    assert!(matches!(result, Err(ParseError::Cancelled)), "got {result:?}");
    assert!(source.rows_read() > 0);
    assert!(started.elapsed() < Duration::from_secs(10));
    Ok(())
}

#[test]
fn cancelled_before_start() -> Result<()> {
    let cancel = CancelToken::new();
    cancel.cancel();
    let input = titles_tsv(500);
    for strategy in ALL {
        let err = parser(strategy, 4)?.parse_with_cancel(&input, &cancel).unwrap_err();
        assert!(err.is_cancelled(), "{strategy:?}: {err}");
    }
    Ok(())
}
