use anyhow::Result;
use ironrow::*;
use std::io::Write;

#[test]
fn defaults() {
    let cfg = ParserConfig::default();
    assert_eq!(cfg.workers, 8);
    assert_eq!(cfg.batch_size, 100_000);
    assert_eq!(cfg.queue_capacity, 100);
    assert_eq!(cfg.strategy, Strategy::StaticRanges);
    assert!(!cfg.preserve_order);
    assert_eq!(cfg.effective_pool_capacity(), 116);
    assert!(ParserConfig::for_host().workers >= 1);
}

#[test]
fn loads_json_with_defaults_for_missing_fields() -> Result<()> {
    let mut tmp = tempfile::NamedTempFile::new()?;
    write!(tmp, r#"{{"workers": 3, "strategy": "streaming", "preserve_order": true}}"#)?;
    tmp.flush()?;

    let cfg = ParserConfig::from_json_file(tmp.path())?;
    assert_eq!(cfg.workers, 3);
    assert_eq!(cfg.strategy, Strategy::Streaming);
    assert!(cfg.preserve_order);
    assert_eq!(cfg.batch_size, 100_000);

    let parser: Parser<Title> = Parser::new(cfg.clone())?;
    assert_eq!(parser.config(), &cfg);
    Ok(())
}

#[test]
fn json_round_trip() -> Result<()> {
    let cfg = ParserConfig::default()
        .with_workers(5)
        .with_pool_capacity(9)
        .with_strategy(Strategy::ByteChunks);
    let text = serde_json::to_string(&cfg)?;
    let back: ParserConfig = serde_json::from_str(&text)?;
    assert_eq!(back, cfg);
    Ok(())
}

#[test]
fn rejects_zero_sizes() {
    for cfg in [
        ParserConfig::default().with_workers(0),
        ParserConfig::default().with_batch_size(0),
        ParserConfig::default().with_queue_capacity(0),
        ParserConfig::default().with_pool_capacity(0),
    ] {
        let err = Parser::<Title>::new(cfg).unwrap_err();
        assert!(matches!(err, ParseError::InvalidConfig(_)), "{err}");
    }
}

#[test]
fn bad_config_files_explain_themselves() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("missing.json");
    let err = ParserConfig::from_json_file(&missing).unwrap_err();
    assert!(err.to_string().contains("missing.json"));

    let zero = dir.path().join("zero.json");
    std::fs::write(&zero, r#"{"workers": 0}"#)?;
    let err = ParserConfig::from_json_file(&zero).unwrap_err();
    assert!(format!("{err:#}").contains("workers must be at least 1"));
    Ok(())
}
