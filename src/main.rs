//! urlsig entrypoint: scans URLs given as arguments, or one per stdin line,
//! and writes one JSON record per URL followed by a summary line.

use std::io::{BufWriter, Write};
use tracing::info;
use urlsig::{
    batch::{read_url_lines, BatchScanner},
    config::EngineConfig,
    logging::StructuredLogger,
    report::BatchSummary,
};

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = EngineConfig::default_path();
    let config = EngineConfig::load(&config_path);

    StructuredLogger::init(config.log.json, &config.log.level);

    let scanner = BatchScanner::from_config(&config)?;
    info!(
        config = %config_path.display(),
        rules_version = scanner.extractor().rules().version(),
        "urlsig starting"
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    let urls = if args.is_empty() {
        read_url_lines(std::io::stdin().lock())?
    } else {
        args
    };
    info!(count = urls.len(), "scanning");

    let records = scanner.scan_batch(&urls);
    let summary = BatchSummary::from_records(&records);

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for record in &records {
        StructuredLogger::emit_json(record, &mut out)?;
    }
    StructuredLogger::emit_json(&summary, &mut out)?;
    out.flush()?;

    info!(
        total = summary.total,
        malicious = summary.malicious,
        errors = summary.errors,
        threat_rate = summary.threat_rate,
        "scan complete"
    );
    Ok(())
}
