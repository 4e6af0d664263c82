use std::time::{Duration, Instant};

use mailthreads::archive::{ArchiveDir, ArchiveSource};
use mailthreads::mail::{Segmenter, extract_headers};

fn main() -> anyhow::Result<()> {
    let root = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "~/archives".to_string());
    let archives = ArchiveDir::new(shellexpand::tilde(&root).into_owned());

    println!("Scanning: {}", archives.root().display());
    let units = archives.discover();
    println!("Archive units: {}", units.len());

    let mut bytes = 0usize;
    let mut records = 0usize;
    let mut with_id = 0usize;
    let mut segment_time = Duration::ZERO;

    let start = Instant::now();
    for (year, month) in units {
        let Some(text) = archives.load(year, month)? else {
            continue;
        };
        bytes += text.len();

        let unit_start = Instant::now();
        for record in Segmenter::new(&text) {
            records += 1;
            if extract_headers(record.text).message_id.is_some() {
                with_id += 1;
            }
        }
        segment_time += unit_start.elapsed();
    }

    println!(
        "Segmented {} records ({} with Message-ID) in {:?}",
        records, with_id, segment_time
    );
    println!(
        "Rate: {:.0} records/sec, {:.1} MB/sec",
        records as f64 / segment_time.as_secs_f64(),
        bytes as f64 / (1024.0 * 1024.0) / segment_time.as_secs_f64()
    );
    println!("\nTotal (including reads): {:?}", start.elapsed());

    Ok(())
}
