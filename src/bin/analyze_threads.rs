use std::path::PathBuf;

use clap::Parser;

/// Summarise the thread graph written by `mailthreads`.
#[derive(Parser, Debug)]
#[command(name = "analyze_threads")]
struct Args {
    /// Directory containing global_thread_graph.json and global_thread_stats.json
    #[arg(default_value = ".")]
    dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let (stats, graph) = mailthreads::output::load_global(&args.dir)?;

    println!("Threads: {}", graph.len());
    println!("Replies: {}", stats.values().sum::<u64>());

    let mut thread_sizes: Vec<(usize, &str)> = graph
        .iter()
        .map(|(key, senders)| (senders.len(), key.as_str()))
        .collect();
    thread_sizes.sort_by(|a, b| b.0.cmp(&a.0));

    println!("\nThread size distribution (senders per thread):");
    println!(
        "  Single sender: {}",
        thread_sizes.iter().filter(|(s, _)| *s == 1).count()
    );
    println!(
        "  2-5 senders: {}",
        thread_sizes
            .iter()
            .filter(|(s, _)| *s >= 2 && *s <= 5)
            .count()
    );
    println!(
        "  6-10 senders: {}",
        thread_sizes
            .iter()
            .filter(|(s, _)| *s >= 6 && *s <= 10)
            .count()
    );
    println!(
        "  10+ senders: {}",
        thread_sizes.iter().filter(|(s, _)| *s > 10).count()
    );

    let mut busiest: Vec<(&String, &u64)> = stats.iter().collect();
    busiest.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    println!("\nTop 20 threads by replies:");
    for (i, (key, replies)) in busiest.iter().take(20).enumerate() {
        let starter = graph
            .get(*key)
            .and_then(|senders| senders.first())
            .map(String::as_str)
            .unwrap_or("(unknown)");
        let truncated: String = key.chars().take(60).collect();
        println!("  {:2}. {:4} replies - {} ({})", i + 1, replies, truncated, starter);
    }

    println!("\n--- Checking for issues ---");

    let orphans = stats.keys().filter(|k| !graph.contains_key(*k)).count();
    println!("Reply keys without a graph entry: {}", orphans);

    let empty = graph.values().filter(|s| s.is_empty()).count();
    println!("Empty thread entries: {}", empty);

    Ok(())
}
