use clap::Parser;
use probe_map::Map;
use probe_map::hash_op::DefaultHashOp;

#[derive(Parser, Debug)]
struct Args {
    /// Number of entries to insert.
    #[arg(short = 'n', long = "entries", default_value_t = 1000)]
    entries: u64,

    /// Fraction of the entries to remove again before reporting.
    #[arg(short = 'r', long = "remove_fraction", default_value_t = 0.25)]
    remove_fraction: f64,

    /// Compact the table after the removals.
    #[arg(short = 'c', long = "compact")]
    compact: bool,
}

fn main() {
    let args = Args::parse();

    let mut map: Map<u64, u64, DefaultHashOp> = Map::new();
    println!("Inserting {} entries...", args.entries);
    for key in 0..args.entries {
        map.insert(key, key * 2);
    }
    println!(
        "Capacity after inserts: {} ({:.2}% load factor)",
        map.capacity(),
        map.len() as f64 / map.capacity() as f64 * 100.0
    );

    let removals = (args.entries as f64 * args.remove_fraction.clamp(0.0, 1.0)) as u64;
    for key in 0..removals {
        map.remove(&key);
    }
    println!(
        "Removed {} entries, {} tombstones left",
        removals,
        map.tombstones()
    );

    if args.compact {
        map.compact();
        println!("Compacted, {} tombstones left", map.tombstones());
    }

    map.probe_histogram().print();
    map.stats().print();
}
