mod demo;
mod inspect;

use std::env;
use std::path::PathBuf;

use shade_config::ShadeConfig;

#[tokio::main]
async fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let cmd = &args[1];

    match cmd.as_str() {
        "demo" => {
            let config = parse_demo_args(&args[2..]);
            if let Err(e) = demo::run(config).await {
                eprintln!("❌ Demo failed: {:#}", e);
                std::process::exit(1);
            }
        }
        "inspect" => {
            let db_path = parse_db_flag(&args[2..]);
            if let Err(e) = inspect::run(db_path) {
                eprintln!("❌ Error inspecting pool: {:#}", e);
                std::process::exit(1);
            }
        }
        "sample-config" => {
            print!("{}", ShadeConfig::generate_sample());
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        _ => {
            println!("❌ Unknown command: {}", cmd);
            println!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!("Shade CLI - Shielded Pool Development Tool");
    println!();
    println!("USAGE:");
    println!("  shade <command> [args]");
    println!();
    println!("COMMANDS:");
    println!("  demo [options]             Walk a pool through mints, a rollover and transfers");
    println!("  inspect [--db <path>]      Print the persisted pool snapshot and ledger sizes");
    println!("  sample-config              Print a sample shade.toml");
    println!("  help                       Show this help message");
    println!();
    println!("DEMO OPTIONS:");
    println!("  --db <path>                Persist to RocksDB at <path> (default: in memory)");
    println!("  --subtree-height <h>       Active subtree height (default: 2)");
    println!("  --finalized-height <h>     Finalized tree height (default: 4)");
    println!();
    println!("EXAMPLES:");
    println!("  shade demo                           # In-memory walkthrough");
    println!("  shade demo --db ./demo-db            # Persisted walkthrough");
    println!("  shade inspect --db ./demo-db         # Look at what was stored");
    println!("  shade sample-config > shade.toml     # Start a config file");
    println!();
    println!("ENVIRONMENT VARIABLES:");
    println!("  SHADE_CONFIG         Path to shade.toml");
    println!("  SHADE_DB_PATH        Database path used by inspect");
    println!("  RUST_LOG             Log level (debug/info/warn/error)");
}

fn parse_demo_args(args: &[String]) -> demo::DemoConfig {
    let mut config = demo::DemoConfig::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--db" => {
                if let Some(path) = args.get(i + 1) {
                    config.db_path = Some(PathBuf::from(path));
                    i += 1;
                }
            }
            "--subtree-height" => {
                if let Some(height) = args.get(i + 1).and_then(|h| h.parse().ok()) {
                    config.subtree_height = height;
                    i += 1;
                }
            }
            "--finalized-height" => {
                if let Some(height) = args.get(i + 1).and_then(|h| h.parse().ok()) {
                    config.finalized_height = height;
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }

    config
}

fn parse_db_flag(args: &[String]) -> Option<PathBuf> {
    args.iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
}
