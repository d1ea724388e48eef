//! CLI tool to run a saved table snapshot through the full card pipeline.
//! Usage: cargo run --bin analyze_frame --features cli -- <frame.png> [data_dir]

use bj_vision::{process_frame, SheetMatcher, VisionConfig};
use std::path::PathBuf;

fn main() {
    // Initialize tracing for debug output
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <frame.png> [data_dir]", args[0]);
        std::process::exit(1);
    }

    let input_path = PathBuf::from(&args[1]);
    let data_dir = if args.len() >= 3 {
        PathBuf::from(&args[2])
    } else {
        PathBuf::from("./data")
    };

    println!("Loading frame: {}", input_path.display());
    let frame = image::open(&input_path)
        .expect("Failed to open frame")
        .to_rgba8();
    println!("Frame size: {}x{}", frame.width(), frame.height());

    let matcher = SheetMatcher::load(&data_dir).expect("Failed to load template sheets");
    let config = VisionConfig::default();

    let result = process_frame(&frame, &matcher, &config);
    println!(
        "\n{} candidate quad(s), {} identified card(s)",
        result.candidates,
        result.cards.len()
    );
    for card in &result.cards {
        println!(
            "  rank {:>2} {} (suit {}, score {:.3}) near ({}, {})",
            card.rank, card.suit_name, card.suit, card.score, card.corners[0].x, card.corners[0].y
        );
    }
}
