//! Performance benchmarks for the per-tick race updates

use shared::{CircuitRace, DragRace, KeySet, Race};
use std::time::Instant;

/// Benchmarks circuit ticks including lap accumulation
#[test]
fn benchmark_circuit_update() {
    let mut race = CircuitRace::with_laps(1_000_000).unwrap();
    race.start(0.0);
    let keys = KeySet::from_keys(["move-forward", "turn-left"]);

    let iterations = 20_000;
    let start = Instant::now();

    for i in 0..iterations {
        race.update(1.0 / 60.0, i as f64 * 16.0, &keys).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Circuit update: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 1 second
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks drag ticks for both racers
#[test]
fn benchmark_drag_update() {
    let keys = KeySet::from_keys(["KeyW", "ArrowDown"]);

    let races = 200;
    let ticks_per_race = 100;
    let start = Instant::now();

    for _ in 0..races {
        let mut race = DragRace::default();
        race.start(0.0);
        for tick in 0..ticks_per_race {
            race.update(1.0 / 60.0, tick as f64 * 16.0, &keys).unwrap();
        }
    }

    let duration = start.elapsed();
    println!(
        "Drag update: {} races × {} ticks in {:?} ({:.2} ns/tick)",
        races,
        ticks_per_race,
        duration,
        duration.as_nanos() as f64 / (races * ticks_per_race) as f64
    );

    // Should complete in under 1 second
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks key set construction from a browser key list
#[test]
fn benchmark_key_parsing() {
    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let keys = KeySet::from_json(r#"["KeyW", "ArrowUp", "ShiftLeft", "KeyA"]"#).unwrap();
        assert_eq!(keys.len(), 4);
    }

    let duration = start.elapsed();
    println!(
        "Key parsing: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 1000);
}
