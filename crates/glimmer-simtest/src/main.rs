//! Glimmer Headless Simulation Harness
//!
//! Validates the event catalog, rule lifecycle and tile search in-process.
//! No rendering, no networking.
//!
//! Usage:
//!   cargo run -p glimmer-simtest
//!   cargo run -p glimmer-simtest -- --verbose
//!   RUST_LOG=stationevents=debug cargo run -p glimmer-simtest

use glimmer_core::config::{EventCatalog, RuleConfiguration};
use glimmer_core::engine::StationEventEngine;
use glimmer_core::generation::StationConfig;
use glimmer_core::systems::{GlimmerTier, LogType, RuleState, StationRegistry, TILE_SEARCH_ATTEMPTS};
use serde::Deserialize;

// ── Catalog (same JSON the engine embeds) ───────────────────────────────
const CATALOG_JSON: &str = include_str!("../../../data/glimmer_events.json");

#[derive(Debug, Deserialize)]
struct RawCatalog {
    events: Vec<serde_json::Value>,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Glimmer Station Event Harness ===\n");

    let mut results = Vec::new();

    // 1. Event catalog validation
    results.extend(validate_catalog(verbose));

    // 2. Rule lifecycle sweep
    results.extend(validate_lifecycle(verbose));

    // 3. Glimmer economy over a long session
    results.extend(validate_glimmer_economy(verbose));

    // 4. Tile search on generated stations
    results.extend(validate_tile_search(verbose));

    // 5. Save/load
    results.extend(validate_persistence(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Event Catalog ────────────────────────────────────────────────────

fn validate_catalog(verbose: bool) -> Vec<TestResult> {
    println!("--- Event Catalog ---");
    let mut results = Vec::new();

    let raw: RawCatalog = match serde_json::from_str(CATALOG_JSON) {
        Ok(r) => r,
        Err(e) => {
            results.push(TestResult {
                name: "catalog_parse".into(),
                passed: false,
                detail: format!("JSON parse error: {}", e),
            });
            return results;
        }
    };

    let catalog = match EventCatalog::builtin() {
        Ok(c) => c,
        Err(e) => {
            results.push(TestResult {
                name: "catalog_validate".into(),
                passed: false,
                detail: format!("catalog rejected: {}", e),
            });
            return results;
        }
    };

    results.push(TestResult {
        name: "catalog_complete".into(),
        passed: catalog.len() == raw.events.len() && !catalog.is_empty(),
        detail: format!("{} events loaded", catalog.len()),
    });

    let glimmer_count = catalog.glimmer_events().count();
    results.push(TestResult {
        name: "catalog_has_glimmer_events".into(),
        passed: glimmer_count >= 3,
        detail: format!("{} glimmer events", glimmer_count),
    });

    // Some event must be eligible at every tier
    let uncovered: Vec<i32> = [0, 100, 450, 650, 800, 1000]
        .into_iter()
        .filter(|&g| catalog.eligible(g).next().is_none())
        .collect();
    results.push(TestResult {
        name: "catalog_covers_tiers".into(),
        passed: uncovered.len() < 6,
        detail: if uncovered.is_empty() {
            "events eligible at every sampled level".into()
        } else {
            format!("nothing eligible at {:?}", uncovered)
        },
    });

    let empty_reports: Vec<&str> = catalog
        .glimmer_events()
        .filter(|e| e.report.is_empty())
        .map(|e| e.id.as_str())
        .collect();
    results.push(TestResult {
        name: "catalog_reports_present".into(),
        passed: empty_reports.is_empty(),
        detail: if empty_reports.is_empty() {
            "every glimmer event has a report".into()
        } else {
            format!("missing reports: {}", empty_reports.join(", "))
        },
    });

    if verbose {
        for event in catalog.glimmer_events() {
            println!(
                "  {} burn {}..{} window {}..={}",
                event.id,
                event.glimmer_burn_lower,
                event.glimmer_burn_upper,
                event.minimum_glimmer,
                event.maximum_glimmer
            );
        }
    }

    results
}

// ── 2. Rule Lifecycle ───────────────────────────────────────────────────

fn validate_lifecycle(verbose: bool) -> Vec<TestResult> {
    println!("--- Rule Lifecycle ---");
    let mut results = Vec::new();

    let catalog = match EventCatalog::builtin() {
        Ok(c) => c,
        Err(_) => return results,
    };

    let mut clean_runs = 0;
    let mut failures = Vec::new();

    for config in catalog.events.iter() {
        let RuleConfiguration::Glimmer(event) = config else {
            continue;
        };
        let mut engine = StationEventEngine::with_catalog(catalog.clone(), 17);
        engine.set_glimmer(1000);

        if let Err(e) = engine.start_event(&event.id) {
            failures.push(format!("{}: {}", event.id, e));
            continue;
        }

        // just under the rule duration: must still be running
        for _ in 0..59 {
            engine.update(1.0 / 60.0);
        }
        let alive_early = engine.is_running(&event.id);

        for _ in 0..30 {
            engine.update(1.0 / 60.0);
        }

        let reports = engine.reports();
        let types: Vec<LogType> = engine.audit_entries().iter().map(|e| e.log_type).collect();
        let burned = reports.first().map(|r| r.glimmer_burned).unwrap_or(-1);
        let ok = alive_early
            && !engine.is_running(&event.id)
            && reports.len() == 1
            && reports[0].message == event.report
            && burned >= event.glimmer_burn_lower.max(0)
            && engine.glimmer() == 1000 - burned
            && types == [LogType::EventAnnounced, LogType::EventStarted, LogType::EventStopped];

        if verbose {
            println!("  {} burned {} glimmer", event.id, burned);
        }
        if ok {
            clean_runs += 1;
        } else {
            failures.push(event.id.clone());
        }
    }

    results.push(TestResult {
        name: "lifecycle_each_event".into(),
        passed: failures.is_empty() && clean_runs > 0,
        detail: if failures.is_empty() {
            format!("{} events ran Added → Started → Ended cleanly", clean_runs)
        } else {
            format!("failed: {}", failures.join(", "))
        },
    });

    // Generic entries run but never debit or report
    let mut engine = StationEventEngine::with_catalog(catalog.clone(), 17);
    engine.set_glimmer(500);
    let generic_ids: Vec<String> = catalog
        .events
        .iter()
        .filter(|c| c.as_glimmer().is_none())
        .map(|c| c.id().to_string())
        .collect();
    for id in &generic_ids {
        let _ = engine.start_event(id);
    }
    for _ in 0..120 {
        engine.update(1.0 / 60.0);
    }
    let ended = engine.end_all_events();
    results.push(TestResult {
        name: "lifecycle_generic_no_debit".into(),
        passed: ended == generic_ids.len() && engine.glimmer() == 500 && engine.reports().is_empty(),
        detail: format!("{} generic events ended, glimmer {}", ended, engine.glimmer()),
    });

    // Ending twice has no second effect
    let mut engine = StationEventEngine::with_catalog(catalog, 17);
    engine.set_glimmer(1000);
    let double_end = match engine.start_random_event() {
        Ok(Some(id)) => {
            let first = engine.end_event(&id);
            let second = engine.end_event(&id);
            first && !second && engine.reports().len() == 1
        }
        _ => false,
    };
    results.push(TestResult {
        name: "lifecycle_single_end".into(),
        passed: double_end,
        detail: format!("end state {:?} reached once", RuleState::Ended),
    });

    results
}

// ── 3. Glimmer Economy ──────────────────────────────────────────────────

fn validate_glimmer_economy(verbose: bool) -> Vec<TestResult> {
    println!("--- Glimmer Economy ---");
    let mut results = Vec::new();

    let catalog = match EventCatalog::builtin() {
        Ok(c) => c,
        Err(_) => return results,
    };
    let mut engine = StationEventEngine::with_catalog(catalog, 99);
    engine.set_glimmer(1000);

    let mut min_seen = i32::MAX;
    let mut max_seen = i32::MIN;
    let mut tiers = Vec::new();

    // ten simulated minutes, one random event every 5 seconds, glimmer regrows slowly
    for second in 0..600 {
        if second % 5 == 0 {
            let _ = engine.start_random_event();
        }
        if second % 2 == 0 {
            engine.add_glimmer(3);
        }
        for _ in 0..60 {
            engine.update(1.0 / 60.0);
        }
        let glimmer = engine.glimmer();
        min_seen = min_seen.min(glimmer);
        max_seen = max_seen.max(glimmer);
        let tier = engine.glimmer_tier();
        if tiers.last() != Some(&tier) {
            tiers.push(tier);
        }
    }

    if verbose {
        println!("  tier path: {:?}", tiers);
    }

    results.push(TestResult {
        name: "economy_bounds".into(),
        passed: min_seen >= 0 && max_seen <= 1000,
        detail: format!("glimmer stayed within {}..={}", min_seen, max_seen),
    });

    results.push(TestResult {
        name: "economy_events_drain".into(),
        passed: engine.reports().len() > 10 && tiers.first() == Some(&GlimmerTier::Critical),
        detail: format!(
            "{} events ended, {} tier changes",
            engine.reports().len(),
            tiers.len().saturating_sub(1)
        ),
    });

    results
}

// ── 4. Tile Search ──────────────────────────────────────────────────────

fn validate_tile_search(verbose: bool) -> Vec<TestResult> {
    println!("--- Tile Search ---");
    let mut results = Vec::new();

    let mut engine = StationEventEngine::new(5);
    results.push(TestResult {
        name: "tile_search_empty_map".into(),
        passed: engine.find_random_tile().is_none(),
        detail: "no stations, no target".into(),
    });

    let layout = engine.generate(&StationConfig {
        name: "Harness Station".into(),
        grid_count: 4,
        ..Default::default()
    });

    let searches = 1000;
    let mut found = 0;
    let mut out_of_bounds = 0;
    for _ in 0..searches {
        let Some(target) = engine.find_random_tile() else {
            continue;
        };
        found += 1;
        let inside = engine
            .tile_world_position(&target)
            .zip(engine.stations.grid_placement(target.grid))
            .map(|(pos, placement)| placement.world_aabb.contains(&pos))
            .unwrap_or(false);
        if !inside || target.station != layout.station {
            out_of_bounds += 1;
        }
    }

    if verbose {
        println!(
            "  {}/{} searches found a tile within {} attempts",
            found, searches, TILE_SEARCH_ATTEMPTS
        );
    }

    results.push(TestResult {
        name: "tile_search_success_rate".into(),
        passed: found > searches * 9 / 10,
        detail: format!("{}/{} searches succeeded", found, searches),
    });

    results.push(TestResult {
        name: "tile_search_in_bounds".into(),
        passed: out_of_bounds == 0,
        detail: format!("{} targets outside their grid", out_of_bounds),
    });

    results
}

// ── 5. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(_verbose: bool) -> Vec<TestResult> {
    println!("--- Persistence ---");
    let mut results = Vec::new();

    let catalog = match EventCatalog::builtin() {
        Ok(c) => c,
        Err(_) => return results,
    };
    let mut engine = StationEventEngine::with_catalog(catalog, 3);
    engine.generate(&StationConfig::default());
    engine.set_glimmer(720);
    engine.update(5.0);

    let mut buffer = Vec::new();
    let saved = engine.save(&mut buffer);
    let mut restored = StationEventEngine::new(0);
    let loaded = saved.and_then(|_| restored.load(&buffer[..]));

    let ok = loaded.is_ok()
        && restored.glimmer() == 720
        && restored.catalog() == engine.catalog()
        && restored.stations.grid_count() == engine.stations.grid_count()
        && restored.stations.stations().len() == 1;

    results.push(TestResult {
        name: "persistence_roundtrip".into(),
        passed: ok,
        detail: match loaded {
            Ok(()) => format!("{} bytes", buffer.len()),
            Err(e) => format!("save/load failed: {}", e),
        },
    });

    results
}
