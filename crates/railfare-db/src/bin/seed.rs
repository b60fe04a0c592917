//! # Sample Network Seeder
//!
//! Populates the database with a small slice of the northeastern line so the
//! quote tool has something to price.
//!
//! ## Usage
//! ```bash
//! # Seed ./railfare_dev.db (default)
//! cargo run -p railfare-db --bin seed
//!
//! # Specify database path
//! cargo run -p railfare-db --bin seed -- --db ./data/railfare.db
//! ```
//!
//! ## Generated Data
//! - Stations: KTW, AYA, SRB, PKC, NMA, BYI
//! - Train types: Special Express (base fare 170), Rapid (110), Ordinary (none)
//! - Trains: 21 (surveyed stops), 135 (surveyed stops), 233 (station distances only)
//! - Bogies: seat, AC seat, AC sleeper, AC seat priced by category, third class
//! - Fare ranges for every component, with one deliberate gap (no class 3
//!   AC, no Ordinary train-type ranges) to exercise the missing-range policy
//!
//! Route distances for every train are built at the end.

use std::env;

use railfare_core::fare_range::FareRangeDraft;
use railfare_core::scope::{
    AcBogieScope, AcCategoryScope, BerthScope, DistanceScope, FareScope, TrainTypeScope,
};
use railfare_core::{
    BerthLayout, BerthType, Bogie, ClassNumber, Km, Money, PricingEngine, RatePerKm, Station,
    Stop, Train, TrainType,
};
use railfare_db::{Database, DbConfig};

/// (id, code, name, distance from Bangkok in km)
const STATIONS: &[(i64, &str, &str, f64)] = &[
    (1, "KTW", "Krung Thep Aphiwat", 0.0),
    (2, "AYA", "Ayutthaya", 71.08),
    (3, "SRB", "Saraburi", 113.0),
    (4, "PKC", "Pak Chong", 179.9),
    (5, "NMA", "Nakhon Ratchasima", 264.1),
    (6, "BYI", "Bua Yai", 345.5),
];

/// (id, code, name, base fare in baht)
const TRAIN_TYPES: &[(i64, &str, &str, Option<i64>)] = &[
    (1, "SPX", "Special Express", Some(170)),
    (2, "RAP", "Rapid", Some(110)),
    (3, "ORD", "Ordinary", None),
];

/// (id, code, class, AC, sleeper, AC category)
const BOGIES: &[(i64, &str, u8, bool, bool, Option<i64>)] = &[
    (1, "2-SEAT", 2, false, false, None),
    (2, "2-AC", 2, true, false, None),
    (3, "1-SLP", 1, true, true, None),
    (4, "2-ACC", 2, true, false, Some(1)),
    (5, "3-SEAT", 3, false, false, None),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./railfare_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Railfare Sample Network Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./railfare_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Railfare Sample Network Seeder");
    println!("=================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.stations().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} stations", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();

    seed_network(&db).await?;
    println!("✓ Stations, trains and bogies");

    let engine = PricingEngine::new(db.clone());
    let ranges = seed_fare_ranges(&engine).await?;
    println!("✓ {} fare ranges", ranges);

    println!();
    println!("Building route distances...");
    for train_id in [1, 2, 3] {
        let distances = engine.index().rebuild(train_id).await?;
        println!("  Train {}: {} station pairs", train_id, distances.len());
    }

    println!();
    println!("✓ Seed complete in {:?}", start.elapsed());

    Ok(())
}

async fn seed_network(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    for (id, code, name, km) in STATIONS {
        db.stations()
            .upsert(&Station {
                id: *id,
                code: code.to_string(),
                name: name.to_string(),
                distance_actual: Some(Km::from_f64(*km)),
                distance_for_pricing: Some(Km::from_f64(*km)),
            })
            .await?;
    }

    for (id, code, name, base) in TRAIN_TYPES {
        db.trains()
            .upsert_type(&TrainType {
                id: *id,
                code: code.to_string(),
                name: name.to_string(),
                base_fare: base.map(Money::from_baht),
            })
            .await?;
    }

    // 21 and 135 carry surveyed distances; 233 relies on station distances
    let trains = [
        (1, "21", "Special Express 21", 1, &[1, 5, 6][..], true),
        (2, "135", "Rapid 135", 2, &[1, 2, 3, 4, 5][..], true),
        (3, "233", "Ordinary 233", 3, &[1, 2, 3, 4, 5, 6][..], false),
    ];
    for (id, number, name, train_type_id, calls, surveyed) in trains {
        let stops = calls
            .iter()
            .enumerate()
            .map(|(order, station_id)| Stop {
                station_id: *station_id,
                stop_order: order as i32 + 1,
                distance_from_origin: surveyed.then(|| station_km(*station_id)),
                is_active: true,
            })
            .collect();

        db.trains()
            .upsert(&Train {
                id,
                number: number.to_string(),
                name: name.to_string(),
                train_type_id,
                stops,
                stops_revision: 0,
            })
            .await?;
    }

    db.bogies()
        .upsert_ac_category(1, "ACS", "Standard AC seat")
        .await?;

    for (id, code, class, has_ac, is_sleeper, category) in BOGIES {
        let berths = if *is_sleeper {
            BerthLayout { upper: 16, lower: 16, single: 4 }
        } else {
            BerthLayout::default()
        };

        db.bogies()
            .upsert(&Bogie {
                id: *id,
                code: code.to_string(),
                class_number: ClassNumber::try_from(*class)?,
                has_ac: *has_ac,
                is_sleeper: *is_sleeper,
                berths,
                ac_fare_category_id: *category,
            })
            .await?;
    }

    // every train runs every bogie type
    for train_id in [1, 2, 3] {
        for (position, (bogie_id, ..)) in BOGIES.iter().enumerate() {
            db.bogies()
                .attach(train_id, *bogie_id, position as i32 + 1)
                .await?;
        }
    }

    Ok(())
}

async fn seed_fare_ranges(engine: &PricingEngine<Database>) -> Result<usize, Box<dyn std::error::Error>> {
    let mut inserted = 0;

    // distance fares: per-km up to 300 km, flat beyond
    for (class, rate, beyond) in [
        (ClassNumber::FIRST, 9_500, 390),
        (ClassNumber::SECOND, 4_800, 190),
        (ClassNumber::THIRD, 2_500, 100),
    ] {
        let scope = DistanceScope { class };
        insert(engine, &scope, FareRangeDraft::per_km(Km::ZERO, Some(Km::from_whole(300)), RatePerKm::from_ten_thousandths(rate))).await?;
        insert(engine, &scope, FareRangeDraft::flat(Km::from_whole(300), None, Money::from_baht(beyond))).await?;
        inserted += 2;
    }

    // Special Express overrides its base fare for first class only
    insert(
        engine,
        &TrainTypeScope { train_type_id: 1, class: ClassNumber::FIRST },
        FareRangeDraft::flat(Km::ZERO, None, Money::from_baht(250)),
    )
    .await?;
    insert(
        engine,
        &TrainTypeScope { train_type_id: 2, class: ClassNumber::SECOND },
        FareRangeDraft::flat(Km::ZERO, Some(Km::from_whole(100)), Money::from_baht(60)),
    )
    .await?;
    inserted += 2;

    for bogie_id in [2, 3] {
        let scope = AcBogieScope { bogie_id };
        insert(engine, &scope, FareRangeDraft::flat(Km::ZERO, Some(Km::from_whole(200)), Money::from_baht(60))).await?;
        insert(engine, &scope, FareRangeDraft::flat(Km::from_whole(200), None, Money::from_baht(100))).await?;
        inserted += 2;
    }

    insert(
        engine,
        &AcCategoryScope { category_id: 1 },
        FareRangeDraft::flat(Km::ZERO, None, Money::from_baht(80)),
    )
    .await?;
    inserted += 1;

    for (berth, baht) in [(BerthType::Upper, 240), (BerthType::Lower, 340), (BerthType::Single, 400)] {
        insert(
            engine,
            &BerthScope { bogie_id: 3, berth },
            FareRangeDraft::flat(Km::ZERO, None, Money::from_baht(baht)),
        )
        .await?;
        inserted += 1;
    }

    Ok(inserted)
}

async fn insert<K: FareScope>(
    engine: &PricingEngine<Database>,
    scope: &K,
    draft: FareRangeDraft,
) -> Result<(), Box<dyn std::error::Error>> {
    engine.table::<K>().insert(scope, &draft).await?;
    Ok(())
}

fn station_km(station_id: i64) -> Km {
    STATIONS
        .iter()
        .find(|(id, ..)| *id == station_id)
        .map(|(.., km)| Km::from_f64(*km))
        .unwrap_or(Km::ZERO)
}
