//! # Seed Data Generator
//!
//! Populates a development database with accounts and bookings.
//!
//! ## Usage
//! ```bash
//! # Use the configured database (ridebook.toml / RIDEBOOK_DB_PATH)
//! cargo run -p ridebook-engine --bin seed
//!
//! # Specify database path
//! cargo run -p ridebook-engine --bin seed -- --db ./data/ridebook.db
//!
//! # Specify config file
//! cargo run -p ridebook-engine --bin seed -- --config ./ridebook.toml
//! ```
//!
//! ## Generated Data
//! - One admin (signed up as a user, then promoted with `set_role`)
//! - Two customers
//! - One booking per trip below, spread across both customers
//! - Every third booking confirmed by the admin (the first one also
//!   completed); the eighth cancelled by its owner

use std::env;
use std::path::PathBuf;

use chrono::{Duration, Utc};
use ridebook_core::{BookingStatus, Caller, ProfileFields, Role, StatusFilter, TripRequest};
use ridebook_engine::{telemetry, EngineConfig, RideBook};

const ADMIN_EMAIL: &str = "admin@ridebook.local";
const SEED_PASSWORD: &str = "ridebook";

/// (name, email, phone)
const CUSTOMERS: &[(&str, &str, &str)] = &[
    ("Asha Verma", "asha@ridebook.local", "98765 43210"),
    ("Rohan Mehta", "rohan@ridebook.local", "+91 91234 56789"),
];

/// (pickup, drop, vehicle class)
const TRIPS: &[(&str, &str, &str)] = &[
    ("Haridwar", "Dehradun Airport", "standard"),
    ("Rishikesh", "Jolly Grant Airport", "suv"),
    ("Haridwar Railway Station", "Mussoorie", "premium"),
    ("Dehradun ISBT", "Rishikesh", "sedan"),
    ("Har Ki Pauri", "Roorkee", "standard"),
    ("Rishikesh", "Kedarnath Base (Sonprayag)", "premium-large"),
    ("Jolly Grant Airport", "Haridwar", "premium-sedan"),
    ("Dehradun", "Chakrata", "suv"),
    ("Haridwar", "Delhi Airport T3", "premium"),
    ("Mussoorie", "Dehradun Railway Station", "standard"),
    ("Rishikesh", "Haridwar", "sedan"),
    ("Roorkee", "Jolly Grant Airport", "suv"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut db_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("RideBook Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  Config file (default: platform config dir)");
                println!("  -d, --db <PATH>      Database file path (overrides config)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = EngineConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.database.path = Some(path);
    }
    telemetry::init_tracing(&config.logging.filter);

    println!("🌱 RideBook Seed Data Generator");
    println!("===============================");
    println!("Database: {}", config.database_path().display());
    println!();

    let app = RideBook::open(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing data
    let existing = app.database().bookings().count().await?;
    let profiles = app.database().profiles().count().await?;
    if existing > 0 || profiles > 0 {
        println!(
            "⚠ Database already has {} bookings and {} profiles",
            existing, profiles
        );
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Accounts
    println!();
    println!("Creating accounts...");

    let admin = app
        .sign_up(
            ADMIN_EMAIL,
            SEED_PASSWORD,
            ProfileFields {
                display_name: Some("Dispatch Desk".to_string()),
                ..ProfileFields::default()
            },
        )
        .await?;
    app.database().profiles().set_role(&admin.id, Role::Admin).await?;
    let admin = Caller::admin(admin.id);
    println!("  admin     {}", ADMIN_EMAIL);

    let mut customers = Vec::with_capacity(CUSTOMERS.len());
    for (name, email, phone) in CUSTOMERS {
        let caller = app
            .sign_up(
                email,
                SEED_PASSWORD,
                ProfileFields {
                    display_name: Some(name.to_string()),
                    contact_phone: Some(phone.to_string()),
                    ..ProfileFields::default()
                },
            )
            .await?;
        println!("  customer  {}", email);
        customers.push(caller);
    }
    app.log_out().await?;

    // Bookings
    println!();
    println!("Submitting bookings...");

    let offset = app.config().utc_offset()?;
    let start = std::time::Instant::now();
    let service = app.bookings();
    let mut submitted = 0;

    for (idx, (pickup, drop, class)) in TRIPS.iter().enumerate() {
        let owner = &customers[idx % customers.len()];
        let day = (Utc::now() + Duration::days(1 + idx as i64)).with_timezone(&offset);

        let request = TripRequest {
            pickup: pickup.to_string(),
            drop: drop.to_string(),
            date: day.format("%Y-%m-%d").to_string(),
            time: format!("{:02}:{:02}", 6 + (idx % 12), (idx * 15) % 60),
            vehicle_class: class.to_string(),
        };

        let booking = match service.submit(Some(owner), &request).await {
            Ok(booking) => booking,
            Err(e) => {
                eprintln!("Failed to submit {} → {}: {}", pickup, drop, e);
                continue;
            }
        };
        submitted += 1;

        if idx % 3 == 0 {
            service
                .transition(&booking.id, BookingStatus::Confirmed, Some(&admin))
                .await?;
            if idx % 5 == 0 {
                service
                    .transition(&booking.id, BookingStatus::Completed, Some(&admin))
                    .await?;
            }
        } else if idx % 7 == 0 {
            service.cancel(&booking.id, Some(owner)).await?;
        }
    }

    println!(
        "✓ Submitted {} bookings in {:?}",
        submitted,
        start.elapsed()
    );

    // Dashboard figures
    println!();
    println!("Dashboard:");
    let dashboard = service.dashboard(Some(&admin), StatusFilter::All, "").await?;
    let summary = dashboard.summary;
    println!("  Total volume:  {}", summary.total_volume);
    println!("  Pending:       {}", summary.pending_count);
    println!("  Revenue:       {}", summary.total_revenue);
    for status in BookingStatus::ALL {
        println!("  {:<13}  {}", status.as_str(), summary.by_status.get(status));
    }

    let haridwar = service
        .dashboard(Some(&admin), StatusFilter::All, "haridwar")
        .await?;
    println!("  Search 'haridwar': {} results", haridwar.bookings.len());

    println!();
    println!("✓ Seed complete!");
    println!("  Accounts use password '{}'.", SEED_PASSWORD);

    app.close().await;
    Ok(())
}
