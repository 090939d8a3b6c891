// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Club-Crawler CLI
//!
//! Logs in, crawls one club's recent-activity feed and writes the
//! collected records to a plain-text report.

use club_crawler::models::DateFilter;
use club_crawler::{Activity, Config, Crawler};
use std::io::Write;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(club_id = config.club_id, "Starting club crawl");

    let crawler = Crawler::connect(&config).await?;

    let filter = config.filter_date.map(DateFilter::new);
    let activities = crawler.club_activities(config.club_id, filter).await?;
    tracing::info!(count = activities.len(), "Crawl complete");

    write_activities(&config.results_path, &activities)?;
    tracing::info!(path = %config.results_path, "Report written");

    Ok(())
}

/// Render the collected records one field per line, metrics indented.
fn write_activities(path: &str, activities: &[Activity]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;

    for activity in activities {
        let info = &activity.info;
        writeln!(file, "title: {}", info.title)?;
        writeln!(file, "athlete: {}", info.athlete_name)?;
        writeln!(file, "type: {}", info.activity_type)?;
        writeln!(file, "date: {}", info.date)?;
        writeln!(file, "href: {}", info.href)?;
        writeln!(file, "routable: {}", info.routable)?;

        let metrics = &activity.metrics;
        writeln!(file, "     distance_km: {}", metrics.distance_km)?;
        writeln!(file, "     moving_time_secs: {}", metrics.moving_time_secs)?;
        writeln!(file, "     pace_secs_per_km: {}", metrics.pace_secs_per_km)?;
        writeln!(file, "     elevation_gain_m: {}", metrics.elevation_gain_m)?;
        writeln!(file, "     calories: {}", metrics.calories)?;
        writeln!(file, "     device: {}", metrics.device)?;
        writeln!(
            file,
            "     gear: {} ({})",
            metrics.gear.name, metrics.gear.mileage
        )?;
        writeln!(file)?;
    }

    Ok(())
}

/// Initialize structured logging.
fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("club_crawler=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
