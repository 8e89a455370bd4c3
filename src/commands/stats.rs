//! `vmfleet stats` — print summary statistics for the collection.

use std::path::Path;

use anyhow::Result;

use vmfleet::fleet::FleetStats;

pub async fn run(config_path: &str, data_file: Option<&Path>) -> Result<()> {
    let mut ws = super::open_workspace(config_path, data_file).await?;
    let fleet = super::load_fleet(&mut ws).await?;

    render(&fleet.stats());
    ws.journal
        .info(format!("Reported statistics for {} machines", fleet.len()))
        .await;
    ws.close().await
}

pub(crate) fn render(stats: &FleetStats) {
    println!("Fleet summary");
    println!("{}", "-".repeat(30));
    println!("Total machines : {}", stats.total);

    if stats.total == 0 {
        return;
    }

    println!();
    println!("By status:");
    for (status, count) in &stats.by_status {
        println!("  {status:<8} {count}");
    }

    println!();
    println!("By OS:");
    for (os, count) in &stats.by_os {
        println!("  {os:<8} {count}");
    }

    println!();
    println!("By health:");
    for (health, count) in &stats.by_health {
        println!("  {health:<8} {count}");
    }

    let averages = [
        ("response time", stats.avg_response_time_ms, "ms"),
        ("CPU usage", stats.avg_cpu_percent, "%"),
        ("memory usage", stats.avg_memory_percent, "%"),
    ];
    if averages.iter().any(|(_, v, _)| v.is_some()) {
        println!();
        println!("Averages:");
        for (label, value, unit) in averages {
            if let Some(v) = value {
                println!("  {label:<14} {v:.1} {unit}");
            }
        }
    }
}
