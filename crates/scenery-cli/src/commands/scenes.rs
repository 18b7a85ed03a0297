use anyhow::Result;

use crate::app::App;

fn format_timestamp(millis: i64) -> String {
    if millis <= 0 {
        return "never".to_string();
    }
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| millis.to_string())
}

pub async fn list(app: &App) -> Result<()> {
    let summaries = app.services.scenes.list().await?;
    if summaries.is_empty() {
        println!("No stored scenes.");
        return Ok(());
    }

    for summary in &summaries {
        println!(
            "{:<32} {:<24} {:>3} boxes  {}{}",
            summary.id,
            summary.name,
            summary.box_count,
            format_timestamp(summary.timestamp),
            if summary.is_file_reference {
                "  (file)"
            } else {
                ""
            }
        );
    }
    println!("\n{} scene(s)", summaries.len());
    Ok(())
}

pub async fn show(app: &App, id: &str) -> Result<()> {
    let loaded = app.services.scenes.load(id).await?;
    println!("{}", serde_json::to_string_pretty(&loaded.scene)?);

    for failure in &loaded.avatars.failures {
        eprintln!(
            "avatar '{}' in box {} failed: {}",
            failure.avatar_name, failure.box_id, failure.message
        );
    }
    Ok(())
}

pub async fn cleanup_duplicates(app: &App) -> Result<()> {
    let removed = app.services.scenes.cleanup_duplicates().await?;
    if removed.is_empty() {
        println!("No duplicate scene records.");
    } else {
        for key in &removed {
            println!("  ✓ Removed {}", key);
        }
        println!("✅ Removed {} duplicate record(s)", removed.len());
    }
    Ok(())
}

pub async fn delete(app: &App, id: &str) -> Result<()> {
    // Populate the visible list so the confirmation shows the scene name
    app.services.scenes.list().await?;

    if app.services.scenes.delete(id).await? {
        println!("✅ Deleted scene {}", id);
    } else {
        println!("Cancelled.");
    }
    Ok(())
}
