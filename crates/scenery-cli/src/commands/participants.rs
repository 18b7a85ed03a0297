use anyhow::Result;

use crate::app::App;

pub async fn humans(app: &App, names: Vec<String>) -> Result<()> {
    let report = app
        .services
        .participants
        .set_human_participants(names)
        .await?;

    let panel = app.services.participants.ai_panel_data().await?;
    println!(
        "Human participants: {}",
        if panel.human_participants.is_empty() {
            "(none)".to_string()
        } else {
            panel.human_participants.join(", ")
        }
    );
    println!(
        "✅ Updated {} scene(s), skipped {} file reference(s)",
        report.updated_scenes.len(),
        report.skipped_file_references
    );
    for id in &report.failed_scenes {
        eprintln!("warning: scene {} could not be updated", id);
    }
    Ok(())
}

pub async fn topic(app: &App, text: String) -> Result<()> {
    app.services.participants.set_topic(text).await?;
    let panel = app.services.participants.ai_panel_data().await?;
    println!("✅ Topic set to \"{}\"", panel.discussion_topic);
    Ok(())
}
