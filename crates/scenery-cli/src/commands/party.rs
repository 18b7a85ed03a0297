use anyhow::{Context, Result};

use crate::app::App;

pub async fn list(app: &App) -> Result<()> {
    let templates = app.services.party.templates().await?;
    if templates.is_empty() {
        println!("No party templates.");
        return Ok(());
    }

    for template in &templates {
        let mut details = vec![template.speaking_mode.as_str().to_string()];
        if let Some(size) = template.subset_size {
            details.push(format!("subset {}", size));
        }
        if let Some(speaker) = &template.representative_speaker {
            details.push(format!("representative {}", speaker));
        }
        if template.enable_backchannel {
            details.push("backchannel".to_string());
        }
        println!("{:<24} {}", template.name, details.join(", "));
        if !template.description.is_empty() {
            println!("    {}", template.description);
        }
    }
    Ok(())
}

pub async fn config(app: &App, scene_id: &str) -> Result<()> {
    let loaded = app.services.scenes.load(scene_id).await?;
    let config = app.services.party.prepare_config_for(&loaded.scene).await?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

pub async fn cleanup(app: &App, force: bool, prune: bool) -> Result<()> {
    let services = &app.services;

    let cleaned = if prune {
        // Every stored scene must load, or its boxes would lose their configs
        for summary in services.scenes.list().await? {
            services
                .scenes
                .load(&summary.id)
                .await
                .with_context(|| format!("Cannot prune while scene {} fails to load", summary.id))?;
        }
        let scenes = services.scenes.open_scenes().await;
        services
            .party
            .cleanup_party_configs(force, Some(scenes.as_slice()))
            .await?
    } else {
        services.party.cleanup_party_configs(force, None).await?
    };

    if cleaned {
        println!("✅ Party configs cleaned up");
    } else {
        println!("Party config cleanup is disabled; pass --force to run it anyway.");
    }
    Ok(())
}
