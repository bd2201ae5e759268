use super::ui;
use crate::Services;
use anyhow::{Context, Result};

/// Empties both rate caches.
pub async fn clear(services: &Services) -> Result<()> {
    futures::try_join!(
        async {
            services
                .latest
                .clear()
                .await
                .context("Failed to clear latest rates cache")
        },
        async {
            services
                .history
                .clear()
                .await
                .context("Failed to clear historical rates cache")
        },
    )?;
    println!(
        "{}",
        ui::style_text("Cleared cached rates.", ui::StyleType::TotalLabel)
    );
    Ok(())
}
