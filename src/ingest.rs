use crate::{
    errors::{AppError, Result},
    models::{Card, CardDump, LoadSummary},
    repository::{CardRepository, RepositoryError},
};

/// Read a card dump from a local file or an http(s) URL.
pub async fn load_source(source: &str) -> Result<CardDump> {
    if source.starts_with("http://") || source.starts_with("https://") {
        tracing::info!("🌐 Fetching card dump from {}", source);
        let response = reqwest::get(source)
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::Ingest(format!("fetching {}: {}", source, e)))?;
        return response
            .json::<CardDump>()
            .await
            .map_err(|e| AppError::Ingest(format!("parsing {}: {}", source, e)));
    }

    tracing::info!("📂 Reading card dump from {}", source);
    let bytes = tokio::fs::read(source)
        .await
        .map_err(|e| AppError::Ingest(format!("reading {}: {}", source, e)))?;
    serde_json::from_slice(&bytes).map_err(|e| AppError::Ingest(format!("parsing {}: {}", source, e)))
}

/// Insert every card through [`CardRepository::add_card`]. Cards that already exist
/// are skipped; any other failure stops the load (earlier cards stay committed).
pub async fn ingest_cards(repo: &CardRepository, cards: &[Card]) -> Result<LoadSummary> {
    let mut summary = LoadSummary::default();

    for card in cards {
        match repo.add_card(card).await {
            Ok(()) => summary.inserted += 1,
            Err(RepositoryError::Duplicate(id)) => {
                tracing::warn!("⚠️ Card {} already loaded, skipping", id);
                summary.skipped += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }

    tracing::info!(
        "✅ LOAD COMPLETE: inserted={}, skipped={}",
        summary.inserted,
        summary.skipped
    );
    Ok(summary)
}
