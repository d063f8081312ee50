use mongodb::{Client, Database};

use crate::errors::{AppError, Result};

pub async fn get_db_client(database_url: &str, db_name: &str) -> Result<(Client, Database)> {
    let client = Client::with_uri_str(database_url).await?;
    let db = client.database(db_name);

    // Verify database is reachable by listing collections
    match db.list_collection_names().await {
        Ok(collections) => {
            tracing::info!("✅ Connected to database: {}", db_name);
            tracing::info!("📂 Collections found: {:?}", collections);

            for required in ["matches_cache", "predictions", "users", "gameweeks", "leagues"] {
                if !collections.iter().any(|c| c == required) {
                    tracing::warn!("⚠️ '{}' collection not found in database", required);
                }
            }
            Ok((client, db))
        }
        Err(e) => {
            tracing::error!("❌ Database '{}' is inaccessible: {}", db_name, e);
            Err(AppError::MongoDB(e))
        }
    }
}
