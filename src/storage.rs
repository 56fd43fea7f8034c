use crate::models::LedgerData;
use crate::store::StoreError;
use std::path::Path;
use tokio::fs;
use tracing::error;

pub async fn load_data(path: &Path) -> LedgerData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!(path = %path.display(), "failed to parse data file: {err}");
                LedgerData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => LedgerData::default(),
        Err(err) => {
            error!(path = %path.display(), "failed to read data file: {err}");
            LedgerData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &LedgerData) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(data).map_err(|err| StoreError::Persist(err.to_string()))?;
    fs::write(path, payload)
        .await
        .map_err(|err| StoreError::Persist(err.to_string()))?;
    Ok(())
}
