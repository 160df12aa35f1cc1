use std::time::Duration;

use reqwest::Client;

use crate::shared::entities::{PartialPharmacyProfile, PharmacyProfile};
use crate::shared::ports::directory::{
    DirectoryFuture, DirectoryPort, DirectoryPortError, PharmacyRecord,
};

/// REST directory: `GET <url>` lists records, `POST <url>` creates one.
#[derive(Clone)]
pub struct HttpDirectoryAdapter {
    client: Client,
    url: String,
}

impl HttpDirectoryAdapter {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DirectoryPortError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DirectoryPortError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl DirectoryPort for HttpDirectoryAdapter {
    fn fetch_all(&self) -> DirectoryFuture<Vec<PharmacyRecord>> {
        let client = self.client.clone();
        let url = self.url.clone();
        Box::pin(async move {
            let resp = client
                .get(&url)
                .send()
                .await
                .map_err(|e| DirectoryPortError::Transport(e.to_string()))?;
            let status = resp.status();
            if !status.is_success() {
                return Err(DirectoryPortError::Transport(format!(
                    "GET {} returned {}",
                    url, status
                )));
            }
            let records = resp
                .json::<Vec<PharmacyRecord>>()
                .await
                .map_err(|e| DirectoryPortError::InvalidResponse(e.to_string()))?;
            log::debug!("[directory] GET {} records={}", url, records.len());
            Ok(records)
        })
    }

    fn create(&self, record: PartialPharmacyProfile) -> DirectoryFuture<PharmacyProfile> {
        let client = self.client.clone();
        let url = self.url.clone();
        Box::pin(async move {
            let resp = client
                .post(&url)
                .json(&record)
                .send()
                .await
                .map_err(|e| DirectoryPortError::Transport(e.to_string()))?;
            let status = resp.status();
            if !status.is_success() {
                return Err(DirectoryPortError::Transport(format!(
                    "POST {} returned {}",
                    url, status
                )));
            }
            resp.json::<PharmacyProfile>()
                .await
                .map_err(|e| DirectoryPortError::InvalidResponse(e.to_string()))
        })
    }
}
