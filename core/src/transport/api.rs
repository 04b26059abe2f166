use std::sync::Arc;

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{ApiRequest, Transport};
use crate::error::{MonitorError, Result};
use crate::types::{BatchImportResult, RecordId, TransactionPage, Wallet, WalletDraft};

/// Typed endpoints of the monitoring backend on top of any `Transport`.
#[derive(Clone)]
pub struct MonitorApi {
    transport: Arc<dyn Transport>,
}

impl MonitorApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn list_wallets(&self) -> Result<Vec<Wallet>> {
        self.call(ApiRequest::get("/wallets/")).await
    }

    pub async fn create_wallet(&self, draft: &WalletDraft) -> Result<Wallet> {
        self.call(ApiRequest::post("/wallets/", to_body(draft)?))
            .await
    }

    pub async fn update_wallet(&self, id: &RecordId, draft: &WalletDraft) -> Result<Wallet> {
        self.call(ApiRequest::put(wallet_path(id)?, to_body(draft)?))
            .await
    }

    /// Any body the server sends back on delete is ignored.
    pub async fn delete_wallet(&self, id: &RecordId) -> Result<()> {
        self.transport
            .send(ApiRequest::delete(wallet_path(id)?))
            .await?;
        Ok(())
    }

    pub async fn batch_import(&self, drafts: &[WalletDraft]) -> Result<BatchImportResult> {
        self.call(ApiRequest::post("/wallets/batch", to_body(drafts)?))
            .await
    }

    /// Fetch one page of the monitoring feed. `page` is 1-based, as the
    /// backend expects it.
    pub async fn monitoring_page(&self, page: u32, size: u32) -> Result<TransactionPage> {
        self.call(
            ApiRequest::get("/transactions/monitoring")
                .with_query("page", page)
                .with_query("size", size),
        )
        .await
    }

    async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let what = format!("{} {}", request.method, request.path);
        let body = self.transport.send(request).await?;
        serde_json::from_value(body)
            .map_err(|e| MonitorError::Decode(format!("Unexpected response to {what}: {e}")))
    }
}

fn to_body<T: serde::Serialize + ?Sized>(value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| MonitorError::Other(anyhow::anyhow!("Failed to encode request: {e}")))
}

/// `/wallets/{id}` with the id escaped as a single path segment.
fn wallet_path(id: &RecordId) -> Result<String> {
    let mut url = Url::parse("http://monitor.invalid/")
        .map_err(|e| MonitorError::Other(anyhow::anyhow!("Failed to build path: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| MonitorError::Other(anyhow::anyhow!("Failed to build path for {id}")))?
        .clear()
        .push("wallets")
        .push(id.as_str());
    Ok(url.path().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTransport;
    use crate::transport::Method;

    #[test]
    fn plain_ids_are_untouched() {
        assert_eq!(wallet_path(&RecordId::from(42u64)).unwrap(), "/wallets/42");
        assert_eq!(wallet_path(&RecordId::from("abc-1")).unwrap(), "/wallets/abc-1");
    }

    #[test]
    fn reserved_characters_are_escaped() {
        assert_eq!(
            wallet_path(&RecordId::from("a/b?c#d")).unwrap(),
            "/wallets/a%2Fb%3Fc%23d"
        );
    }

    #[tokio::test]
    async fn delete_targets_one_segment() {
        let fake = Arc::new(FakeTransport::new());
        let api = MonitorApi::new(fake.clone());
        fake.reply(Value::Null);

        api.delete_wallet(&RecordId::from("x/../y")).await.unwrap();
        let request = &fake.requests()[0];
        assert_eq!(request.method, Method::Delete);
        assert_eq!(request.path, "/wallets/x%2F..%2Fy");
    }
}
