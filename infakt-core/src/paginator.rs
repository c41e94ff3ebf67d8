use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::client::{InfaktClient, InfaktError};

pub const DEFAULT_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct Page {
    pub entities: Vec<Value>,
    #[serde(default)]
    pub metainfo: Option<PageMetainfo>,
}

#[derive(Debug, Deserialize)]
pub struct PageMetainfo {
    #[serde(default)]
    pub total_count: Option<u64>,
}

pub struct Paginator<'a> {
    client: &'a InfaktClient,
    endpoint: Url,
    page_size: u32,
    page_index: u64,
    exhausted: bool,
}

impl<'a> Paginator<'a> {
    pub fn new(client: &'a InfaktClient, endpoint: Url, page_size: u32) -> Self {
        Self {
            client,
            endpoint,
            page_size: page_size.max(1),
            page_index: 0,
            exhausted: false,
        }
    }

    pub fn pages_requested(&self) -> u64 {
        self.page_index
    }

    pub async fn next_page(&mut self) -> Result<Option<Vec<Value>>, InfaktError> {
        if self.exhausted {
            return Ok(None);
        }

        let offset = self.page_index * u64::from(self.page_size);
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("limit", &self.page_size.to_string())
            .append_pair("offset", &offset.to_string());
        self.page_index += 1;

        // Any failure ends the sequence as well; a later call must not resume
        // past a page that was never read.
        self.exhausted = true;
        let body = self.client.get_json(url.clone()).await?;
        let page: Page = serde_json::from_value(body).map_err(|source| InfaktError::InvalidPage {
            url: url.to_string(),
            source,
        })?;

        if page.entities.is_empty() {
            return Ok(None);
        }
        self.exhausted = false;
        tracing::debug!(
            url = %url,
            count = page.entities.len(),
            total = page.metainfo.as_ref().and_then(|m| m.total_count),
            "fetched page"
        );
        Ok(Some(page.entities))
    }

    pub async fn collect_all(mut self) -> Result<Vec<Value>, InfaktError> {
        let mut entities = Vec::new();
        while let Some(page) = self.next_page().await? {
            entities.extend(page);
        }
        Ok(entities)
    }
}
