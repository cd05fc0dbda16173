//! 上游搜索接口客户端
//!
//! 对接 `GET {base_url}{search_path}?keyword=<关键词>`，返回 `SearchResponse`

use anyhow::{anyhow, Result};
use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::config::UpstreamConfig;
use crate::models::SearchResponse;

pub struct SearchClient {
    client: Client,
    endpoint: Url,
}

impl SearchClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: Self::endpoint(config)?,
        })
    }

    fn endpoint(config: &UpstreamConfig) -> Result<Url> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| anyhow!("上游地址无效 {}: {}", config.base_url, e))?;
        Ok(base.join(&config.search_path)?)
    }

    /// 构造带关键词的搜索 URL
    pub fn search_url(&self, keyword: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("keyword", keyword.trim());
        url
    }

    /// 按关键词搜索
    pub async fn search(&self, keyword: &str) -> Result<SearchResponse> {
        let url = self.search_url(keyword);
        log::info!("请求搜索接口 URL: {}", url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("搜索接口请求失败: {}", response.status()));
        }

        let body: SearchResponse = response.json().await?;
        log::debug!(
            "搜索接口返回 search_type={:?} count={:?}",
            body.search_type,
            body.count
        );
        Ok(body)
    }
}
