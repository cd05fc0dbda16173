//! 应用共享状态

use tokio::sync::Mutex;

use crate::config::ReportSettings;
use crate::services::page::Page;
use crate::services::search_client::SearchClient;
use crate::services::search_session::SearchSession;

pub struct AppState {
    /// 页面与最近结果，锁不跨越上游请求持有
    pub session: Mutex<SearchSession>,
    pub client: SearchClient,
    pub report: ReportSettings,
}

impl AppState {
    pub fn new(client: SearchClient, report: ReportSettings) -> Self {
        Self {
            session: Mutex::new(SearchSession::new(Page::default())),
            client,
            report,
        }
    }
}
