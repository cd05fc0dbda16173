//! 搜索会话
//!
//! 持有页面模型、最近一次搜索结果以及请求序号：
//! - 每次搜索先领取递增的请求序号
//! - 响应到达时只有最新序号会被渲染，过期响应直接丢弃
//! - 渲染成功后保存结果，供 Markdown 导出复用

use chrono::NaiveDate;
use log::{info, warn};

use crate::config::ReportSettings;
use crate::errors::{RenderError, RenderResult};
use crate::models::{SearchResponse, SearchResult};
use crate::services::html_renderer::{render_error_banner, render_search_result};
use crate::services::markdown_renderer::render_markdown;
use crate::services::page::{Page, RESULTS_CONTAINER};

/// 请求序号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn seq(&self) -> u64 {
        self.0
    }
}

/// 一次响应的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// 已写入页面
    Rendered { has_data: bool },
    /// 已有更新的请求，响应被丢弃
    Discarded { latest_seq: u64 },
}

#[derive(Debug, Default)]
pub struct SearchSession {
    page: Page,
    last_result: Option<SearchResult>,
    latest_seq: u64,
}

impl SearchSession {
    pub fn new(page: Page) -> Self {
        Self {
            page,
            last_result: None,
            latest_seq: 0,
        }
    }

    /// 发起新请求，之前领取的序号全部过期
    pub fn begin_request(&mut self) -> RequestTicket {
        self.latest_seq += 1;
        RequestTicket(self.latest_seq)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.0 == self.latest_seq
    }

    /// 处理上游响应
    pub fn apply_response(&mut self, ticket: RequestTicket, response: SearchResponse) -> RenderResult<RenderOutcome> {
        if !self.is_current(ticket) {
            warn!("丢弃过期响应: 请求序号 {}，最新序号 {}", ticket.0, self.latest_seq);
            return Ok(RenderOutcome::Discarded {
                latest_seq: self.latest_seq,
            });
        }

        match SearchResult::from_response(response) {
            Ok(result) => self.render(result),
            Err(RenderError::Upstream(message)) => {
                self.show_error(&message);
                Err(RenderError::Upstream(message))
            }
            Err(e) => Err(e),
        }
    }

    /// 请求本身失败（网络、解析等）
    pub fn apply_failure(&mut self, ticket: RequestTicket, message: &str) -> RenderOutcome {
        if !self.is_current(ticket) {
            warn!("忽略过期请求的失败: 请求序号 {}，最新序号 {}", ticket.0, self.latest_seq);
            return RenderOutcome::Discarded {
                latest_seq: self.latest_seq,
            };
        }

        self.show_error(message);
        RenderOutcome::Rendered { has_data: false }
    }

    /// 渲染结果并写入页面
    ///
    /// 容器缺失时放弃渲染，最近结果与页面均不变
    pub fn render(&mut self, result: SearchResult) -> RenderResult<RenderOutcome> {
        let fragment = render_search_result(&result);
        self.page.replace_content(RESULTS_CONTAINER, fragment.html)?;
        self.page.set_export_visible(fragment.has_data);

        info!(
            "渲染完成: 类型={} 关键词={:?} 有数据={}",
            result.type_label(),
            result.keyword,
            fragment.has_data
        );

        self.last_result = Some(result);
        Ok(RenderOutcome::Rendered {
            has_data: fragment.has_data,
        })
    }

    fn show_error(&mut self, message: &str) {
        warn!("搜索失败: {}", message);
        // 容器缺失已在 Page 中记录
        let _ = self.page.replace_content(RESULTS_CONTAINER, render_error_banner(message));
        self.page.set_export_visible(false);
        self.last_result = None;
    }

    /// 导出最近一次结果的 Markdown
    pub fn export_markdown(&self, today: NaiveDate, settings: &ReportSettings) -> RenderResult<String> {
        self.last_result
            .as_ref()
            .map(|result| render_markdown(result, today, settings))
            .ok_or(RenderError::NoResult)
    }

    pub fn last_result(&self) -> Option<&SearchResult> {
        self.last_result.as_ref()
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::html_renderer::NO_RESULTS_NOTICE;
    use crate::services::markdown_renderer::NO_DATA_LINE;
    use serde_json::json;

    fn response(value: serde_json::Value) -> SearchResponse {
        serde_json::from_value(value).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    fn company_response(code: &str) -> SearchResponse {
        response(json!({
            "search_type": "基金公司名称",
            "keyword": "华夏",
            "results": [
                { "code": code, "name": "测试ETF", "daily_avg_volume": 1.5, "fund_size": 10, "management_fee_rate": 0.5 }
            ]
        }))
    }

    #[test]
    fn test_render_stores_last_result() {
        let mut session = SearchSession::default();
        let ticket = session.begin_request();

        let outcome = session.apply_response(ticket, company_response("510050")).unwrap();
        assert_eq!(outcome, RenderOutcome::Rendered { has_data: true });
        assert!(session.page().export_visible());
        assert!(session.page().content(RESULTS_CONTAINER).unwrap().contains("510050"));

        let markdown = session.export_markdown(today(), &ReportSettings::default()).unwrap();
        assert!(markdown.contains("| 510050 |"));
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut session = SearchSession::default();
        let slow = session.begin_request();
        let fast = session.begin_request();

        session.apply_response(fast, company_response("159919")).unwrap();
        let outcome = session.apply_response(slow, company_response("510050")).unwrap();

        assert_eq!(outcome, RenderOutcome::Discarded { latest_seq: fast.seq() });
        let html = session.page().content(RESULTS_CONTAINER).unwrap();
        assert!(html.contains("159919"));
        assert!(!html.contains("510050"));

        let failure = session.apply_failure(slow, "timeout");
        assert_eq!(failure, RenderOutcome::Discarded { latest_seq: fast.seq() });
        assert!(session.page().export_visible());
    }

    #[test]
    fn test_empty_result_hides_export() {
        let mut session = SearchSession::default();
        let ticket = session.begin_request();
        let outcome = session
            .apply_response(ticket, response(json!({ "search_type": "其他", "results": [] })))
            .unwrap();

        assert_eq!(outcome, RenderOutcome::Rendered { has_data: false });
        assert!(!session.page().export_visible());
        assert!(session.page().content(RESULTS_CONTAINER).unwrap().contains(NO_RESULTS_NOTICE));

        let markdown = session.export_markdown(today(), &ReportSettings::default()).unwrap();
        assert!(markdown.contains(NO_DATA_LINE));
    }

    #[test]
    fn test_upstream_error_shows_banner() {
        let mut session = SearchSession::default();
        let first = session.begin_request();
        session.apply_response(first, company_response("510050")).unwrap();

        let second = session.begin_request();
        let result = session.apply_response(second, response(json!({ "error": "服务维护中" })));

        assert_eq!(result, Err(RenderError::Upstream("服务维护中".to_string())));
        assert!(session.page().content(RESULTS_CONTAINER).unwrap().contains("服务维护中"));
        assert!(!session.page().export_visible());
        assert_eq!(
            session.export_markdown(today(), &ReportSettings::default()),
            Err(RenderError::NoResult)
        );
    }

    #[test]
    fn test_missing_container_aborts() {
        let mut session = SearchSession::new(Page::with_containers(&[]));
        let ticket = session.begin_request();
        let result = session.apply_response(ticket, company_response("510050"));

        assert_eq!(result, Err(RenderError::MissingContainer(RESULTS_CONTAINER.to_string())));
        assert!(session.last_result().is_none());
        assert!(!session.page().export_visible());
    }
}
