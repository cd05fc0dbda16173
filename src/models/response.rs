//! 通用 API 响应模型
//!
//! 所有接口统一返回 `ApiResponse` 信封，渲染类接口的数据体为 `RenderView`

use serde::{Deserialize, Serialize};
use chrono::Utc;
use chrono_tz::Asia::Shanghai;

/// 获取北京时间（UTC+8）
fn get_beijing_time() -> chrono::DateTime<chrono_tz::Tz> {
    Utc::now().with_timezone(&Shanghai)
}

/// 统一 API 响应结构
///
/// - success: 请求是否成功
/// - data: 响应数据（成功时有值）
/// - message: 响应消息
/// - timestamp: 响应时间戳（北京时间）
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: String,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self::success_with_message(data, "Success")
    }

    /// 创建带自定义消息的成功响应
    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
            timestamp: get_beijing_time().to_rfc3339(),
        }
    }

    /// 创建错误响应
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: message.into(),
            timestamp: get_beijing_time().to_rfc3339(),
        }
    }
}

/// 一次渲染后页面的状态
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RenderView {
    /// 请求序号
    pub request_seq: u64,
    /// 搜索类型标签
    pub search_type: Option<String>,
    pub keyword: Option<String>,
    /// 写入结果容器的 HTML 片段
    pub html: String,
    /// "导出 Markdown" 按钮是否可见
    pub export_visible: bool,
    /// 响应是否因过期被丢弃
    pub discarded: bool,
}

/// 搜索查询参数
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// 搜索关键词（指数名称、基金公司或基金代码）
    pub keyword: String,
}

/// Markdown 导出结果
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MarkdownExport {
    pub keyword: Option<String>,
    pub markdown: String,
}

/// 服务健康状态
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HealthStatus {
    pub status: String,
    /// 当前是否有可导出的搜索结果
    pub export_available: bool,
    /// 最近一次请求序号
    pub latest_seq: u64,
}

/// 页面容器内容
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PageContent {
    pub container_id: String,
    pub html: String,
}
