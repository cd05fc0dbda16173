//! 渲染流程错误定义

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// 上游响应携带 error 字段
    #[error("搜索服务返回错误: {0}")]
    Upstream(String),

    /// 页面中不存在目标容器
    #[error("页面容器不存在: {0}")]
    MissingContainer(String),

    /// 尚无可导出的搜索结果
    #[error("暂无搜索结果可导出")]
    NoResult,
}

pub type RenderResult<T> = std::result::Result<T, RenderError>;
