//! 页面模型
//!
//! 代替浏览器 DOM：按固定 ID 注册的容器，以及"导出 Markdown"按钮的可见性

use std::collections::HashMap;

use log::error;

use crate::errors::{RenderError, RenderResult};

/// 搜索结果容器 ID
pub const RESULTS_CONTAINER: &str = "searchResults";

#[derive(Debug, Clone)]
pub struct Page {
    containers: HashMap<String, String>,
    export_visible: bool,
}

impl Page {
    /// 创建只包含指定容器的页面
    pub fn with_containers(ids: &[&str]) -> Self {
        Self {
            containers: ids.iter().map(|id| (id.to_string(), String::new())).collect(),
            export_visible: false,
        }
    }

    /// 替换容器内容
    ///
    /// 容器不存在时记录日志并返回错误，页面保持不变
    pub fn replace_content(&mut self, id: &str, html: String) -> RenderResult<()> {
        match self.containers.get_mut(id) {
            Some(slot) => {
                *slot = html;
                Ok(())
            }
            None => {
                error!("页面容器 #{} 不存在，放弃本次渲染", id);
                Err(RenderError::MissingContainer(id.to_string()))
            }
        }
    }

    pub fn content(&self, id: &str) -> Option<&str> {
        self.containers.get(id).map(String::as_str)
    }

    pub fn set_export_visible(&mut self, visible: bool) {
        self.export_visible = visible;
    }

    pub fn export_visible(&self) -> bool {
        self.export_visible
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::with_containers(&[RESULTS_CONTAINER])
    }
}
