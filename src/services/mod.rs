//! 业务逻辑服务模块
//!
//! 搜索结果的归一化、HTML/Markdown 渲染以及上游接口访问

pub mod format;            // 数值与文本格式化
pub mod normalizer;        // 排序、汇总与高亮选择
pub mod page;              // 页面容器模型
pub mod html_renderer;     // 页面 HTML 渲染
pub mod markdown_renderer; // Markdown 报告渲染
pub mod search_client;     // 上游搜索接口
pub mod search_session;    // 搜索会话
