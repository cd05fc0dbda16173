//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置，缺失字段使用默认值

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// 上游搜索服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// 搜索服务地址
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// 搜索接口路径
    #[serde(default = "default_search_path")]
    pub search_path: String,
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Markdown 报告配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSettings {
    /// 固定标签
    #[serde(default = "default_tag")]
    pub tag: String,
    /// 配图地址
    #[serde(default = "default_image_url")]
    pub image_url: String,
    /// 免责声明模板，`{date}` 替换为数据日期
    #[serde(default = "default_disclaimer")]
    pub disclaimer: String,
    /// 基金公司名称截断标记
    #[serde(default = "default_manager_suffix")]
    pub manager_suffix: String,
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub report: ReportSettings,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_base_url() -> String { "http://127.0.0.1:5000".to_string() }
fn default_search_path() -> String { "/api/search".to_string() }
fn default_timeout() -> u64 { 30 }
fn default_connect_timeout() -> u64 { 10 }
fn default_log_level() -> String { "info".to_string() }
fn default_tag() -> String { "ETF".to_string() }
fn default_image_url() -> String { "https://images.unsplash.com/photo-1611974789855-9c2a0a7236a3".to_string() }
fn default_disclaimer() -> String {
    "数据截至{date}，来源于公开市场信息，仅供参考，不构成任何投资建议。".to_string()
}
fn default_manager_suffix() -> String { "基金".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            search_path: default_search_path(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            tag: default_tag(),
            image_url: default_image_url(),
            disclaimer: default_disclaimer(),
            manager_suffix: default_manager_suffix(),
        }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置，优先从文件，失败则使用默认值
    ///
    /// 环境变量 `UPSTREAM_BASE_URL` 覆盖上游地址
    pub fn load() -> Self {
        let mut config = Self::load_file().unwrap_or_default();

        if let Ok(base_url) = env::var("UPSTREAM_BASE_URL") {
            if !base_url.trim().is_empty() {
                config.upstream.base_url = base_url;
            }
        }

        config
    }

    fn load_file() -> Option<Self> {
        let config_paths = ["config.json", "config/config.json"];

        for path in config_paths {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(config) => {
                        log::info!("从 {} 加载配置成功", path);
                        return Some(config);
                    }
                    Err(e) => {
                        log::warn!("加载配置文件 {} 失败: {}", path, e);
                    }
                }
            }
        }

        log::info!("使用默认配置");
        None
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
