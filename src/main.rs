//! ETF 搜索结果渲染服务
//!
//! 调用上游 ETF 搜索接口，将结果归一化后渲染为页面 HTML，
//! 并可导出为带 front matter 的 Markdown 报告

mod config;     // 配置加载
mod errors;     // 渲染错误定义
mod handlers;   // HTTP 请求处理器
mod models;     // 数据模型定义
mod services;   // 业务逻辑服务
mod state;      // 共享状态

use actix_web::{web, App, HttpServer, middleware::Logger};
use env_logger::Env;

use crate::config::AppConfig;
use crate::services::search_client::SearchClient;
use crate::state::AppState;

/// 应用程序入口
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = AppConfig::load();

    // 初始化日志系统，RUST_LOG 优先于配置文件
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));

    let client = SearchClient::new(&config.upstream).map_err(|e| {
        log::error!("初始化搜索客户端失败: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    log::info!("启动 ETF 搜索渲染服务，上游: {}", config.upstream.base_url);

    let state = web::Data::new(AppState::new(client, config.report.clone()));
    let bind_addr = config.bind_addr();

    // 创建并启动 HTTP 服务器
    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())  // 添加请求日志中间件
            .app_data(state.clone())
            .configure(handlers::config)  // 配置路由
    });

    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    log::info!("监听地址: {}", bind_addr);
    server.bind(bind_addr)?.run().await
}
