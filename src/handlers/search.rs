use actix_web::{web, HttpResponse, Result};
use crate::errors::RenderError;
use crate::models::{ApiResponse, MarkdownExport, PageContent, RenderView, SearchQuery, SearchResponse};
use crate::services::format::beijing_today;
use crate::services::page::RESULTS_CONTAINER;
use crate::services::search_session::{RenderOutcome, RequestTicket, SearchSession};
use crate::state::AppState;

fn render_view(session: &SearchSession, ticket: RequestTicket, outcome: RenderOutcome) -> RenderView {
    let result = session.last_result();
    RenderView {
        request_seq: ticket.seq(),
        search_type: result.map(|r| r.type_label().to_string()),
        keyword: result.and_then(|r| r.keyword.clone()),
        html: session.page().content(RESULTS_CONTAINER).unwrap_or_default().to_string(),
        export_visible: session.page().export_visible(),
        discarded: matches!(outcome, RenderOutcome::Discarded { .. }),
    }
}

fn render_failure(e: RenderError) -> HttpResponse {
    let response = ApiResponse::<RenderView>::error(e.to_string());
    match e {
        RenderError::Upstream(_) => HttpResponse::BadGateway().json(response),
        _ => HttpResponse::InternalServerError().json(response),
    }
}

/// 按关键词搜索并渲染到页面
pub async fn search(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse> {
    let keyword = query.keyword.trim();
    if keyword.is_empty() {
        let response = ApiResponse::<RenderView>::error("请输入搜索关键词");
        return Ok(HttpResponse::BadRequest().json(response));
    }

    let ticket = state.session.lock().await.begin_request();
    log::info!("开始搜索 #{}: {}", ticket.seq(), keyword);

    // 上游请求期间不持有会话锁
    let fetched = state.client.search(keyword).await;

    let mut session = state.session.lock().await;
    match fetched {
        Ok(body) => match session.apply_response(ticket, body) {
            Ok(outcome) => {
                let view = render_view(&session, ticket, outcome);
                Ok(HttpResponse::Ok().json(ApiResponse::success(view)))
            }
            Err(e) => Ok(render_failure(e)),
        },
        Err(e) => {
            log::error!("搜索请求失败 #{}: {}", ticket.seq(), e);
            let message = format!("搜索失败: {}", e);
            match session.apply_failure(ticket, &message) {
                RenderOutcome::Discarded { .. } => {
                    let view = render_view(&session, ticket, RenderOutcome::Discarded {
                        latest_seq: session.latest_seq(),
                    });
                    Ok(HttpResponse::Ok().json(ApiResponse::success(view)))
                }
                RenderOutcome::Rendered { .. } => {
                    let response = ApiResponse::<RenderView>::error(message);
                    Ok(HttpResponse::BadGateway().json(response))
                }
            }
        }
    }
}

/// 直接渲染调用方提供的上游响应
pub async fn render(
    state: web::Data<AppState>,
    body: web::Json<SearchResponse>,
) -> Result<HttpResponse> {
    let mut session = state.session.lock().await;
    let ticket = session.begin_request();

    match session.apply_response(ticket, body.into_inner()) {
        Ok(outcome) => {
            let view = render_view(&session, ticket, outcome);
            Ok(HttpResponse::Ok().json(ApiResponse::success(view)))
        }
        Err(e) => Ok(render_failure(e)),
    }
}

/// 导出最近一次结果的 Markdown
pub async fn export_markdown(state: web::Data<AppState>) -> Result<HttpResponse> {
    let session = state.session.lock().await;

    match session.export_markdown(beijing_today(), &state.report) {
        Ok(markdown) => {
            let export = MarkdownExport {
                keyword: session.last_result().and_then(|r| r.keyword.clone()),
                markdown,
            };
            Ok(HttpResponse::Ok().json(ApiResponse::success(export)))
        }
        Err(e) => {
            let response = ApiResponse::<MarkdownExport>::error(e.to_string());
            Ok(HttpResponse::NotFound().json(response))
        }
    }
}

/// 读取页面容器当前内容
pub async fn get_page_content(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let container_id = path.into_inner();
    let session = state.session.lock().await;

    match session.page().content(&container_id) {
        Some(html) => {
            let content = PageContent {
                container_id: container_id.clone(),
                html: html.to_string(),
            };
            Ok(HttpResponse::Ok().json(ApiResponse::success(content)))
        }
        None => {
            let error = RenderError::MissingContainer(container_id);
            let response = ApiResponse::<PageContent>::error(error.to_string());
            Ok(HttpResponse::NotFound().json(response))
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/search", web::get().to(search))
        .route("/render", web::post().to(render))
        .route("/export/markdown", web::get().to(export_markdown))
        .route("/page/{container_id}", web::get().to(get_page_content));
}
