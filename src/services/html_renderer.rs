//! HTML 片段渲染
//!
//! 将搜索结果渲染为写入结果容器的 HTML 片段：
//! - 跟踪指数名称搜索：每个指数一张卡片
//! - 基金公司 / 通用搜索：单张表格
//! - 基金代码搜索：指数简介横幅 + 合并后的单张表格
//!
//! 所有表格都由 `render_etf_table` 生成，末尾带一行合计。

use crate::models::{EtfRecord, IndexGroup, IndexProfile, SearchKind, SearchResult};
use crate::services::format::{
    format_count, format_fixed, format_signed_count, format_signed_fixed, html_escape, PLACEHOLDER,
};
use crate::services::normalizer::{merge_unique, sort_groups, NormalizedTable};

/// 无结果提示
pub const NO_RESULTS_NOTICE: &str = "未找到匹配的ETF产品";

/// 表格第三列展示的内容
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadColumn {
    /// 基金公司
    Manager,
    /// 跟踪指数代码
    IndexCode,
}

/// 表格列描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableColumns {
    pub lead: LeadColumn,
}

impl TableColumns {
    pub const MANAGER: Self = Self { lead: LeadColumn::Manager };
    pub const INDEX_CODE: Self = Self { lead: LeadColumn::IndexCode };

    fn lead_header(&self) -> &'static str {
        match self.lead {
            LeadColumn::Manager => "基金公司",
            LeadColumn::IndexCode => "跟踪指数",
        }
    }

    fn lead_value(&self, record: &EtfRecord) -> String {
        let value: &str = match self.lead {
            LeadColumn::Manager => record
                .manager_short_name
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(&record.manager_full_name),
            LeadColumn::IndexCode => &record.tracking_index_code,
        };
        if value.trim().is_empty() {
            PLACEHOLDER.to_string()
        } else {
            html_escape(value)
        }
    }
}

/// 渲染结果
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlFragment {
    pub html: String,
    /// 是否有可展示（可导出）的数据
    pub has_data: bool,
}

impl HtmlFragment {
    fn empty() -> Self {
        Self {
            html: render_notice(),
            has_data: false,
        }
    }
}

/// 按搜索类型渲染 HTML 片段
pub fn render_search_result(result: &SearchResult) -> HtmlFragment {
    match &result.kind {
        SearchKind::IndexName { index_groups } => render_index_groups(index_groups),
        SearchKind::Company { records } => render_single_table(records, TableColumns::INDEX_CODE),
        SearchKind::Generic { records } => render_single_table(records, TableColumns::MANAGER),
        SearchKind::Code {
            profile,
            records,
            related_records,
        } => render_code_search(profile, records, related_records),
    }
}

/// 上游返回错误时的提示横幅
pub fn render_error_banner(message: &str) -> String {
    format!(
        r#"<div class="alert alert-error">搜索失败：{}</div>"#,
        html_escape(message)
    )
}

fn render_notice() -> String {
    format!(r#"<div class="no-results">{}</div>"#, NO_RESULTS_NOTICE)
}

fn render_index_groups(groups: &[IndexGroup]) -> HtmlFragment {
    if groups.is_empty() {
        return HtmlFragment::empty();
    }

    let cards: String = sort_groups(groups)
        .into_iter()
        .map(render_index_card)
        .collect();

    HtmlFragment {
        html: format!(r#"<div class="index-groups">{}</div>"#, cards),
        has_data: true,
    }
}

fn render_index_card(group: &IndexGroup) -> String {
    let table = NormalizedTable::build(&group.records);

    format!(
        r#"<div class="index-card">
    <div class="index-card-header">
        <h3>{name} <span class="index-code">({code})</span></h3>
        <div class="index-meta">
            <span>总规模：{scale} 亿元</span>
            <span>ETF数量：{count}</span>
        </div>
    </div>
    {table}
</div>"#,
        name = html_escape(&group.index_name),
        code = html_escape(&group.index_code),
        scale = format_fixed(group.total_scale_yuan_100m),
        count = group.etf_count(),
        table = render_etf_table(&table, TableColumns::MANAGER),
    )
}

fn render_single_table(records: &[EtfRecord], columns: TableColumns) -> HtmlFragment {
    let table = NormalizedTable::build(records);
    if table.is_empty() {
        return HtmlFragment::empty();
    }

    HtmlFragment {
        html: render_etf_table(&table, columns),
        has_data: true,
    }
}

fn render_code_search(profile: &IndexProfile, records: &[EtfRecord], related: &[EtfRecord]) -> HtmlFragment {
    let table = NormalizedTable::build(merge_unique(records, related));
    if table.is_empty() {
        return HtmlFragment::empty();
    }

    let description = profile
        .index_description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .map(|d| format!("\n    <p>{}</p>", html_escape(d)))
        .unwrap_or_default();
    let etf_count = profile.etf_count.unwrap_or(table.summary.count as u64);

    let banner = format!(
        r#"<div class="index-intro">
    <h3>{name}（{code}）</h3>{description}
    <div class="index-meta">
        <span>总规模：{scale} 亿元</span>
        <span>ETF数量：{count}</span>
    </div>
</div>"#,
        name = html_escape(&profile.index_name),
        code = html_escape(&profile.index_code),
        description = description,
        scale = format_fixed(profile.total_scale_yuan_100m),
        count = etf_count,
    );

    HtmlFragment {
        html: format!("{}\n{}", banner, render_etf_table(&table, TableColumns::MANAGER)),
        has_data: true,
    }
}

fn emphasized(value: String, on: bool) -> String {
    if on {
        format!(r#"<td class="highlight">{}</td>"#, value)
    } else {
        format!("<td>{}</td>", value)
    }
}

/// 渲染 ETF 表格（含合计行）
pub fn render_etf_table(table: &NormalizedTable<'_>, columns: TableColumns) -> String {
    if table.is_empty() {
        return render_notice();
    }

    let highlights = &table.highlights;
    let rows: String = table
        .records
        .iter()
        .map(|record| {
            let code = record.code.as_str();
            let business = if !record.business_label.trim().is_empty() {
                html_escape(&record.business_label)
            } else if record.is_business_product {
                "是".to_string()
            } else {
                String::new()
            };

            format!(
                r#"<tr data-code="{code_attr}">
    {code_cell}
    <td>{name}</td>
    <td>{lead}</td>
    <td>{business}</td>
    {volume}
    {fee}
    {size}
    <td>{attention}</td>
    <td>{attention_delta}</td>
    <td>{holders}</td>
    <td>{holders_delta}</td>
    <td>{amount}</td>
    <td>{amount_delta}</td>
</tr>"#,
                code_attr = html_escape(code),
                code_cell = emphasized(html_escape(code), highlights.is_highlighted(code)),
                name = html_escape(&record.name),
                lead = columns.lead_value(record),
                business = business,
                volume = emphasized(format_fixed(record.daily_avg_volume), highlights.is_max_volume(code)),
                fee = emphasized(format_fixed(record.management_fee_rate_pct), highlights.is_min_fee(code)),
                size = emphasized(format_fixed(record.fund_size_yuan_100m), highlights.is_max_size(code)),
                attention = format_count(record.attention_count),
                attention_delta = format_signed_count(record.attention_weekly_delta),
                holders = format_count(record.holders_count),
                holders_delta = format_signed_count(record.holders_weekly_delta),
                amount = format_fixed(record.holding_amount_yuan_100m),
                amount_delta = format_signed_fixed(record.holding_amount_weekly_delta),
            )
        })
        .collect();

    let summary = &table.summary;
    let summary_row = format!(
        r#"<tr class="summary-row">
    <td colspan="3">合计</td>
    <td>{business}/{count}</td>
    <td>{volume}</td>
    <td>{avg_fee}</td>
    <td>{size}</td>
    <td>{attention}</td>
    <td>{attention_delta}</td>
    <td>{holders}</td>
    <td>{holders_delta}</td>
    <td>{amount}</td>
    <td>{amount_delta}</td>
</tr>"#,
        business = summary.business_count,
        count = summary.count,
        volume = format_fixed(Some(summary.total_volume)),
        avg_fee = format_fixed(Some(summary.avg_fee_rate_pct)),
        size = format_fixed(Some(summary.total_fund_size)),
        attention = format_count(Some(summary.total_attention)),
        attention_delta = format_signed_count(Some(summary.total_attention_delta)),
        holders = format_count(Some(summary.total_holders)),
        holders_delta = format_signed_count(Some(summary.total_holders_delta)),
        amount = format_fixed(Some(summary.total_holding_amount)),
        amount_delta = format_signed_fixed(Some(summary.total_holding_amount_delta)),
    );

    format!(
        r#"<table class="etf-table">
<thead>
<tr>
    <th>代码</th>
    <th>名称</th>
    <th>{lead}</th>
    <th>商务品</th>
    <th>日均成交额(亿元)</th>
    <th>管理费率(%)</th>
    <th>规模(亿元)</th>
    <th>关注人数</th>
    <th>关注周变化</th>
    <th>持有人数</th>
    <th>持有人周变化</th>
    <th>持有金额(亿元)</th>
    <th>持有金额周变化</th>
</tr>
</thead>
<tbody>
{rows}{summary_row}
</tbody>
</table>"#,
        lead = columns.lead_header(),
        rows = rows,
        summary_row = summary_row,
    )
}

/// 从渲染后的 HTML 中提取高亮的代码单元格
#[cfg(test)]
pub(crate) fn highlighted_codes(html: &str) -> Vec<String> {
    html.split("<tr data-code=\"")
        .skip(1)
        .filter_map(|row| {
            let code = row.split('"').next()?;
            let first_cell = row.split("<td").nth(1)?;
            first_cell
                .starts_with(r#" class="highlight">"#)
                .then(|| code.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn etf(code: &str, volume: f64, size: f64, fee: f64) -> EtfRecord {
        EtfRecord {
            code: code.to_string(),
            name: format!("{}ETF", code),
            manager_full_name: "华夏基金管理有限公司".to_string(),
            manager_short_name: Some("华夏".to_string()),
            tracking_index_code: "000300".to_string(),
            daily_avg_volume: Some(volume),
            fund_size_yuan_100m: Some(size),
            management_fee_rate_pct: Some(fee),
            ..Default::default()
        }
    }

    fn result(kind: SearchKind) -> SearchResult {
        SearchResult {
            keyword: Some("沪深300".to_string()),
            data_date: None,
            count: None,
            index_count: None,
            kind,
        }
    }

    #[test]
    fn test_empty_records_render_notice() {
        let fragment = render_search_result(&result(SearchKind::Generic { records: vec![] }));
        assert!(!fragment.has_data);
        assert!(fragment.html.contains(NO_RESULTS_NOTICE));
        assert!(!fragment.html.contains("<table"));

        let groups = render_search_result(&result(SearchKind::IndexName { index_groups: vec![] }));
        assert!(!groups.has_data);
        assert!(groups.html.contains(NO_RESULTS_NOTICE));
    }

    #[test]
    fn test_generic_table_sorted_with_summary() {
        let records = vec![
            etf("510050", 12.3, 300.0, 0.5),
            etf("510300", 20.1, 150.0, 0.5),
        ];
        let fragment = render_search_result(&result(SearchKind::Generic { records }));
        let html = fragment.html;

        assert!(fragment.has_data);
        assert!(html.find("510300").unwrap() < html.find("510050").unwrap());
        assert!(html.contains("<th>基金公司</th>"));
        assert!(html.contains("<td>华夏</td>"));
        assert!(html.contains("<td>0/2</td>"));
        assert!(html.contains("<td>32.40</td>"));
        assert!(html.contains("<td>0.50</td>"));
        assert_eq!(highlighted_codes(&html), vec!["510300", "510050"]);
    }

    #[test]
    fn test_company_search_shows_index_code() {
        let records = vec![etf("159919", 3.0, 20.0, 0.15)];
        let html = render_search_result(&result(SearchKind::Company { records })).html;
        assert!(html.contains("<th>跟踪指数</th>"));
        assert!(html.contains("<td>000300</td>"));
        assert!(!html.contains("<th>基金公司</th>"));

        let mut untracked = etf("159920", 1.0, 5.0, 0.5);
        untracked.tracking_index_code.clear();
        let html = render_search_result(&result(SearchKind::Company { records: vec![untracked] })).html;
        assert!(html.contains(&format!("<td>159920ETF</td>\n    <td>{}</td>", PLACEHOLDER)));
    }

    #[test]
    fn test_index_groups_sorted_by_scale() {
        let groups = vec![
            IndexGroup {
                index_code: "000905".to_string(),
                index_name: "中证500".to_string(),
                total_scale_yuan_100m: Some(100.0),
                records: vec![etf("510500", 5.0, 100.0, 0.5)],
                ..Default::default()
            },
            IndexGroup {
                index_code: "000300".to_string(),
                index_name: "沪深300".to_string(),
                total_scale_yuan_100m: Some(1000.0),
                etf_count: Some(2),
                records: vec![etf("510300", 20.0, 900.0, 0.5), etf("159919", 8.0, 100.0, 0.15)],
                ..Default::default()
            },
        ];
        let html = render_search_result(&result(SearchKind::IndexName { index_groups: groups })).html;

        assert!(html.find("沪深300").unwrap() < html.find("中证500").unwrap());
        assert!(html.contains("总规模：1000.00 亿元"));
        assert!(html.contains("ETF数量：2"));
        assert_eq!(html.matches("summary-row").count(), 2);
    }

    #[test]
    fn test_code_search_merges_related() {
        let kind = SearchKind::Code {
            profile: IndexProfile {
                index_code: "000300".to_string(),
                index_name: "沪深300".to_string(),
                index_description: Some("<b>沪深两市</b>".to_string()),
                total_scale_yuan_100m: Some(1000.0),
                etf_count: None,
            },
            records: vec![etf("510300", 20.0, 900.0, 0.5)],
            related_records: vec![etf("510300", 20.0, 900.0, 0.5), etf("159919", 8.0, 100.0, 0.15)],
        };
        let html = render_search_result(&result(kind)).html;

        assert!(html.contains("&lt;b&gt;沪深两市&lt;/b&gt;"));
        assert_eq!(html.matches("<tr data-code=\"510300\"").count(), 1);
        assert!(html.contains("<td>0/2</td>"));
        assert!(html.contains("<td>28.00</td>"));
        assert!(html.contains("<td>1000.00</td>"));
    }

    #[test]
    fn test_error_banner_escapes() {
        let banner = render_error_banner("<script>");
        assert!(banner.contains("&lt;script&gt;"));
    }
}
