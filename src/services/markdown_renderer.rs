//! Markdown 报告渲染
//!
//! 结构与 HTML 视图一致，使用 Markdown 表格，高亮单元格以 `==…==` 包裹。
//! 渲染是纯函数：当天日期由调用方传入，排序只作用于引用副本，
//! 同一结果重复渲染得到完全相同的文本。

use chrono::NaiveDate;

use crate::config::ReportSettings;
use crate::models::{IndexGroup, IndexProfile, SearchKind, SearchResult};
use crate::services::format::{
    format_fixed, markdown_cell, report_date, simplify_manager, strip_exchange_suffix,
};
use crate::services::normalizer::{merge_unique, sort_groups, NormalizedTable};

/// 空表格时输出的文字
pub const NO_DATA_LINE: &str = "暂无数据";

/// 渲染完整 Markdown 文档
pub fn render_markdown(result: &SearchResult, today: NaiveDate, settings: &ReportSettings) -> String {
    let (title, description) = headline(result);

    let mut doc = String::new();
    doc.push_str(&front_matter(&title, &description, result.keyword.as_deref(), today, settings));
    doc.push_str(&format!("\n# {}\n\n{}\n\n", title, description));
    doc.push_str(&render_body(result, settings));
    doc.push_str("\n---\n\n");
    doc.push_str(&footer(result.data_date.as_deref(), today, settings));
    doc.push('\n');
    doc
}

fn yaml_string(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

fn front_matter(
    title: &str,
    description: &str,
    keyword: Option<&str>,
    today: NaiveDate,
    settings: &ReportSettings,
) -> String {
    let mut tags = vec![yaml_string(&settings.tag)];
    if let Some(keyword) = keyword.filter(|k| *k != settings.tag) {
        tags.push(yaml_string(keyword));
    }

    format!(
        "---\ntitle: {title}\ndescription: {description}\ntags: [{tags}]\ndate: {date}\nimage: {image}\n---\n",
        title = yaml_string(title),
        description = yaml_string(description),
        tags = tags.join(", "),
        date = today.format("%Y-%m-%d"),
        image = yaml_string(&settings.image_url),
    )
}

/// 标题与摘要，按搜索类型引用不同的数量字段
fn headline(result: &SearchResult) -> (String, String) {
    let keyword = result.keyword.as_deref().unwrap_or("ETF");

    match &result.kind {
        SearchKind::Code {
            profile,
            records,
            related_records,
        } => {
            let etf_count = profile
                .etf_count
                .unwrap_or(merge_unique(records, related_records).len() as u64);
            let index = index_label(&profile.index_name, &profile.index_code);
            (
                format!("{}ETF全对比：{}只产品一览", index, etf_count),
                format!(
                    "跟踪{}的{}只ETF成交额、规模与费率横向对比，帮你快速找到流动性最好、费率最低的产品。",
                    index, etf_count
                ),
            )
        }
        SearchKind::IndexName { index_groups } => {
            let index_count = result.index_count.unwrap_or(index_groups.len() as u64);
            let etf_total: u64 = index_groups.iter().map(IndexGroup::etf_count).sum();
            (
                format!("「{}」相关指数ETF对比：{}个指数、{}只ETF", keyword, index_count, etf_total),
                format!(
                    "与「{}」相关的{}个跟踪指数共{}只ETF，按指数分组对比成交额、规模与费率。",
                    keyword, index_count, etf_total
                ),
            )
        }
        SearchKind::Company { records } | SearchKind::Generic { records } => {
            let count = result.count.unwrap_or(records.len() as u64);
            (
                format!("「{}」ETF搜索结果：共{}只", keyword, count),
                format!("「{}」相关的{}只ETF成交额、规模与费率一览。", keyword, count),
            )
        }
    }
}

fn index_label(name: &str, code: &str) -> String {
    match (name.trim().is_empty(), code.trim().is_empty()) {
        (false, false) => format!("{}（{}）", name, code),
        (false, true) => name.to_string(),
        (true, false) => format!("指数{}", code),
        (true, true) => "该指数".to_string(),
    }
}

fn render_body(result: &SearchResult, settings: &ReportSettings) -> String {
    match &result.kind {
        SearchKind::IndexName { index_groups } => {
            if index_groups.is_empty() {
                return format!("{}\n", NO_DATA_LINE);
            }
            sort_groups(index_groups)
                .into_iter()
                .enumerate()
                .map(|(i, group)| {
                    let table = NormalizedTable::build(&group.records);
                    format!(
                        "## {}. {}\n\n{}\n\n{}\n\n",
                        i + 1,
                        index_label(&group.index_name, &group.index_code),
                        description_table(
                            group.total_scale_yuan_100m,
                            group.etf_count(),
                            &resolve_description(result, &group.index_name, &group.index_code, group.index_description.as_deref()),
                        ),
                        build_etf_table(&table, settings),
                    )
                })
                .collect()
        }
        SearchKind::Code {
            profile,
            records,
            related_records,
        } => {
            let table = NormalizedTable::build(merge_unique(records, related_records));
            render_code_section(result, profile, &table, settings)
        }
        SearchKind::Company { records } | SearchKind::Generic { records } => {
            let table = NormalizedTable::build(records);
            format!("## ETF列表\n\n{}\n\n", build_etf_table(&table, settings))
        }
    }
}

fn render_code_section(
    result: &SearchResult,
    profile: &IndexProfile,
    table: &NormalizedTable<'_>,
    settings: &ReportSettings,
) -> String {
    let etf_count = profile.etf_count.unwrap_or(table.summary.count as u64);
    format!(
        "## {}\n\n{}\n\n{}\n\n",
        index_label(&profile.index_name, &profile.index_code),
        description_table(
            profile.total_scale_yuan_100m,
            etf_count,
            &resolve_description(result, &profile.index_name, &profile.index_code, profile.index_description.as_deref()),
        ),
        build_etf_table(table, settings),
    )
}

/// 指数简介：优先使用给定简介，其次在结果中查找，最后生成通用描述
fn resolve_description(result: &SearchResult, name: &str, code: &str, explicit: Option<&str>) -> String {
    explicit
        .filter(|d| !d.trim().is_empty())
        .or_else(|| result.find_index_description(code))
        .map(str::to_string)
        .unwrap_or_else(|| fallback_index_description(name, code))
}

/// 通用指数描述
pub fn fallback_index_description(name: &str, code: &str) -> String {
    format!(
        "{}是该组ETF共同跟踪的基准指数，反映对应市场或板块的整体表现。",
        index_label(name, code)
    )
}

fn description_table(total_scale: Option<f64>, etf_count: u64, description: &str) -> String {
    format!(
        "| 总规模(亿元) | ETF数量 | 指数简介 |\n| --- | --- | --- |\n| {} | {} | {} |",
        format_fixed(total_scale),
        etf_count,
        markdown_cell(description),
    )
}

fn highlight(value: String, on: bool) -> String {
    if on {
        format!("=={}==", value)
    } else {
        value
    }
}

/// 生成 ETF 表格，空表返回 `暂无数据`
pub fn build_etf_table(table: &NormalizedTable<'_>, settings: &ReportSettings) -> String {
    if table.is_empty() {
        return NO_DATA_LINE.to_string();
    }

    let mut lines = vec![
        "| 代码 | 简称 | 基金公司 | 日均成交额(亿元) | 规模(亿元) | 费率(%) |".to_string(),
        "| --- | --- | --- | ---: | ---: | ---: |".to_string(),
    ];

    let highlights = &table.highlights;
    for record in &table.records {
        let code = record.code.as_str();
        let manager = simplify_manager(
            &record.manager_full_name,
            record.manager_short_name.as_deref(),
            &settings.manager_suffix,
        );
        lines.push(format!(
            "| {} | {} | {} | {} | {} | {} |",
            strip_exchange_suffix(code),
            markdown_cell(&record.name),
            markdown_cell(&manager),
            highlight(format_fixed(record.daily_avg_volume), highlights.is_max_volume(code)),
            highlight(format_fixed(record.fund_size_yuan_100m), highlights.is_max_size(code)),
            highlight(format_fixed(record.management_fee_rate_pct), highlights.is_min_fee(code)),
        ));
    }

    lines.join("\n")
}

fn footer(data_date: Option<&str>, today: NaiveDate, settings: &ReportSettings) -> String {
    let date = data_date
        .map(str::to_string)
        .unwrap_or_else(|| report_date(today));
    settings.disclaimer.replace("{date}", &date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EtfRecord;
    use crate::services::html_renderer::{highlighted_codes, render_search_result};
    use std::collections::BTreeSet;

    fn etf(code: &str, volume: f64, size: f64, fee: f64) -> EtfRecord {
        EtfRecord {
            code: code.to_string(),
            name: format!("{}ETF", code),
            manager_full_name: "易方达基金管理有限公司".to_string(),
            daily_avg_volume: Some(volume),
            fund_size_yuan_100m: Some(size),
            management_fee_rate_pct: Some(fee),
            ..Default::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    fn generic(records: Vec<EtfRecord>) -> SearchResult {
        SearchResult {
            keyword: Some("红利".to_string()),
            data_date: None,
            count: None,
            index_count: None,
            kind: SearchKind::Generic { records },
        }
    }

    /// 从 Markdown 表格中取出带高亮单元格的代码
    fn markdown_highlighted_codes(markdown: &str) -> Vec<String> {
        markdown
            .lines()
            .filter(|line| line.starts_with("| ") && line.contains("=="))
            .filter_map(|line| line.split('|').nth(1).map(|c| c.trim().to_string()))
            .collect()
    }

    #[test]
    fn test_empty_table_returns_no_data_line() {
        let empty: Vec<EtfRecord> = Vec::new();
        let table = NormalizedTable::build(&empty);
        assert_eq!(build_etf_table(&table, &ReportSettings::default()), NO_DATA_LINE);
    }

    #[test]
    fn test_front_matter_and_footer() {
        let settings = ReportSettings::default();
        let markdown = render_markdown(&generic(vec![etf("510880.SH", 3.0, 200.0, 0.5)]), today(), &settings);

        assert!(markdown.starts_with("---\ntitle: "));
        assert!(markdown.contains(&format!("tags: [\"{}\", \"红利\"]", settings.tag)));
        assert!(markdown.contains("date: 2024-06-03"));
        assert!(markdown.contains(&format!("image: \"{}\"", settings.image_url)));
        assert!(markdown.contains("共1只"));
        assert!(markdown.contains("| 510880 | 510880.SHETF | 易方达 | ==3.00== | ==200.00== | ==0.50== |"));
        assert!(markdown.contains("2024.06.03"));
    }

    #[test]
    fn test_footer_prefers_data_date() {
        let mut result = generic(vec![etf("510880", 3.0, 200.0, 0.5)]);
        result.data_date = Some("2024-05-31".to_string());
        let markdown = render_markdown(&result, today(), &ReportSettings::default());
        assert!(markdown.contains("2024-05-31"));
        assert!(!markdown.contains("2024.06.03"));
    }

    #[test]
    fn test_index_groups_numbered_in_scale_order() {
        let result = SearchResult {
            keyword: Some("中证".to_string()),
            data_date: None,
            count: None,
            index_count: Some(2),
            kind: SearchKind::IndexName {
                index_groups: vec![
                    IndexGroup {
                        index_code: "000905".to_string(),
                        index_name: "中证500".to_string(),
                        total_scale_yuan_100m: Some(50.0),
                        records: vec![etf("510500", 5.0, 50.0, 0.5)],
                        ..Default::default()
                    },
                    IndexGroup {
                        index_code: "000852".to_string(),
                        index_name: "中证1000".to_string(),
                        index_description: Some("小盘股代表".to_string()),
                        total_scale_yuan_100m: Some(80.0),
                        records: vec![etf("512100", 6.0, 80.0, 0.5)],
                        ..Default::default()
                    },
                ],
            },
        };
        let markdown = render_markdown(&result, today(), &ReportSettings::default());

        assert!(markdown.contains("## 1. 中证1000（000852）"));
        assert!(markdown.contains("## 2. 中证500（000905）"));
        assert!(markdown.contains("| 80.00 | 1 | 小盘股代表 |"));
        assert!(markdown.contains(&fallback_index_description("中证500", "000905")));
        assert!(markdown.contains("2个指数、2只ETF"));
    }

    #[test]
    fn test_code_search_description_lookup() {
        let result = SearchResult {
            keyword: Some("510300".to_string()),
            data_date: None,
            count: None,
            index_count: None,
            kind: SearchKind::Code {
                profile: IndexProfile {
                    index_code: "000300".to_string(),
                    index_name: "沪深300".to_string(),
                    index_description: None,
                    total_scale_yuan_100m: Some(1200.0),
                    etf_count: Some(2),
                },
                records: vec![etf("510300.SH", 20.0, 900.0, 0.5)],
                related_records: vec![etf("159919.SZ", 8.0, 300.0, 0.15)],
            },
        };
        let markdown = render_markdown(&result, today(), &ReportSettings::default());

        assert!(markdown.contains("沪深300（000300）ETF全对比：2只产品一览"));
        assert!(markdown.contains(&fallback_index_description("沪深300", "000300")));
        assert!(markdown.contains("| 510300 |"));
        assert!(markdown.contains("| 159919 |"));
    }

    #[test]
    fn test_render_is_idempotent() {
        let result = generic(vec![
            etf("A", 1.0, 5.0, 0.2),
            etf("B", 1.0, 6.0, 0.2),
            etf("C", 9.0, 1.0, 0.6),
        ]);
        let settings = ReportSettings::default();
        let first = render_markdown(&result, today(), &settings);
        let second = render_markdown(&result, today(), &settings);
        assert_eq!(first, second);

        let order: Vec<&str> = match &result.kind {
            SearchKind::Generic { records } => records.iter().map(|r| r.code.as_str()).collect(),
            _ => unreachable!(),
        };
        assert_eq!(order, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_markdown_and_html_agree_on_highlights() {
        let result = generic(vec![
            etf("510050", 12.3, 300.0, 0.5),
            etf("510300", 20.1, 150.0, 0.5),
            etf("159901", 2.0, 20.0, 0.6),
            etf("512000", 5.0, 60.0, 0.45),
        ]);

        let html_codes: BTreeSet<String> = highlighted_codes(&render_search_result(&result).html)
            .into_iter()
            .collect();
        let markdown = render_markdown(&result, today(), &ReportSettings::default());
        let markdown_codes: BTreeSet<String> = markdown_highlighted_codes(&markdown).into_iter().collect();

        assert_eq!(html_codes, markdown_codes);
        let expected: BTreeSet<String> = ["510050", "510300", "512000"].iter().map(|s| s.to_string()).collect();
        assert_eq!(html_codes, expected);
    }
}
