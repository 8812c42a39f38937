use takeoff_config::{AppConfig, ReportConfig};
use takeoff_core::document::Document;
use takeoff_core::geometry::Point2;
use takeoff_engine::aggregate::{
    block_counts, hatch_areas, polyline_lengths, text_char_counts, total, MetricResult,
};
use takeoff_engine::report::{
    emit_report, resolve_target_layout, ReportCursor, ReportSpec, ReportStyle,
};
use tracing::info;

use crate::errors::FrontendError;
use crate::loader::{load_document, DocumentSource};

/// CLI 统计入口：加载文档，依次完成四项统计并写入目标布局。
/// 严格串行：一项统计聚合并产出报表后才开始下一项；任何一份
/// 报表落位失败都会中止其余报表。
pub fn run(config: &AppConfig) -> Result<(), FrontendError> {
    let loaded = load_document(config)?;
    let mut document = loaded.document;

    match &loaded.source {
        DocumentSource::Snapshot(path) => {
            println!("已加载模型空间快照：{}", path.display());
        }
        DocumentSource::Demo => {
            println!("使用内置示例文档。");
        }
    }
    println!("当前文档：{}", document.name().unwrap_or("<未命名>"));

    let layer_count = document.layers().count();
    let entity_count = document.entities().count();
    let block_count = document.blocks().count();
    info!(layer_count, entity_count, block_count, "模型空间统计开始");

    generate_reports(&mut document, &config.report)?;

    println!("统计完成。");
    Ok(())
}

/// 依次聚合四项指标并把报表写入目标布局，游标逐份前移。
pub fn generate_reports(
    document: &mut Document,
    config: &ReportConfig,
) -> Result<(), FrontendError> {
    let block_universe = document.block_name_universe();
    let layer_universe = document.layer_name_universe();

    let style = ReportStyle {
        caption_separator: if config.join_caption_lines {
            "\n".to_string()
        } else {
            String::new()
        },
        ..ReportStyle::default()
    };
    let mut cursor = ReportCursor::new(
        Point2::new(config.cursor.start_x, config.cursor.start_y),
        config.cursor.step,
    );

    struct ReportJob<'a> {
        label: &'a str,
        spec: ReportSpec,
        universe: &'a [String],
        result: MetricResult,
    }

    let jobs = [
        ReportJob {
            label: "各类型块插入数量",
            spec: ReportSpec::new(
                "各类型块的",
                "插入数量统计",
                "块数量统计表",
                "块名称",
                "数量（个）",
            ),
            universe: &block_universe,
            result: block_counts(document),
        },
        ReportJob {
            label: "各图层多段线总长度",
            spec: ReportSpec::new(
                "全部多段线的总长度",
                "（按图层统计）",
                "多段线长度统计表",
                "图层名称",
                "长度",
            ),
            universe: &layer_universe,
            result: polyline_lengths(document),
        },
        ReportJob {
            label: "各图层文字字符总数",
            spec: ReportSpec::new(
                "全部单行文字的字符总数",
                "（按图层统计）",
                "文字字符数统计表",
                "图层名称",
                "字符数（个）",
            ),
            universe: &layer_universe,
            result: text_char_counts(document),
        },
        ReportJob {
            label: "各图层填充总面积",
            spec: ReportSpec::new(
                "全部填充的总面积",
                "（按图层统计）",
                "填充面积统计表",
                "图层名称",
                "面积",
            ),
            universe: &layer_universe,
            result: hatch_areas(document),
        },
    ];

    for job in jobs {
        println!(
            "{}（合计 {}）：{}",
            job.label,
            total(&job.result),
            format_result(&job.result)
        );
        let layout = resolve_target_layout(
            document,
            &config.target_layout,
            config.fallback_to_first_layout,
        )?;
        cursor = emit_report(layout, cursor, &style, &job.spec, job.universe, &job.result)?;
    }
    Ok(())
}

fn format_result(result: &MetricResult) -> String {
    if result.is_empty() {
        return "<无>".to_string();
    }
    let entries: Vec<String> = result
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    entries.join(", ")
}
