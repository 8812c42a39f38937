use std::env;
use std::path::PathBuf;

use takeoff_config::AppConfig;
use takeoff_core::document::{BlockDefinition, Document};
use takeoff_core::geometry::Point2;
use takeoff_host::{DocumentLoader, SnapshotFacade};
use tracing::info;

use crate::errors::FrontendError;

/// 文档来源，便于前端呈现加载信息。
#[derive(Debug, Clone)]
pub enum DocumentSource {
    Snapshot(PathBuf),
    Demo,
}

/// 统一封装加载后的文档与元信息。
#[derive(Debug)]
pub struct LoadedDocument {
    pub document: Document,
    pub source: DocumentSource,
}

/// 解析文档来源：环境变量 `TAKEOFF_SNAPSHOT` 优先，其次配置中的
/// `snapshot_path`，都未提供时回退到内置示例文档。
/// 显式指定的快照加载失败视为终止条件，不做静默回退。
pub fn load_document(config: &AppConfig) -> Result<LoadedDocument, FrontendError> {
    let snapshot_path = env::var_os("TAKEOFF_SNAPSHOT")
        .map(PathBuf::from)
        .or_else(|| config.host.snapshot_path.clone());

    if let Some(path) = snapshot_path {
        let loader = SnapshotFacade::new();
        let document = loader.load(&path)?;
        info!(path = %path.display(), "从快照加载文档成功");
        return Ok(LoadedDocument {
            document,
            source: DocumentSource::Snapshot(path),
        });
    }

    info!("未配置快照，使用内置示例文档");
    Ok(LoadedDocument {
        document: build_demo_document(),
        source: DocumentSource::Demo,
    })
}

/// 内置示例文档：覆盖四类统计实体与一个会被跳过的 `Other`，
/// 供快速验证与测试使用。
pub fn build_demo_document() -> Document {
    let mut doc = Document::with_name("示例平面图");

    for name in ["DOOR", "WINDOW", "*Model_Space"] {
        doc.add_block_definition(BlockDefinition {
            name: name.to_string(),
            base_point: Point2::new(0.0, 0.0),
        });
    }

    doc.add_block_reference("DOOR", Point2::new(1.0, 2.0), "ARCH");
    doc.add_block_reference("DOOR", Point2::new(6.0, 2.0), "ARCH");
    doc.add_block_reference("WINDOW", Point2::new(9.5, 2.0), "ARCH");
    doc.add_polyline(
        [Point2::new(0.0, 0.0), Point2::new(1.2345, 0.0)],
        false,
        "WALLS",
    );
    doc.add_polyline(
        [Point2::new(0.0, 1.0), Point2::new(2.0, 1.0)],
        false,
        "WALLS",
    );
    doc.add_text(Point2::new(0.5, 0.5), "轴线 A", 2.5, "ANNOT");
    doc.add_text(Point2::new(0.5, 1.5), "Scale 1:100", 2.5, "ANNOT");
    doc.add_hatch("SOLID", true, 3.75, "FILL");
    doc.add_other("AcDbCircle", "ARCH");

    doc.add_layout("Layout1");
    doc.add_layout("统计表");
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_document_covers_all_metric_kinds() {
        let doc = build_demo_document();
        assert_eq!(doc.entities().count(), 9);
        assert_eq!(doc.block_name_universe(), vec!["DOOR", "WINDOW"]);
        assert!(doc.layout_index_by_name("统计表").is_some());
        assert_eq!(
            doc.layer_name_universe(),
            vec!["0", "ANNOT", "ARCH", "FILL", "WALLS"]
        );
    }

    #[test]
    fn default_config_falls_back_to_demo() {
        // 默认配置未指定快照；环境变量在测试环境中同样未设置。
        if env::var_os("TAKEOFF_SNAPSHOT").is_some() {
            return;
        }
        let loaded = load_document(&AppConfig::default()).expect("demo load should succeed");
        assert!(matches!(loaded.source, DocumentSource::Demo));
        assert_eq!(loaded.document.name(), Some("示例平面图"));
    }
}
