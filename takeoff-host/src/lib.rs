//! 宿主侧模型空间快照的读取。
//!
//! 本系统不直接驱动宿主 CAD 程序，而是读取宿主导出的 JSON 快照：
//! 顶层包含文档名、图层表、块定义表、布局列表与实体列表。每条实体
//! 是 `{ kind, layer, data }` 三元组，`data` 按 `kind` 细化为具体
//! 变体；未知的 `kind`、或 `data` 无法按该 `kind` 解码的记录统一
//! 降级为 `Entity::Other`，扫描端随后静默跳过——与宿主运行时
//! 细化失败即忽略的语义保持一致。

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use takeoff_core::document::{BlockDefinition, Document, Entity, PolylineVertex};
use takeoff_core::geometry::Point2;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("读取快照文件 {path:?} 失败: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析快照文件 {path:?} 失败: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("快照 {path:?} 中没有打开的文档")]
    NoDocument { path: PathBuf },
}

pub trait DocumentLoader {
    fn load(&self, path: &Path) -> Result<Document, HostError>;
}

pub struct SnapshotFacade;

impl SnapshotFacade {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SnapshotFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLoader for SnapshotFacade {
    fn load(&self, path: &Path) -> Result<Document, HostError> {
        let data = fs::read_to_string(path).map_err(|source| HostError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot: Snapshot =
            serde_json::from_str(&data).map_err(|source| HostError::ParseError {
                path: path.to_path_buf(),
                source,
            })?;
        snapshot.into_document().ok_or_else(|| HostError::NoDocument {
            path: path.to_path_buf(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    layers: Vec<String>,
    #[serde(default)]
    blocks: Vec<SnapshotBlock>,
    #[serde(default)]
    layouts: Vec<String>,
    #[serde(default)]
    entities: Vec<SnapshotEntity>,
}

#[derive(Debug, Deserialize)]
struct SnapshotBlock {
    name: String,
    #[serde(default)]
    base_point: [f64; 2],
}

#[derive(Debug, Deserialize)]
struct SnapshotEntity {
    kind: String,
    layer: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct BlockReferenceData {
    name: String,
    #[serde(default)]
    insert: [f64; 2],
}

#[derive(Debug, Deserialize)]
struct PolylineData {
    vertices: Vec<SnapshotVertex>,
    #[serde(default)]
    is_closed: bool,
}

#[derive(Debug, Deserialize)]
struct SnapshotVertex {
    position: [f64; 2],
    #[serde(default)]
    bulge: f64,
}

#[derive(Debug, Deserialize)]
struct TextData {
    #[serde(default)]
    insert: [f64; 2],
    content: String,
    #[serde(default)]
    height: f64,
}

#[derive(Debug, Deserialize)]
struct HatchData {
    #[serde(default)]
    pattern_name: String,
    #[serde(default)]
    is_solid: bool,
    area: f64,
}

impl Snapshot {
    /// 快照未携带文档名时视为宿主没有打开的文档，返回 `None`。
    fn into_document(self) -> Option<Document> {
        let mut document = Document::with_name(self.name?);
        for layer in &self.layers {
            document.ensure_layer(layer);
        }
        for block in self.blocks {
            document.add_block_definition(BlockDefinition {
                name: block.name,
                base_point: Point2::new(block.base_point[0], block.base_point[1]),
            });
        }
        for layout in self.layouts {
            document.add_layout(layout);
        }
        for entity in self.entities {
            document.add_entity(convert_entity(entity));
        }
        Some(document)
    }
}

/// 逐条细化快照实体。解码失败不报错，降级为 `Other` 并留类型名。
fn convert_entity(entity: SnapshotEntity) -> Entity {
    let SnapshotEntity { kind, layer, data } = entity;
    let converted = match kind.as_str() {
        "block_reference" => serde_json::from_value::<BlockReferenceData>(data)
            .ok()
            .map(|detail| {
                Entity::BlockReference(takeoff_core::document::BlockReference {
                    name: detail.name,
                    insert: Point2::new(detail.insert[0], detail.insert[1]),
                    layer: layer.clone(),
                })
            }),
        "polyline" => serde_json::from_value::<PolylineData>(data)
            .ok()
            .map(|detail| {
                Entity::Polyline(takeoff_core::document::Polyline {
                    vertices: detail
                        .vertices
                        .into_iter()
                        .map(|vertex| {
                            PolylineVertex::with_bulge(
                                Point2::new(vertex.position[0], vertex.position[1]),
                                vertex.bulge,
                            )
                        })
                        .collect(),
                    is_closed: detail.is_closed,
                    layer: layer.clone(),
                })
            }),
        "text" => serde_json::from_value::<TextData>(data)
            .ok()
            .map(|detail| {
                Entity::Text(takeoff_core::document::Text {
                    insert: Point2::new(detail.insert[0], detail.insert[1]),
                    content: detail.content,
                    height: detail.height,
                    layer: layer.clone(),
                })
            }),
        "hatch" => serde_json::from_value::<HatchData>(data)
            .ok()
            .map(|detail| {
                Entity::Hatch(takeoff_core::document::Hatch {
                    pattern_name: detail.pattern_name,
                    is_solid: detail.is_solid,
                    area: detail.area,
                    layer: layer.clone(),
                })
            }),
        _ => None,
    };
    match converted {
        Some(entity) => entity,
        None => {
            debug!(kind = %kind, layer = %layer, "无法细化的快照实体，降级为 Other");
            Entity::Other(takeoff_core::document::OtherEntity {
                type_name: kind,
                layer,
            })
        }
    }
}
