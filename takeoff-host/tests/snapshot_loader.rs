use std::path::PathBuf;

use takeoff_core::document::Entity;
use takeoff_host::{DocumentLoader, HostError, SnapshotFacade};

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/data");
    path.push(name);
    path
}

#[test]
fn load_model_space_snapshot() {
    let loader = SnapshotFacade::new();
    let doc = loader
        .load(&fixture("model_space.json"))
        .expect("读取快照失败");

    assert_eq!(doc.name(), Some("станция-план.dwg"));
    assert_eq!(doc.entities().count(), 7);
    assert_eq!(doc.layouts().count(), 2);
    assert!(doc.layout_index_by_name("统计表").is_some());

    // 图层表完整（含默认图层 0），块全集排除 *Model_Space。
    assert_eq!(
        doc.layer_name_universe(),
        vec!["0", "ANNOT", "ARCH", "FILL", "WALLS"]
    );
    assert_eq!(doc.block_name_universe(), vec!["DOOR", "WINDOW"]);

    let block_names: Vec<&str> = doc
        .entities()
        .filter_map(|(_, entity)| match entity {
            Entity::BlockReference(reference) => Some(reference.name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(block_names, vec!["DOOR", "DOOR", "WINDOW"]);

    let text = doc
        .entities()
        .find_map(|(_, entity)| match entity {
            Entity::Text(text) => Some(text),
            _ => None,
        })
        .expect("快照中应有文字实体");
    assert_eq!(text.content, "Ось А");
    assert_eq!(text.char_count(), 5);
}

#[test]
fn unresolved_entities_degrade_to_other() {
    let loader = SnapshotFacade::new();
    let doc = loader
        .load(&fixture("unresolved_entities.json"))
        .expect("读取快照失败");

    // 两个未知类型 + 一个缺字段的 text，全部降级为 Other。
    let other_kinds: Vec<&str> = doc
        .entities()
        .filter_map(|(_, entity)| match entity {
            Entity::Other(other) => Some(other.type_name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(other_kinds, vec!["AcDbCircle", "AcDbSpline", "text"]);

    let hatch_count = doc
        .entities()
        .filter(|(_, entity)| matches!(entity, Entity::Hatch(_)))
        .count();
    assert_eq!(hatch_count, 1);
}

#[test]
fn snapshot_without_a_document_name_is_rejected() {
    let loader = SnapshotFacade::new();
    let err = loader
        .load(&fixture("nameless.json"))
        .expect_err("无文档名的快照应报错");
    assert!(matches!(err, HostError::NoDocument { .. }));
}

#[test]
fn missing_snapshot_file_is_a_read_error() {
    let loader = SnapshotFacade::new();
    let err = loader
        .load(&fixture("no_such_snapshot.json"))
        .expect_err("不存在的路径应报错");
    assert!(matches!(err, HostError::ReadError { .. }));
}
