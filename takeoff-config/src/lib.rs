use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 应用配置的根结构。
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub host: HostConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            report: ReportConfig::default(),
            host: HostConfig::default(),
        }
    }
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `TAKEOFF_CONFIG`，
    /// 否则寻找 `./config/default.toml`。若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os("TAKEOFF_CONFIG") {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 报表生成配置：目标布局、回退策略与插入游标。
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// 报表落位的布局名称，按名称精确匹配。
    #[serde(default = "ReportConfig::default_target_layout")]
    pub target_layout: String,
    /// 目标布局缺失时是否回退到第一个布局。关闭后缺失即报错。
    #[serde(default = "ReportConfig::default_fallback")]
    pub fallback_to_first_layout: bool,
    /// 标签两行之间是否插入换行。默认保持原样直接拼接。
    #[serde(default)]
    pub join_caption_lines: bool,
    #[serde(default)]
    pub cursor: CursorConfig,
}

impl ReportConfig {
    fn default_target_layout() -> String {
        "统计表".to_string()
    }

    fn default_fallback() -> bool {
        true
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            target_layout: Self::default_target_layout(),
            fallback_to_first_layout: Self::default_fallback(),
            join_caption_lines: false,
            cursor: CursorConfig::default(),
        }
    }
}

/// 报表插入游标的起点与水平步进。
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CursorConfig {
    #[serde(default = "CursorConfig::default_start_x")]
    pub start_x: f64,
    #[serde(default = "CursorConfig::default_start_y")]
    pub start_y: f64,
    #[serde(default = "CursorConfig::default_step")]
    pub step: f64,
}

impl CursorConfig {
    fn default_start_x() -> f64 {
        0.05
    }

    fn default_start_y() -> f64 {
        21.78
    }

    fn default_step() -> f64 {
        7.5
    }
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            start_x: Self::default_start_x(),
            start_y: Self::default_start_y(),
            step: Self::default_step(),
        }
    }
}

/// 宿主快照来源配置。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostConfig {
    /// 模型空间快照路径。缺省时由前端回退到内置示例文档。
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_preserve_the_original_layout_behaviour() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.report.target_layout, "统计表");
        assert!(cfg.report.fallback_to_first_layout);
        assert!(!cfg.report.join_caption_lines);
        assert!((cfg.report.cursor.start_x - 0.05).abs() < 1e-12);
        assert!((cfg.report.cursor.start_y - 21.78).abs() < 1e-12);
        assert!((cfg.report.cursor.step - 7.5).abs() < 1e-12);
        assert!(cfg.host.snapshot_path.is_none());
    }

    #[test]
    fn load_from_temp_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(
            file,
            r#"
            [logging]
            level = "debug"

            [report]
            target_layout = "Для вставки таблиц"
            fallback_to_first_layout = false
            join_caption_lines = true

            [report.cursor]
            start_x = 1.0
            start_y = 20.0
            step = 8.0

            [host]
            snapshot_path = "../snapshots/plan.json"
            "#
        )
        .unwrap();

        let cfg = AppConfig::from_file(file.path()).expect("load config");
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.report.target_layout, "Для вставки таблиц");
        assert!(!cfg.report.fallback_to_first_layout);
        assert!(cfg.report.join_caption_lines);
        assert!((cfg.report.cursor.start_x - 1.0).abs() < 1e-12);
        assert!((cfg.report.cursor.step - 8.0).abs() < 1e-12);
        assert_eq!(
            cfg.host
                .snapshot_path
                .as_deref()
                .map(|p| p.to_string_lossy().to_string()),
            Some("../snapshots/plan.json".to_string())
        );
    }

    #[test]
    fn partial_sections_fall_back_to_field_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(
            file,
            r#"
            [report]
            target_layout = "报表"
            "#
        )
        .unwrap();

        let cfg = AppConfig::from_file(file.path()).expect("load config");
        assert_eq!(cfg.report.target_layout, "报表");
        assert!(cfg.report.fallback_to_first_layout);
        assert!((cfg.report.cursor.step - 7.5).abs() < 1e-12);
        assert_eq!(cfg.logging.level, "info");
    }
}
