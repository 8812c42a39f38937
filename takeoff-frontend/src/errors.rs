use takeoff_engine::errors::EngineError;
use takeoff_host::HostError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("宿主文档不可用: {0}")]
    Host(#[from] HostError),
    #[error("报表生成失败: {0}")]
    Engine(#[from] EngineError),
}
