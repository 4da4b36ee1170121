//! 规则模块：负责指纹库的加载与数据模型定义
pub mod model;
pub mod loader;

// 导出核心接口
pub use self::model::{
    Technology, RawApp, RawPatternField, CategoryRule, RawFingerprintDb, MAIN_KEY
};
pub use self::loader::RuleLoader;
