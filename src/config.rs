//! 全局配置管理,存储所有可配置项

use std::path::PathBuf;

/// 默认User-Agent
pub const DEFAULT_USER_AGENT: &str = concat!("rsgowap/", env!("CARGO_PKG_VERSION"));

/// 全局配置
#[derive(Debug, Clone)]
pub struct GlobalConfig {
    // 指纹库文件路径（包含 apps / categories 两个顶层字段的JSON）
    pub fingerprint_path: PathBuf,
    // 超时配置（单位：秒）
    pub http_timeout: u64,
    // 请求使用的User-Agent
    pub user_agent: String,
    // 是否以JSON格式输出检测结果
    pub json_output: bool,
    // JSON是否格式化输出
    pub pretty: bool,
    // 是否启用详细日志
    pub verbose: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            fingerprint_path: PathBuf::from("app.json"),
            http_timeout: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            json_output: true,
            pretty: false,
            verbose: false,
        }
    }
}

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 获取默认配置
    pub fn get_default() -> GlobalConfig {
        GlobalConfig::default()
    }

    /// 自定义配置
    pub fn custom() -> CustomConfigBuilder {
        CustomConfigBuilder::new()
    }
}

/// 配置构建器（便于自定义配置）
#[derive(Debug, Clone, Default)]
pub struct CustomConfigBuilder {
    config: GlobalConfig,
}

impl CustomConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fingerprint_path(mut self, path: PathBuf) -> Self {
        self.config.fingerprint_path = path;
        self
    }

    pub fn http_timeout(mut self, timeout: u64) -> Self {
        self.config.http_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: String) -> Self {
        self.config.user_agent = user_agent;
        self
    }

    pub fn json_output(mut self, json_output: bool) -> Self {
        self.config.json_output = json_output;
        self
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.config.pretty = pretty;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    pub fn build(self) -> GlobalConfig {
        self.config
    }
}
