use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rsgowap::{ConfigManager, GlobalConfig, HttpFetcher, TechDetector, Technology};

/// 识别目标网站使用的技术栈
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// 目标URL，可重复指定
    #[arg(short, long = "url", required = true)]
    urls: Vec<String>,

    /// 指纹库文件（包含 apps / categories）
    #[arg(short, long, default_value = "app.json")]
    fingerprints: PathBuf,

    /// 请求超时（秒）
    #[arg(short, long, default_value_t = 30)]
    timeout: u64,

    /// 格式化JSON输出
    #[arg(long)]
    pretty: bool,

    /// 以纯文本输出
    #[arg(long, conflicts_with = "pretty")]
    text: bool,

    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn to_config(&self) -> GlobalConfig {
        ConfigManager::custom()
            .fingerprint_path(self.fingerprints.clone())
            .http_timeout(self.timeout)
            .json_output(!self.text)
            .pretty(self.pretty)
            .verbose(self.verbose)
            .build()
    }
}

#[derive(Serialize)]
struct UrlReport {
    url: String,
    technologies: Vec<Technology>,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = cli.to_config();

    let detector = TechDetector::from_config(&config)
        .await
        .with_context(|| format!("加载指纹库 {} 失败", config.fingerprint_path.display()))?;
    info!("指纹库加载完成，技术规则数：{}", detector.library().len());
    let fetcher = HttpFetcher::new(&config)?;

    let mut tasks = JoinSet::new();
    for (index, url) in cli.urls.iter().cloned().enumerate() {
        let detector = detector.clone();
        let fetcher = fetcher.clone();
        tasks.spawn(async move {
            let result = match fetcher.fetch(&url).await {
                Ok(data) => detector.analyze(&data),
                Err(e) => Err(e),
            };
            (index, url, result)
        });
    }

    let mut reports = Vec::with_capacity(cli.urls.len());
    while let Some(joined) = tasks.join_next().await {
        let (index, url, result) = joined.context("检测任务异常退出")?;
        match result {
            Ok(technologies) => reports.push((index, UrlReport { url, technologies })),
            Err(e) => error!("{} 检测失败：{}", url, e),
        }
    }
    reports.sort_by_key(|(index, _)| *index);

    for (_, report) in reports {
        print_report(&report, &config)?;
    }
    Ok(())
}

fn print_report(report: &UrlReport, config: &GlobalConfig) -> Result<()> {
    if !config.json_output {
        println!("url: {}", report.url);
        for tech in &report.technologies {
            println!("  {}", tech);
        }
        return Ok(());
    }

    let output = if config.pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    println!("{}", output);
    Ok(())
}
