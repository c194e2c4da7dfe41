use anyhow::Context;
use clap::Parser;
use log::{info, Level, Log, Metadata, Record};
use tokio::io::{AsyncBufReadExt, BufReader};

use logfwd_rs::cli::{parse_level, Args, Config};
use logfwd_rs::forwarder::Forwarder;

/// 同时输出到控制台和转发器
struct TeeLogger {
    console: env_logger::Logger,
    forwarder: Forwarder,
}

impl Log for TeeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.console.enabled(metadata) || self.forwarder.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if self.console.matches(record) {
            self.console.log(record);
        }
        self.forwarder.log(record);
    }

    fn flush(&self) {
        self.console.flush();
        self.forwarder.flush();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 解析命令行参数
    let args = Args::parse();
    let config = Config::load(&args).context("failed to load configuration")?;

    // 初始化控制台日志
    let console = env_logger::Builder::new()
        .filter_level(config.console_level()?)
        .build();

    let forward_level = parse_level(&config.forward_level)?;
    let line_level = parse_level(&config.line_level)?
        .to_level()
        .unwrap_or(Level::Info);
    let layout = config.layout.build()?;

    // 创建并启动转发器, 配置缺失时直接退出
    let mut forwarder = Forwarder::new(config.forwarder.clone())
        .with_layout(layout)
        .with_level(forward_level);
    forwarder.start()?;
    let state = forwarder.state();
    let stats = forwarder.stats();

    let max_level = console.filter().max(forward_level);
    log::set_boxed_logger(Box::new(TeeLogger { console, forwarder }))
        .context("a global logger is already installed")?;
    log::set_max_level(max_level);

    info!("Forwarder is {}, reading events from stdin", state);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.is_empty() {
            continue;
        }
        log::log!(target: &config.target, line_level, "{}", line);
    }

    log::logger().flush();

    let snapshot = stats.snapshot();
    info!(
        "Forwarded {} events ({} bytes), dropped {}",
        snapshot.published,
        snapshot.bytes_published,
        snapshot.dropped()
    );
    Ok(())
}
