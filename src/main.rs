mod api;
mod config;
mod crawler;
mod error;
mod fetcher;
mod token;
mod types;

use anyhow::{Context, Result};
use api::{AppState, ImagesParams};
use config::{ScraperConfig, ServerConfig};
use crawler::ScrapeEngine;
use indicatif::{ProgressBar, ProgressStyle};
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "serve" => run_server().await?,
            "search" => run_search(&args[2..]).await?,
            "--help" | "-h" => print_help(),
            _ => {
                println!("未知命令: {}", args[1]);
                print_help();
            }
        }
    } else {
        run_server().await?;
    }

    Ok(())
}

async fn run_server() -> Result<()> {
    let config = ScraperConfig::from_env()?;
    let server = ServerConfig::from_env()?;

    let state = AppState {
        engine: Arc::new(ScrapeEngine::new(&config)?),
        max_image_count: config.max_image_count,
    };
    let app = api::router(state);

    let addr: SocketAddr = tokio::net::lookup_host((server.host.as_str(), server.port))
        .await
        .with_context(|| format!("無法解析監聽位址 {}:{}", server.host, server.port))?
        .next()
        .with_context(|| format!("找不到可用的位址 {}:{}", server.host, server.port))?;

    tracing::info!("Server is running on http://{}:{}", server.host, server.port);
    tracing::info!(
        max_image_count = config.max_image_count,
        request_delay_ms = config.request_delay_ms,
        "⚙️  設定已載入"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("無法綁定 {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_search(args: &[String]) -> Result<()> {
    let config = ScraperConfig::from_env()?;

    let params = ImagesParams {
        q: args.first().cloned(),
        count: args.get(1).cloned(),
        safe: args.get(2).cloned(),
        offset: args.get(3).cloned(),
    };
    let request = match api::build_request(params, config.max_image_count) {
        Ok(request) => request,
        Err(_) => {
            println!("❌ 缺少搜尋關鍵字");
            print_help();
            return Ok(());
        }
    };

    let engine = ScrapeEngine::new(&config)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")?);
    spinner.set_message(format!("🔍 搜尋 \"{}\" ({} 張)", request.query, request.count));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let outcome = engine.scrape(&request).await;
    spinner.finish_and_clear();

    let outcome = outcome.context("搜尋失敗")?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(())
}

fn print_help() {
    println!("DuckDuckGo 圖片搜尋\n");
    println!("用法:");
    println!("  cargo run                                   # 啟動 API 伺服器");
    println!("  cargo run serve                             # 啟動 API 伺服器");
    println!("  cargo run search <關鍵字> [count] [safe] [offset]");
    println!("  cargo run --help                            # 顯示此幫助\n");
    println!("safe: 1 = 嚴格 (預設), 0 = 關閉, -1 = 中等\n");
    println!("API:");
    println!("  GET /images?q=<關鍵字>&count=30&safe=1&offset=0\n");
    println!("環境變數 (.env):");
    println!("  HOST, PORT                 # 監聽位址 (localhost:3000)");
    println!("  USER_AGENT                 # 送給 DuckDuckGo 的 User-Agent");
    println!("  REQUEST_DELAY_MS           # 每頁間隔 (500)");
    println!("  MAX_IMAGE_COUNT            # 單次最多圖片數 (200)");
    println!("  HTTP_TIMEOUT_SECS          # 請求超時 (30)");
    println!("  PROVIDER_BASE_URL          # DuckDuckGo 根網址");
    println!("  RUST_LOG                   # 日誌等級 (info)");
}
