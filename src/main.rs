// ==========================================
// 批量导入引擎 - 命令行入口
// ==========================================
// 用法: bulk-import <config.json> <source-file>... [--db <db-path>]
// 输出: 每个文件一份 JSON 运行汇总（stdout）
// ==========================================

use anyhow::{bail, Context, Result};
use bulk_import::api::ImportApi;
use bulk_import::config::ImportRunConfig;
use bulk_import::db::get_default_db_path;

struct CliArgs {
    config_path: String,
    source_files: Vec<String>,
    db_path: String,
}

fn parse_args() -> Result<CliArgs> {
    let mut args = std::env::args().skip(1);
    let mut positional = Vec::new();
    let mut db_path = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => db_path = Some(args.next().context("--db 需要数据库路径")?),
            "-h" | "--help" => {
                bail!("用法: bulk-import <config.json> <source-file>... [--db <db-path>]")
            }
            _ => positional.push(arg),
        }
    }

    if positional.len() < 2 {
        bail!("用法: bulk-import <config.json> <source-file>... [--db <db-path>]");
    }
    let config_path = positional.remove(0);

    Ok(CliArgs {
        config_path,
        source_files: positional,
        db_path: db_path.unwrap_or_else(get_default_db_path),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    bulk_import::logging::init();

    let args = parse_args()?;

    tracing::info!("==================================================");
    tracing::info!("{} v{}", bulk_import::APP_NAME, bulk_import::VERSION);
    tracing::info!("使用数据库: {}", args.db_path);
    tracing::info!("==================================================");

    let config = ImportRunConfig::from_json_file(&args.config_path)
        .with_context(|| format!("读取配置失败: {}", args.config_path))?;
    let api = ImportApi::open(&args.db_path).context("数据库初始化失败")?;

    let results = api.import_files(config, &args.source_files).await?;

    let mut failed = 0;
    for (file, result) in args.source_files.iter().zip(results) {
        match result {
            Ok(summary) => println!("{}", serde_json::to_string_pretty(&summary)?),
            Err(message) => {
                failed += 1;
                eprintln!("{}: {}", file, message);
            }
        }
    }

    if failed > 0 {
        bail!("{} 个文件导入失败", failed);
    }
    Ok(())
}
