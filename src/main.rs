//! # 图片加边工具 — 命令行入口
//!
//! 本文件仅负责参数解析、日志初始化与结果落盘。
//! 业务逻辑在 `border` 模块中，详见 `lib.rs` 架构文档。
//!
//! 用法：
//!   image-border <input> [--x <pct>] [--y <pct>] [--out <file>]
//!   image-border --batch <dir> [--x <pct>] [--y <pct>] [--out <dir>]
//!   公共选项：[--config <settings.json>] [--profile quality|balanced|speed]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image_border::border::{BorderError, BorderServiceState, BorderedImage, ImageSource};
use image_border::error::AppError;
use image_border::settings;

const USAGE: &str = "用法:
  image-border <input> [--x <pct>] [--y <pct>] [--out <file>]
  image-border --batch <dir> [--x <pct>] [--y <pct>] [--out <dir>]
  公共选项: [--config <settings.json>] [--profile quality|balanced|speed]";

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    input: Option<PathBuf>,
    batch: Option<PathBuf>,
    x: Option<String>,
    y: Option<String>,
    out: Option<PathBuf>,
    config: Option<PathBuf>,
    profile: Option<String>,
}

fn parse_args<I>(args: I) -> Result<CliArgs, AppError>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let mut value_for = |flag: &str| {
            args.next()
                .ok_or_else(|| AppError::Usage(format!("{} 需要一个值", flag)))
        };

        match arg.as_str() {
            "--x" => parsed.x = Some(value_for("--x")?),
            "--y" => parsed.y = Some(value_for("--y")?),
            "--out" => parsed.out = Some(PathBuf::from(value_for("--out")?)),
            "--batch" => parsed.batch = Some(PathBuf::from(value_for("--batch")?)),
            "--config" => parsed.config = Some(PathBuf::from(value_for("--config")?)),
            "--profile" => parsed.profile = Some(value_for("--profile")?),
            flag if flag.starts_with("--") => {
                return Err(AppError::Usage(format!("未知参数：{}", flag)));
            }
            _ if parsed.input.is_none() => parsed.input = Some(PathBuf::from(&arg)),
            _ => return Err(AppError::Usage(format!("多余的输入参数：{}", arg))),
        }
    }

    match (&parsed.input, &parsed.batch) {
        (None, None) => Err(AppError::Usage("缺少输入文件或 --batch 目录".to_string())),
        (Some(_), Some(_)) => Err(AppError::Usage("输入文件与 --batch 不能同时使用".to_string())),
        _ => Ok(parsed),
    }
}

/// 输出文件名：`<stem>-bordered.<ext>`，扩展名取自检测到的格式。
fn output_path_for(input: &Path, out_dir: Option<&Path>, output: &BorderedImage) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".to_string());
    let file_name = format!("{}-bordered.{}", stem, output.format.extension());

    match out_dir.or_else(|| input.parent()) {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

async fn run_single(service: &BorderServiceState, args: &CliArgs, input: &Path) -> Result<(), AppError> {
    let output = service
        .process_params(
            ImageSource::FilePath(input.to_string_lossy().to_string()),
            args.x.clone(),
            args.y.clone(),
        )
        .await?;

    let target = match &args.out {
        Some(path) => path.clone(),
        None => output_path_for(input, None, &output),
    };
    std::fs::write(&target, &output.bytes)?;

    println!(
        "{} -> {} ({}x{}, {})",
        input.display(),
        target.display(),
        output.width,
        output.height,
        output.content_type()
    );
    Ok(())
}

async fn run_batch(service: Arc<BorderServiceState>, args: &CliArgs, dir: &Path) -> Result<(), AppError> {
    let mut inputs: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    inputs.sort();

    if let Some(out_dir) = &args.out {
        std::fs::create_dir_all(out_dir)?;
    }

    let mut tasks = Vec::with_capacity(inputs.len());
    for input in inputs {
        let service = Arc::clone(&service);
        let (x, y) = (args.x.clone(), args.y.clone());
        tasks.push(tokio::spawn(async move {
            let result = service
                .process_params(ImageSource::FilePath(input.to_string_lossy().to_string()), x, y)
                .await;
            (input, result)
        }));
    }

    let mut failed = 0usize;
    let total = tasks.len();
    for task in tasks {
        let (input, result) = task
            .await
            .map_err(|e| BorderError::Internal(format!("批处理任务异常退出：{}", e)))?;

        match result {
            Ok(output) => {
                let target = output_path_for(&input, args.out.as_deref(), &output);
                std::fs::write(&target, &output.bytes)?;
                println!("{} -> {}", input.display(), target.display());
            }
            Err(err) => {
                failed += 1;
                eprintln!("{}: [{}] {}", input.display(), err.code(), err);
            }
        }
    }

    log::info!("📦 批处理完成 - 成功: {} 失败: {}", total - failed, failed);
    if failed > 0 {
        return Err(AppError::Batch { failed, total });
    }
    Ok(())
}

async fn run(args: CliArgs) -> Result<(), AppError> {
    let config = settings::load_config(args.config.as_deref())?;
    let service = Arc::new(BorderServiceState::with_config(config)?);

    if let Some(profile) = &args.profile {
        service.set_encode_profile(profile)?;
    }

    match (&args.input, &args.batch) {
        (Some(input), _) => run_single(&service, &args, input).await,
        (None, Some(dir)) => run_batch(Arc::clone(&service), &args, dir).await,
        (None, None) => Err(AppError::Usage("缺少输入文件或 --batch 目录".to_string())),
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{}\n{}", err, USAGE);
            std::process::exit(err.exit_code());
        }
    };

    if let Err(err) = run(args).await {
        log::error!("{}", err);
        std::process::exit(err.exit_code());
    }
}
