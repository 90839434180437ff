use anyhow::Result;
use clap::{Parser, Subcommand};
use xshell::{Shell, cmd};

#[derive(Parser)]
#[command(name = "xtask", about = "LanShare 开发任务自动化")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 构建 (release)
    Build,
    /// 运行服务器 (开发模式)
    Dev {
        /// 日志级别 (trace, debug, info, warn, error)
        #[arg(short, long, default_value = "debug")]
        log_level: String,
        /// 共享目录 (默认当前目录)
        #[arg(short, long)]
        dir: Option<String>,
        /// 监听端口
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
    /// 安装到 /usr/local/bin
    Install,
    /// 打包发布 (tar.gz)
    Dist,
    /// 运行测试
    Test,
    /// 运行测试并生成覆盖率报告
    Coverage,
    /// 清理构建产物
    Clean,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;

    // 确保在项目根目录执行
    let project_root = std::env::var("CARGO_MANIFEST_DIR")
        .map(std::path::PathBuf::from)
        .ok()
        .and_then(|p| p.parent().map(std::path::Path::to_path_buf))
        .map_or_else(std::env::current_dir, Ok)?;
    sh.change_dir(&project_root);

    match cli.command {
        Commands::Build => build(&sh)?,
        Commands::Dev {
            log_level,
            dir,
            port,
        } => dev(&sh, &log_level, dir, port)?,
        Commands::Install => install(&sh)?,
        Commands::Dist => dist(&sh)?,
        Commands::Test => test(&sh)?,
        Commands::Coverage => coverage(&sh)?,
        Commands::Clean => clean(&sh)?,
    }

    Ok(())
}

fn build(sh: &Shell) -> Result<()> {
    println!("🔨 构建 lanshare...");
    cmd!(sh, "cargo build --release -p lanshare").run()?;
    println!("✅ 构建完成");
    Ok(())
}

fn dev(sh: &Shell, log_level: &str, dir: Option<String>, port: u16) -> Result<()> {
    let dir = dir.unwrap_or_else(|| ".".to_string());
    let port = port.to_string();

    println!("🚀 启动开发模式服务器...");
    println!("   日志级别: {}", log_level);
    println!("   共享目录: {}", dir);
    println!();

    let rust_log = format!("{log_level},lanshare_core={log_level},tower_http={log_level}");
    cmd!(sh, "cargo run -p lanshare -- --dir {dir} --port {port}")
        .env("RUST_LOG", rust_log)
        .run()?;
    Ok(())
}

fn install(sh: &Shell) -> Result<()> {
    println!("📦 安装 lanshare...");

    build(sh)?;

    cmd!(sh, "sudo cp target/release/lanshare /usr/local/bin/").run()?;

    println!("✅ 安装完成");
    println!("   在要共享的目录中运行 'lanshare'");
    println!("   使用 'lanshare --help' 查看选项");
    Ok(())
}

fn dist(sh: &Shell) -> Result<()> {
    println!("📦 打包发布...");

    build(sh)?;

    let version = env!("CARGO_PKG_VERSION");
    let dist_name = format!(
        "lanshare-{}-{}-{}",
        version,
        std::env::consts::OS,
        std::env::consts::ARCH
    );

    cmd!(sh, "mkdir -p dist/{dist_name}").run()?;
    cmd!(sh, "cp target/release/lanshare dist/{dist_name}/").run()?;
    if sh.path_exists("README.md") {
        cmd!(sh, "cp README.md dist/{dist_name}/").run()?;
    }

    sh.change_dir("dist");
    cmd!(sh, "tar -czvf {dist_name}.tar.gz {dist_name}").run()?;

    println!("✅ 打包完成: dist/{}.tar.gz", dist_name);
    Ok(())
}

fn test(sh: &Shell) -> Result<()> {
    println!("🧪 运行测试...");
    cmd!(sh, "cargo test --workspace").run()?;
    println!("✅ 测试完成");
    Ok(())
}

fn coverage(sh: &Shell) -> Result<()> {
    println!("📊 运行测试覆盖率分析...");

    // 检查 cargo-tarpaulin 是否安装
    if cmd!(sh, "cargo tarpaulin --version").run().is_err() {
        println!("📦 安装 cargo-tarpaulin...");
        cmd!(sh, "cargo install cargo-tarpaulin").run()?;
    }

    println!("🔍 分析中...");
    cmd!(
        sh,
        "cargo tarpaulin --packages lanshare-core --out Html --output-dir target/coverage"
    )
    .run()?;

    println!("✅ 覆盖率报告已生成");
    println!("   HTML 报告: target/coverage/tarpaulin-report.html");
    Ok(())
}

fn clean(sh: &Shell) -> Result<()> {
    println!("🧹 清理构建产物...");
    cmd!(sh, "cargo clean").run()?;
    cmd!(sh, "rm -rf dist").run()?;
    println!("✅ 清理完成");
    Ok(())
}
