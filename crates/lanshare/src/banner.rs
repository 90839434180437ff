//! 启动 / 退出提示

use lanshare_core::format_size;

pub struct StartupInfo<'a> {
    pub port: u16,
    pub network_ip: &'a str,
    pub serving_dir: &'a str,
    pub max_upload_size: u64,
}

pub fn print_started(info: &StartupInfo<'_>) {
    println!("\n🚀 File Sharing Server Started");
    println!("═══════════════════════════════");
    println!("➡  Local:   http://localhost:{}", info.port);
    println!("➡  Network: http://{}:{}", info.network_ip, info.port);
    println!("═══════════════════════════════");
    println!("📁 Serving files from: {}", info.serving_dir);
    println!("📤 Max upload size: {}", format_size(info.max_upload_size));
    println!("\nPress Ctrl+C to stop\n");
}

pub fn print_stopping() {
    println!("\n\n🛑 Shutting down server...");
}

pub fn print_stopped() {
    println!("✅ Server stopped gracefully");
}
