//! Web server command.

use console::style;

use crate::cli::icons::Icon;
use crate::config::Config;
use crate::ocr::check_binary;

/// Start the web server.
pub async fn cmd_serve(config: &Config, bind: Option<&str>) -> anyhow::Result<()> {
    let (host, port) = match bind {
        Some(bind) => parse_bind_address(bind, &config.server.host, config.server.port),
        None => (config.server.host.clone(), config.server.port),
    };

    if !check_binary("pdftoppm") {
        println!(
            "{} pdftoppm not found, /convert will fail (install poppler-utils)",
            Icon::Warn
        );
    }

    println!(
        "{} Starting invoice-ocr server at http://{}:{}",
        Icon::Step,
        host,
        port
    );
    println!(
        "  {} OCR backend: {}, model: {}",
        Icon::Detail,
        style(&config.ocr.backend).bold(),
        style(&config.llm.model).bold()
    );
    println!("  Press Ctrl+C to stop");

    crate::server::serve(config, &host, port).await
}

/// Parse a bind address that can be:
/// - Just a port: "9000" -> default host, port 9000
/// - Just a host: "127.0.0.1" -> that host, default port
/// - Host and port: "127.0.0.1:9000"
fn parse_bind_address(bind: &str, default_host: &str, default_port: u16) -> (String, u16) {
    if let Ok(port) = bind.parse::<u16>() {
        return (default_host.to_string(), port);
    }

    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return (host.to_string(), port);
        }
    }

    (bind.to_string(), default_port)
}
