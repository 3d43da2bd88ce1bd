//! Local PDF rasterization command.

use std::path::Path;

use console::style;

use crate::cli::icons::Icon;
use crate::config::Config;
use crate::pdf::PdfRasterizer;

/// Rasterize a PDF, optionally writing `page-N.png` files into `out`.
pub async fn cmd_convert(config: &Config, pdf: &Path, out: Option<&Path>) -> anyhow::Result<()> {
    if !pdf.is_file() {
        anyhow::bail!("File not found: {}", pdf.display());
    }

    let rasterizer = PdfRasterizer::new().with_dpi(config.pdf.dpi);
    let dpi = rasterizer.dpi();
    let path = pdf.to_path_buf();
    let pages = tokio::task::spawn_blocking(move || rasterizer.rasterize(&path)).await??;

    println!(
        "{} Converted {} pages at {} DPI",
        Icon::Done,
        style(pages.len()).bold(),
        dpi
    );

    if let Some(out) = out {
        tokio::fs::create_dir_all(out).await?;
        for page in &pages {
            let dest = out.join(format!("page-{}.png", page.page));
            tokio::fs::write(&dest, &page.png).await?;
            println!("  {} {}", Icon::Detail, dest.display());
        }
    }

    Ok(())
}
