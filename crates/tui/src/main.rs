use anyhow::{Context, Result};

fn main() -> Result<()> {
    let settings = pipeline_ui_runtime_config::load().context("load settings")?;
    let watch = std::env::args().nth(1);
    pipeline_ui_tui::run(pipeline_ui_tui::RunOptions {
        settings,
        watch,
        log_file: None,
    })
}
