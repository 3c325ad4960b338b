//! Output formatting and logging utilities

use color_eyre::eyre::{Result, WrapErr};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::time::SystemTime as StdSystemTime;
use tracing::info;
use tracing_subscriber::{
    fmt::format::Writer, fmt::layer, fmt::time::FormatTime, layer::SubscriberExt,
    util::SubscriberInitExt, Registry,
};
use xctask::XcTask;

/// Wall-clock timestamps with seconds precision
struct SecondPrecisionTimer;

impl FormatTime for SecondPrecisionTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        let secs = StdSystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        write!(w, "{:02}:{:02}:{:02}", (secs / 3600) % 24, (secs / 60) % 60, secs % 60)
    }
}

/// Route logging to a file (no ANSI colors) or to stdout
pub fn setup_output(output_path: Option<&str>) -> Result<()> {
    match output_path {
        Some(path) => {
            let log = File::create(path)
                .wrap_err_with(|| format!("Could not create output file: {}", path))?;
            let file_layer = layer()
                .with_writer(log)
                .with_timer(SecondPrecisionTimer)
                .with_ansi(false);
            Registry::default().with(file_layer).init();
            info!("Output will be written to: {}", path);
        }
        None => {
            let stdout_layer = layer()
                .with_writer(std::io::stdout)
                .with_timer(SecondPrecisionTimer)
                .with_ansi(true);
            Registry::default().with(stdout_layer).init();
            info!("Output will be printed to stdout");
        }
    }
    Ok(())
}

/// One line per task: parent atom, points, basis functions and shells
pub fn write_task_table<W: Write>(writer: &mut W, tasks: &[XcTask]) -> Result<()> {
    writeln!(writer, "{:>6} {:>6} {:>6} {:>6} {:>12}  shells", "task", "atom", "npts", "nbe", "dist")?;
    for (i, task) in tasks.iter().enumerate() {
        writeln!(
            writer,
            "{:>6} {:>6} {:>6} {:>6} {:>12.6}  {:?}",
            i,
            task.parent_atom,
            task.npts(),
            task.nbe,
            task.dist_nearest,
            task.shell_list
        )?;
    }
    Ok(())
}
