use crate::config::{Args, Config};
use crate::io::write_task_table;
use color_eyre::eyre::{eyre, Result, WrapErr};
use std::fs::File;
use tracing::info;
use xctask::archive::{save_tasks, DEFAULT_REFERENCE_RTOL};
use xctask::{LoadBalancer, Payload, ReferenceData};

/// Archive this rank's tasks and handle reference files, as requested.
pub fn run_archive_followups(lb: &LoadBalancer, args: &Args, config: &Config) -> Result<()> {
    let params = config.archive_params();

    if let Some(path) = args.archive.as_ref().or(params.output.as_ref()) {
        let keep = !args.omit_payload && params.keep_payload.unwrap_or(true);
        let payload = if keep { Payload::Keep } else { Payload::Omit };
        save_tasks(path, lb.get_tasks(), payload)
            .wrap_err_with(|| format!("Failed to write task archive: {}", path))?;
        info!("Wrote {} tasks to {} ({:?} payload)", lb.get_tasks().len(), path, payload);

        let table_path = format!("{}.txt", path);
        let mut table = File::create(&table_path)
            .wrap_err_with(|| format!("Failed to create task table: {}", table_path))?;
        write_task_table(&mut table, lb.get_tasks())?;
    }

    if let Some(path) = args.write_reference.as_ref().or(params.write_reference.as_ref()) {
        ReferenceData::new(lb.molmeta(), lb.global_tasks())
            .save_to_file(path)
            .wrap_err_with(|| format!("Failed to write reference: {}", path))?;
    }

    if let Some(path) = args.check_reference.as_ref().or(params.check_reference.as_ref()) {
        let stored = ReferenceData::load_from_file(path)
            .wrap_err_with(|| format!("Failed to read reference: {}", path))?;
        let rtol = params.reference_rtol.unwrap_or(DEFAULT_REFERENCE_RTOL);
        match stored.check(lb.molmeta(), lb.global_tasks(), rtol) {
            None => info!("Task list matches reference {}", path),
            Some(mismatch) => return Err(eyre!("Reference check against {} failed: {}", path, mismatch)),
        }
    }

    Ok(())
}
