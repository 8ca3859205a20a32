use std::io::{BufRead as _, Write as _};
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;
use tarseek::{file, BlockLimits, CompressionConfig, Mode};

mod cli;
use crate::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            log::error!("{error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mode = if cli.raw {
        Mode::Raw
    } else {
        file::mode_for_path(&cli.input)
    };

    let config = CompressionConfig {
        level: cli.level,
        workers: cli.threads,
        mode,
        limits: BlockLimits {
            min_block_size: cli.min_block_size.map(to_usize).transpose()?,
            max_block_size: cli.max_block_size.map(to_usize).transpose()?,
        },
        seek_table: !cli.no_seek_table,
        ..CompressionConfig::default()
    };
    config.validate()?;

    if !cli.input.exists() {
        anyhow::bail!("{}: file not found", cli.input.display());
    }

    let output = cli
        .output
        .unwrap_or_else(|| file::default_output_path(&cli.input));

    if !cli.force && output.exists() && !confirm_overwrite(&output)? {
        return Ok(());
    }

    log::debug!("compressing {} in {mode:?} mode", cli.input.display());

    let summary = file::compress_file(&cli.input, &output, config).with_context(|| {
        format!(
            "failed to compress {} into {}",
            cli.input.display(),
            output.display()
        )
    })?;

    log::info!(
        "{}: {} frames, {} -> {} bytes{}",
        output.display(),
        summary.frames,
        summary.decompressed_size,
        summary.compressed_size + summary.seek_table_size.unwrap_or(0),
        if summary.seek_table_size.is_some() {
            ""
        } else {
            " (no seek table)"
        }
    );

    Ok(())
}

fn to_usize(size: tarseek::size::ByteSize) -> anyhow::Result<usize> {
    usize::try_from(size.as_u64()).with_context(|| format!("block size {size} is too large"))
}

fn confirm_overwrite(output: &Path) -> anyhow::Result<bool> {
    eprint!("{} already exists. Overwrite? [y/N]: ", output.display());
    std::io::stderr().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;

    Ok(answer.trim() == "y")
}
