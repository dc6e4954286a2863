mod args;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use pagescan_io_rs::image_pipeline::{
    diagnostics, format_template, ImageIoError, Pipeline, PipelineConfig, Verbosity,
};
use pagescan_io_rs::logger;

use args::Args;

fn main() -> ExitCode {
    let args = Args::parse();
    logger::init(args.verbosity());

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<ImageIoError>() {
            Some(io_err) => diagnostics::report(io_err),
            None => {
                logger::error!("{:#}", err);
                ExitCode::FAILURE
            }
        },
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config = PipelineConfig::builder()
        .verbosity(args.verbosity())
        .max_dimension(args.max_dimension())
        .build();
    if let Some(template) = &args.debug_template {
        format_template(template, 1).context("invalid --debug-template")?;
    }
    let pipeline = Pipeline::new(config);

    logger::debug!("Configuration: {:?}", pipeline.config());

    let timings = pipeline.convert_file_with_timings(
        &args.input,
        &args.output,
        args.format.map(|f| f.pixel_format()),
        args.debug_template.as_deref(),
    )?;

    if pipeline.config().verbosity >= Verbosity::Normal {
        timings.log_summary();
    }
    Ok(())
}
