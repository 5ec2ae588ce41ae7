use anyhow::Result;
use clap::Parser;
use gocr::cli::{self, Cli, Target};
use gocr::{Gocr, OcrsClient};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();
    let opts = Cli::parse();
    match run(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(opts: &Cli) -> Result<()> {
    let target = opts.target();
    if let Target::File(file) = &target {
        if !cli::is_supported(file) {
            println!("OCR only works on .png files");
        }
    }

    let models_dir = match &opts.opts().models {
        Some(dir) => dir.clone(),
        None => OcrsClient::default_models_dir()?,
    };
    let client = OcrsClient::new(&models_dir)?;
    let mut gocr = Gocr::new(client, opts.output_dir());

    // the client is dropped when `gocr` goes out of scope, on errors too
    match target {
        Target::File(file) => gocr.convert_file(&file)?,
        Target::Convert(dir) => gocr.convert_dir(&dir)?,
    }
    Ok(())
}
