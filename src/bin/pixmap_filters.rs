use std::path::PathBuf;

use anyhow::{bail, Context};
use pixmap_filters::{engine, PixMap, Plugin};

const USAGE: &str = "usage: pixmap-filters [-v] -i <in.png> -o <out.png> [-b <out.bmp>] [filters...]";

struct Options {
    verbose: bool,
    input: PathBuf,
    output: PathBuf,
    bmp_output: Option<PathBuf>,
    filters: Vec<String>,
}

fn parse_options(args: Vec<String>) -> anyhow::Result<Options> {
    let mut verbose = false;
    let mut input = None;
    let mut output = None;
    let mut bmp_output = None;
    let mut args = args.into_iter().peekable();
    while let Some(flag) = args.next_if(|arg| arg.starts_with('-') && arg.len() == 2) {
        let mut value = || {
            args.next()
                .map(PathBuf::from)
                .with_context(|| format!("{flag} expects a path\n{USAGE}"))
        };
        match flag.as_str() {
            "-v" => verbose = true,
            "-i" => input = Some(value()?),
            "-o" => output = Some(value()?),
            "-b" => bmp_output = Some(value()?),
            _ => bail!("unknown option {flag}\n{USAGE}"),
        }
    }
    Ok(Options {
        verbose,
        input: input.with_context(|| format!("missing -i\n{USAGE}"))?,
        output: output.with_context(|| format!("missing -o\n{USAGE}"))?,
        bmp_output,
        filters: args.collect(),
    })
}

fn main() -> anyhow::Result<()> {
    let options = parse_options(std::env::args().skip(1).collect())?;
    let verbosity = if options.verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Error
    };
    pretty_env_logger::formatted_builder()
        .filter_level(verbosity)
        .init();

    let plugins = Plugin::parse_all(&options.filters).context("Failed to parse filters")?;
    let image = PixMap::read(&options.input)
        .with_context(|| format!("Failed to load {}", options.input.display()))?;
    log::info!(
        "Loaded {}x{} image, applying {} filter(s)",
        image.width(),
        image.height(),
        plugins.len()
    );
    let filtered = engine::apply_all(&image, &plugins).context("Failed to apply filters")?;

    filtered
        .write(&options.output)
        .with_context(|| format!("Failed to write {}", options.output.display()))?;
    if let Some(bmp_output) = &options.bmp_output {
        filtered
            .write_bmp16(bmp_output)
            .with_context(|| format!("Failed to write {}", bmp_output.display()))?;
    }
    Ok(())
}
