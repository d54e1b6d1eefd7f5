use anyhow::Context;
use pixmap_filters::{engine, plugin::IDENTITY_KERNEL, Execution, PixMap, Plugin};
use std::{
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

const SHARPEN: [[i32; 3]; 3] = [[0, -1, 0], [-1, 5, -1], [0, -1, 0]];
const EDGES: [[i32; 3]; 3] = [[-1, -1, -1], [-1, 8, -1], [-1, -1, -1]];
const BOX_BLUR: [[i32; 3]; 3] = [[1, 1, 1], [1, 1, 1], [1, 1, 1]];

fn filters() -> [(&'static str, Plugin); 7] {
    [
        ("identity", Plugin::convolution(IDENTITY_KERNEL)),
        ("rotate-30", Plugin::rotate(30.0)),
        ("sharpen", Plugin::convolution(SHARPEN)),
        ("edges", Plugin::convolution(EDGES)),
        ("blur", Plugin::convolution(BOX_BLUR)),
        ("flip-h", Plugin::FlipHorizontal),
        ("flip-v", Plugin::FlipVertical),
    ]
}

fn png_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension() == Some(OsStr::new("png")))
        .collect();
    files.sort();
    Ok(files)
}

fn time_ms<T>(f: impl FnOnce() -> T) -> (T, f64) {
    let start = Instant::now();
    let result = f();
    (result, start.elapsed().as_secs_f64() * 1000.0)
}

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let input_dir = PathBuf::from(args.next().unwrap_or_else(|| "tests/filters".to_owned()));
    let output_dir = PathBuf::from(args.next().unwrap_or_else(|| "benchmark".to_owned()));
    pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .init();
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let mut results = Vec::new();
    for path in png_files(&input_dir)? {
        let Some(stem) = path.file_stem().and_then(OsStr::to_str) else {
            continue;
        };
        let (image, decode_ms) = time_ms(|| PixMap::read(&path));
        let image = match image {
            Ok(image) => image,
            Err(err) => {
                log::warn!("Skipping {}: {err}", path.display());
                results.push(serde_json::json!({ "image": stem, "error": err.to_string() }));
                continue;
            }
        };

        let mut timings = Vec::new();
        for (name, plugin) in filters() {
            let (sequential, sequential_ms) =
                time_ms(|| engine::apply_with(&image, &plugin, Execution::Sequential));
            let (parallel, parallel_ms) =
                time_ms(|| engine::apply_with(&image, &plugin, Execution::Parallel));
            let (sequential, parallel) = (sequential?, parallel?);
            anyhow::ensure!(
                sequential == parallel,
                "{name} differs between sequential and parallel runs on {stem}"
            );
            parallel
                .write(output_dir.join(format!("{stem}-{name}.png")))
                .with_context(|| format!("Failed to write {name} output for {stem}"))?;
            timings.push(serde_json::json!({
                "filter": name,
                "sequential_ms": sequential_ms,
                "parallel_ms": parallel_ms,
            }));
        }
        log::info!("Benchmarked {stem}");
        results.push(serde_json::json!({
            "image": stem,
            "width": image.width(),
            "height": image.height(),
            "decode_ms": decode_ms,
            "filters": timings,
        }));
    }

    let now = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Iso8601::DEFAULT)?;
    let report = serde_json::json!({
        "date": now,
        "threads": rayon::current_num_threads(),
        "results": results,
    });
    fs::write(output_dir.join("bench_results.json"), report.to_string())?;
    Ok(())
}
