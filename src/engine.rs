//! Runs plugins over whole pixel maps.
//!
//! The source map is only ever read; every call allocates one fresh
//! destination of the same size and fills each pixel exactly once.
use rayon::prelude::*;

use crate::{error::Result, plugin::Plugin, PixMap, Pixel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Execution {
    Sequential,
    /// Rows of the destination are split across the rayon thread pool.
    #[default]
    Parallel,
}

pub fn apply(source: &PixMap, plugin: &Plugin) -> Result<PixMap> {
    apply_with(source, plugin, Execution::default())
}

pub fn apply_with(source: &PixMap, plugin: &Plugin, execution: Execution) -> Result<PixMap> {
    let mut dest = PixMap::new(source.width(), source.height())?;
    let width = source.width();
    log::debug!(
        "Applying {} to {}x{} ({execution:?})",
        plugin.name(),
        width,
        source.height()
    );

    let fill_row = |(row, pixels): (usize, &mut [Pixel])| -> Result<()> {
        for (col, pixel) in pixels.iter_mut().enumerate() {
            *pixel = plugin.pixel(source, row, col)?;
        }
        Ok(())
    };
    match execution {
        Execution::Sequential => dest
            .pixels_mut()
            .chunks_mut(width)
            .enumerate()
            .try_for_each(fill_row)?,
        Execution::Parallel => dest
            .pixels_mut()
            .par_chunks_mut(width)
            .enumerate()
            .try_for_each(fill_row)?,
    }
    Ok(dest)
}

/// Applies `plugins` in order, feeding each output into the next filter.
/// Intermediate maps are dropped as soon as they have been consumed.
pub fn apply_all<'a, I>(source: &PixMap, plugins: I) -> Result<PixMap>
where
    I: IntoIterator<Item = &'a Plugin>,
{
    let mut current = source.clone();
    for plugin in plugins {
        current = apply(&current, plugin)?;
    }
    Ok(current)
}
