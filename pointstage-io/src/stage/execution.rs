//! Driving a reader stage into a filter

use super::{FixedPointTable, Stage, StreamFilter};
use pointstage_core::{Error, PointLayout, Result};
use tracing::debug;

/// Stream every point of `reader` through `filter`, holding at most one
/// table's worth of points in memory. Returns the number of points visited.
pub fn execute_streaming(
    reader: &mut dyn Stage,
    filter: &mut dyn StreamFilter,
    table: &mut FixedPointTable,
) -> Result<usize> {
    let name = reader.name().to_string();
    reader.prepare(table.layout_mut())?;
    filter.prepared(table.layout())?;

    let source = reader
        .as_streamable()
        .ok_or_else(|| Error::Stage(format!("Stage '{}' is not streamable", name)))?;

    let mut total = 0;
    loop {
        let count = table.fill(source)?;
        for i in 0..count {
            if let Some(point) = table.point(i) {
                filter.process_one(&point)?;
            }
        }
        total += count;
        debug!("{}: streamed chunk of {} points ({} total)", name, count, total);
        if count < table.capacity() {
            break;
        }
    }

    filter.done()?;
    Ok(total)
}

/// Run `reader` to completion, then hand each produced view to `filter`.
/// Returns the number of points visited.
pub fn execute_standard(reader: &mut dyn Stage, filter: &mut dyn StreamFilter) -> Result<usize> {
    let mut layout = PointLayout::new();
    reader.prepare(&mut layout)?;
    filter.prepared(&layout)?;

    let views = reader.execute(&layout)?;
    let mut total = 0;
    for view in &views {
        filter.run(view)?;
        total += view.len();
    }
    debug!("{}: executed {} views, {} points", reader.name(), views.len(), total);

    filter.done()?;
    Ok(total)
}
