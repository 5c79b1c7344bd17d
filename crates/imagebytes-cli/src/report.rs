//! Text reports for headers and decoded frames.

use std::io::{self, Write};

use imagebytes_proto::{ArrayMetadata, ImageArray, ImageFrame, Number, narrow::ValueRange};

/// Write every header field, one per line.
pub fn write_header<W: Write>(out: &mut W, meta: &ArrayMetadata, payload_len: usize) -> io::Result<()> {
    writeln!(out, "version          {}", meta.version)?;
    writeln!(out, "error_number     {}", meta.error_number)?;
    writeln!(out, "client_txn       {}", meta.client_transaction_id)?;
    writeln!(out, "server_txn       {}", meta.server_transaction_id)?;
    writeln!(out, "data_start       {}", meta.data_start)?;
    writeln!(out, "logical_kind     {} ({})", meta.logical_kind, meta.logical_kind.to_code())?;
    writeln!(out, "wire_kind        {} ({})", meta.wire_kind, meta.wire_kind.to_code())?;
    writeln!(out, "rank             {}", meta.rank.to_i32())?;
    writeln!(out, "dims             {}", format_shape(&meta.shape()))?;
    writeln!(out, "payload_bytes    {payload_len}")
}

/// Write kind, shape and value range of a decoded frame.
pub fn write_frame<W: Write>(out: &mut W, frame: &ImageFrame) -> io::Result<()> {
    let meta = &frame.metadata;
    writeln!(out, "kind             {} (wire {})", meta.logical_kind, meta.wire_kind)?;
    writeln!(out, "shape            {}", format_shape(frame.array.shape()))?;
    writeln!(out, "elements         {}", frame.array.len())?;
    match value_range(&frame.array) {
        Some(range) => writeln!(out, "range            {range}"),
        None => writeln!(out, "range            (empty)"),
    }
}

/// Write a decoded remote error.
pub fn write_remote<W: Write>(out: &mut W, error_number: i32, message: &str) -> io::Result<()> {
    writeln!(out, "remote error {error_number}: {message}")
}

/// Smallest and largest element as `min..=max`, or `None` for an empty
/// array.
pub fn value_range(array: &ImageArray) -> Option<String> {
    if let Some(range) = ValueRange::scan(array.numbers()) {
        return Some(format!("{}..={}", range.min, range.max));
    }

    let (lo, hi) = array.numbers().fold(None, |acc: Option<(f64, f64)>, n| {
        let Number::Float(v) = n else { return acc };
        Some(acc.map_or((v, v), |(lo, hi)| (lo.min(v), hi.max(v))))
    })?;
    Some(format!("{lo}..={hi}"))
}

fn format_shape(shape: &[usize]) -> String {
    let dims: Vec<String> = shape.iter().map(ToString::to_string).collect();
    dims.join(" x ")
}
