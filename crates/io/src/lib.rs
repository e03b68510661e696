//! CSV marshaling for captured motion samples.
//!
//! Two writers share the rendering core: a plain per-sample format with three
//! decimal digits, and a session-tagged format with five. Batch rendering and
//! live write-through produce byte-identical lines for the same input.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use log::debug;
use model::MotionSample;
use motion_ingest_core::{SampleStream, SourceError};
use serde::{Deserialize, Serialize};

/// Rendering or persistence failure in the CSV sink.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to encode record: {0}")]
    Encode(String),

    #[error("write failed: {0}")]
    Write(#[from] std::io::Error),

    #[error("stream failed: {0}")]
    Stream(#[from] SourceError),
}

const LINE_END: &str = "\r\n";

fn fixed(v: f64, digits: usize) -> Result<String, SinkError> {
    if !v.is_finite() {
        return Err(SinkError::Encode(format!("non-finite value {v}")));
    }
    Ok(format!("{:.*}", digits, v))
}

/// Renders one sample as `t,x,y,z`, three decimal digits per field.
pub fn render_record(s: &MotionSample) -> Result<String, SinkError> {
    Ok(format!(
        "{},{},{},{}",
        fixed(s.t_s, 3)?,
        fixed(s.x, 3)?,
        fixed(s.y, 3)?,
        fixed(s.z, 3)?
    ))
}

/// Renders one sample as `tag,t,x,y,z`, five decimal digits per field.
/// A trailing comma on `tag` is not doubled.
pub fn render_tagged(tag: &str, s: &MotionSample) -> Result<String, SinkError> {
    let tag = tag.strip_suffix(',').unwrap_or(tag);
    Ok(format!(
        "{},{},{},{},{}",
        tag,
        fixed(s.t_s, 5)?,
        fixed(s.x, 5)?,
        fixed(s.y, 5)?,
        fixed(s.z, 5)?
    ))
}

/// Drains a stream into memory. Short supervised sessions only; the batch is
/// bounded by nothing but available memory.
pub fn collect(stream: &mut SampleStream) -> Result<Vec<MotionSample>, SourceError> {
    let mut out = Vec::new();
    while let Some(s) = stream.next()? {
        out.push(s);
    }
    Ok(out)
}

/// Streams tagged records into `w` as they arrive, one CRLF-terminated line
/// per sample. Returns the line count once the stream ends; a stream fault
/// or write failure propagates without retry.
pub fn write_through<W: Write>(
    stream: &mut SampleStream,
    w: &mut W,
    tag: &str,
) -> Result<usize, SinkError> {
    let mut lines = 0usize;
    while let Some(s) = stream.next()? {
        let line = render_tagged(tag, &s)?;
        w.write_all(line.as_bytes())?;
        w.write_all(LINE_END.as_bytes())?;
        lines += 1;
    }
    w.flush()?;
    debug!("wrote {lines} tagged records");
    Ok(lines)
}

/// Renders an in-memory batch through the same tagged writer as
/// `write_through`.
pub fn write_tagged_batch<W: Write>(
    samples: &[MotionSample],
    w: &mut W,
    tag: &str,
) -> Result<usize, SinkError> {
    for s in samples {
        let line = render_tagged(tag, s)?;
        w.write_all(line.as_bytes())?;
        w.write_all(LINE_END.as_bytes())?;
    }
    w.flush()?;
    Ok(samples.len())
}

#[derive(Serialize, Deserialize)]
struct CsvRow {
    t_s: f64,
    x: f64,
    y: f64,
    z: f64,
}

/// Plain per-sample file export: three decimal digits, CRLF, no header.
pub fn export_csv(samples: &[MotionSample], path: &Path) -> Result<()> {
    let mut w = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_path(path)?;
    for s in samples {
        w.write_record(&[
            fixed(s.t_s, 3)?,
            fixed(s.x, 3)?,
            fixed(s.y, 3)?,
            fixed(s.z, 3)?,
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Loads a plain export back. Headerless, four numeric fields per row.
pub fn import_csv(path: &Path) -> Result<Vec<MotionSample>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.deserialize() {
        let r: CsvRow = rec?;
        out.push(MotionSample::new(r.t_s, r.x, r.y, r.z));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use motion_ingest_core::stream_pair;

    #[test]
    fn test_render_record_three_digits() {
        let s = MotionSample::new(10.0, 1.0, 0.0, 0.0);
        assert_eq!(render_record(&s).unwrap(), "10.000,1.000,0.000,0.000");
    }

    #[test]
    fn test_render_tagged_five_digits() {
        let s = MotionSample::new(0.1, 0.0, 0.0, 0.0);
        assert_eq!(
            render_tagged("wN", &s).unwrap(),
            "wN,0.10000,0.00000,0.00000,0.00000"
        );
    }

    #[test]
    fn test_trailing_comma_tag_not_doubled() {
        let s = MotionSample::new(0.1, 0.0, 0.0, 0.0);
        assert_eq!(
            render_tagged("wN,", &s).unwrap(),
            render_tagged("wN", &s).unwrap()
        );
    }

    #[test]
    fn test_sign_preserved() {
        let s = MotionSample::new(0.5, -0.5, 0.0, -9.81);
        assert_eq!(
            render_tagged("w1", &s).unwrap(),
            "w1,0.50000,-0.50000,0.00000,-9.81000"
        );
    }

    #[test]
    fn test_non_finite_value_is_encode_error() {
        let s = MotionSample::new(f64::NAN, 0.0, 0.0, 0.0);
        assert!(matches!(render_record(&s), Err(SinkError::Encode(_))));
    }

    #[test]
    fn test_batch_and_streaming_parity() {
        let samples = vec![
            MotionSample::new(0.1, 0.0, 0.0, 0.0),
            MotionSample::new(0.2, 1.0, 0.0, 0.0),
            MotionSample::new(0.3, 0.0, 1.0, 0.0),
        ];

        let (feed, mut stream) = stream_pair(50.0);
        for s in &samples {
            feed.push(*s);
        }
        feed.close();
        let mut live = Vec::new();
        write_through(&mut stream, &mut live, "wN").unwrap();

        let (feed, mut stream) = stream_pair(50.0);
        for s in &samples {
            feed.push(*s);
        }
        feed.close();
        let batch = collect(&mut stream).unwrap();
        let mut rendered = Vec::new();
        write_tagged_batch(&batch, &mut rendered, "wN").unwrap();

        assert_eq!(live, rendered);
    }

    #[test]
    fn test_stream_fault_propagates_from_write_through() {
        let (feed, mut stream) = stream_pair(50.0);
        feed.fail(SourceError::Failed("sensor gone".into()));
        let mut out = Vec::new();
        assert!(matches!(
            write_through(&mut stream, &mut out, "w1"),
            Err(SinkError::Stream(_))
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn test_export_import_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.csv");
        let samples = vec![
            MotionSample::new(1.5, 0.125, -0.25, 9.75),
            MotionSample::new(1.52, 0.5, 0.0, 9.5),
        ];
        export_csv(&samples, &path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            raw,
            "1.500,0.125,-0.250,9.750\r\n1.520,0.500,0.000,9.500\r\n"
        );
        assert_eq!(import_csv(&path).unwrap(), samples);
    }
}
