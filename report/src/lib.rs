//! Length-prefixed binary dump of the terminal record set.
//!
//! Not on the hot path: every public entry point here returns a
//! `Result` so a caller can log and swallow a failure, matching the
//! `anyhow::Context` boundary style the teacher uses at its I/O edges
//! (`session/store.rs`'s persistence helpers) rather than threading a
//! domain error through.

use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use corelib::Request;

/// One decoded row: `(request_id, part_id, qty, status_name)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportRecord {
    pub request_id: String,
    pub part_id: String,
    pub qty: u32,
    pub status: String,
}

/// Writes `records` to `path`, truncating/creating it. The byte layout:
/// a 4-byte big-endian count, then per record a length-prefixed (2-byte
/// big-endian length) UTF-8 request id, length-prefixed part id, a
/// 4-byte big-endian qty, and a length-prefixed status name. No trailing
/// padding.
pub fn write_report_file(path: &Path, records: &[Request]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating report file at {}", path.display()))?;
    let mut writer = std::io::BufWriter::new(file);
    write_report(&mut writer, records)?;
    writer.flush().context("flushing report file")?;
    Ok(())
}

pub fn write_report(writer: &mut impl Write, records: &[Request]) -> Result<()> {
    writer.write_u32::<BigEndian>(records.len() as u32)?;
    for request in records {
        write_string(writer, &request.id)?;
        write_string(writer, &request.part.id)?;
        writer.write_u32::<BigEndian>(request.qty)?;
        write_string(writer, request.status.name())?;
    }
    Ok(())
}

pub fn read_report_file(path: &Path) -> Result<Vec<ReportRecord>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening report file at {}", path.display()))?;
    let mut reader = std::io::BufReader::new(file);
    read_report(&mut reader)
}

pub fn read_report(reader: &mut impl Read) -> Result<Vec<ReportRecord>> {
    let count = reader.read_u32::<BigEndian>().context("reading record count")?;
    let mut records = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let request_id = read_string(reader)?;
        let part_id = read_string(reader)?;
        let qty = reader.read_u32::<BigEndian>().context("reading qty")?;
        let status = read_string(reader)?;
        records.push(ReportRecord { request_id, part_id, qty, status });
    }
    Ok(records)
}

fn write_string(writer: &mut impl Write, s: &str) -> Result<()> {
    let bytes = s.as_bytes();
    anyhow::ensure!(bytes.len() <= u16::MAX as usize, "string exceeds 2-byte length prefix: {s}");
    writer.write_u16::<BigEndian>(bytes.len() as u16)?;
    writer.write_all(bytes)?;
    Ok(())
}

fn read_string(reader: &mut impl Read) -> Result<String> {
    let len = reader.read_u16::<BigEndian>().context("reading string length")?;
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf).context("reading string bytes")?;
    String::from_utf8(buf).context("decoding string as UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::{Part, RequestStatus};

    fn sample() -> Vec<Request> {
        let r1 = Request::create(Some(Part::new("P1001", "Bolt", "M6 hex bolt")), 5).unwrap();
        let r2 = Request::create(Some(Part::new("P2002", "Nut", "M6 hex nut")), 3).unwrap();
        vec![
            r1.with_status(RequestStatus::Completed),
            r2.with_status(RequestStatus::Failed),
        ]
    }

    #[test]
    fn round_trip_preserves_tuples() {
        let records = sample();
        let mut buf = Vec::new();
        write_report(&mut buf, &records).unwrap();

        let decoded = read_report(&mut buf.as_slice()).unwrap();
        assert_eq!(decoded.len(), records.len());
        for (d, r) in decoded.iter().zip(records.iter()) {
            assert_eq!(d.request_id, r.id);
            assert_eq!(d.part_id, r.part.id);
            assert_eq!(d.qty, r.qty);
            assert_eq!(d.status, r.status.name());
        }
    }

    #[test]
    fn empty_set_encodes_as_zero_count() {
        let mut buf = Vec::new();
        write_report(&mut buf, &[]).unwrap();
        assert_eq!(buf, 0u32.to_be_bytes());

        let decoded = read_report(&mut buf.as_slice()).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.bin");
        let records = sample();

        write_report_file(&path, &records).unwrap();
        let decoded = read_report_file(&path).unwrap();

        assert_eq!(decoded.len(), records.len());
    }
}
