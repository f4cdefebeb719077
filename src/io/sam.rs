use anyhow::Result;
use std::io::Write;

use crate::align::{Alignment, ReadAlignment};
use crate::io::fastq::FastqRecord;

const FLAG_UNMAPPED: u16 = 4;

/// Minimal SAM emitter for single-reference, single-end output.
pub struct SamWriter<W: Write> {
    out: W,
    rname: String,
}

impl<W: Write> SamWriter<W> {
    pub fn new(out: W, rname: &str) -> Self {
        Self { out, rname: rname.to_string() }
    }

    pub fn write_header(&mut self, ref_len: usize, command_line: &str) -> Result<()> {
        writeln!(self.out, "@HD\tVN:1.6\tSO:unsorted")?;
        writeln!(self.out, "@SQ\tSN:{}\tLN:{}", self.rname, ref_len)?;
        writeln!(
            self.out,
            "@PG\tID:{}\tPN:{}\tVN:{}\tCL:{}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            command_line
        )?;
        Ok(())
    }

    pub fn write_record(&mut self, rec: &FastqRecord, result: &ReadAlignment) -> Result<()> {
        let seq = if rec.seq.is_empty() { "*".into() } else { String::from_utf8_lossy(&rec.seq) };
        let qual = if rec.qual.is_empty() { "*".into() } else { String::from_utf8_lossy(&rec.qual) };
        match result {
            ReadAlignment::Aligned(Alignment { ref_start, score, ops, nm, mapq }) => {
                // AS 取代价的相反数，保持 SAM 里 "越大越好" 的约定
                writeln!(
                    self.out,
                    "{}\t0\t{}\t{}\t{}\t{}\t*\t0\t0\t{}\t{}\tNM:i:{}\tAS:i:{}",
                    rec.id,
                    self.rname,
                    ref_start + 1,
                    mapq,
                    ops,
                    seq,
                    qual,
                    nm,
                    -score
                )?;
            }
            ReadAlignment::Unaligned => {
                writeln!(self.out, "{}\t{}\t*\t0\t0\t*\t*\t0\t0\t{}\t{}", rec.id, FLAG_UNMAPPED, seq, qual)?;
            }
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::EditOps;

    fn record(id: &str, seq: &[u8]) -> FastqRecord {
        FastqRecord { id: id.into(), desc: None, seq: seq.to_vec(), qual: vec![b'I'; seq.len()] }
    }

    #[test]
    fn writes_aligned_and_unaligned() {
        let mut w = SamWriter::new(Vec::new(), "chrT");
        w.write_header(7, "bwalign align").unwrap();
        let aln = Alignment { ref_start: 4, score: 2, ops: "3M".parse::<EditOps>().unwrap(), nm: 1, mapq: 37 };
        w.write_record(&record("r1", b"ACA"), &ReadAlignment::Aligned(aln)).unwrap();
        w.write_record(&record("r2", b"GGG"), &ReadAlignment::Unaligned).unwrap();
        let text = String::from_utf8(w.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "@SQ\tSN:chrT\tLN:7");
        assert!(lines[2].starts_with("@PG\tID:bwalign"));
        assert_eq!(lines[3], "r1\t0\tchrT\t5\t37\t3M\t*\t0\t0\tACA\tIII\tNM:i:1\tAS:i:-2");
        assert_eq!(lines[4], "r2\t4\t*\t0\t0\t*\t*\t0\t0\tGGG\tIII");
    }
}
