use anyhow::{Context, Result};
use std::io::BufRead;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct FastaRecord {
    pub id: String,
    pub desc: Option<String>,
    pub seq: Vec<u8>,
}

pub struct FastaReader<R: BufRead> {
    reader: R,
    buf: String,
    done: bool,
    peek_header: Option<String>,
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, buf: String::new(), done: false, peek_header: None }
    }

    pub fn next_record(&mut self) -> Result<Option<FastaRecord>> {
        if self.done {
            return Ok(None);
        }

        let header = match self.peek_header.take() {
            Some(h) => h,
            None => loop {
                self.buf.clear();
                if self.reader.read_line(&mut self.buf)? == 0 {
                    self.done = true;
                    return Ok(None);
                }
                if let Some(rest) = self.buf.strip_prefix('>') {
                    break rest.trim().to_string();
                }
            },
        };

        let mut parts = header.splitn(2, char::is_whitespace);
        let id = parts.next().unwrap_or("").to_string();
        let desc = parts.next().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        // sequence lines until the next header; whitespace is dropped, case is kept
        let mut seq: Vec<u8> = Vec::new();
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                self.done = true;
                break;
            }
            if let Some(rest) = self.buf.strip_prefix('>') {
                self.peek_header = Some(rest.trim().to_string());
                break;
            }
            seq.extend(self.buf.bytes().filter(|b| !b.is_ascii_whitespace()));
        }

        Ok(Some(FastaRecord { id, desc, seq }))
    }
}

/// Loads the reference for indexing: the first record only. Further records
/// are reported and ignored.
pub fn read_reference(path: impl AsRef<Path>) -> Result<FastaRecord> {
    let path = path.as_ref();
    let fh = std::fs::File::open(path)
        .with_context(|| format!("cannot open reference FASTA '{}'", path.display()))?;
    let mut reader = FastaReader::new(std::io::BufReader::new(fh));

    let first = reader
        .next_record()?
        .with_context(|| format!("FASTA file '{}' contains no sequences", path.display()))?;
    let mut ignored = 0usize;
    while reader.next_record()?.is_some() {
        ignored += 1;
    }
    if ignored > 0 {
        warn!(file = %path.display(), kept = %first.id, ignored, "only the first FASTA record is indexed");
    }
    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn parse_simple_fasta() {
        let data = b">chr1 first\nACgTNN\n>chr2\nAAA\n";
        let mut r = FastaReader::new(Cursor::new(&data[..]));

        let r1 = r.next_record().unwrap().unwrap();
        assert_eq!(r1.id, "chr1");
        assert_eq!(r1.desc.as_deref(), Some("first"));
        assert_eq!(r1.seq, b"ACgTNN");

        let r2 = r.next_record().unwrap().unwrap();
        assert_eq!(r2.id, "chr2");
        assert_eq!(r2.desc, None);
        assert_eq!(r2.seq, b"AAA");

        assert!(r.next_record().unwrap().is_none());
    }

    #[test]
    fn parse_fasta_with_crlf_and_whitespace() {
        let data = b"\n\n>chr1 desc\r\nAC G T n\r\n acgt\r\n";
        let mut r = FastaReader::new(Cursor::new(&data[..]));
        let r1 = r.next_record().unwrap().unwrap();
        assert_eq!(r1.id, "chr1");
        assert_eq!(r1.seq, b"ACGTnacgt");
        assert!(r.next_record().unwrap().is_none());
    }

    #[test]
    fn read_reference_keeps_first_record() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, ">ref1\nGATT\nACA\n>ref2\nTTTT\n").unwrap();
        let rec = read_reference(f.path()).unwrap();
        assert_eq!(rec.id, "ref1");
        assert_eq!(rec.seq, b"GATTACA");
    }

    #[test]
    fn read_reference_rejects_empty_file() {
        let f = tempfile::NamedTempFile::new().unwrap();
        let err = read_reference(f.path()).unwrap_err();
        assert!(err.to_string().contains("no sequences"));
    }
}
