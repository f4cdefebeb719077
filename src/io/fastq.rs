use anyhow::{bail, Result};
use std::io::BufRead;

/// One read. Quality bytes are carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastqRecord {
    pub id: String,
    pub desc: Option<String>,
    pub seq: Vec<u8>,
    pub qual: Vec<u8>,
}

pub struct FastqReader<R: BufRead> {
    reader: R,
    buf: String,
    line_no: usize,
    done: bool,
}

impl<R: BufRead> FastqReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, buf: String::new(), line_no: 0, done: false }
    }

    fn read_line(&mut self) -> Result<bool> {
        self.buf.clear();
        let n = self.reader.read_line(&mut self.buf)?;
        if n > 0 {
            self.line_no += 1;
        }
        Ok(n > 0)
    }

    pub fn next_record(&mut self) -> Result<Option<FastqRecord>> {
        if self.done {
            return Ok(None);
        }

        // header line starting with '@'; blank lines between records are skipped
        loop {
            if !self.read_line()? {
                self.done = true;
                return Ok(None);
            }
            if !self.buf.trim().is_empty() {
                break;
            }
        }
        if !self.buf.starts_with('@') {
            bail!("line {}: FASTQ header not starting with '@'", self.line_no);
        }
        let header = self.buf[1..].trim_end();
        let mut parts = header.splitn(2, char::is_whitespace);
        let id = parts.next().unwrap_or("").to_string();
        let desc = parts.next().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        if !self.read_line()? {
            bail!("line {}: unexpected EOF after header of '{}'", self.line_no, id);
        }
        let seq = self.buf.trim_end().as_bytes().to_vec();

        if !self.read_line()? || !self.buf.starts_with('+') {
            bail!("line {}: missing '+' line for '{}'", self.line_no, id);
        }

        if !self.read_line()? {
            bail!("line {}: missing quality line for '{}'", self.line_no, id);
        }
        let qual = self.buf.trim_end().as_bytes().to_vec();

        // line-wrapped records are not supported
        if qual.len() != seq.len() {
            bail!(
                "line {}: seq/qual length mismatch for '{}' ({} vs {})",
                self.line_no,
                id,
                seq.len(),
                qual.len()
            );
        }

        Ok(Some(FastqRecord { id, desc, seq, qual }))
    }

    /// Reads up to `max` records; an empty batch means EOF.
    pub fn next_batch(&mut self, max: usize) -> Result<Vec<FastqRecord>> {
        let mut batch = Vec::with_capacity(max.min(1 << 16));
        while batch.len() < max {
            match self.next_record()? {
                Some(rec) => batch.push(rec),
                None => break,
            }
        }
        Ok(batch)
    }
}

impl<R: BufRead> Iterator for FastqReader<R> {
    type Item = Result<FastqRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
