use std::io::Write;
use std::time::Instant;

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::index::fm::FMIndex;
use crate::io::fastq::{FastqReader, FastqRecord};
use crate::io::sam::SamWriter;

pub mod assemble;
pub mod cigar;
pub mod extend;
pub mod seed;

pub use assemble::{mapping_quality, Alignment, AssemblyState, Candidate, ReadAligner, ReadAlignment};
pub use cigar::{EditOp, EditOps};
pub use extend::{extend, extend_with_buf, BandBuffer, ExtendParams, Extension, UNREACHABLE};
pub use seed::{generate_seeds, seed_positions, Seed, SeedParams};

/// 比对参数：种子、扩展代价与运行设置。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AlignOpt {
    pub seed_length: usize,
    /// 0 表示与 seed_length 相同（窗口不重叠）
    pub seed_stride: usize,
    pub max_occurrences: usize,
    pub mismatch_cost: i32,
    pub gap_open_cost: i32,
    pub gap_extend_cost: i32,
    pub band_width: i32,
    pub threads: usize,
    pub batch_size: usize,
}

impl Default for AlignOpt {
    fn default() -> Self {
        Self {
            seed_length: 19,
            seed_stride: 0,
            max_occurrences: 0,
            mismatch_cost: 2,
            gap_open_cost: 2,
            gap_extend_cost: 2,
            band_width: 10,
            threads: 1,
            batch_size: 4096,
        }
    }
}

impl AlignOpt {
    pub fn seed_params(&self) -> SeedParams {
        let stride = if self.seed_stride == 0 { self.seed_length } else { self.seed_stride };
        SeedParams { seed_length: self.seed_length, stride, max_occurrences: self.max_occurrences }
    }

    pub fn extend_params(&self) -> ExtendParams {
        ExtendParams {
            mismatch_cost: self.mismatch_cost,
            gap_open_cost: self.gap_open_cost,
            gap_extend_cost: self.gap_extend_cost,
            band_width: self.band_width,
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        self.seed_params().validate()?;
        self.extend_params().validate()?;
        if self.batch_size == 0 {
            return Err(crate::Error::InvalidParameter { name: "batch_size", value: 0 });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlignStats {
    pub reads: usize,
    pub aligned: usize,
    pub unaligned: usize,
}

/// 在当前 rayon 线程池里并行比对一批 read，结果保持输入顺序。
pub fn align_batch(fm: &FMIndex, reads: &[FastqRecord], opt: &AlignOpt) -> crate::Result<Vec<ReadAlignment>> {
    let (seed, ext) = (opt.seed_params(), opt.extend_params());
    reads
        .par_iter()
        .map_init(
            || ReadAligner::new(fm, seed, ext),
            |aligner, rec| match aligner {
                Ok(a) => a.align(&rec.seq),
                Err(e) => Err(e.clone()),
            },
        )
        .collect()
}

/// 读取 FASTQ，逐批比对后写出 SAM。每条 read 都会输出一行，未比对的标记 flag 4。
pub fn align_reads<R: std::io::BufRead, W: Write>(
    fm: &FMIndex,
    reader: &mut FastqReader<R>,
    writer: &mut SamWriter<W>,
    opt: &AlignOpt,
) -> Result<AlignStats> {
    opt.validate()?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opt.threads)
        .build()
        .context("cannot start worker threads")?;

    let mut stats = AlignStats::default();
    loop {
        let batch = reader.next_batch(opt.batch_size)?;
        if batch.is_empty() {
            break;
        }
        let results = pool.install(|| align_batch(fm, &batch, opt))?;
        for (rec, res) in batch.iter().zip(&results) {
            writer.write_record(rec, res)?;
            stats.reads += 1;
            if res.is_aligned() {
                stats.aligned += 1;
            } else {
                stats.unaligned += 1;
            }
        }
        debug!(batch = batch.len(), total = stats.reads, "batch aligned");
    }
    writer.flush()?;
    Ok(stats)
}

pub fn align_fastq_with_opt(
    index_path: &str,
    fastq_path: &str,
    out_path: Option<&str>,
    opt: AlignOpt,
) -> Result<AlignStats> {
    opt.validate()?;
    let start = Instant::now();
    let fm = FMIndex::load_from_file(index_path)?;
    info!(
        index = index_path,
        reference = %fm.reference_name,
        len = fm.reference.len(),
        "index loaded"
    );

    let fq = std::fs::File::open(fastq_path)
        .with_context(|| format!("cannot open reads FASTQ '{}'", fastq_path))?;
    let mut reader = FastqReader::new(std::io::BufReader::new(fq));

    let out: Box<dyn Write> = match out_path {
        Some(p) => Box::new(std::io::BufWriter::new(
            std::fs::File::create(p).with_context(|| format!("cannot create output '{}'", p))?,
        )),
        None => Box::new(std::io::BufWriter::new(std::io::stdout())),
    };
    let mut writer = SamWriter::new(out, &fm.reference_name);
    writer.write_header(fm.reference.len(), &std::env::args().collect::<Vec<_>>().join(" "))?;

    let stats = align_reads(&fm, &mut reader, &mut writer, &opt)?;
    info!(
        reads = stats.reads,
        aligned = stats.aligned,
        unaligned = stats.unaligned,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "alignment finished"
    );
    Ok(stats)
}
