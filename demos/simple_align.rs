//! 演示如何在 library 模式下使用 bwalign 进行序列比对。
//!
//! 运行方式：
//! ```bash
//! cargo run --example simple_align
//! ```

use bwalign::align::{self, AlignOpt, ReadAligner};
use bwalign::index::{FMIndex, IndexParams};
use bwalign::util::dna;

fn main() -> bwalign::Result<()> {
    // 1. 参考序列
    let reference = b"ACGTACGTAGCTGATCGTAGCTAGCTAGCTGATCGTAGCTAGCTAGCTGAT";
    println!("参考序列: {}", String::from_utf8_lossy(reference));
    println!("参考长度: {} bp", reference.len());

    // 2. 构建 FM 索引
    let fm = FMIndex::build("ref1", reference, IndexParams::default())?;
    println!(
        "FM 索引构建完成：BWT 长度={}, SA 采样数={}",
        fm.text_len(),
        fm.sampled_sa.num_samples()
    );

    // 3. 精确匹配搜索
    let pattern = b"GCTGATCGTAG";
    let positions = fm.find(&dna::encode_read(pattern))?;
    println!("\n精确匹配 '{}': 找到 {} 处 {:?}", String::from_utf8_lossy(pattern), positions.len(), positions);

    // 4. 种子查找
    let read = b"GCTAGCTGATCGTAGCTAGG";
    let opt = AlignOpt { seed_length: 6, seed_stride: 3, ..Default::default() };
    let seeds = align::generate_seeds(&fm, &dna::encode_read(read), &opt.seed_params())?;
    println!("\n种子（read='{}'）:", String::from_utf8_lossy(read));
    for s in &seeds {
        println!("  read[{}..{}] -> {:?}", s.read_offset, s.read_offset + s.len, align::seed_positions(&fm, s)?);
    }

    // 5. 带状扩展 + 选择最优
    let mut aligner = ReadAligner::new(&fm, opt.seed_params(), opt.extend_params())?;
    match aligner.align(read)? {
        align::ReadAlignment::Aligned(aln) => {
            println!("\n最优比对:");
            println!("  Pos:   {}", aln.ref_start);
            println!("  Cost:  {}", aln.score);
            println!("  CIGAR: {}", aln.ops);
            println!("  NM:    {}", aln.nm);
            println!("  MAPQ:  {}", aln.mapq);
        }
        align::ReadAlignment::Unaligned => println!("\n未比对"),
    }

    println!("\n完成！");
    Ok(())
}
