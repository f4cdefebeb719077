//! # bwalign
//!
//! 短 read 比对到单条参考序列。
//!
//! - **索引构建**：参考序列 + `$` 的后缀数组 → BWT + 采样后缀数组 → rank 检查点
//! - **种子查找**：按定长窗口做 FM 反向搜索，沿 LF 映射恢复参考坐标
//! - **带状扩展**：以种子锚点为对角线做带状仿射间隙全局比对，输出代价与 CIGAR
//! - **结果选择**：代价最低者胜出，同分取最左位点
//!
//! ## 快速示例
//!
//! ```rust,no_run
//! use bwalign::align::{AlignOpt, ReadAligner};
//! use bwalign::index::{FMIndex, IndexParams};
//!
//! let fm = FMIndex::build("ref", b"ACGTACGTAGCTGATCGTAGCTAGCTAGCTGATCG", IndexParams::default())?;
//! let opt = AlignOpt { seed_length: 8, ..Default::default() };
//! let mut aligner = ReadAligner::new(&fm, opt.seed_params(), opt.extend_params())?;
//! if let Some(aln) = aligner.align(b"GCTGATCGTAGCTAGC")?.alignment() {
//!     println!("pos={} cigar={} cost={}", aln.ref_start, aln.ops, aln.score);
//! }
//! # Ok::<(), bwalign::Error>(())
//! ```
//!
//! ## 模块说明
//!
//! - [`index`]：后缀数组、BWT、rank 结构与 FM 索引
//! - [`align`]：种子、带状扩展、结果选择与批量比对
//! - [`io`]：FASTA / FASTQ 读取与 SAM 输出
//! - [`util`]：字母表编码

pub mod error;
pub mod io;
pub mod index;
pub mod util;
pub mod align;

pub use error::{ConstructionError, Error, Result};
