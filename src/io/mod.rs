//! Thin I/O adapters: FASTA reference, FASTQ reads, SAM output.

pub mod fasta;
pub mod fastq;
pub mod sam;
