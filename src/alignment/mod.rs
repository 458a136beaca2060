pub mod assembler;
pub mod lexicon;
pub mod normalize;
pub mod perfect_match;
pub mod report;
pub mod scoring;
pub mod span_tracker;
pub mod word_spec;
