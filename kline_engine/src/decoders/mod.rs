// @file: kline_engine/src/decoders/mod.rs
// @description: Backend adapters implementing the positional decoder contract, plus a name-based factory.
// @author: LAS.

pub mod scan;
pub mod serde_visitor;
#[cfg(feature = "simd")]
pub mod simd;
pub mod tree;

use crate::core::decoder::KlineDecoder;

pub use scan::ScanDecoder;
pub use serde_visitor::SerdeDecoder;
#[cfg(feature = "simd")]
pub use simd::SimdDecoder;
pub use tree::TreeDecoder;

//
// FACTORY FUNCTIONS
//

// Names of every backend compiled into this build, baseline first.
pub fn available() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = vec!["tree", "serde", "scan"];
    if cfg!(feature = "simd") {
        names.push("simd");
    }
    names
}

pub fn by_name(name: &str) -> Option<Box<dyn KlineDecoder>> {
    match name.trim().to_ascii_lowercase().as_str() {
        "tree" => Some(Box::new(TreeDecoder::new())),
        "serde" => Some(Box::new(SerdeDecoder::new())),
        "scan" => Some(Box::new(ScanDecoder::new())),
        #[cfg(feature = "simd")]
        "simd" => Some(Box::new(SimdDecoder::new())),
        _ => None,
    }
}
