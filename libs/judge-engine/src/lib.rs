//! Language-agnostic judge pipeline.
//!
//! Workspace -> build -> (run -> evaluate) per test case -> verdict. Every
//! language plugs in through [`strategy::LanguageStrategy`]; nothing outside
//! `languages` knows how a particular toolchain is invoked.

pub mod classifier;
pub mod engine;
pub mod evaluator;
pub mod executor;
pub mod input;
pub mod languages;
pub mod strategy;
pub mod workspace;


pub use executor::Judge;
pub use languages::LanguageRegistry;
