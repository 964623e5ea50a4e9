//! Autofit typesetting for Japanese subtitle ("telop") surfaces.
//!
//! The pipeline is: raw sentence → [`Tokenizer`] → [`render_unit`] →
//! [`WidthOracle`] → [`AutofitSolver`] (bisection over [`simulate_lines`]).
//! Host-facing refinement, line locking and skew correction live in the
//! `telop-fit-render` crate.

#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

pub mod autofit;
pub mod config;
pub mod error;
pub mod markup;
pub mod measure;
pub mod simulate;
pub mod tokenize;

mod patterns;

pub use autofit::{AutofitResult, AutofitSolver, ScaleSearch};
pub use config::{FitConfig, PunctuationConfig, StageGeometry, TelopConfig};
pub use error::TelopError;
pub use markup::{escape_html, expand_ruby, render_unit, PunctuationClass, SegmentUnit};
pub use measure::{
    FontContext, HeuristicMeasureHost, MeasureHost, MeasureScratch, MeasuredSentence,
    MeasuredUnit, WidthOracle, NEUTRAL_HSCALE,
};
pub use simulate::{simulate_lines, LineSimulation};
pub use tokenize::{strip_markup, Tokenizer, WordSegmenter, PARTICLES};

#[cfg(feature = "icu")]
pub use tokenize::IcuWordSegmenter;
