//! Display-surface pipeline for `telop-fit`.
//!
//! [`TelopRenderer`] applies the simulated scale to a live [`DisplaySurface`],
//! refines it against measured line bands ([`refine_scale`]), locks the
//! resulting line breaks ([`commit_layout`]) and publishes the horizontal
//! offset that re-centres the sheared box ([`apply_skew_correction`]).
//!
//! Every wait for layout is an explicit suspension point driven by a
//! [`FrameScheduler`]; [`HeadlessStage`] plus [`YieldFrames`] run the whole
//! pipeline without a host.

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

pub mod commit;
pub mod engine;
pub mod error;
pub mod headless;
pub mod refine;
pub mod skew;
pub mod style;
pub mod surface;

pub use commit::{commit_layout, count_line_bands, group_line_bands, LockedLine};
pub use engine::{TelopLayout, TelopRenderer};
pub use error::RenderError;
pub use headless::HeadlessStage;
pub use refine::{refine_scale, RefineOutcome};
pub use skew::{apply_skew_correction, SkewCorrection};
pub use style::SurfaceStyle;
pub use surface::{
    wait_for_layout_settle, CancelToken, DisplaySurface, FrameScheduler, NeverCancel, YieldFrames,
};

#[cfg(feature = "tokio")]
pub use surface::TokioFrameClock;
