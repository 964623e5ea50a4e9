use core::cell::Cell;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use telop_fit::SegmentUnit;

use crate::commit::LockedLine;
use crate::skew::SkewCorrection;
use crate::style::SurfaceStyle;

/// The live display surface a telop is rendered into.
///
/// Methods take `&self`: hosts are tree-like UI handles with interior
/// mutability, and overlapping requests share one surface.
pub trait DisplaySurface {
    /// Style inspector: computed font metrics, transform and stage scale.
    fn computed_style(&self) -> SurfaceStyle;

    /// Set the horizontal compression variable.
    fn set_hscale(&self, scale: f32);

    /// Replace the surface content with a flat, unlocked unit sequence.
    fn replace_units(&self, units: &[SegmentUnit]);

    /// Top offset of every rendered unit in document order, in device px.
    fn unit_top_offsets(&self) -> Vec<f32>;

    /// Rendered height of the container, in device px.
    fn container_height_px(&self) -> f32;

    /// Re-parent units into one container per line.
    fn lock_lines(&self, lines: &[LockedLine]);

    /// Hand the horizontal centering offset to the surrounding frame.
    fn publish_skew_correction(&self, correction: SkewCorrection);
}

/// Host display-refresh hook.
pub trait FrameScheduler {
    /// Resolves after the next display refresh.
    fn next_frame(&self) -> impl Future<Output = ()>;
}

/// Wait until style changes have been laid out.
///
/// Some engines spread style application and box recomputation over two
/// refreshes, so two frames are awaited.
pub async fn wait_for_layout_settle<F: FrameScheduler>(frames: &F) {
    frames.next_frame().await;
    frames.next_frame().await;
}

/// Cancellation hook checked at every suspension point.
pub trait CancelToken {
    fn is_cancelled(&self) -> bool;
}

/// Never-cancel token for default call paths.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverCancel;

impl CancelToken for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Runtime-agnostic scheduler: each frame is a single cooperative yield.
#[derive(Debug, Default)]
pub struct YieldFrames {
    frames: Cell<u64>,
}

impl YieldFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames handed out so far.
    pub fn frames(&self) -> u64 {
        self.frames.get()
    }
}

impl FrameScheduler for YieldFrames {
    fn next_frame(&self) -> impl Future<Output = ()> {
        self.frames.set(self.frames.get() + 1);
        YieldOnce { yielded: false }
    }
}

struct YieldOnce {
    yielded: bool,
}

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            return Poll::Ready(());
        }
        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

/// Timer-driven scheduler approximating a display refresh.
#[cfg(feature = "tokio")]
#[derive(Clone, Copy, Debug)]
pub struct TokioFrameClock {
    interval: core::time::Duration,
}

#[cfg(feature = "tokio")]
impl TokioFrameClock {
    pub fn new(interval: core::time::Duration) -> Self {
        Self { interval }
    }
}

#[cfg(feature = "tokio")]
impl Default for TokioFrameClock {
    fn default() -> Self {
        Self::new(core::time::Duration::from_millis(16))
    }
}

#[cfg(feature = "tokio")]
impl FrameScheduler for TokioFrameClock {
    fn next_frame(&self) -> impl Future<Output = ()> {
        tokio::time::sleep(self.interval)
    }
}
