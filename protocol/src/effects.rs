//! Host-side effects requested by the gesture session.
//!
//! How the vibration is played or the screenshot captured is owned by the
//! host; the session only hands requests to an [`EffectSink`] and never
//! waits for them.

/// Predefined haptic effects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Haptic {
    /// Short click played when a squeeze enters the progress window
    Light,
    /// Heavy click confirming a detected squeeze
    Heavy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenshotRegion {
    Fullscreen,
}

/// Tag reported to the screenshot service as the capture origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenshotSource {
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenshotRequest {
    pub region: ScreenshotRegion,
    pub source: ScreenshotSource,
}

impl ScreenshotRequest {
    /// Full screen capture attributed to a non-keychord source
    pub const FULLSCREEN: Self = Self {
        region: ScreenshotRegion::Fullscreen,
        source: ScreenshotSource::Other,
    };
}

/// Receiver of haptic and screenshot requests
///
/// Both calls are fire-and-forget: implementations must not block the caller
/// on the effect completing.
pub trait EffectSink {
    fn vibrate(&mut self, haptic: Haptic);

    fn capture_screenshot(&mut self, request: ScreenshotRequest);
}

/// A single requested effect, for sinks that record or forward them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Vibrate(Haptic),
    CaptureScreenshot(ScreenshotRequest),
}

impl EffectSink for Vec<Effect> {
    fn vibrate(&mut self, haptic: Haptic) {
        self.push(Effect::Vibrate(haptic));
    }

    fn capture_screenshot(&mut self, request: ScreenshotRequest) {
        self.push(Effect::CaptureScreenshot(request));
    }
}

impl<S: EffectSink + ?Sized> EffectSink for Box<S> {
    fn vibrate(&mut self, haptic: Haptic) {
        (**self).vibrate(haptic);
    }

    fn capture_screenshot(&mut self, request: ScreenshotRequest) {
        (**self).capture_screenshot(request);
    }
}
