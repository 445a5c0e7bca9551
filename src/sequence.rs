use std::fmt;
use std::sync::Arc;

/// Opaque name of one image sequence ("television_ad", "television_ad_2", ...).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SequenceId(Arc<str>);

impl SequenceId {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SequenceId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Position within a sequence, always in `[0, frame_count)`.
pub type FrameIndex = u32;

/// Next frame index, wrapping to 0 after the last frame.
pub fn next_frame(frame: FrameIndex, frame_count: u32) -> FrameIndex {
    (frame + 1) % frame_count
}

/// Maps (sequence, frame) to a resource locator string. Pure and total
/// over valid frame indices; injectable per player since deployments
/// differ in path schemes.
pub trait FrameLocator {
    fn locate(&self, sequence: &SequenceId, frame: FrameIndex) -> String;
}

/// Default convention: a directory named after the sequence containing
/// `{sequence}_{frame:05}.jpg`.
pub struct DirLocator {
    base: String,
}

impl DirLocator {
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { base }
    }
}

impl FrameLocator for DirLocator {
    fn locate(&self, sequence: &SequenceId, frame: FrameIndex) -> String {
        format!("{}/{1}/{1}_{2:05}.jpg", self.base, sequence, frame)
    }
}

impl<F> FrameLocator for F
where
    F: Fn(&SequenceId, FrameIndex) -> String,
{
    fn locate(&self, sequence: &SequenceId, frame: FrameIndex) -> String {
        self(sequence, frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_locator_zero_pads_to_five_digits() {
        let locator = DirLocator::new("assets/animate");
        let seq = SequenceId::from("television_ad");
        assert_eq!(
            locator.locate(&seq, 0),
            "assets/animate/television_ad/television_ad_00000.jpg"
        );
        assert_eq!(
            locator.locate(&seq, 79),
            "assets/animate/television_ad/television_ad_00079.jpg"
        );
        assert_eq!(
            locator.locate(&seq, 123456),
            "assets/animate/television_ad/television_ad_123456.jpg"
        );
    }

    #[test]
    fn dir_locator_strips_trailing_slash() {
        let locator = DirLocator::new("frames/");
        let seq = SequenceId::from("a");
        assert_eq!(locator.locate(&seq, 1), "frames/a/a_00001.jpg");
    }

    #[test]
    fn closures_are_locators() {
        let locator = |seq: &SequenceId, frame: FrameIndex| format!("{seq}#{frame}");
        assert_eq!(locator.locate(&SequenceId::from("x"), 7), "x#7");
    }

    #[test]
    fn next_frame_wraps_modularly() {
        assert_eq!(next_frame(0, 80), 1);
        assert_eq!(next_frame(78, 80), 79);
        assert_eq!(next_frame(79, 80), 0);
        assert_eq!(next_frame(0, 1), 0);
    }
}
