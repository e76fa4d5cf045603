//! Touchscreen tap decoding.
//!
//! Turns raw touch samples into debounced choices. The decoder is a two
//! phase state machine:
//!
//! ```text
//! ReleaseWait --(released sample)--> PressConfirm { presses: 0 }
//! PressConfirm --(pressed)--> presses + 1, confirm once presses > threshold
//! PressConfirm --(released)--> presses = 0
//! confirm --> ReleaseWait
//! ```
//!
//! Waiting for a release first stops a finger still resting on the screen
//! from the previous step from firing again. The confirming sample, not the
//! first contact, decides the quadrant.

use crate::input::{ChoiceSource, InputError};
use crate::turn::Choice;
use tracing::trace;

/// Consecutive pressed samples needed is this value plus one.
pub const DEFAULT_DEBOUNCE: u32 = 5;

/// A touch position in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchPoint {
    pub x: i32,
    pub y: i32,
}

impl TouchPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// One poll of the touch driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchSample {
    pub x: i32,
    pub y: i32,
    pub pressed: bool,
}

impl TouchSample {
    pub fn pressed(x: i32, y: i32) -> Self {
        Self { x, y, pressed: true }
    }

    pub fn released() -> Self {
        Self {
            x: 0,
            y: 0,
            pressed: false,
        }
    }
}

impl From<Option<TouchPoint>> for TouchSample {
    fn from(point: Option<TouchPoint>) -> Self {
        match point {
            Some(p) => TouchSample::pressed(p.x, p.y),
            None => TouchSample::released(),
        }
    }
}

/// The touch driver: one sample per call, `None` when not pressed.
pub trait TouchSource {
    fn sample(&mut self) -> Result<Option<TouchPoint>, InputError>;
}

/// Decoder state machine phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    ReleaseWait,
    PressConfirm { presses: u32 },
}

/// Debounces touch samples into quadrant choices.
#[derive(Debug, Clone)]
pub struct TouchDecoder {
    width: u32,
    height: u32,
    threshold: u32,
    phase: Phase,
}

impl TouchDecoder {
    /// Create a decoder for a `width` x `height` display.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            threshold: DEFAULT_DEBOUNCE,
            phase: Phase::ReleaseWait,
        }
    }

    pub fn with_debounce(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Whether the decoder is still waiting for the screen to be released.
    pub fn awaiting_release(&self) -> bool {
        self.phase == Phase::ReleaseWait
    }

    /// Feed one sample; returns a choice when a tap is confirmed.
    pub fn feed(&mut self, sample: TouchSample) -> Option<Choice> {
        match self.phase {
            Phase::ReleaseWait => {
                if !sample.pressed {
                    self.phase = Phase::PressConfirm { presses: 0 };
                }
                None
            }
            Phase::PressConfirm { presses } => {
                if !sample.pressed {
                    self.phase = Phase::PressConfirm { presses: 0 };
                    return None;
                }

                let presses = presses + 1;
                if presses > self.threshold {
                    self.phase = Phase::ReleaseWait;
                    let choice = self.quadrant(sample.x, sample.y);
                    trace!(x = sample.x, y = sample.y, %choice, "tap confirmed");
                    Some(choice)
                } else {
                    self.phase = Phase::PressConfirm { presses };
                    None
                }
            }
        }
    }

    /// Map a display position to its quadrant's choice.
    pub fn quadrant(&self, x: i32, y: i32) -> Choice {
        let right = 2 * i64::from(x) > i64::from(self.width);
        let bottom = 2 * i64::from(y) > i64::from(self.height);
        Choice::from_quadrant(right, bottom)
    }

    /// Poll `source` until a tap is confirmed.
    pub fn next_choice<S: TouchSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<Choice, InputError> {
        loop {
            let sample = TouchSample::from(source.sample()?);
            if let Some(choice) = self.feed(sample) {
                return Ok(choice);
            }
        }
    }
}

/// A [`ChoiceSource`] reading taps from a touch driver.
pub struct TouchChoices<S> {
    decoder: TouchDecoder,
    source: S,
}

impl<S: TouchSource> TouchChoices<S> {
    pub fn new(decoder: TouchDecoder, source: S) -> Self {
        Self { decoder, source }
    }
}

impl<S: TouchSource> ChoiceSource for TouchChoices<S> {
    fn next_choice(&mut self) -> Result<Choice, InputError> {
        self.decoder.next_choice(&mut self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTouch;

    const W: u32 = 320;
    const H: u32 = 240;

    fn decoder() -> TouchDecoder {
        TouchDecoder::new(W, H)
    }

    fn feed_all(decoder: &mut TouchDecoder, samples: &[TouchSample]) -> Vec<Choice> {
        samples.iter().filter_map(|s| decoder.feed(*s)).collect()
    }

    #[test]
    fn test_corner_quadrants() {
        let d = decoder();
        let (w, h) = (W as i32, H as i32);
        assert_eq!(d.quadrant(0, 0).number(), 1);
        assert_eq!(d.quadrant(w - 1, 0).number(), 2);
        assert_eq!(d.quadrant(0, h - 1).number(), 3);
        assert_eq!(d.quadrant(w - 1, h - 1).number(), 4);
    }

    #[test]
    fn test_center_line_belongs_to_top_left() {
        let d = decoder();
        assert_eq!(d.quadrant(160, 120).number(), 1);
        assert_eq!(d.quadrant(161, 120).number(), 2);
        assert_eq!(d.quadrant(160, 121).number(), 3);
    }

    #[test]
    fn test_odd_display_size() {
        let d = TouchDecoder::new(5, 3);
        assert_eq!(d.quadrant(2, 1).number(), 1);
        assert_eq!(d.quadrant(3, 2).number(), 4);
    }

    #[test]
    fn test_short_press_does_not_confirm() {
        let mut d = decoder();
        let mut samples = vec![TouchSample::released()];
        samples.extend([TouchSample::pressed(10, 10); 4]);
        samples.push(TouchSample::released());

        assert!(feed_all(&mut d, &samples).is_empty());
    }

    #[test]
    fn test_six_presses_confirm_once() {
        let mut d = decoder();
        let mut samples = vec![TouchSample::released()];
        samples.extend([TouchSample::pressed(300, 10); 12]);

        let choices = feed_all(&mut d, &samples);
        assert_eq!(choices, [Choice::new(2).unwrap()]);
        assert!(d.awaiting_release());
    }

    #[test]
    fn test_release_resets_counter() {
        let mut d = decoder();
        let mut samples = vec![TouchSample::released()];
        samples.extend([TouchSample::pressed(10, 10); 5]);
        samples.push(TouchSample::released());
        samples.extend([TouchSample::pressed(10, 10); 5]);

        assert!(feed_all(&mut d, &samples).is_empty());
        assert_eq!(d.feed(TouchSample::pressed(10, 10)), Choice::new(1));
    }

    #[test]
    fn test_held_press_needs_release_first() {
        let mut d = decoder();
        let held = [TouchSample::pressed(10, 200); 20];
        assert!(feed_all(&mut d, &held).is_empty());
        assert!(d.awaiting_release());
    }

    #[test]
    fn test_confirming_sample_decides_quadrant() {
        let mut d = decoder();
        let mut samples = vec![TouchSample::released()];
        samples.extend([TouchSample::pressed(10, 10); 5]);
        samples.push(TouchSample::pressed(310, 230));

        assert_eq!(feed_all(&mut d, &samples), [Choice::new(4).unwrap()]);
    }

    #[test]
    fn test_custom_debounce() {
        let mut d = decoder().with_debounce(0);
        assert_eq!(d.feed(TouchSample::released()), None);
        assert_eq!(d.feed(TouchSample::pressed(0, 239)), Choice::new(3));
    }

    #[test]
    fn test_next_choice_blocks_until_confirmed() {
        let mut source = ScriptedTouch::new()
            .hold(10, 10, 3)
            .release(2)
            .hold(300, 200, 2)
            .release(1)
            .hold(300, 200, 6);

        let mut d = decoder();
        assert_eq!(d.next_choice(&mut source).unwrap().number(), 4);
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn test_next_choice_propagates_interrupt() {
        let mut source = ScriptedTouch::new().release(3).hold(10, 10, 2);
        let err = decoder().next_choice(&mut source).unwrap_err();
        assert!(matches!(err, InputError::Interrupted));
    }

    #[test]
    fn test_touch_choices_consecutive_taps() {
        let source = ScriptedTouch::new()
            .release(1)
            .hold(10, 10, 8)
            .release(1)
            .hold(300, 10, 6);
        let mut choices = TouchChoices::new(decoder(), source);

        assert_eq!(choices.next_choice().unwrap().number(), 1);
        assert_eq!(choices.next_choice().unwrap().number(), 2);
        assert!(matches!(
            choices.next_choice(),
            Err(InputError::Interrupted)
        ));
    }
}
