/// Landing gear position tracked with two height thresholds.
///
/// The gear only moves on a crossing of the threshold opposite to its current
/// position, so a height hovering around either threshold never toggles it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GearState {
    retracted: bool,
    raise_height: f64,
    lower_height: f64,
}

impl GearState {
    /// Gear starts extended.
    pub fn new(raise_height: f64, lower_height: f64) -> Self {
        Self { retracted: false, raise_height, lower_height }
    }

    pub fn is_retracted(&self) -> bool { self.retracted }

    /// Evaluates `height` and returns the retract command to issue, if any.
    pub fn evaluate(&mut self, height: f64) -> Option<bool> {
        if !self.retracted && height > self.raise_height {
            self.retracted = true;
            Some(true)
        } else if self.retracted && height < self.lower_height {
            self.retracted = false;
            Some(false)
        } else {
            None
        }
    }

    /// Records an externally forced position.
    pub fn force(&mut self, retracted: bool) { self.retracted = retracted; }
}
