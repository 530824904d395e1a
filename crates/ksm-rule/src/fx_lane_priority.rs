use ksm_model::NUM_FX_LANES;

/// Which FX lane's long note owns the per-lane audio effect parameters.
///
/// When both FX long notes carry the same effect with different parameters,
/// the lane whose long note became active most recently wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FxLanePriority {
    last_pressed_lane: usize,
    was_active: [bool; NUM_FX_LANES],
}

impl FxLanePriority {
    /// Feed whether each lane's long note is active this frame.
    ///
    /// Lanes becoming active in the same frame resolve in lane order, so the
    /// right lane wins a tie.
    pub fn update(&mut self, is_active: [bool; NUM_FX_LANES]) {
        for (lane, &active) in is_active.iter().enumerate() {
            if active && !self.was_active[lane] {
                self.last_pressed_lane = lane;
            }
            self.was_active[lane] = active;
        }
    }

    pub fn last_pressed_lane(&self) -> usize {
        self.last_pressed_lane
    }

    /// Lanes in the order their effects apply; the first one takes precedence.
    pub fn lane_order(&self) -> [usize; NUM_FX_LANES] {
        [self.last_pressed_lane, 1 - self.last_pressed_lane]
    }

    /// Lane whose long note owns the effect parameters, if any is active.
    pub fn active_lane(&self) -> Option<usize> {
        self.lane_order().into_iter().find(|&lane| self.was_active[lane])
    }
}
