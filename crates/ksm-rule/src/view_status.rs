/// Camera offsets applied on top of the chart's camera settings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CamStatus {
    /// Horizontal lane shift, in pixels at the reference resolution
    pub shift_x: f64,
}

/// View state the judgment contributes to each frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewStatus {
    pub cam_status: CamStatus,
}
