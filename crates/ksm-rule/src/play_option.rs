use serde::{Deserialize, Serialize};

/// Gauge chosen by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GaugeType {
    Easy,
    #[default]
    Normal,
    Hard,
}

/// Single chart or course chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameMode {
    #[default]
    Normal,
    Course,
}

/// Gauge arithmetic for one play session, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GaugeCalcType {
    Easy,
    Normal,
    Hard,
    EasyCourse,
    NormalCourse,
    HardCourse,
}

impl GaugeCalcType {
    pub const ALL: [GaugeCalcType; 6] = [
        GaugeCalcType::Easy,
        GaugeCalcType::Normal,
        GaugeCalcType::Hard,
        GaugeCalcType::EasyCourse,
        GaugeCalcType::NormalCourse,
        GaugeCalcType::HardCourse,
    ];

    pub fn new(gauge_type: GaugeType, game_mode: GameMode) -> Self {
        match (gauge_type, game_mode) {
            (GaugeType::Easy, GameMode::Normal) => Self::Easy,
            (GaugeType::Normal, GameMode::Normal) => Self::Normal,
            (GaugeType::Hard, GameMode::Normal) => Self::Hard,
            (GaugeType::Easy, GameMode::Course) => Self::EasyCourse,
            (GaugeType::Normal, GameMode::Course) => Self::NormalCourse,
            (GaugeType::Hard, GameMode::Course) => Self::HardCourse,
        }
    }

    pub fn gauge_type(self) -> GaugeType {
        match self {
            Self::Easy | Self::EasyCourse => GaugeType::Easy,
            Self::Normal | Self::NormalCourse => GaugeType::Normal,
            Self::Hard | Self::HardCourse => GaugeType::Hard,
        }
    }

    pub fn is_course(self) -> bool {
        matches!(self, Self::EasyCourse | Self::NormalCourse | Self::HardCourse)
    }

    /// Whether reaching zero ends the play.
    pub fn is_hard_failable(self) -> bool {
        self.is_course() || self == Self::Hard
    }
}

/// How a lane group is judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum JudgmentPlayMode {
    #[default]
    On,
    /// Notes are removed from judgment
    Off,
    /// Judged automatically
    Auto,
    /// Notes are hidden and removed from judgment
    Hide,
}

impl JudgmentPlayMode {
    /// Whether the lane carries any judgment units.
    pub fn has_judgment(self) -> bool {
        matches!(self, Self::On | Self::Auto)
    }
}

/// Settings for one play session. Never changes while playing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayOption {
    #[serde(default)]
    pub is_auto_play: bool,
    #[serde(default)]
    pub gauge_type: GaugeType,
    #[serde(default)]
    pub game_mode: GameMode,
    #[serde(default)]
    pub bt_judgment_play_mode: JudgmentPlayMode,
    #[serde(default)]
    pub fx_judgment_play_mode: JudgmentPlayMode,
    #[serde(default)]
    pub laser_judgment_play_mode: JudgmentPlayMode,
    /// Button input delay compensation in milliseconds
    #[serde(default)]
    pub input_delay_ms: i32,
    /// Laser input delay compensation in milliseconds
    #[serde(default)]
    pub laser_input_delay_ms: i32,
}

impl Default for PlayOption {
    fn default() -> Self {
        Self {
            is_auto_play: false,
            gauge_type: GaugeType::Normal,
            game_mode: GameMode::Normal,
            bt_judgment_play_mode: JudgmentPlayMode::On,
            fx_judgment_play_mode: JudgmentPlayMode::On,
            laser_judgment_play_mode: JudgmentPlayMode::On,
            input_delay_ms: 0,
            laser_input_delay_ms: 0,
        }
    }
}

impl PlayOption {
    pub fn gauge_calc_type(&self) -> GaugeCalcType {
        GaugeCalcType::new(self.gauge_type, self.game_mode)
    }

    pub fn effective_bt_judgment_play_mode(&self) -> JudgmentPlayMode {
        self.effective(self.bt_judgment_play_mode)
    }

    pub fn effective_fx_judgment_play_mode(&self) -> JudgmentPlayMode {
        self.effective(self.fx_judgment_play_mode)
    }

    pub fn effective_laser_judgment_play_mode(&self) -> JudgmentPlayMode {
        self.effective(self.laser_judgment_play_mode)
    }

    /// Auto play judges every lane group that is not removed.
    fn effective(&self, mode: JudgmentPlayMode) -> JudgmentPlayMode {
        if self.is_auto_play && mode == JudgmentPlayMode::On {
            JudgmentPlayMode::Auto
        } else {
            mode
        }
    }

    pub fn input_delay_sec(&self) -> f64 {
        f64::from(self.input_delay_ms) / 1000.0
    }

    pub fn laser_input_delay_sec(&self) -> f64 {
        f64::from(self.laser_input_delay_ms) / 1000.0
    }
}
