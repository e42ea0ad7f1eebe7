use macroquad::prelude::Conf;

use crate::model::BottleCount;

pub const WINDOW_TITLE: &str = "Color Bottle Matching Game";

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GameConfig {
    /// Bottle count preselected on the setup screen.
    pub default_bottle_count: BottleCount,
    /// How long a peek keeps the reference arrangement visible, in seconds.
    pub reveal_seconds: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            default_bottle_count: BottleCount::DEFAULT,
            reveal_seconds: 3.0,
        }
    }
}

pub fn window_conf() -> Conf {
    Conf {
        window_title: WINDOW_TITLE.to_string(),
        window_width: 1024,
        window_height: 720,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}
