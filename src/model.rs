use macroquad::prelude::*;

pub struct PaletteEntry {
    pub name: &'static str,
    pub color: Color,
}

pub const PALETTE: [PaletteEntry; 13] = [
    PaletteEntry { name: "Red", color: Color::new(1.0, 0.420, 0.420, 1.0) }, // #FF6B6B
    PaletteEntry { name: "Teal", color: Color::new(0.306, 0.804, 0.769, 1.0) }, // #4ECDC4
    PaletteEntry { name: "Blue", color: Color::new(0.271, 0.718, 0.820, 1.0) }, // #45B7D1
    PaletteEntry { name: "Green", color: Color::new(0.588, 0.808, 0.706, 1.0) }, // #96CEB4
    PaletteEntry { name: "Yellow", color: Color::new(1.0, 0.918, 0.655, 1.0) }, // #FFEAA7
    PaletteEntry { name: "Plum", color: Color::new(0.867, 0.627, 0.867, 1.0) }, // #DDA0DD
    PaletteEntry { name: "Coral", color: Color::new(1.0, 0.627, 0.478, 1.0) }, // #FFA07A
    PaletteEntry { name: "Sky Blue", color: Color::new(0.529, 0.808, 0.922, 1.0) }, // #87CEEB
    PaletteEntry { name: "Mint", color: Color::new(0.596, 0.984, 0.596, 1.0) }, // #98FB98
    PaletteEntry { name: "Khaki", color: Color::new(0.941, 0.902, 0.549, 1.0) }, // #F0E68C
    PaletteEntry { name: "Pink", color: Color::new(1.0, 0.714, 0.757, 1.0) }, // #FFB6C1
    PaletteEntry { name: "Light Blue", color: Color::new(0.678, 0.847, 0.902, 1.0) }, // #ADD8E6
    PaletteEntry { name: "Tan", color: Color::new(0.824, 0.706, 0.549, 1.0) }, // #D2B48C
];

/// Colour shown in place of a bottle whose contents are hidden.
pub const HIDDEN_BOTTLE_COLOR: Color = Color::new(0.8, 0.8, 0.8, 1.0);

/// One palette slot. Stored by index so comparisons never touch float colours.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct BottleColor(usize);

impl BottleColor {
    pub fn get_name(&self) -> &'static str {
        PALETTE[self.0].name
    }

    pub fn get_color(&self) -> Color {
        PALETTE[self.0].color
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn get_label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

/// Number of bottles in play. Always within `MIN..=MAX`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct BottleCount(usize);

impl BottleCount {
    pub const MIN: usize = 3;
    pub const MAX: usize = 13;
    pub const DEFAULT: BottleCount = BottleCount(5);

    pub fn new(count: usize) -> Self {
        Self(count.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(&self) -> usize {
        self.0
    }

    pub fn change(&self, delta: isize) -> Self {
        let count = if delta.is_negative() {
            self.0.saturating_sub(delta.unsigned_abs())
        } else {
            self.0.saturating_add(delta as usize)
        };
        Self::new(count)
    }

    /// Maps a 0.0..=1.0 position along the setup slider to the nearest count.
    pub fn from_slider_fraction(fraction: f32) -> Self {
        let span = (Self::MAX - Self::MIN) as f32;
        let offset = (fraction.clamp(0.0, 1.0) * span).round() as usize;
        Self::new(Self::MIN + offset)
    }

    pub fn get_slider_fraction(&self) -> f32 {
        (self.0 - Self::MIN) as f32 / (Self::MAX - Self::MIN) as f32
    }

    pub fn get_difficulty(&self) -> Difficulty {
        match self.0 {
            0..=5 => Difficulty::Easy,
            6..=9 => Difficulty::Medium,
            _ => Difficulty::Hard,
        }
    }

    /// The first `count` palette colours, in palette order.
    pub fn get_colors(&self) -> Vec<BottleColor> {
        (0..self.0).map(BottleColor).collect()
    }
}

impl Default for BottleCount {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ControlAction {
    StartGame,
    NewGame,
    ChangeSettings,
    IncreaseBottles,
    DecreaseBottles,
    SetBottleCount(usize),
    Peek,
    CopyResult,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Button {
    label: String,
    action: ControlAction,
    color: Color,
    enabled: bool,
}
impl Button {
    pub fn new(label: &str, action: ControlAction, color: Color) -> Self {
        Self {
            label: label.to_string(),
            action,
            color,
            enabled: true,
        }
    }
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.enabled = !disabled;
        self
    }
    pub fn get_action(&self) -> ControlAction {
        self.action
    }
    pub fn get_label(&self) -> &str {
        &self.label
    }
    pub fn get_color(&self) -> Color {
        self.color
    }
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HitItem {
    Button { action: ControlAction },
    UserSlot { index: usize },
    Slider,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HitRecord {
    pub rect: Rect,
    pub item: HitItem,
    #[allow(dead_code)]
    pub order: usize,
}

#[derive(Default)]
pub struct HitTestRegistry {
    items: Vec<HitRecord>,
}

impl HitTestRegistry {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn push(&mut self, rect: Rect, item: HitItem, order: usize) {
        self.items.push(HitRecord { rect, item, order });
    }

    /// Returns the topmost item under the point (highest draw order).
    pub fn hit_test(&self, x: f32, y: f32) -> Option<&HitRecord> {
        self.items
            .iter()
            .rev() // last drawn wins
            .find(|r| r.rect.contains(vec2(x, y)))
    }

    pub fn find(&self, item: HitItem) -> Option<&HitRecord> {
        self.items.iter().find(|r| r.item == item)
    }
}
