pub mod camera;
pub mod life;
pub mod state;

pub mod prelude {
    use bevy::{color::Color, math::Vec2};

    pub const UPDATE_INTERVAL_MS: u64 = 20;

    pub const WINDOW_SIZE: Vec2 = Vec2::new(800.0, 600.0);

    pub const GRID_COLS: u32 = 80;
    pub const GRID_ROWS: u32 = 60;
    pub const BOARD_POS: Vec2 = Vec2::ZERO;
    pub const CELL_SIZE_PX: Vec2 = Vec2::splat(10.0);
    // cells render slightly smaller than their slot so the clear color shows
    // through as grid lines
    pub const CELL_SCALE: Vec2 = Vec2::splat(0.9);

    pub const COLOR_BG: Color = Color::srgb(10.0 / 255.0, 10.0 / 255.0, 10.0 / 255.0);
    pub const COLOR_GRID_LINE: Color = Color::srgb(40.0 / 255.0, 40.0 / 255.0, 40.0 / 255.0);
    pub const COLOR_WILL_DIE: Color = Color::srgb(170.0 / 255.0, 170.0 / 255.0, 170.0 / 255.0);
    pub const COLOR_ALIVE_NEXT: Color = Color::srgb(180.0 / 255.0, 0.0, 141.0 / 255.0);
}
