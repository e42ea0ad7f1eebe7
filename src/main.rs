mod clipboard;
mod config;
mod gameplay;
mod model;
mod renderer;
mod reveal;
mod session;

use crate::config::{GameConfig, window_conf};
use crate::gameplay::*;

use macroquad::prelude::*;

#[macroquad::main(window_conf)]
async fn main() {
    let mut engine = GameEngine::new(GameConfig::default());
    info!("Bottle matching ready");
    loop {
        engine.update(get_time());
        engine.render();

        let (x, y) = mouse_position();
        if is_mouse_button_pressed(MouseButton::Left) {
            engine.handle_pointer_pressed(x, y);
        } else if is_mouse_button_down(MouseButton::Left) {
            engine.handle_pointer_moved(x, y);
        }
        // A quick click can press and release within one frame.
        if is_mouse_button_released(MouseButton::Left) {
            engine.handle_pointer_released(x, y);
        }
        for key in get_keys_pressed() {
            engine.handle_key(key);
        }
        next_frame().await;
    }
}
