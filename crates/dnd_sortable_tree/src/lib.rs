mod tree;

pub use tree::*;

use gpui::App;

pub fn init(cx: &mut App) {
    tree::init(cx);
}
