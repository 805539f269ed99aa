//! Draw a few strokes headlessly and write the result as PNG.
//!
//! ```text
//! RUST_LOG=debug cargo run -p dp-editor --example headless_draw -- out.png
//! ```

use dp_core::config::{CanvasConfig, ToolKind, Viewport};
use dp_core::model::Color;
use dp_editor::{DrawEngine, PointerEvent};
use dp_render::{EncodeFormat, MemorySurface};
use std::f64::consts::TAU;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let out = std::env::args().nth(1).unwrap_or_else(|| "drawing.png".into());

    let mut config = CanvasConfig::default();
    config.set_viewport(Viewport {
        width: 400,
        height: 300,
    });
    let surface = MemorySurface::new(400, 300);
    let mut engine = DrawEngine::start(config, Box::new(surface))?;

    // A smoothed spiral.
    engine.set_stroke_color(Color::rgb(0x1e, 0x63, 0xc8));
    engine.set_stroke_width(4.0);
    engine.handle_pointer(&PointerEvent::down(200.0, 150.0));
    for i in 1..=120 {
        let t = i as f64 / 120.0;
        let (r, a) = (t * 120.0, t * 3.0 * TAU);
        engine.handle_pointer(&PointerEvent::moved(200.0 + r * a.cos(), 150.0 + r * a.sin()));
    }
    engine.handle_pointer(&PointerEvent::up(320.0, 150.0));

    // A filled rectangle.
    engine.set_tool(ToolKind::Rectangle);
    engine.set_fill_color(Color::rgba(0xf0, 0x80, 0x30, 0xc0));
    engine.set_paint_style(dp_core::model::PaintStyle::FillAndStroke);
    engine.handle_pointer(&PointerEvent::down(20.0, 20.0));
    engine.handle_pointer(&PointerEvent::moved(120.0, 90.0));
    engine.handle_pointer(&PointerEvent::up(120.0, 90.0));

    std::thread::sleep(Duration::from_millis(50));
    engine.pause();

    let png = engine.encode(EncodeFormat::Png, 100)?;
    std::fs::write(&out, png)?;
    log::info!(
        "wrote {out}: {} stroke(s), undo available: {}",
        engine.history_pointer() - 1,
        engine.can_undo()
    );
    Ok(())
}
