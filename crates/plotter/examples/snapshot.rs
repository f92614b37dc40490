//! Renders a scene without a window and saves the result as a PNG.
//!
//! Usage: `cargo run -p plotter --example snapshot [OUTPUT]`

use std::{cell::RefCell, env, fs::File, io::BufWriter, rc::Rc};

use geometry::{Extent, ScreenPx, Viewport};
use graphics::{Color, GraphicsApi, Headless};
use log::info;
use plotter::{
    shapes::{Columns, DebugBox},
    FrameDriver,
};

const SIZE: Extent<u32, ScreenPx> = Extent::new(640, 360);
const FRAMES: u32 = 30;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let output = env::args().nth(1).unwrap_or_else(|| "snapshot.png".to_owned());

    let mut gfx = Headless::new(SIZE);
    let mut driver = FrameDriver::default();
    driver.resize(&mut gfx, SIZE);

    let mut columns = Columns::new(Viewport::from_xywh(20, 20, 400, 320));
    columns.set_values([3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0]);
    driver.registry_mut().append(Rc::new(RefCell::new(columns)));

    let mut debug = DebugBox::new(160, 60).with_color(Color::WHITE);
    debug.place(SIZE);
    driver.registry_mut().append(Rc::new(RefCell::new(debug)));

    for _ in 0..FRAMES {
        driver.render_frame(&mut gfx);
    }
    gfx.present();

    gfx.target().write_png(BufWriter::new(File::create(&output)?))?;
    info!("wrote frame {} to {}", driver.frame().count, output);
    Ok(())
}
