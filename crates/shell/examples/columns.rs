use std::{cell::RefCell, rc::Rc, thread, time::Duration};

use geometry::{Extent, Viewport};
use graphics::Color;
use plotter::{
    event_loop,
    shapes::{Columns, DebugBox},
    Config, FrameDriver, SharedGraphic,
};
use shell::{GlWindow, WindowDesc};

const TITLE: &str = "Columns";
const SIZE: Extent<u32, geometry::ScreenPx> = Extent::new(1024, 768);

const PALETTE: [(Color, Color); 3] = [
    (Color::new(0.94, 0.38, 0.57, 1.0), Color::new(0.53, 0.05, 0.31, 1.0)),
    (Color::new(0.49, 0.34, 0.76, 1.0), Color::new(0.19, 0.11, 0.57, 1.0)),
    (Color::new(0.16, 0.71, 0.96, 1.0), Color::new(0.0, 0.34, 0.61, 1.0)),
];

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut window = GlWindow::new(&WindowDesc {
        title: TITLE,
        size: SIZE,
        ..WindowDesc::default()
    })?;
    let mut gfx = window.create_graphics()?;

    let mut driver = FrameDriver::new(Config {
        clear_color: Color::new(0.05, 0.05, 0.05, 1.0),
        ..Config::default()
    });

    for (i, (background, color)) in PALETTE.into_iter().enumerate() {
        let mut columns = Columns::new(Viewport::from_xywh(40 + 300 * i as i32, 200, 280, 500))
            .with_colors(background, color);
        columns.set_values((1..=8).map(|n| ((n * (i + 3)) % 7 + 1) as f32));

        let columns: SharedGraphic = Rc::new(RefCell::new(columns));
        driver.registry_mut().append(columns);
    }

    let mut debug = DebugBox::new(300, 100);
    debug.place(SIZE);
    driver.registry_mut().append(Rc::new(RefCell::new(debug)));

    // A column that shows up from another thread once the window is open.
    let registrar = driver.registry().registrar();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(1));

        let mut late = Columns::new(Viewport::from_xywh(40, 40, 580, 120))
            .with_colors(Color::new(0.2, 0.2, 0.2, 1.0), Color::WHITE);
        late.set_values([3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0]);

        if registrar.submit(Box::new(late)).is_err() {
            log::warn!("window closed before the late column was added");
        }
    });

    event_loop::run(&mut window, &mut gfx, &mut driver)?;
    Ok(())
}
