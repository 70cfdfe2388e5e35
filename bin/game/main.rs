use bus_driver::{
    audio::{self, Muted},
    input::{self, Input},
    scene, Camera, Config, Framebuffer, Render, Report, World,
};

use std::{path, thread, time};

pub struct Game {
    // engine stuff
    render: Render,
    framebuffer: Framebuffer,
    sound: Muted,
    // windowing
    pub window: winit::window::Window,
    window_size: winit::dpi::PhysicalSize<u32>,
    title: String,
    // navigation
    camera: Camera,
    // game
    world: World,
    tick_period: time::Duration,
    next_tick: time::Instant,
    report: Option<Report>,
}

struct QuitEvent;

impl Game {
    pub fn new(event_loop: &winit::event_loop::EventLoop<()>) -> Self {
        log::info!("Initializing");

        let config = Config::load(path::Path::new("data/config.ron"))
            .expect("Unable to load the main config");

        log::info!("Creating the window");
        let window_attributes = winit::window::Window::default_attributes()
            .with_title(config.window.title.as_str())
            .with_inner_size(winit::dpi::PhysicalSize::new(
                config.window.size[0],
                config.window.size[1],
            ));
        #[allow(deprecated)]
        let window = event_loop
            .create_window(window_attributes)
            .expect("Unable to create the window");
        let window_size = window.inner_size();

        let render = Render::new(&window);
        let extent = render.extent();
        let mut framebuffer = Framebuffer::new(extent.width, extent.height);
        framebuffer.bgra = render.is_bgra();

        log::info!("Generating the world");
        let world = World::new(&config);
        let tick_period = time::Duration::from_secs_f32(config.tick_seconds());

        Self {
            render,
            framebuffer,
            sound: Muted::default(),
            window,
            window_size,
            title: config.window.title.clone(),
            camera: Camera::default(),
            world,
            tick_period,
            next_tick: time::Instant::now() + tick_period,
            report: None,
        }
    }

    /// Runs the tick if it is due. Late ticks are not made up for.
    fn update(&mut self) -> Result<time::Instant, QuitEvent> {
        let now = time::Instant::now();
        if now < self.next_tick {
            return Ok(self.next_tick);
        }
        self.next_tick = now + self.tick_period;

        let report = self.world.tick();
        audio::follow_engine(&mut self.sound, &self.world.engine);
        self.window.request_redraw();
        match report {
            Some(report) => {
                self.report = Some(report);
                Err(QuitEvent)
            }
            None => Ok(self.next_tick),
        }
    }

    fn redraw(&mut self) {
        scene::draw(&self.world, &mut self.camera, &mut self.framebuffer);
        self.render.present(&self.framebuffer);
        self.window
            .set_title(&format!("{} | {}", self.title, self.world.instruments()));
    }

    pub fn on_event(&mut self, event: &winit::event::WindowEvent) -> Result<(), QuitEvent> {
        match *event {
            winit::event::WindowEvent::Resized(size) => {
                if size != self.window_size && size.width > 0 && size.height > 0 {
                    log::info!("Resizing to {:?}", size);
                    self.window_size = size;
                    self.render.resize(size.width, size.height);
                    let extent = self.render.extent();
                    self.framebuffer.resize(extent.width, extent.height);
                }
            }
            winit::event::WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        physical_key: winit::keyboard::PhysicalKey::Code(key_code),
                        state,
                        ..
                    },
                ..
            } => match input::on_key(key_code, state == winit::event::ElementState::Pressed) {
                Some(Input::Quit) => return Err(QuitEvent),
                Some(Input::Control(control)) => self.world.apply(control),
                None => {}
            },
            winit::event::WindowEvent::CloseRequested => {
                return Err(QuitEvent);
            }
            winit::event::WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
        Ok(())
    }

    fn final_report(&self) -> Report {
        self.report.clone().unwrap_or_else(|| self.world.report())
    }
}

impl Drop for Game {
    fn drop(&mut self) {
        if thread::panicking() {
            return;
        }
        log::info!("Deinitializing");
        self.render.wait_for_gpu();
    }
}

fn main() {
    env_logger::init();
    let event_loop = winit::event_loop::EventLoop::new().expect("Unable to create the event loop");
    let mut game = Game::new(&event_loop);

    #[allow(deprecated)]
    event_loop
        .run(|event, target| match event {
            winit::event::Event::AboutToWait => match game.update() {
                Ok(next_tick) => {
                    target.set_control_flow(winit::event_loop::ControlFlow::WaitUntil(next_tick));
                }
                Err(QuitEvent) => {
                    target.exit();
                }
            },
            winit::event::Event::WindowEvent { event, .. } => {
                if let Err(QuitEvent) = game.on_event(&event) {
                    target.exit();
                }
            }
            _ => {}
        })
        .expect("Event loop failed");

    println!("{}", game.final_report());
}
