use blade_graphics as gpu;
use falling_box::{
    config::Config,
    input::InputState,
    render::TextBatch,
    text::{self, GlyphInstance},
    timing::FrameCounter,
    Camera, Error, ModelInstance, Render, Scene,
};

use std::{path::Path, process, thread, time};

pub struct Game {
    render: Render,
    // windowing
    pub window: winit::window::Window,
    window_size: winit::dpi::PhysicalSize<u32>,
    config: Config,
    // navigation
    camera: Camera,
    input: InputState,
    // pacing
    frames: FrameCounter,
    frame_budget: time::Duration,
    // simulation
    scene: Scene,
    cube: ModelInstance,
    platform: ModelInstance,
    glyphs: Vec<GlyphInstance>,
}

struct QuitEvent;

impl Game {
    pub fn new(
        event_loop: &winit::event_loop::EventLoop<()>,
        config: Config,
    ) -> Result<Self, Error> {
        log::info!("Initializing");

        let gpu_context = unsafe {
            gpu::Context::init(gpu::ContextDesc {
                presentation: true,
                validation: cfg!(debug_assertions),
                ..Default::default()
            })
        }
        .map_err(|e| Error::Gpu(format!("{e:?}")))?;

        log::info!("Creating the window");
        let window_attributes = winit::window::Window::default_attributes()
            .with_title(config.window.title.as_str())
            .with_inner_size(winit::dpi::PhysicalSize::new(
                config.window.width,
                config.window.height,
            ));
        #[allow(deprecated)] //TODO: move to `ApplicationHandler`
        let window = event_loop.create_window(window_attributes)?;
        let window_size = window.inner_size();
        let extent = gpu::Extent {
            width: window_size.width,
            height: window_size.height,
            depth: 1,
        };

        let grab = window
            .set_cursor_grab(winit::window::CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(winit::window::CursorGrabMode::Confined));
        if let Err(e) = grab {
            log::warn!("Unable to grab the cursor: {e}");
        }
        window.set_cursor_visible(false);

        let gpu_surface = gpu_context
            .create_surface(&window)
            .map_err(|e| Error::Gpu(format!("{e:?}")))?;
        let mut render = Render::new(gpu_context, gpu_surface, extent)?;
        render.set_background(config.scene.background);

        let mut loader = render.start_loading();
        log::info!("Loading model: {}", config.assets.model);
        let cube_model = loader.load_gltf(Path::new(&config.assets.model))?;
        log::info!("Loading font: {}", config.assets.font);
        let font = loader.load_png(Path::new(&config.assets.font))?;
        let plane_model = loader.load_plane(config.scene.plane_size);
        let submission = loader.finish();
        render.accept_submission(submission);
        render.set_font(font);

        let scene = Scene::new(&config.physics);
        log::info!(
            "Physics world ready, stepping every {:.4}s",
            scene.physics().time_step()
        );
        let snapshot = scene.snapshot();
        let mut cube = ModelInstance::new(cube_model, config.scene.box_scale, config.scene.box_color);
        cube.pos = snapshot.cube.position;
        let mut platform = ModelInstance::new(plane_model, 1.0, config.scene.plane_color);
        platform.pos = snapshot.platform.position;

        Ok(Self {
            render,
            window,
            window_size,
            camera: Camera::from(&config.camera),
            input: InputState::default(),
            frames: FrameCounter::new(config.window.target_fps),
            frame_budget: time::Duration::from_secs_f32(1.0 / config.window.target_fps.max(1) as f32),
            config,
            scene,
            cube,
            platform,
            glyphs: Vec::new(),
        })
    }

    fn redraw(&mut self) -> time::Duration {
        profiling::scope!("Frame");
        let frame_start = time::Instant::now();
        self.frames.tick();
        self.window
            .set_title(&format!("FPS: {}", self.frames.fps()));

        let snapshot = self.scene.advance();
        self.cube.pos = snapshot.cube.position;
        self.cube.rot = snapshot.box_rotation();
        self.platform.pos = snapshot.platform.position;

        let controls = self.input.camera_input(&self.config.controls);
        self.camera
            .update(controls.movement, controls.rotation, controls.zoom);
        self.input.end_frame();

        self.glyphs.clear();
        text::layout(
            &snapshot.overlay_lines().join("\n"),
            self.config.scene.text_origin,
            self.config.scene.text_size,
            &mut self.glyphs,
        );

        let models = [&self.platform, &self.cube];
        self.render.draw(
            &self.camera,
            &models,
            TextBatch {
                glyphs: &self.glyphs,
                color: self.config.scene.text_color,
            },
        );
        self.frame_budget.saturating_sub(frame_start.elapsed())
    }

    fn on_device_event(&mut self, event: &winit::event::DeviceEvent) {
        if let winit::event::DeviceEvent::MouseMotion { delta } = *event {
            self.input.on_mouse_motion(delta.0, delta.1);
        }
    }

    fn on_event(
        &mut self,
        event: &winit::event::WindowEvent,
    ) -> Result<winit::event_loop::ControlFlow, QuitEvent> {
        if self.input.on_window_event(event) {
            if let winit::event::WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        physical_key:
                            winit::keyboard::PhysicalKey::Code(winit::keyboard::KeyCode::Escape),
                        state: winit::event::ElementState::Pressed,
                        ..
                    },
                ..
            } = *event
            {
                return Err(QuitEvent);
            }
            return Ok(winit::event_loop::ControlFlow::Poll);
        }

        match *event {
            winit::event::WindowEvent::Resized(size) => {
                if size != self.window_size && size.width != 0 && size.height != 0 {
                    log::info!("Resizing to {:?}", size);
                    self.window_size = size;
                    self.render.resize(gpu::Extent {
                        width: size.width,
                        height: size.height,
                        depth: 1,
                    });
                }
            }
            winit::event::WindowEvent::CloseRequested => {
                return Err(QuitEvent);
            }
            winit::event::WindowEvent::RedrawRequested => {
                let wait = self.redraw();

                return Ok(
                    if let Some(repaint_after_instant) = std::time::Instant::now().checked_add(wait)
                    {
                        winit::event_loop::ControlFlow::WaitUntil(repaint_after_instant)
                    } else {
                        winit::event_loop::ControlFlow::Wait
                    },
                );
            }
            _ => {}
        }

        Ok(winit::event_loop::ControlFlow::Poll)
    }
}

impl Drop for Game {
    fn drop(&mut self) {
        if thread::panicking() {
            return;
        }
        log::info!(
            "Deinitializing after {} frames, {:.2}s simulated",
            self.frames.frame_count(),
            self.scene.physics().elapsed()
        );
        self.render.wait_for_gpu();
        self.cube.model.free(self.render.context());
        self.platform.model.free(self.render.context());
        self.render.deinit();
    }
}

fn run() -> Result<(), Error> {
    let config = Config::load(Path::new("data/config.ron"))?;
    let event_loop = winit::event_loop::EventLoop::new()?;
    let mut game = Game::new(&event_loop, config)?;

    #[allow(deprecated)] //TODO: move to `ApplicationHandler`
    event_loop.run(|event, target| match event {
        winit::event::Event::AboutToWait => {
            game.window.request_redraw();
        }
        winit::event::Event::DeviceEvent { event, .. } => {
            game.on_device_event(&event);
        }
        winit::event::Event::WindowEvent { event, .. } => match game.on_event(&event) {
            Ok(control_flow) => {
                target.set_control_flow(control_flow);
            }
            Err(QuitEvent) => {
                target.exit();
            }
        },
        _ => {}
    })?;
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        log::error!("{err}");
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            log::error!("  caused by: {cause}");
            source = cause.source();
        }
        process::exit(1);
    }
}
