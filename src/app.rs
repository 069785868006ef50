use crate::camera3d::Camera3D;
use crate::config::{AppConfig, AppConfigOverrides, DEFAULT_CONFIG_PATH};
use crate::cycle::DayCycle;
use crate::events::SkyEvent;
use crate::input::{Command, Input, DEFAULT_BINDINGS_PATH};
use crate::outline::{HoverState, OutlinePicker, OutlineStyle};
use crate::renderer::{FrameDrawList, FrameInputs, Renderer, SceneLighting};
use crate::scene::RoomScene;
use crate::simulation::SimulationContext;
use crate::time::Time;
use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::WindowId;

pub async fn run() -> Result<()> {
    run_with_overrides(AppConfigOverrides::default()).await
}

pub async fn run_with_overrides(overrides: AppConfigOverrides) -> Result<()> {
    let config = load_config(&overrides);
    let event_loop = EventLoop::new().context("Failed to create winit event loop")?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app).context("Event loop execution failed")?;
    app.shutdown();
    Ok(())
}

/// Config file merged with command-line overrides.
pub fn load_config(overrides: &AppConfigOverrides) -> AppConfig {
    let mut config = AppConfig::load_or_default(DEFAULT_CONFIG_PATH);
    if !overrides.is_empty() {
        log::info!("[config] command-line overrides: {}", overrides.applied_fields().join(", "));
        config.apply_overrides(overrides);
    }
    config
}

pub struct App {
    config: AppConfig,
    renderer: Renderer,
    sim: Option<SimulationContext>,
    scene: RoomScene,
    camera: Camera3D,
    picker: OutlinePicker,
    input: Input,
    time: Time,
    lighting: SceneLighting,
    view_changed: bool,
    should_close: bool,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let scene = RoomScene::load_or_demo(config.scene.path.as_deref(), &config.scene.tag_rules());
        let canvas_size = config.weather.canvas_size(config.window.width, config.window.height);
        let sim = SimulationContext::new(&config, canvas_size);
        Self {
            renderer: Renderer::new(&config.window, config.scene.background),
            sim: Some(sim),
            scene,
            camera: Camera3D::from_config(&config.camera),
            picker: OutlinePicker::new(OutlineStyle::from_config(&config.outline)),
            input: Input::from_config(DEFAULT_BINDINGS_PATH),
            time: Time::new(),
            lighting: SceneLighting::default(),
            view_changed: true,
            should_close: false,
            config,
        }
    }

    pub fn shutdown(&mut self) {
        if let Some(sim) = self.sim.take() {
            sim.shutdown();
        }
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.renderer.resize(size);
        self.view_changed = true;
        if size.width == 0 || size.height == 0 {
            return;
        }
        let (w, h) = self.config.weather.canvas_size(size.width, size.height);
        if let Some(sim) = self.sim.as_mut() {
            if sim.resize_canvas(w, h) {
                log::debug!("[sky] canvas resized to {w}x{h}");
            }
        }
    }

    fn apply_commands(&mut self) {
        let Some(sim) = self.sim.as_mut() else {
            return;
        };
        for command in self.input.drain_commands() {
            let cycle = sim.cycle_mut();
            match command {
                Command::TogglePause => {
                    let paused = cycle.toggle_paused();
                    log::info!("[cycle] {}", if paused { "paused" } else { "resumed" });
                }
                Command::AdjustDuration(delta) => {
                    let seconds = (cycle.duration_seconds() + delta)
                        .clamp(DayCycle::MIN_DURATION_SECONDS, DayCycle::MAX_DURATION_SECONDS);
                    cycle.set_cycle_duration(seconds);
                    log::info!("[cycle] duration {:.0}s", cycle.duration_seconds());
                }
                Command::Scrub(progress) => {
                    cycle.scrub(progress);
                    log::info!("[cycle] scrubbed to {:.2}", cycle.progress());
                }
                Command::Quit => self.should_close = true,
            }
        }
    }

    fn frame(&mut self) {
        self.time.tick();
        let dt = self.time.delta_seconds();
        self.apply_commands();
        let Some(sim) = self.sim.as_mut() else {
            return;
        };
        sim.tick(dt);

        let viewport = self.renderer.size();
        let pointer_moved = self.input.take_pointer_moved();
        let view_changed = std::mem::take(&mut self.view_changed);
        if pointer_moved || view_changed {
            let hover = self.picker.update(&self.scene, &self.camera, self.input.pointer(), viewport);
            if hover.changed {
                let group = match hover.state {
                    HoverState::Hovering(group) => Some(group),
                    HoverState::None => None,
                };
                let name = group.and_then(|g| self.scene.name(g)).map(str::to_string);
                sim.events_mut().push(SkyEvent::HoverChanged { group, name });
                if let Some(window) = self.renderer.window() {
                    window.set_cursor(hover.cursor.icon());
                }
            }
        }

        let draws = FrameDrawList::collect(&self.scene, &self.picker);
        let aspect = viewport.width.max(1) as f32 / viewport.height.max(1) as f32;
        let inputs = FrameInputs {
            draws: &draws,
            view: self.camera.view_matrix(),
            proj: self.camera.projection_matrix(aspect),
            sky: sim.canvas(),
            lighting: self.lighting,
            outline: self.picker.style(),
            outline_generation: self.picker.generation(),
        };
        if let Err(err) = self.renderer.render_frame(&inputs) {
            log::warn!("[renderer] frame skipped: {err:#}");
        }

        for event in sim.pump_audio(dt) {
            log::debug!("[sky] {event}");
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(err) = self.renderer.ensure_window(event_loop) {
            log::error!("[renderer] initialization failed: {err:?}");
            self.should_close = true;
            event_loop.exit();
            return;
        }
        let size = self.renderer.size();
        self.resize(size);
        self.renderer.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if self.renderer.window().is_some_and(|window| window.id() != id) {
            return;
        }
        self.input.handle_window_event(&event);
        match event {
            WindowEvent::CloseRequested => self.should_close = true,
            WindowEvent::Resized(size) => self.resize(size),
            WindowEvent::RedrawRequested => self.frame(),
            _ => {}
        }
        if self.should_close {
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_close {
            event_loop.exit();
            return;
        }
        self.renderer.request_redraw();
    }
}
