//! Sawcube - a rotating colored cube driven by a detuning supersaw drone
//!
//! The longer the oscillator spread stays settled on its target, the more
//! detune shimmer builds - and the faster the cube spins and the brighter
//! the background glows. Every 10 seconds the target moves, the shimmer
//! collapses, and the cycle starts over. Click to layer a fresh instance
//! on top (and another one 5 seconds later).

mod audio;
mod cli;
mod color;
mod detune;
mod params;
mod rendering;
mod scene;
mod session;
mod sweep;
mod synth;

use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use clap::Parser;
use rendering::{RenderSystem, Uniforms};
use scene::SceneMesh;
use session::Session;

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    // Layered pipeline instances; the newest one drives the visuals
    sessions: Vec<Session>,

    // Echo restarts scheduled by clicks (fire 5 s after the click)
    pending_restarts: Vec<Instant>,

    // Configuration
    scene_kind: params::SceneKind,
    voice_count: usize,
    render_config: params::RenderConfig,
    recording_config: Option<params::RecordingConfig>,

    // Time tracking
    start_time: Instant,
    frame_count: usize,
}

impl App {
    fn new(args: &cli::Args) -> Self {
        let scene_kind = args.parse_scene();
        let voice_count = args.voice_count(scene_kind);
        let recording_config = args.create_recording_config();

        Self {
            window: None,
            render_system: None,
            sessions: Vec::new(),
            pending_restarts: Vec::new(),
            scene_kind,
            voice_count,
            render_config: params::RenderConfig::default(),
            recording_config,
            start_time: Instant::now(),
            frame_count: 0,
        }
    }

    /// Start a new pipeline instance on top of any running ones.
    /// Only the very first session records (one WAV per run).
    fn spawn_session(&mut self) {
        let recording = if self.sessions.is_empty() {
            self.recording_config.clone()
        } else {
            None
        };

        match Session::start(
            self.scene_kind,
            self.voice_count,
            self.render_config.clone(),
            recording,
        ) {
            Ok(session) => {
                self.sessions.push(session);
                println!("Session {} started", self.sessions.len());
            }
            Err(e) => eprintln!("Failed to start session: {}", e),
        }
    }

    /// Click handler: restart immediately, and once more after 5 seconds
    fn restart(&mut self) {
        self.spawn_session();
        self.pending_restarts
            .push(Instant::now() + Duration::from_secs(params::RESTART_ECHO_DELAY_S));
    }

    /// Fire any echo restarts that have come due
    fn run_pending_restarts(&mut self) {
        let now = Instant::now();
        let due = self
            .pending_restarts
            .iter()
            .filter(|at| **at <= now)
            .count();
        self.pending_restarts.retain(|at| *at > now);
        for _ in 0..due {
            self.spawn_session();
        }
    }

    /// Render a single frame, driven by the newest session
    fn render_frame(&mut self) {
        let Some(ref render_system) = self.render_system else {
            return;
        };
        let Some(session) = self.sessions.last_mut() else {
            return;
        };

        let now_s = self.start_time.elapsed().as_secs_f64();
        let frame = session.frame(now_s);

        render_system.update_uniforms(&Uniforms::new(frame.mvp));

        if let Err(e) = render_system.render(self.frame_count, frame.background) {
            eprintln!("Render error: {:?}", e);
        }
        self.frame_count += 1;
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        self.run_pending_restarts();
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        // Create window
        let window_attributes = Window::default_attributes()
            .with_title("Sawcube - Detune-Driven Cube")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

        // Initialize rendering system; context failure is fatal
        let mesh = SceneMesh::new(self.scene_kind);
        let render_system = match pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            &mesh,
            self.scene_kind,
            self.recording_config.clone(),
        )) {
            Ok(rs) => rs,
            Err(e) => {
                eprintln!("Fatal: {}", e);
                event_loop.exit();
                return;
            }
        };

        self.window = Some(window);
        self.render_system = Some(render_system);

        // First pipeline instance
        self.spawn_session();
        if self.sessions.is_empty() {
            // Audio context failure is fatal at startup too
            event_loop.exit();
            return;
        }

        println!("\nSawcube is running!");
        println!("Click to layer a new session, ESC to quit\n");
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                ..
            } => {
                self.restart();
            }
            WindowEvent::RedrawRequested => {
                self.render_frame();

                // Recording mode runs for a fixed frame count, then exits
                if let Some(ref rec) = self.recording_config {
                    if self.frame_count >= rec.total_frames() {
                        println!(
                            "Recording complete: {} frames in {}",
                            self.frame_count, rec.output_dir
                        );
                        for session in &self.sessions {
                            session.stop();
                        }
                        event_loop.exit();
                    }
                }
            }
            _ => {}
        }
    }
}

fn main() {
    let args = cli::Args::parse();

    println!("Sawcube - rotating cube + supersaw drone");
    println!("Initializing systems...\n");

    let mut app = App::new(&args);
    let event_loop = EventLoop::new().unwrap();
    let _ = event_loop.run_app(&mut app);
}
