//! Interactive mesh growth viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns the simulation state
//! ([`Simulation`] plus camera and timing) and implements
//! [`eframe::App`] to render and control the simulation through an
//! egui UI.

use eframe::App;
use glam::{Vec2, Vec3};
use mesh_core::{config::Config, sim::Simulation};

/// Main application state for the interactive viewer.
///
/// [`Viewer`] glues together:
/// - The simulation core: [`Simulation`] (mesh, spatial grid, counters).
/// - An editable [`Config`] copy applied from the side panel.
/// - Camera state (orbit yaw/pitch, zoom, pan) and step timing.
///
/// The typical per-frame update is:
/// 1. Handle UI interactions / input.
/// 2. If `running` is `true` and enough time has passed, call
///    [`Viewer::step_once`].
/// 3. Paint the wireframe with per-vertex colors.
///
/// ### Fields
/// - `sim` - The running simulation.
/// - `ui_cfg` - Edited configuration; structural fields (resolution,
///   size, seed, cell size) only take effect on "Apply & reset", while
///   the live tunables are pushed into the simulation every frame.
///
/// - `running` - Whether the simulation is currently auto-advancing.
/// - `yaw`, `pitch` - Orbit angles for the 3D -> 2D projection.
/// - `zoom` - Zoom factor for world-to-screen coordinate mapping.
/// - `pan` - Screen-space pan offset in pixels.
///
/// - `step_interval` - Target time step between automatic simulation
///   steps (seconds); also used as the fixed simulation `dt`.
/// - `last_step_time` - Time stamp of the last step (egui time).
/// - `last_step_dt` - Actual time delta between the last two steps
///   (for display only).
pub struct Viewer {
    sim: Simulation,
    ui_cfg: Config,

    running: bool,
    yaw: f32,
    pitch: f32,
    zoom: f32,
    pan: egui::Vec2,

    step_interval: f64,
    last_step_time: f64,
    last_step_dt: f64,
}

impl Viewer {
    /// Creates a new viewer with a default-configured simulation.
    ///
    /// The camera starts tilted so the initially flat mesh reads as a
    /// surface rather than a line.
    ///
    /// ### Returns
    /// A fully-initialized [`Viewer`] ready to be passed to
    /// `eframe::run_native`.
    pub fn new() -> Self {
        let cfg = Config::default();
        Self {
            sim: Simulation::new(cfg),
            ui_cfg: cfg,
            running: false,
            yaw: 0.6,
            pitch: -1.0,
            zoom: 60.0,
            pan: egui::vec2(0.0, 0.0),
            step_interval: 0.05,
            last_step_time: 0.0,
            last_step_dt: 0.0,
        }
    }

    /// Resets the simulation to a fresh initial grid using the edited
    /// configuration. Camera settings are kept; auto-run stops.
    fn reset(&mut self) {
        self.sim = Simulation::new(self.ui_cfg);
        self.ui_cfg = self.sim.cfg;
        self.running = false;
    }

    /// Advances the simulation by a single fixed-dt step.
    ///
    /// Live tunables (collision threshold, growth speed, check budget)
    /// are copied into the simulation first so slider changes take
    /// effect immediately.
    fn step_once(&mut self) {
        self.sim.cfg.collision_threshold = self.ui_cfg.collision_threshold;
        self.sim.cfg.growth_speed = self.ui_cfg.growth_speed;
        self.sim.cfg.collision_checks = self.ui_cfg.collision_checks;
        self.sim.step(self.step_interval as f32);
    }

    /// Rotates a world position into view space.
    ///
    /// Yaw spins the mesh around the world Z axis, pitch tilts it
    /// around the view X axis. The result's x/z land on screen and y is
    /// depth.
    fn rotate(&self, p: Vec3) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let spun = Vec3::new(p.x * cy - p.y * sy, p.x * sy + p.y * cy, p.z);
        let (sp, cp) = self.pitch.sin_cos();
        Vec3::new(
            spun.x,
            spun.y * cp - spun.z * sp,
            spun.y * sp + spun.z * cp,
        )
    }

    /// Converts a projected (view-plane) position to screen-space.
    ///
    /// View coordinates are scaled by `zoom`, offset by `pan`, and then
    /// centered inside the given `rect`. The vertical axis is flipped
    /// so that positive view-up goes up on screen.
    ///
    /// ### Parameters
    /// - `p` - View-plane position (rotated x and z).
    /// - `rect` - Screen-space rectangle representing the drawing area.
    ///
    /// ### Returns
    /// The corresponding egui position in screen-space.
    fn world_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        egui::pos2(
            center.x + p.x * self.zoom + self.pan.x,
            center.y - p.y * self.zoom + self.pan.y,
        )
    }

    /// Converts a screen-space position back to the view plane.
    ///
    /// This is the inverse of [`Viewer::world_to_screen`] (up to
    /// floating point rounding), using the same `zoom`, `pan`, and
    /// `rect` center.
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        let center = rect.center();
        let x = (p.x - center.x - self.pan.x) / self.zoom;
        let y = (center.y - p.y + self.pan.y) / self.zoom;
        Vec2::new(x, y)
    }

    /// Helper to draw a labeled `usize` [`egui::DragValue`].
    fn labeled_drag_usize(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut usize,
        range: std::ops::RangeInclusive<usize>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Helper to draw a labeled `f32` [`egui::DragValue`].
    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (run controls, stepping, maintenance ops).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }

                ui.add(
                    egui::DragValue::new(&mut self.step_interval)
                        .prefix("dt target = ")
                        .range(0.01..=0.5)
                        .speed(0.01),
                );

                if ui.button("Step").clicked() {
                    let now = ctx.input(|i| i.time);
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = now - self.last_step_time;
                    }
                    self.step_once();
                    self.last_step_time = now;
                }

                if ui.button("Reset").clicked() {
                    self.reset();
                }

                ui.separator();

                if ui.button("Subdivide").clicked() {
                    self.sim.subdivide_now();
                }

                if ui.button("Smooth").clicked() {
                    self.sim.smooth();
                }

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 5.0..=300.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar (timing and telemetry counters).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("dt target = {:.3} s", self.step_interval));
                ui.label(format!("dt last = {:.3} s", self.last_step_dt));
                ui.separator();
                ui.label(format!("t = {:.1} s", self.sim.time()));
                ui.label(format!("vertices = {}", self.sim.vertex_count()));
                ui.label(format!("faces = {}", self.sim.face_count()));
                ui.label(format!("collisions = {}", self.sim.collision_count()));
            });
        });
    }

    /// Builds the right-hand configuration panel for simulation parameters.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Config");

                ui.separator();
                ui.label("Initial grid (applied on reset)");
                Self::labeled_drag_usize(
                    ui,
                    "resolution:",
                    &mut self.ui_cfg.resolution,
                    1..=50,
                    1.0,
                );
                Self::labeled_drag_f32(ui, "size:", &mut self.ui_cfg.size, 0.5..=20.0, 0.1);
                Self::labeled_drag_f32(
                    ui,
                    "cell_size:",
                    &mut self.ui_cfg.cell_size,
                    0.1..=2.0,
                    0.05,
                );
                ui.horizontal(|ui| {
                    ui.label("seed:");
                    ui.add(egui::DragValue::new(&mut self.ui_cfg.seed).speed(1.0));
                });

                ui.separator();
                ui.label("Live tunables");
                Self::labeled_drag_f32(
                    ui,
                    "collision_threshold:",
                    &mut self.ui_cfg.collision_threshold,
                    0.01..=1.0,
                    0.01,
                );
                Self::labeled_drag_f32(
                    ui,
                    "growth_speed:",
                    &mut self.ui_cfg.growth_speed,
                    0.0..=5.0,
                    0.05,
                );
                Self::labeled_drag_usize(
                    ui,
                    "collision_checks:",
                    &mut self.ui_cfg.collision_checks,
                    100..=20000,
                    50.0,
                );

                ui.separator();
                if ui.button("Apply & reset").clicked() {
                    self.reset();
                }
                if ui.button("Reset cfg to default").clicked() {
                    self.ui_cfg = Config::default();
                }
            });
    }

    /// Builds the central panel where the mesh is drawn and the camera
    /// is controlled.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Orbit with drag, pan with shift-drag.
            if response.dragged() {
                let delta = response.drag_delta();
                if ui.ctx().input(|i| i.modifiers.shift) {
                    self.pan += delta;
                } else {
                    self.yaw += delta.x * 0.01;
                    self.pitch = (self.pitch + delta.y * 0.01).clamp(-1.55, 1.55);
                }
            }

            // Zoom around the cursor with scroll.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                let world_before = self.screen_to_world(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(5.0, 300.0);

                let screen_after = self.world_to_screen(world_before, rect);
                let delta = pointer_screen - screen_after;
                self.pan += delta;
            }

            self.draw_mesh(&painter, rect);

            // Auto-run simulation if requested.
            if self.running {
                let now = ctx.input(|i| i.time);
                let elapsed = now - self.last_step_time;
                if elapsed >= self.step_interval {
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = elapsed;
                    }
                    self.step_once();
                    self.last_step_time = now;
                }

                ctx.request_repaint();
            }
        });
    }

    /// Paints the wireframe using the simulation's render snapshots,
    /// averaging the per-vertex colors along each edge and drawing
    /// boundary edges slightly heavier.
    fn draw_mesh(&self, painter: &egui::Painter, rect: egui::Rect) {
        let colors = self.sim.vertex_colors();
        let projected: Vec<egui::Pos2> = self
            .sim
            .mesh
            .vertices
            .iter()
            .map(|v| {
                let r = self.rotate(v.pos);
                self.world_to_screen(Vec2::new(r.x, r.z), rect)
            })
            .collect();

        for edge in &self.sim.mesh.edges {
            let (a, b) = (edge.v1, edge.v2);
            let ca = colors[a];
            let cb = colors[b];
            let color = egui::Color32::from_rgb(
                ((ca[0] + cb[0]) * 0.5 * 255.0) as u8,
                ((ca[1] + cb[1]) * 0.5 * 255.0) as u8,
                ((ca[2] + cb[2]) * 0.5 * 255.0) as u8,
            );
            let width = if edge.is_boundary() { 1.6 } else { 1.0 };
            painter.line_segment(
                [projected[a], projected[b]],
                egui::Stroke::new(width, color),
            );
        }
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    ///
    /// This method:
    /// - Renders the top control bar and status bar.
    /// - Renders the config side panel.
    /// - Draws the central mesh view and handles camera interaction.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}
