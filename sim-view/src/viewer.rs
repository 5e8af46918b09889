//! Interactive 2D tree-slicing viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns a [`World`] plus the purely
//! visual state around it (camera, slash trail, loose leaves, camera shake)
//! and implements [`eframe::App`] to draw it and feed it pointer input.

use crate::leaves::{self, PALETTE_LEN};
use eframe::App;
use glam::Vec2;
use rand::{Rng, rng, rngs::ThreadRng};
use treecut_core::{
    Config, ConfigError, World,
    events::{CutEvent, TickEvents},
    leaf::DetachedLeaf,
};

/// World height of the ground line.
const GROUND_Y: f32 = 0.0;
/// Visible world height the trunk length is scaled against.
const CANVAS_HEIGHT: f32 = 800.0;
/// Fixed simulation step (seconds).
const TICK_SECONDS: f64 = 1.0 / 60.0;
/// Ticks run at most per frame; a longer stall drops the backlog.
const MAX_TICKS_PER_FRAME: usize = 5;
const TRAIL_LEN: usize = 12;

/// Main application state for the interactive viewer.
///
/// [`Viewer`] glues together:
/// - The simulation core: a [`World`] and the editable [`Config`] copy.
/// - Frontend collaborators the core leaves out: leaf placement, loose
///   leaf flight, camera shake.
/// - eframe/egui callbacks for drawing and pointer interaction.
///
/// The typical per-frame update is:
/// 1. Handle UI panels.
/// 2. Turn primary-button drags into swipe steps (ignored while branches
///    are still growing in).
/// 3. Run fixed 60 Hz ticks for the time that passed, if `running`.
/// 4. Render ground, stumps, leaves, pieces and the slash trail.
pub struct Viewer {
    world: World,
    cfg: Config,
    cfg_error: Option<String>,
    seed: f64,

    rng: ThreadRng,

    running: bool,
    zoom: f32,
    pan: egui::Vec2,

    grow_started: Option<f64>,
    last_tick_time: Option<f64>,
    tick_backlog: f64,

    drag_last: Option<Vec2>,
    trail: Vec<Vec2>,
    flying: Vec<DetachedLeaf>,
    shake: f32,

    cuts: usize,
    last_cut: Option<CutEvent>,
}

impl Viewer {
    /// Creates a viewer with a freshly grown tree from a random seed.
    ///
    /// ### Returns
    /// The viewer, or the error from validating [`Config::default`].
    pub fn new() -> Result<Self, ConfigError> {
        let mut rng = rng();
        let seed = rng.random_range(1..100_000) as f64;
        let cfg = Config::default();
        let world = World::new(cfg, seed, Vec2::new(0.0, GROUND_Y), CANVAS_HEIGHT)?;

        let mut viewer = Self {
            world,
            cfg,
            cfg_error: None,
            seed,
            rng,
            running: true,
            zoom: 1.0,
            pan: egui::vec2(0.0, 250.0),
            grow_started: None,
            last_tick_time: None,
            tick_backlog: 0.0,
            drag_last: None,
            trail: Vec::with_capacity(TRAIL_LEN),
            flying: Vec::new(),
            shake: 0.0,
            cuts: 0,
            last_cut: None,
        };
        viewer.regrow(seed);
        Ok(viewer)
    }

    /// Regrows the tree from `seed`, dropping every piece and loose leaf.
    ///
    /// The grow-in animation restarts on the next frame.
    fn regrow(&mut self, seed: f64) {
        self.seed = seed;
        self.world.reset(seed);
        let leaves = leaves::scatter_leaves(self.world.segments(), &mut self.rng);
        self.world.set_leaves(leaves);

        self.flying.clear();
        self.trail.clear();
        self.drag_last = None;
        self.shake = 0.0;
        self.cuts = 0;
        self.last_cut = None;
        self.grow_started = None;
    }

    /// Picks a new random seed and regrows.
    fn new_tree(&mut self) {
        let seed = self.rng.random_range(1..100_000) as f64;
        self.regrow(seed);
    }

    /// Pushes the edited configuration into the world and regrows.
    fn apply_config(&mut self) {
        match self.world.set_config(self.cfg) {
            Ok(()) => {
                self.cfg_error = None;
                self.regrow(self.seed);
            }
            Err(e) => {
                log::warn!("rejected config: {e}");
                self.cfg_error = Some(e.to_string());
            }
        }
    }

    /// Milliseconds since the grow-in started; unbounded before the first
    /// frame stamps the start.
    fn growth_elapsed_ms(&self, now: f64) -> f32 {
        self.grow_started
            .map_or(f32::MAX, |t| ((now - t) * 1000.0) as f32)
    }

    /// Feeds one pointer motion step to the world.
    ///
    /// ### Returns
    /// `true` if something was cut.
    fn swipe(&mut self, from: Vec2, to: Vec2, elapsed_ms: f32) -> bool {
        if self.world.schedule().is_animating(elapsed_ms) {
            return false;
        }
        let Some(ev) = self.world.on_swipe_segment(from, to) else {
            return false;
        };

        if ev.is_trunk() {
            log::debug!("trunk cut at ({:.1}, {:.1})", ev.point.x, ev.point.y);
        }
        self.cuts += 1;
        self.flying.extend(ev.detached_leaves.iter().cloned());
        self.last_cut = Some(ev);
        true
    }

    /// Runs the fixed-step ticks owed since the last call.
    ///
    /// ### Returns
    /// Number of ticks run.
    fn advance(&mut self, now: f64) -> usize {
        let Some(last) = self.last_tick_time.replace(now) else {
            return 0;
        };
        self.tick_backlog += (now - last).max(0.0);

        let mut ticks = 0;
        while self.tick_backlog >= TICK_SECONDS {
            if ticks == MAX_TICKS_PER_FRAME {
                self.tick_backlog = 0.0;
                break;
            }
            let ev = self.world.tick(GROUND_Y);
            self.absorb(ev);
            leaves::step_flying(&mut self.flying, GROUND_Y);
            self.shake *= 0.9;
            self.tick_backlog -= TICK_SECONDS;
            ticks += 1;
        }
        ticks
    }

    fn absorb(&mut self, ev: TickEvents) {
        if let Some(s) = ev.max_shake() {
            self.shake = self.shake.max(s);
        }
        self.flying.extend(ev.shed_leaves);
    }

    /// Random screen offset for the current camera shake.
    fn shake_offset(&mut self) -> egui::Vec2 {
        if self.shake < 0.1 {
            return egui::Vec2::ZERO;
        }
        let s = self.shake;
        egui::vec2(
            self.rng.random_range(-s..s),
            self.rng.random_range(-s..s),
        )
    }

    /// Converts a world-space position to screen-space.
    ///
    /// World coordinates are scaled by `zoom`, offset by `pan`, and then
    /// centered inside the given `rect`. The y-axis is flipped so that
    /// positive y goes up in world space.
    ///
    /// ### Parameters
    /// - `p` - World-space position.
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

    /// Converts a screen-space position back to world-space.
    ///
    /// This is the inverse of [`Viewer::world_to_screen`] (up to floating
    /// point rounding), using the same `zoom`, `pan`, and `rect` center.
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        let center = rect.center();
        let x = (p.x - center.x - self.pan.x) / self.zoom;
        let y = (center.y - p.y + self.pan.y) / self.zoom;
        Vec2::new(x, y)
    }

    fn quad_to_screen(
        &self,
        quad: [Vec2; 4],
        rect: egui::Rect,
        offset: egui::Vec2,
    ) -> Vec<egui::Pos2> {
        quad.iter()
            .map(|&p| self.world_to_screen(p, rect) + offset)
            .collect()
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

    /// Helper to draw a labeled `u32` [`egui::DragValue`].
    fn labeled_drag_u32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut u32,
        range: std::ops::RangeInclusive<u32>,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(1.0));
        });
    }

    /// Builds the top panel UI (run controls, seed, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }

                if ui.button("New tree").clicked() {
                    self.new_tree();
                }

                ui.add(
                    egui::DragValue::new(&mut self.seed)
                        .prefix("seed = ")
                        .range(0.0..=1.0e6)
                        .speed(1.0),
                );
                if ui.button("Regrow").clicked() {
                    self.regrow(self.seed);
                }

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 0.1..=5.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar (seed, counts, last cut).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("seed = {}", self.world.seed()));
                ui.separator();
                ui.label(format!("segments = {}", self.world.segments().len()));
                ui.label(format!("detached = {}", self.world.cut_branches().len()));
                ui.label(format!("pieces = {}", self.world.pieces().len()));
                ui.label(format!("loose leaves = {}", self.flying.len()));
                ui.label(format!("cuts = {}", self.cuts));
                if let Some(cut) = &self.last_cut {
                    ui.separator();
                    ui.label(format!(
                        "last cut: depth {} thickness {:.1} rings {}",
                        cut.depth, cut.thickness, cut.ring_count
                    ));
                }
            });
        });
    }

    /// Builds the right-hand configuration panel.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("Config");

                ui.separator();
                ui.label("Growth");
                let g = &mut self.cfg.growth;
                Self::labeled_drag_u32(ui, "max_depth:", &mut g.max_depth, 1..=12);
                Self::labeled_drag_f32(
                    ui,
                    "base_thickness:",
                    &mut g.base_thickness,
                    1.0..=80.0,
                    0.5,
                );
                Self::labeled_drag_f32(ui, "length_decay:", &mut g.length_decay, 0.3..=1.0, 0.01);
                Self::labeled_drag_f32(
                    ui,
                    "thickness_decay:",
                    &mut g.thickness_decay,
                    0.3..=1.0,
                    0.01,
                );
                Self::labeled_drag_f32(ui, "max_bend:", &mut g.max_bend, 0.0..=1.0, 0.01);

                ui.separator();
                ui.label("Cutting");
                let c = &mut self.cfg.cut;
                Self::labeled_drag_f32(
                    ui,
                    "leaf_detach_chance:",
                    &mut c.leaf_detach_chance,
                    0.0..=1.0,
                    0.01,
                );
                Self::labeled_drag_f32(
                    ui,
                    "min_remainder_length:",
                    &mut c.min_remainder_length,
                    0.0..=20.0,
                    0.1,
                );

                ui.separator();
                ui.label("Physics");
                let p = &mut self.cfg.physics;
                Self::labeled_drag_f32(ui, "gravity:", &mut p.gravity, -2.0..=0.0, 0.01);
                Self::labeled_drag_f32(ui, "bounce_speed:", &mut p.bounce_speed, 0.0..=20.0, 0.1);
                Self::labeled_drag_f32(
                    ui,
                    "bounce_restitution:",
                    &mut p.bounce_restitution,
                    0.0..=1.0,
                    0.01,
                );
                Self::labeled_drag_f32(
                    ui,
                    "min_support_span:",
                    &mut p.min_support_span,
                    0.0..=50.0,
                    0.5,
                );
                Self::labeled_drag_u32(ui, "rest_ticks:", &mut p.rest_ticks, 0..=240);
                Self::labeled_drag_u32(ui, "max_pivot_ticks:", &mut p.max_pivot_ticks, 1..=3600);
                Self::labeled_drag_f32(
                    ui,
                    "leaf_shed_chance:",
                    &mut p.leaf_shed_chance,
                    0.0..=1.0,
                    0.01,
                );

                ui.separator();
                ui.label("Fade");
                let f = &mut self.cfg.fade;
                Self::labeled_drag_u32(ui, "leaf_fade_delay:", &mut f.leaf_fade_delay, 0..=600);
                Self::labeled_drag_u32(ui, "wood_fade_delay:", &mut f.wood_fade_delay, 0..=600);

                ui.separator();
                if ui.button("Apply & regrow").clicked() {
                    self.apply_config();
                }
                if ui.button("Reset cfg to default").clicked() {
                    self.cfg = Config::default();
                    self.apply_config();
                }
                if let Some(err) = &self.cfg_error {
                    ui.colored_label(egui::Color32::LIGHT_RED, err.as_str());
                }
            });
    }

    /// Builds the central panel where the scene is drawn and slashed.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(egui::Color32::from_rgb(18, 22, 30)))
            .show(ctx, |ui| {
                let response =
                    ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
                let rect = response.rect;
                let painter = ui.painter_at(rect);

                let now = ctx.input(|i| i.time);
                self.grow_started.get_or_insert(now);
                let elapsed = self.growth_elapsed_ms(now);

                // Slash with the primary button.
                if response.dragged_by(egui::PointerButton::Primary)
                    && let Some(pos) = response.interact_pointer_pos()
                {
                    let world = self.screen_to_world(pos, rect);
                    if let Some(prev) = self.drag_last {
                        self.swipe(prev, world, elapsed);
                    }
                    self.drag_last = Some(world);
                    self.trail.push(world);
                    if self.trail.len() > TRAIL_LEN {
                        self.trail.remove(0);
                    }
                }
                if response.drag_stopped() {
                    self.drag_last = None;
                    self.trail.clear();
                }

                // Pan with the secondary button.
                if response.dragged_by(egui::PointerButton::Secondary) {
                    self.pan += response.drag_delta();
                }

                // Zoom around the mouse cursor.
                let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
                if scroll != 0.0 {
                    let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                    let world_before = self.screen_to_world(pointer_screen, rect);

                    let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                    self.zoom = (self.zoom * factor).clamp(0.1, 5.0);

                    let screen_after = self.world_to_screen(world_before, rect);
                    self.pan += pointer_screen - screen_after;
                }

                if self.running {
                    self.advance(now);
                } else {
                    self.last_tick_time = None;
                }

                let offset = self.shake_offset();
                self.draw_scene(&painter, rect, offset, elapsed);

                if self.running || self.world.schedule().is_animating(elapsed) {
                    ctx.request_repaint();
                }
            });
    }

    /// Draws ground, standing tree, leaves, pieces and the slash trail.
    fn draw_scene(
        &self,
        painter: &egui::Painter,
        rect: egui::Rect,
        offset: egui::Vec2,
        elapsed: f32,
    ) {
        let bark = egui::Color32::from_rgb(92, 64, 44);
        let schedule = self.world.schedule();

        // Ground.
        let left = self.world_to_screen(Vec2::new(-5000.0, GROUND_Y), rect) + offset;
        let right = self.world_to_screen(Vec2::new(5000.0, GROUND_Y), rect) + offset;
        painter.line_segment([left, right], egui::Stroke::new(2.0, egui::Color32::DARK_GREEN));

        // Standing tree, grown in per segment.
        for seg in self.world.tree().standing() {
            let Some(quad) = seg.partial_quad(schedule.segment_growth(seg.index, elapsed)) else {
                continue;
            };
            let pts = self.quad_to_screen(quad, rect, offset);
            painter.add(egui::Shape::convex_polygon(pts, bark, egui::Stroke::NONE));
        }

        for leaf in self.world.leaves().iter().filter(|l| l.is_visible()) {
            let scale = schedule.leaf_scale(leaf.segment, elapsed);
            if scale <= 0.0 {
                continue;
            }
            let p = self.world_to_screen(leaf.position, rect) + offset;
            painter.circle_filled(p, leaf.size * 0.5 * scale * self.zoom, leaf_color(leaf.tint));
        }

        // Falling pieces and the leaves riding them.
        for piece in self.world.pieces() {
            let wood = bark.gamma_multiply(piece.alpha);
            for quad in piece.world_quads() {
                let pts = self.quad_to_screen(quad, rect, offset);
                painter.add(egui::Shape::convex_polygon(pts, wood, egui::Stroke::NONE));
            }
            for leaf in piece.world_leaves() {
                let p = self.world_to_screen(leaf.position, rect) + offset;
                let color = leaf_color(leaf.tint).gamma_multiply(leaf.alpha * piece.alpha);
                painter.circle_filled(p, leaf.size * 0.5 * self.zoom, color);
            }
        }

        for leaf in &self.flying {
            let p = self.world_to_screen(leaf.position, rect) + offset;
            let color = leaf_color(leaf.tint).gamma_multiply(leaf.life.clamp(0.0, 1.0));
            painter.circle_filled(p, leaf.size * 0.5 * self.zoom, color);
        }

        // Slash trail.
        let stroke = egui::Stroke::new(2.0, egui::Color32::from_white_alpha(180));
        for line in self.trail_to_screen(rect, offset) {
            painter.line_segment(line, stroke);
        }
    }

    /// Consecutive trail points as screen-space line segments, shaken along
    /// with the rest of the scene.
    fn trail_to_screen(&self, rect: egui::Rect, offset: egui::Vec2) -> Vec<[egui::Pos2; 2]> {
        self.trail
            .windows(2)
            .map(|pair| {
                [
                    self.world_to_screen(pair[0], rect) + offset,
                    self.world_to_screen(pair[1], rect) + offset,
                ]
            })
            .collect()
    }
}

fn leaf_color(tint: u32) -> egui::Color32 {
    const PALETTE: [(u8, u8, u8); PALETTE_LEN as usize] = [
        (74, 140, 62),
        (96, 160, 70),
        (58, 118, 54),
        (132, 168, 72),
        (170, 150, 60),
    ];
    let (r, g, b) = PALETTE[(tint % PALETTE_LEN) as usize];
    egui::Color32::from_rgb(r, g, b)
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::Pos2::new(0.0, 0.0), egui::vec2(800.0, 600.0))
    }

    fn viewer() -> Viewer {
        Viewer::new().expect("default config is valid")
    }

    fn trunk_swipe() -> (Vec2, Vec2) {
        (Vec2::new(-80.0, GROUND_Y + 60.0), Vec2::new(80.0, GROUND_Y + 60.0))
    }

    #[test]
    fn world_to_screen_and_back_is_roundtrip() {
        let mut viewer = viewer();
        viewer.zoom = 2.0;
        viewer.pan = egui::vec2(15.0, -7.0);
        let rect = test_rect();

        for p in [Vec2::new(0.0, 0.0), Vec2::new(10.0, -5.0), Vec2::new(-3.5, 8.25)] {
            let back = viewer.screen_to_world(viewer.world_to_screen(p, rect), rect);
            assert!(
                (back - p).abs().max_element() < 1e-4,
                "roundtrip mismatch: p={p:?}, back={back:?}"
            );
        }
    }

    #[test]
    fn slash_trail_shakes_with_the_scene() {
        let mut viewer = viewer();
        let rect = test_rect();
        viewer.trail = vec![Vec2::new(-10.0, 40.0), Vec2::new(0.0, 45.0), Vec2::new(12.0, 50.0)];
        let offset = egui::vec2(3.0, -2.0);

        let lines = viewer.trail_to_screen(rect, offset);
        assert_eq!(lines.len(), 2);
        for (line, pair) in lines.iter().zip(viewer.trail.windows(2)) {
            assert_eq!(line[0], viewer.world_to_screen(pair[0], rect) + offset);
            assert_eq!(line[1], viewer.world_to_screen(pair[1], rect) + offset);
        }
    }

    #[test]
    fn swipes_are_ignored_while_the_tree_animates() {
        let mut viewer = viewer();
        let (a, b) = trunk_swipe();

        assert!(!viewer.swipe(a, b, 0.0));
        assert!(viewer.world.pieces().is_empty());

        assert!(viewer.swipe(a, b, f32::MAX));
        assert_eq!(viewer.world.pieces().len(), 1);
        assert_eq!(viewer.cuts, 1);
        assert!(viewer.last_cut.as_ref().is_some_and(|c| c.is_trunk()));
    }

    #[test]
    fn regrow_clears_cuts_and_replants_leaves() {
        let mut viewer = viewer();
        let (a, b) = trunk_swipe();
        viewer.swipe(a, b, f32::MAX);
        viewer.shake = 3.0;

        let seed = viewer.seed;
        viewer.regrow(seed);

        assert!(viewer.world.pieces().is_empty());
        assert!(viewer.world.cut_branches().is_empty());
        assert!(!viewer.world.leaves().is_empty());
        assert!(viewer.world.leaves().iter().all(|l| l.is_visible()));
        assert_eq!(viewer.cuts, 0);
        assert_eq!(viewer.shake, 0.0);
        assert!(viewer.grow_started.is_none());
    }

    #[test]
    fn advance_runs_fixed_steps_and_caps_backlog() {
        let mut viewer = viewer();
        assert_eq!(viewer.advance(1.0), 0, "first call only stamps the clock");
        assert_eq!(viewer.advance(1.06), 3);
        assert_eq!(viewer.advance(100.0), MAX_TICKS_PER_FRAME);
        assert_eq!(viewer.tick_backlog, 0.0);
    }

    #[test]
    fn invalid_config_is_reported_not_applied() {
        let mut viewer = viewer();
        viewer.cfg.cut.leaf_detach_chance = 2.0;
        viewer.apply_config();
        assert!(viewer.cfg_error.is_some());
        assert_eq!(
            viewer.world.config().cut.leaf_detach_chance,
            Config::default().cut.leaf_detach_chance
        );

        viewer.cfg = Config::default();
        viewer.apply_config();
        assert!(viewer.cfg_error.is_none());
    }

    #[test]
    fn leaf_palette_wraps() {
        assert_eq!(leaf_color(0), leaf_color(PALETTE_LEN));
    }
}
