//! Canvas 2D drawing of a `RenderSnapshot`

use std::f64::consts::TAU;

use glam::Vec2;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::layout::{self, Rect};
use crate::error::GameError;
use crate::sim::RunPhase;
use crate::sim::snapshot::{EffectKind, RenderSnapshot};

pub struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasRenderer {
    /// Bind to `canvas` and size its backing store to the arena
    pub fn new(canvas: HtmlCanvasElement, arena: Vec2) -> Result<Self, GameError> {
        let missing = || GameError::MissingRenderTarget {
            id: format!("{} (2d context)", canvas.id()),
        };
        let ctx = canvas
            .get_context("2d")
            .map_err(|_| missing())?
            .ok_or_else(missing)?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| missing())?;
        canvas.set_width(arena.x as u32);
        canvas.set_height(arena.y as u32);
        Ok(Self { canvas, ctx })
    }

    /// Map a pointer offset in CSS pixels to arena units
    pub fn to_arena(&self, offset_x: f64, offset_y: f64) -> Vec2 {
        let sx = self.canvas.width() as f64 / self.canvas.client_width().max(1) as f64;
        let sy = self.canvas.height() as f64 / self.canvas.client_height().max(1) as f64;
        Vec2::new((offset_x * sx) as f32, (offset_y * sy) as f32)
    }

    pub fn draw(&self, snap: &RenderSnapshot) {
        let ctx = &self.ctx;
        ctx.set_global_alpha(1.0);
        ctx.set_fill_style_str("#101018");
        ctx.fill_rect(0.0, 0.0, snap.arena.x as f64, snap.arena.y as f64);

        match snap.phase {
            RunPhase::CharacterSelect => {
                self.draw_character_select(snap);
                return;
            }
            RunPhase::GameOver => {
                self.draw_game_over(snap);
                return;
            }
            _ => {}
        }

        self.draw_world(snap);
        self.draw_hud(snap);

        match snap.phase {
            RunPhase::PausedForUpgrade => self.draw_draft(snap),
            RunPhase::Paused => {
                self.dim(snap.arena);
                self.centered_text("PAUSED", snap.arena / 2.0, "48px sans-serif", "#ffffff");
            }
            _ => {}
        }
    }

    fn draw_world(&self, snap: &RenderSnapshot) {
        let ctx = &self.ctx;
        let p = &snap.player;

        if let Some(r) = p.aura_radius {
            ctx.set_global_alpha(0.15);
            self.circle(p.pos, r, "#f0a040");
            ctx.set_global_alpha(1.0);
        }

        for fx in &snap.effects {
            let (color, radius) = layout::effect_style(fx.kind);
            if fx.kind == EffectKind::Star {
                // Fade in over the first 200ms
                ctx.set_global_alpha((fx.age_ms / 200.0).clamp(0.3, 1.0));
            }
            self.circle(fx.pos, radius, color);
            ctx.set_global_alpha(1.0);
        }

        for e in &snap.enemies {
            let r = e.radius * e.visual_scale;
            self.circle(e.pos, r, layout::enemy_color(e.kind));
            if e.confused {
                self.ring(e.pos, r + 3.0, "#ff66ff");
            }
            if e.health < e.max_health {
                let bar = Rect {
                    min: Vec2::new(e.pos.x - r, e.pos.y - r - 8.0),
                    size: Vec2::new(r * 2.0, 3.0),
                };
                self.bar(bar, e.health / e.max_health, "#e04040");
            }
        }

        let body = if p.stunned {
            "#f5d033"
        } else if p.slowed {
            "#6ec6f0"
        } else {
            "#4a90e2"
        };
        if p.invincible {
            ctx.set_global_alpha(0.5);
        }
        self.circle(p.pos, p.radius, body);
        ctx.set_global_alpha(1.0);
    }

    fn draw_hud(&self, snap: &RenderSnapshot) {
        let p = &snap.player;
        self.bar(layout::health_bar(), p.health_fraction, "#3fbf5f");
        let xp = if p.xp_to_next > 0 {
            p.xp as f32 / p.xp_to_next as f32
        } else {
            0.0
        };
        self.bar(layout::xp_bar(snap.arena), xp, "#4fd1c5");

        let ctx = &self.ctx;
        ctx.set_font("18px sans-serif");
        ctx.set_fill_style_str("#ffffff");
        ctx.set_text_align("left");
        let _ = ctx.fill_text(&format!("LV {}", p.level), 20.0, 58.0);
        ctx.set_text_align("center");
        let _ = ctx.fill_text(&snap.timer, snap.arena.x as f64 / 2.0, 32.0);
        ctx.set_text_align("right");
        let _ = ctx.fill_text(
            &format!("Kills {}", snap.kills),
            snap.arena.x as f64 - 20.0,
            32.0,
        );
        if snap.boss_alive {
            ctx.set_fill_style_str("#a83fd6");
            let _ = ctx.fill_text("BOSS", snap.arena.x as f64 - 20.0, 56.0);
        }
    }

    fn draw_draft(&self, snap: &RenderSnapshot) {
        self.dim(snap.arena);
        self.centered_text(
            &format!("Level {}!", snap.player.level),
            Vec2::new(snap.arena.x / 2.0, snap.arena.y / 2.0 - 140.0),
            "36px sans-serif",
            "#ffffff",
        );
        let n = snap.offers.len();
        for (i, offer) in snap.offers.iter().enumerate() {
            let rect = layout::card_rect(snap.arena, i, n);
            self.card(rect, i == snap.highlighted_offer);
            let c = rect.center();
            self.centered_text(&offer.name, c - Vec2::Y * 30.0, "22px sans-serif", "#ffffff");
            let small = "14px sans-serif";
            self.centered_text(&offer.description, c + Vec2::Y * 10.0, small, "#c8c8d0");
            self.centered_text(&format!("[{}]", i + 1), c + Vec2::Y * 60.0, small, "#808090");
        }
    }

    fn draw_character_select(&self, snap: &RenderSnapshot) {
        self.centered_text(
            "STARFALL SURVIVORS",
            Vec2::new(snap.arena.x / 2.0, 120.0),
            "48px sans-serif",
            "#ffe680",
        );
        let n = snap.characters.len();
        for (i, name) in snap.characters.iter().enumerate() {
            let rect = layout::card_rect(snap.arena, i, n);
            self.card(rect, i == snap.selected_character);
            self.centered_text(name, rect.center(), "26px sans-serif", "#ffffff");
        }
        self.centered_text(
            "Left / Right to choose, Enter to start",
            Vec2::new(snap.arena.x / 2.0, snap.arena.y - 100.0),
            "18px sans-serif",
            "#a0a0b0",
        );
    }

    fn draw_game_over(&self, snap: &RenderSnapshot) {
        let mid = snap.arena / 2.0;
        self.centered_text("GAME OVER", mid - Vec2::Y * 60.0, "56px sans-serif", "#e04040");
        self.centered_text(
            &format!(
                "Survived {}  -  Level {}  -  {} kills  -  {} bosses",
                snap.timer, snap.player.level, snap.kills, snap.bosses_defeated
            ),
            mid,
            "20px sans-serif",
            "#ffffff",
        );
        self.centered_text(
            "Press R to play again",
            mid + Vec2::Y * 50.0,
            "18px sans-serif",
            "#a0a0b0",
        );
    }

    // === Primitives ===

    fn circle(&self, pos: Vec2, r: f32, color: &str) {
        let ctx = &self.ctx;
        ctx.begin_path();
        let _ = ctx.arc(pos.x as f64, pos.y as f64, r.max(0.0) as f64, 0.0, TAU);
        ctx.set_fill_style_str(color);
        ctx.fill();
    }

    fn ring(&self, pos: Vec2, r: f32, color: &str) {
        let ctx = &self.ctx;
        ctx.begin_path();
        let _ = ctx.arc(pos.x as f64, pos.y as f64, r.max(0.0) as f64, 0.0, TAU);
        ctx.set_line_width(2.0);
        ctx.set_stroke_style_str(color);
        ctx.stroke();
    }

    fn bar(&self, rect: Rect, fraction: f32, color: &str) {
        let ctx = &self.ctx;
        let (x, y) = (rect.min.x as f64, rect.min.y as f64);
        let (w, h) = (rect.size.x as f64, rect.size.y as f64);
        ctx.set_fill_style_str("#2a2a36");
        ctx.fill_rect(x, y, w, h);
        ctx.set_fill_style_str(color);
        ctx.fill_rect(x, y, w * fraction.clamp(0.0, 1.0) as f64, h);
    }

    fn card(&self, rect: Rect, highlighted: bool) {
        let ctx = &self.ctx;
        let (x, y) = (rect.min.x as f64, rect.min.y as f64);
        let (w, h) = (rect.size.x as f64, rect.size.y as f64);
        ctx.set_fill_style_str("#1e1e2c");
        ctx.fill_rect(x, y, w, h);
        ctx.set_line_width(if highlighted { 4.0 } else { 1.0 });
        ctx.set_stroke_style_str(if highlighted { "#ffe680" } else { "#505064" });
        ctx.stroke_rect(x, y, w, h);
    }

    fn dim(&self, arena: Vec2) {
        let ctx = &self.ctx;
        ctx.set_global_alpha(0.6);
        ctx.set_fill_style_str("#000000");
        ctx.fill_rect(0.0, 0.0, arena.x as f64, arena.y as f64);
        ctx.set_global_alpha(1.0);
    }

    fn centered_text(&self, text: &str, at: Vec2, font: &str, color: &str) {
        let ctx = &self.ctx;
        ctx.set_font(font);
        ctx.set_fill_style_str(color);
        ctx.set_text_align("center");
        ctx.set_text_baseline("middle");
        let _ = ctx.fill_text(text, at.x as f64, at.y as f64);
        ctx.set_text_baseline("alphabetic");
    }
}
