// Arena rendering
// This file contains the canvas drawing for the battle field, the note lanes and the bonus round.
use web_sys::CanvasRenderingContext2d;

use crate::bonus::{BonusItem, ItemKind};
use crate::config::LANE_COUNT;
use crate::engine::Snapshot;

/// Lane labels, left to right.
pub const LANE_KEYS: [&str; LANE_COUNT] = ["D", "F", "J", "K"];
const LANE_COLORS: [&str; LANE_COUNT] = ["#ef4444", "#3b82f6", "#22c55e", "#eab308"];

/// Top of the note lanes as a fraction of canvas height.
pub const LANE_TOP: f64 = 0.45;
/// Hit line as a fraction of canvas height.
pub const HIT_LINE: f64 = 0.88;

/// Layout in canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Layout {
    pub width: f64,
    pub height: f64,
}

impl Layout {
    pub fn lane_width(&self) -> f64 {
        self.width / LANE_COUNT as f64
    }

    /// Lane under a canvas x coordinate.
    pub fn lane_at(&self, x: f64) -> Option<usize> {
        if x < 0.0 || x >= self.width {
            return None;
        }
        Some(((x / self.lane_width()) as usize).min(LANE_COUNT - 1))
    }

    /// Percent coordinates (projectiles, impacts) to pixels.
    pub fn pct(&self, x: f64, y: f64) -> (f64, f64) {
        (x / 100.0 * self.width, y / 100.0 * self.height)
    }

    /// Vertical position of a note arriving at `time`. Notes enter at the lane
    /// top `travel_ms` before arrival and keep falling past the hit line.
    pub fn note_y(&self, time: f64, elapsed: f64, travel_ms: f64) -> f64 {
        let top = self.height * LANE_TOP;
        let hit = self.height * HIT_LINE;
        if travel_ms <= 0.0 {
            return hit;
        }
        let t = 1.0 - (time - elapsed) / travel_ms;
        top + (hit - top) * t
    }
}

// --- Battle -----------------------------------------------------------------

pub fn draw_battle(
    ctx: &CanvasRenderingContext2d,
    layout: Layout,
    snap: &Snapshot,
    travel_ms: f64,
    monster_name: &str,
) {
    ctx.set_fill_style_str("#020617");
    ctx.fill_rect(0.0, 0.0, layout.width, layout.height);

    draw_monster(ctx, layout, snap, monster_name);
    draw_lanes(ctx, layout);
    draw_notes(ctx, layout, snap, travel_ms);

    ctx.set_text_align("center");
    ctx.set_font("28px sans-serif");
    for p in &snap.projectiles {
        let (x, y) = layout.pct(p.position.x, p.position.y);
        if p.crit {
            ctx.set_shadow_color("rgba(250,204,21,0.9)");
            ctx.set_shadow_blur(16.0);
        }
        ctx.fill_text(&p.icon, x, y).ok();
        ctx.set_shadow_blur(0.0);
    }

    for n in &snap.damage_numbers {
        let age = (snap.elapsed - n.spawned_at).max(0.0) / 1000.0;
        let (x, y) = layout.pct(n.at.x, n.at.y);
        let alpha = (1.0 - age).clamp(0.0, 1.0);
        if n.crit {
            ctx.set_font("bold 30px sans-serif");
            ctx.set_fill_style_str(&format!("rgba(250,204,21,{alpha})"));
        } else {
            ctx.set_font("bold 20px sans-serif");
            ctx.set_fill_style_str(&format!("rgba(255,255,255,{alpha})"));
        }
        ctx.fill_text(&n.value.to_string(), x, y - age * 40.0).ok();
    }

    draw_hud(ctx, layout, snap);
    if snap.paused {
        ctx.set_fill_style_str("rgba(0,0,0,0.6)");
        ctx.fill_rect(0.0, 0.0, layout.width, layout.height);
        ctx.set_fill_style_str("#ffffff");
        ctx.set_font("bold 48px sans-serif");
        ctx.fill_text("PAUSED", layout.width / 2.0, layout.height / 2.0).ok();
    }
}

fn draw_monster(ctx: &CanvasRenderingContext2d, layout: Layout, snap: &Snapshot, name: &str) {
    let (cx, cy) = layout.pct(75.0, 30.0);
    let hurt = snap.max_health > 0 && snap.health < snap.max_health;
    ctx.set_fill_style_str(if hurt { "#7f1d1d" } else { "#1e293b" });
    ctx.begin_path();
    ctx.arc(cx, cy, layout.width * 0.12, 0.0, std::f64::consts::TAU).ok();
    ctx.fill();
    ctx.set_fill_style_str("#e2e8f0");
    ctx.set_font("14px sans-serif");
    ctx.set_text_align("center");
    ctx.fill_text(name, cx, cy + layout.width * 0.12 + 18.0).ok();
}

fn draw_lanes(ctx: &CanvasRenderingContext2d, layout: Layout) {
    let top = layout.height * LANE_TOP;
    let hit = layout.height * HIT_LINE;
    let lw = layout.lane_width();
    for (i, color) in LANE_COLORS.iter().enumerate() {
        let x = i as f64 * lw;
        ctx.set_fill_style_str("rgba(255,255,255,0.03)");
        ctx.fill_rect(x + 2.0, top, lw - 4.0, layout.height - top);
        ctx.set_stroke_style_str(color);
        ctx.set_line_width(3.0);
        line(ctx, x + 6.0, hit, x + lw - 6.0, hit);
        ctx.set_fill_style_str("rgba(255,255,255,0.4)");
        ctx.set_font("bold 18px sans-serif");
        ctx.set_text_align("center");
        ctx.fill_text(LANE_KEYS[i], x + lw / 2.0, hit + 32.0).ok();
    }
}

fn draw_notes(ctx: &CanvasRenderingContext2d, layout: Layout, snap: &Snapshot, travel_ms: f64) {
    let lw = layout.lane_width();
    let top = layout.height * LANE_TOP;
    for note in &snap.notes {
        if note.hit {
            continue;
        }
        let y = layout.note_y(note.time, snap.elapsed, travel_ms);
        if y < top || y > layout.height {
            continue;
        }
        let color = if note.missed { "#475569" } else { LANE_COLORS[note.lane % LANE_COUNT] };
        ctx.set_fill_style_str(color);
        ctx.fill_rect(note.lane as f64 * lw + 10.0, y - 8.0, lw - 20.0, 16.0);
    }
}

fn draw_hud(ctx: &CanvasRenderingContext2d, layout: Layout, snap: &Snapshot) {
    let ratio = if snap.max_health == 0 {
        0.0
    } else {
        snap.health as f64 / snap.max_health as f64
    };
    let bar_w = layout.width - 40.0;
    ctx.set_fill_style_str("#1f2937");
    ctx.fill_rect(20.0, 16.0, bar_w, 14.0);
    ctx.set_fill_style_str("#dc2626");
    ctx.fill_rect(20.0, 16.0, bar_w * ratio, 14.0);

    ctx.set_font("bold 16px sans-serif");
    ctx.set_text_align("left");
    ctx.set_fill_style_str("#f87171");
    ctx.fill_text(&format!("♥ {}", snap.lives), 20.0, 52.0).ok();
    ctx.set_text_align("right");
    if snap.combo > 0 {
        ctx.set_fill_style_str("#facc15");
        ctx.fill_text(&format!("{} COMBO", snap.combo), layout.width - 20.0, 52.0).ok();
    }
    ctx.set_fill_style_str("#94a3b8");
    ctx.fill_text(&format!("{}", snap.health), layout.width - 20.0, 72.0).ok();
}

// --- Bonus ------------------------------------------------------------------

fn item_glyph(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Common => "🟡",
        ItemKind::Basic => "🟢",
        ItemKind::Premium => "🔴",
        ItemKind::Bomb => "💣",
    }
}

/// Item centers in canvas pixels.
pub fn item_screen_pos(layout: Layout, item: &BonusItem, elapsed: f64, angular_speed: f64) -> (f64, f64) {
    let (dx, dy) = item.position(elapsed, angular_speed);
    (layout.width / 2.0 + dx, layout.height / 2.0 + dy)
}

pub fn draw_bonus(
    ctx: &CanvasRenderingContext2d,
    layout: Layout,
    items: &[BonusItem],
    elapsed: f64,
    angular_speed: f64,
    seconds_left: u32,
    collected: (u64, u64, u64),
) {
    ctx.set_fill_style_str("#0f172a");
    ctx.fill_rect(0.0, 0.0, layout.width, layout.height);
    ctx.set_text_align("center");
    for item in items {
        let (x, y) = item_screen_pos(layout, item, elapsed, angular_speed);
        ctx.set_font(&format!("{}px sans-serif", (20.0 * item.scale).round()));
        ctx.fill_text(item_glyph(item.kind), x, y).ok();
    }
    ctx.set_fill_style_str("#ffffff");
    ctx.set_font("bold 28px sans-serif");
    ctx.fill_text(&format!("{seconds_left}s"), layout.width / 2.0, 40.0).ok();
    ctx.set_font("16px sans-serif");
    let (c, b, p) = collected;
    ctx.fill_text(&format!("🟡{c}  🟢{b}  🔴{p}"), layout.width / 2.0, 66.0).ok();
}

fn line(ctx: &CanvasRenderingContext2d, x1: f64, y1: f64, x2: f64, y2: f64) {
    ctx.begin_path();
    ctx.move_to(x1, y1);
    ctx.line_to(x2, y2);
    ctx.stroke();
}
