use crate::clock::Millis;
use crate::drag::Drag;
use crate::model::{Glyph, Point, Stage};
use crate::mood::Mood;
use crate::sim::Pet;
use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    /// Writes a glyph over whatever is there, keeping the cell background.
    fn put(&mut self, x: i32, y: i32, ch: char, fg: Color) {
        if x < 0 || y < 0 || x >= self.w as i32 || y >= self.h as i32 {
            return;
        }
        let i = self.idx(x as u16, y as u16);
        self.cells[i].ch = ch;
        self.cells[i].fg = fg;
    }
    fn clear(&mut self, bg: Color) {
        self.cells.fill(Cell {
            ch: ' ',
            fg: Color::White,
            bg,
        });
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Pixel {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl Pixel {
    const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

const SKIN: Pixel = Pixel::rgba(255, 223, 196, 255);
const SKIN_DIRTY: Pixel = Pixel::rgba(139, 125, 107, 255);
const OUTLINE: Pixel = Pixel::rgba(139, 69, 19, 255);
const BELLY: Pixel = Pixel::rgba(255, 240, 224, 128);
const VEIN: Pixel = Pixel::rgba(211, 47, 47, 180);
const INK: Pixel = Pixel::rgba(51, 51, 51, 255);
const SCLERA: Pixel = Pixel::rgba(255, 255, 255, 255);
const PUPIL: Pixel = Pixel::rgba(0, 0, 0, 255);
const MOUTH: Pixel = Pixel::rgba(92, 46, 46, 255);
const BLUSH: Pixel = Pixel::rgba(255, 127, 127, 100);

/// Braille subpixel canvas: 2×4 subpixels per terminal cell.
pub(crate) struct PixelCanvas {
    w: u32,
    h: u32,
    px: Vec<Pixel>,
}

impl PixelCanvas {
    pub(crate) fn new(w: u32, h: u32) -> Self {
        Self {
            w,
            h,
            px: vec![Pixel::default(); (w as usize) * (h as usize)],
        }
    }
    fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    fn clear(&mut self) {
        self.px.fill(Pixel::default());
    }
    fn blend_over(&mut self, x: i32, y: i32, src: Pixel) {
        if x < 0 || y < 0 || x as u32 >= self.w || y as u32 >= self.h {
            return;
        }
        let i = self.idx(x as u32, y as u32);
        let dst = self.px[i];

        let sa = src.a as f32 / 255.0;
        let da = dst.a as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 1e-6 {
            self.px[i] = Pixel::default();
            return;
        }
        let blend = |sc: u8, dc: u8| -> u8 {
            let out = (sc as f32 * sa + dc as f32 * da * (1.0 - sa)) / out_a;
            out.clamp(0.0, 255.0).round() as u8
        };
        self.px[i] = Pixel {
            r: blend(src.r, dst.r),
            g: blend(src.g, dst.g),
            b: blend(src.b, dst.b),
            a: (out_a.clamp(0.0, 1.0) * 255.0).round() as u8,
        };
    }

    fn fill_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, col: Pixel) {
        if rx <= 0.0 || ry <= 0.0 {
            return;
        }
        let (x0, x1) = ((cx - rx).floor() as i32, (cx + rx).ceil() as i32);
        let (y0, y1) = ((cy - ry).floor() as i32, (cy + ry).ceil() as i32);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let nx = (x as f32 + 0.5 - cx) / rx;
                let ny = (y as f32 + 0.5 - cy) / ry;
                if nx * nx + ny * ny <= 1.0 {
                    self.blend_over(x, y, col);
                }
            }
        }
    }

    fn line(&mut self, a: (f32, f32), b: (f32, f32), col: Pixel) {
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as i32;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            self.blend_over(
                (a.0 + dx * t).floor() as i32,
                (a.1 + dy * t).floor() as i32,
                col,
            );
        }
    }
}

/* -----------------------------
   Pixel stage <-> terminal grid
------------------------------ */

/// Converts between terminal cells and the pixel stage the simulation uses.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Grid {
    pub(crate) cell_w: f32,
    pub(crate) cell_h: f32,
}

impl Grid {
    pub(crate) fn stage(&self, cols: u16, rows: u16) -> Stage {
        Stage {
            w: cols.max(1) as f32 * self.cell_w,
            h: rows.max(1) as f32 * self.cell_h,
        }
    }

    pub(crate) fn cell_center(&self, col: u16, row: u16) -> Point {
        Point::new(
            (col as f32 + 0.5) * self.cell_w,
            (row as f32 + 0.5) * self.cell_h,
        )
    }

    pub(crate) fn cell_of(&self, p: Point) -> (i32, i32) {
        (
            (p.x / self.cell_w).floor() as i32,
            (p.y / self.cell_h).floor() as i32,
        )
    }

    fn subpixel(&self, p: Point) -> (f32, f32) {
        (p.x / self.cell_w * 2.0, p.y / self.cell_h * 4.0)
    }
}

/* -----------------------------
   Controls layout + hit testing
------------------------------ */

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Button {
    Feed,
    Play,
    Sleep,
}

const BUTTONS: [(Button, &str); 3] = [
    (Button::Feed, "[F]eed"),
    (Button::Play, "[P]lay"),
    (Button::Sleep, "[S]leep"),
];
const FOOD_SLOT_W: u16 = 18;

pub(crate) struct Layout {
    controls_row: u16,
    menu_row: u16,
    buttons: Vec<(Button, u16, u16)>,
    food_slots: Vec<(u16, u16)>,
}

impl Layout {
    pub(crate) fn new(rows: u16, food_count: usize) -> Self {
        let mut x = 2u16;
        let mut buttons = Vec::new();
        for (b, label) in BUTTONS {
            let w = label.chars().count() as u16;
            buttons.push((b, x, x + w));
            x += w + 3;
        }
        let slots = u16::try_from(food_count).unwrap_or(u16::MAX);
        let food_slots = (0..slots)
            .map(|i| {
                let x0 = i.saturating_mul(FOOD_SLOT_W).saturating_add(2);
                (x0, x0.saturating_add(FOOD_SLOT_W - 2))
            })
            .collect();
        Self {
            controls_row: rows.saturating_sub(1),
            menu_row: rows.saturating_sub(2),
            buttons,
            food_slots,
        }
    }

    pub(crate) fn button_at(&self, col: u16, row: u16) -> Option<Button> {
        if row != self.controls_row {
            return None;
        }
        self.buttons
            .iter()
            .find(|(_, x0, x1)| (*x0..*x1).contains(&col))
            .map(|(b, _, _)| *b)
    }

    pub(crate) fn food_at(&self, col: u16, row: u16) -> Option<usize> {
        if row != self.menu_row {
            return None;
        }
        self.food_slots
            .iter()
            .position(|(x0, x1)| (*x0..*x1).contains(&col))
    }
}

/// Hit test against the body ellipse, in stage pixels.
pub(crate) fn pet_contains(pet: &Pet, p: Point) -> bool {
    let unit = pet_unit(pet);
    let c = pet.stage().center();
    let nx = (p.x - c.x) / (60.0 * unit);
    let ny = (p.y - c.y) / (130.0 * unit);
    nx * nx + ny * ny <= 1.0
}

/// Pixels per body unit. The body is 280 units tall head to feet.
fn pet_unit(pet: &Pet) -> f32 {
    let base = (pet.stage().h / 360.0).min(1.4);
    let squish = if pet.mood() == Mood::Eating { 1.1 } else { 1.0 };
    base * pet.growth() * squish
}

/* -----------------------------
   Terminal session
------------------------------ */

pub(crate) struct Terminal {
    out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    prev: CellBuffer,
    cur: CellBuffer,
    canvas: PixelCanvas,
    /// Cleared once the terminal has been handed back.
    active: bool,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
            canvas: PixelCanvas::new(cols as u32 * 2, rows as u32 * 4),
            active: true,
        })
    }

    /// Restores the terminal. Only the first call does anything.
    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            DisableMouseCapture,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        self.canvas = PixelCanvas::new(c as u32 * 2, r as u32 * 4);
        // force a full repaint
        self.prev.cells.fill(Cell {
            ch: '\0',
            ..Cell::default()
        });
        Ok(true)
    }

    fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;
        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if c == self.prev.cells[i] {
                    continue;
                }
                queue!(self.out, cursor::MoveTo(x, y))?;
                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }
                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/* -----------------------------
   Braille encoding: 2×4 pixels -> U+2800..U+28FF
------------------------------ */

fn braille_bit(dx: u32, dy: u32) -> u8 {
    match (dx, dy) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0x00,
    }
}

fn canvas_to_cells(canvas: &PixelCanvas, out: &mut CellBuffer, color: bool) {
    for cy in 0..out.h as u32 {
        for cx in 0..out.w as u32 {
            let mut mask: u8 = 0;
            let (mut r, mut g, mut b, mut ink) = (0u32, 0u32, 0u32, 0u32);

            for dy in 0..4 {
                for dx in 0..2 {
                    let (x, y) = (cx * 2 + dx, cy * 4 + dy);
                    if x >= canvas.w || y >= canvas.h {
                        continue;
                    }
                    let p = canvas.px[canvas.idx(x, y)];
                    if p.a >= 32 {
                        mask |= braille_bit(dx, dy);
                        r += p.r as u32;
                        g += p.g as u32;
                        b += p.b as u32;
                        ink += 1;
                    }
                }
            }
            if ink == 0 {
                continue;
            }

            let ch = char::from_u32(0x2800 + mask as u32).unwrap_or(' ');
            let fg = if color {
                Color::Rgb {
                    r: (r / ink) as u8,
                    g: (g / ink) as u8,
                    b: (b / ink) as u8,
                }
            } else {
                Color::White
            };
            out.put(cx as i32, cy as i32, ch, fg);
        }
    }
}

/* -----------------------------
   Blob painter (body units relative to body center)
------------------------------ */

struct Painter<'a> {
    canvas: &'a mut PixelCanvas,
    grid: Grid,
    origin: Point,
    unit: f32,
}

impl Painter<'_> {
    fn at(&self, ux: f32, uy: f32) -> (f32, f32) {
        self.grid
            .subpixel(self.origin.offset(ux * self.unit, uy * self.unit))
    }

    fn ellipse(&mut self, ux: f32, uy: f32, rx: f32, ry: f32, col: Pixel) {
        let (cx, cy) = self.at(ux, uy);
        let sx = rx * self.unit / self.grid.cell_w * 2.0;
        let sy = ry * self.unit / self.grid.cell_h * 4.0;
        self.canvas.fill_ellipse(cx, cy, sx, sy, col);
    }

    fn outlined(&mut self, ux: f32, uy: f32, rx: f32, ry: f32, fill: Pixel) {
        self.ellipse(ux, uy, rx + 4.0, ry + 4.0, OUTLINE);
        self.ellipse(ux, uy, rx, ry, fill);
    }

    fn line(&mut self, a: (f32, f32), b: (f32, f32), col: Pixel) {
        let (pa, pb) = (self.at(a.0, a.1), self.at(b.0, b.1));
        self.canvas.line(pa, pb, col);
    }

    /// Quadratic Bézier from `a` to `b` bent toward `ctrl`.
    fn curve(&mut self, a: (f32, f32), ctrl: (f32, f32), b: (f32, f32), col: Pixel) {
        const SEGMENTS: usize = 10;
        let point = |t: f32| {
            let u = 1.0 - t;
            (
                u * u * a.0 + 2.0 * u * t * ctrl.0 + t * t * b.0,
                u * u * a.1 + 2.0 * u * t * ctrl.1 + t * t * b.1,
            )
        };
        let mut prev = a;
        for i in 1..=SEGMENTS {
            let next = point(i as f32 / SEGMENTS as f32);
            self.line(prev, next, col);
            prev = next;
        }
    }
}

fn draw_blob(canvas: &mut PixelCanvas, pet: &Pet, grid: Grid) {
    let needs = pet.needs();
    let mood = pet.mood();
    let sleeping = pet.is_sleeping();
    let skin = if needs.hygiene() < 40.0 { SKIN_DIRTY } else { SKIN };

    let mut p = Painter {
        canvas,
        grid,
        origin: pet.stage().center(),
        unit: pet_unit(pet),
    };

    p.outlined(-40.0, 115.0, 35.0, 35.0, skin);
    p.outlined(40.0, 115.0, 35.0, 35.0, skin);
    p.outlined(0.0, 0.0, 60.0, 130.0, skin);

    if pet.veins_visible() {
        p.curve((0.0, 0.0), (20.0, -20.0), (40.0, -10.0), VEIN);
        p.curve((0.0, 30.0), (-20.0, 40.0), (-40.0, 20.0), VEIN);
        p.curve((30.0, -50.0), (40.0, -70.0), (50.0, -60.0), VEIN);
        p.curve((-30.0, -30.0), (-50.0, -40.0), (-60.0, -20.0), VEIN);
        p.curve((-10.0, -90.0), (0.0, -100.0), (10.0, -90.0), VEIN);
    }
    p.ellipse(0.0, 30.0, 35.0, 70.0, BELLY);

    // face is centered 50 units above the body center
    let fy = -50.0;
    if sleeping {
        p.curve((-25.0, fy), (-15.0, fy + 10.0), (-5.0, fy), INK);
        p.curve((5.0, fy), (15.0, fy + 10.0), (25.0, fy), INK);
    } else {
        let (ox, oy) = eye_offset(pet);
        for ex in [-20.0, 20.0] {
            p.ellipse(ex, fy, 18.0, 18.0, SCLERA);
            p.ellipse(ex + ox, fy + oy, 6.0, 6.0, PUPIL);
        }
    }

    let my = fy + 30.0;
    match mood {
        Mood::Happy => p.curve((-15.0, my), (0.0, my + 15.0), (15.0, my), INK),
        Mood::Sad => p.curve((-15.0, my + 10.0), (0.0, my - 5.0), (15.0, my + 10.0), INK),
        Mood::Eating => p.ellipse(0.0, my + 5.0, 15.0, 20.0, MOUTH),
        Mood::Angry => p.line((-10.0, my), (10.0, my), INK),
        Mood::Sleepy | Mood::Dead => {}
    }
    if matches!(mood, Mood::Sleepy | Mood::Happy) && !sleeping {
        p.curve((-5.0, my), (0.0, my + 5.0), (5.0, my), INK);
    }
    if matches!(mood, Mood::Happy | Mood::Eating) {
        p.ellipse(-35.0, fy + 15.0, 10.0, 10.0, BLUSH);
        p.ellipse(35.0, fy + 15.0, 10.0, 10.0, BLUSH);
    }
}

/// Pupils follow the pointer, clamped inside the eye. Centered while asleep.
fn eye_offset(pet: &Pet) -> (f32, f32) {
    const LIMIT: f32 = 6.0;
    if pet.is_sleeping() {
        return (0.0, 0.0);
    }
    let c = pet.stage().center();
    let p = pet.pointer();
    (
        ((p.x - c.x) / 30.0).clamp(-LIMIT, LIMIT),
        ((p.y - c.y) / 30.0).clamp(-LIMIT, LIMIT),
    )
}

/* -----------------------------
   Text overlay
------------------------------ */

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color) {
    for (i, ch) in s.chars().enumerate() {
        buf.put(x as i32 + i as i32, y as i32, ch, fg);
    }
}

fn bar(value01: f32, width: usize) -> String {
    let fill = (value01.clamp(0.0, 1.0) * width as f32 + 0.5) as usize;
    let mut s = String::with_capacity(width + 2);
    s.push('[');
    for i in 0..width {
        s.push(if i < fill { '█' } else { ' ' });
    }
    s.push(']');
    s
}

fn glyph_color(g: Glyph) -> Color {
    match g {
        Glyph::Food(_) => Color::Rgb {
            r: 255,
            g: 170,
            b: 60,
        },
        Glyph::Heart => Color::Red,
        Glyph::Ball => Color::White,
        Glyph::Sleepy => Color::Rgb {
            r: 160,
            g: 140,
            b: 255,
        },
        Glyph::Sparkle => Color::Yellow,
    }
}

/// Presentation-only state owned by the front end.
pub(crate) struct View {
    pub(crate) color: bool,
    pub(crate) food_menu: bool,
    /// Last rejection message and when it was raised.
    pub(crate) status: Option<(&'static str, Millis)>,
}

const STATUS_MS: Millis = 1500;

pub(crate) fn draw_frame(
    term: &mut Terminal,
    pet: &Pet,
    view: &View,
    layout: &Layout,
    grid: Grid,
) -> anyhow::Result<()> {
    let tint = |c: Color| if view.color { c } else { Color::White };
    let bg = if !view.color {
        Color::Black
    } else if pet.is_sleeping() {
        Color::Rgb { r: 24, g: 20, b: 60 }
    } else {
        Color::Rgb { r: 18, g: 32, b: 58 }
    };

    term.cur.clear(bg);
    term.canvas.clear();
    draw_blob(&mut term.canvas, pet, grid);
    canvas_to_cells(&term.canvas, &mut term.cur, view.color);

    let buf = &mut term.cur;

    // stats panel
    let title = format!("Blobgotchi  |  Mood: {:?}", pet.mood());
    draw_text(buf, 1, 0, &title, Color::White);
    let needs = pet.needs();
    let meters = [
        ("Hunger ", needs.hunger(), Color::Rgb { r: 251, g: 146, b: 60 }),
        ("Happy  ", needs.happiness(), Color::Rgb { r: 244, g: 114, b: 182 }),
        ("Energy ", needs.energy(), Color::Rgb { r: 96, g: 165, b: 250 }),
        ("Hygiene", needs.hygiene(), Color::Rgb { r: 45, g: 212, b: 191 }),
    ];
    for (i, (name, val, col)) in meters.iter().enumerate() {
        let line = format!("{name} {} {:>5.1}", bar(*val / 100.0, 14), val);
        draw_text(buf, 1, 2 + i as u16, &line, tint(*col));
    }

    if let Some((msg, at)) = view.status {
        if pet.now() < at + STATUS_MS {
            draw_text(buf, 1, 7, msg, tint(Color::Rgb { r: 255, g: 120, b: 120 }));
        }
    }

    // floor
    let mess_col = tint(Color::Rgb { r: 150, g: 90, b: 40 });
    for m in pet.messes() {
        let (x, y) = grid.cell_of(m.at);
        buf.put(x, y, '@', mess_col);
    }

    // feedback effects float upward over their lifetime
    let now = pet.now();
    for e in pet.effects() {
        let (x, y) = grid.cell_of(e.at);
        let rise = (e.progress(now) * 3.0).round() as i32;
        buf.put(x, y - rise, e.glyph.symbol(), tint(glyph_color(e.glyph)));
    }

    if pet.is_sleeping() {
        let c = grid.cell_of(pet.stage().center());
        draw_text(
            buf,
            (c.0 + 6).max(0) as u16,
            (c.1 - 8).max(0) as u16,
            "Zzz...",
            tint(Color::Rgb { r: 200, g: 200, b: 255 }),
        );
    }

    // food menu
    if view.food_menu {
        let slots = pet.rules().food.iter().zip(&layout.food_slots);
        for (i, (item, &(x0, _))) in slots.enumerate() {
            let label = format!("{} {} {:<7} ${}", i + 1, item.icon, item.name, item.cost);
            let col = if pet.can_afford(i) && !pet.is_sleeping() {
                tint(Color::Rgb { r: 255, g: 200, b: 120 })
            } else {
                Color::DarkGrey
            };
            draw_text(buf, x0, layout.menu_row, &label, col);
        }
    }

    // controls
    for (b, label) in BUTTONS {
        let Some(&(_, x0, _)) = layout.buttons.iter().find(|(bb, _, _)| *bb == b) else {
            continue;
        };
        let label = match (b, pet.is_sleeping()) {
            (Button::Sleep, true) => "[S]wake",
            _ => label,
        };
        draw_text(buf, x0, layout.controls_row, label, Color::White);
    }
    let coins = format!("$ {}", pet.coins());
    let cx = buf.w.saturating_sub(coins.chars().count() as u16 + 2);
    draw_text(buf, cx, layout.controls_row, &coins, tint(Color::Yellow));
    let hint = "c clean | k color | q quit";
    draw_text(
        buf,
        buf.w.saturating_sub(hint.len() as u16 + 1),
        0,
        hint,
        Color::DarkGrey,
    );

    // item being dragged sits under the pointer
    if let Drag::Dragging { item, at } = pet.drag() {
        if let Some(food) = pet.rules().food.get(item) {
            let (x, y) = grid.cell_of(at);
            buf.put(x, y, food.icon, tint(glyph_color(Glyph::Food(food.icon))));
        }
    }

    term.present()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rules;
    use crate::soil::testing::Scripted;

    #[test]
    fn grid_maps_cells_to_stage_pixels() {
        let grid = Grid {
            cell_w: 8.0,
            cell_h: 16.0,
        };
        assert_eq!(grid.stage(100, 40), Stage { w: 800.0, h: 640.0 });
        assert_eq!(grid.cell_center(0, 0), Point::new(4.0, 8.0));
        assert_eq!(grid.cell_of(Point::new(15.9, 16.0)), (1, 1));
    }

    #[test]
    fn layout_hit_tests_controls_and_menu() {
        let layout = Layout::new(40, 4);
        assert_eq!(layout.button_at(2, 39), Some(Button::Feed));
        assert_eq!(layout.button_at(11, 39), Some(Button::Play));
        assert_eq!(layout.button_at(2, 38), None);
        assert_eq!(layout.food_at(2, 38), Some(0));
        assert_eq!(layout.food_at(2 + FOOD_SLOT_W, 38), Some(1));
        assert_eq!(layout.food_at(2 + 4 * FOOD_SLOT_W, 38), None);
    }

    #[test]
    fn body_hit_test_uses_center() {
        let pet = Pet::new(Rules::default(), Box::new(Scripted::always(0.0)));
        let c = pet.stage().center();
        assert!(pet_contains(&pet, c));
        assert!(!pet_contains(&pet, Point::new(0.0, 0.0)));
    }

    #[test]
    fn oversized_food_table_saturates_slots() {
        let layout = Layout::new(40, 100_000);
        assert_eq!(layout.food_slots.len(), 65_535);
        assert_eq!(layout.food_slots.last(), Some(&(u16::MAX, u16::MAX)));
        assert_eq!(layout.food_at(2, 38), Some(0));
        assert_eq!(layout.food_at(u16::MAX, 38), None);
    }

    #[test]
    fn ending_a_restored_terminal_is_a_noop() {
        let mut term = Terminal {
            out: io::stdout(),
            cols: 4,
            rows: 2,
            prev: CellBuffer::new(4, 2),
            cur: CellBuffer::new(4, 2),
            canvas: PixelCanvas::new(8, 8),
            active: false,
        };
        assert!(term.end().is_ok());
        assert!(term.end().is_ok());
        assert!(!term.active);
    }

    #[test]
    fn bar_fills_proportionally() {
        assert_eq!(bar(0.5, 4), "[██  ]");
        assert_eq!(bar(2.0, 2), "[██]");
    }
}
