//! Screen-space text using a fixed-cell ASCII atlas.
//!
//! The atlas holds characters 32..128 in a 16x6 grid of 8x8 pixel cells,
//! each glyph drawn in the top-left 5x7 pixels.

pub const ATLAS_COLUMNS: u32 = 16;
pub const ATLAS_ROWS: u32 = 6;
pub const CELL_SIZE: u32 = 8;
const FIRST_CHAR: u32 = 32;
const GLYPH_ADVANCE: f32 = 6.0;
const FALLBACK: char = '?';

/// One textured quad, laid out for a WGSL storage buffer.
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct GlyphInstance {
    /// Pixel rectangle: x, y, width, height. Origin at the top-left.
    pub rect: [f32; 4],
    /// Atlas rectangle: u0, v0, u1, v1.
    pub uv: [f32; 4],
}

fn glyph_cell(c: char) -> (u32, u32) {
    let code = if (' '..='~').contains(&c) {
        c as u32
    } else {
        FALLBACK as u32
    };
    let index = code - FIRST_CHAR;
    (index % ATLAS_COLUMNS, index / ATLAS_COLUMNS)
}

fn glyph_uv(c: char) -> [f32; 4] {
    let (col, row) = glyph_cell(c);
    let width = (ATLAS_COLUMNS * CELL_SIZE) as f32;
    let height = (ATLAS_ROWS * CELL_SIZE) as f32;
    let x = (col * CELL_SIZE) as f32;
    let y = (row * CELL_SIZE) as f32;
    [
        x / width,
        y / height,
        (x + GLYPH_ADVANCE) / width,
        (y + CELL_SIZE as f32) / height,
    ]
}

/// Appends glyph quads for `text` starting at `origin`.
///
/// `size` is the line height in pixels; each line after the first starts
/// `size` pixels lower. Spaces only advance the pen.
pub fn layout(text: &str, origin: [f32; 2], size: f32, out: &mut Vec<GlyphInstance>) {
    let scale = size / CELL_SIZE as f32;
    let mut pen = origin;
    for c in text.chars() {
        match c {
            '\n' => {
                pen = [origin[0], pen[1] + size];
                continue;
            }
            ' ' => {}
            _ => out.push(GlyphInstance {
                rect: [pen[0], pen[1], GLYPH_ADVANCE * scale, size],
                uv: glyph_uv(c),
            }),
        }
        pen[0] += GLYPH_ADVANCE * scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_follow_ascii_order() {
        assert_eq!(glyph_cell('!'), (1, 0));
        assert_eq!(glyph_cell('0'), (0, 1));
        assert_eq!(glyph_cell('A'), (1, 2));
        assert_eq!(glyph_cell('~'), (14, 5));
    }

    #[test]
    fn unknown_characters_fall_back() {
        assert_eq!(glyph_cell('é'), glyph_cell('?'));
        assert_eq!(glyph_cell('\t'), glyph_cell('?'));
    }

    #[test]
    fn uv_covers_one_cell() {
        let uv = glyph_uv('0');
        assert_eq!(uv, [0.0, 8.0 / 48.0, 6.0 / 128.0, 16.0 / 48.0]);
    }

    #[test]
    fn layout_advances_and_skips_spaces() {
        let mut glyphs = Vec::new();
        layout("a b", [10.0, 10.0], 16.0, &mut glyphs);
        assert_eq!(glyphs.len(), 2);
        assert_eq!(glyphs[0].rect, [10.0, 10.0, 12.0, 16.0]);
        assert_eq!(glyphs[1].rect, [34.0, 10.0, 12.0, 16.0]);
    }

    #[test]
    fn newline_starts_next_line() {
        let mut glyphs = Vec::new();
        layout("ab\nc", [10.0, 10.0], 20.0, &mut glyphs);
        assert_eq!(glyphs.len(), 3);
        assert_eq!(glyphs[2].rect[0], 10.0);
        assert_eq!(glyphs[2].rect[1], 30.0);
    }

    #[test]
    fn layout_appends() {
        let mut glyphs = Vec::new();
        layout("x", [0.0, 0.0], 8.0, &mut glyphs);
        layout("y", [0.0, 8.0], 8.0, &mut glyphs);
        assert_eq!(glyphs.len(), 2);
        assert_eq!(glyphs[1].uv, glyph_uv('y'));
    }
}
