//! Terminal rendering of a grid snapshot.
//!
//! Reads cell types and the diagnostics snapshot only; never touches
//! simulation state.

use crossterm::{
    cursor, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor},
};
use gridfluid::{CellType, FluidGrid, Properties};
use std::io::{self, Write};

/// Index into the 6x6x6 color cube of the 256-color palette.
pub fn rgb_index(r: f64, g: f64, b: f64) -> u8 {
    let level = |c: f64| ((c.clamp(0.0, 1.0) * 6.0) as u8).min(5);
    16 + 36 * level(r) + 6 * level(g) + level(b)
}

/// Index into the grayscale ramp, black and white at the ends.
pub fn gray_index(v: f64) -> u8 {
    match (v.clamp(0.0, 1.0) * 26.0) as u8 {
        0 => 16,
        n if n >= 25 => 15,
        n => 231 + n,
    }
}

/// Color of a cell: walls gray, gas black, liquid blue to red by pressure.
pub fn cell_color(cell_type: CellType, pressure: f64) -> Color {
    let index = match cell_type {
        CellType::Obstacle => gray_index(0.5),
        CellType::Empty => gray_index(0.0),
        CellType::Fluid => rgb_index(pressure, 0.2, 1.0 - pressure),
        CellType::Interface => rgb_index(pressure, 0.6, 1.0 - pressure),
    };
    Color::AnsiValue(index)
}

/// Plain-text glyph for headless output.
pub fn cell_glyph(cell_type: CellType) -> char {
    match cell_type {
        CellType::Obstacle => '#',
        CellType::Empty => ' ',
        CellType::Fluid => 'o',
        CellType::Interface => '~',
    }
}

/// One-line summary of the diagnostics.
pub fn status_line(steps: u64, props: &Properties) -> String {
    format!(
        "step {steps}  p=[{:.4}, {:.4}]  |u|max={:.4}  mass={:.4}  g={}",
        props.min_pressure, props.max_pressure, props.max_speed, props.total_mass, props.gravity
    )
}

/// Last terminal row a cursor move can address.
const LAST_ROW: u16 = u16::MAX - 1;

/// Terminal row below the grid, clamped to the addressable range.
pub fn footer_row(height: usize, offset: u16) -> u16 {
    u16::try_from(height)
        .unwrap_or(LAST_ROW)
        .saturating_add(offset)
        .min(LAST_ROW)
}

/// Draw the grid with colored cells, top row first, two columns per cell.
///
/// Rows past the terminal's addressable range are not drawn.
pub fn draw<W: Write>(out: &mut W, grid: &FluidGrid, props: &Properties) -> io::Result<()> {
    for row in 0..grid.height() {
        let Some(line) = u16::try_from(row).ok().filter(|&l| l <= LAST_ROW) else {
            break;
        };
        let y = grid.height() - 1 - row;
        queue!(out, cursor::MoveTo(0, line))?;
        for x in 0..grid.width() {
            let cell_type = grid.cell_type(x, y).map_err(io::Error::other)?;
            let color = cell_color(cell_type, props.normalized_pressure(x, y));
            queue!(out, SetBackgroundColor(color), Print("  "))?;
        }
        queue!(out, ResetColor)?;
    }
    Ok(())
}

/// Draw the grid as text, top row first.
pub fn draw_ascii<W: Write>(out: &mut W, grid: &FluidGrid) -> io::Result<()> {
    for y in (0..grid.height()).rev() {
        let line: String = (0..grid.width())
            .map(|x| grid.cell_type(x, y).map_or('?', cell_glyph))
            .collect();
        writeln!(out, "{line}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_cube_corners() {
        assert_eq!(rgb_index(0.0, 0.0, 0.0), 16);
        assert_eq!(rgb_index(1.0, 1.0, 1.0), 231);
        assert_eq!(rgb_index(1.0, 0.0, 0.0), 196);
    }

    #[test]
    fn test_gray_ramp_ends() {
        assert_eq!(gray_index(0.0), 16);
        assert_eq!(gray_index(1.0), 15);
        assert_eq!(gray_index(0.5), 244);
    }

    #[test]
    fn test_footer_row_clamps() {
        assert_eq!(footer_row(20, 0), 20);
        assert_eq!(footer_row(20, 1), 21);
        assert_eq!(footer_row(70_000, 0), u16::MAX - 1);
        assert_eq!(footer_row(70_000, 1), u16::MAX - 1);
    }

    #[test]
    fn test_draw_stops_at_last_addressable_row() {
        let grid = FluidGrid::new(3, 70_000).unwrap();
        let props = grid.last_properties().clone();
        let mut out = Vec::new();
        draw(&mut out, &grid, &props).unwrap();
        let text = String::from_utf8_lossy(&out);
        // MoveTo(0, row) is emitted as ESC[<row + 1>;1H.
        assert!(text.contains("\x1b[65535;1H"));
        assert!(!text.contains("\x1b[65536;1H"));
        assert_eq!(text.matches("\x1b[1;1H").count(), 1);
    }

    #[test]
    fn test_ascii_frame() {
        let mut grid = FluidGrid::new(5, 4).unwrap();
        grid.set_fluid(2, 1).unwrap();
        let mut out = Vec::new();
        draw_ascii(&mut out, &grid).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["#####", "#~~~#", "#~o~#", "#####"]);
    }
}
