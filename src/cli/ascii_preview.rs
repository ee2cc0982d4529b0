use image::DynamicImage;
use std::io::{self, Write};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent},
    terminal::{self, ClearType},
};

const ASCII_RAMP: &str = " .·:;+=xX#@";
const DEFAULT_WIDTH: usize = 80;
const DEFAULT_HEIGHT: usize = 30;

/// Renders camera frames as ASCII art with a centered framing guide.
pub struct AsciiRenderer {
    width: usize,
    height: usize,
}

impl AsciiRenderer {
    pub fn new(width: Option<usize>, height: Option<usize>) -> Self {
        let (term_width, term_height) = terminal::size()
            .map(|(w, h)| (w as usize, h as usize))
            .unwrap_or((DEFAULT_WIDTH, DEFAULT_HEIGHT));

        Self {
            width: width.unwrap_or((term_width / 2).min(DEFAULT_WIDTH / 2)).max(8),
            height: height.unwrap_or((term_height.saturating_sub(5) / 2).min(DEFAULT_HEIGHT / 2)).max(6),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn render_frame(&self, image: &DynamicImage, caption: &str) -> String {
        let mut grid = self.image_to_ascii(image);
        self.draw_guide(&mut grid);
        if self.height > 0 {
            self.overlay_text(&mut grid, caption, self.width / 2, self.height - 1);
        }
        self.grid_to_string(&grid)
    }

    fn image_to_ascii(&self, image: &DynamicImage) -> Vec<Vec<char>> {
        let mut grid = vec![vec![' '; self.width]; self.height];
        let ramp: Vec<char> = ASCII_RAMP.chars().collect();

        let gray = image.to_luma8();
        let (img_width, img_height) = gray.dimensions();

        for (term_y, row) in grid.iter_mut().enumerate() {
            for (term_x, cell) in row.iter_mut().enumerate() {
                let img_x = (term_x as f32 / self.width as f32 * img_width as f32) as u32;
                let img_y = (term_y as f32 / self.height as f32 * img_height as f32) as u32;

                if img_x < img_width && img_y < img_height {
                    let brightness = gray.get_pixel(img_x, img_y)[0] as usize;
                    *cell = ramp[brightness * (ramp.len() - 1) / 255];
                }
            }
        }

        grid
    }

    /// Box covering the middle half of the frame, where the face should sit.
    fn draw_guide(&self, grid: &mut [Vec<char>]) {
        let x1 = self.width / 4;
        let x2 = self.width - self.width / 4 - 1;
        let y1 = self.height / 6;
        let y2 = self.height - self.height / 6 - 1;
        if x2 <= x1 || y2 <= y1 {
            return;
        }

        for x in x1 + 1..x2 {
            grid[y1][x] = '─';
            grid[y2][x] = '─';
        }
        for row in grid.iter_mut().take(y2).skip(y1 + 1) {
            row[x1] = '│';
            row[x2] = '│';
        }
        grid[y1][x1] = '┌';
        grid[y1][x2] = '┐';
        grid[y2][x1] = '└';
        grid[y2][x2] = '┘';
    }

    fn overlay_text(&self, grid: &mut [Vec<char>], text: &str, center_x: usize, y: usize) {
        if y >= self.height {
            return;
        }

        let start_x = center_x.saturating_sub(text.chars().count() / 2);
        for (i, ch) in text.chars().enumerate() {
            let x = start_x + i;
            if x < self.width {
                grid[y][x] = ch;
            }
        }
    }

    fn grid_to_string(&self, grid: &[Vec<char>]) -> String {
        grid.iter()
            .map(|row| row.iter().take(self.width).collect::<String>())
            .collect::<Vec<_>>()
            .join("\r\n")
    }
}

pub fn clear_screen() -> io::Result<()> {
    crossterm::execute!(
        io::stdout(),
        terminal::Clear(ClearType::All),
        cursor::MoveTo(0, 0)
    )?;
    io::stdout().flush()
}

/// Non-blocking check for Esc or `q`. Expects raw mode.
pub fn check_for_escape() -> io::Result<bool> {
    if event::poll(std::time::Duration::from_millis(0))? {
        if let Event::Key(KeyEvent { code, .. }) = event::read()? {
            return Ok(matches!(code, KeyCode::Esc | KeyCode::Char('q')));
        }
    }
    Ok(false)
}
