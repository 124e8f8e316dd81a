use crate::banding::Band;
use crate::dashboard::{Panel, PanelSet, PanelValue};
use crossterm::cursor::MoveTo;
use crossterm::style::{Color, Print, Stylize};
use crossterm::terminal::{Clear, ClearType};
use crossterm::QueueableCommand;
use std::io::{self, Write};

/// Writes a composed frame somewhere.
pub trait DashboardRenderer {
    fn apply(&mut self, panels: &PanelSet) -> io::Result<()>;
}

const PANEL_HEIGHT: u16 = 3;
const MIN_SINGLE_ROW_WIDTH: u16 = 14;
const WRAPPED_COLUMN_WIDTH: u16 = 22;

/// Screen rectangle of one panel, including its border.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub x: u16,
    pub y: u16,
    pub width: u16,
}

/// Places panels on one row by weight when they fit, otherwise wraps them
/// into rows of equal columns.
pub fn layout(panels: &[Panel], width: u16) -> Vec<Cell> {
    if panels.is_empty() || width == 0 {
        return Vec::new();
    }
    let total_weight: u32 = panels.iter().map(|p| u32::from(p.weight.max(1))).sum();
    let single_row: Vec<u16> = panels
        .iter()
        .map(|p| (u32::from(width) * u32::from(p.weight.max(1)) / total_weight) as u16)
        .collect();

    if single_row.iter().all(|w| *w >= MIN_SINGLE_ROW_WIDTH) {
        let mut x = 0;
        return single_row
            .into_iter()
            .map(|w| {
                let cell = Cell { x, y: 0, width: w };
                x += w;
                cell
            })
            .collect();
    }

    let columns = (width / WRAPPED_COLUMN_WIDTH).max(1);
    let col_width = width / columns;
    (0..panels.len())
        .map(|i| {
            let i = i as u16;
            Cell {
                x: (i % columns) * col_width,
                y: (i / columns) * PANEL_HEIGHT,
                width: col_width,
            }
        })
        .collect()
}

fn band_color(band: Option<Band>) -> Color {
    match band {
        Some(Band::Green) => Color::Green,
        Some(Band::Yellow) => Color::Yellow,
        Some(Band::Red) => Color::Red,
        None => Color::Blue,
    }
}

fn fit(s: &str, width: usize) -> String {
    s.chars().take(width).collect()
}

/// Full-screen crossterm renderer: bordered panels, gauges as colored bars.
pub struct TerminalRenderer<W: Write> {
    out: W,
    fixed_size: Option<(u16, u16)>,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            fixed_size: None,
        }
    }

    /// Render at a fixed size instead of querying the terminal.
    pub fn with_size(out: W, width: u16, height: u16) -> Self {
        Self {
            out,
            fixed_size: Some((width, height)),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn size(&self) -> io::Result<(u16, u16)> {
        match self.fixed_size {
            Some(size) => Ok(size),
            None => crossterm::terminal::size(),
        }
    }

    fn draw_panel(&mut self, panel: &Panel, cell: Cell) -> io::Result<()> {
        if cell.width < 3 {
            return Ok(());
        }
        let inner = usize::from(cell.width - 2);

        let title = fit(panel.name, inner);
        let rule = "─".repeat(inner - title.chars().count());
        self.out.queue(MoveTo(cell.x, cell.y))?;
        self.out.queue(Print("┌".with(Color::Cyan)))?;
        self.out.queue(Print(title.with(Color::Green)))?;
        self.out.queue(Print(format!("{rule}┐").with(Color::Cyan)))?;

        self.out.queue(MoveTo(cell.x, cell.y + 1))?;
        self.out.queue(Print("│".with(Color::Cyan)))?;
        match &panel.value {
            PanelValue::Gauge {
                percent: Some(pct),
                band,
            } => {
                let label: Vec<char> = fit(&format!("{:^inner$}", format!("{pct}%")), inner)
                    .chars()
                    .collect();
                let filled = inner * usize::from(*pct) / 100;
                let (bar, rest) = label.split_at(filled.min(label.len()));
                let bar: String = bar.iter().collect();
                let rest: String = rest.iter().collect();
                self.out.queue(Print(bar.black().on(band_color(*band))))?;
                self.out.queue(Print(rest))?;
            }
            PanelValue::Gauge { percent: None, .. } => {
                self.out.queue(Print(fit(&format!("{:^inner$}", "--"), inner)))?;
            }
            PanelValue::Text { text, band } => {
                let body = format!("{:<inner$}", fit(text, inner));
                self.out.queue(Print(body.with(band_color(*band))))?;
            }
        }
        self.out.queue(Print("│".with(Color::Cyan)))?;

        self.out.queue(MoveTo(cell.x, cell.y + 2))?;
        self.out
            .queue(Print(format!("└{}┘", "─".repeat(inner)).with(Color::Cyan)))?;
        Ok(())
    }
}

impl<W: Write> DashboardRenderer for TerminalRenderer<W> {
    fn apply(&mut self, panels: &PanelSet) -> io::Result<()> {
        let (width, height) = self.size()?;
        self.out.queue(MoveTo(0, 0))?;
        self.out.queue(Clear(ClearType::All))?;

        let cells = layout(&panels.panels, width);
        let mut bottom = 0;
        for (panel, cell) in panels.panels.iter().zip(cells) {
            if cell.y + PANEL_HEIGHT > height {
                break;
            }
            self.draw_panel(panel, cell)?;
            bottom = bottom.max(cell.y + PANEL_HEIGHT);
        }
        if bottom < height {
            self.out.queue(MoveTo(0, bottom))?;
            self.out.queue(Print("Press q to quit.".dark_grey()))?;
        }
        self.out.flush()
    }
}

/// One JSON object per frame, newline delimited.
pub struct JsonRenderer<W: Write> {
    out: W,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DashboardRenderer for JsonRenderer<W> {
    fn apply(&mut self, panels: &PanelSet) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, panels)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }
}
