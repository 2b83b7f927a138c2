//! Correct/wrong answer pie chart: the series handed to the renderer, and the slot owning the
//! one live chart instance.

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};

pub const CORRECT_COLOR: &str = "#2ecc71";
pub const WRONG_COLOR: &str = "#e74c3c";
pub const PLACEHOLDER_COLOR: &str = "#bdc3c7";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieSeries {
    pub labels: Vec<String>,
    pub values: Vec<u32>,
    pub colors: Vec<String>,
    /// Slices get a theme-coloured border. Off for the placeholder.
    pub bordered: bool,
}

impl PieSeries {
    /// Correct vs wrong answers. With no answers at all this is a single neutral placeholder
    /// slice instead of an empty chart.
    pub fn answers(correct: u32, wrong: u32) -> Self {
        if correct == 0 && wrong == 0 {
            return PieSeries {
                labels: vec!["এখনো কোনো কুইজ দেননি".to_string()],
                values: vec![1],
                colors: vec![PLACEHOLDER_COLOR.to_string()],
                bordered: false,
            };
        }
        PieSeries {
            labels: vec!["সঠিক উত্তর".to_string(), "ভুল উত্তর".to_string()],
            values: vec![correct, wrong],
            colors: vec![CORRECT_COLOR.to_string(), WRONG_COLOR.to_string()],
            bordered: true,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        !self.bordered
    }
}

/// Start and end angle, in radians, of each slice. Slices start at twelve o'clock and run
/// clockwise. An all-zero series has no slices.
pub fn pie_slices(values: &[u32]) -> Vec<(f64, f64)> {
    let sum: f64 = values.iter().map(|&v| f64::from(v)).sum();
    if sum == 0.0 {
        return Vec::new();
    }
    let mut start = -FRAC_PI_2;
    values
        .iter()
        .map(|&v| {
            let end = start + TAU * f64::from(v) / sum;
            let slice = (start, end);
            start = end;
            slice
        })
        .collect()
}

/// A rendered chart. It has to be destroyed before a replacement is drawn.
pub trait ChartHandle {
    fn destroy(self);
}

/// Owns at most one live chart. Re-rendering releases the old chart, then acquires the new one.
pub struct ChartSlot<H: ChartHandle> {
    live: Option<H>,
}

impl<H: ChartHandle> ChartSlot<H> {
    pub fn new() -> Self {
        ChartSlot { live: None }
    }

    pub fn replace<E>(&mut self, create: impl FnOnce() -> Result<H, E>) -> Result<(), E> {
        self.release();
        self.live = Some(create()?);
        Ok(())
    }

    pub fn release(&mut self) {
        if let Some(chart) = self.live.take() {
            chart.destroy();
        }
    }

    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }
}

impl<H: ChartHandle> Default for ChartSlot<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ChartHandle> Drop for ChartSlot<H> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(feature = "hydrate")]
pub use canvas::CanvasPie;

#[cfg(feature = "hydrate")]
mod canvas {
    use super::{pie_slices, ChartHandle, PieSeries};
    use wasm_bindgen::JsCast;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

    /// Pie chart drawn straight onto a 2d canvas.
    pub struct CanvasPie {
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
    }

    impl CanvasPie {
        pub fn draw(
            canvas: HtmlCanvasElement,
            series: &PieSeries,
            border_color: &str,
        ) -> Result<Self, String> {
            let ctx: CanvasRenderingContext2d = canvas
                .get_context("2d")
                .map_err(|e| format!("{e:?}"))?
                .ok_or("canvas has no 2d context")?
                .dyn_into()
                .map_err(|_| "not a 2d context".to_string())?;

            let (cw, ch) = (canvas.client_width(), canvas.client_height());
            if cw > 0 && ch > 0 {
                canvas.set_width(cw as u32);
                canvas.set_height(ch as u32);
            }
            let (w, h) = (f64::from(canvas.width()), f64::from(canvas.height()));
            let (cx, cy) = (w / 2.0, h / 2.0);
            let radius = (w.min(h) / 2.0 - 4.0).max(0.0);

            ctx.clear_rect(0.0, 0.0, w, h);
            for ((start, end), color) in pie_slices(&series.values).into_iter().zip(&series.colors)
            {
                ctx.begin_path();
                ctx.move_to(cx, cy);
                ctx.arc(cx, cy, radius, start, end)
                    .map_err(|e| format!("{e:?}"))?;
                ctx.close_path();
                ctx.set_fill_style_str(color);
                ctx.fill();
                if series.bordered {
                    ctx.set_stroke_style_str(border_color);
                    ctx.set_line_width(3.0);
                    ctx.stroke();
                }
            }

            Ok(CanvasPie { canvas, ctx })
        }
    }

    impl ChartHandle for CanvasPie {
        fn destroy(self) {
            self.ctx.clear_rect(
                0.0,
                0.0,
                f64::from(self.canvas.width()),
                f64::from(self.canvas.height()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct FakeChart {
        id: u32,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl ChartHandle for FakeChart {
        fn destroy(self) {
            self.log.borrow_mut().push(format!("destroy {}", self.id));
        }
    }

    fn create(id: u32, log: &Rc<RefCell<Vec<String>>>) -> Result<FakeChart, String> {
        log.borrow_mut().push(format!("create {}", id));
        Ok(FakeChart {
            id,
            log: Rc::clone(log),
        })
    }

    #[test]
    fn test_zero_answers_placeholder() {
        let series = PieSeries::answers(0, 0);
        assert_eq!(series.labels.len(), 1);
        assert_eq!(series.values, vec![1]);
        assert_eq!(series.colors, vec![PLACEHOLDER_COLOR.to_string()]);
        assert!(series.is_placeholder());

        // A single wrong answer is real data, not a placeholder.
        let series = PieSeries::answers(0, 1);
        assert_eq!(series.values, vec![0, 1]);
        assert!(!series.is_placeholder());
    }

    #[test]
    fn test_pie_slices() {
        assert!(pie_slices(&[]).is_empty());
        assert!(pie_slices(&[0, 0]).is_empty());

        let slices = pie_slices(&[1, 3]);
        assert_eq!(slices.len(), 2);
        assert!((slices[0].0 + FRAC_PI_2).abs() < 1e-9);
        assert!((slices[0].1 - slices[0].0 - TAU / 4.0).abs() < 1e-9);
        assert!((slices[1].0 - slices[0].1).abs() < 1e-9);
        assert!((slices[1].1 - (TAU - FRAC_PI_2)).abs() < 1e-9);
    }

    #[test]
    fn test_slot_releases_before_acquiring() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut slot = ChartSlot::new();
        assert!(!slot.is_live());

        slot.replace(|| create(1, &log)).unwrap();
        slot.replace(|| create(2, &log)).unwrap();
        assert!(slot.is_live());
        assert_eq!(*log.borrow(), vec!["create 1", "destroy 1", "create 2"]);

        drop(slot);
        assert_eq!(log.borrow().last().map(String::as_str), Some("destroy 2"));
    }

    #[test]
    fn test_failed_render_leaves_slot_empty() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut slot = ChartSlot::new();
        slot.replace(|| create(1, &log)).unwrap();

        let result: Result<(), String> = slot.replace(|| Err("no canvas".to_string()));
        assert!(result.is_err());
        assert!(!slot.is_live());
        assert_eq!(*log.borrow(), vec!["create 1", "destroy 1"]);
    }
}
