//! Battle-space window and pixel mapping

use glam::{DVec2, IVec2};
use serde::{Deserialize, Serialize};

use crate::consts::{BOTTOM_BAR_PX, VIEW_FILL, VIEW_SIZE};

/// Square window onto battle space, centred on the home ship
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BattleView {
    pub center: DVec2,
    pub dims: DVec2,
    /// Side of the on-screen square in pixels
    pub screen_px: u32,
}

impl Default for BattleView {
    fn default() -> Self {
        Self { center: DVec2::ZERO, dims: DVec2::splat(VIEW_SIZE), screen_px: 600 }
    }
}

impl BattleView {
    /// Strictly inside the window
    pub fn in_view(&self, pt: DVec2) -> bool {
        let half = self.dims / 2.0;
        let d = (pt - self.center).abs();
        d.x < half.x && d.y < half.y
    }

    /// Largest window dimension
    pub fn extent(&self) -> f64 {
        self.dims.max_element()
    }

    /// Pixel position of a battle-space point (y grows downward on screen)
    pub fn to_screen(&self, pt: DVec2) -> IVec2 {
        let rel = (pt - self.center) / self.dims + DVec2::splat(0.5);
        let px = self.screen_px as f64;
        IVec2::new((rel.x * px).round() as i32, ((1.0 - rel.y) * px).round() as i32)
    }

    /// Pixel length of a battle-space distance
    pub fn scale(&self, dim: f64) -> i32 {
        (dim / self.dims.x * self.screen_px as f64).round() as i32
    }

    /// Fit the play field to a window, leaving room for the status bar.
    pub fn resize(&mut self, window_w: u32, window_h: u32) {
        let usable = window_w.min(window_h.saturating_sub(BOTTOM_BAR_PX));
        self.screen_px = (usable as f64 * VIEW_FILL) as u32;
    }
}
