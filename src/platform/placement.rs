//! Where the window appears when it is shown.
//!
//! Geometry is kept free of `tauri::Monitor` so it can be tested directly; the window adapter
//! extracts monitor bounds and delegates here.

use tauri::{PhysicalPosition, PhysicalSize};

/// Gap between the pointer and the window corner.
pub const CURSOR_OFFSET: i32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub origin: PhysicalPosition<i32>,
    pub size: PhysicalSize<u32>,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            origin: PhysicalPosition::new(x, y),
            size: PhysicalSize::new(width, height),
        }
    }

    /// Half-open on the right and bottom edges so adjacent monitors never both match.
    pub fn contains(&self, point: PhysicalPosition<i32>) -> bool {
        let right = self.origin.x.saturating_add(self.size.width as i32);
        let bottom = self.origin.y.saturating_add(self.size.height as i32);
        point.x >= self.origin.x && point.x < right && point.y >= self.origin.y && point.y < bottom
    }
}

pub fn monitor_containing(cursor: PhysicalPosition<i32>, monitors: &[Rect]) -> Option<usize> {
    monitors.iter().position(|monitor| monitor.contains(cursor))
}

/// Top-left corner for a window of `window` size opened at `cursor` on `monitor`.
///
/// The window goes below and to the right of the pointer, flips to the other side on an axis
/// where it does not fit, and is finally clamped inside the monitor. A window larger than the
/// monitor is pinned to the monitor's top-left corner.
pub fn near_cursor(
    cursor: PhysicalPosition<i32>,
    window: PhysicalSize<u32>,
    monitor: Rect,
) -> PhysicalPosition<i32> {
    if window.width > monitor.size.width || window.height > monitor.size.height {
        return monitor.origin;
    }

    let x = place_axis(
        cursor.x - monitor.origin.x,
        window.width as i32,
        monitor.size.width as i32,
    );
    let y = place_axis(
        cursor.y - monitor.origin.y,
        window.height as i32,
        monitor.size.height as i32,
    );
    PhysicalPosition::new(monitor.origin.x + x, monitor.origin.y + y)
}

fn place_axis(cursor: i32, extent: i32, available: i32) -> i32 {
    let after = cursor + CURSOR_OFFSET;
    if after + extent <= available {
        return after;
    }
    let before = cursor - CURSOR_OFFSET - extent;
    if before >= 0 {
        return before;
    }
    (available - extent).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: PhysicalSize<u32> = PhysicalSize {
        width: 400,
        height: 650,
    };

    #[test]
    fn opens_below_right_of_cursor() {
        let monitor = Rect::new(0, 0, 1920, 1080);
        let pos = near_cursor(PhysicalPosition::new(100, 100), WINDOW, monitor);
        assert_eq!(pos, PhysicalPosition::new(108, 108));
    }

    #[test]
    fn flips_near_far_edges() {
        let monitor = Rect::new(0, 0, 1920, 1080);
        let pos = near_cursor(PhysicalPosition::new(1900, 1000), WINDOW, monitor);
        assert_eq!(pos, PhysicalPosition::new(1900 - 8 - 400, 1000 - 8 - 650));
    }

    #[test]
    fn clamps_when_neither_side_fits() {
        let monitor = Rect::new(0, 0, 800, 700);
        let pos = near_cursor(PhysicalPosition::new(395, 350), WINDOW, monitor);
        assert_eq!(pos, PhysicalPosition::new(400, 50));
        assert!(pos.x >= 0 && pos.x + 400 <= 800);
        assert!(pos.y >= 0 && pos.y + 650 <= 700);
    }

    #[test]
    fn secondary_monitor_offsets_are_respected() {
        let monitors = [Rect::new(0, 0, 1920, 1080), Rect::new(-1280, 0, 1280, 1024)];
        let cursor = PhysicalPosition::new(-20, 1010);
        let index = monitor_containing(cursor, &monitors).expect("monitor");
        assert_eq!(index, 1);

        let pos = near_cursor(cursor, WINDOW, monitors[index]);
        assert!(pos.x >= -1280 && pos.x + 400 <= 0);
        assert!(pos.y >= 0 && pos.y + 650 <= 1024);
    }

    #[test]
    fn oversized_window_goes_to_monitor_origin() {
        let monitor = Rect::new(1920, 0, 320, 480);
        let pos = near_cursor(PhysicalPosition::new(2000, 100), WINDOW, monitor);
        assert_eq!(pos, PhysicalPosition::new(1920, 0));
    }

    #[test]
    fn shared_edge_belongs_to_one_monitor() {
        let monitors = [Rect::new(0, 0, 1920, 1080), Rect::new(1920, 0, 1920, 1080)];
        assert_eq!(
            monitor_containing(PhysicalPosition::new(1920, 10), &monitors),
            Some(1)
        );
        assert_eq!(
            monitor_containing(PhysicalPosition::new(-5, 10), &monitors),
            None
        );
    }
}
