//! G-code encoder
//!
//! Turns [`Operation`]s into protocol lines for one dialect. The encoder keeps
//! the modal state of the device (last emitted power, speed, focus and pen
//! position) and only writes a value when it differs from the last one
//! written. The state starts out unknown, so the first value of each kind is
//! always written.

use crate::dialect::{Dialect, ModalStyle};
use laserlink_core::{Operation, Point, Resolution};

/// Last values written to the device
///
/// `None` means the device state is unknown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModalState {
    /// Last emitted power, percent
    pub power: Option<f64>,
    /// Last emitted speed, percent
    pub speed: Option<f64>,
    /// Last emitted focus, mm
    pub focus: Option<f64>,
    /// Power waiting to be fused into the next mark
    pub pending_power: Option<f64>,
    /// Speed waiting to be fused into the next mark
    pub pending_speed: Option<f64>,
    /// Whether the pen is down
    pub pen_down: bool,
}

/// Stateful operation-to-line encoder
#[derive(Debug, Clone)]
pub struct GcodeEncoder<'a> {
    dialect: &'a Dialect,
    bed_width_mm: f64,
    state: ModalState,
}

fn changed(last: Option<f64>, next: f64) -> bool {
    last != Some(next)
}

impl<'a> GcodeEncoder<'a> {
    /// Create an encoder with unknown modal state
    pub fn new(dialect: &'a Dialect, bed_width_mm: f64) -> Self {
        Self {
            dialect,
            bed_width_mm,
            state: ModalState::default(),
        }
    }

    /// Forget everything known about the device
    pub fn reset(&mut self) {
        self.state = ModalState::default();
    }

    /// Current modal state
    pub fn state(&self) -> &ModalState {
        &self.state
    }

    fn coordinates(&self, point: Point, resolution: Resolution) -> (f64, f64) {
        let x = resolution.px_to_mm(f64::from(point.x));
        let y = resolution.px_to_mm(f64::from(point.y));
        if self.dialect.flip_x {
            (self.bed_width_mm - x, y)
        } else {
            (x, y)
        }
    }

    /// Encode one operation, appending protocol lines to `out`
    pub fn encode(&mut self, op: &Operation, resolution: Resolution, out: &mut Vec<String>) {
        match op {
            Operation::MoveTo(point) => {
                self.pen_up(out);
                let (x, y) = self.coordinates(*point, resolution);
                out.push(format!("G0 X{x:.6} Y{y:.6}"));
            }
            Operation::LineTo(point) => {
                self.pen_down(out);
                let (x, y) = self.coordinates(*point, resolution);
                let mut line = format!("G1 X{x:.6} Y{y:.6}");
                self.append_fused(&mut line);
                out.push(line);
            }
            Operation::SetPower(power) => self.set_power(*power, out),
            Operation::SetSpeed(speed) => self.set_speed(*speed, out),
            Operation::SetFocus(focus) => {
                if let ModalStyle::Fused { focus: true, .. } = self.dialect.modal {
                    if changed(self.state.focus, *focus) {
                        out.push(format!("G0 Z{focus:.6}"));
                        self.state.focus = Some(*focus);
                    }
                }
            }
            Operation::SetFrequency(frequency) => {
                tracing::trace!("Ignoring frequency {} for {}", frequency, self.dialect.kind);
            }
            Operation::RasterChunk { forward, payload } => {
                let direction = match forward {
                    Some(true) => "$1 ",
                    Some(false) => "$0 ",
                    None => "",
                };
                out.push(format!("G7 {direction}L{} D{payload}", payload.len()));
            }
            Operation::Raw(line) => out.push(line.clone()),
            Operation::ResetModal => {
                self.state.power = None;
                self.state.speed = None;
            }
        }
    }

    /// Lines that return the device to a neutral state after the job body
    pub fn finish(&mut self, out: &mut Vec<String>) {
        self.pen_up(out);
    }

    fn set_power(&mut self, power: f64, out: &mut Vec<String>) {
        match self.dialect.modal {
            ModalStyle::Fused { .. } => self.state.pending_power = Some(power),
            ModalStyle::Standalone { power_rate, .. } => {
                if changed(self.state.power, power) {
                    out.push(format!("S{}", (power_rate * power / 100.0) as i64));
                    self.state.power = Some(power);
                }
            }
            ModalStyle::Ignored => {}
        }
    }

    fn set_speed(&mut self, speed: f64, out: &mut Vec<String>) {
        match self.dialect.modal {
            ModalStyle::Fused { .. } => self.state.pending_speed = Some(speed),
            ModalStyle::Standalone { speed_rate, .. } => {
                if changed(self.state.speed, speed) {
                    out.push(format!("G1 F{}", (speed_rate * speed / 100.0) as i64));
                    self.state.speed = Some(speed);
                }
            }
            ModalStyle::Ignored => {}
        }
    }

    fn append_fused(&mut self, line: &mut String) {
        let ModalStyle::Fused {
            spindle_max,
            max_speed,
            ..
        } = self.dialect.modal
        else {
            return;
        };
        if let Some(power) = self.state.pending_power.take() {
            if changed(self.state.power, power) {
                line.push_str(&format!(" S{:.6}", power * spindle_max / 100.0));
                self.state.power = Some(power);
            }
        }
        if let Some(speed) = self.state.pending_speed.take() {
            if changed(self.state.speed, speed) {
                line.push_str(&format!(" F{}", (max_speed * speed / 100.0) as i64));
                self.state.speed = Some(speed);
            }
        }
    }

    fn pen_up(&mut self, out: &mut Vec<String>) {
        if let Some(pen) = &self.dialect.pen {
            if self.state.pen_down {
                out.push(pen.up.clone());
                self.state.pen_down = false;
            }
        }
    }

    fn pen_down(&mut self, out: &mut Vec<String>) {
        if let Some(pen) = &self.dialect.pen {
            if !self.state.pen_down {
                out.push(pen.down.clone());
                self.state.pen_down = true;
            }
        }
    }
}
