use super::common::vec3d::Vec3D;

/// Proportional, integral and derivative gains.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl PidGains {
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self { Self { kp, ki, kd } }

    pub fn is_finite(&self) -> bool {
        self.kp.is_finite() && self.ki.is_finite() && self.kd.is_finite()
    }
}

impl Default for PidGains {
    fn default() -> Self { Self::new(1.2, 0.1, 0.2) }
}

/// Three-channel PID controller producing a correction vector from `(target, current)`.
///
/// The integral term accumulates without any windup limit.
#[derive(Debug, Clone)]
pub struct PidController {
    gains: PidGains,
    integral: Vec3D<f64>,
    previous_error: Vec3D<f64>,
}

impl PidController {
    pub fn new(gains: PidGains) -> Self {
        Self { gains, integral: Vec3D::zero(), previous_error: Vec3D::zero() }
    }

    /// Computes the next correction and advances the controller state.
    ///
    /// ```text
    /// error      = target - current
    /// integral  += error
    /// derivative = error - previous_error
    /// correction = kp * error + ki * integral + kd * derivative
    /// ```
    pub fn compute(&mut self, target: Vec3D<f64>, current: Vec3D<f64>) -> Vec3D<f64> {
        let error = target - current;
        self.integral += error;
        let derivative = error - self.previous_error;
        self.previous_error = error;
        error * self.gains.kp + self.integral * self.gains.ki + derivative * self.gains.kd
    }

    /// Zeroes the integral and the remembered error. Gains are kept.
    pub fn reset(&mut self) {
        self.integral = Vec3D::zero();
        self.previous_error = Vec3D::zero();
    }

    pub fn gains(&self) -> PidGains { self.gains }
    pub fn integral(&self) -> Vec3D<f64> { self.integral }
    pub fn previous_error(&self) -> Vec3D<f64> { self.previous_error }
}
