use glam::Vec3;

/// Four-point cubic Bezier segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    pub points: [Vec3; 4],
}

impl CubicBezier {
    pub fn new(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3) -> Self {
        Self { points: [p0, p1, p2, p3] }
    }

    /// de Casteljau evaluation, `t` in [0, 1].
    pub fn eval(&self, t: f32) -> Vec3 {
        let [p0, p1, p2, p3] = self.points;
        let a = p0.lerp(p1, t);
        let b = p1.lerp(p2, t);
        let c = p2.lerp(p3, t);
        let d = a.lerp(b, t);
        let e = b.lerp(c, t);
        d.lerp(e, t)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sweep {
    Ascending,
    Descending,
}

/// Marker that sweeps back and forth along two chained segments next to the
/// lever wall, tracing the lever order.
#[derive(Debug, Clone)]
pub struct HintCurve {
    first: CubicBezier,
    second: CubicBezier,
    t: f32,
    sweep: Sweep,
    rate: f32,
}

impl HintCurve {
    pub const SPAN: f32 = 2.0;

    pub fn new(rate: f32) -> Self {
        let x = -2.39;
        let p3 = Vec3::new(x, 1.5, -0.95);
        Self {
            first: CubicBezier::new(
                Vec3::new(x, 1.0, -1.7),
                Vec3::new(x, 1.0, -1.5),
                Vec3::new(x, 1.0, -0.95),
                p3,
            ),
            second: CubicBezier::new(
                p3,
                Vec3::new(x, 2.3, -0.95),
                Vec3::new(x, 1.2, 0.35),
                Vec3::new(x, 1.2, 0.55),
            ),
            t: 0.0,
            sweep: Sweep::Ascending,
            rate,
        }
    }

    pub fn t(&self) -> f32 {
        self.t
    }

    pub fn sweep(&self) -> Sweep {
        self.sweep
    }

    pub fn segments(&self) -> (&CubicBezier, &CubicBezier) {
        (&self.first, &self.second)
    }

    /// Turns around at the ends, then steps by `rate * dt`.
    pub fn advance(&mut self, dt: f32) {
        if self.t >= Self::SPAN {
            self.sweep = Sweep::Descending;
        } else if self.t <= 0.0 {
            self.sweep = Sweep::Ascending;
        }
        let step = self.rate * dt;
        match self.sweep {
            Sweep::Ascending => self.t += step,
            Sweep::Descending => self.t -= step,
        }
    }

    pub fn position(&self) -> Vec3 {
        Self::position_at(&self.first, &self.second, self.t)
    }

    fn position_at(first: &CubicBezier, second: &CubicBezier, t: f32) -> Vec3 {
        if t <= 1.0 {
            first.eval(t.max(0.0))
        } else {
            second.eval((t - 1.0).min(1.0))
        }
    }
}
