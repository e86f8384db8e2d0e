//! Curve interpolation.

use crate::structures::{Curve, CurveType};

/// Newton steps used to invert a Bezier time curve. Fixed rather than
/// run to a tolerance so results are reproducible.
const BEZIER_TIME_ITERATIONS: usize = 3;

fn at(data: &[f32], i: usize) -> f32 {
    data.get(i).copied().unwrap_or(0.0)
}

/// Solve the cubic time curve through `t0, t1, t2, t0 + dt` for the
/// parameter reaching `time`, starting from the linear estimate `u`.
fn invert_bezier_time(mut u: f32, t0: f32, t1: f32, t2: f32, dt: f32, time: f32) -> f32 {
    let a0 = dt + (t1 - t2) * 3.0;
    let a1 = a0 * 3.0;
    let b0 = 3.0 * (t0 - t1 * 2.0 + t2);
    let b1 = b0 * 2.0;
    let c = (t1 - t0) * 3.0;
    let d = t0 - time;

    for _ in 0..BEZIER_TIME_ITERATIONS {
        let slope = (a1 * u + b1) * u + c;
        if slope == 0.0 {
            break;
        }
        let f = ((a0 * u + b0) * u + c) * u + d;
        u = (u - f / slope).clamp(0.0, 1.0);
    }
    u
}

impl Curve {
    /// Bracketing key index and local parameter for `time` on a Time curve.
    ///
    /// The index names the key at or before `time`: `-1` before the first
    /// key and `element_count - 1` at or after the last, where the parameter
    /// is 0.
    pub fn interpolation_parameter(&self, time: f32) -> (isize, f32) {
        let times = &self.value[..self.element_count.min(self.value.len())];
        let count = times.len();
        let index = times.iter().position(|&t| time < t).unwrap_or(count);

        let mut u = 0.0;
        if index > 0 && index < count {
            let t0 = times[index - 1];
            let dt = times[index] - t0;
            if dt > f32::MIN_POSITIVE {
                u = (time - t0) / dt;
            }
            if self.curve == CurveType::Bezier {
                let t1 = at(&self.plus_control, index - 1);
                let t2 = at(&self.minus_control, index);
                u = invert_bezier_time(u, t0, t1, t2, dt, time);
            }
        }
        (index as isize - 1, u)
    }

    /// Blend the value keys at `index` and `index + 1` with parameter `u`.
    ///
    /// Indexes outside the interior clamp to the first or last key.
    pub fn sample(&self, index: isize, u: f32) -> Vec<f32> {
        let stride = self.array_size.max(1) as usize;
        let count = self.element_count;
        if count == 0 {
            return Vec::new();
        }

        let values: &[f32] = &self.value;
        let key = |i: usize| -> Vec<f32> { (0..stride).map(|k| at(values, i * stride + k)).collect() };
        if index < 0 {
            return key(0);
        }
        let i = index as usize;
        if i >= count - 1 {
            return key(count - 1);
        }

        let p1 = i * stride;
        let p2 = p1 + stride;
        let v = 1.0 - u;

        match self.curve {
            CurveType::Constant => key(i),
            CurveType::Linear => (0..stride)
                .map(|k| at(values, p1 + k) * v + at(values, p2 + k) * u)
                .collect(),
            CurveType::Bezier => {
                let f1 = v * v * u * 3.0;
                let f2 = v * u * u * 3.0;
                (0..stride)
                    .map(|k| {
                        at(values, p1 + k) * v * v * v
                            + at(&self.plus_control, p1 + k) * f1
                            + at(&self.minus_control, p2 + k) * f2
                            + at(values, p2 + k) * u * u * u
                    })
                    .collect()
            }
            CurveType::Tcb => {
                let p0 = i.saturating_sub(1) * stride;
                let p3 = (i + 2).min(count - 1) * stride;

                let (t1, c1, b1) = (at(&self.tension, i), at(&self.continuity, i), at(&self.bias, i));
                let (t2, c2, b2) = (
                    at(&self.tension, i + 1),
                    at(&self.continuity, i + 1),
                    at(&self.bias, i + 1),
                );
                let m1 = (1.0 - t1) * (1.0 + c1) * (1.0 + b1) * 0.5;
                let n1 = (1.0 - t1) * (1.0 - c1) * (1.0 - b1) * 0.5;
                let m2 = (1.0 - t2) * (1.0 - c2) * (1.0 + b2) * 0.5;
                let n2 = (1.0 - t2) * (1.0 + c2) * (1.0 - b2) * 0.5;

                let f1 = 1.0 - u * u * 3.0 + u * u * u * 2.0;
                let f2 = u * u * (3.0 - u * 2.0);
                let f3 = u * v * v;
                let f4 = v * u * u;

                (0..stride)
                    .map(|k| {
                        let (a, b, c, d) = (
                            at(values, p0 + k),
                            at(values, p1 + k),
                            at(values, p2 + k),
                            at(values, p3 + k),
                        );
                        let out_tangent = (b - a) * m1 + (c - b) * n1;
                        let in_tangent = (c - b) * m2 + (d - c) * n2;
                        b * f1 + c * f2 + out_tangent * f3 - in_tangent * f4
                    })
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time_curve(times: &[f32]) -> Curve {
        Curve {
            curve: CurveType::Linear,
            element_count: times.len(),
            value: times.to_vec(),
            ..Default::default()
        }
    }

    fn value_curve(curve: CurveType, values: &[f32]) -> Curve {
        let n = values.len();
        Curve {
            curve,
            element_count: n,
            value: values.to_vec(),
            minus_control: values.iter().map(|v| v - 0.5).collect(),
            plus_control: values.iter().map(|v| v + 0.5).collect(),
            tension: vec![0.2; n],
            continuity: vec![-0.3; n],
            bias: vec![0.1; n],
            ..Default::default()
        }
    }

    #[test]
    fn test_time_lookup_brackets_and_clamps() {
        let time = time_curve(&[0.0, 1.0, 3.0]);
        assert_eq!(time.interpolation_parameter(-1.0), (-1, 0.0));
        assert_eq!(time.interpolation_parameter(0.5), (0, 0.5));
        assert_eq!(time.interpolation_parameter(2.0), (1, 0.5));
        assert_eq!(time.interpolation_parameter(3.0), (2, 0.0));
        assert_eq!(time.interpolation_parameter(10.0), (2, 0.0));
    }

    #[test]
    fn test_bezier_time_with_linear_controls() {
        let mut time = time_curve(&[0.0, 3.0]);
        time.curve = CurveType::Bezier;
        time.plus_control = vec![1.0, 4.0];
        time.minus_control = vec![-1.0, 2.0];

        let (index, u) = time.interpolation_parameter(1.5);
        assert_eq!(index, 0);
        assert!((u - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_bezier_time_at_key_is_exact() {
        let mut time = time_curve(&[0.0, 1.0, 2.0]);
        time.curve = CurveType::Bezier;
        time.plus_control = vec![0.1, 1.5, 2.2];
        time.minus_control = vec![-0.2, 0.9, 1.6];
        assert_eq!(time.interpolation_parameter(1.0), (1, 0.0));
    }

    #[test]
    fn test_interpolation_identity_at_keys() {
        let values = [2.0, -1.0, 4.0, 0.5];
        let time = time_curve(&[0.0, 1.0, 2.0, 3.0]);

        for curve in [CurveType::Constant, CurveType::Linear, CurveType::Bezier, CurveType::Tcb] {
            let value = value_curve(curve, &values);
            for (k, &t) in time.value.iter().enumerate() {
                let (index, u) = time.interpolation_parameter(t);
                assert_eq!(value.sample(index, u), vec![values[k]], "{:?} at key {}", curve, k);
            }
        }
    }

    #[test]
    fn test_linear_midpoint() {
        let value = Curve {
            curve: CurveType::Linear,
            array_size: 3,
            element_count: 2,
            value: vec![0.0, 0.0, 0.0, 2.0, 4.0, 6.0],
            ..Default::default()
        };
        assert_eq!(value.sample(0, 0.5), vec![1.0, 2.0, 3.0]);
        assert_eq!(value.sample(-1, 0.0), vec![0.0, 0.0, 0.0]);
        assert_eq!(value.sample(1, 0.0), vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_tcb_with_zero_parameters_is_catmull_rom() {
        let mut value = value_curve(CurveType::Tcb, &[0.0, 1.0, 2.0, 3.0]);
        value.tension = vec![0.0; 4];
        value.continuity = vec![0.0; 4];
        value.bias = vec![0.0; 4];

        // Evenly spaced collinear keys interpolate linearly.
        let sample = value.sample(1, 0.5)[0];
        assert!((sample - 1.5).abs() < 1e-6);
    }
}
