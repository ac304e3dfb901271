//! Orbit and clock propagation from a broadcast ephemeris.
//!
//! The PZ-90 equations of motion are integrated in the rotating
//! earth-fixed frame with a fixed-step RK4 scheme: central attraction,
//! J2/J4 zonal harmonics, centrifugal and Coriolis terms, and the
//! luni-solar tidal accelerations from the simplified ICD lunar/solar
//! ephemerides. The integration is pure and deterministic; concurrent
//! calls over a shared record are safe.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::{
    constants::{
        ECLIPTIC_OBLIQUITY_DEG, EPHEMERIS_MAX_AGE_SEC, GLONASS_EARTH_RADIUS, GLONASS_GM,
        GLONASS_J2, GLONASS_J4, GLONASS_JD0_BASE, GLONASS_OMEGA_EARTH, MOON_ECCENTRICITY,
        MOON_GM, MOON_INCLINATION_DEG, MOON_OMEGA0_DEG, MOON_OMEGA1_DEG, MOON_Q0_DEG,
        MOON_Q1_DEG, MOON_SEMI_MAJOR_AXIS, MOON_TAU0_DEG, MOON_TAU1_DEG, MOSCOW_UTC_OFFSET_SEC,
        SEC_PER_DAY, SUN_ECCENTRICITY, SUN_GM, SUN_OMEGA0_DEG, SUN_OMEGA1_DEG, SUN_Q0_DEG,
        SUN_Q1_DEG, SUN_SEMI_MAJOR_AXIS,
    },
    ephemeris::{Ephemeris, wrap_day_offset},
};

/// Largest RK4 step; the actual step divides the propagation span exactly.
const MAX_STEP_SEC: f64 = 60.0;

/// Propagated satellite state at a target epoch.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SatelliteState {
    pub t_sec: f64, // target epoch, seconds within the day (Moscow time)
    pub pos_km: [f64; 3],
    pub vel_km_s: [f64; 3],
    pub clock_bias_sec: f64,
    /// Set when the extrapolation age exceeds the validity window; the
    /// caller decides whether to use the degraded estimate.
    pub stale: bool,
}

/// Propagate `eph` to `t_sec` (seconds within the day of t_b, Moscow
/// time). Propagating to t_b itself returns the broadcast state exactly.
pub fn propagate(eph: &Ephemeris, t_sec: f64) -> SatelliteState {
    let dt = wrap_day_offset(t_sec - eph.tb_sec);
    let stale = dt.abs() > EPHEMERIS_MAX_AGE_SEC;
    if stale {
        log::warn!(
            "{}: stale ephemeris: tb={:.0} extrapolated {:+.0}s",
            eph.sv,
            eph.tb_sec,
            dt
        );
    }
    let clock_bias_sec = eph.clock_bias(t_sec);

    if dt == 0.0 {
        return SatelliteState {
            t_sec,
            pos_km: eph.pos_km,
            vel_km_s: eph.vel_km_s,
            clock_bias_sec,
            stale,
        };
    }

    let ctx = Perturbations::at_tb(eph);
    let steps = (dt.abs() / MAX_STEP_SEC).ceil() as usize;
    let h = dt / steps as f64;
    assert!(h != 0.0 && h.abs() <= MAX_STEP_SEC, "bad integrator step {h}");

    let mut y = [
        eph.pos_km[0],
        eph.pos_km[1],
        eph.pos_km[2],
        eph.vel_km_s[0],
        eph.vel_km_s[1],
        eph.vel_km_s[2],
    ];
    let mut tau = 0.0;
    for _ in 0..steps {
        y = rk4_step(&y, tau, h, &ctx);
        tau += h;
    }

    SatelliteState {
        t_sec,
        pos_km: [y[0], y[1], y[2]],
        vel_km_s: [y[3], y[4], y[5]],
        clock_bias_sec,
        stale,
    }
}

/// Lunar/solar geometry frozen at t_b. The bodies barely move over the
/// validity window, so their inertial positions are computed once; only
/// the earth rotation angle advances during integration.
struct Perturbations {
    moon_eq_km: [f64; 3], // inertial equatorial frame
    sun_eq_km: [f64; 3],
    theta0_rad: f64, // earth rotation angle at t_b
}

impl Perturbations {
    fn at_tb(eph: &Ephemeris) -> Self {
        let jd0 = 1461.0 * (eph.n4 as f64 - 1.0) + eph.nt as f64 + GLONASS_JD0_BASE;
        let t_ut = eph.tb_sec - MOSCOW_UTC_OFFSET_SEC;
        // Julian centuries from epoch 1900 Jan 0.5, matching the Newcomb
        // polynomials in the ICD appendix
        let tc = (jd0 + t_ut / SEC_PER_DAY - 2415020.0) / 36525.0;

        Self {
            moon_eq_km: moon_position_eq(tc),
            sun_eq_km: sun_position_eq(tc),
            theta0_rad: gmst_rad(jd0) + GLONASS_OMEGA_EARTH * t_ut,
        }
    }

    fn theta(&self, tau: f64) -> f64 {
        self.theta0_rad + GLONASS_OMEGA_EARTH * tau
    }
}

/// Greenwich mean sidereal time at Julian date `jd0` (0h UT), radians.
fn gmst_rad(jd0: f64) -> f64 {
    let tu = (jd0 - 2451545.0) / 36525.0;
    let s = 24110.54841 + 8640184.812866 * tu + 0.093104 * tu * tu - 6.2e-6 * tu * tu * tu;
    s.rem_euclid(SEC_PER_DAY) * PI / 43200.0
}

fn deg2rad(d: f64) -> f64 {
    d * PI / 180.0
}

/// Kepler's equation by Newton iteration, as in the GPS eccentric anomaly
/// solvers; the perturbing-body eccentricities converge in a few steps.
fn eccentric_anomaly(q_rad: f64, ecc: f64) -> f64 {
    let mut e = q_rad;
    for _ in 0..20 {
        let de = (e - ecc * e.sin() - q_rad) / (1.0 - ecc * e.cos());
        e -= de;
        if de.abs() < 1e-12 {
            break;
        }
    }
    e
}

/// In-plane position from mean anomaly and perigee direction, rotated
/// through node/inclination/obliquity into the inertial equatorial frame.
fn orbital_to_equatorial(
    a_km: f64,
    ecc: f64,
    q_rad: f64,
    perigee_lon_rad: f64,
    node_rad: f64,
    incl_rad: f64,
) -> [f64; 3] {
    let ea = eccentric_anomaly(q_rad, ecc);
    let nu = ((1.0 - ecc * ecc).sqrt() * ea.sin()).atan2(ea.cos() - ecc);
    let u = nu + (perigee_lon_rad - node_rad); // argument of latitude
    let r = a_km * (1.0 - ecc * ea.cos());

    let (su, cu) = u.sin_cos();
    let (so, co) = node_rad.sin_cos();
    let (si, ci) = incl_rad.sin_cos();
    let xe = r * (cu * co - su * so * ci);
    let ye = r * (cu * so + su * co * ci);
    let ze = r * su * si;

    // ecliptic to equatorial
    let (se, ce) = deg2rad(ECLIPTIC_OBLIQUITY_DEG).sin_cos();
    [xe, ye * ce - ze * se, ye * se + ze * ce]
}

fn moon_position_eq(tc: f64) -> [f64; 3] {
    orbital_to_equatorial(
        MOON_SEMI_MAJOR_AXIS,
        MOON_ECCENTRICITY,
        deg2rad(MOON_Q0_DEG + MOON_Q1_DEG * tc),
        deg2rad(MOON_TAU0_DEG + MOON_TAU1_DEG * tc),
        deg2rad(MOON_OMEGA0_DEG + MOON_OMEGA1_DEG * tc),
        deg2rad(MOON_INCLINATION_DEG),
    )
}

fn sun_position_eq(tc: f64) -> [f64; 3] {
    orbital_to_equatorial(
        SUN_SEMI_MAJOR_AXIS,
        SUN_ECCENTRICITY,
        deg2rad(SUN_Q0_DEG + SUN_Q1_DEG * tc),
        deg2rad(SUN_OMEGA0_DEG + SUN_OMEGA1_DEG * tc),
        0.0,
        0.0,
    )
}

/// Rotate an inertial equatorial vector into the earth-fixed frame at
/// rotation angle `theta`.
fn to_earth_fixed(p: &[f64; 3], theta: f64) -> [f64; 3] {
    let (st, ct) = theta.sin_cos();
    [p[0] * ct + p[1] * st, -p[0] * st + p[1] * ct, p[2]]
}

/// Tidal acceleration of a perturbing body at `body_km` on a satellite at
/// `sat_km`: direct attraction minus the attraction on the earth's center.
fn tidal_accel(body_km: &[f64; 3], gm: f64, sat_km: &[f64; 3]) -> [f64; 3] {
    let d = [
        body_km[0] - sat_km[0],
        body_km[1] - sat_km[1],
        body_km[2] - sat_km[2],
    ];
    let d3 = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt().powi(3);
    let b3 = (body_km[0] * body_km[0] + body_km[1] * body_km[1] + body_km[2] * body_km[2])
        .sqrt()
        .powi(3);
    [
        gm * (d[0] / d3 - body_km[0] / b3),
        gm * (d[1] / d3 - body_km[1] / b3),
        gm * (d[2] / d3 - body_km[2] / b3),
    ]
}

/// Acceleration in the rotating PZ-90 frame [km/s^2].
fn accel(y: &[f64; 6], theta: f64, ctx: &Perturbations) -> [f64; 3] {
    let [x, yy, z, vx, vy, _] = *y;
    let r2 = x * x + yy * yy + z * z;
    let r = r2.sqrt();
    let gm_r3 = -GLONASS_GM / (r2 * r);
    let zr2 = z * z / r2;

    let ae_r = GLONASS_EARTH_RADIUS / r;
    // zonal harmonics along body-fixed axes
    let c2 = -1.5 * GLONASS_J2 * GLONASS_GM * ae_r * ae_r / (r2 * r);
    let c4 = 1.875 * GLONASS_J4 * GLONASS_GM * ae_r.powi(4) / (r2 * r);
    let j_xy = c2 * (1.0 - 5.0 * zr2) + c4 * (1.0 - 14.0 * zr2 + 21.0 * zr2 * zr2);
    let j_z = c2 * (3.0 - 5.0 * zr2) + c4 * (5.0 - 70.0 / 3.0 * zr2 + 21.0 * zr2 * zr2);

    let moon = tidal_accel(&to_earth_fixed(&ctx.moon_eq_km, theta), MOON_GM, &[x, yy, z]);
    let sun = tidal_accel(&to_earth_fixed(&ctx.sun_eq_km, theta), SUN_GM, &[x, yy, z]);

    let w = GLONASS_OMEGA_EARTH;
    [
        (gm_r3 + j_xy) * x + w * w * x + 2.0 * w * vy + moon[0] + sun[0],
        (gm_r3 + j_xy) * yy + w * w * yy - 2.0 * w * vx + moon[1] + sun[1],
        (gm_r3 + j_z) * z + moon[2] + sun[2],
    ]
}

fn deriv(y: &[f64; 6], theta: f64, ctx: &Perturbations) -> [f64; 6] {
    let a = accel(y, theta, ctx);
    [y[3], y[4], y[5], a[0], a[1], a[2]]
}

fn rk4_step(y: &[f64; 6], tau: f64, h: f64, ctx: &Perturbations) -> [f64; 6] {
    let offset = |y0: &[f64; 6], k: &[f64; 6], s: f64| -> [f64; 6] {
        std::array::from_fn(|i| y0[i] + k[i] * s)
    };

    let k1 = deriv(y, ctx.theta(tau), ctx);
    let k2 = deriv(&offset(y, &k1, h / 2.0), ctx.theta(tau + h / 2.0), ctx);
    let k3 = deriv(&offset(y, &k2, h / 2.0), ctx.theta(tau + h / 2.0), ctx);
    let k4 = deriv(&offset(y, &k3, h), ctx.theta(tau + h), ctx);

    std::array::from_fn(|i| y[i] + h / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gnss_rs::constellation::Constellation;
    use gnss_rs::sv::SV;

    // circular GLONASS-like orbit, inclination ~64.8 deg, expressed in
    // the rotating frame: v_ef = v_inertial - omega x r
    fn eph() -> Ephemeris {
        let r = 25508.0;
        let v = (GLONASS_GM / r).sqrt();
        let incl: f64 = 64.8f64.to_radians();
        Ephemeris {
            sv: SV::new(Constellation::Glonass, 3),
            tb_sec: 6.0 * 3600.0,
            pos_km: [r, 0.0, 0.0],
            vel_km_s: [
                0.0,
                v * incl.cos() - GLONASS_OMEGA_EARTH * r,
                v * incl.sin(),
            ],
            tau_n: 2.5e-5,
            gamma_n: 1.0e-12,
            nt: 900,
            n4: 8,
            ..Ephemeris::default()
        }
    }

    #[test]
    fn test_zero_elapsed_returns_broadcast_state() {
        let eph = eph();
        let st = propagate(&eph, eph.tb_sec);
        assert_eq!(st.pos_km, eph.pos_km);
        assert_eq!(st.vel_km_s, eph.vel_km_s);
        assert_eq!(st.clock_bias_sec, eph.tau_n);
        assert!(!st.stale);
    }

    #[test]
    fn test_deterministic() {
        let eph = eph();
        let a = propagate(&eph, eph.tb_sec + 731.0);
        let b = propagate(&eph, eph.tb_sec + 731.0);
        assert_eq!(a.pos_km, b.pos_km);
        assert_eq!(a.vel_km_s, b.vel_km_s);
        assert_eq!(a.clock_bias_sec, b.clock_bias_sec);
    }

    #[test]
    fn test_forward_backward_symmetry() {
        let eph0 = eph();
        let fwd = propagate(&eph0, eph0.tb_sec + 900.0);

        // re-anchor at the propagated state and integrate back
        let eph1 = Ephemeris {
            tb_sec: eph0.tb_sec + 900.0,
            pos_km: fwd.pos_km,
            vel_km_s: fwd.vel_km_s,
            ..eph0
        };
        // the luni-solar context re-freezes at the new anchor, so this is
        // not an exact reversal; meter-level agreement is expected
        let back = propagate(&eph1, eph0.tb_sec);
        for i in 0..3 {
            assert!(
                (back.pos_km[i] - eph0.pos_km[i]).abs() < 1e-3,
                "axis {i}: {} vs {}",
                back.pos_km[i],
                eph0.pos_km[i]
            );
            assert!((back.vel_km_s[i] - eph0.vel_km_s[i]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_near_circular_radius_is_preserved() {
        let eph = eph();
        let st = propagate(&eph, eph.tb_sec + 1500.0);
        let r0 = 25508.0;
        let r = (st.pos_km[0] * st.pos_km[0]
            + st.pos_km[1] * st.pos_km[1]
            + st.pos_km[2] * st.pos_km[2])
            .sqrt();
        // short-period J2 oscillation at this altitude is under 2 km;
        // luni-solar terms are far smaller still
        assert!((r - r0).abs() < 5.0, "radius drifted to {r}");
        assert!(!st.stale);
    }

    #[test]
    fn test_speed_is_plausible() {
        let eph = eph();
        let st = propagate(&eph, eph.tb_sec + 600.0);
        let v = (st.vel_km_s[0] * st.vel_km_s[0]
            + st.vel_km_s[1] * st.vel_km_s[1]
            + st.vel_km_s[2] * st.vel_km_s[2])
            .sqrt();
        // rotating-frame speed near the node:
        // sqrt(v^2 - 2*w*r*v*cos(i) + (w*r)^2) ~ 3.581 km/s
        assert!((v - 3.581).abs() < 0.05, "speed {v}");
    }

    #[test]
    fn test_staleness_flag() {
        let eph = eph();
        assert!(!propagate(&eph, eph.tb_sec + EPHEMERIS_MAX_AGE_SEC).stale);
        assert!(propagate(&eph, eph.tb_sec + EPHEMERIS_MAX_AGE_SEC + 1.0).stale);
        assert!(propagate(&eph, eph.tb_sec - EPHEMERIS_MAX_AGE_SEC - 1.0).stale);
    }

    #[test]
    fn test_clock_bias_at_offset() {
        let eph = eph();
        let st = propagate(&eph, eph.tb_sec + 1200.0);
        assert_eq!(st.clock_bias_sec, 2.5e-5 + 1.0e-12 * 1200.0);
    }

    #[test]
    fn test_perturbing_bodies_at_sane_distances() {
        let eph = eph();
        let ctx = Perturbations::at_tb(&eph);
        let norm = |p: &[f64; 3]| (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
        let dm = norm(&ctx.moon_eq_km);
        let ds = norm(&ctx.sun_eq_km);
        assert!((3.5e5..4.1e5).contains(&dm), "moon at {dm} km");
        assert!((1.45e8..1.55e8).contains(&ds), "sun at {ds} km");
    }
}
