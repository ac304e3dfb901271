use colored::Colorize;
use gnss_rs::sv::SV;
use hifitime::{Epoch, Unit};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{MOSCOW_UTC_OFFSET_SEC, P2_11, P2_20, P2_30, P2_31, P2_40},
    frame::FrameFields,
};

/// Immediate ephemeris broadcast in strings 1-5 of one frame, scaled to
/// physical units. Immutable once built; a newer frame supersedes the
/// record, it is never mutated in place.
#[derive(Default, Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Ephemeris {
    pub sv: SV,
    pub ts_sec: f64, // receiver time of the completing string

    pub tb_sec: f64, // reference time within the day, Moscow time [s]
    pub tk_sec: f64, // frame time within the day, Moscow time [s]
    pub tb_utc: Epoch,

    // PZ-90 earth-fixed state at tb
    pub pos_km: [f64; 3],
    pub vel_km_s: [f64; 3],
    pub acc_km_s2: [f64; 3], // broadcast luni-solar accelerations

    // clock model
    pub tau_n: f64,       // SV clock bias [s]
    pub gamma_n: f64,     // SV relative frequency offset
    pub delta_tau_n: f64, // L2-L1 group delay [s]
    pub tau_c: f64,       // GLONASS time scale offset vs UTC(SU) [s]
    pub tau_gps: f64,     // GLONASS vs GPS time scale offset [s]

    // status
    pub p1: u8,      // update interval flag
    pub p2: u8,      // tb parity flag
    pub p3: u8,      // almanac satellite count flag
    pub p4: u8,      // updated-ephemeris flag
    pub p: u8,       // time parameter source mode
    pub bn: u8,      // health word, MSB set = unhealthy
    pub ln: bool,    // failure flag
    pub ft: u8,      // user range accuracy index
    pub en_days: u8, // age of the immediate data [days]
    pub m: u8,       // satellite type (0 GLONASS, 1 GLONASS-M)

    // calendar counters
    pub nt: u16,      // day within the four-year cycle
    pub n4: u8,       // four-year cycle number since 1996
    pub na_days: u16, // almanac reference day
    pub slot: u8,     // transmitting slot number n
}

/// Calendar year and day-of-year for the GLONASS (N_4, N_T) counters.
/// The cycle starts 1996-01-01; every leap year through 2096 opens a cycle.
/// `nt` must lie in 1..=1461; the assembler rejects anything else before a
/// frame reaches the builder.
pub fn glonass_calendar(n4: u8, nt: u16) -> (i32, u16) {
    let year0 = 1996 + 4 * (n4 as i32 - 1);
    match nt {
        1..=366 => (year0, nt),
        367..=731 => (year0 + 1, nt - 366),
        732..=1096 => (year0 + 2, nt - 731),
        _ => (year0 + 3, nt - 1096),
    }
}

impl Ephemeris {
    /// Scale a completed frame into physical units. The assembler only
    /// emits complete frames, so every field is present.
    pub fn from_frame(sv: SV, f: &FrameFields, ts_sec: f64) -> Self {
        assert!(f.complete(), "builder fed a partial frame");

        let tb_sec = f.tb as f64 * 900.0;
        let hours = (f.tk >> 7) as f64;
        let minutes = ((f.tk >> 1) & 0x3f) as f64;
        let tk_sec = hours * 3600.0 + minutes * 60.0 + (f.tk & 1) as f64 * 30.0;

        let (year, doy) = glonass_calendar(f.n4 as u8, f.nt as u16);
        let tb_utc = Epoch::from_gregorian_utc_at_midnight(year, 1, 1)
            + (doy - 1) as f64 * Unit::Day
            + (tb_sec - MOSCOW_UTC_OFFSET_SEC) * Unit::Second;

        let eph = Self {
            sv,
            ts_sec,
            tb_sec,
            tk_sec,
            tb_utc,
            pos_km: [f.x as f64 * P2_11, f.y as f64 * P2_11, f.z as f64 * P2_11],
            vel_km_s: [
                f.xd as f64 * P2_20,
                f.yd as f64 * P2_20,
                f.zd as f64 * P2_20,
            ],
            acc_km_s2: [
                f.xdd as f64 * P2_30,
                f.ydd as f64 * P2_30,
                f.zdd as f64 * P2_30,
            ],
            tau_n: f.tau as f64 * P2_30,
            gamma_n: f.gamma as f64 * P2_40,
            delta_tau_n: f.dtau as f64 * P2_30,
            tau_c: f.tau_c as f64 * P2_31,
            tau_gps: f.tau_gps as f64 * P2_30,
            p1: f.p1,
            p2: f.p2,
            p3: f.p3,
            p4: f.p4,
            p: f.p,
            bn: f.bn,
            ln: f.ln != 0 || f.ln5 != 0,
            ft: f.ft,
            en_days: f.en,
            m: f.m,
            nt: f.nt as u16,
            n4: f.n4 as u8,
            na_days: f.na as u16,
            slot: f.slot,
        };

        log::warn!(
            "{}: {} tb={:.0} pos=[{:.3} {:.3} {:.3}]km vel=[{:.5} {:.5} {:.5}]km/s tau_n={:+e} gamma_n={:+e}",
            sv,
            "EPH".green(),
            eph.tb_sec,
            eph.pos_km[0],
            eph.pos_km[1],
            eph.pos_km[2],
            eph.vel_km_s[0],
            eph.vel_km_s[1],
            eph.vel_km_s[2],
            eph.tau_n,
            eph.gamma_n,
        );
        eph
    }

    pub fn healthy(&self) -> bool {
        self.bn & 0b100 == 0 && !self.ln
    }

    /// First-order broadcast clock model: tau_n + gamma_n * (t - tb),
    /// with `t` in seconds of the same day as tb.
    pub fn clock_bias(&self, t_sec: f64) -> f64 {
        self.tau_n + self.gamma_n * wrap_day_offset(t_sec - self.tb_sec)
    }
}

/// Shift a seconds-of-day difference into [-43200, 43200] to survive the
/// midnight rollover.
pub fn wrap_day_offset(mut dt: f64) -> f64 {
    if dt > 43200.0 {
        dt -= 86400.0;
    } else if dt < -43200.0 {
        dt += 86400.0;
    }
    dt
}
