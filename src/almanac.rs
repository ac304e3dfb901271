use gnss_rs::sv::SV;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{P2_5, P2_9, P2_14, P2_15, P2_18, P2_20, SC2RAD},
    fields,
};

/// Coarse orbital elements for one constellation slot, assembled from an
/// even/odd string pair (6,7)...(14,15). Used for acquisition assistance,
/// not for propagating the transmitting satellite's own orbit.
#[derive(Default, Clone, Copy, Debug, Serialize, Deserialize)]
pub struct AlmanacEntry {
    pub slot: u8,          // n_A
    pub healthy: bool,     // C_n
    pub sat_type: u8,      // M_n_A (0 GLONASS, 1 GLONASS-M)
    pub tau_sec: f64,      // coarse clock bias [s]
    pub lambda_rad: f64,   // longitude of first ascending node
    pub delta_i_rad: f64,  // inclination offset from 63 deg
    pub ecc: f64,          // eccentricity
    pub omega_rad: f64,    // argument of perigee
    pub t_lambda_sec: f64, // ascending node passage time [s]
    pub delta_t_sec: f64,  // draconic period offset from nominal [s]
    pub delta_t_dot: f64,  // period drift [s/orbit]
    pub freq_chan: i8,     // carrier frequency number
    pub ln: bool,          // failure flag
}

/// Raw first half of a slot, waiting for its odd partner string.
#[derive(Clone, Copy, Debug)]
struct PendingHalf {
    string_number: u8,
    slot: u8,
    cn: u8,
    mna: u8,
    tau: i32,
    lambda: i32,
    delta_i: i32,
    epsilon: i32,
}

/// Assembles almanac string pairs. A slot completes only when the odd
/// string directly follows its even partner; anything else drops the
/// pending half.
#[derive(Default)]
pub struct AlmanacAccumulator {
    pending: Option<PendingHalf>,
}

impl AlmanacAccumulator {
    pub fn process(&mut self, sv: SV, m: u8, payload: &[u8]) -> Option<AlmanacEntry> {
        debug_assert!((6..=15).contains(&m));
        if m % 2 == 0 {
            self.pending = Some(PendingHalf {
                string_number: m,
                slot: fields::SLOT_N_A.extract(payload) as u8,
                cn: fields::C_N.extract(payload) as u8,
                mna: fields::M_N_A.extract(payload) as u8,
                tau: fields::TAU_N_A.extract(payload),
                lambda: fields::LAMBDA_N_A.extract(payload),
                delta_i: fields::DELTA_I_N_A.extract(payload),
                epsilon: fields::EPSILON_N_A.extract(payload),
            });
            return None;
        }

        let half = self.pending.take()?;
        if m != half.string_number + 1 {
            log::warn!(
                "{sv}: almanac pair broken: string {} after {}",
                m,
                half.string_number
            );
            return None;
        }

        let hna = fields::H_N_A.extract(payload);
        let entry = AlmanacEntry {
            slot: half.slot,
            healthy: half.cn != 0,
            sat_type: half.mna,
            tau_sec: half.tau as f64 * P2_18,
            lambda_rad: half.lambda as f64 * P2_20 * SC2RAD,
            delta_i_rad: half.delta_i as f64 * P2_20 * SC2RAD,
            ecc: half.epsilon as f64 * P2_20,
            omega_rad: fields::OMEGA_N_A.extract(payload) as f64 * P2_15 * SC2RAD,
            t_lambda_sec: fields::T_LAMBDA_N_A.extract(payload) as f64 * P2_5,
            delta_t_sec: fields::DELTA_T_N_A.extract(payload) as f64 * P2_9,
            delta_t_dot: fields::DELTA_T_DOT_N_A.extract(payload) as f64 * P2_14,
            freq_chan: frequency_number(hna as u8),
            ln: fields::L_N_ODD.extract(payload) != 0,
        };

        log::info!(
            "{sv}: almanac slot {} chan {} healthy={} lambda={:.4} ecc={:.5}",
            entry.slot,
            entry.freq_chan,
            entry.healthy,
            entry.lambda_rad,
            entry.ecc,
        );
        Some(entry)
    }
}

/// H_n_A is a 5-bit code: 0..=24 map to channels 0..=24, 25..=31 encode
/// the negative channels -7..=-1.
fn frequency_number(hna: u8) -> i8 {
    if hna >= 25 { hna as i8 - 32 } else { hna as i8 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gnss_rs::constellation::Constellation;

    fn sv() -> SV {
        SV::new(Constellation::Glonass, 9)
    }

    fn even(slot: u8) -> [u8; 11] {
        let mut p = [0u8; 11];
        fields::STRING_ID.encode(&mut p, 6);
        fields::C_N.encode(&mut p, 1);
        fields::SLOT_N_A.encode(&mut p, slot as i32);
        fields::TAU_N_A.encode(&mut p, -96);
        fields::LAMBDA_N_A.encode(&mut p, 1 << 19);
        fields::EPSILON_N_A.encode(&mut p, 1024);
        p
    }

    fn odd(hna: i32) -> [u8; 11] {
        let mut p = [0u8; 11];
        fields::STRING_ID.encode(&mut p, 7);
        fields::OMEGA_N_A.encode(&mut p, -(1 << 14));
        fields::T_LAMBDA_N_A.encode(&mut p, 27000 * 32);
        fields::H_N_A.encode(&mut p, hna);
        p
    }

    #[test]
    fn test_pair_completes_slot() {
        let mut acc = AlmanacAccumulator::default();
        assert!(acc.process(sv(), 6, &even(5)).is_none());
        let entry = acc.process(sv(), 7, &odd(2)).unwrap();

        assert_eq!(entry.slot, 5);
        assert!(entry.healthy);
        assert_eq!(entry.tau_sec, -96.0 * P2_18);
        assert_eq!(entry.lambda_rad, (1 << 19) as f64 * P2_20 * SC2RAD);
        assert_eq!(entry.ecc, 1024.0 * P2_20);
        assert_eq!(entry.omega_rad, -((1 << 14) as f64) * P2_15 * SC2RAD);
        assert_eq!(entry.t_lambda_sec, 27000.0);
        assert_eq!(entry.freq_chan, 2);
    }

    #[test]
    fn test_odd_without_even_is_dropped() {
        let mut acc = AlmanacAccumulator::default();
        assert!(acc.process(sv(), 7, &odd(0)).is_none());
    }

    #[test]
    fn test_mismatched_pair_is_dropped() {
        let mut acc = AlmanacAccumulator::default();
        let mut p = even(3);
        fields::STRING_ID.encode(&mut p, 8);
        assert!(acc.process(sv(), 8, &p).is_none());
        // string 11 does not follow string 8
        assert!(acc.process(sv(), 11, &odd(0)).is_none());
    }

    #[test]
    fn test_frequency_number_mapping() {
        assert_eq!(frequency_number(0), 0);
        assert_eq!(frequency_number(6), 6);
        assert_eq!(frequency_number(24), 24);
        assert_eq!(frequency_number(25), -7);
        assert_eq!(frequency_number(31), -1);
    }
}
