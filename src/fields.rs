//! GNAV string field layout, ICD ed. 5.1 (L1 C/A).
//!
//! One descriptor per named parameter, grouped by string number. Bit
//! positions are 1-based from the first (idle) bit of the 85-bit string,
//! MSB first. GLONASS encodes most physical quantities sign-magnitude,
//! not two's-complement; the encoding is recorded per field.

use crate::bits::{getbitg, getbitu, setbitg, setbitu};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Encoding {
    Unsigned,
    SignMagnitude,
}

#[derive(Clone, Copy, Debug)]
pub struct Field {
    pub name: &'static str,
    pub pos: usize,
    pub len: usize,
    pub enc: Encoding,
}

impl Field {
    const fn unsigned(name: &'static str, pos: usize, len: usize) -> Self {
        Self {
            name,
            pos,
            len,
            enc: Encoding::Unsigned,
        }
    }

    const fn sign_mag(name: &'static str, pos: usize, len: usize) -> Self {
        Self {
            name,
            pos,
            len,
            enc: Encoding::SignMagnitude,
        }
    }

    /// Extract this field from an 85-bit packed payload. Panics if the
    /// descriptor falls outside the payload: the tables below are fixed at
    /// build time, so that is a programming error, never a data fault.
    pub fn extract(&self, payload: &[u8]) -> i32 {
        match self.enc {
            Encoding::Unsigned => getbitu(payload, self.pos - 1, self.len) as i32,
            Encoding::SignMagnitude => getbitg(payload, self.pos - 1, self.len),
        }
    }

    /// Encode `val` into `payload` at this field's position. Used by tests
    /// and string simulators; inverse of [`Field::extract`].
    pub fn encode(&self, payload: &mut [u8], val: i32) {
        match self.enc {
            Encoding::Unsigned => setbitu(payload, self.pos - 1, self.len, val as u32),
            Encoding::SignMagnitude => setbitg(payload, self.pos - 1, self.len, val),
        }
    }
}

// Common to every string
pub const STRING_ID: Field = Field::unsigned("m", 2, 4);
pub const KX: Field = Field::unsigned("KX", 78, 8);

// String 1
pub const P1: Field = Field::unsigned("P1", 8, 2);
pub const T_K: Field = Field::unsigned("t_k", 10, 12);
pub const X_N_DOT: Field = Field::sign_mag("x_n_dot", 22, 24);
pub const X_N_DOT_DOT: Field = Field::sign_mag("x_n_dot_dot", 46, 5);
pub const X_N: Field = Field::sign_mag("x_n", 51, 27);

// String 2
pub const B_N: Field = Field::unsigned("B_n", 6, 3);
pub const P2: Field = Field::unsigned("P2", 9, 1);
pub const T_B: Field = Field::unsigned("t_b", 10, 7);
pub const Y_N_DOT: Field = Field::sign_mag("y_n_dot", 22, 24);
pub const Y_N_DOT_DOT: Field = Field::sign_mag("y_n_dot_dot", 46, 5);
pub const Y_N: Field = Field::sign_mag("y_n", 51, 27);

// String 3
pub const P3: Field = Field::unsigned("P3", 6, 1);
pub const GAMMA_N: Field = Field::sign_mag("gamma_n", 7, 11);
pub const P: Field = Field::unsigned("P", 19, 2);
pub const L_N: Field = Field::unsigned("l_n", 21, 1);
pub const Z_N_DOT: Field = Field::sign_mag("z_n_dot", 22, 24);
pub const Z_N_DOT_DOT: Field = Field::sign_mag("z_n_dot_dot", 46, 5);
pub const Z_N: Field = Field::sign_mag("z_n", 51, 27);

// String 4
pub const TAU_N: Field = Field::sign_mag("tau_n", 6, 22);
pub const DELTA_TAU_N: Field = Field::sign_mag("delta_tau_n", 28, 5);
pub const E_N: Field = Field::unsigned("E_n", 33, 5);
pub const P4: Field = Field::unsigned("P4", 52, 1);
pub const F_T: Field = Field::unsigned("F_T", 53, 4);
pub const N_T: Field = Field::unsigned("N_T", 60, 11);
pub const N: Field = Field::unsigned("n", 71, 5);
pub const M: Field = Field::unsigned("M", 76, 2);

// String 5
pub const N_A: Field = Field::unsigned("N_A", 6, 11);
pub const TAU_C: Field = Field::sign_mag("tau_c", 17, 32);
pub const N_4: Field = Field::unsigned("N_4", 50, 5);
pub const TAU_GPS: Field = Field::sign_mag("tau_gps", 55, 22);
pub const L_N_5: Field = Field::unsigned("l_n", 77, 1);

// Strings 6, 8, 10, 12, 14 (first half of an almanac slot)
pub const C_N: Field = Field::unsigned("C_n", 6, 1);
pub const M_N_A: Field = Field::unsigned("M_n_A", 7, 2);
pub const SLOT_N_A: Field = Field::unsigned("n_A", 9, 5);
pub const TAU_N_A: Field = Field::sign_mag("tau_n_A", 14, 10);
pub const LAMBDA_N_A: Field = Field::sign_mag("lambda_n_A", 24, 21);
pub const DELTA_I_N_A: Field = Field::sign_mag("delta_i_n_A", 45, 18);
pub const EPSILON_N_A: Field = Field::unsigned("epsilon_n_A", 63, 15);

// Strings 7, 9, 11, 13, 15 (second half of an almanac slot)
pub const OMEGA_N_A: Field = Field::sign_mag("omega_n_A", 6, 16);
pub const T_LAMBDA_N_A: Field = Field::unsigned("t_lambda_n_A", 22, 21);
pub const DELTA_T_N_A: Field = Field::sign_mag("delta_T_n_A", 43, 22);
pub const DELTA_T_DOT_N_A: Field = Field::sign_mag("delta_T_dot_n_A", 65, 7);
pub const H_N_A: Field = Field::unsigned("H_n_A", 72, 5);
pub const L_N_ODD: Field = Field::unsigned("l_n", 77, 1);

pub static STRING_1: &[Field] = &[P1, T_K, X_N_DOT, X_N_DOT_DOT, X_N, KX];
pub static STRING_2: &[Field] = &[B_N, P2, T_B, Y_N_DOT, Y_N_DOT_DOT, Y_N, KX];
pub static STRING_3: &[Field] = &[P3, GAMMA_N, P, L_N, Z_N_DOT, Z_N_DOT_DOT, Z_N, KX];
pub static STRING_4: &[Field] = &[TAU_N, DELTA_TAU_N, E_N, P4, F_T, N_T, N, M, KX];
pub static STRING_5: &[Field] = &[N_A, TAU_C, N_4, TAU_GPS, L_N_5, KX];
pub static STRING_ALMANAC_EVEN: &[Field] = &[
    C_N,
    M_N_A,
    SLOT_N_A,
    TAU_N_A,
    LAMBDA_N_A,
    DELTA_I_N_A,
    EPSILON_N_A,
    KX,
];
pub static STRING_ALMANAC_ODD: &[Field] = &[
    OMEGA_N_A,
    T_LAMBDA_N_A,
    DELTA_T_N_A,
    DELTA_T_DOT_N_A,
    H_N_A,
    L_N_ODD,
    KX,
];

/// Descriptors for a given string number (1..=15). Strings 6-15 alternate
/// between the two almanac half-slot layouts.
pub fn string_fields(m: u8) -> &'static [Field] {
    match m {
        1 => STRING_1,
        2 => STRING_2,
        3 => STRING_3,
        4 => STRING_4,
        5 => STRING_5,
        6..=15 if m % 2 == 0 => STRING_ALMANAC_EVEN,
        7..=15 => STRING_ALMANAC_ODD,
        _ => panic!("invalid string number {m}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // encode -> extract reproduces the value for every field of every
    // string, at both extremes of the field's range.
    #[test]
    fn test_field_round_trip_all_strings() {
        for m in 1..=15u8 {
            for field in string_fields(m) {
                let mut payload = [0u8; 11];

                let max = match field.enc {
                    Encoding::Unsigned => (1i64 << field.len) - 1,
                    Encoding::SignMagnitude => (1i64 << (field.len - 1)) - 1,
                } as i32;
                let min = match field.enc {
                    Encoding::Unsigned => 0,
                    Encoding::SignMagnitude => -max,
                };

                for val in [min, max, max / 3] {
                    field.encode(&mut payload, val);
                    assert_eq!(
                        field.extract(&payload),
                        val,
                        "string {m} field {}",
                        field.name
                    );
                }
            }
        }
    }

    #[test]
    fn test_fields_fit_payload() {
        for m in 1..=15u8 {
            for field in string_fields(m) {
                assert!(field.pos >= 1 && field.pos + field.len <= 86, "{}", field.name);
            }
        }
    }

    #[test]
    fn test_neighbor_fields_do_not_overlap() {
        let mut payload = [0u8; 11];
        X_N.encode(&mut payload, -(1 << 26) + 1);
        X_N_DOT.encode(&mut payload, 0);
        X_N_DOT_DOT.encode(&mut payload, 0);
        assert_eq!(X_N.extract(&payload), -(1 << 26) + 1);
        assert_eq!(X_N_DOT.extract(&payload), 0);
    }
}
