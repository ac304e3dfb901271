//! GNAV string and frame assembly.
//!
//! Each satellite broadcasts 15 strings per frame; strings 1-5 carry the
//! transmitting satellite's ephemeris and clock, strings 6-15 carry almanac
//! half-slots for the rest of the constellation. The assembler owns the
//! per-satellite accumulation state and never emits a partial frame:
//! anything out of sequence throws the window away and waits for the next
//! string 1.

use colored::Colorize;
use gnss_rs::sv::SV;

use crate::{
    GnavError,
    almanac::{AlmanacAccumulator, AlmanacEntry},
    bits::{hex_str, pack_bits},
    constants::{GNAV_STRING_BITS, GNAV_STRING_DATA_BITS, GNAV_TIME_MARK},
    fields,
};

/// One received string: 85 data bits packed MSB-first, tagged with the
/// satellite it came from and the receiver time of the string boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct RawString {
    pub sv: SV,
    pub ts_sec: f64,
    pub string_number: u8,
    pub payload: [u8; 11],
}

impl RawString {
    /// Parse a frame-aligned string: the 30-bit time mark followed by the
    /// 85 data bits, one symbol per slice element.
    pub fn parse(sv: SV, ts_sec: f64, symbols: &[u8]) -> Result<Self, GnavError> {
        if symbols.len() != GNAV_STRING_BITS {
            return Err(GnavError::InvalidLength(symbols.len()));
        }
        for (i, &tm) in GNAV_TIME_MARK.iter().enumerate() {
            if symbols[i] & 1 != tm {
                return Err(GnavError::TimeMark);
            }
        }
        Self::from_data_bits(sv, ts_sec, &symbols[GNAV_TIME_MARK.len()..])
    }

    /// Build from the 85 data bits alone, for callers that strip the time
    /// mark upstream.
    pub fn from_data_bits(sv: SV, ts_sec: f64, bits: &[u8]) -> Result<Self, GnavError> {
        if bits.len() != GNAV_STRING_DATA_BITS {
            return Err(GnavError::InvalidLength(bits.len()));
        }
        let mut payload = [0u8; 11];
        pack_bits(bits, &mut payload);

        let string_number = fields::STRING_ID.extract(&payload) as u8;
        if string_number == 0 || string_number > 15 {
            return Err(GnavError::InvalidStringNumber(string_number));
        }
        log::debug!(
            "{sv}: string {string_number} -- {}",
            hex_str(&payload, GNAV_STRING_DATA_BITS)
        );
        Ok(Self {
            sv,
            ts_sec,
            string_number,
            payload,
        })
    }
}

/// Raw (unscaled) field values of one ephemeris frame, strings 1-5.
/// Each field belongs to exactly one string, so nothing is ever
/// overwritten within a frame.
#[derive(Default, Clone, Copy, Debug)]
pub struct FrameFields {
    pub got: u8, // bitmap of received strings, bit m-1

    // string 1
    pub p1: u8,
    pub tk: u32, // h(5)/min(6)/30s(1) subfields, still packed
    pub xd: i32,
    pub xdd: i32,
    pub x: i32,

    // string 2
    pub bn: u8,
    pub p2: u8,
    pub tb: u32,
    pub yd: i32,
    pub ydd: i32,
    pub y: i32,

    // string 3
    pub p3: u8,
    pub gamma: i32,
    pub p: u8,
    pub ln: u8,
    pub zd: i32,
    pub zdd: i32,
    pub z: i32,

    // string 4
    pub tau: i32,
    pub dtau: i32,
    pub en: u8,
    pub p4: u8,
    pub ft: u8,
    pub nt: u32,
    pub slot: u8,
    pub m: u8,

    // string 5
    pub na: u32,
    pub tau_c: i32,
    pub n4: u32,
    pub tau_gps: i32,
    pub ln5: u8,
}

impl FrameFields {
    pub fn complete(&self) -> bool {
        self.got == 0b11111
    }
}

/// Output of [`Assembler::process`].
#[derive(Clone, Copy, Debug)]
pub enum GnavUpdate {
    Frame(FrameFields),
    Almanac(AlmanacEntry),
}

/// Per-satellite string assembler. `expect == 1` doubles as the idle
/// state: the next accepted string starts a fresh frame.
pub struct Assembler {
    sv: SV,
    frame: FrameFields,
    expect: u8,
    last_nt: Option<u32>,
    last_n4: Option<u32>,
    alm: AlmanacAccumulator,
}

impl Assembler {
    pub fn new(sv: SV) -> Self {
        Self {
            sv,
            frame: FrameFields::default(),
            expect: 1,
            last_nt: None,
            last_n4: None,
            alm: AlmanacAccumulator::default(),
        }
    }

    pub fn process(&mut self, raw: &RawString) -> Option<GnavUpdate> {
        debug_assert_eq!(raw.sv, self.sv);
        let m = raw.string_number;
        match m {
            1..=5 => self.process_ephemeris_string(m, &raw.payload),
            // almanac half-slots complete independently of the frame state
            _ => self
                .alm
                .process(self.sv, m, &raw.payload)
                .map(GnavUpdate::Almanac),
        }
    }

    fn process_ephemeris_string(&mut self, m: u8, payload: &[u8]) -> Option<GnavUpdate> {
        if m != self.expect {
            if self.expect != 1 {
                log::warn!(
                    "{}: {}: expected string {} got {}",
                    self.sv,
                    "RESYNC".red(),
                    self.expect,
                    m
                );
                self.frame = FrameFields::default();
                self.expect = 1;
            }
            if m != 1 {
                log::debug!("{}: idle, dropping string {}", self.sv, m);
                return None;
            }
        }

        self.store_string(m, payload);
        self.frame.got |= 1 << (m - 1);

        if m < 5 {
            self.expect = m + 1;
            return None;
        }

        self.expect = 1;
        let frame = std::mem::take(&mut self.frame);
        debug_assert!(frame.complete());

        // N_T counts 1..=1461 within the four-year cycle and N_4 starts
        // at 1; anything else is garbage over the air and the frame is
        // discarded without touching the stored counters.
        if frame.nt == 0 || frame.nt > 1461 || frame.n4 == 0 {
            log::warn!(
                "{}: {}: N_T={} N_4={}, frame dropped",
                self.sv,
                "BAD CALENDAR".red(),
                frame.nt,
                frame.n4
            );
            return None;
        }

        // N_T/N_4 discontinuity against the previous frame invalidates
        // this window; accumulation restarts with the new counters.
        let counters_jumped = self.last_nt.is_some_and(|nt| nt != frame.nt)
            || self.last_n4.is_some_and(|n4| n4 != frame.n4);
        self.last_nt = Some(frame.nt);
        self.last_n4 = Some(frame.n4);
        if counters_jumped {
            log::warn!(
                "{}: {}: N_T={} N_4={}, frame dropped",
                self.sv,
                "COUNTER JUMP".red(),
                frame.nt,
                frame.n4
            );
            return None;
        }

        Some(GnavUpdate::Frame(frame))
    }

    fn store_string(&mut self, m: u8, payload: &[u8]) {
        let f = &mut self.frame;
        match m {
            1 => {
                f.p1 = fields::P1.extract(payload) as u8;
                f.tk = fields::T_K.extract(payload) as u32;
                f.xd = fields::X_N_DOT.extract(payload);
                f.xdd = fields::X_N_DOT_DOT.extract(payload);
                f.x = fields::X_N.extract(payload);
            }
            2 => {
                f.bn = fields::B_N.extract(payload) as u8;
                f.p2 = fields::P2.extract(payload) as u8;
                f.tb = fields::T_B.extract(payload) as u32;
                f.yd = fields::Y_N_DOT.extract(payload);
                f.ydd = fields::Y_N_DOT_DOT.extract(payload);
                f.y = fields::Y_N.extract(payload);
            }
            3 => {
                f.p3 = fields::P3.extract(payload) as u8;
                f.gamma = fields::GAMMA_N.extract(payload);
                f.p = fields::P.extract(payload) as u8;
                f.ln = fields::L_N.extract(payload) as u8;
                f.zd = fields::Z_N_DOT.extract(payload);
                f.zdd = fields::Z_N_DOT_DOT.extract(payload);
                f.z = fields::Z_N.extract(payload);
            }
            4 => {
                f.tau = fields::TAU_N.extract(payload);
                f.dtau = fields::DELTA_TAU_N.extract(payload);
                f.en = fields::E_N.extract(payload) as u8;
                f.p4 = fields::P4.extract(payload) as u8;
                f.ft = fields::F_T.extract(payload) as u8;
                f.nt = fields::N_T.extract(payload) as u32;
                f.slot = fields::N.extract(payload) as u8;
                f.m = fields::M.extract(payload) as u8;
            }
            5 => {
                f.na = fields::N_A.extract(payload) as u32;
                f.tau_c = fields::TAU_C.extract(payload);
                f.n4 = fields::N_4.extract(payload) as u32;
                f.tau_gps = fields::TAU_GPS.extract(payload);
                f.ln5 = fields::L_N_5.extract(payload) as u8;
            }
            _ => unreachable!("string number validated at parse"),
        }
    }
}
