use std::collections::HashMap;
use std::sync::Arc;

use gnss_rs::sv::SV;

use crate::{
    almanac::AlmanacEntry,
    ephemeris::Ephemeris,
    frame::{Assembler, GnavUpdate, RawString},
    orbit::{self, SatelliteState},
};

/// Front end over the per-satellite assemblers.
///
/// Strings for one satellite arrive in order from a single producer;
/// different satellites are independent. Completed ephemerides are
/// published as `Arc` records, so replacing the current one is a single
/// reference swap and readers holding clones are never invalidated.
#[derive(Default)]
pub struct GnavDecoder {
    assemblers: HashMap<SV, Assembler>,
    ephemerides: HashMap<SV, Arc<Ephemeris>>,
    almanac: HashMap<u8, AlmanacEntry>,
}

impl GnavDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one received string. Returns the new ephemeris when this
    /// string completed a frame for its satellite.
    pub fn process_string(&mut self, raw: &RawString) -> Option<Arc<Ephemeris>> {
        let asm = self
            .assemblers
            .entry(raw.sv)
            .or_insert_with(|| Assembler::new(raw.sv));

        match asm.process(raw)? {
            GnavUpdate::Frame(frame) => {
                let eph = Arc::new(Ephemeris::from_frame(raw.sv, &frame, raw.ts_sec));
                self.ephemerides.insert(raw.sv, eph.clone());
                Some(eph)
            }
            GnavUpdate::Almanac(entry) => {
                self.almanac.insert(entry.slot, entry);
                None
            }
        }
    }

    /// Current ephemeris for a satellite, if a frame has completed.
    pub fn ephemeris(&self, sv: SV) -> Option<Arc<Ephemeris>> {
        self.ephemerides.get(&sv).cloned()
    }

    /// Propagate a satellite's current ephemeris to `t_sec` (seconds
    /// within the day, Moscow time).
    pub fn propagate(&self, sv: SV, t_sec: f64) -> Option<SatelliteState> {
        self.ephemerides
            .get(&sv)
            .map(|eph| orbit::propagate(eph, t_sec))
    }

    /// Almanac entry for a constellation slot, for acquisition assistance.
    pub fn almanac(&self, slot: u8) -> Option<&AlmanacEntry> {
        self.almanac.get(&slot)
    }

    pub fn almanac_entries(&self) -> impl Iterator<Item = &AlmanacEntry> {
        self.almanac.values()
    }

    /// Drop a satellite's decode state when it leaves tracking. Its
    /// published ephemeris stays valid for readers already holding it.
    pub fn drop_satellite(&mut self, sv: SV) {
        self.assemblers.remove(&sv);
        self.ephemerides.remove(&sv);
    }
}
