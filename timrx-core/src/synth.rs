//! Si57x clock synthesizer register math.
//!
//! The output frequency of the synthesizer is
//!
//! ```text
//! f_out = f_xtal * RFREQ / (HS_DIV * N1)
//! ```
//!
//! where `RFREQ` is a 38-bit fixed-point number with 28 fractional bits and the
//! internal oscillator `f_dco = f_out * HS_DIV * N1` must stay within
//! 4.85 GHz to 5.67 GHz.
//!
//! The registers exposed by the timing receiver gateware split `RFREQ` into a
//! 20-bit low word and the remaining high bits, store `N1` with an offset of one
//! and store `HS_DIV` as its chip code.
use crate::error::Error;

/// Nominal crystal frequency of the Si57x
pub const FXTAL_HZ: f64 = 114_285_000.0;
/// Lowest valid internal oscillator frequency
pub const FDCO_MIN_HZ: f64 = 4_850_000_000.0;
/// Highest valid internal oscillator frequency
pub const FDCO_MAX_HZ: f64 = 5_670_000_000.0;

const RFREQ_FRACTIONAL_BITS: i32 = 28;
const RFREQ_LO_BITS: u32 = 20;
const RFREQ_LO_MASK: u64 = (1 << RFREQ_LO_BITS) - 1;

const N1_MIN: u32 = 2;
const N1_MAX: u32 = 128;
const N1_STEP: usize = 2;

/// One entry of the high-speed divider table.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct HsDiv {
    /// The division ratio
    pub divider: u32,
    /// The register code selecting this ratio
    pub code: u32,
}

/// High-speed dividers in search order.
pub const HS_DIV_TABLE: [HsDiv; 6] = [
    HsDiv { divider: 11, code: 7 },
    HsDiv { divider: 9, code: 5 },
    HsDiv { divider: 7, code: 3 },
    HsDiv { divider: 6, code: 2 },
    HsDiv { divider: 5, code: 1 },
    HsDiv { divider: 4, code: 0 },
];

/// Register contents of the synthesizer.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct SynthesizerSetting {
    /// Output divider minus one
    pub n1: u32,
    /// HS_DIV register code
    pub hs_div: u32,
    /// Lower 20 bits of RFREQ
    pub rfreq_lo: u32,
    /// Upper bits of RFREQ
    pub rfreq_hi: u32,
}

impl SynthesizerSetting {
    /// The complete RFREQ fixed-point value
    pub fn rfreq(&self) -> u64 {
        ((self.rfreq_hi as u64) << RFREQ_LO_BITS) | (self.rfreq_lo as u64 & RFREQ_LO_MASK)
    }

    /// The output divider N1
    pub fn n1_divider(&self) -> u64 {
        self.n1 as u64 + 1
    }

    /// The HS_DIV table entry of the stored code, if it is valid
    pub fn hs_div_entry(&self) -> Option<HsDiv> {
        HS_DIV_TABLE
            .iter()
            .copied()
            .find(|entry| entry.code == self.hs_div)
    }
}

/// A Si57x synthesizer with a given crystal frequency.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Si57x {
    fxtal: f64,
}

impl Default for Si57x {
    fn default() -> Self {
        Self { fxtal: FXTAL_HZ }
    }
}

impl Si57x {
    /// Use a calibrated crystal frequency instead of the nominal one.
    ///
    /// Fails with [`Error::InvalidCrystal`] unless `fxtal` is finite and positive.
    pub fn with_fxtal(fxtal: f64) -> Result<Si57x, Error> {
        if !fxtal.is_finite() || fxtal <= 0.0 {
            return Err(Error::InvalidCrystal(fxtal));
        }
        Ok(Si57x { fxtal })
    }

    pub fn fxtal(&self) -> f64 {
        self.fxtal
    }

    /// Compute the register contents that produce `frequency` (in Hz).
    ///
    /// The dividers are searched in [`HS_DIV_TABLE`] order and, for each, with
    /// ascending even N1 from 2 to 128. The first pair that places the internal
    /// oscillator in range is taken, which need not be the pair with the lowest
    /// oscillator frequency.
    pub fn compute_settings(&self, frequency: f64) -> Result<SynthesizerSetting, Error> {
        if !frequency.is_finite() || frequency <= 0.0 {
            return Err(Error::FrequencyOutOfRange(frequency));
        }

        let (hs_div, n1, fdco) = HS_DIV_TABLE
            .iter()
            .flat_map(|hs_div| {
                (N1_MIN..=N1_MAX)
                    .step_by(N1_STEP)
                    .map(move |n1| (*hs_div, n1))
            })
            .map(|(hs_div, n1)| (hs_div, n1, frequency * hs_div.divider as f64 * n1 as f64))
            .find(|(_, _, fdco)| (FDCO_MIN_HZ..=FDCO_MAX_HZ).contains(fdco))
            .ok_or(Error::FrequencyOutOfRange(frequency))?;

        // The oscillator is in range, so only the crystal can push RFREQ past 32 + 20 bits
        let rfreq = ((fdco / self.fxtal) * rfreq_scale()).round() as u64;
        let rfreq_hi =
            u32::try_from(rfreq >> RFREQ_LO_BITS).map_err(|_| Error::InvalidCrystal(self.fxtal))?;

        let setting = SynthesizerSetting {
            n1: n1 - 1,
            hs_div: hs_div.code,
            rfreq_lo: (rfreq & RFREQ_LO_MASK) as u32,
            rfreq_hi,
        };
        log::debug!(
            "Synthesizer setting for {} Hz: HS_DIV={}, N1={}, f_dco={} Hz, {:?}",
            frequency,
            hs_div.divider,
            n1,
            fdco,
            setting
        );
        Ok(setting)
    }

    /// Compute the output frequency (in Hz) encoded by `setting`.
    pub fn compute_frequency(&self, setting: &SynthesizerSetting) -> Result<f64, Error> {
        let hs_div = setting
            .hs_div_entry()
            .ok_or(Error::InvalidHsDiv(setting.hs_div))?;
        let fdco = setting.rfreq() as f64 / rfreq_scale() * self.fxtal;
        Ok(fdco / (setting.n1_divider() as f64 * hs_div.divider as f64))
    }

    /// Output frequency step of one RFREQ LSB for the dividers in `setting`.
    pub fn resolution(&self, setting: &SynthesizerSetting) -> Result<f64, Error> {
        let hs_div = setting
            .hs_div_entry()
            .ok_or(Error::InvalidHsDiv(setting.hs_div))?;
        Ok(self.fxtal / rfreq_scale() / (setting.n1_divider() as f64 * hs_div.divider as f64))
    }
}

fn rfreq_scale() -> f64 {
    2f64.powi(RFREQ_FRACTIONAL_BITS)
}
