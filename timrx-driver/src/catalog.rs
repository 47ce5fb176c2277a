//! Parameters of a timing receiver.
//!
//! Each logical register function is one [`Param`]. Per-channel registers of the
//! AMC and FMC trigger banks are a single parameter addressed by channel.
use strum::IntoEnumIterator;
use timrx_core::{ParameterId, ValueKind, registry::CallShape};

use crate::procedures::*;

/// A timing receiver parameter.
///
/// The string form is the name under which the host exposes the parameter.
///
/// ```
/// use std::str::FromStr;
/// use timrx_driver::catalog::Param;
///
/// let param = Param::from_str("TIM_RX_AMC_EN").unwrap();
/// assert_eq!(param, Param::AmcEn);
/// assert_eq!(param.name(), "TIM_RX_AMC_EN");
/// ```
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Hash,
    strum::EnumString,
    strum::Display,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
#[repr(u32)]
pub enum Param {
    #[strum(serialize = "TIM_RX_LINK_STATUS")]
    LinkStatus,
    #[strum(serialize = "TIM_RX_RX_EN_STATUS")]
    RxEnStatus,
    #[strum(serialize = "TIM_RX_REF_CLK_LOCKED")]
    RefClkLocked,
    #[strum(serialize = "TIM_RX_EVT_CODE")]
    EvtCode,
    #[strum(serialize = "TIM_RX_EVT_DELAY")]
    EvtDelay,
    #[strum(serialize = "TIM_RX_EVT_WIDTH")]
    EvtWidth,
    #[strum(serialize = "TIM_RX_AMC_EN")]
    AmcEn,
    #[strum(serialize = "TIM_RX_AMC_POL")]
    AmcPol,
    #[strum(serialize = "TIM_RX_AMC_LOG")]
    AmcLog,
    #[strum(serialize = "TIM_RX_AMC_ITL")]
    AmcItl,
    #[strum(serialize = "TIM_RX_AMC_SRC")]
    AmcSrc,
    #[strum(serialize = "TIM_RX_AMC_PULSES")]
    AmcPulses,
    #[strum(serialize = "TIM_RX_AMC_EVT")]
    AmcEvt,
    #[strum(serialize = "TIM_RX_AMC_DLY")]
    AmcDly,
    #[strum(serialize = "TIM_RX_AMC_WDT")]
    AmcWdt,
    #[strum(serialize = "TIM_RX_FMC1_EN")]
    Fmc1En,
    #[strum(serialize = "TIM_RX_FMC1_POL")]
    Fmc1Pol,
    #[strum(serialize = "TIM_RX_FMC1_LOG")]
    Fmc1Log,
    #[strum(serialize = "TIM_RX_FMC1_ITL")]
    Fmc1Itl,
    #[strum(serialize = "TIM_RX_FMC1_SRC")]
    Fmc1Src,
    #[strum(serialize = "TIM_RX_FMC1_PULSES")]
    Fmc1Pulses,
    #[strum(serialize = "TIM_RX_FMC1_EVT")]
    Fmc1Evt,
    #[strum(serialize = "TIM_RX_FMC1_DLY")]
    Fmc1Dly,
    #[strum(serialize = "TIM_RX_FMC1_WDT")]
    Fmc1Wdt,
    #[strum(serialize = "TIM_RX_FMC2_EN")]
    Fmc2En,
    #[strum(serialize = "TIM_RX_FMC2_POL")]
    Fmc2Pol,
    #[strum(serialize = "TIM_RX_FMC2_LOG")]
    Fmc2Log,
    #[strum(serialize = "TIM_RX_FMC2_ITL")]
    Fmc2Itl,
    #[strum(serialize = "TIM_RX_FMC2_SRC")]
    Fmc2Src,
    #[strum(serialize = "TIM_RX_FMC2_PULSES")]
    Fmc2Pulses,
    #[strum(serialize = "TIM_RX_FMC2_EVT")]
    Fmc2Evt,
    #[strum(serialize = "TIM_RX_FMC2_DLY")]
    Fmc2Dly,
    #[strum(serialize = "TIM_RX_FMC2_WDT")]
    Fmc2Wdt,
    #[strum(serialize = "TIM_RX_RTM_FREQ_KP")]
    RtmFreqKp,
    #[strum(serialize = "TIM_RX_RTM_FREQ_KI")]
    RtmFreqKi,
    #[strum(serialize = "TIM_RX_RTM_PHASE_KP")]
    RtmPhaseKp,
    #[strum(serialize = "TIM_RX_RTM_PHASE_KI")]
    RtmPhaseKi,
    #[strum(serialize = "TIM_RX_RTM_PHASE_SET")]
    RtmPhaseSet,
    #[strum(serialize = "TIM_RX_RTM_PHASE_NAVG")]
    RtmPhaseNavg,
    #[strum(serialize = "TIM_RX_RTM_PHASE_DIV_EXP")]
    RtmPhaseDivExp,
    #[strum(serialize = "TIM_RX_RTM_RFREQ_HI")]
    RtmRfreqHi,
    #[strum(serialize = "TIM_RX_RTM_RFREQ_LO")]
    RtmRfreqLo,
    #[strum(serialize = "TIM_RX_RTM_N1")]
    RtmN1,
    #[strum(serialize = "TIM_RX_RTM_HS_DIV")]
    RtmHsDiv,
    #[strum(serialize = "TIM_RX_RTM_FREQ")]
    RtmFreq,
    #[strum(serialize = "TIM_RX_AFC_FREQ_KP")]
    AfcFreqKp,
    #[strum(serialize = "TIM_RX_AFC_FREQ_KI")]
    AfcFreqKi,
    #[strum(serialize = "TIM_RX_AFC_PHASE_KP")]
    AfcPhaseKp,
    #[strum(serialize = "TIM_RX_AFC_PHASE_KI")]
    AfcPhaseKi,
    #[strum(serialize = "TIM_RX_AFC_PHASE_SET")]
    AfcPhaseSet,
    #[strum(serialize = "TIM_RX_AFC_PHASE_NAVG")]
    AfcPhaseNavg,
    #[strum(serialize = "TIM_RX_AFC_PHASE_DIV_EXP")]
    AfcPhaseDivExp,
    #[strum(serialize = "TIM_RX_AFC_RFREQ_HI")]
    AfcRfreqHi,
    #[strum(serialize = "TIM_RX_AFC_RFREQ_LO")]
    AfcRfreqLo,
    #[strum(serialize = "TIM_RX_AFC_N1")]
    AfcN1,
    #[strum(serialize = "TIM_RX_AFC_HS_DIV")]
    AfcHsDiv,
    #[strum(serialize = "TIM_RX_AFC_FREQ")]
    AfcFreq,
}

impl Param {
    pub fn id(self) -> ParameterId {
        ParameterId::new(self as u32)
    }

    pub fn from_id(id: ParameterId) -> Option<Param> {
        Param::iter().find(|param| param.id() == id)
    }

    /// The name under which the host exposes the parameter
    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn kind(self) -> ValueKind {
        match self {
            Param::RtmFreq | Param::AfcFreq => ValueKind::Float64,
            _ => ValueKind::UInt32,
        }
    }

    /// The remote procedures behind this parameter.
    /// `None` for parameters that only live in the driver.
    pub fn binding(self) -> Option<CallShape> {
        let shape = match self {
            Param::LinkStatus => link_status::SHAPE,
            Param::RxEnStatus => rxen_status::SHAPE,
            Param::RefClkLocked => ref_clk_locked::SHAPE,
            Param::EvtCode | Param::EvtDelay | Param::EvtWidth => return None,
            Param::AmcEn => amc_en::SHAPE,
            Param::AmcPol => amc_pol::SHAPE,
            Param::AmcLog => amc_log::SHAPE,
            Param::AmcItl => amc_itl::SHAPE,
            Param::AmcSrc => amc_src::SHAPE,
            Param::AmcPulses => amc_pulses::SHAPE,
            Param::AmcEvt => amc_evt::SHAPE,
            Param::AmcDly => amc_dly::SHAPE,
            Param::AmcWdt => amc_wdt::SHAPE,
            Param::Fmc1En => fmc1_en::SHAPE,
            Param::Fmc1Pol => fmc1_pol::SHAPE,
            Param::Fmc1Log => fmc1_log::SHAPE,
            Param::Fmc1Itl => fmc1_itl::SHAPE,
            Param::Fmc1Src => fmc1_src::SHAPE,
            Param::Fmc1Pulses => fmc1_pulses::SHAPE,
            Param::Fmc1Evt => fmc1_evt::SHAPE,
            Param::Fmc1Dly => fmc1_dly::SHAPE,
            Param::Fmc1Wdt => fmc1_wdt::SHAPE,
            Param::Fmc2En => fmc2_en::SHAPE,
            Param::Fmc2Pol => fmc2_pol::SHAPE,
            Param::Fmc2Log => fmc2_log::SHAPE,
            Param::Fmc2Itl => fmc2_itl::SHAPE,
            Param::Fmc2Src => fmc2_src::SHAPE,
            Param::Fmc2Pulses => fmc2_pulses::SHAPE,
            Param::Fmc2Evt => fmc2_evt::SHAPE,
            Param::Fmc2Dly => fmc2_dly::SHAPE,
            Param::Fmc2Wdt => fmc2_wdt::SHAPE,
            Param::RtmFreqKp => rtm_freq_kp::SHAPE,
            Param::RtmFreqKi => rtm_freq_ki::SHAPE,
            Param::RtmPhaseKp => rtm_phase_kp::SHAPE,
            Param::RtmPhaseKi => rtm_phase_ki::SHAPE,
            Param::RtmPhaseSet => rtm_phase_set::SHAPE,
            Param::RtmPhaseNavg => rtm_phase_navg::SHAPE,
            Param::RtmPhaseDivExp => rtm_phase_div_exp::SHAPE,
            Param::RtmRfreqHi => rtm_rfreq_hi::SHAPE,
            Param::RtmRfreqLo => rtm_rfreq_lo::SHAPE,
            Param::RtmN1 => rtm_n1::SHAPE,
            Param::RtmHsDiv => rtm_hs_div::SHAPE,
            Param::AfcFreqKp => afc_freq_kp::SHAPE,
            Param::AfcFreqKi => afc_freq_ki::SHAPE,
            Param::AfcPhaseKp => afc_phase_kp::SHAPE,
            Param::AfcPhaseKi => afc_phase_ki::SHAPE,
            Param::AfcPhaseSet => afc_phase_set::SHAPE,
            Param::AfcPhaseNavg => afc_phase_navg::SHAPE,
            Param::AfcPhaseDivExp => afc_phase_div_exp::SHAPE,
            Param::AfcRfreqHi => afc_rfreq_hi::SHAPE,
            Param::AfcRfreqLo => afc_rfreq_lo::SHAPE,
            Param::AfcN1 => afc_n1::SHAPE,
            Param::AfcHsDiv => afc_hs_div::SHAPE,
            // Written through the synthesizer sequence, see `Pll`
            Param::RtmFreq | Param::AfcFreq => return None,
        };
        Some(shape)
    }
}

/// All hardware bindings of the timing receiver.
pub fn bindings() -> impl Iterator<Item = (ParameterId, CallShape)> {
    Param::iter().filter_map(|param| param.binding().map(|shape| (param.id(), shape)))
}

/// The clock synthesizers of a timing receiver.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Hash, strum::EnumString, strum::Display, strum::EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Pll {
    /// Synthesizer on the rear transition module
    Rtm,
    /// Synthesizer on the AFC carrier
    Afc,
}

impl Pll {
    /// The software parameter holding the output frequency
    pub fn frequency(self) -> Param {
        match self {
            Pll::Rtm => Param::RtmFreq,
            Pll::Afc => Param::AfcFreq,
        }
    }

    /// Synthesizer registers in write order: N1, HS_DIV, RFREQ low, RFREQ high
    pub fn registers(self) -> [Param; 4] {
        match self {
            Pll::Rtm => [
                Param::RtmN1,
                Param::RtmHsDiv,
                Param::RtmRfreqLo,
                Param::RtmRfreqHi,
            ],
            Pll::Afc => [
                Param::AfcN1,
                Param::AfcHsDiv,
                Param::AfcRfreqLo,
                Param::AfcRfreqHi,
            ],
        }
    }

    /// The synthesizer whose output frequency is stored in `param`
    pub fn from_frequency(param: Param) -> Option<Pll> {
        Pll::iter().find(|pll| pll.frequency() == param)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn ids_round_trip() {
        for param in Param::iter() {
            assert_eq!(Param::from_id(param.id()), Some(param));
            assert_eq!(Param::from_str(param.name()), Ok(param));
        }
        assert_eq!(Param::from_id(ParameterId::new(10_000)), None);
    }

    #[test]
    fn trigger_banks_use_channel_shape() {
        for param in [Param::AmcEn, Param::Fmc1Wdt, Param::Fmc2Src] {
            let shape = param.binding().unwrap();
            assert_eq!(shape.name(), "ChannelInt32");
            assert_eq!(shape.service(), SERVICE_AFC_TIMING);
        }
        assert_eq!(Param::AmcDly.binding().unwrap().register(), "amc_dly");
    }

    #[test]
    fn status_registers_are_read_only() {
        for param in [Param::LinkStatus, Param::RxEnStatus, Param::RefClkLocked] {
            let shape = param.binding().unwrap();
            assert!(!shape.is_writable());
            assert!(shape.is_readable());
        }
    }

    #[test]
    fn software_parameters_have_no_binding() {
        for param in [
            Param::EvtCode,
            Param::EvtDelay,
            Param::EvtWidth,
            Param::RtmFreq,
            Param::AfcFreq,
        ] {
            assert!(param.binding().is_none());
        }
        assert_eq!(bindings().count(), Param::iter().count() - 5);
    }

    #[test]
    fn binding_kinds_match_parameter_kinds() {
        for (id, shape) in bindings() {
            let param = Param::from_id(id).unwrap();
            assert_eq!(shape.value_kind(), param.kind(), "{}", param);
        }
    }

    #[test]
    fn pll_names() {
        assert_eq!(Pll::from_str("RTM"), Ok(Pll::Rtm));
        assert_eq!(Pll::from_str("afc"), Ok(Pll::Afc));
        assert_eq!(Pll::Afc.to_string(), "afc");
        assert_eq!(Pll::from_frequency(Param::RtmFreq), Some(Pll::Rtm));
        assert_eq!(Pll::from_frequency(Param::RtmN1), None);
        assert_eq!(Pll::Rtm.registers()[0], Param::RtmN1);
    }
}
