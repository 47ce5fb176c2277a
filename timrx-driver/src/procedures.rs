//! Remote procedures of the `LNLS_AFC_TIMING` service.
//!
//! Every register gets a module with its `read`/`write` functions and the
//! [`CallShape`](timrx_core::registry::CallShape) binding them.

/// Base name of the timing service on each board
pub const SERVICE_AFC_TIMING: &str = "LNLS_AFC_TIMING";

macro_rules! status_registers {
    ($($name:ident => $register:literal),* $(,)?) => {
        $(
            pub(crate) mod $name {
                use timrx_core::{ClientError, RegisterClient, registry::CallShape};

                pub(crate) fn read(
                    client: &mut dyn RegisterClient,
                    service: &str,
                ) -> Result<u32, ClientError> {
                    client.read_u32(service, $register)
                }

                pub(crate) const SHAPE: CallShape = CallShape::PlainInt32 {
                    service: super::SERVICE_AFC_TIMING,
                    register: $register,
                    write: None,
                    read: Some(read),
                };
            }
        )*
    };
}

macro_rules! plain_registers {
    ($($name:ident => $register:literal),* $(,)?) => {
        $(
            pub(crate) mod $name {
                use timrx_core::{ClientError, RegisterClient, registry::CallShape};

                pub(crate) fn write(
                    client: &mut dyn RegisterClient,
                    service: &str,
                    value: u32,
                ) -> Result<(), ClientError> {
                    client.write_u32(service, $register, value)
                }

                pub(crate) fn read(
                    client: &mut dyn RegisterClient,
                    service: &str,
                ) -> Result<u32, ClientError> {
                    client.read_u32(service, $register)
                }

                pub(crate) const SHAPE: CallShape = CallShape::PlainInt32 {
                    service: super::SERVICE_AFC_TIMING,
                    register: $register,
                    write: Some(write),
                    read: Some(read),
                };
            }
        )*
    };
}

macro_rules! channel_registers {
    ($($name:ident => $register:literal),* $(,)?) => {
        $(
            pub(crate) mod $name {
                use timrx_core::{ClientError, RegisterClient, registry::CallShape};

                pub(crate) fn write(
                    client: &mut dyn RegisterClient,
                    service: &str,
                    channel: u32,
                    value: u32,
                ) -> Result<(), ClientError> {
                    client.write_channel_u32(service, $register, channel, value)
                }

                pub(crate) fn read(
                    client: &mut dyn RegisterClient,
                    service: &str,
                    channel: u32,
                ) -> Result<u32, ClientError> {
                    client.read_channel_u32(service, $register, channel)
                }

                pub(crate) const SHAPE: CallShape = CallShape::ChannelInt32 {
                    service: super::SERVICE_AFC_TIMING,
                    register: $register,
                    write: Some(write),
                    read: Some(read),
                };
            }
        )*
    };
}

status_registers! {
    link_status => "link_status",
    rxen_status => "rxen_status",
    ref_clk_locked => "ref_clk_locked",
}

channel_registers! {
    amc_en => "amc_en",
    amc_pol => "amc_pol",
    amc_log => "amc_log",
    amc_itl => "amc_itl",
    amc_src => "amc_src",
    amc_pulses => "amc_pulses",
    amc_evt => "amc_evt",
    amc_dly => "amc_dly",
    amc_wdt => "amc_wdt",
    fmc1_en => "fmc1_en",
    fmc1_pol => "fmc1_pol",
    fmc1_log => "fmc1_log",
    fmc1_itl => "fmc1_itl",
    fmc1_src => "fmc1_src",
    fmc1_pulses => "fmc1_pulses",
    fmc1_evt => "fmc1_evt",
    fmc1_dly => "fmc1_dly",
    fmc1_wdt => "fmc1_wdt",
    fmc2_en => "fmc2_en",
    fmc2_pol => "fmc2_pol",
    fmc2_log => "fmc2_log",
    fmc2_itl => "fmc2_itl",
    fmc2_src => "fmc2_src",
    fmc2_pulses => "fmc2_pulses",
    fmc2_evt => "fmc2_evt",
    fmc2_dly => "fmc2_dly",
    fmc2_wdt => "fmc2_wdt",
}

plain_registers! {
    rtm_freq_kp => "rtm_freq_kp",
    rtm_freq_ki => "rtm_freq_ki",
    rtm_phase_kp => "rtm_phase_kp",
    rtm_phase_ki => "rtm_phase_ki",
    rtm_phase_set => "rtm_phase_set",
    rtm_phase_navg => "rtm_phase_navg",
    rtm_phase_div_exp => "rtm_phase_div_exp",
    rtm_rfreq_hi => "rtm_rfreq_hi",
    rtm_rfreq_lo => "rtm_rfreq_lo",
    rtm_n1 => "rtm_n1",
    rtm_hs_div => "rtm_hs_div",
    afc_freq_kp => "afc_freq_kp",
    afc_freq_ki => "afc_freq_ki",
    afc_phase_kp => "afc_phase_kp",
    afc_phase_ki => "afc_phase_ki",
    afc_phase_set => "afc_phase_set",
    afc_phase_navg => "afc_phase_navg",
    afc_phase_div_exp => "afc_phase_div_exp",
    afc_rfreq_hi => "afc_rfreq_hi",
    afc_rfreq_lo => "afc_rfreq_lo",
    afc_n1 => "afc_n1",
    afc_hs_div => "afc_hs_div",
}
