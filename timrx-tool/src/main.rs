//! # Timing Receiver Tool
//!
//! Command line utilities around the timing receiver driver: Si57x synthesizer
//! register calculation, service name lookup, the parameter catalog and a driver
//! session against a simulated register service.
pub mod backends;

use std::error::Error;

use clap::{Parser, Subcommand};
use clap_num::maybe_hex;
use env_logger::Env;
use strum::IntoEnumIterator;
use timrx_core::{
    naming::ServiceNaming,
    synth::{FXTAL_HZ, HS_DIV_TABLE, Si57x, SynthesizerSetting},
};
use timrx_driver::{
    SERVICE_AFC_TIMING,
    catalog::{Param, Pll},
    driver::Builder,
};

use crate::backends::sim::SimConnector;

#[derive(Subcommand, Clone, PartialEq)]
enum Command {
    /// Compute the synthesizer registers for an output frequency
    Synth {
        /// Output frequency in Hz
        frequency: f64,
    },
    /// Compute the output frequency encoded by synthesizer registers
    Decode {
        #[arg(long, value_parser = maybe_hex::<u32>, help = "N1 register (divider minus one)")]
        n1: u32,
        #[arg(long, value_parser = maybe_hex::<u32>, help = "HS_DIV register code")]
        hs_div: u32,
        #[arg(long, value_parser = maybe_hex::<u32>)]
        rfreq_lo: u32,
        #[arg(long, value_parser = maybe_hex::<u32>)]
        rfreq_hi: u32,
    },
    /// Print the service name of a timing core
    Service {
        #[arg(short, long)]
        unit: u32,
        #[arg(short, long, default_value = "0")]
        address: u32,
        #[arg(short, long, default_value = SERVICE_AFC_TIMING)]
        base: String,
    },
    /// List all driver parameters and their hardware bindings
    Params,
    /// Run a driver session against a simulated register service
    Simulate {
        #[arg(short, long, default_value = "1")]
        unit: u32,
        #[arg(short, long, default_value = "100000000")]
        frequency: f64,
        #[arg(short, long, default_value = "rtm")]
        pll: Pll,
    },
}

#[derive(Parser)]
#[command(about = "Timing receiver register utilities", long_about = None)]
struct Args {
    #[arg(long, default_value_t = FXTAL_HZ, help = "Synthesizer crystal frequency in Hz")]
    fxtal: f64,

    #[clap(subcommand)]
    command: Command,
}

fn print_setting(si57x: &Si57x, setting: &SynthesizerSetting) -> Result<(), Box<dyn Error>> {
    let hs_div = setting
        .hs_div_entry()
        .ok_or(timrx_core::error::Error::InvalidHsDiv(setting.hs_div))?;
    println!(
        "N1       = {:>8} ({:#x}), divider {}",
        setting.n1,
        setting.n1,
        setting.n1_divider()
    );
    println!(
        "HS_DIV   = {:>8} ({:#x}), divider {}",
        setting.hs_div, setting.hs_div, hs_div.divider
    );
    println!("RFREQ_LO = {:>8} ({:#07x})", setting.rfreq_lo, setting.rfreq_lo);
    println!("RFREQ_HI = {:>8} ({:#x})", setting.rfreq_hi, setting.rfreq_hi);
    println!("RFREQ    = {}", setting.rfreq());
    println!("f_out    = {} Hz", si57x.compute_frequency(setting)?);
    println!("step     = {} Hz", si57x.resolution(setting)?);
    Ok(())
}

fn simulate(unit: u32, frequency: f64, pll: Pll, fxtal: f64) -> Result<(), Box<dyn Error>> {
    let sim = SimConnector::new();
    let driver = Builder::new()
        .port_name(format!("TIMRX{}", unit))
        .endpoint("sim://localhost")
        .unit_number(unit)
        .fxtal(fxtal)
        .build(sim.clone())?;
    let service = driver.naming().service_name(0, SERVICE_AFC_TIMING)?;
    println!("Timing core {}", service);

    let link = driver.read_u32(Param::LinkStatus, 0, 0x1)?;
    let locked = driver.read_u32(Param::RefClkLocked, 0, 0x1)?;
    println!(
        "{} = {}, {} = {}",
        Param::LinkStatus,
        link,
        Param::RefClkLocked,
        locked
    );

    let readback = driver.set_frequency(pll, frequency)?;
    println!(
        "{} = {} Hz ({:?})",
        pll.frequency(),
        readback.frequency,
        readback.setting
    );

    for channel in 0..driver.config().max_addr {
        driver.write_u32(Param::AmcEn, channel, channel % 2, 0x1)?;
    }
    let enabled: Vec<u32> = (0..driver.config().max_addr)
        .filter(|channel| matches!(driver.read_u32(Param::AmcEn, *channel, 0x1), Ok(1)))
        .collect();
    println!("{} set on channels {:?}", Param::AmcEn, enabled);

    driver.disconnect();
    println!("{} remote calls", sim.calls());
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::debug!("Using crystal frequency {} Hz", args.fxtal);
    let si57x = Si57x::with_fxtal(args.fxtal)?;

    match args.command {
        Command::Synth { frequency } => {
            let setting = si57x.compute_settings(frequency)?;
            print_setting(&si57x, &setting)?;
        }
        Command::Decode {
            n1,
            hs_div,
            rfreq_lo,
            rfreq_hi,
        } => {
            let setting = SynthesizerSetting {
                n1,
                hs_div,
                rfreq_lo,
                rfreq_hi,
            };
            if setting.hs_div_entry().is_none() {
                let codes: Vec<u32> = HS_DIV_TABLE.iter().map(|entry| entry.code).collect();
                println!("HS_DIV code must be one of {:?}", codes);
            }
            print_setting(&si57x, &setting)?;
        }
        Command::Service {
            unit,
            address,
            base,
        } => {
            let naming = ServiceNaming::new(unit)?;
            println!("{}", naming.service_name(address, &base)?);
        }
        Command::Params => {
            for param in Param::iter() {
                match param.binding() {
                    Some(shape) => println!(
                        "{:<28} {:<8} {:<13} {}{}{}",
                        param.name(),
                        param.kind().to_string(),
                        shape.name(),
                        shape.register(),
                        if shape.is_readable() { " r" } else { "" },
                        if shape.is_writable() { " w" } else { "" },
                    ),
                    None => println!(
                        "{:<28} {:<8} {:<13}",
                        param.name(),
                        param.kind().to_string(),
                        "-"
                    ),
                }
            }
        }
        Command::Simulate {
            unit,
            frequency,
            pll,
        } => simulate(unit, frequency, pll, args.fxtal)?,
    }
    Ok(())
}
