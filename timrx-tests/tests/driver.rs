use std::time::Duration;

use timrx_core::{ClientError, ConnectOptions, Value, error::Error};
use timrx_driver::{
    catalog::{Param, Pll},
    driver::{Builder, Driver},
};
use timrx_tests::{Call, Spy};

const UNIT4_SERVICE: &str = "HALCS2:DEVIO:LNLS_AFC_TIMING1";

fn driver(unit: u32) -> (Spy, Driver<Spy>) {
    let spy = Spy::new();
    let driver = Builder::new()
        .unit_number(unit)
        .build(spy.clone())
        .unwrap();
    (spy, driver)
}

#[test]
fn invalid_unit_rejects_construction() {
    for unit in [0, 25] {
        let spy = Spy::new();
        match Builder::new().unit_number(unit).build(spy.clone()) {
            Err(Error::InvalidDevice { number, min, max }) => {
                assert_eq!(number, unit);
                assert_eq!((min, max), (1, 24));
            }
            Err(other) => panic!("expected InvalidDevice, got {:?}", other),
            Ok(_) => panic!("unit {} must be rejected", unit),
        }
        assert_eq!(spy.connections(), 0);
    }
}

#[test]
fn refused_connection_rejects_construction() {
    let spy = Spy::new();
    spy.refuse_connect(true);
    match Builder::new().endpoint("tcp://nowhere:1").build(spy) {
        Err(Error::ConnectFailed { endpoint, source }) => {
            assert_eq!(endpoint, "tcp://nowhere:1");
            assert_eq!(source, ClientError::Transport);
        }
        Err(other) => panic!("expected ConnectFailed, got {:?}", other),
        Ok(_) => panic!("connection must fail"),
    }
}

#[test]
fn channel_parameter_uses_address_as_channel() {
    let (spy, driver) = driver(4);
    driver.write_u32(Param::AmcEn, 3, 1, 0x1).unwrap();
    assert_eq!(
        spy.calls(),
        vec![Call::Write {
            service: UNIT4_SERVICE.to_string(),
            register: "amc_en".to_string(),
            channel: Some(3),
            value: Value::UInt32(1),
        }]
    );

    assert_eq!(driver.read_u32(Param::AmcEn, 3, 0x1), Ok(1));
    assert_eq!(driver.read_u32(Param::AmcEn, 2, 0x1), Ok(0));
}

#[test]
fn read_only_parameter_write_makes_no_remote_call() {
    let (spy, driver) = driver(1);
    assert_eq!(driver.write_u32(Param::LinkStatus, 0, 1, 0x1), Ok(()));
    assert!(spy.calls().is_empty());
}

#[test]
fn software_parameter_is_served_from_stored_value() {
    let (spy, driver) = driver(1);
    driver.write_u32(Param::EvtDelay, 5, 1000, u32::MAX).unwrap();
    assert_eq!(driver.read_u32(Param::EvtDelay, 5, u32::MAX), Ok(1000));
    assert_eq!(driver.read_u32(Param::EvtDelay, 5, 0xFF), Ok(1000 & 0xFF));
    assert!(spy.calls().is_empty());
}

#[test]
fn writes_send_only_the_masked_bits() {
    let (spy, driver) = driver(1);
    driver.write_u32(Param::RtmPhaseNavg, 0, 0xAB, 0x0F).unwrap();
    driver.write_u32(Param::RtmPhaseNavg, 0, 0x50, 0xF0).unwrap();

    let values: Vec<Value> = spy
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Write { value, .. } => Some(value),
            _ => None,
        })
        .collect();
    assert_eq!(values, vec![Value::UInt32(0x0B), Value::UInt32(0x50)]);
}

#[test]
fn reads_apply_the_mask_to_the_hardware_value() {
    let (spy, driver) = driver(1);
    spy.stick("link_status", 0b11);
    assert_eq!(driver.read_u32(Param::LinkStatus, 0, 0x1), Ok(1));
    assert_eq!(driver.read_u32(Param::LinkStatus, 0, u32::MAX), Ok(3));
}

#[test]
fn remote_failure_is_reported_without_retry() {
    let (spy, driver) = driver(4);
    spy.fail("amc_dly");
    match driver.write_u32(Param::AmcDly, 2, 100, u32::MAX) {
        Err(Error::HardwareAccessFailed {
            service,
            register,
            source,
        }) => {
            assert_eq!(service, UNIT4_SERVICE);
            assert_eq!(register, "amc_dly");
            assert_eq!(source, ClientError::Remote(-2));
        }
        other => panic!("expected HardwareAccessFailed, got {:?}", other),
    }
    assert!(matches!(
        driver.read_u32(Param::AmcDly, 2, u32::MAX),
        Err(Error::HardwareAccessFailed { .. })
    ));
    assert_eq!(spy.calls().len(), 2);
}

#[test]
fn set_frequency_writes_in_order_and_reads_back() {
    let (spy, driver) = driver(1);
    let readback = driver.set_frequency(Pll::Rtm, 100e6).unwrap();

    assert_eq!(
        spy.registers(),
        vec![
            "rtm_n1",
            "rtm_hs_div",
            "rtm_rfreq_lo",
            "rtm_rfreq_hi",
            "rtm_n1",
            "rtm_hs_div",
            "rtm_rfreq_lo",
            "rtm_rfreq_hi",
        ]
    );
    let written: Vec<Value> = spy
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Write { value, .. } => Some(value),
            _ => None,
        })
        .collect();
    assert_eq!(
        written,
        vec![
            Value::UInt32(5),
            Value::UInt32(5),
            Value::UInt32(79273),
            Value::UInt32(12096),
        ]
    );

    assert_eq!(readback.setting.n1, 5);
    assert_eq!(readback.setting.rfreq_hi, 12096);
    assert!((readback.frequency - 100e6).abs() < 0.01);
    assert_eq!(driver.read_f64(Param::RtmFreq, 0), Ok(readback.frequency));
}

#[test]
fn set_frequency_publishes_what_the_hardware_confirms() {
    let (spy, driver) = driver(1);
    spy.stick("afc_rfreq_lo", 0);
    let readback = driver.set_frequency(Pll::Afc, 100e6).unwrap();

    assert_eq!(readback.setting.rfreq_lo, 0);
    assert!(readback.frequency < 100e6);
    assert_eq!(driver.read_f64(Param::AfcFreq, 0), Ok(readback.frequency));
}

#[test]
fn set_frequency_stops_at_the_first_failure() {
    let (spy, driver) = driver(1);
    spy.fail("rtm_hs_div");
    assert!(matches!(
        driver.set_frequency(Pll::Rtm, 10e6),
        Err(Error::HardwareAccessFailed { .. })
    ));
    assert_eq!(spy.registers(), vec!["rtm_n1", "rtm_hs_div"]);
}

#[test]
fn frequency_parameter_write_programs_the_synthesizer() {
    let (spy, driver) = driver(1);
    driver.write_f64(Param::RtmFreq, 0, 125e6).unwrap();
    let written: Vec<(String, Value)> = spy
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Write {
                register, value, ..
            } => Some((register, value)),
            _ => None,
        })
        .collect();
    assert_eq!(
        written,
        vec![
            ("rtm_n1".to_string(), Value::UInt32(3)),
            ("rtm_hs_div".to_string(), Value::UInt32(7)),
            ("rtm_rfreq_lo".to_string(), Value::UInt32(80741)),
            ("rtm_rfreq_hi".to_string(), Value::UInt32(12320)),
        ]
    );
    assert_eq!(driver.read_u32(Param::RtmN1, 0, u32::MAX), Ok(3));
}

#[test]
fn unreachable_frequency_writes_nothing() {
    let (spy, driver) = driver(1);
    assert_eq!(
        driver.write_f64(Param::AfcFreq, 0, 1e6),
        Err(Error::FrequencyOutOfRange(1e6))
    );
    assert!(spy.calls().is_empty());
}

#[test]
fn disconnect_and_reconnect() {
    let (spy, driver) = driver(1);
    driver.disconnect();
    assert!(!driver.is_connected());
    assert_eq!(spy.calls(), vec![Call::Disconnect]);

    assert_eq!(driver.read_u32(Param::AmcEn, 0, 1), Err(Error::Disconnected));
    assert_eq!(driver.write_u32(Param::AmcEn, 0, 1, 1), Err(Error::Disconnected));
    // Software parameters do not need the connection
    assert_eq!(driver.write_u32(Param::EvtCode, 0, 7, u32::MAX), Ok(()));
    assert_eq!(driver.read_u32(Param::EvtCode, 0, u32::MAX), Ok(7));

    spy.refuse_connect(true);
    assert!(matches!(driver.connect(), Err(Error::ConnectFailed { .. })));
    spy.refuse_connect(false);
    driver.connect().unwrap();
    assert!(driver.is_connected());
    assert_eq!(spy.connections(), 2);
    driver.write_u32(Param::AmcEn, 0, 1, 1).unwrap();
    assert_eq!(driver.read_u32(Param::AmcEn, 0, 1), Ok(1));
}

#[test]
fn dropping_the_driver_disconnects() {
    let (spy, driver) = driver(1);
    drop(driver);
    assert_eq!(spy.calls(), vec![Call::Disconnect]);
}

#[test]
fn rejects_invalid_address_and_value_kind() {
    let (spy, driver) = driver(1);
    assert_eq!(
        driver.write_u32(Param::AmcEn, 8, 1, 1),
        Err(Error::InvalidAddress { address: 8, max: 8 })
    );
    assert!(matches!(
        driver.write_f64(Param::AmcEn, 0, 1.0),
        Err(Error::ValueKind { .. })
    ));
    assert!(spy.calls().is_empty());
}

#[test]
fn calls_from_several_threads_are_serialized() {
    let (spy, driver) = driver(2);
    std::thread::scope(|scope| {
        for channel in 0..8 {
            let driver = &driver;
            scope.spawn(move || driver.write_u32(Param::Fmc1En, channel, 1, 0x1).unwrap());
        }
    });
    let mut channels: Vec<u32> = spy
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Write { channel, .. } => channel,
            _ => None,
        })
        .collect();
    channels.sort();
    assert_eq!(channels, (0..8).collect::<Vec<_>>());
}

#[test]
fn configuration_reaches_the_connector() {
    let spy = Spy::new();
    let _driver = Builder::new()
        .endpoint("tcp://10.0.18.35:8978")
        .verbosity(3)
        .log_sink("stderr")
        .timeout(Duration::from_millis(250))
        .build(spy.clone())
        .unwrap();
    assert_eq!(
        spy.options(),
        Some(ConnectOptions {
            endpoint: "tcp://10.0.18.35:8978".to_string(),
            verbosity: 3,
            log_sink: "stderr".to_string(),
            timeout: Duration::from_millis(250),
        })
    );
}

#[test]
fn synthesizer_frequency_only_exists_at_address_zero() {
    let (spy, driver) = driver(1);
    assert_eq!(
        driver.write_f64(Param::RtmFreq, 3, 100e6),
        Err(Error::InvalidAddress { address: 3, max: 1 })
    );
    assert_eq!(
        driver.read_f64(Param::AfcFreq, 3),
        Err(Error::InvalidAddress { address: 3, max: 1 })
    );
    assert!(spy.calls().is_empty());

    driver.write_f64(Param::RtmFreq, 0, 100e6).unwrap();
    let frequency = driver.read_f64(Param::RtmFreq, 0).unwrap();
    assert!((frequency - 100e6).abs() < 0.01);
}

#[test]
fn failed_synthesizer_write_keeps_the_published_frequency() {
    let (spy, driver) = driver(1);
    let first = driver.set_frequency(Pll::Rtm, 100e6).unwrap();

    spy.fail("rtm_rfreq_lo");
    assert!(driver.set_frequency(Pll::Rtm, 125e6).is_err());
    assert_eq!(driver.read_f64(Param::RtmFreq, 0), Ok(first.frequency));

    driver.disconnect();
    assert_eq!(driver.set_frequency(Pll::Rtm, 10e6), Err(Error::Disconnected));
    assert_eq!(driver.read_f64(Param::RtmFreq, 0), Ok(first.frequency));
}
