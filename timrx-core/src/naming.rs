//! Fully qualified service names of the timing cores.
//!
//! Every carrier board hosts two timing cores. A logical timing receiver number
//! selects one core on one board:
//!
//! | unit | board | core |
//! |------|-------|------|
//! | 1    | 1     | 0    |
//! | 2    | 1     | 1    |
//! | 3    | 2     | 0    |
//! | ...  | ...   | ...  |
//! | 24   | 12    | 1    |
//!
//! The service of a core is addressed as `HALCS{board}:DEVIO:{base}{core}`.
use crate::error::Error;

const MAX_SLOTS: u32 = 12;
const MAX_CORES_PER_SLOT: u32 = 2;

/// Lowest valid logical timing receiver number
pub const UNIT_NUMBER_MIN: u32 = 1;
/// Highest valid logical timing receiver number
pub const UNIT_NUMBER_MAX: u32 = MAX_SLOTS * MAX_CORES_PER_SLOT;

/// Size of the service name buffer of the remote client, including the terminator.
pub const SERVICE_NAME_SIZE: usize = 50;

const BOARD_PREFIX: &str = "HALCS";
const CORE_TAG: &str = "DEVIO";

/// Physical location of a timing core.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct BoardSlot {
    pub board: u32,
    pub core: u32,
}

const fn slot(board: u32, core: u32) -> BoardSlot {
    BoardSlot { board, core }
}

// Indexed by unit number - 1
const BOARD_MAP: [BoardSlot; UNIT_NUMBER_MAX as usize] = [
    slot(1, 0),
    slot(1, 1),
    slot(2, 0),
    slot(2, 1),
    slot(3, 0),
    slot(3, 1),
    slot(4, 0),
    slot(4, 1),
    slot(5, 0),
    slot(5, 1),
    slot(6, 0),
    slot(6, 1),
    slot(7, 0),
    slot(7, 1),
    slot(8, 0),
    slot(8, 1),
    slot(9, 0),
    slot(9, 1),
    slot(10, 0),
    slot(10, 1),
    slot(11, 0),
    slot(11, 1),
    slot(12, 0),
    slot(12, 1),
];

/// Resolve a logical timing receiver number to its board and core.
pub fn unit_number(logical_id: u32) -> Result<BoardSlot, Error> {
    if !(UNIT_NUMBER_MIN..=UNIT_NUMBER_MAX).contains(&logical_id) {
        return Err(Error::InvalidDevice {
            number: logical_id,
            min: UNIT_NUMBER_MIN,
            max: UNIT_NUMBER_MAX,
        });
    }
    Ok(BOARD_MAP[(logical_id - UNIT_NUMBER_MIN) as usize])
}

/// Build the fully qualified service name for `base_name` on the given unit.
pub fn full_service_name(logical_id: u32, address: u32, base_name: &str) -> Result<String, Error> {
    ServiceNaming::new(logical_id)?.service_name(address, base_name)
}

/// Channels are addressed by the driver address directly.
pub fn channel_index(address: u32) -> u32 {
    address
}

/// Service naming for one validated timing receiver.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ServiceNaming {
    unit: u32,
    slot: BoardSlot,
}

impl ServiceNaming {
    pub fn new(unit: u32) -> Result<ServiceNaming, Error> {
        Ok(ServiceNaming {
            unit,
            slot: unit_number(unit)?,
        })
    }

    /// The logical timing receiver number
    pub fn unit(&self) -> u32 {
        self.unit
    }

    pub fn board(&self) -> u32 {
        self.slot.board
    }

    pub fn core(&self) -> u32 {
        self.slot.core
    }

    /// Format the service name for `base_name`.
    ///
    /// The core index comes from the board map. `address` does not take part in the
    /// name; channel-indexed registers carry it as a separate argument.
    pub fn service_name(&self, address: u32, base_name: &str) -> Result<String, Error> {
        let name = format!(
            "{}{}:{}:{}{}",
            BOARD_PREFIX, self.slot.board, CORE_TAG, base_name, self.slot.core
        );
        if name.len() >= SERVICE_NAME_SIZE {
            log::error!(
                "Service name for {} (address {}) does not fit: {}",
                base_name,
                address,
                name
            );
            return Err(Error::NameTooLong {
                name,
                max: SERVICE_NAME_SIZE,
            });
        }
        Ok(name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unit_zero_is_invalid() {
        assert_eq!(
            unit_number(0),
            Err(Error::InvalidDevice {
                number: 0,
                min: 1,
                max: 24
            })
        );
        assert!(unit_number(25).is_err());
    }

    #[test]
    fn units_map_to_board_pairs() {
        assert_eq!(unit_number(1).unwrap(), BoardSlot { board: 1, core: 0 });
        assert_eq!(unit_number(2).unwrap(), BoardSlot { board: 1, core: 1 });
        assert_eq!(unit_number(7).unwrap(), BoardSlot { board: 4, core: 0 });
        assert_eq!(unit_number(24).unwrap(), BoardSlot { board: 12, core: 1 });
        for unit in UNIT_NUMBER_MIN..=UNIT_NUMBER_MAX {
            let slot = unit_number(unit).unwrap();
            assert_eq!(slot.board, unit.div_ceil(2));
            assert_eq!(slot.core, (unit - 1) % 2);
        }
    }

    #[test]
    fn formats_service_name() {
        assert_eq!(
            full_service_name(4, 0, "LNLS_AFC_TIMING").unwrap(),
            "HALCS2:DEVIO:LNLS_AFC_TIMING1"
        );
        assert_eq!(
            full_service_name(23, 0, "LNLS_AFC_TIMING").unwrap(),
            "HALCS12:DEVIO:LNLS_AFC_TIMING0"
        );
    }

    #[test]
    fn service_name_is_pure() {
        let first = full_service_name(9, 3, "LNLS_AFC_TIMING").unwrap();
        let second = full_service_name(9, 3, "LNLS_AFC_TIMING").unwrap();
        assert_eq!(first, second);
        // The address only selects a channel, never a different core
        assert_eq!(first, full_service_name(9, 0, "LNLS_AFC_TIMING").unwrap());
    }

    #[test]
    fn rejects_names_that_overflow_the_buffer() {
        // "HALCS1:DEVIO:" + base + "0" is 14 characters plus the base name
        let fits = "A".repeat(SERVICE_NAME_SIZE - 15);
        assert_eq!(full_service_name(1, 0, &fits).unwrap().len(), 49);

        let too_long = "A".repeat(SERVICE_NAME_SIZE - 14);
        match full_service_name(1, 0, &too_long) {
            Err(Error::NameTooLong { name, max }) => {
                assert_eq!(name.len(), 50);
                assert_eq!(max, SERVICE_NAME_SIZE);
            }
            other => panic!("expected NameTooLong, got {:?}", other),
        }
    }

    #[test]
    fn channel_is_the_address() {
        assert_eq!(channel_index(0), 0);
        assert_eq!(channel_index(7), 7);
    }
}
