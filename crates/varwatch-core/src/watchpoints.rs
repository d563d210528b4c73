//! # Hardware Watchpoints
//!
//! Programs the x86-64 debug registers so that every access to the watched
//! variable traps into the supervisor.
//!
//! ## Slot layout
//!
//! Two slots cover the same address:
//!
//! - **DR0**: write-only condition (`RW = 01`)
//! - **DR1**: read-or-write condition (`RW = 11`)
//!
//! x86 has no read-only condition. A read fires only DR1 while a write fires
//! both, so after a trap the DR6 status bits tell the two apart:
//! B0 set means write, B1 alone means read.
//!
//! ## DR7 encoding
//!
//! ```text
//! bit  0 / 2      L0 / L1   local enable
//! bits 16+4i..    RWi       00 exec, 01 write, 11 read/write
//! bits 18+4i..    LENi      00 = 1, 01 = 2, 11 = 4, 10 = 8 bytes
//! ```
//!
//! See: Intel SDM Vol. 3B, 17.2 "Debug Registers"

use tracing::{debug, trace, warn};

use crate::error::VarwatchResult;
use crate::events::AccessKind;
use crate::types::{Address, WatchWidth};

/// DR6: which condition fired
pub const DR_STATUS: usize = 6;
/// DR7: enable bits and per-slot condition/length
pub const DR_CONTROL: usize = 7;

/// Slot armed for writes only
pub const WRITE_SLOT: usize = 0;
/// Slot armed for reads and writes
pub const ACCESS_SLOT: usize = 1;

/// Number of address slots (DR0-DR3)
const SLOT_COUNT: usize = 4;

/// Read/write access to the debug registers of a stopped tracee.
pub trait DebugRegisterFile
{
    /// Read debug register `index` (0-7)
    fn read_debug_register(&self, index: usize) -> VarwatchResult<u64>;

    /// Write debug register `index` (0-7)
    fn write_debug_register(&mut self, index: usize, value: u64) -> VarwatchResult<()>;
}

/// Access that makes a slot fire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerCondition
{
    /// `RW = 01`
    Write,
    /// `RW = 11`
    ReadWrite,
}

impl TriggerCondition
{
    const fn bits(self) -> u64
    {
        match self {
            TriggerCondition::Write => 0b01,
            TriggerCondition::ReadWrite => 0b11,
        }
    }
}

const fn length_bits(width: WatchWidth) -> u64
{
    match width {
        WatchWidth::Byte => 0b00,
        WatchWidth::Word => 0b01,
        WatchWidth::Dword => 0b11,
        WatchWidth::Qword => 0b10,
    }
}

/// One armed address slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotConfig
{
    /// Address register index (0-3)
    pub slot: usize,
    /// Access that fires the slot
    pub condition: TriggerCondition,
    /// Watched length
    pub width: WatchWidth,
}

/// Build a DR7 value enabling exactly the given slots.
///
/// Every other bit, including global enables and `GD`, stays clear.
#[must_use]
pub fn encode_control(slots: &[SlotConfig]) -> u64
{
    slots.iter().fold(0, |control, config| {
        debug_assert!(config.slot < SLOT_COUNT);
        let field_shift = 16 + config.slot * 4;
        control
            | 1 << (config.slot * 2)
            | config.condition.bits() << field_shift
            | length_bits(config.width) << (field_shift + 2)
    })
}

/// The pair of watchpoints covering one variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchpointPlan
{
    /// Runtime address of the variable
    pub address: Address,
    /// Size of the variable
    pub width: WatchWidth,
}

impl WatchpointPlan
{
    /// Create a plan for the variable at `address`
    pub fn new(address: Address, width: WatchWidth) -> Self
    {
        Self { address, width }
    }

    /// Write slot followed by read/write slot
    pub fn slots(&self) -> [SlotConfig; 2]
    {
        [
            SlotConfig {
                slot: WRITE_SLOT,
                condition: TriggerCondition::Write,
                width: self.width,
            },
            SlotConfig {
                slot: ACCESS_SLOT,
                condition: TriggerCondition::ReadWrite,
                width: self.width,
            },
        ]
    }

    /// DR7 value for this plan
    pub fn control(&self) -> u64
    {
        encode_control(&self.slots())
    }

    /// Program DR0, DR1 and DR7, then clear DR6.
    ///
    /// The tracee must be in a trace stop. Debug registers only match
    /// addresses aligned to the watch length; Linux rejects a misaligned
    /// address with `EINVAL`, which surfaces as `DebugRegisterAccess`.
    pub fn install<D: DebugRegisterFile + ?Sized>(&self, registers: &mut D) -> VarwatchResult<()>
    {
        let width = self.width.bytes() as u64;
        if self.address.offset_in(width) != 0 {
            warn!(
                address = %self.address,
                width = %self.width,
                "Watched variable is not aligned to its size"
            );
        }

        for config in self.slots() {
            registers.write_debug_register(config.slot, self.address.value())?;
        }
        let control = self.control();
        registers.write_debug_register(DR_CONTROL, control)?;
        clear_trigger_state(registers)?;

        debug!(
            address = %self.address,
            width = %self.width,
            dr7 = format_args!("0x{control:x}"),
            "Installed watchpoints"
        );
        Ok(())
    }
}

/// Snapshot of DR6
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerStatus(pub u64);

impl TriggerStatus
{
    /// Whether the `B<slot>` bit is set
    pub fn fired(self, slot: usize) -> bool
    {
        self.0 & (1 << slot) != 0
    }

    /// Classify the trap, or `None` if neither watch slot fired.
    ///
    /// ```rust
    /// use varwatch_core::events::AccessKind;
    /// use varwatch_core::watchpoints::TriggerStatus;
    ///
    /// assert_eq!(TriggerStatus(0b11).classify(), Some(AccessKind::Write));
    /// assert_eq!(TriggerStatus(0b10).classify(), Some(AccessKind::Read));
    /// assert_eq!(TriggerStatus(0x4000).classify(), None); // single-step
    /// ```
    pub fn classify(self) -> Option<AccessKind>
    {
        if self.fired(WRITE_SLOT) {
            Some(AccessKind::Write)
        } else if self.fired(ACCESS_SLOT) {
            Some(AccessKind::Read)
        } else {
            None
        }
    }
}

/// Read DR6.
pub fn read_trigger_state<D: DebugRegisterFile + ?Sized>(registers: &D) -> VarwatchResult<TriggerStatus>
{
    let status = registers.read_debug_register(DR_STATUS)?;
    trace!(dr6 = format_args!("0x{status:x}"), "Read trigger state");
    Ok(TriggerStatus(status))
}

/// Zero DR6 so the next trap starts from a clean status.
pub fn clear_trigger_state<D: DebugRegisterFile + ?Sized>(registers: &mut D) -> VarwatchResult<()>
{
    registers.write_debug_register(DR_STATUS, 0)
}
