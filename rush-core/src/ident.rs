use anyhow::{Result, anyhow, ensure};
use std::time::{SystemTime, UNIX_EPOCH};

use rush_types::{ConfigError, Ident};

const TICK_MS: u64 = 100;
/// 2024-01-01T00:00:00Z, in ticks.
const EPOCH_TICKS: u64 = 1_704_067_200_000 / TICK_MS;
/// Counter step, coprime with the 256 counter modulus so the counter walks
/// every residue before repeating.
const COUNTER_STEP: u16 = 71;

/// Mints compact, time-ordered identifiers: coarse tick count in hex,
/// followed by the machine id and a monotonic counter interleaved bit by
/// bit. Single-threaded use assumed; the server wraps one instance in a
/// mutex.
#[derive(Debug)]
pub struct IdentFactory {
    machine_id: u8,
    counter: u16,
}

impl IdentFactory {
    pub fn new(machine_id: u32) -> Result<Self, ConfigError> {
        if machine_id > 0xff {
            return Err(ConfigError::MachineIdOutOfRange(machine_id));
        }
        Ok(Self {
            machine_id: machine_id as u8,
            counter: rand::random::<u8>() as u16,
        })
    }

    pub fn next(&mut self) -> Ident {
        let time = ticks_now();
        let combined = self.interleave(8);
        Ident::new(format!("{time:x}{combined:04x}"))
    }

    /// Narrower variant: 16-bit time window and half the interleaved bits.
    /// Shorter, weaker against collisions; for short-lived low-stakes ids.
    pub fn next_small(&mut self) -> Ident {
        let time = ticks_now() & 0xffff;
        let combined = self.interleave(4);
        Ident::new(format!("{time:x}{combined:02x}"))
    }

    fn interleave(&mut self, bits: u32) -> u32 {
        let mut combined = 0u32;
        for i in 0..bits {
            combined |= ((self.machine_id as u32 >> i) & 1) << (2 * i);
            combined |= ((self.counter as u32 >> i) & 1) << (2 * i + 1);
        }
        self.counter = (self.counter + COUNTER_STEP) % 0x100;
        combined
    }
}

fn ticks_now() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    (now.as_millis() as u64 / TICK_MS).saturating_sub(EPOCH_TICKS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedIdent {
    pub machine_id: u8,
    pub unix_time_ms: u64,
}

/// Recover the machine id and coarse mint time from a full-width identifier.
pub fn parse(id: &Ident) -> Result<ParsedIdent> {
    let raw = id.as_str();
    ensure!(Ident::is_valid(raw), "not an identifier: {raw:?}");
    let (time_part, tail) = raw.split_at(raw.len() - 4);
    let ticks = u64::from_str_radix(time_part, 16)?;
    let combined = u32::from_str_radix(tail, 16)?;

    let mut machine_id = 0u8;
    for i in 0..8 {
        machine_id |= (((combined >> (2 * i)) & 1) as u8) << i;
    }

    Ok(ParsedIdent {
        machine_id,
        unix_time_ms: (ticks + EPOCH_TICKS) * TICK_MS,
    })
}

/// Shorten a full-width identifier to the small form: 16-bit time window
/// plus the low interleaved byte.
pub fn as_small(id: &Ident) -> Result<Ident> {
    let raw = id.as_str();
    ensure!(Ident::is_valid(raw), "not an identifier: {raw:?}");
    if raw.len() < 8 {
        return Err(anyhow!("identifier too short to shrink: {raw:?}"));
    }
    let time = &raw[raw.len() - 8..raw.len() - 4];
    let tail = &raw[raw.len() - 2..];
    Ok(Ident::new(format!("{time}{tail}")))
}
