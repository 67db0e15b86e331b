use super::bus::{BusError, RegisterBus};
use crate::util::ManualClock;
use std::collections::VecDeque;

/// Register bus that replays scripted samples and can be told to fail.
pub struct ScriptedBus {
    pub identity: u8,
    pub seed: [i16; 3],
    pub bursts: VecDeque<[u8; 14]>,
    pub last_burst: [u8; 14],
    pub fail_next: u32,
    /// Advanced on every failed transfer to exercise retry deadlines.
    pub clock: ManualClock,
    pub fail_cost_us: i64,
    pub writes: Vec<(u8, Vec<u8>)>,
}

impl ScriptedBus {
    pub fn new(clock: &ManualClock, seed: [i16; 3]) -> Self {
        Self {
            identity: 0x68,
            seed,
            bursts: VecDeque::new(),
            last_burst: burst(seed, 0, [0, 0, 0]),
            fail_next: 0,
            clock: clock.clone(),
            fail_cost_us: 0,
            writes: Vec::new(),
        }
    }

    pub fn push(&mut self, acc: [i16; 3], temp: i16, gyro: [i16; 3]) {
        self.bursts.push_back(burst(acc, temp, gyro));
    }
}

impl RegisterBus for ScriptedBus {
    fn read(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), BusError> {
        if self.fail_next > 0 {
            self.fail_next -= 1;
            self.clock.advance_us(self.fail_cost_us);
            return Err(BusError::Io(libc::EIO));
        }
        match (reg, buf.len()) {
            (0x75, 1) => buf[0] = self.identity,
            (0x3B, 6) => {
                for (i, v) in self.seed.iter().enumerate() {
                    buf[2 * i..2 * i + 2].copy_from_slice(&v.to_be_bytes());
                }
            }
            (0x3B, 14) => {
                if let Some(next) = self.bursts.pop_front() {
                    self.last_burst = next;
                }
                buf.copy_from_slice(&self.last_burst);
            }
            _ => return Err(BusError::Io(libc::EINVAL)),
        }
        Ok(())
    }

    fn write(&mut self, reg: u8, buf: &[u8]) -> Result<(), BusError> {
        self.writes.push((reg, buf.to_vec()));
        Ok(())
    }
}

pub fn burst(acc: [i16; 3], temp: i16, gyro: [i16; 3]) -> [u8; 14] {
    let mut out = [0u8; 14];
    let words = [acc[0], acc[1], acc[2], temp, gyro[0], gyro[1], gyro[2]];
    for (i, w) in words.iter().enumerate() {
        out[2 * i..2 * i + 2].copy_from_slice(&w.to_be_bytes());
    }
    out
}
