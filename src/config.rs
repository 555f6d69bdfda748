use crate::constants::*;
use crate::error::{Result, SimError};

/// Simulation parameters, fixed once a `Scheduler` is built
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub page_size: usize,
    pub frame_count: usize,
    pub reserved_frames: usize,
    pub max_pages_per_process: usize,
    pub time_slices: Vec<u32>,
    pub io_block_ticks: u32,
    pub instructions_per_process: usize,
    pub read_write_probability: f64,
    pub event_log_capacity: usize,
}

impl Config {
    /// Number of frames the memory manager may hand out
    #[inline]
    pub fn usable_frames(&self) -> usize {
        self.frame_count.saturating_sub(self.reserved_frames)
    }

    /// Number of feedback levels
    #[inline]
    pub fn levels(&self) -> usize {
        self.time_slices.len()
    }

    /// Lowest-priority level index
    #[inline]
    pub fn lowest_level(&self) -> usize {
        self.levels().saturating_sub(1)
    }

    /// Level a process moves to after leaving `level`
    #[inline]
    pub fn next_level(&self, level: usize) -> usize {
        (level + 1).min(self.lowest_level())
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(SimError::InvalidConfig("page size must be positive".into()));
        }
        if self.usable_frames() == 0 {
            return Err(SimError::InvalidConfig(format!(
                "{} reserved of {} frames leaves no usable frame",
                self.reserved_frames, self.frame_count
            )));
        }
        if self.max_pages_per_process == 0 {
            return Err(SimError::InvalidConfig("processes need at least one page of address space".into()));
        }
        if self.time_slices.is_empty() {
            return Err(SimError::InvalidConfig("at least one feedback level is required".into()));
        }
        if let Some(level) = self.time_slices.iter().position(|&slice| slice == 0) {
            return Err(SimError::InvalidConfig(format!("time slice of level {} is zero", level)));
        }
        if self.io_block_ticks == 0 {
            return Err(SimError::InvalidConfig("I/O block duration must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.read_write_probability) {
            return Err(SimError::InvalidConfig(format!(
                "read/write probability {} outside [0, 1]",
                self.read_write_probability
            )));
        }
        if self.event_log_capacity == 0 {
            return Err(SimError::InvalidConfig("event log capacity must be positive".into()));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            page_size: PAGE_SIZE,
            frame_count: FRAME_COUNT,
            reserved_frames: RESERVED_FRAMES,
            max_pages_per_process: MAX_PAGES_PER_PROCESS,
            time_slices: TIME_SLICES.to_vec(),
            io_block_ticks: IO_BLOCK_TICKS,
            instructions_per_process: INSTRUCTIONS_PER_PROCESS,
            read_write_probability: READ_WRITE_PROBABILITY,
            event_log_capacity: EVENT_LOG_CAPACITY,
        }
    }
}
