//! Sources of synthetic instruction streams and page choices.
//!
//! `RandomWorkload` drives demos; `ScriptedWorkload` replays fixed
//! sequences so tests can assert exact behaviour.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::Config;
use crate::process::Instruction;
use crate::translation::VirtualAddress;

pub trait WorkloadSource {
    /// Instruction stream for a new process spanning `page_count` pages
    fn instructions(&mut self, page_count: usize, page_size: usize) -> Vec<Instruction>;

    /// Page to demand-load when a process is dispatched; `page_count` > 0
    fn pick_page(&mut self, page_count: usize) -> usize;
}

pub struct RandomWorkload {
    rng: StdRng,
    count: usize,
    read_write_probability: f64,
}

impl RandomWorkload {
    /// Reproducible generator
    pub fn seeded(seed: u64, config: &Config) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), config)
    }

    pub fn from_entropy(config: &Config) -> Self {
        Self::with_rng(StdRng::from_entropy(), config)
    }

    fn with_rng(rng: StdRng, config: &Config) -> Self {
        RandomWorkload {
            rng,
            count: config.instructions_per_process,
            read_write_probability: config.read_write_probability,
        }
    }
}

impl WorkloadSource for RandomWorkload {
    fn instructions(&mut self, page_count: usize, page_size: usize) -> Vec<Instruction> {
        let span = (page_count as u64).saturating_mul(page_size as u64);
        (0..self.count)
            .map(|_| {
                let memory_op = span > 0 && self.rng.gen_bool(self.read_write_probability);
                if memory_op {
                    let va = VirtualAddress::from_raw(self.rng.gen_range(0..span), page_size);
                    if self.rng.gen_bool(0.5) {
                        Instruction::Read(va)
                    } else {
                        Instruction::Write(va)
                    }
                } else if self.rng.gen_bool(0.5) {
                    Instruction::Input
                } else {
                    Instruction::Output
                }
            })
            .collect()
    }

    fn pick_page(&mut self, page_count: usize) -> usize {
        self.rng.gen_range(0..page_count.max(1))
    }
}

/// Replays queued instruction streams (one per created process, in order)
/// and page picks. Exhausted queues yield no instructions and page 0.
#[derive(Debug, Default)]
pub struct ScriptedWorkload {
    streams: VecDeque<Vec<Instruction>>,
    picks: VecDeque<usize>,
}

impl ScriptedWorkload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stream(mut self, instructions: Vec<Instruction>) -> Self {
        self.streams.push_back(instructions);
        self
    }

    pub fn with_picks(mut self, picks: impl IntoIterator<Item = usize>) -> Self {
        self.picks.extend(picks);
        self
    }
}

impl WorkloadSource for ScriptedWorkload {
    fn instructions(&mut self, _page_count: usize, _page_size: usize) -> Vec<Instruction> {
        self.streams.pop_front().unwrap_or_default()
    }

    fn pick_page(&mut self, page_count: usize) -> usize {
        let page = self.picks.pop_front().unwrap_or(0);
        page.min(page_count.saturating_sub(1))
    }
}
