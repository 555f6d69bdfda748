//! Multi-level feedback queue scheduler driving the process and memory model.
//!
//! A driver calls [`Scheduler::schedule`] once per simulated tick. Each call
//! ages the blocked set, then runs the front process of the highest-priority
//! non-empty ready queue for at most that level's time slice. READ/WRITE
//! instructions reference memory through the [`MemoryManager`]; INPUT/OUTPUT
//! park the process in the blocked set for `io_block_ticks` calls. A process
//! that uses its whole slice drops one level; a process with no time left is
//! destroyed and its frames are released.
//!
//! Between calls every observable (queues, page tables, frames, LRU stack,
//! event log) is consistent and may be read through the accessors.

use std::collections::VecDeque;

use crate::config::Config;
use crate::error::{Result, SimError};
use crate::event::{EventKind, EventLog};
use crate::memory::MemoryManager;
use crate::process::{Instruction, Pcb, ProcessId, ProcessStatus};
use crate::registry::Registry;
use crate::translation::VirtualAddress;
use crate::workload::{RandomWorkload, WorkloadSource};

/// A process waiting on I/O
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockedEntry {
    pub pid: ProcessId,
    /// `schedule()` calls left before the process is ready again
    pub wait: u32,
    /// Ready queue it re-enters
    pub next_level: usize,
}

/// How a dispatched process left the CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceEnd {
    Finished,
    Blocked { next_level: usize },
    Demoted { to_level: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Every ready queue was empty
    Idle,
    Ran {
        pid: ProcessId,
        level: usize,
        units: u32,
        end: SliceEnd,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    /// First entry after creation; level 0 is kept ordered by arrival time
    Initial,
    /// Return from the blocked set or demotion; appended as-is
    Readmit,
}

pub struct Scheduler {
    config: Config,
    registry: Registry,
    memory: MemoryManager,
    ready: Vec<VecDeque<ProcessId>>,
    blocked: Vec<BlockedEntry>,
    finished: Vec<Pcb>,
    source: Box<dyn WorkloadSource>,
    events: EventLog,
    tick: u64,
}

impl Scheduler {
    pub fn new(config: Config, source: Box<dyn WorkloadSource>) -> Result<Self> {
        config.validate()?;
        Ok(Scheduler {
            registry: Registry::new(),
            memory: MemoryManager::new(&config),
            ready: vec![VecDeque::new(); config.levels()],
            blocked: Vec::new(),
            finished: Vec::new(),
            source,
            events: EventLog::new(config.event_log_capacity),
            tick: 0,
            config,
        })
    }

    /// Scheduler with a reproducible random workload
    pub fn with_seed(config: Config, seed: u64) -> Result<Self> {
        let source = RandomWorkload::seeded(seed, &config);
        Self::new(config, Box::new(source))
    }

    // =========================================================================
    // Entry points
    // =========================================================================

    /// Create a process and admit it to the top-level queue
    pub fn create_process(
        &mut self,
        name: &str,
        arrival_time: u32,
        total_time: u32,
        task: &str,
        size: usize,
    ) -> ProcessId {
        let pid = self.registry.create_process(
            name,
            arrival_time,
            total_time,
            task,
            size,
            &self.config,
            self.source.as_mut(),
            &mut self.events,
        );
        self.add_to_ready(pid, 0, Admission::Initial);
        pid
    }

    /// Advance the simulation by one step
    pub fn schedule(&mut self) -> Result<StepOutcome> {
        self.tick += 1;
        self.events.set_tick(self.tick);

        self.age_blocked();

        let next = self
            .ready
            .iter_mut()
            .enumerate()
            .find_map(|(level, queue)| queue.pop_front().map(|pid| (level, pid)));
        let Some((level, pid)) = next else {
            self.events.record(EventKind::Idle, "no runnable process");
            return Ok(StepOutcome::Idle);
        };

        self.execute(pid, level)
    }

    /// Remove a process waiting in a ready queue and release its memory
    pub fn terminate_process(&mut self, name: &str) -> Result<ProcessId> {
        let registry = &self.registry;
        let found = self.ready.iter().enumerate().find_map(|(level, queue)| {
            queue
                .iter()
                .position(|pid| registry.get(*pid).is_some_and(|p| p.name == name))
                .map(|pos| (level, pos))
        });

        let Some(pid) = found.and_then(|(level, pos)| self.ready[level].remove(pos)) else {
            self.events.record(EventKind::NotFound, format!("no ready process named {}", name));
            return Err(SimError::NotFound(name.to_string()));
        };

        self.registry.remove(pid, &mut self.memory, &mut self.events);
        self.events.record(EventKind::Terminated, format!("{} terminated, memory released", name));
        Ok(pid)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn add_to_ready(&mut self, pid: ProcessId, level: usize, admission: Admission) {
        let level = level.min(self.config.lowest_level());
        let Some(pcb) = self.registry.get_mut(pid) else {
            return;
        };
        pcb.ready();
        self.events.record(
            EventKind::Admitted,
            format!(
                "{} joins queue {} (slice {})",
                pcb.name, level, self.config.time_slices[level]
            ),
        );

        if level == 0 && admission == Admission::Initial {
            // queued entries keep their relative order
            let arrival = pcb.arrival_time;
            let registry = &self.registry;
            let pos = self.ready[0]
                .iter()
                .position(|queued| registry.get(*queued).is_some_and(|p| p.arrival_time > arrival))
                .unwrap_or(self.ready[0].len());
            self.ready[0].insert(pos, pid);
        } else {
            self.ready[level].push_back(pid);
        }
    }

    /// Count down every blocked entry; expired ones pay one unit for the I/O
    /// and re-enter their recorded queue in the order they blocked.
    fn age_blocked(&mut self) {
        let mut released = Vec::new();
        self.blocked.retain_mut(|entry| {
            entry.wait = entry.wait.saturating_sub(1);
            if entry.wait == 0 {
                released.push(*entry);
                false
            } else {
                true
            }
        });

        for entry in released {
            if let Some(pcb) = self.registry.get_mut(entry.pid) {
                let left = pcb.consume_time();
                self.events.record(
                    EventKind::Unblocked,
                    format!("{} completes I/O, {} unit(s) left", pcb.name, left),
                );
            }
            self.add_to_ready(entry.pid, entry.next_level, Admission::Readmit);
        }
    }

    fn execute(&mut self, pid: ProcessId, level: usize) -> Result<StepOutcome> {
        let name = self.process_name(pid)?;
        let slice = self.config.time_slices[level];
        self.events.record(
            EventKind::Dispatched,
            format!("{} dispatched from queue {} for {} unit(s)", name, level, slice),
        );

        // issued even when I/O completion already used the last unit
        self.registry
            .request_page(pid, &mut self.memory, self.source.as_mut(), &mut self.events)?;

        let mut units = 0;
        let mut blocked = None;
        for _ in 0..slice {
            let pcb = self.registry.get_mut(pid).ok_or(SimError::UnknownProcess(pid))?;
            if pcb.is_complete() {
                break;
            }
            units += 1;

            match pcb.run_one_step() {
                Some(instruction @ (Instruction::Input | Instruction::Output)) => {
                    pcb.block();
                    let next_level = self.config.next_level(level);
                    self.blocked.push(BlockedEntry {
                        pid,
                        wait: self.config.io_block_ticks,
                        next_level,
                    });
                    self.events.record(
                        EventKind::Blocked,
                        format!(
                            "{} executes {} and blocks for {} tick(s)",
                            name, instruction, self.config.io_block_ticks
                        ),
                    );
                    blocked = Some(next_level);
                    break;
                }
                Some(Instruction::Read(va)) => self.access_memory(pid, &name, va, false)?,
                Some(Instruction::Write(va)) => self.access_memory(pid, &name, va, true)?,
                None => {
                    self.events.record(
                        EventKind::Executed,
                        format!("{} has no instruction left, idles one unit", name),
                    );
                }
            }

            let left = self
                .registry
                .get_mut(pid)
                .ok_or(SimError::UnknownProcess(pid))?
                .consume_time();
            self.events.record(EventKind::Executed, format!("{} has {} unit(s) left", name, left));
        }

        let complete = self.registry.get(pid).is_some_and(Pcb::is_complete);
        let end = if let Some(next_level) = blocked {
            SliceEnd::Blocked { next_level }
        } else if complete {
            self.finish(pid)?;
            SliceEnd::Finished
        } else {
            let to_level = self.config.next_level(level);
            self.events.record(
                EventKind::Demoted,
                format!("{} used its slice, moves to queue {}", name, to_level),
            );
            self.add_to_ready(pid, to_level, Admission::Readmit);
            SliceEnd::Demoted { to_level }
        };

        Ok(StepOutcome::Ran { pid, level, units, end })
    }

    fn access_memory(&mut self, pid: ProcessId, name: &str, va: VirtualAddress, write: bool) -> Result<()> {
        let op = if write { "WRITE" } else { "READ" };
        self.events.record(
            EventKind::Executed,
            format!("{} executes {} {}, page {}", name, op, va, va.page),
        );
        if write {
            self.memory.mark_dirty(pid, va.page, &mut self.registry, &mut self.events)?;
        }
        self.memory.request_page(pid, va.page, &mut self.registry, &mut self.events)?;
        Ok(())
    }

    fn finish(&mut self, pid: ProcessId) -> Result<()> {
        let mut pcb = self
            .registry
            .remove(pid, &mut self.memory, &mut self.events)
            .ok_or(SimError::UnknownProcess(pid))?;
        pcb.status = ProcessStatus::Finished;
        self.events.record(EventKind::Finished, format!("{} finished and destroyed", pcb.name));
        self.finished.push(pcb);
        Ok(())
    }

    fn process_name(&self, pid: ProcessId) -> Result<String> {
        self.registry
            .get(pid)
            .map(|p| p.name.clone())
            .ok_or(SimError::UnknownProcess(pid))
    }

    // =========================================================================
    // Observables
    // =========================================================================

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of `schedule()` calls so far
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn memory(&self) -> &MemoryManager {
        &self.memory
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn ready_queues(&self) -> &[VecDeque<ProcessId>] {
        &self.ready
    }

    /// PCBs waiting at `level`, front first
    pub fn ready_queue(&self, level: usize) -> impl Iterator<Item = &Pcb> {
        self.ready
            .get(level)
            .into_iter()
            .flatten()
            .filter_map(|pid| self.registry.get(*pid))
    }

    pub fn blocked(&self) -> &[BlockedEntry] {
        &self.blocked
    }

    /// Completed processes in completion order
    pub fn finished(&self) -> &[Pcb] {
        &self.finished
    }

    pub fn process(&self, pid: ProcessId) -> Option<&Pcb> {
        self.registry.get(pid)
    }

    /// Nothing left to run or wait for
    pub fn is_drained(&self) -> bool {
        self.blocked.is_empty() && self.ready.iter().all(VecDeque::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PAGE_SIZE;
    use crate::memory::assert_consistent;
    use crate::workload::ScriptedWorkload;

    fn read(page: usize) -> Instruction {
        Instruction::Read(VirtualAddress::from_raw((page * PAGE_SIZE + 7) as u64, PAGE_SIZE))
    }

    fn write(page: usize) -> Instruction {
        Instruction::Write(VirtualAddress::from_raw((page * PAGE_SIZE + 7) as u64, PAGE_SIZE))
    }

    fn scripted(config: Config, source: ScriptedWorkload) -> Scheduler {
        Scheduler::new(config, Box::new(source)).unwrap()
    }

    fn names(scheduler: &Scheduler, level: usize) -> Vec<String> {
        scheduler.ready_queue(level).map(|p| p.name.clone()).collect()
    }

    fn ran(outcome: StepOutcome) -> (ProcessId, usize, u32, SliceEnd) {
        match outcome {
            StepOutcome::Ran { pid, level, units, end } => (pid, level, units, end),
            StepOutcome::Idle => panic!("expected a process to run"),
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = Config { frame_count: 2, reserved_frames: 2, ..Config::default() };
        assert!(matches!(
            Scheduler::new(config, Box::new(ScriptedWorkload::new())),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_idle_step() {
        let mut scheduler = scripted(Config::default(), ScriptedWorkload::new());
        assert_eq!(scheduler.schedule().unwrap(), StepOutcome::Idle);
        assert_eq!(scheduler.tick(), 1);
        assert_eq!(scheduler.events().count(EventKind::Idle), 1);
        assert!(scheduler.is_drained());
    }

    #[test]
    fn test_initial_admission_sorted_by_arrival() {
        let mut scheduler = scripted(Config::default(), ScriptedWorkload::new());
        scheduler.create_process("B", 5, 3, "t", 1024);
        scheduler.create_process("A", 1, 3, "t", 1024);
        scheduler.create_process("C", 1, 3, "t", 1024);

        assert_eq!(names(&scheduler, 0), vec!["A", "C", "B"]);
        assert!(scheduler.ready_queue(0).all(|p| p.status == ProcessStatus::Ready));
    }

    #[test]
    fn test_single_unit_process_without_instructions_finishes() {
        let mut scheduler = scripted(Config::default(), ScriptedWorkload::new());
        let pid = scheduler.create_process("P", 0, 1, "t", 1024);

        let (ran_pid, level, units, end) = ran(scheduler.schedule().unwrap());
        assert_eq!((ran_pid, level, units, end), (pid, 0, 1, SliceEnd::Finished));

        let done = &scheduler.finished()[0];
        assert_eq!(done.id, pid);
        assert_eq!(done.remaining_time, 0);
        assert_eq!(done.status, ProcessStatus::Finished);
        assert!(scheduler.registry().is_empty());
        assert_eq!(scheduler.memory().resident_count(), 0);
        assert!(scheduler.is_drained());
    }

    #[test]
    fn test_demotion_through_levels() {
        let mut scheduler = scripted(Config::default(), ScriptedWorkload::new());
        let pid = scheduler.create_process("P", 0, 10, "t", 1024);

        assert_eq!(ran(scheduler.schedule().unwrap()), (pid, 0, 1, SliceEnd::Demoted { to_level: 1 }));
        assert_eq!(names(&scheduler, 1), vec!["P"]);
        assert_eq!(ran(scheduler.schedule().unwrap()), (pid, 1, 3, SliceEnd::Demoted { to_level: 2 }));
        assert_eq!(ran(scheduler.schedule().unwrap()), (pid, 2, 5, SliceEnd::Demoted { to_level: 2 }));
        assert_eq!(scheduler.process(pid).unwrap().remaining_time, 1);
        assert_eq!(ran(scheduler.schedule().unwrap()), (pid, 2, 1, SliceEnd::Finished));
    }

    #[test]
    fn test_higher_level_runs_first() {
        let mut scheduler = scripted(Config::default(), ScriptedWorkload::new());
        let old = scheduler.create_process("old", 0, 10, "t", 1024);
        scheduler.schedule().unwrap();
        let new = scheduler.create_process("new", 1, 10, "t", 1024);

        let (pid, level, _, _) = ran(scheduler.schedule().unwrap());
        assert_eq!((pid, level), (new, 0));
        let (pid, level, _, _) = ran(scheduler.schedule().unwrap());
        assert_eq!((pid, level), (old, 1));
    }

    #[test]
    fn test_io_blocks_for_three_calls() {
        let source = ScriptedWorkload::new().with_stream(vec![Instruction::Input]);
        let mut scheduler = scripted(Config::default(), source);
        let pid = scheduler.create_process("P", 0, 5, "t", 1024);

        let (_, _, units, end) = ran(scheduler.schedule().unwrap());
        assert_eq!((units, end), (1, SliceEnd::Blocked { next_level: 1 }));
        assert_eq!(scheduler.blocked(), &[BlockedEntry { pid, wait: 3, next_level: 1 }]);
        assert_eq!(scheduler.process(pid).unwrap().status, ProcessStatus::Blocked);
        // the I/O instruction itself costs nothing yet
        assert_eq!(scheduler.process(pid).unwrap().remaining_time, 5);

        assert_eq!(scheduler.schedule().unwrap(), StepOutcome::Idle);
        assert_eq!(scheduler.blocked()[0].wait, 2);
        assert_eq!(scheduler.schedule().unwrap(), StepOutcome::Idle);
        assert_eq!(scheduler.blocked()[0].wait, 1);

        // third call releases it at queue 1, paying one unit for the I/O
        let (ran_pid, level, units, end) = ran(scheduler.schedule().unwrap());
        assert_eq!((ran_pid, level, units), (pid, 1, 3));
        assert_eq!(end, SliceEnd::Demoted { to_level: 2 });
        assert!(scheduler.blocked().is_empty());
        assert_eq!(scheduler.process(pid).unwrap().remaining_time, 1);
    }

    #[test]
    fn test_readmission_appends_at_level_zero() {
        // single level: returning from I/O must not jump ahead by arrival time
        let config = Config { time_slices: vec![2], ..Config::default() };
        let source = ScriptedWorkload::new().with_stream(vec![Instruction::Input]);
        let mut scheduler = scripted(config, source);
        let a = scheduler.create_process("A", 0, 5, "t", 1024);
        let b = scheduler.create_process("B", 5, 20, "t", 1024);

        assert_eq!(ran(scheduler.schedule().unwrap()).3, SliceEnd::Blocked { next_level: 0 });
        assert_eq!(ran(scheduler.schedule().unwrap()).0, b);
        assert_eq!(ran(scheduler.schedule().unwrap()).0, b);
        // A is back, queued behind B
        assert_eq!(ran(scheduler.schedule().unwrap()).0, b);
        assert_eq!(ran(scheduler.schedule().unwrap()).0, a);
    }

    #[test]
    fn test_arrival_insert_keeps_readmitted_order() {
        let config = Config { time_slices: vec![2], ..Config::default() };
        let source = ScriptedWorkload::new().with_stream(vec![Instruction::Input]);
        let mut scheduler = scripted(config, source);
        scheduler.create_process("A", 0, 5, "t", 1024);
        scheduler.create_process("B", 5, 20, "t", 1024);
        scheduler.create_process("D", 6, 20, "t", 1024);

        for _ in 0..4 {
            scheduler.schedule().unwrap();
        }
        assert_eq!(names(&scheduler, 0), vec!["D", "A", "B"]);

        // latest arrival goes to the back, existing entries stay put
        scheduler.create_process("C", 9, 5, "t", 1024);
        assert_eq!(names(&scheduler, 0), vec!["D", "A", "B", "C"]);

        // earlier arrival goes before the first later one
        scheduler.create_process("E", 5, 5, "t", 1024);
        assert_eq!(names(&scheduler, 0), vec!["E", "D", "A", "B", "C"]);
    }

    #[test]
    fn test_io_completion_can_finish_without_running() {
        let source = ScriptedWorkload::new()
            .with_stream(vec![Instruction::Input])
            .with_picks([0, 1]);
        let mut scheduler = scripted(Config::default(), source);
        let pid = scheduler.create_process("P", 0, 1, "t", 2048);

        assert_eq!(ran(scheduler.schedule().unwrap()).3, SliceEnd::Blocked { next_level: 1 });
        scheduler.schedule().unwrap();
        scheduler.schedule().unwrap();

        // the I/O unit was its last; dispatch still pages in before it finishes
        assert_eq!(ran(scheduler.schedule().unwrap()), (pid, 1, 0, SliceEnd::Finished));
        assert_eq!(scheduler.memory().stats().faults, 2);
        assert_eq!(scheduler.memory().resident_count(), 0);
        assert_eq!(scheduler.finished()[0].remaining_time, 0);
        assert!(scheduler.is_drained());
    }

    #[test]
    fn test_dispatch_requests_a_page() {
        let source = ScriptedWorkload::new().with_picks([1]);
        let mut scheduler = scripted(Config::default(), source);
        let pid = scheduler.create_process("P", 0, 10, "t", 3 * PAGE_SIZE);

        scheduler.schedule().unwrap();
        let pcb = scheduler.process(pid).unwrap();
        assert!(pcb.page_table()[1].exists());
        assert_eq!(pcb.resident_pages(), 1);
    }

    #[test]
    fn test_write_marks_dirty_and_faults_page_in() {
        let source = ScriptedWorkload::new()
            .with_stream(vec![write(1), read(0)])
            .with_picks([0]);
        let mut scheduler = scripted(Config::default(), source);
        let pid = scheduler.create_process("P", 0, 10, "t", 2 * PAGE_SIZE);

        scheduler.schedule().unwrap();
        let pcb = scheduler.process(pid).unwrap();
        assert!(pcb.page_table()[1].modified);
        assert!(pcb.page_table()[1].exists());
        assert!(!pcb.page_table()[0].modified);
        assert_eq!(pcb.remaining_time, 9);

        let stack: Vec<usize> = scheduler.memory().lru_stack().map(|e| e.page).collect();
        assert_eq!(stack, vec![0, 1]);

        // READ of page 0 is a hit that refreshes its recency
        scheduler.schedule().unwrap();
        let stack: Vec<usize> = scheduler.memory().lru_stack().map(|e| e.page).collect();
        assert_eq!(stack, vec![1, 0]);
        assert!(scheduler.memory().stats().hits >= 1);
    }

    #[test]
    fn test_dirty_eviction_writes_back() {
        let config = Config { frame_count: 2, reserved_frames: 1, ..Config::default() };
        let source = ScriptedWorkload::new()
            .with_stream(vec![write(0), read(1), read(1)])
            .with_picks([0, 1]);
        let mut scheduler = scripted(config, source);
        let pid = scheduler.create_process("P", 0, 10, "t", 2 * PAGE_SIZE);

        // dispatch loads page 0, WRITE dirties it
        scheduler.schedule().unwrap();
        assert!(scheduler.process(pid).unwrap().page_table()[0].modified);
        // dispatch at queue 1 loads page 1 over the dirty page 0
        scheduler.schedule().unwrap();

        let pcb = scheduler.process(pid).unwrap();
        assert!(!pcb.page_table()[0].exists());
        assert!(!pcb.page_table()[0].modified);
        assert_eq!(scheduler.events().count(EventKind::WriteBack), 1);
        assert_consistent(scheduler.memory(), scheduler.registry());
    }

    #[test]
    fn test_completion_releases_all_memory() {
        let source = ScriptedWorkload::new()
            .with_stream(vec![read(0), write(1), read(2)])
            .with_picks([2]);
        let mut scheduler = scripted(Config::default(), source);
        let pid = scheduler.create_process("P", 0, 4, "t", 3 * PAGE_SIZE);
        let other = scheduler.create_process("Q", 9, 10, "t", PAGE_SIZE);

        while scheduler.finished().is_empty() {
            scheduler.schedule().unwrap();
            assert_consistent(scheduler.memory(), scheduler.registry());
        }

        let done = &scheduler.finished()[0];
        assert_eq!(done.id, pid);
        assert!(done.page_table().iter().all(|e| !e.exists()));
        assert!(scheduler.memory().frames().iter().all(|f| f.occupant().map(|(p, _)| p) != Some(pid)));
        assert!(scheduler.memory().lru_stack().all(|e| e.pid == other));
    }

    #[test]
    fn test_terminate_ready_process() {
        let mut scheduler = scripted(Config::default(), ScriptedWorkload::new().with_picks([0]));
        let a = scheduler.create_process("A", 0, 10, "t", PAGE_SIZE);
        let b = scheduler.create_process("B", 1, 10, "t", PAGE_SIZE);
        // A gets a page and drops to queue 1
        scheduler.schedule().unwrap();
        assert_eq!(scheduler.memory().resident_count(), 1);

        assert_eq!(scheduler.terminate_process("A").unwrap(), a);
        assert!(scheduler.process(a).is_none());
        assert_eq!(scheduler.memory().resident_count(), 0);
        assert!(scheduler.ready_queues().iter().flatten().all(|pid| *pid == b));
        assert_eq!(scheduler.events().count(EventKind::Terminated), 1);
        assert_consistent(scheduler.memory(), scheduler.registry());
    }

    #[test]
    fn test_terminate_unknown_or_blocked_is_not_found() {
        let source = ScriptedWorkload::new().with_stream(vec![Instruction::Output]);
        let mut scheduler = scripted(Config::default(), source);
        scheduler.create_process("io", 0, 5, "t", PAGE_SIZE);
        scheduler.schedule().unwrap();

        assert!(matches!(scheduler.terminate_process("io"), Err(SimError::NotFound(_))));
        assert!(matches!(scheduler.terminate_process("ghost"), Err(SimError::NotFound(_))));
        assert_eq!(scheduler.events().count(EventKind::NotFound), 2);
        assert_eq!(scheduler.blocked().len(), 1);
    }

    #[test]
    fn test_zero_page_process_runs() {
        let source = ScriptedWorkload::new().with_stream(vec![Instruction::Input]);
        let mut scheduler = scripted(Config::default(), source);
        let pid = scheduler.create_process("tiny", 0, 2, "t", 0);

        let (ran_pid, _, _, end) = ran(scheduler.schedule().unwrap());
        assert_eq!(ran_pid, pid);
        assert_eq!(end, SliceEnd::Blocked { next_level: 1 });
        assert_eq!(scheduler.memory().resident_count(), 0);
    }

    // =========================================================================
    // Randomised runs
    // =========================================================================

    /// Each live process sits in exactly one ready queue or the blocked set
    fn assert_single_placement(scheduler: &Scheduler) {
        for pcb in scheduler.registry().processes() {
            let queued = scheduler.ready_queues().iter().flatten().filter(|p| **p == pcb.id).count();
            let blocked = scheduler.blocked().iter().filter(|e| e.pid == pcb.id).count();
            assert_eq!(queued + blocked, 1, "{} placed {} times", pcb.name, queued + blocked);
            match pcb.status {
                ProcessStatus::Ready => assert_eq!(queued, 1),
                ProcessStatus::Blocked => assert_eq!(blocked, 1),
                other => panic!("{} is {} between steps", pcb.name, other),
            }
        }
    }

    #[test]
    fn test_random_runs_keep_memory_consistent() {
        for seed in 0..8 {
            let config = Config { frame_count: 7, reserved_frames: 3, ..Config::default() };
            let capacity = config.usable_frames();
            let mut scheduler = Scheduler::with_seed(config, seed).unwrap();
            for (i, size) in [3000usize, 1024, 5000, 2500, 800, 4096].iter().enumerate() {
                scheduler.create_process(&format!("p{}", i), i as u32, 6 + i as u32 * 3, "job", *size);
            }

            for _ in 0..1000 {
                scheduler.schedule().unwrap();
                assert!(scheduler.memory().resident_count() <= capacity);
                assert_consistent(scheduler.memory(), scheduler.registry());
                assert_single_placement(&scheduler);
                for done in scheduler.finished() {
                    assert_eq!(done.resident_pages(), 0);
                    assert_eq!(done.remaining_time, 0);
                }
                if scheduler.is_drained() {
                    break;
                }
            }

            assert!(scheduler.is_drained(), "seed {} did not drain", seed);
            assert_eq!(scheduler.finished().len(), 6);
            assert_eq!(scheduler.memory().resident_count(), 0);
            assert!(scheduler.memory().bitmap()[3..].iter().all(|&b| !b));
        }
    }
}
