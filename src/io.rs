use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::constants::MAX_PROCESS_SIZE;
use crate::error::{Result, SimError};
use crate::memory::Frame;
use crate::process::ProcessId;
use crate::scheduler::Scheduler;

/// One process definition from a workload file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub name: String,
    pub arrival_time: u32,
    pub total_time: u32,
    pub task: String,
    pub size: usize,
}

/// Processes to create, one per line: `name arrival_time total_time task size`.
/// Blank lines and `#` comments are skipped.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Workload {
    pub processes: Vec<ProcessSpec>,
}

impl Workload {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut processes = Vec::new();
        for (i, line) in content.lines().enumerate() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            processes.push(Self::parse_line(i + 1, line)?);
        }

        if processes.is_empty() {
            return Err(SimError::Parse { line: 0, message: "workload defines no processes".into() });
        }
        Ok(Workload { processes })
    }

    fn parse_line(line: usize, text: &str) -> Result<ProcessSpec> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() != 5 {
            return Err(SimError::Parse {
                line,
                message: format!("expected 5 fields (name arrival total task size), got {}", tokens.len()),
            });
        }

        let number = |field: &str, token: &str| -> Result<u64> {
            token.parse().map_err(|_| SimError::Parse {
                line,
                message: format!("invalid {}: {}", field, token),
            })
        };
        let arrival_time = number("arrival time", tokens[1])?;
        let total_time = number("total time", tokens[2])?;
        let size = number("size", tokens[4])?;

        let too_big = |field: &str| SimError::Parse { line, message: format!("{} out of range", field) };
        if size > MAX_PROCESS_SIZE as u64 {
            return Err(SimError::Parse {
                line,
                message: format!("size {} exceeds the {} byte address space", size, MAX_PROCESS_SIZE),
            });
        }
        Ok(ProcessSpec {
            name: tokens[0].to_string(),
            arrival_time: u32::try_from(arrival_time).map_err(|_| too_big("arrival time"))?,
            total_time: u32::try_from(total_time).map_err(|_| too_big("total time"))?,
            task: tokens[3].to_string(),
            size: usize::try_from(size).map_err(|_| too_big("size"))?,
        })
    }

    /// Create every process on `scheduler`, in file order
    pub fn apply(&self, scheduler: &mut Scheduler) -> Vec<ProcessId> {
        self.processes
            .iter()
            .map(|p| scheduler.create_process(&p.name, p.arrival_time, p.total_time, &p.task, p.size))
            .collect()
    }
}

/// Text snapshot of every observable the scheduler exposes
pub fn render_report(scheduler: &Scheduler) -> String {
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = write_report_to(&mut out, scheduler);
    out
}

fn write_report_to(out: &mut String, scheduler: &Scheduler) -> std::fmt::Result {
    let registry = scheduler.registry();
    let memory = scheduler.memory();
    let name_of = |pid: ProcessId| registry.get(pid).map_or_else(|| pid.to_string(), |p| p.name.clone());

    writeln!(out, "=== Tick {} ===", scheduler.tick())?;

    writeln!(out, "Ready queues:")?;
    for (level, slice) in scheduler.config().time_slices.iter().enumerate() {
        let names: Vec<String> = scheduler
            .ready_queue(level)
            .map(|p| format!("{}({}/{})", p.name, p.remaining_time, p.total_time))
            .collect();
        writeln!(out, "  [{}] slice {}: {}", level, slice, names.join(" "))?;
    }

    writeln!(out, "Blocked:")?;
    for entry in scheduler.blocked() {
        writeln!(out, "  {} wait {} -> queue {}", name_of(entry.pid), entry.wait, entry.next_level)?;
    }

    let finished: Vec<&str> = scheduler.finished().iter().map(|p| p.name.as_str()).collect();
    writeln!(out, "Finished: {}", finished.join(" "))?;

    writeln!(out, "Page tables:")?;
    for pcb in registry.processes() {
        writeln!(out, "  {} [{}] {} task={} size={}", pcb.name, pcb.id, pcb.status, pcb.task, pcb.size)?;
        for entry in pcb.page_table() {
            let frame = entry.frame.map_or_else(|| "-".to_string(), |f| f.to_string());
            writeln!(
                out,
                "    page {:>3}  frame {:>3}  exists {}  modified {}",
                entry.page,
                frame,
                u8::from(entry.exists()),
                u8::from(entry.modified)
            )?;
        }
    }

    writeln!(out, "Frames:")?;
    for (i, frame) in memory.frames().iter().enumerate() {
        match frame {
            Frame::Reserved => writeln!(out, "  {:>3}: reserved", i)?,
            Frame::Free => writeln!(out, "  {:>3}: free", i)?,
            Frame::Occupied { pid, page } => writeln!(out, "  {:>3}: {} page {}", i, name_of(*pid), page)?,
        }
    }

    let bits: String = memory.bitmap().iter().map(|&b| if b { '1' } else { '0' }).collect();
    writeln!(out, "Bitmap: {}", bits)?;

    let stack: Vec<String> = memory
        .lru_stack()
        .map(|e| format!("{}:{}@{}", name_of(e.pid), e.page, e.frame))
        .collect();
    writeln!(out, "LRU (oldest first): {}", stack.join(" "))?;

    let stats = memory.stats();
    writeln!(
        out,
        "Memory: {} hit(s), {} fault(s), {} eviction(s), {} write-back(s)",
        stats.hits, stats.faults, stats.evictions, stats.write_backs
    )
}

pub fn write_report<P: AsRef<Path>>(path: P, scheduler: &Scheduler) -> Result<()> {
    fs::write(path.as_ref(), render_report(scheduler))?;
    Ok(())
}
