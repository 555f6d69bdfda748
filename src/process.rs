//! Process control blocks.

use std::collections::VecDeque;
use std::fmt;

use crate::translation::VirtualAddress;

/// Stable process identity; frames and queues refer to processes only by id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(pub u32);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Ready,
    Running,
    Blocked,
    Finished,
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessStatus::Ready => "Ready",
            ProcessStatus::Running => "Running",
            ProcessStatus::Blocked => "Blocked",
            ProcessStatus::Finished => "Finished",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Read(VirtualAddress),
    Write(VirtualAddress),
    Input,
    Output,
}

impl Instruction {
    /// Address for memory instructions, `None` for I/O
    pub fn address(&self) -> Option<VirtualAddress> {
        match *self {
            Instruction::Read(va) | Instruction::Write(va) => Some(va),
            Instruction::Input | Instruction::Output => None,
        }
    }

    pub fn is_io(&self) -> bool {
        matches!(self, Instruction::Input | Instruction::Output)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Read(va) => write!(f, "READ {}", va),
            Instruction::Write(va) => write!(f, "WRITE {}", va),
            Instruction::Input => f.write_str("INPUT"),
            Instruction::Output => f.write_str("OUTPUT"),
        }
    }
}

/// One page of a process's logical address space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTableEntry {
    pub page: usize,
    /// Frame holding the page while it is resident
    pub frame: Option<usize>,
    pub modified: bool,
}

impl PageTableEntry {
    pub fn new(page: usize) -> Self {
        PageTableEntry { page, frame: None, modified: false }
    }

    /// Whether the page currently occupies a frame
    #[inline]
    pub fn exists(&self) -> bool {
        self.frame.is_some()
    }
}

/// Process control block
#[derive(Debug, Clone)]
pub struct Pcb {
    pub id: ProcessId,
    pub name: String,
    pub task: String,
    pub arrival_time: u32,
    pub total_time: u32,
    pub remaining_time: u32,
    pub size: usize,
    pub status: ProcessStatus,
    page_table: Vec<PageTableEntry>,
    instructions: VecDeque<Instruction>,
}

impl Pcb {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ProcessId,
        name: impl Into<String>,
        task: impl Into<String>,
        arrival_time: u32,
        total_time: u32,
        size: usize,
        page_count: usize,
        instructions: Vec<Instruction>,
    ) -> Self {
        Pcb {
            id,
            name: name.into(),
            task: task.into(),
            arrival_time,
            total_time,
            remaining_time: total_time,
            size,
            status: ProcessStatus::Ready,
            page_table: (0..page_count).map(PageTableEntry::new).collect(),
            instructions: instructions.into(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_table.len()
    }

    pub fn page_table(&self) -> &[PageTableEntry] {
        &self.page_table
    }

    pub(crate) fn page_table_mut(&mut self) -> &mut [PageTableEntry] {
        &mut self.page_table
    }

    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter()
    }

    pub fn pending_instructions(&self) -> usize {
        self.instructions.len()
    }

    /// Pages currently mapped to a frame
    pub fn resident_pages(&self) -> usize {
        self.page_table.iter().filter(|entry| entry.exists()).count()
    }

    /// Enter Running and take the next instruction, if any is left.
    /// `remaining_time` is left to the caller.
    pub fn run_one_step(&mut self) -> Option<Instruction> {
        if matches!(self.status, ProcessStatus::Ready | ProcessStatus::Blocked) {
            self.status = ProcessStatus::Running;
        }
        if self.status != ProcessStatus::Running || self.remaining_time == 0 {
            return None;
        }
        self.instructions.pop_front()
    }

    pub fn block(&mut self) {
        self.status = ProcessStatus::Blocked;
    }

    pub fn ready(&mut self) {
        self.status = ProcessStatus::Ready;
    }

    /// Consume one unit of CPU time; returns the time left
    pub fn consume_time(&mut self) -> u32 {
        self.remaining_time = self.remaining_time.saturating_sub(1);
        self.remaining_time
    }

    pub fn is_complete(&self) -> bool {
        self.remaining_time == 0
    }
}
