use crate::config::Config;
use crate::error::{Result, SimError};
use crate::event::{EventKind, EventLog};
use crate::memory::{MemoryManager, PageAccess};
use crate::process::{Pcb, ProcessId};
use crate::workload::WorkloadSource;

/// Owns every live PCB; everything else refers to them by `ProcessId`
#[derive(Debug, Default)]
pub struct Registry {
    processes: Vec<Pcb>,
    next_id: u32,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a PCB with one unmapped page-table entry per page and register it.
    /// There is no admission control: pages are only mapped on first reference.
    /// Sizes beyond the per-process address space are cut to `max_pages_per_process`.
    #[allow(clippy::too_many_arguments)]
    pub fn create_process(
        &mut self,
        name: &str,
        arrival_time: u32,
        total_time: u32,
        task: &str,
        size: usize,
        config: &Config,
        source: &mut dyn WorkloadSource,
        events: &mut EventLog,
    ) -> ProcessId {
        let id = ProcessId(self.next_id);
        self.next_id += 1;

        let wanted = size.div_ceil(config.page_size);
        let page_count = wanted.min(config.max_pages_per_process);
        if page_count < wanted {
            log::warn!(
                "{} asks for {} page(s), address space holds {}",
                name,
                wanted,
                config.max_pages_per_process
            );
        }
        let instructions = source.instructions(page_count, config.page_size);
        let pcb = Pcb::new(id, name, task, arrival_time, total_time, size, page_count, instructions);

        events.record(
            EventKind::Created,
            format!(
                "{} created: arrival {}, needs {}, {} page(s), {} instruction(s)",
                name,
                arrival_time,
                total_time,
                page_count,
                pcb.pending_instructions()
            ),
        );
        self.processes.push(pcb);
        id
    }

    /// Unmap and release all memory of `name` and drop it from the registry.
    /// Unknown names are ignored.
    pub fn terminate_process(
        &mut self,
        name: &str,
        memory: &mut MemoryManager,
        events: &mut EventLog,
    ) -> Option<Pcb> {
        let pid = self.id_of(name)?;
        self.remove(pid, memory, events)
    }

    /// `terminate_process` by id
    pub fn remove(&mut self, pid: ProcessId, memory: &mut MemoryManager, events: &mut EventLog) -> Option<Pcb> {
        let pcb = self.get_mut(pid)?;
        for entry in pcb.page_table_mut() {
            entry.frame = None;
        }
        memory.release(pid, self, events);

        let pos = self.processes.iter().position(|p| p.id == pid)?;
        Some(self.processes.remove(pos))
    }

    /// Demand-load a random page of `name`
    pub fn request_page_for(
        &mut self,
        name: &str,
        memory: &mut MemoryManager,
        source: &mut dyn WorkloadSource,
        events: &mut EventLog,
    ) -> Result<Option<PageAccess>> {
        let Some(pid) = self.id_of(name) else {
            events.record(EventKind::NotFound, format!("process {} not found", name));
            return Err(SimError::NotFound(name.to_string()));
        };
        self.request_page(pid, memory, source, events)
    }

    /// `request_page_for` by id
    pub fn request_page(
        &mut self,
        pid: ProcessId,
        memory: &mut MemoryManager,
        source: &mut dyn WorkloadSource,
        events: &mut EventLog,
    ) -> Result<Option<PageAccess>> {
        memory.request_random_page(pid, self, source, events)
    }

    pub fn get(&self, pid: ProcessId) -> Option<&Pcb> {
        self.processes.iter().find(|p| p.id == pid)
    }

    pub fn get_mut(&mut self, pid: ProcessId) -> Option<&mut Pcb> {
        self.processes.iter_mut().find(|p| p.id == pid)
    }

    /// First live process called `name`
    pub fn find(&self, name: &str) -> Option<&Pcb> {
        self.processes.iter().find(|p| p.name == name)
    }

    pub fn id_of(&self, name: &str) -> Option<ProcessId> {
        self.find(name).map(|p| p.id)
    }

    /// Live processes in creation order
    pub fn processes(&self) -> &[Pcb] {
        &self.processes
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}
