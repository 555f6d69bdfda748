//! Physical frame pool with demand paging and LRU replacement.

use std::collections::VecDeque;

use crate::config::Config;
use crate::error::{Result, SimError};
use crate::event::{EventKind, EventLog};
use crate::process::ProcessId;
use crate::registry::Registry;
use crate::workload::WorkloadSource;

/// State of one physical frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// System area, never allocated
    Reserved,
    Free,
    Occupied { pid: ProcessId, page: usize },
}

impl Frame {
    pub fn occupant(&self) -> Option<(ProcessId, usize)> {
        match *self {
            Frame::Occupied { pid, page } => Some((pid, page)),
            _ => None,
        }
    }
}

/// Resident page in recency order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LruEntry {
    pub frame: usize,
    pub page: usize,
    pub pid: ProcessId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eviction {
    pub pid: ProcessId,
    pub page: usize,
    pub frame: usize,
    pub written_back: bool,
}

/// Outcome of a page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAccess {
    Hit { frame: usize },
    Fault { frame: usize, evicted: Option<Eviction> },
}

impl PageAccess {
    pub fn frame(&self) -> usize {
        match *self {
            PageAccess::Hit { frame } | PageAccess::Fault { frame, .. } => frame,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    pub hits: u64,
    pub faults: u64,
    pub evictions: u64,
    pub write_backs: u64,
}

pub struct MemoryManager {
    frames: Vec<Frame>,
    bitmap: Vec<bool>,
    // head = least recently used
    lru: VecDeque<LruEntry>,
    reserved: usize,
    stats: MemoryStats,
}

impl MemoryManager {
    pub fn new(config: &Config) -> Self {
        let reserved = config.reserved_frames.min(config.frame_count);
        let frames: Vec<Frame> = (0..config.frame_count)
            .map(|i| if i < reserved { Frame::Reserved } else { Frame::Free })
            .collect();
        let bitmap = frames.iter().map(|f| *f == Frame::Reserved).collect();

        MemoryManager {
            frames,
            bitmap,
            lru: VecDeque::with_capacity(config.usable_frames()),
            reserved,
            stats: MemoryStats::default(),
        }
    }

    /// Frames that may hold pages
    pub fn capacity(&self) -> usize {
        self.frames.len() - self.reserved
    }

    pub fn resident_count(&self) -> usize {
        self.lru.len()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// One bit per frame; reserved frames read as occupied
    pub fn bitmap(&self) -> &[bool] {
        &self.bitmap
    }

    /// Oldest first
    pub fn lru_stack(&self) -> impl ExactSizeIterator<Item = &LruEntry> {
        self.lru.iter()
    }

    pub fn stats(&self) -> MemoryStats {
        self.stats
    }

    /// Demand-load a randomly chosen page of `pid`.
    /// Processes without pages are logged and left alone.
    pub fn request_random_page(
        &mut self,
        pid: ProcessId,
        registry: &mut Registry,
        source: &mut dyn WorkloadSource,
        events: &mut EventLog,
    ) -> Result<Option<PageAccess>> {
        let pcb = registry.get(pid).ok_or(SimError::UnknownProcess(pid))?;
        let page_count = pcb.page_count();
        if page_count == 0 {
            events.record(EventKind::PageRequest, format!("{} has no pages to request", pcb.name));
            return Ok(None);
        }

        let page = source.pick_page(page_count).min(page_count - 1);
        events.record(EventKind::PageRequest, format!("{} requests page {}", pcb.name, page));
        self.request_page(pid, page, registry, events).map(Some)
    }

    /// Reference `page` of `pid`: refresh its recency on a hit, page it in on a fault
    pub fn request_page(
        &mut self,
        pid: ProcessId,
        page: usize,
        registry: &mut Registry,
        events: &mut EventLog,
    ) -> Result<PageAccess> {
        let pcb = registry.get(pid).ok_or(SimError::UnknownProcess(pid))?;
        let entry = pcb.page_table().get(page).ok_or(SimError::PageOutOfRange {
            pid,
            page,
            page_count: pcb.page_count(),
        })?;

        if let Some(frame) = entry.frame {
            events.record(
                EventKind::PageHit,
                format!("{} page {} already resident in frame {}", pcb.name, page, frame),
            );
            self.touch(pid, page);
            self.stats.hits += 1;
            return Ok(PageAccess::Hit { frame });
        }

        self.page_in(pid, page, registry, events)
    }

    /// Load a non-resident page, evicting the LRU page when every usable frame is taken
    pub fn page_in(
        &mut self,
        pid: ProcessId,
        page: usize,
        registry: &mut Registry,
        events: &mut EventLog,
    ) -> Result<PageAccess> {
        let pcb = registry.get(pid).ok_or(SimError::UnknownProcess(pid))?;
        let resident = match pcb.page_table().get(page) {
            Some(entry) => entry.exists(),
            None => {
                return Err(SimError::PageOutOfRange { pid, page, page_count: pcb.page_count() });
            }
        };
        if resident {
            return self.request_page(pid, page, registry, events);
        }
        self.stats.faults += 1;

        let (frame, evicted) = if self.lru.len() < self.capacity() {
            let frame = self
                .frames
                .iter()
                .position(|f| *f == Frame::Free)
                .ok_or(SimError::NoFrameAvailable)?;
            (frame, None)
        } else {
            let victim = self.lru.pop_front().ok_or(SimError::NoFrameAvailable)?;
            let eviction = self.evict(victim, registry, events);
            (eviction.frame, Some(eviction))
        };

        let pcb = registry.get_mut(pid).ok_or(SimError::UnknownProcess(pid))?;
        pcb.page_table_mut()[page].frame = Some(frame);
        self.frames[frame] = Frame::Occupied { pid, page };
        self.bitmap[frame] = true;
        self.lru.push_back(LruEntry { frame, page, pid });

        events.record(
            EventKind::PageFault,
            format!("{} page {} loaded into frame {}", pcb.name, page, frame),
        );
        Ok(PageAccess::Fault { frame, evicted })
    }

    fn evict(&mut self, victim: LruEntry, registry: &mut Registry, events: &mut EventLog) -> Eviction {
        self.frames[victim.frame] = Frame::Free;
        self.bitmap[victim.frame] = false;
        self.stats.evictions += 1;

        let mut written_back = false;
        let mut owner = victim.pid.to_string();
        if let Some(pcb) = registry.get_mut(victim.pid) {
            let entry = &mut pcb.page_table_mut()[victim.page];
            written_back = entry.modified;
            entry.frame = None;
            entry.modified = false;
            owner = pcb.name.clone();
        }

        events.record(
            EventKind::Evicted,
            format!("LRU evicts {} page {} from frame {}", owner, victim.page, victim.frame),
        );
        if written_back {
            self.stats.write_backs += 1;
            events.record(
                EventKind::WriteBack,
                format!("{} page {} is modified, writing back", owner, victim.page),
            );
        } else {
            events.record(
                EventKind::Evicted,
                format!("{} page {} is clean, no write-back", owner, victim.page),
            );
        }

        Eviction {
            pid: victim.pid,
            page: victim.page,
            frame: victim.frame,
            written_back,
        }
    }

    /// Move a resident page to the most-recently-used end
    fn touch(&mut self, pid: ProcessId, page: usize) {
        if let Some(pos) = self.lru.iter().position(|e| e.pid == pid && e.page == page) {
            if let Some(entry) = self.lru.remove(pos) {
                self.lru.push_back(entry);
            }
        }
    }

    /// Set the modified bit of `page`, resident or not
    pub fn mark_dirty(
        &mut self,
        pid: ProcessId,
        page: usize,
        registry: &mut Registry,
        events: &mut EventLog,
    ) -> Result<()> {
        let pcb = registry.get_mut(pid).ok_or(SimError::UnknownProcess(pid))?;
        let page_count = pcb.page_count();
        let entry = pcb
            .page_table_mut()
            .get_mut(page)
            .ok_or(SimError::PageOutOfRange { pid, page, page_count })?;
        entry.modified = true;
        events.record(EventKind::Dirty, format!("{} page {} marked modified", pcb.name, page));
        Ok(())
    }

    /// Free every frame held by `pid` and unmap its page table.
    /// Returns the number of frames freed.
    pub fn release(&mut self, pid: ProcessId, registry: &mut Registry, events: &mut EventLog) -> usize {
        let mut freed = 0;
        for (i, frame) in self.frames.iter_mut().enumerate() {
            if matches!(frame, Frame::Occupied { pid: owner, .. } if *owner == pid) {
                *frame = Frame::Free;
                self.bitmap[i] = false;
                freed += 1;
            }
        }
        self.lru.retain(|e| e.pid != pid);

        let mut name = pid.to_string();
        if let Some(pcb) = registry.get_mut(pid) {
            for entry in pcb.page_table_mut() {
                entry.frame = None;
            }
            name = pcb.name.clone();
        }

        events.record(EventKind::Released, format!("{} released {} frame(s)", name, freed));
        freed
    }
}

/// Two-way consistency between page tables, frames, bitmap and LRU stack.
#[cfg(test)]
pub(crate) fn assert_consistent(memory: &MemoryManager, registry: &Registry) {
    assert!(memory.lru.len() <= memory.capacity());

    for (i, frame) in memory.frames.iter().enumerate() {
        match *frame {
            Frame::Reserved => {
                assert!(i < memory.reserved);
                assert!(memory.bitmap[i]);
            }
            Frame::Free => {
                assert!(!memory.bitmap[i], "free frame {} has its bit set", i);
                assert!(memory.lru.iter().all(|e| e.frame != i));
            }
            Frame::Occupied { pid, page } => {
                assert!(memory.bitmap[i]);
                let pcb = registry.get(pid).expect("frame owned by unknown process");
                assert_eq!(pcb.page_table()[page].frame, Some(i));
                let hits = memory.lru.iter().filter(|e| e.frame == i).count();
                assert_eq!(hits, 1, "frame {} appears {} times in the LRU stack", i, hits);
            }
        }
    }

    for entry in &memory.lru {
        assert_eq!(memory.frames[entry.frame], Frame::Occupied { pid: entry.pid, page: entry.page });
    }

    for pcb in registry.processes() {
        for entry in pcb.page_table() {
            let owners = memory
                .frames
                .iter()
                .filter(|f| f.occupant() == Some((pcb.id, entry.page)))
                .count();
            assert_eq!(entry.exists(), owners == 1);
            assert!(owners <= 1);
        }
    }
}
