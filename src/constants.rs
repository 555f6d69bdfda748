// size of one page / frame in addressable units
pub const PAGE_SIZE: usize = 1024;

// physical frames; the first RESERVED_FRAMES are the system area and never handed out
pub const FRAME_COUNT: usize = 16;
pub const RESERVED_FRAMES: usize = 8;
pub const USABLE_FRAMES: usize = FRAME_COUNT - RESERVED_FRAMES;

// one entry per feedback level, level 0 is the highest priority
pub const TIME_SLICES: [u32; 3] = [1, 3, 5];

// schedule() calls a process spends in the blocked set after INPUT/OUTPUT
pub const IO_BLOCK_TICKS: u32 = 3;

// virtual address space of one process, in pages
pub const MAX_PAGES_PER_PROCESS: usize = 32;
pub const MAX_PROCESS_SIZE: usize = MAX_PAGES_PER_PROCESS * PAGE_SIZE;

pub const INSTRUCTIONS_PER_PROCESS: usize = 20;
pub const READ_WRITE_PROBABILITY: f64 = 0.9;

pub const EVENT_LOG_CAPACITY: usize = 4096;
