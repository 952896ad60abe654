mod checksum_priority;

pub use checksum_priority::ChecksumPriority;
