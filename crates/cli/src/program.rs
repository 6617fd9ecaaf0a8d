use serde::{Deserialize, Serialize};

const SYSCALLS: &[&str] = &[
    "open", "read", "write", "close", "mmap", "munmap", "ioctl", "socket", "bind", "pipe",
];

/// A candidate program: an ordered list of syscall names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticProgram {
    pub calls: Vec<String>,
}

impl SyntheticProgram {
    /// Deterministic program number `n`: 1 to 6 calls drawn from the table.
    pub fn generate(n: usize) -> Self {
        let len = 1 + n % 6;
        let calls = (0..len)
            .map(|i| SYSCALLS[(n * 7 + i * 3) % SYSCALLS.len()].to_string())
            .collect();
        Self { calls }
    }

    /// Dispatch priority. Short programs run first.
    pub fn priority(&self) -> i32 {
        10 - self.calls.len() as i32
    }
}
